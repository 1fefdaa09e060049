//! Caller identity and access-level types.
//!
//! Claims are issued and verified elsewhere; this crate only consumes them.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A role a caller may hold.
///
/// Role names are matched case-sensitively and there is no implicit
/// hierarchy between roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System administrator.
    Admin,
    /// Human-resources staff.
    Hr,
    /// Line manager.
    Manager,
    /// Regular employee.
    Employee,
}

impl Role {
    /// Roles that see every employee's data.
    pub const PRIVILEGED: [Role; 2] = [Role::Admin, Role::Hr];

    /// The canonical wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Hr => "hr",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "hr" => Ok(Role::Hr),
            "manager" => Ok(Role::Manager),
            "employee" => Ok(Role::Employee),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Verified identity attributes of the caller.
///
/// # Example
///
/// ```
/// use hr_engine::models::{Claims, Role};
///
/// let claims = Claims::from_role_names(10, Some(100), ["hr", "Auditor"]);
/// assert!(claims.roles.contains(&Role::Hr));
/// assert_eq!(claims.roles.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user.
    pub user_id: u64,
    /// The employee record linked to the user, if any.
    pub employee_id: Option<u64>,
    /// Roles granted to the user.
    pub roles: BTreeSet<Role>,
}

impl Claims {
    /// Creates claims from already parsed roles.
    pub fn new(user_id: u64, employee_id: Option<u64>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            user_id,
            employee_id,
            roles: roles.into_iter().collect(),
        }
    }

    /// Creates claims from role names, ignoring names that are not known roles.
    pub fn from_role_names<'a>(
        user_id: u64,
        employee_id: Option<u64>,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let roles = names
            .into_iter()
            .filter_map(|name| match name.trim().parse::<Role>() {
                Ok(role) => Some(role),
                Err(_) => {
                    tracing::debug!(user_id, role = name, "Ignoring unknown role");
                    None
                }
            })
            .collect();
        Self {
            user_id,
            employee_id,
            roles,
        }
    }
}

/// How much of an employee's data a caller may see.
///
/// Ordered from no access to full access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// No access.
    None,
    /// The caller's own record.
    #[serde(rename = "self")]
    OwnRecord,
    /// A record of someone in the caller's reporting chain.
    Subordinate,
    /// Every record of a department.
    Department,
    /// Every record.
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_sensitive() {
        assert_eq!("hr".parse::<Role>(), Ok(Role::Hr));
        assert!("HR".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_access_levels_are_ordered() {
        assert!(AccessLevel::None < AccessLevel::OwnRecord);
        assert!(AccessLevel::OwnRecord < AccessLevel::Subordinate);
        assert!(AccessLevel::Subordinate < AccessLevel::Department);
        assert!(AccessLevel::Department < AccessLevel::All);
    }

    #[test]
    fn test_access_level_serializes_self() {
        assert_eq!(
            serde_json::to_string(&AccessLevel::OwnRecord).unwrap(),
            "\"self\""
        );
    }

    #[test]
    fn test_unknown_role_names_are_dropped() {
        let claims = Claims::from_role_names(1, None, ["employee", "hrm_employee", " manager "]);
        assert_eq!(
            claims.roles.into_iter().collect::<Vec<_>>(),
            vec![Role::Manager, Role::Employee]
        );
    }
}
