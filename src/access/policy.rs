//! Hierarchical access decisions.

use std::sync::Arc;

use crate::error::{EngineError, EngineResult};
use crate::models::{AccessLevel, Claims, Role};
use crate::store::EmployeeDirectory;

/// Which employees a list query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    /// Every employee.
    All,
    /// A single employee.
    Employee(u64),
    /// Nobody; the query returns an empty result.
    Nothing,
}

impl QueryScope {
    /// The employee id restriction a store filter should carry.
    ///
    /// `None` means no restriction; an empty list matches nothing.
    pub fn employee_ids(&self) -> Option<Vec<u64>> {
        match self {
            QueryScope::All => None,
            QueryScope::Employee(id) => Some(vec![*id]),
            QueryScope::Nothing => Some(Vec::new()),
        }
    }
}

/// Decides whether a caller may see or act on an employee's data.
///
/// The policy holds no state of its own; the reporting hierarchy is owned by
/// the directory.
#[derive(Clone)]
pub struct AccessPolicy {
    directory: Arc<dyn EmployeeDirectory>,
}

impl AccessPolicy {
    /// Creates a policy backed by `directory`.
    pub fn new(directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { directory }
    }

    /// Returns true if the caller holds at least one of `roles`.
    pub fn has_any_role(claims: &Claims, roles: &[Role]) -> bool {
        roles.iter().any(|role| claims.roles.contains(role))
    }

    /// Decides employee-data access and reports the level it was granted at.
    ///
    /// A caller without an employee record is refused without an error;
    /// directory failures propagate.
    pub fn can_access_employee_data(
        &self,
        claims: &Claims,
        target_employee_id: u64,
    ) -> EngineResult<(bool, AccessLevel)> {
        if Self::has_any_role(claims, &Role::PRIVILEGED) {
            return Ok((true, AccessLevel::All));
        }

        let Some(own_id) = self.own_employee_id(claims)? else {
            return Ok((false, AccessLevel::None));
        };

        if own_id == target_employee_id {
            return Ok((true, AccessLevel::OwnRecord));
        }

        if self.directory.is_manager_of(own_id, target_employee_id)? {
            return Ok((true, AccessLevel::Subordinate));
        }

        Ok((false, AccessLevel::None))
    }

    /// Decides salary access: privileged roles or the employee themself.
    ///
    /// Managing the target grants nothing here.
    pub fn can_access_salary_data(
        &self,
        claims: &Claims,
        target_employee_id: u64,
    ) -> EngineResult<bool> {
        if Self::has_any_role(claims, &Role::PRIVILEGED) {
            return Ok(true);
        }

        Ok(self.own_employee_id(claims)? == Some(target_employee_id))
    }

    /// Resolves which employees a leave list query may cover.
    pub fn employee_query_scope(
        &self,
        claims: &Claims,
        requested: Option<u64>,
    ) -> EngineResult<QueryScope> {
        self.query_scope(claims, requested, |target| {
            self.can_access_employee_data(claims, target)
                .map(|(allowed, _)| allowed)
        })
    }

    /// Resolves which employees a salary list query may cover.
    pub fn salary_query_scope(
        &self,
        claims: &Claims,
        requested: Option<u64>,
    ) -> EngineResult<QueryScope> {
        self.query_scope(claims, requested, |target| {
            self.can_access_salary_data(claims, target)
        })
    }

    fn query_scope(
        &self,
        claims: &Claims,
        requested: Option<u64>,
        allowed: impl Fn(u64) -> EngineResult<bool>,
    ) -> EngineResult<QueryScope> {
        match requested {
            Some(target) if allowed(target)? => Ok(QueryScope::Employee(target)),
            Some(target) => Err(EngineError::access_denied(format!(
                "user {} may not view employee {}",
                claims.user_id, target
            ))),
            None if Self::has_any_role(claims, &Role::PRIVILEGED) => Ok(QueryScope::All),
            None => Ok(self
                .own_employee_id(claims)?
                .map_or(QueryScope::Nothing, QueryScope::Employee)),
        }
    }

    /// The caller's own employee id: the claim if present, else the directory's answer.
    pub fn own_employee_id(&self, claims: &Claims) -> EngineResult<Option<u64>> {
        match claims.employee_id {
            Some(id) => Ok(Some(id)),
            None => self.directory.resolve_employee_id(claims.user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EmployeeRecord, InMemoryStore};

    /// Directory whose every lookup fails.
    struct BrokenDirectory;

    impl EmployeeDirectory for BrokenDirectory {
        fn resolve_employee_id(&self, _user_id: u64) -> EngineResult<Option<u64>> {
            Ok(Some(1))
        }

        fn is_manager_of(&self, _manager_id: u64, _employee_id: u64) -> EngineResult<bool> {
            Err(EngineError::Store {
                message: "directory offline".to_string(),
            })
        }

        fn department_of(&self, _employee_id: u64) -> EngineResult<Option<u64>> {
            Ok(None)
        }

        fn active_employees(&self, _department_id: Option<u64>) -> EngineResult<Vec<u64>> {
            Ok(Vec::new())
        }
    }

    // 1 manages 2, 2 manages 3; 4 is unrelated. User ids are employee id + 100.
    fn policy() -> AccessPolicy {
        let store = InMemoryStore::new();
        store.add_employee(EmployeeRecord::new(1).with_user(101));
        store.add_employee(EmployeeRecord::new(2).with_user(102).reporting_to(1));
        store.add_employee(EmployeeRecord::new(3).with_user(103).reporting_to(2));
        store.add_employee(EmployeeRecord::new(4).with_user(104));
        AccessPolicy::new(Arc::new(store))
    }

    fn employee(user_id: u64) -> Claims {
        Claims::new(user_id, None, [Role::Employee])
    }

    #[test]
    fn test_hr_sees_everyone() {
        let hr = Claims::new(900, None, [Role::Hr]);
        for target in [1, 3, 999] {
            assert_eq!(
                policy().can_access_employee_data(&hr, target),
                Ok((true, AccessLevel::All))
            );
            assert_eq!(policy().can_access_salary_data(&hr, target), Ok(true));
        }
    }

    #[test]
    fn test_own_record_is_self_level() {
        assert_eq!(
            policy().can_access_employee_data(&employee(103), 3),
            Ok((true, AccessLevel::OwnRecord))
        );
    }

    #[test]
    fn test_transitive_manager_is_subordinate_level() {
        let policy = policy();
        assert_eq!(
            policy.can_access_employee_data(&employee(102), 3),
            Ok((true, AccessLevel::Subordinate))
        );
        assert_eq!(
            policy.can_access_employee_data(&employee(101), 3),
            Ok((true, AccessLevel::Subordinate))
        );
    }

    #[test]
    fn test_unrelated_caller_is_refused() {
        assert_eq!(
            policy().can_access_employee_data(&employee(104), 3),
            Ok((false, AccessLevel::None))
        );
        assert_eq!(
            policy().can_access_employee_data(&employee(103), 2),
            Ok((false, AccessLevel::None))
        );
    }

    #[test]
    fn test_caller_without_employee_record_is_refused_without_error() {
        let claims = employee(555);
        assert_eq!(
            policy().can_access_employee_data(&claims, 1),
            Ok((false, AccessLevel::None))
        );
        assert_eq!(policy().can_access_salary_data(&claims, 1), Ok(false));
    }

    #[test]
    fn test_manager_never_sees_salary() {
        let policy = policy();
        assert_eq!(policy.can_access_salary_data(&employee(102), 3), Ok(false));
        assert_eq!(policy.can_access_salary_data(&employee(103), 3), Ok(true));
    }

    #[test]
    fn test_employee_id_claim_takes_precedence() {
        let claims = Claims::new(555, Some(4), [Role::Employee]);
        assert_eq!(policy().can_access_salary_data(&claims, 4), Ok(true));
    }

    #[test]
    fn test_directory_failure_propagates() {
        let policy = AccessPolicy::new(Arc::new(BrokenDirectory));
        let result = policy.can_access_employee_data(&employee(1), 2);
        assert!(matches!(result, Err(EngineError::Store { .. })));
    }

    #[test]
    fn test_role_membership_is_exact() {
        let manager = Claims::new(1, None, [Role::Manager]);
        assert!(AccessPolicy::has_any_role(&manager, &[Role::Manager, Role::Hr]));
        assert!(!AccessPolicy::has_any_role(&manager, &Role::PRIVILEGED));
        assert!(!AccessPolicy::has_any_role(&manager, &[]));
    }

    #[test]
    fn test_query_scopes() {
        let policy = policy();
        let hr = Claims::new(900, None, [Role::Hr]);

        assert_eq!(policy.employee_query_scope(&hr, None), Ok(QueryScope::All));
        assert_eq!(
            policy.employee_query_scope(&employee(102), None),
            Ok(QueryScope::Employee(2))
        );
        assert_eq!(
            policy.employee_query_scope(&employee(102), Some(3)),
            Ok(QueryScope::Employee(3))
        );
        assert!(matches!(
            policy.salary_query_scope(&employee(102), Some(3)),
            Err(EngineError::AccessDenied { .. })
        ));
        assert_eq!(
            policy.salary_query_scope(&employee(555), None),
            Ok(QueryScope::Nothing)
        );
        assert_eq!(QueryScope::Nothing.employee_ids(), Some(vec![]));
    }
}
