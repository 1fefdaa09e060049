//! Request types for the HR engine API.
//!
//! JSON bodies and query strings for the salary and vacation endpoints, and
//! the [`Caller`] extractor that turns trusted gateway headers into claims.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{Claims, NewVacationRequest, SalaryStatus, VacationStatus};

use super::response::ApiErrorResponse;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the employee id linked to the user.
pub const EMPLOYEE_ID_HEADER: &str = "x-employee-id";
/// Header carrying the comma-separated role names.
pub const ROLES_HEADER: &str = "x-roles";

/// The verified identity of the caller.
///
/// The gateway in front of the service authenticates the request and
/// forwards the claims in headers; they are trusted verbatim.
#[derive(Debug, Clone)]
pub struct Caller(pub Claims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        claims_from_headers(&parts.headers)
            .map(Caller)
            .map_err(ApiErrorResponse::from)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Reads claims from the identity headers.
///
/// A missing or non-numeric user id, or a non-numeric employee id, is
/// `Unauthenticated`. Unknown role names are ignored.
pub fn claims_from_headers(headers: &HeaderMap) -> EngineResult<Claims> {
    let user_id = header_str(headers, USER_ID_HEADER)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or(EngineError::Unauthenticated)?;

    let employee_id = match header_str(headers, EMPLOYEE_ID_HEADER) {
        Some(v) => Some(
            v.trim()
                .parse::<u64>()
                .map_err(|_| EngineError::Unauthenticated)?,
        ),
        None => None,
    };

    let roles = header_str(headers, ROLES_HEADER)
        .unwrap_or_default()
        .split(',')
        .filter(|name| !name.trim().is_empty());

    Ok(Claims::from_role_names(user_id, employee_id, roles))
}

/// Body of `POST /salaries`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSalaryRequest {
    /// The employee to pay.
    pub employee_id: u64,
    /// Payroll year.
    pub period_year: i32,
    /// Payroll month.
    pub period_month: u32,
}

/// Body of `POST /salaries/bulk-calculate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCalculateRequest {
    /// Payroll year.
    pub period_year: i32,
    /// Payroll month.
    pub period_month: u32,
    /// Restrict the run to one department.
    #[serde(default)]
    pub department_id: Option<u64>,
}

/// Query of `GET /salaries`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalaryListQuery {
    /// Restrict to one employee.
    #[serde(default)]
    pub employee_id: Option<u64>,
    /// Restrict to one year.
    #[serde(default)]
    pub period_year: Option<i32>,
    /// Restrict to one month.
    #[serde(default)]
    pub period_month: Option<u32>,
    /// Restrict to one status.
    #[serde(default)]
    pub status: Option<SalaryStatus>,
}

/// Body of `POST /vacations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVacationRequest {
    /// The employee taking leave; defaults to the caller.
    #[serde(default)]
    pub employee_id: Option<u64>,
    /// The kind of leave.
    pub vacation_type_id: u64,
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Who covers for the employee.
    #[serde(default)]
    pub substitute_employee_id: Option<u64>,
    /// Why the employee asks for leave.
    #[serde(default)]
    pub reason: Option<String>,
    /// Save as a draft instead of submitting right away.
    #[serde(default)]
    pub as_draft: bool,
}

impl CreateVacationRequest {
    /// The engine request for the resolved employee.
    pub fn into_new_request(self, employee_id: u64) -> NewVacationRequest {
        NewVacationRequest {
            employee_id,
            vacation_type_id: self.vacation_type_id,
            start_date: self.start_date,
            end_date: self.end_date,
            substitute_employee_id: self.substitute_employee_id,
            reason: self.reason,
            as_draft: self.as_draft,
        }
    }
}

/// Body of `POST /vacations/:id/reject`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectVacationRequest {
    /// Why the request is refused.
    pub reason: String,
}

/// Body of `POST /vacations/balance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenBalanceRequest {
    /// The employee.
    pub employee_id: u64,
    /// The calendar year.
    pub year: i32,
    /// Days carried over from the previous year.
    #[serde(default)]
    pub carried_over_days: i32,
}

/// Query of `GET /vacations`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VacationListQuery {
    /// Restrict to one employee.
    #[serde(default)]
    pub employee_id: Option<u64>,
    /// Restrict to one status.
    #[serde(default)]
    pub status: Option<VacationStatus>,
    /// Keep requests ending on or after this day.
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Keep requests starting on or before this day.
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

/// Query of `GET /vacations/calendar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarQuery {
    /// First day shown.
    pub from: NaiveDate,
    /// Last day shown.
    pub to: NaiveDate,
    /// Restrict to one department.
    #[serde(default)]
    pub department_id: Option<u64>,
    /// Restrict to one employee.
    #[serde(default)]
    pub employee_id: Option<u64>,
    /// Show pending requests next to approved ones.
    #[serde(default)]
    pub include_pending: bool,
}
