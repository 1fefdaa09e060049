//! HTTP API module for the HR engine.
//!
//! This module exposes the payroll and leave operations as REST endpoints.
//! The caller's identity is read from trusted gateway headers
//! (`x-user-id`, `x-employee-id`, `x-roles`).

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    BulkCalculateRequest, CalendarQuery, Caller, CreateSalaryRequest, CreateVacationRequest,
    EMPLOYEE_ID_HEADER, OpenBalanceRequest, ROLES_HEADER, RejectVacationRequest,
    SalaryListQuery, USER_ID_HEADER, VacationListQuery, claims_from_headers,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
