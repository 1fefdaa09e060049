//! Core data models for the HR engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod identity;
mod period;
mod salary;
mod vacation;

pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub use identity::{AccessLevel, Claims, Role};
pub use period::Period;
pub use salary::{
    CalculationInput, LineItem, LineKind, SalaryComponents, SalaryFilter, SalaryLine,
    SalaryRecord, SalaryStatus, SalaryStructure,
};
pub use vacation::{
    BalanceAdjustment, BlockedPeriod, CalendarEntry, CalendarFilter, NewVacationRequest,
    VacationBalance, VacationFilter, VacationRequest, VacationStatus, VacationType,
    days_per_year, inclusive_days, ranges_overlap,
};
