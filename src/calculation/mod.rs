//! Calculation logic for the compensation engine.
//!
//! This module contains the pure payroll arithmetic: cent rounding, the
//! attendance ratio and proportional components, overtime, fixed-rate taxes,
//! and the full salary calculation that chains them together.

mod overtime;
mod proration;
mod rounding;
mod salary;
mod taxes;

pub use overtime::{OvertimeResult, calculate_overtime};
pub use proration::{
    AttendanceRatioResult, ProrationResult, ZERO_WORK_DAYS_WARNING, attendance_ratio,
    prorate_components,
};
pub use rounding::round2;
pub use salary::{SalaryBreakdown, SalaryCalculation, calculate_salary};
pub use taxes::{TaxBreakdown, TaxResult, calculate_taxes};
