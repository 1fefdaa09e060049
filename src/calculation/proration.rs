//! Attendance ratio and proportional pay components.
//!
//! Base salary and the five allowances are paid in proportion to the days
//! actually worked. A month with zero scheduled work days pays in full and
//! raises a `ZERO_WORK_DAYS` warning instead of failing.

use rust_decimal::Decimal;

use crate::models::{AuditStep, AuditWarning, SalaryComponents};

use super::round2;

/// Warning code raised when the work-day count is zero.
pub const ZERO_WORK_DAYS_WARNING: &str = "ZERO_WORK_DAYS";

/// The result of the attendance ratio rule.
#[derive(Debug, Clone)]
pub struct AttendanceRatioResult {
    /// `actual_days / work_days`, or one when `work_days` is zero.
    pub ratio: Decimal,
    /// Set when the zero-work-days fallback was used.
    pub warning: Option<AuditWarning>,
    /// The audit step recording this rule.
    pub audit_step: AuditStep,
}

/// Determines the share of the month that is paid.
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::attendance_ratio;
/// use rust_decimal::Decimal;
///
/// let half = attendance_ratio(22, 11, 1);
/// assert_eq!(half.ratio, Decimal::new(5, 1));
///
/// let degenerate = attendance_ratio(0, 5, 1);
/// assert_eq!(degenerate.ratio, Decimal::ONE);
/// assert!(degenerate.warning.is_some());
/// ```
pub fn attendance_ratio(work_days: u32, actual_days: u32, step_number: u32) -> AttendanceRatioResult {
    let (ratio, warning, reasoning) = if work_days > 0 {
        let ratio = Decimal::from(actual_days) / Decimal::from(work_days);
        (
            ratio,
            None,
            format!("{} of {} work days attended", actual_days, work_days),
        )
    } else {
        (
            Decimal::ONE,
            Some(AuditWarning {
                code: ZERO_WORK_DAYS_WARNING.to_string(),
                message: format!(
                    "work_days is 0 ({} actual days reported); full pay assumed",
                    actual_days
                ),
                severity: "medium".to_string(),
            }),
            "No work days scheduled; paying the full month".to_string(),
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "attendance_ratio".to_string(),
        rule_name: "Attendance Ratio".to_string(),
        input: serde_json::json!({
            "work_days": work_days,
            "actual_days": actual_days
        }),
        output: serde_json::json!({
            "ratio": ratio.to_string()
        }),
        reasoning,
    };

    AttendanceRatioResult {
        ratio,
        warning,
        audit_step,
    }
}

/// The result of prorating the structure components.
#[derive(Debug, Clone)]
pub struct ProrationResult {
    /// Each component multiplied by the ratio and rounded to cents.
    pub components: SalaryComponents,
    /// The audit step recording this rule.
    pub audit_step: AuditStep,
}

/// Scales each structure component by `ratio`, rounding each independently.
pub fn prorate_components(
    structure: &SalaryComponents,
    ratio: Decimal,
    step_number: u32,
) -> ProrationResult {
    let components = structure.map(|amount| round2(amount * ratio));

    let audit_step = AuditStep {
        step_number,
        rule_id: "proportional_components".to_string(),
        rule_name: "Proportional Components".to_string(),
        input: serde_json::json!({
            "structure": structure,
            "ratio": ratio.to_string()
        }),
        output: serde_json::to_value(components).unwrap_or_default(),
        reasoning: format!(
            "Structure total {} scaled by {} gives {}",
            structure.total(),
            ratio,
            components.total()
        ),
    };

    ProrationResult {
        components,
        audit_step,
    }
}
