//! Overtime pay.

use rust_decimal::Decimal;

use crate::config::OvertimeRules;
use crate::models::AuditStep;

use super::round2;

/// The result of the overtime rule.
#[derive(Debug, Clone)]
pub struct OvertimeResult {
    /// The hourly rate derived from the full-month base salary.
    pub hourly_rate: Decimal,
    /// Overtime pay, rounded to cents.
    pub amount: Decimal,
    /// The audit step recording this rule.
    pub audit_step: AuditStep,
}

/// Calculates overtime pay from the unprorated base salary.
///
/// `hourly_rate = base_salary / (work_days * hours_per_day)` and
/// `amount = round2(hourly_rate * multiplier * overtime_hours)`. Nothing is
/// paid when either the work-day count or the overtime hours are zero.
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::calculate_overtime;
/// use hr_engine::config::OvertimeRules;
/// use rust_decimal::Decimal;
///
/// // 1,760,000 / (22 * 8) = 10,000 per hour; 4h at 1.5x = 60,000
/// let result = calculate_overtime(
///     Decimal::from(1_760_000),
///     22,
///     Decimal::from(4),
///     &OvertimeRules::default(),
///     1,
/// );
/// assert_eq!(result.amount, Decimal::from(60_000));
/// ```
pub fn calculate_overtime(
    base_salary: Decimal,
    work_days: u32,
    overtime_hours: Decimal,
    rules: &OvertimeRules,
    step_number: u32,
) -> OvertimeResult {
    let hours_in_month = Decimal::from(work_days) * Decimal::from(rules.hours_per_day);

    let (hourly_rate, amount, reasoning) =
        if work_days > 0 && overtime_hours > Decimal::ZERO && !hours_in_month.is_zero() {
            let hourly_rate = base_salary / hours_in_month;
            let amount = round2(hourly_rate * rules.multiplier * overtime_hours);
            (
                hourly_rate,
                amount,
                format!(
                    "{}h overtime at {} x {} per hour",
                    overtime_hours,
                    rules.multiplier,
                    round2(hourly_rate)
                ),
            )
        } else {
            (
                Decimal::ZERO,
                Decimal::ZERO,
                "No overtime payable".to_string(),
            )
        };

    let audit_step = AuditStep {
        step_number,
        rule_id: "overtime".to_string(),
        rule_name: "Overtime".to_string(),
        input: serde_json::json!({
            "base_salary": base_salary.to_string(),
            "work_days": work_days,
            "overtime_hours": overtime_hours.to_string(),
            "hours_per_day": rules.hours_per_day,
            "multiplier": rules.multiplier.to_string()
        }),
        output: serde_json::json!({
            "hourly_rate": round2(hourly_rate).to_string(),
            "amount": amount.to_string()
        }),
        reasoning,
    };

    OvertimeResult {
        hourly_rate,
        amount,
        audit_step,
    }
}
