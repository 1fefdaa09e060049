//! Full salary calculation for one record.
//!
//! Runs the individual rules in order and assembles the amounts that are
//! written back to the salary record:
//!
//! 1. attendance ratio
//! 2. proportional components
//! 3. overtime
//! 4. bonuses
//! 5. gross
//! 6. taxes
//! 7. deductions and net

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PayrollConfig;
use crate::models::{AuditStep, AuditTrace, CalculationInput, SalaryComponents};

use super::{TaxBreakdown, attendance_ratio, calculate_overtime, calculate_taxes, prorate_components, round2};

/// Every amount produced by a salary calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryBreakdown {
    /// The ratio the components were scaled by.
    pub ratio: Decimal,
    /// Prorated components.
    pub components: SalaryComponents,
    /// Overtime pay.
    pub overtime_amount: Decimal,
    /// Sum of bonus lines.
    pub bonus_amount: Decimal,
    /// Gross pay.
    pub gross_salary: Decimal,
    /// Withheld taxes.
    pub taxes: TaxBreakdown,
    /// Sum of deduction lines.
    pub line_deductions: Decimal,
    /// Taxes plus deduction lines.
    pub total_deductions: Decimal,
    /// Net pay.
    pub net_salary: Decimal,
}

/// A salary breakdown together with its audit trace.
#[derive(Debug, Clone)]
pub struct SalaryCalculation {
    /// The computed amounts.
    pub breakdown: SalaryBreakdown,
    /// How the amounts were reached.
    pub audit: AuditTrace,
}

/// Calculates pay from a structure and the attendance inputs.
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::calculate_salary;
/// use hr_engine::config::PayrollConfig;
/// use hr_engine::models::{CalculationInput, SalaryComponents};
/// use rust_decimal::Decimal;
///
/// let structure = SalaryComponents {
///     base_salary: Decimal::from(5_000_000),
///     regional_allowance: Decimal::from(300_000),
///     ..Default::default()
/// };
/// let input = CalculationInput { work_days: 22, actual_days: 22, ..Default::default() };
///
/// let result = calculate_salary(&structure, &input, &PayrollConfig::default());
/// assert_eq!(result.breakdown.gross_salary, Decimal::from(5_300_000));
/// assert_eq!(result.breakdown.net_salary, Decimal::from(4_399_000));
/// ```
pub fn calculate_salary(
    structure: &SalaryComponents,
    input: &CalculationInput,
    config: &PayrollConfig,
) -> SalaryCalculation {
    let mut audit = AuditTrace::default();

    let ratio_result = attendance_ratio(input.work_days, input.actual_days, audit.next_step_number());
    let ratio = ratio_result.ratio;
    audit.steps.push(ratio_result.audit_step);
    audit.warnings.extend(ratio_result.warning);

    let proration = prorate_components(structure, ratio, audit.next_step_number());
    let components = proration.components;
    audit.steps.push(proration.audit_step);

    let overtime = calculate_overtime(
        structure.base_salary,
        input.work_days,
        input.overtime_hours,
        &config.overtime,
        audit.next_step_number(),
    );
    let overtime_amount = overtime.amount;
    audit.steps.push(overtime.audit_step);

    let bonus_amount = round2(input.bonuses.iter().map(|b| b.amount).sum());
    audit.steps.push(AuditStep {
        step_number: audit.next_step_number(),
        rule_id: "bonus_lines".to_string(),
        rule_name: "Bonus Lines".to_string(),
        input: serde_json::to_value(&input.bonuses).unwrap_or_default(),
        output: serde_json::json!({ "bonus_amount": bonus_amount.to_string() }),
        reasoning: format!("{} bonus line(s), not prorated", input.bonuses.len()),
    });

    let gross_salary = round2(components.total() + overtime_amount + bonus_amount);
    audit.steps.push(AuditStep {
        step_number: audit.next_step_number(),
        rule_id: "gross_salary".to_string(),
        rule_name: "Gross Salary".to_string(),
        input: serde_json::json!({
            "components_total": components.total().to_string(),
            "overtime_amount": overtime_amount.to_string(),
            "bonus_amount": bonus_amount.to_string()
        }),
        output: serde_json::json!({ "gross_salary": gross_salary.to_string() }),
        reasoning: "Components plus overtime plus bonuses".to_string(),
    });

    let tax_result = calculate_taxes(gross_salary, &config.taxes, audit.next_step_number());
    let taxes = tax_result.taxes;
    audit.steps.push(tax_result.audit_step);

    let line_deductions: Decimal = input.deductions.iter().map(|d| d.amount).sum();
    let total_deductions = round2(taxes.total() + line_deductions);
    let net_salary = round2(gross_salary - total_deductions);
    audit.steps.push(AuditStep {
        step_number: audit.next_step_number(),
        rule_id: "net_salary".to_string(),
        rule_name: "Net Salary".to_string(),
        input: serde_json::json!({
            "gross_salary": gross_salary.to_string(),
            "taxes_total": taxes.total().to_string(),
            "deduction_lines": input.deductions.len(),
            "line_deductions": line_deductions.to_string()
        }),
        output: serde_json::json!({
            "total_deductions": total_deductions.to_string(),
            "net_salary": net_salary.to_string()
        }),
        reasoning: format!("Gross {} less deductions {}", gross_salary, total_deductions),
    });

    SalaryCalculation {
        breakdown: SalaryBreakdown {
            ratio,
            components,
            overtime_amount,
            bonus_amount,
            gross_salary,
            taxes,
            line_deductions,
            total_deductions,
            net_salary,
        },
        audit,
    }
}
