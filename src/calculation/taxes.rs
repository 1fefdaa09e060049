//! Fixed-rate taxes and contributions on gross pay.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::TaxRates;
use crate::models::AuditStep;

use super::round2;

/// The five taxes withheld from gross pay, each rounded on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// Personal income tax.
    pub ndfl: Decimal,
    /// Social tax.
    pub social_tax: Decimal,
    /// Pension fund contribution.
    pub pension_fund: Decimal,
    /// Health insurance contribution.
    pub health_insurance: Decimal,
    /// Trade union dues.
    pub trade_union: Decimal,
}

impl TaxBreakdown {
    /// Sum of the five taxes.
    pub fn total(&self) -> Decimal {
        self.ndfl + self.social_tax + self.pension_fund + self.health_insurance + self.trade_union
    }
}

/// The result of the tax rule.
#[derive(Debug, Clone)]
pub struct TaxResult {
    /// The computed taxes.
    pub taxes: TaxBreakdown,
    /// The audit step recording this rule.
    pub audit_step: AuditStep,
}

/// Applies each configured rate to `gross`.
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::calculate_taxes;
/// use hr_engine::config::TaxRates;
/// use rust_decimal::Decimal;
///
/// let result = calculate_taxes(Decimal::from(5_300_000), &TaxRates::default(), 1);
/// assert_eq!(result.taxes.ndfl, Decimal::from(636_000));
/// assert_eq!(result.taxes.total(), Decimal::from(901_000));
/// ```
pub fn calculate_taxes(gross: Decimal, rates: &TaxRates, step_number: u32) -> TaxResult {
    let taxes = TaxBreakdown {
        ndfl: round2(gross * rates.ndfl),
        social_tax: round2(gross * rates.social_tax),
        pension_fund: round2(gross * rates.pension_fund),
        health_insurance: round2(gross * rates.health_insurance),
        trade_union: round2(gross * rates.trade_union),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "fixed_rate_taxes".to_string(),
        rule_name: "Fixed Rate Taxes".to_string(),
        input: serde_json::json!({
            "gross_salary": gross.to_string(),
            "rates": {
                "ndfl": rates.ndfl.to_string(),
                "social_tax": rates.social_tax.to_string(),
                "pension_fund": rates.pension_fund.to_string(),
                "health_insurance": rates.health_insurance.to_string(),
                "trade_union": rates.trade_union.to_string()
            }
        }),
        output: serde_json::to_value(taxes).unwrap_or_default(),
        reasoning: format!("Taxes on gross {} total {}", gross, taxes.total()),
    };

    TaxResult { taxes, audit_step }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_reference_gross_taxes() {
        let result = calculate_taxes(dec("5300000"), &TaxRates::default(), 3);
        assert_eq!(result.taxes.ndfl, dec("636000"));
        assert_eq!(result.taxes.social_tax, dec("26500"));
        assert_eq!(result.taxes.pension_fund, dec("159000"));
        assert_eq!(result.taxes.health_insurance, dec("26500"));
        assert_eq!(result.taxes.trade_union, dec("53000"));
        assert_eq!(result.audit_step.rule_id, "fixed_rate_taxes");
        assert_eq!(result.audit_step.step_number, 3);
    }

    #[test]
    fn test_each_tax_rounds_independently() {
        // 0.005 * 100.01 = 0.50005 -> 0.50; 0.12 * 100.01 = 12.0012 -> 12.00
        let result = calculate_taxes(dec("100.01"), &TaxRates::default(), 1);
        assert_eq!(result.taxes.social_tax, dec("0.50"));
        assert_eq!(result.taxes.ndfl, dec("12.00"));
        assert_eq!(result.taxes.pension_fund, dec("3.00"));
        assert_eq!(result.taxes.trade_union, dec("1.00"));
    }

    #[test]
    fn test_zero_gross_has_no_taxes() {
        let result = calculate_taxes(Decimal::ZERO, &TaxRates::default(), 1);
        assert_eq!(result.taxes.total(), Decimal::ZERO);
    }
}
