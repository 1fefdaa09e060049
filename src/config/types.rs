//! Configuration types for payroll and leave rules.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Fixed tax and contribution rates applied to gross pay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaxRates {
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

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            ndfl: Decimal::new(12, 2),
            social_tax: Decimal::new(5, 3),
            pension_fund: Decimal::new(3, 2),
            health_insurance: Decimal::new(5, 3),
            trade_union: Decimal::new(1, 2),
        }
    }
}

/// Overtime pay rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OvertimeRules {
    /// Multiplier on the hourly rate.
    pub multiplier: Decimal,
    /// Hours in a standard work day.
    pub hours_per_day: u32,
}

impl Default for OvertimeRules {
    fn default() -> Self {
        Self {
            multiplier: Decimal::new(15, 1),
            hours_per_day: 8,
        }
    }
}

/// Payroll configuration from payroll.yaml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PayrollConfig {
    /// Tax rates.
    pub taxes: TaxRates,
    /// Overtime rules.
    pub overtime: OvertimeRules,
}

/// Leave configuration from leave.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeaveConfig {
    /// Days granted when a yearly balance is opened.
    pub annual_entitlement_days: i32,
}

impl Default for LeaveConfig {
    fn default() -> Self {
        Self {
            annual_entitlement_days: 21,
        }
    }
}

/// The complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Payroll rules.
    pub payroll: PayrollConfig,
    /// Leave rules.
    pub leave: LeaveConfig,
}
