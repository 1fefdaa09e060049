//! Salary record, salary structure and line item models.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Period;

/// Lifecycle status of a salary record.
///
/// `draft -> calculated -> approved -> paid`, no skipping, no going back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryStatus {
    /// Created, amounts not yet computed.
    Draft,
    /// Amounts computed from the active structure.
    Calculated,
    /// Approved for payment.
    Approved,
    /// Paid out.
    Paid,
}

impl SalaryStatus {
    /// The canonical wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryStatus::Draft => "draft",
            SalaryStatus::Calculated => "calculated",
            SalaryStatus::Approved => "approved",
            SalaryStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for SalaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six proportional pay components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryComponents {
    /// Base monthly salary.
    pub base_salary: Decimal,
    /// Regional allowance.
    pub regional_allowance: Decimal,
    /// Seniority allowance.
    pub seniority_allowance: Decimal,
    /// Qualification allowance.
    pub qualification_allowance: Decimal,
    /// Hazardous-conditions allowance.
    pub hazard_allowance: Decimal,
    /// Night-shift allowance.
    pub night_shift_allowance: Decimal,
}

impl SalaryComponents {
    /// Sum of all six components.
    pub fn total(&self) -> Decimal {
        self.base_salary
            + self.regional_allowance
            + self.seniority_allowance
            + self.qualification_allowance
            + self.hazard_allowance
            + self.night_shift_allowance
    }

    /// Applies `f` to every component.
    pub fn map(&self, f: impl Fn(Decimal) -> Decimal) -> Self {
        Self {
            base_salary: f(self.base_salary),
            regional_allowance: f(self.regional_allowance),
            seniority_allowance: f(self.seniority_allowance),
            qualification_allowance: f(self.qualification_allowance),
            hazard_allowance: f(self.hazard_allowance),
            night_shift_allowance: f(self.night_shift_allowance),
        }
    }
}

/// Effective-dated compensation template of an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryStructure {
    /// The employee the structure belongs to.
    pub employee_id: u64,
    /// Monthly amounts at full attendance.
    #[serde(flatten)]
    pub components: SalaryComponents,
    /// First day the structure applies.
    pub effective_from: NaiveDate,
    /// First day the structure no longer applies; open-ended when absent.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

impl SalaryStructure {
    /// Returns true if the structure applies on `date`.
    ///
    /// ```
    /// use hr_engine::models::{SalaryComponents, SalaryStructure};
    /// use chrono::NaiveDate;
    ///
    /// let structure = SalaryStructure {
    ///     employee_id: 1,
    ///     components: SalaryComponents::default(),
    ///     effective_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    ///     effective_to: Some(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()),
    /// };
    /// assert!(structure.is_active_on(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()));
    /// assert!(!structure.is_active_on(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()));
    /// ```
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.is_none_or(|to| date < to)
    }
}

/// One payroll record for an employee and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRecord {
    /// Record identifier.
    pub id: u64,
    /// The employee being paid.
    pub employee_id: u64,
    /// Payroll year.
    pub period_year: i32,
    /// Payroll month.
    pub period_month: u32,
    /// Lifecycle status.
    pub status: SalaryStatus,
    /// Prorated pay components.
    #[serde(flatten)]
    pub components: SalaryComponents,
    /// Overtime pay.
    pub overtime_amount: Decimal,
    /// Sum of bonus lines.
    pub bonus_amount: Decimal,
    /// Gross pay.
    pub gross_salary: Decimal,
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
    /// All taxes plus deduction lines.
    pub total_deductions: Decimal,
    /// Net pay.
    pub net_salary: Decimal,
    /// Scheduled work days in the period.
    pub work_days: u32,
    /// Days actually worked.
    pub actual_days: u32,
    /// Overtime hours worked.
    pub overtime_hours: Decimal,
    /// Who approved the record.
    pub approved_by: Option<u64>,
    /// When the record was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the record was paid.
    pub paid_at: Option<DateTime<Utc>>,
}

impl SalaryRecord {
    /// A fresh draft with zero amounts.
    pub fn draft(id: u64, employee_id: u64, period: Period) -> Self {
        Self {
            id,
            employee_id,
            period_year: period.year,
            period_month: period.month,
            status: SalaryStatus::Draft,
            components: SalaryComponents::default(),
            overtime_amount: Decimal::ZERO,
            bonus_amount: Decimal::ZERO,
            gross_salary: Decimal::ZERO,
            ndfl: Decimal::ZERO,
            social_tax: Decimal::ZERO,
            pension_fund: Decimal::ZERO,
            health_insurance: Decimal::ZERO,
            trade_union: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            net_salary: Decimal::ZERO,
            work_days: 0,
            actual_days: 0,
            overtime_hours: Decimal::ZERO,
            approved_by: None,
            approved_at: None,
            paid_at: None,
        }
    }

    /// The payroll period of the record.
    pub fn period(&self) -> Period {
        Period {
            year: self.period_year,
            month: self.period_month,
        }
    }
}

/// Whether a line item adds to or subtracts from pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Added to gross pay.
    Bonus,
    /// Added to total deductions.
    Deduction,
}

/// A bonus or deduction supplied with a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Free-form category (e.g. "quarterly", "loan").
    #[serde(rename = "type")]
    pub line_type: String,
    /// The amount, never prorated.
    pub amount: Decimal,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A persisted bonus or deduction attached to a salary record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryLine {
    /// Line identifier.
    pub id: u64,
    /// The salary record the line belongs to.
    pub salary_id: u64,
    /// Bonus or deduction.
    pub kind: LineKind,
    /// The line contents.
    #[serde(flatten)]
    pub item: LineItem,
}

/// Inputs to a salary calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationInput {
    /// Scheduled work days in the period.
    pub work_days: u32,
    /// Days actually worked.
    pub actual_days: u32,
    /// Overtime hours worked.
    #[serde(default)]
    pub overtime_hours: Decimal,
    /// Bonus lines.
    #[serde(default)]
    pub bonuses: Vec<LineItem>,
    /// Deduction lines.
    #[serde(default)]
    pub deductions: Vec<LineItem>,
}

/// Filter for listing salary records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryFilter {
    /// Restrict to these employees; `None` means every employee.
    #[serde(default)]
    pub employee_ids: Option<Vec<u64>>,
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

impl SalaryFilter {
    /// Returns true if `record` passes the filter.
    pub fn matches(&self, record: &SalaryRecord) -> bool {
        self.employee_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&record.employee_id))
            && self.period_year.is_none_or(|y| y == record.period_year)
            && self.period_month.is_none_or(|m| m == record.period_month)
            && self.status.is_none_or(|s| s == record.status)
    }
}
