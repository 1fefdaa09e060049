//! Persistence and directory contracts consumed by the engines.
//!
//! Every guarded transition is a single compare-and-set call: the store
//! re-checks the expected status and applies the change (and any balance
//! adjustments) as one atomic unit. Two callers racing on the same record
//! therefore see exactly one success; the other gets `InvalidStatus`.
//!
//! Vacation writes carry their own preconditions the same way: the store
//! re-checks overlap with live requests and the remaining balance inside the
//! write, so racing creates or submits cannot overbook an employee.

mod memory;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::calculation::SalaryBreakdown;
use crate::error::EngineResult;
use crate::models::{
    BalanceAdjustment, BlockedPeriod, LineItem, LineKind, NewVacationRequest, Period,
    SalaryFilter, SalaryLine, SalaryRecord, SalaryStatus, SalaryStructure, VacationBalance,
    VacationFilter, VacationRequest, VacationStatus,
};

pub use memory::{EmployeeRecord, InMemoryStore};

/// A status transition of a salary record together with the fields it writes.
#[derive(Debug, Clone, PartialEq)]
pub enum SalaryChange {
    /// `draft -> calculated`, writing every computed amount and the inputs.
    Calculated {
        /// The computed amounts.
        breakdown: SalaryBreakdown,
        /// Scheduled work days.
        work_days: u32,
        /// Days actually worked.
        actual_days: u32,
        /// Overtime hours worked.
        overtime_hours: Decimal,
    },
    /// `calculated -> approved`.
    Approved {
        /// The approver.
        approved_by: u64,
        /// Approval time.
        approved_at: DateTime<Utc>,
    },
    /// `approved -> paid`.
    Paid {
        /// Payment time.
        paid_at: DateTime<Utc>,
    },
}

impl SalaryChange {
    /// The status the record has after the change.
    pub fn target_status(&self) -> SalaryStatus {
        match self {
            SalaryChange::Calculated { .. } => SalaryStatus::Calculated,
            SalaryChange::Approved { .. } => SalaryStatus::Approved,
            SalaryChange::Paid { .. } => SalaryStatus::Paid,
        }
    }

    /// The operation name reported when the transition is refused.
    pub fn operation(&self) -> &'static str {
        match self {
            SalaryChange::Calculated { .. } => "calculate",
            SalaryChange::Approved { .. } => "approve",
            SalaryChange::Paid { .. } => "pay",
        }
    }

    /// Writes the change into `record`, status included.
    pub fn apply_to(&self, record: &mut SalaryRecord) {
        match self {
            SalaryChange::Calculated {
                breakdown,
                work_days,
                actual_days,
                overtime_hours,
            } => {
                record.components = breakdown.components;
                record.overtime_amount = breakdown.overtime_amount;
                record.bonus_amount = breakdown.bonus_amount;
                record.gross_salary = breakdown.gross_salary;
                record.ndfl = breakdown.taxes.ndfl;
                record.social_tax = breakdown.taxes.social_tax;
                record.pension_fund = breakdown.taxes.pension_fund;
                record.health_insurance = breakdown.taxes.health_insurance;
                record.trade_union = breakdown.taxes.trade_union;
                record.total_deductions = breakdown.total_deductions;
                record.net_salary = breakdown.net_salary;
                record.work_days = *work_days;
                record.actual_days = *actual_days;
                record.overtime_hours = *overtime_hours;
            }
            SalaryChange::Approved {
                approved_by,
                approved_at,
            } => {
                record.approved_by = Some(*approved_by);
                record.approved_at = Some(*approved_at);
            }
            SalaryChange::Paid { paid_at } => {
                record.paid_at = Some(*paid_at);
            }
        }
        record.status = self.target_status();
    }
}

/// A status transition of a vacation request together with the fields it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VacationChange {
    /// `draft -> pending`.
    Submitted,
    /// `pending -> approved`.
    Approved {
        /// The approver.
        approved_by: u64,
        /// Approval time.
        approved_at: DateTime<Utc>,
    },
    /// `pending -> rejected`.
    Rejected {
        /// Why the request was refused.
        reason: String,
    },
    /// `draft | pending | approved -> cancelled`.
    Cancelled,
}

impl VacationChange {
    /// The status the request has after the change.
    pub fn target_status(&self) -> VacationStatus {
        match self {
            VacationChange::Submitted => VacationStatus::Pending,
            VacationChange::Approved { .. } => VacationStatus::Approved,
            VacationChange::Rejected { .. } => VacationStatus::Rejected,
            VacationChange::Cancelled => VacationStatus::Cancelled,
        }
    }

    /// The operation name reported when the transition is refused.
    pub fn operation(&self) -> &'static str {
        match self {
            VacationChange::Submitted => "submit",
            VacationChange::Approved { .. } => "approve",
            VacationChange::Rejected { .. } => "reject",
            VacationChange::Cancelled => "cancel",
        }
    }

    /// Writes the change into `request`, status included.
    pub fn apply_to(&self, request: &mut VacationRequest) {
        match self {
            VacationChange::Approved {
                approved_by,
                approved_at,
            } => {
                request.approved_by = Some(*approved_by);
                request.approved_at = Some(*approved_at);
            }
            VacationChange::Rejected { reason } => {
                request.rejection_reason = Some(reason.clone());
            }
            VacationChange::Submitted | VacationChange::Cancelled => {}
        }
        request.status = self.target_status();
    }
}

/// Storage of salary records, structures and line items.
pub trait SalaryStore: Send + Sync {
    /// Inserts a zero-amount draft.
    ///
    /// Fails with `Duplicate` if the employee already has a record for the
    /// period and with `ForeignKeyViolation` if the employee is unknown.
    fn insert_salary(&self, employee_id: u64, period: Period) -> EngineResult<SalaryRecord>;

    /// Looks up a record by id.
    fn get_salary(&self, id: u64) -> EngineResult<Option<SalaryRecord>>;

    /// Looks up the record of an employee for a period.
    fn find_salary(&self, employee_id: u64, period: Period) -> EngineResult<Option<SalaryRecord>>;

    /// Lists records passing `filter`, ordered by id.
    fn list_salaries(&self, filter: &SalaryFilter) -> EngineResult<Vec<SalaryRecord>>;

    /// Applies `change` if the record is still in `expected` status.
    ///
    /// Fails with `NotFound` for an unknown id and `InvalidStatus` if the
    /// status differs.
    fn transition_salary(
        &self,
        id: u64,
        expected: SalaryStatus,
        change: SalaryChange,
    ) -> EngineResult<SalaryRecord>;

    /// Removes the record if it is still in `expected` status.
    fn delete_salary(&self, id: u64, expected: SalaryStatus) -> EngineResult<()>;

    /// Every structure of an employee, in any order.
    fn salary_structures(&self, employee_id: u64) -> EngineResult<Vec<SalaryStructure>>;

    /// Attaches a bonus or deduction line to a record.
    fn insert_salary_line(
        &self,
        salary_id: u64,
        kind: LineKind,
        item: &LineItem,
    ) -> EngineResult<SalaryLine>;

    /// Every line attached to a record, in insertion order.
    fn salary_lines(&self, salary_id: u64) -> EngineResult<Vec<SalaryLine>>;
}

/// Storage of vacation requests, balances and blocked periods.
pub trait LeaveStore: Send + Sync {
    /// Inserts a request in `status` and applies `adjustments` atomically.
    ///
    /// Within the same unit, fails with `InsufficientBalance` if an
    /// adjustment would take a year's remaining days below zero (a missing
    /// balance has none), `VacationOverlap` if a live request of the employee
    /// intersects the range, and `ForeignKeyViolation` if the employee, the
    /// substitute or the vacation type is unknown.
    fn insert_vacation(
        &self,
        request: &NewVacationRequest,
        days: i32,
        status: VacationStatus,
        adjustments: &[BalanceAdjustment],
    ) -> EngineResult<VacationRequest>;

    /// Looks up a request by id.
    fn get_vacation(&self, id: u64) -> EngineResult<Option<VacationRequest>>;

    /// Lists requests passing `filter`, ordered by start date then id.
    fn list_vacations(&self, filter: &VacationFilter) -> EngineResult<Vec<VacationRequest>>;

    /// Applies `change` and `adjustments` if the request is still in `expected` status.
    ///
    /// Fails with `InsufficientBalance`, leaving the request untouched, if an
    /// adjustment would take a year's remaining days below zero.
    fn transition_vacation(
        &self,
        id: u64,
        expected: VacationStatus,
        change: VacationChange,
        adjustments: &[BalanceAdjustment],
    ) -> EngineResult<VacationRequest>;

    /// Removes the request if it is still in `expected` status.
    fn delete_vacation(&self, id: u64, expected: VacationStatus) -> EngineResult<()>;

    /// The balance of an employee for a year.
    fn get_balance(&self, employee_id: u64, year: i32) -> EngineResult<Option<VacationBalance>>;

    /// Stores a new balance; `Duplicate` if one exists for the employee and year.
    fn insert_balance(&self, balance: VacationBalance) -> EngineResult<VacationBalance>;

    /// Blocked periods of a department.
    fn blocked_periods(&self, department_id: u64) -> EngineResult<Vec<BlockedPeriod>>;
}

/// Employee directory and reporting hierarchy.
pub trait EmployeeDirectory: Send + Sync {
    /// The employee linked to a user; `None` if the user has no employee record.
    fn resolve_employee_id(&self, user_id: u64) -> EngineResult<Option<u64>>;

    /// Returns true if `manager_id` is anywhere above `employee_id` in the
    /// reporting chain.
    fn is_manager_of(&self, manager_id: u64, employee_id: u64) -> EngineResult<bool>;

    /// The department of an employee.
    fn department_of(&self, employee_id: u64) -> EngineResult<Option<u64>>;

    /// Active employees, optionally restricted to one department.
    fn active_employees(&self, department_id: Option<u64>) -> EngineResult<Vec<u64>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::calculate_salary;
    use crate::config::PayrollConfig;
    use crate::models::{CalculationInput, SalaryComponents};

    #[test]
    fn test_calculated_change_writes_amounts_and_status() {
        let structure = SalaryComponents {
            base_salary: Decimal::from(1000),
            ..Default::default()
        };
        let input = CalculationInput {
            work_days: 10,
            actual_days: 5,
            ..Default::default()
        };
        let breakdown = calculate_salary(&structure, &input, &PayrollConfig::default()).breakdown;
        let mut record = SalaryRecord::draft(1, 1, Period::new(2025, 1).unwrap());

        SalaryChange::Calculated {
            breakdown: breakdown.clone(),
            work_days: 10,
            actual_days: 5,
            overtime_hours: Decimal::ZERO,
        }
        .apply_to(&mut record);

        assert_eq!(record.status, SalaryStatus::Calculated);
        assert_eq!(record.components.base_salary, Decimal::from(500));
        assert_eq!(record.gross_salary, breakdown.gross_salary);
        assert_eq!(record.net_salary, breakdown.net_salary);
        assert_eq!(record.work_days, 10);
        assert_eq!(record.actual_days, 5);
    }

    #[test]
    fn test_rejected_change_records_reason() {
        let mut request = VacationRequest {
            id: 1,
            employee_id: 1,
            vacation_type_id: 1,
            start_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            days: 2,
            status: VacationStatus::Pending,
            reason: None,
            rejection_reason: None,
            substitute_employee_id: None,
            approved_by: None,
            approved_at: None,
        };
        VacationChange::Rejected {
            reason: "peak season".to_string(),
        }
        .apply_to(&mut request);

        assert_eq!(request.status, VacationStatus::Rejected);
        assert_eq!(request.rejection_reason.as_deref(), Some("peak season"));
    }
}
