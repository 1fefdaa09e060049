//! Payroll record lifecycle.
//!
//! ```text
//! draft --calculate--> calculated --approve--> approved --mark_paid--> paid
//! draft --delete--> (removed)
//! ```

use std::sync::Arc;

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calculation::{ZERO_WORK_DAYS_WARNING, calculate_salary};
use crate::clock::Clock;
use crate::config::PayrollConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditTrace, CalculationInput, LineItem, LineKind, Period, SalaryFilter, SalaryLine,
    SalaryRecord, SalaryStatus, SalaryStructure,
};
use crate::store::{EmployeeDirectory, SalaryChange, SalaryStore};

/// The result of a committed calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationOutcome {
    /// The record in `calculated` status.
    pub record: SalaryRecord,
    /// How the amounts were reached.
    pub audit: AuditTrace,
    /// Bonus and deduction lines whose write failed after the calculation committed.
    pub unsaved_line_items: Vec<UnsavedLineItem>,
}

/// A line item that could not be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsavedLineItem {
    /// Bonus or deduction.
    pub kind: LineKind,
    /// The line contents.
    pub item: LineItem,
    /// Why the write failed.
    pub reason: String,
}

/// Summary of a bulk calculation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkOutcome {
    /// Employees whose record was created and calculated.
    pub calculated: usize,
    /// Employees that already had a record for the period.
    pub skipped: usize,
    /// Employees whose create or calculate step failed.
    pub failed: Vec<BulkFailure>,
}

/// One employee that failed during a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkFailure {
    /// The employee.
    pub employee_id: u64,
    /// Why the unit failed.
    pub reason: String,
}

enum BulkUnit {
    Calculated,
    Skipped,
    Failed(BulkFailure),
}

/// Owns salary records from creation to payment.
#[derive(Clone)]
pub struct CompensationEngine {
    store: Arc<dyn SalaryStore>,
    directory: Arc<dyn EmployeeDirectory>,
    clock: Arc<dyn Clock>,
    config: PayrollConfig,
}

impl CompensationEngine {
    /// Creates an engine over the given collaborators.
    pub fn new(
        store: Arc<dyn SalaryStore>,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
        config: PayrollConfig,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            config,
        }
    }

    /// Inserts a zero-amount draft for an employee and period.
    pub fn create(&self, employee_id: u64, period: Period) -> EngineResult<SalaryRecord> {
        let record = self.store.insert_salary(employee_id, period)?;
        info!(
            salary_id = record.id,
            employee_id,
            period = %period,
            "Salary record created"
        );
        Ok(record)
    }

    /// Looks up a record.
    pub fn get(&self, id: u64) -> EngineResult<SalaryRecord> {
        self.store
            .get_salary(id)?
            .ok_or_else(|| EngineError::not_found("salary", id))
    }

    /// Lists records passing `filter`.
    pub fn list(&self, filter: &SalaryFilter) -> EngineResult<Vec<SalaryRecord>> {
        self.store.list_salaries(filter)
    }

    /// Bonus and deduction lines persisted for a record.
    pub fn line_items(&self, id: u64) -> EngineResult<Vec<SalaryLine>> {
        self.get(id)?;
        self.store.salary_lines(id)
    }

    /// Computes every amount of a draft and moves it to `calculated`.
    ///
    /// The amounts and the status change commit together. Bonus and
    /// deduction lines are written afterwards; a failed line write is logged
    /// and reported in [`CalculationOutcome::unsaved_line_items`] without
    /// undoing the calculation.
    pub fn calculate(&self, id: u64, input: CalculationInput) -> EngineResult<CalculationOutcome> {
        validate_input(&input)?;

        let record = self.get(id)?;
        if record.status != SalaryStatus::Draft {
            return Err(EngineError::invalid_status(
                "salary",
                id,
                record.status,
                "calculate",
            ));
        }

        let period = record.period();
        let structure = self.active_structure(record.employee_id, period)?;
        let calculation = calculate_salary(&structure.components, &input, &self.config);

        if calculation.audit.has_warning(ZERO_WORK_DAYS_WARNING) {
            warn!(
                salary_id = id,
                employee_id = record.employee_id,
                "Zero work days, paying full components"
            );
        }

        let record = self.store.transition_salary(
            id,
            SalaryStatus::Draft,
            SalaryChange::Calculated {
                breakdown: calculation.breakdown,
                work_days: input.work_days,
                actual_days: input.actual_days,
                overtime_hours: input.overtime_hours,
            },
        )?;
        info!(
            salary_id = id,
            employee_id = record.employee_id,
            gross_salary = %record.gross_salary,
            net_salary = %record.net_salary,
            "Salary calculated"
        );

        let unsaved_line_items = self.write_lines(id, input.bonuses, input.deductions);

        Ok(CalculationOutcome {
            record,
            audit: calculation.audit,
            unsaved_line_items,
        })
    }

    /// Creates and calculates a full-attendance record for every active
    /// employee, optionally restricted to one department.
    ///
    /// Employees that already have a record for the period are skipped, so a
    /// re-run creates nothing new. Each employee is an independent unit; one
    /// failure never stops the others.
    pub fn bulk_calculate(
        &self,
        period: Period,
        department_id: Option<u64>,
    ) -> EngineResult<BulkOutcome> {
        let employees = self.directory.active_employees(department_id)?;
        let work_days = period.standard_work_days();
        debug!(
            period = %period,
            ?department_id,
            employees = employees.len(),
            work_days,
            "Starting bulk calculation"
        );

        let units: Vec<BulkUnit> = employees
            .par_iter()
            .map(|&employee_id| self.bulk_unit(employee_id, period, work_days))
            .collect();

        let mut outcome = BulkOutcome::default();
        for unit in units {
            match unit {
                BulkUnit::Calculated => outcome.calculated += 1,
                BulkUnit::Skipped => outcome.skipped += 1,
                BulkUnit::Failed(failure) => outcome.failed.push(failure),
            }
        }

        info!(
            period = %period,
            ?department_id,
            calculated = outcome.calculated,
            skipped = outcome.skipped,
            failed = outcome.failed.len(),
            "Bulk calculation finished"
        );
        Ok(outcome)
    }

    /// Approves a calculated record.
    pub fn approve(&self, id: u64, approver_id: u64) -> EngineResult<SalaryRecord> {
        let record = self.store.transition_salary(
            id,
            SalaryStatus::Calculated,
            SalaryChange::Approved {
                approved_by: approver_id,
                approved_at: self.clock.now(),
            },
        )?;
        info!(salary_id = id, approver_id, "Salary approved");
        Ok(record)
    }

    /// Marks an approved record as paid.
    pub fn mark_paid(&self, id: u64) -> EngineResult<SalaryRecord> {
        let record = self.store.transition_salary(
            id,
            SalaryStatus::Approved,
            SalaryChange::Paid {
                paid_at: self.clock.now(),
            },
        )?;
        info!(salary_id = id, "Salary paid");
        Ok(record)
    }

    /// Deletes a draft.
    pub fn delete(&self, id: u64) -> EngineResult<()> {
        self.store.delete_salary(id, SalaryStatus::Draft)?;
        info!(salary_id = id, "Salary record deleted");
        Ok(())
    }

    fn active_structure(&self, employee_id: u64, period: Period) -> EngineResult<SalaryStructure> {
        let date = period.first_day();
        let active: Vec<SalaryStructure> = self
            .store
            .salary_structures(employee_id)?
            .into_iter()
            .filter(|s| s.is_active_on(date))
            .collect();

        if active.len() > 1 {
            warn!(
                employee_id,
                %date,
                count = active.len(),
                "Several salary structures active, using the latest"
            );
        }

        active
            .into_iter()
            .max_by_key(|s| s.effective_from)
            .ok_or(EngineError::StructureNotFound { employee_id, date })
    }

    fn write_lines(
        &self,
        salary_id: u64,
        bonuses: Vec<LineItem>,
        deductions: Vec<LineItem>,
    ) -> Vec<UnsavedLineItem> {
        let lines = bonuses
            .into_iter()
            .map(|item| (LineKind::Bonus, item))
            .chain(deductions.into_iter().map(|item| (LineKind::Deduction, item)));

        let mut unsaved = Vec::new();
        for (kind, item) in lines {
            if let Err(e) = self.store.insert_salary_line(salary_id, kind, &item) {
                warn!(
                    salary_id,
                    ?kind,
                    amount = %item.amount,
                    error = %e,
                    "Dropped salary line item"
                );
                unsaved.push(UnsavedLineItem {
                    kind,
                    item,
                    reason: e.to_string(),
                });
            }
        }
        unsaved
    }

    fn bulk_unit(&self, employee_id: u64, period: Period, work_days: u32) -> BulkUnit {
        match self.try_bulk_unit(employee_id, period, work_days) {
            Ok(unit) => unit,
            Err(e) => {
                warn!(
                    employee_id,
                    period = %period,
                    error = %e,
                    "Bulk calculation failed for employee"
                );
                BulkUnit::Failed(BulkFailure {
                    employee_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn try_bulk_unit(
        &self,
        employee_id: u64,
        period: Period,
        work_days: u32,
    ) -> EngineResult<BulkUnit> {
        if self.store.find_salary(employee_id, period)?.is_some() {
            return Ok(BulkUnit::Skipped);
        }

        let record = match self.create(employee_id, period) {
            Ok(record) => record,
            // Another run created it between the lookup and the insert.
            Err(EngineError::Duplicate { .. }) => return Ok(BulkUnit::Skipped),
            Err(e) => return Err(e),
        };

        let input = CalculationInput {
            work_days,
            actual_days: work_days,
            ..Default::default()
        };
        self.calculate(record.id, input)?;
        Ok(BulkUnit::Calculated)
    }
}

/// Most overtime hours one month can hold (31 days of 24 hours).
const MAX_OVERTIME_HOURS: u32 = 744;

/// Upper bound on the bonus total and on the deduction total of one calculation.
const MAX_LINE_TOTAL: i64 = 1_000_000_000_000_000;

fn validate_input(input: &CalculationInput) -> EngineResult<()> {
    if input.overtime_hours < Decimal::ZERO {
        return Err(EngineError::validation(
            "overtime_hours",
            "must not be negative",
        ));
    }
    if input.overtime_hours > Decimal::from(MAX_OVERTIME_HOURS) {
        return Err(EngineError::validation(
            "overtime_hours",
            format!("must not exceed {} hours", MAX_OVERTIME_HOURS),
        ));
    }
    if input.actual_days > input.work_days && input.work_days > 0 {
        return Err(EngineError::validation(
            "actual_days",
            format!("{} exceeds work days {}", input.actual_days, input.work_days),
        ));
    }
    if input
        .bonuses
        .iter()
        .chain(&input.deductions)
        .any(|line| line.amount < Decimal::ZERO)
    {
        return Err(EngineError::validation(
            "amount",
            "line item amounts must not be negative",
        ));
    }
    for (field, lines) in [("bonuses", &input.bonuses), ("deductions", &input.deductions)] {
        let total = lines
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.amount));
        if total.map_or(true, |total| total > Decimal::from(MAX_LINE_TOTAL)) {
            return Err(EngineError::validation(
                field,
                format!("total must not exceed {}", MAX_LINE_TOTAL),
            ));
        }
    }
    Ok(())
}
