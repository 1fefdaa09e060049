//! In-memory implementation of the store and directory contracts.
//!
//! All tables live behind one mutex, so every trait call is atomic.
//! Uniqueness, foreign keys, the no-overlap rule for live vacations and
//! non-negative remaining balances are enforced inside the write that could
//! break them, the way constraints and row locks would in a relational schema.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    BalanceAdjustment, BlockedPeriod, LineItem, LineKind, NewVacationRequest, Period,
    SalaryFilter, SalaryLine, SalaryRecord, SalaryStatus, SalaryStructure, VacationBalance,
    VacationFilter, VacationRequest, VacationStatus, VacationType,
};

use super::{EmployeeDirectory, LeaveStore, SalaryChange, SalaryStore, VacationChange};

/// An employee as the directory knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    /// Employee identifier.
    pub id: u64,
    /// The user account linked to the employee.
    pub user_id: Option<u64>,
    /// The employee's department.
    pub department_id: Option<u64>,
    /// The employee's direct manager.
    pub manager_id: Option<u64>,
    /// Whether the employee is currently employed.
    pub active: bool,
}

impl EmployeeRecord {
    /// An active employee without user, department or manager.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            user_id: None,
            department_id: None,
            manager_id: None,
            active: true,
        }
    }

    /// Links a user account.
    pub fn with_user(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Places the employee in a department.
    pub fn in_department(mut self, department_id: u64) -> Self {
        self.department_id = Some(department_id);
        self
    }

    /// Sets the direct manager.
    pub fn reporting_to(mut self, manager_id: u64) -> Self {
        self.manager_id = Some(manager_id);
        self
    }

    /// Marks the employee as no longer employed.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[derive(Debug, Default)]
struct Tables {
    next_id: u64,
    employees: BTreeMap<u64, EmployeeRecord>,
    salaries: BTreeMap<u64, SalaryRecord>,
    structures: Vec<SalaryStructure>,
    salary_lines: Vec<SalaryLine>,
    vacation_types: BTreeMap<u64, VacationType>,
    vacations: BTreeMap<u64, VacationRequest>,
    balances: BTreeMap<(u64, i32), VacationBalance>,
    blocked_periods: Vec<BlockedPeriod>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_employee(&self, field: &str, id: u64) -> EngineResult<()> {
        if self.employees.contains_key(&id) {
            Ok(())
        } else {
            Err(EngineError::ForeignKeyViolation {
                field: field.to_string(),
                id,
            })
        }
    }

    /// Refuses adjustments that would take a year's remaining days below zero.
    ///
    /// A missing balance has nothing remaining. Releases are always allowed.
    fn check_reservations(&self, adjustments: &[BalanceAdjustment]) -> EngineResult<()> {
        for adjustment in adjustments {
            let requested = adjustment.pending_delta + adjustment.used_delta;
            if requested <= 0 {
                continue;
            }
            let remaining = self
                .balances
                .get(&(adjustment.employee_id, adjustment.year))
                .map_or(0, |b| b.remaining_days);
            if remaining < requested {
                return Err(EngineError::InsufficientBalance {
                    employee_id: adjustment.employee_id,
                    year: adjustment.year,
                    requested,
                    remaining,
                });
            }
        }
        Ok(())
    }

    fn check_overlap(&self, request: &NewVacationRequest) -> EngineResult<()> {
        match self.vacations.values().find(|v| {
            v.employee_id == request.employee_id
                && v.status.is_live()
                && v.overlaps(request.start_date, request.end_date)
        }) {
            Some(conflict) => Err(EngineError::VacationOverlap {
                employee_id: request.employee_id,
                conflicting_id: conflict.id,
            }),
            None => Ok(()),
        }
    }

    fn apply_adjustments(&mut self, adjustments: &[BalanceAdjustment]) {
        for adjustment in adjustments {
            self.balances
                .entry((adjustment.employee_id, adjustment.year))
                .or_insert_with(|| {
                    VacationBalance::open(adjustment.employee_id, adjustment.year, 0, 0)
                })
                .apply(adjustment);
        }
    }
}

/// A thread-safe in-memory store.
///
/// # Example
///
/// ```
/// use hr_engine::store::{EmployeeDirectory, EmployeeRecord, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// store.add_employee(EmployeeRecord::new(1));
/// store.add_employee(EmployeeRecord::new(2).reporting_to(1));
/// store.add_employee(EmployeeRecord::new(3).reporting_to(2));
///
/// assert!(store.is_manager_of(1, 3).unwrap());
/// assert!(!store.is_manager_of(3, 1).unwrap());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_line_writes: AtomicBool,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> EngineResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| EngineError::Store {
            message: "in-memory store lock poisoned".to_string(),
        })
    }

    /// Runs a seeding write; a poisoned lock drops the write with a warning.
    fn seed<T>(&self, operation: &'static str, f: impl FnOnce(&mut Tables) -> T) {
        match self.tables() {
            Ok(mut tables) => {
                f(&mut tables);
            }
            Err(e) => warn!(operation, error = %e, "Seed write dropped"),
        }
    }

    /// Adds or replaces an employee.
    pub fn add_employee(&self, employee: EmployeeRecord) {
        self.seed("add_employee", |t| t.employees.insert(employee.id, employee));
    }

    /// Adds a salary structure.
    pub fn add_structure(&self, structure: SalaryStructure) {
        self.seed("add_structure", |t| t.structures.push(structure));
    }

    /// Adds or replaces a vacation type.
    pub fn add_vacation_type(&self, vacation_type: VacationType) {
        self.seed("add_vacation_type", |t| {
            t.vacation_types.insert(vacation_type.id, vacation_type)
        });
    }

    /// Adds a department blocked period.
    pub fn add_blocked_period(&self, period: BlockedPeriod) {
        self.seed("add_blocked_period", |t| t.blocked_periods.push(period));
    }

    /// Makes every subsequent bonus/deduction line write fail while `fail` is set.
    pub fn fail_line_writes(&self, fail: bool) {
        self.fail_line_writes.store(fail, Ordering::SeqCst);
    }
}

impl SalaryStore for InMemoryStore {
    fn insert_salary(&self, employee_id: u64, period: Period) -> EngineResult<SalaryRecord> {
        let mut tables = self.tables()?;
        tables.require_employee("employee_id", employee_id)?;

        let exists = tables.salaries.values().any(|s| {
            s.employee_id == employee_id
                && s.period_year == period.year
                && s.period_month == period.month
        });
        if exists {
            return Err(EngineError::Duplicate {
                entity: "salary".to_string(),
                message: format!(
                    "employee {} already has a record for {}-{:02}",
                    employee_id, period.year, period.month
                ),
            });
        }

        let id = tables.next_id();
        let record = SalaryRecord::draft(id, employee_id, period);
        tables.salaries.insert(id, record.clone());
        Ok(record)
    }

    fn get_salary(&self, id: u64) -> EngineResult<Option<SalaryRecord>> {
        Ok(self.tables()?.salaries.get(&id).cloned())
    }

    fn find_salary(&self, employee_id: u64, period: Period) -> EngineResult<Option<SalaryRecord>> {
        Ok(self
            .tables()?
            .salaries
            .values()
            .find(|s| {
                s.employee_id == employee_id
                    && s.period_year == period.year
                    && s.period_month == period.month
            })
            .cloned())
    }

    fn list_salaries(&self, filter: &SalaryFilter) -> EngineResult<Vec<SalaryRecord>> {
        Ok(self
            .tables()?
            .salaries
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    fn transition_salary(
        &self,
        id: u64,
        expected: SalaryStatus,
        change: SalaryChange,
    ) -> EngineResult<SalaryRecord> {
        let mut tables = self.tables()?;
        let record = tables
            .salaries
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found("salary", id))?;

        if record.status != expected {
            return Err(EngineError::invalid_status(
                "salary",
                id,
                record.status,
                change.operation(),
            ));
        }

        change.apply_to(record);
        Ok(record.clone())
    }

    fn delete_salary(&self, id: u64, expected: SalaryStatus) -> EngineResult<()> {
        let mut tables = self.tables()?;
        let status = tables
            .salaries
            .get(&id)
            .map(|s| s.status)
            .ok_or_else(|| EngineError::not_found("salary", id))?;

        if status != expected {
            return Err(EngineError::invalid_status("salary", id, status, "delete"));
        }

        tables.salaries.remove(&id);
        tables.salary_lines.retain(|l| l.salary_id != id);
        Ok(())
    }

    fn salary_structures(&self, employee_id: u64) -> EngineResult<Vec<SalaryStructure>> {
        Ok(self
            .tables()?
            .structures
            .iter()
            .filter(|s| s.employee_id == employee_id)
            .cloned()
            .collect())
    }

    fn insert_salary_line(
        &self,
        salary_id: u64,
        kind: LineKind,
        item: &LineItem,
    ) -> EngineResult<SalaryLine> {
        if self.fail_line_writes.load(Ordering::SeqCst) {
            return Err(EngineError::Store {
                message: "line item table unavailable".to_string(),
            });
        }

        let mut tables = self.tables()?;
        if !tables.salaries.contains_key(&salary_id) {
            return Err(EngineError::ForeignKeyViolation {
                field: "salary_id".to_string(),
                id: salary_id,
            });
        }

        let line = SalaryLine {
            id: tables.next_id(),
            salary_id,
            kind,
            item: item.clone(),
        };
        tables.salary_lines.push(line.clone());
        Ok(line)
    }

    fn salary_lines(&self, salary_id: u64) -> EngineResult<Vec<SalaryLine>> {
        Ok(self
            .tables()?
            .salary_lines
            .iter()
            .filter(|l| l.salary_id == salary_id)
            .cloned()
            .collect())
    }
}

impl LeaveStore for InMemoryStore {
    fn insert_vacation(
        &self,
        request: &NewVacationRequest,
        days: i32,
        status: VacationStatus,
        adjustments: &[BalanceAdjustment],
    ) -> EngineResult<VacationRequest> {
        let mut tables = self.tables()?;
        tables.check_reservations(adjustments)?;
        tables.check_overlap(request)?;
        tables.require_employee("employee_id", request.employee_id)?;
        if let Some(substitute) = request.substitute_employee_id {
            tables.require_employee("substitute_employee_id", substitute)?;
        }
        if !tables.vacation_types.contains_key(&request.vacation_type_id) {
            return Err(EngineError::ForeignKeyViolation {
                field: "vacation_type_id".to_string(),
                id: request.vacation_type_id,
            });
        }

        let id = tables.next_id();
        let vacation = VacationRequest {
            id,
            employee_id: request.employee_id,
            vacation_type_id: request.vacation_type_id,
            start_date: request.start_date,
            end_date: request.end_date,
            days,
            status,
            reason: request.reason.clone(),
            rejection_reason: None,
            substitute_employee_id: request.substitute_employee_id,
            approved_by: None,
            approved_at: None,
        };
        tables.vacations.insert(id, vacation.clone());
        tables.apply_adjustments(adjustments);
        Ok(vacation)
    }

    fn get_vacation(&self, id: u64) -> EngineResult<Option<VacationRequest>> {
        Ok(self.tables()?.vacations.get(&id).cloned())
    }

    fn list_vacations(&self, filter: &VacationFilter) -> EngineResult<Vec<VacationRequest>> {
        let mut vacations: Vec<VacationRequest> = self
            .tables()?
            .vacations
            .values()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect();
        vacations.sort_by_key(|v| (v.start_date, v.id));
        Ok(vacations)
    }

    fn transition_vacation(
        &self,
        id: u64,
        expected: VacationStatus,
        change: VacationChange,
        adjustments: &[BalanceAdjustment],
    ) -> EngineResult<VacationRequest> {
        let mut tables = self.tables()?;
        let mut updated = tables
            .vacations
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("vacation", id))?;

        if updated.status != expected {
            return Err(EngineError::invalid_status(
                "vacation",
                id,
                updated.status,
                change.operation(),
            ));
        }

        change.apply_to(&mut updated);
        tables.check_reservations(adjustments)?;

        tables.vacations.insert(id, updated.clone());
        tables.apply_adjustments(adjustments);
        Ok(updated)
    }

    fn delete_vacation(&self, id: u64, expected: VacationStatus) -> EngineResult<()> {
        let mut tables = self.tables()?;
        let status = tables
            .vacations
            .get(&id)
            .map(|v| v.status)
            .ok_or_else(|| EngineError::not_found("vacation", id))?;

        if status != expected {
            return Err(EngineError::invalid_status("vacation", id, status, "delete"));
        }

        tables.vacations.remove(&id);
        Ok(())
    }

    fn get_balance(&self, employee_id: u64, year: i32) -> EngineResult<Option<VacationBalance>> {
        Ok(self.tables()?.balances.get(&(employee_id, year)).cloned())
    }

    fn insert_balance(&self, balance: VacationBalance) -> EngineResult<VacationBalance> {
        let mut tables = self.tables()?;
        tables.require_employee("employee_id", balance.employee_id)?;

        let key = (balance.employee_id, balance.year);
        if tables.balances.contains_key(&key) {
            return Err(EngineError::Duplicate {
                entity: "vacation balance".to_string(),
                message: format!(
                    "employee {} already has a balance for {}",
                    balance.employee_id, balance.year
                ),
            });
        }
        tables.balances.insert(key, balance.clone());
        Ok(balance)
    }

    fn blocked_periods(&self, department_id: u64) -> EngineResult<Vec<BlockedPeriod>> {
        Ok(self
            .tables()?
            .blocked_periods
            .iter()
            .filter(|p| p.department_id == department_id)
            .cloned()
            .collect())
    }
}

impl EmployeeDirectory for InMemoryStore {
    fn resolve_employee_id(&self, user_id: u64) -> EngineResult<Option<u64>> {
        Ok(self
            .tables()?
            .employees
            .values()
            .find(|e| e.user_id == Some(user_id))
            .map(|e| e.id))
    }

    fn is_manager_of(&self, manager_id: u64, employee_id: u64) -> EngineResult<bool> {
        let tables = self.tables()?;
        let mut visited = HashSet::new();
        let mut current = tables.employees.get(&employee_id).and_then(|e| e.manager_id);

        while let Some(id) = current {
            if id == manager_id {
                return Ok(true);
            }
            if !visited.insert(id) {
                warn!(employee_id, manager_id = id, "Cycle in reporting chain");
                return Ok(false);
            }
            current = tables.employees.get(&id).and_then(|e| e.manager_id);
        }
        Ok(false)
    }

    fn department_of(&self, employee_id: u64) -> EngineResult<Option<u64>> {
        Ok(self
            .tables()?
            .employees
            .get(&employee_id)
            .and_then(|e| e.department_id))
    }

    fn active_employees(&self, department_id: Option<u64>) -> EngineResult<Vec<u64>> {
        Ok(self
            .tables()?
            .employees
            .values()
            .filter(|e| e.active)
            .filter(|e| department_id.is_none_or(|d| e.department_id == Some(d)))
            .map(|e| e.id)
            .collect())
    }
}
