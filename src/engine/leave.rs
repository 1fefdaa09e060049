//! Vacation request lifecycle and balance accounting.
//!
//! ```text
//! draft --submit--> pending --approve--> approved
//!                           \--reject---> rejected
//! draft | pending | approved --cancel--> cancelled
//! draft --delete--> (removed)
//! ```
//!
//! Days move through the yearly balance with the request: a pending request
//! holds them in `pending_days`, an approved one in `used_days`. Rejecting or
//! cancelling gives them back. A request spanning New Year is split and each
//! year's balance is adjusted separately.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::clock::Clock;
use crate::config::LeaveConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BalanceAdjustment, CalendarEntry, CalendarFilter, NewVacationRequest, VacationBalance,
    VacationFilter, VacationRequest, VacationStatus, days_per_year, inclusive_days,
    ranges_overlap,
};
use crate::store::{EmployeeDirectory, LeaveStore, VacationChange};

/// Owns vacation requests and yearly balances.
#[derive(Clone)]
pub struct LeaveRequestEngine {
    store: Arc<dyn LeaveStore>,
    directory: Arc<dyn EmployeeDirectory>,
    clock: Arc<dyn Clock>,
    config: LeaveConfig,
}

impl LeaveRequestEngine {
    /// Creates an engine over the given collaborators.
    pub fn new(
        store: Arc<dyn LeaveStore>,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
        config: LeaveConfig,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            config,
        }
    }

    /// Validates and stores a new request, as a draft or straight into `pending`.
    ///
    /// Checks run in a fixed order and the first failure is returned: start
    /// date, date range, balance, overlap, blocked periods, then references.
    /// The store repeats the balance and overlap checks inside the insert, so
    /// a concurrent create that slips past them here is still refused.
    pub fn create(&self, request: NewVacationRequest) -> EngineResult<VacationRequest> {
        let today = self.clock.today();
        if request.start_date < today {
            return Err(EngineError::StartDateInPast {
                start_date: request.start_date,
                today,
            });
        }
        if request.end_date < request.start_date {
            return Err(EngineError::InvalidDateRange {
                start_date: request.start_date,
                end_date: request.end_date,
            });
        }

        let per_year = days_per_year(request.start_date, request.end_date);
        self.check_balance(request.employee_id, &per_year)?;
        self.check_overlap(&request)?;
        self.check_blocked_periods(&request)?;

        let (status, adjustments) = if request.as_draft {
            (VacationStatus::Draft, Vec::new())
        } else {
            (
                VacationStatus::Pending,
                adjustments(request.employee_id, &per_year, 1, 0),
            )
        };

        let days = inclusive_days(request.start_date, request.end_date);
        let vacation = self
            .store
            .insert_vacation(&request, days, status, &adjustments)?;
        info!(
            vacation_id = vacation.id,
            employee_id = vacation.employee_id,
            days,
            status = %status,
            "Vacation request created"
        );
        Ok(vacation)
    }

    /// Submits a draft, moving its days into the pending balance.
    ///
    /// The balance is checked again by the store as part of the transition.
    pub fn submit(&self, id: u64) -> EngineResult<VacationRequest> {
        let request = self.get(id)?;
        if request.status != VacationStatus::Draft {
            return Err(EngineError::invalid_status(
                "vacation",
                id,
                request.status,
                "submit",
            ));
        }

        let per_year = days_per_year(request.start_date, request.end_date);
        self.check_balance(request.employee_id, &per_year)?;

        let vacation = self.store.transition_vacation(
            id,
            VacationStatus::Draft,
            VacationChange::Submitted,
            &adjustments(request.employee_id, &per_year, 1, 0),
        )?;
        info!(vacation_id = id, "Vacation request submitted");
        Ok(vacation)
    }

    /// Approves a pending request, moving its days from pending to used.
    pub fn approve(&self, id: u64, approver_id: u64) -> EngineResult<VacationRequest> {
        let request = self.get(id)?;
        let per_year = days_per_year(request.start_date, request.end_date);

        let vacation = self.store.transition_vacation(
            id,
            VacationStatus::Pending,
            VacationChange::Approved {
                approved_by: approver_id,
                approved_at: self.clock.now(),
            },
            &adjustments(request.employee_id, &per_year, -1, 1),
        )?;
        info!(vacation_id = id, approver_id, "Vacation request approved");
        Ok(vacation)
    }

    /// Rejects a pending request and releases its pending days.
    pub fn reject(
        &self,
        id: u64,
        rejecter_id: u64,
        reason: impl Into<String>,
    ) -> EngineResult<VacationRequest> {
        let request = self.get(id)?;
        let per_year = days_per_year(request.start_date, request.end_date);

        let vacation = self.store.transition_vacation(
            id,
            VacationStatus::Pending,
            VacationChange::Rejected {
                reason: reason.into(),
            },
            &adjustments(request.employee_id, &per_year, -1, 0),
        )?;
        info!(vacation_id = id, rejecter_id, "Vacation request rejected");
        Ok(vacation)
    }

    /// Cancels a draft, pending or approved request and returns its days.
    pub fn cancel(&self, id: u64) -> EngineResult<VacationRequest> {
        let request = self.get(id)?;
        let per_year = days_per_year(request.start_date, request.end_date);

        let adjustments = match request.status {
            VacationStatus::Draft => Vec::new(),
            VacationStatus::Pending => adjustments(request.employee_id, &per_year, -1, 0),
            VacationStatus::Approved => adjustments(request.employee_id, &per_year, 0, -1),
            status => return Err(EngineError::invalid_status("vacation", id, status, "cancel")),
        };

        let vacation = self.store.transition_vacation(
            id,
            request.status,
            VacationChange::Cancelled,
            &adjustments,
        )?;
        info!(vacation_id = id, from = %request.status, "Vacation request cancelled");
        Ok(vacation)
    }

    /// Deletes a draft.
    pub fn delete(&self, id: u64) -> EngineResult<()> {
        self.store.delete_vacation(id, VacationStatus::Draft)?;
        info!(vacation_id = id, "Vacation request deleted");
        Ok(())
    }

    /// Looks up a request.
    pub fn get(&self, id: u64) -> EngineResult<VacationRequest> {
        self.store
            .get_vacation(id)?
            .ok_or_else(|| EngineError::not_found("vacation", id))
    }

    /// Lists requests passing `filter`.
    pub fn list(&self, filter: &VacationFilter) -> EngineResult<Vec<VacationRequest>> {
        self.store.list_vacations(filter)
    }

    /// The balance of an employee for a year.
    pub fn get_balance(&self, employee_id: u64, year: i32) -> EngineResult<VacationBalance> {
        self.store
            .get_balance(employee_id, year)?
            .ok_or_else(|| EngineError::not_found("vacation balance", employee_id))
    }

    /// Opens a yearly balance at the configured annual entitlement.
    pub fn open_balance(
        &self,
        employee_id: u64,
        year: i32,
        carried_over_days: i32,
    ) -> EngineResult<VacationBalance> {
        if carried_over_days < 0 {
            return Err(EngineError::validation(
                "carried_over_days",
                "must not be negative",
            ));
        }

        let balance = self.store.insert_balance(VacationBalance::open(
            employee_id,
            year,
            self.config.annual_entitlement_days,
            carried_over_days,
        ))?;
        info!(
            employee_id,
            year,
            total_days = balance.total_days,
            carried_over_days,
            "Vacation balance opened"
        );
        Ok(balance)
    }

    /// Approved requests, plus pending ones on request, intersecting the
    /// filter window.
    pub fn calendar(&self, filter: &CalendarFilter) -> EngineResult<Vec<CalendarEntry>> {
        if filter.to < filter.from {
            return Err(EngineError::InvalidDateRange {
                start_date: filter.from,
                end_date: filter.to,
            });
        }

        let requests = self.store.list_vacations(&VacationFilter {
            employee_ids: filter.employee_ids.clone(),
            status: None,
            from: Some(filter.from),
            to: Some(filter.to),
        })?;

        let mut departments: HashMap<u64, Option<u64>> = HashMap::new();
        let mut entries = Vec::new();
        for request in requests {
            let shown = request.status == VacationStatus::Approved
                || (filter.include_pending && request.status == VacationStatus::Pending);
            if !shown {
                continue;
            }

            let department_id = match departments.get(&request.employee_id) {
                Some(department_id) => *department_id,
                None => {
                    let department_id = self.directory.department_of(request.employee_id)?;
                    departments.insert(request.employee_id, department_id);
                    department_id
                }
            };
            if filter
                .department_id
                .is_some_and(|wanted| department_id != Some(wanted))
            {
                continue;
            }

            entries.push(CalendarEntry {
                vacation_id: request.id,
                employee_id: request.employee_id,
                department_id,
                vacation_type_id: request.vacation_type_id,
                start_date: request.start_date,
                end_date: request.end_date,
                status: request.status,
            });
        }
        Ok(entries)
    }

    fn check_balance(&self, employee_id: u64, per_year: &[(i32, i32)]) -> EngineResult<()> {
        for &(year, requested) in per_year {
            let remaining = self
                .store
                .get_balance(employee_id, year)?
                .map_or(0, |b| b.remaining_days);
            if remaining < requested {
                return Err(EngineError::InsufficientBalance {
                    employee_id,
                    year,
                    requested,
                    remaining,
                });
            }
        }
        Ok(())
    }

    fn check_overlap(&self, request: &NewVacationRequest) -> EngineResult<()> {
        let existing = self.store.list_vacations(&VacationFilter {
            employee_ids: Some(vec![request.employee_id]),
            ..Default::default()
        })?;

        match existing
            .iter()
            .find(|v| v.status.is_live() && v.overlaps(request.start_date, request.end_date))
        {
            Some(conflict) => Err(EngineError::VacationOverlap {
                employee_id: request.employee_id,
                conflicting_id: conflict.id,
            }),
            None => Ok(()),
        }
    }

    fn check_blocked_periods(&self, request: &NewVacationRequest) -> EngineResult<()> {
        let Some(department_id) = self.directory.department_of(request.employee_id)? else {
            return Ok(());
        };

        let blocked = self.store.blocked_periods(department_id)?;
        match blocked.iter().find(|b| {
            ranges_overlap(b.start_date, b.end_date, request.start_date, request.end_date)
        }) {
            Some(b) => Err(EngineError::BlockedPeriod {
                department_id,
                start_date: b.start_date,
                end_date: b.end_date,
            }),
            None => Ok(()),
        }
    }
}

/// Balance adjustments moving each year's days by the given signs.
fn adjustments(
    employee_id: u64,
    per_year: &[(i32, i32)],
    pending_sign: i32,
    used_sign: i32,
) -> Vec<BalanceAdjustment> {
    per_year
        .iter()
        .map(|&(year, days)| BalanceAdjustment {
            employee_id,
            year,
            pending_delta: pending_sign * days,
            used_delta: used_sign * days,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{BlockedPeriod, VacationType};
    use crate::store::{EmployeeRecord, InMemoryStore};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Today is 2025-05-15. Employees 1 and 2 in department 10, 3 in 20.
    // Employee 1 has 21 days in 2025 and 2026; employee 2 has 5 in 2025.
    // Department 10 is blocked 2025-08-01..2025-08-10.
    fn setup() -> (Arc<InMemoryStore>, LeaveRequestEngine) {
        let store = Arc::new(InMemoryStore::new());
        store.add_employee(EmployeeRecord::new(1).in_department(10));
        store.add_employee(EmployeeRecord::new(2).in_department(10));
        store.add_employee(EmployeeRecord::new(3).in_department(20));
        store.add_vacation_type(VacationType {
            id: 1,
            name: "annual".to_string(),
        });
        store.add_blocked_period(BlockedPeriod {
            id: 1,
            department_id: 10,
            start_date: date(2025, 8, 1),
            end_date: date(2025, 8, 10),
            reason: Some("inventory".to_string()),
        });

        let engine = LeaveRequestEngine::new(
            store.clone(),
            store.clone(),
            Arc::new(FixedClock::on(date(2025, 5, 15))),
            LeaveConfig::default(),
        );
        engine.open_balance(1, 2025, 0).unwrap();
        engine.open_balance(1, 2026, 0).unwrap();
        store
            .insert_balance(VacationBalance::open(2, 2025, 5, 0))
            .unwrap();
        (store, engine)
    }

    fn request(employee_id: u64, start: NaiveDate, end: NaiveDate) -> NewVacationRequest {
        NewVacationRequest {
            employee_id,
            vacation_type_id: 1,
            start_date: start,
            end_date: end,
            substitute_employee_id: None,
            reason: None,
            as_draft: false,
        }
    }

    fn balance(engine: &LeaveRequestEngine, employee_id: u64, year: i32) -> (i32, i32, i32) {
        let b = engine.get_balance(employee_id, year).unwrap();
        (b.pending_days, b.used_days, b.remaining_days)
    }

    #[test]
    fn test_start_date_yesterday_is_in_past() {
        let (_, engine) = setup();
        let result = engine.create(request(1, date(2025, 5, 14), date(2025, 5, 20)));
        assert_eq!(
            result,
            Err(EngineError::StartDateInPast {
                start_date: date(2025, 5, 14),
                today: date(2025, 5, 15)
            })
        );
    }

    #[test]
    fn test_starting_today_is_allowed() {
        let (_, engine) = setup();
        let vacation = engine
            .create(request(1, date(2025, 5, 15), date(2025, 5, 15)))
            .unwrap();
        assert_eq!(vacation.days, 1);
    }

    #[test]
    fn test_end_before_start_is_invalid_range() {
        let (_, engine) = setup();
        let result = engine.create(request(1, date(2025, 6, 10), date(2025, 6, 1)));
        assert!(matches!(result, Err(EngineError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_past_start_is_reported_before_invalid_range() {
        let (_, engine) = setup();
        let result = engine.create(request(1, date(2025, 5, 10), date(2025, 5, 1)));
        assert!(matches!(result, Err(EngineError::StartDateInPast { .. })));
    }

    #[test]
    fn test_insufficient_balance() {
        let (_, engine) = setup();
        let result = engine.create(request(2, date(2025, 6, 1), date(2025, 6, 6)));
        assert_eq!(
            result,
            Err(EngineError::InsufficientBalance {
                employee_id: 2,
                year: 2025,
                requested: 6,
                remaining: 5
            })
        );
    }

    #[test]
    fn test_missing_balance_counts_as_zero() {
        let (_, engine) = setup();
        let result = engine.create(request(3, date(2025, 6, 1), date(2025, 6, 1)));
        assert!(matches!(
            result,
            Err(EngineError::InsufficientBalance { remaining: 0, .. })
        ));
    }

    #[test]
    fn test_overlap_is_detected_in_either_order() {
        let a = (date(2025, 6, 1), date(2025, 6, 5));
        let b = (date(2025, 6, 4), date(2025, 6, 10));

        for (first, second) in [(a, b), (b, a)] {
            let (_, engine) = setup();
            let existing = engine.create(request(1, first.0, first.1)).unwrap();
            let result = engine.create(request(1, second.0, second.1));
            assert_eq!(
                result,
                Err(EngineError::VacationOverlap {
                    employee_id: 1,
                    conflicting_id: existing.id
                })
            );
        }
    }

    #[test]
    fn test_rejected_requests_do_not_block_the_range() {
        let (_, engine) = setup();
        let first = engine
            .create(request(1, date(2025, 6, 1), date(2025, 6, 5)))
            .unwrap();
        engine.reject(first.id, 9, "peak season").unwrap();

        assert!(engine
            .create(request(1, date(2025, 6, 3), date(2025, 6, 4)))
            .is_ok());
    }

    #[test]
    fn test_other_employees_do_not_overlap() {
        let (_, engine) = setup();
        engine
            .create(request(1, date(2025, 6, 1), date(2025, 6, 5)))
            .unwrap();
        assert!(engine
            .create(request(2, date(2025, 6, 1), date(2025, 6, 5)))
            .is_ok());
    }

    #[test]
    fn test_blocked_period_applies_to_department_only() {
        let (store, engine) = setup();
        let result = engine.create(request(1, date(2025, 7, 30), date(2025, 8, 2)));
        assert_eq!(
            result,
            Err(EngineError::BlockedPeriod {
                department_id: 10,
                start_date: date(2025, 8, 1),
                end_date: date(2025, 8, 10)
            })
        );

        store
            .insert_balance(VacationBalance::open(3, 2025, 21, 0))
            .unwrap();
        assert!(engine
            .create(request(3, date(2025, 7, 30), date(2025, 8, 2)))
            .is_ok());
    }

    #[test]
    fn test_unknown_references_are_foreign_key_violations() {
        let (_, engine) = setup();
        let mut new = request(1, date(2025, 6, 1), date(2025, 6, 2));
        new.substitute_employee_id = Some(77);
        assert!(matches!(
            engine.create(new.clone()),
            Err(EngineError::ForeignKeyViolation { ref field, id: 77 }) if field == "substitute_employee_id"
        ));

        new.substitute_employee_id = Some(2);
        new.vacation_type_id = 5;
        assert!(matches!(
            engine.create(new),
            Err(EngineError::ForeignKeyViolation { id: 5, .. })
        ));
        assert_eq!(balance(&engine, 1, 2025), (0, 0, 21));
    }

    #[test]
    fn test_balance_follows_approval_and_cancellation() {
        let (_, engine) = setup();
        let vacation = engine
            .create(request(1, date(2025, 6, 1), date(2025, 6, 5)))
            .unwrap();
        assert_eq!(vacation.status, VacationStatus::Pending);
        assert_eq!(balance(&engine, 1, 2025), (5, 0, 16));

        let approved = engine.approve(vacation.id, 9).unwrap();
        assert_eq!(approved.approved_by, Some(9));
        assert_eq!(balance(&engine, 1, 2025), (0, 5, 16));

        engine.cancel(vacation.id).unwrap();
        assert_eq!(balance(&engine, 1, 2025), (0, 0, 21));
    }

    #[test]
    fn test_reject_releases_pending_days() {
        let (_, engine) = setup();
        let vacation = engine
            .create(request(1, date(2025, 6, 1), date(2025, 6, 5)))
            .unwrap();
        let rejected = engine.reject(vacation.id, 9, "peak season").unwrap();

        assert_eq!(rejected.status, VacationStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("peak season"));
        assert_eq!(balance(&engine, 1, 2025), (0, 0, 21));
    }

    #[test]
    fn test_draft_holds_no_days_until_submitted() {
        let (_, engine) = setup();
        let mut new = request(1, date(2025, 6, 1), date(2025, 6, 5));
        new.as_draft = true;
        let draft = engine.create(new).unwrap();
        assert_eq!(draft.status, VacationStatus::Draft);
        assert_eq!(balance(&engine, 1, 2025), (0, 0, 21));

        let pending = engine.submit(draft.id).unwrap();
        assert_eq!(pending.status, VacationStatus::Pending);
        assert_eq!(balance(&engine, 1, 2025), (5, 0, 16));

        assert!(matches!(
            engine.submit(draft.id),
            Err(EngineError::InvalidStatus { .. })
        ));
    }

    #[test]
    fn test_guarded_transitions() {
        let (_, engine) = setup();
        let mut new = request(1, date(2025, 6, 1), date(2025, 6, 5));
        new.as_draft = true;
        let draft = engine.create(new).unwrap();

        assert!(matches!(
            engine.approve(draft.id, 9),
            Err(EngineError::InvalidStatus { .. })
        ));
        assert!(matches!(
            engine.reject(draft.id, 9, "no"),
            Err(EngineError::InvalidStatus { .. })
        ));

        engine.cancel(draft.id).unwrap();
        assert!(matches!(
            engine.cancel(draft.id),
            Err(EngineError::InvalidStatus { .. })
        ));
        assert!(matches!(
            engine.delete(draft.id),
            Err(EngineError::InvalidStatus { .. })
        ));
        assert_eq!(
            engine.approve(99, 9),
            Err(EngineError::not_found("vacation", 99))
        );
    }

    #[test]
    fn test_delete_draft_only() {
        let (_, engine) = setup();
        let mut new = request(1, date(2025, 6, 1), date(2025, 6, 5));
        new.as_draft = true;
        let draft = engine.create(new).unwrap();
        engine.delete(draft.id).unwrap();
        assert!(matches!(engine.get(draft.id), Err(EngineError::NotFound { .. })));

        let pending = engine
            .create(request(1, date(2025, 6, 1), date(2025, 6, 5)))
            .unwrap();
        assert!(matches!(
            engine.delete(pending.id),
            Err(EngineError::InvalidStatus { .. })
        ));
    }

    #[test]
    fn test_request_across_new_year_splits_balance() {
        let (_, engine) = setup();
        let vacation = engine
            .create(request(1, date(2025, 12, 29), date(2026, 1, 4)))
            .unwrap();
        assert_eq!(vacation.days, 7);
        assert_eq!(balance(&engine, 1, 2025), (3, 0, 18));
        assert_eq!(balance(&engine, 1, 2026), (4, 0, 17));
    }

    #[test]
    fn test_open_balance_uses_entitlement_and_rejects_duplicates() {
        let (_, engine) = setup();
        let opened = engine.open_balance(2, 2026, 3).unwrap();
        assert_eq!(opened.total_days, 21);
        assert_eq!(opened.remaining_days, 24);

        assert!(matches!(
            engine.open_balance(2, 2026, 0),
            Err(EngineError::Duplicate { .. })
        ));
        assert!(matches!(
            engine.get_balance(3, 2025),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_calendar_shows_approved_and_optionally_pending() {
        let (store, engine) = setup();
        store
            .insert_balance(VacationBalance::open(3, 2025, 21, 0))
            .unwrap();
        let approved = engine
            .create(request(1, date(2025, 6, 1), date(2025, 6, 5)))
            .unwrap();
        engine.approve(approved.id, 9).unwrap();
        let pending = engine
            .create(request(3, date(2025, 6, 3), date(2025, 6, 4)))
            .unwrap();
        engine
            .create(request(2, date(2025, 7, 1), date(2025, 7, 2)))
            .unwrap();

        let mut filter = CalendarFilter {
            from: date(2025, 6, 1),
            to: date(2025, 6, 30),
            department_id: None,
            employee_ids: None,
            include_pending: false,
        };
        let entries = engine.calendar(&filter).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].vacation_id, approved.id);
        assert_eq!(entries[0].department_id, Some(10));

        filter.include_pending = true;
        let ids: Vec<u64> = engine
            .calendar(&filter)
            .unwrap()
            .iter()
            .map(|e| e.vacation_id)
            .collect();
        assert_eq!(ids, vec![approved.id, pending.id]);

        filter.department_id = Some(20);
        let entries = engine.calendar(&filter).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].employee_id, 3);
    }

    /// Leave store that stalls after every read, widening the window between
    /// the engine's checks and its write.
    struct StallingStore {
        inner: Arc<InMemoryStore>,
        stall: std::time::Duration,
    }

    impl LeaveStore for StallingStore {
        fn insert_vacation(
            &self,
            request: &NewVacationRequest,
            days: i32,
            status: VacationStatus,
            adjustments: &[BalanceAdjustment],
        ) -> EngineResult<VacationRequest> {
            self.inner.insert_vacation(request, days, status, adjustments)
        }

        fn get_vacation(&self, id: u64) -> EngineResult<Option<VacationRequest>> {
            let result = self.inner.get_vacation(id);
            std::thread::sleep(self.stall);
            result
        }

        fn list_vacations(&self, filter: &VacationFilter) -> EngineResult<Vec<VacationRequest>> {
            let result = self.inner.list_vacations(filter);
            std::thread::sleep(self.stall);
            result
        }

        fn transition_vacation(
            &self,
            id: u64,
            expected: VacationStatus,
            change: VacationChange,
            adjustments: &[BalanceAdjustment],
        ) -> EngineResult<VacationRequest> {
            self.inner.transition_vacation(id, expected, change, adjustments)
        }

        fn delete_vacation(&self, id: u64, expected: VacationStatus) -> EngineResult<()> {
            self.inner.delete_vacation(id, expected)
        }

        fn get_balance(&self, employee_id: u64, year: i32) -> EngineResult<Option<VacationBalance>> {
            let result = self.inner.get_balance(employee_id, year);
            std::thread::sleep(self.stall);
            result
        }

        fn insert_balance(&self, balance: VacationBalance) -> EngineResult<VacationBalance> {
            self.inner.insert_balance(balance)
        }

        fn blocked_periods(&self, department_id: u64) -> EngineResult<Vec<BlockedPeriod>> {
            self.inner.blocked_periods(department_id)
        }
    }

    fn stalling_engine(store: &Arc<InMemoryStore>) -> LeaveRequestEngine {
        LeaveRequestEngine::new(
            Arc::new(StallingStore {
                inner: store.clone(),
                stall: std::time::Duration::from_millis(20),
            }),
            store.clone(),
            Arc::new(FixedClock::on(date(2025, 5, 15))),
            LeaveConfig::default(),
        )
    }

    /// Runs both jobs at once behind a barrier and returns their results.
    fn race<T: Send>(
        first: impl FnOnce() -> T + Send,
        second: impl FnOnce() -> T + Send,
    ) -> (T, T) {
        let barrier = std::sync::Barrier::new(2);
        std::thread::scope(|scope| {
            let a = scope.spawn(|| {
                barrier.wait();
                first()
            });
            let b = scope.spawn(|| {
                barrier.wait();
                second()
            });
            (a.join().unwrap(), b.join().unwrap())
        })
    }

    #[test]
    fn test_concurrent_overlapping_creates_admit_one() {
        let (store, _) = setup();
        let engine = stalling_engine(&store);

        let (a, b) = race(
            || engine.create(request(1, date(2025, 6, 1), date(2025, 6, 5))),
            || engine.create(request(1, date(2025, 6, 1), date(2025, 6, 5))),
        );

        let created: Vec<_> = [&a, &b].into_iter().filter(|r| r.is_ok()).collect();
        assert_eq!(created.len(), 1);
        assert!(
            [&a, &b]
                .into_iter()
                .any(|r| matches!(r, Err(EngineError::VacationOverlap { .. })))
        );
        assert_eq!(balance(&engine, 1, 2025), (5, 0, 16));
    }

    #[test]
    fn test_concurrent_submits_cannot_overbook() {
        let (store, _) = setup();
        let engine = stalling_engine(&store);
        let draft = |start, end| {
            let mut r = request(1, start, end);
            r.as_draft = true;
            engine.create(r).unwrap().id
        };
        let first = draft(date(2025, 6, 1), date(2025, 6, 12));
        let second = draft(date(2025, 7, 1), date(2025, 7, 12));

        let (a, b) = race(|| engine.submit(first), || engine.submit(second));

        assert_eq!([&a, &b].into_iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            [&a, &b]
                .into_iter()
                .any(|r| matches!(r, Err(EngineError::InsufficientBalance { .. })))
        );
        let (pending, _, remaining) = balance(&engine, 1, 2025);
        assert_eq!(pending, 12);
        assert_eq!(remaining, 9);
    }
}
