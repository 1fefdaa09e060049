//! Vacation request, balance and calendar models.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a vacation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacationStatus {
    /// Saved but not submitted.
    Draft,
    /// Waiting for a decision.
    Pending,
    /// Granted.
    Approved,
    /// Refused.
    Rejected,
    /// Withdrawn.
    Cancelled,
}

impl VacationStatus {
    /// The canonical wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            VacationStatus::Draft => "draft",
            VacationStatus::Pending => "pending",
            VacationStatus::Approved => "approved",
            VacationStatus::Rejected => "rejected",
            VacationStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true if requests in this status still occupy their date range.
    pub fn is_live(&self) -> bool {
        !matches!(self, VacationStatus::Rejected | VacationStatus::Cancelled)
    }
}

impl fmt::Display for VacationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kind of leave (annual, unpaid, study, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationType {
    /// Type identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
}

/// A request for leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationRequest {
    /// Request identifier.
    pub id: u64,
    /// The employee taking leave.
    pub employee_id: u64,
    /// The kind of leave.
    pub vacation_type_id: u64,
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Calendar days covered.
    pub days: i32,
    /// Lifecycle status.
    pub status: VacationStatus,
    /// Why the employee asks for leave.
    pub reason: Option<String>,
    /// Why the request was refused.
    pub rejection_reason: Option<String>,
    /// Who covers for the employee.
    pub substitute_employee_id: Option<u64>,
    /// Who approved the request.
    pub approved_by: Option<u64>,
    /// When the request was approved.
    pub approved_at: Option<DateTime<Utc>>,
}

impl VacationRequest {
    /// Returns true if the closed ranges of both requests share a day.
    pub fn overlaps(&self, start_date: NaiveDate, end_date: NaiveDate) -> bool {
        ranges_overlap(self.start_date, self.end_date, start_date, end_date)
    }
}

/// Fields of a request that is about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVacationRequest {
    /// The employee taking leave.
    pub employee_id: u64,
    /// The kind of leave.
    pub vacation_type_id: u64,
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Who covers for the employee.
    #[serde(default)]
    pub substitute_employee_id: Option<u64>,
    /// Why the employee asks for leave.
    #[serde(default)]
    pub reason: Option<String>,
    /// Save as a draft instead of submitting right away.
    #[serde(default)]
    pub as_draft: bool,
}

/// Leave accounting of one employee for one year.
///
/// `remaining_days = total_days + carried_over_days - used_days - pending_days`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationBalance {
    /// The employee.
    pub employee_id: u64,
    /// The calendar year.
    pub year: i32,
    /// Entitlement for the year.
    pub total_days: i32,
    /// Days taken by approved requests.
    pub used_days: i32,
    /// Days held by pending requests.
    pub pending_days: i32,
    /// Days still available.
    pub remaining_days: i32,
    /// Days carried over from the previous year.
    pub carried_over_days: i32,
}

impl VacationBalance {
    /// Opens a balance with nothing used or pending.
    pub fn open(employee_id: u64, year: i32, total_days: i32, carried_over_days: i32) -> Self {
        let mut balance = Self {
            employee_id,
            year,
            total_days,
            used_days: 0,
            pending_days: 0,
            remaining_days: 0,
            carried_over_days,
        };
        balance.recompute();
        balance
    }

    /// Applies an adjustment and restores the remaining-days invariant.
    pub fn apply(&mut self, adjustment: &BalanceAdjustment) {
        self.pending_days += adjustment.pending_delta;
        self.used_days += adjustment.used_delta;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.remaining_days =
            self.total_days + self.carried_over_days - self.used_days - self.pending_days;
    }
}

/// A change to one year's balance, applied atomically with a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAdjustment {
    /// The employee.
    pub employee_id: u64,
    /// The balance year.
    pub year: i32,
    /// Change to `pending_days`.
    pub pending_delta: i32,
    /// Change to `used_days`.
    pub used_delta: i32,
}

/// A department-wide range in which no leave may be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedPeriod {
    /// Identifier.
    pub id: u64,
    /// The department the block applies to.
    pub department_id: u64,
    /// First blocked day.
    pub start_date: NaiveDate,
    /// Last blocked day (inclusive).
    pub end_date: NaiveDate,
    /// Why the period is blocked.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Filter for listing vacation requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationFilter {
    /// Restrict to these employees; `None` means every employee.
    #[serde(default)]
    pub employee_ids: Option<Vec<u64>>,
    /// Restrict to one status.
    #[serde(default)]
    pub status: Option<VacationStatus>,
    /// Keep requests ending on or after this day.
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Keep requests starting on or before this day.
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl VacationFilter {
    /// Returns true if `request` passes the filter.
    pub fn matches(&self, request: &VacationRequest) -> bool {
        self.employee_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&request.employee_id))
            && self.status.is_none_or(|s| s == request.status)
            && self.from.is_none_or(|from| request.end_date >= from)
            && self.to.is_none_or(|to| request.start_date <= to)
    }
}

/// Filter for the leave calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFilter {
    /// First day shown.
    pub from: NaiveDate,
    /// Last day shown.
    pub to: NaiveDate,
    /// Restrict to one department.
    #[serde(default)]
    pub department_id: Option<u64>,
    /// Restrict to these employees; `None` means every employee.
    #[serde(default)]
    pub employee_ids: Option<Vec<u64>>,
    /// Show pending requests next to approved ones.
    #[serde(default)]
    pub include_pending: bool,
}

/// One bar on the leave calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// The request shown.
    pub vacation_id: u64,
    /// The employee on leave.
    pub employee_id: u64,
    /// The employee's department, if known.
    pub department_id: Option<u64>,
    /// The kind of leave.
    pub vacation_type_id: u64,
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave.
    pub end_date: NaiveDate,
    /// Approved or pending.
    pub status: VacationStatus,
}

/// Returns true if two closed date ranges share at least one day.
///
/// ```
/// use hr_engine::models::ranges_overlap;
/// use chrono::NaiveDate;
///
/// let d = |day| NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
/// assert!(ranges_overlap(d(1), d(5), d(4), d(10)));
/// assert!(ranges_overlap(d(4), d(10), d(1), d(5)));
/// assert!(!ranges_overlap(d(1), d(3), d(4), d(10)));
/// ```
pub fn ranges_overlap(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// Inclusive calendar-day count of a range.
pub fn inclusive_days(start_date: NaiveDate, end_date: NaiveDate) -> i32 {
    (end_date - start_date).num_days() as i32 + 1
}

/// Splits a range into per-year day counts, in ascending year order.
///
/// ```
/// use hr_engine::models::days_per_year;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2025, 12, 29).unwrap();
/// let end = NaiveDate::from_ymd_opt(2026, 1, 4).unwrap();
/// assert_eq!(days_per_year(start, end), vec![(2025, 3), (2026, 4)]);
/// ```
pub fn days_per_year(start_date: NaiveDate, end_date: NaiveDate) -> Vec<(i32, i32)> {
    let mut result = Vec::new();
    let mut cursor = start_date;
    while cursor <= end_date {
        let year_end = NaiveDate::from_ymd_opt(cursor.year(), 12, 31).unwrap_or(end_date);
        let chunk_end = year_end.min(end_date);
        result.push((cursor.year(), inclusive_days(cursor, chunk_end)));
        match chunk_end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_balance_invariant_holds_after_adjustments() {
        let mut balance = VacationBalance::open(1, 2025, 21, 3);
        assert_eq!(balance.remaining_days, 24);

        balance.apply(&BalanceAdjustment {
            employee_id: 1,
            year: 2025,
            pending_delta: 5,
            used_delta: 0,
        });
        assert_eq!(balance.remaining_days, 19);

        balance.apply(&BalanceAdjustment {
            employee_id: 1,
            year: 2025,
            pending_delta: -5,
            used_delta: 5,
        });
        assert_eq!(balance.pending_days, 0);
        assert_eq!(balance.used_days, 5);
        assert_eq!(
            balance.remaining_days,
            balance.total_days + balance.carried_over_days - balance.used_days - balance.pending_days
        );
    }

    #[test]
    fn test_single_day_range_counts_one_day() {
        assert_eq!(inclusive_days(date(2025, 6, 1), date(2025, 6, 1)), 1);
        assert_eq!(days_per_year(date(2025, 6, 1), date(2025, 6, 1)), vec![(2025, 1)]);
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        assert!(!ranges_overlap(
            date(2025, 6, 1),
            date(2025, 6, 5),
            date(2025, 6, 6),
            date(2025, 6, 10)
        ));
        assert!(ranges_overlap(
            date(2025, 6, 1),
            date(2025, 6, 5),
            date(2025, 6, 5),
            date(2025, 6, 10)
        ));
    }

    #[test]
    fn test_live_statuses() {
        assert!(VacationStatus::Draft.is_live());
        assert!(VacationStatus::Pending.is_live());
        assert!(VacationStatus::Approved.is_live());
        assert!(!VacationStatus::Rejected.is_live());
        assert!(!VacationStatus::Cancelled.is_live());
    }

    #[test]
    fn test_filter_by_date_window() {
        let request = VacationRequest {
            id: 1,
            employee_id: 2,
            vacation_type_id: 1,
            start_date: date(2025, 6, 10),
            end_date: date(2025, 6, 20),
            days: 11,
            status: VacationStatus::Approved,
            reason: None,
            rejection_reason: None,
            substitute_employee_id: None,
            approved_by: None,
            approved_at: None,
        };
        let window = |from, to| VacationFilter {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        };
        assert!(window(date(2025, 6, 1), date(2025, 6, 10)).matches(&request));
        assert!(window(date(2025, 6, 20), date(2025, 6, 30)).matches(&request));
        assert!(!window(date(2025, 6, 21), date(2025, 6, 30)).matches(&request));
    }
}
