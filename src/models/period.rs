//! Payroll period model.
//!
//! A [`Period`] is a (year, month) pair identifying one payroll cycle.

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One payroll cycle.
///
/// # Example
///
/// ```
/// use hr_engine::models::Period;
///
/// let period = Period::new(2025, 6).unwrap();
/// assert_eq!(period.first_day().to_string(), "2025-06-01");
/// assert_eq!(period.last_day().to_string(), "2025-06-30");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1 to 12.
    pub month: u32,
}

impl Period {
    /// Creates a period, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> EngineResult<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(EngineError::validation(
                "period",
                format!("{}-{} is not a valid year/month", year, month),
            ));
        }
        Ok(Self { year, month })
    }

    /// The first calendar day of the period.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The last calendar day of the period.
    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Standard work days in the month: every Monday through Saturday.
    ///
    /// ```
    /// use hr_engine::models::Period;
    ///
    /// // June 2025 has 30 days and 5 Sundays.
    /// assert_eq!(Period::new(2025, 6).unwrap().standard_work_days(), 25);
    /// ```
    pub fn standard_work_days(&self) -> u32 {
        self.first_day()
            .iter_days()
            .take_while(|d| *d <= self.last_day())
            .filter(|d| d.weekday() != Weekday::Sun)
            .count() as u32
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_month_is_rejected() {
        assert!(matches!(
            Period::new(2025, 13),
            Err(EngineError::Validation { .. })
        ));
        assert!(Period::new(2025, 0).is_err());
    }

    #[test]
    fn test_last_day_handles_december_and_leap_years() {
        assert_eq!(
            Period::new(2025, 12).unwrap().last_day(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
        );
        assert_eq!(
            Period::new(2024, 2).unwrap().last_day(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_standard_work_days_excludes_sundays_only() {
        // February 2025: 28 days, Sundays on 2, 9, 16, 23.
        assert_eq!(Period::new(2025, 2).unwrap().standard_work_days(), 24);
        // January 2025: 31 days, Sundays on 5, 12, 19, 26.
        assert_eq!(Period::new(2025, 1).unwrap().standard_work_days(), 27);
        // March 2026: 31 days, Sundays on 1, 8, 15, 22, 29.
        assert_eq!(Period::new(2026, 3).unwrap().standard_work_days(), 26);
    }

    #[test]
    fn test_period_displays_zero_padded_month() {
        assert_eq!(Period::new(2025, 3).unwrap().to_string(), "2025-03");
    }
}
