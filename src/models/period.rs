//! Calendar month payroll period.
//!
//! This module contains the [`PayrollPeriod`] type used to key monthly
//! payrolls and to decide which attendance records a month owns.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A calendar month for which a monthly payroll is generated.
///
/// # Example
///
/// ```
/// use attendance_payroll::models::PayrollPeriod;
/// use chrono::NaiveDate;
///
/// let period = PayrollPeriod::new(2026, 2).unwrap();
/// assert_eq!(period.first_day(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
/// assert_eq!(period.last_day(), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PayrollPeriod {
    /// The calendar year.
    pub year: i32,
    /// The calendar month, 1 through 12.
    pub month: u32,
}

impl PayrollPeriod {
    /// Creates a period, rejecting months outside 1..=12 and unrepresentable years.
    pub fn new(year: i32, month: u32) -> EngineResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::validation(
                "month",
                format!("month must be between 1 and 12, got {month}"),
            ));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(EngineError::validation(
                "year",
                format!("year {year} is out of range"),
            ));
        }
        Ok(Self { year, month })
    }

    /// Returns the period that contains `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The first day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The last day of the month.
    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Checks if a date falls within this month (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for PayrollPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}
