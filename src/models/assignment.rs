//! Assignment model and related types.
//!
//! An assignment links a worker to a job and carries the pay template and
//! shift window used to derive each day's payroll.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// The lifecycle state of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    /// Days are still being scheduled.
    Active,
    /// The engagement ended normally.
    Completed,
    /// The engagement was called off.
    Cancelled,
}

/// The rates used to derive a day's payroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayTemplate {
    /// Wage for a full approved day.
    pub daily_wage: Decimal,
    /// Fixed daily allowance.
    #[serde(default)]
    pub bata: Decimal,
    /// Pay per hour worked beyond the shift window.
    #[serde(default)]
    pub overtime_hourly_rate: Decimal,
    /// Provident fund rate applied to daily pay (e.g. 0.12).
    #[serde(default)]
    pub pf_rate: Decimal,
    /// Employee state insurance rate applied to gross pay (e.g. 0.0075).
    #[serde(default)]
    pub esi_rate: Decimal,
}

impl PayTemplate {
    /// Creates a template paying only a daily wage.
    pub fn daily(daily_wage: Decimal) -> Self {
        Self {
            daily_wage,
            bata: Decimal::ZERO,
            overtime_hourly_rate: Decimal::ZERO,
            pf_rate: Decimal::ZERO,
            esi_rate: Decimal::ZERO,
        }
    }

    /// Checks amounts are non-negative and rates are fractions.
    pub fn validate(&self) -> EngineResult<()> {
        let amounts = [
            ("daily_wage", self.daily_wage),
            ("bata", self.bata),
            ("overtime_hourly_rate", self.overtime_hourly_rate),
        ];
        for (field, value) in amounts {
            if value < Decimal::ZERO {
                return Err(EngineError::validation(field, "must not be negative"));
            }
        }
        for (field, rate) in [("pf_rate", self.pf_rate), ("esi_rate", self.esi_rate)] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(EngineError::validation(field, "must be between 0 and 1"));
            }
        }
        Ok(())
    }
}

/// The scheduled working hours of a day.
///
/// An end time at or before the start time denotes an overnight shift.
///
/// # Example
///
/// ```
/// use attendance_payroll::models::ShiftWindow;
/// use chrono::NaiveTime;
/// use rust_decimal::Decimal;
///
/// let night = ShiftWindow {
///     start: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
///     end: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
/// };
/// assert_eq!(night.scheduled_hours(), Decimal::new(8, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWindow {
    /// Scheduled start of the shift.
    pub start: NaiveTime,
    /// Scheduled end of the shift.
    pub end: NaiveTime,
}

impl ShiftWindow {
    /// The length of the shift in hours.
    pub fn scheduled_hours(&self) -> Decimal {
        let mut minutes = (self.end - self.start).num_minutes();
        if minutes <= 0 {
            minutes += 24 * 60;
        }
        Decimal::new(minutes, 0) / Decimal::new(60, 0)
    }
}

/// A worker's engagement on a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique identifier for the assignment.
    pub id: Uuid,
    /// The worker, as known to the identity service.
    pub worker_id: String,
    /// The job or site, as known to the scheduling service.
    pub job_id: String,
    /// Rates used for each day.
    pub pay_template: PayTemplate,
    /// Scheduled working hours.
    pub shift: ShiftWindow,
    /// Whether new days may be scheduled.
    pub status: AssignmentStatus,
}

impl Assignment {
    /// Returns true while days may be materialized for this assignment.
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_day_shift_hours() {
        let shift = ShiftWindow {
            start: time(9, 0),
            end: time(17, 30),
        };
        assert_eq!(shift.scheduled_hours(), dec("8.5"));
    }

    #[test]
    fn test_equal_start_and_end_is_full_day() {
        let shift = ShiftWindow {
            start: time(6, 0),
            end: time(6, 0),
        };
        assert_eq!(shift.scheduled_hours(), dec("24"));
    }

    #[test]
    fn test_template_rejects_negative_wage() {
        let template = PayTemplate::daily(dec("-1"));
        assert!(template.validate().is_err());
    }

    #[test]
    fn test_template_rejects_rate_above_one() {
        let template = PayTemplate {
            pf_rate: dec("1.2"),
            ..PayTemplate::daily(dec("500"))
        };
        let error = template.validate().unwrap_err();
        assert!(error.to_string().contains("pf_rate"));
    }

    #[test]
    fn test_deserialize_template_defaults() {
        let json = r#"{ "daily_wage": "650.00" }"#;
        let template: PayTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(template.daily_wage, dec("650.00"));
        assert_eq!(template.bata, Decimal::ZERO);
        assert!(template.validate().is_ok());
    }

    #[test]
    fn test_assignment_status_serialization() {
        assert_eq!(
            serde_json::to_string(&AssignmentStatus::Active).unwrap(),
            "\"ACTIVE\""
        );
    }
}
