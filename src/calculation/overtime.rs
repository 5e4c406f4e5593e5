//! Overtime detection from attendance times.
//!
//! This module splits the hours between check-in and check-out into the
//! scheduled portion and the overtime beyond the assignment's shift window.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::ShiftWindow;

use super::{checked_amount, round_money};

/// The split of a day's worked hours into scheduled and overtime hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeDetection {
    /// Hours between check-in and check-out.
    pub worked_hours: Decimal,
    /// Hours up to the shift window length.
    pub scheduled_hours: Decimal,
    /// Hours beyond the shift window length (can be zero).
    pub overtime_hours: Decimal,
}

/// Detects overtime for a day with both check-in and check-out recorded.
///
/// Worked time is measured in whole minutes. A check-out before the check-in
/// yields zero worked hours.
///
/// # Examples
///
/// ```
/// use attendance_payroll::calculation::detect_overtime;
/// use attendance_payroll::models::ShiftWindow;
/// use chrono::{NaiveDateTime, NaiveTime};
/// use rust_decimal::Decimal;
///
/// let shift = ShiftWindow {
///     start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
/// };
/// let check_in = NaiveDateTime::parse_from_str("2026-03-02 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let check_out = NaiveDateTime::parse_from_str("2026-03-02 19:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
///
/// let detection = detect_overtime(check_in, check_out, &shift);
/// assert_eq!(detection.overtime_hours, Decimal::new(25, 1));
/// ```
pub fn detect_overtime(
    check_in: NaiveDateTime,
    check_out: NaiveDateTime,
    shift: &ShiftWindow,
) -> OvertimeDetection {
    let minutes = (check_out - check_in).num_minutes().max(0);
    let worked_hours = Decimal::new(minutes, 0) / Decimal::new(60, 0);
    let threshold = shift.scheduled_hours();

    let scheduled_hours = worked_hours.min(threshold);
    let overtime_hours = if worked_hours > threshold {
        worked_hours - threshold
    } else {
        Decimal::ZERO
    };

    OvertimeDetection {
        worked_hours,
        scheduled_hours,
        overtime_hours,
    }
}

/// Prices overtime hours at the template rate, rounded to two decimals.
///
/// # Errors
///
/// Returns `Validation` when the product does not fit a `Decimal`.
pub fn overtime_pay(overtime_hours: Decimal, hourly_rate: Decimal) -> EngineResult<Decimal> {
    checked_amount("overtime_pay", overtime_hours.checked_mul(hourly_rate)).map(round_money)
}
