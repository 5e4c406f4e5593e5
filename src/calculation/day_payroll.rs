//! Day-level payroll derivation.
//!
//! This module derives the payroll snapshot a record receives when a
//! reviewer settles it: a full or half day seeded from the assignment's pay
//! template, or zeroed earnings for rejected and absent days.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{PayrollPolicy, RejectedDeductionPolicy};
use crate::error::EngineResult;
use crate::models::{Assignment, AttendanceRecord, PayrollInputs, PayrollSnapshot};

use super::{checked_amount, compute_totals, detect_overtime, overtime_pay, round_money};

/// How a reviewer settled a payable day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOutcome {
    /// Full attendance.
    FullDay,
    /// Partial attendance paid at the configured half-day factor.
    HalfDay,
}

/// The derived payroll for a settled day, with the overtime that fed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayPayroll {
    /// The recomputed snapshot.
    pub snapshot: PayrollSnapshot,
    /// Overtime hours detected from check-in/out, zero when either is missing.
    pub overtime_hours: Decimal,
}

/// Derives the payroll of a day entering `Approved` or `HalfDay`.
///
/// - `daily_pay` is the captured `base_pay`, scaled by
///   `policy.half_day_factor` for a half day;
/// - `overtime_pay` prices hours beyond the assignment's shift window at the
///   overtime rate;
/// - `bata` comes from the template;
/// - PF is charged on daily pay and ESI on gross pay;
/// - `advance_deduction` is carried over from the stored snapshot.
///
/// Rates come from the template the record captured when it was
/// materialized. Only the shift window is read from `assignment`.
///
/// Missing inputs default to zero. Amounts are rounded to two decimals.
///
/// # Errors
///
/// Returns `Validation` when an amount does not fit a `Decimal`.
///
/// # Examples
///
/// ```
/// use attendance_payroll::calculation::{derive_day_payroll, DayOutcome};
/// use attendance_payroll::config::PayrollPolicy;
/// use attendance_payroll::models::{
///     Assignment, AssignmentStatus, AttendanceRecord, PayTemplate, ShiftWindow,
/// };
/// use chrono::{NaiveDate, NaiveTime};
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let assignment = Assignment {
///     id: Uuid::new_v4(),
///     worker_id: "wrk_001".to_string(),
///     job_id: "site_7".to_string(),
///     pay_template: PayTemplate::daily(Decimal::new(500, 0)),
///     shift: ShiftWindow {
///         start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///         end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
///     },
///     status: AssignmentStatus::Active,
/// };
/// let record = AttendanceRecord::scheduled(
///     &assignment,
///     NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
/// )
/// .unwrap();
///
/// let half = derive_day_payroll(&record, &assignment, DayOutcome::HalfDay, &PayrollPolicy::default())
///     .unwrap();
/// assert_eq!(half.snapshot.inputs().daily_pay, Decimal::new(250, 0));
/// ```
pub fn derive_day_payroll(
    record: &AttendanceRecord,
    assignment: &Assignment,
    outcome: DayOutcome,
    policy: &PayrollPolicy,
) -> EngineResult<DayPayroll> {
    let template = &record.pay_template;
    let stored = record.payroll.inputs();
    let base_pay = stored.base_pay;

    let daily_pay = match outcome {
        DayOutcome::FullDay => base_pay,
        DayOutcome::HalfDay => round_money(checked_amount(
            "daily_pay",
            base_pay.checked_mul(policy.half_day_factor),
        )?),
    };

    let overtime_hours = match (record.check_in_time, record.check_out_time) {
        (Some(check_in), Some(check_out)) => {
            detect_overtime(check_in, check_out, &assignment.shift).overtime_hours
        }
        _ => Decimal::ZERO,
    };
    let overtime = overtime_pay(overtime_hours, template.overtime_hourly_rate)?;
    let bata = template.bata;

    let gross = checked_amount(
        "gross_pay",
        daily_pay
            .checked_add(overtime)
            .and_then(|sum| sum.checked_add(bata)),
    )?;
    let inputs = PayrollInputs {
        base_pay,
        daily_pay,
        overtime_pay: overtime,
        bata,
        pf_deduction: round_money(checked_amount(
            "pf_deduction",
            daily_pay.checked_mul(template.pf_rate),
        )?),
        esi_deduction: round_money(checked_amount(
            "esi_deduction",
            gross.checked_mul(template.esi_rate),
        )?),
        advance_deduction: stored.advance_deduction,
    };

    let snapshot = compute_totals(inputs)?;
    debug!(
        record_id = %record.id,
        outcome = ?outcome,
        daily_pay = %daily_pay,
        overtime_hours = %overtime_hours,
        net_payable = %snapshot.net_payable(),
        "Derived day payroll"
    );

    Ok(DayPayroll {
        snapshot,
        overtime_hours,
    })
}

/// Zeroes the earnings of a rejected or absent day.
///
/// Daily pay, overtime pay and bata become zero. Deductions follow
/// `policy.rejected_deductions`. `base_pay` is kept so a later reset and
/// approval can re-derive the day.
pub fn zero_earnings(
    snapshot: &PayrollSnapshot,
    policy: &PayrollPolicy,
) -> EngineResult<PayrollSnapshot> {
    let mut inputs = snapshot.inputs();
    inputs.daily_pay = Decimal::ZERO;
    inputs.overtime_pay = Decimal::ZERO;
    inputs.bata = Decimal::ZERO;

    if policy.rejected_deductions == RejectedDeductionPolicy::Clear {
        inputs.pf_deduction = Decimal::ZERO;
        inputs.esi_deduction = Decimal::ZERO;
        inputs.advance_deduction = Decimal::ZERO;
    }

    compute_totals(inputs)
}
