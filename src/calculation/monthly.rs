//! Monthly payroll summation.
//!
//! This module sums the snapshots of a month's attendance records into a
//! single aggregate snapshot.

use rust_decimal::Decimal;
use tracing::warn;

use crate::error::EngineResult;
use crate::models::{AttendanceRecord, AttendanceStatus, DayCounts, PayrollInputs, PayrollSnapshot};

use super::{checked_amount, compute_totals};

/// The aggregate of a month of attendance records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyAggregate {
    /// The summed snapshot, totals recomputed.
    pub snapshot: PayrollSnapshot,
    /// How many days fell into each category.
    pub days: DayCounts,
}

/// Sums the payable days of a month.
///
/// Only `Approved` and `HalfDay` records contribute. Every other status
/// contributes zero (including its deductions) and is only counted.
/// Records still awaiting a decision are counted as unresolved and logged.
pub fn aggregate_month(records: &[AttendanceRecord]) -> EngineResult<MonthlyAggregate> {
    let mut sum = PayrollInputs::default();
    let mut days = DayCounts::default();

    for record in records {
        match record.status {
            AttendanceStatus::Approved => days.approved += 1,
            AttendanceStatus::HalfDay => days.half_days += 1,
            AttendanceStatus::Rejected | AttendanceStatus::AutoMarkedAbsent => {
                days.absent += 1;
                continue;
            }
            AttendanceStatus::NotStarted => {
                days.not_started += 1;
                continue;
            }
            AttendanceStatus::CheckedIn
            | AttendanceStatus::CheckedOut
            | AttendanceStatus::PendingVerification => {
                days.unresolved += 1;
                continue;
            }
        }

        sum = add_inputs(&sum, &record.payroll.inputs())?;
    }

    if days.unresolved > 0 {
        warn!(
            unresolved = days.unresolved,
            "Aggregating month with days still awaiting review"
        );
    }

    Ok(MonthlyAggregate {
        snapshot: compute_totals(sum)?,
        days,
    })
}

fn add_inputs(sum: &PayrollInputs, day: &PayrollInputs) -> EngineResult<PayrollInputs> {
    let add = |field: &str, a: Decimal, b: Decimal| checked_amount(field, a.checked_add(b));
    Ok(PayrollInputs {
        base_pay: add("base_pay", sum.base_pay, day.base_pay)?,
        daily_pay: add("daily_pay", sum.daily_pay, day.daily_pay)?,
        overtime_pay: add("overtime_pay", sum.overtime_pay, day.overtime_pay)?,
        bata: add("bata", sum.bata, day.bata)?,
        pf_deduction: add("pf_deduction", sum.pf_deduction, day.pf_deduction)?,
        esi_deduction: add("esi_deduction", sum.esi_deduction, day.esi_deduction)?,
        advance_deduction: add(
            "advance_deduction",
            sum.advance_deduction,
            day.advance_deduction,
        )?,
    })
}
