//! Calculation logic for the attendance payroll engine.
//!
//! This module contains the pure payroll functions: totals derivation,
//! overtime detection from attendance times, day-level derivation for
//! approved, half and rejected days, and monthly summation.

mod day_payroll;
mod monthly;
mod overtime;
mod totals;

use rust_decimal::{Decimal, RoundingStrategy};

pub use day_payroll::{DayOutcome, DayPayroll, derive_day_payroll, zero_earnings};
pub use monthly::{MonthlyAggregate, aggregate_month};
pub use overtime::{OvertimeDetection, detect_overtime, overtime_pay};
pub use totals::{compute_totals, validate_amount};
pub(crate) use totals::checked_amount;

/// Rounds a monetary amount to two decimals, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
