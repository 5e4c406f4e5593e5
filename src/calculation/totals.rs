//! Payroll totals derivation.
//!
//! This module provides [`compute_totals`], the single place where gross pay,
//! total deductions and net payable are derived from a snapshot's inputs.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{PayrollInputs, PayrollSnapshot};

/// Derives the totals of a payroll snapshot.
///
/// ```text
/// gross_pay        = daily_pay + overtime_pay + bata
/// total_deductions = pf_deduction + esi_deduction + advance_deduction
/// net_payable      = gross_pay - total_deductions
/// ```
///
/// The function is pure: the same inputs always produce the same snapshot,
/// and feeding a snapshot's own inputs back in reproduces it exactly.
/// `net_payable` may be negative and is never clamped.
///
/// # Errors
///
/// Returns `Validation` naming the first negative input, or naming the
/// total whose sum does not fit a `Decimal`.
///
/// # Examples
///
/// ```
/// use attendance_payroll::calculation::compute_totals;
/// use attendance_payroll::models::PayrollInputs;
/// use rust_decimal::Decimal;
///
/// let snapshot = compute_totals(PayrollInputs {
///     daily_pay: Decimal::new(100, 0),
///     advance_deduction: Decimal::new(300, 0),
///     ..PayrollInputs::default()
/// })
/// .unwrap();
/// assert_eq!(snapshot.net_payable(), Decimal::new(-200, 0));
/// ```
pub fn compute_totals(inputs: PayrollInputs) -> EngineResult<PayrollSnapshot> {
    validate_inputs(&inputs)?;

    let gross_pay = checked_amount(
        "gross_pay",
        inputs
            .daily_pay
            .checked_add(inputs.overtime_pay)
            .and_then(|sum| sum.checked_add(inputs.bata)),
    )?;
    let total_deductions = checked_amount(
        "total_deductions",
        inputs
            .pf_deduction
            .checked_add(inputs.esi_deduction)
            .and_then(|sum| sum.checked_add(inputs.advance_deduction)),
    )?;
    let net_payable = checked_amount("net_payable", gross_pay.checked_sub(total_deductions))?;

    Ok(PayrollSnapshot::from_parts(
        inputs,
        gross_pay,
        total_deductions,
        net_payable,
    ))
}

/// Checks every monetary input is non-negative.
pub fn validate_amount(field: &str, value: Decimal) -> EngineResult<()> {
    if value < Decimal::ZERO {
        return Err(EngineError::validation(
            field,
            format!("amount must not be negative, got {}", value),
        ));
    }
    Ok(())
}

/// Unwraps the result of checked `Decimal` arithmetic, reporting overflow
/// against `field`.
pub(crate) fn checked_amount(field: &str, value: Option<Decimal>) -> EngineResult<Decimal> {
    value.ok_or_else(|| EngineError::validation(field, "amount is out of range"))
}

fn validate_inputs(inputs: &PayrollInputs) -> EngineResult<()> {
    let fields = [
        ("base_pay", inputs.base_pay),
        ("daily_pay", inputs.daily_pay),
        ("overtime_pay", inputs.overtime_pay),
        ("bata", inputs.bata),
        ("pf_deduction", inputs.pf_deduction),
        ("esi_deduction", inputs.esi_deduction),
        ("advance_deduction", inputs.advance_deduction),
    ];
    for (field, value) in fields {
        validate_amount(field, value)?;
    }
    Ok(())
}
