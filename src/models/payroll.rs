//! Payroll snapshot models.
//!
//! This module contains the [`PayrollSnapshot`] embedded in every attendance
//! record and monthly payroll, the [`PayrollInputs`] it is derived from, the
//! closed set of reviewer-editable [`PayrollField`]s and the
//! [`PayrollOverrides`] used to stage or persist edits.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::compute_totals;
use crate::error::EngineError;

/// The input amounts of a payroll snapshot.
///
/// Every amount is a non-negative monetary value. Missing fields deserialize
/// as zero.
///
/// # Example
///
/// ```
/// use attendance_payroll::models::PayrollInputs;
/// use rust_decimal::Decimal;
///
/// let inputs = PayrollInputs {
///     daily_pay: Decimal::new(700, 0),
///     bata: Decimal::new(50, 0),
///     ..PayrollInputs::default()
/// };
/// assert_eq!(inputs.overtime_pay, Decimal::ZERO);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollInputs {
    /// The template wage for a full day, before any attendance policy.
    pub base_pay: Decimal,
    /// The wage paid for the day's attendance.
    pub daily_pay: Decimal,
    /// Pay for hours beyond the shift window.
    pub overtime_pay: Decimal,
    /// The fixed daily allowance.
    pub bata: Decimal,
    /// Provident fund deduction.
    pub pf_deduction: Decimal,
    /// Employee state insurance deduction.
    pub esi_deduction: Decimal,
    /// Recovery of a salary advance.
    pub advance_deduction: Decimal,
}

/// A payroll snapshot with its derived totals.
///
/// The derived fields can only be produced by
/// [`compute_totals`](crate::calculation::compute_totals), so a snapshot is
/// always internally consistent: `gross_pay - total_deductions == net_payable`.
/// Deserializing a snapshot ignores any derived values on the wire and
/// recomputes them.
///
/// # Example
///
/// ```
/// use attendance_payroll::calculation::compute_totals;
/// use attendance_payroll::models::PayrollInputs;
/// use rust_decimal::Decimal;
///
/// let snapshot = compute_totals(PayrollInputs {
///     daily_pay: Decimal::new(700, 0),
///     overtime_pay: Decimal::new(100, 0),
///     bata: Decimal::new(50, 0),
///     pf_deduction: Decimal::new(40, 0),
///     esi_deduction: Decimal::new(20, 0),
///     ..PayrollInputs::default()
/// })
/// .unwrap();
///
/// assert_eq!(snapshot.gross_pay(), Decimal::new(850, 0));
/// assert_eq!(snapshot.net_payable(), Decimal::new(790, 0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PayrollInputs")]
pub struct PayrollSnapshot {
    #[serde(flatten)]
    inputs: PayrollInputs,
    gross_pay: Decimal,
    total_deductions: Decimal,
    net_payable: Decimal,
}

impl PayrollSnapshot {
    pub(crate) fn from_parts(
        inputs: PayrollInputs,
        gross_pay: Decimal,
        total_deductions: Decimal,
        net_payable: Decimal,
    ) -> Self {
        Self {
            inputs,
            gross_pay,
            total_deductions,
            net_payable,
        }
    }

    /// Returns the input amounts this snapshot was derived from.
    pub fn inputs(&self) -> PayrollInputs {
        self.inputs
    }

    /// Returns the value of an editable field.
    pub fn get(&self, field: PayrollField) -> Decimal {
        field.get(&self.inputs)
    }

    /// Daily pay + overtime pay + bata.
    pub fn gross_pay(&self) -> Decimal {
        self.gross_pay
    }

    /// PF + ESI + advance deductions.
    pub fn total_deductions(&self) -> Decimal {
        self.total_deductions
    }

    /// Gross pay minus total deductions. May be negative.
    pub fn net_payable(&self) -> Decimal {
        self.net_payable
    }

    /// Returns true when the derived fields match the inputs.
    pub fn is_consistent(&self) -> bool {
        compute_totals(self.inputs).is_ok_and(|fresh| fresh == *self)
    }
}

impl TryFrom<PayrollInputs> for PayrollSnapshot {
    type Error = EngineError;

    fn try_from(inputs: PayrollInputs) -> Result<Self, Self::Error> {
        compute_totals(inputs)
    }
}

/// The payroll fields a reviewer may edit.
///
/// Derived totals are deliberately absent: they are never authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollField {
    /// The day's wage.
    DailyPay,
    /// Overtime pay.
    OvertimePay,
    /// Daily allowance.
    Bata,
    /// Provident fund deduction.
    PfDeduction,
    /// Employee state insurance deduction.
    EsiDeduction,
    /// Advance recovery deduction.
    AdvanceDeduction,
}

impl PayrollField {
    /// All editable fields.
    pub const ALL: [PayrollField; 6] = [
        PayrollField::DailyPay,
        PayrollField::OvertimePay,
        PayrollField::Bata,
        PayrollField::PfDeduction,
        PayrollField::EsiDeduction,
        PayrollField::AdvanceDeduction,
    ];

    /// The wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            PayrollField::DailyPay => "daily_pay",
            PayrollField::OvertimePay => "overtime_pay",
            PayrollField::Bata => "bata",
            PayrollField::PfDeduction => "pf_deduction",
            PayrollField::EsiDeduction => "esi_deduction",
            PayrollField::AdvanceDeduction => "advance_deduction",
        }
    }

    /// Reads this field from a set of inputs.
    pub fn get(self, inputs: &PayrollInputs) -> Decimal {
        match self {
            PayrollField::DailyPay => inputs.daily_pay,
            PayrollField::OvertimePay => inputs.overtime_pay,
            PayrollField::Bata => inputs.bata,
            PayrollField::PfDeduction => inputs.pf_deduction,
            PayrollField::EsiDeduction => inputs.esi_deduction,
            PayrollField::AdvanceDeduction => inputs.advance_deduction,
        }
    }

    /// Writes this field into a set of inputs.
    pub fn set(self, inputs: &mut PayrollInputs, value: Decimal) {
        let slot = match self {
            PayrollField::DailyPay => &mut inputs.daily_pay,
            PayrollField::OvertimePay => &mut inputs.overtime_pay,
            PayrollField::Bata => &mut inputs.bata,
            PayrollField::PfDeduction => &mut inputs.pf_deduction,
            PayrollField::EsiDeduction => &mut inputs.esi_deduction,
            PayrollField::AdvanceDeduction => &mut inputs.advance_deduction,
        };
        *slot = value;
    }
}

impl fmt::Display for PayrollField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sparse set of per-field values replacing the stored amounts.
///
/// Used both for edits staged by a reviewer and for the overrides persisted
/// on a monthly payroll.
///
/// # Example
///
/// ```
/// use attendance_payroll::models::{PayrollField, PayrollInputs, PayrollOverrides};
/// use rust_decimal::Decimal;
///
/// let mut overrides = PayrollOverrides::default();
/// overrides.set(PayrollField::Bata, Decimal::new(75, 0));
///
/// let merged = overrides.apply(PayrollInputs::default());
/// assert_eq!(merged.bata, Decimal::new(75, 0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollOverrides {
    /// Replacement daily pay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_pay: Option<Decimal>,
    /// Replacement overtime pay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overtime_pay: Option<Decimal>,
    /// Replacement bata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bata: Option<Decimal>,
    /// Replacement PF deduction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pf_deduction: Option<Decimal>,
    /// Replacement ESI deduction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub esi_deduction: Option<Decimal>,
    /// Replacement advance deduction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance_deduction: Option<Decimal>,
}

impl PayrollOverrides {
    fn slot(&mut self, field: PayrollField) -> &mut Option<Decimal> {
        match field {
            PayrollField::DailyPay => &mut self.daily_pay,
            PayrollField::OvertimePay => &mut self.overtime_pay,
            PayrollField::Bata => &mut self.bata,
            PayrollField::PfDeduction => &mut self.pf_deduction,
            PayrollField::EsiDeduction => &mut self.esi_deduction,
            PayrollField::AdvanceDeduction => &mut self.advance_deduction,
        }
    }

    /// Returns the override for a field, if any.
    pub fn get(&self, field: PayrollField) -> Option<Decimal> {
        match field {
            PayrollField::DailyPay => self.daily_pay,
            PayrollField::OvertimePay => self.overtime_pay,
            PayrollField::Bata => self.bata,
            PayrollField::PfDeduction => self.pf_deduction,
            PayrollField::EsiDeduction => self.esi_deduction,
            PayrollField::AdvanceDeduction => self.advance_deduction,
        }
    }

    /// Sets a field, replacing any earlier value (last write wins).
    pub fn set(&mut self, field: PayrollField, value: Decimal) {
        *self.slot(field) = Some(value);
    }

    /// Layers every field set in `other` on top of this set.
    pub fn merge(&mut self, other: &PayrollOverrides) {
        for (field, value) in other.entries() {
            self.set(field, value);
        }
    }

    /// Returns the fields that are set, in declaration order.
    pub fn entries(&self) -> Vec<(PayrollField, Decimal)> {
        PayrollField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
            .collect()
    }

    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        PayrollField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Returns `inputs` with every set field replaced.
    pub fn apply(&self, mut inputs: PayrollInputs) -> PayrollInputs {
        for (field, value) in self.entries() {
            field.set(&mut inputs, value);
        }
        inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_default_snapshot_is_zero_and_consistent() {
        let snapshot = PayrollSnapshot::default();
        assert_eq!(snapshot.gross_pay(), Decimal::ZERO);
        assert_eq!(snapshot.net_payable(), Decimal::ZERO);
        assert!(snapshot.is_consistent());
    }

    #[test]
    fn test_serialize_snapshot_is_flat() {
        let snapshot = compute_totals(PayrollInputs {
            daily_pay: dec("500"),
            bata: dec("50"),
            ..PayrollInputs::default()
        })
        .unwrap();
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["daily_pay"], "500");
        assert_eq!(json["gross_pay"], "550");
        assert_eq!(json["net_payable"], "550");
    }

    #[test]
    fn test_deserialize_recomputes_derived_fields() {
        let json = r#"{
            "daily_pay": "700",
            "overtime_pay": "100",
            "bata": "50",
            "pf_deduction": "40",
            "esi_deduction": "20",
            "gross_pay": "1",
            "net_payable": "99999"
        }"#;
        let snapshot: PayrollSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.gross_pay(), dec("850"));
        assert_eq!(snapshot.total_deductions(), dec("60"));
        assert_eq!(snapshot.net_payable(), dec("790"));
    }

    #[test]
    fn test_deserialize_rejects_negative_amounts() {
        let json = r#"{ "bata": "-5" }"#;
        let result: Result<PayrollSnapshot, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_field_get_and_set() {
        let mut inputs = PayrollInputs::default();
        for (i, field) in PayrollField::ALL.into_iter().enumerate() {
            field.set(&mut inputs, Decimal::from(i as u32 + 1));
        }
        for (i, field) in PayrollField::ALL.into_iter().enumerate() {
            assert_eq!(field.get(&inputs), Decimal::from(i as u32 + 1));
        }
        assert_eq!(inputs.base_pay, Decimal::ZERO);
    }

    #[test]
    fn test_field_serialization() {
        assert_eq!(
            serde_json::to_string(&PayrollField::AdvanceDeduction).unwrap(),
            "\"advance_deduction\""
        );
        let field: PayrollField = serde_json::from_str("\"overtime_pay\"").unwrap();
        assert_eq!(field, PayrollField::OvertimePay);
    }

    #[test]
    fn test_unknown_field_does_not_deserialize() {
        let result: Result<PayrollField, _> = serde_json::from_str("\"net_payable\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_last_write_wins() {
        let mut overrides = PayrollOverrides::default();
        overrides.set(PayrollField::OvertimePay, dec("100"));
        overrides.set(PayrollField::OvertimePay, dec("150"));
        assert_eq!(overrides.get(PayrollField::OvertimePay), Some(dec("150")));
        assert_eq!(overrides.entries().len(), 1);
    }

    #[test]
    fn test_overrides_merge_and_apply() {
        let mut base = PayrollOverrides::default();
        base.set(PayrollField::Bata, dec("40"));
        base.set(PayrollField::DailyPay, dec("500"));

        let mut later = PayrollOverrides::default();
        later.set(PayrollField::Bata, dec("60"));
        base.merge(&later);

        let inputs = base.apply(PayrollInputs {
            pf_deduction: dec("12"),
            ..PayrollInputs::default()
        });
        assert_eq!(inputs.bata, dec("60"));
        assert_eq!(inputs.daily_pay, dec("500"));
        assert_eq!(inputs.pf_deduction, dec("12"));
    }

    #[test]
    fn test_empty_overrides_serialize_as_empty_object() {
        let overrides = PayrollOverrides::default();
        assert!(overrides.is_empty());
        assert_eq!(serde_json::to_string(&overrides).unwrap(), "{}");
    }
}
