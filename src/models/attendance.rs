//! Attendance record model.
//!
//! This module contains the [`AttendanceRecord`] type, one per assignment
//! and calendar day, and the [`StatusChange`] entries of its history.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Actor, Assignment, AttendanceStatus, PayTemplate, PayrollInputs, PayrollPeriod, PayrollSnapshot,
};
use crate::calculation::compute_totals;
use crate::error::EngineResult;

/// One entry in a record's audit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// The status before the change.
    pub from: AttendanceStatus,
    /// The status after the change.
    pub to: AttendanceStatus,
    /// Who caused the change.
    pub actor: Actor,
    /// When the change was applied.
    pub at: DateTime<Utc>,
    /// Remark supplied with the change, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// A worker's attendance and payroll for one day of an assignment.
///
/// Records are created in `NotStarted`, mutated only through the state
/// machine and the review service, and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Unique identifier for the record.
    pub id: Uuid,
    /// The owning assignment.
    pub assignment_id: Uuid,
    /// The worker the record belongs to.
    pub worker_id: String,
    /// The calendar day.
    pub date: NaiveDate,
    /// Current lifecycle state.
    pub status: AttendanceStatus,
    /// When the worker checked in (site local time).
    pub check_in_time: Option<NaiveDateTime>,
    /// When the worker checked out (site local time).
    pub check_out_time: Option<NaiveDateTime>,
    /// Opaque reference to the submitted proof.
    pub proof_ref: Option<String>,
    /// Metadata attached alongside the proof.
    #[serde(default)]
    pub proof_metadata: BTreeMap<String, String>,
    /// The pay template in force when the record was materialized.
    pub pay_template: PayTemplate,
    /// The day's payroll.
    pub payroll: PayrollSnapshot,
    /// The latest reviewer remark.
    pub remarks: Option<String>,
    /// Every status change, oldest first.
    #[serde(default)]
    pub history: Vec<StatusChange>,
    /// Set once the owning month is locked.
    #[serde(default)]
    pub locked: bool,
    /// Incremented on every persisted mutation.
    pub version: u64,
    /// When the record was materialized.
    pub created_at: DateTime<Utc>,
    /// When the record was last persisted.
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Materializes a `NotStarted` record for one day of an assignment.
    ///
    /// The whole pay template is captured on the record and the snapshot
    /// starts at zero with `base_pay` set to its daily wage. Replacing the
    /// assignment's template later never changes the rates of this day.
    pub fn scheduled(assignment: &Assignment, date: NaiveDate) -> EngineResult<Self> {
        let payroll = compute_totals(PayrollInputs {
            base_pay: assignment.pay_template.daily_wage,
            ..PayrollInputs::default()
        })?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            assignment_id: assignment.id,
            worker_id: assignment.worker_id.clone(),
            date,
            status: AttendanceStatus::NotStarted,
            check_in_time: None,
            check_out_time: None,
            proof_ref: None,
            proof_metadata: BTreeMap::new(),
            pay_template: assignment.pay_template,
            payroll,
            remarks: None,
            history: Vec::new(),
            locked: false,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// The month this record belongs to.
    pub fn period(&self) -> PayrollPeriod {
        PayrollPeriod::of(self.date)
    }
}
