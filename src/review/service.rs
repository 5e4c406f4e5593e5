//! Review and override service.
//!
//! Reviewers stage payroll edits on settled days, commit them as one
//! atomic write, and drive the reviewer transitions of the state machine.
//! Every call carries the reviewer's [`ReviewContext`].

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::attendance::{AttendanceEvent, AttendanceService};
use crate::calculation::{compute_totals, validate_amount};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Actor, AttendanceRecord, PayrollField, PayrollOverrides, PayrollSnapshot, ReviewContext,
};

use super::PendingEdits;

/// A session's staged edits for a record with the payroll they would produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingView {
    /// The record the edits apply to.
    pub record_id: Uuid,
    /// The record version the preview was computed against.
    pub version: u64,
    /// Staged field values.
    pub edits: PayrollOverrides,
    /// The stored snapshot with the edits applied and totals recomputed.
    pub preview: PayrollSnapshot,
}

/// Reviewer operations on attendance records.
#[derive(Clone)]
pub struct ReviewService {
    attendance: AttendanceService,
    pending: Arc<PendingEdits>,
}

impl ReviewService {
    /// Creates a review service on top of the attendance service.
    pub fn new(attendance: AttendanceService, pending: Arc<PendingEdits>) -> Self {
        Self {
            attendance,
            pending,
        }
    }

    /// The staging area.
    pub fn pending_edits(&self) -> &PendingEdits {
        &self.pending
    }

    /// Stages a new value for one payroll field.
    ///
    /// # Errors
    ///
    /// - `Validation` for a negative value or a blank context
    /// - `NotEditable` unless the record is `Approved` or `HalfDay`
    /// - `RecordLocked` when the record's month is locked
    pub fn stage_edit(
        &self,
        ctx: &ReviewContext,
        record_id: Uuid,
        field: PayrollField,
        value: Decimal,
    ) -> EngineResult<PendingView> {
        validate_context(ctx)?;
        validate_amount(field.as_str(), value)?;

        let record = self.attendance.get(record_id)?;
        self.attendance.ensure_writable(&record)?;
        ensure_editable(&record, field)?;

        let edits = self.pending.stage(&ctx.session_id, record_id, field, value)?;
        info!(
            record_id = %record_id,
            reviewer_id = %ctx.reviewer_id,
            field = %field,
            value = %value,
            "Staged payroll edit"
        );
        view(&record, edits)
    }

    /// The session's staged edits for a record and the resulting preview.
    /// Nothing is persisted.
    pub fn pending(&self, ctx: &ReviewContext, record_id: Uuid) -> EngineResult<PendingView> {
        validate_context(ctx)?;
        let record = self.attendance.get(record_id)?;
        let edits = self
            .pending
            .get(&ctx.session_id, record_id)?
            .unwrap_or_default();
        view(&record, edits)
    }

    /// Writes the session's staged edits onto the stored record.
    ///
    /// The write is a compare-and-swap: if another writer changed the record
    /// first this fails with a retryable `VersionConflict` and the staged
    /// edits are kept.
    ///
    /// # Errors
    ///
    /// - `NothingStaged` when the session has no edits for the record, which
    ///   includes edits that expired before the commit
    /// - `NotEditable` when the record left `Approved`/`HalfDay` after staging
    /// - `RecordLocked` when the month was locked after staging
    /// - `VersionConflict` or `Storage` when persisting fails
    pub fn commit(&self, ctx: &ReviewContext, record_id: Uuid) -> EngineResult<AttendanceRecord> {
        validate_context(ctx)?;
        let record = self.attendance.get(record_id)?;

        self.attendance.ensure_writable(&record)?;

        let edits = match self.pending.get(&ctx.session_id, record_id)? {
            Some(edits) if !edits.is_empty() => edits,
            _ => {
                warn!(
                    record_id = %record_id,
                    reviewer_id = %ctx.reviewer_id,
                    session_id = %ctx.session_id,
                    "Commit found no staged edits"
                );
                return Err(EngineError::NothingStaged {
                    record_id,
                    session_id: ctx.session_id.clone(),
                });
            }
        };

        for (field, _) in edits.entries() {
            ensure_editable(&record, field)?;
        }

        let mut next = record.clone();
        next.payroll = compute_totals(edits.apply(record.payroll.inputs()))?;

        let stored = match self
            .attendance
            .store()
            .update_attendance(record.version, next)
        {
            Ok(stored) => stored,
            Err(err) => {
                warn!(
                    record_id = %record_id,
                    reviewer_id = %ctx.reviewer_id,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Commit failed, pending edits kept"
                );
                return Err(err);
            }
        };

        self.pending
            .clear_committed(&ctx.session_id, record_id, &edits)?;
        info!(
            record_id = %record_id,
            reviewer_id = %ctx.reviewer_id,
            fields = edits.entries().len(),
            version = stored.version,
            net_payable = %stored.payroll.net_payable(),
            "Committed payroll edits"
        );
        Ok(stored)
    }

    /// Drops the session's staged edits. Returns whether any existed.
    pub fn discard(&self, ctx: &ReviewContext, record_id: Uuid) -> EngineResult<bool> {
        validate_context(ctx)?;
        let discarded = self.pending.discard(&ctx.session_id, record_id)?;
        if discarded {
            info!(record_id = %record_id, reviewer_id = %ctx.reviewer_id, "Discarded pending edits");
        }
        Ok(discarded)
    }

    /// Approves a pending day as a full day.
    pub fn approve(
        &self,
        ctx: &ReviewContext,
        record_id: Uuid,
        remark: Option<String>,
    ) -> EngineResult<AttendanceRecord> {
        self.transition(ctx, record_id, AttendanceEvent::Approve { remark })
    }

    /// Rejects a non-terminal day. The remark is mandatory.
    pub fn reject(
        &self,
        ctx: &ReviewContext,
        record_id: Uuid,
        remark: String,
    ) -> EngineResult<AttendanceRecord> {
        self.transition(ctx, record_id, AttendanceEvent::Reject { remark })
    }

    /// Approves a pending day as a half day.
    pub fn mark_half_day(
        &self,
        ctx: &ReviewContext,
        record_id: Uuid,
        remark: Option<String>,
    ) -> EngineResult<AttendanceRecord> {
        self.transition(ctx, record_id, AttendanceEvent::MarkHalfDay { remark })
    }

    /// Re-opens a settled day for review.
    pub fn reset_to_review(
        &self,
        ctx: &ReviewContext,
        record_id: Uuid,
        remark: Option<String>,
    ) -> EngineResult<AttendanceRecord> {
        self.transition(ctx, record_id, AttendanceEvent::ResetToReview { remark })
    }

    fn transition(
        &self,
        ctx: &ReviewContext,
        record_id: Uuid,
        event: AttendanceEvent,
    ) -> EngineResult<AttendanceRecord> {
        validate_context(ctx)?;
        self.attendance.apply(record_id, event, Actor::from(ctx))
    }
}

fn validate_context(ctx: &ReviewContext) -> EngineResult<()> {
    if ctx.reviewer_id.trim().is_empty() {
        return Err(EngineError::validation("reviewer_id", "reviewer id is required"));
    }
    if ctx.session_id.trim().is_empty() {
        return Err(EngineError::validation("session_id", "session id is required"));
    }
    Ok(())
}

fn ensure_editable(record: &AttendanceRecord, field: PayrollField) -> EngineResult<()> {
    if !record.status.is_editable() {
        return Err(EngineError::NotEditable {
            record_id: record.id,
            status: record.status,
            field,
        });
    }
    Ok(())
}

fn view(record: &AttendanceRecord, edits: PayrollOverrides) -> EngineResult<PendingView> {
    Ok(PendingView {
        record_id: record.id,
        version: record.version,
        edits,
        preview: compute_totals(edits.apply(record.payroll.inputs()))?,
    })
}
