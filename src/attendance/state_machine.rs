//! The attendance status state machine.
//!
//! [`apply_event`] is the only function that changes a record's status. It
//! is pure: it returns the next record and leaves the input untouched, so a
//! rejected event never changes state or payroll.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calculation::{DayOutcome, compute_totals, derive_day_payroll, zero_earnings};
use crate::config::PayrollPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{Actor, Assignment, AttendanceRecord, AttendanceStatus, StatusChange};

/// Something that happened to an attendance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttendanceEvent {
    /// The worker arrived.
    CheckIn {
        /// Arrival time.
        at: NaiveDateTime,
    },
    /// The worker left.
    CheckOut {
        /// Departure time.
        at: NaiveDateTime,
    },
    /// The worker uploaded proof of presence.
    SubmitProof {
        /// Opaque reference from the proof capture service.
        proof_ref: String,
        /// Metadata captured with the proof.
        #[serde(default)]
        metadata: BTreeMap<String, String>,
    },
    /// A reviewer approved a full day.
    Approve {
        /// Optional reviewer note.
        remark: Option<String>,
    },
    /// A reviewer rejected the claim.
    Reject {
        /// Mandatory reason.
        remark: String,
    },
    /// A reviewer determined partial attendance.
    MarkHalfDay {
        /// Optional reviewer note.
        remark: Option<String>,
    },
    /// A reviewer re-opened a settled day.
    ResetToReview {
        /// Optional reason for re-opening.
        remark: Option<String>,
    },
    /// The scheduler found nobody acted on the day.
    AutoMarkAbsent,
}

impl AttendanceEvent {
    /// The status this event moves a record into.
    pub fn target(&self) -> AttendanceStatus {
        match self {
            AttendanceEvent::CheckIn { .. } => AttendanceStatus::CheckedIn,
            AttendanceEvent::CheckOut { .. } => AttendanceStatus::CheckedOut,
            AttendanceEvent::SubmitProof { .. } => AttendanceStatus::PendingVerification,
            AttendanceEvent::Approve { .. } => AttendanceStatus::Approved,
            AttendanceEvent::Reject { .. } => AttendanceStatus::Rejected,
            AttendanceEvent::MarkHalfDay { .. } => AttendanceStatus::HalfDay,
            AttendanceEvent::ResetToReview { .. } => AttendanceStatus::PendingVerification,
            AttendanceEvent::AutoMarkAbsent => AttendanceStatus::AutoMarkedAbsent,
        }
    }

    /// Returns true when the event may be applied to a record in `from`.
    pub fn allowed_from(&self, from: AttendanceStatus) -> bool {
        use AttendanceStatus::*;
        match self {
            AttendanceEvent::CheckIn { .. } => from == NotStarted,
            AttendanceEvent::CheckOut { .. } => from == CheckedIn,
            AttendanceEvent::SubmitProof { .. } => matches!(from, CheckedIn | CheckedOut),
            AttendanceEvent::Approve { .. } => from == PendingVerification,
            AttendanceEvent::MarkHalfDay { .. } => from == PendingVerification,
            AttendanceEvent::Reject { .. } => !from.is_terminal(),
            AttendanceEvent::ResetToReview { .. } => from.is_terminal(),
            AttendanceEvent::AutoMarkAbsent => from == NotStarted,
        }
    }

    fn remark(&self) -> Option<String> {
        match self {
            AttendanceEvent::Approve { remark }
            | AttendanceEvent::MarkHalfDay { remark }
            | AttendanceEvent::ResetToReview { remark } => remark.clone(),
            AttendanceEvent::Reject { remark } => Some(remark.clone()),
            _ => None,
        }
    }
}

/// Applies an event to a record and returns the next record.
///
/// Entering `Approved` or `HalfDay` derives the day's payroll from the
/// assignment; entering `Rejected` or `AutoMarkedAbsent` zeroes earnings.
/// Every other transition recomputes totals over unchanged inputs. The
/// change is appended to the record's history.
///
/// # Errors
///
/// - `InvalidTransition` when the event is not allowed from the current status
/// - `InvalidState` when checking out without a check-in time
/// - `Validation` for a blank rejection remark, a blank proof reference or a
///   check-out before the check-in
pub fn apply_event(
    record: &AttendanceRecord,
    assignment: &Assignment,
    event: AttendanceEvent,
    actor: Actor,
    policy: &PayrollPolicy,
) -> EngineResult<AttendanceRecord> {
    let from = record.status;
    let to = event.target();

    if !event.allowed_from(from) {
        return Err(EngineError::InvalidTransition {
            current: from,
            requested: to,
        });
    }

    let mut next = record.clone();
    let remark = event.remark();

    match event {
        AttendanceEvent::CheckIn { at } => {
            next.check_in_time = Some(at);
        }
        AttendanceEvent::CheckOut { at } => {
            let check_in = record.check_in_time.ok_or_else(|| EngineError::InvalidState {
                record_id: record.id,
                status: from,
                message: "cannot check out without a check-in time".to_string(),
            })?;
            if at < check_in {
                return Err(EngineError::validation(
                    "check_out_time",
                    format!("check-out {} is before check-in {}", at, check_in),
                ));
            }
            next.check_out_time = Some(at);
        }
        AttendanceEvent::SubmitProof {
            proof_ref,
            metadata,
        } => {
            if proof_ref.trim().is_empty() {
                return Err(EngineError::validation("proof_ref", "proof reference is required"));
            }
            next.proof_ref = Some(proof_ref);
            next.proof_metadata = metadata;
        }
        AttendanceEvent::Approve { .. } => {
            next.payroll =
                derive_day_payroll(record, assignment, DayOutcome::FullDay, policy)?.snapshot;
        }
        AttendanceEvent::MarkHalfDay { .. } => {
            next.payroll =
                derive_day_payroll(record, assignment, DayOutcome::HalfDay, policy)?.snapshot;
        }
        AttendanceEvent::Reject { remark } => {
            if remark.trim().is_empty() {
                return Err(EngineError::validation(
                    "remark",
                    "a remark is required to reject attendance",
                ));
            }
            next.payroll = zero_earnings(&record.payroll, policy)?;
        }
        AttendanceEvent::AutoMarkAbsent => {
            next.payroll = zero_earnings(&record.payroll, policy)?;
        }
        AttendanceEvent::ResetToReview { .. } => {
            next.payroll = compute_totals(record.payroll.inputs())?;
        }
    }

    next.status = to;
    if remark.is_some() {
        next.remarks = remark.clone();
    }
    next.history.push(StatusChange {
        from,
        to,
        actor,
        at: Utc::now(),
        remark,
    });

    Ok(next)
}
