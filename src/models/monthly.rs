//! Monthly payroll model.
//!
//! This module contains the [`MonthlyPayroll`] document aggregated from a
//! month of attendance records, together with its [`LockState`] and
//! [`DayCounts`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PayrollOverrides, PayrollPeriod, PayrollSnapshot};

/// Whether a monthly payroll may still change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockState {
    /// Editable and regenerable.
    Unlocked,
    /// Final. There is no transition back.
    Locked,
}

/// How the days of a month were classified during aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCounts {
    /// Days approved as full days.
    pub approved: u32,
    /// Days approved as half days.
    pub half_days: u32,
    /// Rejected or auto-absent days.
    pub absent: u32,
    /// Scheduled days nobody acted on.
    pub not_started: u32,
    /// Days still awaiting a reviewer decision.
    pub unresolved: u32,
}

impl DayCounts {
    /// Total number of records seen.
    pub fn total(&self) -> u32 {
        self.approved + self.half_days + self.absent + self.not_started + self.unresolved
    }
}

/// The monthly aggregate of one worker's daily payroll on one assignment.
///
/// `computed` is the pure sum over the month's records, `overrides` are
/// reviewer edits persisted on top of it and `totals` is the effective
/// payroll (`computed` with `overrides` applied, totals recomputed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPayroll {
    /// Unique identifier for the document.
    pub id: Uuid,
    /// The aggregated assignment.
    pub assignment_id: Uuid,
    /// The worker paid by this document.
    pub worker_id: String,
    /// The month covered.
    pub period: PayrollPeriod,
    /// Whether the document is final.
    pub lock_state: LockState,
    /// The sum of the month's payable days.
    pub computed: PayrollSnapshot,
    /// Reviewer overrides layered on the computed sum.
    #[serde(default)]
    pub overrides: PayrollOverrides,
    /// The effective payroll.
    pub totals: PayrollSnapshot,
    /// Day classification from the last generation.
    pub days: DayCounts,
    /// Incremented on every persisted mutation.
    pub version: u64,
    /// When the aggregate was last generated.
    pub generated_at: DateTime<Utc>,
    /// When the document was locked.
    pub locked_at: Option<DateTime<Utc>>,
    /// Who locked the document.
    pub locked_by: Option<String>,
}

impl MonthlyPayroll {
    /// Returns true once the document is final.
    pub fn is_locked(&self) -> bool {
        self.lock_state == LockState::Locked
    }
}
