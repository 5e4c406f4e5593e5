//! Attendance status enumeration.
//!
//! This module defines [`AttendanceStatus`], the closed set of states an
//! attendance record moves through between check-in and payroll.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle state of a single attendance record.
///
/// `Approved`, `HalfDay`, `Rejected` and `AutoMarkedAbsent` are terminal:
/// they stay put until a reviewer explicitly resets the record to
/// `PendingVerification`.
///
/// # Example
///
/// ```
/// use attendance_payroll::models::AttendanceStatus;
///
/// assert!(AttendanceStatus::Approved.is_terminal());
/// assert!(!AttendanceStatus::CheckedIn.is_terminal());
/// assert_eq!(AttendanceStatus::HalfDay.to_string(), "HALF_DAY");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    /// The day is scheduled but the worker has not acted yet.
    NotStarted,
    /// The worker has checked in.
    CheckedIn,
    /// The worker has checked out.
    CheckedOut,
    /// Proof was uploaded and awaits a reviewer.
    PendingVerification,
    /// A reviewer approved a full day.
    Approved,
    /// A reviewer determined partial attendance.
    HalfDay,
    /// A reviewer rejected the attendance claim.
    Rejected,
    /// The scheduler marked the day absent because nobody acted on it.
    AutoMarkedAbsent,
}

impl AttendanceStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [AttendanceStatus; 8] = [
        AttendanceStatus::NotStarted,
        AttendanceStatus::CheckedIn,
        AttendanceStatus::CheckedOut,
        AttendanceStatus::PendingVerification,
        AttendanceStatus::Approved,
        AttendanceStatus::HalfDay,
        AttendanceStatus::Rejected,
        AttendanceStatus::AutoMarkedAbsent,
    ];

    /// Returns true for the stable outcomes that only a reset can re-open.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AttendanceStatus::Approved
                | AttendanceStatus::HalfDay
                | AttendanceStatus::Rejected
                | AttendanceStatus::AutoMarkedAbsent
        )
    }

    /// Returns true when reviewers may stage payroll edits.
    pub fn is_editable(self) -> bool {
        matches!(self, AttendanceStatus::Approved | AttendanceStatus::HalfDay)
    }

    /// Returns true when the day's payroll counts towards the monthly total.
    pub fn is_payable(self) -> bool {
        self.is_editable()
    }

    /// Returns true while the day is still moving towards a reviewer decision.
    pub fn is_unresolved(self) -> bool {
        matches!(
            self,
            AttendanceStatus::CheckedIn
                | AttendanceStatus::CheckedOut
                | AttendanceStatus::PendingVerification
        )
    }

    /// The wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::NotStarted => "NOT_STARTED",
            AttendanceStatus::CheckedIn => "CHECKED_IN",
            AttendanceStatus::CheckedOut => "CHECKED_OUT",
            AttendanceStatus::PendingVerification => "PENDING_VERIFICATION",
            AttendanceStatus::Approved => "APPROVED",
            AttendanceStatus::HalfDay => "HALF_DAY",
            AttendanceStatus::Rejected => "REJECTED",
            AttendanceStatus::AutoMarkedAbsent => "AUTO_MARKED_ABSENT",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = AttendanceStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                AttendanceStatus::Approved,
                AttendanceStatus::HalfDay,
                AttendanceStatus::Rejected,
                AttendanceStatus::AutoMarkedAbsent,
            ]
        );
    }

    #[test]
    fn test_only_approved_and_half_day_are_editable() {
        for status in AttendanceStatus::ALL {
            let expected = matches!(
                status,
                AttendanceStatus::Approved | AttendanceStatus::HalfDay
            );
            assert_eq!(status.is_editable(), expected, "{status}");
        }
    }

    #[test]
    fn test_unresolved_statuses() {
        assert!(AttendanceStatus::CheckedIn.is_unresolved());
        assert!(AttendanceStatus::PendingVerification.is_unresolved());
        assert!(!AttendanceStatus::NotStarted.is_unresolved());
        assert!(!AttendanceStatus::Rejected.is_unresolved());
    }

    #[test]
    fn test_serialization_matches_display() {
        for status in AttendanceStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }

    #[test]
    fn test_deserialize_status() {
        let status: AttendanceStatus = serde_json::from_str("\"AUTO_MARKED_ABSENT\"").unwrap();
        assert_eq!(status, AttendanceStatus::AutoMarkedAbsent);
    }
}
