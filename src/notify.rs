//! Fire-and-forget notifications.
//!
//! The engine informs an external notification service when a day is
//! approved or rejected and when a month is locked. Delivery is never
//! required for correctness: a notifier cannot fail an operation.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::models::{AttendanceStatus, PayrollPeriod};

/// An event worth telling the outside world about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    /// A day was approved as a full or half day.
    AttendanceApproved {
        /// The record.
        record_id: Uuid,
        /// The worker to inform.
        worker_id: String,
        /// `Approved` or `HalfDay`.
        status: AttendanceStatus,
    },
    /// A day was rejected.
    AttendanceRejected {
        /// The record.
        record_id: Uuid,
        /// The worker to inform.
        worker_id: String,
        /// The reviewer's reason.
        remark: String,
    },
    /// A monthly payroll became final.
    PayrollLocked {
        /// The document.
        payroll_id: Uuid,
        /// The worker to inform.
        worker_id: String,
        /// The locked month.
        period: PayrollPeriod,
    },
}

/// Receives notifications. Implementations must not block for long and
/// must swallow their own delivery failures.
pub trait Notifier: Send + Sync {
    /// Hands an event to the notification transport.
    fn notify(&self, notification: Notification);
}

/// Writes every notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match &notification {
            Notification::AttendanceApproved {
                record_id, status, ..
            } => info!(record_id = %record_id, status = %status, "Notify: attendance approved"),
            Notification::AttendanceRejected { record_id, .. } => {
                info!(record_id = %record_id, "Notify: attendance rejected")
            }
            Notification::PayrollLocked {
                payroll_id, period, ..
            } => info!(payroll_id = %payroll_id, period = %period, "Notify: payroll locked"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::{Notification, Notifier};

    /// Collects notifications for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub events: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn events(&self) -> Vec<Notification> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.events.lock().unwrap().push(notification);
        }
    }
}
