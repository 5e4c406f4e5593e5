//! Attendance lifecycle.
//!
//! [`apply_event`] is the pure state machine; [`AttendanceService`] loads,
//! guards and persists the records it transforms.

mod service;
mod state_machine;

pub use service::AttendanceService;
pub use state_machine::{AttendanceEvent, apply_event};
