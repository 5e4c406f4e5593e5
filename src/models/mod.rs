//! Core data models for the attendance payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod assignment;
mod attendance;
mod context;
mod monthly;
mod payroll;
mod period;
mod status;

pub use assignment::{Assignment, AssignmentStatus, PayTemplate, ShiftWindow};
pub use attendance::{AttendanceRecord, StatusChange};
pub use context::{Actor, ReviewContext};
pub use monthly::{DayCounts, LockState, MonthlyPayroll};
pub use payroll::{PayrollField, PayrollInputs, PayrollOverrides, PayrollSnapshot};
pub use period::PayrollPeriod;
pub use status::AttendanceStatus;
