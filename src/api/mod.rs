//! HTTP API module for the attendance payroll engine.
//!
//! This module provides the REST endpoints over the attendance, review and
//! monthly payroll services. Reviewer identity arrives in the
//! `x-reviewer-id` and `x-session-id` headers.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::{REVIEWER_HEADER, SESSION_HEADER, create_router};
pub use request::{
    AssignmentRequest, DateRangeQuery, GenerateRequest, MaterializeRequest, ProofRequest,
    RemarkRequest, StageEditRequest, TimestampRequest,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
