//! Reviewer staging and overrides.

mod pending;
mod service;

pub use pending::PendingEdits;
pub use service::{PendingView, ReviewService};
