//! Caller context passed explicitly into every engine operation.

use serde::{Deserialize, Serialize};

/// The authenticated reviewer performing an operation.
///
/// Authentication happens upstream; the engine only records who acted and
/// keys staged edits by session so two reviewers never share pending state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewContext {
    /// The reviewer's identity.
    pub reviewer_id: String,
    /// The reviewer's session, scoping staged edits.
    pub session_id: String,
}

impl ReviewContext {
    /// Creates a context for a reviewer session.
    pub fn new(reviewer_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// Who caused a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// The worker the record belongs to.
    Worker(String),
    /// A reviewer.
    Reviewer(String),
    /// The external scheduler.
    Scheduler,
}

impl From<&ReviewContext> for Actor {
    fn from(ctx: &ReviewContext) -> Self {
        Actor::Reviewer(ctx.reviewer_id.clone())
    }
}
