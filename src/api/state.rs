//! Application state for the attendance payroll API.
//!
//! This module defines the shared application state that is available
//! to all request handlers, and the bounded execution of service calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregation::MonthlyPayrollAggregator;
use crate::attendance::AttendanceService;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::notify::{Notifier, TracingNotifier};
use crate::review::{PendingEdits, ReviewService};
use crate::store::{MemoryStore, Store};

/// Shared application state.
///
/// Holds the engine services wired to one store, and the per-request
/// timeout.
#[derive(Clone)]
pub struct AppState {
    attendance: AttendanceService,
    review: ReviewService,
    payrolls: MonthlyPayrollAggregator,
    request_timeout: Duration,
}

impl AppState {
    /// Wires the services over a store and a notifier.
    pub fn new(config: &EngineConfig, store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        let attendance = AttendanceService::new(store.clone(), notifier.clone(), config.payroll.clone());
        let review = ReviewService::new(
            attendance.clone(),
            Arc::new(PendingEdits::from_settings(&config.review)),
        );
        let payrolls = MonthlyPayrollAggregator::new(store, notifier);
        Self {
            attendance,
            review,
            payrolls,
            request_timeout: Duration::from_millis(config.server.request_timeout_ms),
        }
    }

    /// Wires the services over a fresh in-memory store that logs
    /// notifications.
    pub fn in_memory(config: &EngineConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()), Arc::new(TracingNotifier))
    }

    /// The attendance service.
    pub fn attendance(&self) -> &AttendanceService {
        &self.attendance
    }

    /// The review service.
    pub fn review(&self) -> &ReviewService {
        &self.review
    }

    /// The monthly payroll aggregator.
    pub fn payrolls(&self) -> &MonthlyPayrollAggregator {
        &self.payrolls
    }

    /// Spawns a task that drops expired staged edits every `every`.
    ///
    /// The task runs until the returned handle is aborted or the runtime
    /// shuts down.
    pub fn spawn_pending_purge(&self, every: Duration) -> JoinHandle<()> {
        let review = self.review.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match review.pending_edits().purge_expired() {
                    Ok(0) => {}
                    Ok(dropped) => info!(dropped, "Purged expired pending edits"),
                    Err(err) => warn!(error = %err, "Failed to purge pending edits"),
                }
            }
        })
    }

    /// Runs a service call on the blocking pool within the request timeout.
    ///
    /// The store and staging area use blocking locks, so service calls never
    /// run on the async workers.
    pub(crate) async fn run<T, F>(&self, operation: &'static str, call: F) -> EngineResult<T>
    where
        T: Send + 'static,
        F: FnOnce(AppState) -> EngineResult<T> + Send + 'static,
    {
        let correlation_id = Uuid::new_v4();
        info!(correlation_id = %correlation_id, operation, "Processing request");

        let start_time = Instant::now();
        let state = self.clone();
        let task = tokio::task::spawn_blocking(move || call(state));

        let result = match tokio::time::timeout(self.request_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(EngineError::Internal {
                message: format!("{} task failed: {}", operation, join_error),
            }),
            Err(_) => Err(EngineError::Timeout {
                operation: operation.to_string(),
                timeout_ms: self.request_timeout.as_millis() as u64,
            }),
        };

        let duration = start_time.elapsed();
        match &result {
            Ok(_) => info!(
                correlation_id = %correlation_id,
                operation,
                duration_us = duration.as_micros(),
                "Request completed successfully"
            ),
            Err(err) => warn!(
                correlation_id = %correlation_id,
                operation,
                error = %err,
                retryable = err.is_retryable(),
                duration_us = duration.as_micros(),
                "Request failed"
            ),
        }
        result
    }
}
