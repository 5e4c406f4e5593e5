//! Staged reviewer edits.
//!
//! Edits accumulate per (review session, record) until they are committed
//! or discarded. A set that is not touched for the configured TTL expires;
//! expired sets are dropped when next looked at and by
//! [`PendingEdits::purge_expired`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::config::ReviewSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{PayrollField, PayrollOverrides};

type PendingKey = (String, Uuid);

#[derive(Debug, Clone, Copy)]
struct PendingSet {
    overrides: PayrollOverrides,
    last_touched: Instant,
}

/// All staged, uncommitted edits.
#[derive(Debug)]
pub struct PendingEdits {
    sets: Mutex<HashMap<PendingKey, PendingSet>>,
    ttl: Duration,
    max_sets: usize,
}

impl PendingEdits {
    /// Creates an empty staging area.
    pub fn new(ttl: Duration, max_sets: usize) -> Self {
        Self {
            sets: Mutex::new(HashMap::new()),
            ttl,
            max_sets,
        }
    }

    /// Creates a staging area from the review settings.
    pub fn from_settings(settings: &ReviewSettings) -> Self {
        Self::new(
            Duration::from_secs(settings.pending_edit_ttl_secs),
            settings.max_pending_sets,
        )
    }

    /// Stages one field, replacing any earlier value for it.
    ///
    /// Returns the full set of staged edits for the record.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when starting a new set would exceed the
    /// configured maximum even after dropping expired sets.
    pub fn stage(
        &self,
        session_id: &str,
        record_id: Uuid,
        field: PayrollField,
        value: Decimal,
    ) -> EngineResult<PayrollOverrides> {
        self.stage_at(session_id, record_id, field, value, Instant::now())
    }

    pub(crate) fn stage_at(
        &self,
        session_id: &str,
        record_id: Uuid,
        field: PayrollField,
        value: Decimal,
        now: Instant,
    ) -> EngineResult<PayrollOverrides> {
        let mut sets = self.lock()?;
        let key = (session_id.to_string(), record_id);

        if sets.get(&key).is_some_and(|set| self.is_expired(set, now)) {
            sets.remove(&key);
        }
        if !sets.contains_key(&key) && sets.len() >= self.max_sets {
            self.drop_expired(&mut sets, now);
            if sets.len() >= self.max_sets {
                return Err(EngineError::validation(
                    "pending_edits",
                    format!("at most {} staged edit sets may be open", self.max_sets),
                ));
            }
        }

        let set = sets.entry(key).or_insert(PendingSet {
            overrides: PayrollOverrides::default(),
            last_touched: now,
        });
        set.overrides.set(field, value);
        set.last_touched = now;
        Ok(set.overrides)
    }

    /// The staged edits of a session for a record, if any.
    pub fn get(&self, session_id: &str, record_id: Uuid) -> EngineResult<Option<PayrollOverrides>> {
        self.get_at(session_id, record_id, Instant::now())
    }

    pub(crate) fn get_at(
        &self,
        session_id: &str,
        record_id: Uuid,
        now: Instant,
    ) -> EngineResult<Option<PayrollOverrides>> {
        let mut sets = self.lock()?;
        let key = (session_id.to_string(), record_id);
        match sets.get(&key) {
            Some(set) if self.is_expired(set, now) => {
                sets.remove(&key);
                debug!(session_id, record_id = %record_id, "Dropped expired pending edits");
                Ok(None)
            }
            Some(set) => Ok(Some(set.overrides)),
            None => Ok(None),
        }
    }

    /// Drops a session's staged edits for a record. Returns whether any
    /// were staged.
    pub fn discard(&self, session_id: &str, record_id: Uuid) -> EngineResult<bool> {
        let mut sets = self.lock()?;
        Ok(sets.remove(&(session_id.to_string(), record_id)).is_some())
    }

    /// Drops the staged edits only if they still equal `committed`, so
    /// edits staged while a commit was in flight survive it.
    pub(crate) fn clear_committed(
        &self,
        session_id: &str,
        record_id: Uuid,
        committed: &PayrollOverrides,
    ) -> EngineResult<()> {
        let mut sets = self.lock()?;
        let key = (session_id.to_string(), record_id);
        if sets.get(&key).is_some_and(|set| &set.overrides == committed) {
            sets.remove(&key);
        }
        Ok(())
    }

    /// Drops every expired set and returns how many were dropped.
    pub fn purge_expired(&self) -> EngineResult<usize> {
        let mut sets = self.lock()?;
        Ok(self.drop_expired(&mut sets, Instant::now()))
    }

    /// Number of open sets, expired ones included until purged.
    pub fn len(&self) -> EngineResult<usize> {
        Ok(self.lock()?.len())
    }

    /// Returns true when nothing is staged.
    pub fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.len()? == 0)
    }

    fn is_expired(&self, set: &PendingSet, now: Instant) -> bool {
        now.saturating_duration_since(set.last_touched) >= self.ttl
    }

    fn drop_expired(&self, sets: &mut HashMap<PendingKey, PendingSet>, now: Instant) -> usize {
        let before = sets.len();
        sets.retain(|_, set| !self.is_expired(set, now));
        let dropped = before - sets.len();
        if dropped > 0 {
            debug!(dropped, "Purged expired pending edits");
        }
        dropped
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, HashMap<PendingKey, PendingSet>>> {
        self.sets.lock().map_err(|_| EngineError::Storage {
            message: "pending edits lock poisoned".to_string(),
        })
    }
}
