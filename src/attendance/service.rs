//! Attendance service.
//!
//! Owns the persisted side of the state machine: materializing scheduled
//! days, worker and scheduler actions, and the locked-period guard that
//! every record mutation passes through.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PayrollPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{Actor, Assignment, AttendanceRecord, AttendanceStatus};
use crate::notify::{Notification, Notifier};
use crate::store::Store;

use super::{AttendanceEvent, apply_event};

/// Persists attendance records and applies events to them.
#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    policy: PayrollPolicy,
}

impl AttendanceService {
    /// Creates a service over a store.
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, policy: PayrollPolicy) -> Self {
        Self {
            store,
            notifier,
            policy,
        }
    }

    /// The payroll policy applied on transitions.
    pub fn policy(&self) -> &PayrollPolicy {
        &self.policy
    }

    pub(crate) fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Registers or replaces an assignment handed over by scheduling.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank worker id or a negative template amount.
    pub fn register_assignment(&self, assignment: Assignment) -> EngineResult<Assignment> {
        if assignment.worker_id.trim().is_empty() {
            return Err(EngineError::validation("worker_id", "worker id is required"));
        }
        assignment.pay_template.validate()?;
        self.store.put_assignment(assignment.clone())?;
        info!(
            assignment_id = %assignment.id,
            worker_id = %assignment.worker_id,
            "Registered assignment"
        );
        Ok(assignment)
    }

    /// Loads an assignment.
    pub fn assignment(&self, assignment_id: Uuid) -> EngineResult<Assignment> {
        self.store
            .get_assignment(assignment_id)?
            .ok_or_else(|| EngineError::not_found("assignment", assignment_id))
    }

    /// Creates the `NotStarted` record for a scheduled day.
    ///
    /// Idempotent: when the day already has a record, that record is returned
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the assignment is unknown
    /// - `Validation` when the assignment is no longer active
    /// - `RecordLocked` when the day's month is locked
    pub fn materialize(&self, assignment_id: Uuid, date: NaiveDate) -> EngineResult<AttendanceRecord> {
        if let Some(existing) = self.store.find_attendance(assignment_id, date)? {
            return Ok(existing);
        }

        let assignment = self.assignment(assignment_id)?;
        if !assignment.is_active() {
            return Err(EngineError::validation(
                "assignment_id",
                format!("assignment {} is not active", assignment_id),
            ));
        }

        let record = AttendanceRecord::scheduled(&assignment, date)?;
        self.ensure_period_unlocked(&record)?;

        let (record, created) = self.store.insert_attendance(record)?;
        if created {
            info!(
                record_id = %record.id,
                assignment_id = %assignment_id,
                date = %date,
                "Materialized attendance record"
            );
        }
        Ok(record)
    }

    /// Loads a record by id.
    pub fn get(&self, record_id: Uuid) -> EngineResult<AttendanceRecord> {
        self.store
            .get_attendance(record_id)?
            .ok_or_else(|| EngineError::not_found("attendance record", record_id))
    }

    /// Loads the record of an assignment day, if materialized.
    pub fn find(&self, assignment_id: Uuid, date: NaiveDate) -> EngineResult<Option<AttendanceRecord>> {
        self.store.find_attendance(assignment_id, date)
    }

    /// Lists an assignment's records between two dates, inclusive.
    pub fn list(
        &self,
        assignment_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<AttendanceRecord>> {
        if from > to {
            return Err(EngineError::validation(
                "from",
                format!("range start {} is after range end {}", from, to),
            ));
        }
        self.store.scan_attendance(assignment_id, from, to)
    }

    /// Records the worker's arrival.
    pub fn check_in(&self, record_id: Uuid, at: NaiveDateTime) -> EngineResult<AttendanceRecord> {
        let record = self.get(record_id)?;
        let actor = Actor::Worker(record.worker_id.clone());
        self.apply(record_id, AttendanceEvent::CheckIn { at }, actor)
    }

    /// Materializes the day if needed, then records the worker's arrival.
    pub fn check_in_on(
        &self,
        assignment_id: Uuid,
        date: NaiveDate,
        at: NaiveDateTime,
    ) -> EngineResult<AttendanceRecord> {
        let record = self.materialize(assignment_id, date)?;
        self.check_in(record.id, at)
    }

    /// Records the worker's departure.
    pub fn check_out(&self, record_id: Uuid, at: NaiveDateTime) -> EngineResult<AttendanceRecord> {
        let record = self.get(record_id)?;
        let actor = Actor::Worker(record.worker_id.clone());
        self.apply(record_id, AttendanceEvent::CheckOut { at }, actor)
    }

    /// Attaches proof of presence and queues the day for review.
    pub fn submit_proof(
        &self,
        record_id: Uuid,
        proof_ref: String,
        metadata: BTreeMap<String, String>,
    ) -> EngineResult<AttendanceRecord> {
        let record = self.get(record_id)?;
        let actor = Actor::Worker(record.worker_id.clone());
        self.apply(
            record_id,
            AttendanceEvent::SubmitProof {
                proof_ref,
                metadata,
            },
            actor,
        )
    }

    /// Marks an un-acted day absent on request of the scheduler.
    pub fn auto_mark_absent(&self, record_id: Uuid) -> EngineResult<AttendanceRecord> {
        self.apply(record_id, AttendanceEvent::AutoMarkAbsent, Actor::Scheduler)
    }

    /// Marks a scheduled day absent, materializing it first if nobody ever
    /// touched it.
    pub fn auto_mark_absent_on(
        &self,
        assignment_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<AttendanceRecord> {
        let record = self.materialize(assignment_id, date)?;
        self.auto_mark_absent(record.id)
    }

    /// Applies an event to a stored record and persists the result.
    ///
    /// The write is a compare-and-swap on the version that was read, so a
    /// concurrent writer makes this call fail with `VersionConflict`.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown record or assignment
    /// - `RecordLocked` when the record's month is locked
    /// - any state machine error from [`apply_event`]
    pub fn apply(
        &self,
        record_id: Uuid,
        event: AttendanceEvent,
        actor: Actor,
    ) -> EngineResult<AttendanceRecord> {
        let record = self.get(record_id)?;
        self.ensure_writable(&record)?;
        let assignment = self.assignment(record.assignment_id)?;

        let next = apply_event(&record, &assignment, event, actor, &self.policy)?;
        let stored = self.store.update_attendance(record.version, next)?;

        info!(
            record_id = %stored.id,
            from = %record.status,
            to = %stored.status,
            version = stored.version,
            net_payable = %stored.payroll.net_payable(),
            "Attendance status changed"
        );
        self.announce(&stored);
        Ok(stored)
    }

    /// Fails with `RecordLocked` when the record was sealed or its month
    /// has a locked payroll.
    pub(crate) fn ensure_writable(&self, record: &AttendanceRecord) -> EngineResult<()> {
        if record.locked {
            return Err(locked_error(record));
        }
        self.ensure_period_unlocked(record)
    }

    fn ensure_period_unlocked(&self, record: &AttendanceRecord) -> EngineResult<()> {
        let locked = self
            .store
            .find_payroll(record.assignment_id, record.period())?
            .is_some_and(|payroll| payroll.is_locked());
        if locked {
            debug!(record_id = %record.id, period = %record.period(), "Rejected write to locked period");
            return Err(locked_error(record));
        }
        Ok(())
    }

    fn announce(&self, record: &AttendanceRecord) {
        let notification = match record.status {
            AttendanceStatus::Approved | AttendanceStatus::HalfDay => Notification::AttendanceApproved {
                record_id: record.id,
                worker_id: record.worker_id.clone(),
                status: record.status,
            },
            AttendanceStatus::Rejected => Notification::AttendanceRejected {
                record_id: record.id,
                worker_id: record.worker_id.clone(),
                remark: record.remarks.clone().unwrap_or_default(),
            },
            _ => return,
        };
        self.notifier.notify(notification);
    }
}

fn locked_error(record: &AttendanceRecord) -> EngineError {
    let period = record.period();
    EngineError::RecordLocked {
        assignment_id: record.assignment_id,
        year: period.year,
        month: period.month,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::compute_totals;
    use crate::models::{
        AssignmentStatus, DayCounts, LockState, MonthlyPayroll, PayTemplate, PayrollPeriod,
        ShiftWindow,
    };
    use crate::notify::testing::RecordingNotifier;
    use crate::store::MemoryStore;
    use chrono::{NaiveTime, Utc};
    use rust_decimal::Decimal;

    fn create_assignment() -> Assignment {
        Assignment {
            id: Uuid::new_v4(),
            worker_id: "wrk_001".to_string(),
            job_id: "site_7".to_string(),
            pay_template: PayTemplate::daily(Decimal::new(500, 0)),
            shift: ShiftWindow {
                start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            },
            status: AssignmentStatus::Active,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        date(day).and_hms_opt(hour, 0, 0).unwrap()
    }

    fn setup() -> (AttendanceService, Arc<MemoryStore>, Arc<RecordingNotifier>, Assignment) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = AttendanceService::new(store.clone(), notifier.clone(), PayrollPolicy::default());
        let assignment = service.register_assignment(create_assignment()).unwrap();
        (service, store, notifier, assignment)
    }

    fn reviewer() -> Actor {
        Actor::Reviewer("rev_001".to_string())
    }

    fn lock_period(store: &MemoryStore, assignment: &Assignment) {
        use crate::store::PayrollStore;
        let zero = compute_totals(Default::default()).unwrap();
        store
            .insert_payroll(MonthlyPayroll {
                id: Uuid::new_v4(),
                assignment_id: assignment.id,
                worker_id: assignment.worker_id.clone(),
                period: PayrollPeriod::new(2026, 3).unwrap(),
                lock_state: LockState::Locked,
                computed: zero,
                overrides: Default::default(),
                totals: zero,
                days: DayCounts::default(),
                version: 0,
                generated_at: Utc::now(),
                locked_at: Some(Utc::now()),
                locked_by: Some("rev_001".to_string()),
            })
            .unwrap();
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let (service, _, _, assignment) = setup();
        let first = service.materialize(assignment.id, date(2)).unwrap();
        let second = service.materialize(assignment.id, date(2)).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.status, AttendanceStatus::NotStarted);
    }

    #[test]
    fn test_materialize_unknown_assignment_is_not_found() {
        let (service, _, _, _) = setup();
        let result = service.materialize(Uuid::new_v4(), date(2));
        assert!(matches!(result, Err(EngineError::NotFound { entity: "assignment", .. })));
    }

    #[test]
    fn test_materialize_inactive_assignment_is_rejected() {
        let (service, _, _, _) = setup();
        let cancelled = service
            .register_assignment(Assignment {
                status: AssignmentStatus::Cancelled,
                ..create_assignment()
            })
            .unwrap();
        let result = service.materialize(cancelled.id, date(2));
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn test_register_rejects_blank_worker() {
        let (service, _, _, _) = setup();
        let result = service.register_assignment(Assignment {
            worker_id: " ".to_string(),
            ..create_assignment()
        });
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn test_worker_flow_persists_and_bumps_version() {
        let (service, _, _, assignment) = setup();
        let record = service.check_in_on(assignment.id, date(2), at(2, 9)).unwrap();
        assert_eq!(record.status, AttendanceStatus::CheckedIn);
        assert_eq!(record.version, 1);
        assert_eq!(record.history[0].actor, Actor::Worker("wrk_001".to_string()));

        let record = service.check_out(record.id, at(2, 17)).unwrap();
        let record = service
            .submit_proof(record.id, "proof/1".to_string(), BTreeMap::new())
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::PendingVerification);
        assert_eq!(record.version, 3);
        assert_eq!(service.get(record.id).unwrap(), record);
    }

    #[test]
    fn test_failed_transition_leaves_store_unchanged() {
        let (service, _, _, assignment) = setup();
        let record = service.materialize(assignment.id, date(2)).unwrap();
        let result = service.apply(record.id, AttendanceEvent::Approve { remark: None }, reviewer());
        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));
        assert_eq!(service.get(record.id).unwrap(), record);
    }

    #[test]
    fn test_auto_absent_on_untouched_day() {
        let (service, _, _, assignment) = setup();
        let record = service.auto_mark_absent_on(assignment.id, date(3)).unwrap();
        assert_eq!(record.status, AttendanceStatus::AutoMarkedAbsent);
        assert_eq!(record.history[0].actor, Actor::Scheduler);
    }

    #[test]
    fn test_approve_and_reject_notify() {
        let (service, _, notifier, assignment) = setup();
        let first = service.check_in_on(assignment.id, date(2), at(2, 9)).unwrap();
        service
            .submit_proof(first.id, "proof/1".to_string(), BTreeMap::new())
            .unwrap();
        service
            .apply(first.id, AttendanceEvent::Approve { remark: None }, reviewer())
            .unwrap();

        let second = service.check_in_on(assignment.id, date(3), at(3, 9)).unwrap();
        service
            .apply(
                second.id,
                AttendanceEvent::Reject {
                    remark: "left early".to_string(),
                },
                reviewer(),
            )
            .unwrap();

        let events = notifier.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Notification::AttendanceApproved { .. }));
        assert!(matches!(
            &events[1],
            Notification::AttendanceRejected { remark, .. } if remark == "left early"
        ));
    }

    #[test]
    fn test_locked_period_blocks_materialize_and_actions() {
        let (service, store, _, assignment) = setup();
        let record = service.materialize(assignment.id, date(2)).unwrap();
        lock_period(&store, &assignment);

        let result = service.check_in(record.id, at(2, 9));
        assert!(matches!(result, Err(EngineError::RecordLocked { year: 2026, month: 3, .. })));
        assert_eq!(service.get(record.id).unwrap(), record);

        let result = service.materialize(assignment.id, date(4));
        assert!(matches!(result, Err(EngineError::RecordLocked { .. })));
    }

    #[test]
    fn test_sealed_record_is_locked() {
        use crate::store::AttendanceStore;
        let (service, store, _, assignment) = setup();
        let record = service.materialize(assignment.id, date(2)).unwrap();
        store.seal_attendance(assignment.id, date(1), date(31)).unwrap();

        let result = service.check_in(record.id, at(2, 9));
        assert!(matches!(result, Err(EngineError::RecordLocked { .. })));
    }

    #[test]
    fn test_list_rejects_reversed_range() {
        let (service, _, _, assignment) = setup();
        service.materialize(assignment.id, date(2)).unwrap();
        assert_eq!(service.list(assignment.id, date(1), date(31)).unwrap().len(), 1);
        assert!(service.list(assignment.id, date(31), date(1)).is_err());
    }
}
