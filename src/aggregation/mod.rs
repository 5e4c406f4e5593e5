//! Monthly payroll aggregation.
//!
//! The aggregator rolls a month of attendance records into one
//! [`MonthlyPayroll`] per (assignment, period). An unlocked document can be
//! regenerated and edited; locking it is one-way and seals the month's
//! attendance records against further writes.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::calculation::{aggregate_month, compute_totals, validate_amount};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    LockState, MonthlyPayroll, PayrollOverrides, PayrollPeriod, PayrollSnapshot, ReviewContext,
};
use crate::notify::{Notification, Notifier};
use crate::store::Store;

/// Generates, edits and locks monthly payrolls.
#[derive(Clone)]
pub struct MonthlyPayrollAggregator {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
}

impl MonthlyPayrollAggregator {
    /// Creates an aggregator over a store.
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Aggregates a month of an assignment's attendance.
    ///
    /// Creates the document on first call and refreshes the computed sum on
    /// later calls. Persisted overrides are re-applied on every refresh.
    ///
    /// # Errors
    ///
    /// - `Validation` for a month outside 1-12 or a worker that does not
    ///   own the assignment
    /// - `NotFound` for an unknown assignment
    /// - `AlreadyLocked` when the month's document is locked
    /// - `VersionConflict` when a concurrent writer got there first
    pub fn generate(
        &self,
        assignment_id: Uuid,
        worker_id: &str,
        year: i32,
        month: u32,
    ) -> EngineResult<MonthlyPayroll> {
        let period = PayrollPeriod::new(year, month)?;
        let assignment = self
            .store
            .get_assignment(assignment_id)?
            .ok_or_else(|| EngineError::not_found("assignment", assignment_id))?;
        if assignment.worker_id != worker_id {
            return Err(EngineError::validation(
                "worker_id",
                format!(
                    "worker {} is not assigned to assignment {}",
                    worker_id, assignment_id
                ),
            ));
        }

        let existing = self.store.find_payroll(assignment_id, period)?;
        if let Some(payroll) = existing.as_ref().filter(|p| p.is_locked()) {
            return Err(EngineError::AlreadyLocked {
                payroll_id: payroll.id,
            });
        }

        let records =
            self.store
                .scan_attendance(assignment_id, period.first_day(), period.last_day())?;
        let aggregate = aggregate_month(&records)?;
        let now = Utc::now();

        let payroll = match existing {
            Some(current) => {
                let mut next = current.clone();
                next.computed = aggregate.snapshot;
                next.totals = effective_totals(&aggregate.snapshot, &current.overrides)?;
                next.days = aggregate.days;
                next.generated_at = now;
                self.store.update_payroll(current.version, next)?
            }
            None => self.store.insert_payroll(MonthlyPayroll {
                id: Uuid::new_v4(),
                assignment_id,
                worker_id: worker_id.to_string(),
                period,
                lock_state: LockState::Unlocked,
                computed: aggregate.snapshot,
                overrides: PayrollOverrides::default(),
                totals: aggregate.snapshot,
                days: aggregate.days,
                version: 0,
                generated_at: now,
                locked_at: None,
                locked_by: None,
            })?,
        };

        info!(
            payroll_id = %payroll.id,
            assignment_id = %assignment_id,
            period = %period,
            records = records.len(),
            approved_days = payroll.days.approved,
            half_days = payroll.days.half_days,
            net_payable = %payroll.totals.net_payable(),
            "Generated monthly payroll"
        );
        Ok(payroll)
    }

    /// Persists reviewer overrides on an unlocked document.
    ///
    /// Fields absent from `overrides` keep their earlier override, if any.
    ///
    /// # Errors
    ///
    /// - `Validation` for a negative amount
    /// - `NotFound` for an unknown document
    /// - `RecordLocked` when the document is locked
    pub fn edit(
        &self,
        ctx: &ReviewContext,
        payroll_id: Uuid,
        overrides: PayrollOverrides,
    ) -> EngineResult<MonthlyPayroll> {
        for (field, value) in overrides.entries() {
            validate_amount(field.as_str(), value)?;
        }

        let current = self.get(payroll_id)?;
        if current.is_locked() {
            return Err(EngineError::RecordLocked {
                assignment_id: current.assignment_id,
                year: current.period.year,
                month: current.period.month,
            });
        }

        let mut next = current.clone();
        next.overrides.merge(&overrides);
        next.totals = effective_totals(&current.computed, &next.overrides)?;
        let stored = self.store.update_payroll(current.version, next)?;

        info!(
            payroll_id = %payroll_id,
            reviewer_id = %ctx.reviewer_id,
            fields = overrides.entries().len(),
            net_payable = %stored.totals.net_payable(),
            "Edited monthly payroll"
        );
        Ok(stored)
    }

    /// Locks a document. There is no way back.
    ///
    /// The document is locked first, then every attendance record of the
    /// month is sealed so writers that read a record before the lock fail
    /// their version check.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown document
    /// - `AlreadyLocked` when the document is already locked
    /// - `VersionConflict` when a concurrent writer got there first
    pub fn lock(&self, ctx: &ReviewContext, payroll_id: Uuid) -> EngineResult<MonthlyPayroll> {
        let current = self.get(payroll_id)?;
        if current.is_locked() {
            return Err(EngineError::AlreadyLocked { payroll_id });
        }

        let mut next = current.clone();
        next.lock_state = LockState::Locked;
        next.locked_at = Some(Utc::now());
        next.locked_by = Some(ctx.reviewer_id.clone());
        let locked = self.store.update_payroll(current.version, next)?;

        let period = locked.period;
        let sealed =
            self.store
                .seal_attendance(locked.assignment_id, period.first_day(), period.last_day())?;

        info!(
            payroll_id = %payroll_id,
            reviewer_id = %ctx.reviewer_id,
            period = %period,
            sealed_records = sealed,
            "Locked monthly payroll"
        );
        self.notifier.notify(Notification::PayrollLocked {
            payroll_id,
            worker_id: locked.worker_id.clone(),
            period,
        });
        Ok(locked)
    }

    /// Loads a document by id.
    pub fn get(&self, payroll_id: Uuid) -> EngineResult<MonthlyPayroll> {
        self.store
            .get_payroll(payroll_id)?
            .ok_or_else(|| EngineError::not_found("monthly payroll", payroll_id))
    }

    /// Loads the document of an assignment month, if generated.
    pub fn find(
        &self,
        assignment_id: Uuid,
        year: i32,
        month: u32,
    ) -> EngineResult<Option<MonthlyPayroll>> {
        let period = PayrollPeriod::new(year, month)?;
        self.store.find_payroll(assignment_id, period)
    }
}

fn effective_totals(
    computed: &PayrollSnapshot,
    overrides: &PayrollOverrides,
) -> EngineResult<PayrollSnapshot> {
    compute_totals(overrides.apply(computed.inputs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::AttendanceService;
    use crate::config::PayrollPolicy;
    use crate::models::{
        Assignment, AssignmentStatus, AttendanceStatus, PayTemplate, ShiftWindow,
    };
    use crate::notify::testing::RecordingNotifier;
    use crate::review::{PendingEdits, ReviewService};
    use crate::store::MemoryStore;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;
    use std::str::FromStr;
    use std::time::Duration;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ctx() -> ReviewContext {
        ReviewContext::new("rev_001", "s1")
    }

    struct Fixture {
        aggregator: MonthlyPayrollAggregator,
        attendance: AttendanceService,
        review: ReviewService,
        notifier: Arc<RecordingNotifier>,
        assignment: Assignment,
    }

    fn setup() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let attendance =
            AttendanceService::new(store.clone(), notifier.clone(), PayrollPolicy::default());
        let review = ReviewService::new(
            attendance.clone(),
            Arc::new(PendingEdits::new(Duration::from_secs(1800), 100)),
        );
        let aggregator = MonthlyPayrollAggregator::new(store, notifier.clone());
        let assignment = attendance
            .register_assignment(Assignment {
                id: Uuid::new_v4(),
                worker_id: "wrk_001".to_string(),
                job_id: "site_7".to_string(),
                pay_template: PayTemplate::daily(dec("500")),
                shift: ShiftWindow {
                    start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                },
                status: AssignmentStatus::Active,
            })
            .unwrap();
        Fixture {
            aggregator,
            attendance,
            review,
            notifier,
            assignment,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn settle(fx: &Fixture, day: u32, outcome: AttendanceStatus) -> Uuid {
        let record = fx
            .attendance
            .check_in_on(fx.assignment.id, date(day), date(day).and_hms_opt(9, 0, 0).unwrap())
            .unwrap();
        fx.attendance
            .submit_proof(record.id, "proof/1".to_string(), BTreeMap::new())
            .unwrap();
        match outcome {
            AttendanceStatus::Approved => fx.review.approve(&ctx(), record.id, None).unwrap(),
            AttendanceStatus::HalfDay => fx.review.mark_half_day(&ctx(), record.id, None).unwrap(),
            _ => fx
                .review
                .reject(&ctx(), record.id, "absent".to_string())
                .unwrap(),
        };
        record.id
    }

    #[test]
    fn test_generate_sums_payable_days() {
        let fx = setup();
        settle(&fx, 2, AttendanceStatus::Approved);
        settle(&fx, 3, AttendanceStatus::Approved);
        settle(&fx, 4, AttendanceStatus::HalfDay);
        settle(&fx, 5, AttendanceStatus::Rejected);
        fx.attendance.auto_mark_absent_on(fx.assignment.id, date(6)).unwrap();

        let payroll = fx
            .aggregator
            .generate(fx.assignment.id, "wrk_001", 2026, 3)
            .unwrap();

        assert_eq!(payroll.totals.inputs().daily_pay, dec("1250"));
        assert_eq!(payroll.days.approved, 2);
        assert_eq!(payroll.days.half_days, 1);
        assert_eq!(payroll.days.absent, 2);
        assert_eq!(payroll.lock_state, LockState::Unlocked);
    }

    #[test]
    fn test_generate_twice_updates_one_document() {
        let fx = setup();
        settle(&fx, 2, AttendanceStatus::Approved);
        let first = fx
            .aggregator
            .generate(fx.assignment.id, "wrk_001", 2026, 3)
            .unwrap();

        settle(&fx, 3, AttendanceStatus::Approved);
        let second = fx
            .aggregator
            .generate(fx.assignment.id, "wrk_001", 2026, 3)
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.version, first.version + 1);
        assert_eq!(second.totals.inputs().daily_pay, dec("1000"));
    }

    #[test]
    fn test_generate_validates_month_and_worker() {
        let fx = setup();
        let result = fx.aggregator.generate(fx.assignment.id, "wrk_001", 2026, 13);
        assert!(matches!(result, Err(EngineError::Validation { .. })));

        let result = fx.aggregator.generate(fx.assignment.id, "wrk_999", 2026, 3);
        assert!(matches!(result, Err(EngineError::Validation { ref field, .. }) if field == "worker_id"));

        let result = fx.aggregator.generate(Uuid::new_v4(), "wrk_001", 2026, 3);
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_edit_overrides_survive_regeneration() {
        let fx = setup();
        settle(&fx, 2, AttendanceStatus::Approved);
        let payroll = fx
            .aggregator
            .generate(fx.assignment.id, "wrk_001", 2026, 3)
            .unwrap();

        let edited = fx
            .aggregator
            .edit(
                &ctx(),
                payroll.id,
                PayrollOverrides {
                    advance_deduction: Some(dec("100")),
                    ..PayrollOverrides::default()
                },
            )
            .unwrap();
        assert_eq!(edited.totals.net_payable(), dec("400"));
        assert_eq!(edited.computed.net_payable(), dec("500"));

        settle(&fx, 3, AttendanceStatus::Approved);
        let regenerated = fx
            .aggregator
            .generate(fx.assignment.id, "wrk_001", 2026, 3)
            .unwrap();
        assert_eq!(regenerated.overrides.advance_deduction, Some(dec("100")));
        assert_eq!(regenerated.totals.net_payable(), dec("900"));
        assert_eq!(fx.aggregator.get(payroll.id).unwrap(), regenerated);
    }

    #[test]
    fn test_edit_rejects_negative_override() {
        let fx = setup();
        let payroll = fx
            .aggregator
            .generate(fx.assignment.id, "wrk_001", 2026, 3)
            .unwrap();
        let result = fx.aggregator.edit(
            &ctx(),
            payroll.id,
            PayrollOverrides {
                bata: Some(dec("-5")),
                ..PayrollOverrides::default()
            },
        );
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn test_lock_is_one_way_and_seals_the_month() {
        let fx = setup();
        let record_id = settle(&fx, 2, AttendanceStatus::Approved);
        let payroll = fx
            .aggregator
            .generate(fx.assignment.id, "wrk_001", 2026, 3)
            .unwrap();

        let locked = fx.aggregator.lock(&ctx(), payroll.id).unwrap();
        assert!(locked.is_locked());
        assert_eq!(locked.locked_by.as_deref(), Some("rev_001"));
        assert!(fx.attendance.get(record_id).unwrap().locked);

        assert!(matches!(
            fx.aggregator.lock(&ctx(), payroll.id),
            Err(EngineError::AlreadyLocked { .. })
        ));
        assert!(matches!(
            fx.aggregator.generate(fx.assignment.id, "wrk_001", 2026, 3),
            Err(EngineError::AlreadyLocked { .. })
        ));
        assert!(matches!(
            fx.aggregator.edit(&ctx(), payroll.id, PayrollOverrides::default()),
            Err(EngineError::RecordLocked { .. })
        ));
        assert!(matches!(
            fx.review.reset_to_review(&ctx(), record_id, None),
            Err(EngineError::RecordLocked { .. })
        ));
        assert!(matches!(
            fx.events_last(),
            Some(Notification::PayrollLocked { .. })
        ));
    }

    #[test]
    fn test_find_by_period() {
        let fx = setup();
        assert!(fx.aggregator.find(fx.assignment.id, 2026, 3).unwrap().is_none());
        let payroll = fx
            .aggregator
            .generate(fx.assignment.id, "wrk_001", 2026, 3)
            .unwrap();
        assert_eq!(
            fx.aggregator.find(fx.assignment.id, 2026, 3).unwrap(),
            Some(payroll)
        );
    }

    impl Fixture {
        fn events_last(&self) -> Option<Notification> {
            self.notifier.events().last().cloned()
        }
    }
}
