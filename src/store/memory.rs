//! In-memory store.
//!
//! Each table sits behind its own `RwLock`; a compare-and-swap holds the
//! write lock across the version check and the replacement, and range scans
//! clone their result under a single read lock. Attendance writes check the
//! owning month's payroll while holding the attendance write lock, taking
//! the payroll lock second; nothing takes them in the other order.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Assignment, AttendanceRecord, MonthlyPayroll, PayrollPeriod};

use super::{AssignmentStore, AttendanceStore, PayrollStore};

#[derive(Debug, Default)]
struct AttendanceTable {
    by_id: HashMap<Uuid, AttendanceRecord>,
    by_key: BTreeMap<(Uuid, NaiveDate), Uuid>,
}

#[derive(Debug, Default)]
struct PayrollTable {
    by_id: HashMap<Uuid, MonthlyPayroll>,
    by_key: HashMap<(Uuid, PayrollPeriod), Uuid>,
}

/// A process-local store implementing every storage trait.
///
/// # Example
///
/// ```
/// use attendance_payroll::store::{AttendanceStore, MemoryStore};
/// use uuid::Uuid;
///
/// let store = MemoryStore::new();
/// assert!(store.get_attendance(Uuid::new_v4()).unwrap().is_none());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    attendance: RwLock<AttendanceTable>,
    payrolls: RwLock<PayrollTable>,
    assignments: RwLock<HashMap<Uuid, Assignment>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<'a, T>(lock: &'a RwLock<T>, table: &str) -> EngineResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| EngineError::Storage {
        message: format!("{} table lock poisoned", table),
    })
}

fn write<'a, T>(lock: &'a RwLock<T>, table: &str) -> EngineResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| EngineError::Storage {
        message: format!("{} table lock poisoned", table),
    })
}

impl MemoryStore {
    fn ensure_period_open(&self, record: &AttendanceRecord) -> EngineResult<()> {
        let period = record.period();
        let payrolls = read(&self.payrolls, "payroll")?;
        let locked = payrolls
            .by_key
            .get(&(record.assignment_id, period))
            .and_then(|id| payrolls.by_id.get(id))
            .is_some_and(|payroll| payroll.is_locked());
        if locked {
            return Err(period_locked(record.assignment_id, period));
        }
        Ok(())
    }
}

fn period_locked(assignment_id: Uuid, period: PayrollPeriod) -> EngineError {
    EngineError::RecordLocked {
        assignment_id,
        year: period.year,
        month: period.month,
    }
}

impl AttendanceStore for MemoryStore {
    fn insert_attendance(&self, record: AttendanceRecord) -> EngineResult<(AttendanceRecord, bool)> {
        let mut table = write(&self.attendance, "attendance")?;
        let key = (record.assignment_id, record.date);

        if let Some(existing) = table.by_key.get(&key).and_then(|id| table.by_id.get(id)) {
            return Ok((existing.clone(), false));
        }
        self.ensure_period_open(&record)?;

        table.by_key.insert(key, record.id);
        table.by_id.insert(record.id, record.clone());
        Ok((record, true))
    }

    fn get_attendance(&self, id: Uuid) -> EngineResult<Option<AttendanceRecord>> {
        Ok(read(&self.attendance, "attendance")?.by_id.get(&id).cloned())
    }

    fn find_attendance(
        &self,
        assignment_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<Option<AttendanceRecord>> {
        let table = read(&self.attendance, "attendance")?;
        Ok(table
            .by_key
            .get(&(assignment_id, date))
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    fn scan_attendance(
        &self,
        assignment_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<AttendanceRecord>> {
        if from > to {
            return Ok(Vec::new());
        }
        let table = read(&self.attendance, "attendance")?;
        Ok(table
            .by_key
            .range((assignment_id, from)..=(assignment_id, to))
            .filter_map(|(_, id)| table.by_id.get(id))
            .cloned()
            .collect())
    }

    fn update_attendance(
        &self,
        expected_version: u64,
        mut record: AttendanceRecord,
    ) -> EngineResult<AttendanceRecord> {
        let mut table = write(&self.attendance, "attendance")?;
        let current = table
            .by_id
            .get(&record.id)
            .ok_or_else(|| EngineError::not_found("attendance record", record.id))?;

        if current.locked {
            return Err(period_locked(current.assignment_id, current.period()));
        }
        self.ensure_period_open(current)?;
        if current.version != expected_version {
            return Err(EngineError::VersionConflict {
                entity: "attendance record",
                id: record.id,
                expected: expected_version,
                actual: current.version,
            });
        }
        if current.assignment_id != record.assignment_id || current.date != record.date {
            return Err(EngineError::Storage {
                message: format!("attendance record {} cannot change its key", record.id),
            });
        }

        record.version = expected_version + 1;
        record.updated_at = Utc::now();
        table.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    fn seal_attendance(
        &self,
        assignment_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<usize> {
        if from > to {
            return Ok(0);
        }
        let mut table = write(&self.attendance, "attendance")?;
        let ids: Vec<Uuid> = table
            .by_key
            .range((assignment_id, from)..=(assignment_id, to))
            .map(|(_, id)| *id)
            .collect();

        let now = Utc::now();
        let mut sealed = 0;
        for id in ids {
            if let Some(record) = table.by_id.get_mut(&id) {
                record.locked = true;
                record.version += 1;
                record.updated_at = now;
                sealed += 1;
            }
        }
        Ok(sealed)
    }
}

impl PayrollStore for MemoryStore {
    fn insert_payroll(&self, payroll: MonthlyPayroll) -> EngineResult<MonthlyPayroll> {
        let mut table = write(&self.payrolls, "payroll")?;
        let key = (payroll.assignment_id, payroll.period);

        if let Some(existing) = table.by_key.get(&key).and_then(|id| table.by_id.get(id)) {
            return Err(EngineError::VersionConflict {
                entity: "monthly payroll",
                id: existing.id,
                expected: 0,
                actual: existing.version,
            });
        }

        table.by_key.insert(key, payroll.id);
        table.by_id.insert(payroll.id, payroll.clone());
        Ok(payroll)
    }

    fn get_payroll(&self, id: Uuid) -> EngineResult<Option<MonthlyPayroll>> {
        Ok(read(&self.payrolls, "payroll")?.by_id.get(&id).cloned())
    }

    fn find_payroll(
        &self,
        assignment_id: Uuid,
        period: PayrollPeriod,
    ) -> EngineResult<Option<MonthlyPayroll>> {
        let table = read(&self.payrolls, "payroll")?;
        Ok(table
            .by_key
            .get(&(assignment_id, period))
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    fn update_payroll(
        &self,
        expected_version: u64,
        mut payroll: MonthlyPayroll,
    ) -> EngineResult<MonthlyPayroll> {
        let mut table = write(&self.payrolls, "payroll")?;
        let current = table
            .by_id
            .get(&payroll.id)
            .ok_or_else(|| EngineError::not_found("monthly payroll", payroll.id))?;

        if current.version != expected_version {
            return Err(EngineError::VersionConflict {
                entity: "monthly payroll",
                id: payroll.id,
                expected: expected_version,
                actual: current.version,
            });
        }
        if current.assignment_id != payroll.assignment_id || current.period != payroll.period {
            return Err(EngineError::Storage {
                message: format!("monthly payroll {} cannot change its key", payroll.id),
            });
        }

        payroll.version = expected_version + 1;
        table.by_id.insert(payroll.id, payroll.clone());
        Ok(payroll)
    }
}

impl AssignmentStore for MemoryStore {
    fn put_assignment(&self, assignment: Assignment) -> EngineResult<()> {
        write(&self.assignments, "assignment")?.insert(assignment.id, assignment);
        Ok(())
    }

    fn get_assignment(&self, id: Uuid) -> EngineResult<Option<Assignment>> {
        Ok(read(&self.assignments, "assignment")?.get(&id).cloned())
    }
}
