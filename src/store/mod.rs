//! Storage seams for the attendance payroll engine.
//!
//! Attendance records, monthly payrolls and assignments are the only shared
//! mutable state. Every write is a compare-and-swap on the entity's
//! `version`: a writer that read version `n` can only persist if the stored
//! version is still `n`, otherwise it gets a retryable `VersionConflict`.
//! Unversioned last-writer-wins is not offered.

mod memory;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{Assignment, AttendanceRecord, MonthlyPayroll, PayrollPeriod};

pub use memory::MemoryStore;

/// Durable storage of attendance records, keyed by (assignment, date).
pub trait AttendanceStore: Send + Sync {
    /// Inserts a record unless one already exists for its (assignment, date).
    ///
    /// Returns the stored record and whether it was created by this call.
    /// Creating a record in a month whose payroll is locked fails with
    /// `RecordLocked`.
    fn insert_attendance(&self, record: AttendanceRecord) -> EngineResult<(AttendanceRecord, bool)>;

    /// Point lookup by record id.
    fn get_attendance(&self, id: Uuid) -> EngineResult<Option<AttendanceRecord>>;

    /// Point lookup by (assignment, date).
    fn find_attendance(
        &self,
        assignment_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<Option<AttendanceRecord>>;

    /// All records of an assignment between two dates (inclusive), ordered
    /// by date, read from a single consistent snapshot.
    fn scan_attendance(
        &self,
        assignment_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<AttendanceRecord>>;

    /// Replaces a record if its stored version equals `expected_version`.
    ///
    /// The store assigns the next version and the update timestamp. The
    /// write fails with `RecordLocked` when the stored record is sealed or
    /// its month's payroll is locked, checked atomically with the swap.
    fn update_attendance(
        &self,
        expected_version: u64,
        record: AttendanceRecord,
    ) -> EngineResult<AttendanceRecord>;

    /// Marks every record of an assignment between two dates as locked,
    /// bumping each version so in-flight writers lose their swap.
    fn seal_attendance(&self, assignment_id: Uuid, from: NaiveDate, to: NaiveDate)
    -> EngineResult<usize>;
}

/// Durable storage of monthly payrolls, keyed by (assignment, period).
pub trait PayrollStore: Send + Sync {
    /// Inserts a new document. Fails with `VersionConflict` when another
    /// document already exists for the same (assignment, period).
    fn insert_payroll(&self, payroll: MonthlyPayroll) -> EngineResult<MonthlyPayroll>;

    /// Point lookup by document id.
    fn get_payroll(&self, id: Uuid) -> EngineResult<Option<MonthlyPayroll>>;

    /// Point lookup by (assignment, period).
    fn find_payroll(
        &self,
        assignment_id: Uuid,
        period: PayrollPeriod,
    ) -> EngineResult<Option<MonthlyPayroll>>;

    /// Replaces a document if its stored version equals `expected_version`.
    fn update_payroll(
        &self,
        expected_version: u64,
        payroll: MonthlyPayroll,
    ) -> EngineResult<MonthlyPayroll>;
}

/// Assignments registered by the scheduling service.
pub trait AssignmentStore: Send + Sync {
    /// Creates or replaces an assignment.
    fn put_assignment(&self, assignment: Assignment) -> EngineResult<()>;

    /// Point lookup by assignment id.
    fn get_assignment(&self, id: Uuid) -> EngineResult<Option<Assignment>>;
}

/// Everything the engine services need from storage.
pub trait Store: AttendanceStore + PayrollStore + AssignmentStore {}

impl<T: AttendanceStore + PayrollStore + AssignmentStore> Store for T {}
