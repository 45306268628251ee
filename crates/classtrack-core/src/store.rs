//! The record-store contract the workflow engine is written against.
//! The JSON file store implements it in production; tests use an
//! in-memory double.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{ClassStatus, LogEntry, StudentRecord};

/// Full roster, keyed by stable student id. BTreeMap keeps the persisted
/// JSON key-sorted.
pub type StudentMap = BTreeMap<String, StudentRecord>;

/// Read/write contract to the persisted roster and audit log.
///
/// Single-writer, sequential access: callers process one event to
/// completion before the next, so no method takes a lock.
pub trait RecordStore {
    fn load_students(&self) -> Result<StudentMap>;
    fn save_students(&self, students: &StudentMap) -> Result<()>;

    /// Fresh fetch of one student. `None` when the id is unknown.
    fn get_student(&self, student_id: &str) -> Result<Option<StudentRecord>>;

    /// Append one entry to the audit log. Entries are never mutated.
    fn append_log(&self, entry: LogEntry) -> Result<()>;

    /// The whole audit log, in insertion order.
    fn load_logs(&self) -> Result<Vec<LogEntry>>;

    /// Whether any log entry already covers this class instance.
    fn is_class_logged(&self, student_id: &str, iso: &str) -> Result<bool>;

    /// Record a status for a class instance (Log menu).
    fn log_class_status(&self, student_id: &str, iso: &str, status: ClassStatus) -> Result<()>;

    /// Remove at most one log entry matching student + timestamp.
    /// Returns whether one was found.
    fn remove_class_log(&self, student_id: &str, iso: &str) -> Result<bool>;

    /// Cancel one class: move the date out of the active schedule into
    /// `cancelled_dates`, deducting a remaining class only when the
    /// cancellation falls inside the cutoff window.
    fn cancel_single_class(&self, student_id: &str, iso: &str, cutoff_hours: i64) -> Result<bool>;

    /// Atomically move one class from `old_iso` to `new_iso`. Returns
    /// false (and mutates nothing) when `old_iso` is not scheduled.
    fn reschedule_single_class(&self, student_id: &str, old_iso: &str, new_iso: &str)
        -> Result<bool>;

    /// Mark a class completed: drop the date, decrement the remaining
    /// counter (floor zero), append a `class_completed` entry.
    fn mark_class_completed(&self, student_id: &str, iso: &str) -> Result<bool>;
}
