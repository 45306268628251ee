//! In-memory store double for workflow tests.

use std::cell::RefCell;

use chrono::{Duration, Utc};
use classtrack_core::types::parse_iso_utc;
use classtrack_core::{
    AuditEvent, ClassStatus, ClassTrackError, LogEntry, RecordStore, Result, StatusLog,
    StudentMap, StudentRecord,
};

#[derive(Debug, Default)]
pub struct MemStore {
    students: RefCell<StudentMap>,
    logs: RefCell<Vec<LogEntry>>,
}

impl MemStore {
    pub fn with_student(student_id: &str, student: StudentRecord) -> Self {
        let store = Self::default();
        store
            .students
            .borrow_mut()
            .insert(student_id.to_string(), student);
        store
    }
}

impl RecordStore for MemStore {
    fn load_students(&self) -> Result<StudentMap> {
        Ok(self.students.borrow().clone())
    }

    fn save_students(&self, students: &StudentMap) -> Result<()> {
        *self.students.borrow_mut() = students.clone();
        Ok(())
    }

    fn get_student(&self, student_id: &str) -> Result<Option<StudentRecord>> {
        Ok(self.students.borrow().get(student_id).cloned())
    }

    fn append_log(&self, entry: LogEntry) -> Result<()> {
        self.logs.borrow_mut().push(entry);
        Ok(())
    }

    fn load_logs(&self) -> Result<Vec<LogEntry>> {
        Ok(self.logs.borrow().clone())
    }

    fn is_class_logged(&self, student_id: &str, iso: &str) -> Result<bool> {
        Ok(self
            .logs
            .borrow()
            .iter()
            .any(|e| e.covers_class(student_id, iso)))
    }

    fn log_class_status(&self, student_id: &str, iso: &str, status: ClassStatus) -> Result<()> {
        self.append_log(LogEntry::Status(StatusLog {
            student_id: student_id.to_string(),
            date: iso.to_string(),
            status: status.as_str().to_string(),
            ts: Some(Utc::now().to_rfc3339()),
        }))
    }

    fn remove_class_log(&self, student_id: &str, iso: &str) -> Result<bool> {
        let mut logs = self.logs.borrow_mut();
        match logs.iter().position(|e| e.covers_class(student_id, iso)) {
            Some(idx) => {
                logs.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn cancel_single_class(&self, student_id: &str, iso: &str, cutoff_hours: i64) -> Result<bool> {
        let mut students = self.students.borrow_mut();
        let Some(stu) = students.get_mut(student_id) else {
            return Ok(false);
        };
        let class_time = parse_iso_utc(iso)
            .ok_or_else(|| ClassTrackError::Store(format!("unparseable class timestamp: {iso}")))?;
        let is_late = Utc::now() > class_time - Duration::hours(cutoff_hours);
        stu.class_dates.retain(|d| d != iso);
        stu.cancelled_dates.push(iso.to_string());
        if is_late {
            stu.classes_remaining = stu.classes_remaining.saturating_sub(1);
        }
        self.logs
            .borrow_mut()
            .push(LogEntry::Event(AuditEvent::ClassCancelled {
                student_id: student_id.to_string(),
                at: iso.to_string(),
                is_late,
                ts: Utc::now().to_rfc3339(),
            }));
        Ok(true)
    }

    fn reschedule_single_class(
        &self,
        student_id: &str,
        old_iso: &str,
        new_iso: &str,
    ) -> Result<bool> {
        let mut students = self.students.borrow_mut();
        let Some(stu) = students.get_mut(student_id) else {
            return Ok(false);
        };
        if !stu.class_dates.iter().any(|d| d == old_iso) {
            return Ok(false);
        }
        stu.class_dates.retain(|d| d != old_iso);
        stu.class_dates.push(new_iso.to_string());
        stu.class_dates.sort();
        self.logs
            .borrow_mut()
            .push(LogEntry::Event(AuditEvent::ClassRescheduled {
                student_id: student_id.to_string(),
                from_ts: old_iso.to_string(),
                to: new_iso.to_string(),
                ts: Utc::now().to_rfc3339(),
            }));
        Ok(true)
    }

    fn mark_class_completed(&self, student_id: &str, iso: &str) -> Result<bool> {
        let mut students = self.students.borrow_mut();
        let Some(stu) = students.get_mut(student_id) else {
            return Ok(false);
        };
        stu.class_dates.retain(|d| d != iso);
        stu.classes_remaining = stu.classes_remaining.saturating_sub(1);
        self.logs
            .borrow_mut()
            .push(LogEntry::Event(AuditEvent::ClassCompleted {
                student_id: student_id.to_string(),
                at: iso.to_string(),
                ts: Utc::now().to_rfc3339(),
            }));
        Ok(true)
    }
}
