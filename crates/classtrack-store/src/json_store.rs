//! File-backed implementation of the [`RecordStore`] contract.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use classtrack_core::types::parse_iso_utc;
use classtrack_core::{
    AuditEvent, ClassStatus, ClassTrackError, LogEntry, RecordStore, Result, StatusLog, StudentMap,
};

/// JSON file store over a data directory.
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open (or create) a store at the given directory.
    pub fn new(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn students_file(&self) -> PathBuf {
        self.dir.join("students.json")
    }

    fn logs_file(&self) -> PathBuf {
        self.dir.join("logs.json")
    }

    fn save_logs(&self, logs: &[LogEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(logs)?;
        std::fs::write(self.logs_file(), json)?;
        Ok(())
    }
}

impl RecordStore for JsonStore {
    fn load_students(&self) -> Result<StudentMap> {
        let file = self.students_file();
        if !file.exists() {
            return Ok(StudentMap::new());
        }
        let json = std::fs::read_to_string(&file)?;
        match serde_json::from_str(&json) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::error!("Failed to parse {}: {e}; starting empty", file.display());
                Ok(StudentMap::new())
            }
        }
    }

    fn save_students(&self, students: &StudentMap) -> Result<()> {
        let json = serde_json::to_string_pretty(students)?;
        std::fs::write(self.students_file(), json)?;
        tracing::debug!("Saved {} students", students.len());
        Ok(())
    }

    fn get_student(&self, student_id: &str) -> Result<Option<classtrack_core::StudentRecord>> {
        let mut students = self.load_students()?;
        Ok(students.remove(student_id))
    }

    fn append_log(&self, entry: LogEntry) -> Result<()> {
        let mut logs = self.load_logs()?;
        logs.push(entry);
        self.save_logs(&logs)
    }

    fn load_logs(&self) -> Result<Vec<LogEntry>> {
        let file = self.logs_file();
        if !file.exists() {
            return Ok(Vec::new());
        }
        let json = std::fs::read_to_string(&file)?;
        match serde_json::from_str(&json) {
            Ok(logs) => Ok(logs),
            Err(e) => {
                tracing::error!("Failed to parse {}: {e}; starting empty", file.display());
                Ok(Vec::new())
            }
        }
    }

    fn is_class_logged(&self, student_id: &str, iso: &str) -> Result<bool> {
        let logs = self.load_logs()?;
        Ok(logs.iter().any(|e| e.covers_class(student_id, iso)))
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
        let mut logs = self.load_logs()?;
        match logs.iter().position(|e| e.covers_class(student_id, iso)) {
            Some(idx) => {
                logs.remove(idx);
                self.save_logs(&logs)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn cancel_single_class(&self, student_id: &str, iso: &str, cutoff_hours: i64) -> Result<bool> {
        let mut students = self.load_students()?;
        let Some(stu) = students.get_mut(student_id) else {
            return Ok(false);
        };
        let class_time = parse_iso_utc(iso).ok_or_else(|| {
            ClassTrackError::Store(format!("unparseable class timestamp: {iso}"))
        })?;
        let is_late = Utc::now() > class_time - Duration::hours(cutoff_hours);
        stu.class_dates.retain(|d| d != iso);
        stu.cancelled_dates.push(iso.to_string());
        if is_late {
            stu.classes_remaining = stu.classes_remaining.saturating_sub(1);
        }
        self.save_students(&students)?;
        self.append_log(LogEntry::Event(AuditEvent::ClassCancelled {
            student_id: student_id.to_string(),
            at: iso.to_string(),
            is_late,
            ts: Utc::now().to_rfc3339(),
        }))?;
        Ok(true)
    }

    fn reschedule_single_class(
        &self,
        student_id: &str,
        old_iso: &str,
        new_iso: &str,
    ) -> Result<bool> {
        let mut students = self.load_students()?;
        let Some(stu) = students.get_mut(student_id) else {
            return Ok(false);
        };
        // Exact-string membership; a stale button payload fails closed
        // with no partial mutation.
        if !stu.class_dates.iter().any(|d| d == old_iso) {
            return Ok(false);
        }
        stu.class_dates.retain(|d| d != old_iso);
        stu.class_dates.push(new_iso.to_string());
        stu.class_dates.sort();
        self.save_students(&students)?;
        self.append_log(LogEntry::Event(AuditEvent::ClassRescheduled {
            student_id: student_id.to_string(),
            from_ts: old_iso.to_string(),
            to: new_iso.to_string(),
            ts: Utc::now().to_rfc3339(),
        }))?;
        Ok(true)
    }

    fn mark_class_completed(&self, student_id: &str, iso: &str) -> Result<bool> {
        let mut students = self.load_students()?;
        let Some(stu) = students.get_mut(student_id) else {
            return Ok(false);
        };
        stu.class_dates.retain(|d| d != iso);
        stu.classes_remaining = stu.classes_remaining.saturating_sub(1);
        self.save_students(&students)?;
        self.append_log(LogEntry::Event(AuditEvent::ClassCompleted {
            student_id: student_id.to_string(),
            at: iso.to_string(),
            ts: Utc::now().to_rfc3339(),
        }))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classtrack_core::StudentRecord;
    use chrono::Duration;

    fn scratch_store(name: &str, class_dates: Vec<String>) -> (JsonStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("classtrack-store-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        let store = JsonStore::new(&dir);
        let mut students = StudentMap::new();
        students.insert(
            "1".into(),
            StudentRecord {
                name: "Test".into(),
                class_dates,
                classes_remaining: 3,
                ..Default::default()
            },
        );
        store.save_students(&students).unwrap();
        (store, dir)
    }

    #[test]
    fn test_mark_class_completed() {
        let d1 = (Utc::now() + Duration::days(1)).to_rfc3339();
        let d2 = (Utc::now() + Duration::days(2)).to_rfc3339();
        let (store, dir) = scratch_store("complete", vec![d1.clone(), d2.clone()]);

        assert!(store.mark_class_completed("1", &d1).unwrap());
        let stu = store.get_student("1").unwrap().unwrap();
        assert!(!stu.class_dates.contains(&d1));
        assert_eq!(stu.classes_remaining, 2);
        let logs = store.load_logs().unwrap();
        assert!(matches!(
            logs.last(),
            Some(LogEntry::Event(AuditEvent::ClassCompleted { at, .. })) if at == &d1
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cancel_early_keeps_remaining() {
        let d1 = (Utc::now() + Duration::hours(48)).to_rfc3339();
        let (store, dir) = scratch_store("cancel-early", vec![d1.clone()]);

        assert!(store.cancel_single_class("1", &d1, 24).unwrap());
        let stu = store.get_student("1").unwrap().unwrap();
        assert!(!stu.class_dates.contains(&d1));
        assert!(stu.cancelled_dates.contains(&d1));
        assert_eq!(stu.classes_remaining, 3);
        let logs = store.load_logs().unwrap();
        assert!(matches!(
            logs.last(),
            Some(LogEntry::Event(AuditEvent::ClassCancelled { is_late: false, .. }))
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cancel_late_deducts_one() {
        let d1 = (Utc::now() + Duration::hours(1)).to_rfc3339();
        let (store, dir) = scratch_store("cancel-late", vec![d1.clone()]);

        assert!(store.cancel_single_class("1", &d1, 2).unwrap());
        let stu = store.get_student("1").unwrap().unwrap();
        assert_eq!(stu.classes_remaining, 2);
        let logs = store.load_logs().unwrap();
        assert!(matches!(
            logs.last(),
            Some(LogEntry::Event(AuditEvent::ClassCancelled { is_late: true, .. }))
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reschedule_moves_and_sorts() {
        let old = (Utc::now() + Duration::days(1)).to_rfc3339();
        let new = (Utc::now() + Duration::days(3)).to_rfc3339();
        let (store, dir) = scratch_store("resched", vec![old.clone()]);

        assert!(store.reschedule_single_class("1", &old, &new).unwrap());
        let stu = store.get_student("1").unwrap().unwrap();
        assert!(!stu.class_dates.contains(&old));
        assert!(stu.class_dates.contains(&new));
        let logs = store.load_logs().unwrap();
        assert!(matches!(
            logs.last(),
            Some(LogEntry::Event(AuditEvent::ClassRescheduled { from_ts, to, .. }))
                if from_ts == &old && to == &new
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reschedule_stale_instance_fails_closed() {
        let present = (Utc::now() + Duration::days(1)).to_rfc3339();
        let absent = (Utc::now() + Duration::days(2)).to_rfc3339();
        let (store, dir) = scratch_store("resched-stale", vec![present.clone()]);

        assert!(!store
            .reschedule_single_class("1", &absent, &present)
            .unwrap());
        let stu = store.get_student("1").unwrap().unwrap();
        assert_eq!(stu.class_dates, vec![present]);
        assert!(store.load_logs().unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_log_and_unlog_class() {
        let dir = std::env::temp_dir().join("classtrack-store-unlog");
        std::fs::remove_dir_all(&dir).ok();
        let store = JsonStore::new(&dir);
        let dt = "2025-01-01T10:00:00+00:00";

        store
            .log_class_status("1", dt, ClassStatus::Completed)
            .unwrap();
        assert!(store.is_class_logged("1", dt).unwrap());

        assert!(store.remove_class_log("1", dt).unwrap());
        assert!(!store.is_class_logged("1", dt).unwrap());
        // Second removal finds nothing.
        assert!(!store.remove_class_log("1", dt).unwrap());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_files_load_empty() {
        let dir = std::env::temp_dir().join("classtrack-store-corrupt");
        std::fs::remove_dir_all(&dir).ok();
        let store = JsonStore::new(&dir);
        std::fs::write(dir.join("students.json"), "{not json").unwrap();
        std::fs::write(dir.join("logs.json"), "[not json").unwrap();
        assert!(store.load_students().unwrap().is_empty());
        assert!(store.load_logs().unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
