//! Student records and audit-log entries, the persisted data model.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

fn default_cutoff_hours() -> i64 {
    24
}

/// One student on the roster. Keyed externally by a stable string id in
/// the students map; the record itself does not carry the id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(default)]
    pub name: String,
    /// Scheduled class instances, ISO-8601 strings (UTC assumed when no
    /// offset is present). Past and future entries both live here.
    #[serde(default)]
    pub class_dates: Vec<String>,
    /// Unconsumed classes in the current purchased batch.
    #[serde(default)]
    pub classes_remaining: u32,
    /// Timestamps removed from the active schedule. Audit trail only.
    #[serde(default)]
    pub cancelled_dates: Vec<String>,
    /// Last class of the most recently generated batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_date: Option<String>,
    #[serde(default)]
    pub paused: bool,
    /// Threshold distinguishing early from late cancellation.
    #[serde(default = "default_cutoff_hours")]
    pub cutoff_hours: i64,
    #[serde(default)]
    pub free_class_credit: u32,
}

impl StudentRecord {
    /// Structural invariant checked before any persisted mutation:
    /// `class_dates` non-empty and `classes_remaining` positive.
    /// Returns a short reason on failure.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.class_dates.is_empty() {
            return Err("class_dates must be a non-empty list".into());
        }
        if self.classes_remaining == 0 {
            return Err("classes_remaining must be a positive integer".into());
        }
        Ok(())
    }
}

/// Status choices offered by the Log menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassStatus {
    Completed,
    CancelledEarly,
    CancelledLate,
    Rescheduled,
}

impl ClassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Completed => "completed",
            ClassStatus::CancelledEarly => "cancelled_early",
            ClassStatus::CancelledLate => "cancelled_late",
            ClassStatus::Rescheduled => "rescheduled",
        }
    }

    /// Human-facing label, underscores spaced out.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

/// Typed audit events, tagged by `type` in logs.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    PauseToggled {
        student_id: String,
        new_value: bool,
        ts: String,
    },
    Renewal {
        student_id: String,
        qty: u32,
        timestamp_utc: String,
        /// How the schedule was produced; `pattern_reused` marks a
        /// pattern-derived batch.
        schedule: String,
        renewal_date: String,
    },
    ClassCompleted {
        student_id: String,
        at: String,
        ts: String,
    },
    ClassCancelled {
        student_id: String,
        at: String,
        is_late: bool,
        ts: String,
    },
    ClassRescheduled {
        student_id: String,
        #[serde(rename = "from")]
        from_ts: String,
        to: String,
        ts: String,
    },
    FreeCredit {
        student_id: String,
        ts: String,
    },
    StudentRemoved {
        student_id: String,
        ts: String,
    },
}

/// Legacy `status`-keyed row, still written by the Log menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusLog {
    pub student_id: String,
    pub date: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

/// One row of the append-only audit log. Unknown rows are preserved
/// opaquely so a foreign entry never breaks a load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogEntry {
    Event(AuditEvent),
    Status(StatusLog),
    Other(serde_json::Value),
}

impl LogEntry {
    pub fn student_id(&self) -> Option<&str> {
        match self {
            LogEntry::Event(ev) => Some(match ev {
                AuditEvent::PauseToggled { student_id, .. }
                | AuditEvent::Renewal { student_id, .. }
                | AuditEvent::ClassCompleted { student_id, .. }
                | AuditEvent::ClassCancelled { student_id, .. }
                | AuditEvent::ClassRescheduled { student_id, .. }
                | AuditEvent::FreeCredit { student_id, .. }
                | AuditEvent::StudentRemoved { student_id, .. } => student_id,
            }),
            LogEntry::Status(row) => Some(&row.student_id),
            LogEntry::Other(_) => None,
        }
    }

    /// The timestamp a lifecycle event contributes to schedule history:
    /// completion/cancellation instants and reschedule targets, plus
    /// legacy completed/cancelled rows.
    pub fn history_timestamp(&self) -> Option<&str> {
        match self {
            LogEntry::Event(AuditEvent::ClassCompleted { at, .. })
            | LogEntry::Event(AuditEvent::ClassCancelled { at, .. }) => Some(at),
            LogEntry::Event(AuditEvent::ClassRescheduled { to, .. }) => Some(to),
            LogEntry::Status(row) if row.status == "completed" || row.status == "cancelled" => {
                Some(&row.date)
            }
            _ => None,
        }
    }

    /// Whether this entry marks `iso` as already handled for `student_id`
    /// (hides the class from the Log and Cancel/Reschedule menus).
    pub fn covers_class(&self, student_id: &str, iso: &str) -> bool {
        if self.student_id() != Some(student_id) {
            return false;
        }
        match self {
            LogEntry::Status(row) => row.date == iso,
            LogEntry::Event(AuditEvent::ClassCompleted { at, .. })
            | LogEntry::Event(AuditEvent::ClassCancelled { at, .. }) => at == iso,
            _ => false,
        }
    }

    /// Renewal quantity, when this is a renewal entry for `student_id`.
    pub fn renewal_qty(&self, student_id: &str) -> Option<u32> {
        match self {
            LogEntry::Event(AuditEvent::Renewal {
                student_id: sid,
                qty,
                ..
            }) if sid == student_id => Some(*qty),
            _ => None,
        }
    }
}

/// Parse an ISO-8601 timestamp, assuming UTC when no offset is present.
pub fn parse_iso_utc(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    s.parse::<NaiveDateTime>()
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_dates() {
        let stu = StudentRecord {
            classes_remaining: 5,
            ..Default::default()
        };
        assert!(stu.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_remaining() {
        let stu = StudentRecord {
            class_dates: vec!["2025-01-06T18:00:00+00:00".into()],
            classes_remaining: 0,
            ..Default::default()
        };
        assert!(stu.validate().unwrap_err().contains("classes_remaining"));
    }

    #[test]
    fn test_parse_iso_naive_assumed_utc() {
        let dt = parse_iso_utc("2025-01-06T18:00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 6, 18, 0, 0).unwrap());
        let dt = parse_iso_utc("2025-01-06T18:00:00+00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 6, 18, 0, 0).unwrap());
        assert!(parse_iso_utc("not a date").is_none());
    }

    #[test]
    fn test_log_entry_typed_round_trip() {
        let entry = LogEntry::Event(AuditEvent::Renewal {
            student_id: "1".into(),
            qty: 8,
            timestamp_utc: "2025-02-01T00:00:00+00:00".into(),
            schedule: "pattern_reused".into(),
            renewal_date: "2025-03-01T18:00:00+00:00".into(),
        });
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"type\":\"renewal\""));
        let back: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.renewal_qty("1"), Some(8));
        assert_eq!(back.renewal_qty("2"), None);
    }

    #[test]
    fn test_log_entry_legacy_and_unknown_rows() {
        let json = r#"[
            {"student_id": "1", "date": "2025-01-01T10:00:00+00:00", "status": "completed"},
            {"student": "old-key", "status": "removed", "note": ""},
            {"type": "renewal", "student_id": "1", "qty": 4,
             "timestamp_utc": "t", "schedule": "pattern_reused", "renewal_date": "r"}
        ]"#;
        let logs: Vec<LogEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(logs.len(), 3);
        assert!(matches!(logs[0], LogEntry::Status(_)));
        assert!(matches!(logs[1], LogEntry::Other(_)));
        assert_eq!(logs[2].renewal_qty("1"), Some(4));
        assert!(logs[0].covers_class("1", "2025-01-01T10:00:00+00:00"));
        assert!(!logs[0].covers_class("2", "2025-01-01T10:00:00+00:00"));
    }

    #[test]
    fn test_history_timestamp_by_variant() {
        let completed = LogEntry::Event(AuditEvent::ClassCompleted {
            student_id: "1".into(),
            at: "a".into(),
            ts: "t".into(),
        });
        let moved = LogEntry::Event(AuditEvent::ClassRescheduled {
            student_id: "1".into(),
            from_ts: "old".into(),
            to: "new".into(),
            ts: "t".into(),
        });
        let paused = LogEntry::Event(AuditEvent::PauseToggled {
            student_id: "1".into(),
            new_value: true,
            ts: "t".into(),
        });
        assert_eq!(completed.history_timestamp(), Some("a"));
        assert_eq!(moved.history_timestamp(), Some("new"));
        assert_eq!(paused.history_timestamp(), None);
    }
}
