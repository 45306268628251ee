//! Pattern-reuse renewal workflow.
//!
//! Renewal regenerates a student's schedule from their own history:
//! eligibility gate, quantity resolution (reuse last or typed),
//! confirmation, then an atomic commit that replaces `class_dates`,
//! resets the remaining counter, and appends a `renewal` audit entry.

use chrono::{DateTime, Utc};
use classtrack_core::types::parse_iso_utc;
use classtrack_core::{
    AuditEvent, Keyboard, LogEntry, RecordStore, Render, Result, StudentRecord,
};
use tracing::warn;

use crate::dispatch::Dispatcher;
use crate::pattern::{slots_to_text, weekly_pattern, Slot};
use crate::project::project_from_pattern;
use crate::view::{
    back_keyboard, display_name, student_detail, NO_PATTERN_MSG, RENEW_NOT_READY_MSG,
    STUDENT_NOT_FOUND_MSG,
};

/// The current set is finished when no classes remain and no scheduled
/// instance is still in the future. Unparseable dates are skipped.
pub fn cycle_finished(student: &StudentRecord, now: DateTime<Utc>) -> bool {
    if student.classes_remaining != 0 {
        return false;
    }
    !student
        .class_dates
        .iter()
        .filter_map(|s| parse_iso_utc(s))
        .any(|dt| dt > now)
}

/// Most recent positive renewal quantity for this student. Zero-qty
/// entries are skipped, not treated as a result.
pub fn last_renewal_qty(logs: &[LogEntry], student_id: &str) -> Option<u32> {
    logs.iter()
        .rev()
        .filter_map(|e| e.renewal_qty(student_id))
        .find(|q| *q > 0)
}

/// Class history (from lifecycle audit entries, sorted ascending) and
/// the detected weekly pattern. When the history alone shows no
/// recurring slot, falls back to the currently scheduled dates.
pub fn history_and_pattern<S: RecordStore>(
    store: &S,
    student_id: &str,
) -> Result<(Vec<DateTime<Utc>>, Option<Vec<Slot>>)> {
    let logs = store.load_logs()?;
    let mut history: Vec<DateTime<Utc>> = logs
        .iter()
        .filter(|e| e.student_id() == Some(student_id))
        .filter_map(|e| e.history_timestamp())
        .filter_map(parse_iso_utc)
        .collect();
    history.sort();

    let mut pattern = weekly_pattern(&history);
    if pattern.is_none() {
        if let Some(student) = store.get_student(student_id)? {
            let mut dates: Vec<DateTime<Utc>> = student
                .class_dates
                .iter()
                .filter_map(|s| parse_iso_utc(s))
                .collect();
            dates.sort();
            pattern = weekly_pattern(&dates);
        }
    }
    Ok((history, pattern))
}

fn confirm_prompt(student_id: &str, student: &StudentRecord, qty: u32, pattern: &[Slot]) -> Render {
    let text = format!(
        "New set for {}: {qty} classes. Schedule: {}",
        display_name(student_id, student),
        slots_to_text(pattern)
    );
    Render::with_keyboard(
        text,
        Keyboard::new()
            .button("Confirm", format!("cfm:RENEW:{student_id}:{qty}"))
            .button("Cancel", format!("stu:VIEW:{student_id}")),
    )
}

fn no_pattern(student_id: &str) -> Render {
    Render::with_keyboard(NO_PATTERN_MSG, back_keyboard(student_id))
}

impl<S: RecordStore> Dispatcher<S> {
    /// Entry point of the flow (Renew Plan button).
    pub(crate) fn renew_start(
        &self,
        student_id: &str,
        student: &StudentRecord,
    ) -> Result<Render> {
        if !cycle_finished(student, Utc::now()) {
            return Ok(Render::with_keyboard(
                RENEW_NOT_READY_MSG,
                back_keyboard(student_id),
            ));
        }
        let logs = self.store.load_logs()?;
        let same_text = match last_renewal_qty(&logs, student_id) {
            Some(qty) => format!("Same total ({qty})"),
            None => "Same total".to_string(),
        };
        let text = format!(
            "Renew classes for {}. Use same total as last set, or enter a new total?",
            display_name(student_id, student)
        );
        Ok(Render::with_keyboard(
            text,
            Keyboard::new()
                .button(same_text, format!("stu:RENEW_SAME:{student_id}"))
                .button("Enter total", format!("stu:RENEW_ENTER:{student_id}"))
                .button("⬅ Back", format!("stu:VIEW:{student_id}")),
        ))
    }

    /// Reuse the last renewal quantity. Redirects into the typed path
    /// when no previous renewal exists.
    pub(crate) fn renew_same(
        &mut self,
        operator: i64,
        student_id: &str,
        student: &StudentRecord,
    ) -> Result<Render> {
        let logs = self.store.load_logs()?;
        let Some(qty) = last_renewal_qty(&logs, student_id) else {
            return Ok(self.renew_ask_count(
                operator,
                student_id,
                Some("No previous total found. Enter total number of classes."),
            ));
        };
        let (_, pattern) = history_and_pattern(&self.store, student_id)?;
        let Some(pattern) = pattern else {
            return Ok(no_pattern(student_id));
        };
        Ok(confirm_prompt(student_id, student, qty, &pattern))
    }

    /// Arm the typed-quantity prompt for this operator.
    pub(crate) fn renew_ask_count(
        &mut self,
        operator: i64,
        student_id: &str,
        message: Option<&str>,
    ) -> Render {
        let message =
            message.unwrap_or("Enter total number of classes for the new set (integer).");
        self.sessions.await_renew_qty(operator, student_id);
        Render::with_keyboard(
            message,
            Keyboard::new().button("Cancel", format!("stu:VIEW:{student_id}")),
        )
    }

    /// A plain-text message while the quantity prompt is armed.
    /// `None` when this operator has no pending prompt.
    pub(crate) fn renew_typed_qty(
        &mut self,
        operator: i64,
        text: &str,
    ) -> Result<Option<Render>> {
        let Some(student_id) = self.sessions.pending_renew(operator).map(str::to_string) else {
            return Ok(None);
        };
        // Invalid input re-prompts and keeps the marker armed.
        let Some(qty) = text.trim().parse::<u32>().ok().filter(|q| *q > 0) else {
            return Ok(Some(Render::text("Please send a positive integer.")));
        };
        self.sessions.clear(operator);

        let Some(student) = self.store.get_student(&student_id)? else {
            return Ok(Some(Render::text(STUDENT_NOT_FOUND_MSG)));
        };
        let (_, pattern) = history_and_pattern(&self.store, &student_id)?;
        let Some(pattern) = pattern else {
            return Ok(Some(no_pattern(&student_id)));
        };
        Ok(Some(confirm_prompt(&student_id, &student, qty, &pattern)))
    }

    /// Final commit after the Confirm button. Re-checks everything
    /// against fresh state: the button may be minutes old.
    pub(crate) fn renew_commit(&self, student_id: &str, qty: u32) -> Result<Render> {
        let Some(student) = self.store.get_student(student_id)? else {
            return Ok(Render::text(STUDENT_NOT_FOUND_MSG));
        };
        let now = Utc::now();
        if !cycle_finished(&student, now) {
            let detail = student_detail(student_id, &student);
            return Ok(Render {
                text: format!("{RENEW_NOT_READY_MSG}\n\n{}", detail.text),
                keyboard: detail.keyboard,
            });
        }

        let (history, pattern) = history_and_pattern(&self.store, student_id)?;
        let (Some(anchor), Some(pattern)) = (history.last().copied(), pattern) else {
            return Ok(no_pattern(student_id));
        };
        let generated = project_from_pattern(anchor, &pattern, qty);
        let Some(last) = generated.last().copied() else {
            return Ok(no_pattern(student_id));
        };
        let renewal_iso = last.to_rfc3339();

        let mut students = self.store.load_students()?;
        let updated = {
            let Some(stu) = students.get_mut(student_id) else {
                return Ok(Render::text(STUDENT_NOT_FOUND_MSG));
            };
            stu.class_dates = generated.iter().map(|dt| dt.to_rfc3339()).collect();
            stu.classes_remaining = qty;
            stu.renewal_date = Some(renewal_iso.clone());
            if let Err(reason) = stu.validate() {
                warn!("Rejecting renewal for {student_id}: invalid student record: {reason}");
                return Ok(Render::with_keyboard(
                    format!("Student record invalid: {reason}"),
                    back_keyboard(student_id),
                ));
            }
            stu.clone()
        };
        self.store.save_students(&students)?;
        self.store.append_log(LogEntry::Event(AuditEvent::Renewal {
            student_id: student_id.to_string(),
            qty,
            timestamp_utc: now.to_rfc3339(),
            schedule: "pattern_reused".to_string(),
            renewal_date: renewal_iso,
        }))?;

        let detail = student_detail(student_id, &updated);
        let msg = format!(
            "Renewed {qty} for {}. New renewal date: {}.",
            display_name(student_id, &updated),
            last.date_naive()
        );
        Ok(Render {
            text: format!("{msg}\n\n{}", detail.text),
            keyboard: detail.keyboard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemStore;
    use chrono::{Duration, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_cycle_finished_gate() {
        let now = utc(2025, 6, 1, 12);
        let mut stu = StudentRecord {
            classes_remaining: 0,
            class_dates: vec!["2025-05-26T10:00:00+00:00".into()],
            ..Default::default()
        };
        assert!(cycle_finished(&stu, now));

        stu.class_dates.push("2025-06-09T10:00:00+00:00".into());
        assert!(!cycle_finished(&stu, now));

        stu.class_dates.pop();
        stu.classes_remaining = 2;
        assert!(!cycle_finished(&stu, now));
    }

    #[test]
    fn test_cycle_finished_skips_unparseable_dates() {
        let stu = StudentRecord {
            classes_remaining: 0,
            class_dates: vec!["not a timestamp".into()],
            ..Default::default()
        };
        assert!(cycle_finished(&stu, utc(2025, 6, 1, 12)));
    }

    #[test]
    fn test_last_renewal_qty_skips_zero() {
        let logs = vec![
            LogEntry::Event(AuditEvent::Renewal {
                student_id: "1".into(),
                qty: 8,
                timestamp_utc: "t1".into(),
                schedule: "pattern_reused".into(),
                renewal_date: "r1".into(),
            }),
            LogEntry::Event(AuditEvent::Renewal {
                student_id: "2".into(),
                qty: 12,
                timestamp_utc: "t2".into(),
                schedule: "pattern_reused".into(),
                renewal_date: "r2".into(),
            }),
            LogEntry::Event(AuditEvent::Renewal {
                student_id: "1".into(),
                qty: 0,
                timestamp_utc: "t3".into(),
                schedule: "pattern_reused".into(),
                renewal_date: "r3".into(),
            }),
        ];
        assert_eq!(last_renewal_qty(&logs, "1"), Some(8));
        assert_eq!(last_renewal_qty(&logs, "2"), Some(12));
        assert_eq!(last_renewal_qty(&logs, "3"), None);
    }

    #[test]
    fn test_history_from_lifecycle_entries() {
        let store = MemStore::default();
        for week in 0..3 {
            let at = (utc(2025, 3, 3, 10) + Duration::weeks(week)).to_rfc3339();
            store
                .append_log(LogEntry::Event(AuditEvent::ClassCompleted {
                    student_id: "1".into(),
                    at,
                    ts: Utc::now().to_rfc3339(),
                }))
                .unwrap();
        }
        // Another student's entries stay out of the history.
        store
            .append_log(LogEntry::Event(AuditEvent::ClassCompleted {
                student_id: "2".into(),
                at: utc(2025, 3, 5, 9).to_rfc3339(),
                ts: Utc::now().to_rfc3339(),
            }))
            .unwrap();

        let (history, pattern) = history_and_pattern(&store, "1").unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(*history.last().unwrap(), utc(2025, 3, 17, 10));
        let pattern = pattern.unwrap();
        assert_eq!(pattern.len(), 1);
        assert_eq!(pattern[0].label(), "Mon 10:00");
    }

    #[test]
    fn test_pattern_falls_back_to_scheduled_dates() {
        let stu = StudentRecord {
            name: "Bea".into(),
            class_dates: vec![
                utc(2025, 7, 7, 18).to_rfc3339(),
                utc(2025, 7, 14, 18).to_rfc3339(),
            ],
            classes_remaining: 2,
            ..Default::default()
        };
        let store = MemStore::with_student("1", stu);
        let (history, pattern) = history_and_pattern(&store, "1").unwrap();
        assert!(history.is_empty());
        assert_eq!(pattern.unwrap()[0].label(), "Mon 18:00");
    }
}
