//! Class lifecycle workflow: logging past classes, cancelling and
//! rescheduling upcoming ones.
//!
//! Each flow is menu → class selection → (status choice | confirmation)
//! → store mutation. Selections carry the exact ISO string of the
//! instance; membership is re-checked on every step so a stale button
//! can never touch a class that moved underneath it.

use chrono::{DateTime, Duration, Utc};
use classtrack_core::types::parse_iso_utc;
use classtrack_core::{Button, ClassStatus, Keyboard, RecordStore, Render, Result, StudentRecord};

use crate::callback::{ClassVerb, LogVerb, ReschedTarget};
use crate::dispatch::Dispatcher;
use crate::view::{back_keyboard, fmt_class_label, student_detail, STUDENT_NOT_FOUND_MSG};

/// Past class instances that still need logging, most recent first,
/// capped at `limit`. Unparseable timestamps are skipped.
pub fn unlogged_past_classes<S: RecordStore>(
    store: &S,
    student_id: &str,
    student: &StudentRecord,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<String>> {
    let logs = store.load_logs()?;
    let mut dates = student.class_dates.clone();
    dates.sort();
    let mut visible: Vec<String> = dates
        .into_iter()
        .filter(|d| parse_iso_utc(d).is_some_and(|dt| dt <= now))
        .filter(|d| !logs.iter().any(|e| e.covers_class(student_id, d)))
        .collect();
    visible.reverse();
    visible.truncate(limit);
    Ok(visible)
}

/// Upcoming class instances with no existing log, soonest first,
/// capped at `limit`.
pub fn unlogged_upcoming_classes<S: RecordStore>(
    store: &S,
    student_id: &str,
    student: &StudentRecord,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<String>> {
    let logs = store.load_logs()?;
    let mut dates = student.class_dates.clone();
    dates.sort();
    let mut visible: Vec<String> = dates
        .into_iter()
        .filter(|d| parse_iso_utc(d).is_some_and(|dt| dt > now))
        .filter(|d| !logs.iter().any(|e| e.covers_class(student_id, d)))
        .collect();
    visible.truncate(limit);
    Ok(visible)
}

fn class_menu(
    title: &str,
    verb_tag: &str,
    student_id: &str,
    dates: &[String],
) -> Render {
    let mut keyboard = Keyboard::new();
    for dt in dates {
        keyboard = keyboard.button(fmt_class_label(dt), format!("cls:{verb_tag}:{student_id}:{dt}"));
    }
    keyboard = keyboard.button("⬅ Back", format!("stu:VIEW:{student_id}"));
    Render::with_keyboard(title, keyboard)
}

impl<S: RecordStore> Dispatcher<S> {
    /// Log Class menu: past instances awaiting a status.
    pub(crate) fn show_log_menu(
        &self,
        student_id: &str,
        student: &StudentRecord,
    ) -> Result<Render> {
        let visible =
            unlogged_past_classes(&self.store, student_id, student, Utc::now(), self.menu_limit)?;
        if visible.is_empty() {
            return Ok(Render::with_keyboard(
                "No unlogged past classes",
                back_keyboard(student_id),
            ));
        }
        Ok(class_menu("Select class to log:", "LOG", student_id, &visible))
    }

    /// Cancel Class menu: upcoming instances.
    pub(crate) fn show_cancel_menu(
        &self,
        student_id: &str,
        student: &StudentRecord,
    ) -> Result<Render> {
        let visible = unlogged_upcoming_classes(
            &self.store,
            student_id,
            student,
            Utc::now(),
            self.menu_limit,
        )?;
        if visible.is_empty() {
            return Ok(Render::with_keyboard(
                "No upcoming classes to cancel",
                back_keyboard(student_id),
            ));
        }
        Ok(class_menu(
            "Select class to cancel:",
            "CANCEL",
            student_id,
            &visible,
        ))
    }

    /// Reschedule Class menu: upcoming instances.
    pub(crate) fn show_resched_menu(
        &self,
        student_id: &str,
        student: &StudentRecord,
    ) -> Result<Render> {
        let visible = unlogged_upcoming_classes(
            &self.store,
            student_id,
            student,
            Utc::now(),
            self.menu_limit,
        )?;
        if visible.is_empty() {
            return Ok(Render::with_keyboard(
                "No upcoming classes to reschedule",
                back_keyboard(student_id),
            ));
        }
        Ok(class_menu(
            "Select class to reschedule:",
            "RESHED",
            student_id,
            &visible,
        ))
    }

    /// A concrete class instance was selected from one of the menus.
    pub(crate) fn class_selected(
        &self,
        verb: ClassVerb,
        student_id: &str,
        iso: &str,
        student: &StudentRecord,
    ) -> Result<Render> {
        if !student.class_dates.iter().any(|d| d == iso) {
            return Ok(Render::with_keyboard(
                "Class not found.",
                back_keyboard(student_id),
            ));
        }
        match verb {
            ClassVerb::Log => {
                let mut keyboard = Keyboard::new()
                    .button("✅ Completed", format!("log:COMPLETE:{student_id}:{iso}"))
                    .button(
                        "❌ Cancelled (Early)",
                        format!("log:CANCEL_EARLY:{student_id}:{iso}"),
                    )
                    .button(
                        "❌ Cancelled (Late)",
                        format!("log:CANCEL_LATE:{student_id}:{iso}"),
                    )
                    .button("🔁 Rescheduled", format!("log:RESCHEDULED:{student_id}:{iso}"));
                if self.store.is_class_logged(student_id, iso)? {
                    keyboard =
                        keyboard.button("🔓 Unlog Class", format!("log:UNLOG:{student_id}:{iso}"));
                }
                keyboard = keyboard.button("⬅ Back", format!("stu:VIEW:{student_id}"));
                Ok(Render::with_keyboard(
                    format!("Log class at {iso}:"),
                    keyboard,
                ))
            }
            ClassVerb::Cancel => Ok(Render::with_keyboard(
                format!("Cancel class at {iso}?"),
                Keyboard::new()
                    .button("Confirm", format!("cfm:CANCEL:{student_id}:{iso}"))
                    .button("Back", format!("stu:VIEW:{student_id}")),
            )),
            ClassVerb::Resched => Ok(Render::with_keyboard(
                format!("Reschedule class at {iso}. Choose new time:"),
                Keyboard::new()
                    .row(vec![Button::new(
                        "+1h",
                        format!("cfm:RESHED:{student_id}:{iso}|AUTO:+1h"),
                    )])
                    .row(vec![Button::new(
                        "Tomorrow same time",
                        format!("cfm:RESHED:{student_id}:{iso}|AUTO:tomorrow"),
                    )])
                    .button("Cancel", format!("stu:VIEW:{student_id}")),
            )),
        }
    }

    /// Status choice (or unlog) for a selected class.
    pub(crate) fn log_action(
        &self,
        verb: LogVerb,
        student_id: &str,
        iso: &str,
    ) -> Result<Render> {
        let msg = match verb {
            LogVerb::Unlog => {
                if self.store.remove_class_log(student_id, iso)? {
                    format!("Log removed for {iso}.")
                } else {
                    "No matching log entry found.".to_string()
                }
            }
            LogVerb::Complete | LogVerb::CancelEarly | LogVerb::CancelLate | LogVerb::Rescheduled => {
                let status = match verb {
                    LogVerb::Complete => ClassStatus::Completed,
                    LogVerb::CancelEarly => ClassStatus::CancelledEarly,
                    LogVerb::CancelLate => ClassStatus::CancelledLate,
                    _ => ClassStatus::Rescheduled,
                };
                self.store.log_class_status(student_id, iso, status)?;
                format!("Class at {iso} logged as {}.", status.label())
            }
        };
        Ok(Render::with_keyboard(msg, back_keyboard(student_id)))
    }

    /// Confirmed cancellation. Reports failure when the instance is no
    /// longer scheduled.
    pub(crate) fn confirm_cancel(
        &self,
        student_id: &str,
        iso: &str,
        student: &StudentRecord,
    ) -> Result<Render> {
        let msg = if self
            .store
            .cancel_single_class(student_id, iso, student.cutoff_hours)?
        {
            format!("Class at {iso} cancelled.")
        } else {
            "Failed to cancel class.".to_string()
        };
        Ok(Render::with_keyboard(msg, back_keyboard(student_id)))
    }

    /// Confirmed reschedule with a derived target time.
    pub(crate) fn confirm_resched(
        &self,
        student_id: &str,
        iso: &str,
        target: ReschedTarget,
    ) -> Result<Render> {
        let failed = || {
            Ok(Render::with_keyboard(
                "Failed to reschedule class.",
                back_keyboard(student_id),
            ))
        };
        let new_iso = match target {
            ReschedTarget::PlusOneHour | ReschedTarget::Tomorrow => {
                let Some(old) = parse_iso_utc(iso) else {
                    return failed();
                };
                let delta = match target {
                    ReschedTarget::PlusOneHour => Duration::hours(1),
                    _ => Duration::days(1),
                };
                (old + delta).to_rfc3339()
            }
            ReschedTarget::Unchanged => iso.to_string(),
        };
        if !self
            .store
            .reschedule_single_class(student_id, iso, &new_iso)?
        {
            return failed();
        }
        let Some(student) = self.store.get_student(student_id)? else {
            return Ok(Render::text(STUDENT_NOT_FOUND_MSG));
        };
        let detail = student_detail(student_id, &student);
        Ok(Render {
            text: format!("Class moved from {iso} to {new_iso}.\n\n{}", detail.text),
            keyboard: detail.keyboard,
        })
    }
}
