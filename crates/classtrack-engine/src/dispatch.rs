//! Central dispatcher: parsed callbacks and typed messages in, rendered
//! menus out.
//!
//! Every handler re-fetches the student from the store before acting;
//! buttons outlive the state they were built from, so the payload is a
//! reference, never a snapshot. Handler errors are logged and collapsed
//! into a retry message so the event loop keeps running.

use chrono::Utc;
use classtrack_core::{
    AuditEvent, Keyboard, LogEntry, RecordStore, Render, Result, StudentRecord,
};
use tracing::{debug, warn};

use crate::callback::{Callback, ConfirmAction, StudentVerb};
use crate::session::Sessions;
use crate::view::{back_keyboard, display_name, student_detail, STUDENT_NOT_FOUND_MSG};

const RETRY_MSG: &str = "Something went wrong. Try again.";

/// Routes operator input to the workflow handlers.
pub struct Dispatcher<S> {
    pub(crate) store: S,
    pub(crate) sessions: Sessions,
    pub(crate) menu_limit: usize,
}

impl<S: RecordStore> Dispatcher<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            sessions: Sessions::new(),
            menu_limit: 8,
        }
    }

    /// Cap on class buttons per selection menu.
    pub fn with_menu_limit(mut self, limit: usize) -> Self {
        self.menu_limit = limit;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle a button callback. `None` means the payload was malformed
    /// or unknown and nothing should be rendered.
    pub fn handle_callback(&mut self, operator: i64, data: &str) -> Option<Render> {
        let Some(callback) = Callback::parse(data) else {
            debug!("Ignoring unrecognized callback: {data}");
            return None;
        };
        // Any button press abandons a pending typed-input prompt.
        self.sessions.clear(operator);
        Some(self.route(operator, callback).unwrap_or_else(|e| {
            warn!("Callback handler failed for {data:?}: {e}");
            Render::text(RETRY_MSG)
        }))
    }

    /// Handle a plain-text message. `None` when no prompt is armed for
    /// this operator (the message is not for us).
    pub fn handle_message(&mut self, operator: i64, text: &str) -> Option<Render> {
        match self.renew_typed_qty(operator, text) {
            Ok(render) => render,
            Err(e) => {
                warn!("Typed-input handler failed: {e}");
                Some(Render::text(RETRY_MSG))
            }
        }
    }

    fn route(&mut self, operator: i64, callback: Callback) -> Result<Render> {
        match callback {
            Callback::Student { verb, student_id } => {
                let Some(student) = self.store.get_student(&student_id)? else {
                    return Ok(Render::text(STUDENT_NOT_FOUND_MSG));
                };
                self.student_action(operator, verb, &student_id, &student)
            }
            Callback::Class {
                verb,
                student_id,
                iso,
            } => {
                let Some(student) = self.store.get_student(&student_id)? else {
                    return Ok(Render::text(STUDENT_NOT_FOUND_MSG));
                };
                self.class_selected(verb, &student_id, &iso, &student)
            }
            Callback::Log {
                verb,
                student_id,
                iso,
            } => {
                if self.store.get_student(&student_id)?.is_none() {
                    return Ok(Render::text(STUDENT_NOT_FOUND_MSG));
                }
                self.log_action(verb, &student_id, &iso)
            }
            Callback::Confirm(action) => self.confirm(action),
        }
    }

    fn student_action(
        &mut self,
        operator: i64,
        verb: StudentVerb,
        student_id: &str,
        student: &StudentRecord,
    ) -> Result<Render> {
        match verb {
            StudentVerb::Log => self.show_log_menu(student_id, student),
            StudentVerb::Cancel => self.show_cancel_menu(student_id, student),
            StudentVerb::Resched => self.show_resched_menu(student_id, student),
            StudentVerb::Renew => self.renew_start(student_id, student),
            StudentVerb::RenewSame => self.renew_same(operator, student_id, student),
            StudentVerb::RenewEnter => Ok(self.renew_ask_count(operator, student_id, None)),
            StudentVerb::Length => Ok(Render::with_keyboard(
                "Class length is changed through the weekly schedule editor.",
                back_keyboard(student_id),
            )),
            StudentVerb::Edit => Ok(Render::with_keyboard(
                "Weekly schedules are managed in the schedule editor.",
                back_keyboard(student_id),
            )),
            StudentVerb::FreeCredit => self.award_free_credit(student_id),
            StudentVerb::Pause => self.toggle_pause(student_id),
            StudentVerb::Remove => Ok(Render::with_keyboard(
                format!(
                    "Remove {} from records? This cannot be undone.",
                    display_name(student_id, student)
                ),
                Keyboard::new()
                    .button("Confirm", format!("cfm:REMOVE:{student_id}"))
                    .button("⬅ Back", format!("stu:VIEW:{student_id}")),
            )),
            StudentVerb::View => Ok(student_detail(student_id, student)),
            StudentVerb::Adhoc => Ok(Render::with_keyboard(
                format!(
                    "Coming soon: adhoc class for {}",
                    display_name(student_id, student)
                ),
                back_keyboard(student_id),
            )),
        }
    }

    fn confirm(&mut self, action: ConfirmAction) -> Result<Render> {
        match action {
            ConfirmAction::Cancel { student_id, iso } => {
                let Some(student) = self.store.get_student(&student_id)? else {
                    return Ok(Render::text(STUDENT_NOT_FOUND_MSG));
                };
                self.confirm_cancel(&student_id, &iso, &student)
            }
            ConfirmAction::Resched {
                student_id,
                iso,
                target,
            } => {
                if self.store.get_student(&student_id)?.is_none() {
                    return Ok(Render::text(STUDENT_NOT_FOUND_MSG));
                }
                self.confirm_resched(&student_id, &iso, target)
            }
            ConfirmAction::Renew { student_id, qty } => self.renew_commit(&student_id, qty),
            ConfirmAction::Remove { student_id } => self.remove_student(&student_id),
        }
    }

    /// Flip the paused flag, persist, audit, show the updated detail.
    fn toggle_pause(&self, student_id: &str) -> Result<Render> {
        let mut students = self.store.load_students()?;
        let updated = {
            let Some(stu) = students.get_mut(student_id) else {
                return Ok(Render::text(STUDENT_NOT_FOUND_MSG));
            };
            stu.paused = !stu.paused;
            stu.clone()
        };
        self.store.save_students(&students)?;
        self.store
            .append_log(LogEntry::Event(AuditEvent::PauseToggled {
                student_id: student_id.to_string(),
                new_value: updated.paused,
                ts: Utc::now().to_rfc3339(),
            }))?;
        Ok(student_detail(student_id, &updated))
    }

    fn award_free_credit(&self, student_id: &str) -> Result<Render> {
        let mut students = self.store.load_students()?;
        let updated = {
            let Some(stu) = students.get_mut(student_id) else {
                return Ok(Render::text(STUDENT_NOT_FOUND_MSG));
            };
            stu.free_class_credit += 1;
            stu.clone()
        };
        self.store.save_students(&students)?;
        self.store.append_log(LogEntry::Event(AuditEvent::FreeCredit {
            student_id: student_id.to_string(),
            ts: Utc::now().to_rfc3339(),
        }))?;
        Ok(Render::with_keyboard(
            format!(
                "Awarded a free class credit to {}. They now have {} free credit(s).",
                display_name(student_id, &updated),
                updated.free_class_credit
            ),
            back_keyboard(student_id),
        ))
    }

    fn remove_student(&self, student_id: &str) -> Result<Render> {
        let mut students = self.store.load_students()?;
        let Some(removed) = students.remove(student_id) else {
            return Ok(Render::text(STUDENT_NOT_FOUND_MSG));
        };
        self.store.save_students(&students)?;
        self.store
            .append_log(LogEntry::Event(AuditEvent::StudentRemoved {
                student_id: student_id.to_string(),
                ts: Utc::now().to_rfc3339(),
            }))?;
        Ok(Render::text(format!(
            "Removed {} from records.",
            display_name(student_id, &removed)
        )))
    }
}
