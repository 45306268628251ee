//! Per-operator conversation state.
//!
//! The only typed-input step in the workflows is the renewal quantity
//! prompt; everything else is button-driven. State lives in memory and
//! any button press clears it, so a half-finished prompt never leaks
//! into an unrelated flow.

use std::collections::HashMap;

/// What the engine is waiting for from one operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    /// The next plain-text message is the class count for this student's
    /// renewal.
    AwaitingRenewQty { student_id: String },
}

/// Session table keyed by operator id.
#[derive(Debug, Default)]
pub struct Sessions {
    states: HashMap<i64, SessionState>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the renewal-quantity prompt for an operator.
    pub fn await_renew_qty(&mut self, operator: i64, student_id: &str) {
        self.states.insert(
            operator,
            SessionState::AwaitingRenewQty {
                student_id: student_id.to_string(),
            },
        );
    }

    /// The student whose renewal quantity this operator is being asked
    /// for, if any.
    pub fn pending_renew(&self, operator: i64) -> Option<&str> {
        match self.states.get(&operator) {
            Some(SessionState::AwaitingRenewQty { student_id }) => Some(student_id),
            _ => None,
        }
    }

    /// Drop any pending prompt for this operator.
    pub fn clear(&mut self, operator: i64) {
        self.states.remove(&operator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_per_operator() {
        let mut sessions = Sessions::new();
        sessions.await_renew_qty(100, "stu-1");
        assert_eq!(sessions.pending_renew(100), Some("stu-1"));
        assert_eq!(sessions.pending_renew(200), None);
    }

    #[test]
    fn test_clear_drops_prompt() {
        let mut sessions = Sessions::new();
        sessions.await_renew_qty(100, "stu-1");
        sessions.clear(100);
        assert_eq!(sessions.pending_renew(100), None);
    }
}
