//! The structured callback grammar carried in button payloads.
//!
//! Four families, colon-separated:
//! ```text
//! stu:<VERB>:<student_id>          student submenu actions
//! cls:<VERB>:<student_id>:<iso>    class instance selection
//! log:<VERB>:<student_id>:<iso>    status choice for a selected class
//! cfm:<VERB>:<student_id>:<payload>  confirmation steps
//! ```
//! Student ids never contain a colon; the trailing field may (ISO
//! timestamps do). Parsing is closed over the known verbs: anything
//! else is malformed and dropped by the dispatcher.

/// Actions on the student submenu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentVerb {
    Log,
    Cancel,
    Resched,
    Renew,
    RenewSame,
    RenewEnter,
    Length,
    Edit,
    FreeCredit,
    Pause,
    Remove,
    View,
    Adhoc,
}

impl StudentVerb {
    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "LOG" => Self::Log,
            "CANCEL" => Self::Cancel,
            "RESHED" => Self::Resched,
            "RENEW" => Self::Renew,
            "RENEW_SAME" => Self::RenewSame,
            "RENEW_ENTER" => Self::RenewEnter,
            "LENGTH" => Self::Length,
            "EDIT" => Self::Edit,
            "FREECREDIT" => Self::FreeCredit,
            "PAUSE" => Self::Pause,
            "REMOVE" => Self::Remove,
            "VIEW" => Self::View,
            "ADHOC" => Self::Adhoc,
            _ => return None,
        })
    }
}

/// Which lifecycle flow a class instance was selected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassVerb {
    Log,
    Cancel,
    Resched,
}

impl ClassVerb {
    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "LOG" => Self::Log,
            "CANCEL" => Self::Cancel,
            "RESHED" => Self::Resched,
            _ => return None,
        })
    }
}

/// Status choice from the Log menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogVerb {
    Complete,
    CancelEarly,
    CancelLate,
    Rescheduled,
    Unlog,
}

impl LogVerb {
    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "COMPLETE" => Self::Complete,
            "CANCEL_EARLY" => Self::CancelEarly,
            "CANCEL_LATE" => Self::CancelLate,
            "RESCHEDULED" => Self::Rescheduled,
            "UNLOG" => Self::Unlog,
            _ => return None,
        })
    }
}

/// How the new time is derived in a reschedule confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReschedTarget {
    PlusOneHour,
    Tomorrow,
    /// No recognized offset in the payload; the class keeps its time.
    Unchanged,
}

/// A parsed confirmation callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    Cancel {
        student_id: String,
        iso: String,
    },
    Resched {
        student_id: String,
        iso: String,
        target: ReschedTarget,
    },
    Renew {
        student_id: String,
        qty: u32,
    },
    Remove {
        student_id: String,
    },
}

/// Any parsed button callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Student {
        verb: StudentVerb,
        student_id: String,
    },
    Class {
        verb: ClassVerb,
        student_id: String,
        iso: String,
    },
    Log {
        verb: LogVerb,
        student_id: String,
        iso: String,
    },
    Confirm(ConfirmAction),
}

fn split_id_and_rest(rest: &str) -> Option<(&str, &str)> {
    let (id, tail) = rest.split_once(':')?;
    if id.is_empty() || tail.is_empty() {
        return None;
    }
    Some((id, tail))
}

impl Callback {
    /// Parse a callback payload. `None` means malformed or unknown.
    pub fn parse(data: &str) -> Option<Self> {
        let (family, rest) = data.split_once(':')?;
        match family {
            "stu" => {
                let (verb, id) = rest.split_once(':')?;
                if id.is_empty() || id.contains(':') {
                    return None;
                }
                Some(Callback::Student {
                    verb: StudentVerb::from_tag(verb)?,
                    student_id: id.to_string(),
                })
            }
            "cls" => {
                let (verb, rest) = rest.split_once(':')?;
                let (id, iso) = split_id_and_rest(rest)?;
                Some(Callback::Class {
                    verb: ClassVerb::from_tag(verb)?,
                    student_id: id.to_string(),
                    iso: iso.to_string(),
                })
            }
            "log" => {
                let (verb, rest) = rest.split_once(':')?;
                let (id, iso) = split_id_and_rest(rest)?;
                Some(Callback::Log {
                    verb: LogVerb::from_tag(verb)?,
                    student_id: id.to_string(),
                    iso: iso.to_string(),
                })
            }
            "cfm" => {
                let (verb, rest) = rest.split_once(':')?;
                let action = match verb {
                    "CANCEL" => {
                        let (id, iso) = split_id_and_rest(rest)?;
                        ConfirmAction::Cancel {
                            student_id: id.to_string(),
                            iso: iso.to_string(),
                        }
                    }
                    "RESHED" => {
                        let (id, payload) = split_id_and_rest(rest)?;
                        let (iso, extra) = match payload.split_once('|') {
                            Some((iso, extra)) => (iso, extra),
                            None => (payload, ""),
                        };
                        let target = match extra.strip_prefix("AUTO:") {
                            Some("+1h") => ReschedTarget::PlusOneHour,
                            Some("tomorrow") => ReschedTarget::Tomorrow,
                            _ => ReschedTarget::Unchanged,
                        };
                        ConfirmAction::Resched {
                            student_id: id.to_string(),
                            iso: iso.to_string(),
                            target,
                        }
                    }
                    "RENEW" => {
                        let (id, qty) = split_id_and_rest(rest)?;
                        ConfirmAction::Renew {
                            student_id: id.to_string(),
                            qty: qty.parse().ok()?,
                        }
                    }
                    "REMOVE" => {
                        if rest.is_empty() || rest.contains(':') {
                            return None;
                        }
                        ConfirmAction::Remove {
                            student_id: rest.to_string(),
                        }
                    }
                    _ => return None,
                };
                Some(Callback::Confirm(action))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_actions() {
        assert_eq!(
            Callback::parse("stu:RENEW:17"),
            Some(Callback::Student {
                verb: StudentVerb::Renew,
                student_id: "17".into(),
            })
        );
        assert_eq!(
            Callback::parse("stu:RENEW_SAME:john_doe"),
            Some(Callback::Student {
                verb: StudentVerb::RenewSame,
                student_id: "john_doe".into(),
            })
        );
    }

    #[test]
    fn test_class_selection_keeps_iso_colons() {
        let parsed = Callback::parse("cls:LOG:1:2025-01-06T18:00:00+00:00");
        assert_eq!(
            parsed,
            Some(Callback::Class {
                verb: ClassVerb::Log,
                student_id: "1".into(),
                iso: "2025-01-06T18:00:00+00:00".into(),
            })
        );
    }

    #[test]
    fn test_resched_confirmation_offsets() {
        let plus = Callback::parse("cfm:RESHED:1:2025-01-06T18:00:00|AUTO:+1h");
        assert_eq!(
            plus,
            Some(Callback::Confirm(ConfirmAction::Resched {
                student_id: "1".into(),
                iso: "2025-01-06T18:00:00".into(),
                target: ReschedTarget::PlusOneHour,
            }))
        );
        let tomorrow = Callback::parse("cfm:RESHED:1:2025-01-06T18:00:00|AUTO:tomorrow");
        assert!(matches!(
            tomorrow,
            Some(Callback::Confirm(ConfirmAction::Resched {
                target: ReschedTarget::Tomorrow,
                ..
            }))
        ));
        let bare = Callback::parse("cfm:RESHED:1:2025-01-06T18:00:00");
        assert!(matches!(
            bare,
            Some(Callback::Confirm(ConfirmAction::Resched {
                target: ReschedTarget::Unchanged,
                ..
            }))
        ));
    }

    #[test]
    fn test_renew_confirmation_qty() {
        assert_eq!(
            Callback::parse("cfm:RENEW:1:8"),
            Some(Callback::Confirm(ConfirmAction::Renew {
                student_id: "1".into(),
                qty: 8,
            }))
        );
        assert_eq!(Callback::parse("cfm:RENEW:1:eight"), None);
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        assert_eq!(Callback::parse(""), None);
        assert_eq!(Callback::parse("stu:RENEW"), None);
        assert_eq!(Callback::parse("stu:BOGUS:1"), None);
        assert_eq!(Callback::parse("stu:VIEW:"), None);
        assert_eq!(Callback::parse("stu:VIEW:a:b"), None);
        assert_eq!(Callback::parse("cls:LOG:1"), None);
        assert_eq!(Callback::parse("cfm:UNKNOWN:1:x"), None);
        assert_eq!(Callback::parse("menu:main"), None);
    }
}
