//! Weekly-pattern extraction from class history.
//!
//! A pattern is the set of `(weekday, time-of-day)` slots a student's
//! recent classes keep landing on. A slot only counts once it has
//! recurred; one-off timestamps never form a pattern.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};

/// A slot must occur at least this many times in the history to count
/// as part of the weekly pattern.
pub const MIN_SLOT_OCCURRENCES: usize = 2;

/// One recurring weekly slot: weekday plus wall-clock time (seconds
/// truncated).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub weekday: Weekday,
    pub time: NaiveTime,
}

impl Slot {
    /// Short human label, e.g. `Mon 18:00`.
    pub fn label(&self) -> String {
        format!("{} {}", weekday_abbrev(self.weekday), self.time.format("%H:%M"))
    }
}

fn weekday_from_monday(day: u32) -> Option<Weekday> {
    Some(match day {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        6 => Weekday::Sun,
        _ => return None,
    })
}

fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Extract the recurring weekly slots from a class history.
///
/// Returns `None` when the history is empty or no slot recurs: a
/// drifting schedule with every class at a different time yields no
/// pattern rather than a fabricated one. Slots come back ordered by
/// weekday (Monday first) then time.
pub fn weekly_pattern(history: &[DateTime<Utc>]) -> Option<Vec<Slot>> {
    if history.is_empty() {
        return None;
    }
    let mut counts: BTreeMap<(u32, NaiveTime), usize> = BTreeMap::new();
    for dt in history {
        let time = NaiveTime::from_hms_opt(dt.hour(), dt.minute(), 0)?;
        *counts
            .entry((dt.weekday().num_days_from_monday(), time))
            .or_insert(0) += 1;
    }
    let slots: Vec<Slot> = counts
        .into_iter()
        .filter(|(_, n)| *n >= MIN_SLOT_OCCURRENCES)
        .filter_map(|((day, time), _)| {
            weekday_from_monday(day).map(|weekday| Slot { weekday, time })
        })
        .collect();
    if slots.is_empty() {
        None
    } else {
        Some(slots)
    }
}

/// Render a pattern for the confirmation message, e.g.
/// `Mon 18:00, Thu 17:00`.
pub fn slots_to_text(slots: &[Slot]) -> String {
    slots
        .iter()
        .map(Slot::label)
        .collect::<Vec<_>>()
        .join(", ")
}
