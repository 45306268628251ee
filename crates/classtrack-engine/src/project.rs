//! Forward projection of a weekly pattern into concrete class instances.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::pattern::Slot;

/// Project the next `count` class instances from a weekly pattern,
/// strictly after `anchor`.
///
/// Walks forward day by day, emitting every pattern slot that falls on
/// each date, so the result is chronological and an anchor that sits
/// exactly on a slot is excluded. The walk is bounded: even a
/// degenerate pattern cannot loop forever.
pub fn project_from_pattern(
    anchor: DateTime<Utc>,
    pattern: &[Slot],
    count: u32,
) -> Vec<DateTime<Utc>> {
    let mut out = Vec::with_capacity(count as usize);
    if pattern.is_empty() || count == 0 {
        return out;
    }
    // Enough days to seat `count` instances even from a one-slot
    // pattern, plus slack for the partial first week.
    let horizon_days = 7 * count as i64 + 14;
    for offset in 0..=horizon_days {
        let date = anchor.date_naive() + Duration::days(offset);
        for slot in pattern.iter().filter(|s| s.weekday == date.weekday()) {
            let candidate = Utc.from_utc_datetime(&date.and_time(slot.time));
            if candidate > anchor {
                out.push(candidate);
                if out.len() == count as usize {
                    return out;
                }
            }
        }
    }
    out
}
