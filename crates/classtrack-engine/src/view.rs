//! Message and keyboard builders shared by the workflows.

use classtrack_core::types::parse_iso_utc;
use classtrack_core::{Button, Keyboard, Render, StudentRecord};

pub const STUDENT_NOT_FOUND_MSG: &str =
    "❌ This student was not found. They may have been removed or renamed.";
pub const NO_PATTERN_MSG: &str = "No prior weekly pattern found. Set a weekly schedule first.";
pub const RENEW_NOT_READY_MSG: &str = "Renewal is available only after the current set finishes.";

/// The single Back button returning to a student's detail view.
pub fn back_keyboard(student_id: &str) -> Keyboard {
    Keyboard::new().button("⬅ Back", format!("stu:VIEW:{student_id}"))
}

/// Short button label for a class instance, e.g. `Mon 09 Sep 17:00`.
/// Falls back to the raw string when the timestamp does not parse.
pub fn fmt_class_label(iso: &str) -> String {
    match parse_iso_utc(iso) {
        Some(dt) => dt.format("%a %d %b %H:%M").to_string(),
        None => iso.to_string(),
    }
}

/// The student action submenu, two buttons per row.
pub fn student_submenu(student_id: &str) -> Keyboard {
    Keyboard::new()
        .row(vec![
            Button::new("✅ Log Class", format!("stu:LOG:{student_id}")),
            Button::new("❌ Cancel Class", format!("stu:CANCEL:{student_id}")),
        ])
        .row(vec![
            Button::new("🔄 Reschedule Class", format!("stu:RESHED:{student_id}")),
            Button::new("💰 Renew Plan", format!("stu:RENEW:{student_id}")),
        ])
        .row(vec![
            Button::new("⏱ Change Class Length", format!("stu:LENGTH:{student_id}")),
            Button::new("📅 Edit Weekly Schedule", format!("stu:EDIT:{student_id}")),
        ])
        .row(vec![
            Button::new("🎁 Award Free Credit", format!("stu:FREECREDIT:{student_id}")),
            Button::new("⏸ Pause / Resume", format!("stu:PAUSE:{student_id}")),
        ])
        .row(vec![
            Button::new("🗑 Remove Student", format!("stu:REMOVE:{student_id}")),
            Button::new("👁 View Student", format!("stu:VIEW:{student_id}")),
        ])
        .row(vec![Button::new(
            "➕ Ad-hoc Class",
            format!("stu:ADHOC:{student_id}"),
        )])
}

/// Display name for messages: the record name, or the id when empty.
pub fn display_name<'a>(student_id: &'a str, student: &'a StudentRecord) -> &'a str {
    if student.name.is_empty() {
        student_id
    } else {
        &student.name
    }
}

/// Detailed summary plus the action submenu.
pub fn student_detail(student_id: &str, student: &StudentRecord) -> Render {
    let mut lines = vec![
        format!("Student: {}", display_name(student_id, student)),
        format!("Classes remaining: {}", student.classes_remaining),
    ];

    // Next three scheduled instances.
    let mut dates = student.class_dates.clone();
    dates.sort();
    if dates.is_empty() {
        lines.push("No upcoming classes".to_string());
    } else {
        lines.push("Upcoming classes:".to_string());
        for dt in dates.iter().take(3) {
            lines.push(format!(" - {dt}"));
        }
    }

    lines.push(format!(
        "Paused: {}",
        if student.paused { "Yes" } else { "No" }
    ));

    Render::with_keyboard(lines.join("\n"), student_submenu(student_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_view_text() {
        let stu = StudentRecord {
            name: "Alice".into(),
            class_dates: vec![
                "2025-03-03T10:00:00+00:00".into(),
                "2025-02-24T10:00:00+00:00".into(),
                "2025-03-10T10:00:00+00:00".into(),
                "2025-03-17T10:00:00+00:00".into(),
            ],
            classes_remaining: 4,
            ..Default::default()
        };
        let render = student_detail("1", &stu);
        let lines: Vec<&str> = render.text.lines().collect();
        assert_eq!(lines[0], "Student: Alice");
        assert_eq!(lines[1], "Classes remaining: 4");
        assert_eq!(lines[2], "Upcoming classes:");
        // Sorted, capped at three.
        assert_eq!(lines[3], " - 2025-02-24T10:00:00+00:00");
        assert_eq!(lines[5], " - 2025-03-10T10:00:00+00:00");
        assert_eq!(lines[6], "Paused: No");
        assert!(render.keyboard.is_some());
    }

    #[test]
    fn test_detail_view_empty_schedule() {
        let stu = StudentRecord {
            paused: true,
            ..Default::default()
        };
        let render = student_detail("ghost", &stu);
        assert!(render.text.contains("Student: ghost"));
        assert!(render.text.contains("No upcoming classes"));
        assert!(render.text.contains("Paused: Yes"));
    }

    #[test]
    fn test_submenu_callbacks() {
        let kb = student_submenu("7");
        let callbacks: Vec<&str> = kb
            .rows
            .iter()
            .flatten()
            .map(|b| b.callback.as_str())
            .collect();
        assert!(callbacks.contains(&"stu:LOG:7"));
        assert!(callbacks.contains(&"stu:RENEW:7"));
        assert!(callbacks.contains(&"stu:ADHOC:7"));
        assert_eq!(callbacks.len(), 11);
    }

    #[test]
    fn test_class_label() {
        assert_eq!(fmt_class_label("2024-09-09T17:00:00+00:00"), "Mon 09 Sep 17:00");
        assert_eq!(fmt_class_label("garbage"), "garbage");
    }
}
