//! Date parsing and formatting helpers.
//!
//! Due dates arrive as `YYYY-MM-DD` strings, sometimes with a `T...` time suffix
//! appended by the store. They are always read as plain calendar dates so that a
//! date never shifts by a day because of the host's UTC offset.

use chrono::{Datelike, Duration, Local, NaiveDate};

/// Returned by [`days_until`] when there is no due date.
pub const NO_DUE_DATE_DAYS: i64 = 999;

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse the `YYYY-MM-DD` prefix of a date string into a calendar date.
///
/// The year, month and day are split out and parsed as integers; no timezone
/// conversion is involved.
pub fn parse_local_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.trim().split('T').next()?;
    let parts: Vec<&str> = date_part.split('-').collect();
    if parts.len() != 3 {
        return None;
    }
    let year = parts[0].trim().parse::<i32>().ok()?;
    let month = parts[1].trim().parse::<u32>().ok()?;
    let day = parts[2].trim().parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Short display form ("Mar 5") of a stored date.
///
/// Empty input gives an empty string; input that is not a three-part date is
/// returned unchanged.
pub fn format_date(s: Option<&str>) -> String {
    let Some(s) = s.filter(|s| !s.is_empty()) else {
        return String::new();
    };
    match parse_local_date(s) {
        Some(d) => format_short(d),
        None => s.to_string(),
    }
}

/// Short display form of a calendar date.
pub fn format_short(d: NaiveDate) -> String {
    d.format("%b %-d").to_string()
}

/// The `YYYY-MM-DD` part of a stored date, for prefilling input fields.
pub fn to_input_date(s: Option<&str>) -> String {
    match s {
        Some(s) if !s.is_empty() => s.split('T').next().unwrap_or_default().to_string(),
        _ => String::new(),
    }
}

/// `d` shifted by `n` days, `None` when the result is outside chrono's date range.
pub fn add_days(d: NaiveDate, n: i64) -> Option<NaiveDate> {
    d.checked_add_signed(Duration::try_days(n)?)
}

/// Storage form of a calendar date.
pub fn to_storage(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Calendar days from today to the due date. Missing dates give [`NO_DUE_DATE_DAYS`].
pub fn days_until(s: Option<&str>) -> i64 {
    days_until_from(s, today())
}

/// [`days_until`] against an explicit "today".
///
/// Dates that cannot be parsed are treated like a missing date.
pub fn days_until_from(s: Option<&str>, today: NaiveDate) -> i64 {
    match s.filter(|s| !s.is_empty()).and_then(parse_local_date) {
        Some(due) => (due - today).num_days(),
        None => NO_DUE_DATE_DAYS,
    }
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "next monday", "this friday", "fri", etc.
/// - "this weekend", "end of week", "end of month"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    parse_due_input_from(s, today())
}

/// [`parse_due_input`] against an explicit "today".
pub fn parse_due_input_from(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        "this weekend" | "weekend" => {
            let days_until_saturday = (5 + 7 - today.weekday().num_days_from_monday() as i64) % 7;
            return Some(today + Duration::days(days_until_saturday));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some((idx, unit)) = rest.char_indices().last() {
            if let Ok(n) = rest[..idx].trim().parse::<i64>() {
                let factor = match unit {
                    'd' => Some(1),
                    'w' => Some(7),
                    // Approximate: 30 days per month
                    'm' => Some(30),
                    _ => None,
                };
                if let Some(factor) = factor {
                    return n.checked_mul(factor).and_then(|days| add_days(today, days));
                }
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current = today.weekday().num_days_from_monday() as i64;
    for (name, target) in weekdays {
        let days_ahead = (target + 7 - current) % 7;
        if s == name || s == format!("this {name}") {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {name}") {
            let add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(add));
        }
    }

    parse_local_date(&s)
}

/// Start and end of the ISO week (Monday to Sunday) containing `today`.
pub fn start_end_of_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<&str>, today: NaiveDate) -> String {
    let Some(d) = due.and_then(parse_local_date) else {
        return "-".into();
    };
    match (d - today).num_days() {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}
