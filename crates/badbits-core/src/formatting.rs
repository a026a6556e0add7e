use chrono::{DateTime, Local};

/// Replace underscores with spaces and capitalise the first letter of every
/// word, lowering the rest.
///
/// # Examples
///
/// ```
/// use badbits_core::formatting::title_case;
///
/// assert_eq!(title_case("nail_biting"), "Nail Biting");
/// assert_eq!(title_case("Poor Posture"), "Poor Posture");
/// assert_eq!(title_case("EYE strain"), "Eye Strain");
/// ```
pub fn title_case(s: &str) -> String {
    s.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a duration in minutes as a human-readable string.
///
/// * `< 60` minutes → `"45m"`
/// * `≥ 60` minutes, no remainder → `"3h"`
/// * `≥ 60` minutes, with remainder → `"3h 45m"`
///
/// # Examples
///
/// ```
/// use badbits_core::formatting::format_minutes;
///
/// assert_eq!(format_minutes(45),  "45m");
/// assert_eq!(format_minutes(60),  "1h");
/// assert_eq!(format_minutes(225), "3h 45m");
/// assert_eq!(format_minutes(0),   "0m");
/// ```
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        let hours = minutes / 60;
        let mins = minutes % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

/// `HH:MM:SS` for a timestamp, `--:--:--` when absent.
pub fn format_clock(time: Option<DateTime<Local>>) -> String {
    match time {
        Some(t) => t.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

/// Seconds from `now` until `then`, rounded and clamped at zero.
pub fn seconds_until(then: DateTime<Local>, now: DateTime<Local>) -> i64 {
    let millis = (then - now).num_milliseconds().max(0);
    (millis + 500) / 1000
}

/// Directory-name timestamp used for archived checks: `YYYYmmdd_HHMMSS`.
pub fn archive_stamp(time: DateTime<Local>) -> String {
    time.format("%Y%m%d_%H%M%S").to_string()
}
