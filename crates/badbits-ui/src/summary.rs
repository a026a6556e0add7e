//! End-of-session summary shown after the dashboard closes.

use badbits_core::formatting::format_clock;
use badbits_runtime::display::CycleView;
use ratatui::text::{Line, Span};

use crate::components::{border, centered, rule, Header, SessionMarker};
use crate::themes::Theme;

pub const SUMMARY_TITLE: &str = "BadBits Monitor - Session Complete";
pub const FAREWELL: &str = "Thanks for using BadBits!";

pub fn build_summary_lines(view: &CycleView<'_>, theme: &Theme, width: u16) -> Vec<Line<'static>> {
    let stats = view.stats;
    let total = stats.total_checks();

    let mut lines = Header::new(SUMMARY_TITLE, None, width, theme).to_lines();
    lines.push(Line::default());
    lines.push(centered(
        Line::from(vec![
            SessionMarker::Complete.to_span(theme),
            Span::styled(" │ Session: ", theme.label),
            Span::styled(format!("{}m", stats.duration_minutes(view.now)), theme.value),
            Span::styled(" │ Checks: ", theme.label),
            Span::styled(total.to_string(), theme.value),
            Span::styled(" │ End time: ", theme.label),
            Span::styled(format_clock(Some(view.now)), theme.value),
        ]),
        width,
    ));
    lines.push(Line::default());

    lines.push(Line::from(Span::styled("Session Summary", theme.bold)));
    lines.push(rule(width, theme));
    for habit in &view.habits {
        let count = stats.alert_count(&habit.habit_id);
        let percent = stats.alert_percent(&habit.habit_id);
        lines.push(Line::from(vec![
            Span::raw(format!("{}  ", habit.emoji)),
            Span::styled(habit.display_name(), theme.bold),
            Span::styled(format!(": {count}/{total} checks "), theme.text),
            Span::styled(format!("({percent}%)"), theme.rate_style(percent)),
        ]));
    }

    if let Some(root) = view.archive_root {
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::raw("📊 "),
            Span::styled("Analysis data saved to: ", theme.label),
            Span::styled(root.display().to_string(), theme.value),
        ]));
    }

    lines.push(Line::default());
    lines.push(border(width, theme));
    lines.push(centered(Line::from(Span::styled(FAREWELL, theme.bold)), width));
    lines.push(border(width, theme));
    lines
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::lines_to_string;
    use badbits_core::alerts::AlertResult;
    use badbits_core::habits::HabitRegistry;
    use badbits_core::stats::SessionStats;
    use chrono::{DateTime, Duration, Local, TimeZone};
    use std::path::Path;

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_summary_counts_and_archive() {
        let registry = HabitRegistry::load_defaults();
        let habits: Vec<_> = registry
            .enabled()
            .into_iter()
            .filter(|h| h.habit_id == "posture")
            .collect();
        let end = start() + Duration::minutes(12);
        let stats = SessionStats::new(["posture"], start())
            .fold(&[AlertResult::new("posture", true, end)], end)
            .fold(&[AlertResult::new("posture", false, end)], end)
            .fold(&[AlertResult::new("posture", false, end)], end);
        let root = Path::new("/tmp/posture_analysis");
        let view = CycleView {
            habits,
            stats: &stats,
            alerts: &[],
            next_check: None,
            error: None,
            archived: None,
            archive_root: Some(root),
            now: end,
        };

        let text = lines_to_string(&build_summary_lines(&view, &Theme::dark(), 80));
        assert!(text.contains(SUMMARY_TITLE));
        assert!(text.contains("● COMPLETE │ Session: 12m │ Checks: 3 │ End time: 14:12:00"));
        assert!(text.contains("Poor Posture: 1/3 checks (33%)"));
        assert!(text.contains("Analysis data saved to: /tmp/posture_analysis"));
        assert!(text.contains(FAREWELL));
    }

    #[test]
    fn test_summary_without_archive() {
        let stats = SessionStats::new(["posture"], start());
        let view = CycleView {
            habits: vec![],
            stats: &stats,
            alerts: &[],
            next_check: None,
            error: None,
            archived: None,
            archive_root: None,
            now: start(),
        };
        let text = lines_to_string(&build_summary_lines(&view, &Theme::dark(), 60));
        assert!(!text.contains("Analysis data saved"));
        assert!(text.contains("Checks: 0"));
    }
}
