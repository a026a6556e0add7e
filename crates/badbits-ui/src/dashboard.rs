//! Live dashboard, built as plain `Line`s so it can be drawn by ratatui or
//! flattened to text.

use badbits_core::formatting::{format_clock, seconds_until};
use badbits_core::habits::HabitDefinition;
use badbits_runtime::display::CycleView;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::components::{
    bar_width, border, centered, rule, Header, RateBar, SessionMarker, StatusIndicator, Timeline,
};
use crate::themes::Theme;

pub const TITLE: &str = "BadBits Monitor";
pub const SUBTITLE: &str = "Posture and habit tracking";
pub const EXIT_HINT: &str = "Press Ctrl+C to exit";

const STATUS_SEP: &str = " │ ";

pub fn build_dashboard_lines(view: &CycleView<'_>, theme: &Theme, width: u16) -> Vec<Line<'static>> {
    let mut lines = Header::new(TITLE, Some(SUBTITLE), width, theme).to_lines();
    lines.push(Line::default());
    lines.push(centered(status_line(view, theme), width));
    lines.push(Line::default());

    lines.push(Line::from(Span::styled("Habit Monitoring", theme.bold)));
    lines.push(rule(width, theme));

    if view.habits.is_empty() {
        lines.push(Line::from(Span::styled("No habits being monitored", theme.dim)));
    } else if view.stats.total_checks() == 0 {
        lines.push(Line::from(Span::styled(
            "Monitoring started - waiting for first check",
            theme.dim,
        )));
    } else {
        for habit in &view.habits {
            lines.push(Line::default());
            lines.extend(habit_lines(view, habit, theme, width));
        }
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("   Start: ", theme.label),
            Span::styled(view.stats.start_time().format("%H:%M").to_string(), theme.value),
            Span::styled("  →  Now: ", theme.label),
            Span::styled(view.now.format("%H:%M").to_string(), theme.value),
        ]));
    }

    if let Some(err) = view.error {
        lines.push(Line::default());
        lines.push(rule(width, theme));
        lines.push(Line::from(Span::styled(format!("Error: {err}"), theme.error)));
        lines.push(rule(width, theme));
    }

    lines.push(Line::default());
    lines.push(border(width, theme));
    lines.push(centered(Line::from(Span::styled(EXIT_HINT, theme.dim)), width));
    lines.push(border(width, theme));
    lines
}

fn status_line(view: &CycleView<'_>, theme: &Theme) -> Line<'static> {
    let next = match view.next_check {
        Some(at) => format!(
            "{} ({}s)",
            format_clock(Some(at)),
            seconds_until(at, view.now)
        ),
        None => format_clock(None),
    };

    let fields = [
        ("Session: ", format!("{}m", view.stats.duration_minutes(view.now))),
        ("Checks: ", view.stats.total_checks().to_string()),
        ("Now: ", format_clock(Some(view.now))),
        ("Last: ", format_clock(view.stats.last_check_time())),
        ("Next: ", next),
    ];

    let mut spans = vec![SessionMarker::Live.to_span(theme)];
    for (label, value) in fields {
        spans.push(Span::styled(STATUS_SEP, theme.separator));
        spans.push(Span::styled(label, theme.label));
        spans.push(Span::styled(value, theme.value));
    }
    Line::from(spans)
}

fn habit_lines(
    view: &CycleView<'_>,
    habit: &HabitDefinition,
    theme: &Theme,
    width: u16,
) -> Vec<Line<'static>> {
    let active = view
        .alerts
        .iter()
        .any(|a| a.habit_id == habit.habit_id && a.is_active);
    let percent = view.stats.alert_percent(&habit.habit_id);

    let mut rate = vec![
        Span::styled("   Session issues: ", theme.label),
        Span::styled(format!("{percent:2}% "), theme.rate_style(percent)),
    ];
    rate.extend(RateBar::new(percent, bar_width(width), theme).to_spans());

    let mut history = vec![Span::styled("   History: ", theme.label)];
    history.extend(Timeline::new(view.stats.history(), &habit.habit_id, theme).to_spans());
    history.push(Span::styled(" (oldest → newest)", theme.dim));

    vec![
        Line::from(vec![
            Span::raw(format!("{}  ", habit.emoji)),
            Span::styled(habit.display_name(), theme.bold),
            Span::raw("  "),
            StatusIndicator::new(active, theme).to_span(),
        ]),
        Line::from(rate),
        Line::from(history),
    ]
}

pub fn render_dashboard(frame: &mut Frame, area: Rect, view: &CycleView<'_>, theme: &Theme) {
    let lines = build_dashboard_lines(view, theme, area.width);
    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

/// Flatten lines to text, one line per row, styles dropped.
pub fn lines_to_string(lines: &[Line<'_>]) -> String {
    lines
        .iter()
        .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use badbits_core::alerts::AlertResult;
    use badbits_core::habits::HabitRegistry;
    use badbits_core::stats::SessionStats;
    use chrono::{DateTime, Duration, Local, TimeZone};
    use ratatui::{backend::TestBackend, Terminal};

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn view<'a>(
        habits: Vec<&'a HabitDefinition>,
        stats: &'a SessionStats,
        alerts: &'a [AlertResult],
        error: Option<&'a str>,
        now: DateTime<Local>,
    ) -> CycleView<'a> {
        CycleView {
            habits,
            stats,
            alerts,
            next_check: Some(now + Duration::seconds(45)),
            error,
            archived: None,
            archive_root: None,
            now,
        }
    }

    fn registry() -> HabitRegistry {
        let mut registry = HabitRegistry::load_defaults();
        registry.enable("eye_strain", false);
        registry.enable("screen_break", false);
        registry
    }

    // ── empty states ──────────────────────────────────────────────────────

    #[test]
    fn test_no_habits_message() {
        let stats = SessionStats::new(Vec::<String>::new(), start());
        let text = lines_to_string(&build_dashboard_lines(
            &view(vec![], &stats, &[], None, start()),
            &Theme::dark(),
            80,
        ));
        assert!(text.contains("No habits being monitored"));
        assert!(!text.contains("waiting for first check"));
    }

    #[test]
    fn test_waiting_for_first_check() {
        let registry = registry();
        let stats = SessionStats::new(["posture", "nail_biting"], start());
        let text = lines_to_string(&build_dashboard_lines(
            &view(registry.enabled(), &stats, &[], None, start()),
            &Theme::dark(),
            80,
        ));
        assert!(text.contains("Monitoring started - waiting for first check"));
        assert!(text.contains("Last: --:--:--"));
        assert!(text.contains("Next: 09:00:45 (45s)"));
    }

    // ── populated ─────────────────────────────────────────────────────────

    #[test]
    fn test_habit_rows_after_checks() {
        let registry = registry();
        let t1 = start() + Duration::minutes(1);
        let t2 = start() + Duration::minutes(2);
        let stats = SessionStats::new(["posture", "nail_biting"], start())
            .fold(
                &[
                    AlertResult::new("posture", true, t1),
                    AlertResult::new("nail_biting", false, t1),
                ],
                t1,
            )
            .fold(
                &[
                    AlertResult::new("posture", false, t2),
                    AlertResult::new("nail_biting", false, t2),
                ],
                t2,
            );
        let alerts = [
            AlertResult::new("posture", false, t2),
            AlertResult::new("nail_biting", false, t2),
        ];
        let lines = build_dashboard_lines(
            &view(registry.enabled(), &stats, &alerts, None, t2),
            &Theme::dark(),
            80,
        );
        let text = lines_to_string(&lines);

        assert!(text.contains("● LIVE │ Session: 2m │ Checks: 2 │ Now: 09:02:00 │ Last: 09:02:00"));
        assert!(text.contains("Poor Posture  ✓ Good"));
        assert!(text.contains("Session issues: 50% [■■■■■■■■■■■■·············]"));
        assert!(text.contains("History: [×·] (oldest → newest)"));
        assert!(text.contains("Session issues:  0% ["));
        assert!(text.contains("Start: 09:00  →  Now: 09:02"));
        assert!(text.contains("Press Ctrl+C to exit"));
    }

    #[test]
    fn test_active_habit_needs_attention() {
        let registry = registry();
        let t1 = start() + Duration::minutes(1);
        let alerts = [AlertResult::new("posture", true, t1)];
        let stats = SessionStats::new(["posture", "nail_biting"], start()).fold(&alerts, t1);
        let text = lines_to_string(&build_dashboard_lines(
            &view(registry.enabled(), &stats, &alerts, None, t1),
            &Theme::dark(),
            80,
        ));
        assert!(text.contains("Poor Posture  ! NEEDS ATTENTION"));
        assert!(text.contains("Nail Biting  ✓ Good"));
    }

    #[test]
    fn test_error_block() {
        let stats = SessionStats::new(["posture"], start());
        let text = lines_to_string(&build_dashboard_lines(
            &view(vec![], &stats, &[], Some("camera unplugged"), start()),
            &Theme::dark(),
            60,
        ));
        assert!(text.contains("Error: camera unplugged"));
    }

    #[test]
    fn test_borders_follow_width() {
        let stats = SessionStats::new(["posture"], start());
        let lines = build_dashboard_lines(
            &view(vec![], &stats, &[], None, start()),
            &Theme::dark(),
            33,
        );
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first.chars().count(), 33);
    }

    #[test]
    fn test_renders_into_terminal_buffer() {
        let registry = registry();
        let stats = SessionStats::new(["posture", "nail_biting"], start());
        let backend = TestBackend::new(80, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_dashboard(
                    frame,
                    area,
                    &view(registry.enabled(), &stats, &[], None, start()),
                    &Theme::dark(),
                );
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let row: String = (0..80u16)
            .map(|x| buffer[(x, 1u16)].symbol().to_string())
            .collect();
        assert!(row.contains("BadBits Monitor"));
    }
}
