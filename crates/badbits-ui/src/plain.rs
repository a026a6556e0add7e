//! Scrolling text reports for `--simple` mode.

use std::fmt::Write as _;

use badbits_core::alerts::AlertResult;
use badbits_core::formatting::{archive_stamp, seconds_until};
use badbits_core::habits::{HabitDefinition, NO_CHECKS};
use badbits_runtime::display::CycleView;

const CHECK_RULE_WIDTH: usize = 50;
const STATUS_RULE_WIDTH: usize = 40;

pub fn banner(archiving: bool) -> String {
    let storage = if archiving {
        "💾 Saving all checks to disk for review"
    } else {
        "🔒 Privacy mode: No images saved to disk"
    };
    format!("\n🚀 BadBits Monitoring Started\n{storage}\n❌ Press Ctrl+C to stop monitoring\n")
}

/// Report printed after every cycle.
pub fn cycle_report(view: &CycleView<'_>) -> String {
    let stats = view.stats;
    let checked_at = stats.last_check_time().unwrap_or(view.now);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "\n🔍 CHECK #{} at {}",
        stats.total_checks(),
        archive_stamp(checked_at)
    );
    let _ = writeln!(out, "{}", "=".repeat(CHECK_RULE_WIDTH));

    match (view.archived, view.archive_root) {
        (Some(dir), _) => {
            let _ = writeln!(out, "📁 Analysis saved to: {}", dir.display());
        }
        (None, None) => {
            let _ = writeln!(out, "🔒 Privacy mode: No data saved to disk");
        }
        (None, Some(_)) => {}
    }

    let _ = writeln!(out, "\n📊 CURRENT STATUS:");
    let _ = writeln!(out, "{}", "-".repeat(STATUS_RULE_WIDTH));
    for alert in view.alerts {
        out.push_str(&alert_line(alert, &view.habits));
    }

    let _ = writeln!(out, "\n📈 SESSION SUMMARY:");
    let _ = writeln!(
        out,
        "• Duration: {} minutes ({} checks)",
        stats.duration_minutes(view.now),
        stats.total_checks()
    );
    for habit in &view.habits {
        let _ = writeln!(
            out,
            "• {} detected: {}/{} checks ({}%)",
            habit.display_name(),
            stats.alert_count(&habit.habit_id),
            stats.total_checks(),
            stats.alert_percent(&habit.habit_id)
        );
    }

    if let Some(err) = view.error {
        let _ = writeln!(out, "\n⚠️ WARNING: {err}");
    }

    if let Some(next) = view.next_check {
        let _ = writeln!(
            out,
            "\n⏱️  Next check in {} seconds...",
            seconds_until(next, view.now)
        );
    }
    out
}

fn alert_line(alert: &AlertResult, habits: &[&HabitDefinition]) -> String {
    let habit = habits.iter().find(|h| h.habit_id == alert.habit_id);
    let (emoji, name) = match habit {
        Some(h) => (h.emoji.clone(), h.display_name()),
        None if alert.habit_id == NO_CHECKS => ("ℹ️".to_string(), "No Checks".to_string()),
        None => ("❓".to_string(), alert.habit_id.clone()),
    };
    let state = if alert.is_active { "⚠️ DETECTED" } else { "✅ OK" };

    let mut line = format!("{emoji} {name}: {state}\n");
    if let Some(details) = &alert.details {
        line.push_str(&format!("   Details: {details}\n"));
    }
    line
}

/// Final report printed when the session ends.
pub fn session_summary(view: &CycleView<'_>) -> String {
    let stats = view.stats;
    let mut out = String::new();
    let _ = writeln!(out, "\n👋 MONITORING SESSION ENDED");
    let _ = writeln!(
        out,
        "• Duration: {} minutes ({} checks)",
        stats.duration_minutes(view.now),
        stats.total_checks()
    );
    for habit in &view.habits {
        let _ = writeln!(
            out,
            "• {} detected: {}/{} checks ({}%)",
            habit.display_name(),
            stats.alert_count(&habit.habit_id),
            stats.total_checks(),
            stats.alert_percent(&habit.habit_id)
        );
    }
    if let Some(root) = view.archive_root {
        let _ = writeln!(out, "📊 Analysis data saved to: {}", root.display());
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use badbits_core::habits::HabitRegistry;
    use badbits_core::stats::SessionStats;
    use chrono::{DateTime, Duration, Local, TimeZone};
    use std::path::Path;

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 2, 3, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_banner_storage_line() {
        assert!(banner(true).contains("Saving all checks to disk"));
        assert!(banner(false).contains("Privacy mode"));
    }

    #[test]
    fn test_cycle_report_lists_alerts_and_totals() {
        let registry = HabitRegistry::load_defaults();
        let habits: Vec<_> = registry
            .enabled()
            .into_iter()
            .filter(|h| h.habit_id == "posture" || h.habit_id == "nail_biting")
            .collect();
        let t = start() + Duration::minutes(5);
        let alerts = vec![
            AlertResult::new("posture", true, t).with_details("leaning forward"),
            AlertResult::new("nail_biting", false, t),
        ];
        let stats = SessionStats::new(["posture", "nail_biting"], start()).fold(&alerts, t);
        let view = CycleView {
            habits,
            stats: &stats,
            alerts: &alerts,
            next_check: Some(t + Duration::seconds(60)),
            error: None,
            archived: None,
            archive_root: None,
            now: t,
        };

        let report = cycle_report(&view);
        assert!(report.contains("🔍 CHECK #1 at 20240203_080500"));
        assert!(report.contains("🔒 Privacy mode: No data saved to disk"));
        assert!(report.contains("Poor Posture: ⚠️ DETECTED"));
        assert!(report.contains("   Details: leaning forward"));
        assert!(report.contains("Nail Biting: ✅ OK"));
        assert!(report.contains("• Duration: 5 minutes (1 checks)"));
        assert!(report.contains("• Poor Posture detected: 1/1 checks (100%)"));
        assert!(report.contains("Next check in 60 seconds"));
        assert!(!report.contains("WARNING"));
    }

    #[test]
    fn test_cycle_report_archive_and_warning() {
        let stats = SessionStats::new(["posture"], start());
        let dir = Path::new("/data/20240203_080000");
        let view = CycleView {
            habits: vec![],
            stats: &stats,
            alerts: &[],
            next_check: None,
            error: Some("model offline"),
            archived: Some(dir),
            archive_root: Some(Path::new("/data")),
            now: start(),
        };
        let report = cycle_report(&view);
        assert!(report.contains("📁 Analysis saved to: /data/20240203_080000"));
        assert!(report.contains("⚠️ WARNING: model offline"));
    }

    #[test]
    fn test_no_checks_placeholder_line() {
        let line = alert_line(&AlertResult::no_checks(start()), &[]);
        assert!(line.starts_with("ℹ️ No Checks: ✅ OK"));
        assert!(line.contains("Details: No habit checks enabled"));
    }

    #[test]
    fn test_session_summary() {
        let stats = SessionStats::new(["posture"], start());
        let view = CycleView {
            habits: vec![],
            stats: &stats,
            alerts: &[],
            next_check: None,
            error: None,
            archived: None,
            archive_root: Some(Path::new("/data")),
            now: start() + Duration::minutes(3),
        };
        let text = session_summary(&view);
        assert!(text.contains("MONITORING SESSION ENDED"));
        assert!(text.contains("• Duration: 3 minutes (0 checks)"));
        assert!(text.contains("Analysis data saved to: /data"));
    }
}
