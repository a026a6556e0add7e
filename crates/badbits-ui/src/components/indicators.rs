use std::collections::VecDeque;

use crate::themes::Theme;
use badbits_core::stats::CheckOutcome;
use ratatui::text::Span;

/// Current state of one habit: `! NEEDS ATTENTION` or `✓ Good`.
pub struct StatusIndicator<'a> {
    pub active: bool,
    pub theme: &'a Theme,
}

impl<'a> StatusIndicator<'a> {
    pub fn new(active: bool, theme: &'a Theme) -> Self {
        Self { active, theme }
    }

    pub fn to_span(&self) -> Span<'static> {
        if self.active {
            Span::styled("! NEEDS ATTENTION", self.theme.error)
        } else {
            Span::styled("✓ Good", self.theme.success)
        }
    }
}

/// Session marker shown at the start of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMarker {
    Live,
    Complete,
}

impl SessionMarker {
    pub fn to_span(self, theme: &Theme) -> Span<'static> {
        match self {
            SessionMarker::Live => Span::styled("● LIVE", theme.live),
            SessionMarker::Complete => Span::styled("● COMPLETE", theme.complete),
        }
    }
}

/// Per-habit history strip, oldest first: `×` detected, `·` fine, blank when
/// the habit was not checked in that cycle.
pub struct Timeline<'a> {
    pub history: &'a VecDeque<CheckOutcome>,
    pub habit_id: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Timeline<'a> {
    pub fn new(history: &'a VecDeque<CheckOutcome>, habit_id: &'a str, theme: &'a Theme) -> Self {
        Self {
            history,
            habit_id,
            theme,
        }
    }

    pub fn to_spans(&self) -> Vec<Span<'static>> {
        let mut spans = vec![Span::styled("[", self.theme.dim)];
        spans.extend(
            self.history
                .iter()
                .map(|outcome| match outcome.state_of(self.habit_id) {
                    Some(true) => Span::styled("×", self.theme.timeline_alert),
                    Some(false) => Span::styled("·", self.theme.timeline_ok),
                    None => Span::raw(" "),
                }),
        );
        spans.push(Span::styled("]", self.theme.dim));
        spans
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
