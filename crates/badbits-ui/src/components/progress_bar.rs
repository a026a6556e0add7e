use crate::themes::Theme;
use ratatui::text::Span;

pub const FILLED: &str = "■";
pub const EMPTY: &str = "·";

const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 25;
/// Columns taken by the label and percentage around the bar.
const BAR_RESERVED: usize = 40;

/// Bar width for a terminal `width` columns wide: whatever is left after the
/// label, capped at 25 and never below 10.
pub fn bar_width(width: u16) -> usize {
    (width as usize)
        .saturating_sub(BAR_RESERVED)
        .min(MAX_BAR_WIDTH)
        .max(MIN_BAR_WIDTH)
}

/// `[■■■■······]` bar for a session alert rate.
pub struct RateBar<'a> {
    pub percent: u64,
    pub width: usize,
    pub theme: &'a Theme,
}

impl<'a> RateBar<'a> {
    pub fn new(percent: u64, width: usize, theme: &'a Theme) -> Self {
        Self {
            percent: percent.min(100),
            width,
            theme,
        }
    }

    pub fn filled(&self) -> usize {
        (self.percent as usize * self.width) / 100
    }

    pub fn to_spans(&self) -> Vec<Span<'static>> {
        let filled = self.filled();
        let empty = self.width - filled;
        vec![
            Span::styled("[", self.theme.dim),
            Span::styled(FILLED.repeat(filled), self.theme.rate_style(self.percent)),
            Span::styled(EMPTY.repeat(empty), self.theme.bar_empty),
            Span::styled("]", self.theme.dim),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
