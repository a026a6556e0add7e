use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
}

/// Read the background from `COLORFGBG` (`"fg;bg"`). Background colours 0–6
/// count as dark; anything unparseable is treated as dark.
pub fn detect_background() -> BackgroundType {
    background_from(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_from(colorfgbg: Option<&str>) -> BackgroundType {
    let bg = colorfgbg
        .and_then(|v| v.split(';').next_back())
        .and_then(|bg| bg.parse::<u8>().ok());
    match bg {
        Some(n) if n > 6 => BackgroundType::Light,
        _ => BackgroundType::Dark,
    }
}

/// Styles used by the dashboard, summary and components.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Frame ────────────────────────────────────────────────────────────────
    pub header: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub bold: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub live: Style,
    pub complete: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Bars & timeline ──────────────────────────────────────────────────────
    pub bar_empty: Style,
    pub timeline_ok: Style,
    pub timeline_alert: Style,
}

impl Theme {
    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            live: Style::default().fg(Color::Green),
            complete: Style::default().fg(Color::Red),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            bar_empty: Style::default().fg(Color::DarkGray),
            timeline_ok: Style::default().fg(Color::Green),
            timeline_alert: Style::default().fg(Color::Red),
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            bold: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            live: Style::default().fg(Color::Green),
            complete: Style::default().fg(Color::Red),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Magenta),
            error: Style::default().fg(Color::Red),

            bar_empty: Style::default().fg(Color::Gray),
            timeline_ok: Style::default().fg(Color::Green),
            timeline_alert: Style::default().fg(Color::Red),
        }
    }

    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            BackgroundType::Dark => Self::dark(),
        }
    }

    /// Colour for a session alert rate.
    ///
    /// * `> 50 %` → `error`
    /// * `> 25 %` → `warning`
    /// * otherwise → `success`
    pub fn rate_style(&self, percent: u64) -> Style {
        if percent > 50 {
            self.error
        } else if percent > 25 {
            self.warning
        } else {
            self.success
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
