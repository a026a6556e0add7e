//! Terminal front-ends for the check engine.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use badbits_core::error::Result;
use badbits_runtime::display::{CycleDisplay, CycleView};
use crossterm::{
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::debug;

use crate::dashboard::{lines_to_string, render_dashboard};
use crate::plain;
use crate::summary::build_summary_lines;
use crate::themes::Theme;

const REFRESH_INTERVAL: Duration = Duration::from_secs(1);
const FALLBACK_WIDTH: u16 = 80;

// ── DashboardDisplay ──────────────────────────────────────────────────────────

/// Full-screen dashboard on the alternate screen, redrawn every second.
///
/// Raw mode stays off so Ctrl+C still reaches the process as SIGINT.
pub struct DashboardDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    theme: Theme,
    active: bool,
}

impl DashboardDisplay {
    pub fn enter(theme: Theme) -> Result<Self> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        Ok(Self {
            terminal,
            theme,
            active: true,
        })
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }
}

impl CycleDisplay for DashboardDisplay {
    fn show(&mut self, view: &CycleView<'_>) -> Result<()> {
        let theme = &self.theme;
        self.terminal.draw(|frame| {
            let area = frame.area();
            render_dashboard(frame, area, view, theme);
        })?;
        Ok(())
    }

    fn finish(&mut self, view: &CycleView<'_>) -> Result<()> {
        self.restore()?;
        let width = terminal::size().map(|(w, _)| w).unwrap_or(FALLBACK_WIDTH);
        let summary = lines_to_string(&build_summary_lines(view, &self.theme, width));
        let mut stdout = io::stdout();
        writeln!(stdout, "{summary}")?;
        stdout.flush()?;
        Ok(())
    }

    fn refresh_interval(&self) -> Option<Duration> {
        Some(REFRESH_INTERVAL)
    }
}

impl Drop for DashboardDisplay {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            debug!(error = %e, "failed to restore terminal");
        }
    }
}

// ── PlainDisplay ──────────────────────────────────────────────────────────────

/// Scrolling text output, one report per cycle.
pub struct PlainDisplay<W> {
    out: W,
    started: bool,
}

impl PlainDisplay<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> PlainDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            started: false,
        }
    }
}

impl<W: Write> CycleDisplay for PlainDisplay<W> {
    fn show(&mut self, view: &CycleView<'_>) -> Result<()> {
        let first = !self.started;
        self.started = true;
        let text = if first && view.stats.total_checks() == 0 && view.error.is_none() {
            plain::banner(view.archive_root.is_some())
        } else {
            plain::cycle_report(view)
        };
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self, view: &CycleView<'_>) -> Result<()> {
        self.out.write_all(plain::session_summary(view).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
