//! Seams between the engine and whatever shows its progress.

use std::path::Path;
use std::time::Duration;

use badbits_core::alerts::AlertResult;
use badbits_core::error::Result;
use badbits_core::habits::HabitDefinition;
use badbits_core::stats::SessionStats;
use chrono::{DateTime, Local};
use image::RgbImage;

/// Everything a display needs to draw one frame of the session.
#[derive(Debug, Clone)]
pub struct CycleView<'a> {
    /// Enabled habits, in registry order.
    pub habits: Vec<&'a HabitDefinition>,
    pub stats: &'a SessionStats,
    /// Results of the most recent successful cycle.
    pub alerts: &'a [AlertResult],
    pub next_check: Option<DateTime<Local>>,
    /// Failure of the most recent cycle, if it failed.
    pub error: Option<&'a str>,
    /// Where the most recent cycle was archived.
    pub archived: Option<&'a Path>,
    /// Archive root when `--track` is on.
    pub archive_root: Option<&'a Path>,
    pub now: DateTime<Local>,
}

pub trait CycleDisplay {
    /// Draw the state after a cycle (or before the first one).
    fn show(&mut self, view: &CycleView<'_>) -> Result<()>;

    /// Draw the final summary once monitoring has stopped.
    fn finish(&mut self, view: &CycleView<'_>) -> Result<()>;

    /// How often to redraw while waiting for the next check. `None` draws
    /// only after each cycle.
    fn refresh_interval(&self) -> Option<Duration> {
        None
    }
}

/// Interactive capture of the reference pose.
pub trait ReferenceRitual {
    /// Walk the user through typing `trigger_word`, calling `capture` exactly
    /// once partway through, and return the captured frame.
    ///
    /// Fails with `Interrupted` when the user aborts.
    fn perform(
        &mut self,
        trigger_word: &str,
        capture: &mut dyn FnMut() -> Result<RgbImage>,
    ) -> Result<RgbImage>;
}
