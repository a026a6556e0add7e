//! The monitoring state machine.
//!
//! ```text
//! AwaitingReference ──capture_reference──▶ Monitoring ──cancel──▶ Stopped
//! ```
//!
//! One cycle captures a frame, stacks it under the reference, asks the model
//! about every enabled habit, folds the batch into [`SessionStats`], raises
//! notifications for active alerts and optionally archives the evidence. A
//! failed capture or classification leaves the stats and the last batch
//! untouched and is reported through the display instead.

use std::path::PathBuf;
use std::time::Duration;

use badbits_core::alerts::AlertResult;
use badbits_core::error::{BadbitsError, Result};
use badbits_core::habits::{HabitDefinition, HabitRegistry};
use badbits_core::notifications::AlertSink;
use badbits_core::stats::SessionStats;
use badbits_vision::camera::{CameraBackend, FrameSource};
use badbits_vision::classifier::{Answer, VisionClassifier, VisionModel};
use badbits_vision::composite::ComparisonImageBuilder;
use chrono::{DateTime, Local};
use image::RgbImage;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::archive::AnalysisArchive;
use crate::display::{CycleDisplay, CycleView, ReferenceRitual};

pub const STARTUP_TITLE: &str = "BadBits Monitoring Started";
pub const STARTUP_MESSAGE: &str = "Posture and habit monitoring is now active!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    AwaitingReference,
    Monitoring,
    Stopped,
}

// ── Config & report ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub interval: Duration,
    pub trigger_word: String,
    /// Archive every check here when set.
    pub archive: Option<AnalysisArchive>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            trigger_word: "yellow".to_string(),
            archive: None,
        }
    }
}

/// Outcome of one [`CheckEngine::run_cycle`].
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Empty when the cycle failed.
    pub alerts: Vec<AlertResult>,
    pub error: Option<String>,
    pub archived: Option<PathBuf>,
}

impl CycleReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

// ── CheckEngine ───────────────────────────────────────────────────────────────

pub struct CheckEngine<B: CameraBackend, M, S> {
    frames: Option<FrameSource<B>>,
    classifier: VisionClassifier<M>,
    sink: S,
    builder: ComparisonImageBuilder,
    registry: HabitRegistry,
    config: EngineConfig,
    state: EngineState,
    reference: Option<RgbImage>,
    stats: SessionStats,
    last_alerts: Vec<AlertResult>,
    last_error: Option<String>,
    last_archived: Option<PathBuf>,
    next_check: Option<DateTime<Local>>,
}

impl<B, M, S> CheckEngine<B, M, S>
where
    B: CameraBackend,
    M: VisionModel,
    S: AlertSink,
{
    /// `started_at` is provisional: the session clock restarts when the
    /// reference is set.
    pub fn new(
        frames: FrameSource<B>,
        classifier: VisionClassifier<M>,
        sink: S,
        registry: HabitRegistry,
        config: EngineConfig,
        started_at: DateTime<Local>,
    ) -> Self {
        let (stats, last_alerts) = fresh_session(&registry, started_at);

        Self {
            frames: Some(frames),
            classifier,
            sink,
            builder: ComparisonImageBuilder::new(),
            registry,
            config,
            state: EngineState::AwaitingReference,
            reference: None,
            stats,
            last_alerts,
            last_error: None,
            last_archived: None,
            next_check: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn last_alerts(&self) -> &[AlertResult] {
        &self.last_alerts
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn registry(&self) -> &HabitRegistry {
        &self.registry
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn has_camera(&self) -> bool {
        self.frames.is_some()
    }

    // ── Reference ─────────────────────────────────────────────────────────

    /// Run the capture ritual and enter `Monitoring`.
    ///
    /// An interrupted ritual moves the engine to `Stopped`.
    pub fn capture_reference<R: ReferenceRitual>(&mut self, ritual: &mut R) -> Result<()> {
        self.expect_state(EngineState::AwaitingReference)?;
        let frames = self.frames.as_mut().ok_or(BadbitsError::ReferenceNotSet)?;

        let captured = ritual.perform(&self.config.trigger_word, &mut || frames.capture());
        match captured {
            Ok(frame) => {
                self.set_reference_at(frame, Local::now());
                Ok(())
            }
            Err(e) => {
                if matches!(e, BadbitsError::Interrupted) {
                    info!("reference capture interrupted");
                    self.stop();
                }
                Err(e)
            }
        }
    }

    /// Install `frame` as the reference and enter `Monitoring`.
    pub fn set_reference(&mut self, frame: RgbImage) {
        self.set_reference_at(frame, Local::now());
    }

    /// As [`Self::set_reference`], with the session starting at `now`.
    pub fn set_reference_at(&mut self, frame: RgbImage, now: DateTime<Local>) {
        (self.stats, self.last_alerts) = fresh_session(&self.registry, now);
        if let Some(archive) = &self.config.archive {
            match archive.save_reference(&frame) {
                Ok(path) => info!(path = %path.display(), "reference image saved"),
                Err(e) => warn!(error = %e, "failed to save reference image"),
            }
        }
        self.reference = Some(frame);
        self.state = EngineState::Monitoring;
        info!("reference captured, monitoring started");
        self.sink.send_alert(STARTUP_TITLE, STARTUP_MESSAGE);
    }

    // ── Cycle ─────────────────────────────────────────────────────────────

    /// Run one check at `now`.
    ///
    /// Failures are recorded in the report and in [`Self::last_error`]; the
    /// stats and last alerts only change on success.
    pub async fn run_cycle(&mut self, now: DateTime<Local>) -> CycleReport {
        match self.check(now).await {
            Ok((alerts, composite)) => {
                self.stats = self.stats.fold(&alerts, now);
                self.notify(&alerts);
                let archived = self.archive(&composite, &alerts, now);

                self.last_alerts = alerts.clone();
                self.last_error = None;
                self.last_archived = archived.clone();
                CycleReport {
                    alerts,
                    error: None,
                    archived,
                }
            }
            Err(e) => {
                error!(error = %e, "check failed");
                let message = e.to_string();
                self.last_error = Some(message.clone());
                CycleReport {
                    alerts: Vec::new(),
                    error: Some(message),
                    archived: None,
                }
            }
        }
    }

    async fn check(&mut self, now: DateTime<Local>) -> Result<(Vec<AlertResult>, RgbImage)> {
        self.expect_state(EngineState::Monitoring)?;
        let reference = self.reference.as_ref().ok_or(BadbitsError::ReferenceNotSet)?;
        let frames = self
            .frames
            .as_mut()
            .ok_or_else(|| BadbitsError::Capture("camera already released".to_string()))?;

        let current = frames.capture()?;
        let composite = self.builder.build(reference, &current)?;
        let alerts = self.classify(&composite, now).await?;
        Ok((alerts, composite))
    }

    async fn classify(&self, composite: &RgbImage, now: DateTime<Local>) -> Result<Vec<AlertResult>> {
        let encoded = self.classifier.encode(composite)?;
        let enabled = self.registry.enabled();
        if enabled.is_empty() {
            return Ok(vec![AlertResult::no_checks(now)]);
        }

        let mut results = Vec::with_capacity(enabled.len());
        for habit in enabled {
            let answer = self.classifier.classify(&encoded, &habit.prompt).await?;
            let verdict = Answer::interpret(&answer);
            if verdict == Answer::Other {
                warn!(habit_id = %habit.habit_id, answer = %answer, "non-binary answer treated as no");
            }

            let mut alert = AlertResult::new(habit.habit_id.clone(), verdict.is_active(), now);
            if alert.is_active {
                if let Some(prompt) = &habit.details_prompt {
                    match self.classifier.describe(&encoded, prompt).await {
                        Ok(details) => alert = alert.with_details(details),
                        Err(e) => {
                            warn!(habit_id = %habit.habit_id, error = %e, "details query failed")
                        }
                    }
                }
            }
            debug!(habit_id = %habit.habit_id, active = alert.is_active, "habit checked");
            results.push(alert);
        }
        Ok(results)
    }

    fn notify(&mut self, alerts: &[AlertResult]) {
        for alert in alerts.iter().filter(|a| a.is_active) {
            let (title, message) = alert_notification(self.registry.get(&alert.habit_id), alert);
            self.sink.send_alert(&title, &message);
        }
    }

    fn archive(
        &self,
        composite: &RgbImage,
        alerts: &[AlertResult],
        now: DateTime<Local>,
    ) -> Option<PathBuf> {
        let archive = self.config.archive.as_ref()?;
        match archive.save(composite, alerts, now) {
            Ok(dir) => {
                debug!(path = %dir.display(), "check archived");
                Some(dir)
            }
            Err(e) => {
                warn!(error = %e, "failed to archive check");
                None
            }
        }
    }

    // ── Loop ──────────────────────────────────────────────────────────────

    /// Check every interval until `cancel` fires, then stop and hand the
    /// final snapshot to `display.finish`.
    pub async fn run<D: CycleDisplay>(
        &mut self,
        display: &mut D,
        cancel: CancellationToken,
    ) -> Result<()> {
        self.expect_state(EngineState::Monitoring)?;
        self.show(display, Local::now());

        'monitor: loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'monitor,
                report = self.run_cycle(Local::now()) => {
                    debug!(ok = report.is_ok(), alerts = report.alerts.len(), "cycle finished");
                }
            }

            let deadline = Instant::now() + self.config.interval;
            self.next_check = Some(Local::now() + self.config.interval);
            self.show(display, Local::now());

            while Instant::now() < deadline {
                let wake = match display.refresh_interval() {
                    Some(every) => deadline.min(Instant::now() + every),
                    None => deadline,
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break 'monitor,
                    _ = tokio::time::sleep_until(wake) => {}
                }
                if wake < deadline {
                    self.show(display, Local::now());
                }
            }
        }

        self.stop();
        let now = Local::now();
        display.finish(&self.view(now))
    }

    /// Enter `Stopped` and release the camera.
    pub fn stop(&mut self) {
        if self.state != EngineState::Stopped {
            info!(checks = self.stats.total_checks(), "monitoring stopped");
        }
        self.state = EngineState::Stopped;
        self.next_check = None;
        self.frames = None;
    }

    /// Snapshot for displays.
    pub fn view(&self, now: DateTime<Local>) -> CycleView<'_> {
        CycleView {
            habits: self.registry.enabled(),
            stats: &self.stats,
            alerts: &self.last_alerts,
            next_check: self.next_check,
            error: self.last_error.as_deref(),
            archived: self.last_archived.as_deref(),
            archive_root: self.config.archive.as_ref().map(|a| a.root()),
            now,
        }
    }

    fn show<D: CycleDisplay>(&self, display: &mut D, now: DateTime<Local>) {
        if let Err(e) = display.show(&self.view(now)) {
            warn!(error = %e, "display update failed");
        }
    }

    fn expect_state(&self, expected: EngineState) -> Result<()> {
        if self.state == expected {
            return Ok(());
        }
        match expected {
            EngineState::Monitoring if self.state == EngineState::AwaitingReference => {
                Err(BadbitsError::ReferenceNotSet)
            }
            _ => Err(BadbitsError::Other(anyhow::anyhow!(
                "engine is {:?}, expected {:?}",
                self.state,
                expected
            ))),
        }
    }
}

/// Empty stats and an all-OK batch for every enabled habit.
fn fresh_session(
    registry: &HabitRegistry,
    start: DateTime<Local>,
) -> (SessionStats, Vec<AlertResult>) {
    let enabled = registry.enabled();
    let stats = SessionStats::new(enabled.iter().map(|h| h.habit_id.clone()), start);
    let alerts = enabled
        .iter()
        .map(|h| AlertResult::new(h.habit_id.clone(), false, start))
        .collect();
    (stats, alerts)
}

/// Title and body of the notification for an active alert.
pub fn alert_notification(
    habit: Option<&HabitDefinition>,
    alert: &AlertResult,
) -> (String, String) {
    let (name, mut message) = match habit {
        Some(h) => (h.display_name(), h.notification_message()),
        None => (
            badbits_core::formatting::title_case(&alert.habit_id),
            "Issue detected!".to_string(),
        ),
    };
    if let Some(details) = &alert.details {
        message = format!("{message} {details}");
    }
    (format!("BadBits Alert: {name}"), message)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
