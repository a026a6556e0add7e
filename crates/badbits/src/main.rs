mod bootstrap;

use std::process::ExitCode;
use std::time::Duration;

use badbits_core::error::{BadbitsError, Result};
use badbits_core::habits::HabitRegistry;
use badbits_core::notifications::{CommandBackend, NotificationDispatcher};
use badbits_core::settings::Settings;
use badbits_runtime::archive::AnalysisArchive;
use badbits_runtime::engine::{CheckEngine, EngineConfig};
use badbits_ui::ritual::TerminalRitual;
use badbits_ui::terminal::{DashboardDisplay, PlainDisplay};
use badbits_ui::themes::Theme;
use badbits_vision::camera::{FfmpegCamera, FrameSource};
use badbits_vision::classifier::{MoondreamClient, VisionClassifier};
use chrono::Local;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let settings = Settings::parse();

    match run(settings).await {
        Ok(()) | Err(BadbitsError::Interrupted) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "badbits exited with an error");
            if e.is_configuration() {
                eprintln!("Configuration error: {e}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<()> {
    settings.validate()?;

    let app_dir = bootstrap::ensure_directories()?;
    let log_file =
        bootstrap::resolve_log_file(settings.log_file.as_deref(), !settings.simple, &app_dir);
    bootstrap::setup_logging(settings.effective_log_level(), log_file.as_deref())?;
    info!("BadBits v{} starting", env!("CARGO_PKG_VERSION"));

    let Some(registry) = prepare_habits(&settings)? else {
        return Ok(());
    };

    info!(
        habits = registry.enabled().len(),
        interval = settings.interval,
        alerts = %settings.alerts,
        track = settings.track,
        "configuration loaded"
    );

    let dispatcher = NotificationDispatcher::new(
        CommandBackend::new("BadBits").with_page_dir(app_dir.clone()),
        settings.alert_methods(),
    );
    let classifier = VisionClassifier::new(MoondreamClient::new(
        settings.model_url.trim(),
        settings.api_key.clone(),
    )?);
    let frames = FrameSource::open(FfmpegCamera::default(), settings.camera_candidates())?;
    info!(camera = ?frames.active_id(), candidates = ?frames.candidates(), "camera opened");

    let archive = if settings.track {
        Some(AnalysisArchive::create(&settings.output_dir)?)
    } else {
        None
    };
    let config = EngineConfig {
        interval: Duration::from_secs(settings.interval),
        trigger_word: settings.trigger_word(),
        archive,
    };

    let mut engine = CheckEngine::new(frames, classifier, dispatcher, registry, config, Local::now());

    if let Err(e) = engine.capture_reference(&mut TerminalRitual::stdout()) {
        if matches!(e, BadbitsError::Interrupted) {
            println!("\nSetup cancelled.");
        }
        return Err(e);
    }

    let cancel = CancellationToken::new();
    bootstrap::spawn_interrupt_watcher(cancel.clone())?;

    if settings.simple {
        engine.run(&mut PlainDisplay::stdout(), cancel).await
    } else {
        let mut display = DashboardDisplay::enter(Theme::auto_detect())?;
        engine.run(&mut display, cancel).await
    }
}

/// Build the registry: defaults, then `--habits`, then the `--monitor`
/// selection. With `--save-habits` the definitions are exported before the
/// selection touches them and `None` is returned.
fn prepare_habits(settings: &Settings) -> Result<Option<HabitRegistry>> {
    let mut registry = HabitRegistry::load_defaults();
    if let Some(path) = &settings.habits {
        let count = registry.load_custom_file(path)?;
        info!(count, path = %path.display(), "custom habits loaded");
    }

    if let Some(path) = &settings.save_habits {
        registry.export_to_file(path)?;
        println!("Habit definitions saved to {}", path.display());
        return Ok(None);
    }

    settings.habit_selection().apply(&mut registry);
    Ok(Some(registry))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
