use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const APP_DIR: &str = ".badbits";
pub const LOG_FILE: &str = "badbits.log";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.badbits/` and `~/.badbits/logs/` exist and return the former.
pub fn ensure_directories() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let app_dir = home.join(APP_DIR);
    std::fs::create_dir_all(app_dir.join("logs"))?;
    Ok(app_dir)
}

/// Where log output goes. An explicit `--log-file` always wins; the dashboard
/// owns the screen, so it falls back to `<app_dir>/logs/badbits.log`. Plain
/// mode logs to stderr.
pub fn resolve_log_file(explicit: Option<&Path>, dashboard: bool, app_dir: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None if dashboard => Some(app_dir.join("logs").join(LOG_FILE)),
        None => None,
    }
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name onto a `tracing` filter directive.
pub fn level_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber, writing to `log_file` when
/// given and to stderr otherwise. `RUST_LOG` overrides the level.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(log_level)));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };
    let stderr_layer = file_layer.is_none().then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(())
}

// ── Shutdown ───────────────────────────────────────────────────────────────────

/// Cancel `cancel` on the first Ctrl+C.
///
/// The listener is registered before this returns, so an interrupt that
/// arrives while the runtime is still busy with blocking work is queued
/// instead of killing the process.
pub fn spawn_interrupt_watcher(cancel: CancellationToken) -> std::io::Result<JoinHandle<()>> {
    #[cfg(unix)]
    let mut interrupt =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;
    #[cfg(windows)]
    let mut interrupt = tokio::signal::windows::ctrl_c()?;

    Ok(tokio::spawn(async move {
        if interrupt.recv().await.is_some() {
            info!("Ctrl+C received; stopping");
            cancel.cancel();
        }
    }))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
