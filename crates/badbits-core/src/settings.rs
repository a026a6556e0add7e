use clap::Parser;
use std::path::PathBuf;

use crate::error::{BadbitsError, Result};
use crate::habits::HabitSelection;
use crate::notifications::{methods_for_style, DeliveryMethod};

/// Default Moondream-compatible inference endpoint.
pub const DEFAULT_MODEL_URL: &str = "http://localhost:2020/v1";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Webcam habit monitor that nudges you when you slouch or bite your nails
#[derive(Parser, Debug, Clone)]
#[command(
    name = "badbits",
    about = "Webcam habit monitor that nudges you when you slouch or bite your nails",
    version
)]
pub struct Settings {
    /// Seconds between checks (1-3600)
    #[arg(short, long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub interval: u64,

    /// Primary camera id
    #[arg(short, long, default_value = "0")]
    pub camera: i32,

    /// Backup camera ids tried when the primary fails (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub backup_cameras: Vec<i32>,

    /// Directory for archived checks
    #[arg(short, long, default_value = "posture_analysis")]
    pub output_dir: PathBuf,

    /// Alert style
    #[arg(long, default_value = "normal", value_parser = ["quiet", "normal", "loud"])]
    pub alerts: String,

    /// Archive every check (composite image plus results)
    #[arg(short, long)]
    pub track: bool,

    /// Plain text output instead of the dashboard
    #[arg(short, long)]
    pub simple: bool,

    /// Which built-in habits to monitor
    #[arg(long, default_value = "all", value_parser = ["all", "posture", "nails"])]
    pub monitor: String,

    /// JSON file with custom habit definitions
    #[arg(long)]
    pub habits: Option<PathBuf>,

    /// Export the habit definitions to this file and exit
    #[arg(long)]
    pub save_habits: Option<PathBuf>,

    /// Vision model endpoint
    #[arg(long, default_value = DEFAULT_MODEL_URL)]
    pub model_url: String,

    /// API key sent to the vision model endpoint
    #[arg(long, env = "MOONDREAM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Word typed to capture the reference pose
    #[arg(long, default_value = "yellow")]
    pub trigger_word: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Reject values clap cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        let url = self.model_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(BadbitsError::Config(format!(
                "model url must start with http:// or https://, got '{}'",
                self.model_url
            )));
        }
        if self.trigger_word.trim().chars().count() < 2 {
            return Err(BadbitsError::Config(
                "trigger word must be at least 2 characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Delivery methods for the chosen alert style; empty when quiet.
    pub fn alert_methods(&self) -> Vec<DeliveryMethod> {
        methods_for_style(&self.alerts)
    }

    /// Primary camera followed by the backups, without duplicates.
    pub fn camera_candidates(&self) -> Vec<i32> {
        let mut ids = vec![self.camera];
        for id in &self.backup_cameras {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }

    pub fn habit_selection(&self) -> HabitSelection {
        HabitSelection::from_name(&self.monitor)
    }

    /// `--debug` overrides `--log-level`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    pub fn trigger_word(&self) -> String {
        self.trigger_word.trim().to_lowercase()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
