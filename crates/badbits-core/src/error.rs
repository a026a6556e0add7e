use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by BadBits.
#[derive(Error, Debug)]
pub enum BadbitsError {
    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The custom habit definitions file does not exist.
    #[error("Custom habits file not found: {0}")]
    HabitFileNotFound(PathBuf),

    /// A habit record failed validation.
    #[error("Invalid habit definition at index {index}: {message}")]
    HabitValidation { index: usize, message: String },

    /// The habit source is not a valid JSON document.
    #[error("Invalid habit definitions source: {0}")]
    InvalidHabitSource(#[source] serde_json::Error),

    /// No camera could be opened.
    #[error("{}", describe_unavailable(.candidates, .available))]
    DeviceUnavailable {
        /// Device ids that were tried, in priority order.
        candidates: Vec<i32>,
        /// Device ids a diagnostic scan found openable.
        available: Vec<i32>,
    },

    /// A frame could not be read from an open device.
    #[error("Frame capture failed: {0}")]
    Capture(String),

    /// The vision model call failed.
    #[error("Classification failed: {0}")]
    Classification(String),

    /// A check was attempted before the reference image was captured.
    #[error("Reference image not set")]
    ReferenceNotSet,

    /// The user interrupted an interactive step.
    #[error("Interrupted by user")]
    Interrupted,

    /// An image could not be encoded or decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BadbitsError {
    /// `true` for errors that must stop the program at startup.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BadbitsError::Config(_)
                | BadbitsError::HabitFileNotFound(_)
                | BadbitsError::HabitValidation { .. }
                | BadbitsError::InvalidHabitSource(_)
        )
    }
}

fn describe_unavailable(candidates: &[i32], available: &[i32]) -> String {
    let tried = join_ids(candidates);
    if available.is_empty() {
        format!("Could not open any camera (tried {tried}). Please check your camera connections.")
    } else {
        format!(
            "Could not open any camera (tried {tried}). Available camera IDs might be: {}",
            join_ids(available)
        )
    }
}

fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias used throughout the BadBits crates.
pub type Result<T> = std::result::Result<T, BadbitsError>;
