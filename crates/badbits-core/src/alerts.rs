use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::habits::NO_CHECKS;

/// Binary outcome of one habit check in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertResult {
    pub habit_id: String,
    /// `true` when the bad behavior was detected.
    pub is_active: bool,
    #[serde(default)]
    pub details: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl AlertResult {
    pub fn new(habit_id: impl Into<String>, is_active: bool, timestamp: DateTime<Local>) -> Self {
        Self {
            habit_id: habit_id.into(),
            is_active,
            details: None,
            timestamp,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        let details = details.into();
        self.details = if details.trim().is_empty() {
            None
        } else {
            Some(details)
        };
        self
    }

    /// Placeholder emitted when no habit is enabled, so consumers always get
    /// a non-empty batch.
    pub fn no_checks(timestamp: DateTime<Local>) -> Self {
        Self::new(NO_CHECKS, false, timestamp).with_details("No habit checks enabled")
    }

    /// e.g. `"NAIL_BITING: DETECTED"`.
    pub fn status_text(&self) -> String {
        let state = if self.is_active { "DETECTED" } else { "OK" };
        format!("{}: {}", self.habit_id.to_uppercase(), state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        let now = Local::now();
        assert_eq!(
            AlertResult::new("nail_biting", true, now).status_text(),
            "NAIL_BITING: DETECTED"
        );
        assert_eq!(AlertResult::new("posture", false, now).status_text(), "POSTURE: OK");
    }

    #[test]
    fn test_with_details_ignores_blank() {
        let now = Local::now();
        let alert = AlertResult::new("posture", true, now).with_details("   ");
        assert!(alert.details.is_none());
        let alert = AlertResult::new("posture", true, now).with_details("leaning left");
        assert_eq!(alert.details.as_deref(), Some("leaning left"));
    }

    #[test]
    fn test_no_checks_is_inactive() {
        let alert = AlertResult::no_checks(Local::now());
        assert_eq!(alert.habit_id, NO_CHECKS);
        assert!(!alert.is_active);
    }

    #[test]
    fn test_serialises_expected_fields() {
        let alert = AlertResult::new("posture", true, Local::now()).with_details("slouching");
        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["habit_id"], "posture");
        assert_eq!(value["is_active"], true);
        assert_eq!(value["details"], "slouching");
        assert!(value["timestamp"].is_string());
    }
}
