//! Habit definitions and the registry that tracks which ones are enabled.
//!
//! Built-in habits are loaded first; a custom JSON file can then override
//! entries with the same `habit_id` or add new ones. The registry keeps
//! insertion order so exports and dashboards list habits predictably.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BadbitsError, Result};

// ── HabitDefinition ───────────────────────────────────────────────────────────

/// One behavior the monitor screens for with a single vision prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitDefinition {
    /// Unique identifier, e.g. `"posture"`.
    pub habit_id: String,
    /// Display name, e.g. `"Poor Posture"`.
    pub name: String,
    /// Emoji shown next to the habit in the dashboard.
    pub emoji: String,
    /// Yes/no question sent to the vision model.
    pub prompt: String,
    /// Optional follow-up question asked only when the habit is detected.
    #[serde(default)]
    pub details_prompt: Option<String>,
    /// What the habit checks for.
    #[serde(default)]
    pub description: String,
    /// Notification body used when the habit is detected.
    #[serde(default)]
    pub active_message: String,
    /// Whether the habit is evaluated during check cycles.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl HabitDefinition {
    /// Name formatted for the UI: underscores become spaces and every word is
    /// title-cased.
    pub fn display_name(&self) -> String {
        crate::formatting::title_case(&self.name)
    }

    /// Message to show when the habit is detected.
    pub fn notification_message(&self) -> String {
        if self.active_message.is_empty() {
            format!("{} detected!", self.display_name())
        } else {
            self.active_message.clone()
        }
    }
}

// ── Built-in habits ───────────────────────────────────────────────────────────

pub const POSTURE: &str = "posture";
pub const NAIL_BITING: &str = "nail_biting";
pub const EYE_STRAIN: &str = "eye_strain";
pub const SCREEN_BREAK: &str = "screen_break";

/// Habit id used for the placeholder result when no habit is enabled.
pub const NO_CHECKS: &str = "no_checks";

const REQUIRED_FIELDS: [&str; 4] = ["habit_id", "name", "emoji", "prompt"];
const OPTIONAL_STRING_FIELDS: [&str; 2] = ["description", "active_message"];

fn builtin(
    habit_id: &str,
    name: &str,
    emoji: &str,
    prompt: &str,
    description: &str,
    active_message: &str,
    enabled: bool,
) -> HabitDefinition {
    HabitDefinition {
        habit_id: habit_id.to_string(),
        name: name.to_string(),
        emoji: emoji.to_string(),
        prompt: prompt.to_string(),
        details_prompt: None,
        description: description.to_string(),
        active_message: active_message.to_string(),
        enabled,
    }
}

// ── HabitRegistry ─────────────────────────────────────────────────────────────

/// Ordered collection of habit definitions keyed by `habit_id`.
#[derive(Debug, Clone, Default)]
pub struct HabitRegistry {
    habits: Vec<HabitDefinition>,
}

impl HabitRegistry {
    /// Registry containing only the built-in habits.
    pub fn load_defaults() -> Self {
        let habits = vec![
            builtin(
                POSTURE,
                "Poor Posture",
                "🪑",
                "Compare the top (reference) and bottom images: Is the person in the bottom image \
                 sitting with worse posture than in the reference image? Answer with ONLY 'yes' or 'no'.",
                "Detects poor sitting posture compared to your reference image",
                "Poor posture detected! Straighten your back and adjust your position.",
                true,
            ),
            builtin(
                NAIL_BITING,
                "Nail Biting",
                "💅",
                "Looking at the bottom image only: Is the person biting their nails or have their \
                 hands near their mouth? Answer with ONLY 'yes' or 'no' - nothing else.",
                "Detects nail biting or hands near mouth",
                "Nail biting detected! Be mindful of your hands.",
                true,
            ),
            builtin(
                EYE_STRAIN,
                "Eye Strain",
                "👁️",
                "Looking at the bottom image only: Is the person leaning too close to the screen \
                 (less than arm's length away)? Answer with ONLY 'yes' or 'no' - nothing else.",
                "Detects when you're sitting too close to the screen",
                "You're too close to the screen! Sit back to reduce eye strain.",
                false,
            ),
            builtin(
                SCREEN_BREAK,
                "Screen Break",
                "⏱️",
                "This is a timed reminder. Please answer 'yes' to indicate it's time for a screen break.",
                "Reminds you to take regular breaks from screen time",
                "Time for a screen break! Look away from the screen for 20 seconds.",
                false,
            ),
        ];
        tracing::info!(count = habits.len(), "loaded default habits");
        Self { habits }
    }

    /// Parse a JSON array of habit records and merge it into the registry.
    ///
    /// The whole source is validated before anything is merged, so a failed
    /// load leaves the registry untouched. Returns the number of records
    /// merged.
    pub fn load_custom(&mut self, source: &str) -> Result<usize> {
        let value: Value =
            serde_json::from_str(source).map_err(BadbitsError::InvalidHabitSource)?;
        let records = value.as_array().ok_or_else(|| BadbitsError::HabitValidation {
            index: 0,
            message: "habit definitions must be a JSON array".to_string(),
        })?;

        let mut parsed = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            validate_record(record).map_err(|message| BadbitsError::HabitValidation {
                index,
                message,
            })?;
            let habit: HabitDefinition = serde_json::from_value(record.clone()).map_err(|e| {
                BadbitsError::HabitValidation {
                    index,
                    message: e.to_string(),
                }
            })?;
            parsed.push(habit);
        }

        let count = parsed.len();
        for habit in parsed {
            self.upsert(habit);
        }
        Ok(count)
    }

    /// Read `path` and merge its habit definitions.
    pub fn load_custom_file(&mut self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Err(BadbitsError::HabitFileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let count = self.load_custom(&content)?;
        tracing::info!(count, path = %path.display(), "loaded custom habits");
        Ok(count)
    }

    /// Toggle a habit. Returns `false` when `habit_id` is unknown.
    pub fn enable(&mut self, habit_id: &str, enabled: bool) -> bool {
        match self.habits.iter_mut().find(|h| h.habit_id == habit_id) {
            Some(habit) => {
                habit.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Serialize every definition as a pretty-printed JSON array.
    pub fn export(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.habits)?)
    }

    /// Write [`export`](Self::export) output to `path`.
    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.export()?)?;
        tracing::info!(count = self.habits.len(), path = %path.display(), "saved habits");
        Ok(())
    }

    pub fn get(&self, habit_id: &str) -> Option<&HabitDefinition> {
        self.habits.iter().find(|h| h.habit_id == habit_id)
    }

    /// All definitions in insertion order.
    pub fn all(&self) -> &[HabitDefinition] {
        &self.habits
    }

    /// Enabled definitions in insertion order.
    pub fn enabled(&self) -> Vec<&HabitDefinition> {
        self.habits.iter().filter(|h| h.enabled).collect()
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    fn upsert(&mut self, habit: HabitDefinition) {
        match self.habits.iter_mut().find(|h| h.habit_id == habit.habit_id) {
            Some(existing) => *existing = habit,
            None => self.habits.push(habit),
        }
    }
}

/// Check one record's shape, naming the first offending field.
fn validate_record(record: &Value) -> std::result::Result<(), String> {
    let obj = record
        .as_object()
        .ok_or_else(|| "habit definition must be a JSON object".to_string())?;

    for field in REQUIRED_FIELDS {
        match obj.get(field) {
            None | Some(Value::Null) => return Err(format!("missing required field '{field}'")),
            Some(v) if !v.is_string() => return Err(format!("'{field}' must be a string")),
            _ => {}
        }
    }

    for field in OPTIONAL_STRING_FIELDS {
        if let Some(v) = obj.get(field) {
            if !v.is_string() {
                return Err(format!("'{field}' must be a string"));
            }
        }
    }

    if let Some(v) = obj.get("details_prompt") {
        if !(v.is_string() || v.is_null()) {
            return Err("'details_prompt' must be a string or null".to_string());
        }
    }

    if let Some(v) = obj.get("enabled") {
        if !v.is_boolean() {
            return Err("'enabled' must be a boolean".to_string());
        }
    }

    Ok(())
}

// ── HabitSelection ────────────────────────────────────────────────────────────

/// Which of the built-in habits the user asked to monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitSelection {
    All,
    PostureOnly,
    NailsOnly,
}

impl HabitSelection {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "posture" => HabitSelection::PostureOnly,
            "nails" => HabitSelection::NailsOnly,
            _ => HabitSelection::All,
        }
    }

    /// Apply the selection to the built-in habits. Custom habits keep their
    /// own `enabled` flag.
    pub fn apply(self, registry: &mut HabitRegistry) {
        let (posture, nails) = match self {
            HabitSelection::All => (true, true),
            HabitSelection::PostureOnly => (true, false),
            HabitSelection::NailsOnly => (false, true),
        };
        registry.enable(POSTURE, posture);
        registry.enable(NAIL_BITING, nails);
        registry.enable(EYE_STRAIN, false);
        registry.enable(SCREEN_BREAK, false);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn custom_habit(id: &str) -> HabitDefinition {
        HabitDefinition {
            habit_id: id.to_string(),
            name: "hand_on_chin".to_string(),
            emoji: "🤔".to_string(),
            prompt: "Is the person resting their chin on their hand? Answer yes or no.".to_string(),
            details_prompt: Some("Which hand?".to_string()),
            description: "Chin resting".to_string(),
            active_message: String::new(),
            enabled: false,
        }
    }

    // ── defaults ──────────────────────────────────────────────────────────

    #[test]
    fn test_load_defaults_contains_builtins() {
        let registry = HabitRegistry::load_defaults();
        assert_eq!(registry.len(), 4);
        let ids: Vec<&str> = registry.all().iter().map(|h| h.habit_id.as_str()).collect();
        assert_eq!(ids, vec![POSTURE, NAIL_BITING, EYE_STRAIN, SCREEN_BREAK]);
    }

    #[test]
    fn test_default_prompts_demand_binary_answer() {
        let registry = HabitRegistry::load_defaults();
        for habit in registry.all() {
            assert!(
                habit.prompt.contains("'yes'"),
                "prompt for {} must ask for yes/no",
                habit.habit_id
            );
        }
    }

    #[test]
    fn test_default_enabled_flags() {
        let registry = HabitRegistry::load_defaults();
        let enabled: Vec<&str> = registry
            .enabled()
            .iter()
            .map(|h| h.habit_id.as_str())
            .collect();
        assert_eq!(enabled, vec![POSTURE, NAIL_BITING]);
    }

    // ── display helpers ───────────────────────────────────────────────────

    #[test]
    fn test_display_name_title_cases() {
        let habit = custom_habit("chin");
        assert_eq!(habit.display_name(), "Hand On Chin");
    }

    #[test]
    fn test_notification_message_fallback() {
        let habit = custom_habit("chin");
        assert_eq!(habit.notification_message(), "Hand On Chin detected!");

        let registry = HabitRegistry::load_defaults();
        let posture = registry.get(POSTURE).unwrap();
        assert!(posture.notification_message().starts_with("Poor posture detected!"));
    }

    // ── enable ────────────────────────────────────────────────────────────

    #[test]
    fn test_enable_known_and_unknown() {
        let mut registry = HabitRegistry::load_defaults();
        assert!(registry.enable(EYE_STRAIN, true));
        assert!(registry.get(EYE_STRAIN).unwrap().enabled);
        assert!(!registry.enable("does_not_exist", true));
        assert_eq!(registry.len(), 4);
    }

    // ── load_custom ───────────────────────────────────────────────────────

    #[test]
    fn test_load_custom_adds_and_overrides() {
        let mut registry = HabitRegistry::load_defaults();
        let source = r#"[
            {"habit_id": "posture", "name": "Slouching", "emoji": "🐢", "prompt": "Slouching? yes or no"},
            {"habit_id": "phone", "name": "Phone", "emoji": "📱", "prompt": "Holding a phone? yes or no", "enabled": false}
        ]"#;

        let count = registry.load_custom(source).expect("load");
        assert_eq!(count, 2);
        assert_eq!(registry.len(), 5);

        let posture = registry.get(POSTURE).unwrap();
        assert_eq!(posture.name, "Slouching");
        assert!(posture.enabled, "enabled defaults to true");
        assert!(posture.details_prompt.is_none());
        assert_eq!(posture.description, "");

        // New ids are appended after the built-ins.
        assert_eq!(registry.all().last().unwrap().habit_id, "phone");
        assert!(!registry.get("phone").unwrap().enabled);
    }

    #[test]
    fn test_load_custom_missing_field_names_it() {
        let mut registry = HabitRegistry::load_defaults();
        let source = r#"[
            {"habit_id": "ok", "name": "Ok", "emoji": "✅", "prompt": "p"},
            {"habit_id": "bad", "name": "Bad", "emoji": "❌"}
        ]"#;

        let err = registry.load_custom(source).unwrap_err();
        match err {
            BadbitsError::HabitValidation { index, message } => {
                assert_eq!(index, 1);
                assert!(message.contains("'prompt'"), "message was: {message}");
            }
            other => panic!("unexpected error: {other}"),
        }
        // All-or-nothing: the valid first record was not merged.
        assert!(registry.get("ok").is_none());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_load_custom_rejects_malformed_json() {
        let mut registry = HabitRegistry::load_defaults();
        let err = registry.load_custom("[{not json").unwrap_err();
        assert!(matches!(err, BadbitsError::InvalidHabitSource(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_load_custom_rejects_non_array() {
        let mut registry = HabitRegistry::load_defaults();
        let err = registry.load_custom(r#"{"habit_id": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("JSON array"));
    }

    #[test]
    fn test_load_custom_rejects_wrong_types() {
        let mut registry = HabitRegistry::load_defaults();
        let source = r#"[{"habit_id": "x", "name": "X", "emoji": "x", "prompt": "p", "enabled": "yes"}]"#;
        let err = registry.load_custom(source).unwrap_err();
        assert!(err.to_string().contains("'enabled'"));

        let source = r#"[{"habit_id": 7, "name": "X", "emoji": "x", "prompt": "p"}]"#;
        let err = registry.load_custom(source).unwrap_err();
        assert!(err.to_string().contains("'habit_id'"));
    }

    #[test]
    fn test_load_custom_file_not_found() {
        let tmp = TempDir::new().unwrap();
        let mut registry = HabitRegistry::load_defaults();
        let err = registry
            .load_custom_file(&tmp.path().join("nope.json"))
            .unwrap_err();
        assert!(matches!(err, BadbitsError::HabitFileNotFound(_)));
    }

    // ── export ────────────────────────────────────────────────────────────

    #[test]
    fn test_export_then_reload_is_identity() {
        let mut registry = HabitRegistry::load_defaults();
        registry.enable(EYE_STRAIN, true);
        registry.enable(POSTURE, false);
        registry.upsert(custom_habit("chin"));

        let exported = registry.export().expect("export");

        let mut reloaded = HabitRegistry::default();
        reloaded.load_custom(&exported).expect("reload");

        assert_eq!(reloaded.all(), registry.all());
    }

    #[test]
    fn test_export_to_file_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("habits.json");

        let registry = HabitRegistry::load_defaults();
        registry.export_to_file(&path).expect("export");
        assert!(path.exists());

        let mut reloaded = HabitRegistry::default();
        assert_eq!(reloaded.load_custom_file(&path).expect("load"), 4);
        assert_eq!(reloaded.all(), registry.all());
    }

    // ── HabitSelection ────────────────────────────────────────────────────

    #[test]
    fn test_selection_from_name() {
        assert_eq!(HabitSelection::from_name("posture"), HabitSelection::PostureOnly);
        assert_eq!(HabitSelection::from_name("NAILS"), HabitSelection::NailsOnly);
        assert_eq!(HabitSelection::from_name("all"), HabitSelection::All);
        assert_eq!(HabitSelection::from_name("???"), HabitSelection::All);
    }

    #[test]
    fn test_selection_apply_keeps_custom_flags() {
        let mut registry = HabitRegistry::load_defaults();
        registry.enable(EYE_STRAIN, true);
        let mut chin = custom_habit("chin");
        chin.enabled = true;
        registry.upsert(chin);

        HabitSelection::NailsOnly.apply(&mut registry);

        assert!(!registry.get(POSTURE).unwrap().enabled);
        assert!(registry.get(NAIL_BITING).unwrap().enabled);
        assert!(!registry.get(EYE_STRAIN).unwrap().enabled);
        assert!(registry.get("chin").unwrap().enabled);
    }
}
