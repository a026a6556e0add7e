//! Running tally of a monitoring session.
//!
//! [`SessionStats`] is an immutable value: [`SessionStats::fold`] returns a
//! fresh snapshot built from the previous one plus a batch of
//! [`AlertResult`]s. Readers holding an older snapshot never observe a
//! half-applied update.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Local};

use crate::alerts::AlertResult;

/// Number of recent cycles kept for the dashboard timeline.
pub const HISTORY_LEN: usize = 20;

// ── CheckOutcome ──────────────────────────────────────────────────────────────

/// What actually happened in one folded cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub timestamp: DateTime<Local>,
    /// Habits evaluated in this cycle.
    pub checked: BTreeSet<String>,
    /// Habits detected in this cycle (subset of `checked`).
    pub active: BTreeSet<String>,
}

impl CheckOutcome {
    /// `Some(true)` when the habit was detected, `Some(false)` when it was
    /// checked and fine, `None` when it was not checked in this cycle.
    pub fn state_of(&self, habit_id: &str) -> Option<bool> {
        if self.checked.contains(habit_id) {
            Some(self.active.contains(habit_id))
        } else {
            None
        }
    }
}

// ── SessionStats ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    total_checks: u64,
    start_time: DateTime<Local>,
    last_check_time: Option<DateTime<Local>>,
    habit_alerts: BTreeMap<String, u64>,
    history: VecDeque<CheckOutcome>,
}

impl SessionStats {
    /// Empty stats with a zero count for every habit in `habit_ids`.
    pub fn new<I, S>(habit_ids: I, start_time: DateTime<Local>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            total_checks: 0,
            start_time,
            last_check_time: None,
            habit_alerts: habit_ids.into_iter().map(|id| (id.into(), 0)).collect(),
            history: VecDeque::new(),
        }
    }

    /// Produce the snapshot that follows this one after `batch` was checked
    /// at `now`.
    ///
    /// A habit counts at most once per batch, so every count stays at or
    /// below `total_checks`.
    pub fn fold(&self, batch: &[AlertResult], now: DateTime<Local>) -> SessionStats {
        let checked: BTreeSet<String> = batch.iter().map(|a| a.habit_id.clone()).collect();
        let active: BTreeSet<String> = batch
            .iter()
            .filter(|a| a.is_active)
            .map(|a| a.habit_id.clone())
            .collect();

        let mut habit_alerts = self.habit_alerts.clone();
        for id in &active {
            *habit_alerts.entry(id.clone()).or_insert(0) += 1;
        }

        let mut history = self.history.clone();
        history.push_back(CheckOutcome {
            timestamp: now,
            checked,
            active,
        });
        while history.len() > HISTORY_LEN {
            history.pop_front();
        }

        SessionStats {
            total_checks: self.total_checks + 1,
            start_time: self.start_time,
            last_check_time: Some(now),
            habit_alerts,
            history,
        }
    }

    pub fn total_checks(&self) -> u64 {
        self.total_checks
    }

    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    pub fn last_check_time(&self) -> Option<DateTime<Local>> {
        self.last_check_time
    }

    pub fn habit_alerts(&self) -> &BTreeMap<String, u64> {
        &self.habit_alerts
    }

    /// Cumulative number of cycles in which `habit_id` was detected.
    pub fn alert_count(&self, habit_id: &str) -> u64 {
        self.habit_alerts.get(habit_id).copied().unwrap_or(0)
    }

    /// `floor(100 * alert_count / total_checks)`, or 0 before the first check.
    pub fn alert_percent(&self, habit_id: &str) -> u64 {
        if self.total_checks == 0 {
            return 0;
        }
        self.alert_count(habit_id) * 100 / self.total_checks
    }

    /// Whole minutes elapsed since the session started.
    pub fn duration_minutes(&self, now: DateTime<Local>) -> i64 {
        (now - self.start_time).num_minutes().max(0)
    }

    /// Most recent cycles, oldest first.
    pub fn history(&self) -> &VecDeque<CheckOutcome> {
        &self.history
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
