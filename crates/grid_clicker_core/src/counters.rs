//! Cumulative gameplay counters.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::warn;

use crate::StatField;

/// A single counter value, keeping integer counts exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CounterValue {
    /// A real-valued counter (playtime, resources).
    Real(f64),
    /// A whole-number counter.
    Integer(i64),
}

impl CounterValue {
    /// The value as a leaderboard score.
    pub fn as_score(self) -> f64 {
        match self {
            Self::Real(value) => value,
            Self::Integer(value) => value as f64,
        }
    }

    /// Whether `self` is strictly below `other` of the same kind.
    fn is_below(self, other: Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a < b,
            (a, b) => a.as_score() < b.as_score(),
        }
    }
}

/// Largest accepted integer counter, 2^53 - 1.
///
/// Scores are stored and ranked as `f64`; every integer up to this bound
/// converts exactly, so distinct counters never share a score.
pub const MAX_COUNTER: i64 = (1 << 53) - 1;

/// The eight cumulative counters a player reports.
///
/// Values are totals since the player started, never deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Getters, new)]
pub struct GameCounters {
    total_playtime_hours: f64,
    total_resources: f64,
    highest_combo: i64,
    total_clicks: i64,
    buildings_built: i64,
    skills_learned: i64,
    raids_completed: i64,
    achievements_unlocked: i64,
}

impl GameCounters {
    /// Reads one counter.
    pub fn value(&self, field: StatField) -> CounterValue {
        match field {
            StatField::TotalPlaytimeHours => CounterValue::Real(self.total_playtime_hours),
            StatField::TotalResources => CounterValue::Real(self.total_resources),
            StatField::HighestCombo => CounterValue::Integer(self.highest_combo),
            StatField::TotalClicks => CounterValue::Integer(self.total_clicks),
            StatField::BuildingsBuilt => CounterValue::Integer(self.buildings_built),
            StatField::SkillsLearned => CounterValue::Integer(self.skills_learned),
            StatField::RaidsCompleted => CounterValue::Integer(self.raids_completed),
            StatField::AchievementsUnlocked => CounterValue::Integer(self.achievements_unlocked),
        }
    }

    /// Writes one counter. `value` must be of the field's kind.
    pub(crate) fn set(&mut self, field: StatField, value: CounterValue) {
        debug_assert_eq!(
            field.is_integer(),
            matches!(value, CounterValue::Integer(_)),
            "counter kind mismatch for {}",
            field
        );
        match (field, value) {
            (StatField::TotalPlaytimeHours, CounterValue::Real(v)) => self.total_playtime_hours = v,
            (StatField::TotalResources, CounterValue::Real(v)) => self.total_resources = v,
            (StatField::HighestCombo, CounterValue::Integer(v)) => self.highest_combo = v,
            (StatField::TotalClicks, CounterValue::Integer(v)) => self.total_clicks = v,
            (StatField::BuildingsBuilt, CounterValue::Integer(v)) => self.buildings_built = v,
            (StatField::SkillsLearned, CounterValue::Integer(v)) => self.skills_learned = v,
            (StatField::RaidsCompleted, CounterValue::Integer(v)) => self.raids_completed = v,
            (StatField::AchievementsUnlocked, CounterValue::Integer(v)) => self.achievements_unlocked = v,
            (field, value) => warn!(%field, ?value, "Ignoring counter of the wrong kind"),
        }
    }

    /// First field whose value is outside the accepted range: negative,
    /// non-finite, or an integer above [`MAX_COUNTER`].
    pub fn first_out_of_range(&self) -> Option<StatField> {
        StatField::iter().find(|field| match self.value(*field) {
            CounterValue::Real(v) => !v.is_finite() || v < 0.0,
            CounterValue::Integer(v) => !(0..=MAX_COUNTER).contains(&v),
        })
    }

    /// First field, in declaration order, whose value is lower than in `previous`.
    pub fn first_regression_from(&self, previous: &GameCounters) -> Option<StatField> {
        StatField::iter().find(|field| self.value(*field).is_below(previous.value(*field)))
    }
}
