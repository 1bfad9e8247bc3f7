//! Statistic fields and the leaderboard categories derived from them.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::instrument;

use crate::{GameCounters, ValidationError, ValidationErrorKind};

/// One of the eight counters carried by a statistics event.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatField {
    /// Estimated hours played.
    TotalPlaytimeHours,
    /// Sum of all resources held.
    TotalResources,
    /// Longest click combo reached.
    HighestCombo,
    /// Lifetime click count.
    TotalClicks,
    /// Sum of building levels.
    BuildingsBuilt,
    /// Sum of skill levels.
    SkillsLearned,
    /// Raids sent and returned.
    RaidsCompleted,
    /// Achievements completed.
    AchievementsUnlocked,
}

impl StatField {
    /// Key this field is reported under in a statistics payload.
    pub fn canonical_key(self) -> &'static str {
        match self {
            Self::TotalPlaytimeHours => "totalPlaytimeHours",
            Self::TotalResources => "totalResources",
            Self::HighestCombo => "highestCombo",
            Self::TotalClicks => "totalClicks",
            Self::BuildingsBuilt => "buildingsBuilt",
            Self::SkillsLearned => "skillsLearned",
            Self::RaidsCompleted => "raidsCompleted",
            Self::AchievementsUnlocked => "achievementsUnlocked",
        }
    }

    /// Older keys the web client still sends for this field.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::TotalPlaytimeHours => &["playtimeEstimate"],
            Self::HighestCombo => &["maxCombo"],
            Self::BuildingsBuilt => &["buildingLevels"],
            Self::SkillsLearned => &["skillLevels"],
            Self::AchievementsUnlocked => &["achievementsCount"],
            Self::TotalResources | Self::TotalClicks | Self::RaidsCompleted => &[],
        }
    }

    /// Whether the field holds a whole-number count.
    pub fn is_integer(self) -> bool {
        !matches!(self, Self::TotalPlaytimeHours | Self::TotalResources)
    }
}

/// A leaderboard scoring dimension.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    /// Ranked by [`StatField::TotalResources`].
    #[default]
    TotalResources,
    /// Ranked by [`StatField::HighestCombo`].
    HighestCombo,
    /// Ranked by [`StatField::TotalClicks`].
    TotalClicks,
    /// Ranked by [`StatField::BuildingsBuilt`].
    BuildingsBuilt,
}

impl Category {
    /// The counter this category ranks by.
    pub fn backing_field(self) -> StatField {
        match self {
            Self::TotalResources => StatField::TotalResources,
            Self::HighestCombo => StatField::HighestCombo,
            Self::TotalClicks => StatField::TotalClicks,
            Self::BuildingsBuilt => StatField::BuildingsBuilt,
        }
    }

    /// The category ranked by `field`, if any.
    pub fn for_field(field: StatField) -> Option<Self> {
        Self::iter().find(|category| category.backing_field() == field)
    }

    /// Projects a player's counters onto this category's score.
    pub fn score(self, counters: &GameCounters) -> f64 {
        counters.value(self.backing_field()).as_score()
    }

    /// Parses a category from its snake_case name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name is not a known category.
    #[instrument]
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        name.parse().map_err(|_| {
            ValidationError::new(ValidationErrorKind::UnknownCategory {
                name: name.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_maps_to_a_distinct_field() {
        let fields: Vec<StatField> = Category::iter().map(Category::backing_field).collect();
        assert_eq!(fields.len(), 4);
        for category in Category::iter() {
            assert_eq!(Category::for_field(category.backing_field()), Some(category));
        }
        assert_eq!(Category::for_field(StatField::RaidsCompleted), None);
    }

    #[test]
    fn category_names_are_snake_case() {
        assert_eq!(Category::TotalResources.as_ref(), "total_resources");
        assert_eq!(Category::BuildingsBuilt.to_string(), "buildings_built");
        assert_eq!(
            Category::parse("highest_combo").expect("Parse failed"),
            Category::HighestCombo
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = Category::parse("fastest_raid").expect_err("Should reject");
        assert!(matches!(
            err.kind(),
            ValidationErrorKind::UnknownCategory { name } if name == "fastest_raid"
        ));
    }

    #[test]
    fn default_category_is_total_resources() {
        assert_eq!(Category::default(), Category::TotalResources);
    }
}
