//! Database models.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use grid_clicker_core::{Category, GameCounters, Rank};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::db::schema;

/// Player identity as stored.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::players)]
pub struct Player {
    id: i64,
    display_name: Option<String>,
    username: Option<String>,
    locale: Option<String>,
    is_premium: bool,
    registered_at: NaiveDateTime,
    last_seen_at: NaiveDateTime,
    session_count: i64,
}

/// Identity fields supplied by the host platform on each contact.
///
/// The platform has already authenticated the player; the id is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, new)]
pub struct PlayerProfile {
    id: i64,
    display_name: Option<String>,
    username: Option<String>,
    locale: Option<String>,
    #[serde(default)]
    is_premium: bool,
}

/// Insertable identity for a first contact.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::players)]
pub(crate) struct NewPlayer {
    pub(crate) id: i64,
    pub(crate) display_name: Option<String>,
    pub(crate) username: Option<String>,
    pub(crate) locale: Option<String>,
    pub(crate) is_premium: bool,
    pub(crate) registered_at: NaiveDateTime,
    pub(crate) last_seen_at: NaiveDateTime,
    pub(crate) session_count: i64,
}

impl NewPlayer {
    /// Builds the first-contact row from a profile.
    pub(crate) fn from_profile(profile: &PlayerProfile, now: NaiveDateTime) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name.clone(),
            username: profile.username.clone(),
            locale: profile.locale.clone(),
            is_premium: profile.is_premium,
            registered_at: now,
            last_seen_at: now,
            session_count: 1,
        }
    }
}

/// Bare identity row for a player first seen through a data event.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::players)]
pub(crate) struct PlayerStub {
    id: i64,
    registered_at: NaiveDateTime,
    last_seen_at: NaiveDateTime,
}

/// One recorded contact.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::session_log)]
pub struct SessionLogEntry {
    id: i64,
    player_id: i64,
    started_at: NaiveDateTime,
}

/// Insertable contact record.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::session_log)]
pub(crate) struct NewSessionLogEntry {
    player_id: i64,
    started_at: NaiveDateTime,
}

/// A player's stored save.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::game_saves)]
pub struct SaveRecord {
    player_id: i64,
    /// Opaque serialized game state.
    blob: String,
    version_tag: String,
    saved_at: NaiveDateTime,
    backup_count: i64,
}

/// Insertable save; the backup counter starts at its column default.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::game_saves)]
pub(crate) struct NewSave<'a> {
    player_id: i64,
    blob: &'a str,
    version_tag: &'a str,
    saved_at: NaiveDateTime,
}

/// A player's latest statistics snapshot.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Getters, Serialize)]
#[diesel(table_name = schema::player_statistics)]
pub struct StatisticsRecord {
    player_id: i64,
    total_playtime_hours: f64,
    total_resources: f64,
    highest_combo: i64,
    total_clicks: i64,
    buildings_built: i64,
    skills_learned: i64,
    raids_completed: i64,
    achievements_unlocked: i64,
    last_updated: NaiveDateTime,
}

impl StatisticsRecord {
    /// Builds the replacement row for a player's counters.
    #[instrument(skip(counters))]
    pub fn from_counters(player_id: i64, counters: &GameCounters, last_updated: NaiveDateTime) -> Self {
        Self {
            player_id,
            total_playtime_hours: *counters.total_playtime_hours(),
            total_resources: *counters.total_resources(),
            highest_combo: *counters.highest_combo(),
            total_clicks: *counters.total_clicks(),
            buildings_built: *counters.buildings_built(),
            skills_learned: *counters.skills_learned(),
            raids_completed: *counters.raids_completed(),
            achievements_unlocked: *counters.achievements_unlocked(),
            last_updated,
        }
    }

    /// The stored counters.
    pub fn counters(&self) -> GameCounters {
        GameCounters::new(
            self.total_playtime_hours,
            self.total_resources,
            self.highest_combo,
            self.total_clicks,
            self.buildings_built,
            self.skills_learned,
            self.raids_completed,
            self.achievements_unlocked,
        )
    }
}

/// One (player, category) leaderboard row.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::leaderboard_entries)]
pub struct LeaderboardEntry {
    player_id: i64,
    category: String,
    score: f64,
    rank: i64,
    updated_at: NaiveDateTime,
}

impl LeaderboardEntry {
    /// The category this row belongs to, if it is one we know.
    pub fn parsed_category(&self) -> Option<Category> {
        Category::parse(&self.category).ok()
    }

    /// The stored rank as a [`Rank`].
    pub fn standing(&self) -> Rank {
        stored_rank(self.rank)
    }
}

/// Converts a stored rank column into a [`Rank`].
///
/// Ranks are written as 1 or more; anything else reads as unranked.
pub(crate) fn stored_rank(rank: i64) -> Rank {
    match u32::try_from(rank) {
        Ok(position) if position > 0 => Rank::Ranked(position),
        _ => {
            warn!(rank, "Stored rank out of range");
            Rank::Unranked
        }
    }
}

/// Insertable leaderboard row; the rank is assigned by the next recompute.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::leaderboard_entries)]
pub(crate) struct NewLeaderboardEntry<'a> {
    player_id: i64,
    category: &'a str,
    score: f64,
    updated_at: NaiveDateTime,
}
