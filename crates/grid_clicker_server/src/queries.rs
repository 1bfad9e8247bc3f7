//! Read-only queries for the presentation layer.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use derive_getters::Getters;
use diesel::prelude::*;
use grid_clicker_core::{Category, Rank};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument};

use crate::db::{
    LeaderboardEntry, Player, SaveRecord, StatisticsRecord, Storage, StorageError, game_saves,
    leaderboard_entries, players,
};
use crate::leaderboard::rank_in;
use crate::players::find_player;
use crate::statistics::find_statistics;

/// Version of the [`PlayerExport`] layout.
pub const EXPORT_VERSION: &str = "1.0";

/// One leaderboard line joined with the player's display identity.
#[derive(Debug, Clone, PartialEq, Getters, Serialize)]
pub struct LeaderboardRow {
    rank: u32,
    player_id: i64,
    display_name: Option<String>,
    username: Option<String>,
    score: f64,
}

impl LeaderboardRow {
    fn from_joined((entry, display_name, username): (LeaderboardEntry, Option<String>, Option<String>)) -> Self {
        Self {
            rank: entry.standing().position().unwrap_or(u32::MAX),
            player_id: *entry.player_id(),
            display_name,
            username,
            score: *entry.score(),
        }
    }
}

/// Everything stored about one player.
#[derive(Debug, Clone, PartialEq, Getters, Serialize)]
pub struct PlayerExport {
    export_version: String,
    exported_at: NaiveDateTime,
    player: Option<Player>,
    statistics: Option<StatisticsRecord>,
    save: Option<SaveRecord>,
    ranks: BTreeMap<Category, Rank>,
}

/// Read-only accessors.
///
/// Reads take no write lock; they see the last committed snapshot.
#[derive(Debug, Clone)]
pub struct QueryFacade<S> {
    storage: S,
}

impl<S: Storage> QueryFacade<S> {
    /// Creates a façade over the given storage.
    #[instrument(skip(storage))]
    pub fn new(storage: S) -> Self {
        info!("Creating QueryFacade");
        Self { storage }
    }

    /// The best `limit` entries in `category`, best first.
    ///
    /// Ordered by rank, then by player id among equal ranks, so identical
    /// data always yields the identical list.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    #[instrument(skip(self), fields(category = %category))]
    pub fn top_n(&self, category: Category, limit: usize) -> Result<Vec<LeaderboardRow>, StorageError> {
        debug!("Loading leaderboard");
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.storage.read(|conn| {
            let rows: Vec<(LeaderboardEntry, Option<String>, Option<String>)> = leaderboard_entries::table
                .inner_join(players::table)
                .filter(leaderboard_entries::category.eq(category.as_ref()))
                .order((leaderboard_entries::rank.asc(), leaderboard_entries::player_id.asc()))
                .limit(limit)
                .select((
                    LeaderboardEntry::as_select(),
                    players::display_name,
                    players::username,
                ))
                .load(conn)?;

            debug!(count = rows.len(), "Leaderboard loaded");
            Ok(rows.into_iter().map(LeaderboardRow::from_joined).collect())
        })
    }

    /// A player's statistics, or `None` if no event was accepted yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn statistics_of(&self, player_id: i64) -> Result<Option<StatisticsRecord>, StorageError> {
        self.storage.read(|conn| find_statistics(conn, player_id))
    }

    /// A player's identity, or `None` if never seen.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn player_of(&self, player_id: i64) -> Result<Option<Player>, StorageError> {
        self.storage.read(|conn| find_player(conn, player_id))
    }

    /// Snapshot of everything stored for a player.
    ///
    /// Returns `None` when there is no identity, statistics, or save at all.
    /// The reads share one transaction, so the parts are mutually consistent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn export_player(&self, player_id: i64) -> Result<Option<PlayerExport>, StorageError> {
        debug!("Exporting player data");
        let exported_at = crate::db::timestamp_now();

        let export = self.storage.read(|conn| {
            conn.transaction(|conn| -> Result<Option<PlayerExport>, StorageError> {
                let player = find_player(conn, player_id)?;
                let statistics = find_statistics(conn, player_id)?;
                let save = game_saves::table
                    .find(player_id)
                    .select(SaveRecord::as_select())
                    .first(conn)
                    .optional()?;

                if player.is_none() && statistics.is_none() && save.is_none() {
                    return Ok(None);
                }

                let mut ranks = BTreeMap::new();
                for category in Category::iter() {
                    ranks.insert(category, rank_in(conn, player_id, category)?);
                }

                Ok(Some(PlayerExport {
                    export_version: EXPORT_VERSION.to_string(),
                    exported_at,
                    player,
                    statistics,
                    save,
                    ranks,
                }))
            })
        })?;

        match &export {
            Some(_) => info!(player_id, "Player data exported"),
            None => debug!(player_id, "Nothing stored for player"),
        }
        Ok(export)
    }
}
