//! Leaderboard ranker.
//!
//! A leaderboard entry's score is a projection of the player's statistics
//! row; it is re-read on every recompute, never trusted from a previous pass.
//! Recomputing a category is O(entries in category): every entry is re-scored
//! and re-ranked, then written back.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use grid_clicker_core::{Category, Rank, competition_ranks};
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument, warn};

use crate::db::{
    NewLeaderboardEntry, StatisticsRecord, Storage, StorageError, leaderboard_entries,
    player_statistics, stored_rank,
};

/// Maintains per-category ranks.
#[derive(Debug, Clone)]
pub struct LeaderboardRanker<S> {
    storage: S,
}

impl<S: Storage> LeaderboardRanker<S> {
    /// Creates a ranker over the given storage.
    #[instrument(skip(storage))]
    pub fn new(storage: S) -> Self {
        info!("Creating LeaderboardRanker");
        Self { storage }
    }

    /// Re-scores and re-ranks every entry in `category`, returning how many
    /// entries were ranked.
    ///
    /// Runs in its own write transaction, so it sees one consistent snapshot
    /// of the statistics feeding the category.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the transaction fails; no rank changes
    /// are committed.
    #[instrument(skip(self), fields(category = %category))]
    pub fn recompute_category(&self, category: Category) -> Result<usize, StorageError> {
        let now = crate::db::timestamp_now();
        let ranked = self
            .storage
            .write(|conn| -> Result<usize, StorageError> { Ok(recompute_in(conn, category, now)?) })
            .map_err(|e| e.during("recompute category"))?;
        info!(entries = ranked, "Category recomputed");
        Ok(ranked)
    }

    /// Recomputes every category in one transaction, returning the total
    /// number of entries ranked.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the transaction fails.
    #[instrument(skip(self))]
    pub fn recompute_all(&self) -> Result<usize, StorageError> {
        let now = crate::db::timestamp_now();
        let total = self.storage.write(|conn| -> Result<usize, StorageError> {
            let mut total = 0;
            for category in Category::iter() {
                total += recompute_in(conn, category, now)?;
            }
            Ok(total)
        })
        .map_err(|e| e.during("recompute all categories"))?;
        info!(entries = total, "All categories recomputed");
        Ok(total)
    }

    /// A player's current rank in `category`.
    ///
    /// A player with no entry is [`Rank::Unranked`]; that is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    #[instrument(skip(self), fields(category = %category))]
    pub fn rank_of(&self, player_id: i64, category: Category) -> Result<Rank, StorageError> {
        self.storage.read(|conn| rank_in(conn, player_id, category))
    }
}

pub(crate) fn rank_in(
    conn: &mut SqliteConnection,
    player_id: i64,
    category: Category,
) -> Result<Rank, StorageError> {
    let rank = leaderboard_entries::table
        .filter(leaderboard_entries::player_id.eq(player_id))
        .filter(leaderboard_entries::category.eq(category.as_ref()))
        .select(leaderboard_entries::rank)
        .first::<i64>(conn)
        .optional()?;

    let standing = rank.map_or(Rank::Unranked, stored_rank);
    debug!(player_id, category = %category, ?standing, "Rank looked up");
    Ok(standing)
}

/// Creates the (player, category) entry if missing.
///
/// The new entry is unranked until the recompute that follows it in the
/// same transaction.
pub(crate) fn ensure_entry(
    conn: &mut SqliteConnection,
    player_id: i64,
    category: Category,
    score: f64,
    now: NaiveDateTime,
) -> QueryResult<()> {
    diesel::insert_or_ignore_into(leaderboard_entries::table)
        .values(&NewLeaderboardEntry::new(player_id, category.as_ref(), score, now))
        .execute(conn)?;
    Ok(())
}

/// Categories in which the player already has an entry.
pub(crate) fn categories_of(conn: &mut SqliteConnection, player_id: i64) -> QueryResult<Vec<Category>> {
    let names: Vec<String> = leaderboard_entries::table
        .filter(leaderboard_entries::player_id.eq(player_id))
        .select(leaderboard_entries::category)
        .load(conn)?;

    Ok(names
        .iter()
        .filter_map(|name| match Category::parse(name) {
            Ok(category) => Some(category),
            Err(_) => {
                warn!(player_id, category = %name, "Ignoring unknown leaderboard category");
                None
            }
        })
        .collect())
}

/// Re-scores and re-ranks `category` on the caller's connection.
///
/// Must run inside a write transaction so the statistics it reads and the
/// ranks it writes form one snapshot.
pub(crate) fn recompute_in(
    conn: &mut SqliteConnection,
    category: Category,
    now: NaiveDateTime,
) -> QueryResult<usize> {
    let statistics: Vec<StatisticsRecord> = leaderboard_entries::table
        .inner_join(
            player_statistics::table
                .on(player_statistics::player_id.eq(leaderboard_entries::player_id)),
        )
        .filter(leaderboard_entries::category.eq(category.as_ref()))
        .select(StatisticsRecord::as_select())
        .load(conn)?;

    let ranked = competition_ranks(
        statistics
            .iter()
            .map(|record| (*record.player_id(), category.score(&record.counters()))),
    );

    for entry in &ranked {
        diesel::update(
            leaderboard_entries::table
                .filter(leaderboard_entries::player_id.eq(entry.key))
                .filter(leaderboard_entries::category.eq(category.as_ref())),
        )
        .set((
            leaderboard_entries::score.eq(entry.score),
            leaderboard_entries::rank.eq(i64::from(entry.rank)),
            leaderboard_entries::updated_at.eq(now),
        ))
        .execute(conn)?;
    }

    debug!(category = %category, entries = ranked.len(), "Ranks written");
    Ok(ranked.len())
}
