//! Database persistence layer for identities, saves, statistics, and leaderboards.

mod error;
mod models;
mod schema; // Kept in sync with migrations/ by hand - internal use only
mod store;

pub use error::StorageError;
pub use models::{
    LeaderboardEntry, Player, PlayerProfile, SaveRecord, SessionLogEntry, StatisticsRecord,
};
pub use store::{JournalMode, MIGRATIONS, SqliteStore, Storage, StoreOptions};

pub(crate) use models::{
    NewLeaderboardEntry, NewPlayer, NewSave, NewSessionLogEntry, PlayerStub, stored_rank,
};
pub(crate) use schema::{game_saves, leaderboard_entries, player_statistics, players, session_log};

/// Current time as stored in timestamp columns (UTC).
pub(crate) fn timestamp_now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}
