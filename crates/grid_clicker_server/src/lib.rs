//! Grid Clicker backend - saves, statistics, and leaderboards
//!
//! Persists each player's latest save and statistics snapshot in SQLite and
//! keeps per-category leaderboards ranked.
//!
//! # Architecture
//!
//! - **Storage**: per-operation SQLite connections; writes run in `BEGIN IMMEDIATE`
//! - **Repositories**: players, saves, statistics, leaderboard ranks
//! - **Backend**: the inbound entry points composed over one store
//! - **API**: an axum router over the backend
//!
//! # Example
//!
//! ```no_run
//! use grid_clicker_server::{BackendSettings, Category, ClickerBackend, SqliteStore};
//! use serde_json::json;
//!
//! # fn example() -> anyhow::Result<()> {
//! let store = SqliteStore::open("grid_clicker.db")?;
//! let backend = ClickerBackend::new(store, BackendSettings::default());
//!
//! backend.on_statistics_event(42, &json!({ "totalResources": 1500, "totalClicks": 320 }))?;
//! let top = backend.on_leaderboard_query(Some(Category::TotalResources))?;
//! println!("{} ranked players", top.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod backend;
mod config;
mod db;
mod error;
mod leaderboard;
mod players;
mod queries;
mod saves;
mod statistics;

pub mod api;

// Crate-level exports - Storage
pub use db::{
    JournalMode, LeaderboardEntry, MIGRATIONS, Player, PlayerProfile, SaveRecord, SessionLogEntry,
    SqliteStore, StatisticsRecord, Storage, StorageError, StoreOptions,
};

// Crate-level exports - Errors
pub use error::BackendError;

// Crate-level exports - Repositories
pub use leaderboard::LeaderboardRanker;
pub use players::PlayerRegistry;
pub use queries::{EXPORT_VERSION, LeaderboardRow, PlayerExport, QueryFacade};
pub use saves::SaveRepository;
pub use statistics::{RegressionPolicy, StatisticsAggregator};

// Crate-level exports - Backend service
pub use backend::{
    BackendSettings, BackupOutcome, ClickerBackend, DEFAULT_LEADERBOARD_SIZE, MAX_LEADERBOARD_SIZE,
    MessageOutcome, StatsView,
};

// Crate-level exports - Configuration
pub use config::{BIND_ENV, ConfigError, DATABASE_ENV, ServerConfig};

// Crate-level exports - Domain types
pub use grid_clicker_core::{
    Category, ClientMessage, GameCounters, MAX_COUNTER, Rank, StatField, StatisticsEvent,
    ValidationError, ValidationErrorKind,
};
