//! Storage access.
//!
//! Components never share a long-lived connection. Each operation asks a
//! [`Storage`] for a fresh connection, uses it, and drops it on every exit
//! path. Writes go through [`Storage::write`], which wraps the closure in a
//! `BEGIN IMMEDIATE` transaction: SQLite then admits one writer at a time, so
//! a statistics upsert and the rank recomputation it triggers commit together
//! or not at all, and two recomputations can never interleave.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use tracing::{debug, info, instrument};

use crate::db::StorageError;

/// SQL migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Scoped access to the database.
pub trait Storage: std::fmt::Debug + Send + Sync {
    /// Opens a connection for the duration of one operation.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database cannot be opened.
    fn connection(&self) -> Result<SqliteConnection, StorageError>;

    /// Runs `f` on a plain connection.
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, E>,
        E: From<StorageError>,
    {
        let mut conn = self.connection()?;
        f(&mut conn)
    }

    /// Runs `f` inside an immediate transaction.
    ///
    /// Commits when `f` returns `Ok`; rolls back on `Err` or panic.
    fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, E>,
        E: From<StorageError> + From<diesel::result::Error>,
    {
        let mut conn = self.connection()?;
        conn.immediate_transaction(f)
    }
}

/// SQLite journal mode applied to every connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum JournalMode {
    /// Write-ahead log; readers never wait for the writer.
    #[default]
    Wal,
    /// Rollback journal.
    Delete,
}

/// Per-connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Journal mode.
    pub journal_mode: JournalMode,
    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5_000,
        }
    }
}

/// [`Storage`] backed by a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: String,
    options: StoreOptions,
}

impl SqliteStore {
    /// Opens the database at `db_path` with default options and applies
    /// pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the path is in-memory, the file cannot be
    /// opened, or a migration fails.
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub fn open(db_path: impl AsRef<str>) -> Result<Self, StorageError> {
        Self::open_with(db_path, StoreOptions::default())
    }

    /// Opens the database at `db_path` with explicit options.
    ///
    /// # Errors
    ///
    /// Same as [`SqliteStore::open`].
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub fn open_with(db_path: impl AsRef<str>, options: StoreOptions) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref().to_string();
        if db_path.is_empty() || db_path.contains(":memory:") || db_path.contains("mode=memory") {
            return Err(StorageError::new(format!(
                "In-memory database '{}' is not supported; every operation opens its own connection",
                db_path
            )));
        }

        info!(path = %db_path, journal_mode = ?options.journal_mode, "Opening SqliteStore");
        let store = Self { db_path, options };
        store.run_migrations()?;
        Ok(store)
    }

    /// Applies pending migrations, returning how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, StorageError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StorageError::new(format!("Migration failed: {}", e)))?;
        info!(applied = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Path of the database file.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Connection settings.
    pub fn options(&self) -> StoreOptions {
        self.options
    }
}

impl Storage for SqliteStore {
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StorageError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| StorageError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;

        // busy_timeout first so the journal switch itself can wait on a lock.
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = {}; PRAGMA foreign_keys = ON;",
            self.options.busy_timeout_ms,
            self.options.journal_mode.as_ref(),
        ))
        .map_err(|e| StorageError::new(format!("Failed to configure connection: {}", e)))?;

        Ok(conn)
    }
}
