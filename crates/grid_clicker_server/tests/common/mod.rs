//! Shared setup for integration tests.

#![allow(dead_code)]

use grid_clicker_server::{BackendSettings, ClickerBackend, PlayerProfile, SqliteStore};
use tempfile::TempDir;

/// Opens a migrated store in a fresh directory. The directory handle must
/// stay in scope to keep the database (and its WAL files) alive.
pub fn setup_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("grid_clicker.db");
    let store = SqliteStore::open(db_path.to_str().expect("Invalid path")).expect("Failed to open store");
    (dir, store)
}

/// A backend with default settings over a fresh store.
pub fn setup_backend() -> (TempDir, ClickerBackend<SqliteStore>) {
    setup_backend_with(BackendSettings::default())
}

/// A backend with explicit settings over a fresh store.
pub fn setup_backend_with(settings: BackendSettings) -> (TempDir, ClickerBackend<SqliteStore>) {
    let (dir, store) = setup_store();
    (dir, ClickerBackend::new(store, settings))
}

/// A profile with just a display name.
pub fn profile(id: i64, name: &str) -> PlayerProfile {
    PlayerProfile::new(id, Some(name.to_string()), None, None, false)
}
