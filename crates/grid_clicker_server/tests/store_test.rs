//! Tests for opening and configuring the store.

mod common;

use common::setup_store;
use diesel::RunQueryDsl;
use diesel::connection::SimpleConnection;
use diesel::sql_types::Text;
use grid_clicker_server::{
    JournalMode, PlayerRegistry, SqliteStore, Storage, StorageError, StoreOptions,
};
use tempfile::TempDir;

#[derive(diesel::QueryableByName)]
struct JournalRow {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}

fn journal_mode_of(store: &SqliteStore) -> String {
    let mut conn = store.connection().expect("Connection failed");
    let rows: Vec<JournalRow> = diesel::sql_query("PRAGMA journal_mode")
        .load(&mut conn)
        .expect("Pragma failed");
    rows[0].journal_mode.to_lowercase()
}

#[test]
fn test_in_memory_database_is_rejected() {
    let result = SqliteStore::open(":memory:");
    assert!(result.is_err(), "In-memory database should be rejected");
}

#[test]
fn test_migrations_are_idempotent() {
    let (_db, store) = setup_store();
    assert_eq!(store.run_migrations().expect("Migrations failed"), 0);
}

#[test]
fn test_default_journal_mode_is_wal() {
    let (_db, store) = setup_store();
    assert_eq!(journal_mode_of(&store), "wal");
}

#[test]
fn test_delete_journal_mode_is_applied() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("rollback.db");
    let options = StoreOptions {
        journal_mode: JournalMode::Delete,
        ..StoreOptions::default()
    };
    let store = SqliteStore::open_with(path.to_str().expect("Invalid path"), options)
        .expect("Failed to open store");
    assert_eq!(journal_mode_of(&store), "delete");
}

#[test]
fn test_failed_write_rolls_back() {
    let (_db, store) = setup_store();

    let result: Result<(), grid_clicker_server::StorageError> = store.write(|conn| {
        conn.batch_execute("INSERT INTO players (id) VALUES (1)")?;
        Err(grid_clicker_server::StorageError::new("abort"))
    });
    assert!(result.is_err());

    let players = PlayerRegistry::new(store);
    assert!(players.get(1).expect("Query failed").is_none());
}

#[test]
fn test_failed_write_names_operation_and_cause() {
    let (_db, store) = setup_store();

    let result: Result<usize, StorageError> = store.write(|conn| {
        diesel::sql_query("INSERT INTO game_saves (player_id, blob, version_tag) VALUES (99, 'x', '1.0')")
            .execute(conn)
            .map_err(|e| StorageError::from(e).during("attach save"))
    });

    let err = result.expect_err("Save for an unknown player should fail");
    assert!(err.message.starts_with("attach save: "), "got {}", err.message);
    assert!(err.message.contains("unknown player"), "got {}", err.message);
}
