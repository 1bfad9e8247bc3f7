//! Tests for the backend entry points.

mod common;

use common::{profile, setup_backend, setup_backend_with};
use grid_clicker_server::{
    BackendError, BackendSettings, BackupOutcome, Category, EXPORT_VERSION, MAX_LEADERBOARD_SIZE,
    MessageOutcome, Rank, RegressionPolicy, ValidationErrorKind,
};
use serde_json::json;

#[test]
fn test_statistics_message_updates_record() {
    let (_db, backend) = setup_backend();

    let outcome = backend
        .on_client_message(1, &json!({ "type": "game_statistics", "stats": { "totalClicks": 42, "maxCombo": 7 } }))
        .expect("Dispatch failed");

    match outcome {
        MessageOutcome::StatisticsUpdated(record) => {
            assert_eq!(*record.total_clicks(), 42);
            assert_eq!(*record.highest_combo(), 7);
        }
        other => panic!("Expected statistics update, got {:?}", other),
    }
}

#[test]
fn test_export_message_stores_save_with_version() {
    let (_db, backend) = setup_backend();

    let outcome = backend
        .on_client_message(2, &json!({ "type": "game_export", "data": { "version": "2.3", "resources": 10 } }))
        .expect("Dispatch failed");

    let MessageOutcome::SaveStored(record) = outcome else {
        panic!("Expected stored save");
    };
    assert_eq!(record.version_tag(), "2.3");
    let stored: serde_json::Value = serde_json::from_str(record.blob()).expect("Blob is JSON");
    assert_eq!(stored["resources"], 10);
}

#[test]
fn test_error_report_writes_nothing() {
    let (_db, backend) = setup_backend();

    let outcome = backend
        .on_client_message(3, &json!({ "type": "error_report", "error": { "message": "boom" } }))
        .expect("Dispatch failed");

    assert_eq!(outcome, MessageOutcome::ErrorReported);
    assert!(backend.on_export_query(3).expect("Export failed").is_none());
}

#[test]
fn test_unknown_message_type_is_rejected() {
    let (_db, backend) = setup_backend();

    let err = backend
        .on_client_message(3, &json!({ "type": "cheat_code" }))
        .expect_err("Should reject");
    match err {
        BackendError::Validation(e) => {
            assert!(matches!(e.kind(), ValidationErrorKind::UnknownMessageType { .. }));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[test]
fn test_backup_without_save_reports_no_save() {
    let (_db, backend) = setup_backend();
    assert_eq!(backend.on_backup_request(5).expect("Backup failed"), BackupOutcome::NoSave);
}

#[test]
fn test_backup_with_save_is_recorded() {
    let (_db, backend) = setup_backend();
    backend.on_export_event(5, "{}", "1.0").expect("Export failed");

    match backend.on_backup_request(5).expect("Backup failed") {
        BackupOutcome::Recorded(record) => assert_eq!(*record.backup_count(), 1),
        BackupOutcome::NoSave => panic!("Save should exist"),
    }
}

#[test]
fn test_stats_query_for_unknown_player() {
    let (_db, backend) = setup_backend();
    let view = backend.on_stats_query(6).expect("Query failed");
    assert!(view.statistics().is_none());
    assert_eq!(*view.rank(), Rank::Unranked);
}

#[test]
fn test_stats_query_reports_resource_rank() {
    let (_db, backend) = setup_backend();
    backend
        .on_statistics_event(6, &json!({ "totalResources": 10 }))
        .expect("Apply failed");
    backend
        .on_statistics_event(7, &json!({ "totalResources": 20 }))
        .expect("Apply failed");

    let view = backend.on_stats_query(6).expect("Query failed");
    assert_eq!(*view.rank(), Rank::Ranked(2));
    assert_eq!(view.statistics().as_ref().map(|s| *s.total_resources()), Some(10.0));
}

#[test]
fn test_leaderboard_query_defaults_to_total_resources() {
    let (_db, backend) = setup_backend_with(BackendSettings::new(RegressionPolicy::Replace, 2));
    for id in 1..=3 {
        backend
            .on_statistics_event(id, &json!({ "totalResources": id * 10, "totalClicks": 100 - id }))
            .expect("Apply failed");
    }

    let resources = backend.on_leaderboard_query(None).expect("Query failed");
    let ids: Vec<i64> = resources.iter().map(|row| *row.player_id()).collect();
    assert_eq!(ids, vec![3, 2]);

    let clicks = backend
        .on_leaderboard_query(Some(Category::TotalClicks))
        .expect("Query failed");
    let ids: Vec<i64> = clicks.iter().map(|row| *row.player_id()).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_leaderboard_size_is_capped() {
    let (_db, backend) = setup_backend_with(BackendSettings::new(RegressionPolicy::Replace, 10_000));
    assert_eq!(backend.settings().leaderboard_size, MAX_LEADERBOARD_SIZE);
}

#[test]
fn test_export_query_collects_everything() {
    let (_db, backend) = setup_backend();
    backend.on_contact(&profile(8, "Eve")).expect("Contact failed");
    backend
        .on_statistics_event(8, &json!({ "totalResources": 50, "highestCombo": 4 }))
        .expect("Apply failed");
    backend.on_export_event(8, "{\"a\":1}", "1.0").expect("Export failed");

    let export = backend.on_export_query(8).expect("Export failed").expect("Nothing exported");
    assert_eq!(export.export_version(), EXPORT_VERSION);
    assert_eq!(export.player().as_ref().and_then(|p| p.display_name().clone()).as_deref(), Some("Eve"));
    assert!(export.statistics().is_some());
    assert_eq!(export.save().as_ref().map(|s| s.blob().as_str()), Some("{\"a\":1}"));
    assert_eq!(export.ranks()[&Category::TotalResources], Rank::Ranked(1));
    assert_eq!(export.ranks()[&Category::TotalClicks], Rank::Unranked);

    let serialized = serde_json::to_value(&export).expect("Serialize failed");
    assert_eq!(serialized["ranks"]["highest_combo"], 1);
    assert!(serialized["ranks"]["buildings_built"].is_null());
}

#[test]
fn test_export_query_for_unknown_player_is_none() {
    let (_db, backend) = setup_backend();
    assert!(backend.on_export_query(404).expect("Export failed").is_none());
}
