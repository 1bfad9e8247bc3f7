//! Tests for leaderboard ranking and queries.

mod common;

use std::collections::BTreeMap;
use std::thread;

use common::{profile, setup_store};
use grid_clicker_server::{
    Category, LeaderboardRanker, PlayerRegistry, QueryFacade, Rank, RegressionPolicy,
    StatisticsAggregator,
};
use serde_json::json;

fn report(stats: &StatisticsAggregator<grid_clicker_server::SqliteStore>, player_id: i64, resources: f64) {
    stats
        .apply_raw_statistics(player_id, &json!({ "totalResources": resources }))
        .expect("Apply failed");
}

#[test]
fn test_higher_score_ranks_first() {
    let (_db, store) = setup_store();
    let stats = StatisticsAggregator::new(store.clone(), RegressionPolicy::Replace);
    let queries = QueryFacade::new(store);

    report(&stats, 1, 100.0);
    report(&stats, 2, 200.0);

    let top = queries.top_n(Category::TotalResources, 10).expect("Query failed");
    assert_eq!(top.len(), 2);
    assert_eq!((*top[0].player_id(), *top[0].rank(), *top[0].score()), (2, 1, 200.0));
    assert_eq!((*top[1].player_id(), *top[1].rank(), *top[1].score()), (1, 2, 100.0));
}

#[test]
fn test_ties_share_rank_and_skip_next() {
    let (_db, store) = setup_store();
    let stats = StatisticsAggregator::new(store.clone(), RegressionPolicy::Replace);
    let ranker = LeaderboardRanker::new(store);

    report(&stats, 1, 100.0);
    report(&stats, 2, 100.0);
    report(&stats, 3, 50.0);

    let rank = |id| ranker.rank_of(id, Category::TotalResources).expect("Rank failed");
    assert_eq!(rank(1), Rank::Ranked(1));
    assert_eq!(rank(2), Rank::Ranked(1));
    assert_eq!(rank(3), Rank::Ranked(3));
}

#[test]
fn test_tied_entries_listed_by_player_id() {
    let (_db, store) = setup_store();
    let stats = StatisticsAggregator::new(store.clone(), RegressionPolicy::Replace);
    let queries = QueryFacade::new(store);

    for id in [30, 10, 20] {
        report(&stats, id, 75.0);
    }

    let first = queries.top_n(Category::TotalResources, 10).expect("Query failed");
    let second = queries.top_n(Category::TotalResources, 10).expect("Query failed");
    let ids: Vec<i64> = first.iter().map(|row| *row.player_id()).collect();
    assert_eq!(ids, vec![10, 20, 30]);
    assert_eq!(first, second);
    assert!(first.iter().all(|row| *row.rank() == 1));
}

#[test]
fn test_top_n_respects_limit() {
    let (_db, store) = setup_store();
    let stats = StatisticsAggregator::new(store.clone(), RegressionPolicy::Replace);
    let queries = QueryFacade::new(store);

    for id in 1..=5 {
        report(&stats, id, id as f64 * 10.0);
    }

    let top = queries.top_n(Category::TotalResources, 3).expect("Query failed");
    let ids: Vec<i64> = top.iter().map(|row| *row.player_id()).collect();
    assert_eq!(ids, vec![5, 4, 3]);
    assert!(queries.top_n(Category::TotalResources, 0).expect("Query failed").is_empty());
}

#[test]
fn test_empty_category_has_no_rows() {
    let (_db, store) = setup_store();
    let queries = QueryFacade::new(store);
    assert!(queries.top_n(Category::HighestCombo, 10).expect("Query failed").is_empty());
}

#[test]
fn test_player_without_entry_is_unranked() {
    let (_db, store) = setup_store();
    let ranker = LeaderboardRanker::new(store);
    assert_eq!(
        ranker.rank_of(99, Category::TotalClicks).expect("Rank failed"),
        Rank::Unranked
    );
}

#[test]
fn test_rows_carry_display_identity() {
    let (_db, store) = setup_store();
    let players = PlayerRegistry::new(store.clone());
    let stats = StatisticsAggregator::new(store.clone(), RegressionPolicy::Replace);
    let queries = QueryFacade::new(store);

    players.register_contact(&profile(1, "Ada")).expect("Register failed");
    report(&stats, 1, 10.0);
    report(&stats, 2, 5.0);

    let top = queries.top_n(Category::TotalResources, 10).expect("Query failed");
    assert_eq!(top[0].display_name().as_deref(), Some("Ada"));
    assert!(top[1].display_name().is_none());
}

#[test]
fn test_omitted_field_refreshes_existing_entry() {
    let (_db, store) = setup_store();
    let stats = StatisticsAggregator::new(store.clone(), RegressionPolicy::Replace);
    let queries = QueryFacade::new(store);

    stats
        .apply_raw_statistics(1, &json!({ "totalResources": 500, "totalClicks": 10 }))
        .expect("Apply failed");
    report(&stats, 2, 300.0);
    stats
        .apply_raw_statistics(1, &json!({ "totalClicks": 20 }))
        .expect("Apply failed");

    let top = queries.top_n(Category::TotalResources, 10).expect("Query failed");
    assert_eq!(*top[0].player_id(), 2);
    assert_eq!((*top[1].player_id(), *top[1].score(), *top[1].rank()), (1, 0.0, 2));
}

#[test]
fn test_recompute_all_counts_every_entry() {
    let (_db, store) = setup_store();
    let stats = StatisticsAggregator::new(store.clone(), RegressionPolicy::Replace);
    let ranker = LeaderboardRanker::new(store);

    stats
        .apply_raw_statistics(1, &json!({ "totalResources": 5, "highestCombo": 3 }))
        .expect("Apply failed");
    stats
        .apply_raw_statistics(2, &json!({ "totalClicks": 8 }))
        .expect("Apply failed");

    assert_eq!(ranker.recompute_all().expect("Recompute failed"), 3);
    assert_eq!(ranker.recompute_category(Category::BuildingsBuilt).expect("Recompute failed"), 0);
    assert_eq!(
        ranker.rank_of(1, Category::HighestCombo).expect("Rank failed"),
        Rank::Ranked(1)
    );
}

#[test]
fn test_concurrent_events_leave_consistent_ranks() {
    let (_db, store) = setup_store();

    let handles: Vec<_> = (1..=8_i64)
        .map(|id| {
            let stats = StatisticsAggregator::new(store.clone(), RegressionPolicy::Replace);
            thread::spawn(move || {
                for round in 1..=5_i64 {
                    stats
                        .apply_raw_statistics(id, &json!({ "totalResources": id * 100 + round }))
                        .expect("Concurrent apply failed");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let top = QueryFacade::new(store)
        .top_n(Category::TotalResources, 10)
        .expect("Query failed");
    let ranked: Vec<(i64, u32, f64)> = top
        .iter()
        .map(|row| (*row.player_id(), *row.rank(), *row.score()))
        .collect();
    let expected: Vec<(i64, u32, f64)> = (1..=8_i64)
        .rev()
        .enumerate()
        .map(|(i, id)| (id, i as u32 + 1, (id * 100 + 5) as f64))
        .collect();
    assert_eq!(ranked, expected);
}

/// Walks every assignment of scores 0..=2 to four players, reporting one
/// player at a time in a rotating order. A score of 0 is sent by omitting
/// the field, so existing entries must be refreshed from the replaced row.
/// After every event the stored board must equal the competition ranking of
/// the scores reported so far.
#[test]
fn test_any_event_sequence_keeps_competition_ranks() {
    let (_db, store) = setup_store();
    let stats = StatisticsAggregator::new(store.clone(), RegressionPolicy::Replace);
    let queries = QueryFacade::new(store);

    const PLAYERS: i64 = 4;
    let mut expected: BTreeMap<i64, f64> = BTreeMap::new();

    for step in 0..3_i64.pow(PLAYERS as u32) {
        for offset in 0..PLAYERS {
            let player_id = (step + offset) % PLAYERS + 1;
            let score = (step / 3_i64.pow((player_id - 1) as u32)) % 3;

            let payload = if score == 0 {
                json!({ "totalClicks": step })
            } else {
                json!({ "totalResources": score })
            };
            stats.apply_raw_statistics(player_id, &payload).expect("Apply failed");

            if score > 0 || expected.contains_key(&player_id) {
                expected.insert(player_id, score as f64);
            }

            let board = queries
                .top_n(Category::TotalResources, 100)
                .expect("Query failed");
            let mut wanted: Vec<(u32, i64, f64)> = expected
                .iter()
                .map(|(id, score)| {
                    let above = expected.values().filter(|other| *other > score).count();
                    (above as u32 + 1, *id, *score)
                })
                .collect();
            wanted.sort_by_key(|(rank, id, _)| (*rank, *id));

            let stored: Vec<(u32, i64, f64)> = board
                .iter()
                .map(|row| (*row.rank(), *row.player_id(), *row.score()))
                .collect();
            assert_eq!(stored, wanted, "board diverged at step {} player {}", step, player_id);
        }
    }
}
