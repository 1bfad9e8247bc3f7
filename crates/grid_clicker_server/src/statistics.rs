//! Statistics aggregator.
//!
//! Each accepted event replaces the player's statistics row wholesale; fields
//! the event omits become zero. Clients must therefore report cumulative
//! totals. The replacement and the leaderboard recomputation it triggers run
//! in one transaction.

use std::collections::BTreeSet;

use diesel::prelude::*;
use grid_clicker_core::{Category, StatisticsEvent, ValidationError, ValidationErrorKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::BackendError;
use crate::db::{StatisticsRecord, Storage, StorageError, player_statistics};
use crate::leaderboard::{categories_of, ensure_entry, recompute_in};
use crate::players::ensure_player;

/// How an event that lowers a stored counter is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionPolicy {
    /// Last write wins, even if it lowers a counter.
    #[default]
    Replace,
    /// Reject events in which any counter is below the stored value.
    RejectRegression,
}

/// Applies statistics events and keeps the leaderboard in step.
#[derive(Debug, Clone)]
pub struct StatisticsAggregator<S> {
    storage: S,
    policy: RegressionPolicy,
}

impl<S: Storage> StatisticsAggregator<S> {
    /// Creates an aggregator over the given storage.
    #[instrument(skip(storage))]
    pub fn new(storage: S, policy: RegressionPolicy) -> Self {
        info!(?policy, "Creating StatisticsAggregator");
        Self { storage, policy }
    }

    /// The configured regression policy.
    pub fn policy(&self) -> RegressionPolicy {
        self.policy
    }

    /// Validates a raw counters object and applies it.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] for a malformed payload (nothing
    /// is written) and [`BackendError::Storage`] if the write fails.
    #[instrument(skip(self, payload))]
    pub fn apply_raw_statistics(
        &self,
        player_id: i64,
        payload: &serde_json::Value,
    ) -> Result<StatisticsRecord, BackendError> {
        let event = StatisticsEvent::from_json(payload).inspect_err(|e| {
            warn!(player_id, error = %e, "Statistics event rejected");
        })?;
        self.apply_statistics_event(player_id, &event)
    }

    /// Applies a validated event.
    ///
    /// Replaces the statistics row, then recomputes every category whose
    /// backing field the event reported, plus every category the player
    /// already has an entry in so no stored score outlives the row it was
    /// projected from.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] if a counter is out of range or
    /// the regression guard rejects the event, or [`BackendError::Storage`]
    /// if the transaction fails.
    /// Either way nothing is committed.
    #[instrument(skip(self, event), fields(reported = event.reported().len()))]
    pub fn apply_statistics_event(
        &self,
        player_id: i64,
        event: &StatisticsEvent,
    ) -> Result<StatisticsRecord, BackendError> {
        debug!("Applying statistics event");
        if let Some(field) = event.counters().first_out_of_range() {
            warn!(player_id, field = %field, "Statistics event out of range");
            return Err(ValidationError::new(ValidationErrorKind::OutOfRange {
                field: field.canonical_key().to_string(),
            })
            .into());
        }
        let now = crate::db::timestamp_now();
        let policy = self.policy;

        let (record, recomputed) = self.storage.write(|conn| -> Result<_, BackendError> {
            ensure_player(conn, player_id, now)?;

            if policy == RegressionPolicy::RejectRegression {
                check_regression(conn, player_id, event)?;
            }

            let record = StatisticsRecord::from_counters(player_id, event.counters(), now);
            diesel::replace_into(player_statistics::table)
                .values(&record)
                .execute(conn)?;

            let reported = event.reported_categories();
            for category in &reported {
                ensure_entry(conn, player_id, *category, category.score(event.counters()), now)?;
            }

            let affected: BTreeSet<Category> = reported
                .into_iter()
                .chain(categories_of(conn, player_id)?)
                .collect();
            for category in &affected {
                recompute_in(conn, *category, now)?;
            }

            Ok((record, affected.len()))
        })?;

        info!(player_id, categories = recomputed, "Statistics applied");
        Ok(record)
    }

    /// Gets a player's statistics. Returns `None` if no event was accepted yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn statistics_of(&self, player_id: i64) -> Result<Option<StatisticsRecord>, StorageError> {
        self.storage.read(|conn| find_statistics(conn, player_id))
    }
}

pub(crate) fn find_statistics(
    conn: &mut SqliteConnection,
    player_id: i64,
) -> Result<Option<StatisticsRecord>, StorageError> {
    let record = player_statistics::table
        .find(player_id)
        .select(StatisticsRecord::as_select())
        .first(conn)
        .optional()?;
    Ok(record)
}

fn check_regression(
    conn: &mut SqliteConnection,
    player_id: i64,
    event: &StatisticsEvent,
) -> Result<(), BackendError> {
    let Some(previous) = find_statistics(conn, player_id)? else {
        return Ok(());
    };
    match event.counters().first_regression_from(&previous.counters()) {
        None => Ok(()),
        Some(field) => {
            warn!(player_id, field = %field, "Statistics event would regress stored counters");
            Err(ValidationError::new(ValidationErrorKind::Regression {
                field: field.canonical_key().to_string(),
            })
            .into())
        }
    }
}
