//! Backend service: the entry points the transport layer calls.

use derive_getters::Getters;
use derive_new::new;
use grid_clicker_core::{Category, ClientMessage, Rank};
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::db::{Player, PlayerProfile, SaveRecord, StatisticsRecord, Storage};
use crate::{
    BackendError, LeaderboardRanker, LeaderboardRow, PlayerExport, PlayerRegistry, QueryFacade,
    RegressionPolicy, SaveRepository, StatisticsAggregator,
};

/// Default number of leaderboard rows served.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// Upper bound on leaderboard rows served per query.
pub const MAX_LEADERBOARD_SIZE: usize = 100;

/// Tunables for [`ClickerBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct BackendSettings {
    /// Handling of statistics events that lower a stored counter.
    pub regression_policy: RegressionPolicy,
    /// Rows returned by [`ClickerBackend::on_leaderboard_query`].
    pub leaderboard_size: usize,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            regression_policy: RegressionPolicy::Replace,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }
}

/// Answer to a stats query.
#[derive(Debug, Clone, PartialEq, Getters, Serialize)]
pub struct StatsView {
    /// Latest statistics, `None` if the player has not reported yet.
    statistics: Option<StatisticsRecord>,
    /// Rank in [`Category::TotalResources`].
    rank: Rank,
}

/// Result of a backup request.
#[derive(Debug, Clone, PartialEq)]
pub enum BackupOutcome {
    /// The counter was incremented; holds the updated save.
    Recorded(SaveRecord),
    /// The player has no save to back up.
    NoSave,
}

/// Result of handling a client message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    /// Statistics were replaced and ranks recomputed.
    StatisticsUpdated(StatisticsRecord),
    /// The save was stored.
    SaveStored(SaveRecord),
    /// The error report was logged.
    ErrorReported,
}

/// Composes the repositories behind the inbound interface.
///
/// Every component gets its own handle to the same storage; none of them
/// holds a connection between calls.
#[derive(Debug, Clone)]
pub struct ClickerBackend<S> {
    players: PlayerRegistry<S>,
    saves: SaveRepository<S>,
    statistics: StatisticsAggregator<S>,
    ranker: LeaderboardRanker<S>,
    queries: QueryFacade<S>,
    settings: BackendSettings,
}

impl<S: Storage + Clone> ClickerBackend<S> {
    /// Creates a backend over the given storage.
    #[instrument(skip(storage))]
    pub fn new(storage: S, settings: BackendSettings) -> Self {
        info!("Creating ClickerBackend");
        let settings = BackendSettings {
            leaderboard_size: settings.leaderboard_size.min(MAX_LEADERBOARD_SIZE),
            ..settings
        };
        Self {
            players: PlayerRegistry::new(storage.clone()),
            saves: SaveRepository::new(storage.clone()),
            statistics: StatisticsAggregator::new(storage.clone(), settings.regression_policy),
            ranker: LeaderboardRanker::new(storage.clone()),
            queries: QueryFacade::new(storage),
            settings,
        }
    }

    /// The effective settings.
    pub fn settings(&self) -> BackendSettings {
        self.settings
    }

    /// The player registry.
    pub fn players(&self) -> &PlayerRegistry<S> {
        &self.players
    }

    /// The save repository.
    pub fn saves(&self) -> &SaveRepository<S> {
        &self.saves
    }

    /// The statistics aggregator.
    pub fn statistics(&self) -> &StatisticsAggregator<S> {
        &self.statistics
    }

    /// The leaderboard ranker.
    pub fn ranker(&self) -> &LeaderboardRanker<S> {
        &self.ranker
    }

    /// The query façade.
    pub fn queries(&self) -> &QueryFacade<S> {
        &self.queries
    }

    /// A player made contact.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Storage`] if the write fails.
    #[instrument(skip(self, profile), fields(player_id = profile.id()))]
    pub fn on_contact(&self, profile: &PlayerProfile) -> Result<Player, BackendError> {
        Ok(self.players.register_contact(profile)?)
    }

    /// A statistics snapshot arrived.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] for a malformed payload and
    /// [`BackendError::Storage`] if the write fails.
    #[instrument(skip(self, payload))]
    pub fn on_statistics_event(
        &self,
        player_id: i64,
        payload: &serde_json::Value,
    ) -> Result<StatisticsRecord, BackendError> {
        self.statistics.apply_raw_statistics(player_id, payload)
    }

    /// A save export arrived.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Storage`] if the write fails.
    #[instrument(skip(self, blob))]
    pub fn on_export_event(
        &self,
        player_id: i64,
        blob: &str,
        version_tag: &str,
    ) -> Result<SaveRecord, BackendError> {
        Ok(self.saves.store_save(player_id, blob, version_tag)?)
    }

    /// The player asked for a backup of their save.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Storage`] if a read or write fails.
    #[instrument(skip(self))]
    pub fn on_backup_request(&self, player_id: i64) -> Result<BackupOutcome, BackendError> {
        if self.saves.fetch_save(player_id)?.is_none() {
            debug!("Backup requested without a save");
            return Ok(BackupOutcome::NoSave);
        }
        Ok(match self.saves.record_backup(player_id)? {
            Some(record) => BackupOutcome::Recorded(record),
            None => BackupOutcome::NoSave,
        })
    }

    /// The player asked for their statistics.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Storage`] if a read fails.
    #[instrument(skip(self))]
    pub fn on_stats_query(&self, player_id: i64) -> Result<StatsView, BackendError> {
        let statistics = self.queries.statistics_of(player_id)?;
        let rank = self.ranker.rank_of(player_id, Category::TotalResources)?;
        Ok(StatsView { statistics, rank })
    }

    /// The player asked for a leaderboard; defaults to total resources.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Storage`] if a read fails.
    #[instrument(skip(self))]
    pub fn on_leaderboard_query(&self, category: Option<Category>) -> Result<Vec<LeaderboardRow>, BackendError> {
        let category = category.unwrap_or_default();
        Ok(self.queries.top_n(category, self.settings.leaderboard_size)?)
    }

    /// The player asked for everything stored about them.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Storage`] if a read fails.
    #[instrument(skip(self))]
    pub fn on_export_query(&self, player_id: i64) -> Result<Option<PlayerExport>, BackendError> {
        Ok(self.queries.export_player(player_id)?)
    }

    /// Dispatches a raw client message envelope.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] for a malformed or unknown
    /// envelope and [`BackendError::Storage`] if a write fails.
    #[instrument(skip(self, payload))]
    pub fn on_client_message(
        &self,
        player_id: i64,
        payload: &serde_json::Value,
    ) -> Result<MessageOutcome, BackendError> {
        let message = ClientMessage::from_json(payload)?;
        debug!(kind = message.kind(), "Dispatching client message");

        match message {
            ClientMessage::GameStatistics(event) => self
                .statistics
                .apply_statistics_event(player_id, &event)
                .map(MessageOutcome::StatisticsUpdated),
            ClientMessage::GameExport(export) => self
                .on_export_event(player_id, export.blob(), export.version_tag())
                .map(MessageOutcome::SaveStored),
            ClientMessage::ErrorReport(report) => {
                error!(
                    player_id,
                    message = %report.message(),
                    details = %report.details(),
                    "Game client reported an error"
                );
                Ok(MessageOutcome::ErrorReported)
            }
        }
    }
}
