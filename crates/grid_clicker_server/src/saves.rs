//! Save repository: one opaque save blob per player.

use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::{NewSave, SaveRecord, Storage, StorageError, game_saves};
use crate::players::ensure_player;

/// Reads and writes player saves.
///
/// Backups are counted, not versioned: the counter is the only durable
/// record that a backup was requested.
#[derive(Debug, Clone)]
pub struct SaveRepository<S> {
    storage: S,
}

impl<S: Storage> SaveRepository<S> {
    /// Creates a repository over the given storage.
    #[instrument(skip(storage))]
    pub fn new(storage: S) -> Self {
        info!("Creating SaveRepository");
        Self { storage }
    }

    /// Stores a save, replacing any previous blob and version tag.
    ///
    /// The blob is not inspected. An existing backup count is kept.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails; nothing is committed.
    #[instrument(skip(self, blob), fields(blob_len = blob.len()))]
    pub fn store_save(&self, player_id: i64, blob: &str, version_tag: &str) -> Result<SaveRecord, StorageError> {
        debug!("Storing save");
        let now = crate::db::timestamp_now();

        let record = self.storage.write(|conn| -> Result<SaveRecord, StorageError> {
            ensure_player(conn, player_id, now)?;
            let record = diesel::insert_into(game_saves::table)
                .values(&NewSave::new(player_id, blob, version_tag, now))
                .on_conflict(game_saves::player_id)
                .do_update()
                .set((
                    game_saves::blob.eq(blob),
                    game_saves::version_tag.eq(version_tag),
                    game_saves::saved_at.eq(now),
                ))
                .returning(SaveRecord::as_returning())
                .get_result(conn)?;
            Ok(record)
        })
        .map_err(|e| e.during("store save"))?;

        info!(
            player_id,
            version = %record.version_tag(),
            backup_count = record.backup_count(),
            "Save stored"
        );
        Ok(record)
    }

    /// Gets a player's save. Returns `None` if the player never saved.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn fetch_save(&self, player_id: i64) -> Result<Option<SaveRecord>, StorageError> {
        debug!("Fetching save");
        self.storage.read(|conn| {
            let record = game_saves::table
                .find(player_id)
                .select(SaveRecord::as_select())
                .first(conn)
                .optional()?;
            Ok(record)
        })
    }

    /// Increments the backup counter, leaving the blob untouched.
    ///
    /// A backup presupposes a save: with no save this is a no-op returning
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails.
    #[instrument(skip(self))]
    pub fn record_backup(&self, player_id: i64) -> Result<Option<SaveRecord>, StorageError> {
        debug!("Recording backup");
        let record = self.storage.write(|conn| -> Result<Option<SaveRecord>, StorageError> {
            let record = diesel::update(game_saves::table.find(player_id))
                .set(game_saves::backup_count.eq(game_saves::backup_count + 1))
                .returning(SaveRecord::as_returning())
                .get_result(conn)
                .optional()?;
            Ok(record)
        })
        .map_err(|e| e.during("record backup"))?;

        match &record {
            Some(saved) => info!(player_id, backup_count = saved.backup_count(), "Backup recorded"),
            None => debug!(player_id, "No save to back up"),
        }
        Ok(record)
    }
}
