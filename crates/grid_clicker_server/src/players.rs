//! Player identities and their contact history.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::{
    NewPlayer, NewSessionLogEntry, Player, PlayerProfile, PlayerStub, SessionLogEntry, Storage,
    StorageError, players, session_log,
};

/// Registry of player identities.
///
/// Identities are created on first contact and updated on every later one;
/// they are never deleted.
#[derive(Debug, Clone)]
pub struct PlayerRegistry<S> {
    storage: S,
}

impl<S: Storage> PlayerRegistry<S> {
    /// Creates a registry over the given storage.
    #[instrument(skip(storage))]
    pub fn new(storage: S) -> Self {
        info!("Creating PlayerRegistry");
        Self { storage }
    }

    /// Records a contact from the player described by `profile`.
    ///
    /// Creates the identity on first contact. On later contacts refreshes the
    /// profile fields and last-seen time and increments the session count.
    /// Every contact appends to the session log.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails; nothing is committed.
    #[instrument(skip(self, profile), fields(player_id = profile.id()))]
    pub fn register_contact(&self, profile: &PlayerProfile) -> Result<Player, StorageError> {
        debug!("Registering contact");
        let now = crate::db::timestamp_now();

        let player = self.storage.write(|conn| -> Result<Player, StorageError> {
            let player = diesel::insert_into(players::table)
                .values(&NewPlayer::from_profile(profile, now))
                .on_conflict(players::id)
                .do_update()
                .set((
                    players::display_name.eq(profile.display_name().clone()),
                    players::username.eq(profile.username().clone()),
                    players::locale.eq(profile.locale().clone()),
                    players::is_premium.eq(*profile.is_premium()),
                    players::last_seen_at.eq(now),
                    players::session_count.eq(players::session_count + 1),
                ))
                .returning(Player::as_returning())
                .get_result(conn)?;

            diesel::insert_into(session_log::table)
                .values(&NewSessionLogEntry::new(*player.id(), now))
                .execute(conn)?;

            Ok(player)
        })
        .map_err(|e| e.during("register contact"))?;

        info!(
            player_id = player.id(),
            session_count = player.session_count(),
            "Contact registered"
        );
        Ok(player)
    }

    /// Gets a player by id. Returns `None` if never seen.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get(&self, player_id: i64) -> Result<Option<Player>, StorageError> {
        self.storage.read(|conn| find_player(conn, player_id))
    }

    /// Most recent contacts for a player, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn recent_sessions(&self, player_id: i64, limit: usize) -> Result<Vec<SessionLogEntry>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.storage.read(|conn| {
            let sessions = session_log::table
                .filter(session_log::player_id.eq(player_id))
                .order((session_log::started_at.desc(), session_log::id.desc()))
                .limit(limit)
                .select(SessionLogEntry::as_select())
                .load(conn)?;
            debug!(count = sessions.len(), "Sessions loaded");
            Ok(sessions)
        })
    }
}

pub(crate) fn find_player(conn: &mut SqliteConnection, player_id: i64) -> Result<Option<Player>, StorageError> {
    let player = players::table
        .find(player_id)
        .select(Player::as_select())
        .first(conn)
        .optional()?;
    Ok(player)
}

/// Inserts a bare identity row unless one exists.
///
/// Data events may arrive before any contact; the row keeps every stored
/// record joinable to an identity.
pub(crate) fn ensure_player(
    conn: &mut SqliteConnection,
    player_id: i64,
    now: NaiveDateTime,
) -> QueryResult<()> {
    let inserted = diesel::insert_or_ignore_into(players::table)
        .values(&PlayerStub::new(player_id, now, now))
        .execute(conn)?;
    if inserted > 0 {
        debug!(player_id, "Identity created from data event");
    }
    Ok(())
}
