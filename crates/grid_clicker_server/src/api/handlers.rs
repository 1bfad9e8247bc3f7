//! Request handlers.
//!
//! Storage is synchronous; every handler moves its backend call onto the
//! blocking pool.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use grid_clicker_core::{Category, UNKNOWN_VERSION};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::api::AppState;
use crate::api::extract::{JsonBody, PlayerId, QueryParams};
use crate::api::response::{ApiError, HealthBody, MessageBody};
use crate::{
    BackendError, BackupOutcome, ClickerBackend, LeaderboardRow, MAX_LEADERBOARD_SIZE, Player,
    PlayerExport, PlayerProfile, SaveRecord, SqliteStore, StatisticsRecord, StatsView, Storage,
};

/// Body of `PUT /players/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactBody {
    /// Name shown on leaderboards.
    pub display_name: Option<String>,
    /// Platform handle.
    pub username: Option<String>,
    /// Preferred language.
    pub locale: Option<String>,
    /// Premium subscription flag.
    #[serde(default)]
    pub is_premium: bool,
}

/// Body of `PUT /players/{id}/save`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveBody {
    /// Opaque serialized game state.
    pub blob: String,
    /// Client version tag.
    pub version: Option<String>,
}

/// Query string of `GET /leaderboard`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardParams {
    /// Category name; total resources when absent.
    pub category: Option<String>,
    /// Row count; the configured size when absent.
    pub limit: Option<usize>,
}

async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&ClickerBackend<SqliteStore>) -> Result<T, BackendError> + Send + 'static,
    T: Send + 'static,
{
    let backend = Arc::clone(&state.backend);
    tokio::task::spawn_blocking(move || f(&backend))
        .await
        .map_err(|e| ApiError::internal(format!("Blocking task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// `PUT /players/{id}`
#[instrument(skip(state, body))]
pub async fn register_contact(
    State(state): State<AppState>,
    PlayerId(player_id): PlayerId,
    JsonBody(body): JsonBody<ContactBody>,
) -> Result<Json<Player>, ApiError> {
    let profile = PlayerProfile::new(player_id, body.display_name, body.username, body.locale, body.is_premium);
    let player = blocking(&state, move |backend| backend.on_contact(&profile)).await?;
    Ok(Json(player))
}

/// `POST /players/{id}/messages`
#[instrument(skip(state, payload))]
pub async fn client_message(
    State(state): State<AppState>,
    PlayerId(player_id): PlayerId,
    JsonBody(payload): JsonBody<serde_json::Value>,
) -> Result<Json<MessageBody>, ApiError> {
    let outcome = blocking(&state, move |backend| backend.on_client_message(player_id, &payload)).await?;
    Ok(Json(outcome.into()))
}

/// `POST /players/{id}/statistics`
#[instrument(skip(state, payload))]
pub async fn report_statistics(
    State(state): State<AppState>,
    PlayerId(player_id): PlayerId,
    JsonBody(payload): JsonBody<serde_json::Value>,
) -> Result<Json<StatisticsRecord>, ApiError> {
    let record = blocking(&state, move |backend| backend.on_statistics_event(player_id, &payload)).await?;
    Ok(Json(record))
}

/// `PUT /players/{id}/save`
#[instrument(skip(state, body))]
pub async fn store_save(
    State(state): State<AppState>,
    PlayerId(player_id): PlayerId,
    JsonBody(body): JsonBody<SaveBody>,
) -> Result<Json<SaveRecord>, ApiError> {
    let version = body.version.unwrap_or_else(|| UNKNOWN_VERSION.to_string());
    let record = blocking(&state, move |backend| {
        backend.on_export_event(player_id, &body.blob, &version)
    })
    .await?;
    Ok(Json(record))
}

/// `GET /players/{id}/save`
#[instrument(skip(state))]
pub async fn fetch_save(
    State(state): State<AppState>,
    PlayerId(player_id): PlayerId,
) -> Result<Json<SaveRecord>, ApiError> {
    blocking(&state, move |backend| Ok(backend.saves().fetch_save(player_id)?))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No save for player {}", player_id)))
}

/// `POST /players/{id}/backup`
#[instrument(skip(state))]
pub async fn record_backup(
    State(state): State<AppState>,
    PlayerId(player_id): PlayerId,
) -> Result<Json<SaveRecord>, ApiError> {
    match blocking(&state, move |backend| backend.on_backup_request(player_id)).await? {
        BackupOutcome::Recorded(record) => Ok(Json(record)),
        BackupOutcome::NoSave => Err(ApiError::not_found(format!("No save for player {}", player_id))),
    }
}

/// `GET /players/{id}/stats`
#[instrument(skip(state))]
pub async fn player_stats(
    State(state): State<AppState>,
    PlayerId(player_id): PlayerId,
) -> Result<Json<StatsView>, ApiError> {
    let view = blocking(&state, move |backend| backend.on_stats_query(player_id)).await?;
    Ok(Json(view))
}

/// `GET /players/{id}/export`
#[instrument(skip(state))]
pub async fn player_export(
    State(state): State<AppState>,
    PlayerId(player_id): PlayerId,
) -> Result<Json<PlayerExport>, ApiError> {
    blocking(&state, move |backend| backend.on_export_query(player_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Nothing stored for player {}", player_id)))
}

/// `GET /leaderboard?category=&limit=`
#[instrument(skip(state))]
pub async fn leaderboard(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<LeaderboardParams>,
) -> Result<Json<Vec<LeaderboardRow>>, ApiError> {
    let category = params
        .category
        .as_deref()
        .map(Category::parse)
        .transpose()
        .map_err(|e| ApiError::from(BackendError::from(e)))?;

    let rows = blocking(&state, move |backend| match params.limit {
        Some(limit) => {
            let category = category.unwrap_or_default();
            Ok(backend.queries().top_n(category, limit.min(MAX_LEADERBOARD_SIZE))?)
        }
        None => backend.on_leaderboard_query(category),
    })
    .await?;

    debug!(count = rows.len(), "Leaderboard served");
    Ok(Json(rows))
}

/// `GET /health`
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    let store = state.store.clone();
    let reachable = tokio::task::spawn_blocking(move || store.connection().is_ok())
        .await
        .unwrap_or(false);

    let (status, label) = if reachable {
        (StatusCode::OK, "ok")
    } else {
        warn!("Health check could not reach storage");
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(HealthBody {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
