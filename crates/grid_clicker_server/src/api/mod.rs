//! HTTP surface over [`ClickerBackend`].

mod extract;
mod handlers;
mod response;

pub use extract::{JsonBody, PlayerId, QueryParams};
pub use handlers::{ContactBody, LeaderboardParams, SaveBody};
pub use response::{ApiError, ErrorBody, HealthBody, MessageBody};

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::Request,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tracing::{debug, instrument};

use crate::{ClickerBackend, SqliteStore};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The backend service.
    pub backend: Arc<ClickerBackend<SqliteStore>>,
    /// Store handle for health checks.
    pub store: SqliteStore,
}

impl AppState {
    /// Builds the state over an opened store.
    #[instrument(skip(store, backend))]
    pub fn new(store: SqliteStore, backend: ClickerBackend<SqliteStore>) -> Self {
        Self {
            backend: Arc::new(backend),
            store,
        }
    }
}

/// Builds the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/players/{id}", put(handlers::register_contact))
        .route("/players/{id}/messages", post(handlers::client_message))
        .route("/players/{id}/statistics", post(handlers::report_statistics))
        .route("/players/{id}/save", put(handlers::store_save).get(handlers::fetch_save))
        .route("/players/{id}/backup", post(handlers::record_backup))
        .route("/players/{id}/stats", get(handlers::player_stats))
        .route("/players/{id}/export", get(handlers::player_export))
        .route("/leaderboard", get(handlers::leaderboard))
        .route("/health", get(handlers::health))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}
