//! Response bodies and error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{BackendError, MessageOutcome, SaveRecord, StatisticsRecord};

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Stable machine-readable code.
    pub code: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthBody {
    /// `"ok"` when storage answers.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Body describing what a client message did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageBody {
    /// Statistics were replaced.
    StatisticsUpdated {
        /// The stored row.
        statistics: StatisticsRecord,
    },
    /// A save was stored.
    SaveStored {
        /// The stored save.
        save: SaveRecord,
    },
    /// The error report was logged.
    ErrorReported,
}

impl From<MessageOutcome> for MessageBody {
    fn from(outcome: MessageOutcome) -> Self {
        match outcome {
            MessageOutcome::StatisticsUpdated(statistics) => Self::StatisticsUpdated { statistics },
            MessageOutcome::SaveStored(save) => Self::SaveStored { save },
            MessageOutcome::ErrorReported => Self::ErrorReported,
        }
    }
}

/// An HTTP error.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn with_code(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                code: code.to_string(),
            },
        }
    }

    /// 404 for data that does not exist.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// 4xx for a path, query, or body that could not be extracted.
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(%status, error = %message, "Malformed request");
        Self::with_code(status, "BAD_REQUEST", message)
    }

    /// 500 for failures on our side.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE", message)
    }

    /// The status code sent.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Validation(e) => {
                warn!(error = %e, "Request rejected");
                Self::with_code(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION", e.kind().to_string())
            }
            BackendError::Storage(e) => {
                error!(error = %e, "Storage failure");
                Self::internal(e.message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
