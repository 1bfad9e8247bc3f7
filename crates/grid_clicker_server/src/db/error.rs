//! Storage error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// Persistence failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Storage error: {} at {}:{}", message, file, line)]
pub struct StorageError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StorageError {
    /// Creates a new storage error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl StorageError {
    /// Prefixes the message with the operation that failed, keeping the
    /// original location.
    pub fn during(self, operation: &str) -> Self {
        Self {
            message: format!("{}: {}", operation, self.message),
            ..self
        }
    }
}

impl From<diesel::result::Error> for StorageError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        let message = match &err {
            Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                format!("Row refers to an unknown player: {}", info.message())
            }
            Error::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                format!("Row rejected by a schema check (unknown category?): {}", info.message())
            }
            Error::DatabaseError(_, info)
                if info.message().contains("locked") || info.message().contains("busy") =>
            {
                format!("Database stayed locked past busy_timeout: {}", info.message())
            }
            Error::NotFound => "Expected row is missing".to_string(),
            other => format!("Query failed: {}", other),
        };
        Self::new(message)
    }
}

impl From<diesel::ConnectionError> for StorageError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("Connection error: {}", err))
    }
}
