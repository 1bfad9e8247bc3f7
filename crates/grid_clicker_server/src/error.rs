//! Backend error type.

use derive_more::{Display, Error, From};
use grid_clicker_core::ValidationError;

use crate::db::StorageError;

/// Failure of a backend operation.
///
/// Every mutating operation either commits fully or leaves storage
/// unchanged; both variants mean nothing was written. Absent data is never
/// an error and is reported as `None` or [`grid_clicker_core::Rank::Unranked`].
#[derive(Debug, Clone, Display, Error, From)]
pub enum BackendError {
    /// The inbound payload was rejected.
    #[display("{}", _0)]
    Validation(ValidationError),
    /// The underlying storage failed.
    #[display("{}", _0)]
    Storage(StorageError),
}

impl From<diesel::result::Error> for BackendError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::Storage(StorageError::from(err))
    }
}
