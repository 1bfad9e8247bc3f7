//! Validation error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// What was wrong with a rejected payload.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ValidationErrorKind {
    /// The payload was not a JSON object.
    #[display("payload is not a JSON object")]
    NotAMapping,
    /// A known field held something other than a number.
    #[display("field '{field}' is not a number")]
    NotNumeric {
        /// Key the value was found under.
        field: String,
    },
    /// A known field held a negative number.
    #[display("field '{field}' is negative")]
    Negative {
        /// Key the value was found under.
        field: String,
    },
    /// An integer counter held a fractional number.
    #[display("field '{field}' must be a whole number")]
    NotInteger {
        /// Key the value was found under.
        field: String,
    },
    /// An integer counter does not fit in 64 bits.
    #[display("field '{field}' is out of range")]
    OutOfRange {
        /// Key the value was found under.
        field: String,
    },
    /// A counter is lower than the value already stored.
    #[display("field '{field}' would regress stored progress")]
    Regression {
        /// Canonical key of the regressing counter.
        field: String,
    },
    /// A required envelope field is missing.
    #[display("missing field '{field}'")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },
    /// The client message `type` is not one we handle.
    #[display("unknown message type '{message_type}'")]
    UnknownMessageType {
        /// The type tag received.
        message_type: String,
    },
    /// A leaderboard category name was not recognised.
    #[display("unknown leaderboard category '{name}'")]
    UnknownCategory {
        /// The name received.
        name: String,
    },
}

/// A rejected inbound payload, with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Validation error: {} at {}:{}", kind, file, line)]
pub struct ValidationError {
    /// What was wrong.
    pub kind: ValidationErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ValidationError {
    /// Creates a new validation error with caller location tracking.
    #[track_caller]
    #[instrument]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Returns what was wrong with the payload.
    pub fn kind(&self) -> &ValidationErrorKind {
        &self.kind
    }
}
