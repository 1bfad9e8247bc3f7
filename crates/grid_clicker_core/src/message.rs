//! The web client's message envelope.
//!
//! The game posts JSON objects tagged by a `type` field. Three types carry
//! data for the backend:
//!
//! - `game_statistics`: counters under `stats`
//! - `game_export`: the full save under `data`, with an optional `data.version`
//! - `error_report`: client-side failure details under `error`

use derive_getters::Getters;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::{StatisticsEvent, ValidationError, ValidationErrorKind};

/// Version tag recorded when an export does not name one.
pub const UNKNOWN_VERSION: &str = "unknown";

/// A save export: the opaque blob plus its version tag.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct SaveExport {
    /// Serialized save, stored verbatim.
    blob: String,
    /// Free-text game version.
    version_tag: String,
}

impl SaveExport {
    /// Creates a save export.
    pub fn new(blob: impl Into<String>, version_tag: impl Into<String>) -> Self {
        Self {
            blob: blob.into(),
            version_tag: version_tag.into(),
        }
    }
}

/// A client-side error report.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct ErrorReport {
    /// Error message, or `"Unknown error"`.
    message: String,
    /// The whole `error` object as sent.
    details: Value,
}

/// A validated inbound message from the game client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Cumulative statistics snapshot.
    GameStatistics(StatisticsEvent),
    /// Full save export.
    GameExport(SaveExport),
    /// Client-side error report.
    ErrorReport(ErrorReport),
}

impl ClientMessage {
    /// Validates a raw client envelope.
    ///
    /// A missing `stats` or `data` object is treated as empty, matching what
    /// the client sends when it has nothing to report.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the envelope is not an object, has no
    /// string `type`, names an unknown type, or carries invalid statistics.
    #[instrument(skip(payload))]
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let map = payload
            .as_object()
            .ok_or_else(|| ValidationError::new(ValidationErrorKind::NotAMapping))?;

        let message_type = map.get("type").and_then(Value::as_str).ok_or_else(|| {
            ValidationError::new(ValidationErrorKind::MissingField {
                field: "type".to_string(),
            })
        })?;
        debug!(message_type, "Parsing client message");

        match message_type {
            "game_statistics" => {
                let stats = section(map, "stats");
                StatisticsEvent::from_json(&stats).map(Self::GameStatistics)
            }
            "game_export" => Ok(Self::GameExport(parse_export(&section(map, "data")))),
            "error_report" => Ok(Self::ErrorReport(parse_error_report(map))),
            other => {
                warn!(message_type = other, "Unknown client message type");
                Err(ValidationError::new(ValidationErrorKind::UnknownMessageType {
                    message_type: other.to_string(),
                }))
            }
        }
    }

    /// The envelope `type` this message was parsed from.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GameStatistics(_) => "game_statistics",
            Self::GameExport(_) => "game_export",
            Self::ErrorReport(_) => "error_report",
        }
    }
}

fn section(map: &Map<String, Value>, key: &str) -> Value {
    match map.get(key) {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value.clone(),
    }
}

fn parse_export(data: &Value) -> SaveExport {
    let version_tag = match data.get("version") {
        None | Some(Value::Null) => UNKNOWN_VERSION.to_string(),
        Some(Value::String(version)) => version.clone(),
        Some(other) => other.to_string(),
    };
    SaveExport::new(data.to_string(), version_tag)
}

fn parse_error_report(map: &Map<String, Value>) -> ErrorReport {
    let details = map.get("error").cloned().unwrap_or(Value::Null);
    let message = details
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string();
    ErrorReport { message, details }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn statistics_envelope_is_parsed() {
        let message = ClientMessage::from_json(&json!({
            "type": "game_statistics",
            "userId": 42,
            "stats": { "totalResources": 900, "maxCombo": 7 },
            "timestamp": 1_700_000_000_000u64,
        }))
        .expect("Parse failed");
        let ClientMessage::GameStatistics(event) = message else {
            panic!("Expected statistics, got {message:?}");
        };
        assert_eq!(*event.counters().total_resources(), 900.0);
        assert_eq!(*event.counters().highest_combo(), 7);
    }

    #[test]
    fn statistics_envelope_without_stats_is_empty() {
        let message = ClientMessage::from_json(&json!({ "type": "game_statistics" })).expect("Parse failed");
        let ClientMessage::GameStatistics(event) = message else {
            panic!("Expected statistics");
        };
        assert!(event.reported().is_empty());
    }

    #[test]
    fn invalid_statistics_reject_the_envelope() {
        let err = ClientMessage::from_json(&json!({
            "type": "game_statistics",
            "stats": { "totalClicks": -1 },
        }))
        .expect_err("Should reject");
        assert!(matches!(err.kind(), ValidationErrorKind::Negative { .. }));
    }

    #[test]
    fn export_takes_version_from_data() {
        let message = ClientMessage::from_json(&json!({
            "type": "game_export",
            "data": { "version": "1.1", "resources": { "gold": 5 } },
        }))
        .expect("Parse failed");
        let ClientMessage::GameExport(export) = message else {
            panic!("Expected export");
        };
        assert_eq!(export.version_tag(), "1.1");
        let round: Value = serde_json::from_str(export.blob()).expect("Blob is JSON");
        assert_eq!(round["resources"]["gold"], 5);
    }

    #[test]
    fn export_without_version_is_unknown() {
        let message = ClientMessage::from_json(&json!({ "type": "game_export", "data": {} }))
            .expect("Parse failed");
        let ClientMessage::GameExport(export) = message else {
            panic!("Expected export");
        };
        assert_eq!(export.version_tag(), UNKNOWN_VERSION);
        assert_eq!(export.blob(), "{}");
    }

    #[test]
    fn error_report_defaults_message() {
        let message = ClientMessage::from_json(&json!({ "type": "error_report" })).expect("Parse failed");
        let ClientMessage::ErrorReport(report) = message else {
            panic!("Expected error report");
        };
        assert_eq!(report.message(), "Unknown error");
    }

    #[test]
    fn missing_type_is_rejected() {
        let err = ClientMessage::from_json(&json!({ "stats": {} })).expect_err("Should reject");
        assert!(matches!(err.kind(), ValidationErrorKind::MissingField { field } if field == "type"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = ClientMessage::from_json(&json!({ "type": "show_leaderboard" })).expect_err("Should reject");
        assert!(matches!(
            err.kind(),
            ValidationErrorKind::UnknownMessageType { message_type } if message_type == "show_leaderboard"
        ));
    }
}
