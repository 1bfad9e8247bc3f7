//! Grid Clicker core - statistics validation and leaderboard ranking
//!
//! Storage-free domain logic shared by the backend:
//!
//! - **Categories**: the fixed leaderboard dimensions and the counters behind them
//! - **Events**: validated statistics snapshots built from client JSON
//! - **Messages**: the web client's `{ "type": ... }` envelope
//! - **Ranking**: competition ranking with deterministic tie order
//!
//! # Example
//!
//! ```
//! use grid_clicker_core::{Category, StatisticsEvent, competition_ranks};
//! use serde_json::json;
//!
//! let event = StatisticsEvent::from_json(&json!({ "totalResources": 100 })).unwrap();
//! assert_eq!(event.reported_categories(), vec![Category::TotalResources]);
//!
//! let ranks = competition_ranks([(1_i64, 100.0), (2, 100.0), (3, 50.0)]);
//! assert_eq!(ranks.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 1, 3]);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod category;
mod counters;
mod error;
mod event;
mod message;
mod ranking;

pub use category::{Category, StatField};
pub use counters::{CounterValue, GameCounters, MAX_COUNTER};
pub use error::{ValidationError, ValidationErrorKind};
pub use event::StatisticsEvent;
pub use message::{ClientMessage, ErrorReport, SaveExport, UNKNOWN_VERSION};
pub use ranking::{Rank, RankedScore, competition_ranks};
