//! Validated statistics events.
//!
//! The web client reports an open JSON object of counters. This module is the
//! boundary where that object becomes a typed [`StatisticsEvent`]; anything
//! that gets past [`StatisticsEvent::from_json`] is safe to persist.

use std::collections::BTreeSet;

use derive_getters::Getters;
use serde_json::{Map, Number, Value};
use strum::IntoEnumIterator;
use tracing::{debug, instrument, warn};

use crate::{
    Category, CounterValue, GameCounters, MAX_COUNTER, StatField, ValidationError, ValidationErrorKind,
};

/// A cumulative snapshot of one player's counters.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct StatisticsEvent {
    /// Counter values; fields absent from the payload are zero.
    counters: GameCounters,
    /// Fields that were present in the payload.
    reported: BTreeSet<StatField>,
}

impl StatisticsEvent {
    /// Creates an event from counters and the set of fields that were reported.
    pub fn new(counters: GameCounters, reported: BTreeSet<StatField>) -> Self {
        Self { counters, reported }
    }

    /// Creates an event in which every field counts as reported.
    pub fn full(counters: GameCounters) -> Self {
        Self::new(counters, StatField::iter().collect())
    }

    /// Validates a raw counters object.
    ///
    /// Known fields are looked up by canonical key first, then by alias.
    /// `null` counts as absent. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the payload is not an object, or if a
    /// known field is non-numeric, negative, fractional where a whole number
    /// is required, or too large.
    #[instrument(skip(payload))]
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let map = payload.as_object().ok_or_else(|| {
            warn!("Statistics payload is not an object");
            ValidationError::new(ValidationErrorKind::NotAMapping)
        })?;

        let mut counters = GameCounters::default();
        let mut reported = BTreeSet::new();

        for field in StatField::iter() {
            let Some((key, raw)) = lookup(map, field) else {
                continue;
            };
            let value = parse_counter(field, key, raw)?;
            counters.set(field, value);
            reported.insert(field);
        }

        debug!(reported = reported.len(), "Statistics payload validated");
        Ok(Self { counters, reported })
    }

    /// Categories whose backing field was reported.
    pub fn reported_categories(&self) -> Vec<Category> {
        self.reported
            .iter()
            .filter_map(|field| Category::for_field(*field))
            .collect()
    }
}

/// Finds the first non-null value for `field`, canonical key first.
fn lookup<'a>(map: &'a Map<String, Value>, field: StatField) -> Option<(&'static str, &'a Value)> {
    std::iter::once(field.canonical_key())
        .chain(field.aliases().iter().copied())
        .find_map(|key| match map.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some((key, value)),
        })
}

fn parse_counter(field: StatField, key: &str, raw: &Value) -> Result<CounterValue, ValidationError> {
    let Value::Number(number) = raw else {
        return Err(ValidationError::new(ValidationErrorKind::NotNumeric {
            field: key.to_string(),
        }));
    };

    if field.is_integer() {
        parse_integer(key, number).map(CounterValue::Integer)
    } else {
        parse_real(key, number).map(CounterValue::Real)
    }
}

fn parse_real(key: &str, number: &Number) -> Result<f64, ValidationError> {
    let value = number.as_f64().ok_or_else(|| {
        ValidationError::new(ValidationErrorKind::NotNumeric {
            field: key.to_string(),
        })
    })?;
    if !value.is_finite() {
        return Err(ValidationError::new(ValidationErrorKind::OutOfRange {
            field: key.to_string(),
        }));
    }
    if value < 0.0 {
        return Err(ValidationError::new(ValidationErrorKind::Negative {
            field: key.to_string(),
        }));
    }
    // -0.0 compares equal to 0.0 but would sort apart under total ordering.
    Ok(if value == 0.0 { 0.0 } else { value })
}

fn parse_integer(key: &str, number: &Number) -> Result<i64, ValidationError> {
    let out_of_range = || {
        ValidationError::new(ValidationErrorKind::OutOfRange {
            field: key.to_string(),
        })
    };

    if let Some(unsigned) = number.as_u64() {
        return i64::try_from(unsigned)
            .ok()
            .filter(|value| *value <= MAX_COUNTER)
            .ok_or_else(out_of_range);
    }
    if number.as_i64().is_some() {
        return Err(ValidationError::new(ValidationErrorKind::Negative {
            field: key.to_string(),
        }));
    }

    let value = parse_real(key, number)?;
    if value.fract() != 0.0 {
        return Err(ValidationError::new(ValidationErrorKind::NotInteger {
            field: key.to_string(),
        }));
    }
    if value > MAX_COUNTER as f64 {
        return Err(out_of_range());
    }
    Ok(value as i64)
}
