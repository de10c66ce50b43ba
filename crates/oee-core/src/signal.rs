//! Raw equipment signals and their payload decoding.

use std::num::ParseFloatError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{EntityId, SignalId};

/// Free-form signal payload keyed by field name.
pub type SignalPayload = serde_json::Map<String, Value>;

/// Errors produced while folding or decoding signals.
#[derive(Debug, Error)]
pub enum SignalError {
    /// A signal arrived with a timestamp before the one preceding it.
    #[error("invalid signal order: {current} is before {previous}")]
    InvalidOrder {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    /// A process-data payload `value` field was not numeric.
    #[error("payload value is not numeric: {value:?}")]
    PayloadParse {
        value: String,
        #[source]
        source: ParseFloatError,
    },
}

/// One observed event from one piece of equipment.
///
/// Immutable once created: the ingestion boundary constructs signals and the
/// core only ever reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Unique identifier for this signal.
    pub id: SignalId,
    /// The equipment that emitted the signal.
    pub entity_id: EntityId,
    /// The event name (builtin like `PRODUCTION`, or operator-defined).
    pub event: String,
    /// Event-specific payload fields.
    #[serde(default, skip_serializing_if = "SignalPayload::is_empty")]
    pub payload: SignalPayload,
    /// When the event was observed.
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    /// Decodes this signal's payload as a numeric process measurement.
    ///
    /// `payload["value"]` is taken through its string form and parsed as a
    /// decimal float; anything non-numeric (including a missing key, which
    /// stringifies to `"null"`) is a [`SignalError::PayloadParse`].
    /// `payload["label"]` is stringified with the same missing-key
    /// placeholder.
    pub fn to_process_data(&self) -> Result<ProcessDataPoint, SignalError> {
        let raw = payload_text(&self.payload, "value");
        let value = raw
            .parse::<f64>()
            .map_err(|source| SignalError::PayloadParse { value: raw, source })?;

        Ok(ProcessDataPoint {
            signal_id: self.id.clone(),
            entity_id: self.entity_id.clone(),
            label: payload_text(&self.payload, "label"),
            value,
            timestamp: self.timestamp,
        })
    }
}

/// A decoded numeric process measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessDataPoint {
    pub signal_id: SignalId,
    pub entity_id: EntityId,
    pub label: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Stringifies a payload field the way its JSON text form reads.
///
/// Strings yield their contents without quotes; a missing key or JSON null
/// yields the literal `"null"`.
fn payload_text(payload: &SignalPayload, key: &str) -> String {
    match payload.get(key) {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
