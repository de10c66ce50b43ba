//! Ingest command for persisting raw signal batches.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use oee_core::{EntityId, Signal, SignalId, SignalPayload};
use oee_db::Database;

/// A signal as submitted by an ingest client.
///
/// IDs are optional on the way in; a missing ID is assigned a fresh UUID so
/// retries of the same batch with client-supplied IDs stay idempotent while
/// ad-hoc submissions still get unique keys.
#[derive(Debug, Deserialize)]
struct IncomingSignal {
    #[serde(default)]
    id: Option<String>,
    entity_id: String,
    event: String,
    #[serde(default)]
    payload: SignalPayload,
    timestamp: DateTime<Utc>,
}

impl IncomingSignal {
    fn into_signal(self) -> Result<Signal> {
        let id = self
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(Signal {
            id: SignalId::new(id)?,
            entity_id: EntityId::new(self.entity_id)?,
            event: self.event,
            payload: self.payload,
            timestamp: self.timestamp,
        })
    }
}

/// Parses a JSON array of signals and saves them in one transaction.
///
/// Returns the number of newly inserted signals; duplicates (by ID) are
/// skipped.
pub fn ingest_batch(db: &mut Database, raw: &str) -> Result<usize> {
    let incoming: Vec<IncomingSignal> =
        serde_json::from_str(raw).context("signal batch is not a JSON array of signals")?;
    if incoming.is_empty() {
        bail!("signal batch can't be empty");
    }
    let signals = incoming
        .into_iter()
        .map(IncomingSignal::into_signal)
        .collect::<Result<Vec<_>>>()?;
    let saved = db.insert_signals(&signals)?;
    if saved < signals.len() {
        tracing::debug!(
            skipped = signals.len() - saved,
            "duplicate signals ignored"
        );
    }
    Ok(saved)
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, file: Option<&Path>) -> Result<()> {
    let raw = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read signal batch from stdin")?;
            buffer
        }
    };
    let saved = ingest_batch(db, &raw)?;
    writeln!(writer, "{saved} signals saved")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_roundtrips_through_database() {
        let mut db = Database::open_in_memory().unwrap();
        let raw = r#"[
            {
                "id": "sig-1",
                "entity_id": "press-04",
                "event": "PRODUCTION",
                "timestamp": "2024-03-01T08:00:00Z"
            },
            {
                "id": "sig-2",
                "entity_id": "press-04",
                "event": "NOT_GOOD",
                "payload": {"reason": "scratched"},
                "timestamp": "2024-03-01T08:05:00Z"
            }
        ]"#;

        assert_eq!(ingest_batch(&mut db, raw).unwrap(), 2);

        let signals = db.list_entity_signals("press-04", None, None).unwrap();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[1].event, "NOT_GOOD");
        assert_eq!(
            signals[1].payload.get("reason"),
            Some(&serde_json::Value::from("scratched"))
        );
    }

    #[test]
    fn missing_id_gets_generated() {
        let mut db = Database::open_in_memory().unwrap();
        let raw = r#"[
            {"entity_id": "press-04", "event": "PRODUCTION", "timestamp": "2024-03-01T08:00:00Z"}
        ]"#;

        assert_eq!(ingest_batch(&mut db, raw).unwrap(), 1);

        let signals = db.list_entity_signals("press-04", None, None).unwrap();
        assert!(!signals[0].id.as_str().is_empty());
    }

    #[test]
    fn duplicate_ids_are_skipped() {
        let mut db = Database::open_in_memory().unwrap();
        let raw = r#"[
            {"id": "sig-1", "entity_id": "press-04", "event": "PRODUCTION", "timestamp": "2024-03-01T08:00:00Z"}
        ]"#;

        assert_eq!(ingest_batch(&mut db, raw).unwrap(), 1);
        assert_eq!(ingest_batch(&mut db, raw).unwrap(), 0);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let result = ingest_batch(&mut db, "[]");
        assert!(result.unwrap_err().to_string().contains("can't be empty"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(ingest_batch(&mut db, "{not json").is_err());
    }
}
