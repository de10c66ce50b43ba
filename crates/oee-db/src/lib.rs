//! Storage layer for the OEE signal engine.
//!
//! Provides batch durability for raw signals using `rusqlite`, plus the
//! ordered per-entity replay queries the aggregation core consumes.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` instance can be moved between threads but cannot
//! be shared across threads without external synchronization.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in ISO 8601 format (e.g.
//! `2024-01-15T10:30:00.000Z`) so lexicographic ordering matches
//! chronological ordering and per-entity replay comes back in fold order.
//! Payloads are stored as JSON text; adding payload fields is
//! backward-compatible, removing or renaming them requires a migration.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use thiserror::Error;

use oee_core::{EntityId, Signal, SignalId, SignalPayload};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored signal timestamp.
    #[error("invalid timestamp for signal {signal_id}: {timestamp}")]
    TimestampParse {
        signal_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored signal row failed validation or payload decoding.
    #[error("invalid signal data for {signal_id}: {message}")]
    InvalidSignalData { signal_id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Per-entity activity summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityActivity {
    pub entity_id: String,
    pub signal_count: i64,
    pub last_signal: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Signals table: stores raw equipment events
            -- timestamp: ISO 8601 format (e.g., '2024-01-15T10:30:00.000Z')
            -- payload: JSON object with event-specific fields
            CREATE TABLE IF NOT EXISTS signals (
                id TEXT PRIMARY KEY,
                entity_id TEXT NOT NULL,
                event TEXT NOT NULL,
                payload TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_signals_entity ON signals(entity_id);
            CREATE INDEX IF NOT EXISTS idx_signals_timestamp ON signals(timestamp);
            ",
        )?;
        Ok(())
    }

    /// Inserts a batch of signals transactionally, ignoring duplicates by ID.
    pub fn insert_signals(&mut self, signals: &[Signal]) -> Result<usize, DbError> {
        if signals.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO signals (id, entity_id, event, payload, timestamp)
                VALUES (?, ?, ?, ?, ?)
                ",
            )?;
            for signal in signals {
                let payload = serde_json::to_string(&signal.payload).map_err(|e| {
                    DbError::InvalidSignalData {
                        signal_id: signal.id.to_string(),
                        message: e.to_string(),
                    }
                })?;
                inserted += stmt.execute(params![
                    signal.id.as_str(),
                    signal.entity_id.as_str(),
                    signal.event,
                    payload,
                    format_timestamp(signal.timestamp),
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(inserted, total = signals.len(), "signal batch saved");
        Ok(inserted)
    }

    /// Lists one entity's signals in fold order (timestamp, then ID).
    ///
    /// The optional range is inclusive of `start` and exclusive of `end`.
    pub fn list_entity_signals(
        &self,
        entity_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Signal>, DbError> {
        let start = start.map(format_timestamp).unwrap_or_default();
        // '~' sorts after any RFC 3339 timestamp text.
        let end = end.map_or_else(|| "~".to_string(), format_timestamp);
        let mut stmt = self.conn.prepare(
            "
            SELECT id, entity_id, event, payload, timestamp
            FROM signals
            WHERE entity_id = ? AND timestamp >= ? AND timestamp < ?
            ORDER BY timestamp ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(params![entity_id, start, end], |row| {
            Ok(SignalRow {
                id: row.get(0)?,
                entity_id: row.get(1)?,
                event: row.get(2)?,
                payload: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?;
        let mut signals = Vec::new();
        for row in rows {
            signals.push(row?.into_signal()?);
        }
        Ok(signals)
    }

    /// Lists signal counts and last-signal times per entity, ordered by most
    /// recent activity.
    pub fn entity_activity(&self) -> Result<Vec<EntityActivity>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT entity_id, COUNT(*) AS signal_count, MAX(timestamp) AS last_signal
            FROM signals
            GROUP BY entity_id
            ORDER BY last_signal DESC, entity_id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EntityActivity {
                entity_id: row.get(0)?,
                signal_count: row.get(1)?,
                last_signal: row.get(2)?,
            })
        })?;
        let mut entities = Vec::new();
        for row in rows {
            entities.push(row?);
        }
        Ok(entities)
    }
}

/// A raw signal row before validation.
struct SignalRow {
    id: String,
    entity_id: String,
    event: String,
    payload: String,
    timestamp: String,
}

impl SignalRow {
    fn into_signal(self) -> Result<Signal, DbError> {
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|source| DbError::TimestampParse {
                signal_id: self.id.clone(),
                timestamp: self.timestamp.clone(),
                source,
            })?;
        let payload: SignalPayload =
            serde_json::from_str(&self.payload).map_err(|e| DbError::InvalidSignalData {
                signal_id: self.id.clone(),
                message: format!("payload: {e}"),
            })?;
        let id = SignalId::new(self.id.clone()).map_err(|e| DbError::InvalidSignalData {
            signal_id: self.id.clone(),
            message: e.to_string(),
        })?;
        let entity_id =
            EntityId::new(self.entity_id).map_err(|e| DbError::InvalidSignalData {
                signal_id: self.id,
                message: e.to_string(),
            })?;
        Ok(Signal {
            id,
            entity_id,
            event: self.event,
            payload,
            timestamp,
        })
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signal(id: &str, entity: &str, event: &str, minute: u32) -> Signal {
        Signal {
            id: SignalId::new(id).unwrap(),
            entity_id: EntityId::new(entity).unwrap(),
            event: event.to_string(),
            payload: SignalPayload::new(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 8, minute, 0).unwrap(),
        }
    }

    #[test]
    fn insert_signals_is_idempotent() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let s = signal("sig-1", "press-04", "PRODUCTION", 0);

        let inserted = db.insert_signals(&[s.clone(), s]).unwrap();
        assert_eq!(inserted, 1);

        let count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM signals", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn insert_empty_batch_is_a_no_op() {
        let mut db = Database::open_in_memory().unwrap();
        assert_eq!(db.insert_signals(&[]).unwrap(), 0);
    }

    #[test]
    fn list_entity_signals_returns_fold_order() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_signals(&[
            signal("sig-2", "press-04", "STOP", 10),
            signal("sig-1", "press-04", "RUN", 0),
            signal("sig-3", "mill-01", "RUN", 5),
        ])
        .unwrap();

        let signals = db.list_entity_signals("press-04", None, None).unwrap();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].id.as_str(), "sig-1");
        assert_eq!(signals[1].id.as_str(), "sig-2");
    }

    #[test]
    fn list_entity_signals_respects_half_open_range() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_signals(&[
            signal("sig-1", "press-04", "RUN", 0),
            signal("sig-2", "press-04", "STOP", 10),
            signal("sig-3", "press-04", "RUN", 20),
        ])
        .unwrap();

        let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 10, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 8, 20, 0).unwrap();
        let signals = db
            .list_entity_signals("press-04", Some(start), Some(end))
            .unwrap();

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].id.as_str(), "sig-2");
    }

    #[test]
    fn signal_payload_roundtrips() {
        let mut db = Database::open_in_memory().unwrap();
        let mut payload = SignalPayload::new();
        payload.insert("value".to_string(), serde_json::Value::from(21.7));
        payload.insert("label".to_string(), serde_json::Value::from("temp"));
        let mut s = signal("sig-1", "press-04", "PROCESS_DATA", 0);
        s.payload = payload;

        db.insert_signals(std::slice::from_ref(&s)).unwrap();
        let signals = db.list_entity_signals("press-04", None, None).unwrap();

        assert_eq!(signals[0], s);
    }

    #[test]
    fn corrupt_timestamp_surfaces_as_error() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_signals(&[signal("sig-1", "press-04", "RUN", 0)])
            .unwrap();
        db.conn
            .execute(
                "UPDATE signals SET timestamp = 'not-a-timestamp' WHERE id = 'sig-1'",
                [],
            )
            .unwrap();

        let result = db.list_entity_signals("press-04", None, None);
        assert!(matches!(result, Err(DbError::TimestampParse { .. })));
    }

    #[test]
    fn corrupt_payload_surfaces_as_error() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_signals(&[signal("sig-1", "press-04", "RUN", 0)])
            .unwrap();
        db.conn
            .execute("UPDATE signals SET payload = '[' WHERE id = 'sig-1'", [])
            .unwrap();

        let result = db.list_entity_signals("press-04", None, None);
        assert!(matches!(result, Err(DbError::InvalidSignalData { .. })));
    }

    #[test]
    fn entity_activity_groups_and_orders_by_recency() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_signals(&[
            signal("sig-1", "press-04", "RUN", 0),
            signal("sig-2", "press-04", "STOP", 10),
            signal("sig-3", "mill-01", "RUN", 30),
        ])
        .unwrap();

        let activity = db.entity_activity().unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].entity_id, "mill-01");
        assert_eq!(activity[0].signal_count, 1);
        assert_eq!(activity[1].entity_id, "press-04");
        assert_eq!(activity[1].signal_count, 2);
    }
}
