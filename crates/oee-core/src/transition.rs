//! Operating-state interval reconstruction from point events.
//!
//! Equipment emits point events, not explicit interval boundaries, so the
//! state timeline is inferred retroactively each time a new signal arrives.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::signal::{Signal, SignalError};

/// One interval during which equipment was in the state named by the opening
/// signal's event.
///
/// An interval without a close signal is open (ongoing); its duration is
/// measured against a caller-supplied instant.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTransition {
    open: Signal,
    close: Option<Signal>,
}

impl StateTransition {
    /// Constructs a transition, validating that the close signal does not
    /// precede the open signal.
    pub fn new(open: Signal, close: Option<Signal>) -> Result<Self, SignalError> {
        if let Some(close) = &close {
            if open.timestamp > close.timestamp {
                return Err(SignalError::InvalidOrder {
                    previous: open.timestamp,
                    current: close.timestamp,
                });
            }
        }
        Ok(Self { open, close })
    }

    /// The operating state this interval represents.
    #[must_use]
    pub fn state(&self) -> &str {
        &self.open.event
    }

    /// Whether the interval is still ongoing.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.close.is_none()
    }

    /// The signal that opened the interval.
    #[must_use]
    pub const fn open_signal(&self) -> &Signal {
        &self.open
    }

    /// The signal that closed the interval, if any.
    #[must_use]
    pub const fn close_signal(&self) -> Option<&Signal> {
        self.close.as_ref()
    }

    /// The interval's duration, measuring open intervals against `now`.
    #[must_use]
    pub fn duration_at(&self, now: DateTime<Utc>) -> TimeDelta {
        match &self.close {
            Some(close) => close.timestamp - self.open.timestamp,
            None => now - self.open.timestamp,
        }
    }

    /// Snapshot of the interval for reporting.
    #[must_use]
    pub fn info_at(&self, now: DateTime<Utc>) -> StateInfo {
        StateInfo {
            state: self.state().to_string(),
            duration_ns: self.duration_at(now).num_nanoseconds().unwrap_or(i64::MAX),
            open: self.is_open(),
        }
    }
}

/// Reporting view of one state interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateInfo {
    pub state: String,
    pub duration_ns: i64,
    pub open: bool,
}

/// Folds one signal into an ordered transition sequence.
///
/// The last transition is closed at the new signal's timestamp (or, if it is
/// already closed, a fresh transition spanning from its former close signal
/// replaces it), then a new open transition for the incoming signal is
/// appended. The input slice is never modified; on error the caller's
/// sequence remains valid and the returned error carries no partial update.
pub fn apply_transition(
    transitions: &[StateTransition],
    signal: Signal,
) -> Result<Vec<StateTransition>, SignalError> {
    let mut next: Vec<StateTransition> = transitions.to_vec();

    let Some(last) = next.last() else {
        next.push(StateTransition::new(signal, None)?);
        return Ok(next);
    };

    let closed = match &last.close {
        // Last interval already closed: re-open from its close signal.
        Some(close) => StateTransition::new(close.clone(), Some(signal.clone()))?,
        None => StateTransition::new(last.open.clone(), Some(signal.clone()))?,
    };
    let last_index = next.len() - 1;
    next[last_index] = closed;

    next.push(StateTransition::new(signal, None)?);
    Ok(next)
}
