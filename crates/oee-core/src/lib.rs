//! Core domain logic for the OEE signal engine.
//!
//! This crate contains the fundamental types and logic for:
//! - Signals: immutable timestamped equipment events and payload decoding
//! - Transitions: reconstructing operating-state intervals from point events
//! - Aggregation: folding ordered signal streams into running OEE counters
//! - Metrics: deriving availability, performance, quality, and OEE
//!
//! Everything here is pure and synchronous: no I/O, no clock reads (the
//! current instant is always an explicit argument), and errors are returned
//! to the caller rather than logged or swallowed. Callers must fold signals
//! for a given entity in non-decreasing timestamp order.

pub mod classify;
pub mod event;
mod oee;
pub mod signal;
pub mod transition;
pub mod types;

pub use classify::{OeeInput, SignalFilter};
pub use event::BuiltinEvent;
pub use oee::{OeeCalculations, OeeResult, fold_signal, fold_signals};
pub use signal::{ProcessDataPoint, Signal, SignalError, SignalPayload};
pub use transition::{StateInfo, StateTransition, apply_transition};
pub use types::{EntityId, SignalId, ValidationError};
