//! Incremental OEE aggregation and metric derivation.
//!
//! # Algorithm Summary
//!
//! 1. One signal at a time is folded into a running [`OeeResult`], attributing
//!    the inter-signal delta to production, planned-stop, or unplanned-stop
//!    buckets based on the *previous* signal's event.
//! 2. Availability, performance, quality, and their product are derived on
//!    demand from the accumulated counters, guarding every division.
//!
//! Folding is pure: each call returns a fresh accumulator, and a failed call
//! leaves the caller's value untouched.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::OeeInput;
use crate::event::BuiltinEvent;
use crate::signal::{Signal, SignalError};

/// Running OEE aggregate for one entity over one window.
///
/// Counts are fractional (`f64`) and durations are `i64` nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OeeResult {
    /// Window start.
    pub start: DateTime<Utc>,
    /// Window end.
    pub end: DateTime<Utc>,
    /// Units produced.
    pub total_production: f64,
    /// Time spent producing, in nanoseconds.
    pub total_work_duration: i64,
    /// Units that failed quality criteria.
    pub not_good_production: f64,
    /// Unplanned stoppage, in nanoseconds.
    pub unplanned_stop_duration: i64,
    /// Planned stoppage, in nanoseconds.
    pub planned_stop_duration: i64,
    /// Nominal per-unit cycle time, in nanoseconds.
    pub ideal_cycle: i64,
    /// Per-event occurrence counts.
    #[serde(default)]
    pub counts: HashMap<String, i64>,
    /// Per-event accumulated durations, in nanoseconds.
    #[serde(default)]
    pub durations: HashMap<String, i64>,
    /// The most recently folded signal, for inter-signal deltas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_signal: Option<Signal>,
}

impl OeeResult {
    /// Creates an empty accumulator for the given window.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    /// Window length in nanoseconds. Signed; not validated against
    /// `end < start`.
    #[must_use]
    pub fn total_duration(&self) -> i64 {
        (self.end - self.start).num_nanoseconds().unwrap_or(i64::MAX)
    }

    /// Window length minus planned stoppage, in nanoseconds.
    #[must_use]
    pub fn planned_duration(&self) -> i64 {
        self.total_duration() - self.planned_stop_duration
    }

    /// Production capacity at the ideal cycle time, in whole units.
    #[must_use]
    pub fn planned_production(&self) -> i64 {
        if self.ideal_cycle == 0 {
            return 0;
        }
        self.planned_duration() / self.ideal_cycle
    }

    /// Units produced that met quality criteria.
    #[must_use]
    pub fn good_production(&self) -> f64 {
        self.total_production - self.not_good_production
    }

    /// Fraction of planned production time actually running.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn availability(&self) -> f64 {
        let planned_duration = self.planned_duration();
        if planned_duration == 0 {
            return 0.0;
        }
        (planned_duration - self.unplanned_stop_duration) as f64 / planned_duration as f64
    }

    /// Fraction of planned production capacity actually achieved.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn performance(&self) -> f64 {
        let planned_production = self.planned_production();
        if planned_production == 0 {
            return 0.0;
        }
        self.good_production() / planned_production as f64
    }

    /// Fraction of produced units meeting quality criteria.
    #[must_use]
    pub fn quality(&self) -> f64 {
        if self.total_production == 0.0 {
            return 0.0;
        }
        self.good_production() / self.total_production
    }

    /// Overall Equipment Effectiveness: availability x performance x quality.
    #[must_use]
    pub fn oee(&self) -> f64 {
        self.availability() * self.performance() * self.quality()
    }

    /// Snapshots all derived metrics.
    ///
    /// Always recomputed from the current counters, never cached.
    #[must_use]
    pub fn calculations(&self) -> OeeCalculations {
        OeeCalculations {
            planned_duration: self.planned_duration(),
            planned_production: self.planned_production(),
            total_duration: self.total_duration(),
            good_production: self.good_production(),
            availability: self.availability(),
            performance: self.performance(),
            quality: self.quality(),
            oee: self.oee(),
        }
    }
}

/// Derived OEE metrics for reporting consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OeeCalculations {
    pub planned_duration: i64,
    pub planned_production: i64,
    pub total_duration: i64,
    pub good_production: f64,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
}

/// Folds one signal into the running aggregate.
///
/// Signals must arrive in non-decreasing timestamp order per entity; a
/// regression is a hard [`SignalError::InvalidOrder`], never a silent
/// reorder. Inter-signal deltas outside the configured filter window are
/// discarded but still advance `last_signal`. Deltas are attributed by the
/// previous signal's event; the production, unplanned, and planned branches
/// are deliberately non-exclusive so overlapping classification sets accrue
/// into every bucket they name.
pub fn fold_signal(
    result: &OeeResult,
    params: &OeeInput,
    signal: &Signal,
) -> Result<OeeResult, SignalError> {
    let mut next = result.clone();
    next.ideal_cycle = params.ideal_cycle_ns;

    if BuiltinEvent::NotGood.matches(&signal.event) {
        next.not_good_production += 1.0;
        *next.counts.entry(signal.event.clone()).or_insert(0) += 1;
        return Ok(next);
    }

    if params.is_countable(&signal.event) {
        *next.counts.entry(signal.event.clone()).or_insert(0) += 1;
    }

    let Some(last) = &result.last_signal else {
        // The very first signal establishes the clock but contributes no
        // duration.
        next.last_signal = Some(signal.clone());
        return Ok(next);
    };

    let delta = signal.timestamp - last.timestamp;
    if delta < TimeDelta::zero() {
        return Err(SignalError::InvalidOrder {
            previous: last.timestamp,
            current: signal.timestamp,
        });
    }
    // Saturates for deltas beyond the i64 nanosecond range (~292 years).
    let delta_ns = delta.num_nanoseconds().unwrap_or(i64::MAX);

    let filter = &params.filter;
    if delta_ns < filter.min_ns || (filter.max_ns != 0 && delta_ns > filter.max_ns) {
        next.last_signal = Some(signal.clone());
        return Ok(next);
    }

    if BuiltinEvent::Production.matches(&last.event) {
        next.total_production += 1.0;
        next.total_work_duration += delta_ns;
    }

    if BuiltinEvent::Fail.matches(&last.event) || params.is_unplanned(&last.event) {
        next.unplanned_stop_duration += delta_ns;
    }

    if BuiltinEvent::Break.matches(&last.event) || params.is_planned(&last.event) {
        next.planned_stop_duration += delta_ns;
    }

    *next.durations.entry(last.event.clone()).or_insert(0) += delta_ns;

    next.last_signal = Some(signal.clone());
    Ok(next)
}

/// Replays an ordered signal batch through a fresh accumulator.
pub fn fold_signals(
    params: &OeeInput,
    signals: &[Signal],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<OeeResult, SignalError> {
    let mut result = OeeResult::new(start, end);
    for signal in signals {
        result = fold_signal(&result, params, signal)?;
    }
    Ok(result)
}
