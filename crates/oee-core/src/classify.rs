//! Event classification parameters for OEE aggregation.

use std::collections::HashSet;

/// Gap filter discarding inter-signal deltas outside `[min, max]`.
///
/// `max_ns == 0` means unbounded above.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalFilter {
    pub min_ns: i64,
    pub max_ns: i64,
}

/// Per-deployment classification parameters.
///
/// The membership sets are built once at construction, so a single value can
/// be shared read-only across concurrent folds.
#[derive(Debug, Clone, Default)]
pub struct OeeInput {
    planned: HashSet<String>,
    unplanned: HashSet<String>,
    countable: HashSet<String>,
    /// Nominal time to produce one unit, in nanoseconds.
    pub ideal_cycle_ns: i64,
    pub filter: SignalFilter,
}

impl OeeInput {
    /// Builds parameters from the configured event name lists.
    pub fn new<P, U, C>(
        planned_events: P,
        unplanned_events: U,
        countable_events: C,
        ideal_cycle_ns: i64,
        filter: SignalFilter,
    ) -> Self
    where
        P: IntoIterator<Item = String>,
        U: IntoIterator<Item = String>,
        C: IntoIterator<Item = String>,
    {
        Self {
            planned: planned_events.into_iter().collect(),
            unplanned: unplanned_events.into_iter().collect(),
            countable: countable_events.into_iter().collect(),
            ideal_cycle_ns,
            filter,
        }
    }

    /// Whether the event name counts as planned stoppage.
    #[must_use]
    pub fn is_planned(&self, event: &str) -> bool {
        self.planned.contains(event)
    }

    /// Whether the event name counts as unplanned stoppage.
    #[must_use]
    pub fn is_unplanned(&self, event: &str) -> bool {
        self.unplanned.contains(event)
    }

    /// Whether the event name increments a named production counter.
    #[must_use]
    pub fn is_countable(&self, event: &str) -> bool {
        self.countable.contains(event)
    }
}
