//! Builtin event names as the single source of truth for their strings.
//!
//! Equipment may emit arbitrary operator-defined event names; these are the
//! reserved ones the aggregator gives special meaning to.

use std::fmt;
use std::str::FromStr;

/// Event names with builtin aggregation semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinEvent {
    /// One production unit was completed.
    Production,
    /// Equipment entered an unplanned failure state.
    Fail,
    /// Equipment entered a planned break state.
    Break,
    /// A produced unit failed quality criteria.
    NotGood,
    /// Free-form numeric process measurement.
    ProcessData,
}

impl BuiltinEvent {
    /// The wire representation of the event name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "PRODUCTION",
            Self::Fail => "FAIL",
            Self::Break => "BREAK",
            Self::NotGood => "NOT_GOOD",
            Self::ProcessData => "PROCESS_DATA",
        }
    }

    /// Whether the given event name is this builtin.
    #[must_use]
    pub fn matches(&self, event: &str) -> bool {
        event == self.as_str()
    }
}

impl fmt::Display for BuiltinEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRODUCTION" => Ok(Self::Production),
            "FAIL" => Ok(Self::Fail),
            "BREAK" => Ok(Self::Break),
            "NOT_GOOD" => Ok(Self::NotGood),
            "PROCESS_DATA" => Ok(Self::ProcessData),
            _ => Err(UnknownEvent(s.to_string())),
        }
    }
}

/// Error type for event names with no builtin meaning.
#[derive(Debug, Clone)]
pub struct UnknownEvent(String);

impl fmt::Display for UnknownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no builtin event named: {}", self.0)
    }
}

impl std::error::Error for UnknownEvent {}
