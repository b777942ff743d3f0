//! Report envelopes produced when streams finish.

use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// How a stream that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Termination {
    /// The handler asked to stop.
    Stopped,
    /// The feed ended on its own.
    Exhausted,
    /// A stop signal from outside the stream was honored.
    Cancelled,
}

/// Summary of one completed stream run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamReport {
    /// Name of the entry point that ran.
    pub name: String,
    /// Exchange the stream was configured for.
    pub exchange: String,
    /// Terminal state reached.
    pub termination: Termination,
    /// Handler invocations that completed successfully.
    pub delivered: u64,
    /// Reconnect cycles performed over the whole run.
    pub reconnects: u32,
}

/// Outcome of one unit run by a multi-stream orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOutcome {
    /// Name of the entry point.
    pub name: String,
    /// Report on success, or the error that terminated the unit.
    pub result: Result<StreamReport, StreamError>,
}

impl UnitOutcome {
    fn termination(&self) -> Option<Termination> {
        self.result.as_ref().ok().map(|r| r.termination)
    }

    /// The handler stopped the unit gracefully.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.termination() == Some(Termination::Stopped)
    }

    /// The unit's feed ended on its own.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.termination() == Some(Termination::Exhausted)
    }

    /// The unit was cancelled from outside.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.termination() == Some(Termination::Cancelled)
    }

    /// The unit failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.result.is_err()
    }

    /// The error that terminated the unit, if it failed.
    #[must_use]
    pub fn error(&self) -> Option<&StreamError> {
        self.result.as_ref().err()
    }
}

/// Aggregate of every unit run by a multi-stream orchestrator, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MultiStreamReport {
    /// One outcome per unit.
    pub outcomes: Vec<UnitOutcome>,
}

impl MultiStreamReport {
    /// Number of units the handler stopped gracefully.
    #[must_use]
    pub fn stopped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_stopped()).count()
    }

    /// Number of units that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// Number of units cancelled from outside.
    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_cancelled()).count()
    }

    /// Outcome of the unit with the given name, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UnitOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Errors of every failed unit.
    pub fn errors(&self) -> impl Iterator<Item = &StreamError> {
        self.outcomes.iter().filter_map(UnitOutcome::error)
    }
}
