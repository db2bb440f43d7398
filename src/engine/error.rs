//! Errors raised while running a machine.

use crate::core::{Reply, StateKind, UnknownStateError};
use crate::policy::violations::{describe_mismatches, VisitMismatch};
use thiserror::Error;

/// Errors that can occur while stepping a machine.
///
/// Each one signals a bug in the machine definition or in how the caller
/// drives it. Nothing is retried and nothing already executed is undone.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RunError {
    #[error(transparent)]
    UnknownState(#[from] UnknownStateError),

    #[error("Attempt to step terminal state '{state}', check for completion before stepping")]
    TerminalState { state: String },

    #[error("Handler '{state}' is a {kind} state but returned {reply}")]
    BadHandlerContract {
        state: String,
        kind: StateKind,
        reply: Reply,
    },

    #[error("Visited state '{state}' {visits} times, maximum allowed is {max}")]
    VisitLimitExceeded { state: String, max: u64, visits: u64 },

    #[error("Visit counts do not match: {}", describe_mismatches(.mismatches))]
    VisitCountMismatch { mismatches: Vec<VisitMismatch> },

    #[error("Cannot run back to step {target}, machine is already at step {current}")]
    StepCountBehind { target: u64, current: u64 },

    #[error("Reached terminal state '{state}' at step {reached}, before target step {target}")]
    TerminalBeforeStepCount {
        state: String,
        reached: u64,
        target: u64,
    },

    #[error("Required to be in state '{expected}', but machine is in state '{actual}'")]
    WrongState { expected: String, actual: String },
}
