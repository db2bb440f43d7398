//! Construction errors for machines and transition tables.

use crate::core::{StateKind, UnknownStateError};
use thiserror::Error;

/// Errors that can occur while building a machine.
///
/// All of them indicate a defect in the machine definition and are fatal.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No state handlers registered. Add at least one handler")]
    NoHandlers,

    #[error("State name '{name}' does not follow the s<ordinal>_<descriptive_name> convention")]
    MalformedStateName { name: String },

    #[error("Ordinal {ordinal} is used by both '{first}' and '{second}'")]
    DuplicateOrdinal {
        ordinal: u32,
        first: String,
        second: String,
    },

    #[error("Acronym '{acronym}' is shared by '{first}' and '{second}'")]
    DuplicateAcronym {
        acronym: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    UnknownState(#[from] UnknownStateError),

    #[error("State '{state}' has more than one transition table entry")]
    DuplicateEntry { state: String },

    #[error("Malformed transition expression '{expression}': {reason}")]
    MalformedExpression { expression: String, reason: String },

    #[error("Transition from '{from}' references unknown state '{target}'")]
    UnresolvedTransitionTarget { from: String, target: String },

    #[error("State '{state}' has no explicit transition and no state follows it")]
    MissingDefaultTransition { state: String },

    #[error("State '{state}' is a {declared} state but {reason}")]
    KindMismatch {
        state: String,
        declared: StateKind,
        reason: String,
    },

    #[error("Invalid transition table: {0}")]
    InvalidTable(#[from] serde_json::Error),
}
