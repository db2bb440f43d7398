//! Visit policy violations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A state whose final visit count differs from its declared exact count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitMismatch {
    pub state: String,
    pub expected: u64,
    pub actual: u64,
}

impl fmt::Display for VisitMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "visited state '{}' {} times, but expected {}",
            self.state, self.actual, self.expected
        )
    }
}

pub(crate) fn describe_mismatches(mismatches: &[VisitMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
