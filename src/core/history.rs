//! Step history tracking.
//!
//! When enabled on a machine, every executed step is appended as a
//! [`StepRecord`]. The history is a plain log: it never influences execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single executed step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step counter value after this step
    pub step: u64,
    /// Canonical name of the state that ran
    pub from: String,
    /// Canonical name of the state the pointer moved to
    pub to: String,
    /// Query result, `None` for operations
    pub outcome: Option<bool>,
    pub timestamp: DateTime<Utc>,
}

/// Ordered log of executed steps.
///
/// # Example
///
/// ```rust
/// use flowstate::core::{StepHistory, StepRecord};
/// use chrono::Utc;
///
/// let mut history = StepHistory::new();
/// history.record(StepRecord {
///     step: 1,
///     from: "init".to_string(),
///     to: "has_more".to_string(),
///     outcome: None,
///     timestamp: Utc::now(),
/// });
/// history.record(StepRecord {
///     step: 2,
///     from: "has_more".to_string(),
///     to: "done".to_string(),
///     outcome: Some(false),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.path(), vec!["init", "has_more", "done"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StepHistory {
    records: Vec<StepRecord>,
}

impl StepHistory {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn record(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// States traversed: the first step's origin, then each destination.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.first() {
            path.push(first.from.as_str());
        }
        path.extend(self.records.iter().map(|r| r.to.as_str()));
        path
    }

    /// Time between the first and last recorded step.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }
}
