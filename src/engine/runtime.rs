//! Mutable execution context of one machine instance.

use serde::{Deserialize, Serialize};

/// Current state pointer, per-state visit counters and the step counter.
///
/// Owned by exactly one machine and mutated only by its stepping methods.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRuntimeState {
    current: usize,
    visits: Vec<u64>,
    step_count: u64,
}

impl MachineRuntimeState {
    pub(crate) fn new(state_count: usize) -> Self {
        Self {
            current: 0,
            visits: vec![0; state_count],
            step_count: 0,
        }
    }

    /// Registry index of the current state.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Visit counters by registry index.
    pub fn visits(&self) -> &[u64] {
        &self.visits
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Count a visit to `index`, returning the new total.
    pub(crate) fn visit(&mut self, index: usize) -> u64 {
        match self.visits.get_mut(index) {
            Some(count) => {
                *count += 1;
                *count
            }
            None => 0,
        }
    }

    /// Move the pointer to `next` and count the step.
    pub(crate) fn advance(&mut self, next: usize) -> u64 {
        self.current = next;
        self.step_count += 1;
        self.step_count
    }
}
