//! Per-state visit policies and their auditor.

use crate::core::HandlerRegistry;
use crate::policy::violations::VisitMismatch;
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Declared visit constraint for one state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitPolicy {
    /// Visits beyond this fail the step that makes them
    pub max: Option<u64>,
    /// Visits the state must have when the run completes
    pub exact: Option<u64>,
}

impl VisitPolicy {
    pub fn at_most(max: u64) -> Self {
        Self {
            max: Some(max),
            exact: None,
        }
    }

    /// An exact count is also an upper bound.
    pub fn exactly(count: u64) -> Self {
        Self {
            max: Some(count),
            exact: Some(count),
        }
    }

    pub fn allows(&self, visits: u64) -> bool {
        self.max.map_or(true, |max| visits <= max)
    }
}

/// Visit policies for every state of a machine, by registry index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisitAuditor {
    policies: Vec<VisitPolicy>,
}

impl VisitAuditor {
    pub fn new(state_count: usize) -> Self {
        Self {
            policies: vec![VisitPolicy::default(); state_count],
        }
    }

    pub fn set_max(&mut self, index: usize, max: u64) {
        if let Some(policy) = self.policies.get_mut(index) {
            policy.max = Some(max);
        }
    }

    pub fn set_exact(&mut self, index: usize, count: u64) {
        if let Some(policy) = self.policies.get_mut(index) {
            *policy = VisitPolicy::exactly(count);
        }
    }

    pub fn policy(&self, index: usize) -> VisitPolicy {
        self.policies.get(index).copied().unwrap_or_default()
    }

    /// The breached maximum, if `visits` exceeds the state's bound.
    pub fn breached_max(&self, index: usize, visits: u64) -> Option<u64> {
        let policy = self.policy(index);
        if policy.allows(visits) {
            None
        } else {
            policy.max
        }
    }

    /// Check every exact-count policy, accumulating ALL mismatches.
    pub fn audit<C>(
        &self,
        visits: &[u64],
        registry: &HandlerRegistry<C>,
    ) -> Validation<(), NonEmptyVec<VisitMismatch>> {
        let checks: Vec<Validation<(), NonEmptyVec<VisitMismatch>>> = self
            .policies
            .iter()
            .enumerate()
            .filter_map(|(index, policy)| policy.exact.map(|expected| (index, expected)))
            .map(|(index, expected)| {
                let actual = visits.get(index).copied().unwrap_or(0);
                if actual == expected {
                    Validation::success(())
                } else {
                    Validation::fail(VisitMismatch {
                        state: registry.name_at(index).to_string(),
                        expected,
                        actual,
                    })
                }
            })
            .collect();

        if checks.is_empty() {
            return Validation::success(());
        }

        Validation::all_vec(checks).map(|_| ())
    }
}
