//! Visit policies: declared bounds on how often a state runs.
//!
//! Enforcement is split by what can be known when:
//! - a maximum is checked inside every step, right after the visit that
//!   breaches it;
//! - an exact count can only be judged once the run has completed, so it is
//!   checked by `run_to_completion`, which reports every mismatch at once.
//!
//! # Example
//!
//! ```rust
//! use flowstate::policy::VisitPolicy;
//!
//! let policy = VisitPolicy::exactly(2);
//! assert!(policy.allows(2));
//! assert!(!policy.allows(3));
//! ```

pub mod rules;
pub mod violations;

pub use rules::{VisitAuditor, VisitPolicy};
pub use violations::VisitMismatch;
