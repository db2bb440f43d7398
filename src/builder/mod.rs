//! Builder API for ergonomic state machine construction.
//!
//! This module provides the fluent [`MachineBuilder`] and the
//! [`transitions!`](crate::transitions) macro. Building registers the
//! handlers, compiles the transition table and hands both to a fresh
//! [`Machine`](crate::engine::Machine).

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::MachineBuilder;
