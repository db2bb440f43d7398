//! Execution engine.
//!
//! A [`Machine`] owns its context, the resolved handler registry and
//! transition table, and a [`MachineRuntimeState`]. Each step runs exactly
//! one handler to completion:
//!
//! - **Operations** run and continue at their single target.
//! - **Queries** return a boolean that selects the `T` or `F` target.
//! - **Terminals** end the run; stepping one is an error.
//!
//! Stepping is synchronous and single-owner (`&mut self`). Independent
//! machines share nothing, so a handler may build and run a sub-machine of
//! its own.

mod error;
mod machine;
mod runtime;

pub use error::RunError;
pub use machine::{Machine, StepOutcome};
pub use runtime::MachineRuntimeState;
