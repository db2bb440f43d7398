//! Flowstate: a table-driven finite state machine engine
//!
//! A machine is a sequence of named state handlers plus a compact
//! declarative table saying where control goes when it should not simply
//! fall through to the next handler.
//!
//! # Core Concepts
//!
//! - **Handlers**: `s<ordinal>_<name>` functions over the machine's context,
//!   tagged as operation, query or terminal
//! - **Transition table**: `code => expression` entries such as `"HM" =>
//!   "T:tick,F:done"`, where a code is a handler's acronym or full name
//! - **Execution**: single steps, counted runs, runs to completion or until a
//!   predicate holds
//! - **Visit policies**: declared maximum or exact visit counts per state
//! - **Graph export**: a Graphviz description of the resolved machine
//!
//! # Example
//!
//! ```rust
//! use flowstate::{transitions, MachineBuilder};
//!
//! struct Countdown {
//!     remaining: u32,
//!     ticks: u32,
//! }
//!
//! let mut machine = MachineBuilder::new(Countdown { remaining: 2, ticks: 0 })
//!     .operation("s1_tick", |c: &mut Countdown| {
//!         c.remaining -= 1;
//!         c.ticks += 1;
//!     })
//!     .query("s2_has_more", |c: &mut Countdown| c.remaining > 0)
//!     .terminal("s3_done")
//!     .table(transitions! { "HM" => "T:tick,F:done" })
//!     .build()?;
//!
//! machine.set_exact_visits("tick", 2)?;
//! machine.run_to_completion()?;
//!
//! assert!(machine.is_complete());
//! assert_eq!(machine.context().ticks, 2);
//! assert_eq!(machine.step_count(), 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod graph;
pub mod policy;
pub mod table;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder};
pub use core::{Handler, HandlerRegistry, Reply, StateHandler, StateKind, UnknownStateError};
pub use engine::{Machine, MachineRuntimeState, RunError, StepOutcome};
pub use graph::{GraphError, GraphOptions};
pub use policy::VisitPolicy;
pub use table::{DeclarativeTable, TransitionSpec, TransitionTable};
