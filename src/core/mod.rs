//! Core handler types.
//!
//! This module contains the building blocks every machine is made of:
//! - State handlers and their kinds (operation, query, terminal)
//! - The naming convention that orders handlers and derives their codes
//! - The handler registry with acronym and name lookup
//! - Step history records

mod handler;
mod history;
mod naming;
mod registry;

pub use handler::{DynamicFn, Handler, OperationFn, QueryFn, Reply, StateHandler, StateKind};
pub use history::{StepHistory, StepRecord};
pub use naming::{acronym, camel_case, is_terminal_name, parse_state_name, StateName};
pub use registry::{HandlerRegistry, UnknownStateError};
