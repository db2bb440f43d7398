//! Graphviz export of a machine's structure.
//!
//! The exporter is a pure function of the handler registry and the compiled
//! transition table: one node per state, shaped by kind (box for operations,
//! ellipse for queries, diamond for terminals), and one edge per resolved
//! target, with query edges labeled `T` or `F`. Rendering the text to an
//! image is left to the caller.

mod dot;
mod error;
mod export;

pub use dot::{DotGraph, NodeShape};
pub use error::GraphError;
pub use export::{build_graph, export, shape_for, GraphOptions};
