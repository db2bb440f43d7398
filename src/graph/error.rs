//! Graph construction errors.

use thiserror::Error;

/// Errors that can occur while assembling a graph description
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Graph already has node '{node}'")]
    DuplicateNode { node: String },

    #[error("Graph already has edge '{from}' -> '{to}'")]
    DuplicateEdge { from: String, to: String },

    #[error("Edge references unknown node '{node}'")]
    UnknownNode { node: String },
}
