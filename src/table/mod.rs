//! Declarative transition tables and their compiled form.
//!
//! A machine definition describes its control flow as a small map from state
//! codes to transition expressions. Only deviations from sequential order need
//! an entry:
//!
//! ```rust
//! use flowstate::table::DeclarativeTable;
//!
//! let table = DeclarativeTable::from_json(r#"{
//!     "NQIC": "F:AQTS",
//!     "ARTC": "PQS",
//!     "AQTS": "NQIC"
//! }"#).unwrap();
//!
//! assert_eq!(table.len(), 3);
//! assert_eq!(table.get("ARTC"), Some("PQS"));
//! ```
//!
//! [`compile`] resolves such a table against a [`HandlerRegistry`] into one
//! [`TransitionSpec`] per handler.
//!
//! [`HandlerRegistry`]: crate::core::HandlerRegistry

mod compiler;
mod expression;

pub use compiler::compile;
pub use expression::TransitionExpr;

use crate::builder::BuildError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State code to transition expression, as written by the machine author.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclarativeTable {
    entries: BTreeMap<String, String>,
}

impl DeclarativeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. A later entry for the same code replaces the earlier one.
    pub fn entry(mut self, code: impl Into<String>, expression: impl Into<String>) -> Self {
        self.insert(code, expression);
        self
    }

    pub fn insert(&mut self, code: impl Into<String>, expression: impl Into<String>) {
        self.entries.insert(code.into(), expression.into());
    }

    /// Parse a JSON object of string codes to string expressions.
    pub fn from_json(text: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolved routing for one handler, by registry index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionSpec {
    /// Operation: always continue at this handler.
    Next(usize),
    /// Query: continue at the handler selected by the result.
    Branch { on_true: usize, on_false: usize },
    /// Terminal: nothing follows.
    Halt,
}

impl TransitionSpec {
    /// Target for a step that produced `outcome` (`None` for operations).
    ///
    /// Returns `None` when the outcome does not fit the spec's shape.
    pub fn resolve(&self, outcome: Option<bool>) -> Option<usize> {
        match (self, outcome) {
            (Self::Next(next), None) => Some(*next),
            (Self::Branch { on_true, .. }, Some(true)) => Some(*on_true),
            (Self::Branch { on_false, .. }, Some(false)) => Some(*on_false),
            _ => None,
        }
    }

    /// Every edge leaving this handler, with the branch value that selects it.
    pub fn targets(&self) -> Vec<(usize, Option<bool>)> {
        match *self {
            Self::Next(next) => vec![(next, None)],
            Self::Branch { on_true, on_false } => {
                vec![(on_true, Some(true)), (on_false, Some(false))]
            }
            Self::Halt => Vec::new(),
        }
    }
}

/// One [`TransitionSpec`] per handler, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTable {
    specs: Vec<TransitionSpec>,
}

impl TransitionTable {
    pub(crate) fn new(specs: Vec<TransitionSpec>) -> Self {
        Self { specs }
    }

    pub fn spec(&self, index: usize) -> Option<&TransitionSpec> {
        self.specs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TransitionSpec)> {
        self.specs.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
