//! Ordered catalog of a machine's state handlers.

use super::handler::{Handler, StateHandler, StateKind};
use super::naming::{acronym, is_terminal_name, parse_state_name};
use crate::builder::BuildError;
use std::collections::HashMap;
use thiserror::Error;

/// A state code matched neither an acronym nor a canonical name.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("No state found for code '{code}'")]
pub struct UnknownStateError {
    pub code: String,
}

/// Handlers sorted by ordinal, with acronym and name indices.
///
/// Index 0 is the initial state. Indices are stable for the lifetime of the
/// registry and are what transition tables and runtime counters refer to.
pub struct HandlerRegistry<C> {
    handlers: Vec<StateHandler<C>>,
    by_acronym: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl<C> HandlerRegistry<C> {
    /// Build the registry from `(declared name, handler)` pairs.
    ///
    /// Names ending in `_complete` or `_end` are terminal and must be
    /// registered with [`Handler::terminal`].
    pub fn new<I, N>(entries: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = (N, Handler<C>)>,
        N: Into<String>,
    {
        let mut handlers = Vec::new();

        for (declared, handler) in entries {
            let declared = declared.into();
            let parsed = parse_state_name(&declared)?;

            let kind = match (handler.declared_kind(), is_terminal_name(&parsed.name)) {
                (Some(StateKind::Terminal), _) => StateKind::Terminal,
                (declared_kind, true) => {
                    return Err(BuildError::KindMismatch {
                        state: parsed.name,
                        declared: declared_kind.unwrap_or(StateKind::Operation),
                        reason: "its name marks a terminal state".to_string(),
                    });
                }
                (Some(kind), false) => kind,
                // Settled by the table compiler from the entry's shape.
                (None, false) => StateKind::Operation,
            };

            handlers.push(StateHandler {
                ordinal: parsed.ordinal,
                acronym: acronym(&parsed.name),
                name: parsed.name,
                kind,
                handler,
            });
        }

        if handlers.is_empty() {
            return Err(BuildError::NoHandlers);
        }

        handlers.sort_by_key(|h| h.ordinal);

        if let Some(pair) = handlers.windows(2).find(|w| w[0].ordinal == w[1].ordinal) {
            return Err(BuildError::DuplicateOrdinal {
                ordinal: pair[0].ordinal,
                first: pair[0].name.clone(),
                second: pair[1].name.clone(),
            });
        }

        let mut by_acronym = HashMap::new();
        let mut by_name = HashMap::new();
        for (index, handler) in handlers.iter().enumerate() {
            if let Some(previous) = by_acronym.insert(handler.acronym.clone(), index) {
                return Err(BuildError::DuplicateAcronym {
                    acronym: handler.acronym.clone(),
                    first: handlers[previous].name.clone(),
                    second: handler.name.clone(),
                });
            }
            by_name.insert(handler.name.clone(), index);
        }

        Ok(Self {
            handlers,
            by_acronym,
            by_name,
        })
    }

    /// Look a handler up by acronym or canonical name.
    pub fn resolve(&self, code: &str) -> Result<&StateHandler<C>, UnknownStateError> {
        self.index_of(code).map(|index| &self.handlers[index])
    }

    pub fn index_of(&self, code: &str) -> Result<usize, UnknownStateError> {
        self.by_acronym
            .get(code)
            .or_else(|| self.by_name.get(code))
            .copied()
            .ok_or_else(|| UnknownStateError {
                code: code.to_string(),
            })
    }

    /// Handlers in declaration order.
    pub fn ordered_handlers(&self) -> &[StateHandler<C>] {
        &self.handlers
    }

    pub fn get(&self, index: usize) -> Option<&StateHandler<C>> {
        self.handlers.get(index)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn name_at(&self, index: usize) -> &str {
        self.handlers
            .get(index)
            .map(|h| h.name.as_str())
            .unwrap_or_default()
    }

    pub(crate) fn settle_kind(&mut self, index: usize, kind: StateKind) {
        if let Some(handler) = self.handlers.get_mut(index) {
            if handler.is_dynamic() {
                handler.kind = kind;
            }
        }
    }
}

impl<C> std::fmt::Debug for HandlerRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.handlers.iter()).finish()
    }
}
