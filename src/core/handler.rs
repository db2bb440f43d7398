//! State handlers and their kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shape of a handler's contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    /// Runs for its side effects and returns nothing.
    Operation,
    /// Returns a boolean that selects one of two branches.
    Query,
    /// Marks completion. Has no body and never steps.
    Terminal,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operation => write!(f, "operation"),
            Self::Query => write!(f, "query"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// Value produced by one handler invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Unit,
    Bool(bool),
    Value(serde_json::Value),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "nothing"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Value(value) => write!(f, "value {value}"),
        }
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Self::Unit
    }
}

impl From<bool> for Reply {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<serde_json::Value> for Reply {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

pub type OperationFn<C> = Arc<dyn Fn(&mut C) + Send + Sync>;
pub type QueryFn<C> = Arc<dyn Fn(&mut C) -> bool + Send + Sync>;
pub type DynamicFn<C> = Arc<dyn Fn(&mut C) -> Reply + Send + Sync>;

/// Handler body supplied at registration, tagged with its contract.
///
/// Typed handlers (`Operation`, `Query`) cannot break their contract. A
/// `Dynamic` handler takes its kind from the shape of its transition table
/// entry and has every reply checked against that kind when it runs.
pub enum Handler<C> {
    Operation(OperationFn<C>),
    Query(QueryFn<C>),
    Dynamic(DynamicFn<C>),
    Terminal,
}

impl<C> Handler<C> {
    pub fn operation<F>(body: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        Self::Operation(Arc::new(body))
    }

    pub fn query<F>(body: F) -> Self
    where
        F: Fn(&mut C) -> bool + Send + Sync + 'static,
    {
        Self::Query(Arc::new(body))
    }

    pub fn dynamic<F>(body: F) -> Self
    where
        F: Fn(&mut C) -> Reply + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(body))
    }

    pub fn terminal() -> Self {
        Self::Terminal
    }

    /// Kind fixed by the tag, `None` for dynamic handlers.
    pub fn declared_kind(&self) -> Option<StateKind> {
        match self {
            Self::Operation(_) => Some(StateKind::Operation),
            Self::Query(_) => Some(StateKind::Query),
            Self::Terminal => Some(StateKind::Terminal),
            Self::Dynamic(_) => None,
        }
    }

    pub(crate) fn invoke(&self, context: &mut C) -> Reply {
        match self {
            Self::Operation(body) => {
                body(context);
                Reply::Unit
            }
            Self::Query(body) => Reply::Bool(body(context)),
            Self::Dynamic(body) => body(context),
            Self::Terminal => Reply::Unit,
        }
    }
}

impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Operation(body) => Self::Operation(Arc::clone(body)),
            Self::Query(body) => Self::Query(Arc::clone(body)),
            Self::Dynamic(body) => Self::Dynamic(Arc::clone(body)),
            Self::Terminal => Self::Terminal,
        }
    }
}

impl<C> fmt::Debug for Handler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operation(_) => write!(f, "Handler::Operation"),
            Self::Query(_) => write!(f, "Handler::Query"),
            Self::Dynamic(_) => write!(f, "Handler::Dynamic"),
            Self::Terminal => write!(f, "Handler::Terminal"),
        }
    }
}

/// One registered state: naming, ordering, kind and body.
pub struct StateHandler<C> {
    pub(crate) ordinal: u32,
    pub(crate) name: String,
    pub(crate) acronym: String,
    pub(crate) kind: StateKind,
    pub(crate) handler: Handler<C>,
}

impl<C> StateHandler<C> {
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Canonical (descriptive) name, e.g. `next_query_in_cache`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn acronym(&self) -> &str {
        &self.acronym
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == StateKind::Terminal
    }

    pub(crate) fn is_dynamic(&self) -> bool {
        matches!(self.handler, Handler::Dynamic(_))
    }

    pub(crate) fn call(&self, context: &mut C) -> Reply {
        self.handler.invoke(context)
    }
}

impl<C> fmt::Debug for StateHandler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandler")
            .field("ordinal", &self.ordinal)
            .field("name", &self.name)
            .field("acronym", &self.acronym)
            .field("kind", &self.kind)
            .finish()
    }
}
