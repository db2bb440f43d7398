//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::core::{Handler, HandlerRegistry, Reply, StateKind};
use crate::engine::Machine;
use crate::graph::GraphOptions;
use crate::table::{self, DeclarativeTable, TransitionSpec};
use tracing::debug;

/// Builder for constructing state machines with a fluent API.
pub struct MachineBuilder<C> {
    context: C,
    handlers: Vec<(String, Handler<C>)>,
    table: DeclarativeTable,
    graph_options: GraphOptions,
    record_history: bool,
}

impl<C> MachineBuilder<C> {
    /// Create a new builder around the machine's context.
    pub fn new(context: C) -> Self {
        Self {
            context,
            handlers: Vec::new(),
            table: DeclarativeTable::new(),
            graph_options: GraphOptions::default(),
            record_history: false,
        }
    }

    /// Register a handler under its declared `s<ordinal>_<name>` name.
    pub fn handler(mut self, name: impl Into<String>, handler: Handler<C>) -> Self {
        self.handlers.push((name.into(), handler));
        self
    }

    pub fn operation<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.handler(name, Handler::operation(body))
    }

    pub fn query<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut C) -> bool + Send + Sync + 'static,
    {
        self.handler(name, Handler::query(body))
    }

    /// Register a handler whose kind follows its table entry.
    pub fn dynamic<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut C) -> Reply + Send + Sync + 'static,
    {
        self.handler(name, Handler::dynamic(body))
    }

    pub fn terminal(self, name: impl Into<String>) -> Self {
        self.handler(name, Handler::terminal())
    }

    /// Replace the declarative transition table.
    pub fn table(mut self, table: DeclarativeTable) -> Self {
        self.table = table;
        self
    }

    /// Add one entry to the declarative transition table.
    pub fn transition(mut self, code: impl Into<String>, expression: impl Into<String>) -> Self {
        self.table.insert(code, expression);
        self
    }

    pub fn graph_options(mut self, options: GraphOptions) -> Self {
        self.graph_options = options;
        self
    }

    /// Keep a [`StepHistory`](crate::core::StepHistory) of every step.
    pub fn record_history(mut self, enabled: bool) -> Self {
        self.record_history = enabled;
        self
    }

    /// Build the state machine.
    /// Returns an error if the handlers or the table are inconsistent.
    pub fn build(self) -> Result<Machine<C>, BuildError> {
        let mut registry = HandlerRegistry::new(self.handlers)?;
        let table = table::compile(&mut registry, &self.table)?;

        for (index, spec) in table.iter() {
            let name = registry.name_at(index);
            match spec {
                TransitionSpec::Next(next) => {
                    debug!(state = name, next = registry.name_at(*next), "Operation transition")
                }
                TransitionSpec::Branch { on_true, on_false } => debug!(
                    state = name,
                    on_true = registry.name_at(*on_true),
                    on_false = registry.name_at(*on_false),
                    "Query transition"
                ),
                TransitionSpec::Halt => debug!(state = name, "Terminal state"),
            }
        }

        if !registry
            .ordered_handlers()
            .iter()
            .any(|h| h.kind() == StateKind::Terminal)
        {
            debug!("Machine has no terminal state, run_to_completion will not return");
        }

        Ok(Machine::new(
            self.context,
            registry,
            table,
            self.record_history,
            self.graph_options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transitions;

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    #[test]
    fn builder_requires_handlers() {
        let result = MachineBuilder::new(Counter::default()).build();
        assert!(matches!(result, Err(BuildError::NoHandlers)));
    }

    #[test]
    fn fluent_api_builds_machine() {
        let machine = MachineBuilder::new(Counter::default())
            .operation("s1_bump", |c| c.value += 1)
            .query("s2_enough", |c| c.value >= 3)
            .terminal("s3_count_complete")
            .transition("E", "F:B")
            .build()
            .unwrap();

        assert_eq!(machine.current().name(), "bump");
        assert_eq!(machine.registry().len(), 3);
        assert!(machine.history().is_none());
    }

    #[test]
    fn table_macro_feeds_builder() {
        let machine = MachineBuilder::new(Counter::default())
            .operation("s1_bump", |c| c.value += 1)
            .query("s2_enough", |c| c.value >= 3)
            .terminal("s3_count_complete")
            .table(transitions! { "enough" => "T:CC,F:B" })
            .record_history(true)
            .build()
            .unwrap();

        assert_eq!(
            machine.table().spec(1),
            Some(&TransitionSpec::Branch {
                on_true: 2,
                on_false: 0
            })
        );
        assert!(machine.history().is_some());
    }

    #[test]
    fn build_errors_propagate() {
        let result = MachineBuilder::new(Counter::default())
            .operation("s1_bump", |c| c.value += 1)
            .operation("s2_bump_again", |c| c.value += 2)
            .build();
        assert!(matches!(
            result,
            Err(BuildError::MissingDefaultTransition { .. })
        ));
    }
}
