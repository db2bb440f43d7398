//! State machine that executes registered handlers.

use crate::core::{HandlerRegistry, Reply, StateHandler, StateKind, StepHistory, StepRecord};
use crate::engine::error::RunError;
use crate::engine::runtime::MachineRuntimeState;
use crate::graph::{self, GraphError, GraphOptions};
use crate::policy::{VisitAuditor, VisitPolicy};
use crate::table::TransitionTable;
use chrono::Utc;
use stillwater::validation::Validation;
use tracing::{debug, info, warn};

/// Result of executing a single step
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    /// State that ran
    pub from: String,
    /// State the pointer moved to
    pub to: String,
    /// Query result, `None` for operations
    pub outcome: Option<bool>,
    /// Step counter after this step
    pub step: u64,
}

/// A resolved machine bound to its context.
///
/// Handlers receive `&mut C`; everything else (registry, table, counters,
/// policies) is owned here and never shared between instances.
pub struct Machine<C> {
    context: C,
    registry: HandlerRegistry<C>,
    table: TransitionTable,
    runtime: MachineRuntimeState,
    auditor: VisitAuditor,
    history: Option<StepHistory>,
    graph_options: GraphOptions,
}

impl<C> Machine<C> {
    pub(crate) fn new(
        context: C,
        registry: HandlerRegistry<C>,
        table: TransitionTable,
        record_history: bool,
        graph_options: GraphOptions,
    ) -> Self {
        let state_count = registry.len();
        let mut runtime = MachineRuntimeState::new(state_count);

        // A machine that starts on a terminal has already arrived there.
        if registry
            .ordered_handlers()
            .first()
            .is_some_and(|initial| initial.is_terminal())
        {
            runtime.visit(0);
        }

        Self {
            context,
            registry,
            table,
            runtime,
            auditor: VisitAuditor::new(state_count),
            history: record_history.then(StepHistory::new),
            graph_options,
        }
    }

    /// Current state handler (pure)
    pub fn current(&self) -> &StateHandler<C> {
        &self.registry.ordered_handlers()[self.runtime.current()]
    }

    pub fn current_kind(&self) -> StateKind {
        self.current().kind()
    }

    /// Check if machine is in a terminal state (pure)
    pub fn is_complete(&self) -> bool {
        self.current().is_terminal()
    }

    pub fn step_count(&self) -> u64 {
        self.runtime.step_count()
    }

    pub fn runtime(&self) -> &MachineRuntimeState {
        &self.runtime
    }

    pub fn registry(&self) -> &HandlerRegistry<C> {
        &self.registry
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    /// Step history, if recording was enabled at build time.
    pub fn history(&self) -> Option<&StepHistory> {
        self.history.as_ref()
    }

    pub fn graph_options(&self) -> &GraphOptions {
        &self.graph_options
    }

    /// Fail unless the machine is currently in `code`.
    pub fn require_state(&self, code: &str) -> Result<(), RunError> {
        let expected = self.registry.index_of(code)?;
        if expected == self.runtime.current() {
            Ok(())
        } else {
            Err(RunError::WrongState {
                expected: self.registry.name_at(expected).to_string(),
                actual: self.current().name().to_string(),
            })
        }
    }

    pub fn set_max_visits(&mut self, code: &str, max: u64) -> Result<(), RunError> {
        let index = self.registry.index_of(code)?;
        self.auditor.set_max(index, max);
        Ok(())
    }

    /// Require `code` to have exactly `count` visits when the run completes.
    /// Also caps visits at `count` during the run.
    pub fn set_exact_visits(&mut self, code: &str, count: u64) -> Result<(), RunError> {
        let index = self.registry.index_of(code)?;
        self.auditor.set_exact(index, count);
        Ok(())
    }

    pub fn visit_policy(&self, code: &str) -> Result<VisitPolicy, RunError> {
        let index = self.registry.index_of(code)?;
        Ok(self.auditor.policy(index))
    }

    pub fn visit_count(&self, code: &str) -> Result<u64, RunError> {
        let index = self.registry.index_of(code)?;
        Ok(self.runtime.visits()[index])
    }

    /// Visit counters by canonical name, in declaration order.
    pub fn visit_counts(&self) -> Vec<(&str, u64)> {
        self.registry
            .ordered_handlers()
            .iter()
            .zip(self.runtime.visits())
            .map(|(handler, visits)| (handler.name(), *visits))
            .collect()
    }

    /// Execute one step of the state machine.
    pub fn step(&mut self) -> Result<StepOutcome, RunError> {
        self.execute(None)
    }

    /// Execute one step using `outcome` as the query result.
    ///
    /// Query handlers are not invoked; operation handlers still run. This
    /// replays a machine from a recorded sequence of query results.
    pub fn step_with_outcome(&mut self, outcome: bool) -> Result<StepOutcome, RunError> {
        self.execute(Some(outcome))
    }

    fn execute(&mut self, forced: Option<bool>) -> Result<StepOutcome, RunError> {
        let from = self.runtime.current();
        let handler = &self.registry.ordered_handlers()[from];
        let kind = handler.kind();

        if kind == StateKind::Terminal {
            return Err(RunError::TerminalState {
                state: handler.name().to_string(),
            });
        }

        let visits = self.runtime.visit(from);
        if let Some(max) = self.auditor.breached_max(from, visits) {
            warn!(state = handler.name(), visits, max, "Visit limit exceeded");
            return Err(RunError::VisitLimitExceeded {
                state: handler.name().to_string(),
                max,
                visits,
            });
        }

        let reply = match (kind, forced) {
            (StateKind::Query, Some(outcome)) => Reply::Bool(outcome),
            _ => handler.call(&mut self.context),
        };

        let bad_contract = |reply: Reply| RunError::BadHandlerContract {
            state: handler.name().to_string(),
            kind,
            reply,
        };

        let outcome = match (kind, reply) {
            (StateKind::Operation, Reply::Unit) => None,
            (StateKind::Query, Reply::Bool(flag)) => Some(flag),
            (_, reply) => return Err(bad_contract(reply)),
        };

        let to = self
            .table
            .spec(from)
            .and_then(|spec| spec.resolve(outcome))
            .ok_or_else(|| bad_contract(outcome.map_or(Reply::Unit, Reply::Bool)))?;

        let target = &self.registry.ordered_handlers()[to];

        // Arriving at a terminal counts as its one visit.
        let arrival = target
            .is_terminal()
            .then(|| self.runtime.visits()[to] + 1);
        if let Some(visits) = arrival {
            if let Some(max) = self.auditor.breached_max(to, visits) {
                warn!(state = target.name(), visits, max, "Visit limit exceeded");
                return Err(RunError::VisitLimitExceeded {
                    state: target.name().to_string(),
                    max,
                    visits,
                });
            }
        }

        let step = self.runtime.advance(to);
        if arrival.is_some() {
            self.runtime.visit(to);
        }
        let from_name = handler.name().to_string();

        debug!(
            from = %from_name,
            to = target.name(),
            ?outcome,
            step,
            "Stepped"
        );

        if let Some(history) = self.history.as_mut() {
            history.record(StepRecord {
                step,
                from: from_name.clone(),
                to: target.name().to_string(),
                outcome,
                timestamp: Utc::now(),
            });
        }

        Ok(StepOutcome {
            from: from_name,
            to: target.name().to_string(),
            outcome,
            step,
        })
    }

    /// Step until a terminal state, then check exact visit counts.
    pub fn run_to_completion(&mut self) -> Result<(), RunError> {
        while !self.is_complete() {
            self.step()?;
        }

        self.audit_visits()?;

        info!(
            state = self.current().name(),
            steps = self.step_count(),
            "Machine complete"
        );
        Ok(())
    }

    /// Step until the step counter equals `target`.
    pub fn run_to_step_count(&mut self, target: u64) -> Result<(), RunError> {
        let current = self.step_count();
        if target < current {
            return Err(RunError::StepCountBehind { target, current });
        }

        while self.step_count() < target {
            if self.is_complete() {
                return Err(RunError::TerminalBeforeStepCount {
                    state: self.current().name().to_string(),
                    reached: self.step_count(),
                    target,
                });
            }
            self.step()?;
        }
        Ok(())
    }

    /// Step while `predicate` returns false. The machine stays resumable.
    pub fn run_until<P>(&mut self, mut predicate: P) -> Result<(), RunError>
    where
        P: FnMut(&Self) -> bool,
    {
        while !predicate(&*self) {
            self.step()?;
        }
        Ok(())
    }

    /// Step until the current state is `code`.
    pub fn run_to_state(&mut self, code: &str) -> Result<(), RunError> {
        let target = self.registry.index_of(code)?;
        while self.runtime.current() != target {
            self.step()?;
        }
        Ok(())
    }

    /// Step until a step has executed from `code`.
    pub fn run_past_state(&mut self, code: &str) -> Result<(), RunError> {
        let target = self.registry.index_of(code)?;
        loop {
            let previous = self.runtime.current();
            self.step()?;
            if previous == target {
                return Ok(());
            }
        }
    }

    /// Graphviz description of this machine.
    pub fn to_dot(&self) -> Result<String, GraphError> {
        graph::export(&self.registry, &self.table, &self.graph_options)
    }

    fn audit_visits(&self) -> Result<(), RunError> {
        match self.auditor.audit(self.runtime.visits(), &self.registry) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(errors) => {
                let mismatches: Vec<_> = errors.iter().cloned().collect();
                warn!(count = mismatches.len(), "Visit count mismatch");
                Err(RunError::VisitCountMismatch { mismatches })
            }
        }
    }
}

impl<C> std::fmt::Debug for Machine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("current", &self.current().name())
            .field("runtime", &self.runtime)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MachineBuilder;

    #[derive(Debug, Default)]
    struct Loop {
        remaining: u32,
        inits: u32,
    }

    /// `init` -> `has_more` (T:init, F:done) -> `done`
    fn looping(remaining: u32) -> Machine<Loop> {
        MachineBuilder::new(Loop {
            remaining,
            inits: 0,
        })
        .operation("s1_init", |c| {
            c.inits += 1;
            c.remaining = c.remaining.saturating_sub(1);
        })
        .query("s2_has_more", |c| c.remaining > 0)
        .terminal("s3_done")
        .transition("has_more", "T:init,F:done")
        .record_history(true)
        .build()
        .unwrap()
    }

    #[test]
    fn round_trip_visits_each_state_once() {
        let mut machine = looping(1);
        machine.run_to_completion().unwrap();

        assert!(machine.is_complete());
        assert_eq!(machine.current().name(), "done");
        assert_eq!(machine.visit_count("init").unwrap(), 1);
        assert_eq!(machine.visit_count("HM").unwrap(), 1);
        assert_eq!(machine.visit_count("done").unwrap(), 1);
        assert_eq!(machine.step_count(), 2);
    }

    #[test]
    fn query_result_selects_branch() {
        let mut machine = looping(2);

        let first = machine.step().unwrap();
        assert_eq!(first.outcome, None);
        assert_eq!(first.to, "has_more");

        let second = machine.step().unwrap();
        assert_eq!(second.outcome, Some(true));
        assert_eq!(second.to, "init");

        machine.step().unwrap();
        let fourth = machine.step().unwrap();
        assert_eq!(fourth.outcome, Some(false));
        assert_eq!(fourth.to, "done");
        assert_eq!(fourth.step, 4);
    }

    #[test]
    fn stepping_terminal_fails() {
        let mut machine = looping(1);
        machine.run_to_completion().unwrap();

        let result = machine.step();
        assert_eq!(
            result,
            Err(RunError::TerminalState {
                state: "done".to_string()
            })
        );
        assert_eq!(machine.step_count(), 2);
    }

    #[test]
    fn zero_max_fails_on_first_visit() {
        let mut machine = looping(3);
        machine.set_max_visits("has_more", 0).unwrap();

        let result = machine.run_to_completion();
        assert_eq!(
            result,
            Err(RunError::VisitLimitExceeded {
                state: "has_more".to_string(),
                max: 0,
                visits: 1,
            })
        );
        // init ran once; has_more never did
        assert_eq!(machine.step_count(), 1);
        assert_eq!(machine.current().name(), "has_more");
    }

    #[test]
    fn max_visits_fails_at_breaching_step() {
        let mut machine = looping(10);
        machine.set_max_visits("I", 3).unwrap();

        let result = machine.run_to_completion();
        assert!(matches!(
            result,
            Err(RunError::VisitLimitExceeded { max: 3, visits: 4, .. })
        ));
        // three init steps and three has_more steps ran
        assert_eq!(machine.step_count(), 6);
        assert_eq!(machine.context().inits, 3);
    }

    #[test]
    fn exact_visits_checked_at_completion() {
        let mut machine = looping(3);
        machine.set_exact_visits("init", 2).unwrap();
        machine.set_exact_visits("has_more", 2).unwrap();

        // init would be visited a third time, breaching the implied max
        assert!(matches!(
            machine.run_to_completion(),
            Err(RunError::VisitLimitExceeded { .. })
        ));

        let mut machine = looping(2);
        machine.set_exact_visits("init", 2).unwrap();
        machine.set_exact_visits("has_more", 3).unwrap();

        match machine.run_to_completion() {
            Err(RunError::VisitCountMismatch { mismatches }) => {
                assert_eq!(mismatches.len(), 1);
                assert_eq!(mismatches[0].state, "has_more");
                assert_eq!(mismatches[0].expected, 3);
                assert_eq!(mismatches[0].actual, 2);
            }
            other => panic!("Expected VisitCountMismatch, got {other:?}"),
        }
    }

    #[test]
    fn exact_visits_pass() {
        let mut machine = looping(2);
        machine.set_exact_visits("init", 2).unwrap();
        machine.set_exact_visits("done", 1).unwrap();
        assert!(machine.run_to_completion().is_ok());
        assert_eq!(machine.visit_policy("I").unwrap(), VisitPolicy::exactly(2));
    }

    #[test]
    fn non_boolean_query_reply_breaks_contract() {
        let mut machine = MachineBuilder::new(())
            .operation("s1_init", |_| {})
            .dynamic("s2_has_more", |_| Reply::Value(serde_json::json!("yes")))
            .terminal("s3_done")
            .transition("HM", "T:I,F:D")
            .build()
            .unwrap();

        machine.step().unwrap();
        let result = machine.step();

        assert_eq!(
            result,
            Err(RunError::BadHandlerContract {
                state: "has_more".to_string(),
                kind: StateKind::Query,
                reply: Reply::Value(serde_json::json!("yes")),
            })
        );
        assert_eq!(machine.current().name(), "has_more");
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn operation_returning_value_breaks_contract() {
        let mut machine = MachineBuilder::new(())
            .dynamic("s1_init", |_| Reply::Bool(true))
            .terminal("s2_calc_complete")
            .build()
            .unwrap();

        assert!(matches!(
            machine.step(),
            Err(RunError::BadHandlerContract {
                kind: StateKind::Operation,
                ..
            })
        ));
        assert_eq!(machine.current().name(), "init");
    }

    #[test]
    fn run_to_step_count_is_idempotent() {
        let mut machine = looping(5);
        machine.run_to_step_count(3).unwrap();
        assert_eq!(machine.step_count(), 3);

        machine.run_to_step_count(3).unwrap();
        assert_eq!(machine.step_count(), 3);

        assert_eq!(
            machine.run_to_step_count(2),
            Err(RunError::StepCountBehind {
                target: 2,
                current: 3
            })
        );
    }

    #[test]
    fn run_to_step_count_stops_at_terminal() {
        let mut machine = looping(1);
        assert_eq!(
            machine.run_to_step_count(10),
            Err(RunError::TerminalBeforeStepCount {
                state: "done".to_string(),
                reached: 2,
                target: 10,
            })
        );
    }

    #[test]
    fn run_until_leaves_machine_resumable() {
        let mut machine = looping(5);
        machine.run_until(|m| m.context().inits == 2).unwrap();

        assert_eq!(machine.context().inits, 2);
        assert!(!machine.is_complete());

        machine.run_to_completion().unwrap();
        assert_eq!(machine.context().inits, 5);
    }

    #[test]
    fn run_until_fails_when_terminal_reached_first() {
        let mut machine = looping(2);
        let result = machine.run_until(|m| m.context().inits == 10);

        assert_eq!(
            result,
            Err(RunError::TerminalState {
                state: "done".to_string()
            })
        );
        assert!(machine.is_complete());
        assert_eq!(machine.context().inits, 2);
    }

    #[test]
    fn terminal_max_breach_leaves_pointer_in_place() {
        let mut machine = MachineBuilder::new(0u32)
            .operation("s1_init", |runs: &mut u32| *runs += 1)
            .terminal("s2_done")
            .record_history(true)
            .build()
            .unwrap();
        machine.set_max_visits("done", 0).unwrap();

        let expected = Err(RunError::VisitLimitExceeded {
            state: "done".to_string(),
            max: 0,
            visits: 1,
        });
        assert_eq!(machine.run_to_completion(), expected);
        assert_eq!(machine.step_count(), 0);
        assert!(!machine.is_complete());
        assert_eq!(machine.visit_count("done").unwrap(), 0);
        assert!(machine.history().unwrap().is_empty());

        // Running again reports the breach again instead of completing.
        assert_eq!(machine.run_to_completion(), expected);
        assert_eq!(machine.step_count(), 0);
        assert_eq!(*machine.context(), 2);
    }

    #[test]
    fn initial_terminal_counts_as_visited() {
        let mut machine = MachineBuilder::new(())
            .terminal("s1_calc_complete")
            .build()
            .unwrap();
        machine.set_exact_visits("CC", 1).unwrap();

        assert!(machine.is_complete());
        assert_eq!(machine.visit_count("calc_complete").unwrap(), 1);
        assert!(machine.run_to_completion().is_ok());
        assert_eq!(machine.step_count(), 0);
    }

    #[test]
    fn run_to_and_past_state() {
        let mut machine = looping(3);
        machine.run_to_state("done").unwrap();
        assert!(machine.is_complete());

        let mut machine = looping(3);
        machine.run_to_state("init").unwrap();
        assert_eq!(machine.step_count(), 0);

        machine.run_past_state("has_more").unwrap();
        assert_eq!(machine.step_count(), 2);
        assert_eq!(machine.current().name(), "init");

        assert!(matches!(
            machine.run_to_state("nowhere"),
            Err(RunError::UnknownState(_))
        ));
    }

    #[test]
    fn step_with_outcome_skips_query() {
        let mut machine = looping(5);
        machine.step().unwrap();

        let replayed = machine.step_with_outcome(false).unwrap();
        assert_eq!(replayed.outcome, Some(false));
        assert!(machine.is_complete());
        assert_eq!(machine.context().remaining, 4);
    }

    #[test]
    fn require_state_reports_actual() {
        let machine = looping(1);
        assert!(machine.require_state("I").is_ok());
        assert_eq!(
            machine.require_state("done"),
            Err(RunError::WrongState {
                expected: "done".to_string(),
                actual: "init".to_string(),
            })
        );
    }

    #[test]
    fn history_records_every_step() {
        let mut machine = looping(2);
        machine.run_to_completion().unwrap();

        let history = machine.history().unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(
            history.path(),
            vec!["init", "has_more", "init", "has_more", "done"]
        );
        assert_eq!(history.records()[3].outcome, Some(false));
    }

    #[test]
    fn visit_counts_in_declaration_order() {
        let mut machine = looping(2);
        machine.run_to_completion().unwrap();
        assert_eq!(
            machine.visit_counts(),
            vec![("init", 2), ("has_more", 2), ("done", 1)]
        );
    }

    #[test]
    fn handler_can_run_sub_machine() {
        #[derive(Default)]
        struct Outer {
            inner_steps: u64,
        }

        let mut outer = MachineBuilder::new(Outer::default())
            .operation("s1_run_inner", |o: &mut Outer| {
                let mut inner = looping(3);
                if inner.run_to_completion().is_ok() {
                    o.inner_steps = inner.step_count();
                }
            })
            .terminal("s2_outer_complete")
            .build()
            .unwrap();

        outer.run_to_completion().unwrap();
        assert_eq!(outer.context().inner_steps, 6);
    }
}
