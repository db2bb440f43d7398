//! Resolves a declarative table into a full transition table.

use super::expression::TransitionExpr;
use super::{DeclarativeTable, TransitionSpec, TransitionTable};
use crate::builder::BuildError;
use crate::core::{HandlerRegistry, StateKind};

/// Compile `table` against `registry`, producing one spec per handler.
///
/// Handlers without an entry continue at the next declared handler, or halt
/// if they are terminal. Dynamic handlers take their kind from their entry:
/// a conditional expression makes them queries, anything else operations.
pub fn compile<C>(
    registry: &mut HandlerRegistry<C>,
    table: &DeclarativeTable,
) -> Result<TransitionTable, BuildError> {
    let count = registry.len();
    let mut exprs: Vec<Option<TransitionExpr>> = vec![None; count];

    for (code, text) in table.iter() {
        let index = registry.index_of(code)?;
        if exprs[index].is_some() {
            return Err(BuildError::DuplicateEntry {
                state: registry.name_at(index).to_string(),
            });
        }
        exprs[index] = Some(TransitionExpr::parse(text)?);
    }

    let mut specs = Vec::with_capacity(count);

    for (index, expr) in exprs.into_iter().enumerate() {
        let expr = expr.unwrap_or(TransitionExpr::Default);

        let inferred = if expr.is_conditional() {
            StateKind::Query
        } else {
            StateKind::Operation
        };
        registry.settle_kind(index, inferred);

        let resolver = Resolver {
            registry: &*registry,
            index,
            default_next: (index + 1 < count).then_some(index + 1),
        };
        specs.push(resolver.resolve(expr)?);
    }

    Ok(TransitionTable::new(specs))
}

struct Resolver<'a, C> {
    registry: &'a HandlerRegistry<C>,
    index: usize,
    default_next: Option<usize>,
}

impl<C> Resolver<'_, C> {
    fn resolve(&self, expr: TransitionExpr) -> Result<TransitionSpec, BuildError> {
        let kind = self
            .registry
            .get(self.index)
            .map(|h| h.kind())
            .unwrap_or(StateKind::Operation);

        match (kind, expr) {
            (StateKind::Terminal, TransitionExpr::Default) => Ok(TransitionSpec::Halt),
            (StateKind::Terminal, _) => Err(self.mismatch(kind, "terminal states take no transition")),

            (StateKind::Operation, TransitionExpr::Default) => {
                Ok(TransitionSpec::Next(self.default_next()?))
            }
            (StateKind::Operation, TransitionExpr::Unconditional(code)) => {
                Ok(TransitionSpec::Next(self.target(&code)?))
            }
            (StateKind::Operation, TransitionExpr::Conditional { .. }) => {
                Err(self.mismatch(kind, "its transition is conditional"))
            }

            (StateKind::Query, TransitionExpr::Default) => {
                let next = self.default_next()?;
                Ok(TransitionSpec::Branch {
                    on_true: next,
                    on_false: next,
                })
            }
            (StateKind::Query, TransitionExpr::Conditional { on_true, on_false }) => {
                Ok(TransitionSpec::Branch {
                    on_true: self.branch(on_true.as_deref())?,
                    on_false: self.branch(on_false.as_deref())?,
                })
            }
            (StateKind::Query, TransitionExpr::Unconditional(_)) => Err(self.mismatch(
                kind,
                "its transition is unconditional, use T:<code> and F:<code>",
            )),
        }
    }

    fn name(&self) -> String {
        self.registry.name_at(self.index).to_string()
    }

    fn default_next(&self) -> Result<usize, BuildError> {
        self.default_next
            .ok_or_else(|| BuildError::MissingDefaultTransition { state: self.name() })
    }

    fn target(&self, code: &str) -> Result<usize, BuildError> {
        self.registry
            .index_of(code)
            .map_err(|_| BuildError::UnresolvedTransitionTarget {
                from: self.name(),
                target: code.to_string(),
            })
    }

    fn branch(&self, code: Option<&str>) -> Result<usize, BuildError> {
        match code {
            Some(code) => self.target(code),
            None => self.default_next(),
        }
    }

    fn mismatch(&self, declared: StateKind, reason: &str) -> BuildError {
        BuildError::KindMismatch {
            state: self.name(),
            declared,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Handler, Reply};

    fn registry(entries: Vec<(&str, Handler<()>)>) -> HandlerRegistry<()> {
        HandlerRegistry::new(entries).unwrap()
    }

    fn op() -> Handler<()> {
        Handler::operation(|_| {})
    }

    fn query() -> Handler<()> {
        Handler::query(|_| true)
    }

    #[test]
    fn unlisted_handlers_follow_declaration_order() {
        let mut reg = registry(vec![
            ("s1_first", op()),
            ("s2_second", op()),
            ("s3_all_done_end", Handler::terminal()),
        ]);
        let table = compile(&mut reg, &DeclarativeTable::new()).unwrap();

        assert_eq!(table.spec(0), Some(&TransitionSpec::Next(1)));
        assert_eq!(table.spec(1), Some(&TransitionSpec::Next(2)));
        assert_eq!(table.spec(2), Some(&TransitionSpec::Halt));
    }

    #[test]
    fn query_branches_fall_back_to_default() {
        let mut reg = registry(vec![
            ("s1_init", op()),
            ("s2_has_more", query()),
            ("s3_step", op()),
            ("s4_calc_complete", Handler::terminal()),
        ]);
        let table = DeclarativeTable::new()
            .entry("HM", "F:CC")
            .entry("step", "I");
        let compiled = compile(&mut reg, &table).unwrap();

        assert_eq!(
            compiled.spec(1),
            Some(&TransitionSpec::Branch {
                on_true: 2,
                on_false: 3
            })
        );
        assert_eq!(compiled.spec(2), Some(&TransitionSpec::Next(0)));
    }

    #[test]
    fn both_branches_explicit() {
        let mut reg = registry(vec![
            ("s1_init", op()),
            ("s2_has_more", query()),
            ("s3_done", Handler::terminal()),
        ]);
        let table = DeclarativeTable::new().entry("has_more", "T:init,F:done");
        let compiled = compile(&mut reg, &table).unwrap();

        assert_eq!(
            compiled.spec(1),
            Some(&TransitionSpec::Branch {
                on_true: 0,
                on_false: 2
            })
        );
    }

    #[test]
    fn last_non_terminal_needs_explicit_target() {
        let mut reg = registry(vec![("s1_first", op()), ("s2_second", op())]);
        let result = compile(&mut reg, &DeclarativeTable::new());
        assert!(matches!(
            result,
            Err(BuildError::MissingDefaultTransition { state }) if state == "second"
        ));

        let mut reg = registry(vec![("s1_first", op()), ("s2_second", op())]);
        let table = DeclarativeTable::new().entry("S", "F");
        assert!(compile(&mut reg, &table).is_ok());
    }

    #[test]
    fn last_query_with_one_branch_needs_default() {
        let mut reg = registry(vec![("s1_first", op()), ("s2_again", query())]);
        let table = DeclarativeTable::new().entry("A", "T:F");
        assert!(matches!(
            compile(&mut reg, &table),
            Err(BuildError::MissingDefaultTransition { .. })
        ));
    }

    #[test]
    fn unknown_target_is_fatal() {
        let mut reg = registry(vec![("s1_first", op()), ("s2_calc_end", Handler::terminal())]);
        let table = DeclarativeTable::new().entry("F", "NOPE");
        match compile(&mut reg, &table) {
            Err(BuildError::UnresolvedTransitionTarget { from, target }) => {
                assert_eq!(from, "first");
                assert_eq!(target, "NOPE");
            }
            other => panic!("Expected UnresolvedTransitionTarget, got {other:?}"),
        }
    }

    #[test]
    fn unknown_key_is_fatal() {
        let mut reg = registry(vec![("s1_first", op()), ("s2_calc_end", Handler::terminal())]);
        let table = DeclarativeTable::new().entry("ZZ", "F");
        assert!(matches!(
            compile(&mut reg, &table),
            Err(BuildError::UnknownState(_))
        ));
    }

    #[test]
    fn acronym_and_name_for_same_state_conflict() {
        let mut reg = registry(vec![("s1_first", op()), ("s2_calc_end", Handler::terminal())]);
        let table = DeclarativeTable::new()
            .entry("F", "CE")
            .entry("first", "CE");
        assert!(matches!(
            compile(&mut reg, &table),
            Err(BuildError::DuplicateEntry { .. })
        ));
    }

    #[test]
    fn expression_must_fit_kind() {
        let cases = vec![
            ("F", "T:CE"),
            ("Q", "CE"),
            ("CE", "F"),
        ];
        for (code, expr) in cases {
            let mut reg = registry(vec![
                ("s1_first", op()),
                ("s2_query", query()),
                ("s3_calc_end", Handler::terminal()),
            ]);
            let table = DeclarativeTable::new().entry(code, expr);
            assert!(
                matches!(compile(&mut reg, &table), Err(BuildError::KindMismatch { .. })),
                "{code} => {expr} should not compile"
            );
        }
    }

    #[test]
    fn dynamic_kind_comes_from_entry_shape() {
        let mut reg = registry(vec![
            ("s1_probe", Handler::dynamic(|_| Reply::Unit)),
            ("s2_check", Handler::dynamic(|_| Reply::Bool(true))),
            ("s3_calc_end", Handler::terminal()),
        ]);
        let table = DeclarativeTable::new().entry("C", "T:P");
        compile(&mut reg, &table).unwrap();

        assert_eq!(reg.get(0).unwrap().kind(), StateKind::Operation);
        assert_eq!(reg.get(1).unwrap().kind(), StateKind::Query);
    }
}
