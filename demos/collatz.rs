//! Longest Collatz chain below a target, computed by a cached state machine.
//!
//! ```text
//! cargo run --example collatz -- 1000
//! cargo run --example collatz -- diagram
//! ```
//!
//! Set `RUST_LOG=flowstate=debug` to see every step.

use flowstate::{transitions, Machine, MachineBuilder};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing_subscriber::EnvFilter;

/// Probes beyond the target stay uncached so the final check has an answer.
const PROBE_MARGIN: u64 = 1000;

fn next_collatz(n: u64) -> u64 {
    if n % 2 == 0 {
        n / 2
    } else {
        3 * n + 1
    }
}

#[derive(Debug, Default)]
struct CollatzSearch {
    target: u64,
    chain_lengths: BTreeMap<u64, u64>,
    not_in_cache: BTreeSet<u64>,
    query_stack: VecDeque<u64>,
}

impl CollatzSearch {
    fn new(target: u64) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    fn next_probe(&self) -> u64 {
        self.not_in_cache.first().copied().unwrap_or(u64::MAX)
    }

    fn next_of_front(&self) -> u64 {
        self.query_stack.front().copied().map_or(1, next_collatz)
    }

    /// Start value with the longest chain, ties going to the smaller start.
    fn longest(&self) -> Option<(u64, u64)> {
        self.chain_lengths
            .iter()
            .filter(|(start, _)| **start <= self.target)
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(start, length)| (*start, *length))
    }
}

fn collatz_machine(target: u64) -> Result<Machine<CollatzSearch>, flowstate::BuildError> {
    MachineBuilder::new(CollatzSearch::new(target))
        .operation("s1_init_machine", |s: &mut CollatzSearch| {
            s.chain_lengths.insert(1, 1);
            s.not_in_cache = (2..s.target + PROBE_MARGIN).collect();
        })
        .operation("s2_add_next_probe_to_stack", |s: &mut CollatzSearch| {
            let probe = s.next_probe();
            s.query_stack.push_back(probe);
        })
        .query("s3_next_query_in_cache", |s: &mut CollatzSearch| {
            s.chain_lengths.contains_key(&s.next_of_front())
        })
        .operation("s4_add_result_to_cache", |s: &mut CollatzSearch| {
            let Some(query) = s.query_stack.front().copied() else {
                return;
            };
            let length = s.chain_lengths.get(&next_collatz(query)).copied().unwrap_or(0);
            s.chain_lengths.insert(query, length + 1);
            s.not_in_cache.remove(&query);
        })
        .operation("s5_add_query_to_stack", |s: &mut CollatzSearch| {
            let next = s.next_of_front();
            s.query_stack.push_front(next);
        })
        .operation("s6_poll_query_stack", |s: &mut CollatzSearch| {
            s.query_stack.pop_front();
        })
        .query("s7_query_stack_empty", |s: &mut CollatzSearch| {
            s.query_stack.is_empty()
        })
        .query("s8_is_next_above_target", |s: &mut CollatzSearch| {
            s.next_probe() > s.target
        })
        .terminal("s9_calc_complete")
        .table(transitions! {
            "NQIC" => "F:AQTS",
            "ARTC" => "PQS",
            "AQTS" => "NQIC",
            "QSE" => "F:NQIC",
            "INAT" => "F:ANPTS",
        })
        .build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let argument = std::env::args().nth(1);

    if argument.as_deref() == Some("diagram") {
        let machine = collatz_machine(100)?;
        println!("{}", machine.to_dot()?);
        return Ok(());
    }

    let target = match argument {
        Some(text) => text.parse()?,
        None => 1000,
    };

    let mut machine = collatz_machine(target)?;
    machine.run_to_completion()?;

    match machine.context().longest() {
        Some((start, length)) => println!(
            "Longest chain below {target} starts at {start} with {length} terms ({} steps)",
            machine.step_count()
        ),
        None => println!("No chains computed for target {target}"),
    }

    Ok(())
}
