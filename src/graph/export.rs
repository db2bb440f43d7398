//! Export a resolved machine as a `dot` graph.

use crate::core::{camel_case, HandlerRegistry, StateKind};
use crate::graph::dot::{DotGraph, NodeShape};
use crate::graph::error::GraphError;
use crate::table::TransitionTable;
use serde::{Deserialize, Serialize};

/// Graph header settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    pub graph_name: String,
    pub graph_label: String,
    pub font_size: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            graph_name: "FiniteStateMachine".to_string(),
            graph_label: "FsMachine".to_string(),
            font_size: 12,
        }
    }
}

impl GraphOptions {
    /// Parse options from JSON; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

pub fn shape_for(kind: StateKind) -> NodeShape {
    match kind {
        StateKind::Operation => NodeShape::Box,
        StateKind::Query => NodeShape::Ellipse,
        StateKind::Terminal => NodeShape::Diamond,
    }
}

/// Build the graph for a registry and its compiled table.
pub fn build_graph<C>(
    registry: &HandlerRegistry<C>,
    table: &TransitionTable,
    options: &GraphOptions,
) -> Result<DotGraph, GraphError> {
    let mut graph = DotGraph::new(&options.graph_name, &options.graph_label)
        .with_font_size(options.font_size);

    let names: Vec<String> = registry
        .ordered_handlers()
        .iter()
        .map(|h| camel_case(h.name()))
        .collect();

    for (handler, name) in registry.ordered_handlers().iter().zip(&names) {
        graph.add_node(name.as_str(), shape_for(handler.kind()))?;
    }

    for (index, spec) in table.iter() {
        let targets = spec.targets();
        let from = &names[index];

        match targets.as_slice() {
            // Both query branches land on the same state.
            [(on_true, Some(true)), (on_false, Some(false))] if on_true == on_false => {
                graph.add_edge(from, &names[*on_true], Some("T/F"))?;
            }
            _ => {
                for &(target, outcome) in &targets {
                    let label = outcome.map(|flag| if flag { "T" } else { "F" });
                    graph.add_edge(from, &names[target], label)?;
                }
            }
        }
    }

    Ok(graph)
}

/// Render the `dot` text for a registry and its compiled table.
pub fn export<C>(
    registry: &HandlerRegistry<C>,
    table: &TransitionTable,
    options: &GraphOptions,
) -> Result<String, GraphError> {
    build_graph(registry, table, options).map(|graph| graph.render())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_follow_kind() {
        assert_eq!(shape_for(StateKind::Operation), NodeShape::Box);
        assert_eq!(shape_for(StateKind::Query), NodeShape::Ellipse);
        assert_eq!(shape_for(StateKind::Terminal), NodeShape::Diamond);
    }

    #[test]
    fn options_fill_missing_fields() {
        let options = GraphOptions::from_json(r#"{"graph_label": "Collatz"}"#).unwrap();
        assert_eq!(options.graph_label, "Collatz");
        assert_eq!(options.graph_name, "FiniteStateMachine");
        assert_eq!(options.font_size, 12);
    }

    #[test]
    fn options_reject_bad_types() {
        assert!(GraphOptions::from_json(r#"{"font_size": "big"}"#).is_err());
    }
}
