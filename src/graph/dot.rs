//! Minimal Graphviz `dot` description builder.

use crate::graph::error::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node shapes, in the order their declaration lines are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    Box,
    Diamond,
    Ellipse,
}

impl NodeShape {
    pub const ALL: [NodeShape; 3] = [NodeShape::Box, NodeShape::Diamond, NodeShape::Ellipse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Diamond => "diamond",
            Self::Ellipse => "ellipse",
        }
    }
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Edge {
    from: String,
    to: String,
    label: Option<String>,
}

/// Directed graph with shaped nodes and optionally labeled edges.
///
/// Nodes and edges keep insertion order so the rendered text is stable.
///
/// # Example
///
/// ```rust
/// use flowstate::graph::{DotGraph, NodeShape};
///
/// let mut graph = DotGraph::new("Demo", "Demo machine");
/// graph.add_node("Start", NodeShape::Box).unwrap();
/// graph.add_node("Done", NodeShape::Diamond).unwrap();
/// graph.add_edge("Start", "Done", None).unwrap();
///
/// let text = graph.render();
/// assert!(text.starts_with("digraph Demo {"));
/// assert!(text.contains("Start->Done;"));
/// ```
#[derive(Clone, Debug)]
pub struct DotGraph {
    name: String,
    label: String,
    font_size: u32,
    nodes: Vec<(String, NodeShape)>,
    edges: Vec<Edge>,
}

impl DotGraph {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            font_size: 12,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_font_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn add_node(&mut self, name: impl Into<String>, shape: NodeShape) -> Result<(), GraphError> {
        let name = name.into();
        if self.has_node(&name) {
            return Err(GraphError::DuplicateNode { node: name });
        }
        self.nodes.push((name, shape));
        Ok(())
    }

    pub fn add_edge(&mut self, from: &str, to: &str, label: Option<&str>) -> Result<(), GraphError> {
        for node in [from, to] {
            if !self.has_node(node) {
                return Err(GraphError::UnknownNode {
                    node: node.to_string(),
                });
            }
        }
        if self.edges.iter().any(|e| e.from == from && e.to == to) {
            return Err(GraphError::DuplicateEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        self.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
            label: label.map(str::to_string),
        });
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|(n, _)| n == name)
    }

    /// Lines of the `dot` description, without trailing newlines.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("digraph {} {{", id(&self.name))];

        for shape in NodeShape::ALL {
            let members: Vec<String> = self
                .nodes
                .iter()
                .filter(|(_, s)| *s == shape)
                .map(|(n, _)| id(n))
                .collect();
            lines.push(format!("node [shape={}] {}", shape, members.join("; ")));
        }

        for edge in &self.edges {
            match &edge.label {
                Some(label) => lines.push(format!(
                    "{}->{} [label=\"{}\"];",
                    id(&edge.from),
                    id(&edge.to),
                    escape(label)
                )),
                None => lines.push(format!("{}->{};", id(&edge.from), id(&edge.to))),
            }
        }

        lines.push("overlap=false".to_string());
        lines.push(format!("label=\"{}\"", escape(&self.label)));
        lines.push(format!("fontsize={}", self.font_size));
        lines.push("}".to_string());
        lines
    }

    pub fn render(&self) -> String {
        let mut text = self.lines().join("\n");
        text.push('\n');
        text
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Plain `dot` identifiers are written as is; anything else is quoted.
fn id(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", escape(name))
    }
}
