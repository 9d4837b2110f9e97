//! Output types for frontend consumption.
//!
//! A snapshot of the whole graph, serialized to JSON and handed to the
//! JavaScript side for rendering.

use serde::Serialize;

use crate::geometry::{Circle, Vector};
use crate::graph::Graph;
use crate::layout::label_offset;
use crate::tree::NodeKind;

/// A node as it should currently be drawn
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutput {
    pub full_name: String,
    /// Label (may be a compressed package chain like `my.company`)
    pub name: String,
    pub kind: NodeKind,
    /// Full name of the parent, `None` for the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub circle: Circle,
    pub label_offset: f64,
    pub visible: bool,
    pub folded: bool,
    /// CSS classes, e.g. "class foldable"
    pub class_names: String,
}

/// A grouped dependency between two visible nodes
#[derive(Debug, Clone, Serialize)]
pub struct DependencyOutput {
    pub origin: String,
    pub target: String,
    /// CSS classes, e.g. "EXTENDS severalDashed"
    pub class_names: String,
    pub violation: bool,
    pub visible: bool,
    pub start: Vector,
    pub end: Vector,
    pub has_detailed_description: bool,
}

/// Error information for the frontend
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub message: String,
}

/// The combined output sent to the frontend
#[derive(Debug, Clone, Serialize)]
pub struct GraphOutput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyOutput>,
    /// Radius of the root circle (half the drawing's width and height)
    pub radius: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl GraphOutput {
    pub fn from_graph(graph: &Graph) -> Self {
        let tree = graph.tree();
        let cfg = &graph.config().layout;

        let nodes = tree
            .nodes()
            .filter(|n| !n.is_root())
            .map(|n| NodeOutput {
                full_name: n.full_name.clone(),
                name: n.name.clone(),
                kind: n.kind,
                parent: n.parent.filter(|&p| p != tree.root()).map(|p| tree.full_name(p).to_string()),
                circle: n.circle,
                label_offset: label_offset(tree, n.id, cfg),
                visible: tree.is_visible(n.id),
                folded: n.folded,
                class_names: tree.style(n.id).class_names(),
            })
            .collect();

        let dependencies = graph
            .grouped_dependencies()
            .map(|d| DependencyOutput {
                origin: d.key.origin.clone(),
                target: d.key.target.clone(),
                class_names: d.class_names(),
                violation: d.violation,
                visible: d.is_visible(),
                start: d.start,
                end: d.end,
                has_detailed_description: d.has_detailed_description(tree),
            })
            .collect();

        Self {
            nodes,
            dependencies,
            radius: tree.node(tree.root()).circle.r,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            dependencies: Vec::new(),
            radius: 0.0,
            error: Some(ErrorInfo { message: message.into() }),
        }
    }
}
