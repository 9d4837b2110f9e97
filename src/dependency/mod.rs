//
// Dependencies between nodes.
//
// Elementary dependencies are the concrete class-to-class relations from the
// input. Grouped dependencies are what is drawn: one edge per pair of
// currently visible nodes, aggregating every elementary dependency whose ends
// are represented by that pair.
//
// Submodules:
// - style: style categories and their resolution
// - grouped: the drawn edge and its geometry
// - cache: the session-owned cache of grouped dependencies
//
// Elementary dependencies are never re-pointed: when a fold hides one of its
// ends, a shifted copy is grouped instead.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::tree::{NodeId, NodeTree};

pub mod cache;
pub mod grouped;
pub mod style;

pub use cache::DependencyCache;
pub use grouped::{EdgeEnds, EdgeGeometry, GroupedDependency, RimToRim};
pub use style::{DependencyStyle, DependencyStyles, StyleClass};

/// Type tag of the dependency between an inner class and its enclosing class.
pub const INNERCLASS_DEPENDENCY: &str = "INNERCLASS_DEPENDENCY";

/// Types every graph knows about, regardless of its input.
pub fn default_dependency_types() -> Vec<&'static str> {
    vec![INNERCLASS_DEPENDENCY]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementaryDependency {
    pub origin: NodeId,
    pub target: NodeId,
    /// `None` for dependencies shifted onto a folded ancestor.
    pub kind: Option<String>,
    pub description: String,
    pub violation: bool,
    /// Per filter: does this dependency pass it.
    matches_filter: BTreeMap<String, bool>,
}

impl ElementaryDependency {
    pub fn new(origin: NodeId, target: NodeId, kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            origin,
            target,
            kind: Some(kind.into()),
            description: description.into(),
            violation: false,
            matches_filter: BTreeMap::new(),
        }
    }

    /// A copy re-anchored at other (visible) end nodes. Keeps the violation
    /// flag, drops type and description.
    pub fn shifted(&self, origin: NodeId, target: NodeId) -> Self {
        Self {
            origin,
            target,
            kind: None,
            description: String::new(),
            violation: self.violation,
            matches_filter: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn set_matches_filter(&mut self, filter: &str, matches: bool) {
        self.matches_filter.insert(filter.to_string(), matches);
    }

    pub fn matches_filter(&self, filter: &str) -> Option<bool> {
        self.matches_filter.get(filter).copied()
    }

    /// True if no filter rejects this dependency.
    pub fn matches_all_filters(&self) -> bool {
        self.matches_filter.values().all(|&m| m)
    }

    pub fn mark_as_violation(&mut self) {
        self.violation = true;
    }

    pub fn unmark_as_violation(&mut self) {
        self.violation = false;
    }
}

impl fmt::Display for ElementaryDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Cache key of a grouped dependency: the full names of both visible ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DependencyKey {
    pub origin: String,
    pub target: String,
}

impl DependencyKey {
    pub fn new(tree: &NodeTree, origin: NodeId, target: NodeId) -> Self {
        Self {
            origin: tree.full_name(origin).to_string(),
            target: tree.full_name(target).to_string(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            origin: self.target.clone(),
            target: self.origin.clone(),
        }
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.origin, self.target)
    }
}
