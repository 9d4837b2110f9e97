//! Graph configuration, deserializable from JSON. Every field is optional.

use serde::{Deserialize, Serialize};

use crate::dependency::DependencyStyles;
use crate::error::GraphError;
use crate::layout::LayoutConfig;
use crate::tree::Node;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub layout: LayoutConfig,
    pub styles: DependencyStyles,
    /// Containers at this depth or deeper start folded (the root's children
    /// have depth 1). `None` starts fully unfolded.
    pub initial_fold_depth: Option<usize>,
}

impl GraphConfig {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Whether `node` starts folded.
    pub fn folds_initially(&self, node: &Node) -> bool {
        self.initial_fold_depth.is_some_and(|depth| node.depth >= depth)
    }
}
