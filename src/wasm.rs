//! WASM bindings for the archgraph-core library.
//!
//! All functions exposed to JavaScript via wasm-bindgen are defined here.
//! Views on the JavaScript side render from the JSON snapshots these
//! functions return; the session itself runs with headless views.

use futures::FutureExt;
use log::{Level, info, warn};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::config::GraphConfig;
use crate::dependency::default_dependency_types;
use crate::error::{GraphError, ViewError};
use crate::geometry::Vector;
use crate::graph::{Graph, GraphInput};
use crate::output::GraphOutput;

/// Initialize logging and panic hooks for the WASM target.
#[wasm_bindgen]
pub fn init_logging() {
    let _ = console_log::init_with_level(Level::Debug);
    console_error_panic_hook::set_once();
    info!("archgraph: logging initialized");
}

/// Dependency types every graph knows about, as a JSON array.
#[wasm_bindgen]
pub fn default_types() -> String {
    to_json(&default_dependency_types())
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("{{\"error\": {{\"message\": \"{}\"}}}}", e))
}

fn error_json(err: &GraphError) -> String {
    warn!("archgraph: {}", err);
    to_json(&GraphOutput::error(err.to_string()))
}

#[derive(Deserialize)]
struct ViolationPair {
    origin: String,
    target: String,
}

#[wasm_bindgen]
pub struct WasmGraph {
    graph: Graph,
}

#[wasm_bindgen]
impl WasmGraph {
    /// Build a graph from `{"classes": [...], "dependencies": [...]}` and an
    /// optional configuration (empty string for defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(input: &str, config: &str) -> Result<WasmGraph, JsValue> {
        let build = || -> Result<Graph, GraphError> {
            let input = GraphInput::from_json(input)?;
            let config = GraphConfig::from_json(config)?;
            Graph::builder(config).build(&input)
        };
        build().map(|graph| WasmGraph { graph }).map_err(|e| JsValue::from_str(&error_json(&e)))
    }

    pub fn snapshot(&self) -> String {
        to_json(&GraphOutput::from_graph(&self.graph))
    }

    pub fn drag(&mut self, full_name: &str, dx: f64, dy: f64) -> String {
        let result = self
            .graph
            .node_id(full_name)
            .and_then(|id| self.graph.drag(id, Vector::new(dx, dy)));
        match result {
            Ok(_) => self.snapshot(),
            Err(e) => error_json(&e),
        }
    }

    pub fn focus(&mut self, full_name: &str) -> String {
        let result = self.graph.node_id(full_name).and_then(|id| self.graph.focus(id));
        match result {
            Ok(()) => self.snapshot(),
            Err(e) => error_json(&e),
        }
    }

    pub fn fold(&mut self, full_name: &str) -> String {
        self.toggle(full_name, true)
    }

    pub fn unfold(&mut self, full_name: &str) -> String {
        self.toggle(full_name, false)
    }

    /// Elementary dependencies behind a drawn edge, as a JSON array of
    /// `{"type", "description"}` objects.
    pub fn detailed_dependencies(&self, origin: &str, target: &str) -> String {
        match self.graph.detailed_dependencies(origin, target) {
            Ok(deps) => {
                let details: Vec<serde_json::Value> = deps
                    .iter()
                    .map(|d| serde_json::json!({ "type": d.kind(), "description": d.description }))
                    .collect();
                to_json(&details)
            }
            Err(e) => error_json(&e),
        }
    }

    /// Mark (or unmark) violations from `[{"origin": ..., "target": ...}]`.
    pub fn set_violations(&mut self, pairs: &str, violation: bool) -> String {
        let pairs: Vec<ViolationPair> = match serde_json::from_str(pairs) {
            Ok(pairs) => pairs,
            Err(e) => return error_json(&e.into()),
        };
        let pairs: Vec<(&str, &str)> = pairs.iter().map(|p| (p.origin.as_str(), p.target.as_str())).collect();
        let result = if violation {
            self.graph.mark_violations(&pairs)
        } else {
            self.graph.unmark_violations(&pairs)
        };
        match result {
            Ok(_) => self.snapshot(),
            Err(e) => error_json(&e),
        }
    }
}

impl WasmGraph {
    fn toggle(&mut self, full_name: &str, fold: bool) -> String {
        let id = match self.graph.node_id(full_name) {
            Ok(id) => id,
            Err(e) => return error_json(&e),
        };
        // Headless views finish their transitions immediately.
        let result = if fold {
            self.graph.fold(id).now_or_never()
        } else {
            self.graph.unfold(id).now_or_never()
        };
        match finished(result) {
            Ok(_) => self.snapshot(),
            Err(e) => error_json(&e),
        }
    }
}

/// Outcome of a transition polled once. Still pending counts as a failed
/// transition: the facade has no executor to wait on.
fn finished<T>(polled: Option<Result<T, GraphError>>) -> Result<T, GraphError> {
    polled.unwrap_or_else(|| Err(GraphError::Transition(ViewError::new("transition did not finish"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_transition_is_a_transition_error() {
        assert_eq!(
            finished::<bool>(None),
            Err(GraphError::Transition(ViewError::new("transition did not finish")))
        );
        assert_eq!(finished(Some(Ok(true))), Ok(true));
    }

    #[test]
    fn test_unknown_node_is_reported_as_json() {
        let input = r#"{"classes": ["p.A", "q.B"], "dependencies": []}"#;
        let mut graph = WasmGraph::new(input, "").unwrap();
        let out: serde_json::Value = serde_json::from_str(&graph.drag("p.X", 1.0, 0.0)).unwrap();
        assert_eq!(out["error"]["message"], "unknown node `p.X`");
        let out: serde_json::Value = serde_json::from_str(&graph.focus("p.A")).unwrap();
        assert!(out.get("error").is_none());
    }
}
