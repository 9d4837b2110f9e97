//! archgraph-core: interactive architecture graph engine.
//!
//! Packages and classes are drawn as nested circles, dependencies between
//! them as edges. This crate keeps the circles packed and enclosed while
//! nodes are dragged and folded, decides which node lies in front, and groups
//! class level dependencies into one edge per pair of visible nodes.

pub mod config;
pub mod dependency;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod output;
pub mod transition;
pub mod tree;
pub mod view;
mod wasm;

pub use config::GraphConfig;
pub use error::{GraphError, ViewError};
pub use graph::{Graph, GraphBuilder, GraphInput};
pub use output::GraphOutput;
pub use wasm::WasmGraph;
