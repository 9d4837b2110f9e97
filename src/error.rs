//! Error types shared by the tree, the dependency engine and the session.

use thiserror::Error;

/// A view rejected (or failed to complete) a transition it was asked to run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("view rejected transition: {reason}")]
pub struct ViewError {
    pub reason: String,
}

impl ViewError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The same fully qualified name was declared twice.
    #[error("duplicate node `{0}`")]
    DuplicateNode(String),

    /// A name is used as a package by one declaration and as a class by another.
    #[error("`{0}` is declared both as a package and as a class")]
    ConflictingKind(String),

    #[error("invalid class name `{0}`")]
    InvalidName(String),

    #[error("unknown node `{0}`")]
    UnknownNode(String),

    #[error("dependency from `{0}` to itself")]
    SelfDependency(String),

    #[error("no elementary dependencies between `{origin}` and `{target}`")]
    EmptyDependencyGroup { origin: String, target: String },

    #[error(transparent)]
    Transition(#[from] ViewError),

    #[error("invalid graph input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::InvalidInput(err.to_string())
    }
}
