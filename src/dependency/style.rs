// Dependency styles.
//
// Two independent categories: color and dash. For each category the set of
// styled type tags is configured; the distinct styled types among a group of
// elementary dependencies resolve to no style, one style, or "mixed".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{ElementaryDependency, INNERCLASS_DEPENDENCY};

pub const SEVERAL_COLORS: &str = "severalColors";
pub const SEVERAL_DASHED: &str = "severalDashed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleClass {
    /// No contributing dependency has a styled type.
    Plain,
    /// Every styled contributing dependency has this type.
    Single(String),
    /// At least two different styled types contribute.
    Mixed,
}

impl StyleClass {
    /// Resolve from the type tags of a dependency group.
    pub fn resolve<'a, I>(kinds: I, styled: &BTreeSet<String>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = kinds.into_iter().filter(|k| styled.contains(*k)).collect();
        let mut iter = distinct.into_iter();
        match (iter.next(), iter.next()) {
            (None, _) => StyleClass::Plain,
            (Some(only), None) => StyleClass::Single(only.to_string()),
            (Some(_), Some(_)) => StyleClass::Mixed,
        }
    }

    fn token<'a>(&'a self, mixed: &'a str) -> Option<&'a str> {
        match self {
            StyleClass::Plain => None,
            StyleClass::Single(kind) => Some(kind.as_str()),
            StyleClass::Mixed => Some(mixed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyStyle {
    pub color: StyleClass,
    pub dash: StyleClass,
}

impl DependencyStyle {
    pub const PLAIN: DependencyStyle = DependencyStyle {
        color: StyleClass::Plain,
        dash: StyleClass::Plain,
    };

    /// CSS classes for the view, e.g. `"EXTENDS severalDashed"`.
    pub fn class_names(&self) -> String {
        [self.color.token(SEVERAL_COLORS), self.dash.token(SEVERAL_DASHED)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for DependencyStyle {
    fn default() -> Self {
        Self::PLAIN
    }
}

/// Which dependency types are drawn colored and which dashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyStyles {
    pub colored: BTreeSet<String>,
    pub dashed: BTreeSet<String>,
}

impl Default for DependencyStyles {
    fn default() -> Self {
        Self {
            colored: ["EXTENDS", "IMPLEMENTS"].into_iter().map(String::from).collect(),
            dashed: [INNERCLASS_DEPENDENCY].into_iter().map(String::from).collect(),
        }
    }
}

impl DependencyStyles {
    pub fn resolve(&self, deps: &[&ElementaryDependency]) -> DependencyStyle {
        let kinds = move || deps.iter().filter_map(|d| d.kind());
        DependencyStyle {
            color: StyleClass::resolve(kinds(), &self.colored),
            dash: StyleClass::resolve(kinds(), &self.dashed),
        }
    }
}
