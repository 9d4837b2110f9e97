// Session-owned cache of grouped dependencies.
//
// One grouped dependency per pair of visible full names. Entries are never
// evicted: folding back and forth reuses the instances (and with them their
// views).

use std::collections::HashMap;

use log::debug;

use crate::error::GraphError;
use crate::tree::{NodeId, NodeTree};

use super::{DependencyKey, DependencyStyle, DependencyStyles, ElementaryDependency, GroupedDependency};

#[derive(Debug, Clone, Default)]
pub struct DependencyCache {
    entries: HashMap<DependencyKey, GroupedDependency>,
}

impl DependencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up (or create) the grouped dependency between two visible nodes
    /// and update its style and violation from `elementary`. The flag is true
    /// if the instance was created by this call.
    pub fn get_or_create(
        &mut self,
        tree: &NodeTree,
        styles: &DependencyStyles,
        origin: NodeId,
        target: NodeId,
        elementary: &[&ElementaryDependency],
    ) -> Result<(&mut GroupedDependency, bool), GraphError> {
        tree.check(origin)?;
        tree.check(target)?;
        if origin == target {
            return Err(GraphError::SelfDependency(tree.full_name(origin).to_string()));
        }
        if elementary.is_empty() {
            return Err(GraphError::EmptyDependencyGroup {
                origin: tree.full_name(origin).to_string(),
                target: tree.full_name(target).to_string(),
            });
        }

        let violation = elementary.iter().any(|d| d.violation);
        let style = if tree.is_package(origin) || tree.is_package(target) {
            DependencyStyle::PLAIN
        } else {
            styles.resolve(elementary)
        };

        let key = DependencyKey::new(tree, origin, target);
        let created = !self.entries.contains_key(&key);
        if created {
            debug!("new grouped dependency {}", key);
        }
        let dep = self
            .entries
            .entry(key)
            .or_insert_with(|| GroupedDependency::new(tree, origin, target));
        dep.with_style_and_violation(style, violation);
        Ok((dep, created))
    }

    pub fn get(&self, key: &DependencyKey) -> Option<&GroupedDependency> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &DependencyKey) -> Option<&mut GroupedDependency> {
        self.entries.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
