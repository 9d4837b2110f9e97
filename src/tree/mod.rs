//
// Node tree: arena of nested circles built from fully qualified class names.
//
// What this does:
// - Builds packages, classes and inner classes from dotted names
//   (`.` separates packages, `$` separates nested classes)
// - Compresses package chains with a single package child (`my.company`)
// - Enforces uniqueness of declared names
// - Stores absolute circles plus centers relative to the parent
// - Fold / unfold / filter state and visibility queries
//
// Submodules:
// - focus: z-order (which of two nodes lies in front)
// - drag: dragging with containment and overlap repair
//
// Mutations never talk to views or listeners; they return `TreeEvent`s that
// the session dispatches.

use std::collections::{BTreeSet, HashMap};

use log::debug;
use serde::Serialize;

use crate::error::GraphError;
use crate::geometry::{Circle, Vector};

mod drag;
mod focus;

pub const PACKAGE_SEPARATOR: char = '.';
pub const INNER_CLASS_SEPARATOR: char = '$';

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Package,
    Class,
    InnerClass,
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: NodeId,
    /// Label relative to the parent (may be a compressed chain like `my.company`).
    pub name: String,
    pub full_name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    /// Declaration order.
    pub children: Vec<NodeId>,
    /// Absolute circle in the shared coordinate space.
    pub circle: Circle,
    /// Center offset from the parent's center.
    pub relative: Vector,
    pub folded: bool,
    /// Excluded by a filter.
    pub hidden: bool,
    /// Last focus stamp (0 = never focused).
    pub focus: u64,
    pub depth: usize,
    /// Declared in the input rather than implied by a longer name.
    pub explicit: bool,
    /// Pre-order index, used as z-order tiebreaker.
    pub order: usize,
}

impl Node {
    pub fn is_package(&self) -> bool {
        self.kind == NodeKind::Package
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// How a node's rim should currently be drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RimStyle {
    Default,
    /// Another node is being dragged over this one.
    Overlapped,
}

impl RimStyle {
    pub fn css_class(&self) -> &'static str {
        match self {
            RimStyle::Default => "default",
            RimStyle::Overlapped => "overlapped",
        }
    }
}

/// Style descriptor handed to node views.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStyle {
    pub kind: NodeKind,
    pub foldable: bool,
    pub folded: bool,
}

impl NodeStyle {
    pub fn class_names(&self) -> String {
        let kind = match self.kind {
            NodeKind::Package => "package",
            NodeKind::Class => "class",
            NodeKind::InnerClass => "innerclass",
        };
        let mut out = String::from(kind);
        if self.folded {
            out.push_str(" folded");
        } else if self.foldable {
            out.push_str(" foldable");
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent {
    Dragged(NodeId),
    /// Fold state toggled (fold or unfold).
    Folded(NodeId),
    InitialFolded(NodeId),
    LayoutChanged,
    RimChanged(NodeId, RimStyle),
    NodesFocused,
    NodesOverlapping { overlapped: NodeId, position: Vector },
    SizeExpanded { half_width: f64, half_height: f64 },
}

#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<Node>,
    by_name: HashMap<String, NodeId>,
    focus_counter: u64,
    /// Nodes currently overlapped by the most recently dragged node.
    overlapped: BTreeSet<NodeId>,
}

impl NodeTree {
    /// Build a tree from fully qualified class names, e.g. `my.company.Foo$Bar`.
    pub fn from_class_names<I, S>(names: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ctx = BuildCtx::new();
        for name in names {
            ctx.add_class(name.as_ref())?;
        }
        ctx.compress(0);
        let tree = ctx.finish();
        debug!("built node tree with {} nodes", tree.nodes.len());
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn get_by_name(&self, full_name: &str) -> Option<NodeId> {
        self.by_name.get(full_name).copied()
    }

    pub fn require(&self, full_name: &str) -> Result<NodeId, GraphError> {
        self.get_by_name(full_name)
            .ok_or_else(|| GraphError::UnknownNode(full_name.to_string()))
    }

    /// Ids are only valid for the tree that handed them out.
    pub fn check(&self, id: NodeId) -> Result<NodeId, GraphError> {
        if self.contains(id) {
            Ok(id)
        } else {
            Err(GraphError::UnknownNode(format!("#{}", id.0)))
        }
    }

    pub fn full_name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].full_name
    }

    /// Parents of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.nodes[id.0].parent }
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Root first, `id` last.
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path.push(id);
        path
    }

    /// All descendants in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev().copied());
        }
        out
    }

    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.nodes[id.0].parent {
            Some(p) => self.nodes[p.0].children.iter().copied().filter(|&c| c != id).collect(),
            None => Vec::new(),
        }
    }

    pub fn is_package(&self, id: NodeId) -> bool {
        self.nodes[id.0].is_package()
    }

    /// The node that currently stands in for `id` on screen: the outermost
    /// folded node on its path, or `id` itself. `None` if a node on the path
    /// is filtered out.
    pub fn visible_representative(&self, id: NodeId) -> Option<NodeId> {
        for n in self.path_from_root(id) {
            let node = &self.nodes[n.0];
            if node.hidden {
                return None;
            }
            if node.folded {
                return Some(n);
            }
        }
        Some(id)
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.visible_representative(id) == Some(id)
    }

    /// Children that take part in layout: none for folded nodes, and never
    /// filtered ones.
    pub fn visible_children(&self, id: NodeId) -> Vec<NodeId> {
        let node = &self.nodes[id.0];
        if node.folded {
            return Vec::new();
        }
        node.children.iter().copied().filter(|&c| !self.nodes[c.0].hidden).collect()
    }

    /// Visible nodes in pre-order, root included.
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.visible_children(n).into_iter().rev());
        }
        out
    }

    pub fn style(&self, id: NodeId) -> NodeStyle {
        let node = &self.nodes[id.0];
        NodeStyle {
            kind: node.kind,
            foldable: !node.children.is_empty(),
            folded: node.folded,
        }
    }

    pub fn overlaps_with(&self, a: NodeId, b: NodeId, eps: f64) -> bool {
        self.nodes[a.0].circle.overlaps(&self.nodes[b.0].circle, eps)
    }

    // ------------------------------------------------------------------
    // Fold state and filters
    // ------------------------------------------------------------------

    /// Fold a container. Leaves and already folded nodes are left alone.
    pub fn fold(&mut self, id: NodeId) -> Option<TreeEvent> {
        let node = &mut self.nodes[id.0];
        if node.children.is_empty() || node.folded || node.parent.is_none() {
            return None;
        }
        node.folded = true;
        debug!("folded {}", node.full_name);
        Some(TreeEvent::Folded(id))
    }

    pub fn unfold(&mut self, id: NodeId) -> Option<TreeEvent> {
        let node = &mut self.nodes[id.0];
        if !node.folded {
            return None;
        }
        node.folded = false;
        debug!("unfolded {}", node.full_name);
        self.sync_absolute(id);
        Some(TreeEvent::Folded(id))
    }

    /// Fold every container the policy selects. Children are visited before
    /// their parents so the policy always sees unfolded subtrees.
    pub fn initial_fold<F>(&mut self, mut should_fold: F) -> Vec<TreeEvent>
    where
        F: FnMut(&Node) -> bool,
    {
        let mut order = self.descendants(self.root());
        order.reverse();
        let mut events = Vec::new();
        for id in order {
            if should_fold(&self.nodes[id.0]) && self.fold(id).is_some() {
                events.push(TreeEvent::InitialFolded(id));
            }
        }
        events
    }

    /// Mark a node as filtered out (or back in). Returns true if it changed.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) -> bool {
        if id == self.root() || self.nodes[id.0].hidden == hidden {
            return false;
        }
        self.nodes[id.0].hidden = hidden;
        true
    }

    // ------------------------------------------------------------------
    // Position bookkeeping
    // ------------------------------------------------------------------

    /// Move `id` and its whole subtree by `delta`. Relative positions inside
    /// the subtree are untouched.
    pub(crate) fn translate_subtree(&mut self, id: NodeId, delta: Vector) {
        self.nodes[id.0].relative += delta;
        self.nodes[id.0].circle = self.nodes[id.0].circle.translated(delta);
        for d in self.descendants(id) {
            self.nodes[d.0].circle = self.nodes[d.0].circle.translated(delta);
        }
    }

    /// Replace the absolute circle of `id` while its children stay where they
    /// are on screen.
    pub(crate) fn set_circle(&mut self, id: NodeId, circle: Circle) {
        let parent_center = self.nodes[id.0]
            .parent
            .map(|p| self.nodes[p.0].circle.center())
            .unwrap_or(Vector::ZERO);
        let node = &mut self.nodes[id.0];
        node.circle = circle;
        node.relative = Vector::between(parent_center, circle.center());
        let children = node.children.clone();
        for c in children {
            let child_center = self.nodes[c.0].circle.center();
            self.nodes[c.0].relative = Vector::between(circle.center(), child_center);
        }
    }

    /// Recompute absolute centers of all descendants of `id` from their
    /// relative offsets.
    pub(crate) fn sync_absolute(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let center = self.nodes[n.0].circle.center();
            let children = self.nodes[n.0].children.clone();
            for c in children {
                let child = &mut self.nodes[c.0];
                child.circle = Circle::at(center + child.relative, child.circle.r);
                stack.push(c);
            }
        }
    }
}

pub struct Ancestors<'a> {
    tree: &'a NodeTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.tree.nodes[cur.0].parent;
        Some(cur)
    }
}

// ============================================================================
// Construction
// ============================================================================

struct BuildNode {
    name: String,
    full_name: String,
    kind: NodeKind,
    children: Vec<usize>,
    explicit: bool,
    /// Swallowed by its parent during chain compression.
    merged: bool,
}

struct BuildCtx {
    nodes: Vec<BuildNode>,
    by_name: HashMap<String, usize>,
}

impl BuildCtx {
    fn new() -> Self {
        Self {
            nodes: vec![BuildNode {
                name: String::new(),
                full_name: String::new(),
                kind: NodeKind::Package,
                children: Vec::new(),
                explicit: false,
                merged: false,
            }],
            by_name: HashMap::new(),
        }
    }

    fn add_class(&mut self, full_name: &str) -> Result<(), GraphError> {
        let invalid = || GraphError::InvalidName(full_name.to_string());
        let segments: Vec<&str> = full_name.split(PACKAGE_SEPARATOR).collect();
        let (class_segment, packages) = segments.split_last().ok_or_else(invalid)?;
        if packages.iter().any(|s| s.is_empty() || s.contains(INNER_CLASS_SEPARATOR)) {
            return Err(invalid());
        }
        let class_parts: Vec<&str> = class_segment.split(INNER_CLASS_SEPARATOR).collect();
        if class_parts.iter().any(|s| s.is_empty()) {
            return Err(invalid());
        }

        let mut parent = 0;
        let mut prefix = String::new();
        for pkg in packages {
            if !prefix.is_empty() {
                prefix.push(PACKAGE_SEPARATOR);
            }
            prefix.push_str(pkg);
            parent = self.child(parent, pkg, &prefix, NodeKind::Package)?;
        }

        let last = class_parts.len() - 1;
        for (i, part) in class_parts.iter().enumerate() {
            if i == 0 {
                if !prefix.is_empty() {
                    prefix.push(PACKAGE_SEPARATOR);
                }
            } else {
                prefix.push(INNER_CLASS_SEPARATOR);
            }
            prefix.push_str(part);
            let kind = if i == 0 { NodeKind::Class } else { NodeKind::InnerClass };
            parent = self.child(parent, part, &prefix, kind)?;
            if i == last {
                let node = &mut self.nodes[parent];
                if node.explicit {
                    return Err(GraphError::DuplicateNode(full_name.to_string()));
                }
                node.explicit = true;
            }
        }
        Ok(())
    }

    /// Find or create the child `full_name` of `parent`.
    fn child(&mut self, parent: usize, name: &str, full_name: &str, kind: NodeKind) -> Result<usize, GraphError> {
        if let Some(&idx) = self.by_name.get(full_name) {
            let existing_is_package = self.nodes[idx].kind == NodeKind::Package;
            if existing_is_package != (kind == NodeKind::Package) {
                return Err(GraphError::ConflictingKind(full_name.to_string()));
            }
            return Ok(idx);
        }
        let idx = self.nodes.len();
        self.nodes.push(BuildNode {
            name: name.to_string(),
            full_name: full_name.to_string(),
            kind,
            children: Vec::new(),
            explicit: false,
            merged: false,
        });
        self.nodes[parent].children.push(idx);
        self.by_name.insert(full_name.to_string(), idx);
        Ok(idx)
    }

    /// Merge package chains: a non-root package whose only child is a package
    /// absorbs that child.
    fn compress(&mut self, idx: usize) {
        if idx != 0 && self.nodes[idx].kind == NodeKind::Package {
            while let [only] = self.nodes[idx].children[..] {
                if self.nodes[only].kind != NodeKind::Package {
                    break;
                }
                let child_name = std::mem::take(&mut self.nodes[only].name);
                let child_full = self.nodes[only].full_name.clone();
                let grandchildren = std::mem::take(&mut self.nodes[only].children);
                self.nodes[only].merged = true;
                let node = &mut self.nodes[idx];
                node.name = format!("{}{}{}", node.name, PACKAGE_SEPARATOR, child_name);
                node.full_name = child_full;
                node.children = grandchildren;
            }
        }
        let children = self.nodes[idx].children.clone();
        for c in children {
            self.compress(c);
        }
    }

    fn finish(self) -> NodeTree {
        let mut nodes: Vec<Node> = Vec::new();
        let mut by_name = HashMap::new();
        // (build index, parent id, depth)
        let mut stack: Vec<(usize, Option<NodeId>, usize)> = vec![(0, None, 0)];
        while let Some((idx, parent, depth)) = stack.pop() {
            let b = &self.nodes[idx];
            debug_assert!(!b.merged);
            let id = NodeId(nodes.len());
            nodes.push(Node {
                id,
                name: b.name.clone(),
                full_name: b.full_name.clone(),
                kind: b.kind,
                parent,
                children: Vec::new(),
                circle: Circle::default(),
                relative: Vector::ZERO,
                folded: false,
                hidden: false,
                focus: 0,
                depth,
                explicit: b.explicit,
                order: id.0,
            });
            if let Some(p) = parent {
                nodes[p.0].children.push(id);
            }
            if idx != 0 {
                by_name.insert(b.full_name.clone(), id);
            }
            for &c in b.children.iter().rev() {
                stack.push((c, Some(id), depth + 1));
            }
        }
        by_name.insert(String::new(), NodeId(0));
        NodeTree {
            nodes,
            by_name,
            focus_counter: 0,
            overlapped: BTreeSet::new(),
        }
    }
}
