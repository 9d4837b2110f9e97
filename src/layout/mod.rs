// Nested circle layout.
//
// Goals:
// - Deterministic: same tree, same fold state, same circles
// - Children-first: size every visible child, then pack the siblings
// - Every visible child lies inside its parent with padding to spare
// - Room for the container's label above its children
//
// Submodules:
// - packing: front-chain packing of one sibling set
// - enclose: minimum enclosing circle of a set of circles
//
// Output:
// - Absolute circles and relative centers written into the NodeTree.
//   Descendants of folded or filtered nodes are not packed; they keep their
//   relative offsets and follow their ancestor.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::{Circle, Vector};
use crate::tree::{NodeId, NodeTree, TreeEvent};

pub mod enclose;
pub mod packing;

use packing::pack_siblings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Gap between sibling circles and between a child and its parent's rim.
    pub circle_padding: f64,
    /// Approximate width of one label character.
    pub char_width: f64,
    /// Label font size; containers reserve this much room for their label.
    pub font_size: f64,
    /// Smallest radius a leaf (or folded node) is drawn with.
    pub min_leaf_radius: f64,
    /// Circles intersecting by less than this do not count as overlapping.
    pub overlap_epsilon: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            circle_padding: 5.0,
            char_width: 7.0,
            font_size: 12.0,
            min_leaf_radius: 20.0,
            overlap_epsilon: 1e-3,
        }
    }
}

pub fn label_width(name: &str, cfg: &LayoutConfig) -> f64 {
    name.chars().count() as f64 * cfg.char_width
}

/// Radius of a node drawn without children.
pub fn leaf_radius(name: &str, cfg: &LayoutConfig) -> f64 {
    cfg.min_leaf_radius.max(label_width(name, cfg) / 2.0 + cfg.circle_padding)
}

/// Vertical offset of a node's label from its center: centered for leaves,
/// near the top rim for open containers.
pub fn label_offset(tree: &NodeTree, id: NodeId, cfg: &LayoutConfig) -> f64 {
    if tree.visible_children(id).is_empty() {
        0.0
    } else {
        -tree.node(id).circle.r + cfg.font_size
    }
}

/// Lay out every visible node of the tree, children before parents.
/// The root ends up centered on the origin.
pub fn layout_tree(tree: &mut NodeTree, cfg: &LayoutConfig) -> Vec<TreeEvent> {
    let mut post = tree.visible_nodes();
    post.reverse();

    for &id in &post {
        let children = tree.visible_children(id);
        let name_width = label_width(&tree.node(id).name, cfg);
        if children.is_empty() {
            let r = leaf_radius(&tree.node(id).name, cfg);
            tree.node_mut(id).circle.r = r;
            continue;
        }

        let mut circles: Vec<Circle> = children
            .iter()
            .map(|&c| Circle::new(0.0, 0.0, tree.node(c).circle.r + cfg.circle_padding / 2.0))
            .collect();
        let enclosing = pack_siblings(&mut circles);

        // The unnamed root needs no label room.
        let margin = if tree.node(id).name.is_empty() { 0.0 } else { cfg.font_size };
        let r = (enclosing + cfg.circle_padding / 2.0 + margin).max(name_width / 2.0 + cfg.circle_padding);

        for (&c, packed) in children.iter().zip(&circles) {
            tree.node_mut(c).relative = Vector::new(packed.x, packed.y + margin / 2.0);
        }
        tree.node_mut(id).circle.r = r;
    }

    let root = tree.root();
    let r = tree.node(root).circle.r;
    let node = tree.node_mut(root);
    node.relative = Vector::ZERO;
    node.circle = Circle::new(0.0, 0.0, r);
    tree.sync_absolute(root);

    debug!("layout: {} visible nodes, root radius {}", post.len(), r);
    vec![TreeEvent::LayoutChanged]
}
