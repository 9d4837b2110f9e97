// Dragging a node with constraint repair.
//
// Steps:
// 1. Remember siblings that overlap the grabbed node and lie in front of it
// 2. Focus the node (and its ancestors)
// 3. Translate the whole subtree rigidly by the delta
// 4. Push the remembered siblings out of the node's way along the center line
// 5. Walk upward: every ancestor that no longer encloses the moved circle
//    grows to the smallest circle enclosing its old circle and the moved one.
//    The root keeps its center and only grows its radius.
// 6. Recompute which nodes the dragged node now overlaps
//
// Dropping a node onto another never reparents it. An overlap created by a
// drag stays until the node lying underneath is grabbed.

use std::collections::BTreeSet;

use log::{debug, trace};

use crate::geometry::{Circle, Vector};
use crate::layout::LayoutConfig;

use super::{NodeId, NodeTree, RimStyle, TreeEvent};

/// Slack allowed before an ancestor counts as no longer enclosing a child.
const CONTAINMENT_EPS: f64 = 1e-9;

impl NodeTree {
    pub fn drag(&mut self, id: NodeId, delta: Vector, cfg: &LayoutConfig) -> Vec<TreeEvent> {
        let mut events = Vec::new();
        if delta.is_zero() || id == self.root() || !self.is_visible(id) {
            return events;
        }
        debug!("drag {} by ({}, {})", self.full_name(id), delta.x, delta.y);

        let covering: Vec<NodeId> = self
            .siblings(id)
            .into_iter()
            .filter(|&s| {
                self.is_visible(s)
                    && self.overlaps_with(id, s, cfg.overlap_epsilon)
                    && self.lies_in_front_of(s, id)
            })
            .collect();

        self.focus(id);
        events.push(TreeEvent::NodesFocused);

        self.translate_subtree(id, delta);
        events.push(TreeEvent::Dragged(id));
        events.push(TreeEvent::RimChanged(id, RimStyle::Default));

        for sibling in covering {
            self.push_out(sibling, id, cfg);
            self.repair_containment(sibling, cfg, &mut events);
        }
        self.repair_containment(id, cfg, &mut events);

        self.track_overlaps(id, cfg, &mut events);
        events
    }

    /// Move `mover` along the line between the two centers until it keeps
    /// `circle_padding` distance to `anchor`.
    fn push_out(&mut self, mover: NodeId, anchor: NodeId, cfg: &LayoutConfig) {
        let a = self.nodes[anchor.0].circle;
        let m = self.nodes[mover.0].circle;
        let target = a.inflated(m.r + cfg.circle_padding).project_onto_rim(m.center());
        trace!("push {} out of {}", self.full_name(mover), self.full_name(anchor));
        self.translate_subtree(mover, target - m.center());
    }

    /// Grow ancestors of `id` until each one encloses its child again.
    fn repair_containment(&mut self, id: NodeId, cfg: &LayoutConfig, events: &mut Vec<TreeEvent>) {
        let mut child = id;
        while let Some(parent) = self.nodes[child.0].parent {
            let moved = self.nodes[child.0].circle;
            let outer = self.nodes[parent.0].circle;
            if outer.contains(&moved, CONTAINMENT_EPS) {
                break;
            }
            let padded = moved.inflated(cfg.circle_padding);

            if parent == self.root() {
                let r = outer.center().distance(padded.center()) + padded.r;
                self.nodes[parent.0].circle = Circle::at(outer.center(), r);
                debug!("root expanded to radius {}", r);
                events.push(TreeEvent::SizeExpanded { half_width: r, half_height: r });
                break;
            }

            let grown = Circle::enclose_pair(&outer, &padded);
            trace!("{} grows to radius {}", self.full_name(parent), grown.r);
            self.set_circle(parent, grown);
            events.push(TreeEvent::RimChanged(parent, RimStyle::Default));
            child = parent;
        }
    }

    /// Emit overlap events for nodes the dragged node started or stopped
    /// overlapping. Its own ancestors and descendants do not count.
    fn track_overlaps(&mut self, id: NodeId, cfg: &LayoutConfig, events: &mut Vec<TreeEvent>) {
        let now: BTreeSet<NodeId> = self
            .visible_nodes()
            .into_iter()
            .filter(|&n| {
                n != id
                    && !self.is_ancestor_of(n, id)
                    && !self.is_ancestor_of(id, n)
                    && self.overlaps_with(id, n, cfg.overlap_epsilon)
            })
            .collect();
        let position = self.nodes[id.0].circle.center();

        for &n in now.difference(&self.overlapped) {
            events.push(TreeEvent::NodesOverlapping { overlapped: n, position });
            events.push(TreeEvent::RimChanged(n, RimStyle::Overlapped));
        }
        for &n in self.overlapped.difference(&now) {
            if n != id {
                events.push(TreeEvent::RimChanged(n, RimStyle::Default));
            }
        }
        self.overlapped = now;
    }
}
