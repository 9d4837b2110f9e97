// Grouped dependency: the edge drawn between two visible nodes.
//
// Its start and end points are also stored relative to the container end
// node (the end lying in the background), so the edge can be moved along with
// that node without recomputing its geometry.

use serde::Serialize;

use crate::geometry::{Circle, Vector};
use crate::tree::{NodeId, NodeTree};

use super::{DependencyKey, DependencyStyle};

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct EdgeEnds {
    pub start: Vector,
    pub end: Vector,
}

/// Where an edge between two circles starts and ends.
pub trait EdgeGeometry {
    fn start_and_end(&self, must_share_nodes: bool, origin: &Circle, target: &Circle) -> EdgeEnds;
}

/// Points on both rims along the line between the centers. Edges that share
/// their nodes with another edge are rotated off that line by `shared_angle`,
/// in opposite directions at both ends, so `a -> b` and `b -> a` stay apart.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RimToRim {
    pub shared_angle: f64,
}

impl Default for RimToRim {
    fn default() -> Self {
        Self { shared_angle: std::f64::consts::PI / 12.0 }
    }
}

impl EdgeGeometry for RimToRim {
    fn start_and_end(&self, must_share_nodes: bool, origin: &Circle, target: &Circle) -> EdgeEnds {
        let dir = Vector::between(origin.center(), target.center()).normalized();
        let angle = if must_share_nodes { self.shared_angle } else { 0.0 };
        EdgeEnds {
            start: origin.project_onto_rim(origin.center() + dir.rotated(angle)),
            end: target.project_onto_rim(target.center() + (-dir).rotated(-angle)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupedDependency {
    pub key: DependencyKey,
    pub origin: NodeId,
    pub target: NodeId,
    pub style: DependencyStyle,
    pub violation: bool,
    pub start: Vector,
    pub end: Vector,
    pub relative_start: Vector,
    pub relative_end: Vector,
    /// Drawn with a rotated geometry because the ends overlap or the reverse
    /// edge is visible too.
    pub must_share_nodes: bool,
    container_end_node: NodeId,
    container_end_node_changed: bool,
    visible: bool,
}

impl GroupedDependency {
    pub fn new(tree: &NodeTree, origin: NodeId, target: NodeId) -> Self {
        Self {
            key: DependencyKey::new(tree, origin, target),
            origin,
            target,
            style: DependencyStyle::PLAIN,
            violation: false,
            start: Vector::ZERO,
            end: Vector::ZERO,
            relative_start: Vector::ZERO,
            relative_end: Vector::ZERO,
            must_share_nodes: false,
            container_end_node: tree.end_node_in_background(origin, target),
            container_end_node_changed: false,
            visible: true,
        }
    }

    /// Update style and violation in place.
    pub fn with_style_and_violation(&mut self, style: DependencyStyle, violation: bool) -> &mut Self {
        self.style = style;
        self.violation = violation;
        self
    }

    pub fn class_names(&self) -> String {
        self.style.class_names()
    }

    pub fn container_end_node(&self) -> NodeId {
        self.container_end_node
    }

    pub fn container_end_node_changed(&self) -> bool {
        self.container_end_node_changed
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Packages have no member level descriptions to show.
    pub fn has_detailed_description(&self, tree: &NodeTree) -> bool {
        !(tree.is_package(self.origin) || tree.is_package(self.target))
    }

    pub fn recalculate_points(&mut self, tree: &NodeTree, geometry: &dyn EdgeGeometry) {
        let ends = geometry.start_and_end(
            self.must_share_nodes,
            &tree.node(self.origin).circle,
            &tree.node(self.target).circle,
        );
        self.start = ends.start;
        self.end = ends.end;
        self.recalculate_relative_points(tree);
    }

    fn recalculate_relative_points(&mut self, tree: &NodeTree) {
        let anchor = tree.node(self.container_end_node).circle.center();
        self.relative_start = Vector::between(anchor, self.start);
        self.relative_end = Vector::between(anchor, self.end);
    }

    /// Re-pick the end in the background. Returns true if it changed; the
    /// change stays marked until `on_container_end_node_applied`.
    pub fn update_container_end_node(&mut self, tree: &NodeTree) -> bool {
        let background = tree.end_node_in_background(self.origin, self.target);
        if background == self.container_end_node {
            return false;
        }
        self.container_end_node = background;
        self.container_end_node_changed = true;
        self.recalculate_relative_points(tree);
        true
    }

    pub fn on_container_end_node_applied(&mut self) {
        self.container_end_node_changed = false;
    }

    /// Hide the edge while its ends overlap. Returns the new visibility.
    pub fn refresh(&mut self, tree: &NodeTree, eps: f64) -> bool {
        if tree.overlaps_with(self.origin, self.target, eps) {
            self.hide();
        } else {
            self.show();
        }
        self.visible
    }
}
