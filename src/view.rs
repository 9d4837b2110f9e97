//! Collaborator interfaces: views that draw nodes and dependencies, and
//! listeners that get told what happened.
//!
//! Animated view commands return a [`Transition`], a future that resolves
//! once the view has arrived (or fails if the view gave up).

use futures::future::{self, LocalBoxFuture};
use serde::Serialize;

use crate::dependency::{DependencyKey, ElementaryDependency, GroupedDependency};
use crate::error::ViewError;
use crate::geometry::{Circle, Vector};
use crate::tree::{NodeStyle, RimStyle};

pub type Transition = LocalBoxFuture<'static, Result<(), ViewError>>;

/// A transition that is already over.
pub fn settled() -> Transition {
    Box::pin(future::ready(Ok(())))
}

pub trait NodeView {
    fn show(&mut self);
    fn hide(&mut self);
    fn jump_to_position(&mut self, circle: &Circle);
    fn move_to_position(&mut self, circle: &Circle) -> Transition;
    fn change_radius(&mut self, r: f64, label_offset: f64) -> Transition;
    fn set_radius(&mut self, r: f64, label_offset: f64);
    fn update_node_type(&mut self, style: &NodeStyle);
}

pub trait DependencyView {
    fn show(&mut self);
    fn hide(&mut self);
    fn jump_to_position_and_show_if_visible(&mut self, dep: &GroupedDependency);
    fn move_to_position_and_show_if_visible(&mut self, dep: &GroupedDependency) -> Transition;
    fn refresh(&mut self, dep: &GroupedDependency);
    fn on_container_end_node_changed(&mut self, dep: &GroupedDependency);
}

/// One elementary dependency as listed by a detailed view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyDetail {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: String,
}

impl From<&ElementaryDependency> for DependencyDetail {
    fn from(dep: &ElementaryDependency) -> Self {
        Self {
            kind: dep.kind().map(str::to_string),
            description: dep.description.clone(),
        }
    }
}

/// Lists the elementary dependencies behind one grouped edge while the user
/// hovers it.
pub trait DetailedDependencyView {
    /// `details` fetches the current list; it is only worth calling when the
    /// view is about to show it.
    fn fade_in(&mut self, details: &dyn Fn() -> Vec<DependencyDetail>);
    fn fade_out(&mut self);
}

pub trait ViewFactory {
    fn node_view(&mut self, name: &str, full_name: &str) -> Box<dyn NodeView>;
    fn dependency_view(&mut self, dep: &GroupedDependency) -> Box<dyn DependencyView>;

    #[allow(unused_variables)]
    fn detailed_view(&mut self, key: &DependencyKey) -> Box<dyn DetailedDependencyView> {
        Box::new(HeadlessDetailedView::default())
    }
}

/// Notifications about graph changes. Nodes are identified by full name.
#[allow(unused_variables)]
pub trait GraphListener {
    fn on_drag(&mut self, full_name: &str) {}
    fn on_fold(&mut self, full_name: &str) {}
    fn on_initial_fold(&mut self, full_name: &str) {}
    fn on_layout_changed(&mut self) {}
    fn on_node_rim_changed(&mut self, full_name: &str, rim: RimStyle) {}
    fn on_nodes_focused(&mut self) {}
    fn on_nodes_overlapping(&mut self, full_name: &str, position: Vector) {}
    fn on_size_expanded(&mut self, half_width: f64, half_height: f64) {}
}

// ============================================================================
// Headless views
// ============================================================================

/// Node view without a screen: remembers where it was told to be and
/// finishes every transition immediately.
#[derive(Debug, Clone, Default)]
pub struct HeadlessNodeView {
    pub circle: Circle,
    pub visible: bool,
    pub label_offset: f64,
    pub class_names: String,
}

impl NodeView for HeadlessNodeView {
    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn jump_to_position(&mut self, circle: &Circle) {
        self.circle.x = circle.x;
        self.circle.y = circle.y;
    }

    fn move_to_position(&mut self, circle: &Circle) -> Transition {
        self.jump_to_position(circle);
        settled()
    }

    fn change_radius(&mut self, r: f64, label_offset: f64) -> Transition {
        self.set_radius(r, label_offset);
        settled()
    }

    fn set_radius(&mut self, r: f64, label_offset: f64) {
        self.circle.r = r;
        self.label_offset = label_offset;
    }

    fn update_node_type(&mut self, style: &NodeStyle) {
        self.class_names = style.class_names();
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessDependencyView {
    pub start: Vector,
    pub end: Vector,
    pub visible: bool,
}

impl DependencyView for HeadlessDependencyView {
    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn jump_to_position_and_show_if_visible(&mut self, dep: &GroupedDependency) {
        self.start = dep.start;
        self.end = dep.end;
        self.visible = dep.is_visible();
    }

    fn move_to_position_and_show_if_visible(&mut self, dep: &GroupedDependency) -> Transition {
        self.jump_to_position_and_show_if_visible(dep);
        settled()
    }

    fn refresh(&mut self, dep: &GroupedDependency) {
        self.visible = dep.is_visible();
    }

    fn on_container_end_node_changed(&mut self, _dep: &GroupedDependency) {}
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessDetailedView {
    pub details: Vec<DependencyDetail>,
    pub visible: bool,
}

impl DetailedDependencyView for HeadlessDetailedView {
    fn fade_in(&mut self, details: &dyn Fn() -> Vec<DependencyDetail>) {
        self.details = details();
        self.visible = true;
    }

    fn fade_out(&mut self) {
        self.visible = false;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessViews;

impl ViewFactory for HeadlessViews {
    fn node_view(&mut self, _name: &str, _full_name: &str) -> Box<dyn NodeView> {
        Box::new(HeadlessNodeView::default())
    }

    fn dependency_view(&mut self, _dep: &GroupedDependency) -> Box<dyn DependencyView> {
        Box::new(HeadlessDependencyView::default())
    }
}
