//
// Graph session: one interactive visualization.
//
// Owns the node tree, the elementary dependencies, the grouped dependency
// cache, the views and the listeners, and runs every user operation:
// - build: tree from class names, initial fold, first layout
// - drag / focus: synchronous, views jump
// - fold / unfold / relayout / filter_nodes: async, node views animate,
//   dependency views follow once the nodes have arrived
// - dependency filters and violations: regroup, views jump
// - mouse over / out of an edge: its detailed view fades in or out
//
// The tree and the cache are always updated completely before anything is
// awaited, so no view or listener ever observes a half-updated tree.

use std::collections::{BTreeMap, HashMap, HashSet};

use futures::future::join_all;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::GraphConfig;
use crate::dependency::{DependencyCache, DependencyKey, EdgeGeometry, ElementaryDependency, GroupedDependency, RimToRim};
use crate::error::{GraphError, ViewError};
use crate::geometry::Vector;
use crate::layout::{label_offset, layout_tree};
use crate::transition::Transitions;
use crate::tree::{Node, NodeId, NodeTree, TreeEvent};
use crate::view::{
    DependencyDetail, DependencyView, DetailedDependencyView, GraphListener, HeadlessViews, NodeView, Transition,
    ViewFactory,
};

// ============================================================================
// Input
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyInput {
    pub origin: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

/// What a graph is built from: fully qualified class names and the
/// dependencies between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphInput {
    pub classes: Vec<String>,
    pub dependencies: Vec<DependencyInput>,
}

impl GraphInput {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Builder
// ============================================================================

pub struct GraphBuilder {
    config: GraphConfig,
    views: Box<dyn ViewFactory>,
    geometry: Box<dyn EdgeGeometry>,
    listeners: Vec<Box<dyn GraphListener>>,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            views: Box::new(HeadlessViews),
            geometry: Box::new(RimToRim::default()),
            listeners: Vec::new(),
        }
    }

    pub fn views(mut self, views: impl ViewFactory + 'static) -> Self {
        self.views = Box::new(views);
        self
    }

    pub fn geometry(mut self, geometry: impl EdgeGeometry + 'static) -> Self {
        self.geometry = Box::new(geometry);
        self
    }

    /// Listeners registered here also hear about the initial fold and layout.
    pub fn listener(mut self, listener: impl GraphListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn build(mut self, input: &GraphInput) -> Result<Graph, GraphError> {
        let tree = NodeTree::from_class_names(&input.classes)?;

        let mut dependencies = Vec::with_capacity(input.dependencies.len());
        for dep in &input.dependencies {
            let origin = tree.require(&dep.origin)?;
            let target = tree.require(&dep.target)?;
            dependencies.push(ElementaryDependency::new(origin, target, dep.kind.clone(), dep.description.clone()));
        }

        let node_views: Vec<Box<dyn NodeView>> = tree
            .nodes()
            .map(|node| {
                let mut view = self.views.node_view(&node.name, &node.full_name);
                view.update_node_type(&tree.style(node.id));
                view
            })
            .collect();

        let mut graph = Graph {
            config: self.config,
            tree,
            dependencies,
            cache: DependencyCache::new(),
            grouped: Vec::new(),
            node_views,
            dependency_views: HashMap::new(),
            detailed_views: HashMap::new(),
            views: self.views,
            geometry: self.geometry,
            listeners: self.listeners,
            transitions: Transitions::new(),
        };
        graph.initial_fold();
        graph.layout()?;
        debug!(
            "graph built: {} nodes, {} dependencies",
            graph.tree.len(),
            graph.dependencies.len()
        );
        Ok(graph)
    }
}

// ============================================================================
// Animation
// ============================================================================

struct NodeMove {
    id: NodeId,
    generation: u64,
    transition: Transition,
}

/// Node transitions issued by a relayout, not yet awaited.
pub struct Animation {
    moves: Vec<NodeMove>,
}

/// Outcome of every transition of an [`Animation`].
pub struct Settled {
    results: Vec<(NodeId, u64, Result<(), ViewError>)>,
}

impl Animation {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub async fn run(self) -> Settled {
        let (keys, transitions): (Vec<(NodeId, u64)>, Vec<Transition>) = self
            .moves
            .into_iter()
            .map(|m| ((m.id, m.generation), m.transition))
            .unzip();
        let outcomes = join_all(transitions).await;
        Settled {
            results: keys
                .into_iter()
                .zip(outcomes)
                .map(|((id, generation), result)| (id, generation, result))
                .collect(),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct Graph {
    config: GraphConfig,
    tree: NodeTree,
    dependencies: Vec<ElementaryDependency>,
    cache: DependencyCache,
    /// Keys of the grouped dependencies derived by the last regrouping.
    grouped: Vec<DependencyKey>,
    /// Indexed by `NodeId`.
    node_views: Vec<Box<dyn NodeView>>,
    dependency_views: HashMap<DependencyKey, Box<dyn DependencyView>>,
    /// Created together with the dependency view, one per key.
    detailed_views: HashMap<DependencyKey, Box<dyn DetailedDependencyView>>,
    views: Box<dyn ViewFactory>,
    geometry: Box<dyn EdgeGeometry>,
    listeners: Vec<Box<dyn GraphListener>>,
    transitions: Transitions,
}

impl Graph {
    pub fn builder(config: GraphConfig) -> GraphBuilder {
        GraphBuilder::new(config)
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn transitions(&self) -> &Transitions {
        &self.transitions
    }

    pub fn node_id(&self, full_name: &str) -> Result<NodeId, GraphError> {
        self.tree.require(full_name)
    }

    pub fn add_listener(&mut self, listener: impl GraphListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn elementary_dependencies(&self) -> &[ElementaryDependency] {
        &self.dependencies
    }

    /// Grouped dependencies between the currently visible nodes.
    pub fn grouped_dependencies(&self) -> impl Iterator<Item = &GroupedDependency> {
        self.grouped.iter().filter_map(|key| self.cache.get(key))
    }

    pub fn grouped_dependency(&self, origin: &str, target: &str) -> Option<&GroupedDependency> {
        self.grouped_key(origin, target).and_then(|key| self.cache.get(&key))
    }

    fn grouped_key(&self, origin: &str, target: &str) -> Option<DependencyKey> {
        let key = DependencyKey {
            origin: origin.to_string(),
            target: target.to_string(),
        };
        self.grouped.contains(&key).then_some(key)
    }

    pub fn overlaps_with(&self, a: NodeId, b: NodeId) -> Result<bool, GraphError> {
        let (a, b) = (self.tree.check(a)?, self.tree.check(b)?);
        Ok(self.tree.overlaps_with(a, b, self.config.layout.overlap_epsilon))
    }

    /// The elementary dependencies drawn as the edge between two visible
    /// nodes, with their descriptions.
    pub fn detailed_dependencies(&self, origin: &str, target: &str) -> Result<Vec<&ElementaryDependency>, GraphError> {
        let origin = self.tree.require(origin)?;
        let target = self.tree.require(target)?;
        Ok(elementary_behind(&self.tree, &self.dependencies, origin, target).collect())
    }

    // ------------------------------------------------------------------
    // Detailed views
    // ------------------------------------------------------------------

    /// The pointer entered the edge between two visible nodes: fade in its
    /// detailed view. Returns false if there is no such edge or nothing to
    /// list (an end is a package).
    pub fn on_mouse_over(&mut self, origin: &str, target: &str) -> bool {
        let Some(key) = self.grouped_key(origin, target) else { return false };
        let Some(dep) = self.cache.get(&key) else { return false };
        if !dep.has_detailed_description(&self.tree) {
            return false;
        }
        let (origin, target) = (dep.origin, dep.target);
        let Some(view) = self.detailed_views.get_mut(&key) else { return false };
        let (tree, dependencies) = (&self.tree, &self.dependencies);
        view.fade_in(&|| {
            elementary_behind(tree, dependencies, origin, target)
                .map(DependencyDetail::from)
                .collect()
        });
        true
    }

    pub fn on_mouse_out(&mut self, origin: &str, target: &str) -> bool {
        let Some(key) = self.grouped_key(origin, target) else { return false };
        let Some(view) = self.detailed_views.get_mut(&key) else { return false };
        view.fade_out();
        true
    }

    /// Visit the detailed view of every edge currently drawn, in grouping
    /// order.
    pub fn for_each_detailed_view<F>(&mut self, mut f: F)
    where
        F: FnMut(&DependencyKey, &mut dyn DetailedDependencyView),
    {
        for key in &self.grouped {
            if let Some(view) = self.detailed_views.get_mut(key) {
                f(key, view.as_mut());
            }
        }
    }

    // ------------------------------------------------------------------
    // Layout, drag, focus
    // ------------------------------------------------------------------

    fn initial_fold(&mut self) {
        let config = &self.config;
        let events = self.tree.initial_fold(|node| config.folds_initially(node));
        for event in &events {
            if let TreeEvent::InitialFolded(id) = event {
                self.node_views[id.0].update_node_type(&self.tree.style(*id));
            }
        }
        self.dispatch(&events);
    }

    /// Lay out from scratch and let every view jump to its place.
    pub fn layout(&mut self) -> Result<(), GraphError> {
        let events = layout_tree(&mut self.tree, &self.config.layout);
        self.jump_node_views();
        self.regroup_dependencies()?;
        self.jump_dependency_views();
        self.dispatch(&events);
        Ok(())
    }

    pub fn drag(&mut self, id: NodeId, delta: Vector) -> Result<Vec<TreeEvent>, GraphError> {
        let id = self.tree.check(id)?;
        let events = self.tree.drag(id, delta, &self.config.layout);
        if events.is_empty() {
            return Ok(events);
        }
        self.jump_node_views();
        if events.contains(&TreeEvent::NodesFocused) {
            self.on_nodes_focused();
        }
        self.jump_dependency_views();
        self.dispatch(&events);
        Ok(events)
    }

    /// Bring a node (and its ancestors) to the front.
    pub fn focus(&mut self, id: NodeId) -> Result<(), GraphError> {
        let id = self.tree.check(id)?;
        self.tree.focus(id);
        self.on_nodes_focused();
        self.dispatch(&[TreeEvent::NodesFocused]);
        Ok(())
    }

    fn on_nodes_focused(&mut self) {
        for key in &self.grouped {
            let Some(dep) = self.cache.get_mut(key) else { continue };
            if !dep.update_container_end_node(&self.tree) {
                continue;
            }
            dep.recalculate_points(&self.tree, self.geometry.as_ref());
            if let Some(view) = self.dependency_views.get_mut(key) {
                view.on_container_end_node_changed(dep);
                view.jump_to_position_and_show_if_visible(dep);
            }
            dep.on_container_end_node_applied();
        }
    }

    fn jump_node_views(&mut self) {
        let cfg = &self.config.layout;
        for node in self.tree.nodes() {
            let view = &mut self.node_views[node.id.0];
            if self.tree.is_visible(node.id) {
                view.show();
                view.jump_to_position(&node.circle);
                view.set_radius(node.circle.r, label_offset(&self.tree, node.id, cfg));
            } else {
                view.hide();
            }
        }
    }

    // ------------------------------------------------------------------
    // Fold and relayout
    // ------------------------------------------------------------------

    /// Fold a container and animate into the new layout. Returns false if
    /// there was nothing to fold.
    pub async fn fold(&mut self, id: NodeId) -> Result<bool, GraphError> {
        let id = self.tree.check(id)?;
        let Some(event) = self.tree.fold(id) else { return Ok(false) };
        self.on_fold_toggled(id, event);
        self.relayout().await?;
        Ok(true)
    }

    pub async fn unfold(&mut self, id: NodeId) -> Result<bool, GraphError> {
        let id = self.tree.check(id)?;
        let Some(event) = self.tree.unfold(id) else { return Ok(false) };
        self.on_fold_toggled(id, event);
        self.relayout().await?;
        Ok(true)
    }

    fn on_fold_toggled(&mut self, id: NodeId, event: TreeEvent) {
        self.node_views[id.0].update_node_type(&self.tree.style(id));
        self.dispatch(&[event]);
    }

    /// Show only classes `keep` accepts (and the packages containing them),
    /// then animate into the new layout.
    pub async fn filter_nodes<F>(&mut self, keep: F) -> Result<(), GraphError>
    where
        F: Fn(&Node) -> bool,
    {
        let mut order: Vec<NodeId> = self.tree.descendants(self.tree.root());
        order.reverse();
        let mut shown: HashSet<NodeId> = HashSet::new();
        for id in order {
            let node = self.tree.node(id);
            let show = (!node.is_package() && keep(node)) || node.children.iter().any(|c| shown.contains(c));
            if show {
                shown.insert(id);
            }
            self.tree.set_hidden(id, !show);
        }
        self.relayout().await
    }

    /// Lay out again and animate every visible node into place; dependency
    /// views follow once all nodes have arrived.
    pub async fn relayout(&mut self) -> Result<(), GraphError> {
        let animation = self.begin_relayout()?;
        let settled = animation.run().await;
        self.settle(settled)?;

        let moves = self.begin_dependency_moves();
        let results = join_all(moves).await;
        self.finish_dependency_moves(results)
    }

    /// Synchronous half of a relayout: the tree is laid out and regrouped,
    /// node views are handed their targets. A node that is still animating
    /// is retargeted.
    pub fn begin_relayout(&mut self) -> Result<Animation, GraphError> {
        let events = layout_tree(&mut self.tree, &self.config.layout);
        let cfg = &self.config.layout;

        let mut moves = Vec::new();
        for node in self.tree.nodes() {
            let view = &mut self.node_views[node.id.0];
            if !self.tree.is_visible(node.id) {
                view.hide();
                continue;
            }
            let circle = node.circle;
            let generation = self.transitions.begin(node.id, circle);
            view.show();
            let position = view.move_to_position(&circle);
            let radius = view.change_radius(circle.r, label_offset(&self.tree, node.id, cfg));
            moves.push(NodeMove {
                id: node.id,
                generation,
                transition: Box::pin(async move {
                    position.await?;
                    radius.await
                }),
            });
        }

        self.regroup_dependencies()?;
        self.dispatch(&events);
        Ok(Animation { moves })
    }

    /// Record finished node transitions. If any view failed, every node is
    /// returned to idle, views jump to the (already consistent) layout and
    /// the first failure is returned.
    pub fn settle(&mut self, settled: Settled) -> Result<(), GraphError> {
        let mut failure = None;
        for (id, generation, result) in settled.results {
            match result {
                Ok(()) => {
                    self.transitions.settle(id, generation);
                }
                Err(err) => {
                    warn!("transition of {} failed: {}", self.tree.full_name(id), err);
                    failure.get_or_insert(err);
                }
            }
        }
        if let Some(err) = failure {
            self.transitions.reset();
            self.jump_node_views();
            self.jump_dependency_views();
            return Err(err.into());
        }
        Ok(())
    }

    fn begin_dependency_moves(&mut self) -> Vec<Transition> {
        self.update_must_share_nodes();
        let eps = self.config.layout.overlap_epsilon;
        let mut moves = Vec::new();
        for key in &self.grouped {
            let Some(dep) = self.cache.get_mut(key) else { continue };
            dep.recalculate_points(&self.tree, self.geometry.as_ref());
            dep.refresh(&self.tree, eps);
            if let Some(view) = self.dependency_views.get_mut(key) {
                moves.push(view.move_to_position_and_show_if_visible(dep));
            }
        }
        moves
    }

    fn finish_dependency_moves(&mut self, results: Vec<Result<(), ViewError>>) -> Result<(), GraphError> {
        for key in &self.grouped {
            if let (Some(dep), Some(view)) = (self.cache.get(key), self.dependency_views.get_mut(key)) {
                view.refresh(dep);
            }
        }
        for result in results {
            result?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dependencies
    // ------------------------------------------------------------------

    /// Regroup the elementary dependencies by their visible ends and move the
    /// dependency views into place.
    pub fn update_dependencies(&mut self) -> Result<(), GraphError> {
        self.regroup_dependencies()?;
        self.jump_dependency_views();
        Ok(())
    }

    fn regroup_dependencies(&mut self) -> Result<(), GraphError> {
        let mut groups: BTreeMap<(NodeId, NodeId), Vec<ElementaryDependency>> = BTreeMap::new();
        for dep in self.dependencies.iter().filter(|d| d.matches_all_filters()) {
            let origin = self.tree.visible_representative(dep.origin);
            let target = self.tree.visible_representative(dep.target);
            let (Some(origin), Some(target)) = (origin, target) else { continue };
            if origin == target {
                continue;
            }
            let grouped = if (origin, target) == (dep.origin, dep.target) {
                dep.clone()
            } else {
                dep.shifted(origin, target)
            };
            groups.entry((origin, target)).or_default().push(grouped);
        }

        let mut keys = Vec::with_capacity(groups.len());
        for ((origin, target), deps) in &groups {
            let refs: Vec<&ElementaryDependency> = deps.iter().collect();
            let (dep, created) = self
                .cache
                .get_or_create(&self.tree, &self.config.styles, *origin, *target, &refs)?;
            if created {
                let view = self.views.dependency_view(dep);
                self.dependency_views.insert(dep.key.clone(), view);
                let detailed = self.views.detailed_view(&dep.key);
                self.detailed_views.insert(dep.key.clone(), detailed);
            }
            keys.push(dep.key.clone());
        }

        let current: HashSet<&DependencyKey> = keys.iter().collect();
        for key in &self.grouped {
            if current.contains(key) {
                continue;
            }
            if let Some(view) = self.dependency_views.get_mut(key) {
                view.hide();
            }
            if let Some(view) = self.detailed_views.get_mut(key) {
                view.fade_out();
            }
        }
        debug!("{} grouped dependencies", keys.len());
        self.grouped = keys;
        Ok(())
    }

    /// Ends overlap, or the reverse edge is drawn as well.
    fn update_must_share_nodes(&mut self) {
        let eps = self.config.layout.overlap_epsilon;
        let current: HashSet<DependencyKey> = self.grouped.iter().cloned().collect();
        for key in &self.grouped {
            let Some(dep) = self.cache.get_mut(key) else { continue };
            dep.must_share_nodes =
                self.tree.overlaps_with(dep.origin, dep.target, eps) || current.contains(&key.reversed());
        }
    }

    fn jump_dependency_views(&mut self) {
        self.update_must_share_nodes();
        let eps = self.config.layout.overlap_epsilon;
        for key in &self.grouped {
            let Some(dep) = self.cache.get_mut(key) else { continue };
            dep.recalculate_points(&self.tree, self.geometry.as_ref());
            dep.refresh(&self.tree, eps);
            if let Some(view) = self.dependency_views.get_mut(key) {
                view.jump_to_position_and_show_if_visible(dep);
            }
        }
    }

    /// Install (or replace) a named dependency filter. Only dependencies
    /// passing every filter are drawn.
    pub fn set_dependency_filter<F>(&mut self, name: &str, matches: F) -> Result<(), GraphError>
    where
        F: Fn(&ElementaryDependency, &NodeTree) -> bool,
    {
        for dep in &mut self.dependencies {
            let m = matches(dep, &self.tree);
            dep.set_matches_filter(name, m);
        }
        self.update_dependencies()
    }

    /// Mark the elementary dependencies between the given classes (by full
    /// name) as violations. Returns how many were marked.
    pub fn mark_violations(&mut self, pairs: &[(&str, &str)]) -> Result<usize, GraphError> {
        self.set_violations(pairs, true)
    }

    pub fn unmark_violations(&mut self, pairs: &[(&str, &str)]) -> Result<usize, GraphError> {
        self.set_violations(pairs, false)
    }

    fn set_violations(&mut self, pairs: &[(&str, &str)], violation: bool) -> Result<usize, GraphError> {
        let mut ids = HashSet::new();
        for (origin, target) in pairs {
            ids.insert((self.tree.require(origin)?, self.tree.require(target)?));
        }
        let mut changed = 0;
        for dep in self.dependencies.iter_mut().filter(|d| ids.contains(&(d.origin, d.target))) {
            if violation {
                dep.mark_as_violation();
            } else {
                dep.unmark_as_violation();
            }
            changed += 1;
        }
        self.update_dependencies()?;
        Ok(changed)
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    fn dispatch(&mut self, events: &[TreeEvent]) {
        for event in events {
            for listener in &mut self.listeners {
                match event {
                    TreeEvent::Dragged(id) => listener.on_drag(self.tree.full_name(*id)),
                    TreeEvent::Folded(id) => listener.on_fold(self.tree.full_name(*id)),
                    TreeEvent::InitialFolded(id) => listener.on_initial_fold(self.tree.full_name(*id)),
                    TreeEvent::LayoutChanged => listener.on_layout_changed(),
                    TreeEvent::RimChanged(id, rim) => listener.on_node_rim_changed(self.tree.full_name(*id), *rim),
                    TreeEvent::NodesFocused => listener.on_nodes_focused(),
                    TreeEvent::NodesOverlapping { overlapped, position } => {
                        listener.on_nodes_overlapping(self.tree.full_name(*overlapped), *position)
                    }
                    TreeEvent::SizeExpanded { half_width, half_height } => {
                        listener.on_size_expanded(*half_width, *half_height)
                    }
                }
            }
        }
    }
}

/// Elementary dependencies (passing every filter) drawn as the edge between
/// two visible nodes.
fn elementary_behind<'a>(
    tree: &'a NodeTree,
    dependencies: &'a [ElementaryDependency],
    origin: NodeId,
    target: NodeId,
) -> impl Iterator<Item = &'a ElementaryDependency> {
    dependencies.iter().filter(move |d| {
        d.matches_all_filters()
            && tree.visible_representative(d.origin) == Some(origin)
            && tree.visible_representative(d.target) == Some(target)
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures::executor::block_on;
    use futures::future;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::dependency::{DependencyStyle, StyleClass};
    use crate::geometry::Circle;
    use crate::transition::TransitionState;
    use crate::tree::{NodeStyle, RimStyle};
    use crate::view::{HeadlessNodeView, settled};

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder(Log);

    impl GraphListener for Recorder {
        fn on_drag(&mut self, full_name: &str) {
            self.0.borrow_mut().push(format!("drag {full_name}"));
        }
        fn on_fold(&mut self, full_name: &str) {
            self.0.borrow_mut().push(format!("fold {full_name}"));
        }
        fn on_initial_fold(&mut self, full_name: &str) {
            self.0.borrow_mut().push(format!("initial_fold {full_name}"));
        }
        fn on_layout_changed(&mut self) {
            self.0.borrow_mut().push("layout".to_string());
        }
        fn on_node_rim_changed(&mut self, full_name: &str, rim: RimStyle) {
            self.0.borrow_mut().push(format!("rim {full_name} {}", rim.css_class()));
        }
        fn on_nodes_overlapping(&mut self, full_name: &str, _position: Vector) {
            self.0.borrow_mut().push(format!("overlapping {full_name}"));
        }
        fn on_size_expanded(&mut self, _half_width: f64, _half_height: f64) {
            self.0.borrow_mut().push("size_expanded".to_string());
        }
    }

    struct RecordingDependencyView {
        key: String,
        log: Log,
    }

    impl DependencyView for RecordingDependencyView {
        fn show(&mut self) {}
        fn hide(&mut self) {
            self.log.borrow_mut().push(format!("hide {}", self.key));
        }
        fn jump_to_position_and_show_if_visible(&mut self, _dep: &GroupedDependency) {}
        fn move_to_position_and_show_if_visible(&mut self, _dep: &GroupedDependency) -> Transition {
            self.log.borrow_mut().push(format!("move {}", self.key));
            settled()
        }
        fn refresh(&mut self, _dep: &GroupedDependency) {}
        fn on_container_end_node_changed(&mut self, _dep: &GroupedDependency) {
            self.log.borrow_mut().push(format!("end_changed {}", self.key));
        }
    }

    struct RecordingDetailedView {
        key: String,
        log: Log,
    }

    impl DetailedDependencyView for RecordingDetailedView {
        fn fade_in(&mut self, details: &dyn Fn() -> Vec<DependencyDetail>) {
            let details = details();
            self.log.borrow_mut().push(format!("fade_in {} {}", self.key, details.len()));
        }
        fn fade_out(&mut self) {
            self.log.borrow_mut().push(format!("fade_out {}", self.key));
        }
    }

    /// Node view whose radius changes are always rejected.
    struct RejectingNodeView;

    impl NodeView for RejectingNodeView {
        fn show(&mut self) {}
        fn hide(&mut self) {}
        fn jump_to_position(&mut self, _circle: &Circle) {}
        fn move_to_position(&mut self, _circle: &Circle) -> Transition {
            settled()
        }
        fn change_radius(&mut self, _r: f64, _label_offset: f64) -> Transition {
            Box::pin(future::ready(Err(ViewError::new("detached"))))
        }
        fn set_radius(&mut self, _r: f64, _label_offset: f64) {}
        fn update_node_type(&mut self, _style: &NodeStyle) {}
    }

    struct RecordingViews {
        log: Log,
        reject: bool,
    }

    impl ViewFactory for RecordingViews {
        fn node_view(&mut self, _name: &str, _full_name: &str) -> Box<dyn NodeView> {
            if self.reject {
                Box::new(RejectingNodeView)
            } else {
                Box::new(HeadlessNodeView::default())
            }
        }
        fn dependency_view(&mut self, dep: &GroupedDependency) -> Box<dyn DependencyView> {
            self.log.borrow_mut().push(format!("new {}", dep.key));
            Box::new(RecordingDependencyView { key: dep.key.to_string(), log: self.log.clone() })
        }
        fn detailed_view(&mut self, key: &DependencyKey) -> Box<dyn DetailedDependencyView> {
            self.log.borrow_mut().push(format!("detailed {key}"));
            Box::new(RecordingDetailedView { key: key.to_string(), log: self.log.clone() })
        }
    }

    fn dep(origin: &str, target: &str, kind: &str) -> DependencyInput {
        DependencyInput {
            origin: origin.to_string(),
            target: target.to_string(),
            kind: kind.to_string(),
            description: format!("{origin} {kind} {target}"),
        }
    }

    fn input() -> GraphInput {
        GraphInput {
            classes: ["p.A", "p.B", "q.C", "q.D$E"].into_iter().map(String::from).collect(),
            dependencies: vec![
                dep("p.A", "q.C", "EXTENDS"),
                dep("p.A", "q.C", "IMPLEMENTS"),
                dep("p.B", "q.C", "METHOD_CALL"),
                dep("q.D$E", "q.D", "INNERCLASS_DEPENDENCY"),
                dep("q.C", "p.A", "FIELD_ACCESS"),
            ],
        }
    }

    fn graph_with(config: GraphConfig, reject: bool) -> (Graph, Log) {
        let log: Log = Rc::default();
        let graph = Graph::builder(config)
            .views(RecordingViews { log: log.clone(), reject })
            .listener(Recorder(log.clone()))
            .build(&input())
            .unwrap();
        (graph, log)
    }

    fn graph() -> (Graph, Log) {
        graph_with(GraphConfig::default(), false)
    }

    fn keys(graph: &Graph) -> Vec<String> {
        graph.grouped_dependencies().map(|d| d.key.to_string()).collect()
    }

    fn assert_containment(graph: &Graph) {
        let tree = graph.tree();
        for id in tree.visible_nodes() {
            if let Some(parent) = tree.node(id).parent {
                assert!(tree.node(parent).circle.contains(&tree.node(id).circle, 1e-6));
            }
        }
    }

    #[test]
    fn test_build_groups_dependencies_per_visible_pair() {
        let (graph, log) = graph();
        assert_eq!(keys(&graph), vec!["p.A-q.C", "p.B-q.C", "q.C-p.A", "q.D$E-q.D"]);
        assert!(log.borrow().contains(&"layout".to_string()));
        assert!(log.borrow().contains(&"new p.A-q.C".to_string()));
        assert_containment(&graph);

        let a_c = graph.grouped_dependency("p.A", "q.C").unwrap();
        assert_eq!(a_c.style.color, StyleClass::Mixed);
        assert_eq!(a_c.class_names(), "severalColors");
        // The reverse edge is drawn too.
        assert!(a_c.must_share_nodes);
        assert!(a_c.is_visible());

        // An inner class lies inside its outer class.
        assert!(!graph.grouped_dependency("q.D$E", "q.D").unwrap().is_visible());
    }

    #[test]
    fn test_unknown_dependency_end_is_an_error() {
        let mut input = input();
        input.dependencies.push(dep("p.A", "nowhere.X", "EXTENDS"));
        let err = Graph::builder(GraphConfig::default()).build(&input).err();
        assert_eq!(err, Some(GraphError::UnknownNode("nowhere.X".to_string())));
    }

    #[test]
    fn test_drag_moves_node_and_notifies() {
        let (mut graph, log) = graph();
        let a = graph.node_id("p.A").unwrap();
        let before = graph.tree().node(a).circle.center();
        let events = graph.drag(a, Vector::new(20.0, 0.0)).unwrap();
        assert_eq!(graph.tree().node(a).circle.center(), before + Vector::new(20.0, 0.0));
        assert!(events.contains(&TreeEvent::Dragged(a)));
        assert!(log.borrow().contains(&"drag p.A".to_string()));
        assert!(log.borrow().contains(&"rim p.A default".to_string()));
        assert_containment(&graph);

        assert!(graph.drag(a, Vector::ZERO).unwrap().is_empty());
    }

    #[test]
    fn test_ids_from_another_tree_are_rejected() {
        let (mut graph, _) = graph();
        let stranger = NodeId(999);
        let unknown = Some(GraphError::UnknownNode("#999".to_string()));
        assert_eq!(graph.drag(stranger, Vector::new(1.0, 1.0)).err(), unknown);
        assert_eq!(graph.focus(stranger).err(), unknown);
        assert_eq!(block_on(graph.fold(stranger)).err(), unknown);
        assert_eq!(block_on(graph.unfold(stranger)).err(), unknown);
        let a = graph.node_id("p.A").unwrap();
        assert_eq!(graph.overlaps_with(a, stranger).err(), unknown);
        assert_containment(&graph);
    }

    #[test]
    fn test_drag_off_tree_expands_root() {
        let (mut graph, log) = graph();
        let a = graph.node_id("p.A").unwrap();
        graph.drag(a, Vector::new(1000.0, 1000.0)).unwrap();
        assert!(log.borrow().contains(&"size_expanded".to_string()));
        assert_containment(&graph);
    }

    #[test]
    fn test_dependency_hidden_while_ends_overlap() {
        let (mut graph, log) = graph();
        let b = graph.node_id("p.B").unwrap();
        let c = graph.node_id("q.C").unwrap();
        let delta = graph.tree().node(c).circle.center() - graph.tree().node(b).circle.center();
        graph.drag(b, delta).unwrap();

        assert!(graph.overlaps_with(b, c).unwrap());
        assert!(graph.overlaps_with(c, b).unwrap());
        let b_c = graph.grouped_dependency("p.B", "q.C").unwrap();
        assert!(!b_c.is_visible());
        assert!(b_c.must_share_nodes);
        assert!(log.borrow().contains(&"overlapping q.C".to_string()));
    }

    #[test]
    fn test_focus_changes_container_end_node() {
        let (mut graph, log) = graph();
        let a = graph.node_id("p.A").unwrap();
        let c = graph.node_id("q.C").unwrap();
        // Unfocused, q is declared after p and lies in front.
        assert_eq!(graph.grouped_dependency("p.A", "q.C").unwrap().container_end_node(), a);

        graph.focus(a).unwrap();
        let a_c = graph.grouped_dependency("p.A", "q.C").unwrap();
        assert_eq!(a_c.container_end_node(), c);
        assert!(!a_c.container_end_node_changed());
        assert!(log.borrow().contains(&"end_changed p.A-q.C".to_string()));
    }

    #[test]
    fn test_fold_shifts_dependencies_to_the_folded_node() {
        let (mut graph, log) = graph();
        let p = graph.node_id("p").unwrap();
        graph.mark_violations(&[("p.B", "q.C")]).unwrap();

        assert!(block_on(graph.fold(p)).unwrap());
        assert!(log.borrow().contains(&"fold p".to_string()));
        assert_eq!(keys(&graph), vec!["p-q.C", "q.C-p", "q.D$E-q.D"]);
        let p_c = graph.grouped_dependency("p", "q.C").unwrap();
        assert_eq!(p_c.style, DependencyStyle::PLAIN);
        assert!(p_c.violation);
        assert!(!p_c.has_detailed_description(graph.tree()));
        assert!(log.borrow().contains(&"hide p.A-q.C".to_string()));
        assert!(log.borrow().contains(&"move p-q.C".to_string()));
        assert_containment(&graph);

        let details = graph.detailed_dependencies("p", "q.C").unwrap();
        let descriptions: Vec<&str> = details.iter().map(|d| d.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec!["p.A EXTENDS q.C", "p.A IMPLEMENTS q.C", "p.B METHOD_CALL q.C"]
        );

        assert!(!block_on(graph.fold(p)).unwrap());
        assert!(block_on(graph.unfold(p)).unwrap());
        assert_eq!(keys(&graph), vec!["p.A-q.C", "p.B-q.C", "q.C-p.A", "q.D$E-q.D"]);
        assert_eq!(graph.transitions().in_flight(), 0);
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let (mut graph, log) = graph();
        let before: Vec<GroupedDependency> = graph.grouped_dependencies().cloned().collect();
        let created = log.borrow().iter().filter(|l| l.starts_with("new ")).count();
        graph.update_dependencies().unwrap();
        graph.update_dependencies().unwrap();
        let after: Vec<GroupedDependency> = graph.grouped_dependencies().cloned().collect();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(b.key, a.key);
            assert_eq!(b.style, a.style);
        }
        assert_eq!(log.borrow().iter().filter(|l| l.starts_with("new ")).count(), created);
    }

    #[test]
    fn test_each_new_edge_gets_one_detailed_view() {
        let (mut graph, log) = graph();
        let p = graph.node_id("p").unwrap();
        graph.update_dependencies().unwrap();
        assert!(block_on(graph.fold(p)).unwrap());
        assert!(block_on(graph.unfold(p)).unwrap());

        let log = log.borrow();
        for key in ["p.A-q.C", "p.B-q.C", "q.C-p.A", "q.D$E-q.D", "p-q.C", "q.C-p"] {
            let wired = log.iter().filter(|l| **l == format!("detailed {key}")).count();
            assert_eq!(wired, 1, "{key}");
        }
        // Edges that disappear on fold lose their detailed view.
        assert!(log.contains(&"fade_out p.A-q.C".to_string()));
    }

    #[test]
    fn test_mouse_over_fades_detailed_view_in_and_out() {
        let (mut graph, log) = graph();
        assert!(!log.borrow().iter().any(|l| l.starts_with("fade_in")));

        assert!(graph.on_mouse_over("p.A", "q.C"));
        assert!(log.borrow().contains(&"fade_in p.A-q.C 2".to_string()));
        assert!(graph.on_mouse_out("p.A", "q.C"));
        assert!(log.borrow().contains(&"fade_out p.A-q.C".to_string()));

        // No such edge.
        assert!(!graph.on_mouse_over("p.A", "p.B"));
        assert!(!graph.on_mouse_out("p.A", "p.B"));

        // Package ends have nothing to list.
        let p = graph.node_id("p").unwrap();
        block_on(graph.fold(p)).unwrap();
        assert!(!graph.on_mouse_over("p", "q.C"));
        assert!(!log.borrow().iter().any(|l| l.starts_with("fade_in p-q.C")));
    }

    #[test]
    fn test_for_each_detailed_view_visits_drawn_edges() {
        let (mut graph, log) = graph();
        let mut visited = Vec::new();
        graph.for_each_detailed_view(|key, view| {
            visited.push(key.to_string());
            view.fade_out();
        });
        assert_eq!(visited, keys(&graph));
        assert_eq!(log.borrow().iter().filter(|l| l.starts_with("fade_out")).count(), 4);
    }

    #[test]
    fn test_violations() {
        let (mut graph, _) = graph();
        assert!(!graph.grouped_dependency("p.A", "q.C").unwrap().violation);
        assert_eq!(graph.mark_violations(&[("p.A", "q.C")]).unwrap(), 2);
        assert!(graph.grouped_dependency("p.A", "q.C").unwrap().violation);
        assert!(!graph.grouped_dependency("p.B", "q.C").unwrap().violation);
        graph.unmark_violations(&[("p.A", "q.C")]).unwrap();
        assert!(!graph.grouped_dependency("p.A", "q.C").unwrap().violation);
        assert!(graph.mark_violations(&[("p.A", "x.Y")]).is_err());
    }

    #[test]
    fn test_dependency_filter() {
        let (mut graph, _) = graph();
        graph
            .set_dependency_filter("type", |d, _| d.kind() == Some("EXTENDS"))
            .unwrap();
        assert_eq!(keys(&graph), vec!["p.A-q.C"]);
        assert_eq!(
            graph.grouped_dependency("p.A", "q.C").unwrap().style.color,
            StyleClass::Single("EXTENDS".to_string())
        );
        graph.set_dependency_filter("type", |_, _| true).unwrap();
        assert_eq!(keys(&graph).len(), 4);
    }

    #[test]
    fn test_node_filter_hides_classes_and_empty_packages() {
        let (mut graph, _) = graph();
        block_on(graph.filter_nodes(|n| n.full_name != "p.A" && n.full_name != "p.B")).unwrap();
        let p = graph.node_id("p").unwrap();
        assert!(!graph.tree().is_visible(p));
        assert_eq!(keys(&graph), vec!["q.D$E-q.D"]);
        assert_containment(&graph);
    }

    #[test]
    fn test_initial_fold_from_config() {
        let config = GraphConfig { initial_fold_depth: Some(1), ..GraphConfig::default() };
        let (graph, log) = graph_with(config, false);
        let log = log.borrow();
        assert!(log.contains(&"initial_fold p".to_string()));
        assert!(log.contains(&"initial_fold q".to_string()));
        assert_eq!(keys(&graph), vec!["p-q", "q-p"]);
    }

    #[test]
    fn test_newer_relayout_supersedes_older_one() {
        let (mut graph, _) = graph();
        let a = graph.node_id("p.A").unwrap();

        let first = graph.begin_relayout().unwrap();
        let second = graph.begin_relayout().unwrap();
        assert_eq!(first.len(), second.len());

        let first = block_on(first.run());
        graph.settle(first).unwrap();
        assert!(matches!(graph.transitions().state(a), TransitionState::Animating { .. }));

        let second = block_on(second.run());
        graph.settle(second).unwrap();
        assert!(graph.transitions().is_idle(a));
        assert_eq!(graph.transitions().in_flight(), 0);
    }

    #[test]
    fn test_rejected_transition_is_surfaced_and_nodes_return_to_idle() {
        let (mut graph, _) = graph_with(GraphConfig::default(), true);
        let p = graph.node_id("p").unwrap();
        let result = block_on(graph.fold(p));
        assert_eq!(result, Err(GraphError::Transition(ViewError::new("detached"))));
        assert_eq!(graph.transitions().in_flight(), 0);
        assert!(graph.tree().node(p).folded);
        assert_containment(&graph);
    }

    fn contains_visible_children(graph: &Graph) -> bool {
        let tree = graph.tree();
        tree.visible_nodes().into_iter().all(|id| match tree.node(id).parent {
            Some(parent) => tree.node(parent).circle.contains(&tree.node(id).circle, 1e-6),
            None => true,
        })
    }

    proptest! {
        #[test]
        fn prop_containment_after_drags_and_folds(
            ops in prop::collection::vec((0u8..3, 0usize..16, -300.0f64..300.0, -300.0f64..300.0), 1..14)
        ) {
            let (mut graph, _) = graph();
            let root = graph.tree().root();
            let ids: Vec<NodeId> = graph.tree().nodes().map(|n| n.id).filter(|&id| id != root).collect();
            for (op, idx, dx, dy) in ops {
                let id = ids[idx % ids.len()];
                match op {
                    0 => {
                        graph.drag(id, Vector::new(dx, dy)).unwrap();
                    }
                    1 => {
                        block_on(graph.fold(id)).unwrap();
                    }
                    _ => {
                        block_on(graph.unfold(id)).unwrap();
                    }
                }
                prop_assert!(contains_visible_children(&graph));
            }
        }
    }
}
