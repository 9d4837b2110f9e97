// Z-order: which of two nodes lies in front of the other.
//
// Focusing a node stamps it and all its ancestors with the next value of a
// monotonically increasing counter. Two nodes are compared through the
// children of their lowest common ancestor that lead to them, so a whole
// subtree moves to the front together, like nested SVG groups do.

use super::{NodeId, NodeTree};

impl NodeTree {
    /// Bring `id` (and with it its ancestors) to the front.
    pub fn focus(&mut self, id: NodeId) {
        self.focus_counter += 1;
        let stamp = self.focus_counter;
        self.nodes[id.0].focus = stamp;
        let ancestors: Vec<NodeId> = self.ancestors(id).collect();
        for a in ancestors {
            self.nodes[a.0].focus = stamp;
        }
    }

    /// True if `a` is drawn on top of `b`.
    ///
    /// An ancestor never lies in front of its descendant; a descendant always
    /// lies in front of its ancestor. Otherwise the more recently focused
    /// branch wins, and never-focused branches fall back to declaration
    /// order (later siblings are drawn later).
    pub fn lies_in_front_of(&self, a: NodeId, b: NodeId) -> bool {
        if a == b || self.is_ancestor_of(a, b) {
            return false;
        }
        if self.is_ancestor_of(b, a) {
            return true;
        }

        let path_a = self.path_from_root(a);
        let path_b = self.path_from_root(b);
        let split = path_a
            .iter()
            .zip(path_b.iter())
            .position(|(x, y)| x != y)
            .unwrap_or(0);
        let branch_a = &self.nodes[path_a[split].0];
        let branch_b = &self.nodes[path_b[split].0];

        if branch_a.focus != branch_b.focus {
            branch_a.focus > branch_b.focus
        } else {
            branch_a.order > branch_b.order
        }
    }

    /// The end of a dependency that is drawn in front.
    pub fn end_node_in_foreground(&self, origin: NodeId, target: NodeId) -> NodeId {
        if self.lies_in_front_of(target, origin) { target } else { origin }
    }

    /// The end of a dependency that is drawn behind the other one.
    pub fn end_node_in_background(&self, origin: NodeId, target: NodeId) -> NodeId {
        if self.end_node_in_foreground(origin, target) == origin { target } else { origin }
    }
}

#[cfg(test)]
mod tests {
    use super::super::NodeTree;

    fn tree() -> NodeTree {
        NodeTree::from_class_names([
            "my.company.firstPkg.FirstClass",
            "my.company.firstPkg.SecondClass",
            "my.company.firstPkg.ThirdClass",
            "my.company.secondPkg.FirstClass",
        ])
        .unwrap()
    }

    #[test]
    fn test_focused_node_lies_in_front_of_everything_outside_its_subtree() {
        let mut tree = tree();
        let first = tree.require("my.company.firstPkg.FirstClass").unwrap();
        tree.focus(first);

        for other in [
            "my.company.firstPkg.SecondClass",
            "my.company.firstPkg.ThirdClass",
            "my.company.secondPkg.FirstClass",
            "my.company.firstPkg",
            "my.company.secondPkg",
            "my.company",
        ] {
            let other = tree.require(other).unwrap();
            assert!(tree.lies_in_front_of(first, other));
            assert!(!tree.lies_in_front_of(other, first));
        }

        let second_pkg_first = tree.require("my.company.secondPkg.FirstClass").unwrap();
        tree.focus(second_pkg_first);
        assert!(tree.lies_in_front_of(second_pkg_first, first));
        assert!(!tree.lies_in_front_of(first, second_pkg_first));
    }

    #[test]
    fn test_ancestor_never_lies_in_front_of_descendant() {
        let mut tree = tree();
        let pkg = tree.require("my.company.firstPkg").unwrap();
        let first = tree.require("my.company.firstPkg.FirstClass").unwrap();
        tree.focus(pkg);
        for child in tree.node(pkg).children.clone() {
            assert!(!tree.lies_in_front_of(pkg, child));
            assert!(tree.lies_in_front_of(child, pkg));
        }
        tree.focus(first);
        assert!(!tree.lies_in_front_of(pkg, first));
    }

    #[test]
    fn test_unfocused_siblings_follow_declaration_order() {
        let tree = tree();
        let first = tree.require("my.company.firstPkg.FirstClass").unwrap();
        let third = tree.require("my.company.firstPkg.ThirdClass").unwrap();
        assert!(tree.lies_in_front_of(third, first));
        assert!(!tree.lies_in_front_of(first, third));
        assert!(!tree.lies_in_front_of(first, first));
    }

    #[test]
    fn test_descendants_of_focused_node_come_to_front() {
        let mut tree = tree();
        let first_pkg = tree.require("my.company.firstPkg").unwrap();
        let second_pkg = tree.require("my.company.secondPkg").unwrap();
        let second_class = tree.require("my.company.firstPkg.SecondClass").unwrap();
        tree.focus(second_pkg);
        assert!(!tree.lies_in_front_of(second_class, second_pkg));
        tree.focus(first_pkg);
        assert!(tree.lies_in_front_of(second_class, second_pkg));
    }

    #[test]
    fn test_order_between_cousins_follows_their_branches() {
        let mut tree = NodeTree::from_class_names(["p.A", "p.B", "q.C"]).unwrap();
        let a = tree.require("p.A").unwrap();
        let b = tree.require("p.B").unwrap();
        let c = tree.require("q.C").unwrap();
        tree.focus(c);
        tree.focus(b);
        // p.A was never focused itself, but its package was focused after q.
        assert!(tree.lies_in_front_of(a, c));
        assert!(!tree.lies_in_front_of(c, a));
        assert!(tree.lies_in_front_of(b, a));
    }

    #[test]
    fn test_end_nodes() {
        let mut tree = tree();
        let a = tree.require("my.company.firstPkg.FirstClass").unwrap();
        let b = tree.require("my.company.secondPkg.FirstClass").unwrap();
        tree.focus(a);
        assert_eq!(tree.end_node_in_foreground(a, b), a);
        assert_eq!(tree.end_node_in_background(a, b), b);
        tree.focus(b);
        assert_eq!(tree.end_node_in_foreground(a, b), b);
        assert_eq!(tree.end_node_in_background(a, b), a);
    }
}
