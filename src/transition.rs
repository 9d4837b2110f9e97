// Per-node transition bookkeeping.
//
// A node is either idle or animating towards a target circle. A new move
// request for an animating node supersedes the running one: it gets a fresh
// generation and the view is handed the new target right away. Only the
// completion of the latest generation returns the node to idle; completions
// of superseded generations are ignored.

use std::collections::HashMap;

use log::trace;

use crate::geometry::Circle;
use crate::tree::NodeId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TransitionState {
    Idle,
    Animating { target: Circle, generation: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct Transitions {
    states: HashMap<NodeId, TransitionState>,
    next_generation: u64,
}

impl Transitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: NodeId) -> TransitionState {
        self.states.get(&id).copied().unwrap_or(TransitionState::Idle)
    }

    pub fn is_idle(&self, id: NodeId) -> bool {
        self.state(id) == TransitionState::Idle
    }

    /// Start (or retarget) the transition of `id`. Returns its generation.
    pub fn begin(&mut self, id: NodeId, target: Circle) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        if let Some(TransitionState::Animating { generation: old, .. }) = self.states.get(&id) {
            trace!("node #{} retargeted, generation {} supersedes {}", id.0, generation, old);
        }
        self.states.insert(id, TransitionState::Animating { target, generation });
        generation
    }

    /// A transition finished. Returns true if it was the latest one for the
    /// node, which is idle afterwards.
    pub fn settle(&mut self, id: NodeId, generation: u64) -> bool {
        match self.states.get(&id) {
            Some(TransitionState::Animating { generation: current, .. }) if *current == generation => {
                self.states.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Return every node to idle.
    pub fn reset(&mut self) {
        self.states.clear();
    }

    pub fn in_flight(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_settle() {
        let mut t = Transitions::new();
        let id = NodeId(3);
        assert!(t.is_idle(id));
        let target = Circle::new(1.0, 2.0, 3.0);
        let generation = t.begin(id, target);
        assert_eq!(t.state(id), TransitionState::Animating { target, generation });
        assert!(t.settle(id, generation));
        assert!(t.is_idle(id));
        assert!(!t.settle(id, generation));
    }

    #[test]
    fn test_newer_request_supersedes() {
        let mut t = Transitions::new();
        let id = NodeId(1);
        let first = t.begin(id, Circle::new(0.0, 0.0, 1.0));
        let second_target = Circle::new(5.0, 5.0, 1.0);
        let second = t.begin(id, second_target);
        assert!(second > first);

        // The old completion arrives first and must not settle the node.
        assert!(!t.settle(id, first));
        assert_eq!(t.state(id), TransitionState::Animating { target: second_target, generation: second });
        assert!(t.settle(id, second));
        assert!(t.is_idle(id));
    }

    #[test]
    fn test_independent_nodes_and_reset() {
        let mut t = Transitions::new();
        let a = t.begin(NodeId(1), Circle::default());
        t.begin(NodeId(2), Circle::default());
        assert_eq!(t.in_flight(), 2);
        assert!(t.settle(NodeId(1), a));
        assert_eq!(t.in_flight(), 1);
        t.reset();
        assert!(t.is_idle(NodeId(2)));
    }
}
