//! Sorted node collection driving the contraction order.

use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;

/// Ordered set of (priority, node) pairs. The minimum-priority node is
/// polled next; ties resolve to the smaller node id, which keeps the
/// contraction order deterministic. Callers pass the previous priority to
/// `update`, so no secondary node-to-priority index is needed.
#[derive(Debug, Default)]
pub struct NodeQueue {
    entries: BTreeSet<(i32, NodeIndex)>,
}

impl NodeQueue {
    pub fn new() -> Self {
        NodeQueue {
            entries: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, node: NodeIndex, priority: i32) {
        self.entries.insert((priority, node));
    }

    pub fn poll_min_key(&mut self) -> Option<NodeIndex> {
        self.entries.pop_first().map(|(_, node)| node)
    }

    pub fn peek_min_priority(&self) -> Option<i32> {
        self.entries.first().map(|&(priority, _)| priority)
    }

    pub fn update(&mut self, node: NodeIndex, old_priority: i32, new_priority: i32) {
        self.entries.remove(&(old_priority, node));
        self.entries.insert((new_priority, node));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn polls_in_ascending_priority_order() {
        let mut q = NodeQueue::new();
        q.insert(node(0), 5);
        q.insert(node(1), -3);
        q.insert(node(2), 9);

        assert_eq!(q.peek_min_priority(), Some(-3));
        assert_eq!(q.poll_min_key(), Some(node(1)));
        assert_eq!(q.poll_min_key(), Some(node(0)));
        assert_eq!(q.poll_min_key(), Some(node(2)));
        assert_eq!(q.poll_min_key(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn equal_priorities_break_ties_by_node_id() {
        let mut q = NodeQueue::new();
        q.insert(node(4), 1);
        q.insert(node(2), 1);
        q.insert(node(3), 1);

        assert_eq!(q.poll_min_key(), Some(node(2)));
        assert_eq!(q.poll_min_key(), Some(node(3)));
        assert_eq!(q.poll_min_key(), Some(node(4)));
    }

    #[test]
    fn update_moves_an_entry() {
        let mut q = NodeQueue::new();
        q.insert(node(0), 10);
        q.insert(node(1), 20);

        q.update(node(1), 20, 5);
        assert_eq!(q.len(), 2);
        assert_eq!(q.poll_min_key(), Some(node(1)));
        assert_eq!(q.poll_min_key(), Some(node(0)));
    }
}
