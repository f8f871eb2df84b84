//! Plain Dijkstra over the unprepared graph, used as the correctness
//! baseline by the validation harness and the tests.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use petgraph::graph::NodeIndex;
use rustc_hash::FxHashMap;

use crate::graph::LevelGraph;

/// Heap entry for weight-ordered searches.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeapItem {
    pub weight: f64,
    pub node: NodeIndex,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight
    }
}

impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap: reverse ordering
        other
            .weight
            .partial_cmp(&self.weight)
            .unwrap_or(Ordering::Equal)
    }
}

/// Shortest-path weight from `source` to `target`, ignoring levels.
pub fn shortest_path_weight(g: &LevelGraph, source: NodeIndex, target: NodeIndex) -> Option<f64> {
    if source.index() >= g.num_nodes() || target.index() >= g.num_nodes() {
        return None;
    }

    let mut dist: FxHashMap<NodeIndex, f64> = FxHashMap::default();
    let mut heap = BinaryHeap::new();
    dist.insert(source, 0.0);
    heap.push(HeapItem {
        weight: 0.0,
        node: source,
    });

    while let Some(HeapItem { weight, node }) = heap.pop() {
        if node == target {
            return Some(weight);
        }
        if weight > *dist.get(&node).unwrap_or(&f64::INFINITY) {
            continue; // stale entry
        }
        for cur in g.get_outgoing(node) {
            let next = weight + cur.weight;
            if next < *dist.get(&cur.node).unwrap_or(&f64::INFINITY) {
                dist.insert(cur.node, next);
                heap.push(HeapItem {
                    weight: next,
                    node: cur.node,
                });
            }
        }
    }

    None
}
