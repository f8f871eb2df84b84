//! Bounded one-to-many witness search.
//!
//! Decides whether a candidate shortcut u -> v -> w is necessary: a
//! Dijkstra from u that skips v and every contracted node, gives up once
//! the open frontier exceeds a weight limit, and fills each goal's slot
//! with the settled weight when it reaches the goal. A goal left empty, or
//! settled above the two-edge weight through v, means the shortcut is
//! required.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use petgraph::graph::NodeIndex;

use crate::graph::LevelGraph;

/// One target of the search. `witness` is populated with the settled
/// weight when the search reaches `node` within the limit.
#[derive(Debug, Clone, Copy)]
pub struct SearchGoal {
    pub node: NodeIndex,
    /// Weight of the two-edge path through the contraction candidate.
    pub via_weight: f64,
    /// Original-edge count of the outgoing half behind this goal.
    pub orig_edges: u32,
    pub witness: Option<f64>,
}

#[derive(Clone, Copy)]
struct DistEntry {
    weight: f64,
    version: u32,
}

#[derive(Clone, Copy)]
struct HeapEntry {
    weight: f64,
    node: NodeIndex,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap: reverse ordering
        other
            .weight
            .partial_cmp(&self.weight)
            .unwrap_or(Ordering::Equal)
    }
}

/// Reusable search state. Version-stamped distances give an O(1) reset
/// between runs, so thousands of searches per contraction allocate nothing.
pub struct WitnessSearch {
    dist: Vec<DistEntry>,
    version: u32,
    heap: BinaryHeap<HeapEntry>,
}

impl Default for WitnessSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl WitnessSearch {
    pub fn new() -> Self {
        WitnessSearch {
            dist: Vec::new(),
            version: 0,
            heap: BinaryHeap::new(),
        }
    }

    fn reset(&mut self, n_nodes: usize) {
        if self.dist.len() < n_nodes {
            self.dist.resize(
                n_nodes,
                DistEntry {
                    weight: f64::INFINITY,
                    version: 0,
                },
            );
        }
        self.version = self.version.wrapping_add(1);
        if self.version == 0 {
            // version wrapped, full reset required
            for entry in &mut self.dist {
                entry.version = 0;
            }
            self.version = 1;
        }
        self.heap.clear();
    }

    fn get(&self, node: NodeIndex) -> f64 {
        let entry = &self.dist[node.index()];
        if entry.version == self.version {
            entry.weight
        } else {
            f64::INFINITY
        }
    }

    fn set(&mut self, node: NodeIndex, weight: f64) {
        self.dist[node.index()] = DistEntry {
            weight,
            version: self.version,
        };
    }

    /// Run from `source`, skipping `avoid` and every node with a level other
    /// than 0, giving up once the minimum open weight exceeds `limit`.
    /// Clears and refills the goal slots.
    pub fn run(
        &mut self,
        g: &LevelGraph,
        source: NodeIndex,
        avoid: NodeIndex,
        limit: f64,
        goals: &mut [SearchGoal],
    ) {
        self.reset(g.num_nodes());
        for goal in goals.iter_mut() {
            goal.witness = None;
        }
        let mut open_goals = goals.len();

        self.set(source, 0.0);
        self.heap.push(HeapEntry {
            weight: 0.0,
            node: source,
        });

        while let Some(HeapEntry { weight, node }) = self.heap.pop() {
            if weight > self.get(node) {
                continue; // stale entry
            }
            if weight > limit {
                break;
            }
            for goal in goals.iter_mut() {
                if goal.node == node && goal.witness.is_none() {
                    goal.witness = Some(weight);
                    open_goals -= 1;
                }
            }
            if open_goals == 0 {
                break;
            }
            for cur in g.get_outgoing(node) {
                if cur.node == avoid || g.get_level(cur.node) != 0 {
                    continue;
                }
                let next = weight + cur.weight;
                if next < self.get(cur.node) {
                    self.set(cur.node, next);
                    self.heap.push(HeapEntry {
                        weight: next,
                        node: cur.node,
                    });
                }
            }
        }
    }
}
