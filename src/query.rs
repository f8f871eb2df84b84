//! Bidirectional query over a prepared level graph.
//!
//! Both searches only relax edges toward strictly higher levels; the search
//! stops once neither frontier can undercut the best meeting weight found
//! so far. Shortcut edges on the result are expanded back to original
//! edges by recursively following their skipped-edge pointer and looking
//! the second half up in the graph. The edge filter, the termination rule,
//! the path reconstruction and the weight inversion are plain function
//! fields, so a consumer can swap any of them without a type hierarchy.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use petgraph::graph::{EdgeIndex, NodeIndex};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::dijkstra::HeapItem;
use crate::graph::LevelGraph;

/// Edge admission hook shared by the two searches.
pub type EdgeFilter = fn(&LevelGraph, NodeIndex, NodeIndex) -> bool;

/// Termination hook: given each direction's minimum open weight (None once
/// that direction drained) and the best meeting weight so far, decides
/// whether the search may stop.
pub type TerminationOverride = fn(Option<f64>, Option<f64>, f64) -> bool;

/// Path-reconstruction hook: expands one graph edge, traversed starting at
/// the given node, into original edges.
pub type PathReconstructor = fn(&LevelGraph, EdgeIndex, NodeIndex, &mut Vec<EdgeIndex>);

/// Hook turning the stored weight back into a caller-facing distance.
pub type WeightInverter = fn(f64) -> f64;

fn upward_only(g: &LevelGraph, from: NodeIndex, to: NodeIndex) -> bool {
    g.get_level(to) > g.get_level(from)
}

/// Stop once neither frontier can undercut the best meeting weight; a
/// drained direction only leaves the other side's bound to check.
fn frontiers_exhausted(forward_min: Option<f64>, backward_min: Option<f64>, best: f64) -> bool {
    forward_min.map_or(true, |w| w >= best) && backward_min.map_or(true, |w| w >= best)
}

fn identity(weight: f64) -> f64 {
    weight
}

/// Default reconstruction: expands one graph edge, traversed starting at
/// `from`, into original edges. Shortcuts descend through their skipped
/// half; the other half is found in the graph by weight.
fn unpack_edge(g: &LevelGraph, edge: EdgeIndex, from: NodeIndex, out: &mut Vec<EdgeIndex>) {
    let data = *g.edge(edge);
    let Some(skipped) = data.skipped_edge else {
        out.push(edge);
        return;
    };

    let to = g.other_endpoint(edge, from);
    let (stored_from, _) = g.edge_endpoints(edge);
    // the skipped half always hangs off the stored source node
    let middle = g.other_endpoint(skipped, stored_from);
    let skipped_weight = g.edge(skipped).weight;

    if from == stored_from {
        unpack_edge(g, skipped, from, out);
        match find_half(g, middle, to, data.weight - skipped_weight) {
            Some(half) => unpack_edge(g, half, middle, out),
            None => trace!(
                middle = middle.index(),
                to = to.index(),
                "missing second half while unpacking shortcut"
            ),
        }
        return;
    }

    // traversed against the stored orientation; the recorded middle serves
    // the reverse direction when its halves carry the same weights
    let first = find_half(g, from, middle, data.weight - skipped_weight)
        .filter(|&half| g.edge(half).weight + skipped_weight == data.weight);
    if let Some(half) = first {
        unpack_edge(g, half, from, out);
        unpack_edge(g, skipped, middle, out);
        return;
    }

    // the opposite-direction twin of a merged shortcut may run through a
    // different middle; recover its two halves by weight
    let mut best_pair = None;
    let mut best_diff = f64::INFINITY;
    for cur in g.get_outgoing(from) {
        if cur.edge == edge {
            continue;
        }
        if let Some(half) = find_half(g, cur.node, to, data.weight - cur.weight) {
            if half == edge {
                continue;
            }
            let diff = (cur.weight + g.edge(half).weight - data.weight).abs();
            if diff < best_diff {
                best_diff = diff;
                best_pair = Some((cur.edge, cur.node, half));
            }
        }
    }
    match best_pair {
        Some((first, via, second)) => {
            unpack_edge(g, first, from, out);
            unpack_edge(g, second, via, out);
        }
        None => trace!(
            from = from.index(),
            to = to.index(),
            "no matching halves while unpacking reversed shortcut"
        ),
    }
}

/// Traversable edge from `from` to `to` whose weight is closest to `want`.
fn find_half(g: &LevelGraph, from: NodeIndex, to: NodeIndex, want: f64) -> Option<EdgeIndex> {
    g.get_outgoing(from)
        .filter(|cur| cur.node == to)
        .min_by(|a, b| {
            (a.weight - want)
                .abs()
                .partial_cmp(&(b.weight - want).abs())
                .unwrap_or(Ordering::Equal)
        })
        .map(|cur| cur.edge)
}

/// A found route over the prepared graph.
#[derive(Debug, Clone)]
pub struct Route {
    /// Summed travel weight, as stored on the edges.
    pub weight: f64,
    /// The weight passed through the inverter (identity by default).
    pub distance: f64,
    /// Visited nodes, endpoints included.
    pub nodes: Vec<NodeIndex>,
    /// Original (non-shortcut) edges in travel order.
    pub edges: Vec<EdgeIndex>,
}

/// Per-direction search state.
struct SearchSide {
    dist: FxHashMap<NodeIndex, f64>,
    prev: FxHashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
    heap: BinaryHeap<HeapItem>,
}

impl SearchSide {
    fn new(start: NodeIndex) -> Self {
        let mut side = SearchSide {
            dist: FxHashMap::default(),
            prev: FxHashMap::default(),
            heap: BinaryHeap::new(),
        };
        side.dist.insert(start, 0.0);
        side.heap.push(HeapItem {
            weight: 0.0,
            node: start,
        });
        side
    }

    fn min_open(&self) -> Option<f64> {
        self.heap.peek().map(|item| item.weight)
    }

    fn pop_settled(&mut self) -> Option<(NodeIndex, f64)> {
        while let Some(HeapItem { weight, node }) = self.heap.pop() {
            if weight > *self.dist.get(&node).unwrap_or(&f64::INFINITY) {
                continue; // stale entry
            }
            return Some((node, weight));
        }
        None
    }

    fn relax(&mut self, from: NodeIndex, edge: EdgeIndex, to: NodeIndex, weight: f64) {
        if weight < *self.dist.get(&to).unwrap_or(&f64::INFINITY) {
            self.dist.insert(to, weight);
            self.prev.insert(to, (from, edge));
            self.heap.push(HeapItem { weight, node: to });
        }
    }
}

/// Query executor configured for a prepared graph.
pub struct ChQuery<'a> {
    g: &'a LevelGraph,
    edge_filter: EdgeFilter,
    termination: TerminationOverride,
    path_reconstructor: PathReconstructor,
    invert_weight: WeightInverter,
}

impl<'a> ChQuery<'a> {
    pub fn new(g: &'a LevelGraph) -> Self {
        ChQuery {
            g,
            edge_filter: upward_only,
            termination: frontiers_exhausted,
            path_reconstructor: unpack_edge,
            invert_weight: identity,
        }
    }

    /// Replaces the level-based edge filter.
    pub fn with_edge_filter(mut self, filter: EdgeFilter) -> Self {
        self.edge_filter = filter;
        self
    }

    /// Replaces the frontier-vs-best termination rule.
    pub fn with_termination(mut self, termination: TerminationOverride) -> Self {
        self.termination = termination;
        self
    }

    /// Replaces the recursive shortcut expansion.
    pub fn with_path_reconstructor(mut self, reconstructor: PathReconstructor) -> Self {
        self.path_reconstructor = reconstructor;
        self
    }

    /// Replaces the identity weight inversion, e.g. to report travel time
    /// when the stored weight is a speed-scaled distance.
    pub fn with_weight_inverter(mut self, invert: WeightInverter) -> Self {
        self.invert_weight = invert;
        self
    }

    /// Shortest route between two nodes, or None when no path exists.
    pub fn query(&self, from: NodeIndex, to: NodeIndex) -> Option<Route> {
        let n = self.g.num_nodes();
        if from.index() >= n || to.index() >= n {
            return None;
        }
        if from == to {
            return Some(Route {
                weight: 0.0,
                distance: (self.invert_weight)(0.0),
                nodes: vec![from],
                edges: Vec::new(),
            });
        }

        let mut fwd = SearchSide::new(from);
        let mut bwd = SearchSide::new(to);
        let mut best: Option<(f64, NodeIndex)> = None;

        loop {
            let f_min = fwd.min_open();
            let b_min = bwd.min_open();
            if f_min.is_none() && b_min.is_none() {
                break;
            }
            if let Some((best_weight, _)) = best {
                if (self.termination)(f_min, b_min, best_weight) {
                    break;
                }
            }

            if let Some((node, weight)) = fwd.pop_settled() {
                if let Some(&other) = bwd.dist.get(&node) {
                    let total = weight + other;
                    if best.map_or(true, |(w, _)| total < w) {
                        best = Some((total, node));
                    }
                }
                for cur in self.g.get_outgoing(node) {
                    if !(self.edge_filter)(self.g, node, cur.node) {
                        continue;
                    }
                    fwd.relax(node, cur.edge, cur.node, weight + cur.weight);
                }
            }

            if let Some((node, weight)) = bwd.pop_settled() {
                if let Some(&other) = fwd.dist.get(&node) {
                    let total = weight + other;
                    if best.map_or(true, |(w, _)| total < w) {
                        best = Some((total, node));
                    }
                }
                for cur in self.g.get_incoming(node) {
                    if !(self.edge_filter)(self.g, node, cur.node) {
                        continue;
                    }
                    bwd.relax(node, cur.edge, cur.node, weight + cur.weight);
                }
            }
        }

        let (best_weight, meeting_node) = best?;

        // graph edges source -> meeting point, then meeting point -> target
        let mut edges = Vec::new();
        let mut chain = Vec::new();
        let mut current = meeting_node;
        while current != from {
            match fwd.prev.get(&current) {
                Some(&(prev, edge)) => {
                    chain.push((prev, edge));
                    current = prev;
                }
                None => break,
            }
        }
        for &(prev, edge) in chain.iter().rev() {
            (self.path_reconstructor)(self.g, edge, prev, &mut edges);
        }
        current = meeting_node;
        while current != to {
            match bwd.prev.get(&current) {
                Some(&(next, edge)) => {
                    (self.path_reconstructor)(self.g, edge, current, &mut edges);
                    current = next;
                }
                None => break,
            }
        }

        let mut nodes = vec![from];
        let mut at = from;
        for &edge in &edges {
            at = self.g.other_endpoint(edge, at);
            nodes.push(at);
        }

        Some(Route {
            weight: best_weight,
            distance: (self.invert_weight)(best_weight),
            nodes,
            edges,
        })
    }
}
