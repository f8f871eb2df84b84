//! Mutable level graph - the storage the preparation writes into.
//!
//! Every node carries a contraction level (0 = uncontracted). Every edge
//! carries a travel weight, direction flags relative to its stored
//! orientation, and, on shortcuts, a pointer to one of the two halves the
//! shortcut stands in for. Edge ids are stable for the lifetime of the
//! graph; edges are never removed.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

/// Direction flags of an edge, relative to its stored (from, to) orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeFlags(u8);

impl EdgeFlags {
    pub const FORWARD: EdgeFlags = EdgeFlags(0b01);
    pub const BACKWARD: EdgeFlags = EdgeFlags(0b10);
    pub const BOTH: EdgeFlags = EdgeFlags(0b11);

    pub fn is_forward(self) -> bool {
        self.0 & 0b01 != 0
    }

    pub fn is_backward(self) -> bool {
        self.0 & 0b10 != 0
    }

    pub fn is_both(self) -> bool {
        self.0 == 0b11
    }

    /// Whether this edge's flags may be replaced in place by `new`.
    /// `new` must cover every direction the edge already serves.
    pub fn can_overwrite(self, new: EdgeFlags) -> bool {
        new.is_both() || new == self
    }
}

/// Payload stored on every edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EdgeData {
    pub weight: f64,
    pub flags: EdgeFlags,
    /// Set on shortcuts: the half hanging off the stored source node. The
    /// other half is recovered from the graph during unpacking.
    pub skipped_edge: Option<EdgeIndex>,
}

impl EdgeData {
    pub fn is_shortcut(&self) -> bool {
        self.skipped_edge.is_some()
    }
}

/// One adjacency element: the edge id, the endpoint on the far side of the
/// traversal, and a copy of the edge payload.
#[derive(Debug, Clone, Copy)]
pub struct EdgeCursor {
    pub edge: EdgeIndex,
    pub node: NodeIndex,
    pub weight: f64,
    pub flags: EdgeFlags,
    pub skipped_edge: Option<EdgeIndex>,
}

impl EdgeCursor {
    fn new(edge: EdgeIndex, node: NodeIndex, data: &EdgeData) -> Self {
        EdgeCursor {
            edge,
            node,
            weight: data.weight,
            flags: data.flags,
            skipped_edge: data.skipped_edge,
        }
    }
}

/// Directed multigraph with per-node contraction levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelGraph {
    g: Graph<i32, EdgeData>,
}

impl Default for LevelGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelGraph {
    pub fn new() -> Self {
        LevelGraph { g: Graph::new() }
    }

    pub fn with_nodes(n: usize) -> Self {
        let mut g = Graph::with_capacity(n, n * 2);
        for _ in 0..n {
            g.add_node(0);
        }
        LevelGraph { g }
    }

    pub fn add_node(&mut self) -> NodeIndex {
        self.g.add_node(0)
    }

    pub fn num_nodes(&self) -> usize {
        self.g.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.g.edge_count()
    }

    pub fn get_level(&self, node: NodeIndex) -> i32 {
        self.g[node]
    }

    pub fn set_level(&mut self, node: NodeIndex, level: i32) {
        self.g[node] = level;
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, weight: f64, flags: EdgeFlags) -> EdgeIndex {
        self.g.add_edge(
            from,
            to,
            EdgeData {
                weight,
                flags,
                skipped_edge: None,
            },
        )
    }

    pub fn edge(&self, edge: EdgeIndex) -> &EdgeData {
        &self.g[edge]
    }

    pub fn edge_mut(&mut self, edge: EdgeIndex) -> &mut EdgeData {
        &mut self.g[edge]
    }

    pub fn edge_endpoints(&self, edge: EdgeIndex) -> (NodeIndex, NodeIndex) {
        self.g.edge_endpoints(edge).expect("edge id out of range")
    }

    pub fn other_endpoint(&self, edge: EdgeIndex, node: NodeIndex) -> NodeIndex {
        let (a, b) = self.edge_endpoints(edge);
        if a == node {
            b
        } else {
            a
        }
    }

    pub fn all_edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.g.edge_indices()
    }

    /// Edges traversable leaving `node`.
    pub fn get_outgoing(&self, node: NodeIndex) -> impl Iterator<Item = EdgeCursor> + '_ {
        let forward = self
            .g
            .edges_directed(node, Direction::Outgoing)
            .filter(|e| e.weight().flags.is_forward())
            .map(|e| EdgeCursor::new(e.id(), e.target(), e.weight()));
        let reversed = self
            .g
            .edges_directed(node, Direction::Incoming)
            .filter(|e| e.weight().flags.is_backward())
            .map(|e| EdgeCursor::new(e.id(), e.source(), e.weight()));
        forward.chain(reversed)
    }

    /// Edges traversable arriving at `node`; the cursor exposes the far
    /// endpoint the traversal comes from.
    pub fn get_incoming(&self, node: NodeIndex) -> impl Iterator<Item = EdgeCursor> + '_ {
        let forward = self
            .g
            .edges_directed(node, Direction::Incoming)
            .filter(|e| e.weight().flags.is_forward())
            .map(|e| EdgeCursor::new(e.id(), e.source(), e.weight()));
        let reversed = self
            .g
            .edges_directed(node, Direction::Outgoing)
            .filter(|e| e.weight().flags.is_backward())
            .map(|e| EdgeCursor::new(e.id(), e.target(), e.weight()));
        forward.chain(reversed)
    }

    /// Every incident edge once, regardless of direction.
    pub fn get_edges(&self, node: NodeIndex) -> impl Iterator<Item = EdgeCursor> + '_ {
        self.g
            .edges_directed(node, Direction::Outgoing)
            .map(|e| EdgeCursor::new(e.id(), e.target(), e.weight()))
            .chain(
                self.g
                    .edges_directed(node, Direction::Incoming)
                    .map(|e| EdgeCursor::new(e.id(), e.source(), e.weight())),
            )
    }

    /// Count of incident edges, each stored edge counted once.
    pub fn degree(&self, node: NodeIndex) -> usize {
        self.g.edges_directed(node, Direction::Outgoing).count()
            + self.g.edges_directed(node, Direction::Incoming).count()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.as_ref().display()))?;
        bincode::serialize_into(BufWriter::new(file), self).context("failed to serialize graph")?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .with_context(|| format!("failed to open {}", path.as_ref().display()))?;
        bincode::deserialize_from(BufReader::new(file)).context("failed to deserialize graph")
    }
}
