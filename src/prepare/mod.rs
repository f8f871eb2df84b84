//! Contraction hierarchy preparation.
//!
//! Assigns every node a level and inserts shortcut edges so that a
//! bidirectional query which only relaxes edges toward higher levels still
//! returns exact shortest paths. Nodes are contracted in ascending priority
//! order; the priority of the polled node is re-validated lazily, the
//! priorities of its neighbors are refreshed after every contraction, and
//! every other update epoch all remaining nodes are re-prioritized.

pub mod queue;
pub mod witness;

use std::time::Instant;

use anyhow::{bail, Result};
use petgraph::graph::{EdgeIndex, NodeIndex};
use rustc_hash::FxHashSet;
use tracing::info;

use crate::graph::{EdgeFlags, LevelGraph};
use crate::query::ChQuery;

use self::queue::NodeQueue;
use self::witness::{SearchGoal, WitnessSearch};

/// Coefficients of the linear combination behind the node priority.
///
/// The original-edges term dominates on purpose: weighting it high is what
/// keeps shortcut counts from exploding on large road networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityCoeffs {
    pub edge_difference: i32,
    pub original_edges: i32,
    pub contracted_neighbors: i32,
}

impl Default for PriorityCoeffs {
    fn default() -> Self {
        PriorityCoeffs {
            edge_difference: 10,
            original_edges: 50,
            contracted_neighbors: 1,
        }
    }
}

/// A shortcut candidate produced by the synthesis step.
#[derive(Debug, Clone, Copy)]
pub struct Shortcut {
    pub from: NodeIndex,
    pub to: NodeIndex,
    pub weight: f64,
    pub flags: EdgeFlags,
    /// The incoming half u -> v the shortcut stands in for.
    pub skipped_edge: EdgeIndex,
    /// Sum of the original-edge counts of both halves.
    pub original_edges: u32,
}

/// Per-edge count of original edges an edge stands in for, grown on demand.
/// Heuristic bookkeeping only; query correctness never depends on it.
#[derive(Debug, Default)]
struct OrigEdgeCounts {
    counts: Vec<u32>,
}

impl OrigEdgeCounts {
    fn set(&mut self, edge: EdgeIndex, n: u32) {
        if self.counts.len() <= edge.index() {
            self.counts.resize(edge.index() + 1, 0);
        }
        self.counts[edge.index()] = n;
    }

    fn get(&self, edge: EdgeIndex) -> u32 {
        self.counts.get(edge.index()).copied().unwrap_or(0)
    }
}

/// Summary of a preparation run.
#[derive(Debug, Clone)]
pub struct PrepareStats {
    pub nodes_contracted: usize,
    pub shortcuts_added: usize,
    pub full_updates: usize,
    pub duration_ms: u64,
}

/// Owns the transient preparation state and borrows the graph it mutates.
/// The graph must not be observed by readers until `do_work` returns.
pub struct ChPreparation<'a> {
    g: &'a mut LevelGraph,
    coeffs: PriorityCoeffs,
    orig_edges: OrigEdgeCounts,
    queue: NodeQueue,
    priorities: Vec<i32>,
    witness: WitnessSearch,
    shortcuts: Vec<Shortcut>,
    goals: Vec<SearchGoal>,
    prepared: bool,
}

impl<'a> ChPreparation<'a> {
    pub fn new(g: &'a mut LevelGraph) -> Self {
        let n = g.num_nodes();
        ChPreparation {
            g,
            coeffs: PriorityCoeffs::default(),
            orig_edges: OrigEdgeCounts::default(),
            queue: NodeQueue::new(),
            priorities: vec![0; n],
            witness: WitnessSearch::new(),
            shortcuts: Vec::new(),
            goals: Vec::new(),
            prepared: false,
        }
    }

    pub fn with_coeffs(mut self, coeffs: PriorityCoeffs) -> Self {
        self.coeffs = coeffs;
        self
    }

    /// Runs edge preparation, node prioritization and the contraction loop.
    /// A graph can be prepared once; calling this a second time is an error.
    pub fn do_work(&mut self) -> Result<PrepareStats> {
        if self.prepared {
            bail!("preparation already ran on this graph");
        }
        self.prepared = true;

        let start = Instant::now();
        let mut stats = PrepareStats {
            nodes_contracted: 0,
            shortcuts_added: 0,
            full_updates: 0,
            duration_ms: 0,
        };

        if self.prepare_edges() && self.prepare_nodes() {
            stats = self.contract_nodes();
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            nodes = stats.nodes_contracted,
            shortcuts = stats.shortcuts_added,
            duration_ms = stats.duration_ms,
            "preparation finished"
        );
        Ok(stats)
    }

    /// Query executor over the prepared graph.
    pub fn create_algo(&self) -> ChQuery<'_> {
        ChQuery::new(self.g)
    }

    pub fn graph(&self) -> &LevelGraph {
        self.g
    }

    /// Original-edge count of an edge (1 for input edges, summed for shortcuts).
    pub fn orig_edge_count(&self, edge: EdgeIndex) -> u32 {
        self.orig_edges.get(edge)
    }

    /// Seeds the original-edge count of every input edge with 1.
    /// Returns false when the graph has no edges.
    fn prepare_edges(&mut self) -> bool {
        let Self { g, orig_edges, .. } = self;
        let mut empty = true;
        for edge in g.all_edges() {
            orig_edges.set(edge, 1);
            empty = false;
        }
        !empty
    }

    /// Computes the initial priority of every node and fills the queue.
    fn prepare_nodes(&mut self) -> bool {
        let n = self.g.num_nodes();
        for i in 0..n {
            let node = NodeIndex::new(i);
            let priority = self.calculate_priority(node);
            self.priorities[i] = priority;
            self.queue.insert(node, priority);
        }
        !self.queue.is_empty()
    }

    fn contract_nodes(&mut self) -> PrepareStats {
        let mut level = 1;
        let mut shortcuts_added = 0usize;
        let mut full_updates = 0usize;
        let update_interval = (self.queue.len() / 10).max(10);
        let mut update_epoch = 0usize;
        let mut step = 0usize;

        while !self.queue.is_empty() {
            if step % update_interval == 0 {
                // periodically refresh the priorities of all remaining nodes
                if update_epoch > 0 && update_epoch % 2 == 0 {
                    self.update_all_priorities();
                    full_updates += 1;
                }
                update_epoch += 1;
                info!(
                    step,
                    nodes = self.queue.len(),
                    shortcuts = shortcuts_added,
                    "contracting"
                );
            }
            step += 1;

            let Some(node) = self.queue.poll_min_key() else {
                break;
            };

            // lazy re-validation: the polled priority may be stale
            let priority = self.calculate_priority(node);
            self.priorities[node.index()] = priority;
            if let Some(min) = self.queue.peek_min_priority() {
                if priority > min {
                    // node got less attractive, contract a different one first
                    self.queue.insert(node, priority);
                    continue;
                }
            }

            shortcuts_added += self.add_shortcuts(node);
            self.g.set_level(node, level);
            level += 1;

            let mut neighbors = FxHashSet::default();
            for cur in self.g.get_edges(node) {
                if self.g.get_level(cur.node) == 0 {
                    neighbors.insert(cur.node);
                }
            }
            for neighbor in neighbors {
                let old = self.priorities[neighbor.index()];
                let new = self.calculate_priority(neighbor);
                if new != old {
                    self.priorities[neighbor.index()] = new;
                    self.queue.update(neighbor, old, new);
                }
            }
        }

        PrepareStats {
            nodes_contracted: (level - 1) as usize,
            shortcuts_added,
            full_updates,
            duration_ms: 0,
        }
    }

    fn update_all_priorities(&mut self) {
        let n = self.g.num_nodes();
        for i in 0..n {
            let node = NodeIndex::new(i);
            if self.g.get_level(node) != 0 {
                continue;
            }
            let old = self.priorities[i];
            let new = self.calculate_priority(node);
            self.priorities[i] = new;
            self.queue.update(node, old, new);
        }
    }

    /// Priority of an uncontracted node, without changing the graph.
    ///
    /// Must not depend on the node's own cached priority, or the lazy
    /// re-validation in the contraction loop could cycle forever.
    fn calculate_priority(&mut self, node: NodeIndex) -> i32 {
        self.find_shortcuts(node);

        let degree = self.g.degree(node) as i32;
        let edge_difference = self.shortcuts.len() as i32 - degree;

        let original_edges: u32 = self.shortcuts.iter().map(|sc| sc.original_edges).sum();

        // connections to already-contracted neighbors, a uniformity bonus
        let contracted_neighbors = self
            .g
            .get_edges(node)
            .filter(|cur| cur.skipped_edge.is_some())
            .count() as i32;

        self.coeffs.edge_difference * edge_difference
            + self.coeffs.original_edges * original_edges as i32
            + self.coeffs.contracted_neighbors * contracted_neighbors
    }

    /// Computes the shortcuts required to bypass `node` into the reusable
    /// scratch collection. Does not touch the graph or the edge counts.
    fn find_shortcuts(&mut self, node: NodeIndex) {
        let Self {
            g,
            orig_edges,
            witness,
            shortcuts,
            goals,
            ..
        } = self;
        let g: &LevelGraph = &**g;
        shortcuts.clear();

        for inc in g.get_incoming(node) {
            let u = inc.node;
            if g.get_level(u) != 0 {
                continue;
            }
            let u_v_weight = inc.weight;

            goals.clear();
            let mut max_weight = 0.0f64;
            for out in g.get_outgoing(node) {
                let w = out.node;
                if w == u || g.get_level(w) != 0 {
                    continue;
                }
                let via_weight = u_v_weight + out.weight;
                goals.push(SearchGoal {
                    node: w,
                    via_weight,
                    orig_edges: orig_edges.get(out.edge),
                    witness: None,
                });
                if via_weight > max_weight {
                    max_weight = via_weight;
                }
            }
            if goals.is_empty() {
                continue;
            }

            witness.run(g, u, node, max_weight, goals);

            let u_orig_edges = orig_edges.get(inc.edge);
            'goals: for goal in goals.iter() {
                if let Some(found) = goal.witness {
                    if found <= goal.via_weight {
                        // a witness path dominates, no shortcut needed
                        continue;
                    }
                }
                // every node ends up on its own level, so shortcuts start
                // one-way; an equal-weight twin in the opposite direction
                // collapses into a single bidirectional shortcut
                for sc in shortcuts.iter_mut() {
                    if sc.weight == goal.via_weight {
                        if sc.from == u && sc.to == goal.node {
                            continue 'goals;
                        }
                        if sc.from == goal.node && sc.to == u {
                            sc.flags = EdgeFlags::BOTH;
                            continue 'goals;
                        }
                    }
                }
                shortcuts.push(Shortcut {
                    from: u,
                    to: goal.node,
                    weight: goal.via_weight,
                    flags: EdgeFlags::FORWARD,
                    skipped_edge: inc.edge,
                    original_edges: u_orig_edges + goal.orig_edges,
                });
            }
        }
    }

    /// Materializes the shortcuts for `node` into the graph. Returns how
    /// many new edges were inserted; in-place overwrites are not counted.
    fn add_shortcuts(&mut self, node: NodeIndex) -> usize {
        self.find_shortcuts(node);
        let mut added = 0;

        for i in 0..self.shortcuts.len() {
            let sc = self.shortcuts[i];

            // an existing dominated shortcut u -> w can be updated in place
            let existing = self
                .g
                .get_outgoing(sc.from)
                .find(|cur| {
                    cur.node == sc.to
                        && cur.skipped_edge.is_some()
                        && cur.flags.can_overwrite(sc.flags)
                        && cur.weight > sc.weight
                })
                .map(|cur| cur.edge);

            if let Some(edge) = existing {
                let data = self.g.edge_mut(edge);
                data.weight = sc.weight;
                data.flags = sc.flags;
                data.skipped_edge = Some(sc.skipped_edge);
                self.orig_edges.set(edge, sc.original_edges);
            } else {
                let edge = self.g.add_edge(sc.from, sc.to, sc.weight, sc.flags);
                self.g.edge_mut(edge).skipped_edge = Some(sc.skipped_edge);
                self.orig_edges.set(edge, sc.original_edges);
                added += 1;
            }
        }
        added
    }
}
