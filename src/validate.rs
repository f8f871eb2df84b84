//! Randomized correctness check: CH answers against plain Dijkstra.
//!
//! Builds a seeded random graph, prepares a copy, and compares the query
//! weight for random node pairs against Dijkstra on the original graph.
//! Weights are small integers, so matching results compare exactly.

use anyhow::Result;
use petgraph::graph::NodeIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dijkstra::shortest_path_weight;
use crate::graph::{EdgeFlags, LevelGraph};
use crate::prepare::ChPreparation;

#[derive(Debug)]
pub struct ValidationError {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub dijkstra_weight: Option<f64>,
    pub ch_weight: Option<f64>,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub n_queries: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub unreachable_both: usize,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn print(&self) {
        println!("\n=== VALIDATION RESULTS ===");
        println!("  Total queries:   {}", self.n_queries);
        println!(
            "  Correct:         {} ({:.2}%)",
            self.correct,
            self.correct as f64 * 100.0 / self.n_queries as f64
        );
        println!(
            "  Incorrect:       {} ({:.2}%)",
            self.incorrect,
            self.incorrect as f64 * 100.0 / self.n_queries as f64
        );
        println!("  Unreachable:     {}", self.unreachable_both);

        if !self.errors.is_empty() {
            println!("\n  Sample errors:");
            for err in &self.errors {
                println!(
                    "    {} → {}: Dijkstra={:?}, CH={:?}",
                    err.source.index(),
                    err.target.index(),
                    err.dijkstra_weight,
                    err.ch_weight
                );
            }
        }

        if self.incorrect == 0 {
            println!("\n  ✅ ALL QUERIES MATCHED");
        } else {
            println!("\n  ❌ VALIDATION FAILED");
        }
    }

    pub fn is_valid(&self) -> bool {
        self.incorrect == 0
    }
}

/// Random directed graph with integral weights; roughly 40% of the edges
/// are bidirectional, like a road network with its share of one-ways.
pub fn random_graph(n_nodes: usize, n_edges: usize, seed: u64) -> LevelGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = LevelGraph::with_nodes(n_nodes);
    if n_nodes < 2 {
        return g;
    }
    for _ in 0..n_edges {
        let from = rng.random_range(0..n_nodes);
        let to = rng.random_range(0..n_nodes);
        if from == to {
            continue;
        }
        let weight = rng.random_range(1..=10) as f64;
        let flags = if rng.random_bool(0.4) {
            EdgeFlags::BOTH
        } else {
            EdgeFlags::FORWARD
        };
        g.add_edge(NodeIndex::new(from), NodeIndex::new(to), weight, flags);
    }
    g
}

/// Prepare a seeded random graph and compare `n_queries` random pairs
/// against the Dijkstra baseline.
pub fn validate_random(
    n_nodes: usize,
    n_edges: usize,
    n_queries: usize,
    seed: u64,
) -> Result<ValidationResult> {
    anyhow::ensure!(n_nodes > 0, "validation needs at least one node");
    let original = random_graph(n_nodes, n_edges, seed);
    let mut prepared = original.clone();

    let mut prep = ChPreparation::new(&mut prepared);
    let stats = prep.do_work()?;
    println!(
        "Prepared random graph: {} nodes, {} edges, {} shortcuts",
        original.num_nodes(),
        original.num_edges(),
        stats.shortcuts_added
    );

    let query = prep.create_algo();
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    let mut result = ValidationResult {
        n_queries,
        correct: 0,
        incorrect: 0,
        unreachable_both: 0,
        errors: Vec::new(),
    };

    for i in 0..n_queries {
        let source = NodeIndex::new(rng.random_range(0..n_nodes));
        let target = NodeIndex::new(rng.random_range(0..n_nodes));

        let expected = shortest_path_weight(&original, source, target);
        let found = query.query(source, target).map(|route| route.weight);

        match (expected, found) {
            (None, None) => {
                result.unreachable_both += 1;
                result.correct += 1;
            }
            (Some(a), Some(b)) if a == b => result.correct += 1,
            (expected, found) => {
                result.incorrect += 1;
                if result.errors.len() < 10 {
                    result.errors.push(ValidationError {
                        source,
                        target,
                        dijkstra_weight: expected,
                        ch_weight: found,
                    });
                }
            }
        }

        if (i + 1) % 100 == 0 {
            println!(
                "  {}/{} queries, {} correct, {} incorrect",
                i + 1,
                n_queries,
                result.correct,
                result.incorrect
            );
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_graph_is_reproducible() {
        let a = random_graph(20, 40, 7);
        let b = random_graph(20, 40, 7);
        assert_eq!(a.num_nodes(), b.num_nodes());
        assert_eq!(a.num_edges(), b.num_edges());
        for edge in a.all_edges() {
            assert_eq!(a.edge_endpoints(edge), b.edge_endpoints(edge));
            assert_eq!(a.edge(edge).weight, b.edge(edge).weight);
            assert_eq!(a.edge(edge).flags, b.edge(edge).flags);
        }
    }

    #[test]
    fn small_random_graphs_validate_clean() {
        for seed in [1, 2, 3] {
            let result = validate_random(25, 60, 200, seed).expect("validation run");
            assert!(result.is_valid(), "seed {} failed: {:?}", seed, result.errors);
        }
    }
}
