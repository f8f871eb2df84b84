//! Plain-text edge-list loader for the CLI.
//!
//! One edge per line: `from to weight [both]`. Node ids are dense
//! non-negative integers; lines starting with `#` are skipped.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use petgraph::graph::NodeIndex;

use crate::graph::{EdgeFlags, LevelGraph};

pub fn parse_edge_list<P: AsRef<Path>>(path: P) -> Result<LevelGraph> {
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.as_ref().display()))?;
    parse_edge_list_str(&text)
}

pub fn parse_edge_list_str(text: &str) -> Result<LevelGraph> {
    let mut edges: Vec<(usize, usize, f64, EdgeFlags)> = Vec::new();
    let mut max_node = 0usize;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();

        let from: usize = parts
            .next()
            .with_context(|| format!("line {}: missing source node", lineno + 1))?
            .parse()
            .with_context(|| format!("line {}: bad source node", lineno + 1))?;
        let to: usize = parts
            .next()
            .with_context(|| format!("line {}: missing target node", lineno + 1))?
            .parse()
            .with_context(|| format!("line {}: bad target node", lineno + 1))?;
        let weight: f64 = parts
            .next()
            .with_context(|| format!("line {}: missing weight", lineno + 1))?
            .parse()
            .with_context(|| format!("line {}: bad weight", lineno + 1))?;
        if weight < 0.0 {
            bail!("line {}: negative weight {}", lineno + 1, weight);
        }

        let flags = match parts.next() {
            None => EdgeFlags::FORWARD,
            Some("both") => EdgeFlags::BOTH,
            Some(other) => bail!("line {}: unknown direction marker '{}'", lineno + 1, other),
        };

        max_node = max_node.max(from).max(to);
        edges.push((from, to, weight, flags));
    }

    let n_nodes = if edges.is_empty() { 0 } else { max_node + 1 };
    let mut g = LevelGraph::with_nodes(n_nodes);
    for (from, to, weight, flags) in edges {
        g.add_edge(NodeIndex::new(from), NodeIndex::new(to), weight, flags);
    }
    Ok(g)
}
