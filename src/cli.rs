//! CLI commands for butterfly-ch

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use petgraph::graph::NodeIndex;

use crate::graph::LevelGraph;
use crate::parse::parse_edge_list;
use crate::prepare::ChPreparation;
use crate::query::ChQuery;
use crate::validate;

#[derive(Parser)]
#[command(name = "butterfly-ch")]
#[command(about = "Contraction hierarchy preparation and routing", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prepare a contraction hierarchy from an edge list
    Prepare {
        /// Input edge-list file (`from to weight [both]` per line)
        input: PathBuf,
        /// Output prepared-graph file
        output: PathBuf,
    },
    /// Find a route on a prepared graph
    Route {
        /// Prepared-graph file written by `prepare`
        graph: PathBuf,
        /// Source node id
        #[arg(long)]
        from: usize,
        /// Target node id
        #[arg(long)]
        to: usize,
    },
    /// Check CH answers against plain Dijkstra on random graphs
    Validate {
        #[arg(long, default_value = "200")]
        nodes: usize,
        #[arg(long, default_value = "600")]
        edges: usize,
        #[arg(long, default_value = "1000")]
        queries: usize,
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Prepare { input, output } => run_prepare(input, output),
        Commands::Route { graph, from, to } => run_route(graph, from, to),
        Commands::Validate {
            nodes,
            edges,
            queries,
            seed,
        } => run_validate(nodes, edges, queries, seed),
    }
}

fn run_prepare(input: PathBuf, output: PathBuf) -> Result<()> {
    let mut g = parse_edge_list(&input)?;
    println!("Loaded graph: {} nodes, {} edges", g.num_nodes(), g.num_edges());

    let stats = {
        let mut prep = ChPreparation::new(&mut g);
        prep.do_work()?
    };
    println!(
        "  ✓ {} nodes contracted, {} shortcuts, {} full updates in {} ms",
        stats.nodes_contracted, stats.shortcuts_added, stats.full_updates, stats.duration_ms
    );

    g.save(&output)?;
    println!("  ✓ Written {}", output.display());
    Ok(())
}

fn run_route(graph: PathBuf, from: usize, to: usize) -> Result<()> {
    let g = LevelGraph::load(&graph)?;
    let query = ChQuery::new(&g);

    match query.query(NodeIndex::new(from), NodeIndex::new(to)) {
        Some(route) => {
            println!("Route {} → {}: weight {}", from, to, route.weight);
            let nodes: Vec<String> = route.nodes.iter().map(|n| n.index().to_string()).collect();
            println!("  via {}", nodes.join(" → "));
        }
        None => println!("No route from {} to {}", from, to),
    }
    Ok(())
}

fn run_validate(nodes: usize, edges: usize, queries: usize, seed: u64) -> Result<()> {
    let result = validate::validate_random(nodes, edges, queries, seed)?;
    result.print();
    if !result.is_valid() {
        bail!("{} of {} queries disagreed with Dijkstra", result.incorrect, result.n_queries);
    }
    Ok(())
}
