//! Butterfly-CH: contraction hierarchy preparation and routing
//!
//! Pipeline:
//! - Load or build a level graph (every node starts uncontracted at level 0)
//! - Preparation: priority-ordered node contraction with witness searches,
//!   inserting shortcut edges and assigning each node its level
//! - Query: bidirectional upward search over the prepared graph, with
//!   recursive shortcut unpacking back to original edges
//!
//! Preparation is single-threaded and owns the graph for its duration; the
//! prepared graph is read-only afterwards and can be persisted.

pub mod cli;
pub mod dijkstra;
pub mod graph;
pub mod parse;
pub mod prepare;
pub mod query;
pub mod validate;

pub use graph::{EdgeCursor, EdgeData, EdgeFlags, LevelGraph};
pub use prepare::{ChPreparation, PrepareStats, PriorityCoeffs, Shortcut};
pub use query::{ChQuery, EdgeFilter, PathReconstructor, Route, TerminationOverride, WeightInverter};
