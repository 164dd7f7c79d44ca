/*
 * This module defines the directed multigraph the topology builder produces.
 * It also provides lookups, identity relabeling and JSON export for the graph.
 */

pub mod node;
pub mod edge;
pub mod topology_graph;

pub use topology_graph::{EdgeView, GraphError, TopologyGraph};
