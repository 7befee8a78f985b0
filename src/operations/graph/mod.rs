mod builder;
mod coverage_graph;
mod search;

pub use builder::{CoverageGraphBuilder, DirectionalBias};
pub use coverage_graph::{Axis, Connectivity, CoverageGraph, Edge, GraphNode};
pub use search::{leg_cost, nearest_unvisited, path_cost, shortest_path, SearchScratch};
