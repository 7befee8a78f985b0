use std::collections::VecDeque;

use crate::error::{GraphError, Result};
use crate::geometry::NodeOrigin;
use crate::math::distance_2d::distance;
use crate::math::Point2;

/// Direction of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Left/right neighbours (same y).
    Horizontal,
    /// Up/down neighbours (same x).
    Vertical,
    /// Straight connection off the lattice, joining a node that has no
    /// lattice neighbour to the rest of the graph.
    Link,
}

/// Half of an undirected edge, stored on each endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: usize,
    pub weight: f64,
    pub axis: Axis,
}

/// A graph node: a planar point and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphNode {
    pub point: Point2,
    pub origin: NodeOrigin,
}

/// Connected-component breakdown of a [`CoverageGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connectivity {
    /// Total number of components, isolated nodes included.
    pub components: usize,
    /// Components that contain at least one edge.
    pub linked_components: usize,
    /// Nodes without any edge.
    pub isolated: usize,
}

/// Undirected weighted graph over coverage points.
///
/// The graph is simple: [`CoverageGraph::add_edge`] ignores self-loops and
/// repeated edges. Nodes without edges are legal; tours reach them by a
/// straight transit leg costed at [`CoverageGraph::transit_weight`] per unit
/// length.
#[derive(Debug, Clone)]
pub struct CoverageGraph {
    nodes: Vec<GraphNode>,
    adjacency: Vec<Vec<Edge>>,
    edge_count: usize,
    transit_weight: f64,
}

impl CoverageGraph {
    /// Creates an empty graph with the given transit cost multiplier.
    #[must_use]
    pub fn new(transit_weight: f64) -> Self {
        Self {
            nodes: Vec::new(),
            adjacency: Vec::new(),
            edge_count: 0,
            transit_weight,
        }
    }

    /// Adds a node and returns its index.
    pub fn add_node(&mut self, point: Point2, origin: NodeOrigin) -> usize {
        self.nodes.push(GraphNode { point, origin });
        self.adjacency.push(Vec::new());
        self.nodes.len() - 1
    }

    /// Adds the undirected edge `a-b`. Returns `false` when it already
    /// exists or would be a self-loop.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64, axis: Axis) -> bool {
        if a == b || self.weight(a, b).is_some() {
            return false;
        }
        self.adjacency[a].push(Edge {
            to: b,
            weight,
            axis,
        });
        self.adjacency[b].push(Edge {
            to: a,
            weight,
            axis,
        });
        self.edge_count += 1;
        true
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Node at `index`.
    #[must_use]
    pub fn node(&self, index: usize) -> &GraphNode {
        &self.nodes[index]
    }

    /// All nodes in index order.
    #[must_use]
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Edges leaving `index`.
    #[must_use]
    pub fn neighbors(&self, index: usize) -> &[Edge] {
        &self.adjacency[index]
    }

    /// Number of edges at `index`.
    #[must_use]
    pub fn degree(&self, index: usize) -> usize {
        self.adjacency[index].len()
    }

    /// Weight of edge `a-b`, if present.
    #[must_use]
    pub fn weight(&self, a: usize, b: usize) -> Option<f64> {
        self.adjacency[a]
            .iter()
            .find(|e| e.to == b)
            .map(|e| e.weight)
    }

    /// Cost multiplier for straight legs that do not follow an edge.
    #[must_use]
    pub fn transit_weight(&self) -> f64 {
        self.transit_weight
    }

    /// Cost of driving straight from `a` to `b` outside the edge set.
    #[must_use]
    pub fn transit_cost(&self, a: usize, b: usize) -> f64 {
        distance(&self.nodes[a].point, &self.nodes[b].point) * self.transit_weight
    }

    /// Labels every node with its component index (breadth-first, in node
    /// order).
    #[must_use]
    pub fn component_labels(&self) -> Vec<usize> {
        let mut labels = vec![usize::MAX; self.nodes.len()];
        let mut queue = VecDeque::new();
        let mut next = 0;
        for start in 0..self.nodes.len() {
            if labels[start] != usize::MAX {
                continue;
            }
            labels[start] = next;
            queue.push_back(start);
            while let Some(node) = queue.pop_front() {
                for edge in &self.adjacency[node] {
                    if labels[edge.to] == usize::MAX {
                        labels[edge.to] = next;
                        queue.push_back(edge.to);
                    }
                }
            }
            next += 1;
        }
        labels
    }

    /// Summarises the component structure.
    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        let labels = self.component_labels();
        let components = labels.iter().max().map_or(0, |m| m + 1);
        let mut linked = vec![false; components];
        let mut isolated = 0;
        for (node, &label) in labels.iter().enumerate() {
            if self.adjacency[node].is_empty() {
                isolated += 1;
            } else {
                linked[label] = true;
            }
        }
        Connectivity {
            components,
            linked_components: linked.iter().filter(|l| **l).count(),
            isolated,
        }
    }

    /// Fails when no closed tour can be built over the graph.
    ///
    /// Isolated nodes are tolerated. A graph with two or more nodes and no
    /// edges, or with more than one linked component, is disconnected.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::Disconnected`.
    pub fn ensure_connected(&self) -> Result<()> {
        let nodes = self.node_count();
        if nodes < 2 {
            return Ok(());
        }
        let summary = self.connectivity();
        if self.edge_count == 0 || summary.linked_components > 1 {
            return Err(GraphError::Disconnected {
                nodes,
                components: summary.components,
            }
            .into());
        }
        Ok(())
    }
}
