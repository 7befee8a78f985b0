use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::coverage_graph::{Axis, CoverageGraph};
use crate::error::{ConfigError, GraphError, Result};
use crate::geometry::{Clearance, FootprintSpec, NodeOrigin, PointSet};
use crate::math::distance_2d::distance;
use crate::math::Point2;

/// Per-axis cost multipliers for lattice edges.
///
/// A larger multiplier makes that direction more expensive, so tours prefer
/// to run along the cheaper axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalBias {
    /// Multiplier for vertical edges.
    pub up_down: f64,
    /// Multiplier for horizontal edges.
    pub left_right: f64,
}

impl DirectionalBias {
    /// Creates a validated bias.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` unless both multipliers are positive.
    pub fn new(up_down: f64, left_right: f64) -> Result<Self> {
        let bias = Self {
            up_down,
            left_right,
        };
        bias.validate()?;
        Ok(bias)
    }

    /// Checks both multipliers are finite and positive.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the offending multiplier.
    pub fn validate(&self) -> Result<()> {
        ConfigError::require_positive("bias.up_down", self.up_down)?;
        ConfigError::require_positive("bias.left_right", self.left_right)
    }

    /// Multiplier for edges along `axis`.
    #[must_use]
    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.left_right,
            Axis::Vertical => self.up_down,
            Axis::Link => self.transit(),
        }
    }

    /// Multiplier for straight legs that follow no edge.
    #[must_use]
    pub fn transit(&self) -> f64 {
        self.up_down.max(self.left_right)
    }
}

impl Default for DirectionalBias {
    fn default() -> Self {
        Self {
            up_down: 1.0,
            left_right: 1.0,
        }
    }
}

/// Links tried per detached part of the graph.
const LINKS_PER_PART: usize = 2;
/// Nearest attachment candidates considered per detached node.
const LINK_CANDIDATES: usize = 8;

/// Connects lattice neighbours of a [`PointSet`] into a [`CoverageGraph`].
///
/// Each point is joined to the points exactly one step away along either
/// axis. Edge weight is the Euclidean length times the axis multiplier.
/// Node indices match the point set's insertion order.
#[derive(Debug, Clone, Copy)]
pub struct CoverageGraphBuilder {
    footprint: FootprintSpec,
    bias: DirectionalBias,
}

impl CoverageGraphBuilder {
    #[must_use]
    pub fn new(footprint: FootprintSpec, bias: DirectionalBias) -> Self {
        Self { footprint, bias }
    }

    /// Builds the graph from lattice adjacency alone.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Invalid` if the footprint or bias is not positive
    /// - `GraphError::Disconnected` if two or more points yield no edge at all
    pub fn build(&self, points: &PointSet) -> Result<CoverageGraph> {
        self.assemble(points, None)
    }

    /// Builds the graph keeping only edges that `clearance` allows, then
    /// attaches every node outside the main component with up to two
    /// straight [`Axis::Link`] edges to its nearest main-component nodes.
    ///
    /// The main component is the one holding the most lattice points. Link
    /// weight is length times the transit multiplier.
    ///
    /// # Errors
    ///
    /// Same as [`CoverageGraphBuilder::build`].
    pub fn build_within(&self, points: &PointSet, clearance: &Clearance) -> Result<CoverageGraph> {
        self.assemble(points, Some(clearance))
    }

    fn assemble(&self, points: &PointSet, clearance: Option<&Clearance>) -> Result<CoverageGraph> {
        self.footprint.validate()?;
        self.bias.validate()?;

        let mut graph = CoverageGraph::new(self.bias.transit());
        for (point, origin) in points.iter() {
            graph.add_node(point, origin);
        }

        let step_x = self.footprint.step_x();
        let step_y = self.footprint.step_y();
        let probes = [
            (step_x, 0.0, Axis::Horizontal),
            (-step_x, 0.0, Axis::Horizontal),
            (0.0, step_y, Axis::Vertical),
            (0.0, -step_y, Axis::Vertical),
        ];

        let mut blocked = 0;
        for (i, p) in points.points().iter().enumerate() {
            for &(dx, dy, axis) in &probes {
                let Some(j) = points.index_of(&Point2::new(p.x + dx, p.y + dy)) else {
                    continue;
                };
                if graph.weight(i, j).is_some() {
                    continue;
                }
                let q = points.points()[j];
                if clearance.is_some_and(|c| !c.is_clear(p, &q)) {
                    blocked += 1;
                    continue;
                }
                graph.add_edge(i, j, distance(p, &q) * self.bias.along(axis), axis);
            }
        }

        let links = clearance.map_or(0, |c| link_detached(&mut graph, c, self.bias.transit()));

        if graph.node_count() > 1 && graph.edge_count() == 0 {
            return Err(GraphError::Disconnected {
                nodes: graph.node_count(),
                components: graph.node_count(),
            }
            .into());
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            blocked,
            links,
            "built coverage graph"
        );
        Ok(graph)
    }
}

/// Adds clear links from every component other than the main one towards
/// the main component. Returns the number of links added.
fn link_detached(graph: &mut CoverageGraph, clearance: &Clearance, weight: f64) -> usize {
    let labels = graph.component_labels();
    let components = labels.iter().max().map_or(0, |m| m + 1);
    let mut lattice = vec![0_usize; components];
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); components];
    for (node, &label) in labels.iter().enumerate() {
        if graph.node(node).origin == NodeOrigin::Lattice {
            lattice[label] += 1;
        }
        members[label].push(node);
    }
    let Some(main) = (0..components).max_by(|&a, &b| lattice[a].cmp(&lattice[b]).then(b.cmp(&a)))
    else {
        return 0;
    };

    let mut added = 0;
    for (label, part) in members.iter().enumerate() {
        if label == main {
            continue;
        }
        let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
        for &from in part {
            let p = graph.node(from).point;
            let mut near: Vec<(f64, usize)> = members[main]
                .iter()
                .map(|&to| (distance(&p, &graph.node(to).point), to))
                .collect();
            let keep = LINK_CANDIDATES.min(near.len());
            if keep == 0 {
                continue;
            }
            near.select_nth_unstable_by(keep - 1, |a, b| {
                a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
            });
            near.truncate(keep);
            candidates.extend(near.into_iter().map(|(d, to)| (d, from, to)));
        }
        candidates.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        let mut linked = 0;
        for (length, from, to) in candidates {
            if linked == LINKS_PER_PART {
                break;
            }
            let (a, b) = (graph.node(from).point, graph.node(to).point);
            if clearance.is_clear(&a, &b) && graph.add_edge(from, to, length * weight, Axis::Link) {
                linked += 1;
            }
        }
        if linked == 0 {
            warn!(nodes = part.len(), "no clear link for a detached part of the graph");
        }
        added += linked;
    }
    added
}
