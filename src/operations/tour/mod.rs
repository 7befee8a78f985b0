mod nearest_neighbor;
mod two_opt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use nearest_neighbor::NearestNeighborTour;
pub use two_opt::TwoOptTour;

use crate::error::Result;
use crate::geometry::NodeOrigin;
use crate::math::Point2;
use crate::operations::graph::{leg_cost, shortest_path, CoverageGraph, SearchScratch};

/// A heuristic that orders the nodes of a [`CoverageGraph`] into a cycle.
///
/// Implementations return every node index exactly once, starting anywhere,
/// without the closing repeat. They must be deterministic for a given graph.
pub trait TourStrategy {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Visiting order over all nodes of `graph`.
    fn order(&self, graph: &CoverageGraph) -> Vec<usize>;
}

/// Built-in tour heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TourMethod {
    NearestNeighbor,
    TwoOpt,
}

/// Tour solver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourSettings {
    #[serde(default = "default_method")]
    pub method: TourMethod,
    /// Upper bound on 2-opt improvement passes.
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
}

impl Default for TourSettings {
    fn default() -> Self {
        Self {
            method: default_method(),
            max_passes: default_max_passes(),
        }
    }
}

fn default_method() -> TourMethod {
    TourMethod::TwoOpt
}
fn default_max_passes() -> usize {
    50
}

/// One stop on the drive path of a [`Tour`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveStep {
    pub node: usize,
    pub point: Point2,
    pub origin: NodeOrigin,
    /// `false` when the node is only driven through on the way to the next
    /// visit.
    pub visit: bool,
}

/// Closed tour over a coverage graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    order: Vec<usize>,
    points: Vec<Point2>,
    origins: Vec<NodeOrigin>,
    path: Vec<DriveStep>,
    cost: f64,
}

impl Tour {
    fn empty() -> Self {
        Self {
            order: Vec::new(),
            points: Vec::new(),
            origins: Vec::new(),
            path: Vec::new(),
            cost: 0.0,
        }
    }

    /// Node indices in visiting order, closed.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Visited points, closed: the first point is repeated at the end.
    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Origin of each entry of [`Tour::points`].
    #[must_use]
    pub fn origins(&self) -> &[NodeOrigin] {
        &self.origins
    }

    /// Closed drive path: the visits plus every node passed through between
    /// visits that are not adjacent in the graph.
    #[must_use]
    pub fn path(&self) -> &[DriveStep] {
        &self.path
    }

    /// Total leg cost, closing leg included.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Number of distinct nodes visited.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Restarts the cycle at `node`. Cost and drive path are unchanged up to
    /// rotation. Returns `false` if the tour does not visit `node`.
    pub fn rotate_to(&mut self, node: usize) -> bool {
        let Some(k) = self.order.iter().position(|&n| n == node) else {
            return false;
        };
        let Some(at) = self.path.iter().position(|s| s.visit && s.node == node) else {
            return false;
        };
        self.order = rotate_closed(&self.order, k);
        self.path = rotate_closed(&self.path, at);
        self.points = rotate_closed(&self.points, k);
        self.origins = rotate_closed(&self.origins, k);
        true
    }
}

/// Rotates a closed sequence (last element equal to the first) to start at
/// index `k`, keeping it closed.
fn rotate_closed<T: Copy>(closed: &[T], k: usize) -> Vec<T> {
    let open = closed.len().saturating_sub(1);
    let mut out = Vec::with_capacity(closed.len());
    out.extend_from_slice(&closed[k..open]);
    out.extend_from_slice(&closed[..=k]);
    out
}

fn step(graph: &CoverageGraph, node: usize, visit: bool) -> DriveStep {
    let n = graph.node(node);
    DriveStep {
        node,
        point: n.point,
        origin: n.origin,
        visit,
    }
}

/// Expands a closed visiting order into its drive path, following the
/// cheapest edge path across every leg that has no direct edge.
fn drive_path(
    graph: &CoverageGraph,
    order: &[usize],
    scratch: &mut SearchScratch,
) -> Vec<DriveStep> {
    let Some(&first) = order.first() else {
        return Vec::new();
    };
    let mut path = vec![step(graph, first, true)];
    let mut straight = 0_usize;
    for w in order.windows(2) {
        let (from, to) = (w[0], w[1]);
        if from != to && graph.weight(from, to).is_none() {
            match shortest_path(graph, from, to, scratch) {
                Some(hops) => {
                    let inner = hops.len().saturating_sub(1);
                    path.extend(hops[1..inner].iter().map(|&n| step(graph, n, false)));
                }
                None => straight += 1,
            }
        }
        path.push(step(graph, to, true));
    }
    if straight > 0 {
        warn!(legs = straight, "tour legs with no edge path, driving straight");
    }
    path
}

/// Computes approximate closed tours using a replaceable [`TourStrategy`].
pub struct TourSolver {
    strategy: Box<dyn TourStrategy + Send + Sync>,
}

impl TourSolver {
    /// Creates a solver around `strategy`.
    #[must_use]
    pub fn new(strategy: Box<dyn TourStrategy + Send + Sync>) -> Self {
        Self { strategy }
    }

    /// Creates a solver from configuration.
    #[must_use]
    pub fn from_settings(settings: &TourSettings) -> Self {
        match settings.method {
            TourMethod::NearestNeighbor => Self::new(Box::new(NearestNeighborTour)),
            TourMethod::TwoOpt => Self::new(Box::new(TwoOptTour::new(settings.max_passes))),
        }
    }

    /// Solves the tour.
    ///
    /// An empty graph yields an empty tour; a single node yields a one-point
    /// loop.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::Disconnected` if the linked part of the graph
    /// falls apart.
    pub fn solve(&self, graph: &CoverageGraph) -> Result<Tour> {
        match graph.node_count() {
            0 => return Ok(Tour::empty()),
            1 => {
                let node = graph.node(0);
                return Ok(Tour {
                    order: vec![0, 0],
                    points: vec![node.point, node.point],
                    origins: vec![node.origin, node.origin],
                    path: vec![step(graph, 0, true), step(graph, 0, true)],
                    cost: 0.0,
                });
            }
            _ => {}
        }
        graph.ensure_connected()?;

        let mut order = self.strategy.order(graph);
        debug_assert_eq!(order.len(), graph.node_count());
        if let Some(&first) = order.first() {
            order.push(first);
        }

        let mut scratch = SearchScratch::new(graph.node_count());
        let cost = order
            .windows(2)
            .map(|w| leg_cost(graph, w[0], w[1], &mut scratch))
            .sum();

        let path = drive_path(graph, &order, &mut scratch);

        let tour = Tour {
            points: order.iter().map(|&i| graph.node(i).point).collect(),
            origins: order.iter().map(|&i| graph.node(i).origin).collect(),
            order,
            path,
            cost,
        };
        info!(
            strategy = self.strategy.name(),
            nodes = tour.node_count(),
            steps = tour.path.len(),
            cost = tour.cost,
            "solved tour"
        );
        Ok(tour)
    }
}

impl Default for TourSolver {
    fn default() -> Self {
        Self::from_settings(&TourSettings::default())
    }
}

impl std::fmt::Debug for TourSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TourSolver")
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::error::GraphError;
    use crate::geometry::{Clearance, FootprintSpec, GridKey, KeySpace, PointSet, Ring};
    use crate::operations::graph::{Axis, CoverageGraphBuilder, DirectionalBias};
    use crate::operations::quantize::quantise;
    use crate::MowpathError;

    fn grid_graph(size: f64, bias: DirectionalBias) -> (PointSet, CoverageGraph) {
        let fp = FootprintSpec::new(1.0, 1.0, 1.0).unwrap();
        let ring = Ring::rectangle(Point2::new(0.0, 0.0), Point2::new(size, size)).unwrap();
        let points = quantise(&ring, fp, &[]).unwrap();
        let graph = CoverageGraphBuilder::new(fp, bias).build(&points).unwrap();
        (points, graph)
    }

    fn keys(space: &KeySpace, pts: &[Point2]) -> Vec<GridKey> {
        pts.iter().map(|p| space.key(p)).collect()
    }

    #[test]
    fn grid_tour_visits_every_node_once() {
        let (points, graph) = grid_graph(10.0, DirectionalBias::default());
        let tour = TourSolver::default().solve(&graph).unwrap();

        assert_eq!(tour.points().len(), 101);
        assert_eq!(tour.points().first(), tour.points().last());
        assert_eq!(tour.node_count(), 100);

        let visited = keys(points.space(), &tour.points()[..100]);
        let unique: HashSet<_> = visited.iter().collect();
        assert_eq!(unique.len(), 100);
        for p in points.points() {
            assert!(unique.contains(&points.space().key(p)));
        }
    }

    #[test]
    fn grid_tour_cost_is_near_optimal() {
        // An even grid has a Hamiltonian cycle of cost 100.
        let (_, graph) = grid_graph(10.0, DirectionalBias::default());
        let tour = TourSolver::default().solve(&graph).unwrap();
        assert!(tour.cost() >= 100.0 - 1e-9);
        assert!(tour.cost() < 140.0, "cost {}", tour.cost());
    }

    #[test]
    fn two_opt_never_worse_than_greedy() {
        let bias = DirectionalBias::new(1.0, 1.5).unwrap();
        let (_, graph) = grid_graph(8.0, bias);
        let greedy = TourSolver::new(Box::new(NearestNeighborTour))
            .solve(&graph)
            .unwrap();
        let refined = TourSolver::new(Box::new(TwoOptTour::default()))
            .solve(&graph)
            .unwrap();
        assert!(refined.cost() <= greedy.cost() + 1e-9);
    }

    #[test]
    fn solving_is_deterministic() {
        let bias = DirectionalBias::new(1.5, 1.0).unwrap();
        let (_, graph) = grid_graph(7.0, bias);
        let solver = TourSolver::default();
        assert_eq!(solver.solve(&graph).unwrap(), solver.solve(&graph).unwrap());
    }

    #[test]
    fn trivial_graphs() {
        let solver = TourSolver::default();
        let empty = CoverageGraph::new(1.0);
        assert!(solver.solve(&empty).unwrap().is_empty());

        let mut single = CoverageGraph::new(1.0);
        single.add_node(Point2::new(2.0, 3.0), NodeOrigin::Lattice);
        let tour = solver.solve(&single).unwrap();
        assert_eq!(tour.points(), &[Point2::new(2.0, 3.0), Point2::new(2.0, 3.0)]);
        assert_eq!(tour.node_count(), 1);
    }

    #[test]
    fn disconnected_graph_fails_fast() {
        let mut g = CoverageGraph::new(1.0);
        for x in [0.0, 1.0, 10.0, 11.0] {
            g.add_node(Point2::new(x, 0.0), NodeOrigin::Lattice);
        }
        g.add_edge(0, 1, 1.0, Axis::Horizontal);
        g.add_edge(2, 3, 1.0, Axis::Horizontal);
        let err = TourSolver::default().solve(&g).unwrap_err();
        assert!(matches!(
            err,
            MowpathError::Graph(GraphError::Disconnected { components: 2, .. })
        ));
    }

    #[test]
    fn isolated_boundary_nodes_are_visited() {
        let (mut points, _) = grid_graph(4.0, DirectionalBias::default());
        points.insert_boundary(Point2::new(2.0, 2.0));
        points.insert_boundary(Point2::new(0.1, 3.9));
        let fp = FootprintSpec::new(1.0, 1.0, 1.0).unwrap();
        let graph = CoverageGraphBuilder::new(fp, DirectionalBias::default())
            .build(&points)
            .unwrap();
        let tour = TourSolver::default().solve(&graph).unwrap();
        assert_eq!(tour.node_count(), 18);
        let boundary = tour.origins()[..18]
            .iter()
            .filter(|o| **o == NodeOrigin::Boundary)
            .count();
        assert_eq!(boundary, 2);
    }

    #[test]
    fn drive_path_only_follows_edges() {
        let fp = FootprintSpec::new(1.0, 1.0, 1.0).unwrap();
        let perimeter = Ring::rectangle(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0)).unwrap();
        let zone = Ring::rectangle(Point2::new(3.0, 3.0), Point2::new(7.0, 7.0)).unwrap();
        let mut points = quantise(&perimeter, fp, std::slice::from_ref(&zone)).unwrap();
        for p in zone.vertices() {
            points.insert_boundary(*p);
        }
        let clearance = Clearance::new(&perimeter, &[zone]);
        let graph = CoverageGraphBuilder::new(fp, DirectionalBias::default())
            .build_within(&points, &clearance)
            .unwrap();

        let tour = TourSolver::default().solve(&graph).unwrap();
        let path = tour.path();
        assert_eq!(path.first(), path.last());
        assert_eq!(path.iter().filter(|s| s.visit).count(), tour.points().len());
        for w in path.windows(2) {
            assert!(
                graph.weight(w[0].node, w[1].node).is_some(),
                "{:?} -> {:?} is not an edge",
                w[0].point,
                w[1].point
            );
        }
    }

    #[test]
    fn rotation_keeps_the_cycle() {
        let (_, graph) = grid_graph(6.0, DirectionalBias::default());
        let tour = TourSolver::default().solve(&graph).unwrap();
        let mut rotated = tour.clone();
        assert!(rotated.rotate_to(17));
        assert!(!rotated.rotate_to(99));

        assert_eq!(rotated.order().first(), Some(&17));
        assert_eq!(rotated.order().last(), Some(&17));
        assert_eq!(rotated.path().first().map(|s| s.node), Some(17));
        assert_eq!(rotated.path().last().map(|s| s.node), Some(17));
        assert_eq!(rotated.cost(), tour.cost());
        assert_eq!(rotated.path().len(), tour.path().len());

        let before: HashSet<_> = tour.order().iter().collect();
        let after: HashSet<_> = rotated.order().iter().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn settings_select_strategy() {
        let nn = TourSolver::from_settings(&TourSettings {
            method: TourMethod::NearestNeighbor,
            max_passes: 0,
        });
        assert!(format!("{nn:?}").contains("nearest-neighbor"));
        assert!(format!("{:?}", TourSolver::default()).contains("two-opt"));
    }
}
