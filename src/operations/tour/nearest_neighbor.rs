use super::TourStrategy;
use crate::operations::graph::{nearest_unvisited, CoverageGraph, SearchScratch};

/// Greedy tour: from node 0, repeatedly moves to the cheapest unvisited node.
///
/// Candidates reached through edges are costed by shortest edge path.
/// Isolated nodes, and every node once the current component is exhausted,
/// compete by straight transit cost. Ties go to the lower node index.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborTour;

impl TourStrategy for NearestNeighborTour {
    fn name(&self) -> &'static str {
        "nearest-neighbor"
    }

    fn order(&self, graph: &CoverageGraph) -> Vec<usize> {
        let n = graph.node_count();
        if n == 0 {
            return Vec::new();
        }

        let isolated: Vec<usize> = (0..n).filter(|&i| graph.degree(i) == 0).collect();
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut scratch = SearchScratch::new(n);

        let mut current = 0;
        visited[current] = true;
        order.push(current);

        while order.len() < n {
            let by_edges = if graph.degree(current) > 0 {
                nearest_unvisited(graph, current, &visited, &mut scratch)
            } else {
                None
            };

            let by_transit = if by_edges.is_none() {
                nearest_by_transit(graph, current, &visited, 0..n)
            } else {
                nearest_by_transit(graph, current, &visited, isolated.iter().copied())
            };

            let next = match (by_edges, by_transit) {
                (Some(a), Some(b)) => {
                    if b.1.total_cmp(&a.1).then(b.0.cmp(&a.0)).is_lt() {
                        b.0
                    } else {
                        a.0
                    }
                }
                (Some(a), None) => a.0,
                (None, Some(b)) => b.0,
                (None, None) => break,
            };

            visited[next] = true;
            order.push(next);
            current = next;
        }
        order
    }
}

fn nearest_by_transit(
    graph: &CoverageGraph,
    from: usize,
    visited: &[bool],
    candidates: impl Iterator<Item = usize>,
) -> Option<(usize, f64)> {
    candidates
        .filter(|&c| !visited[c])
        .map(|c| (c, graph.transit_cost(from, c)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::NodeOrigin;
    use crate::math::Point2;
    use crate::operations::graph::Axis;

    #[test]
    fn walks_a_line_in_order() {
        let mut g = CoverageGraph::new(1.0);
        for i in 0..5 {
            g.add_node(Point2::new(f64::from(i), 0.0), NodeOrigin::Lattice);
        }
        for i in 1..5 {
            g.add_edge(i - 1, i, 1.0, Axis::Horizontal);
        }
        assert_eq!(NearestNeighborTour.order(&g), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn picks_up_isolated_nodes_by_transit() {
        let mut g = CoverageGraph::new(1.0);
        for i in 0..4 {
            g.add_node(Point2::new(f64::from(i), 0.0), NodeOrigin::Lattice);
        }
        for i in 1..4 {
            g.add_edge(i - 1, i, 1.0, Axis::Horizontal);
        }
        // Closer to node 1 by transit than node 2 is by edges from node 1.
        let island = g.add_node(Point2::new(1.0, 0.5), NodeOrigin::Boundary);
        let order = NearestNeighborTour.order(&g);
        assert_eq!(order.len(), 5);
        assert_eq!(order[..3], [0, 1, island]);
    }

    #[test]
    fn edgeless_graph_falls_back_to_transit() {
        let mut g = CoverageGraph::new(1.0);
        g.add_node(Point2::new(0.0, 0.0), NodeOrigin::Lattice);
        g.add_node(Point2::new(5.0, 0.0), NodeOrigin::Lattice);
        g.add_node(Point2::new(1.0, 0.0), NodeOrigin::Lattice);
        assert_eq!(NearestNeighborTour.order(&g), vec![0, 2, 1]);
    }
}
