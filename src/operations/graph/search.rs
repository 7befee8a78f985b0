use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::coverage_graph::CoverageGraph;

/// Heap entry for Dijkstra. Lower cost pops first; ties pop the lower index.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    node: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reusable Dijkstra buffers. Only touched entries are reset between runs.
#[derive(Debug, Clone)]
pub struct SearchScratch {
    dist: Vec<f64>,
    prev: Vec<usize>,
    touched: Vec<usize>,
    heap: BinaryHeap<Frontier>,
}

impl SearchScratch {
    /// Allocates buffers for a graph with `nodes` nodes.
    #[must_use]
    pub fn new(nodes: usize) -> Self {
        Self {
            dist: vec![f64::INFINITY; nodes],
            prev: vec![usize::MAX; nodes],
            touched: Vec::new(),
            heap: BinaryHeap::new(),
        }
    }

    fn reset(&mut self) {
        for &node in &self.touched {
            self.dist[node] = f64::INFINITY;
        }
        self.touched.clear();
        self.heap.clear();
    }

    fn relax(&mut self, node: usize, cost: f64, via: usize) {
        if cost < self.dist[node] {
            if self.dist[node].is_infinite() {
                self.touched.push(node);
            }
            self.dist[node] = cost;
            self.prev[node] = via;
            self.heap.push(Frontier { cost, node });
        }
    }

    /// Runs Dijkstra from `from` until `stop` accepts a popped node, returning
    /// that node and its path cost.
    fn search(
        &mut self,
        graph: &CoverageGraph,
        from: usize,
        mut stop: impl FnMut(usize) -> bool,
    ) -> Option<(usize, f64)> {
        self.reset();
        self.relax(from, 0.0, from);
        while let Some(Frontier { cost, node }) = self.heap.pop() {
            if cost > self.dist[node] {
                continue;
            }
            if stop(node) {
                return Some((node, cost));
            }
            for edge in graph.neighbors(node) {
                self.relax(edge.to, cost + edge.weight, node);
            }
        }
        None
    }
}

/// Finds the unvisited node with the cheapest edge path from `from`.
pub fn nearest_unvisited(
    graph: &CoverageGraph,
    from: usize,
    visited: &[bool],
    scratch: &mut SearchScratch,
) -> Option<(usize, f64)> {
    scratch.search(graph, from, |node| node != from && !visited[node])
}

/// Cheapest edge path cost from `from` to `to`, if one exists.
pub fn path_cost(
    graph: &CoverageGraph,
    from: usize,
    to: usize,
    scratch: &mut SearchScratch,
) -> Option<f64> {
    scratch
        .search(graph, from, |node| node == to)
        .map(|(_, cost)| cost)
}

/// Cheapest edge path from `from` to `to` as node indices, both ends
/// included.
pub fn shortest_path(
    graph: &CoverageGraph,
    from: usize,
    to: usize,
    scratch: &mut SearchScratch,
) -> Option<Vec<usize>> {
    scratch.search(graph, from, |node| node == to)?;
    let mut path = vec![to];
    let mut node = to;
    while node != from {
        node = scratch.prev[node];
        path.push(node);
    }
    path.reverse();
    Some(path)
}

/// Cost of the tour leg `from → to`: the direct edge when present, the
/// cheapest edge path otherwise, or a straight transit when unreachable.
pub fn leg_cost(
    graph: &CoverageGraph,
    from: usize,
    to: usize,
    scratch: &mut SearchScratch,
) -> f64 {
    if from == to {
        return 0.0;
    }
    if let Some(weight) = graph.weight(from, to) {
        return weight;
    }
    path_cost(graph, from, to, scratch).unwrap_or_else(|| graph.transit_cost(from, to))
}
