use tracing::debug;

use super::nearest_neighbor::NearestNeighborTour;
use super::TourStrategy;
use crate::operations::graph::{leg_cost, CoverageGraph, SearchScratch};

/// Smallest cost reduction accepted as an improvement.
const MIN_GAIN: f64 = 1e-9;

/// Nearest-neighbour tour refined by edge-restricted 2-opt.
///
/// A move replaces legs `(a, b)` and `(c, d)` with `(a, c)` and `(b, d)` by
/// reversing the stretch between them. Only moves whose new legs are both
/// graph edges are considered, so candidates come from each node's neighbour
/// list. Refinement stops after a pass without improvement or after
/// `max_passes` passes.
#[derive(Debug, Clone, Copy)]
pub struct TwoOptTour {
    max_passes: usize,
}

impl TwoOptTour {
    #[must_use]
    pub fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }
}

impl Default for TwoOptTour {
    fn default() -> Self {
        Self::new(50)
    }
}

impl TourStrategy for TwoOptTour {
    fn name(&self) -> &'static str {
        "two-opt"
    }

    fn order(&self, graph: &CoverageGraph) -> Vec<usize> {
        let mut order = NearestNeighborTour.order(graph);
        improve(graph, &mut order, self.max_passes);
        order
    }
}

/// Applies 2-opt moves to `order` in place. Returns the number of moves.
pub(crate) fn improve(graph: &CoverageGraph, order: &mut [usize], max_passes: usize) -> usize {
    let n = order.len();
    if n < 4 {
        return 0;
    }

    let mut pos = vec![0; graph.node_count()];
    for (k, &node) in order.iter().enumerate() {
        pos[node] = k;
    }
    let mut scratch = SearchScratch::new(graph.node_count());
    let mut legs: Vec<f64> = (0..n)
        .map(|k| leg_cost(graph, order[k], order[(k + 1) % n], &mut scratch))
        .collect();

    let mut moves = 0;
    for pass in 0..max_passes {
        let mut improved = false;
        for i in 0..n {
            let a = order[i];
            let b = order[(i + 1) % n];
            for edge in graph.neighbors(a) {
                if edge.to == b {
                    continue;
                }
                let j = pos[edge.to];
                let (lo, hi) = if i < j { (i, j) } else { (j, i) };
                if lo + 1 >= hi || (lo == 0 && hi == n - 1) {
                    continue;
                }

                let p = order[lo];
                let q = order[lo + 1];
                let r = order[hi];
                let s = order[(hi + 1) % n];
                let (Some(first), Some(second)) = (graph.weight(p, r), graph.weight(q, s)) else {
                    continue;
                };
                if legs[lo] + legs[hi] - first - second <= MIN_GAIN {
                    continue;
                }

                order[lo + 1..=hi].reverse();
                legs[lo + 1..hi].reverse();
                legs[lo] = first;
                legs[hi] = second;
                for (k, &node) in order.iter().enumerate().take(hi + 1).skip(lo + 1) {
                    pos[node] = k;
                }
                moves += 1;
                improved = true;
                break;
            }
        }
        if !improved {
            debug!(passes = pass + 1, moves, "2-opt converged");
            return moves;
        }
    }
    debug!(passes = max_passes, moves, "2-opt pass limit reached");
    moves
}
