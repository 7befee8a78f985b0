use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::geometry::{NodeOrigin, Waypoint, WaypointRole};
use crate::math::{Point2, TOLERANCE};
use crate::operations::tour::Tour;

/// Collapses straight, closely spaced runs of lattice waypoints.
///
/// Starting from an anchor, a run collects the following points that sit on
/// the anchor's horizontal or vertical line, keep moving away from it in the
/// same direction, and stay strictly closer than `max_gap`. Only the run's
/// last point is kept; it becomes the next anchor. The first and last points
/// of a route are always kept, as is every pinned point.
///
/// Simplifying an already simplified route changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSimplifier {
    /// Longest distance a run may span from its anchor (exclusive).
    #[serde(default = "default_max_gap")]
    pub max_gap: f64,
}

fn default_max_gap() -> f64 {
    10.0
}

impl Default for RouteSimplifier {
    fn default() -> Self {
        Self {
            max_gap: default_max_gap(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RunAxis {
    /// Constant y, moving along x.
    Horizontal,
    /// Constant x, moving along y.
    Vertical,
}

impl RunAxis {
    fn between(anchor: &Point2, p: &Point2) -> Option<Self> {
        if (p.y - anchor.y).abs() <= TOLERANCE && (p.x - anchor.x).abs() > TOLERANCE {
            Some(Self::Horizontal)
        } else if (p.x - anchor.x).abs() <= TOLERANCE && (p.y - anchor.y).abs() > TOLERANCE {
            Some(Self::Vertical)
        } else {
            None
        }
    }

    /// Signed offset of `p` from `anchor` along this axis, or `None` when
    /// `p` leaves the anchor's line.
    fn offset(self, anchor: &Point2, p: &Point2) -> Option<f64> {
        match self {
            Self::Horizontal if (p.y - anchor.y).abs() <= TOLERANCE => Some(p.x - anchor.x),
            Self::Vertical if (p.x - anchor.x).abs() <= TOLERANCE => Some(p.y - anchor.y),
            _ => None,
        }
    }
}

impl RouteSimplifier {
    #[must_use]
    pub fn new(max_gap: f64) -> Self {
        Self { max_gap }
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `max_gap` is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        ConfigError::require_non_negative("simplify.max_gap", self.max_gap)
    }

    /// Returns the simplified route.
    #[must_use]
    pub fn simplify(&self, route: &[Point2]) -> Vec<Point2> {
        let keep = self.keep_mask(route, &vec![false; route.len()]);
        route
            .iter()
            .zip(keep)
            .filter_map(|(p, k)| k.then_some(*p))
            .collect()
    }

    /// Marks which points survive simplification. `pinned[i]` forces point
    /// `i` to be kept and ends any run that reaches it.
    #[must_use]
    pub fn keep_mask(&self, route: &[Point2], pinned: &[bool]) -> Vec<bool> {
        let n = route.len();
        let mut keep = vec![false; n];
        if n == 0 {
            return keep;
        }
        keep[0] = true;

        let mut anchor = 0;
        while anchor + 1 < n {
            let end = self.run_end(route, pinned, anchor);
            keep[end] = true;
            anchor = end;
        }
        keep
    }

    /// Index of the last point of the run starting at `anchor`.
    fn run_end(&self, route: &[Point2], pinned: &[bool], anchor: usize) -> usize {
        let origin = route[anchor];
        let mut end = anchor + 1;
        let Some(axis) = RunAxis::between(&origin, &route[end]) else {
            return end;
        };
        let Some(first) = axis.offset(&origin, &route[end]) else {
            return end;
        };
        let direction = first.signum();
        let mut reach = first.abs();
        if reach >= self.max_gap {
            return end;
        }

        while end + 1 < route.len() && !pinned[end] {
            let Some(offset) = axis.offset(&origin, &route[end + 1]) else {
                break;
            };
            let along = offset * direction;
            if along <= reach || along >= self.max_gap {
                break;
            }
            reach = along;
            end += 1;
        }
        end
    }

    /// Tags every step of the drive path of `tour` with its role.
    ///
    /// Boundary nodes are pinned and tagged [`WaypointRole::Boundary`];
    /// lattice points that survive are [`WaypointRole::Structural`] and the
    /// rest [`WaypointRole::Interior`]. The structural waypoints, in order,
    /// are the simplified tour.
    #[must_use]
    pub fn tag(&self, tour: &Tour) -> Vec<Waypoint> {
        let points: Vec<Point2> = tour.path().iter().map(|s| s.point).collect();
        let pinned: Vec<bool> = tour
            .path()
            .iter()
            .map(|s| s.origin == NodeOrigin::Boundary)
            .collect();
        let keep = self.keep_mask(&points, &pinned);

        let waypoints: Vec<Waypoint> = points
            .iter()
            .zip(&pinned)
            .zip(&keep)
            .map(|((p, &pin), &kept)| {
                let role = if pin {
                    WaypointRole::Boundary
                } else if kept {
                    WaypointRole::Structural
                } else {
                    WaypointRole::Interior
                };
                Waypoint::new(*p, role)
            })
            .collect();

        debug!(
            input = waypoints.len(),
            kept = keep.iter().filter(|k| **k).count(),
            max_gap = self.max_gap,
            "simplified tour"
        );
        waypoints
    }
}

/// Simplifies `route` with the given `max_gap`.
#[must_use]
pub fn simplify(route: &[Point2], max_gap: f64) -> Vec<Point2> {
    RouteSimplifier::new(max_gap).simplify(route)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    /// Boustrophedon over a `cols` x `rows` unit lattice, closed.
    fn sweep(cols: i32, rows: i32) -> Vec<Point2> {
        let mut route = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let c = if r % 2 == 0 { c } else { cols - 1 - c };
                route.push(Point2::new(f64::from(c) + 0.5, f64::from(r) + 0.5));
            }
        }
        route.push(route[0]);
        route
    }

    #[test]
    fn zero_gap_keeps_everything() {
        let route = sweep(10, 10);
        assert_eq!(simplify(&route, 0.0), route);
    }

    #[test]
    fn straight_run_collapses_to_endpoints() {
        let route = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        assert_eq!(simplify(&route, 10.0), pts(&[(0.0, 0.0), (3.0, 0.0)]));
    }

    #[test]
    fn turns_are_kept() {
        let route = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (2.0, 2.0)]);
        assert_eq!(
            simplify(&route, 10.0),
            pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)])
        );
    }

    #[test]
    fn gap_limits_run_length() {
        let route = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)]);
        // Runs may span strictly less than 2.5 from their anchor.
        assert_eq!(
            simplify(&route, 2.5),
            pts(&[(0.0, 0.0), (2.0, 0.0), (4.0, 0.0)])
        );
    }

    #[test]
    fn reversal_ends_a_run() {
        let route = pts(&[(0.0, 0.0), (1.0, 0.0), (0.5, 0.0), (-3.0, 0.0)]);
        let once = simplify(&route, 10.0);
        assert_eq!(once, pts(&[(0.0, 0.0), (1.0, 0.0), (-3.0, 0.0)]));
        assert_eq!(simplify(&once, 10.0), once);
    }

    #[test]
    fn sweep_keeps_row_ends_only() {
        let route = sweep(10, 4);
        let simplified = simplify(&route, 100.0);
        assert_eq!(simplified.first(), route.first());
        assert_eq!(simplified.last(), route.last());
        // Two ends per row, plus the closing point.
        assert_eq!(simplified.len(), 9);
    }

    #[test]
    fn first_and_last_are_kept() {
        let route = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let s = simplify(&route, 10.0);
        assert_eq!(s.first(), Some(&Point2::new(0.0, 0.0)));
        assert_eq!(s.last(), Some(&Point2::new(2.0, 0.0)));
        assert_eq!(simplify(&route[..1], 10.0), route[..1].to_vec());
        assert!(simplify(&[], 10.0).is_empty());
    }

    #[test]
    fn pinned_points_survive() {
        let route = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        let keep = RouteSimplifier::new(10.0).keep_mask(&route, &[false, true, false, false]);
        assert_eq!(keep, vec![true, true, false, true]);
    }

    #[test]
    fn simplification_is_idempotent_on_random_lattice_walks() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..200 {
            let mut p = (0_i32, 0_i32);
            let mut route = vec![Point2::new(0.0, 0.0)];
            for _ in 0..rng.gen_range(1..60) {
                match rng.gen_range(0..4) {
                    0 => p.0 += 1,
                    1 => p.0 -= 1,
                    2 => p.1 += 1,
                    _ => p.1 -= 1,
                }
                route.push(Point2::new(f64::from(p.0) * 0.25, f64::from(p.1) * 0.3));
            }
            let gap = rng.gen_range(0.0..3.0);
            let once = simplify(&route, gap);
            assert!(once.len() <= route.len());
            assert_eq!(simplify(&once, gap), once);
        }
    }
}
