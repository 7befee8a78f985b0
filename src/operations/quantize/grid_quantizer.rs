use geo::{Contains, Intersects, Polygon};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::geometry::{FootprintSpec, KeySpace, PointSet, Ring};
use crate::math::polygon_2d::Aabb2;
use crate::math::Point2;

/// Upper bound on candidate lattice cells for a single quantisation.
pub const MAX_LATTICE_CELLS: usize = 50_000_000;

/// Samples the interior of a ring on a regular lattice of footprint-sized
/// cells, dropping cells inside any exclusion zone.
///
/// Cell centers start at `min + footprint / 2` and step `width * overlap`
/// horizontally and `height` vertically across the ring's bounding box.
/// A center is kept when it lies strictly inside the ring and does not touch
/// any exclusion zone.
#[derive(Debug, Clone, Copy)]
pub struct GridQuantizer {
    footprint: FootprintSpec,
}

impl GridQuantizer {
    /// Creates a quantiser for the given footprint.
    #[must_use]
    pub fn new(footprint: FootprintSpec) -> Self {
        Self { footprint }
    }

    /// Executes the quantisation, returning the kept cell centers.
    ///
    /// Rows are tested in parallel and merged in row order, so the result is
    /// identical across runs.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Invalid` if the footprint is not positive
    /// - `GeometryError::LatticeTooLarge` if the lattice would exceed
    ///   [`MAX_LATTICE_CELLS`]
    #[allow(clippy::cast_precision_loss)]
    pub fn execute(&self, ring: &Ring, exclusions: &[Ring]) -> Result<PointSet> {
        self.footprint.validate()?;

        let bounds = ring.bounds();
        let step_x = self.footprint.step_x();
        let step_y = self.footprint.step_y();
        let origin = Point2::new(
            bounds.min.x + self.footprint.width / 2.0,
            bounds.min.y + self.footprint.height / 2.0,
        );
        let mut set = PointSet::new(KeySpace::new(origin, step_x.min(step_y)));

        if ring.is_degenerate() {
            return Ok(set);
        }

        let columns = lattice_count(origin.x, step_x, bounds.max.x)?;
        let rows = lattice_count(origin.y, step_y, bounds.max.y)?;
        let cells = columns.saturating_mul(rows);
        if cells > MAX_LATTICE_CELLS {
            return Err(GeometryError::LatticeTooLarge {
                cells,
                limit: MAX_LATTICE_CELLS,
            }
            .into());
        }

        let perimeter = ring.to_geo();
        let zones: Vec<(Aabb2, Polygon<f64>)> = exclusions
            .iter()
            .map(|zone| (zone.bounds(), zone.to_geo()))
            .collect();

        let kept_rows: Vec<Vec<Point2>> = (0..rows)
            .into_par_iter()
            .map(|row| {
                let y = origin.y + row as f64 * step_y;
                (0..columns)
                    .map(|col| Point2::new(origin.x + col as f64 * step_x, y))
                    .filter(|p| is_coverable(p, &perimeter, &zones))
                    .collect()
            })
            .collect();

        for p in kept_rows.into_iter().flatten() {
            set.insert(p);
        }

        debug!(
            columns,
            rows,
            kept = set.len(),
            exclusions = exclusions.len(),
            "quantised perimeter"
        );
        Ok(set)
    }
}

/// Lays a lattice over `ring` and keeps the coverable cell centers.
///
/// # Errors
///
/// See [`GridQuantizer::execute`].
pub fn quantise(ring: &Ring, footprint: FootprintSpec, exclusions: &[Ring]) -> Result<PointSet> {
    GridQuantizer::new(footprint).execute(ring, exclusions)
}

fn is_coverable(p: &Point2, perimeter: &Polygon<f64>, zones: &[(Aabb2, Polygon<f64>)]) -> bool {
    let point = geo::Point::new(p.x, p.y);
    if !perimeter.contains(&point) {
        return false;
    }
    !zones
        .iter()
        .any(|(bounds, zone)| bounds.contains(p) && zone.intersects(&point))
}

/// Number of lattice positions `start + i * step` strictly below `end`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn lattice_count(start: f64, step: f64, end: f64) -> Result<usize> {
    let span = end - start;
    if span <= 0.0 {
        return Ok(0);
    }
    let estimate = (span / step).ceil();
    if estimate > MAX_LATTICE_CELLS as f64 {
        return Err(GeometryError::LatticeTooLarge {
            cells: usize::MAX,
            limit: MAX_LATTICE_CELLS,
        }
        .into());
    }

    let mut n = estimate as usize;
    while n > 0 && start + (n - 1) as f64 * step >= end {
        n -= 1;
    }
    while start + n as f64 * step < end {
        n += 1;
    }
    Ok(n)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn unit_footprint() -> FootprintSpec {
        FootprintSpec::new(1.0, 1.0, 1.0).unwrap()
    }

    fn square(min: f64, max: f64) -> Ring {
        Ring::rectangle(Point2::new(min, min), Point2::new(max, max)).unwrap()
    }

    /// Even-odd ray casting, independent of `geo`.
    fn inside(ring: &Ring, p: &Point2) -> bool {
        let pts = ring.points();
        let mut crossings = false;
        for w in pts.windows(2) {
            let (a, b) = (w[0], w[1]);
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x {
                    crossings = !crossings;
                }
            }
        }
        crossings
    }

    fn random_star(rng: &mut SmallRng, center: Point2, r_min: f64, r_max: f64) -> Ring {
        let sides = rng.gen_range(5..14);
        let pts = (0..sides)
            .map(|i| {
                let a = std::f64::consts::TAU * (i as f64 + rng.gen_range(0.0..0.6)) / sides as f64;
                let r = rng.gen_range(r_min..r_max);
                Point2::new(center.x + r * a.cos(), center.y + r * a.sin())
            })
            .collect();
        Ring::new(pts).unwrap()
    }

    #[test]
    fn ten_by_ten_square_yields_full_grid() {
        let points = quantise(&square(0.0, 10.0), unit_footprint(), &[]).unwrap();
        assert_eq!(points.len(), 100);
        for i in 0..10 {
            for j in 0..10 {
                let p = Point2::new(0.5 + f64::from(i), 0.5 + f64::from(j));
                assert!(points.contains(&p), "missing {p:?}");
            }
        }
        assert_eq!(points.points()[0], Point2::new(0.5, 0.5));
    }

    #[test]
    fn exclusion_removes_only_covered_centers() {
        let zone = square(4.0, 6.0);
        let points = quantise(&square(0.0, 10.0), unit_footprint(), &[zone]).unwrap();
        assert_eq!(points.len(), 96);
        for removed in [(4.5, 4.5), (5.5, 4.5), (4.5, 5.5), (5.5, 5.5)] {
            assert!(!points.contains(&Point2::new(removed.0, removed.1)));
        }
        assert!(points.contains(&Point2::new(3.5, 4.5)));
    }

    #[test]
    fn zero_area_ring_yields_nothing() {
        let sliver = Ring::from_xy(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]).unwrap();
        let points = quantise(&sliver, unit_footprint(), &[]).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn footprint_larger_than_perimeter_yields_nothing() {
        let fp = FootprintSpec::new(4.0, 4.0, 1.0).unwrap();
        let points = quantise(&square(0.0, 1.0), fp, &[]).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn overlap_tightens_columns() {
        let fp = FootprintSpec::new(1.0, 1.0, 0.5).unwrap();
        let points = quantise(&square(0.0, 10.0), fp, &[]).unwrap();
        // Columns at 0.5, 1.0, ..., 9.5 (19 of them), rows at 0.5..9.5 (10).
        assert_eq!(points.len(), 190);
    }

    #[test]
    fn lattice_count_is_strict() {
        assert_eq!(lattice_count(0.5, 1.0, 10.0).unwrap(), 10);
        assert_eq!(lattice_count(0.5, 1.0, 0.5).unwrap(), 0);
        assert_eq!(lattice_count(0.0, 1.0, 3.0).unwrap(), 3);
    }

    #[test]
    fn huge_lattice_is_rejected() {
        let fp = FootprintSpec::new(1e-6, 1e-6, 1.0).unwrap();
        let err = quantise(&square(0.0, 1000.0), fp, &[]).unwrap_err();
        assert!(matches!(
            err,
            crate::MowpathError::Geometry(GeometryError::LatticeTooLarge { .. })
        ));
    }

    #[test]
    fn containment_holds_for_random_concave_perimeters() {
        let mut rng = SmallRng::seed_from_u64(7);
        let fp = FootprintSpec::new(0.4, 0.3, 0.75).unwrap();
        for _ in 0..25 {
            let perimeter = random_star(&mut rng, Point2::new(0.0, 0.0), 3.0, 9.0);
            let zone_center = Point2::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5));
            let zone = random_star(&mut rng, zone_center, 0.5, 1.5);
            let points = quantise(&perimeter, fp, &[zone.clone()]).unwrap();

            for p in points.points() {
                assert!(inside(&perimeter, p), "{p:?} escapes the perimeter");
                assert!(!inside(&zone, p), "{p:?} lies in the exclusion zone");
            }
        }
    }

    #[test]
    fn quantisation_is_deterministic() {
        let mut rng = SmallRng::seed_from_u64(11);
        let perimeter = random_star(&mut rng, Point2::new(0.0, 0.0), 5.0, 12.0);
        let fp = FootprintSpec::default();
        let a = quantise(&perimeter, fp, &[]).unwrap();
        let b = quantise(&perimeter, fp, &[]).unwrap();
        assert_eq!(a.points(), b.points());
    }
}
