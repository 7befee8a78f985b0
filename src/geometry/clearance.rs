use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Coord, Polygon};

use super::Ring;
use crate::math::intersect_2d::segments_touch;
use crate::math::polygon_2d::Aabb2;
use crate::math::{Point2, TOLERANCE};

/// Answers whether a straight leg is drivable: it must stay within the
/// perimeter and must not enter the interior of any exclusion zone.
///
/// Running along a boundary counts as clear. Each leg is split at every
/// contact with a boundary edge; between contacts the leg lies wholly on one
/// side, so one sample per piece decides it.
#[derive(Debug, Clone)]
pub struct Clearance {
    perimeter: Ring,
    perimeter_polygon: Polygon<f64>,
    zones: Vec<Zone>,
}

#[derive(Debug, Clone)]
struct Zone {
    bounds: Aabb2,
    ring: Ring,
    polygon: Polygon<f64>,
}

impl Clearance {
    #[must_use]
    pub fn new(perimeter: &Ring, exclusions: &[Ring]) -> Self {
        Self {
            perimeter: perimeter.clone(),
            perimeter_polygon: perimeter.to_geo(),
            zones: exclusions
                .iter()
                .map(|ring| Zone {
                    bounds: ring.bounds(),
                    ring: ring.clone(),
                    polygon: ring.to_geo(),
                })
                .collect(),
        }
    }

    /// Returns `true` when the segment `a→b` is drivable.
    #[must_use]
    pub fn is_clear(&self, a: &Point2, b: &Point2) -> bool {
        let inside = pieces(a, b, &self.perimeter).iter().all(|p| {
            self.perimeter_polygon.coordinate_position(&to_coord(p)) != CoordPos::Outside
        });
        if !inside {
            return false;
        }

        let leg = Aabb2::from_points(&[*a, *b]);
        self.zones
            .iter()
            .filter(|zone| leg.is_some_and(|leg| overlaps(&leg, &zone.bounds)))
            .all(|zone| {
                pieces(a, b, &zone.ring).iter().all(|p| {
                    zone.polygon.coordinate_position(&to_coord(p)) != CoordPos::Inside
                })
            })
    }
}

/// Midpoints of the pieces `a→b` splits into at its contacts with `ring`.
fn pieces(a: &Point2, b: &Point2, ring: &Ring) -> Vec<Point2> {
    let mut cuts = vec![0.0, 1.0];
    for edge in ring.points().windows(2) {
        let (p, q) = (&edge[0], &edge[1]);
        if !segments_touch(a, b, p, q) {
            continue;
        }
        let dir = b - a;
        let side = q - p;
        let denom = dir.perp(&side);
        if denom.abs() <= TOLERANCE {
            let len2 = dir.norm_squared();
            if len2 > TOLERANCE {
                cuts.push(((p - a).dot(&dir) / len2).clamp(0.0, 1.0));
                cuts.push(((q - a).dot(&dir) / len2).clamp(0.0, 1.0));
            }
        } else {
            cuts.push(((p - a).perp(&side) / denom).clamp(0.0, 1.0));
        }
    }
    cuts.sort_by(f64::total_cmp);
    cuts.dedup_by(|x, y| (*x - *y).abs() <= TOLERANCE);

    cuts.windows(2)
        .map(|w| *a + (b - a) * ((w[0] + w[1]) * 0.5))
        .collect()
}

fn overlaps(a: &Aabb2, b: &Aabb2) -> bool {
    a.min.x <= b.max.x && b.min.x <= a.max.x && a.min.y <= b.max.y && b.min.y <= a.max.y
}

fn to_coord(p: &Point2) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}
