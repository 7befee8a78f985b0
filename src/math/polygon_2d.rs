use super::intersect_2d::{orientation, segments_touch};
use super::{Point2, TOLERANCE};

/// An axis-aligned bounding box in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    pub min: Point2,
    pub max: Point2,
}

impl Aabb2 {
    /// Computes the bounding box of a point set, or `None` when empty.
    #[must_use]
    pub fn from_points(points: &[Point2]) -> Option<Self> {
        let first = points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self { min, max })
    }

    /// Returns `true` when `p` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Shoelace area: positive for counter-clockwise rings. A repeated closing
/// vertex contributes nothing.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Finds the first pair of edges of a closed ring that intersect.
///
/// `ring` must repeat its first vertex at the end. Edge `i` runs from
/// `ring[i]` to `ring[i + 1]`. Adjacent edges only count when they fold
/// back onto each other.
#[must_use]
pub fn find_self_intersection(ring: &[Point2]) -> Option<(usize, usize)> {
    let edges = ring.len().saturating_sub(1);
    if edges < 3 {
        return None;
    }

    for i in 0..edges {
        let (a0, a1) = (&ring[i], &ring[i + 1]);

        // Spike: the next edge doubles back along this one.
        let next = (i + 1) % edges;
        let c = &ring[next + 1];
        if orientation(a0, a1, c) == 0.0 {
            let back = (a0 - a1).dot(&(c - a1));
            if back > TOLERANCE {
                return Some((i, next));
            }
        }

        for j in (i + 2)..edges {
            if i == 0 && j == edges - 1 {
                continue;
            }
            if segments_touch(a0, a1, &ring[j], &ring[j + 1]) {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
            Point2::new(0.0, 0.0),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        let area = signed_area_2d(&square(1.0));
        assert!((area - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = square(1.0);
        pts.reverse();
        let area = signed_area_2d(&pts);
        assert!((area + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!((signed_area_2d(&[Point2::new(0.0, 0.0)])).abs() < TOLERANCE);
        assert!((signed_area_2d(&[])).abs() < TOLERANCE);
    }

    #[test]
    fn bounding_box_of_square() {
        let bb = Aabb2::from_points(&square(4.0));
        assert_eq!(
            bb,
            Some(Aabb2 {
                min: Point2::new(0.0, 0.0),
                max: Point2::new(4.0, 4.0),
            })
        );
        assert!(Aabb2::from_points(&[]).is_none());
    }

    #[test]
    fn simple_square_has_no_intersection() {
        assert!(find_self_intersection(&square(1.0)).is_none());
    }

    #[test]
    fn bowtie_intersects() {
        let bowtie = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 2.0),
            Point2::new(0.0, 0.0),
        ];
        assert_eq!(find_self_intersection(&bowtie), Some((0, 2)));
    }

    #[test]
    fn spike_is_detected() {
        let spike = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 3.0),
            Point2::new(0.0, 0.0),
        ];
        assert!(find_self_intersection(&spike).is_some());
    }

    #[test]
    fn concave_ring_is_simple() {
        let notch = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(2.0, 1.0),
            Point2::new(0.0, 4.0),
            Point2::new(0.0, 0.0),
        ];
        assert!(find_self_intersection(&notch).is_none());
    }
}
