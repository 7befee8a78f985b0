use geo::{Coord, LineString, Polygon};

use crate::error::{GeometryError, Result};
use crate::math::polygon_2d::{find_self_intersection, signed_area_2d, Aabb2};
use crate::math::{approx_eq, Point2, TOLERANCE};

/// A closed planar ring: the boundary of a simple polygon.
///
/// The first and last stored points are always identical. Consecutive
/// duplicate vertices are dropped on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<Point2>,
}

impl Ring {
    /// Creates a ring from its vertices, closing it when the input is open.
    ///
    /// # Errors
    ///
    /// - `GeometryError::NonFinite` if any coordinate is NaN or infinite
    /// - `GeometryError::Degenerate` if fewer than 3 distinct vertices remain
    pub fn new(points: Vec<Point2>) -> Result<Self> {
        if let Some(index) = points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(GeometryError::NonFinite { index }.into());
        }

        let mut vertices: Vec<Point2> = Vec::with_capacity(points.len() + 1);
        for p in points {
            if vertices.last().is_some_and(|last| approx_eq(last, &p)) {
                continue;
            }
            vertices.push(p);
        }
        while vertices.len() > 1 && approx_eq(&vertices[0], &vertices[vertices.len() - 1]) {
            vertices.pop();
        }

        if vertices.len() < 3 {
            return Err(GeometryError::Degenerate(format!(
                "ring needs at least 3 distinct vertices, got {}",
                vertices.len()
            ))
            .into());
        }

        vertices.push(vertices[0]);
        Ok(Self { points: vertices })
    }

    /// Convenience constructor from `(x, y)` pairs.
    ///
    /// # Errors
    ///
    /// Same as [`Ring::new`].
    pub fn from_xy(coords: &[(f64, f64)]) -> Result<Self> {
        Self::new(coords.iter().map(|&(x, y)| Point2::new(x, y)).collect())
    }

    /// Axis-aligned rectangle with corners `min` and `max`, counter-clockwise.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` when the rectangle has no extent.
    pub fn rectangle(min: Point2, max: Point2) -> Result<Self> {
        Self::new(vec![
            min,
            Point2::new(max.x, min.y),
            max,
            Point2::new(min.x, max.y),
        ])
    }

    /// All points including the repeated closing point.
    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Distinct vertices, without the closing repeat.
    #[must_use]
    pub fn vertices(&self) -> &[Point2] {
        &self.points[..self.points.len() - 1]
    }

    /// Number of stored points including the closing repeat.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`: a valid ring has at least four stored points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed enclosed area; positive for counter-clockwise rings.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        signed_area_2d(&self.points)
    }

    /// Unsigned enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Returns `true` when the ring encloses no measurable area.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.area() <= TOLERANCE
    }

    /// Returns `true` when every vertex lies on one line, so the ring cannot
    /// enclose area whatever its winding.
    #[must_use]
    pub fn is_collinear(&self) -> bool {
        let origin = self.points[0];
        let reach = |p: &Point2| (p - origin).norm_squared();
        let Some(far) = self
            .vertices()
            .iter()
            .max_by(|a, b| reach(a).total_cmp(&reach(b)))
        else {
            return true;
        };
        let span = far - origin;
        let len = span.norm();
        if len <= TOLERANCE {
            return true;
        }
        self.vertices()
            .iter()
            .all(|v| (span.perp(&(v - origin)) / len).abs() <= TOLERANCE)
    }

    /// Axis-aligned bounds of the ring.
    #[must_use]
    pub fn bounds(&self) -> Aabb2 {
        // A ring always holds at least four points.
        Aabb2::from_points(&self.points).unwrap_or(Aabb2 {
            min: self.points[0],
            max: self.points[0],
        })
    }

    /// Fails when any two edges of the ring cross or overlap.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::SelfIntersecting` naming the first offending
    /// edge pair.
    pub fn ensure_simple(&self) -> Result<()> {
        match find_self_intersection(&self.points) {
            Some((first, second)) => Err(GeometryError::SelfIntersecting { first, second }.into()),
            None => Ok(()),
        }
    }

    /// Converts to a hole-free `geo` polygon.
    #[must_use]
    pub fn to_geo(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect();
        Polygon::new(LineString::new(coords), vec![])
    }

    /// Builds a ring from a `geo` line string.
    ///
    /// # Errors
    ///
    /// Same as [`Ring::new`].
    pub fn from_geo(line: &LineString<f64>) -> Result<Self> {
        Self::new(line.coords().map(|c| Point2::new(c.x, c.y)).collect())
    }
}
