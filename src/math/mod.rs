pub mod distance_2d;
pub mod intersect_2d;
pub mod polygon_2d;

/// 2D point type in the planar frame (meters).
pub type Point2 = nalgebra::Point2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns `true` when two points coincide within [`TOLERANCE`].
#[must_use]
pub fn approx_eq(a: &Point2, b: &Point2) -> bool {
    (a.x - b.x).abs() <= TOLERANCE && (a.y - b.y).abs() <= TOLERANCE
}
