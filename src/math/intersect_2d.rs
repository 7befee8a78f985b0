use super::{Point2, TOLERANCE};

/// Orientation of the triple `(a, b, c)`: positive for a left turn, negative
/// for a right turn, zero when collinear within tolerance.
#[must_use]
pub fn orientation(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let value = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    if value.abs() < TOLERANCE {
        0.0
    } else {
        value
    }
}

/// Returns `true` when segments `a0→a1` and `b0→b1` share at least one point,
/// counting endpoint contact and collinear overlap.
#[must_use]
pub fn segments_touch(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2) -> bool {
    let o1 = orientation(a0, a1, b0);
    let o2 = orientation(a0, a1, b1);
    let o3 = orientation(b0, b1, a0);
    let o4 = orientation(b0, b1, a1);

    if o1 * o2 < 0.0 && o3 * o4 < 0.0 {
        return true;
    }

    (o1 == 0.0 && on_segment(a0, a1, b0))
        || (o2 == 0.0 && on_segment(a0, a1, b1))
        || (o3 == 0.0 && on_segment(b0, b1, a0))
        || (o4 == 0.0 && on_segment(b0, b1, a1))
}

/// Checks whether collinear point `p` lies within the bounding box of `a→b`.
fn on_segment(a: &Point2, b: &Point2, p: &Point2) -> bool {
    p.x >= a.x.min(b.x) - TOLERANCE
        && p.x <= a.x.max(b.x) + TOLERANCE
        && p.y >= a.y.min(b.y) - TOLERANCE
        && p.y <= a.y.max(b.y) + TOLERANCE
}
