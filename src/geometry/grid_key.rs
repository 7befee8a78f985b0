use std::collections::HashMap;

use crate::math::Point2;

/// Number of key buckets per lattice step. Coordinates closer than
/// `step / KEY_SUBDIVISIONS` share a key.
const KEY_SUBDIVISIONS: f64 = 1000.0;

/// Integer bucket key for a planar point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey {
    pub ix: i64,
    pub iy: i64,
}

/// Maps planar points to [`GridKey`]s relative to a lattice origin.
///
/// Keys are measured from the lattice origin so lattice points land on
/// bucket centers and rounding never flips between neighbours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeySpace {
    origin: Point2,
    resolution: f64,
}

impl KeySpace {
    /// Creates a key space for a lattice anchored at `origin` whose smallest
    /// step is `min_step`.
    #[must_use]
    pub fn new(origin: Point2, min_step: f64) -> Self {
        Self {
            origin,
            resolution: min_step / KEY_SUBDIVISIONS,
        }
    }

    /// Lattice origin the keys are measured from.
    #[must_use]
    pub fn origin(&self) -> Point2 {
        self.origin
    }

    /// Bucket size in planar units.
    #[must_use]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Quantises a point to its bucket key.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn key(&self, p: &Point2) -> GridKey {
        GridKey {
            ix: ((p.x - self.origin.x) / self.resolution).round() as i64,
            iy: ((p.y - self.origin.y) / self.resolution).round() as i64,
        }
    }
}

/// Where a point in a [`PointSet`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOrigin {
    /// Cell center produced by the lattice sampler.
    Lattice,
    /// Vertex of a perimeter or exclusion ring.
    Boundary,
}

/// A set of planar points keyed by [`GridKey`].
///
/// Insertion order is preserved so iteration is deterministic; a point whose
/// key is already present is ignored.
#[derive(Debug, Clone)]
pub struct PointSet {
    space: KeySpace,
    points: Vec<Point2>,
    origins: Vec<NodeOrigin>,
    index: HashMap<GridKey, usize>,
}

impl PointSet {
    /// Creates an empty set in the given key space.
    #[must_use]
    pub fn new(space: KeySpace) -> Self {
        Self {
            space,
            points: Vec::new(),
            origins: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Inserts a lattice point. Returns `false` if its key was already present.
    pub fn insert(&mut self, p: Point2) -> bool {
        self.insert_with(p, NodeOrigin::Lattice)
    }

    /// Inserts a boundary vertex. Returns `false` if its key was already present.
    pub fn insert_boundary(&mut self, p: Point2) -> bool {
        self.insert_with(p, NodeOrigin::Boundary)
    }

    fn insert_with(&mut self, p: Point2, origin: NodeOrigin) -> bool {
        let key = self.space.key(&p);
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.points.len());
        self.points.push(p);
        self.origins.push(origin);
        true
    }

    /// Returns `true` if a point with the same key is present.
    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        self.index.contains_key(&self.space.key(p))
    }

    /// Position of the point sharing `p`'s key, if any.
    #[must_use]
    pub fn index_of(&self, p: &Point2) -> Option<usize> {
        self.index.get(&self.space.key(p)).copied()
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` when no points are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in insertion order.
    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Origin tag of the point at `index`.
    #[must_use]
    pub fn origin(&self, index: usize) -> NodeOrigin {
        self.origins[index]
    }

    /// Number of lattice points (excluding boundary vertices).
    #[must_use]
    pub fn lattice_len(&self) -> usize {
        self.origins
            .iter()
            .filter(|o| **o == NodeOrigin::Lattice)
            .count()
    }

    /// Key space shared by every point.
    #[must_use]
    pub fn space(&self) -> &KeySpace {
        &self.space
    }

    /// Iterates over `(point, origin)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Point2, NodeOrigin)> + '_ {
        self.points.iter().copied().zip(self.origins.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_space() -> KeySpace {
        KeySpace::new(Point2::new(0.5, 0.5), 1.0)
    }

    #[test]
    fn key_tolerates_float_error() {
        let space = unit_space();
        let a = Point2::new(0.8 + 1e-9, 0.5);
        let b = Point2::new(0.8 - 1e-9, 0.5);
        assert_eq!(space.key(&a), space.key(&b));
    }

    #[test]
    fn neighbouring_lattice_points_have_distinct_keys() {
        let space = unit_space();
        let a = space.key(&Point2::new(0.5, 0.5));
        let b = space.key(&Point2::new(1.5, 0.5));
        assert_eq!(b.ix - a.ix, 1000);
        assert_eq!(a.iy, b.iy);
    }

    #[test]
    fn set_ignores_duplicates() {
        let mut set = PointSet::new(unit_space());
        assert!(set.insert(Point2::new(0.5, 0.5)));
        assert!(!set.insert(Point2::new(0.5 + 1e-9, 0.5)));
        assert!(set.insert_boundary(Point2::new(2.0, 2.0)));
        assert_eq!(set.len(), 2);
        assert_eq!(set.lattice_len(), 1);
        assert_eq!(set.origin(1), NodeOrigin::Boundary);
    }

    #[test]
    fn lookup_by_computed_neighbour() {
        let mut set = PointSet::new(unit_space());
        let step = 0.1 + 0.2;
        let p = Point2::new(0.5, 0.5);
        set.insert(p);
        set.insert(Point2::new(0.5 + 0.3, 0.5));
        assert_eq!(set.index_of(&Point2::new(p.x + step, p.y)), Some(1));
        assert!(!set.contains(&Point2::new(p.x - step, p.y)));
    }
}
