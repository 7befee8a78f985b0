use crate::math::Point2;

/// What a point in a reference trace stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaypointRole {
    /// Vertex of the offset perimeter or an exclusion ring.
    Boundary,
    /// Lattice point kept by route simplification (a turn or run end).
    Structural,
    /// Lattice point collapsed into a straight run.
    Interior,
}

/// A point of a planned route together with its role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub point: Point2,
    pub role: WaypointRole,
}

impl Waypoint {
    #[must_use]
    pub fn new(point: Point2, role: WaypointRole) -> Self {
        Self { point, role }
    }

    /// Returns `true` for waypoints that must be driven exactly.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        self.role != WaypointRole::Interior
    }
}
