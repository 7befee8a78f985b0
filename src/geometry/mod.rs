pub mod clearance;
pub mod footprint;
pub mod grid_key;
pub mod ring;
pub mod waypoint;

pub use clearance::Clearance;
pub use footprint::FootprintSpec;
pub use grid_key::{GridKey, KeySpace, NodeOrigin, PointSet};
pub use ring::Ring;
pub use waypoint::{Waypoint, WaypointRole};
