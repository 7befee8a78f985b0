//! Geodetic to planar projection.
//!
//! The planner works in a local metric frame. A [`CoordinateProjector`] maps
//! latitude/longitude into that frame and back; [`UtmProjector`] is the
//! WGS84 UTM implementation.

mod utm;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use utm::UtmProjector;

use crate::error::Result;
use crate::geometry::Ring;
use crate::math::Point2;

/// A geodetic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A projection zone: number and latitude band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtmZone {
    pub number: u8,
    pub band: char,
}

impl UtmZone {
    /// Bands `N` and above lie in the northern hemisphere.
    #[must_use]
    pub fn is_northern(&self) -> bool {
        self.band >= 'N'
    }
}

impl std::fmt::Display for UtmZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.number, self.band)
    }
}

/// Maps geodetic coordinates to a planar frame and back.
pub trait CoordinateProjector {
    /// Zone a coordinate naturally falls in.
    ///
    /// # Errors
    ///
    /// Returns `ProjectionError::OutOfRange` outside the projectable range.
    fn zone_of(&self, p: LatLon) -> Result<UtmZone>;

    /// Projects `p` into the planar frame of `zone`.
    ///
    /// # Errors
    ///
    /// Returns `ProjectionError::OutOfRange` outside the projectable range.
    fn project(&self, p: LatLon, zone: UtmZone) -> Result<Point2>;

    /// Inverse of [`CoordinateProjector::project`].
    ///
    /// # Errors
    ///
    /// Returns `ProjectionError::OutOfRange` if the result is not a valid
    /// coordinate.
    fn unproject(&self, p: &Point2, zone: UtmZone) -> Result<LatLon>;
}

/// Non-fatal diagnostic: the inputs span more than one projection zone, so
/// points far from the chosen zone lose precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionZoneWarning {
    /// Zone every input was projected into.
    pub chosen: UtmZone,
    /// Every distinct zone seen, in input order.
    pub zones: Vec<UtmZone>,
}

/// Boundary inputs projected into one planar frame.
#[derive(Debug, Clone)]
pub struct ProjectedBoundary {
    pub zone: UtmZone,
    pub perimeter: Ring,
    pub exclusions: Vec<Ring>,
    pub warning: Option<ProjectionZoneWarning>,
}

/// Projects a perimeter and its exclusion zones into the zone of the first
/// perimeter vertex.
///
/// # Errors
///
/// - `ProjectionError::OutOfRange` for any unprojectable vertex
/// - `GeometryError` if a projected ring has fewer than 3 distinct vertices
pub fn project_boundary<P: CoordinateProjector + ?Sized>(
    projector: &P,
    perimeter: &[LatLon],
    exclusions: &[Vec<LatLon>],
) -> Result<ProjectedBoundary> {
    let Some(&first) = perimeter.first() else {
        return Err(crate::error::GeometryError::Degenerate("empty perimeter".to_owned()).into());
    };
    let zone = projector.zone_of(first)?;

    let mut zones = vec![zone];
    for p in perimeter.iter().chain(exclusions.iter().flatten()) {
        let z = projector.zone_of(*p)?;
        if !zones.contains(&z) {
            zones.push(z);
        }
    }

    let project_ring = |ring: &[LatLon]| -> Result<Ring> {
        let points = ring
            .iter()
            .map(|p| projector.project(*p, zone))
            .collect::<Result<Vec<_>>>()?;
        Ring::new(points)
    };

    let perimeter = project_ring(perimeter)?;
    let exclusions = exclusions
        .iter()
        .map(|ring| project_ring(ring.as_slice()))
        .collect::<Result<Vec<_>>>()?;

    let warning = (zones.len() > 1).then(|| {
        let listed: Vec<String> = zones.iter().map(ToString::to_string).collect();
        warn!(chosen = %zone, zones = ?listed, "boundary spans several projection zones");
        ProjectionZoneWarning {
            chosen: zone,
            zones,
        }
    });

    Ok(ProjectedBoundary {
        zone,
        perimeter,
        exclusions,
        warning,
    })
}

/// Converts a planar route back to geodetic coordinates.
///
/// # Errors
///
/// Returns `ProjectionError::OutOfRange` for any point outside the valid
/// range of `zone`.
pub fn unproject_route<P: CoordinateProjector + ?Sized>(
    projector: &P,
    route: &[Point2],
    zone: UtmZone,
) -> Result<Vec<LatLon>> {
    route.iter().map(|p| projector.unproject(p, zone)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ProjectionError;
    use crate::MowpathError;

    /// Roughly 30 m x 30 m field.
    fn field(lat: f64, lon: f64) -> Vec<LatLon> {
        vec![
            LatLon::new(lat, lon),
            LatLon::new(lat, lon + 0.0004),
            LatLon::new(lat + 0.00027, lon + 0.0004),
            LatLon::new(lat + 0.00027, lon),
        ]
    }

    #[test]
    fn single_zone_has_no_warning() {
        let utm = UtmProjector::new();
        let boundary = project_boundary(&utm, &field(52.2, 0.12), &[]).unwrap();
        assert!(boundary.warning.is_none());
        assert_eq!(boundary.zone.to_string(), "31U");
        let area = boundary.perimeter.area();
        assert!(area > 600.0 && area < 1000.0, "area {area}");
    }

    #[test]
    fn straddling_a_zone_edge_warns() {
        let utm = UtmProjector::new();
        // Zone 30/31 boundary at 0° longitude.
        let perimeter = field(52.2, -0.0002);
        let boundary = project_boundary(&utm, &perimeter, &[]).unwrap();
        let warning = boundary.warning.unwrap();
        assert_eq!(warning.chosen.number, 30);
        assert_eq!(warning.zones.len(), 2);
    }

    #[test]
    fn exclusions_share_the_perimeter_frame() {
        let utm = UtmProjector::new();
        let zone = vec![
            LatLon::new(52.20010, 0.12010),
            LatLon::new(52.20010, 0.12020),
            LatLon::new(52.20015, 0.12020),
        ];
        let boundary = project_boundary(&utm, &field(52.2, 0.12), &[zone]).unwrap();
        let inner = boundary.exclusions[0].bounds();
        let outer = boundary.perimeter.bounds();
        assert!(outer.contains(&inner.min) && outer.contains(&inner.max));
    }

    #[test]
    fn route_round_trips() {
        let utm = UtmProjector::new();
        let perimeter = field(-33.9, 18.4);
        let boundary = project_boundary(&utm, &perimeter, &[]).unwrap();
        let back = unproject_route(&utm, boundary.perimeter.points(), boundary.zone).unwrap();
        for (a, b) in perimeter.iter().zip(&back) {
            assert!((a.latitude - b.latitude).abs() < 1e-6);
            assert!((a.longitude - b.longitude).abs() < 1e-6);
        }
    }

    #[test]
    fn out_of_range_vertex_is_an_error() {
        let utm = UtmProjector::new();
        let err = project_boundary(&utm, &field(84.5, 10.0), &[]).unwrap_err();
        assert!(matches!(
            err,
            MowpathError::Projection(ProjectionError::OutOfRange { .. })
        ));
    }
}
