use geo::{Area, Simplify};
use geo_clipper::{Clipper, EndType, JoinType};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GeometryError, Result};
use crate::geometry::Ring;
use crate::math::TOLERANCE;

/// Tunables for boundary offsetting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsetSettings {
    /// Douglas-Peucker tolerance applied to the offset ring (meters).
    #[serde(default = "default_simplify_tolerance")]
    pub simplify_tolerance: f64,
    /// Maximum deviation of round joins from the true arc (meters).
    #[serde(default = "default_arc_tolerance")]
    pub arc_tolerance: f64,
    /// Multiplier to integer coordinates before offsetting.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
}

impl Default for OffsetSettings {
    fn default() -> Self {
        Self {
            simplify_tolerance: default_simplify_tolerance(),
            arc_tolerance: default_arc_tolerance(),
            scale_factor: default_scale_factor(),
        }
    }
}

fn default_simplify_tolerance() -> f64 {
    0.1
}
fn default_arc_tolerance() -> f64 {
    0.25
}
fn default_scale_factor() -> f64 {
    1000.0
}

/// Offsets a closed boundary ring with round joins.
///
/// Negative `delta` shrinks the ring (perimeters), positive `delta` grows it
/// (exclusion zones). Coordinates are scaled to integers for the offset
/// itself and the result is simplified before it is returned.
#[derive(Debug)]
pub struct BoundaryOffset2D {
    ring: Ring,
    delta: f64,
    settings: OffsetSettings,
}

impl BoundaryOffset2D {
    /// Creates a new boundary offset operation with default settings.
    #[must_use]
    pub fn new(ring: Ring, delta: f64) -> Self {
        Self {
            ring,
            delta,
            settings: OffsetSettings::default(),
        }
    }

    /// Replaces the offset settings.
    #[must_use]
    pub fn with_settings(mut self, settings: OffsetSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Executes the offset.
    ///
    /// # Errors
    ///
    /// - `GeometryError::NonFinite` if `delta` is not finite
    /// - `GeometryError::Degenerate` if all vertices of the ring are collinear
    /// - `GeometryError::SelfIntersecting` if the input ring crosses itself
    /// - `GeometryError::Collapsed` if nothing (or too little to form a ring)
    ///   survives the offset
    pub fn execute(self) -> Result<Ring> {
        if !self.delta.is_finite() {
            return Err(GeometryError::NonFinite { index: 0 }.into());
        }
        if self.ring.is_collinear() {
            return Err(GeometryError::Degenerate("ring encloses no area".to_owned()).into());
        }
        self.ring.ensure_simple()?;

        if self.delta.abs() < TOLERANCE {
            return Ok(self.ring);
        }

        let polygon = self.ring.to_geo();
        let pieces = polygon.offset(
            self.delta,
            JoinType::Round(self.settings.arc_tolerance),
            EndType::ClosedPolygon,
            self.settings.scale_factor,
        );

        if pieces.0.len() > 1 {
            warn!(
                pieces = pieces.0.len(),
                delta = self.delta,
                "offset split the boundary, keeping the largest piece"
            );
        }

        let largest = pieces
            .0
            .iter()
            .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
            .filter(|p| p.unsigned_area() > TOLERANCE)
            .ok_or_else(|| {
                GeometryError::Collapsed(format!(
                    "offset by {} leaves no area",
                    self.delta
                ))
            })?;

        let simplified = largest
            .exterior()
            .simplify(&self.settings.simplify_tolerance);

        let ring = Ring::from_geo(&simplified).map_err(|_| {
            GeometryError::Collapsed(format!(
                "offset by {} simplifies to fewer than 3 vertices",
                self.delta
            ))
        })?;
        if ring.is_degenerate() {
            return Err(GeometryError::Collapsed(format!(
                "offset by {} leaves a zero-area ring",
                self.delta
            ))
            .into());
        }

        debug!(
            delta = self.delta,
            input_vertices = self.ring.vertices().len(),
            output_vertices = ring.vertices().len(),
            "offset boundary"
        );
        Ok(ring)
    }
}

/// Shrinks a perimeter inward by `margin` (sign ignored).
///
/// # Errors
///
/// See [`BoundaryOffset2D::execute`].
pub fn offset_inner(perimeter: Ring, margin: f64, settings: OffsetSettings) -> Result<Ring> {
    BoundaryOffset2D::new(perimeter, -margin.abs())
        .with_settings(settings)
        .execute()
}

/// Grows an exclusion zone outward by `margin` (sign ignored).
///
/// # Errors
///
/// See [`BoundaryOffset2D::execute`].
pub fn offset_outer(zone: Ring, margin: f64, settings: OffsetSettings) -> Result<Ring> {
    BoundaryOffset2D::new(zone, margin.abs())
        .with_settings(settings)
        .execute()
}
