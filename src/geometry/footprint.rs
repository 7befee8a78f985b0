use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Vehicle footprint and the lateral overlap between neighbouring passes.
///
/// `overlap` is the fraction of `width` used as the horizontal sampling step,
/// so values below one make adjacent passes overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintSpec {
    /// Cutting width across the direction of travel (meters).
    pub width: f64,
    /// Length along the direction of travel (meters).
    pub height: f64,
    /// Fraction of `width` between neighbouring lattice columns.
    pub overlap: f64,
}

impl FootprintSpec {
    /// Creates a validated footprint.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` unless every field is finite and positive.
    pub fn new(width: f64, height: f64, overlap: f64) -> Result<Self> {
        let spec = Self {
            width,
            height,
            overlap,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Checks that every dimension is finite and strictly positive.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        ConfigError::require_positive("footprint.width", self.width)?;
        ConfigError::require_positive("footprint.height", self.height)?;
        ConfigError::require_positive("footprint.overlap", self.overlap)
    }

    /// Horizontal lattice step: `width * overlap`.
    #[must_use]
    pub fn step_x(&self) -> f64 {
        self.width * self.overlap
    }

    /// Vertical lattice step: `height`.
    #[must_use]
    pub fn step_y(&self) -> f64 {
        self.height
    }
}

impl Default for FootprintSpec {
    fn default() -> Self {
        Self {
            width: 0.3,
            height: 0.3,
            overlap: 0.75,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_follow_overlap() {
        let fp = FootprintSpec {
            width: 2.0,
            height: 1.5,
            overlap: 0.5,
        };
        assert!((fp.step_x() - 1.0).abs() < 1e-12);
        assert!((fp.step_y() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_positive_fields() {
        assert!(FootprintSpec::new(1.0, 1.0, 1.0).is_ok());
        assert!(FootprintSpec::new(0.0, 1.0, 1.0).is_err());
        assert!(FootprintSpec::new(1.0, -1.0, 1.0).is_err());
        assert!(FootprintSpec::new(1.0, 1.0, 0.0).is_err());
    }
}
