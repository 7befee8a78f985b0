//! Planner configuration loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::geometry::FootprintSpec;
use crate::monitor::MonitorSettings;
use crate::operations::graph::DirectionalBias;
use crate::operations::noise::NoiseProfile;
use crate::operations::offset::OffsetSettings;
use crate::operations::simplify::RouteSimplifier;
use crate::operations::tour::TourSettings;

/// Boundary margins and offset tunables.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OffsetSection {
    /// Inward margin for the perimeter. Defaults to the footprint width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perimeter_margin: Option<f64>,
    /// Outward margin for exclusion zones. Defaults to half the footprint width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion_margin: Option<f64>,
    #[serde(flatten)]
    pub settings: OffsetSettings,
}

/// Full planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub footprint: FootprintSpec,

    #[serde(default)]
    pub offset: OffsetSection,

    /// Directional bias of each coverage pass, in route order.
    #[serde(default = "default_passes")]
    pub passes: Vec<DirectionalBias>,

    #[serde(default)]
    pub tour: TourSettings,

    #[serde(default)]
    pub simplify: RouteSimplifier,

    #[serde(default)]
    pub noise: NoiseProfile,

    #[serde(default)]
    pub monitor: MonitorSettings,
}

/// Cross-hatch: a pass favouring vertical sweeps, then one favouring
/// horizontal sweeps.
fn default_passes() -> Vec<DirectionalBias> {
    vec![
        DirectionalBias {
            up_down: 1.0,
            left_right: 1.5,
        },
        DirectionalBias {
            up_down: 1.5,
            left_right: 1.0,
        },
    ]
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            footprint: FootprintSpec::default(),
            offset: OffsetSection::default(),
            passes: default_passes(),
            tour: TourSettings::default(),
            simplify: RouteSimplifier::default(),
            noise: NoiseProfile::default(),
            monitor: MonitorSettings::default(),
        }
    }
}

impl PlannerConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// `ConfigError::Io` if the file cannot be read, otherwise see
    /// [`PlannerConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates a TOML document. Missing sections take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` for malformed TOML, `ConfigError::Invalid` for
    /// out-of-range values.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for the first offending value.
    pub fn validate(&self) -> Result<()> {
        self.footprint.validate()?;
        ConfigError::require_non_negative("offset.perimeter_margin", self.perimeter_margin())?;
        ConfigError::require_non_negative("offset.exclusion_margin", self.exclusion_margin())?;
        ConfigError::require_non_negative(
            "offset.simplify_tolerance",
            self.offset.settings.simplify_tolerance,
        )?;
        ConfigError::require_positive("offset.arc_tolerance", self.offset.settings.arc_tolerance)?;
        ConfigError::require_positive("offset.scale_factor", self.offset.settings.scale_factor)?;
        if self.passes.is_empty() {
            return Err(ConfigError::Invalid {
                parameter: "passes",
                value: 0.0,
                reason: "at least one coverage pass is required",
            }
            .into());
        }
        for bias in &self.passes {
            bias.validate()?;
        }
        self.simplify.validate()?;
        self.noise.validate()?;
        self.monitor.validate()
    }

    /// Inward perimeter margin.
    #[must_use]
    pub fn perimeter_margin(&self) -> f64 {
        self.offset
            .perimeter_margin
            .unwrap_or(self.footprint.width)
    }

    /// Outward exclusion margin.
    #[must_use]
    pub fn exclusion_margin(&self) -> f64 {
        self.offset
            .exclusion_margin
            .unwrap_or(self.footprint.width / 2.0)
    }
}
