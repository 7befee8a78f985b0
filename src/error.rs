use thiserror::Error;

/// Top-level error type for the mowpath planner.
#[derive(Debug, Error)]
pub enum MowpathError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to boundary geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("non-finite coordinate at vertex {index}")]
    NonFinite { index: usize },

    #[error("ring edges {first} and {second} intersect")]
    SelfIntersecting { first: usize, second: usize },

    #[error("offset collapsed: {0}")]
    Collapsed(String),

    #[error("sampling lattice of {cells} cells exceeds the limit of {limit}")]
    LatticeTooLarge { cells: usize, limit: usize },
}

/// Errors related to the coverage graph and tour construction.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("coverage graph with {nodes} nodes splits into {components} disconnected parts")]
    Disconnected { nodes: usize, components: usize },
}

/// Errors related to geodetic projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("coordinate ({latitude}, {longitude}) is outside the projectable range")]
    OutOfRange { latitude: f64, longitude: f64 },
}

/// Errors related to planner configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {parameter} = {value}: {reason}")]
    Invalid {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Fails unless `value` is finite and strictly positive.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming `parameter`.
    pub fn require_positive(parameter: &'static str, value: f64) -> Result<()> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(Self::Invalid {
                parameter,
                value,
                reason: "must be finite and greater than zero",
            }
            .into())
        }
    }

    /// Fails unless `value` is finite and not negative.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming `parameter`.
    pub fn require_non_negative(parameter: &'static str, value: f64) -> Result<()> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(Self::Invalid {
                parameter,
                value,
                reason: "must be finite and not negative",
            }
            .into())
        }
    }
}

/// Convenience type alias for results using [`MowpathError`].
pub type Result<T> = std::result::Result<T, MowpathError>;
