pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod monitor;
pub mod operations;
pub mod planner;
pub mod projection;

pub use config::PlannerConfig;
pub use error::{MowpathError, Result};
pub use planner::{CoveragePlan, CoveragePlanner, PlanOutcome};
