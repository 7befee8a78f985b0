use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::geometry::Waypoint;
use crate::math::Point2;

/// Bounds and reproducibility controls for synthetic traces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseProfile {
    /// Largest displacement applied on each axis (meters).
    #[serde(default = "default_max_perturbation")]
    pub max_perturbation: f64,
    /// Number of perturbed copies generated per corpus.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
    /// Master seed. `None` draws a fresh seed from entropy on every run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for NoiseProfile {
    fn default() -> Self {
        Self {
            max_perturbation: default_max_perturbation(),
            sample_count: default_sample_count(),
            seed: None,
        }
    }
}

fn default_max_perturbation() -> f64 {
    0.5
}
fn default_sample_count() -> usize {
    100
}

impl NoiseProfile {
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `max_perturbation` is negative or not
    /// finite.
    pub fn validate(&self) -> Result<()> {
        ConfigError::require_non_negative("noise.max_perturbation", self.max_perturbation)
    }
}

/// Produces perturbed copies of a reference trace.
///
/// Only [`WaypointRole::Interior`](crate::geometry::WaypointRole::Interior)
/// waypoints move, each axis by an independent uniform offset in
/// `[-max_perturbation, max_perturbation]`. Every other waypoint is copied
/// exactly.
#[derive(Debug, Clone, Copy)]
pub struct NoiseInjector {
    profile: NoiseProfile,
}

impl NoiseInjector {
    #[must_use]
    pub fn new(profile: NoiseProfile) -> Self {
        Self { profile }
    }

    #[must_use]
    pub fn profile(&self) -> &NoiseProfile {
        &self.profile
    }

    /// Perturbs one copy of `reference` using the caller's random stream.
    ///
    /// A bound that is not a positive finite number yields an exact copy.
    pub fn perturb<R: Rng + ?Sized>(&self, reference: &[Waypoint], rng: &mut R) -> Vec<Point2> {
        let bound = self.profile.max_perturbation;
        if !bound.is_finite() || bound <= 0.0 {
            return reference.iter().map(|w| w.point).collect();
        }
        let offset = Uniform::new_inclusive(-bound, bound);
        reference
            .iter()
            .map(|w| {
                if w.is_structural() {
                    w.point
                } else {
                    Point2::new(
                        w.point.x + offset.sample(rng),
                        w.point.y + offset.sample(rng),
                    )
                }
            })
            .collect()
    }

    /// Generates `sample_count` perturbed copies.
    ///
    /// Each copy uses its own stream seeded from a master stream, which is
    /// seeded from the profile or from entropy.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the profile is invalid.
    pub fn generate(&self, reference: &[Waypoint]) -> Result<Vec<Vec<Point2>>> {
        self.profile.validate()?;
        let mut master = match self.profile.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(self.generate_with(reference, &mut master))
    }

    /// Generates `sample_count` perturbed copies, drawing per-copy seeds from
    /// `master`. Copies are built in parallel and returned in seed order.
    pub fn generate_with<R: Rng>(
        &self,
        reference: &[Waypoint],
        master: &mut R,
    ) -> Vec<Vec<Point2>> {
        let seeds: Vec<u64> = (0..self.profile.sample_count)
            .map(|_| master.gen())
            .collect();
        let samples: Vec<Vec<Point2>> = seeds
            .par_iter()
            .map(|&seed| self.perturb(reference, &mut SmallRng::seed_from_u64(seed)))
            .collect();
        debug!(
            samples = samples.len(),
            points = reference.len(),
            max_perturbation = self.profile.max_perturbation,
            "generated noisy traces"
        );
        samples
    }
}
