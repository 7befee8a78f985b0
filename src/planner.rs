//! End-to-end coverage planning.

use geo::Contains;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::error::{MowpathError, Result};
use crate::geometry::{Clearance, PointSet, Ring, Waypoint, WaypointRole};
use crate::math::distance_2d::distance;
use crate::math::Point2;
use crate::operations::graph::{CoverageGraphBuilder, DirectionalBias};
use crate::operations::noise::{NoiseInjector, NoiseProfile};
use crate::operations::offset::{offset_inner, offset_outer};
use crate::operations::quantize::quantise;
use crate::operations::tour::{Tour, TourSolver};

/// Coverage points tried per perimeter vertex when joining the perimeter lap
/// to the passes.
const ANCHOR_CANDIDATES: usize = 8;

/// Why a plan produced no route.
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyCoverage {
    /// Inner perimeter after offsetting.
    pub inner_perimeter: Ring,
    /// Exclusion zones after offsetting.
    pub exclusions: Vec<Ring>,
}

/// A coverage pass that could not be toured.
#[derive(Debug)]
pub struct SkippedPass {
    pub index: usize,
    pub bias: DirectionalBias,
    pub error: MowpathError,
}

/// Output of one successful coverage pass.
#[derive(Debug, Clone)]
pub struct PassResult {
    pub index: usize,
    pub bias: DirectionalBias,
    /// Tour restarted at the node where the passes join the perimeter lap.
    pub tour: Tour,
    /// Drive path of the tour tagged with roles.
    pub waypoints: Vec<Waypoint>,
}

/// A finished plan.
#[derive(Debug)]
pub struct CoveragePlan {
    inner_perimeter: Ring,
    exclusions: Vec<Ring>,
    coverage_points: usize,
    passes: Vec<PassResult>,
    skipped: Vec<SkippedPass>,
    reference: Vec<Waypoint>,
    route: Vec<Point2>,
}

impl CoveragePlan {
    /// Closed route to drive: every non-interior waypoint of the reference
    /// trace.
    #[must_use]
    pub fn route(&self) -> &[Point2] {
        &self.route
    }

    /// Full trace before simplification, with roles.
    #[must_use]
    pub fn reference(&self) -> &[Waypoint] {
        &self.reference
    }

    #[must_use]
    pub fn inner_perimeter(&self) -> &Ring {
        &self.inner_perimeter
    }

    #[must_use]
    pub fn exclusions(&self) -> &[Ring] {
        &self.exclusions
    }

    /// Number of lattice points produced by quantisation.
    #[must_use]
    pub fn coverage_points(&self) -> usize {
        self.coverage_points
    }

    #[must_use]
    pub fn passes(&self) -> &[PassResult] {
        &self.passes
    }

    #[must_use]
    pub fn skipped_passes(&self) -> &[SkippedPass] {
        &self.skipped
    }

    /// Perturbed copies of the reference trace.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an invalid profile.
    pub fn noise_samples(&self, profile: NoiseProfile) -> Result<Vec<Vec<Point2>>> {
        NoiseInjector::new(profile).generate(&self.reference)
    }
}

/// Result of [`CoveragePlanner::plan`].
#[derive(Debug)]
pub enum PlanOutcome {
    Planned(CoveragePlan),
    /// Nothing inside the perimeter can be covered.
    Empty(EmptyCoverage),
}

impl PlanOutcome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    #[must_use]
    pub fn plan(&self) -> Option<&CoveragePlan> {
        match self {
            Self::Planned(plan) => Some(plan),
            Self::Empty(_) => None,
        }
    }

    #[must_use]
    pub fn into_plan(self) -> Option<CoveragePlan> {
        match self {
            Self::Planned(plan) => Some(plan),
            Self::Empty(_) => None,
        }
    }
}

/// Runs the full pipeline: offset, quantise, then graph, tour and
/// simplification once per configured pass.
#[derive(Debug, Clone, Default)]
pub struct CoveragePlanner {
    config: PlannerConfig,
}

impl CoveragePlanner {
    #[must_use]
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans a closed coverage route.
    ///
    /// Passes run in parallel. A pass whose graph is disconnected is skipped;
    /// planning fails only when every pass fails.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Invalid` for an invalid configuration
    /// - `GeometryError` if a boundary is degenerate, self-intersecting or
    ///   collapses under offsetting
    /// - `GraphError::Disconnected` if no pass could be toured
    pub fn plan(&self, perimeter: &Ring, exclusions: &[Ring]) -> Result<PlanOutcome> {
        let config = &self.config;
        config.validate()?;
        let settings = config.offset.settings;

        let inner = offset_inner(perimeter.clone(), config.perimeter_margin(), settings)?;
        let outer = exclusions
            .iter()
            .map(|zone| offset_outer(zone.clone(), config.exclusion_margin(), settings))
            .collect::<Result<Vec<_>>>()?;

        let mut points = quantise(&inner, config.footprint, &outer)?;
        if points.is_empty() {
            info!("no coverable points inside the perimeter");
            return Ok(PlanOutcome::Empty(EmptyCoverage {
                inner_perimeter: inner,
                exclusions: outer,
            }));
        }
        let coverage_points = points.len();
        link_exclusion_vertices(&mut points, &inner, &outer);
        let clearance = Clearance::new(&inner, &outer);
        let anchor = choose_anchor(&inner, &points, &clearance);

        let results: Vec<Result<PassResult>> = config
            .passes
            .par_iter()
            .enumerate()
            .map(|(index, bias)| self.run_pass(index, *bias, &points, &clearance, anchor.node))
            .collect();

        let mut passes = Vec::new();
        let mut skipped = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(pass) => passes.push(pass),
                Err(error @ MowpathError::Graph(_)) => {
                    warn!(pass = index, %error, "skipping coverage pass");
                    skipped.push(SkippedPass {
                        index,
                        bias: config.passes[index],
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }
        if passes.is_empty() && !skipped.is_empty() {
            return Err(skipped.swap_remove(0).error);
        }

        let reference = assemble_reference(&inner, anchor.vertex, &passes);
        let route: Vec<Point2> = reference
            .iter()
            .filter(|w| w.is_structural())
            .map(|w| w.point)
            .collect();

        info!(
            coverage_points,
            passes = passes.len(),
            skipped = skipped.len(),
            reference = reference.len(),
            route = route.len(),
            "planned coverage route"
        );

        Ok(PlanOutcome::Planned(CoveragePlan {
            inner_perimeter: inner,
            exclusions: outer,
            coverage_points,
            passes,
            skipped,
            reference,
            route,
        }))
    }

    fn run_pass(
        &self,
        index: usize,
        bias: DirectionalBias,
        points: &PointSet,
        clearance: &Clearance,
        anchor: usize,
    ) -> Result<PassResult> {
        let graph =
            CoverageGraphBuilder::new(self.config.footprint, bias).build_within(points, clearance)?;
        let mut tour = TourSolver::from_settings(&self.config.tour).solve(&graph)?;
        if !tour.rotate_to(anchor) {
            warn!(pass = index, node = anchor, "tour misses the anchor node");
        }
        let waypoints = self.config.simplify.tag(&tour);
        Ok(PassResult {
            index,
            bias,
            tour,
            waypoints,
        })
    }
}

/// Adds the vertices of each exclusion ring lying inside the perimeter as
/// boundary nodes, so tours skirt the zones.
fn link_exclusion_vertices(points: &mut PointSet, perimeter: &Ring, exclusions: &[Ring]) {
    let polygon = perimeter.to_geo();
    for zone in exclusions {
        for v in zone.vertices() {
            if polygon.contains(&geo::Point::new(v.x, v.y)) {
                points.insert_boundary(*v);
            }
        }
    }
}

/// Where the passes leave and rejoin the perimeter lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    /// Index into the inner ring's vertices.
    vertex: usize,
    /// Coverage node index.
    node: usize,
}

/// Picks the first inner-ring vertex with a clear straight leg to one of its
/// nearest coverage points.
fn choose_anchor(inner: &Ring, points: &PointSet, clearance: &Clearance) -> Anchor {
    for (vertex, v) in inner.vertices().iter().enumerate() {
        let mut near: Vec<(f64, usize)> = points
            .points()
            .iter()
            .enumerate()
            .map(|(node, p)| (distance(v, p), node))
            .collect();
        near.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        if let Some(&(_, node)) = near
            .iter()
            .take(ANCHOR_CANDIDATES)
            .find(|(_, node)| clearance.is_clear(v, &points.points()[*node]))
        {
            return Anchor { vertex, node };
        }
    }
    warn!("no clear leg from the perimeter to the coverage points");
    Anchor { vertex: 0, node: 0 }
}

/// Appends `run`, dropping its first waypoint when it repeats the last one
/// already in `reference`.
fn append_run(reference: &mut Vec<Waypoint>, run: &[Waypoint]) {
    let repeats = matches!(
        (reference.last(), run.first()),
        (Some(last), Some(first)) if last.point == first.point
    );
    reference.extend_from_slice(&run[usize::from(repeats)..]);
}

/// Inner perimeter lap starting at the anchor vertex, then each pass's
/// tagged drive path, then the closing point.
fn assemble_reference(inner: &Ring, start: usize, passes: &[PassResult]) -> Vec<Waypoint> {
    let vertices = inner.vertices();
    let mut reference: Vec<Waypoint> = vertices[start..]
        .iter()
        .chain(&vertices[..=start])
        .map(|p| Waypoint::new(*p, WaypointRole::Boundary))
        .collect();
    for pass in passes {
        append_run(&mut reference, &pass.waypoints);
    }
    if let Some(&first) = reference.first() {
        append_run(&mut reference, &[first]);
    }
    reference
}
