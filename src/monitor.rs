//! Replays position traces against a planned route.
//!
//! The monitor follows the route leg by leg: a position within
//! `arrival_radius` of the next waypoint advances to the following leg, and
//! every position is flagged when it lies more than `buffer` from the current
//! leg. The vehicle is off course while too few of the most recent `window`
//! flags are on course.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, GeometryError, Result};
use crate::math::distance_2d::{distance, point_to_segment_dist};
use crate::math::Point2;

/// Thresholds for traversal checking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Distance at which a waypoint counts as reached (meters).
    pub arrival_radius: f64,
    /// Largest distance from the current leg that is still on course (meters).
    pub buffer: f64,
    /// Number of recent positions considered.
    pub window: usize,
    /// Fraction of the window that must be on course.
    pub min_on_course: f64,
    /// Fastest plausible ground speed (m/s).
    pub max_speed: f64,
    /// Time between consecutive positions (s).
    pub sample_interval: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            arrival_radius: 0.2,
            buffer: 0.15,
            window: 10,
            min_on_course: 0.6,
            max_speed: 0.6,
            sample_interval: 0.75,
        }
    }
}

impl MonitorSettings {
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for non-positive distances, speeds or
    /// window, or a fraction outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        ConfigError::require_positive("monitor.arrival_radius", self.arrival_radius)?;
        ConfigError::require_non_negative("monitor.buffer", self.buffer)?;
        #[allow(clippy::cast_precision_loss)]
        let window = self.window as f64;
        ConfigError::require_positive("monitor.window", window)?;
        ConfigError::require_positive("monitor.max_speed", self.max_speed)?;
        ConfigError::require_positive("monitor.sample_interval", self.sample_interval)?;
        if !(0.0..=1.0).contains(&self.min_on_course) {
            return Err(ConfigError::Invalid {
                parameter: "monitor.min_on_course",
                value: self.min_on_course,
                reason: "must lie in [0, 1]",
            }
            .into());
        }
        Ok(())
    }

    /// Returns `true` when moving from `from` to `to` in `elapsed` seconds
    /// does not exceed `max_speed`.
    #[must_use]
    pub fn is_plausible_step(&self, from: &Point2, to: &Point2, elapsed: f64) -> bool {
        distance(from, to) / elapsed <= self.max_speed
    }
}

/// Result of feeding one position to a [`CourseMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Index of the leg the position was checked against.
    pub leg: usize,
    /// The position reached the next waypoint.
    pub arrived: bool,
    /// The position lies outside the buffer around the leg.
    pub outside_buffer: bool,
    /// Too many recent positions lie outside the buffer.
    pub off_course: bool,
}

/// Tracks progress along a route.
#[derive(Debug, Clone)]
pub struct CourseMonitor {
    route: Vec<Point2>,
    settings: MonitorSettings,
    leg: usize,
    flags: VecDeque<bool>,
    outside: usize,
}

impl CourseMonitor {
    /// Creates a monitor positioned on the first leg.
    ///
    /// # Errors
    ///
    /// - `GeometryError::Degenerate` if the route has fewer than 2 points
    /// - `ConfigError::Invalid` for invalid settings
    pub fn new(route: Vec<Point2>, settings: MonitorSettings) -> Result<Self> {
        if route.len() < 2 {
            return Err(GeometryError::Degenerate(format!(
                "route of {} points has no legs",
                route.len()
            ))
            .into());
        }
        settings.validate()?;
        Ok(Self {
            route,
            leg: 0,
            flags: std::iter::repeat(false).take(settings.window).collect(),
            outside: 0,
            settings,
        })
    }

    /// Index of the current leg (`route[leg] -> route[leg + 1]`).
    #[must_use]
    pub fn leg(&self) -> usize {
        self.leg
    }

    /// Number of waypoints reached after the start.
    #[must_use]
    pub fn waypoints_reached(&self) -> usize {
        self.leg
    }

    /// Returns `true` once the final waypoint has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.leg + 1 >= self.route.len()
    }

    /// Fraction of the window that is on course.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn on_course_fraction(&self) -> f64 {
        (self.flags.len() - self.outside) as f64 / self.flags.len() as f64
    }

    /// Feeds the next position.
    pub fn observe(&mut self, position: Point2) -> Observation {
        let mut arrived = false;
        if !self.is_finished()
            && distance(&position, &self.route[self.leg + 1]) < self.settings.arrival_radius
        {
            self.leg += 1;
            arrived = true;
        }

        let last = self.route.len() - 1;
        let start = self.leg.min(last - 1);
        let deviation = point_to_segment_dist(&position, &self.route[start], &self.route[start + 1]);
        let outside_buffer = deviation > self.settings.buffer;

        if self.flags.pop_front() == Some(true) {
            self.outside -= 1;
        }
        self.flags.push_back(outside_buffer);
        if outside_buffer {
            self.outside += 1;
        }

        Observation {
            leg: start,
            arrived,
            outside_buffer,
            off_course: self.on_course_fraction() < self.settings.min_on_course,
        }
    }
}

/// Summary of replaying a full trace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraversalReport {
    /// Waypoints reached after the start.
    pub waypoints_reached: usize,
    /// The final waypoint was reached.
    pub completed: bool,
    /// Positions recorded while off course.
    pub off_course: Vec<Point2>,
    /// Indices of positions that moved faster than `max_speed` from their
    /// predecessor.
    pub implausible: Vec<usize>,
}

/// Replays `positions` along `route`.
///
/// Replay stops early once the final waypoint is reached.
///
/// # Errors
///
/// See [`CourseMonitor::new`].
pub fn replay(
    route: &[Point2],
    positions: &[Point2],
    settings: MonitorSettings,
) -> Result<TraversalReport> {
    let mut monitor = CourseMonitor::new(route.to_vec(), settings)?;
    let mut report = TraversalReport::default();

    for (i, position) in positions.iter().enumerate() {
        if monitor.is_finished() {
            break;
        }
        if i > 0 && !settings.is_plausible_step(&positions[i - 1], position, settings.sample_interval)
        {
            report.implausible.push(i);
        }
        if monitor.observe(*position).off_course {
            report.off_course.push(*position);
        }
    }

    report.waypoints_reached = monitor.waypoints_reached();
    report.completed = monitor.is_finished();
    if report.completed {
        debug!(
            waypoints = report.waypoints_reached,
            off_course = report.off_course.len(),
            "trace completed the route"
        );
    } else {
        warn!(
            reached = report.waypoints_reached,
            total = route.len() - 1,
            "trace ended before the route was completed"
        );
    }
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn l_route() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
        ]
    }

    /// Positions every 0.1 m along `route`.
    fn walk(route: &[Point2]) -> Vec<Point2> {
        let mut out = Vec::new();
        for w in route.windows(2) {
            let steps = (distance(&w[0], &w[1]) / 0.1).round() as usize;
            for s in 0..steps {
                let t = s as f64 / steps as f64;
                out.push(w[0] + (w[1] - w[0]) * t);
            }
        }
        out.push(*route.last().unwrap());
        out
    }

    #[test]
    fn exact_trace_completes_on_course() {
        let route = l_route();
        let report = replay(&route, &walk(&route), MonitorSettings::default()).unwrap();
        assert!(report.completed);
        assert_eq!(report.waypoints_reached, 2);
        assert!(report.off_course.is_empty());
        assert!(report.implausible.is_empty());
    }

    #[test]
    fn sustained_drift_is_off_course() {
        let route = l_route();
        let mut monitor = CourseMonitor::new(route, MonitorSettings::default()).unwrap();
        let mut flagged = 0;
        for i in 0..10 {
            let obs = monitor.observe(Point2::new(0.1 * f64::from(i), 0.5));
            assert!(obs.outside_buffer);
            if obs.off_course {
                flagged += 1;
            }
        }
        // Off course once 5 of the last 10 positions are outside.
        assert_eq!(flagged, 6);
    }

    #[test]
    fn isolated_outlier_is_tolerated() {
        let route = l_route();
        let mut monitor = CourseMonitor::new(route, MonitorSettings::default()).unwrap();
        assert!(!monitor.observe(Point2::new(0.5, 0.0)).off_course);
        let spike = monitor.observe(Point2::new(0.6, 1.0));
        assert!(spike.outside_buffer);
        assert!(!spike.off_course);
        assert!((monitor.on_course_fraction() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn arrival_advances_leg() {
        let mut monitor = CourseMonitor::new(l_route(), MonitorSettings::default()).unwrap();
        let obs = monitor.observe(Point2::new(1.9, 0.05));
        assert!(obs.arrived);
        assert_eq!(obs.leg, 1);
        assert_eq!(monitor.leg(), 1);
    }

    #[test]
    fn teleport_is_implausible() {
        let route = l_route();
        let positions = vec![Point2::new(0.0, 0.0), Point2::new(1.5, 0.0), Point2::new(1.6, 0.0)];
        let report = replay(&route, &positions, MonitorSettings::default()).unwrap();
        assert_eq!(report.implausible, vec![1]);
        assert!(!report.completed);
    }

    #[test]
    fn single_point_route_is_rejected() {
        assert!(CourseMonitor::new(vec![Point2::new(0.0, 0.0)], MonitorSettings::default()).is_err());
    }
}
