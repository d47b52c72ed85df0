//! Hysteresis-based waypoint visit detection.

use log::debug;

use super::WaypointVisit;
use crate::geo_utils::haversine_distance;
use crate::spatial::{build_rtree, points_within};
use crate::{LatLon, TrailConfig, Waypoint};

/// Enter/exit distances for the visit state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitThresholds {
    /// A waypoint activates once the track is within this distance (meters)
    pub enter_m: f64,
    /// An active waypoint departs once the track is beyond this distance (meters)
    pub exit_m: f64,
}

impl VisitThresholds {
    /// Thresholds with the default exit factor of 3.
    pub fn new(enter_m: f64) -> Self {
        Self {
            enter_m,
            exit_m: enter_m * 3.0,
        }
    }

    pub fn from_config(config: &TrailConfig) -> Self {
        Self {
            enter_m: config.waypoint_entry_threshold_meters,
            exit_m: config.exit_threshold_meters(),
        }
    }
}

/// Per-waypoint state, indexed by waypoint position.
#[derive(Debug, Clone, Copy)]
struct VisitState {
    active: bool,
    best_distance: f64,
    best_index: usize,
}

impl Default for VisitState {
    fn default() -> Self {
        Self {
            active: false,
            best_distance: f64::INFINITY,
            best_index: 0,
        }
    }
}

impl VisitState {
    fn activate(&mut self, distance: f64, track_index: usize) {
        self.active = true;
        self.best_distance = distance;
        self.best_index = track_index;
    }

    fn observe(&mut self, distance: f64, track_index: usize) {
        if distance < self.best_distance {
            self.best_distance = distance;
            self.best_index = track_index;
        }
    }

    fn close<'a>(&mut self, waypoint_index: usize, waypoint: &'a Waypoint) -> WaypointVisit<'a> {
        self.active = false;
        WaypointVisit {
            waypoint_index,
            waypoint,
            track_index: self.best_index,
            distance_from_track_meters: self.best_distance,
        }
    }
}

/// Detect every approach of `track` to each waypoint.
///
/// Single forward pass over the track. Inactive waypoints are looked up
/// through an R-tree (only those within the enter radius of the current
/// point are examined); active ones are re-measured at every point.
///
/// Visits come back sorted by track index, ties by waypoint position.
///
/// # Example
/// ```
/// use trail_enricher::{detect_visits, RawPoint, Waypoint};
/// use trail_enricher::waypoints::VisitThresholds;
///
/// let track: Vec<RawPoint> = (0..20).map(|i| RawPoint::new(0.0, i as f64 * 0.001, 0.0)).collect();
/// let waypoints = vec![Waypoint::new("Bridge", 0.0005, 0.0101, "crossing")];
///
/// let visits = detect_visits(&track, &waypoints, &VisitThresholds::new(200.0));
/// assert_eq!(visits.len(), 1);
/// assert_eq!(visits[0].track_index, 10);
/// ```
pub fn detect_visits<'a, P: LatLon>(
    track: &[P],
    waypoints: &'a [Waypoint],
    thresholds: &VisitThresholds,
) -> Vec<WaypointVisit<'a>> {
    if track.is_empty() || waypoints.is_empty() {
        return Vec::new();
    }

    let tree = build_rtree(waypoints);
    let mut states = vec![VisitState::default(); waypoints.len()];
    let mut active: Vec<usize> = Vec::new();
    let mut visits: Vec<WaypointVisit<'a>> = Vec::new();

    for (track_index, point) in track.iter().enumerate() {
        active.retain(|&wi| {
            let state = &mut states[wi];
            let distance = haversine_distance(point, &waypoints[wi]);
            state.observe(distance, track_index);
            if distance > thresholds.exit_m {
                visits.push(state.close(wi, &waypoints[wi]));
                false
            } else {
                true
            }
        });

        for wi in points_within(&tree, waypoints, point, thresholds.enter_m) {
            let state = &mut states[wi];
            if !state.active {
                state.activate(haversine_distance(point, &waypoints[wi]), track_index);
                active.push(wi);
            }
        }
    }

    for wi in active {
        visits.push(states[wi].close(wi, &waypoints[wi]));
    }

    visits.sort_by(|a, b| {
        a.track_index
            .cmp(&b.track_index)
            .then(a.waypoint_index.cmp(&b.waypoint_index))
    });

    let never_visited = states.iter().filter(|s| s.best_distance.is_infinite()).count();
    debug!(
        "[Waypoints] {} visits for {} waypoints over {} points ({} never within {:.0}m)",
        visits.len(),
        waypoints.len(),
        track.len(),
        never_visited,
        thresholds.enter_m
    );

    visits
}
