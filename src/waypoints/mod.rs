//! # Waypoint Visits and Enrichment
//!
//! Matches named waypoints against a track and annotates each visit with
//! distance and elevation totals.
//!
//! ## Algorithm
//! 1. Walk the track once, tracking a hysteresis state per waypoint
//!    (enter within `dEnter`, leave beyond `dExit = factor × dEnter`)
//! 2. Emit one visit per approach, at the closest point of that approach
//! 3. Sort visits into track order
//! 4. Walk visits, accumulating segment stats between consecutive visits
//!
//! A switchback that brushes past a waypoint several times without ever
//! leaving the exit radius produces a single visit. A waypoint the track
//! never comes within `dEnter` of is simply absent from the output.

mod enrich;
mod visits;

use serde::{Deserialize, Serialize};

use crate::units;
use crate::Waypoint;

pub use enrich::enrich_waypoints;
pub use visits::{detect_visits, VisitThresholds};

/// A single approach of the track to a waypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaypointVisit<'a> {
    /// Position of the waypoint in the input list
    pub waypoint_index: usize,
    pub waypoint: &'a Waypoint,
    /// Index of the closest track point during this approach
    pub track_index: usize,
    pub distance_from_track_meters: f64,
}

/// A waypoint annotated with where it sits along the trail.
///
/// Segment values cover the stretch since the previous waypoint (or the
/// trail start); cumulative values run from the trail start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedWaypoint {
    #[serde(flatten)]
    pub waypoint: Waypoint,
    /// Track elevation at the visit, whole meters
    pub elevation: f64,
    pub segment_distance_km: f64,
    pub cumulative_distance_km: f64,
    pub segment_ascent_m: f64,
    pub segment_descent_m: f64,
    pub cumulative_ascent_m: f64,
    pub cumulative_descent_m: f64,
    /// Index into the unsimplified track
    pub track_index: usize,
}

impl EnrichedWaypoint {
    pub(crate) fn from_totals(
        visit: &WaypointVisit<'_>,
        elevation: f64,
        segment: &crate::RouteStats,
        cumulative: &crate::RouteStats,
    ) -> Self {
        Self {
            waypoint: visit.waypoint.clone(),
            elevation: units::round_m(elevation),
            segment_distance_km: units::round_km(segment.distance_km),
            cumulative_distance_km: units::round_km(cumulative.distance_km),
            segment_ascent_m: units::round_m(segment.ascent_m),
            segment_descent_m: units::round_m(segment.descent_m),
            cumulative_ascent_m: units::round_m(cumulative.ascent_m),
            cumulative_descent_m: units::round_m(cumulative.descent_m),
            track_index: visit.track_index,
        }
    }
}
