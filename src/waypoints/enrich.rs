//! Cumulative distance and elevation per waypoint visit.

use super::{EnrichedWaypoint, WaypointVisit};
use crate::stats::{accumulate_segment, RouteStats};
use crate::TrackPoint;

/// Annotate track-ordered visits with segment and cumulative stats.
///
/// Segments run from the previous visit's track index (starting at 0) to
/// the current one. Running totals are kept unrounded; rounding happens only
/// on the emitted values, so cumulative fields never decrease.
pub fn enrich_waypoints(
    track: &[TrackPoint],
    visits: &[WaypointVisit<'_>],
) -> Vec<EnrichedWaypoint> {
    let mut cumulative = RouteStats::default();
    let mut cursor = 0;

    visits
        .iter()
        .map(|visit| {
            let segment = accumulate_segment(track, cursor, visit.track_index);
            cumulative += segment;
            cursor = visit.track_index;

            let elevation = track
                .get(visit.track_index)
                .map(|p| p.elevation)
                .unwrap_or_default();
            EnrichedWaypoint::from_totals(visit, elevation, &segment, &cumulative)
        })
        .collect()
}
