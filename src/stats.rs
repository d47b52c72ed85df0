//! Route statistics: distance, ascent and descent.
//!
//! - [`accumulate_full`] totals a whole point sequence.
//! - [`accumulate_segment`] totals the edges between two track indices.
//! - [`augment_with_distance`] adds the cumulative distance column.
//!
//! Ascent is the sum of all positive elevation deltas, descent the sum of the
//! magnitudes of all negative deltas. Flat edges contribute to neither.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::units::meters_to_km;
use crate::{LatLon, RawPoint, TrackPoint};

/// Anything carrying an elevation in meters.
pub trait Elevated: LatLon {
    fn elevation(&self) -> f64;
}

impl Elevated for RawPoint {
    fn elevation(&self) -> f64 {
        self.elevation
    }
}

impl Elevated for TrackPoint {
    fn elevation(&self) -> f64 {
        self.elevation
    }
}

/// Distance and elevation totals over a stretch of track. Unrounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub distance_km: f64,
    pub ascent_m: f64,
    pub descent_m: f64,
}

impl RouteStats {
    fn add_edge<P: Elevated>(&mut self, from: &P, to: &P) {
        self.distance_km += meters_to_km(haversine_distance(from, to));
        let delta = to.elevation() - from.elevation();
        if delta > 0.0 {
            self.ascent_m += delta;
        } else if delta < 0.0 {
            self.descent_m -= delta;
        }
    }
}

impl AddAssign for RouteStats {
    fn add_assign(&mut self, other: Self) {
        self.distance_km += other.distance_km;
        self.ascent_m += other.ascent_m;
        self.descent_m += other.descent_m;
    }
}

/// Total distance, ascent and descent of an ordered point sequence.
///
/// # Example
/// ```
/// use trail_enricher::{accumulate_full, RawPoint};
///
/// let points = vec![
///     RawPoint::new(0.0, 0.000, 100.0),
///     RawPoint::new(0.0, 0.001, 110.0),
///     RawPoint::new(0.0, 0.002, 90.0),
///     RawPoint::new(0.0, 0.003, 130.0),
/// ];
/// let stats = accumulate_full(&points);
/// assert_eq!(stats.ascent_m, 50.0);
/// assert_eq!(stats.descent_m, 20.0);
/// assert!((stats.distance_km - 0.333).abs() < 0.001);
/// ```
pub fn accumulate_full<P: Elevated>(points: &[P]) -> RouteStats {
    let mut stats = RouteStats::default();
    for w in points.windows(2) {
        stats.add_edge(&w[0], &w[1]);
    }
    stats
}

/// Stats for travelling from point `from_index` to point `to_index`.
///
/// Covers the half-open range of edges `[from_index, to_index)`, where edge
/// `i` joins point `i` to point `i + 1`. Indices are clamped to the track;
/// empty or inverted ranges give zero stats.
pub fn accumulate_segment<P: Elevated>(
    points: &[P],
    from_index: usize,
    to_index: usize,
) -> RouteStats {
    let last = points.len().saturating_sub(1);
    let from = from_index.min(last);
    let to = to_index.min(last);

    let mut stats = RouteStats::default();
    if from >= to {
        return stats;
    }
    for w in points[from..=to].windows(2) {
        stats.add_edge(&w[0], &w[1]);
    }
    stats
}

/// Attach the cumulative distance column to raw points.
pub fn augment_with_distance(points: &[RawPoint]) -> Vec<TrackPoint> {
    let mut cumulative_km = 0.0;
    let mut out = Vec::with_capacity(points.len());

    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            cumulative_km += meters_to_km(haversine_distance(&points[i - 1], p));
        }
        out.push(TrackPoint::new(p.lat, p.lon, p.elevation, cumulative_km));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_point_track() -> Vec<RawPoint> {
        vec![
            RawPoint::new(0.0, 0.000, 100.0),
            RawPoint::new(0.0, 0.001, 110.0),
            RawPoint::new(0.0, 0.002, 90.0),
            RawPoint::new(0.0, 0.003, 130.0),
        ]
    }

    #[test]
    fn test_accumulate_full() {
        let stats = accumulate_full(&four_point_track());
        assert_eq!(stats.ascent_m, 50.0);
        assert_eq!(stats.descent_m, 20.0);
        assert!((stats.distance_km - 3.0 * 0.111_195).abs() < 1e-4);
    }

    #[test]
    fn test_accumulate_full_degenerate() {
        let empty: Vec<RawPoint> = vec![];
        assert_eq!(accumulate_full(&empty), RouteStats::default());
        assert_eq!(
            accumulate_full(&[RawPoint::new(1.0, 1.0, 500.0)]),
            RouteStats::default()
        );
    }

    #[test]
    fn test_flat_track_has_no_ascent() {
        let track: Vec<RawPoint> = (0..5)
            .map(|i| RawPoint::new(0.0, i as f64 * 0.001, 42.0))
            .collect();
        let stats = accumulate_full(&track);
        assert_eq!(stats.ascent_m, 0.0);
        assert_eq!(stats.descent_m, 0.0);
    }

    #[test]
    fn test_accumulate_segment() {
        let track = four_point_track();

        let seg = accumulate_segment(&track, 1, 3);
        assert_eq!(seg.ascent_m, 40.0);
        assert_eq!(seg.descent_m, 20.0);

        let seg = accumulate_segment(&track, 0, 1);
        assert_eq!(seg.ascent_m, 10.0);
        assert_eq!(seg.descent_m, 0.0);
    }

    #[test]
    fn test_segments_sum_to_full() {
        let track = four_point_track();
        let mut total = accumulate_segment(&track, 0, 2);
        total += accumulate_segment(&track, 2, 3);
        let full = accumulate_full(&track);
        assert!((total.distance_km - full.distance_km).abs() < 1e-12);
        assert_eq!(total.ascent_m, full.ascent_m);
        assert_eq!(total.descent_m, full.descent_m);
    }

    #[test]
    fn test_accumulate_segment_clamps() {
        let track = four_point_track();
        assert_eq!(accumulate_segment(&track, 0, 100), accumulate_full(&track));
        assert_eq!(accumulate_segment(&track, 2, 2), RouteStats::default());
        assert_eq!(accumulate_segment(&track, 3, 1), RouteStats::default());

        let empty: Vec<RawPoint> = vec![];
        assert_eq!(accumulate_segment(&empty, 0, 5), RouteStats::default());
    }

    #[test]
    fn test_augment_with_distance() {
        let augmented = augment_with_distance(&four_point_track());
        assert_eq!(augmented.len(), 4);
        assert_eq!(augmented[0].cumulative_distance_km, 0.0);
        for w in augmented.windows(2) {
            assert!(w[1].cumulative_distance_km >= w[0].cumulative_distance_km);
        }
        assert!((augmented[3].cumulative_distance_km - 0.3336).abs() < 1e-3);
        assert_eq!(augmented[2].elevation, 90.0);
    }

    #[test]
    fn test_augment_empty() {
        assert!(augment_with_distance(&[]).is_empty());
    }
}
