//! Adaptive display simplification.
//!
//! Reduces a dense track to roughly a target number of points without a
//! hand-tuned tolerance. The tolerance grows logarithmically with how far the
//! point count exceeds the target, and linearly with trail length (long
//! trails are viewed further zoomed out):
//!
//! ```text
//! tolerance = 5 + 5 × log2(N / T) × (1 + distance_km / 500)   [meters]
//! ```
//!
//! The tolerance drives an iterative Douglas-Peucker pass over coordinates
//! projected onto a local plane in meters. Output points are always a subset
//! of the input (same values, same order) with both endpoints kept.

use geo::Coord;
use log::debug;

use crate::geo_utils::{normalize_lon_delta, EARTH_RADIUS_M};
use crate::LatLon;

/// Tolerance floor in meters.
pub const MIN_TOLERANCE_M: f64 = 5.0;
/// Meters of tolerance per doubling of N over the target.
pub const TOLERANCE_MULTIPLIER: f64 = 5.0;
/// Trail length at which the tolerance doubles.
pub const DISTANCE_SCALE_KM: f64 = 500.0;

/// Result of adaptive simplification.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifiedTrack<P> {
    pub points: Vec<P>,
    /// Tolerance used, in meters (0 when no simplification was needed)
    pub tolerance_m: f64,
}

/// Simplification tolerance in meters for `point_count` points.
///
/// Returns 0.0 when the track is already at or below the target.
///
/// # Example
/// ```
/// use trail_enricher::adaptive_tolerance;
///
/// assert_eq!(adaptive_tolerance(2000, 3000, 120.0), 0.0);
/// assert_eq!(adaptive_tolerance(6000, 3000, 0.0), 10.0);
/// assert_eq!(adaptive_tolerance(6000, 3000, 500.0), 15.0);
/// ```
pub fn adaptive_tolerance(point_count: usize, target_count: usize, total_distance_km: f64) -> f64 {
    if point_count <= target_count || target_count == 0 {
        return 0.0;
    }
    let ratio = point_count as f64 / target_count as f64;
    MIN_TOLERANCE_M
        + TOLERANCE_MULTIPLIER * ratio.log2() * (1.0 + total_distance_km / DISTANCE_SCALE_KM)
}

/// Simplify `points` towards `target_count` points for display.
///
/// Tracks at or below the target come back unchanged.
pub fn simplify_adaptive<P: LatLon + Clone>(
    points: &[P],
    target_count: usize,
    total_distance_km: f64,
) -> SimplifiedTrack<P> {
    let tolerance_m = adaptive_tolerance(points.len(), target_count, total_distance_km);
    if tolerance_m == 0.0 {
        return SimplifiedTrack {
            points: points.to_vec(),
            tolerance_m,
        };
    }

    let simplified = douglas_peucker(points, tolerance_m);
    debug!(
        "[Simplify] {} -> {} points (target {}, tolerance {:.1}m, {:.1}km)",
        points.len(),
        simplified.len(),
        target_count,
        tolerance_m,
        total_distance_km
    );

    SimplifiedTrack {
        points: simplified,
        tolerance_m,
    }
}

/// Douglas-Peucker simplification with a tolerance in meters.
pub fn douglas_peucker<P: LatLon + Clone>(points: &[P], tolerance_m: f64) -> Vec<P> {
    douglas_peucker_indices(points, tolerance_m)
        .into_iter()
        .map(|i| points[i].clone())
        .collect()
}

/// Douglas-Peucker simplification returning the indices of kept points.
///
/// A point is kept when its distance to the chord of its current range is
/// strictly greater than `tolerance_m`. Uses an explicit range stack, so
/// very long tracks cannot exhaust the call stack.
pub fn douglas_peucker_indices<P: LatLon>(points: &[P], tolerance_m: f64) -> Vec<usize> {
    let n = points.len();
    if n < 3 {
        return (0..n).collect();
    }

    let projected = project_local(points);
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack: Vec<(usize, usize)> = vec![(0, n - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let a = projected[start];
        let b = projected[end];
        let mut max_distance = 0.0;
        let mut max_index = start;

        for (i, &p) in projected.iter().enumerate().take(end).skip(start + 1) {
            let d = distance_to_segment(p, a, b);
            if d > max_distance {
                max_distance = d;
                max_index = i;
            }
        }

        if max_distance > tolerance_m {
            keep[max_index] = true;
            stack.push((start, max_index));
            stack.push((max_index, end));
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| if k { Some(i) } else { None })
        .collect()
}

/// Equirectangular projection to meters around the track's mean latitude,
/// with longitudes unwrapped relative to the first point.
fn project_local<P: LatLon>(points: &[P]) -> Vec<Coord<f64>> {
    let mean_lat = points.iter().map(|p| p.lat()).sum::<f64>() / points.len() as f64;
    let cos_lat = mean_lat.to_radians().cos().max(1e-6);
    let lon0 = points[0].lon();

    points
        .iter()
        .map(|p| Coord {
            x: EARTH_RADIUS_M * normalize_lon_delta(p.lon() - lon0).to_radians() * cos_lat,
            y: EARTH_RADIUS_M * p.lat().to_radians(),
        })
        .collect()
}

/// Distance from `p` to the segment `a`-`b` in the projected plane.
fn distance_to_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let (apx, apy) = (p.x - a.x, p.y - a.y);
    let len_sq = abx * abx + aby * aby;

    if len_sq == 0.0 {
        return apx.hypot(apy);
    }

    let t = ((apx * abx + apy * aby) / len_sq).clamp(0.0, 1.0);
    let dx = apx - t * abx;
    let dy = apy - t * aby;
    dx.hypot(dy)
}
