//! R-tree indexed point types and spatial query utilities.
//!
//! Points are placed on a sphere of Earth radius in 3-D cartesian space.
//! Straight-line (chord) distance there is a monotone function of
//! great-circle distance, so nearest-neighbor and within-distance queries
//! give the same answers as an exhaustive haversine scan, with no
//! antimeridian or polar special cases. Every query re-checks candidates
//! with the haversine primitive before reporting them.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geo_utils::{haversine_distance, EARTH_RADIUS_M};
use crate::LatLon;

/// Chord slack (meters) when translating haversine thresholds to chords.
const CHORD_MARGIN_M: f64 = 0.01;

/// A point with its index into the source slice for R-tree queries
#[derive(Debug, Clone, Copy)]
pub struct IndexedPoint {
    pub idx: usize,
    pub xyz: [f64; 3],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xyz)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.xyz[0] - point[0];
        let dy = self.xyz[1] - point[1];
        let dz = self.xyz[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Project a lat/lon (degrees) onto the Earth-radius sphere.
#[inline]
pub fn to_cartesian(lat: f64, lon: f64) -> [f64; 3] {
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
    [
        EARTH_RADIUS_M * cos_lat * cos_lon,
        EARTH_RADIUS_M * cos_lat * sin_lon,
        EARTH_RADIUS_M * sin_lat,
    ]
}

/// Chord length (meters) subtended by a great-circle arc of `meters`.
#[inline]
pub fn chord_for_arc(meters: f64) -> f64 {
    let half_angle = (meters / (2.0 * EARTH_RADIUS_M)).min(std::f64::consts::FRAC_PI_2);
    2.0 * EARTH_RADIUS_M * half_angle.sin()
}

/// Build R-tree from points for efficient spatial queries
pub fn build_rtree<P: LatLon>(points: &[P]) -> RTree<IndexedPoint> {
    let indexed: Vec<IndexedPoint> = points
        .iter()
        .enumerate()
        .map(|(i, p)| IndexedPoint {
            idx: i,
            xyz: to_cartesian(p.lat(), p.lon()),
        })
        .collect();
    RTree::bulk_load(indexed)
}

/// Nearest indexed point to `query` by haversine distance.
///
/// Returns `(index, distance_meters)`. Equidistant points resolve to the
/// lowest index, exactly as a forward linear scan keeping the first minimum
/// would.
pub fn nearest_point<P: LatLon, Q: LatLon>(
    tree: &RTree<IndexedPoint>,
    points: &[P],
    query: &Q,
) -> Option<(usize, f64)> {
    let q = to_cartesian(query.lat(), query.lon());
    let mut candidates = tree.nearest_neighbor_iter_with_distance_2(&q);

    let (first, first_d2) = candidates.next()?;
    let cutoff = first_d2.sqrt() + CHORD_MARGIN_M;

    let mut best_idx = first.idx;
    let mut best_dist = haversine_distance(&points[first.idx], query);

    for (candidate, d2) in candidates {
        if d2.sqrt() > cutoff {
            break;
        }
        let dist = haversine_distance(&points[candidate.idx], query);
        if dist < best_dist || (dist == best_dist && candidate.idx < best_idx) {
            best_idx = candidate.idx;
            best_dist = dist;
        }
    }

    Some((best_idx, best_dist))
}

/// Indices of all points within `meters` (haversine) of `query`, unsorted.
pub fn points_within<P: LatLon, Q: LatLon>(
    tree: &RTree<IndexedPoint>,
    points: &[P],
    query: &Q,
    meters: f64,
) -> Vec<usize> {
    let q = to_cartesian(query.lat(), query.lon());
    let chord = chord_for_arc(meters) + CHORD_MARGIN_M;

    tree.locate_within_distance(q, chord * chord)
        .filter(|p| haversine_distance(&points[p.idx], query) <= meters)
        .map(|p| p.idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::distance_meters;
    use crate::RawPoint;

    fn brute_force_nearest(points: &[RawPoint], query: &RawPoint) -> (usize, f64) {
        let mut best = (0, f64::INFINITY);
        for (i, p) in points.iter().enumerate() {
            let d = haversine_distance(p, query);
            if d < best.1 {
                best = (i, d);
            }
        }
        best
    }

    fn wiggly_track() -> Vec<RawPoint> {
        (0..200)
            .map(|i| {
                let t = i as f64;
                RawPoint::new(46.0 + t * 0.0005, 7.0 + (t * 0.3).sin() * 0.002, 0.0)
            })
            .collect()
    }

    #[test]
    fn test_chord_is_shorter_than_arc() {
        for meters in [1.0, 500.0, 10_000.0, 1_000_000.0] {
            let chord = chord_for_arc(meters);
            assert!(chord <= meters);
            assert!(chord > meters * 0.99);
        }
    }

    #[test]
    fn test_cartesian_chord_matches_haversine() {
        let a = to_cartesian(46.0, 7.0);
        let b = to_cartesian(46.001, 7.001);
        let chord = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt();
        let arc = distance_meters(46.0, 7.0, 46.001, 7.001);
        assert!((chord_for_arc(arc) - chord).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let track = wiggly_track();
        let tree = build_rtree(&track);
        let queries = [
            RawPoint::new(46.01, 7.001, 0.0),
            RawPoint::new(46.05, 6.99, 0.0),
            RawPoint::new(45.99, 7.0, 0.0),
            RawPoint::new(46.2, 7.2, 0.0),
        ];
        for q in &queries {
            let (idx, dist) = nearest_point(&tree, &track, q).unwrap();
            let (bf_idx, bf_dist) = brute_force_nearest(&track, q);
            assert_eq!(idx, bf_idx);
            assert!((dist - bf_dist).abs() < 1e-9);
        }
    }

    #[test]
    fn test_nearest_tie_prefers_lowest_index() {
        // Out-and-back: the same coordinates appear at index 1 and 3
        let track = vec![
            RawPoint::new(0.0, 0.000, 0.0),
            RawPoint::new(0.0, 0.001, 0.0),
            RawPoint::new(0.0, 0.002, 0.0),
            RawPoint::new(0.0, 0.001, 0.0),
            RawPoint::new(0.0, 0.000, 0.0),
        ];
        let tree = build_rtree(&track);
        let (idx, _) = nearest_point(&tree, &track, &RawPoint::new(0.0001, 0.001, 0.0)).unwrap();
        assert_eq!(idx, 1);
        let (idx, _) = nearest_point(&tree, &track, &RawPoint::new(0.0, -0.0001, 0.0)).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_nearest_empty() {
        let empty: Vec<RawPoint> = vec![];
        let tree = build_rtree(&empty);
        assert!(nearest_point(&tree, &empty, &RawPoint::new(0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_points_within_matches_brute_force() {
        let track = wiggly_track();
        let tree = build_rtree(&track);
        let query = RawPoint::new(46.03, 7.0, 0.0);

        let mut found = points_within(&tree, &track, &query, 300.0);
        found.sort_unstable();

        let expected: Vec<usize> = track
            .iter()
            .enumerate()
            .filter(|(_, p)| haversine_distance(*p, &query) <= 300.0)
            .map(|(i, _)| i)
            .collect();
        assert!(!expected.is_empty());
        assert_eq!(found, expected);
    }

    #[test]
    fn test_points_within_across_antimeridian() {
        let points = vec![
            RawPoint::new(0.0, 179.9995, 0.0),
            RawPoint::new(0.0, -179.9995, 0.0),
            RawPoint::new(0.0, 170.0, 0.0),
        ];
        let tree = build_rtree(&points);
        let mut found = points_within(&tree, &points, &RawPoint::new(0.0, 180.0, 0.0), 100.0);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }
}
