//! # Geographic Utilities
//!
//! Core geographic computations shared by every pipeline stage.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`distance_meters`] | Haversine distance between two lat/lon pairs |
//! | [`haversine_distance`] | Same, for any two [`LatLon`] values |
//! | [`polyline_length`] | Total length of a track in meters |
//! | [`compute_bounds`] | Bounding box of a track |
//!
//! ## Example
//!
//! ```rust
//! use trail_enricher::geo_utils;
//!
//! let london_to_paris = geo_utils::distance_meters(51.5074, -0.1278, 48.8566, 2.3522);
//! assert!((london_to_paris - 343_500.0).abs() < 1000.0);
//! ```
//!
//! ## Haversine Formula
//!
//! Spherical Earth with radius 6,371 km. The intermediate haversine term is
//! clamped to `[0, 1]` so that rounding on antipodal or coincident inputs can
//! never produce `NaN`. Coordinates are not validated here; callers validate
//! upstream.

use geo::{BoundingRect, Coord, LineString};

use crate::{Bounds, LatLon};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance in meters between two WGS84 coordinates (degrees).
///
/// Always finite and non-negative for finite input.
#[inline]
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    // Absolute deltas keep the result bitwise symmetric in its arguments
    let d_phi = (lat2 - lat1).abs().to_radians();
    let d_lambda = (lon2 - lon1).abs().to_radians();

    let sin_d_phi = (d_phi / 2.0).sin();
    let sin_d_lambda = (d_lambda / 2.0).sin();
    let a = sin_d_phi * sin_d_phi + phi1.cos() * phi2.cos() * sin_d_lambda * sin_d_lambda;
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

/// Great-circle distance in meters between any two points.
///
/// # Example
///
/// ```rust
/// use trail_enricher::{geo_utils, RawPoint, Waypoint};
///
/// let point = RawPoint::new(0.0, 0.0, 0.0);
/// let hut = Waypoint::new("Hut", 0.0, 0.001, "shelter");
/// let d = geo_utils::haversine_distance(&point, &hut);
/// assert!((d - 111.2).abs() < 0.1);
/// ```
#[inline]
pub fn haversine_distance<A: LatLon + ?Sized, B: LatLon + ?Sized>(a: &A, b: &B) -> f64 {
    distance_meters(a.lat(), a.lon(), b.lat(), b.lon())
}

/// Total length of a polyline in meters.
///
/// Empty or single-point tracks return 0.0.
pub fn polyline_length<P: LatLon>(points: &[P]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Normalize a longitude difference into `[-180, 180]` degrees.
#[inline]
pub fn normalize_lon_delta(delta: f64) -> f64 {
    let wrapped = (delta + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 to -180; keep the sign of the input on the boundary
    if wrapped == -180.0 && delta > 0.0 {
        180.0
    } else {
        wrapped
    }
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a track.
///
/// Returns `None` for an empty track.
pub fn compute_bounds<P: LatLon>(points: &[P]) -> Option<Bounds> {
    let line: LineString<f64> = points
        .iter()
        .map(|p| Coord {
            x: p.lon(),
            y: p.lat(),
        })
        .collect();
    let rect = line.bounding_rect()?;

    Some(Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lon: rect.min().x,
        max_lon: rect.max().x,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
