//! # Algorithm Toolbox
//!
//! Direct access to every pipeline stage. Use these to run a single stage
//! (simplify a track, find waypoint visits, anchor a variant) inside your
//! own system without going through [`process_trail`](crate::process_trail).
//!
//! ## Stages
//!
//! - **Simplification**: adaptive Douglas-Peucker in meters
//! - **Route Statistics**: distance, ascent and descent, whole or per segment
//! - **Waypoint Visits**: hysteresis proximity detection and enrichment
//! - **Variant Junctions**: branch/rejoin anchoring on the main track
//! - **Track Combining**: chaining multiple main tracks
//!
//! # Example
//!
//! ```rust
//! use trail_enricher::algorithms::{
//!     accumulate_segment, augment_with_distance, detect_visits, enrich_waypoints,
//!     RawPoint, VisitThresholds, Waypoint,
//! };
//!
//! let raw: Vec<RawPoint> = (0..50)
//!     .map(|i| RawPoint::new(0.0, i as f64 * 0.001, 1000.0 + i as f64 * 5.0))
//!     .collect();
//! let track = augment_with_distance(&raw);
//!
//! // Climb between points 10 and 20
//! let climb = accumulate_segment(&track, 10, 20);
//! assert_eq!(climb.ascent_m, 50.0);
//!
//! let waypoints = vec![Waypoint::new("Tarn", 0.0002, 0.030, "water")];
//! let visits = detect_visits(&track, &waypoints, &VisitThresholds::new(200.0));
//! let enriched = enrich_waypoints(&track, &visits);
//! assert_eq!(enriched[0].track_index, 30);
//! assert_eq!(enriched[0].cumulative_ascent_m, 150.0);
//! ```

// =============================================================================
// Core Types (re-exported from lib)
// =============================================================================

pub use crate::{Bounds, LatLon, RawPoint, TrackPoint, TrailConfig, Waypoint};

// =============================================================================
// Geographic Utilities
// =============================================================================

pub use crate::geo_utils::{
    compute_bounds, distance_meters, haversine_distance, normalize_lon_delta, polyline_length,
};

// =============================================================================
// Spatial Index
// =============================================================================

pub use crate::spatial::{build_rtree, nearest_point, points_within, IndexedPoint};

// =============================================================================
// Line Simplification
// =============================================================================

/// Tolerance in meters for a track of `point_count` points and given length.
pub use crate::simplify::adaptive_tolerance;
/// Douglas-Peucker with a fixed tolerance in meters
pub use crate::simplify::douglas_peucker;
/// Douglas-Peucker returning kept indices
pub use crate::simplify::douglas_peucker_indices;
/// Adaptive simplification towards a target point count
pub use crate::simplify::{simplify_adaptive, SimplifiedTrack};

// =============================================================================
// Route Statistics
// =============================================================================

pub use crate::stats::{
    accumulate_full, accumulate_segment, augment_with_distance, Elevated, RouteStats,
};

// =============================================================================
// Waypoint Visits
// =============================================================================

/// Hysteresis visit detection.
///
/// Single forward pass with per-waypoint enter/exit state:
/// 1. Inactive waypoint within the enter radius: activate
/// 2. Active waypoint: track the closest approach
/// 3. Active waypoint beyond the exit radius: emit a visit at the closest approach
pub use crate::waypoints::detect_visits;
/// Segment and cumulative stats per visit
pub use crate::waypoints::enrich_waypoints;
pub use crate::waypoints::{EnrichedWaypoint, VisitThresholds, WaypointVisit};

// =============================================================================
// Variant Junctions
// =============================================================================

pub use crate::variants::{
    build_variant, build_variants, resolve_junctions, Junction, JunctionRules, MainTrackIndex,
    RouteVariant, VariantInput, VariantKind,
};

// =============================================================================
// Track Combining
// =============================================================================

pub use crate::combine::{combine_geographically, CombinedTrack, GapWarning, NamedTrack};

/// Reconcile simplified points back onto the full track
pub use crate::pipeline::reconcile_display_points;
