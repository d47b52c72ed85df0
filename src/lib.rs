//! # Trail Enricher
//!
//! Turns raw GPS trail recordings into a normalized, statistically-enriched
//! trail model ready for rendering and querying.
//!
//! This library provides:
//! - Adaptive Douglas-Peucker simplification for display geometry
//! - Waypoint visit detection with enter/exit hysteresis
//! - Cumulative distance, ascent and descent per waypoint
//! - Branch/rejoin junction resolution for alternates and side trips
//!
//! ## Features
//!
//! - **`parallel`** - Enable worker-per-trail batch processing with rayon
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use trail_enricher::{process_trail, RawPoint, TrailConfig, TrailInput, Waypoint};
//!
//! let input = TrailInput {
//!     id: "ridge-walk".to_string(),
//!     points: vec![
//!         RawPoint::new(0.0, 0.000, 100.0),
//!         RawPoint::new(0.0, 0.001, 110.0),
//!         RawPoint::new(0.0, 0.002, 90.0),
//!         RawPoint::new(0.0, 0.003, 130.0),
//!     ],
//!     waypoints: vec![Waypoint::new("Summit", 0.0, 0.003, "peak")],
//!     variants: vec![],
//! };
//!
//! let trail = process_trail(&input, &TrailConfig::default()).unwrap();
//! assert_eq!(trail.model.total_ascent_m, 50.0);
//! assert_eq!(trail.model.waypoints.len(), 1);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TrailError};

// Pipeline configuration
pub mod config;
pub use config::TrailConfig;

// Output units and rounding
pub mod units;

// Geographic utilities (haversine distance, polyline length, bounds)
pub mod geo_utils;
pub use geo_utils::{distance_meters, haversine_distance};

// R-tree spatial index over sphere-projected points
pub mod spatial;

// Route statistics (distance, ascent, descent)
pub mod stats;
pub use stats::{accumulate_full, accumulate_segment, augment_with_distance, RouteStats};

// Adaptive display simplification
pub mod simplify;
pub use simplify::{adaptive_tolerance, simplify_adaptive, SimplifiedTrack};

// Waypoint visit detection and enrichment
pub mod waypoints;
pub use waypoints::{detect_visits, enrich_waypoints, EnrichedWaypoint, WaypointVisit};

// Alternate / side-trip junction resolution
pub mod variants;
pub use variants::{resolve_junctions, Junction, RouteVariant, VariantInput, VariantKind};

// Combining multiple main tracks into one
pub mod combine;
pub use combine::{combine_geographically, ClassifiedTracks, CombinedTrack, GapWarning, NamedTrack};

// Per-trail pipeline and batch driver
pub mod pipeline;
#[cfg(feature = "parallel")]
pub use pipeline::process_trails_parallel;
pub use pipeline::{
    process_classified, process_trail, process_trails, PipelineWarning, ProcessedTrail,
    ProcessingReport, TrailInput, TrailModel, TrailOutcome,
};

// Algorithm toolbox - standalone access to every pipeline stage
pub mod algorithms;

// ============================================================================
// Core Types
// ============================================================================

/// Anything with a WGS84 latitude/longitude in degrees.
///
/// Lets the distance primitive, the simplifier and the spatial index work
/// directly on raw points, track points and waypoints without conversion.
pub trait LatLon {
    fn lat(&self) -> f64;
    fn lon(&self) -> f64;

    /// Check if the coordinates are finite and within WGS84 range.
    fn has_valid_coordinates(&self) -> bool {
        let (lat, lon) = (self.lat(), self.lon());
        lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon)
    }
}

/// A raw GPS sample as recorded, before any enrichment.
///
/// # Example
/// ```
/// use trail_enricher::RawPoint;
/// let point = RawPoint::new(56.7967, -5.0042, 1345.0); // Ben Nevis
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub lat: f64,
    pub lon: f64,
    /// Elevation in meters
    #[serde(default)]
    pub elevation: f64,
}

impl RawPoint {
    pub fn new(lat: f64, lon: f64, elevation: f64) -> Self {
        Self {
            lat,
            lon,
            elevation,
        }
    }
}

impl LatLon for RawPoint {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lon(&self) -> f64 {
        self.lon
    }
}

/// A track point augmented with its cumulative distance from the track start.
///
/// `cumulative_distance_km` is 0 for the first point and never decreases
/// along a track. Values are kept at full precision; JSON output rounds them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(serialize_with = "units::serialize_m")]
    pub elevation: f64,
    #[serde(serialize_with = "units::serialize_km")]
    pub cumulative_distance_km: f64,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64, elevation: f64, cumulative_distance_km: f64) -> Self {
        Self {
            lat,
            lon,
            elevation,
            cumulative_distance_km,
        }
    }

    /// Whether this point sits at exactly the same coordinates as `other`.
    #[inline]
    pub fn same_position<P: LatLon>(&self, other: &P) -> bool {
        self.lat == other.lat() && self.lon == other.lon()
    }
}

impl LatLon for TrackPoint {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lon(&self) -> f64 {
        self.lon
    }
}

/// A named point of interest along a trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Free-form category ("water", "campsite", "peak", ...)
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Waypoint {
    pub fn new(name: &str, lat: f64, lon: f64, category: &str) -> Self {
        Self {
            name: name.to_string(),
            lat,
            lon,
            category: category.to_string(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

impl LatLon for Waypoint {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lon(&self) -> f64 {
        self.lon
    }
}

/// Bounding box of a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Get the center point of the bounds as (lat, lon).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
