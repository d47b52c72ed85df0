//! # Trail Pipeline
//!
//! Per-trail orchestration and the batch driver.
//!
//! ## Stages
//! 1. Validate coordinates and elevations, attach cumulative distance
//! 2. Simplify a display copy and reconcile it back onto track points
//! 3. Detect and enrich waypoint visits on the unsimplified track
//! 4. Resolve variant junctions on the unsimplified track
//!
//! Every stage works on the full track; only the display copy is simplified.
//! A trail that fails validation is reported as a failed outcome and never
//! aborts the rest of the batch.

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::combine::{combine_geographically, ClassifiedTracks, GapWarning};
use crate::error::{Result, TrailError};
use crate::geo_utils::compute_bounds;
use crate::simplify::simplify_adaptive;
use crate::stats::{accumulate_full, augment_with_distance};
use crate::units::{round_km, round_m};
use crate::variants::{
    build_variants, JunctionRules, MainTrackIndex, RouteVariant, VariantInput, VariantKind,
};
use crate::waypoints::{detect_visits, enrich_waypoints, EnrichedWaypoint, VisitThresholds};
use crate::{Bounds, LatLon, RawPoint, TrackPoint, TrailConfig, Waypoint};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ============================================================================
// Input
// ============================================================================

/// Everything needed to process one trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailInput {
    pub id: String,
    #[serde(default)]
    pub points: Vec<RawPoint>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

impl TrailInput {
    /// Parse a trail from JSON.
    ///
    /// On failure the error carries the trail id if one could be read from
    /// the document, `"unknown"` otherwise.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TrailError::MalformedInput {
            trail_id: salvage_id(json).unwrap_or_else(|| "unknown".to_string()),
            message: e.to_string(),
        })
    }

    /// Build pipeline input from classified tracks.
    ///
    /// Main tracks are chained with [`combine_geographically`]; alternate and
    /// side-trip tracks become variants. Ignored and unclassified tracks are
    /// dropped. Returns the combiner's gap warnings alongside the input.
    pub fn from_classified(
        id: &str,
        classified: &ClassifiedTracks,
        waypoints: Vec<Waypoint>,
        config: &TrailConfig,
    ) -> (Self, Vec<GapWarning>) {
        let combined =
            combine_geographically(&classified.main_tracks, config.track_gap_warning_meters);

        for dropped in classified
            .ignored_tracks
            .iter()
            .chain(&classified.unclassified_tracks)
        {
            debug!(
                "[TrailPipeline] Trail '{}': dropping track '{}' ({} points)",
                id,
                dropped.name,
                dropped.points.len()
            );
        }

        let alternates = classified
            .alternate_tracks
            .iter()
            .map(|t| VariantInput::new(&t.name, VariantKind::Alternate, t.points.clone()));
        let side_trips = classified
            .side_trip_tracks
            .iter()
            .map(|t| VariantInput::new(&t.name, VariantKind::SideTrip, t.points.clone()));

        let input = Self {
            id: id.to_string(),
            points: combined.points,
            waypoints,
            variants: alternates.chain(side_trips).collect(),
        };
        (input, combined.warnings)
    }
}

fn salvage_id(json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    value.get("id")?.as_str().map(str::to_string)
}

// ============================================================================
// Output
// ============================================================================

/// The enriched trail model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailModel {
    /// Full-resolution track with cumulative distance
    pub track_points: Vec<TrackPoint>,
    /// Simplified copy for rendering
    pub display_points: Vec<TrackPoint>,
    pub total_distance_km: f64,
    pub total_ascent_m: f64,
    pub total_descent_m: f64,
    pub waypoints: Vec<EnrichedWaypoint>,
    pub alternates: Vec<RouteVariant>,
    pub side_trips: Vec<RouteVariant>,
}

impl TrailModel {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A degraded but non-fatal result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PipelineWarning {
    /// A simplified point had no exact match on the track
    DisplayPointUnmatched {
        display_index: usize,
        lat: f64,
        lon: f64,
    },
    /// Two combined main tracks did not meet
    TrackGap {
        from_track: String,
        to_track: String,
        gap_meters: f64,
    },
    /// A variant had no points
    EmptyVariant { name: String },
}

impl From<GapWarning> for PipelineWarning {
    fn from(gap: GapWarning) -> Self {
        PipelineWarning::TrackGap {
            from_track: gap.from_track,
            to_track: gap.to_track,
            gap_meters: gap.gap_meters,
        }
    }
}

/// A successfully processed trail with its diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedTrail {
    pub trail_id: String,
    pub model: TrailModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    /// Tolerance used for the display copy (0 when not simplified)
    pub simplification_tolerance_m: f64,
    #[serde(default)]
    pub warnings: Vec<PipelineWarning>,
}

/// The result of processing one trail in a batch.
#[derive(Debug)]
pub struct TrailOutcome {
    pub trail_id: String,
    pub result: Result<ProcessedTrail>,
}

/// Per-trail outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct ProcessingReport {
    pub outcomes: Vec<TrailOutcome>,
}

impl ProcessingReport {
    /// Successfully processed trails.
    pub fn succeeded(&self) -> impl Iterator<Item = &ProcessedTrail> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Failed trails as `(trail_id, error)`.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &TrailError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.trail_id.as_str(), e)))
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Consume the report, keeping only the models of successful trails.
    pub fn into_models(self) -> Vec<TrailModel> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .map(|trail| trail.model)
            .collect()
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Process a single trail.
///
/// Fails only on malformed input: a non-finite or out-of-range coordinate
/// anywhere in the input, a non-finite elevation on a track or variant
/// point, or an invalid config. Empty tracks, waypoint lists and variants
/// produce empty results.
pub fn process_trail(input: &TrailInput, config: &TrailConfig) -> Result<ProcessedTrail> {
    config.validate()?;
    validate_input(input)?;

    let track = augment_with_distance(&input.points);
    let totals = accumulate_full(&track);

    let simplified = simplify_adaptive(
        &input.points,
        config.target_display_point_count,
        totals.distance_km,
    );
    let (display_points, mut warnings) = reconcile_display_points(&track, &simplified.points);

    let visits = detect_visits(&track, &input.waypoints, &VisitThresholds::from_config(config));
    let waypoints = enrich_waypoints(&track, &visits);

    for variant in input.variants.iter().filter(|v| v.points.is_empty()) {
        warn!(
            "[TrailPipeline] Trail '{}': variant '{}' has no points",
            input.id, variant.name
        );
        warnings.push(PipelineWarning::EmptyVariant {
            name: variant.name.clone(),
        });
    }
    let main = MainTrackIndex::new(&track);
    let (alternates, side_trips) =
        build_variants(&input.variants, &main, &JunctionRules::from_config(config));

    let bounds = compute_bounds(&track);

    info!(
        "[TrailPipeline] Trail '{}': {} points ({} display), {:.2}km, +{:.0}m/-{:.0}m, {}/{} waypoints visited, {} alternates, {} side trips, {} warnings",
        input.id,
        track.len(),
        display_points.len(),
        totals.distance_km,
        totals.ascent_m,
        totals.descent_m,
        waypoints.len(),
        input.waypoints.len(),
        alternates.len(),
        side_trips.len(),
        warnings.len()
    );

    Ok(ProcessedTrail {
        trail_id: input.id.clone(),
        model: TrailModel {
            display_points,
            total_distance_km: round_km(totals.distance_km),
            total_ascent_m: round_m(totals.ascent_m),
            total_descent_m: round_m(totals.descent_m),
            waypoints,
            alternates,
            side_trips,
            track_points: track,
        },
        bounds,
        simplification_tolerance_m: simplified.tolerance_m,
        warnings,
    })
}

/// Combine classified tracks and process them as one trail.
///
/// Gap warnings from the combiner come first in the trail's warnings.
pub fn process_classified(
    id: &str,
    classified: &ClassifiedTracks,
    waypoints: Vec<Waypoint>,
    config: &TrailConfig,
) -> Result<ProcessedTrail> {
    let (input, gaps) = TrailInput::from_classified(id, classified, waypoints, config);
    let mut trail = process_trail(&input, config)?;

    let mut warnings: Vec<PipelineWarning> =
        gaps.into_iter().map(PipelineWarning::from).collect();
    warnings.append(&mut trail.warnings);
    trail.warnings = warnings;
    Ok(trail)
}

/// Map simplified points back onto track points by exact position.
///
/// Scans forward from the last match, so a loop that passes the same
/// coordinates twice maps each display point to the right occurrence. A
/// display point with no match becomes a stand-in with zero cumulative
/// distance plus a warning.
pub fn reconcile_display_points(
    track: &[TrackPoint],
    display: &[RawPoint],
) -> (Vec<TrackPoint>, Vec<PipelineWarning>) {
    let mut reconciled = Vec::with_capacity(display.len());
    let mut warnings = Vec::new();
    let mut cursor = 0;

    for (display_index, point) in display.iter().enumerate() {
        let found = track[cursor.min(track.len())..]
            .iter()
            .position(|t| t.same_position(point))
            .map(|offset| cursor + offset);

        match found {
            Some(track_index) => {
                reconciled.push(track[track_index]);
                cursor = track_index + 1;
            }
            None => {
                warn!(
                    "[TrailPipeline] Display point {} ({}, {}) has no matching track point",
                    display_index, point.lat, point.lon
                );
                reconciled.push(TrackPoint::new(point.lat, point.lon, point.elevation, 0.0));
                warnings.push(PipelineWarning::DisplayPointUnmatched {
                    display_index,
                    lat: point.lat,
                    lon: point.lon,
                });
            }
        }
    }

    (reconciled, warnings)
}

fn validate_input(input: &TrailInput) -> Result<()> {
    validate_points(&input.id, "main track", &input.points)?;

    for (i, waypoint) in input.waypoints.iter().enumerate() {
        if !waypoint.has_valid_coordinates() {
            return Err(TrailError::InvalidCoordinates {
                trail_id: input.id.clone(),
                context: format!("waypoint '{}'", waypoint.name),
                message: format!("lat {} lon {} at index {}", waypoint.lat, waypoint.lon, i),
            });
        }
    }

    for variant in &input.variants {
        validate_points(
            &input.id,
            &format!("variant '{}'", variant.name),
            &variant.points,
        )?;
    }
    Ok(())
}

fn validate_points(trail_id: &str, context: &str, points: &[RawPoint]) -> Result<()> {
    for (index, p) in points.iter().enumerate() {
        if !p.has_valid_coordinates() {
            return Err(TrailError::InvalidCoordinates {
                trail_id: trail_id.to_string(),
                context: context.to_string(),
                message: format!("lat {} lon {} at index {}", p.lat, p.lon, index),
            });
        }
        if !p.elevation.is_finite() {
            return Err(TrailError::InvalidElevation {
                trail_id: trail_id.to_string(),
                context: context.to_string(),
                index,
            });
        }
    }
    Ok(())
}

// ============================================================================
// Batch Processing
// ============================================================================

fn process_one(input: &TrailInput, config: &TrailConfig) -> TrailOutcome {
    let result = process_trail(input, config);
    if let Err(e) = &result {
        error!("[TrailPipeline] Trail '{}' failed: {}", input.id, e);
    }
    TrailOutcome {
        trail_id: input.id.clone(),
        result,
    }
}

/// Process trails one after another.
pub fn process_trails(inputs: &[TrailInput], config: &TrailConfig) -> ProcessingReport {
    let outcomes: Vec<TrailOutcome> = inputs.iter().map(|i| process_one(i, config)).collect();
    log_batch_summary(&outcomes);
    ProcessingReport { outcomes }
}

/// Process trails in parallel, one worker per trail. Outcomes keep input order.
#[cfg(feature = "parallel")]
pub fn process_trails_parallel(inputs: &[TrailInput], config: &TrailConfig) -> ProcessingReport {
    let outcomes: Vec<TrailOutcome> = inputs.par_iter().map(|i| process_one(i, config)).collect();
    log_batch_summary(&outcomes);
    ProcessingReport { outcomes }
}

fn log_batch_summary(outcomes: &[TrailOutcome]) {
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(
        "[TrailPipeline] Batch done: {} trails, {} succeeded, {} failed",
        outcomes.len(),
        outcomes.len() - failed,
        failed
    );
}
