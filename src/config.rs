//! Pipeline configuration.
//!
//! All fields are optional when loaded from JSON; missing fields take their
//! defaults.
//!
//! ```rust
//! use trail_enricher::TrailConfig;
//!
//! let config = TrailConfig::from_json_str(r#"{"targetDisplayPointCount": 1500}"#).unwrap();
//! assert_eq!(config.target_display_point_count, 1500);
//! assert_eq!(config.waypoint_entry_threshold_meters, 200.0);
//! assert_eq!(config.exit_threshold_meters(), 600.0);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailError};

/// Configuration for the trail enrichment pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrailConfig {
    /// Approximate number of points kept in the display geometry.
    /// Default: 3000
    pub target_display_point_count: usize,

    /// A waypoint becomes "visited" once the track comes within this distance.
    /// Default: 200.0 meters
    pub waypoint_entry_threshold_meters: f64,

    /// Exit threshold as a multiple of the entry threshold. The track must move
    /// further than this before the same waypoint can be visited again.
    /// Default: 3.0 (600m with the default entry threshold)
    pub waypoint_exit_factor: f64,

    /// Maximum distance between a variant endpoint and the main track for a
    /// junction to be recorded.
    /// Default: 500.0 meters
    pub junction_max_distance_meters: f64,

    /// Side trips whose ends snap to main-track indices closer than this are
    /// out-and-back spurs and get no rejoin junction.
    /// Default: 10
    pub side_trip_min_index_separation: usize,

    /// Gaps above this distance between combined main tracks are reported.
    /// Default: 100.0 meters
    pub track_gap_warning_meters: f64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            target_display_point_count: 3000,
            waypoint_entry_threshold_meters: 200.0,
            waypoint_exit_factor: 3.0,
            junction_max_distance_meters: 500.0,
            side_trip_min_index_separation: 10,
            track_gap_warning_meters: 100.0,
        }
    }
}

impl TrailConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TrailConfig =
            serde_json::from_str(json).map_err(|e| TrailError::ConfigError {
                message: format!("invalid config JSON: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TrailError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Distance beyond which an active waypoint is considered departed.
    pub fn exit_threshold_meters(&self) -> f64 {
        self.waypoint_entry_threshold_meters * self.waypoint_exit_factor
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.target_display_point_count < 2 {
            return Err(config_error(format!(
                "targetDisplayPointCount must be at least 2, got {}",
                self.target_display_point_count
            )));
        }
        if !(self.waypoint_entry_threshold_meters.is_finite()
            && self.waypoint_entry_threshold_meters > 0.0)
        {
            return Err(config_error(format!(
                "waypointEntryThresholdMeters must be positive, got {}",
                self.waypoint_entry_threshold_meters
            )));
        }
        if !(self.waypoint_exit_factor.is_finite() && self.waypoint_exit_factor >= 1.0) {
            return Err(config_error(format!(
                "waypointExitFactor must be at least 1.0, got {}",
                self.waypoint_exit_factor
            )));
        }
        if !(self.junction_max_distance_meters.is_finite()
            && self.junction_max_distance_meters >= 0.0)
        {
            return Err(config_error(format!(
                "junctionMaxDistanceMeters must be non-negative, got {}",
                self.junction_max_distance_meters
            )));
        }
        if !(self.track_gap_warning_meters.is_finite() && self.track_gap_warning_meters >= 0.0) {
            return Err(config_error(format!(
                "trackGapWarningMeters must be non-negative, got {}",
                self.track_gap_warning_meters
            )));
        }
        Ok(())
    }
}

fn config_error(message: String) -> TrailError {
    TrailError::ConfigError { message }
}
