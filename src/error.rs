//! Unified error handling for the trail enrichment pipeline.
//!
//! Only input malformation is an error. Geometric degeneracy (empty tracks,
//! no waypoints, empty variants) and unresolved junctions or visits are
//! represented as empty results or absent optional fields instead.

use thiserror::Error;

/// Unified error type for trail processing.
#[derive(Debug, Error)]
pub enum TrailError {
    /// A point has a non-finite or out-of-range latitude/longitude
    #[error("Trail '{trail_id}' has invalid coordinates in {context}: {message}")]
    InvalidCoordinates {
        trail_id: String,
        context: String,
        message: String,
    },

    /// A point has a non-finite elevation
    #[error("Trail '{trail_id}' has invalid elevation in {context} at index {index}")]
    InvalidElevation {
        trail_id: String,
        context: String,
        index: usize,
    },

    /// Input could not be parsed
    #[error("Malformed input for trail '{trail_id}': {message}")]
    MalformedInput { trail_id: String, message: String },

    /// Configuration values are invalid
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Configuration file could not be read
    #[error("Could not read config file '{path}': {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl TrailError {
    /// The trail this error belongs to, if it is trail-specific.
    pub fn trail_id(&self) -> Option<&str> {
        match self {
            TrailError::InvalidCoordinates { trail_id, .. }
            | TrailError::InvalidElevation { trail_id, .. }
            | TrailError::MalformedInput { trail_id, .. } => Some(trail_id),
            TrailError::ConfigError { .. } | TrailError::ConfigFile { .. } => None,
        }
    }
}

/// Result type alias for trail operations.
pub type Result<T> = std::result::Result<T, TrailError>;
