//! # Main-Track Combiner
//!
//! A trail recording often arrives as several main tracks (one per day or
//! per device session), in arbitrary order and direction. This module chains
//! them into one continuous main track.
//!
//! ## Algorithm
//! 1. Start with the first non-empty track, forward
//! 2. Of the remaining tracks, append the one whose start (forward) or end
//!    (reversed) is closest to the current chain end; forward wins ties
//! 3. Skip the join point if it repeats the chain end exactly
//! 4. Report joins wider than the gap threshold
//!
//! Greedy chaining is O(n²) in the number of tracks, which stays small.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::units::round_m;
use crate::RawPoint;

/// A raw track with the name it was recorded under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedTrack {
    pub name: String,
    #[serde(default)]
    pub points: Vec<RawPoint>,
}

impl NamedTrack {
    pub fn new(name: &str, points: Vec<RawPoint>) -> Self {
        Self {
            name: name.to_string(),
            points,
        }
    }
}

/// Tracks as sorted by the track classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifiedTracks {
    pub main_tracks: Vec<NamedTrack>,
    pub alternate_tracks: Vec<NamedTrack>,
    pub side_trip_tracks: Vec<NamedTrack>,
    pub ignored_tracks: Vec<NamedTrack>,
    pub unclassified_tracks: Vec<NamedTrack>,
}

/// A join between consecutive tracks wider than the warning threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapWarning {
    pub from_track: String,
    pub to_track: String,
    /// Whole meters
    pub gap_meters: f64,
}

/// Result of chaining the main tracks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedTrack {
    #[serde(rename = "combinedPoints")]
    pub points: Vec<RawPoint>,
    /// Track names in chain order
    pub ordered_names: Vec<String>,
    pub warnings: Vec<GapWarning>,
}

/// Orientation of the next track to append.
#[derive(Debug, Clone, Copy, PartialEq)]
struct NextTrack {
    position: usize,
    reversed: bool,
    gap_m: f64,
}

/// Chain `tracks` into one continuous track by geographic proximity.
///
/// Empty tracks are skipped. A single track comes back as-is.
///
/// # Example
/// ```
/// use trail_enricher::{combine_geographically, NamedTrack, RawPoint};
///
/// let day2 = NamedTrack::new("Day 2", vec![
///     RawPoint::new(0.0, 0.002, 0.0),
///     RawPoint::new(0.0, 0.003, 0.0),
/// ]);
/// let day1 = NamedTrack::new("Day 1", vec![
///     RawPoint::new(0.0, 0.000, 0.0),
///     RawPoint::new(0.0, 0.002, 0.0),
/// ]);
///
/// let combined = combine_geographically(&[day1, day2], 100.0);
/// assert_eq!(combined.ordered_names, vec!["Day 1", "Day 2"]);
/// assert_eq!(combined.points.len(), 3);
/// assert!(combined.warnings.is_empty());
/// ```
pub fn combine_geographically(tracks: &[NamedTrack], gap_warning_m: f64) -> CombinedTrack {
    let mut remaining: Vec<&NamedTrack> = Vec::with_capacity(tracks.len());
    for track in tracks {
        if track.points.is_empty() {
            debug!("[Combine] Skipping empty track '{}'", track.name);
        } else {
            remaining.push(track);
        }
    }
    if remaining.is_empty() {
        return CombinedTrack::default();
    }

    let first = remaining.remove(0);
    let mut combined = CombinedTrack {
        points: first.points.clone(),
        ordered_names: vec![first.name.clone()],
        warnings: Vec::new(),
    };
    let mut previous_name = first.name.as_str();

    while let Some(chain_end) = combined.points.last().copied() {
        let Some(next) = closest_next(&remaining, &chain_end) else {
            break;
        };
        let track = remaining.remove(next.position);

        if next.gap_m > gap_warning_m {
            warn!(
                "[Combine] {:.0}m gap between '{}' and '{}'",
                next.gap_m, previous_name, track.name
            );
            combined.warnings.push(GapWarning {
                from_track: previous_name.to_string(),
                to_track: track.name.clone(),
                gap_meters: round_m(next.gap_m),
            });
        }

        let mut oriented: Vec<RawPoint> = track.points.clone();
        if next.reversed {
            oriented.reverse();
        }
        let repeats_end = oriented[0].lat == chain_end.lat && oriented[0].lon == chain_end.lon;
        let skip = usize::from(repeats_end);
        combined.points.extend_from_slice(&oriented[skip..]);
        combined.ordered_names.push(track.name.clone());
        previous_name = track.name.as_str();

        debug!(
            "[Combine] Appended '{}'{} ({:.0}m join)",
            track.name,
            if next.reversed { " reversed" } else { "" },
            next.gap_m
        );
    }

    debug!(
        "[Combine] {} tracks -> {} points, {} gap warnings",
        combined.ordered_names.len(),
        combined.points.len(),
        combined.warnings.len()
    );
    combined
}

/// Closest remaining track to `chain_end`. Strict comparison keeps the
/// earliest candidate on ties, with forward checked before reversed.
fn closest_next(remaining: &[&NamedTrack], chain_end: &RawPoint) -> Option<NextTrack> {
    let mut best: Option<NextTrack> = None;

    for (position, track) in remaining.iter().enumerate() {
        let (Some(start), Some(end)) = (track.points.first(), track.points.last()) else {
            continue;
        };
        for (reversed, endpoint) in [(false, start), (true, end)] {
            let gap_m = haversine_distance(chain_end, endpoint);
            if best.map_or(true, |b| gap_m < b.gap_m) {
                best = Some(NextTrack {
                    position,
                    reversed,
                    gap_m,
                });
            }
        }
    }
    best
}
