//! # Route Variants
//!
//! Alternates and side trips, anchored to the main track where they branch
//! off and rejoin.
//!
//! ## Junction rules
//! - The branch junction is the main-track point nearest the variant's first
//!   point, the rejoin junction the one nearest its last point.
//! - Either junction is recorded only when that nearest point is within
//!   `junctionMaxDistanceMeters`.
//! - Alternates always get their rejoin junction. Side trips get one only if
//!   their two ends snap at least `sideTripMinIndexSeparation` track indices
//!   apart; closer than that, the side trip is an out-and-back spur.
//!
//! The spur test compares track indices, not geometric distance, so on a
//! sparse track a genuine loop with nearby ends can read as a spur.

use log::debug;
use rstar::RTree;
use serde::{Deserialize, Serialize};

use crate::spatial::{build_rtree, nearest_point, IndexedPoint};
use crate::stats::{accumulate_full, augment_with_distance};
use crate::units::{round_km, round_m};
use crate::{LatLon, RawPoint, TrackPoint, TrailConfig};

/// How a variant relates to the main route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariantKind {
    /// A different way between two points of the main route
    Alternate,
    /// A detour off the main route, either out-and-back or a loop
    SideTrip,
}

/// A classified variant as it arrives from the track classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantInput {
    pub name: String,
    pub kind: VariantKind,
    #[serde(default)]
    pub points: Vec<RawPoint>,
}

impl VariantInput {
    pub fn new(name: &str, kind: VariantKind, points: Vec<RawPoint>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            points,
        }
    }
}

/// Where a variant meets the main track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Junction {
    /// Index into the unsimplified main track
    pub track_index: usize,
    /// Main-track cumulative distance at that index, km (2 decimals)
    pub distance_km: f64,
}

/// An alternate or side trip with its stats and junctions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RouteVariantRecord", from = "RouteVariantRecord")]
pub struct RouteVariant {
    pub name: String,
    pub kind: VariantKind,
    pub points: Vec<TrackPoint>,
    pub distance_km: f64,
    pub ascent_m: f64,
    pub descent_m: f64,
    pub branch: Option<Junction>,
    pub rejoin: Option<Junction>,
}

/// Flat JSON shape of a [`RouteVariant`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteVariantRecord {
    name: String,
    kind: VariantKind,
    points: Vec<TrackPoint>,
    distance_km: f64,
    ascent_m: f64,
    descent_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch_track_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch_distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rejoin_track_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rejoin_distance_km: Option<f64>,
}

impl From<RouteVariant> for RouteVariantRecord {
    fn from(v: RouteVariant) -> Self {
        Self {
            name: v.name,
            kind: v.kind,
            points: v.points,
            distance_km: v.distance_km,
            ascent_m: v.ascent_m,
            descent_m: v.descent_m,
            branch_track_index: v.branch.map(|j| j.track_index),
            branch_distance_km: v.branch.map(|j| j.distance_km),
            rejoin_track_index: v.rejoin.map(|j| j.track_index),
            rejoin_distance_km: v.rejoin.map(|j| j.distance_km),
        }
    }
}

impl From<RouteVariantRecord> for RouteVariant {
    fn from(r: RouteVariantRecord) -> Self {
        let junction = |index: Option<usize>, distance_km: Option<f64>| {
            index.map(|track_index| Junction {
                track_index,
                distance_km: distance_km.unwrap_or_default(),
            })
        };
        Self {
            branch: junction(r.branch_track_index, r.branch_distance_km),
            rejoin: junction(r.rejoin_track_index, r.rejoin_distance_km),
            name: r.name,
            kind: r.kind,
            points: r.points,
            distance_km: r.distance_km,
            ascent_m: r.ascent_m,
            descent_m: r.descent_m,
        }
    }
}

/// Junction thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JunctionRules {
    pub max_distance_m: f64,
    pub side_trip_min_index_separation: usize,
}

impl JunctionRules {
    pub fn from_config(config: &TrailConfig) -> Self {
        Self {
            max_distance_m: config.junction_max_distance_meters,
            side_trip_min_index_separation: config.side_trip_min_index_separation,
        }
    }
}

impl Default for JunctionRules {
    fn default() -> Self {
        Self::from_config(&TrailConfig::default())
    }
}

/// The unsimplified main track with a spatial index for nearest lookups.
pub struct MainTrackIndex<'a> {
    points: &'a [TrackPoint],
    tree: RTree<IndexedPoint>,
}

impl<'a> MainTrackIndex<'a> {
    pub fn new(points: &'a [TrackPoint]) -> Self {
        Self {
            points,
            tree: build_rtree(points),
        }
    }

    /// Nearest main-track point as `(index, distance_meters)`; lowest index on ties.
    pub fn nearest<Q: LatLon>(&self, query: &Q) -> Option<(usize, f64)> {
        nearest_point(&self.tree, self.points, query)
    }

    fn junction_at(&self, track_index: usize) -> Junction {
        Junction {
            track_index,
            distance_km: round_km(self.points[track_index].cumulative_distance_km),
        }
    }
}

/// Resolve the branch and rejoin junctions of one variant.
///
/// Returns `(branch, rejoin)`; either may be `None`. An empty variant or an
/// empty main track resolves to neither.
pub fn resolve_junctions<P: LatLon>(
    main: &MainTrackIndex<'_>,
    kind: VariantKind,
    variant_points: &[P],
    rules: &JunctionRules,
) -> (Option<Junction>, Option<Junction>) {
    let (Some(first), Some(last)) = (variant_points.first(), variant_points.last()) else {
        return (None, None);
    };
    let start_nearest = main.nearest(first);
    let end_nearest = main.nearest(last);

    let within = |nearest: Option<(usize, f64)>| {
        nearest
            .filter(|&(_, meters)| meters <= rules.max_distance_m)
            .map(|(index, _)| main.junction_at(index))
    };

    let rejoin_allowed = match kind {
        VariantKind::Alternate => true,
        VariantKind::SideTrip => match (start_nearest, end_nearest) {
            (Some((start, _)), Some((end, _))) => {
                start.abs_diff(end) >= rules.side_trip_min_index_separation
            }
            _ => false,
        },
    };

    let branch = within(start_nearest);
    let rejoin = if rejoin_allowed { within(end_nearest) } else { None };
    (branch, rejoin)
}

/// Build a [`RouteVariant`]: distance-augment its points, total its stats
/// and resolve its junctions against the main track.
pub fn build_variant(
    input: &VariantInput,
    main: &MainTrackIndex<'_>,
    rules: &JunctionRules,
) -> RouteVariant {
    let points = augment_with_distance(&input.points);
    let stats = accumulate_full(&points);
    let (branch, rejoin) = resolve_junctions(main, input.kind, &points, rules);

    debug!(
        "[Variants] {:?} '{}': {} points, {:.2}km, branch={:?}, rejoin={:?}",
        input.kind,
        input.name,
        points.len(),
        stats.distance_km,
        branch.map(|j| j.track_index),
        rejoin.map(|j| j.track_index)
    );

    RouteVariant {
        name: input.name.clone(),
        kind: input.kind,
        points,
        distance_km: round_km(stats.distance_km),
        ascent_m: round_m(stats.ascent_m),
        descent_m: round_m(stats.descent_m),
        branch,
        rejoin,
    }
}

/// Build all variants, split into `(alternates, side_trips)` in input order.
pub fn build_variants(
    inputs: &[VariantInput],
    main: &MainTrackIndex<'_>,
    rules: &JunctionRules,
) -> (Vec<RouteVariant>, Vec<RouteVariant>) {
    inputs
        .iter()
        .map(|input| build_variant(input, main, rules))
        .partition(|variant| variant.kind == VariantKind::Alternate)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Meters per degree of latitude on the 6371km sphere.
    const M_PER_DEG: f64 = 111_194.926_644_558_73;

    /// 30 points heading east along the equator, ~111m apart.
    fn main_track() -> Vec<TrackPoint> {
        let raw: Vec<RawPoint> = (0..30)
            .map(|i| RawPoint::new(0.0, i as f64 * 0.001, 100.0))
            .collect();
        augment_with_distance(&raw)
    }

    /// A point `meters` north of main-track point `index`.
    fn north_of(index: usize, meters: f64) -> RawPoint {
        RawPoint::new(meters / M_PER_DEG, index as f64 * 0.001, 100.0)
    }

    #[test]
    fn test_branch_gated_by_distance() {
        let track = main_track();
        let main = MainTrackIndex::new(&track);
        let rules = JunctionRules::default();

        let far = vec![north_of(7, 600.0), north_of(7, 900.0)];
        let (branch, _) = resolve_junctions(&main, VariantKind::Alternate, &far, &rules);
        assert!(branch.is_none());

        let near = vec![north_of(7, 400.0), north_of(7, 900.0)];
        let (branch, _) = resolve_junctions(&main, VariantKind::Alternate, &near, &rules);
        let branch = branch.unwrap();
        assert_eq!(branch.track_index, 7);
        assert_eq!(branch.distance_km, 0.78);
    }

    #[test]
    fn test_alternate_always_rejoins() {
        let track = main_track();
        let main = MainTrackIndex::new(&track);
        let points = vec![north_of(5, 50.0), north_of(6, 300.0), north_of(7, 50.0)];

        let (branch, rejoin) =
            resolve_junctions(&main, VariantKind::Alternate, &points, &JunctionRules::default());
        assert_eq!(branch.unwrap().track_index, 5);
        assert_eq!(rejoin.unwrap().track_index, 7);
    }

    #[test]
    fn test_side_trip_spur_has_no_rejoin() {
        let track = main_track();
        let main = MainTrackIndex::new(&track);
        let points = vec![north_of(5, 20.0), north_of(8, 450.0), north_of(12, 20.0)];

        let (branch, rejoin) =
            resolve_junctions(&main, VariantKind::SideTrip, &points, &JunctionRules::default());
        assert_eq!(branch.unwrap().track_index, 5);
        assert!(rejoin.is_none());
    }

    #[test]
    fn test_side_trip_loop_rejoins() {
        let track = main_track();
        let main = MainTrackIndex::new(&track);
        let points = vec![north_of(5, 20.0), north_of(12, 450.0), north_of(20, 20.0)];

        let (branch, rejoin) =
            resolve_junctions(&main, VariantKind::SideTrip, &points, &JunctionRules::default());
        assert_eq!(branch.unwrap().track_index, 5);
        assert_eq!(rejoin.unwrap().track_index, 20);
    }

    #[test]
    fn test_side_trip_separation_uses_nearest_even_if_branch_too_far() {
        let track = main_track();
        let main = MainTrackIndex::new(&track);
        let points = vec![north_of(5, 700.0), north_of(20, 20.0)];

        let (branch, rejoin) =
            resolve_junctions(&main, VariantKind::SideTrip, &points, &JunctionRules::default());
        assert!(branch.is_none());
        assert_eq!(rejoin.unwrap().track_index, 20);
    }

    #[test]
    fn test_rejoin_gated_by_distance() {
        let track = main_track();
        let main = MainTrackIndex::new(&track);
        let points = vec![north_of(2, 10.0), north_of(25, 800.0)];

        let (branch, rejoin) =
            resolve_junctions(&main, VariantKind::Alternate, &points, &JunctionRules::default());
        assert!(branch.is_some());
        assert!(rejoin.is_none());
    }

    #[test]
    fn test_empty_variant_and_empty_track() {
        let track = main_track();
        let main = MainTrackIndex::new(&track);
        let empty: Vec<RawPoint> = vec![];
        assert_eq!(
            resolve_junctions(&main, VariantKind::Alternate, &empty, &JunctionRules::default()),
            (None, None)
        );

        let no_track: Vec<TrackPoint> = vec![];
        let main = MainTrackIndex::new(&no_track);
        let points = vec![north_of(0, 0.0)];
        assert_eq!(
            resolve_junctions(&main, VariantKind::Alternate, &points, &JunctionRules::default()),
            (None, None)
        );
    }

    #[test]
    fn test_build_variant_stats() {
        let track = main_track();
        let main = MainTrackIndex::new(&track);
        let input = VariantInput::new(
            "Ridge alternate",
            VariantKind::Alternate,
            vec![
                RawPoint::new(0.0001, 0.003, 100.0),
                RawPoint::new(0.003, 0.006, 180.0),
                RawPoint::new(0.0001, 0.009, 120.0),
            ],
        );
        let variant = build_variant(&input, &main, &JunctionRules::default());

        assert_eq!(variant.points.len(), 3);
        assert_eq!(variant.points[0].cumulative_distance_km, 0.0);
        assert_eq!(variant.ascent_m, 80.0);
        assert_eq!(variant.descent_m, 60.0);
        assert!(variant.distance_km > 0.8);
        assert_eq!(variant.branch.unwrap().track_index, 3);
        assert_eq!(variant.rejoin.unwrap().track_index, 9);
    }

    #[test]
    fn test_build_variants_partitions_by_kind() {
        let track = main_track();
        let main = MainTrackIndex::new(&track);
        let inputs = vec![
            VariantInput::new("A1", VariantKind::Alternate, vec![north_of(1, 10.0)]),
            VariantInput::new("S1", VariantKind::SideTrip, vec![north_of(2, 10.0)]),
            VariantInput::new("A2", VariantKind::Alternate, vec![]),
        ];
        let (alternates, side_trips) = build_variants(&inputs, &main, &JunctionRules::default());

        let names: Vec<&str> = alternates.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["A1", "A2"]);
        assert_eq!(side_trips.len(), 1);
        assert!(alternates[1].points.is_empty());
        assert!(alternates[1].branch.is_none());
    }

    #[test]
    fn test_variant_json_shape() {
        let track = main_track();
        let main = MainTrackIndex::new(&track);
        let input = VariantInput::new(
            "Lookout",
            VariantKind::SideTrip,
            vec![north_of(4, 10.0), north_of(4, 300.0), north_of(5, 10.0)],
        );
        let variant = build_variant(&input, &main, &JunctionRules::default());
        let json = serde_json::to_value(&variant).unwrap();

        assert_eq!(json["kind"], "sideTrip");
        assert_eq!(json["branchTrackIndex"], 4);
        assert_eq!(json["branchDistanceKm"], 0.44);
        assert!(json.get("rejoinTrackIndex").is_none());
        assert!(json.get("rejoinDistanceKm").is_none());
        assert!(json["points"][0].get("cumulativeDistanceKm").is_some());

        let back: RouteVariant = serde_json::from_value(json).unwrap();
        assert_eq!(back.branch, variant.branch);
        assert_eq!(back.rejoin, None);
    }

    #[test]
    fn test_variant_input_from_json() {
        let json = r#"{"name":"High route","kind":"alternate","points":[{"lat":1.0,"lon":2.0,"elevation":300.0}]}"#;
        let input: VariantInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.kind, VariantKind::Alternate);
        assert_eq!(input.points.len(), 1);
    }
}
