//! Output units and rounding.
//!
//! Distances leave the pipeline in kilometers rounded to 2 decimals;
//! elevations, ascent and descent in whole meters.

use serde::Serializer;

/// Round a kilometer value to 2 decimal places.
#[inline]
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Round a meter value to the nearest whole meter.
#[inline]
pub fn round_m(meters: f64) -> f64 {
    meters.round()
}

#[inline]
pub fn meters_to_km(meters: f64) -> f64 {
    meters / 1000.0
}

pub(crate) fn serialize_km<S: Serializer>(km: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_km(*km))
}

pub(crate) fn serialize_m<S: Serializer>(meters: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_m(*meters))
}
