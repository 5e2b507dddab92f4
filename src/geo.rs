// SPDX-License-Identifier: MIT

//! Coordinate extraction from untrusted visit records.
//!
//! The counter service records visits through several geolocation providers,
//! so latitude/longitude arrive under a handful of field-name variants,
//! sometimes nested one level down, sometimes as a single `"lat,lon"` string.
//! Extraction probes a fixed priority order and takes the first candidate
//! that coerces to a finite number; earlier names always win, regardless of
//! value plausibility.

use crate::models::VisitRecord;
use serde_json::Value;

/// Sub-objects probed for nested coordinate fields, in priority order.
const NESTED_KEYS: [&str; 3] = ["location", "geo", "coords"];

/// Latitude field-name variants, in priority order.
const LAT_KEYS: [&str; 2] = ["lat", "latitude"];

/// Longitude field-name variants, in priority order.
const LON_KEYS: [&str; 4] = ["lon", "lng", "long", "longitude"];

/// A validated coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// Coerce a JSON value to a finite float.
///
/// Numbers are taken as-is, strings go through standard decimal parsing.
/// Anything non-finite (or non-numeric) is rejected.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Probe `record` for one axis: top-level variants first, then each nested
/// sub-object in order. Select-first-valid.
fn probe_axis(record: &VisitRecord, names: &[&str]) -> Option<f64> {
    for name in names {
        if let Some(v) = record.get(*name).and_then(parse_number) {
            return Some(v);
        }
    }
    for nested in NESTED_KEYS {
        let Some(Value::Object(inner)) = record.get(nested) else {
            continue;
        };
        for name in names {
            if let Some(v) = inner.get(*name).and_then(parse_number) {
                return Some(v);
            }
        }
    }
    None
}

/// Extract a validated `{lat, lon}` pair from an untrusted visit record.
///
/// Falls back to a combined `loc` field formatted as `"<lat>,<lon>"` (split
/// on the first comma) only when *both* axes are unresolved from the named
/// fields. Out-of-range values are rejected outright, never clamped.
pub fn to_lat_lon(record: &VisitRecord) -> Option<LatLon> {
    let mut lat = probe_axis(record, &LAT_KEYS);
    let mut lon = probe_axis(record, &LON_KEYS);

    if lat.is_none() && lon.is_none() {
        if let Some(Value::String(loc)) = record.get("loc") {
            if let Some((lat_str, lon_str)) = loc.split_once(',') {
                lat = lat_str.trim().parse::<f64>().ok().filter(|v| v.is_finite());
                lon = lon_str.trim().parse::<f64>().ok().filter(|v| v.is_finite());
            }
        }
    }

    let (lat, lon) = (lat?, lon?);
    if lat.abs() > 90.0 || lon.abs() > 180.0 {
        return None;
    }
    Some(LatLon { lat, lon })
}
