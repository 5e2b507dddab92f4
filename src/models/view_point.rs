// SPDX-License-Identifier: MIT

//! Projection of raw visit records into displayable view points.

use crate::geo;
use crate::models::VisitRecord;
use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::Value;

/// Timestamp field-name variants, in priority order.
const TIMESTAMP_KEYS: [&str; 5] = ["timestamp", "time", "createdAt", "created_at", "ts"];

/// Per-visit count field-name variants, in priority order.
const COUNT_KEYS: [&str; 4] = ["count", "hits", "views", "total"];

/// A normalized, displayable geolocation record derived from a raw visit.
///
/// Created fresh on every successful analytics fetch and never mutated; a
/// new fetch wholly replaces the previous batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPoint {
    /// Synthesized from source IP and timestamp (or positional index).
    /// Unique within one fetched batch only, not a durable identifier.
    pub id: String,
    pub ip: Option<String>,
    /// Degrees, `|lat| <= 90`
    pub lat: f64,
    /// Degrees, `|lon| <= 180`
    pub lon: f64,
    pub count: Option<f64>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    /// RFC3339 when numeric in the source, verbatim when already a string
    pub timestamp: Option<String>,
    /// Original untrusted record, retained for diagnostic display
    pub raw: VisitRecord,
}

/// Render a scalar the way it would interpolate into an id.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First present, non-null field among `names`.
fn first_present<'a>(record: &'a VisitRecord, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| record.get(*name))
        .find(|v| !v.is_null())
}

fn string_field(record: &VisitRecord, name: &str) -> Option<String> {
    match record.get(name) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Render a timestamp value for display: numbers are epoch millis, strings
/// pass through verbatim.
fn render_timestamp(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => {
            let millis = n.as_f64()? as i64;
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Project a fetched batch of visit records into view points.
///
/// Input order is preserved; records without valid coordinates are dropped
/// silently. When the timestamp is absent the positional index keeps ids
/// unique within the batch.
pub fn project_view_points(views: &[Value]) -> Vec<ViewPoint> {
    let empty = VisitRecord::new();
    views
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let record = entry.as_object().unwrap_or(&empty);
            let coords = geo::to_lat_lon(record)?;

            let timestamp = first_present(record, &TIMESTAMP_KEYS);
            let id_tail = timestamp
                .map(display_value)
                .unwrap_or_else(|| index.to_string());
            let id_head = record
                .get("ip")
                .filter(|v| !v.is_null())
                .map(display_value)
                .unwrap_or_else(|| "ip".to_string());

            Some(ViewPoint {
                id: format!("{}-{}", id_head, id_tail),
                ip: string_field(record, "ip"),
                lat: coords.lat,
                lon: coords.lon,
                count: first_present(record, &COUNT_KEYS).and_then(geo::parse_number),
                city: string_field(record, "city"),
                region: string_field(record, "region"),
                country: string_field(record, "country"),
                timestamp: timestamp.and_then(render_timestamp),
                raw: record.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preserves_order_and_drops_invalid() {
        let views = vec![
            json!({"ip": "1.1.1.1", "lat": 1.0, "lon": 2.0}),
            json!({"ip": "2.2.2.2", "note": "no coordinates"}),
            json!({"ip": "3.3.3.3", "lat": 3.0, "lon": 4.0}),
        ];
        let points = project_view_points(&views);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].ip.as_deref(), Some("1.1.1.1"));
        assert_eq!(points[1].ip.as_deref(), Some("3.3.3.3"));
    }

    #[test]
    fn test_id_synthesis_with_timestamp() {
        let views = vec![json!({
            "ip": "9.9.9.9",
            "lat": 0.0,
            "lon": 0.0,
            "timestamp": "2024-05-01T00:00:00Z"
        })];
        let points = project_view_points(&views);
        assert_eq!(points[0].id, "9.9.9.9-2024-05-01T00:00:00Z");
        assert_eq!(points[0].timestamp.as_deref(), Some("2024-05-01T00:00:00Z"));
    }

    #[test]
    fn test_id_falls_back_to_index() {
        let views = vec![
            json!({"lat": 1.0, "lon": 1.0}),
            json!({"lat": 2.0, "lon": 2.0}),
        ];
        let points = project_view_points(&views);
        assert_eq!(points[0].id, "ip-0");
        assert_eq!(points[1].id, "ip-1");
    }

    #[test]
    fn test_numeric_timestamp_rendered_rfc3339() {
        let views = vec![json!({"lat": 0.0, "lon": 0.0, "ts": 1_700_000_000_000_i64})];
        let points = project_view_points(&views);
        assert_eq!(
            points[0].timestamp.as_deref(),
            Some("2023-11-14T22:13:20.000Z")
        );
        // The raw value still feeds the id.
        assert_eq!(points[0].id, "ip-1700000000000");
    }

    #[test]
    fn test_count_field_priority() {
        let views = vec![json!({
            "lat": 0.0,
            "lon": 0.0,
            "hits": 7,
            "total": 99
        })];
        let points = project_view_points(&views);
        assert_eq!(points[0].count, Some(7.0));
    }

    #[test]
    fn test_descriptive_fields_require_strings() {
        let views = vec![json!({
            "lat": 0.0,
            "lon": 0.0,
            "city": "Hanoi",
            "country": 84
        })];
        let points = project_view_points(&views);
        assert_eq!(points[0].city.as_deref(), Some("Hanoi"));
        assert_eq!(points[0].country, None);
    }

    #[test]
    fn test_non_object_entries_dropped() {
        let views = vec![json!("garbage"), json!(null), json!({"lat": 1.0, "lon": 1.0})];
        let points = project_view_points(&views);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_raw_record_retained() {
        let views = vec![json!({"lat": 1.0, "lon": 1.0, "extra": {"deep": true}})];
        let points = project_view_points(&views);
        assert_eq!(points[0].raw.get("extra"), Some(&json!({"deep": true})));
    }
}
