//! Data models for earthquake events.
//!
//! Two input shapes are accepted: flat records (`time, latitude, longitude,
//! mag, depth, place`) as exported by the USGS CSV/query tools, and the USGS
//! GeoJSON summary feed. Both are normalized into [`EventRecord`], which also
//! carries the per-frame view state mutated by the filter and selection code.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::QuakeViewError;
use crate::projection::{MapProjection, Point};

/// Flat event record, one per row of the source data.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    /// Event time (RFC 3339, ISO-ish datetime or plain date)
    pub time: String,

    /// Latitude (degrees)
    pub latitude: f64,

    /// Longitude (degrees)
    pub longitude: f64,

    /// Magnitude value
    pub mag: f64,

    /// Depth in kilometers (positive down)
    pub depth: f64,

    /// Human-readable place description
    #[serde(default)]
    pub place: String,
}

/// Top-level GeoJSON response from USGS feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    /// Always "FeatureCollection"
    #[serde(rename = "type")]
    pub type_: String,

    /// Earthquake events
    pub features: Vec<Feature>,
}

/// A single earthquake event from a USGS feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    /// Unique event ID
    #[serde(default)]
    pub id: String,

    /// Geographic location
    pub geometry: Geometry,

    /// Event properties
    pub properties: Properties,
}

/// Geographic geometry for an event.
#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    /// Coordinates: [longitude, latitude, depth_km]
    pub coordinates: Vec<f64>,
}

/// The subset of USGS event properties the map needs.
#[derive(Debug, Clone, Deserialize)]
pub struct Properties {
    /// Magnitude value
    pub mag: Option<f64>,

    /// Human-readable place description
    pub place: Option<String>,

    /// Event time (ms since epoch)
    pub time: i64,
}

impl Feature {
    /// Convert a feed feature into a flat record.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinates are incomplete or the time is out
    /// of range.
    pub fn to_record(&self) -> Result<RawRecord, QuakeViewError> {
        let [lon, lat, depth] = self.geometry.coordinates[..] else {
            return Err(QuakeViewError::Validation(format!(
                "feature '{}' has {} coordinates, expected 3",
                self.id,
                self.geometry.coordinates.len()
            )));
        };
        let time = Utc
            .timestamp_millis_opt(self.properties.time)
            .single()
            .ok_or_else(|| QuakeViewError::Timestamp(self.properties.time.to_string()))?;

        Ok(RawRecord {
            time: time.to_rfc3339(),
            latitude: lat,
            longitude: lon,
            mag: self.properties.mag.unwrap_or(0.0),
            depth,
            place: self.properties.place.clone().unwrap_or_default(),
        })
    }
}

/// Parse an event timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) and plain
/// `YYYY-MM-DD` (midnight UTC).
///
/// # Errors
///
/// Returns [`QuakeViewError::Timestamp`] if none of the formats match.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, QuakeViewError> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| QuakeViewError::Timestamp(s.to_string()))
}

/// Index of an event in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EventId(pub usize);

/// Visibility phase of an event. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Filtered out and fully transparent; never drawn
    #[default]
    Hidden,
    /// Matches the filters and fully opaque
    Shown,
    /// Matches the filters, opacity rising
    FadingIn,
    /// Filtered out, opacity falling
    FadingOut,
}

impl Visibility {
    /// Whether the event currently passes the filters.
    #[must_use]
    pub fn is_visible(self) -> bool {
        matches!(self, Self::Shown | Self::FadingIn)
    }

    /// Whether the event needs drawing this frame.
    #[must_use]
    pub fn is_drawn(self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

/// Mutable per-frame view state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ViewState {
    pub visibility: Visibility,
    /// Opacity in [0, 100]
    pub opacity: f64,
    /// Whether the detail panel is open for this event
    pub detail_open: bool,
}

/// A single earthquake event positioned on the map.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: f64,
    pub depth_km: f64,
    pub place: String,

    /// Content-space position, computed once at load
    pub position: Point,

    pub(crate) view: ViewState,
}

impl EventRecord {
    /// Build a record from raw input, projecting its position.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp cannot be parsed.
    pub fn from_raw(raw: RawRecord, projection: &MapProjection) -> Result<Self, QuakeViewError> {
        let time = parse_timestamp(&raw.time)?;
        Ok(Self {
            time,
            latitude: raw.latitude,
            longitude: raw.longitude,
            magnitude: raw.mag,
            depth_km: raw.depth,
            position: projection.project(raw.latitude, raw.longitude),
            place: raw.place,
            view: ViewState::default(),
        })
    }

    /// Current view state.
    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Whether the event currently passes the filters.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.view.visibility.is_visible()
    }
}

/// Simplified event for output.
///
/// This is the normalized structure we emit in JSON/NDJSON listings.
#[derive(Debug, Clone, Serialize)]
pub struct OutputEvent {
    pub id: EventId,
    pub time: String,
    pub magnitude: f64,
    pub depth_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub place: Option<String>,
    pub x: f64,
    pub y: f64,
    pub visibility: Visibility,
    pub opacity: f64,
}

impl From<(EventId, &EventRecord)> for OutputEvent {
    fn from((id, e): (EventId, &EventRecord)) -> Self {
        Self {
            id,
            time: e.time.to_rfc3339(),
            magnitude: e.magnitude,
            depth_km: e.depth_km,
            latitude: e.latitude,
            longitude: e.longitude,
            place: (!e.place.is_empty()).then(|| e.place.clone()),
            x: e.position.x,
            y: e.position.y,
            visibility: e.view.visibility,
            opacity: e.view.opacity,
        }
    }
}

/// Build a record for tests without going through a loader.
#[cfg(test)]
pub(crate) fn quake(time: &str, lat: f64, lon: f64, mag: f64, depth: f64) -> EventRecord {
    let raw = RawRecord {
        time: time.into(),
        latitude: lat,
        longitude: lon,
        mag,
        depth,
        place: String::new(),
    };
    EventRecord::from_raw(raw, &MapProjection::default()).expect("valid test record")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2017-01-05T12:30:00.250Z").unwrap();
        assert_eq!(rfc.to_rfc3339(), "2017-01-05T12:30:00.250+00:00");

        let naive = parse_timestamp("2017-01-05T12:30:00").unwrap();
        assert_eq!(naive.format("%H:%M").to_string(), "12:30");

        let date = parse_timestamp("2017-01-05").unwrap();
        assert_eq!(date.format("%Y-%m-%d %H:%M:%S").to_string(), "2017-01-05 00:00:00");

        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_record_starts_hidden() {
        let raw = RawRecord {
            time: "2017-01-05".into(),
            latitude: 37.0,
            longitude: -120.0,
            mag: 4.5,
            depth: 5.0,
            place: "X".into(),
        };
        let record = EventRecord::from_raw(raw, &MapProjection::default()).unwrap();
        assert_eq!(record.view().visibility, Visibility::Hidden);
        assert!(record.view().opacity.abs() < f64::EPSILON);
        assert!(!record.view().detail_open);
        assert!(!record.is_visible());
    }

    #[test]
    fn test_parse_sample_feed() {
        let json = include_str!("../tools/sample_feed.geojson");
        let feed: FeatureCollection =
            serde_json::from_str(json).expect("failed to parse sample feed");

        assert_eq!(feed.type_, "FeatureCollection");
        assert!(!feed.features.is_empty());

        for feature in &feed.features {
            let record = feature.to_record().expect("invalid feature");
            assert!(parse_timestamp(&record.time).is_ok());
        }
    }

    #[test]
    fn test_feature_without_magnitude() {
        let json = r#"{
            "id": "nc1",
            "geometry": {"coordinates": [-122.0, 38.0, 7.5]},
            "properties": {"mag": null, "place": null, "time": 1483574400000}
        }"#;
        let feature: Feature = serde_json::from_str(json).unwrap();
        let record = feature.to_record().unwrap();
        assert!(record.mag.abs() < f64::EPSILON);
        assert!(record.place.is_empty());
        assert!((record.depth - 7.5).abs() < f64::EPSILON);
        assert!(record.time.starts_with("2017-01-05"));
    }
}
