//! Event record store.
//!
//! Holds every event in load order. The collection never grows or shrinks
//! once a session starts; only the per-record view state changes.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::errors::QuakeViewError;
use crate::models::{EventId, EventRecord, Feature, FeatureCollection, RawRecord};
use crate::projection::MapProjection;

/// Ordered collection of events.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    records: Vec<EventRecord>,
}

impl EventStore {
    /// Build a store from raw records, projecting each one.
    ///
    /// # Errors
    ///
    /// Returns an error if any record has an unreadable timestamp.
    pub fn from_raw(
        raws: impl IntoIterator<Item = RawRecord>,
        projection: &MapProjection,
    ) -> Result<Self, QuakeViewError> {
        let records = raws
            .into_iter()
            .map(|raw| EventRecord::from_raw(raw, projection))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    /// Parse event data from text.
    ///
    /// Accepts a JSON array of flat records, a USGS GeoJSON
    /// `FeatureCollection`, or newline-delimited flat records.
    ///
    /// # Errors
    ///
    /// Returns an error if the text matches none of the formats or a record
    /// is invalid.
    pub fn parse(text: &str, projection: &MapProjection) -> Result<Self, QuakeViewError> {
        let raws: Vec<RawRecord> = if text.trim_start().starts_with('[') {
            serde_json::from_str(text)?
        } else if let Ok(feed) = serde_json::from_str::<FeatureCollection>(text) {
            debug!("reading {} feed features", feed.features.len());
            feed.features
                .iter()
                .map(Feature::to_record)
                .collect::<Result<_, _>>()?
        } else {
            text.lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str::<RawRecord>)
                .collect::<Result<_, _>>()?
        };
        Self::from_raw(raws, projection)
    }

    /// Load event data from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(projection), fields(path = %path.display()))]
    pub fn load(path: &Path, projection: &MapProjection) -> Result<Self, QuakeViewError> {
        let text = fs::read_to_string(path)?;
        let store = Self::parse(&text, projection)?;
        debug!("loaded {} events", store.len());
        Ok(store)
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up an event by id.
    #[must_use]
    pub fn get(&self, id: EventId) -> Option<&EventRecord> {
        self.records.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: EventId) -> Option<&mut EventRecord> {
        self.records.get_mut(id.0)
    }

    /// Iterate events in load order with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (EventId, &EventRecord)> {
        self.records.iter().enumerate().map(|(i, r)| (EventId(i), r))
    }

    pub(crate) fn records_mut(&mut self) -> &mut [EventRecord] {
        &mut self.records
    }

    /// Earliest and latest event times, if any events are loaded.
    #[must_use]
    pub fn date_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.records.iter().map(|r| r.time).min()?;
        let last = self.records.iter().map(|r| r.time).max()?;
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EventStore {
        let json = include_str!("../tools/sample_events.json");
        EventStore::parse(json, &MapProjection::default()).expect("failed to parse sample")
    }

    #[test]
    fn test_parse_json_array() {
        let store = sample();
        assert_eq!(store.len(), 5);
        let (_, second) = store.iter().nth(1).unwrap();
        assert_eq!(second.place, "X");
        assert!((second.magnitude - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_feed() {
        let json = include_str!("../tools/sample_feed.geojson");
        let store = EventStore::parse(json, &MapProjection::default()).unwrap();
        assert_eq!(store.len(), 3);
        let first = store.get(EventId(0)).unwrap();
        assert_eq!(first.place, "6km NNE of Dublin, CA");
        assert!((first.latitude - 37.6843).abs() < 1e-9);
        assert!((first.depth_km - 9.12).abs() < 1e-9);
    }

    #[test]
    fn test_parse_ndjson() {
        let text = concat!(
            r#"{"time":"2017-01-05","latitude":37.0,"longitude":-120.0,"mag":4.5,"depth":5.0,"place":"X"}"#,
            "\n\n",
            r#"{"time":"2017-01-06","latitude":36.0,"longitude":-118.0,"mag":2.0,"depth":1.0}"#,
            "\n",
        );
        let store = EventStore::parse(text, &MapProjection::default()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get(EventId(1)).unwrap().place.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(EventStore::parse("not json", &MapProjection::default()).is_err());
        let bad_time = r#"[{"time":"soon","latitude":0,"longitude":0,"mag":1,"depth":1}]"#;
        assert!(matches!(
            EventStore::parse(bad_time, &MapProjection::default()),
            Err(QuakeViewError::Timestamp(_))
        ));
    }

    #[test]
    fn test_load_order_preserved() {
        let store = sample();
        let ids: Vec<usize> = store.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_date_bounds() {
        let store = sample();
        let (first, last) = store.date_bounds().unwrap();
        assert_eq!(first.format("%Y-%m-%d").to_string(), "2017-01-02");
        assert_eq!(last.format("%Y-%m-%d").to_string(), "2018-12-30");
        assert!(EventStore::default().date_bounds().is_none());
    }
}
