//! Point selection by hit-testing clean clicks.
//!
//! At most one event is active at a time. Its detail panel is open exactly
//! while it stays selected; every change of selection goes through
//! [`Selection`] so the record flags never drift from the active id.

use serde::Serialize;
use tracing::debug;

use crate::models::EventId;
use crate::store::EventStore;
use crate::viewport::Viewport;

/// Hit radius per unit of magnitude, in screen pixels.
///
/// Markers are drawn with diameter `magnitude * 10 / scale`, so this matches
/// the drawn radius.
pub const HIT_RADIUS_FACTOR: f64 = 5.0;

/// Outcome of a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "change", content = "id", rename_all = "snake_case")]
pub enum SelectionChange {
    /// An event was hit and is now active
    Selected(EventId),
    /// Empty space was clicked and the previous selection dropped
    Cleared,
    /// Empty space was clicked with nothing selected
    Unchanged,
}

/// The active selection, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    active: Option<EventId>,
}

impl Selection {
    /// Nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active event, if any.
    #[must_use]
    pub fn active(&self) -> Option<EventId> {
        self.active
    }

    /// Find the first visible event under a screen point, in load order.
    #[must_use]
    pub fn hit_test(sx: f64, sy: f64, events: &EventStore, viewport: &Viewport) -> Option<EventId> {
        let click = viewport.screen_to_content(sx, sy);
        events
            .iter()
            .filter(|(_, event)| event.is_visible())
            .find(|(_, event)| {
                event.position.distance(click)
                    <= event.magnitude * HIT_RADIUS_FACTOR / viewport.scale()
            })
            .map(|(id, _)| id)
    }

    /// Handle a clean click at a screen point.
    pub fn handle_click(
        &mut self,
        sx: f64,
        sy: f64,
        events: &mut EventStore,
        viewport: &Viewport,
    ) -> SelectionChange {
        match Self::hit_test(sx, sy, events, viewport) {
            Some(id) => {
                self.select(id, events);
                SelectionChange::Selected(id)
            }
            None if self.active.is_some() => {
                self.clear(events);
                SelectionChange::Cleared
            }
            None => SelectionChange::Unchanged,
        }
    }

    /// Make an event active, closing the previous one's detail panel.
    pub fn select(&mut self, id: EventId, events: &mut EventStore) {
        self.clear(events);
        if let Some(event) = events.get_mut(id) {
            event.view.detail_open = true;
            self.active = Some(id);
            debug!("selected event {}", id.0);
        }
    }

    /// Drop the active selection, if any.
    pub fn clear(&mut self, events: &mut EventStore) {
        if let Some(event) = self.active.take().and_then(|id| events.get_mut(id)) {
            event.view.detail_open = false;
        }
    }

    /// The active event whose detail panel should be drawn.
    #[must_use]
    pub fn open_detail(&self, events: &EventStore) -> Option<EventId> {
        self.active
            .filter(|id| events.get(*id).is_some_and(|e| e.view().detail_open))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterState, apply_filters};
    use crate::models::{RawRecord, parse_timestamp};
    use crate::projection::MapProjection;

    fn raw(lat: f64, lon: f64, mag: f64) -> RawRecord {
        RawRecord {
            time: "2017-01-05".into(),
            latitude: lat,
            longitude: lon,
            mag,
            depth: 3.0,
            place: String::new(),
        }
    }

    /// Store with every event visible.
    fn visible_store(raws: Vec<RawRecord>) -> EventStore {
        let mut store = EventStore::from_raw(raws, &MapProjection::default()).unwrap();
        let filter = FilterState::new(parse_timestamp("2017-01-02").unwrap());
        apply_filters(store.records_mut(), &filter);
        store
    }

    fn screen_of(store: &EventStore, id: usize, viewport: &Viewport) -> (f64, f64) {
        let p = viewport.content_to_screen(store.get(EventId(id)).unwrap().position);
        (p.x, p.y)
    }

    #[test]
    fn test_first_match_wins() {
        // A is smaller and first, B is larger and second; both cover A's center
        let mut store = visible_store(vec![raw(37.5, -119.0, 2.0), raw(37.5, -118.99, 6.0)]);
        let viewport = Viewport::default();
        let (x, y) = screen_of(&store, 0, &viewport);
        // B's center is closer to this point than A's
        let click = (x + 5.0, y);

        assert!(
            store.get(EventId(1)).unwrap().position.distance(viewport.screen_to_content(click.0, click.1))
                < store.get(EventId(0)).unwrap().position.distance(viewport.screen_to_content(click.0, click.1))
        );

        let mut selection = Selection::new();
        let change = selection.handle_click(click.0, click.1, &mut store, &viewport);
        assert_eq!(change, SelectionChange::Selected(EventId(0)));
    }

    #[test]
    fn test_reselect_closes_previous_detail() {
        let mut store = visible_store(vec![raw(37.5, -119.0, 3.0), raw(36.0, -117.0, 3.0)]);
        let viewport = Viewport::default();
        let mut selection = Selection::new();

        let (x, y) = screen_of(&store, 0, &viewport);
        selection.handle_click(x, y, &mut store, &viewport);
        assert_eq!(selection.active(), Some(EventId(0)));
        assert!(store.get(EventId(0)).unwrap().view().detail_open);

        let (x, y) = screen_of(&store, 1, &viewport);
        selection.handle_click(x, y, &mut store, &viewport);
        assert_eq!(selection.active(), Some(EventId(1)));
        assert!(!store.get(EventId(0)).unwrap().view().detail_open);
        assert!(store.get(EventId(1)).unwrap().view().detail_open);
        assert_eq!(selection.open_detail(&store), Some(EventId(1)));
    }

    #[test]
    fn test_empty_click_clears() {
        let mut store = visible_store(vec![raw(37.5, -119.0, 3.0)]);
        let viewport = Viewport::default();
        let mut selection = Selection::new();

        // Nothing selected yet: a miss is a safe no-op
        assert_eq!(
            selection.handle_click(5.0, 5.0, &mut store, &viewport),
            SelectionChange::Unchanged
        );

        selection.handle_click(640.0, 360.0, &mut store, &viewport);
        assert_eq!(selection.active(), Some(EventId(0)));

        assert_eq!(
            selection.handle_click(5.0, 5.0, &mut store, &viewport),
            SelectionChange::Cleared
        );
        assert_eq!(selection.active(), None);
        assert!(!store.get(EventId(0)).unwrap().view().detail_open);
        assert_eq!(selection.open_detail(&store), None);
    }

    #[test]
    fn test_hidden_events_are_skipped() {
        let mut store =
            EventStore::from_raw(vec![raw(37.5, -119.0, 3.0)], &MapProjection::default()).unwrap();
        let viewport = Viewport::default();
        let mut selection = Selection::new();

        assert_eq!(
            selection.handle_click(640.0, 360.0, &mut store, &viewport),
            SelectionChange::Unchanged
        );
    }

    #[test]
    fn test_hit_radius_tracks_marker_size() {
        let mut store = visible_store(vec![raw(37.5, -119.0, 4.0)]);
        let mut viewport = Viewport::default();

        // Radius 20px at scale 1
        assert_eq!(Selection::hit_test(660.0, 360.0, &store, &viewport), Some(EventId(0)));
        assert_eq!(Selection::hit_test(661.0, 360.0, &store, &viewport), None);

        // At scale 2 the content-space radius halves to 10, which is 20px on
        // screen again
        viewport.zoom_in();
        assert_eq!(Selection::hit_test(660.0, 360.0, &store, &viewport), Some(EventId(0)));
        assert_eq!(Selection::hit_test(650.0, 360.0, &store, &viewport), Some(EventId(0)));
        assert_eq!(Selection::hit_test(641.0, 365.0, &store, &viewport), Some(EventId(0)));

        let mut selection = Selection::new();
        selection.handle_click(650.0, 360.0, &mut store, &viewport);
        assert_eq!(selection.active(), Some(EventId(0)));
    }
}
