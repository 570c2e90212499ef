//! Event discovery
//!
//! Loads active events, then tries for a device location. With a location
//! the list is sorted nearest first (unknown venue coordinates last) and
//! the nearest event is pre-selected. Both steps are time-bounded and
//! degrade instead of failing: a slow or failing events query yields an
//! empty list, a missing location leaves the list in start-time order.

use crate::backend::{Backend, Query, Table, decode_rows};
use crate::error::{ClientError, ClientResult};
use crate::location::{LocationProvider, try_locate};
use chrono::{DateTime, SecondsFormat, Utc};
use shared::geo::Coordinate;
use shared::models::{Event, EventListing, apply_distances};
use shared::order::CartDraft;
use std::sync::Arc;
use std::time::Duration;

const EVENT_COLUMNS: &str =
    "id, title, description, starts_at, ends_at, venue_id, venues(id, name, city, state, latitude, longitude)";

/// Events on offer plus what the device location contributed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSelection {
    pub events: Vec<EventListing>,
    pub origin: Option<Coordinate>,
    /// Pre-selected event id
    pub selected: Option<String>,
}

impl EventSelection {
    pub fn has_coordinates(&self) -> bool {
        self.origin.is_some()
    }

    pub fn selected_event(&self) -> Option<&EventListing> {
        let id = self.selected.as_deref()?;
        self.events.iter().find(|e| e.id == id)
    }

    /// Sort by distance from `origin` and pre-select the nearest event
    pub fn apply_origin(&mut self, origin: Coordinate) {
        apply_distances(&mut self.events, origin);
        self.origin = Some(origin);
        self.selected = self.events.first().map(|e| e.id.clone());
    }
}

/// Put the chosen event's venue and the event itself into the cart
pub fn choose_event(cart: &mut CartDraft, listing: &EventListing) {
    cart.set_venue(&listing.venue_id, &listing.venue_name);
    cart.set_event(&listing.id, &listing.title);
}

pub struct Discovery {
    backend: Arc<dyn Backend>,
    location: Arc<dyn LocationProvider>,
    query_timeout: Duration,
    location_timeout: Duration,
}

impl Discovery {
    pub fn new(
        backend: Arc<dyn Backend>,
        location: Arc<dyn LocationProvider>,
        query_timeout: Duration,
        location_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            location,
            query_timeout,
            location_timeout,
        }
    }

    /// Active events that have not ended, by start time
    pub async fn fetch_events(&self, now: DateTime<Utc>) -> ClientResult<Vec<EventListing>> {
        let query = Query::table(Table::Events)
            .select(EVENT_COLUMNS)
            .eq("is_active", true)
            .gte("ends_at", now.to_rfc3339_opts(SecondsFormat::Secs, true))
            .order_asc("starts_at");

        let rows = tokio::time::timeout(self.query_timeout, self.backend.select(query))
            .await
            .map_err(|_| ClientError::Timeout("Events query".into()))??;
        let events: Vec<Event> = decode_rows(rows)?;
        Ok(events.into_iter().map(EventListing::from).collect())
    }

    /// [`fetch_events`](Self::fetch_events), empty on any failure
    pub async fn active_events(&self, now: DateTime<Utc>) -> Vec<EventListing> {
        match self.fetch_events(now).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "Events unavailable, showing none");
                Vec::new()
            }
        }
    }

    pub async fn locate(&self) -> Option<Coordinate> {
        try_locate(self.location.as_ref(), self.location_timeout).await
    }

    /// Events first, then the location
    pub async fn load(&self, now: DateTime<Utc>) -> EventSelection {
        let mut selection = EventSelection {
            events: self.active_events(now).await,
            ..Default::default()
        };
        if let Some(origin) = self.locate().await {
            selection.apply_origin(origin);
        }
        tracing::debug!(
            events = selection.events.len(),
            located = selection.has_coordinates(),
            "Discovery loaded"
        );
        selection
    }

    /// Ask for the location again; returns whether one was obtained
    pub async fn retry_location(&self, selection: &mut EventSelection) -> bool {
        match self.locate().await {
            Some(origin) => {
                selection.apply_origin(origin);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::location::FixedLocation;
    use serde_json::json;

    fn discovery(backend: Arc<MemoryBackend>, location: FixedLocation) -> Discovery {
        Discovery::new(
            backend,
            Arc::new(location),
            Duration::from_millis(8_000),
            Duration::from_millis(5_000),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_query_degrades_to_empty() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            Table::Events,
            [json!({
                "id": "e1", "title": "Game", "venue_id": "v1", "is_active": true,
                "starts_at": "2026-05-01T19:00:00Z", "ends_at": "2099-05-01T22:00:00Z"
            })],
        );
        backend.set_select_delay(Some(Duration::from_secs(9)));

        let events = discovery(backend, FixedLocation::denied())
            .active_events(Utc::now())
            .await;
        assert!(events.is_empty());
    }

    #[test]
    fn test_choose_event_fills_cart() {
        let listing = EventListing {
            id: "e1".into(),
            title: "Game".into(),
            description: None,
            starts_at: Utc::now(),
            ends_at: Utc::now(),
            venue_id: "v1".into(),
            venue_name: "Arena".into(),
            venue_city: String::new(),
            venue_state: String::new(),
            venue_coordinate: None,
            distance_miles: None,
        };
        let mut cart = CartDraft::new();
        choose_event(&mut cart, &listing);
        assert_eq!(cart.venue_id.as_deref(), Some("v1"));
        assert_eq!(cart.event_name.as_deref(), Some("Game"));
    }
}
