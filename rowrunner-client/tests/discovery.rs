//! Event discovery with and without a device location

mod common;

use chrono::{TimeZone, Utc};
use common::*;
use rowrunner_client::backend::{Operation, Table};
use rowrunner_client::discovery::choose_event;
use rowrunner_client::{CartDraft, FixedLocation, RowRunner};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Near venue v1 (Philadelphia), far venue v2 (Pittsburgh), v3 without
/// coordinates
fn seed_events(backend: &rowrunner_client::MemoryBackend) {
    backend.seed(
        Table::Venues,
        [
            json!({ "id": "v2", "name": "Far Field", "city": "Pittsburgh", "state": "PA", "latitude": 40.4468, "longitude": -80.0158 }),
            json!({ "id": "v3", "name": "Mystery Dome", "city": "Nowhere", "state": "PA" }),
        ],
    );
    backend.seed(
        Table::Events,
        [
            json!({ "id": "e-far", "title": "Far Game", "venue_id": "v2", "is_active": true,
                    "starts_at": "2026-05-01T17:00:00Z", "ends_at": "2026-05-01T20:00:00Z" }),
            json!({ "id": "e-unknown", "title": "Mystery Game", "venue_id": "v3", "is_active": true,
                    "starts_at": "2026-05-01T18:00:00Z", "ends_at": "2026-05-01T21:00:00Z" }),
            json!({ "id": "e-near", "title": "Home Game", "venue_id": VENUE_ID, "is_active": true,
                    "starts_at": "2026-05-01T19:00:00Z", "ends_at": "2026-05-01T22:00:00Z" }),
            json!({ "id": "e-over", "title": "Last Night", "venue_id": VENUE_ID, "is_active": true,
                    "starts_at": "2026-04-30T19:00:00Z", "ends_at": "2026-04-30T22:00:00Z" }),
            json!({ "id": "e-off", "title": "Cancelled Show", "venue_id": VENUE_ID, "is_active": false,
                    "starts_at": "2026-05-01T20:00:00Z", "ends_at": "2026-05-01T23:00:00Z" }),
        ],
    );
}

fn evening() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 16, 0, 0).unwrap()
}

#[tokio::test]
async fn test_without_location_start_order() {
    let backend = stadium();
    seed_events(&backend);
    let client = RowRunner::in_memory(backend);

    let selection = client
        .discovery(Arc::new(FixedLocation::denied()))
        .load(evening())
        .await;

    let ids: Vec<_> = selection.events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["e-far", "e-unknown", "e-near"]);
    assert!(!selection.has_coordinates());
    assert!(selection.selected.is_none());
    assert!(selection.events.iter().all(|e| e.distance_miles.is_none()));
    assert_eq!(selection.events[2].venue_line(), "Arena · Philadelphia, PA");
}

#[tokio::test]
async fn test_location_sorts_nearest_first_and_preselects() {
    let backend = stadium();
    seed_events(&backend);
    let client = RowRunner::in_memory(backend);

    // A few blocks from the Arena
    let selection = client
        .discovery(Arc::new(FixedLocation::at(39.95, -75.16)))
        .load(evening())
        .await;

    let ids: Vec<_> = selection.events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["e-near", "e-far", "e-unknown"]);
    assert_eq!(selection.selected.as_deref(), Some("e-near"));

    let near = selection.events[0].distance_miles.unwrap();
    let far = selection.events[1].distance_miles.unwrap();
    assert!(near < 5.0);
    assert!(far > 200.0);
    assert!(selection.events[2].distance_miles.is_none());

    let mut cart = CartDraft::new();
    choose_event(&mut cart, selection.selected_event().unwrap());
    assert_eq!(cart.venue_id.as_deref(), Some(VENUE_ID));
    assert_eq!(cart.venue_name.as_deref(), Some("Arena"));
    assert_eq!(cart.event_id.as_deref(), Some("e-near"));
}

#[tokio::test(start_paused = true)]
async fn test_slow_location_falls_back_then_retries() {
    let backend = stadium();
    seed_events(&backend);
    let client = RowRunner::in_memory(backend);

    let slow = client.discovery(Arc::new(
        FixedLocation::at(39.95, -75.16).delayed(Duration::from_secs(60)),
    ));
    let mut selection = slow.load(evening()).await;
    assert_eq!(selection.events.len(), 3);
    assert!(!selection.has_coordinates());
    assert!(!slow.retry_location(&mut selection).await);

    let quick = client.discovery(Arc::new(FixedLocation::at(39.95, -75.16)));
    assert!(quick.retry_location(&mut selection).await);
    assert_eq!(selection.selected.as_deref(), Some("e-near"));
}

#[tokio::test]
async fn test_failed_events_query_shows_none() {
    let backend = stadium();
    seed_events(&backend);
    backend.fail(Operation::Select, Some(Table::Events));
    let client = RowRunner::in_memory(backend);

    let discovery = client.discovery(Arc::new(FixedLocation::at(39.95, -75.16)));
    assert!(discovery.fetch_events(evening()).await.is_err());

    let selection = discovery.load(evening()).await;
    assert!(selection.events.is_empty());
    assert!(selection.has_coordinates());
    assert!(selection.selected.is_none());
}
