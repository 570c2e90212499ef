//! Event Model
//!
//! Events are fetched with their venue embedded and flattened into
//! [`EventListing`] rows for discovery.

use super::venue::Venue;
use crate::geo::{Coordinate, sort_by_distance};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Event row as returned by the backend (venue embedded)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub venue_id: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub venues: Option<Venue>,
}

fn default_active() -> bool {
    true
}

/// Where an event is relative to now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Live,
    StartingSoon,
    Upcoming,
    Ended,
}

impl EventPhase {
    pub fn at(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now >= starts_at && now <= ends_at {
            Self::Live
        } else if now > ends_at {
            Self::Ended
        } else if starts_at - now < Duration::hours(1) {
            Self::StartingSoon
        } else {
            Self::Upcoming
        }
    }

    /// Badge label; upcoming events show their start time instead
    pub fn badge(&self) -> Option<&'static str> {
        match self {
            Self::Live => Some("LIVE NOW"),
            Self::StartingSoon => Some("STARTING SOON"),
            Self::Upcoming | Self::Ended => None,
        }
    }
}

/// Flattened event + venue row used by discovery screens
#[derive(Debug, Clone, PartialEq)]
pub struct EventListing {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub venue_id: String,
    pub venue_name: String,
    pub venue_city: String,
    pub venue_state: String,
    pub venue_coordinate: Option<Coordinate>,
    pub distance_miles: Option<f64>,
}

impl From<Event> for EventListing {
    fn from(event: Event) -> Self {
        let venue = event.venues;
        Self {
            venue_id: venue
                .as_ref()
                .map(|v| v.id.clone())
                .unwrap_or(event.venue_id),
            venue_name: venue.as_ref().map(|v| v.name.clone()).unwrap_or_default(),
            venue_city: venue.as_ref().and_then(|v| v.city.clone()).unwrap_or_default(),
            venue_state: venue.as_ref().and_then(|v| v.state.clone()).unwrap_or_default(),
            venue_coordinate: venue.as_ref().and_then(Venue::coordinate),
            id: event.id,
            title: event.title,
            description: event.description,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            distance_miles: None,
        }
    }
}

impl EventListing {
    pub fn phase(&self, now: DateTime<Utc>) -> EventPhase {
        EventPhase::at(self.starts_at, self.ends_at, now)
    }

    /// "Venue · City, ST"
    pub fn venue_line(&self) -> String {
        format!("{} · {}, {}", self.venue_name, self.venue_city, self.venue_state)
    }
}

/// Annotate each listing with its distance from `origin` and sort nearest
/// first. Listings without venue coordinates keep `None` and go last.
pub fn apply_distances(listings: &mut [EventListing], origin: Coordinate) {
    for listing in listings.iter_mut() {
        listing.distance_miles = listing
            .venue_coordinate
            .map(|c| origin.distance_miles(&c));
    }
    sort_by_distance(listings, |l| l.distance_miles);
}
