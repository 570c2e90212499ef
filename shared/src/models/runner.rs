//! Runner board models

use super::order::Order;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `runner_sessions` row; one per runner, upserted on `runner_id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerSession {
    pub runner_id: String,
    pub venue_id: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// Restaurant columns embedded in a runner order query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RestaurantRef {
    #[serde(default)]
    pub name: String,
}

/// Order row with its restaurant name embedded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerOrder {
    #[serde(flatten)]
    pub order: Order,
    #[serde(default)]
    pub restaurants: Option<RestaurantRef>,
}

impl RunnerOrder {
    pub fn id(&self) -> &str {
        &self.order.id
    }

    pub fn restaurant_name(&self) -> &str {
        self.restaurants
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or("")
    }

    /// "Sec 112 · Row F · Seat 7"
    pub fn seat_line(&self) -> String {
        format!(
            "Sec {} · Row {} · Seat {}",
            self.order.section, self.order.row, self.order.seat
        )
    }
}
