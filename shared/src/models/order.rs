//! Order Model
//!
//! Monetary fields are stored as `f64` in currency units; they are derived
//! copies of the checkout computation, never authoritative.

use crate::order::OrderStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery timing selected at checkout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimingType {
    #[default]
    Asap,
    Scheduled,
}

/// Seat location inside the venue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SeatLocation {
    pub section: String,
    pub row: String,
    pub seat: String,
}

impl SeatLocation {
    pub fn new(section: impl Into<String>, row: impl Into<String>, seat: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            row: row.into(),
            seat: seat.into(),
        }
    }
}

/// Order row
///
/// Every field except `id` tolerates being absent so that narrow column
/// selections deserialize into the same type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    /// Raw status string; see [`Order::status`]
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub venue_id: Option<String>,
    #[serde(default)]
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub row: String,
    #[serde(default)]
    pub seat: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub allergy_notes: Option<String>,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub service_fee: f64,
    #[serde(default)]
    pub tip_percent: Option<u32>,
    #[serde(default)]
    pub tip_amount: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub timing_type: TimingType,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub runner_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Parsed status; `None` when the backend sent something unexpected
    pub fn status(&self) -> Option<OrderStatus> {
        self.status.parse().ok()
    }

    pub fn seat_location(&self) -> SeatLocation {
        SeatLocation::new(&self.section, &self.row, &self.seat)
    }

    pub fn is_claimed(&self) -> bool {
        self.runner_id.is_some()
    }
}

/// Insert payload for `orders`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewOrder {
    pub venue_id: Option<String>,
    pub restaurant_id: Option<String>,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub status: OrderStatus,
    pub section: String,
    pub row: String,
    pub seat: String,
    pub notes: Option<String>,
    pub allergy_notes: Option<String>,
    pub subtotal: f64,
    pub tax: f64,
    pub service_fee: f64,
    /// Absent when a custom dollar tip was entered
    pub tip_percent: Option<u32>,
    pub tip_amount: f64,
    pub total: f64,
    pub timing_type: TimingType,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Order line item (snapshot of a menu item at order time)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<String>,
    pub order_id: String,
    #[serde(default)]
    pub menu_item_id: Option<String>,
    pub name: String,
    /// Unit price in currency unit
    pub price: f64,
    pub quantity: u32,
}

/// Insert payload for `order_items`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewOrderItem {
    pub order_id: String,
    pub menu_item_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}
