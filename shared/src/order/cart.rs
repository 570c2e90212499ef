//! Cart draft: the client-side order being assembled
//!
//! Nothing here touches the backend. Checkout reads a draft, validates
//! it, writes it, then calls [`CartDraft::clear`].

use crate::models::{MenuItem, TimingType};
use crate::money::{PriceBreakdown, TipChoice};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One selected menu item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    /// Source menu item id
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub restaurant_id: String,
}

impl From<&MenuItem> for CartItem {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: 1,
            restaurant_id: item.restaurant_id.clone(),
        }
    }
}

/// Order draft: items plus seat, contact, tip and timing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CartDraft {
    pub items: Vec<CartItem>,
    pub venue_id: Option<String>,
    pub venue_name: Option<String>,
    pub event_id: Option<String>,
    pub event_name: Option<String>,
    pub customer_name: String,
    pub section: String,
    pub row: String,
    pub seat: String,
    pub phone: String,
    pub email: String,
    pub timing_type: TimingType,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub tip: TipChoice,
    pub notes: String,
    pub allergy_notes: String,
}

impl CartDraft {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Venue / event ==========

    /// Select a venue; any previously selected event is cleared
    pub fn set_venue(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.venue_id = Some(id.into());
        self.venue_name = Some(name.into());
        self.event_id = None;
        self.event_name = None;
    }

    pub fn set_event(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.event_id = Some(id.into());
        self.event_name = Some(name.into());
    }

    // ========== Items ==========

    /// Add one unit; an item already in the cart gets its quantity bumped
    pub fn add_item(&mut self, item: &MenuItem) {
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(1),
            None => self.items.push(CartItem::from(item)),
        }
    }

    pub fn remove_item(&mut self, id: &str) {
        self.items.retain(|i| i.id != id);
    }

    /// Set a quantity; zero or below removes the item
    pub fn update_quantity(&mut self, id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.quantity = quantity;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, i| count.saturating_add(i.quantity))
    }

    /// Restaurant of the first item; orders are placed per restaurant
    pub fn restaurant_id(&self) -> Option<&str> {
        self.items.first().map(|i| i.restaurant_id.as_str())
    }

    // ========== Checkout fields ==========

    pub fn set_seat(&mut self, section: &str, row: &str, seat: &str) {
        self.section = section.to_string();
        self.row = row.to_string();
        self.seat = seat.to_string();
    }

    pub fn set_timing(&mut self, timing: TimingType, at: Option<DateTime<Utc>>) {
        self.timing_type = timing;
        self.scheduled_at = at;
    }

    pub fn set_tip_percent(&mut self, percent: u32) {
        self.tip = TipChoice::Percent(percent);
    }

    pub fn set_custom_tip(&mut self, dollars: f64) {
        self.tip = TipChoice::Custom(dollars);
    }

    pub fn pricing(&self) -> PriceBreakdown {
        PriceBreakdown::compute(self.items.iter().map(|i| (i.price, i.quantity)), self.tip)
    }

    pub fn subtotal(&self) -> f64 {
        self.pricing().subtotal
    }

    /// Empty the draft; the selected venue and event are kept
    pub fn clear(&mut self) {
        *self = Self {
            venue_id: self.venue_id.take(),
            venue_name: self.venue_name.take(),
            event_id: self.event_id.take(),
            event_name: self.event_name.take(),
            ..Self::default()
        };
    }
}
