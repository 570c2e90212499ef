//! Read-only catalog and customer order history

use crate::backend::{Backend, Query, Table, decode_first, decode_rows};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{MenuItem, MenuSection, Order, OrderItem, Restaurant, Venue, group_menu_sections};
use std::sync::Arc;

const VENUE_COLUMNS: &str = "id, name, slug, city, state, latitude, longitude";
const RESTAURANT_COLUMNS: &str = "id, venue_id, name, category, eta_minutes";
const MENU_COLUMNS: &str = "id, restaurant_id, name, description, price, section";
const HISTORY_COLUMNS: &str = "id, status, total, created_at, section, row, seat";

/// One order with its line items
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Clone)]
pub struct Catalog {
    backend: Arc<dyn Backend>,
}

impl Catalog {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// All venues by name
    pub async fn venues(&self) -> AppResult<Vec<Venue>> {
        let rows = self
            .backend
            .select(Query::table(Table::Venues).select(VENUE_COLUMNS).order_asc("name"))
            .await?;
        Ok(decode_rows(rows)?)
    }

    /// Restaurants of a venue by name
    pub async fn restaurants(&self, venue_id: &str) -> AppResult<Vec<Restaurant>> {
        let rows = self
            .backend
            .select(
                Query::table(Table::Restaurants)
                    .select(RESTAURANT_COLUMNS)
                    .eq("venue_id", venue_id)
                    .order_asc("name"),
            )
            .await?;
        Ok(decode_rows(rows)?)
    }

    pub async fn restaurant(&self, restaurant_id: &str) -> AppResult<Restaurant> {
        let rows = self
            .backend
            .select(
                Query::table(Table::Restaurants)
                    .select(RESTAURANT_COLUMNS)
                    .eq("id", restaurant_id)
                    .limit(1),
            )
            .await?;
        decode_first(rows)?.ok_or_else(|| {
            AppError::new(ErrorCode::RestaurantNotFound).with_detail("restaurant_id", restaurant_id)
        })
    }

    /// Menu of a restaurant ordered by section, then name
    pub async fn menu_items(&self, restaurant_id: &str) -> AppResult<Vec<MenuItem>> {
        let rows = self
            .backend
            .select(
                Query::table(Table::MenuItems)
                    .select(MENU_COLUMNS)
                    .eq("restaurant_id", restaurant_id)
                    .order_asc("section")
                    .order_asc("name"),
            )
            .await?;
        Ok(decode_rows(rows)?)
    }

    /// Menu grouped under section headings
    pub async fn menu_sections(&self, restaurant_id: &str) -> AppResult<Vec<MenuSection>> {
        Ok(group_menu_sections(self.menu_items(restaurant_id).await?))
    }

    /// A customer's orders, newest first
    pub async fn order_history(&self, customer_id: &str) -> AppResult<Vec<Order>> {
        let rows = self
            .backend
            .select(
                Query::table(Table::Orders)
                    .select(HISTORY_COLUMNS)
                    .eq("customer_id", customer_id)
                    .order_desc("created_at"),
            )
            .await?;
        Ok(decode_rows(rows)?)
    }

    pub async fn order_detail(&self, order_id: &str) -> AppResult<OrderDetail> {
        let rows = self
            .backend
            .select(Query::table(Table::Orders).eq("id", order_id).limit(1))
            .await?;
        let order: Order = decode_first(rows)?.ok_or_else(|| AppError::order_not_found(order_id))?;

        let items = self
            .backend
            .select(Query::table(Table::OrderItems).eq("order_id", order_id))
            .await?;
        Ok(OrderDetail {
            order,
            items: decode_rows(items)?,
        })
    }
}
