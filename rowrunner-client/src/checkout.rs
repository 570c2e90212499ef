//! Order placement
//!
//! Validates the cart, then performs two dependent writes: the order row,
//! then its line items. There is no transaction; when the second write
//! fails the order stays without items and the caller gets a generic
//! failure. The confirmation email and cart reset follow a full success.

use crate::backend::{Backend, Table};
use crate::notify::{EmailPayload, OrderNotifier};
use crate::session::SessionManager;
use serde_json::Value;
use shared::error::{AppError, AppResult, ErrorCode, GENERIC_FAILURE_MESSAGE};
use shared::models::{NewOrder, NewOrderItem};
use shared::money::{PriceBreakdown, format_amount};
use shared::order::{CartDraft, OrderStatus};
use shared::validation::{
    FieldErrors, format_phone, is_valid_email, is_valid_phone, is_valid_seat_field,
    sanitize_email, sanitize_seat_field, sanitize_text,
};
use std::sync::Arc;

/// Result of a successful placement
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order_id: String,
    pub pricing: PriceBreakdown,
    /// Whether the confirmation email was accepted
    pub email_sent: bool,
}

/// Checkout fields after sanitization
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutFields {
    pub customer_name: String,
    pub section: String,
    pub row: String,
    pub seat: String,
    pub phone: String,
    pub email: String,
}

pub struct Checkout {
    backend: Arc<dyn Backend>,
    session: Arc<SessionManager>,
    notifier: OrderNotifier,
}

impl Checkout {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: Arc<SessionManager>,
        notifier: OrderNotifier,
    ) -> Self {
        Self {
            backend,
            session,
            notifier,
        }
    }

    /// Sanitize and check every field; name and email fall back to the
    /// signed-in account
    pub fn validate(&self, cart: &CartDraft) -> AppResult<CheckoutFields> {
        let state = self.session.snapshot();
        let account_name = state
            .auth
            .as_ref()
            .and_then(|a| a.user.full_name())
            .unwrap_or_default();

        let name = if cart.customer_name.trim().is_empty() {
            account_name
        } else {
            cart.customer_name.as_str()
        };
        let email = if cart.email.trim().is_empty() {
            state.email().unwrap_or_default()
        } else {
            cart.email.as_str()
        };

        let fields = CheckoutFields {
            customer_name: sanitize_text(name),
            section: sanitize_seat_field(&cart.section),
            row: sanitize_seat_field(&cart.row),
            seat: sanitize_seat_field(&cart.seat),
            phone: format_phone(&cart.phone),
            email: sanitize_email(email),
        };

        let mut errors = FieldErrors::new();
        errors.check_as(
            !fields.customer_name.is_empty(),
            ErrorCode::RequiredField,
            "name",
            "Name is required",
        );
        errors.check(is_valid_seat_field(&fields.section), "section", "Required");
        errors.check(is_valid_seat_field(&fields.row), "row", "Required");
        errors.check(is_valid_seat_field(&fields.seat), "seat", "Required");
        errors.check(
            is_valid_phone(&cart.phone),
            "phone",
            "Enter a valid 10-digit number",
        );
        errors.check(is_valid_email(&fields.email), "email", "Enter a valid email");
        errors.check_as(!cart.is_empty(), ErrorCode::CartEmpty, "cart", "Cart is empty");
        errors.into_result(ErrorCode::ValidationFailed)?;

        Ok(fields)
    }

    /// Place the cart as an order. On success the cart is cleared.
    pub async fn place(&self, cart: &mut CartDraft) -> AppResult<PlacedOrder> {
        let fields = self.validate(cart)?;
        let pricing = cart.pricing();

        let new_order = NewOrder {
            venue_id: cart.venue_id.clone(),
            restaurant_id: cart.restaurant_id().map(str::to_string),
            customer_id: self.session.user_id(),
            customer_name: fields.customer_name.clone(),
            customer_email: fields.email.clone(),
            customer_phone: fields.phone.clone(),
            status: OrderStatus::Pending,
            section: fields.section.clone(),
            row: fields.row.clone(),
            seat: fields.seat.clone(),
            notes: optional_text(&cart.notes),
            allergy_notes: optional_text(&cart.allergy_notes),
            subtotal: pricing.subtotal,
            tax: pricing.tax,
            service_fee: pricing.service_fee,
            tip_percent: pricing.tip_percent,
            tip_amount: pricing.tip_amount,
            total: pricing.total,
            timing_type: cart.timing_type,
            scheduled_at: cart.scheduled_at,
        };

        let stored = self
            .backend
            .insert(Table::Orders, vec![serde_json::to_value(&new_order)?])
            .await?;
        let order_id = stored
            .first()
            .and_then(|row| row.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::internal("Order insert returned no id"))?;

        let items = cart
            .items
            .iter()
            .map(|item| {
                serde_json::to_value(NewOrderItem {
                    order_id: order_id.clone(),
                    menu_item_id: item.id.clone(),
                    name: item.name.clone(),
                    price: item.price,
                    quantity: item.quantity,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Err(e) = self.backend.insert(Table::OrderItems, items).await {
            tracing::error!(%order_id, error = %e, "Order stored without its items");
            return Err(
                AppError::with_message(ErrorCode::OrderItemsFailed, GENERIC_FAILURE_MESSAGE)
                    .with_detail("order_id", order_id),
            );
        }
        tracing::info!(%order_id, total = pricing.total, items = cart.items.len(), "Order placed");

        let payload = EmailPayload {
            to: fields.email,
            customer_name: fields.customer_name,
            order_id: order_id.clone(),
            status: OrderStatus::Pending.as_str().to_string(),
            section: fields.section,
            row: fields.row,
            seat: fields.seat,
            total: format_amount(pricing.total),
            items: None,
            venue_name: cart.venue_name.clone(),
        }
        .with_items(&cart.items);
        let email_sent = self.notifier.send(payload).await;

        cart.clear();
        Ok(PlacedOrder {
            order_id,
            pricing,
            email_sent,
        })
    }
}

fn optional_text(value: &str) -> Option<String> {
    Some(sanitize_text(value)).filter(|v| !v.is_empty())
}
