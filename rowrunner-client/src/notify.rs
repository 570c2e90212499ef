//! Order email notifications
//!
//! Emails go out through the `send-order-email` function. Delivery is best
//! effort: failures are logged and never reach the caller.

use crate::backend::Backend;
use serde::{Deserialize, Serialize};
use shared::models::Order;
use shared::money::format_amount;
use shared::order::CartItem;
use std::sync::Arc;

/// Backend function that sends order emails
pub const SEND_ORDER_EMAIL: &str = "send-order-email";

/// Name used when the order carries none
pub const DEFAULT_CUSTOMER_NAME: &str = "Customer";

/// Line item as listed in the email
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

impl From<&CartItem> for EmailItem {
    fn from(item: &CartItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.price,
        }
    }
}

/// Request body of [`SEND_ORDER_EMAIL`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailPayload {
    pub to: String,
    pub customer_name: String,
    pub order_id: String,
    pub status: String,
    pub section: String,
    pub row: String,
    pub seat: String,
    /// Two-decimal string, e.g. "24.41"
    pub total: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<EmailItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_name: Option<String>,
}

impl EmailPayload {
    /// Status email for a stored order; `None` when it has no customer email
    pub fn for_order(order: &Order, status: &str, venue_name: Option<&str>) -> Option<Self> {
        let to = order
            .customer_email
            .as_deref()
            .filter(|e| !e.trim().is_empty())?;
        Some(Self {
            to: to.to_string(),
            customer_name: order
                .customer_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string()),
            order_id: order.id.clone(),
            status: status.to_string(),
            section: order.section.clone(),
            row: order.row.clone(),
            seat: order.seat.clone(),
            total: format_amount(order.total),
            items: None,
            venue_name: venue_name.map(str::to_string),
        })
    }

    pub fn with_items<'a>(mut self, items: impl IntoIterator<Item = &'a CartItem>) -> Self {
        self.items = Some(items.into_iter().map(EmailItem::from).collect());
        self
    }
}

/// Fire-and-forget email dispatch
#[derive(Clone)]
pub struct OrderNotifier {
    backend: Arc<dyn Backend>,
}

impl OrderNotifier {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Send one email; returns whether the backend accepted it
    pub async fn send(&self, payload: EmailPayload) -> bool {
        let order_id = payload.order_id.clone();
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(%order_id, error = %e, "Email payload serialization failed");
                return false;
            }
        };
        match self.backend.invoke(SEND_ORDER_EMAIL, body).await {
            Ok(_) => {
                tracing::debug!(%order_id, status = %payload.status, "Order email sent");
                true
            }
            Err(e) => {
                tracing::warn!(%order_id, error = %e, "Email send failed");
                false
            }
        }
    }

    /// Send the status email for `order` if it has a customer email
    pub async fn order_status(&self, order: &Order, status: &str, venue_name: Option<&str>) -> bool {
        match EmailPayload::for_order(order, status, venue_name) {
            Some(payload) => self.send(payload).await,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, Operation};
    use serde_json::json;

    fn order(email: Option<&str>, name: Option<&str>) -> Order {
        serde_json::from_value(json!({
            "id": "o1",
            "status": "claimed",
            "customer_email": email,
            "customer_name": name,
            "section": "112", "row": "F", "seat": "7",
            "total": 24.4
        }))
        .unwrap()
    }

    #[test]
    fn test_payload_is_camel_case() {
        let payload = EmailPayload::for_order(&order(Some("fan@example.com"), None), "claimed", Some("Arena"))
            .unwrap();
        let wire = serde_json::to_value(&payload).unwrap();
        assert_eq!(wire["customerName"], "Customer");
        assert_eq!(wire["orderId"], "o1");
        assert_eq!(wire["total"], "24.40");
        assert_eq!(wire["venueName"], "Arena");
        assert!(wire.get("items").is_none());
    }

    #[test]
    fn test_no_email_no_payload() {
        assert!(EmailPayload::for_order(&order(None, Some("Sam")), "claimed", None).is_none());
        assert!(EmailPayload::for_order(&order(Some(" "), Some("Sam")), "claimed", None).is_none());
    }

    #[tokio::test]
    async fn test_send_failure_is_swallowed() {
        let backend = Arc::new(MemoryBackend::new());
        let notifier = OrderNotifier::new(backend.clone());
        let o = order(Some("fan@example.com"), Some("Sam"));

        assert!(notifier.order_status(&o, "claimed", None).await);
        backend.fail(Operation::Invoke, None);
        assert!(!notifier.order_status(&o, "confirmed", None).await);

        let sent = backend.invocations();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SEND_ORDER_EMAIL);
        assert_eq!(sent[0].1["customerName"], "Sam");
    }
}
