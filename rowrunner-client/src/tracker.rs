//! Live order status for the confirmation screen
//!
//! The tracker fetches the order's status once, then follows UPDATE
//! notifications for that order. Whatever status the backend reports is
//! taken as truth, including one that disagrees with a local cancel.

use crate::backend::{Backend, ChangeFilter, ChangeKind, ChangeStream, Query, Table};
use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::order::{OrderStatus, headline, progress_step};
use std::sync::Arc;

pub const CANCEL_FAILED_MESSAGE: &str = "Could not cancel the order. Please try again.";

pub struct OrderTracker {
    backend: Arc<dyn Backend>,
    order_id: String,
    status: String,
    stream: Option<ChangeStream>,
}

impl OrderTracker {
    pub fn new(backend: Arc<dyn Backend>, order_id: impl Into<String>) -> Self {
        Self {
            backend,
            order_id: order_id.into(),
            status: OrderStatus::Pending.as_str().to_string(),
            stream: None,
        }
    }

    /// Subscribe to the order and load its current status.
    ///
    /// The subscription is opened first so no change between the fetch and
    /// the join is missed. A failed subscription only costs live updates.
    pub async fn start(&mut self) -> AppResult<&str> {
        let filter = ChangeFilter::table(Table::Orders)
            .kind(ChangeKind::Update)
            .eq("id", self.order_id.as_str());
        match self.backend.subscribe(filter).await {
            Ok(stream) => self.stream = Some(stream),
            Err(e) => {
                tracing::warn!(order_id = %self.order_id, error = %e, "Order subscription failed");
            }
        }

        let rows = self
            .backend
            .select(
                Query::table(Table::Orders)
                    .select("status")
                    .eq("id", self.order_id.as_str())
                    .limit(1),
            )
            .await?;
        let status = rows
            .first()
            .and_then(|row| row.get("status"))
            .and_then(|s| s.as_str())
            .ok_or_else(|| AppError::order_not_found(&self.order_id))?;
        self.status = status.to_string();
        Ok(&self.status)
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Raw status string as last reported
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Progress step index (unknown statuses are step 0)
    pub fn step(&self) -> usize {
        progress_step(&self.status)
    }

    pub fn headline(&self) -> &'static str {
        headline(&self.status)
    }

    pub fn waiting_message(&self) -> Option<&'static str> {
        self.status.parse::<OrderStatus>().ok()?.waiting_message()
    }

    pub fn can_cancel(&self) -> bool {
        self.status
            .parse::<OrderStatus>()
            .is_ok_and(|s| s.can_cancel())
    }

    /// Delivered or cancelled. The feed stays open; a later backend
    /// status still replaces this one.
    pub fn is_finished(&self) -> bool {
        self.status
            .parse::<OrderStatus>()
            .is_ok_and(|s| s.is_terminal())
    }

    pub fn is_live(&self) -> bool {
        self.stream.is_some()
    }

    /// Wait for the next status change; `None` once the feed has ended or
    /// was never opened
    pub async fn next_update(&mut self) -> Option<&str> {
        loop {
            let event = self.stream.as_mut()?.next().await;
            let Some(event) = event else {
                self.stream = None;
                return None;
            };
            if let Some(status) = event.record_str("status") {
                let status = status.to_string();
                self.apply_status(status);
                return Some(&self.status);
            }
        }
    }

    /// Apply every change already queued; returns whether the status moved
    pub fn apply_pending(&mut self) -> bool {
        let mut latest = None;
        if let Some(stream) = self.stream.as_mut() {
            while let Some(event) = stream.try_next() {
                if let Some(status) = event.record_str("status") {
                    latest = Some(status.to_string());
                }
            }
        }
        match latest {
            Some(status) if status != self.status => {
                self.apply_status(status);
                true
            }
            _ => false,
        }
    }

    fn apply_status(&mut self, status: String) {
        tracing::debug!(order_id = %self.order_id, from = %self.status, to = %status, "Order status update");
        self.status = status;
    }

    /// Cancel the order.
    ///
    /// Written unconditionally as `cancelled`. The local status only moves
    /// when the backend returns the updated row.
    pub async fn cancel(&mut self) -> AppResult<()> {
        if !self.can_cancel() {
            return Err(AppError::new(ErrorCode::OrderNotCancellable)
                .with_detail("status", self.status.as_str()));
        }

        let result = self
            .backend
            .update(
                Query::table(Table::Orders).eq("id", self.order_id.as_str()),
                json!({ "status": OrderStatus::Cancelled.as_str() }),
            )
            .await;

        match result {
            Ok(rows) => {
                if let Some(status) = rows
                    .first()
                    .and_then(|r| r.get("status"))
                    .and_then(|s| s.as_str())
                {
                    let status = status.to_string();
                    self.apply_status(status);
                }
                tracing::info!(order_id = %self.order_id, "Order cancelled");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(order_id = %self.order_id, error = %e, "Cancel failed");
                Err(AppError::backend(CANCEL_FAILED_MESSAGE).with_detail("order_id", self.order_id.as_str()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[tokio::test]
    async fn test_unknown_status_is_step_zero() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(Table::Orders, [json!({ "id": "o1", "status": "refunded" })]);
        let mut tracker = OrderTracker::new(backend, "o1");
        assert_eq!(tracker.start().await.unwrap(), "refunded");
        assert_eq!(tracker.step(), 0);
        assert!(!tracker.can_cancel());
        assert!(!tracker.is_finished());
        assert_eq!(tracker.headline(), "Order Confirmed!");
    }

    #[tokio::test]
    async fn test_cancelled_order_is_finished() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(Table::Orders, [json!({ "id": "o1", "status": "cancelled" })]);
        let mut tracker = OrderTracker::new(backend, "o1");
        tracker.start().await.unwrap();
        assert!(tracker.is_finished());
        assert!(tracker.is_live());
    }

    #[tokio::test]
    async fn test_missing_order() {
        let mut tracker = OrderTracker::new(Arc::new(MemoryBackend::new()), "nope");
        let err = tracker.start().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn test_cancel_refused_after_pickup() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(Table::Orders, [json!({ "id": "o1", "status": "confirmed" })]);
        let mut tracker = OrderTracker::new(backend.clone(), "o1");
        tracker.start().await.unwrap();

        let err = tracker.cancel().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotCancellable);
        assert_eq!(backend.write_count(), 0);
    }
}
