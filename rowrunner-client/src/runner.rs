//! Runner board: available orders, claiming, my runs and history
//!
//! Claiming is a single conditional update (`runner_id IS NULL`), so when
//! runners race for one order the backend lets exactly one through. The
//! losers see zero affected rows, get a notice and drop the order from their
//! list. There is no retry or client-side locking.

use crate::backend::{Backend, ChangeFilter, ChangeStream, Query, Table, decode_first, decode_rows};
use crate::notify::OrderNotifier;
use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Order, RunnerOrder};
use shared::money::runner_earnings;
use shared::order::OrderStatus;
use std::sync::Arc;

pub use shared::util::time_since;

const AVAILABLE_COLUMNS: &str = "id, status, section, row, seat, total, created_at, restaurants(name)";
const EMAIL_COLUMNS: &str = "id, status, customer_email, customer_name, section, row, seat, total";
const RUN_COLUMNS: &str = "id, status, section, row, seat, total, created_at";

/// Result of a claim attempt that reached the backend
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// This runner now holds the order
    Claimed(Order),
    /// Another runner got there first
    LostRace,
}

impl ClaimOutcome {
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed(_))
    }

    /// Notice to show for a lost race
    pub fn notice(&self, order_id: &str) -> Option<AppError> {
        match self {
            Self::Claimed(_) => None,
            Self::LostRace => Some(AppError::already_claimed(order_id)),
        }
    }
}

/// Delivered orders and the runner's cut
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredSummary {
    pub orders: Vec<Order>,
    pub total_earned: f64,
}

pub struct RunnerBoard {
    backend: Arc<dyn Backend>,
    notifier: OrderNotifier,
    runner_id: String,
    venue_id: String,
    venue_name: Option<String>,
    available: Vec<RunnerOrder>,
    stream: Option<ChangeStream>,
}

impl RunnerBoard {
    pub fn new(
        backend: Arc<dyn Backend>,
        notifier: OrderNotifier,
        runner_id: impl Into<String>,
        venue_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            notifier,
            runner_id: runner_id.into(),
            venue_id: venue_id.into(),
            venue_name: None,
            available: Vec::new(),
            stream: None,
        }
    }

    /// Venue name used in customer emails
    pub fn with_venue_name(mut self, name: impl Into<String>) -> Self {
        self.venue_name = Some(name.into());
        self
    }

    pub fn runner_id(&self) -> &str {
        &self.runner_id
    }

    pub fn venue_id(&self) -> &str {
        &self.venue_id
    }

    /// Record the runner's venue for this shift (best effort)
    pub async fn start_shift(&self) -> bool {
        let row = json!({ "runner_id": self.runner_id, "venue_id": self.venue_id });
        match self
            .backend
            .upsert(Table::RunnerSessions, row, "runner_id")
            .await
        {
            Ok(()) => {
                tracing::info!(runner_id = %self.runner_id, venue_id = %self.venue_id, "Shift started");
                true
            }
            Err(e) => {
                tracing::warn!(runner_id = %self.runner_id, error = %e, "Runner session upsert failed");
                false
            }
        }
    }

    // ========== Available orders ==========

    /// Unclaimed pending/confirmed orders at the venue, oldest first
    pub async fn refresh_available(&mut self) -> AppResult<&[RunnerOrder]> {
        let rows = self
            .backend
            .select(
                Query::table(Table::Orders)
                    .select(AVAILABLE_COLUMNS)
                    .eq("venue_id", self.venue_id.as_str())
                    .in_list("status", [OrderStatus::Pending.as_str(), OrderStatus::Confirmed.as_str()])
                    .is_null("runner_id")
                    .order_asc("created_at"),
            )
            .await?;
        self.available = decode_rows(rows)?;
        Ok(&self.available)
    }

    pub fn available(&self) -> &[RunnerOrder] {
        &self.available
    }

    /// Follow every order change at the venue
    pub async fn subscribe(&mut self) -> AppResult<()> {
        let filter = ChangeFilter::table(Table::Orders).eq("venue_id", self.venue_id.as_str());
        self.stream = Some(self.backend.subscribe(filter).await?);
        Ok(())
    }

    pub fn is_live(&self) -> bool {
        self.stream.is_some()
    }

    /// Wait for a change at the venue, then refetch. `Ok(false)` once the
    /// feed has ended or was never opened.
    pub async fn wait_for_change(&mut self) -> AppResult<bool> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(false);
        };
        if stream.next().await.is_none() {
            self.stream = None;
            return Ok(false);
        }
        while stream.try_next().is_some() {}
        self.refresh_available().await?;
        Ok(true)
    }

    /// Refetch if any change arrived since the last look
    pub async fn sync(&mut self) -> AppResult<bool> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(false);
        };
        let mut changed = false;
        while stream.try_next().is_some() {
            changed = true;
        }
        if changed {
            self.refresh_available().await?;
        }
        Ok(changed)
    }

    /// Try to take an order.
    ///
    /// Either way the order leaves the local list. A transport or backend
    /// error is returned as is and leaves the list untouched.
    pub async fn claim(&mut self, order_id: &str) -> AppResult<ClaimOutcome> {
        let rows = self
            .backend
            .update(
                Query::table(Table::Orders)
                    .select(EMAIL_COLUMNS)
                    .eq("id", order_id)
                    .is_null("runner_id"),
                json!({ "runner_id": self.runner_id, "status": OrderStatus::Claimed.as_str() }),
            )
            .await?;

        self.available.retain(|o| o.id() != order_id);
        let Some(order) = decode_first::<Order>(rows)? else {
            tracing::warn!(%order_id, runner_id = %self.runner_id, "Claim lost to another runner");
            return Ok(ClaimOutcome::LostRace);
        };

        tracing::info!(%order_id, runner_id = %self.runner_id, "Order claimed");
        self.notifier
            .order_status(&order, OrderStatus::Claimed.as_str(), self.venue_name.as_deref())
            .await;
        Ok(ClaimOutcome::Claimed(order))
    }

    // ========== My runs ==========

    /// Orders this runner holds that are not yet delivered, oldest first
    pub async fn my_runs(&self) -> AppResult<Vec<Order>> {
        let rows = self
            .backend
            .select(
                Query::table(Table::Orders)
                    .select(RUN_COLUMNS)
                    .eq("runner_id", self.runner_id.as_str())
                    .in_list("status", [OrderStatus::Claimed.as_str(), OrderStatus::Confirmed.as_str()])
                    .order_asc("created_at"),
            )
            .await?;
        Ok(decode_rows(rows)?)
    }

    /// Move a held order one step forward and email the customer.
    ///
    /// Conditional on the order still being in `current` and held by this
    /// runner; otherwise it was changed elsewhere and nothing is written.
    pub async fn advance(&self, order_id: &str, current: OrderStatus) -> AppResult<Order> {
        let action = current.runner_action().ok_or_else(|| {
            AppError::new(ErrorCode::InvalidStatusTransition)
                .with_detail("status", current.as_str())
        })?;

        let rows = self
            .backend
            .update(
                Query::table(Table::Orders)
                    .select(EMAIL_COLUMNS)
                    .eq("id", order_id)
                    .eq("status", current.as_str())
                    .eq("runner_id", self.runner_id.as_str()),
                json!({ "status": action.next.as_str() }),
            )
            .await?;

        let order: Order = decode_first(rows)?.ok_or_else(|| {
            tracing::warn!(%order_id, expected = %current, "Order changed before status update");
            AppError::new(ErrorCode::OrderStateChanged).with_detail("order_id", order_id)
        })?;

        tracing::info!(%order_id, from = %current, to = %action.next, "Order status advanced");
        self.notifier
            .order_status(&order, action.next.as_str(), self.venue_name.as_deref())
            .await;
        Ok(order)
    }

    // ========== History ==========

    /// Delivered orders, newest first, with 15% of each total as earnings
    pub async fn delivered(&self) -> AppResult<DeliveredSummary> {
        let rows = self
            .backend
            .select(
                Query::table(Table::Orders)
                    .select(RUN_COLUMNS)
                    .eq("runner_id", self.runner_id.as_str())
                    .eq("status", OrderStatus::Delivered.as_str())
                    .order_desc("created_at"),
            )
            .await?;
        let orders: Vec<Order> = decode_rows(rows)?;
        let total_earned = runner_earnings(orders.iter().map(|o| o.total).sum());
        Ok(DeliveredSummary {
            orders,
            total_earned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, Operation};

    fn board(backend: &Arc<MemoryBackend>, runner: &str) -> RunnerBoard {
        RunnerBoard::new(
            backend.clone(),
            OrderNotifier::new(backend.clone()),
            runner,
            "v1",
        )
    }

    #[tokio::test]
    async fn test_advance_requires_runner_action() {
        let backend = Arc::new(MemoryBackend::new());
        let err = board(&backend, "r1")
            .advance("o1", OrderStatus::Pending)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn test_claim_error_keeps_candidate() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            Table::Orders,
            [json!({ "id": "o1", "venue_id": "v1", "status": "pending", "runner_id": null, "created_at": "2026-05-01T19:00:00Z" })],
        );
        let mut board = board(&backend, "r1");
        board.refresh_available().await.unwrap();

        backend.fail(Operation::Update, Some(Table::Orders));
        assert!(board.claim("o1").await.is_err());
        assert_eq!(board.available().len(), 1);
    }

    #[tokio::test]
    async fn test_start_shift_is_best_effort() {
        let backend = Arc::new(MemoryBackend::new());
        let board = board(&backend, "r1");
        assert!(board.start_shift().await);
        backend.fail(Operation::Upsert, None);
        assert!(!board.start_shift().await);
        assert_eq!(backend.rows(Table::RunnerSessions).len(), 1);
    }

    #[test]
    fn test_lost_race_notice() {
        let notice = ClaimOutcome::LostRace.notice("o1").unwrap();
        assert_eq!(notice.message, "Another runner grabbed this one first.");
        assert!(ClaimOutcome::Claimed(serde_json::from_value(json!({ "id": "o1" })).unwrap())
            .notice("o1")
            .is_none());
    }
}
