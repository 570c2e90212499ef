//! Backend abstraction
//!
//! The managed backend owns persistence, auth, the change feed and email.
//! [`Backend`] and [`AuthBackend`] are the seams the domain flows talk to;
//! [`RestBackend`] speaks the hosted HTTP/websocket API and
//! [`MemoryBackend`] is an in-process implementation with the same
//! conditional-update contract.

mod memory;
mod query;
pub mod realtime;
mod rest;

pub use memory::{MemoryBackend, Operation};
pub use query::{ChangeEvent, ChangeFilter, ChangeKind, Filter, Query, SortKey, Table};
pub use rest::RestBackend;

use crate::error::ClientResult;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::DropGuard;

/// Row storage, conditional updates, change feed and callable functions
#[async_trait]
pub trait Backend: Send + Sync {
    /// Rows matching the query
    async fn select(&self, query: Query) -> ClientResult<Vec<Value>>;

    /// Insert rows, returning them as stored (ids and defaults filled in)
    async fn insert(&self, table: Table, rows: Vec<Value>) -> ClientResult<Vec<Value>>;

    /// Apply `patch` to every row matching the query's filters, atomically
    /// per row, returning the rows that were changed. Zero rows is not an
    /// error.
    async fn update(&self, query: Query, patch: Value) -> ClientResult<Vec<Value>>;

    /// Insert or merge on the `on_conflict` column
    async fn upsert(&self, table: Table, row: Value, on_conflict: &str) -> ClientResult<()>;

    /// Invoke a callable function
    async fn invoke(&self, function: &str, body: Value) -> ClientResult<Value>;

    /// Subscribe to row changes
    async fn subscribe(&self, filter: ChangeFilter) -> ClientResult<ChangeStream>;

    /// Bearer token used for subsequent requests; `None` reverts to the
    /// public key
    fn set_access_token(&self, _token: Option<String>) {}
}

// ========== Auth ==========

/// Authenticated user as reported by the auth service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl AuthUser {
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata.get("full_name").and_then(Value::as_str)
    }
}

/// Access/refresh token pair for one signed-in user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as unix seconds
    #[serde(default)]
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.expires_at
    }
}

/// Password auth, refresh and admin user provisioning
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<AuthSession>;

    /// Create an account; `None` when the service requires confirmation
    /// before issuing a session
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ClientResult<Option<AuthSession>>;

    async fn refresh_session(&self, refresh_token: &str) -> ClientResult<AuthSession>;

    async fn sign_out(&self, access_token: &str) -> ClientResult<()>;

    /// Create a confirmed account (privileged)
    async fn admin_create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ClientResult<AuthUser>;
}

// ========== Change stream ==========

/// Row change notifications for one subscription
///
/// Dropping the stream ends the subscription.
pub struct ChangeStream {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
    _guard: Option<DropGuard>,
}

impl ChangeStream {
    pub fn new(rx: mpsc::UnboundedReceiver<ChangeEvent>, guard: Option<DropGuard>) -> Self {
        Self { rx, _guard: guard }
    }

    /// Next change; `None` once the channel has closed
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Next change if one is already queued
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for ChangeStream {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl std::fmt::Debug for ChangeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeStream").finish_non_exhaustive()
    }
}

// ========== Row helpers ==========

/// Deserialize rows into `T`
pub fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> ClientResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

/// First row as `T`, if any
pub fn decode_first<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> ClientResult<Option<T>> {
    rows.into_iter()
        .next()
        .map(serde_json::from_value)
        .transpose()
        .map_err(Into::into)
}
