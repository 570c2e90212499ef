//! In-memory backend
//!
//! Holds every table behind one lock so a filtered update is evaluated and
//! applied in a single critical section, the same guarantee the hosted
//! backend gives for `UPDATE ... WHERE`. Supports failure injection per
//! operation, artificial query latency and write counting.

use super::{
    AuthBackend, AuthSession, AuthUser, Backend, ChangeEvent, ChangeFilter, ChangeKind,
    ChangeStream, Query, Table,
};
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use shared::models::Role;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

/// Session lifetime issued by the in-memory auth service
const SESSION_TTL_SECS: i64 = 3600;

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Upsert,
    Invoke,
    Subscribe,
    SignIn,
    SignUp,
    Refresh,
    SignOut,
    CreateUser,
}

#[derive(Debug, Clone)]
struct MemUser {
    id: String,
    email: String,
    password: String,
    full_name: String,
}

impl MemUser {
    fn auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            user_metadata: json!({ "full_name": self.full_name }),
        }
    }
}

#[derive(Default)]
struct State {
    tables: HashMap<Table, Vec<Value>>,
    subscribers: Vec<(ChangeFilter, mpsc::UnboundedSender<ChangeEvent>)>,
    failures: Vec<(Operation, Option<Table>)>,
    invocations: Vec<(String, Value)>,
    users: HashMap<String, MemUser>,
    access_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    write_count: usize,
    select_delay: Option<Duration>,
    access_token: Option<String>,
}

impl State {
    fn check(&self, op: Operation, table: Option<Table>) -> ClientResult<()> {
        let hit = self
            .failures
            .iter()
            .any(|(o, t)| *o == op && (t.is_none() || *t == table));
        if hit {
            return Err(ClientError::Backend {
                status: 503,
                message: format!("injected {:?} failure", op),
            });
        }
        Ok(())
    }

    fn notify(&mut self, event: ChangeEvent) {
        self.subscribers
            .retain(|(filter, tx)| !filter.matches(&event) || tx.send(event.clone()).is_ok());
    }

    fn issue_session(&mut self, user: &MemUser) -> AuthSession {
        let access = format!("mem-access-{}", uuid::Uuid::new_v4());
        let refresh = format!("mem-refresh-{}", uuid::Uuid::new_v4());
        self.access_tokens.insert(access.clone(), user.id.clone());
        self.refresh_tokens.insert(refresh.clone(), user.id.clone());
        AuthSession {
            access_token: access,
            refresh_token: refresh,
            expires_at: chrono::Utc::now().timestamp() + SESSION_TTL_SECS,
            user: user.auth_user(),
        }
    }

    fn create_user(&mut self, email: &str, password: &str, full_name: &str) -> ClientResult<MemUser> {
        if self.users.contains_key(email) {
            return Err(ClientError::Validation("User already registered".into()));
        }
        let user = MemUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
        };
        self.users.insert(email.to_string(), user.clone());
        self.tables.entry(Table::Profiles).or_default().push(json!({
            "id": user.id,
            "email": user.email,
            "full_name": user.full_name,
        }));
        Ok(user)
    }

    /// Attach embedded relations named in the select list
    fn resolve_embeds(&self, query: &Query, mut row: Value) -> Value {
        for embed in query.embeds() {
            let Some((table, fk)) = embed_relation(embed) else {
                continue;
            };
            let key = row.get(fk).cloned().unwrap_or(Value::Null);
            let related = self
                .tables
                .get(&table)
                .and_then(|rows| rows.iter().find(|r| !key.is_null() && r.get("id") == Some(&key)))
                .cloned()
                .unwrap_or(Value::Null);
            if let Some(obj) = row.as_object_mut() {
                obj.insert(embed.to_string(), related);
            }
        }
        row
    }
}

/// Embedded table and the foreign-key column that points at it
fn embed_relation(name: &str) -> Option<(Table, &'static str)> {
    match name {
        "restaurants" => Some((Table::Restaurants, "restaurant_id")),
        "venues" => Some((Table::Venues, "venue_id")),
        "profiles" => Some((Table::Profiles, "user_id")),
        "orders" => Some((Table::Orders, "order_id")),
        _ => None,
    }
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (k, v) in patch {
            target.insert(k.clone(), v.clone());
        }
    }
}

/// In-process [`Backend`] and [`AuthBackend`]
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Fixtures ==========

    /// Append rows to a table without counting writes or notifying
    pub fn seed(&self, table: Table, rows: impl IntoIterator<Item = Value>) {
        self.state
            .lock()
            .tables
            .entry(table)
            .or_default()
            .extend(rows);
    }

    /// Snapshot of a table
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.state.lock().tables.get(&table).cloned().unwrap_or_default()
    }

    /// Row by id
    pub fn row(&self, table: Table, id: &str) -> Option<Value> {
        self.state
            .lock()
            .tables
            .get(&table)?
            .iter()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .cloned()
    }

    /// Register an account with the given roles; returns the user id
    pub fn add_user(&self, email: &str, password: &str, full_name: &str, roles: &[Role]) -> String {
        let mut state = self.state.lock();
        let id = match state.create_user(email, password, full_name) {
            Ok(user) => user.id,
            Err(_) => state.users[email].id.clone(),
        };
        let role_rows = roles
            .iter()
            .map(|r| json!({ "user_id": id, "role": r.as_str() }));
        state
            .tables
            .entry(Table::UserRoles)
            .or_default()
            .extend(role_rows);
        id
    }

    // ========== Failure injection ==========

    /// Make `op` fail (optionally only for one table) until cleared
    pub fn fail(&self, op: Operation, table: Option<Table>) {
        self.state.lock().failures.push((op, table));
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Delay every select by `delay`
    pub fn set_select_delay(&self, delay: Option<Duration>) {
        self.state.lock().select_delay = delay;
    }

    // ========== Inspection ==========

    /// Number of insert/update/upsert calls received
    pub fn write_count(&self) -> usize {
        self.state.lock().write_count
    }

    /// Function invocations, oldest first
    pub fn invocations(&self) -> Vec<(String, Value)> {
        self.state.lock().invocations.clone()
    }

    /// Bearer token most recently set by the client
    pub fn access_token(&self) -> Option<String> {
        self.state.lock().access_token.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        let mut state = self.state.lock();
        state.subscribers.retain(|(_, tx)| !tx.is_closed());
        state.subscribers.len()
    }

    /// Apply an update as if another client had written it
    pub fn external_update(&self, table: Table, id: &str, patch: Value) -> bool {
        let mut state = self.state.lock();
        let Some(row) = state
            .tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| r.get("id").and_then(Value::as_str) == Some(id)))
        else {
            return false;
        };
        let old = row.clone();
        merge(row, &patch);
        let record = row.clone();
        state.notify(ChangeEvent {
            kind: ChangeKind::Update,
            table: table.to_string(),
            record,
            old_record: old,
        });
        true
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, query: Query) -> ClientResult<Vec<Value>> {
        let delay = {
            let state = self.state.lock();
            state.check(Operation::Select, Some(query.table))?;
            state.select_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock();
        let mut rows: Vec<Value> = state
            .tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| query.compare_rows(a, b));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows
            .into_iter()
            .map(|row| state.resolve_embeds(&query, row))
            .collect())
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> ClientResult<Vec<Value>> {
        let mut state = self.state.lock();
        state.write_count += 1;
        state.check(Operation::Insert, Some(table))?;

        let now = chrono::Utc::now().to_rfc3339();
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut obj) = row else {
                return Err(ClientError::Validation("row must be a JSON object".into()));
            };
            obj.entry("id")
                .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
            obj.entry("created_at")
                .or_insert_with(|| Value::String(now.clone()));
            stored.push(Value::Object(obj));
        }

        state
            .tables
            .entry(table)
            .or_default()
            .extend(stored.iter().cloned());
        for record in &stored {
            state.notify(ChangeEvent {
                kind: ChangeKind::Insert,
                table: table.to_string(),
                record: record.clone(),
                old_record: Value::Object(Map::new()),
            });
        }
        Ok(stored)
    }

    async fn update(&self, query: Query, patch: Value) -> ClientResult<Vec<Value>> {
        let mut state = self.state.lock();
        state.write_count += 1;
        state.check(Operation::Update, Some(query.table))?;

        let mut changes = Vec::new();
        if let Some(rows) = state.tables.get_mut(&query.table) {
            for row in rows.iter_mut().filter(|r| query.matches(r)) {
                let old = row.clone();
                merge(row, &patch);
                changes.push((old, row.clone()));
            }
        }

        let mut updated = Vec::with_capacity(changes.len());
        for (old, record) in changes {
            updated.push(state.resolve_embeds(&query, record.clone()));
            state.notify(ChangeEvent {
                kind: ChangeKind::Update,
                table: query.table.to_string(),
                record,
                old_record: old,
            });
        }
        Ok(updated)
    }

    async fn upsert(&self, table: Table, row: Value, on_conflict: &str) -> ClientResult<()> {
        let mut state = self.state.lock();
        state.write_count += 1;
        state.check(Operation::Upsert, Some(table))?;

        let key = row.get(on_conflict).cloned().unwrap_or(Value::Null);
        let rows = state.tables.entry(table).or_default();
        match rows
            .iter_mut()
            .find(|r| !key.is_null() && r.get(on_conflict) == Some(&key))
        {
            Some(existing) => merge(existing, &row),
            None => rows.push(row),
        }
        Ok(())
    }

    async fn invoke(&self, function: &str, body: Value) -> ClientResult<Value> {
        let mut state = self.state.lock();
        state.check(Operation::Invoke, None)?;
        state.invocations.push((function.to_string(), body));
        Ok(json!({ "ok": true }))
    }

    async fn subscribe(&self, filter: ChangeFilter) -> ClientResult<ChangeStream> {
        let mut state = self.state.lock();
        state.check(Operation::Subscribe, Some(filter.table))?;
        let (tx, rx) = mpsc::unbounded_channel();
        state.subscribers.push((filter, tx));
        Ok(ChangeStream::new(rx, None))
    }

    fn set_access_token(&self, token: Option<String>) {
        self.state.lock().access_token = token;
    }
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let mut state = self.state.lock();
        state.check(Operation::SignIn, None)?;
        let user = state
            .users
            .get(email)
            .filter(|u| u.password == password)
            .cloned()
            .ok_or_else(|| ClientError::Validation("Invalid login credentials".into()))?;
        Ok(state.issue_session(&user))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ClientResult<Option<AuthSession>> {
        let mut state = self.state.lock();
        state.check(Operation::SignUp, None)?;
        let user = state.create_user(email, password, full_name)?;
        Ok(Some(state.issue_session(&user)))
    }

    async fn refresh_session(&self, refresh_token: &str) -> ClientResult<AuthSession> {
        let mut state = self.state.lock();
        state.check(Operation::Refresh, None)?;
        let user_id = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| ClientError::Unauthorized("Invalid Refresh Token".into()))?;
        let user = state
            .users
            .values()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| ClientError::Unauthorized("User not found".into()))?;
        Ok(state.issue_session(&user))
    }

    async fn sign_out(&self, access_token: &str) -> ClientResult<()> {
        let mut state = self.state.lock();
        state.check(Operation::SignOut, None)?;
        if let Some(user_id) = state.access_tokens.remove(access_token) {
            state.refresh_tokens.retain(|_, uid| *uid != user_id);
        }
        Ok(())
    }

    async fn admin_create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ClientResult<AuthUser> {
        let mut state = self.state.lock();
        state.check(Operation::CreateUser, None)?;
        Ok(state.create_user(email, password, full_name)?.auth_user())
    }
}
