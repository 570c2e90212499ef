//! Session state
//!
//! The signed-in identity (tokens + resolved role) lives in memory and is
//! mirrored to the [`SecureStore`] so it survives restarts. Guest mode is
//! an in-memory flag only.

mod storage;

pub use storage::{FileSecureStore, MemorySecureStore, SecureStore};

use crate::backend::AuthSession;
use crate::error::ClientResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared::models::Role;
use std::sync::Arc;

/// Store key of the persisted session
pub const SESSION_KEY: &str = "rowrunner.session";

/// Persisted form of a signed-in session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSession {
    pub auth: AuthSession,
    #[serde(default)]
    pub role: Role,
}

/// Current identity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub auth: Option<AuthSession>,
    pub role: Role,
    pub is_guest: bool,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.user.id.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.auth.as_ref().and_then(|a| a.user.email.as_deref())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.access_token.as_str())
    }
}

/// Holds the session and keeps the secure store in step with it
pub struct SessionManager {
    store: Arc<dyn SecureStore>,
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self {
            store,
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn role(&self) -> Role {
        self.state.read().role
    }

    pub fn user_id(&self) -> Option<String> {
        self.state.read().user_id().map(str::to_string)
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.read().access_token().map(str::to_string)
    }

    /// Record a signed-in session and persist it
    pub async fn establish(&self, auth: AuthSession, role: Role) -> ClientResult<()> {
        let stored = StoredSession {
            auth: auth.clone(),
            role,
        };
        self.store
            .set_item(SESSION_KEY, &serde_json::to_string(&stored)?)
            .await?;
        *self.state.write() = SessionState {
            auth: Some(auth),
            role,
            is_guest: false,
        };
        Ok(())
    }

    /// Browse without an account
    pub fn set_guest(&self) {
        *self.state.write() = SessionState {
            auth: None,
            role: Role::Customer,
            is_guest: true,
        };
    }

    /// Forget the session in memory and on disk
    pub async fn clear(&self) -> ClientResult<()> {
        *self.state.write() = SessionState::default();
        self.store.remove_item(SESSION_KEY).await
    }

    /// Read the persisted session; an unreadable entry is discarded
    pub async fn load(&self) -> ClientResult<Option<StoredSession>> {
        let Some(raw) = self.store.get_item(SESSION_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) => Ok(Some(stored)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable stored session");
                self.store.remove_item(SESSION_KEY).await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AuthUser;

    fn auth() -> AuthSession {
        AuthSession {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: chrono::Utc::now().timestamp() + 60,
            user: AuthUser {
                id: "u1".into(),
                email: Some("fan@example.com".into()),
                user_metadata: serde_json::Value::Null,
            },
        }
    }

    #[tokio::test]
    async fn test_establish_persists_and_clear_removes() {
        let store = Arc::new(MemorySecureStore::new());
        let session = SessionManager::new(store.clone());

        session.establish(auth(), Role::Runner).await.unwrap();
        assert_eq!(session.role(), Role::Runner);
        assert_eq!(session.user_id().as_deref(), Some("u1"));

        let stored = session.load().await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Runner);
        assert_eq!(stored.auth.access_token, "a");

        session.clear().await.unwrap();
        assert!(!session.snapshot().is_authenticated());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_discarded() {
        let store = Arc::new(MemorySecureStore::new());
        store.set_item(SESSION_KEY, "not json").await.unwrap();
        let session = SessionManager::new(store.clone());

        assert!(session.load().await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_guest_flag() {
        let session = SessionManager::new(Arc::new(MemorySecureStore::new()));
        session.set_guest();
        let state = session.snapshot();
        assert!(state.is_guest);
        assert!(!state.is_authenticated());
    }
}
