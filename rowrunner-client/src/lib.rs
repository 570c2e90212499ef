//! RowRunner Client - typed client core for the RowRunner delivery backend
//!
//! Customers order food to their seat, runners claim and deliver orders,
//! admins provision runner accounts. Persistence, auth, the change feed and
//! email belong to the hosted backend; this crate holds the client state
//! and the flows that drive it.

pub mod admin;
pub mod auth;
pub mod backend;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod discovery;
pub mod error;
pub mod location;
pub mod logger;
pub mod notify;
pub mod offline;
pub mod runner;
pub mod session;
pub mod tracker;

pub use admin::AdminService;
pub use auth::AuthService;
pub use backend::{AuthBackend, Backend, MemoryBackend, RestBackend};
pub use catalog::Catalog;
pub use checkout::{Checkout, PlacedOrder};
pub use config::ClientConfig;
pub use discovery::Discovery;
pub use error::{ClientError, ClientResult};
pub use location::{FixedLocation, LocationProvider};
pub use notify::OrderNotifier;
pub use offline::OfflineQueue;
pub use runner::{ClaimOutcome, RunnerBoard};
pub use session::{FileSecureStore, MemorySecureStore, SecureStore, SessionManager};
pub use tracker::OrderTracker;

// Re-export shared types for convenience
pub use shared::{AppError, AppResult, CartDraft, ErrorCode, OrderStatus};

use std::sync::Arc;

/// Wiring of one client instance: configuration, backend handles and the
/// session. Services are cheap views over these handles.
#[derive(Clone)]
pub struct RowRunner {
    config: Arc<ClientConfig>,
    backend: Arc<dyn Backend>,
    auth: Arc<dyn AuthBackend>,
    session: Arc<SessionManager>,
    notifier: OrderNotifier,
}

impl RowRunner {
    /// Hosted backend with a file-backed secure store
    pub fn connect(config: ClientConfig) -> ClientResult<Self> {
        let rest = Arc::new(RestBackend::new(&config)?);
        let store = Arc::new(FileSecureStore::new(config.session_dir.clone()));
        tracing::info!(backend = %config.backend_url, "RowRunner client configured");
        Ok(Self::new(config, rest.clone(), rest, store))
    }

    /// Assemble from explicit parts
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn Backend>,
        auth: Arc<dyn AuthBackend>,
        store: Arc<dyn SecureStore>,
    ) -> Self {
        let notifier = OrderNotifier::new(backend.clone());
        Self {
            config: Arc::new(config),
            backend,
            auth,
            session: Arc::new(SessionManager::new(store)),
            notifier,
        }
    }

    /// In-memory backend and store, for tests and demos
    pub fn in_memory(backend: Arc<MemoryBackend>) -> Self {
        Self::new(
            ClientConfig::default(),
            backend.clone(),
            backend,
            Arc::new(MemorySecureStore::new()),
        )
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn notifier(&self) -> &OrderNotifier {
        &self.notifier
    }

    // ========== Services ==========

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.backend.clone(), self.auth.clone(), self.session.clone())
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.backend.clone())
    }

    pub fn checkout(&self) -> Checkout {
        Checkout::new(
            self.backend.clone(),
            self.session.clone(),
            self.notifier.clone(),
        )
    }

    pub fn tracker(&self, order_id: impl Into<String>) -> OrderTracker {
        OrderTracker::new(self.backend.clone(), order_id)
    }

    /// Board for the signed-in runner at `venue_id`
    pub fn runner_board(&self, venue_id: impl Into<String>) -> AppResult<RunnerBoard> {
        let runner_id = self
            .session
            .user_id()
            .ok_or_else(AppError::not_authenticated)?;
        Ok(RunnerBoard::new(
            self.backend.clone(),
            self.notifier.clone(),
            runner_id,
            venue_id,
        ))
    }

    pub fn discovery(&self, location: Arc<dyn LocationProvider>) -> Discovery {
        Discovery::new(
            self.backend.clone(),
            location,
            self.config.query_timeout(),
            self.config.location_timeout(),
        )
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new(self.backend.clone(), self.auth.clone())
    }
}
