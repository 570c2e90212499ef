//! Offline action queue
//!
//! Runs an action right away while online, keeps it otherwise. A flush
//! takes every queued action and runs them one after another; failures
//! are logged and dropped.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use shared::error::AppResult;
use std::sync::atomic::{AtomicBool, Ordering};

type Execute = Box<dyn FnOnce() -> BoxFuture<'static, AppResult<()>> + Send>;

/// Deferred unit of work
pub struct QueuedAction {
    pub id: String,
    execute: Execute,
}

impl QueuedAction {
    pub fn new<F>(id: impl Into<String>, execute: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, AppResult<()>> + Send + 'static,
    {
        Self {
            id: id.into(),
            execute: Box::new(execute),
        }
    }

    async fn run(self) {
        let id = self.id;
        if let Err(e) = (self.execute)().await {
            tracing::error!(action = %id, error = %e, "Queued action failed");
        }
    }
}

impl std::fmt::Debug for QueuedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedAction").field("id", &self.id).finish()
    }
}

#[derive(Debug)]
pub struct OfflineQueue {
    online: AtomicBool,
    queue: Mutex<Vec<QueuedAction>>,
}

impl Default for OfflineQueue {
    fn default() -> Self {
        Self::new(true)
    }
}

impl OfflineQueue {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            queue: Mutex::new(Vec::new()),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Run now when online, otherwise queue. Returns whether it ran.
    pub async fn enqueue(&self, action: QueuedAction) -> bool {
        if self.is_online() {
            action.run().await;
            true
        } else {
            tracing::debug!(action = %action.id, "Offline, action queued");
            self.queue.lock().push(action);
            false
        }
    }

    /// Run every queued action in order; returns how many ran. Does nothing
    /// while offline.
    pub async fn flush(&self) -> usize {
        if !self.is_online() {
            return 0;
        }
        let pending = std::mem::take(&mut *self.queue.lock());
        let count = pending.len();
        for action in pending {
            action.run().await;
        }
        if count > 0 {
            tracing::info!(count, "Offline queue flushed");
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use shared::error::AppError;
    use std::sync::Arc;

    fn record(log: &Arc<Mutex<Vec<String>>>, id: &str, fail: bool) -> QueuedAction {
        let log = log.clone();
        let name = id.to_string();
        QueuedAction::new(id, move || {
            async move {
                log.lock().push(name);
                if fail {
                    Err(AppError::internal("boom"))
                } else {
                    Ok(())
                }
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_online_runs_immediately() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let queue = OfflineQueue::new(true);
        assert!(queue.enqueue(record(&log, "a", false)).await);
        assert_eq!(*log.lock(), ["a"]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_flush_runs_in_order_past_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let queue = OfflineQueue::new(false);
        for (id, fail) in [("a", false), ("b", true), ("c", false)] {
            assert!(!queue.enqueue(record(&log, id, fail)).await);
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.flush().await, 0);

        queue.set_online(true);
        assert_eq!(queue.flush().await, 3);
        assert_eq!(*log.lock(), ["a", "b", "c"]);
        assert!(queue.is_empty());
    }
}
