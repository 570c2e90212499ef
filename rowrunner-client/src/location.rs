//! Device location
//!
//! Location is best effort: permission may be refused and the fix may
//! never arrive. Callers race the provider against a timeout and carry on
//! without a coordinate when it loses.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use shared::geo::Coordinate;
use std::time::Duration;

/// Source of the device's current position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Current coordinate; `Ok(None)` when permission was refused
    async fn current(&self) -> ClientResult<Option<Coordinate>>;
}

/// Provider with a fixed answer
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation {
    coordinate: Option<Coordinate>,
    delay: Option<Duration>,
}

impl FixedLocation {
    pub fn at(lat: f64, lon: f64) -> Self {
        Self {
            coordinate: Some(Coordinate::new(lat, lon)),
            delay: None,
        }
    }

    /// Permission refused
    pub fn denied() -> Self {
        Self::default()
    }

    /// Answer only after `delay`
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current(&self) -> ClientResult<Option<Coordinate>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.coordinate)
    }
}

/// Provider result bounded by `timeout`
pub async fn locate_with_timeout(
    provider: &dyn LocationProvider,
    timeout: Duration,
) -> ClientResult<Option<Coordinate>> {
    match tokio::time::timeout(timeout, provider.current()).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Location(format!(
            "no fix within {} ms",
            timeout.as_millis()
        ))),
    }
}

/// Like [`locate_with_timeout`], folding every failure into `None`
pub async fn try_locate(provider: &dyn LocationProvider, timeout: Duration) -> Option<Coordinate> {
    match locate_with_timeout(provider, timeout).await {
        Ok(coordinate) => coordinate,
        Err(e) => {
            tracing::debug!(error = %e, "Location unavailable");
            None
        }
    }
}
