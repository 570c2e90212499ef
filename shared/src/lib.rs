//! Shared types for RowRunner
//!
//! Domain types used by every RowRunner consumer: data models, the unified
//! error system, the order status state machine, input sanitization,
//! pricing and distance math. This crate performs no I/O.

pub mod error;
pub mod geo;
pub mod models;
pub mod money;
pub mod order;
pub mod util;
pub mod validation;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use geo::Coordinate;
pub use order::{CartDraft, OrderStatus};
pub use serde::{Deserialize, Serialize};
