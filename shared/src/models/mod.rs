//! Data models
//!
//! Row types for the backend tables. IDs are backend-issued UUID strings.

pub mod event;
pub mod order;
pub mod role;
pub mod runner;
pub mod venue;

// Re-exports
pub use event::*;
pub use order::*;
pub use role::*;
pub use runner::*;
pub use venue::*;
