//! Order lifecycle
//!
//! - [`status`]: status state machine and its display projection
//! - [`cart`]: client-side order draft

pub mod cart;
pub mod status;

// Re-exports
pub use cart::{CartDraft, CartItem};
pub use status::{
    ORDER_STEPS, OrderStatus, OrderStep, RunnerAction, UnknownStatus, headline, progress_step,
};
