//! Unified error system for RowRunner
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ErrorPresentation`]: How an error reaches the user
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Catalog errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ErrorPresentation};
//!
//! let err = AppError::validation("Please fix the highlighted fields")
//!     .with_detail("email", "Enter a valid email");
//! assert_eq!(err.presentation(), ErrorPresentation::Inline);
//!
//! let err = AppError::new(ErrorCode::OrderAlreadyClaimed);
//! assert_eq!(err.presentation(), ErrorPresentation::Notice);
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult, ErrorPresentation, GENERIC_FAILURE_MESSAGE};
