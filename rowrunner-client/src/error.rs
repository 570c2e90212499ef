//! Client error types

use shared::error::{AppError, ErrorCode, GENERIC_FAILURE_MESSAGE};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the request
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Authentication required or credentials rejected
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Operation did not finish in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Realtime channel failure
    #[error("Realtime error: {0}")]
    Realtime(String),

    /// WebSocket transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Device location unavailable
    #[error("Location unavailable: {0}")]
    Location(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Local storage failure
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// The backend's own message, when it sent one
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend { message, .. }
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Validation(message) => Some(message.as_str()).filter(|m| !m.trim().is_empty()),
            _ => None,
        }
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        let message = err
            .backend_message()
            .unwrap_or(GENERIC_FAILURE_MESSAGE)
            .to_string();
        match err {
            ClientError::Http(e) if e.is_timeout() => AppError::timeout("Request"),
            ClientError::Http(e) => AppError::network(e.to_string()),
            ClientError::Backend { .. } => AppError::backend(message),
            ClientError::Unauthorized(_) => {
                AppError::with_message(ErrorCode::NotAuthenticated, message)
            }
            ClientError::Forbidden(_) => AppError::permission_denied(message),
            ClientError::NotFound(_) => AppError::with_message(ErrorCode::NotFound, message),
            ClientError::Validation(_) => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
            }
            ClientError::Timeout(what) => AppError::timeout(what),
            ClientError::Realtime(msg) => AppError::with_message(ErrorCode::RealtimeError, msg),
            ClientError::WebSocket(e) => {
                AppError::with_message(ErrorCode::RealtimeError, e.to_string())
            }
            ClientError::Location(msg) => {
                AppError::with_message(ErrorCode::LocationUnavailable, msg)
            }
            ClientError::Config(msg) => AppError::with_message(ErrorCode::ConfigError, msg),
            ClientError::Url(e) => AppError::with_message(ErrorCode::ConfigError, e.to_string()),
            ClientError::Io(e) => AppError::storage(e.to_string()),
            ClientError::Serialization(e) => AppError::internal(e.to_string()),
            ClientError::InvalidResponse(msg) => AppError::internal(msg),
        }
    }
}
