//! Unified error handling.
//!
//! Provides an aggregate `AppError` for callers that drive the whole engine
//! (the CLI does); module-level errors (`ApiError`, `ConnectionError`,
//! `ConfigError`) remain the precise types at each seam.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::realtime::ConnectionError;

/// Application-level error type for the storefront engine.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Hub channel operation failed.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
