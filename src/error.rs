//! Unified error handling for the pulse crate
//!
//! A single `Error` enum covers every failure the library can surface.
//! The insight pipeline itself recovers from provider and parse failures
//! internally; only configuration and upstream store errors reach callers.

use std::io;
use thiserror::Error;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout)
    Network,
    /// Text-completion provider errors (bad status, broken envelope)
    Provider,
    /// Parsing and serialization errors
    Parsing,
    /// Storage and I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the pulse crate
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (e.g. unset provider credential).
    /// Raised before any network call is attempted.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider call completed but did not yield usable text: non-success
    /// HTTP status or a response envelope missing the expected field.
    #[error("Provider error: {0}")]
    Provider(String),

    /// HTTP transport errors (connection, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// External data store errors (propagated to the caller)
    #[error("Store error: {0}")]
    Store(String),

    /// A requested stored artifact does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Provider(_) | Self::Http(_) | Self::Io(_) => true,
            Self::Configuration(_) | Self::Json(_) | Self::Store(_) | Self::NotFound(_) => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) => ErrorCategory::Network,
            Self::Provider(_) => ErrorCategory::Provider,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Io(_) | Self::Store(_) | Self::NotFound(_) => ErrorCategory::Storage,
            Self::Configuration(_) => ErrorCategory::Config,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
