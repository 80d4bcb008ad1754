//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the citation resolver service, providing
//! structured error types and conversion utilities for all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from configuration loading, strategy
//!   validation, resolution internals, and the API layer
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Configuration, Strategy, Resolution, Network, API
//!
//! ## Key Features
//! - Structured error variants with detailed context
//! - Automatic conversion from common library errors
//! - Category accessor for logging and metrics
//! - User-friendly messages for API responses
//!
//! Note that resolution itself never surfaces these errors to its caller:
//! any failure inside `resolve` is contained and degraded to an
//! `error_fallback` result. The variants here cover everything around the
//! core (loading, validation, serving) plus the internal failures the
//! resolver catches.

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, ResolverError>;

/// Error types for the citation resolver service
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Configuration errors (app config file, settings)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors with field context
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// Strategy configuration rejected by upfront validation
    #[error("Invalid strategy configuration: {details}")]
    InvalidStrategyConfig { details: String },

    /// A path pattern could not be compiled into a matcher
    #[error("Invalid path pattern '{pattern}': {details}")]
    InvalidPattern { pattern: String, details: String },

    /// Strategy configuration could not be loaded from its source
    #[error("Failed to load strategy configuration from {source_name}: {details}")]
    ConfigSource { source_name: String, details: String },

    /// Network-related errors
    #[error("Network error: {details}")]
    Network { details: String },

    /// Serialization/deserialization errors
    #[error("Serialization failed: {message}")]
    SerializationFailed { message: String },

    /// Invalid API request payloads
    #[error("Invalid API request: {details}")]
    InvalidApiRequest { details: String },

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ResolverError {
    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            ResolverError::Config { .. } | ResolverError::ValidationFailed { .. } => {
                "configuration"
            }
            ResolverError::InvalidStrategyConfig { .. }
            | ResolverError::ConfigSource { .. } => "strategy_config",
            ResolverError::InvalidPattern { .. } => "resolution",
            ResolverError::Network { .. } => "network",
            ResolverError::SerializationFailed { .. } => "serialization",
            ResolverError::InvalidApiRequest { .. } => "api",
            ResolverError::Internal { .. } => "internal",
        }
    }

    /// Whether retrying the same operation can plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ResolverError::Network { .. } | ResolverError::ConfigSource { .. }
        )
    }
}

// Conversion from common error types
impl From<std::io::Error> for ResolverError {
    fn from(err: std::io::Error) -> Self {
        ResolverError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(err: serde_json::Error) -> Self {
        ResolverError::SerializationFailed {
            message: format!("JSON serialization error: {}", err),
        }
    }
}

impl From<toml::de::Error> for ResolverError {
    fn from(err: toml::de::Error) -> Self {
        ResolverError::Config {
            message: format!("TOML parse error: {}", err),
        }
    }
}

impl From<reqwest::Error> for ResolverError {
    fn from(err: reqwest::Error) -> Self {
        ResolverError::Network {
            details: err.to_string(),
        }
    }
}
