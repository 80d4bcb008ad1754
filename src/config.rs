//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized application configuration for the citation resolver service,
//! supporting configuration files, environment variable overrides, and
//! validation with detailed error messages.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation, endpoint sanity checks
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (highest priority)
//! 2. Configuration files
//! 3. Default values (lowest priority)
//!
//! Note that this is the *application* configuration (server, logging,
//! resolver settings). The per-session *strategy* configuration the
//! resolver consumes is a separate document, loaded from the source named
//! by `resolver.strategy_source` (see the `strategy` module).

use crate::errors::{ResolverError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure containing all service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Resolution behavior
    pub resolver: ResolverSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable CORS (the chat frontend is served from a different origin)
    pub enable_cors: bool,
}

/// Resolution behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Generic content endpoint documents are served from; used by the
    /// legacy path and by `default`-type strategies without a base URL
    pub content_endpoint: String,
    /// Legacy base URL used when no strategy configuration applies
    pub legacy_base_url: Option<String>,
    /// Where to load the strategy configuration from: an HTTP(S) URL or a
    /// local JSON file path. When unset the service starts without one and
    /// every citation resolves through the legacy path.
    pub strategy_source: Option<String>,
    /// Reject strategy configurations that fail upfront validation
    pub validate_on_load: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ResolverError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| ResolverError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("CITATION_RESOLVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("CITATION_RESOLVER_PORT") {
            self.server.port = port.parse().map_err(|_| ResolverError::Config {
                message: "Invalid port number in CITATION_RESOLVER_PORT".to_string(),
            })?;
        }
        if let Ok(source) = std::env::var("CITATION_RESOLVER_STRATEGY_SOURCE") {
            self.resolver.strategy_source = Some(source);
        }
        if let Ok(endpoint) = std::env::var("CITATION_RESOLVER_CONTENT_ENDPOINT") {
            self.resolver.content_endpoint = endpoint;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ResolverError::ValidationFailed {
                field: "server.port".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }

        if self.resolver.content_endpoint.trim().is_empty() {
            return Err(ResolverError::ValidationFailed {
                field: "resolver.content_endpoint".to_string(),
                reason: "Content endpoint cannot be empty".to_string(),
            });
        }

        const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ResolverError::ValidationFailed {
                field: "logging.level".to_string(),
                reason: format!("Unknown log level '{}'", self.logging.level),
            });
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ResolverError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                enable_cors: true,
            },
            resolver: ResolverSettings {
                content_endpoint: "/content".to_string(),
                legacy_base_url: None,
                strategy_source: None,
                validate_on_load: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolver.content_endpoint, "/content");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
host = "0.0.0.0"
port = 9090
enable_cors = false

[resolver]
content_endpoint = "/documents"
legacy_base_url = "https://legacy.contoso.com/docs"
strategy_source = "strategies.json"
validate_on_load = true

[logging]
level = "debug"
json_format = true
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.resolver.content_endpoint, "/documents");
        assert_eq!(
            config.resolver.strategy_source.as_deref(),
            Some("strategies.json")
        );
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrips_through_toml() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
    }
}
