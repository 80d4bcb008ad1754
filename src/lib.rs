//! # Citation Resolver
//!
//! ## Overview
//! This library implements the citation resolution engine for a
//! retrieval-augmented-generation chat application: given a citation token
//! emitted by the generation backend and a declarative configuration of
//! citation strategies, it deterministically selects the best-matching
//! strategy and constructs an authoritative, possibly-authenticated URL
//! back to the source document.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `resolver`: Deterministic strategy selection and URL construction
//! - `strategy`: Strategy configuration, capability matching, validation
//! - `citations`: Citation marker extraction from generated answers
//! - `api`: REST API endpoints for the chat frontend
//! - `config`: Application configuration management and settings
//! - `observability`: Resolution counters for the stats endpoint
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Citation tokens (text), strategy configuration (JSON)
//! - **Output**: Resolved citation URLs with auth metadata
//! - **Guarantee**: Resolution is total and deterministic; every token
//!   resolves to a non-empty URL, even on internal failure
//!
//! ## Usage
//! ```rust
//! use citation_resolver::{CitationResolver, StrategyConfig};
//!
//! let config: StrategyConfig = serde_json::from_str(
//!     r#"{
//!         "version": "1.0",
//!         "strategies": [
//!             {"name": "docs", "type": "sharepoint",
//!              "baseUrl": "https://contoso.sharepoint.com/sites/docs"}
//!         ]
//!     }"#,
//! ).unwrap();
//!
//! let resolver = CitationResolver::default();
//! let result = resolver.resolve("handbook.pdf", Some(&config), None);
//! assert_eq!(result.url, "https://contoso.sharepoint.com/sites/docs/handbook.pdf");
//! ```

// Core modules
pub mod citations;
pub mod config;
pub mod errors;
pub mod observability;
pub mod resolver;
pub mod strategy;
pub mod api;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use citations::{AnswerFragment, CitationParser, ParsedAnswer};
pub use config::Config;
pub use errors::{ResolverError, Result};
pub use resolver::{CitationResolver, CitationResult};
pub use strategy::{StrategyConfig, StrategyDefinition, StrategyType};

use parking_lot::RwLock;
use std::sync::Arc;

/// Application state shared across API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub resolver: Arc<resolver::CitationResolver>,
    pub parser: Arc<citations::CitationParser>,
    /// Strategy configuration currently in effect; read-only between
    /// administrative reloads
    pub strategies: Arc<RwLock<Option<strategy::StrategyConfig>>>,
    pub metrics: Arc<observability::ResolverMetrics>,
}
