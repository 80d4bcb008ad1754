//! # Citation Resolution Module
//!
//! ## Purpose
//! Core resolution engine mapping a citation token plus a strategy
//! configuration to a single authoritative `CitationResult`, never failing
//! outright: every failure path degrades to a usable fallback URL.
//!
//! ## Input/Output Specification
//! - **Input**: Citation token, optional strategy configuration, optional
//!   caller-supplied metadata
//! - **Output**: `CitationResult` with a non-empty URL, the strategy used
//!   (or a fallback sentinel), and authentication requirements
//! - **Determinism**: Pure function of its inputs; identical inputs always
//!   produce identical results
//!
//! ## Key Features
//! - Default-strategy precedence over priority ordering
//! - Stable priority ordering (ties resolved by original list order)
//! - Unconditional fallback-strategy selection when nothing matches
//! - Per-type URL construction with a dedicated CMS document shape
//! - Top-level error containment: internal failures produce an
//!   `error_fallback` result instead of propagating

use crate::errors::Result;
use crate::strategy::{StrategyConfig, StrategyDefinition, StrategyType};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Sentinel for the no-configuration fast path
pub const STRATEGY_USED_LEGACY: &str = "legacy";
/// Sentinel for "configuration present but nothing selected"
pub const STRATEGY_USED_FALLBACK: &str = "fallback";
/// Sentinel for contained internal failures
pub const STRATEGY_USED_ERROR_FALLBACK: &str = "error_fallback";

/// Default content endpoint used when no legacy base URL is configured
pub const DEFAULT_CONTENT_ENDPOINT: &str = "/content";

/// Outcome of resolving one citation token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationResult {
    /// Fully constructed, ready-to-navigate URL (always non-empty)
    pub url: String,
    /// Name of the winning strategy, or one of the sentinel values
    /// `legacy`, `fallback`, `error_fallback`
    pub strategy_used: String,
    /// Whether dereferencing the URL requires authentication
    pub requires_auth: bool,
    /// Headers to attach when fetching the document, present only when
    /// `requires_auth` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_headers: Option<HashMap<String, String>>,
    /// Diagnostic metadata: strategy type/priority, the original token,
    /// and any caller-supplied context
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// Human-readable message, present only when resolution fell back due
    /// to an internal failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Citation resolution engine.
///
/// Carries the caller-level context the strategy configuration does not:
/// the generic content endpoint documents are served from, and an optional
/// legacy base URL used when no structured strategy applies.
#[derive(Debug, Clone)]
pub struct CitationResolver {
    content_endpoint: String,
    legacy_base_url: Option<String>,
}

impl Default for CitationResolver {
    fn default() -> Self {
        Self {
            content_endpoint: DEFAULT_CONTENT_ENDPOINT.to_string(),
            legacy_base_url: None,
        }
    }
}

impl CitationResolver {
    /// Create a resolver with an explicit content endpoint and optional
    /// legacy base URL
    pub fn new(content_endpoint: impl Into<String>, legacy_base_url: Option<String>) -> Self {
        Self {
            content_endpoint: content_endpoint.into(),
            legacy_base_url,
        }
    }

    /// Resolve a citation token against a strategy configuration.
    ///
    /// Never fails: internal errors (e.g. a malformed path pattern) are
    /// contained and converted into an `error_fallback` result pointing at
    /// the legacy content location.
    pub fn resolve(
        &self,
        citation: &str,
        config: Option<&StrategyConfig>,
        extra_metadata: Option<&HashMap<String, Value>>,
    ) -> CitationResult {
        match self.try_resolve(citation, config, extra_metadata) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    citation,
                    error = %e,
                    category = e.category(),
                    "citation resolution failed, degrading to error fallback"
                );
                let mut result = self.base_result(
                    self.legacy_url(citation),
                    STRATEGY_USED_ERROR_FALLBACK,
                    citation,
                    extra_metadata,
                );
                result.error = Some(e.to_string());
                result
            }
        }
    }

    fn try_resolve(
        &self,
        citation: &str,
        config: Option<&StrategyConfig>,
        extra_metadata: Option<&HashMap<String, Value>>,
    ) -> Result<CitationResult> {
        // No-config fast path: no configuration at all, or a configuration
        // that never defined the strategies field.
        let Some(config) = config else {
            return Ok(self.base_result(
                self.legacy_url(citation),
                STRATEGY_USED_LEGACY,
                citation,
                extra_metadata,
            ));
        };
        let Some(strategies) = config.strategies.as_deref() else {
            return Ok(self.base_result(
                self.legacy_url(citation),
                STRATEGY_USED_LEGACY,
                citation,
                extra_metadata,
            ));
        };

        let enabled: Vec<&StrategyDefinition> =
            strategies.iter().filter(|s| s.enabled).collect();

        let mut selected: Option<&StrategyDefinition> = None;

        // Preferred strategy wins outright if it can handle the token,
        // regardless of priority.
        if let Some(name) = config.default_strategy.as_deref() {
            if let Some(candidate) = enabled.iter().find(|s| s.name == name).copied() {
                if candidate.can_handle(citation)? {
                    selected = Some(candidate);
                }
            }
        }

        if selected.is_none() {
            let mut candidates: Vec<&StrategyDefinition> = Vec::new();
            for strategy in enabled.iter().copied() {
                if strategy.can_handle(citation)? {
                    candidates.push(strategy);
                }
            }
            // Stable sort: ties on priority keep original list order.
            candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
            selected = candidates.first().copied();
        }

        // The fallback strategy is trusted to handle anything; its own
        // filters are not re-applied.
        if selected.is_none() {
            if let Some(name) = config.fallback_strategy.as_deref() {
                selected = enabled.iter().find(|s| s.name == name).copied();
            }
        }

        let Some(strategy) = selected else {
            let url = match config.legacy_base_url.as_deref() {
                Some(base) => join_url(base, citation),
                None => self.legacy_url(citation),
            };
            return Ok(self.base_result(
                url,
                STRATEGY_USED_FALLBACK,
                citation,
                extra_metadata,
            ));
        };

        tracing::debug!(
            citation,
            strategy = %strategy.name,
            strategy_type = strategy.strategy_type.as_str(),
            priority = strategy.priority,
            "selected citation strategy"
        );

        Ok(self.strategy_result(citation, strategy, extra_metadata))
    }

    fn strategy_result(
        &self,
        citation: &str,
        strategy: &StrategyDefinition,
        extra_metadata: Option<&HashMap<String, Value>>,
    ) -> CitationResult {
        let url = self.build_url(citation, strategy);

        let mut metadata = HashMap::new();
        metadata.insert(
            "strategyType".to_string(),
            json!(strategy.strategy_type.as_str()),
        );
        metadata.insert("strategyPriority".to_string(), json!(strategy.priority));
        metadata.insert("originalCitation".to_string(), json!(citation));
        merge_extra(&mut metadata, extra_metadata);

        let (requires_auth, auth_headers) = match &strategy.authentication {
            Some(auth) if auth.requires_auth => {
                (true, Some(auth.additional_headers.clone()))
            }
            _ => (false, None),
        };

        CitationResult {
            url,
            strategy_used: strategy.name.clone(),
            requires_auth,
            auth_headers,
            metadata,
            error: None,
        }
    }

    /// URL construction for a selected strategy, dispatched on its type
    fn build_url(&self, citation: &str, strategy: &StrategyDefinition) -> String {
        let base = strategy.base_url.trim_end_matches('/');
        let token = citation.strip_prefix('/').unwrap_or(citation);

        match strategy.strategy_type {
            StrategyType::Sharepoint
            | StrategyType::BlobStorage
            | StrategyType::FileServer
            | StrategyType::CustomUrl => format!("{}/{}", base, token),
            StrategyType::Cms => {
                // CMS systems address documents by stem: everything after
                // the first dot is dropped.
                let stem = token.split('.').next().unwrap_or(token);
                format!("{}/documents/{}", base, stem)
            }
            StrategyType::Default => {
                if base.is_empty() {
                    self.content_url(citation)
                } else {
                    format!("{}/{}", base, token)
                }
            }
        }
    }

    fn base_result(
        &self,
        url: String,
        strategy_used: &str,
        citation: &str,
        extra_metadata: Option<&HashMap<String, Value>>,
    ) -> CitationResult {
        let source = match strategy_used {
            STRATEGY_USED_LEGACY => "legacy_fallback",
            other => other,
        };

        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), json!(source));
        metadata.insert("originalCitation".to_string(), json!(citation));
        merge_extra(&mut metadata, extra_metadata);

        CitationResult {
            url,
            strategy_used: strategy_used.to_string(),
            requires_auth: false,
            auth_headers: None,
            metadata,
            error: None,
        }
    }

    /// Unstructured URL construction: the per-call legacy base when one is
    /// configured, otherwise the generic content endpoint
    fn legacy_url(&self, citation: &str) -> String {
        match self.legacy_base_url.as_deref() {
            Some(base) => join_url(base, citation),
            None => self.content_url(citation),
        }
    }

    fn content_url(&self, citation: &str) -> String {
        join_url(&self.content_endpoint, citation)
    }
}

/// Join a base URL and a token with exactly one slash between them
fn join_url(base: &str, token: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        token.strip_prefix('/').unwrap_or(token)
    )
}

/// Caller-supplied metadata takes precedence on key collisions
fn merge_extra(
    metadata: &mut HashMap<String, Value>,
    extra_metadata: Option<&HashMap<String, Value>>,
) {
    if let Some(extra) = extra_metadata {
        for (key, value) in extra {
            metadata.insert(key.clone(), value.clone());
        }
    }
}
