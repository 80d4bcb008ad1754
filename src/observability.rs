//! # Observability Module
//!
//! ## Purpose
//! In-process counters for resolution outcomes and answer parsing, surfaced
//! through the stats endpoint for dashboards and smoke checks.
//!
//! ## Input/Output Specification
//! - **Input**: Resolution outcomes, parse results, reload events
//! - **Output**: A serializable point-in-time snapshot
//!
//! Counters are plain atomics; recording never blocks a request.

use crate::resolver::{
    STRATEGY_USED_ERROR_FALLBACK, STRATEGY_USED_FALLBACK, STRATEGY_USED_LEGACY,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Service-lifetime counters
pub struct ResolverMetrics {
    started_at: DateTime<Utc>,
    resolutions_total: AtomicU64,
    resolutions_strategy: AtomicU64,
    resolutions_legacy: AtomicU64,
    resolutions_fallback: AtomicU64,
    resolutions_error_fallback: AtomicU64,
    answers_parsed: AtomicU64,
    citations_extracted: AtomicU64,
    config_reloads: AtomicU64,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Seconds since the service started
    pub uptime_seconds: u64,
    /// Total resolution calls
    pub resolutions_total: u64,
    /// Resolutions served by a configured strategy
    pub resolutions_strategy: u64,
    /// Resolutions through the no-config legacy path
    pub resolutions_legacy: u64,
    /// Resolutions through the no-match fallback path
    pub resolutions_fallback: u64,
    /// Resolutions degraded by an internal failure
    pub resolutions_error_fallback: u64,
    /// Answers run through the citation parser
    pub answers_parsed: u64,
    /// Validated citation markers extracted across all answers
    pub citations_extracted: u64,
    /// Successful strategy-configuration reloads
    pub config_reloads: u64,
}

impl ResolverMetrics {
    /// Create a metrics registry anchored at the current instant
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            resolutions_total: AtomicU64::new(0),
            resolutions_strategy: AtomicU64::new(0),
            resolutions_legacy: AtomicU64::new(0),
            resolutions_fallback: AtomicU64::new(0),
            resolutions_error_fallback: AtomicU64::new(0),
            answers_parsed: AtomicU64::new(0),
            citations_extracted: AtomicU64::new(0),
            config_reloads: AtomicU64::new(0),
        }
    }

    /// Record one resolution, classified by the `strategyUsed` value
    pub fn record_resolution(&self, strategy_used: &str) {
        self.resolutions_total.fetch_add(1, Ordering::Relaxed);
        let bucket = match strategy_used {
            STRATEGY_USED_LEGACY => &self.resolutions_legacy,
            STRATEGY_USED_FALLBACK => &self.resolutions_fallback,
            STRATEGY_USED_ERROR_FALLBACK => &self.resolutions_error_fallback,
            _ => &self.resolutions_strategy,
        };
        bucket.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one parsed answer and how many citations it yielded
    pub fn record_answer_parsed(&self, citation_count: usize) {
        self.answers_parsed.fetch_add(1, Ordering::Relaxed);
        self.citations_extracted
            .fetch_add(citation_count as u64, Ordering::Relaxed);
    }

    /// Record a successful strategy-configuration reload
    pub fn record_config_reload(&self) {
        self.config_reloads.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let uptime = (Utc::now() - self.started_at).num_seconds().max(0) as u64;
        MetricsSnapshot {
            uptime_seconds: uptime,
            resolutions_total: self.resolutions_total.load(Ordering::Relaxed),
            resolutions_strategy: self.resolutions_strategy.load(Ordering::Relaxed),
            resolutions_legacy: self.resolutions_legacy.load(Ordering::Relaxed),
            resolutions_fallback: self.resolutions_fallback.load(Ordering::Relaxed),
            resolutions_error_fallback: self.resolutions_error_fallback.load(Ordering::Relaxed),
            answers_parsed: self.answers_parsed.load(Ordering::Relaxed),
            citations_extracted: self.citations_extracted.load(Ordering::Relaxed),
            config_reloads: self.config_reloads.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResolverMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_buckets() {
        let metrics = ResolverMetrics::new();
        metrics.record_resolution("sp-docs");
        metrics.record_resolution("legacy");
        metrics.record_resolution("fallback");
        metrics.record_resolution("error_fallback");
        metrics.record_resolution("sp-docs");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.resolutions_total, 5);
        assert_eq!(snapshot.resolutions_strategy, 2);
        assert_eq!(snapshot.resolutions_legacy, 1);
        assert_eq!(snapshot.resolutions_fallback, 1);
        assert_eq!(snapshot.resolutions_error_fallback, 1);
    }

    #[test]
    fn test_answer_counters() {
        let metrics = ResolverMetrics::new();
        metrics.record_answer_parsed(3);
        metrics.record_answer_parsed(0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.answers_parsed, 2);
        assert_eq!(snapshot.citations_extracted, 3);
    }
}
