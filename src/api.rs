//! # API Server Module
//!
//! ## Purpose
//! REST API server exposing citation resolution, answer parsing, and
//! strategy-configuration management for the chat frontend.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with citation tokens, generated answers,
//!   reload commands
//! - **Output**: JSON responses with resolution results, parsed answers,
//!   configuration, health and stats
//! - **Endpoints**: Resolve, parse, config serve/reload, health, stats
//!
//! ## Key Features
//! - Total resolve endpoint: well-formed requests always get a usable URL
//! - Strategy configuration served to the frontend once per session
//! - Administrative reload with a structured validation report
//! - CORS support for web frontends
//! - Structured error responses

use crate::citations::ParsedAnswer;
use crate::errors::{ResolverError, Result};
use crate::resolver::CitationResult;
use crate::strategy;
use crate::utils::{TextUtils, Timer};
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Application state wrapper for the API server
pub struct ApiServer {
    app_state: crate::AppState,
}

/// Resolve request payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    /// Citation token to resolve
    pub citation: String,
    /// Caller-supplied metadata merged into the result (caller wins)
    #[serde(default)]
    pub extra_metadata: Option<HashMap<String, Value>>,
}

/// Resolve response payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    /// The resolution outcome
    pub result: CitationResult,
    /// Server-side resolution time
    pub resolve_time_ms: u64,
}

/// Answer parse request payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseAnswerRequest {
    /// Generated answer text containing bracket-delimited markers
    pub answer: String,
    /// Source identifiers recorded in the response's supporting context
    #[serde(default)]
    pub source_identifiers: Vec<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall status
    pub status: String,
    /// Crate version
    pub version: String,
    /// Whether a strategy configuration is currently loaded
    pub strategy_config_loaded: bool,
    /// Number of enabled strategies in the loaded configuration
    pub enabled_strategies: usize,
}

impl ApiServer {
    /// Create new API server
    pub async fn new(app_state: crate::AppState) -> Result<Self> {
        Ok(Self { app_state })
    }

    /// Run the API server
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.config.server.host, self.app_state.config.server.port
        );
        let enable_cors = self.app_state.config.server.enable_cors;

        tracing::info!("Starting API server on {}", bind_addr);

        HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::permissive()
            } else {
                Cors::default()
            };

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(self.app_state.clone()))
                .route("/resolve", web::post().to(resolve_handler))
                .route("/answers/parse", web::post().to(parse_answer_handler))
                .route("/config", web::get().to(config_handler))
                .route("/config/reload", web::post().to(reload_config_handler))
                .route("/health", web::get().to(health_handler))
                .route("/stats", web::get().to(stats_handler))
                .route("/", web::get().to(index_handler))
        })
        .bind(&bind_addr)
        .map_err(|e| ResolverError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?
        .run()
        .await
        .map_err(|e| ResolverError::Internal {
            message: format!("Server error: {}", e),
        })?;

        Ok(())
    }
}

/// Citation resolution endpoint handler
async fn resolve_handler(
    app_state: web::Data<crate::AppState>,
    request: web::Json<ResolveRequest>,
) -> ActixResult<HttpResponse> {
    let timer = Timer::new("resolve");
    let request_id = Uuid::new_v4();

    // Clone out of the lock so no guard is held across the response path.
    let strategies = app_state.strategies.read().clone();

    let result = app_state.resolver.resolve(
        &request.citation,
        strategies.as_ref(),
        request.extra_metadata.as_ref(),
    );
    app_state.metrics.record_resolution(&result.strategy_used);

    tracing::info!(
        request_id = %request_id,
        citation = %TextUtils::truncate(&TextUtils::sanitize(&request.citation), 200),
        strategy_used = %result.strategy_used,
        requires_auth = result.requires_auth,
        "resolved citation"
    );

    Ok(HttpResponse::Ok().json(ResolveResponse {
        result,
        resolve_time_ms: timer.stop(),
    }))
}

/// Answer parsing endpoint handler
async fn parse_answer_handler(
    app_state: web::Data<crate::AppState>,
    request: web::Json<ParseAnswerRequest>,
) -> ActixResult<HttpResponse> {
    let parsed: ParsedAnswer = app_state
        .parser
        .parse(&request.answer, &request.source_identifiers);
    app_state.metrics.record_answer_parsed(parsed.citations.len());

    Ok(HttpResponse::Ok().json(parsed))
}

/// Strategy configuration endpoint handler, fetched once per chat session
async fn config_handler(app_state: web::Data<crate::AppState>) -> ActixResult<HttpResponse> {
    let strategies = app_state.strategies.read().clone();
    match strategies {
        Some(config) => Ok(HttpResponse::Ok().json(config)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "No strategy configuration loaded",
        }))),
    }
}

/// Administrative reload of the strategy configuration from its source
async fn reload_config_handler(
    app_state: web::Data<crate::AppState>,
) -> ActixResult<HttpResponse> {
    match strategy::load_and_validate(&app_state.config.resolver).await {
        Ok(Some((config, report))) => {
            tracing::info!(
                version = %config.version,
                warnings = report.warnings.len(),
                "strategy configuration reloaded"
            );
            *app_state.strategies.write() = Some(config);
            app_state.metrics.record_config_reload();
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "status": "reloaded",
                "report": report,
            })))
        }
        Ok(None) => {
            let err = ResolverError::InvalidApiRequest {
                details: "no strategy source configured".to_string(),
            };
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": err.to_string(),
                "category": err.category(),
            })))
        }
        Err(e) => {
            tracing::error!(error = %e, category = e.category(), "strategy configuration reload failed");
            let mut builder = match &e {
                ResolverError::InvalidStrategyConfig { .. } => {
                    HttpResponse::UnprocessableEntity()
                }
                _ => HttpResponse::BadGateway(),
            };
            Ok(builder.json(serde_json::json!({
                "error": e.to_string(),
                "category": e.category(),
            })))
        }
    }
}

/// Health check endpoint handler
async fn health_handler(app_state: web::Data<crate::AppState>) -> ActixResult<HttpResponse> {
    let strategies = app_state.strategies.read().clone();
    let enabled = strategies
        .as_ref()
        .and_then(|c| c.strategies.as_ref())
        .map(|s| s.iter().filter(|s| s.enabled).count())
        .unwrap_or(0);

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        strategy_config_loaded: strategies.is_some(),
        enabled_strategies: enabled,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Statistics endpoint handler
async fn stats_handler(app_state: web::Data<crate::AppState>) -> ActixResult<HttpResponse> {
    let strategy_version = app_state
        .strategies
        .read()
        .as_ref()
        .map(|c| c.version.clone());

    let response = serde_json::json!({
        "resolver": app_state.metrics.snapshot(),
        "strategyConfigVersion": strategy_version,
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Index page handler
async fn index_handler() -> ActixResult<HttpResponse> {
    let html = r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>Citation Resolver</title>
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .header { color: #2c3e50; }
            .endpoint { margin: 20px 0; padding: 15px; background: #f8f9fa; border-radius: 5px; }
            .method { font-weight: bold; color: #27ae60; }
        </style>
    </head>
    <body>
        <h1 class="header">Citation Resolver API</h1>
        <p>Resolves citation tokens from RAG chat responses into authoritative source-document URLs.</p>

        <h2>Available Endpoints</h2>

        <div class="endpoint">
            <span class="method">POST</span> /resolve
            <p>Resolve a citation token into a clickable URL with auth requirements.</p>
        </div>

        <div class="endpoint">
            <span class="method">POST</span> /answers/parse
            <p>Extract validated citation markers from a generated answer.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /config
            <p>Fetch the active strategy configuration (once per chat session).</p>
        </div>

        <div class="endpoint">
            <span class="method">POST</span> /config/reload
            <p>Reload the strategy configuration from its configured source.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /health &middot; <span class="method">GET</span> /stats
            <p>Service health and resolution counters.</p>
        </div>

        <h2>Example Resolve Request</h2>
        <pre>{
  "citation": "employee_handbook.pdf",
  "extraMetadata": { "sessionId": "abc-123" }
}</pre>
    </body>
    </html>
    "#;

    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}
