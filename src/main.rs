//! # Citation Resolver Server Driver
//!
//! ## Purpose
//! Main entry point for the citation resolver service. Loads configuration,
//! initializes components, and starts the web server used by the chat
//! frontend.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files, command line arguments, environment
//!   variables
//! - **Output**: Running web server with resolution API endpoints
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Load the strategy configuration from its source (file or URL)
//! 4. Initialize resolver components
//! 5. Start web API server
//! 6. Handle shutdown signals gracefully

use clap::{Arg, Command};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use citation_resolver::{
    api::ApiServer,
    citations::CitationParser,
    config::Config,
    errors::{ResolverError, Result},
    observability::ResolverMetrics,
    resolver::CitationResolver,
    strategy,
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("citation-resolver-server")
        .version(env!("CARGO_PKG_VERSION"))
        .author("RAG Platform Team")
        .about("Citation strategy resolution service for RAG chat applications")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("check-config")
                .long("check-config")
                .help("Load and validate the strategy configuration, then exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .help("Print the effective application configuration and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Load configuration
    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");
    let mut config = Config::from_file(config_path)?;

    // Override port if specified
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let config = Arc::new(config);

    // Initialize logging
    init_logging(&config)?;

    if matches.get_flag("print-config") {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    info!("Starting Citation Resolver v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", config_path);

    // Validate strategy configuration and exit if requested
    if matches.get_flag("check-config") {
        return run_config_check(&config).await;
    }

    // Initialize application components
    let app_state = initialize_components(config.clone()).await?;

    // Start the API server
    let server = ApiServer::new(app_state).await?;

    info!(
        "Citation Resolver started successfully on {}:{}",
        config.server.host, config.server.port
    );

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
            warn!("Server stopped unexpectedly");
        }
    }

    info!("Citation Resolver shut down successfully");

    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let log_level: tracing::Level =
        config.logging.level.parse().map_err(|_| ResolverError::Config {
            message: format!("Invalid log level: {}", config.logging.level),
        })?;
    let filter = tracing_subscriber::filter::LevelFilter::from_level(log_level);

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .json()
                    .with_filter(filter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_filter(filter),
            )
            .init();
    }

    info!("Logging initialized with level: {}", config.logging.level);
    Ok(())
}

/// Initialize all application components
async fn initialize_components(config: Arc<Config>) -> Result<AppState> {
    info!("Initializing application components...");

    let resolver = Arc::new(CitationResolver::new(
        config.resolver.content_endpoint.clone(),
        config.resolver.legacy_base_url.clone(),
    ));
    let parser = Arc::new(CitationParser::new()?);
    let metrics = Arc::new(ResolverMetrics::new());

    // A failed strategy load is not fatal: the service stays up and serves
    // every citation through the legacy path until a successful reload.
    let strategies = match strategy::load_and_validate(&config.resolver).await {
        Ok(Some((loaded, report))) => {
            info!(
                version = %loaded.version,
                warnings = report.warnings.len(),
                "Strategy configuration loaded"
            );
            Some(loaded)
        }
        Ok(None) => {
            info!("No strategy source configured, resolving via legacy path");
            None
        }
        Err(e) => {
            error!(
                error = %e,
                category = e.category(),
                "Failed to load strategy configuration, resolving via legacy path"
            );
            None
        }
    };

    info!("All components initialized successfully");
    Ok(AppState {
        config,
        resolver,
        parser,
        strategies: Arc::new(RwLock::new(strategies)),
        metrics,
    })
}

/// Load and validate the strategy configuration, reporting the outcome
async fn run_config_check(config: &Config) -> Result<()> {
    info!("Checking strategy configuration...");

    match strategy::load_and_validate(&config.resolver).await? {
        Some((loaded, report)) => {
            info!("✓ Strategy configuration is valid (version {})", loaded.version);
            let enabled = loaded
                .strategies
                .as_deref()
                .map(|s| s.iter().filter(|s| s.enabled).count())
                .unwrap_or(0);
            info!("✓ {} enabled strategies", enabled);
            if !report.warnings.is_empty() {
                warn!("{} warnings (see log above)", report.warnings.len());
            }
        }
        None => {
            warn!("No strategy source configured; nothing to check");
        }
    }

    info!("Configuration check passed!");
    Ok(())
}
