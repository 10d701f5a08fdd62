//! Fleet console - multi-cluster management API
//!
//! Serves cluster inventory, resource listings, scaling, version and cost
//! operations backed by the kubectl and aws command-line tools.

use anyhow::Result;
use fleet_console::{api, config};
use fleet_core::{
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    upstream::{AwsCli, CommandRunner, Kubectl},
    FleetService,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CONSOLE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting fleet-console");

    let config = config::ConsoleConfig::load()?;
    info!(
        kubectl = %config.kubectl_path,
        aws = %config.aws_path,
        region = ?config.aws_region,
        "Console configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::CLOUD_API).await;
    health_registry.register(components::CLUSTER_CLI).await;

    let instance = std::env::var("HOSTNAME").unwrap_or_else(|_| "fleet-console".to_string());
    let logger = StructuredLogger::new(instance);
    let bind_addr = config.bind_addr();
    logger.log_startup(CONSOLE_VERSION, &bind_addr);

    let kubectl = Kubectl::new(
        CommandRunner::new(&config.kubectl_path).with_tool_label("kubectl"),
        config.kubectl_settings(),
    );
    let aws = AwsCli::new(
        CommandRunner::new(&config.aws_path).with_tool_label("aws"),
        config.aws_settings(),
    );

    let fleet = FleetService::new(
        Arc::new(aws),
        Arc::new(kubectl),
        health_registry.clone(),
        logger.clone(),
        config.cost_settings(),
    );
    let app_state = Arc::new(api::AppState::new(fleet));

    // Upstreams are checked lazily; the console is ready once it can serve
    health_registry.set_ready(true).await;

    let shutdown_logger = logger.clone();
    api::serve(bind_addr, app_state, async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_logger.log_shutdown("SIGINT received");
        }
    })
    .await?;

    info!("Shutting down");
    Ok(())
}
