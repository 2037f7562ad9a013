//! Powertool Host
//!
//! Main entry point that boots the extension host, loads the bundled plugin,
//! mounts the configured nodes and runs until a shutdown signal arrives.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use plugin_clear_tab::ClearTabPlugin;
use powertool_core::config::AppConfig;
use powertool_core::error::AppError;
use powertool_plugin::PowertoolHost;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Host error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_dir = std::env::var("POWERTOOL_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let env = std::env::var("POWERTOOL_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load_from(&config_dir, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main host run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Powertool host v{}", env!("CARGO_PKG_VERSION"));

    let auto_load = config.plugins.auto_load;
    let nodes = config.host.nodes.clone();

    let host = PowertoolHost::new(config)?;

    // ── Step 1: Plugins ──────────────────────────────────────────
    if auto_load {
        match host.load_plugin(Arc::new(ClearTabPlugin::new())).await {
            Ok(ctx) => tracing::info!(plugin_id = %ctx.id(), "Plugin loaded"),
            Err(e) => tracing::warn!(error = %e, "Plugin not loaded"),
        }
    } else {
        tracing::info!("Plugin auto-load disabled");
    }

    // ── Step 2: Startup nodes ────────────────────────────────────
    for node in nodes {
        if let Err(e) = host.connect_node(node.as_str()) {
            tracing::warn!(node_id = %node, error = %e, "Node not connected");
        }
    }
    tracing::info!(nodes = ?host.nodes(), "Host ready");

    // ── Step 3: Wait for shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");

    let metrics = host.metrics();
    host.shutdown().await?;
    tracing::info!(
        sent = metrics.messages_sent,
        delivered = metrics.messages_delivered,
        dropped = metrics.dropped_total(),
        "Powertool host stopped"
    );
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
