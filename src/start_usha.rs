//! Startup helpers for the Usha server.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::config::UshaConfig;
use crate::server::{self, AppState};

/// Run the server (used by the `usha-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(rust_log.as_deref()))
        .init();

    tracing::info!("Starting Usha v{}", env!("CARGO_PKG_VERSION"));

    let state = match initialize() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server_with_shutdown(state, shutdown_signal())) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Usha stopped");
    ExitCode::SUCCESS
}

/// Load configuration and build application state without starting the server.
///
/// # Errors
/// Returns an error if configuration is missing or invalid, or state creation fails.
pub fn initialize() -> Result<Arc<AppState>, Box<dyn std::error::Error + Send + Sync>> {
    let config = UshaConfig::from_env().map_err(|e| format!("Invalid configuration: {e}"))?;
    tracing::info!(
        model = %config.model,
        base_url = %config.base_url,
        placement = ?config.system_prompt_placement,
        timeout_secs = config.request_timeout.as_secs(),
        "Chat upstream configured"
    );

    AppState::new(config).map_err(|e| format!("Failed to create state: {e}").into())
}

/// Log filter from a `RUST_LOG` value, `info` when unset or unparsable.
fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(rust_log.unwrap_or_default())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
