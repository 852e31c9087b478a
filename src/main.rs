//! Bastion auth server: the trust-and-identity core of a cluster.
//!
//! Main entry point that wires all crates together and keeps the auth
//! server running until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use bastion_auth::{AuthServer, AuthServerConfig};
use bastion_backend::BackendManager;
use bastion_core::config::AppConfig;
use bastion_core::error::AppError;
use bastion_core::traits::{Clock, SystemClock};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Auth server error");
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and `BASTION__*` environment variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("BASTION_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

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

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        cluster = %config.cluster.name,
        backend = %config.backend.provider,
        static_tokens = config.tokens.static_tokens.len(),
        connectors = config.oidc.connectors.len(),
        "Starting Bastion auth server"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend = BackendManager::new(&config.backend, clock.clone())?;
    let sweeper =
        backend.spawn_purge_task(Duration::from_secs(config.backend.purge_interval_seconds.max(1)));

    let server = AuthServer::new(AuthServerConfig::from(&config), backend.backend(), clock)?;
    server.bootstrap().await?;

    if !server.health_check().await? {
        return Err(AppError::storage("Backend health check failed"));
    }
    tracing::info!(cluster = %server.cluster_name(), "Auth server ready");

    shutdown_signal().await;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    tracing::info!("Auth server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
