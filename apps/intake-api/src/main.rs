//! # Alta Intake API
//!
//! HTTP server for the dual-write intake buffer.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Config     TOML + env overrides, validated     (fatal, logged)     │
//! │  2. Logging    RUST_LOG or [logging].filter                            │
//! │  3. Buffer     SQLite, migrations applied          (fatal on failure)  │
//! │  4. Remote     PostgreSQL pool, lazy               (never blocks)      │
//! │                optional schema bootstrap           (failure logged)    │
//! │  5. Retry      background worker if [retry].enabled                    │
//! │  6. Serve      axum on bind_addr:port until Ctrl+C / SIGTERM           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use alta_db::{Database, DbConfig};
use alta_sync::config::redact_url;
use alta_sync::{
    AppConfig, ClientDirectory, LoggingSettings, PendingReconciler, PgRemoteStore, RetryPolicy,
    RetryWorker, SyncCoordinator,
};
use intake_api::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration. A broken file stops startup; logging falls back
    // to RUST_LOG or "info" so the reason is visible.
    let config = match AppConfig::load(None) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingSettings::default().filter);
            error!(error = %e, "Configuration rejected, refusing to start");
            return Err(e.into());
        }
    };

    init_tracing(&config.logging.filter);

    info!("Starting Alta intake API...");
    info!(
        buffer = %config.buffer.path.display(),
        remote = %redact_url(&config.remote.database_url),
        replicate_timeout = ?config.remote.replicate_timeout(),
        "Configuration loaded"
    );

    // Local buffer
    let db_config = DbConfig::new(&config.buffer.path).max_connections(config.buffer.max_connections);
    let db = Database::new(db_config).await?;
    info!("Local buffer ready");

    // Remote store
    let remote = PgRemoteStore::connect_lazy(&config.remote)?;
    if config.remote.run_migrations {
        if let Err(e) = remote.run_migrations().await {
            warn!(error = %e, "Remote schema bootstrap failed, continuing");
        }
    }

    let coordinator = SyncCoordinator::new(
        db.clone(),
        Arc::new(remote.clone()),
        config.remote.replicate_timeout(),
    );

    // Optional retry worker
    let retry_handle = if config.retry.enabled {
        let reconciler = PendingReconciler::new(coordinator.clone());
        let (worker, handle) = RetryWorker::new(reconciler, RetryPolicy::from(&config.retry));
        tokio::spawn(worker.run());
        Some(handle)
    } else {
        None
    };

    let state = Arc::new(AppState::new(
        coordinator,
        ClientDirectory::new(&config.lookup),
    ));

    // Serve
    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Intake API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = retry_handle {
        if let Err(e) = handle.shutdown().await {
            warn!(error = %e, "Retry worker did not acknowledge shutdown");
        }
    }

    remote.close().await;
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
