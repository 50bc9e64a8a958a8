//! costprism exporter
//!
//! - Reads config once (defaults, optional YAML, environment)
//! - Refreshes AWS Cost Explorer gauges on a fixed period in the background
//! - Serves `/metrics` and `/health`
//! - Stops the scheduler on SIGINT/SIGTERM after the server drains

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use costprism_core::error::{ExporterError, Result};
use costprism_exporter::billing::CostExplorerClient;
use costprism_exporter::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "costprism-exporter failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = config::load()?;
    let listen = cfg.server.listen_addr()?;

    let client = CostExplorerClient::from_env().await;
    let state = app_state::AppState::new(cfg, Arc::new(client));
    let scheduler = state.scheduler().spawn();
    let app = router::build_router(state);

    tracing::info!(%listen, "costprism-exporter starting");
    let listener = match tokio::net::TcpListener::bind(listen).await {
        Ok(l) => l,
        Err(e) => {
            scheduler.shutdown().await;
            return Err(ExporterError::Configuration(format!("bind {listen} failed: {e}")));
        }
    };

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler.shutdown().await;
    served.map_err(|e| ExporterError::Internal(format!("server failed: {e}")))?;
    tracing::info!("costprism-exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
