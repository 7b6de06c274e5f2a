mod backend;
mod background;
mod config;
mod error;
mod evaluation;
mod overview;
mod routes;
mod state;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::backend::{ClientAccessor, HttpFlagClient, HttpFlagClientConfig, SharedBackend};
use crate::background::TrackedTasks;
use crate::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::Config::from_env()?;

    let connect = {
        let config = config.clone();
        move || -> backend::Result<SharedBackend> {
            let client = HttpFlagClient::new(HttpFlagClientConfig {
                base_url: config.backend_url.clone(),
                service_id: crate::config::SERVICE_ID.to_string(),
                send_events: true,
                init_timeout: config.init_timeout,
                events_capacity: config.events_capacity,
            })?;
            Ok(Arc::new(client) as SharedBackend)
        }
    };

    let background = TrackedTasks::new();
    let state = state::AppState {
        flags: Arc::new(ClientAccessor::new(connect)),
        background: Arc::new(background.clone()),
    };

    let app = routes::routes(config.variant)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;

    tracing::info!(variant = ?config.variant, "server is chilling at http://{}", config.addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // flushes scheduled by the last requests still have to reach the backend
    background.drain().await;
    tracing::info!("shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
