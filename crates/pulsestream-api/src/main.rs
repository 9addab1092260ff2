mod config;
mod dto;
mod errors;
mod handlers;
mod middleware;
mod routes;
mod state;

use std::net::SocketAddr;

use axum::middleware as axum_middleware;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::auth_middleware;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "pulsestream-api")]
#[command(about = "PulseStream event ingestion and query service")]
struct Args {
    /// Overrides PULSESTREAM_BIND_ADDR when set.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut app_config = config::AppConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    if let Some(bind) = args.bind {
        app_config.bind_addr = bind;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %app_config.bind_addr,
        "starting pulsestream-api"
    );

    let app_state = AppState::new(app_config.storage.0.as_ref(), app_config.ingestion).await?;

    let app = routes::build_router()
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(app_config.request_deadline))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(app_config.bind_addr).await?;
    tracing::info!(bind_address = %app_config.bind_addr, "pulsestream-api ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("pulsestream-api shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut handler) => {
                handler.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
