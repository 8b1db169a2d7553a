//! Lifecheck Server - REST API for liveness verification
//!
//! Exposes lifecheck-core over HTTP:
//! - POST /verify/{username} - Verify a clip against the user's reference photo
//! - GET /verification-status/{username} - Whether a new verification is due
//! - POST /upload-profile-picture/{username} - Store a reference photo
//! - POST /users/register, POST /users/login, GET /users/profile/{username}

use std::net::SocketAddr;

use lifecheck_server::{create_router_with_config, AppState, Config};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "lifecheck_server=info,lifecheck_core=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    config.warn_on_inconsistencies();

    let state = AppState::from_config(&config).await?;
    let app = create_router_with_config(&config, state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        version = env!("CARGO_PKG_VERSION"),
        "lifecheck-server listening (docs at /docs)"
    );

    // Peer addresses are needed by the rate limiter's key extractor
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
