use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mailcannon_backend::api;
use mailcannon_backend::config::{Config, StoreBackend};
use mailcannon_backend::mail::SmtpRelay;
use mailcannon_backend::redis::{create_pool, AccessRepository};
use mailcannon_backend::state::AppState;
use mailcannon_backend::store::{AccessStore, MemoryAccessStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting MailCannon Backend...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        host = %config.server_host,
        port = %config.server_port,
        frontend = %config.frontend_url,
        "Configuration loaded"
    );

    if config.smtp_host.is_none() {
        tracing::warn!("SMTP_HOST is not set, email sending will fail until it is configured");
    }

    let access_store: Arc<dyn AccessStore> = match config.store_backend {
        StoreBackend::Redis => {
            let pool = create_pool(&config)?;
            let repo = AccessRepository::new(pool, config.tracked_access_prefix.clone());

            // Test Redis connection
            match repo.health_check().await {
                Ok(true) => tracing::info!("Redis connection established"),
                Ok(false) => tracing::warn!("Redis health check returned false"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to Redis");
                    // Continue anyway, might recover later
                }
            }
            Arc::new(repo)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory access store, records are lost on restart");
            Arc::new(MemoryAccessStore::new())
        }
    };

    let transports = Arc::new(SmtpRelay::new(&config));
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(&config.frontend_url)?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    // Create application state
    let state = AppState::new(config.clone(), access_store, transports);

    // Build router
    let app = Router::new()
        .merge(api::create_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Server listening");

    // Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Handle shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down...");
        },
    }
}
