/// Server setup and initialization
///
/// Wires together the email sender, config store, registration task and HTTP
/// routes. Provides the main application factory function for the Axum app.

use crate::{
    api::{create_node_routes, AppState, JwtVerifier},
    config::Config,
    email::{SparkPostEmailSender, SparkPostSettings},
    node::ConfigStore,
    registration::{register_with_retry, Registration},
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware
pub fn create_app(state: AppState, verifier: Arc<JwtVerifier>) -> Router {
    Router::new()
        // Liveness check, no token needed
        .route("/health", get(health_check))
        .merge(create_node_routes(verifier).with_state(state))
        .layer(TraceLayer::new_for_http())
}

/// Build the shared state from configuration
///
/// Fails when the SparkPost settings or the HTTP clients cannot be set up.
pub fn build_state(config: &Config) -> Result<AppState> {
    tracing::info!("📧 Initializing SparkPost sender ({})", config.sparkpost.base_url);
    let mailer = SparkPostEmailSender::new(SparkPostSettings {
        api_key: config.sparkpost.api_key.clone(),
        base_url: config.sparkpost.base_url.clone(),
        default_from: config.sparkpost.default_from.clone(),
    })
    .map_err(|e| anyhow::anyhow!("Can't initialize SparkPost sender: {}", e))?;

    tracing::info!("🗂️ Initializing config store client");
    let store = ConfigStore::new(&config.proxeus.url)
        .map_err(|e| anyhow::anyhow!("Can't initialize config store client: {}", e))?;

    Ok(AppState {
        store,
        mailer: Arc::new(mailer),
    })
}

/// Start the HTTP server with the given configuration
///
/// Registers the node with the orchestrator in the background and serves until
/// Ctrl-C or SIGTERM.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("#######################################################");
    tracing::info!("# STARTING NODE - {}", config.server.service_name);
    tracing::info!("# listening on {}", config.server.public_url);
    tracing::info!("# connecting to {}", config.proxeus.url);
    tracing::info!("#######################################################");

    let state = build_state(&config)?;
    let verifier = Arc::new(JwtVerifier::new(&config.server.jwt_secret));
    let app = create_app(state, verifier);

    // Announce the node; keeps retrying until the orchestrator is reachable
    let registration = Registration::new(
        &config.server.service_name,
        &config.server.public_url,
        &config.server.jwt_secret,
    );
    tokio::spawn(register_with_retry(
        config.proxeus.url.clone(),
        registration,
        config.proxeus.register_retry_interval(),
    ));

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}

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

    tracing::info!("Shutdown signal received. Preparing graceful exit...");
}
