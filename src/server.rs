/// Server setup and initialization
///
/// Wires together all components: workflow API client, session manager and HTTP routes.
/// Provides the main application factory function for creating the Axum app.

use crate::{
    api::{create_palette_routes, create_session_routes, create_workflow_routes, AppState},
    client::WorkflowApiClient,
    config::Config,
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application with all routes
///
/// Connects the studio to the configured workflow API and builds the router around it.
pub fn create_app(config: Config) -> Result<Router> {
    tracing::info!(
        "🔗 Using workflow API at {} (deployment: {})",
        config.api.base_url,
        config.api.deployment_id
    );
    if config.api.token.is_none() {
        tracing::warn!("⚠️ STUDIO_API_TOKEN is not set, requests go out unauthenticated");
    }
    let backend = Arc::new(WorkflowApiClient::new(&config.api));

    tracing::info!("🏗️ Creating application state (history limit: {})", config.editor.history_limit);
    let state = AppState::new(config, backend);

    let app = build_router(state);
    tracing::info!("✅ Application initialized successfully");
    Ok(app)
}

/// Router over an existing state; tests pass a state backed by a fake workflow API
pub fn build_router(state: AppState) -> Router {
    tracing::info!("📡 Creating HTTP router with all endpoints");
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Node palette
        .merge(create_palette_routes())
        // Editing sessions
        .merge(create_session_routes())
        // Stored workflows and executions
        .merge(create_workflow_routes())
        .with_state(state)
}

/// Start the HTTP server with the given configuration
///
/// Creates the application and starts the Axum server on the configured address and port.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting workflow studio...");

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let app = create_app(config)?;

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}
