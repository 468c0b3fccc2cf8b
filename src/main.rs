/// Workflow Studio
///
/// Main entry point for the studio server. Loads configuration from the environment and
/// starts the HTTP server.

use workflow_studio::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Node palette at /api/palette
/// - Editing sessions at /api/sessions/*
/// - Stored workflows and executions at /api/workflows/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3004 and a local workflow API)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
