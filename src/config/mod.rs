/// Configuration management for workflow-studio
///
/// Handles server binding, the external workflow API connection and editor limits.

use crate::workflow::history::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Workflow API the studio saves to
    pub api: ApiConfig,
    /// Editing session settings
    pub editor: EditorConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// External workflow API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL without trailing slash (e.g., "https://api.example.com/v1")
    pub base_url: String,
    /// Deployment whose workflows are edited
    pub deployment_id: String,
    /// Optional bearer token sent with every request
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Undo steps kept per session
    pub history_limit: usize,
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("STUDIO_HOST", "0.0.0.0"),
                port: env_or("STUDIO_PORT", "3004").parse().unwrap_or(3004),
            },
            api: ApiConfig {
                base_url: env_or("STUDIO_API_BASE_URL", "http://localhost:8080")
                    .trim_end_matches('/')
                    .to_string(),
                deployment_id: env_or("STUDIO_DEPLOYMENT_ID", "default"),
                token: std::env::var("STUDIO_API_TOKEN").ok().filter(|t| !t.is_empty()),
            },
            editor: EditorConfig {
                history_limit: std::env::var("STUDIO_HISTORY_LIMIT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_HISTORY_LIMIT),
            },
        }
    }
}
