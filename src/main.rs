use anyhow::Result;
use std::sync::Arc;

use taiga_mcp::auth::AuthManager;
use taiga_mcp::config::Config;
use taiga_mcp::mcp::{McpServer, ToolContext};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let config = Config::load()?;
    config.validate()?;

    // stdout carries the protocol, so logs go to stderr
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Taiga MCP server v{} starting...", env!("CARGO_PKG_VERSION"));
    tracing::info!(api_url = %config.api_url, "Configured Taiga API");
    tracing::debug!(
        token_expiration = config.token_expiration,
        http_timeout = config.http_request_timeout,
        "Session settings"
    );

    let auth_manager = Arc::new(AuthManager::new(&config)?);

    // Log in eagerly when credentials are configured; failures only warn
    if config.has_default_credentials() {
        match auth_manager.get_token().await {
            Ok(_) => tracing::info!(username = %config.username, "Authentication successful"),
            Err(e) => {
                tracing::error!("Authentication failed: {}", e);
                tracing::warn!("Server will start but tools will fail until valid credentials are supplied");
            }
        }
    } else {
        tracing::info!("No default credentials configured; call the authenticate tool first");
    }

    let server = McpServer::new(ToolContext::new(Arc::new(config), auth_manager));
    server.serve_stdio().await?;

    tracing::info!("Taiga MCP server shut down");
    Ok(())
}
