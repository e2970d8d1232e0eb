use anyhow::Result;
use clap::Parser;
use rmcp::transport::sse_server::SseServer;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{ServiceExt, transport::stdio};

mod api;
mod auth;
mod cli;
mod client;
mod config;
mod error;
mod logging;
mod markdown;
mod models;
mod pagination;
mod service;
mod tools;

use cli::Cli;
use service::GitLabService;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref())?;

    tracing::info!("Starting gitlab-mcp server");

    let config = config::load_config(&cli).await?;
    let service = GitLabService::new(&config)?;

    match cli.transport.as_str() {
        "stdio" => {
            tracing::info!("Starting gitlab-mcp with stdio transport");
            let running = service.serve(stdio()).await.inspect_err(|e| {
                tracing::error!("Serving error: {:?}", e);
            })?;
            running.waiting().await?;
        }
        "sse" => {
            tracing::info!(
                "Starting gitlab-mcp with SSE transport at {}",
                cli.bind_address
            );
            let ct = SseServer::serve(cli.bind_address.parse()?)
                .await?
                .with_service(move || service.clone());

            tokio::signal::ctrl_c().await?;
            ct.cancel();
        }
        "streamable-http" => {
            let bind_address = cli.bind_address.clone();
            tracing::info!(
                "Starting gitlab-mcp with streamable-http transport at {}/mcp",
                bind_address
            );

            let service = StreamableHttpService::new(
                move || Ok(service.clone()),
                LocalSessionManager::default().into(),
                Default::default(),
            );

            let router = axum::Router::new().nest_service("/mcp", service);

            axum::serve(tokio::net::TcpListener::bind(bind_address).await?, router)
                .with_graceful_shutdown(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for Ctrl+C: {e}");
                    }
                    tracing::info!("Received Ctrl+C, shutting down gitlab-mcp server...");
                })
                .await?;
        }
        other => anyhow::bail!("Unsupported transport {other}"),
    }

    Ok(())
}
