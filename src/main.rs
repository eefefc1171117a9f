//! Google Workspace MCP Server
//!
//! Serves Gmail, Calendar and Drive tools to MCP clients over stdio.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use gg_workspace_mcp::config::Config;
use gg_workspace_mcp::error::Result;
use gg_workspace_mcp::google::auth::{start_auth_portal, Authenticator};
use gg_workspace_mcp::google::services::ServiceClientFactory;
use gg_workspace_mcp::mcp::registry::ToolRegistry;
use gg_workspace_mcp::mcp::server::McpServer;
use gg_workspace_mcp::mcp::tools::ToolHandler;

/// Google Workspace MCP Server
#[derive(Parser)]
#[command(name = "gg-workspace-mcp")]
#[command(author, version, about = "Google Workspace MCP Server - Gmail, Calendar and Drive tools over MCP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize the Google account in the foreground, then exit
    Auth,
}

#[tokio::main]
async fn main() {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Some(Commands::Auth) => run_auth().await,
        None => run_server().await,
    };

    if let Err(e) = outcome {
        eprintln!("Fatal error in main(): {}", e);
        std::process::exit(1);
    }
}

async fn run_auth() -> Result<()> {
    let config = Config::new()?;
    let authenticator = Arc::new(Authenticator::new(config).await?);
    authenticator.authenticate_interactive().await?;
    eprintln!("Authentication completed successfully!");
    Ok(())
}

async fn run_server() -> Result<()> {
    let config = Config::new()?;

    let authenticator = Arc::new(Authenticator::new(config.clone()).await?);
    if !authenticator.is_authenticated().await {
        eprintln!(
            "Not authorized yet. Open {} to connect your Google account.",
            config.portal_url()
        );
    }
    start_auth_portal(Arc::clone(&authenticator));

    let registry = Arc::new(ToolRegistry::new(&config.time_zone));
    let tool_handler = ToolHandler::new(
        registry,
        authenticator,
        ServiceClientFactory::new(config.endpoints.clone()),
    );

    let server = Arc::new(McpServer::new(Arc::new(tool_handler)));

    eprintln!("Google Workspace MCP server running on stdio");
    server.run_stdio().await
}
