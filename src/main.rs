//! Google Workspace MCP Server
//!
//! Authenticates against Google with OAuth 2.0, then serves Workspace tools
//! to an MCP client over stdio.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use google_workspace_mcp::auth::{AuthenticatedClient, SessionManager};
use google_workspace_mcp::config::{ApiEndpoints, AuthFlow, Config};
use google_workspace_mcp::mcp::McpServer;
use google_workspace_mcp::workspace::WorkspaceClient;

/// Google Workspace MCP Server
#[derive(Parser)]
#[command(name = "google-workspace-mcp")]
#[command(author, version, about = "Google Workspace MCP Server - Gmail, Calendar, Drive and more over the Model Context Protocol")]
struct Cli {
    /// Interactive authorization flow: browser, device or auto
    #[arg(long, global = true)]
    flow: Option<AuthFlow>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize with Google and save the token, then exit
    Auth,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the MCP protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::new().context("failed to load configuration")?;
    if let Some(flow) = cli.flow {
        config.auth_flow = flow;
    }

    let apis = config.apis.clone();
    let session = acquire(config).await;

    match cli.command {
        Some(Commands::Auth) => {
            eprintln!("Authentication completed successfully!");
            Ok(())
        }
        None => run_server(session, apis).await,
    }
}

/// Acquire the session or exit with the failure reason
async fn acquire(config: Config) -> AuthenticatedClient {
    tracing::info!("Starting Google Workspace MCP Server (auth flow: {})", config.auth_flow);

    match SessionManager::new(config).acquire_session().await {
        Ok(session) => {
            eprintln!("Authentication successful!");
            session
        }
        Err(e) => {
            eprintln!("Authentication failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_server(session: AuthenticatedClient, apis: ApiEndpoints) -> anyhow::Result<()> {
    let workspace = Arc::new(WorkspaceClient::new(Arc::new(session), apis));

    let mut server = McpServer::new(workspace);
    server.run_stdio().await.context("MCP server stopped")
}
