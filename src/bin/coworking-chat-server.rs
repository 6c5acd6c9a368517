// ABOUTME: HTTP server binary for the coworking chat server
// ABOUTME: Loads configuration, migrates the database and serves the REST API until interrupted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! # Coworking Chat Server
//!
//! ```bash
//! # Serve with settings from the environment
//! LLM_API_KEY=sk-... cargo run --bin coworking-chat-server
//!
//! # Override port and database
//! cargo run --bin coworking-chat-server -- \
//!     --port 9000 --database-url sqlite:./data/dev.db?mode=rwc
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use coworking_chat_server::config::ServerConfig;
use coworking_chat_server::database::Database;
use coworking_chat_server::llm::{LlmProvider, OpenAiProvider};
use coworking_chat_server::logging::init_logging;
use coworking_chat_server::resources::ServerResources;
use coworking_chat_server::routes::create_router;
use coworking_chat_server::services::{Clock, SystemClock};

#[derive(Parser)]
#[command(
    name = "coworking-chat-server",
    version,
    about = "Coworking chatbot HTTP server",
    long_about = "Serves the chatbot, conversation store and room administration endpoints"
)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "HTTP_PORT")]
    port: Option<u16>,

    /// `SQLite` database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    init_logging(&config.logging)?;
    info!("Starting coworking chat server: {}", config.summary());

    let database = Database::new(&config.database_url)
        .await
        .context("Failed to open database")?;
    let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::new(config.llm.clone())?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let port = config.http_port;
    let resources = Arc::new(ServerResources::new(database, provider, clock, config));
    let router = create_router(&resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Transport error")?;

    info!("Coworking chat server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
