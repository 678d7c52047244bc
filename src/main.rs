use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use datalens::agent::AgentClient;
use datalens::cli::Cli;
use datalens::config::Config;
use datalens::server::{build_router, AppState};
use datalens::session::SessionRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "datalens=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let cfg = Config::load();

    let agent = AgentClient::from_config(&cfg)?;
    let state = AppState::new(cfg, agent, SessionRegistry::new());
    let app = build_router(state, &cli.cors_origin);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    info!("Starting DataLens backend on {}", addr);
    info!("  POST /api/upload - stage a dataset and bind a session");
    info!("  POST /api/chat   - run an analysis query against a session");
    info!("  GET  /health     - health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
