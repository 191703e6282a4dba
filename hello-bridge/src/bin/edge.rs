//! Bridge Edge - HTTP server that forwards request bodies to RabbitMQ.
//!
//! `/api` and `/graphql` accept any method. The request body is published
//! to the `hello` queue and echoed back as the response body.
//!
//! A publish failure stops the server and exits the process with code -7.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};

use bridge::web::{self, AppState};
use bridge::{exit_code, logging, shutdown, Config, Publisher, Session};

#[tokio::main]
async fn main() {
    logging::init();

    info!("edge_starting");

    if let Err(e) = run().await {
        let code = exit_code(&e);
        error!(error = %format!("{e:#}"), exit_code = code, "edge_failed");
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    info!(port = config.port, queue_uri = %config.queue_uri, "config_loaded");

    let session = Session::open(&config)
        .await
        .context("Failed to set up broker session")?;

    // One task owns publishing; handlers reach it through the handle.
    let publisher = Publisher::spawn(session.channel().clone());
    let (state, fatal) = AppState::new(publisher);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    let outcome = web::serve(listener, state, fatal, shutdown::signal()).await;

    // Bounded, so a broker that stopped answering cannot keep the process alive.
    session.close().await;
    outcome.context("Edge service stopped")?;

    info!("web_server_shutdown_complete");
    Ok(())
}
