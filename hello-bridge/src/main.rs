//! Bridge Worker - RabbitMQ subscriber that logs every message it receives.
//!
//! Messages are consumed from the `hello` queue with automatic
//! acknowledgment. The worker runs until SIGINT or SIGTERM.

mod consumer;

use anyhow::Context;
use tracing::{error, info};

use bridge::{exit_code, logging, Config};

#[tokio::main]
async fn main() {
    logging::init();

    info!("worker_starting");

    if let Err(e) = run().await {
        let code = exit_code(&e);
        error!(error = %format!("{e:#}"), exit_code = code, "worker_failed");
        std::process::exit(code);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    info!(queue_uri = %config.queue_uri, "config_loaded");

    consumer::run(config).await
}
