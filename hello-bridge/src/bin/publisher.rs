//! Bridge Publisher - one-shot RabbitMQ publisher.
//!
//! Connects, declares the `hello` queue, publishes `Hello World!` once and
//! exits. Every failure exits with its own code.

use anyhow::{Context, Result};
use tracing::{error, info};

use bridge::{exit_code, logging, Config, Session, HELLO_PAYLOAD, QUEUE_NAME};

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        let code = exit_code(&e);
        error!(error = %format!("{e:#}"), exit_code = code, "publisher_failed");
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let session = Session::open(&config)
        .await
        .context("Failed to set up broker session")?;

    session
        .publish(HELLO_PAYLOAD)
        .await
        .context("Failed to publish message")?;

    info!(
        queue = QUEUE_NAME,
        body = %String::from_utf8_lossy(HELLO_PAYLOAD),
        "publisher_message_sent"
    );

    session.close().await;
    Ok(())
}
