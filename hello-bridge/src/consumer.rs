//! RabbitMQ consumer module using lapin.
//!
//! This module connects to RabbitMQ, subscribes to the `hello` queue and
//! logs each message body until a shutdown signal arrives.

use std::fmt::Display;
use std::future::Future;

use anyhow::{bail, Context, Result};
use futures::{Stream, StreamExt};
use tracing::{error, info, warn};

use bridge::{shutdown, Config, Message, Session, QUEUE_NAME};

const CONSUMER_TAG: &str = "bridge-worker";

/// Why [`drain`] returned.
#[derive(Debug, PartialEq, Eq)]
pub enum Stopped {
    /// The shutdown future resolved.
    Cancelled,
    /// The broker ended the subscription.
    StreamClosed,
}

/// Run the RabbitMQ consumer.
///
/// This function:
/// 1. Connects to RabbitMQ and declares the queue (idempotent operation)
/// 2. Subscribes with automatic acknowledgment
/// 3. Logs every message until SIGINT/SIGTERM
/// 4. Closes the session
pub async fn run(config: Config) -> Result<()> {
    let session = Session::open(&config)
        .await
        .context("Failed to set up broker session")?;

    let messages = session
        .consume(CONSUMER_TAG)
        .await
        .context("Failed to start consumer")?;

    info!("[*] Waiting for messages. To exit press CTRL+C");
    info!("worker_ready");

    let stopped = drain(messages, shutdown::signal(), log_message).await;

    info!(reason = ?stopped, "worker_stopping");
    session.close().await;

    if stopped == Stopped::StreamClosed {
        bail!("consumer on queue {QUEUE_NAME} was closed by the broker");
    }

    info!("worker_shutdown_complete");
    Ok(())
}

/// Feed each message to `on_message` until `shutdown` resolves or the
/// stream ends.
///
/// Delivery errors are logged and skipped.
pub async fn drain<S, E, F, H>(messages: S, shutdown: F, mut on_message: H) -> Stopped
where
    S: Stream<Item = Result<Message, E>>,
    E: Display,
    F: Future<Output = ()>,
    H: FnMut(&Message),
{
    tokio::pin!(messages);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => return Stopped::Cancelled,
            next = messages.next() => match next {
                Some(Ok(message)) => on_message(&message),
                Some(Err(e)) => error!(error = %e, "rabbitmq_delivery_error"),
                None => {
                    warn!("rabbitmq_consumer_closed");
                    return Stopped::StreamClosed;
                }
            },
        }
    }
}

fn log_message(message: &Message) {
    info!(
        queue = QUEUE_NAME,
        body = %message.body_lossy(),
        body_length = message.body.len(),
        content_type = message.content_type.as_deref().unwrap_or(""),
        "worker_message_received"
    );
}
