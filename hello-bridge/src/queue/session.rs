//! Broker session: one connection and one channel owned by the process.
//!
//! Every binary bootstraps through [`Session::connect`] followed by
//! [`Session::declare_queue`], so the queue exists regardless of which
//! process starts first.

use std::future::Future;
use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};
use lapin::{
    options::{BasicConsumeOptions, BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tracing::{info, warn};

use super::types::{Message, CONTENT_TYPE, PUBLISH_TIMEOUT, QUEUE_NAME};
use crate::config::Config;
use crate::error::BridgeError;

/// How long closing a session may take before it is abandoned.
pub const CLOSE_TIMEOUT: Duration = PUBLISH_TIMEOUT;

/// An open connection to the broker plus the channel used on it.
pub struct Session {
    connection: Connection,
    channel: Channel,
}

impl Session {
    /// Dial the broker and open a channel in publisher-confirm mode.
    pub async fn connect(config: &Config) -> Result<Self, BridgeError> {
        let uri = config.amqp_uri()?;

        info!(queue_uri = %config.queue_uri, "rabbitmq_connecting");

        let connection = Connection::connect(&uri, ConnectionProperties::default())
            .await
            .map_err(BridgeError::Connect)?;

        info!("rabbitmq_connected");

        let channel = connection
            .create_channel()
            .await
            .map_err(BridgeError::Channel)?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(BridgeError::Channel)?;

        info!(channel_id = channel.id(), "rabbitmq_channel_created");

        Ok(Self { connection, channel })
    }

    /// Connect and declare the queue: the bootstrap every binary shares.
    pub async fn open(config: &Config) -> Result<Self, BridgeError> {
        let session = Self::connect(config).await?;
        session.declare_queue().await?;
        Ok(session)
    }

    /// The channel, for handing to a [`Publisher`](super::Publisher) task.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Declare the `hello` queue (idempotent operation).
    ///
    /// Non-durable, not auto-deleted, not exclusive. Repeating the
    /// declaration with the same parameters leaves the queue untouched.
    pub async fn declare_queue(&self) -> Result<(), BridgeError> {
        let queue = self
            .channel
            .queue_declare(
                QUEUE_NAME,
                QueueDeclareOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(BridgeError::QueueDeclare)?;

        info!(
            queue = QUEUE_NAME,
            message_count = queue.message_count(),
            consumer_count = queue.consumer_count(),
            "rabbitmq_queue_declared"
        );

        Ok(())
    }

    /// Publish `body` to the `hello` queue and wait for the broker.
    pub async fn publish(&self, body: &[u8]) -> Result<(), BridgeError> {
        publish_to(&self.channel, body).await
    }

    /// Subscribe to the `hello` queue with automatic acknowledgment.
    ///
    /// Messages count as delivered as soon as the broker sends them; nothing
    /// is redelivered if this process dies.
    pub async fn consume(
        &self,
        consumer_tag: &str,
    ) -> Result<BoxStream<'static, Result<Message, lapin::Error>>, BridgeError> {
        let consumer = self
            .channel
            .basic_consume(
                QUEUE_NAME,
                consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(BridgeError::Consume)?;

        info!(queue = QUEUE_NAME, consumer_tag = consumer_tag, "rabbitmq_consumer_started");

        Ok(consumer.map(|delivery| delivery.map(Message::from)).boxed())
    }

    /// Close the channel and then the connection.
    ///
    /// An unresponsive broker is given [`CLOSE_TIMEOUT`] to answer, after
    /// which the session is dropped as is. Returns whether the close finished.
    pub async fn close(self) -> bool {
        let Session { connection, channel } = self;

        close_within(
            CLOSE_TIMEOUT,
            channel.close(200, "Normal shutdown"),
            connection.close(200, "Normal shutdown"),
        )
        .await
    }
}

async fn close_within<C, K>(deadline: Duration, channel: C, connection: K) -> bool
where
    C: Future<Output = lapin::Result<()>>,
    K: Future<Output = lapin::Result<()>>,
{
    let close = async {
        if let Err(e) = channel.await {
            warn!(error = %e, "rabbitmq_channel_close_error");
        }

        if let Err(e) = connection.await {
            warn!(error = %e, "rabbitmq_connection_close_error");
        }
    };

    match tokio::time::timeout(deadline, close).await {
        Ok(()) => {
            info!("rabbitmq_session_closed");
            true
        }
        Err(_) => {
            warn!(timeout_ms = deadline.as_millis() as u64, "rabbitmq_session_close_timed_out");
            false
        }
    }
}

/// Publish to the default exchange with the queue name as routing key.
///
/// Bounded by [`PUBLISH_TIMEOUT`], covering both the send and the broker's
/// confirmation. A negative acknowledgment is a publish failure.
pub(crate) async fn publish_to(channel: &Channel, body: &[u8]) -> Result<(), BridgeError> {
    let publish = async {
        let confirmation = channel
            .basic_publish(
                "",
                QUEUE_NAME,
                BasicPublishOptions::default(),
                body,
                BasicProperties::default().with_content_type(CONTENT_TYPE.into()),
            )
            .await
            .map_err(BridgeError::Publish)?
            .await
            .map_err(BridgeError::Publish)?;

        if confirmation.is_nack() {
            return Err(BridgeError::PublishNacked);
        }

        Ok::<(), BridgeError>(())
    };

    match tokio::time::timeout(PUBLISH_TIMEOUT, publish).await {
        Ok(result) => result,
        Err(_) => Err(BridgeError::PublishTimeout(PUBLISH_TIMEOUT)),
    }
}
