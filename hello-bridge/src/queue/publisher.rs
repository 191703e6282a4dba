//! Publisher handle that funnels every publish through one task.
//!
//! HTTP handlers run concurrently, but the broker channel is owned by a
//! single task. Handlers send a [`PublishRequest`] over a bounded queue and
//! wait for the reply, so the channel only ever has one writer.

use std::time::Duration;

use lapin::Channel;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use super::session::publish_to;
use super::types::{PUBLISH_TIMEOUT, QUEUE_NAME};
use crate::error::BridgeError;

/// Pending publishes buffered before callers start waiting for capacity.
const REQUEST_BUFFER: usize = 64;

/// A body to publish plus where to send the outcome.
#[derive(Debug)]
pub struct PublishRequest {
    pub body: Vec<u8>,
    pub reply: oneshot::Sender<Result<(), BridgeError>>,
}

/// Cloneable handle to the publishing task.
#[derive(Clone)]
pub struct Publisher {
    requests: mpsc::Sender<PublishRequest>,
    timeout: Duration,
}

impl Publisher {
    /// Create a handle plus the receiving end the owning task reads from.
    pub fn channel() -> (Self, mpsc::Receiver<PublishRequest>) {
        let (requests, receiver) = mpsc::channel(REQUEST_BUFFER);
        let publisher = Self {
            requests,
            timeout: PUBLISH_TIMEOUT,
        };
        (publisher, receiver)
    }

    /// Spawn the task owning `channel` and return a handle to it.
    ///
    /// The task stops once every handle has been dropped.
    pub fn spawn(channel: Channel) -> Self {
        let (publisher, receiver) = Self::channel();
        tokio::spawn(serve(channel, receiver));
        publisher
    }

    /// Publish `body` to the queue.
    ///
    /// The deadline covers waiting for the task as well as the broker, so a
    /// caller never waits longer than [`PUBLISH_TIMEOUT`].
    pub async fn publish(&self, body: Vec<u8>) -> Result<(), BridgeError> {
        let request = async {
            let (reply, outcome) = oneshot::channel();
            self.requests
                .send(PublishRequest { body, reply })
                .await
                .map_err(|_| BridgeError::PublisherClosed)?;
            outcome.await.map_err(|_| BridgeError::PublisherClosed)?
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::PublishTimeout(self.timeout)),
        }
    }
}

/// Drain publish requests onto the broker channel, one at a time.
pub async fn serve(channel: Channel, mut requests: mpsc::Receiver<PublishRequest>) {
    info!(queue = QUEUE_NAME, "publisher_task_started");

    while let Some(PublishRequest { body, reply }) = requests.recv().await {
        let result = publish_to(&channel, &body).await;

        match &result {
            Ok(()) => info!(queue = QUEUE_NAME, body_length = body.len(), "rabbitmq_message_published"),
            Err(e) => error!(queue = QUEUE_NAME, error = %e, "rabbitmq_publish_failed"),
        }

        // The caller may have timed out and gone away.
        let _ = reply.send(result);
    }

    info!("publisher_task_stopped");
}
