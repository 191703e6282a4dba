//! Error taxonomy shared by the three binaries.
//!
//! Every failure that can end a process maps to a fixed exit code, so the
//! edge service, publisher and worker all terminate the same way.

use std::time::Duration;

use thiserror::Error;

/// Exit code for failures without a dedicated code (`.env` parse errors, bind errors).
pub const EXIT_GENERIC: i32 = 1;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to load .env file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("a queue URI is not available in the environment as \"QUEUE_URI\"")]
    MissingQueueUri,

    #[error("a queue username is not available in the environment as \"QUEUE_USERNAME\"")]
    MissingUsername,

    #[error("a queue password is not available in the environment as \"QUEUE_PASSWORD\"")]
    MissingPassword,

    #[error("invalid broker address {0:?}")]
    InvalidUri(String),

    #[error("failed to connect to the broker: {0}")]
    Connect(#[source] lapin::Error),

    #[error("failed to open a broker channel: {0}")]
    Channel(#[source] lapin::Error),

    #[error("failed to declare queue: {0}")]
    QueueDeclare(#[source] lapin::Error),

    #[error("failed to publish message to queue: {0}")]
    Publish(#[source] lapin::Error),

    #[error("broker rejected the published message")]
    PublishNacked,

    #[error("publish did not complete within {0:?}")]
    PublishTimeout(Duration),

    #[error("publisher task is no longer running")]
    PublisherClosed,

    #[error("failed to create consumer: {0}")]
    Consume(#[source] lapin::Error),

    #[error("web server error: {0}")]
    Serve(#[from] std::io::Error),
}

impl BridgeError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            BridgeError::EnvFile(_) | BridgeError::Serve(_) => EXIT_GENERIC,
            BridgeError::MissingQueueUri => -1,
            BridgeError::MissingUsername => -2,
            BridgeError::MissingPassword => -3,
            BridgeError::InvalidUri(_) | BridgeError::Connect(_) => -4,
            BridgeError::Channel(_) => -5,
            BridgeError::QueueDeclare(_) => -6,
            BridgeError::Publish(_)
            | BridgeError::PublishNacked
            | BridgeError::PublishTimeout(_)
            | BridgeError::PublisherClosed
            | BridgeError::Consume(_) => -7,
        }
    }
}

/// Resolve the exit code for an error surfacing at a binary's `main`.
///
/// Context added with `anyhow::Context` is looked through; errors that are
/// not a [`BridgeError`] exit with [`EXIT_GENERIC`].
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<BridgeError>()
        .map_or(EXIT_GENERIC, BridgeError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_configuration_exit_codes() {
        assert_eq!(BridgeError::MissingQueueUri.exit_code(), -1);
        assert_eq!(BridgeError::MissingUsername.exit_code(), -2);
        assert_eq!(BridgeError::MissingPassword.exit_code(), -3);
    }

    #[test]
    fn test_publish_failures_share_exit_code() {
        assert_eq!(BridgeError::PublishTimeout(Duration::from_secs(5)).exit_code(), -7);
        assert_eq!(BridgeError::PublisherClosed.exit_code(), -7);
        assert_eq!(BridgeError::PublishNacked.exit_code(), -7);
        assert_eq!(BridgeError::InvalidUri("::".to_string()).exit_code(), -4);
    }

    #[test]
    fn test_exit_code_looks_through_context() {
        let err = Err::<(), _>(BridgeError::MissingPassword)
            .context("Failed to load configuration")
            .unwrap_err();
        assert_eq!(exit_code(&err), -3);
    }

    #[test]
    fn test_exit_code_for_foreign_error() {
        let err = anyhow::anyhow!("bind failed");
        assert_eq!(exit_code(&err), EXIT_GENERIC);
    }
}
