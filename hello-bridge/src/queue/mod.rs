//! Queue module for RabbitMQ operations.
//!
//! This module provides:
//! - A broker session (connection plus channel) shared by all binaries
//! - A publisher handle that serializes publishes through one task
//! - The queue constants and message type
//!
//! ## Architecture
//!
//! ```text
//! HTTP client → Edge → hello queue → Worker (log)
//!             Publisher ↗
//! ```

pub mod publisher;
pub mod session;
pub mod types;

pub use publisher::{PublishRequest, Publisher};
pub use session::Session;
pub use types::{Message, CONTENT_TYPE, HELLO_PAYLOAD, PUBLISH_TIMEOUT, QUEUE_NAME};
