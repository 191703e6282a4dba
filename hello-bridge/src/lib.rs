//! hello-bridge - forward HTTP request bodies onto a RabbitMQ queue.
//!
//! This library provides shared modules for the three binaries:
//! - `bridge-edge`: HTTP server publishing request bodies to the queue
//! - `bridge-publisher`: One-shot publisher of a fixed message
//! - `bridge-worker`: Subscriber logging every message it receives
//!
//! ## Architecture
//!
//! ```text
//! HTTP client → Edge → hello queue → Worker (log)
//! ```
//!
//! The binaries never talk to each other; the broker sits between them.

pub mod config;
pub mod error;
pub mod logging;
pub mod queue;
pub mod shutdown;
pub mod web;

// Re-export commonly used types
pub use config::{load_dotenv, Config};
pub use error::{exit_code, BridgeError};
pub use queue::{Message, Publisher, Session, HELLO_PAYLOAD, QUEUE_NAME};
pub use web::AppState;
