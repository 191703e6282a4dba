//! Edge web server module.
//!
//! This module provides a thin web server that:
//! - Accepts any method on `/api` and `/graphql`
//! - Publishes the raw request body to the `hello` queue
//! - Echoes the same bytes back to the caller
//!
//! A failed publish is fatal for the whole process; see [`serve`].

pub mod handlers;
pub mod server;

pub use handlers::{forward, health, router, AppState, HealthResponse};
pub use server::{serve, DRAIN_TIMEOUT};
