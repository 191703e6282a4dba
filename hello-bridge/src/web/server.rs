//! Edge server loop with fail-fast shutdown.

use std::future::{Future, IntoFuture};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::handlers::{router, AppState};
use crate::error::BridgeError;
use crate::queue::PUBLISH_TIMEOUT;

/// Time in-flight requests get to finish once a publish has failed.
pub const DRAIN_TIMEOUT: Duration = PUBLISH_TIMEOUT;

/// Serve the edge router until `shutdown` resolves or a publish fails.
///
/// A publish failure stops accepting connections, lets in-flight responses
/// (including the failing request's 500) finish for at most
/// [`DRAIN_TIMEOUT`], and returns the failure so the process exits with its
/// code.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    mut fatal: mpsc::Receiver<BridgeError>,
    shutdown: F,
) -> Result<(), BridgeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (tripped_tx, mut tripped) = oneshot::channel();

    let stop = async move {
        tokio::select! {
            _ = shutdown => info!("web_server_shutting_down"),
            Some(e) = fatal.recv() => {
                error!(error = %e, "web_server_stopping_on_publish_failure");
                let _ = tripped_tx.send(e);
            }
        }
    };

    let server = axum::serve(listener, router(state))
        .with_graceful_shutdown(stop)
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        Ok(e) = &mut tripped => {
            if tokio::time::timeout(DRAIN_TIMEOUT, &mut server).await.is_err() {
                warn!(timeout_ms = DRAIN_TIMEOUT.as_millis() as u64, "web_server_drain_timed_out");
            }
            return Err(e);
        }
    }

    // The server may have finished in the same poll that delivered the failure.
    match tripped.try_recv() {
        Ok(e) => Err(e),
        Err(_) => Ok(()),
    }
}
