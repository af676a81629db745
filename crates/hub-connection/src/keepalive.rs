//! Keepalive pump: periodic liveness polls against a connected hub.
//!
//! Purely diagnostic. Offline detection comes from the transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::session::HubSession;

/// Counts a running pump for as long as it is alive.
struct PumpGuard(Arc<AtomicUsize>);

impl PumpGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(active)
    }
}

impl Drop for PumpGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Polls the current activity every `period` until cancelled.
pub(crate) async fn keepalive_pump(
    session: Arc<dyn HubSession>,
    period: Duration,
    cancel: CancellationToken,
    active: Arc<AtomicUsize>,
) {
    let _guard = PumpGuard::new(active);
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // Skip immediate first tick.

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let poll = tokio::select! {
                    _ = cancel.cancelled() => break,
                    poll = session.current_activity_id() => poll,
                };
                match poll {
                    Ok(id) => debug!(
                        target: "harmony_bridge::keepalive",
                        activity = %id,
                        "keep-alive: current activity"
                    ),
                    Err(e) => debug!(
                        target: "harmony_bridge::keepalive",
                        error = %e,
                        "keep-alive poll failed"
                    ),
                }
            }
        }
    }
}
