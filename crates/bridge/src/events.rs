//! Logs connection events for operators.

use harmony_bridge_hub_connection::{ConnectionEvent, ConnectionState};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Drains `events` until the manager drops its sender.
pub async fn log_events(mut events: mpsc::Receiver<ConnectionEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ConnectionEvent::StateChanged { hub, state } => {
                let hub = hub.map(|h| h.name).unwrap_or_default();
                match state {
                    ConnectionState::Connected => info!(%hub, "hub connected"),
                    ConnectionState::Reconnecting => warn!(%hub, "hub offline, reconnecting"),
                    ConnectionState::Connecting { attempt } => {
                        debug!(%hub, attempt, "connecting to hub")
                    }
                    ConnectionState::Unconfigured => info!("no hub configured"),
                }
            }
            ConnectionEvent::LinkFailed {
                hub,
                attempt,
                error,
            } => {
                debug!(hub = %hub.name, attempt, %error, "hub link failed");
            }
            ConnectionEvent::EndpointsSynced {
                hub,
                created,
                refreshed,
            } => {
                info!(hub = %hub.name, created, refreshed, "activities synced");
            }
            ConnectionEvent::StatusReported { message, is_error } => {
                debug!(%message, is_error, "status reported to host");
            }
        }
    }
    debug!("connection event channel closed");
}
