//! Link driver: connects to one hub, serves the session, reconnects.
//!
//! One driver task runs per configured hub. It owns the connect/retry loop,
//! feeds state digests to the registry in arrival order and replaces the
//! session whenever the transport reports the hub offline.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use harmony_bridge_protocol::constants::connected_status;
use harmony_bridge_protocol::{Activity, ActivityId, Hub};
use tokio::sync::{Mutex, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::host::ControlHost;
use crate::keepalive::keepalive_pump;
use crate::registry::ActivityRegistry;
use crate::session::{
    HubConnector, HubLink, HubSession, SessionError, SessionEvent, SessionSlot, spawn_end,
};
use crate::types::{ConnectionEvent, ConnectionState, LinkError, ManagerConfig};

/// Connection state tagged with the context that produced it.
///
/// A driver may only update the state while its epoch is current, so a
/// driver that outlives a target switch cannot clobber the new hub's state.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LinkState {
    pub(crate) epoch: u64,
    pub(crate) state: ConnectionState,
}

/// Shared state handed to the driver task. Avoids threading ten separate
/// parameters through the reconnect loop.
#[derive(Clone)]
pub(crate) struct LinkContext {
    pub(crate) epoch: u64,
    pub(crate) hub: Hub,
    pub(crate) connector: Arc<dyn HubConnector>,
    pub(crate) host: Arc<dyn ControlHost>,
    pub(crate) registry: Arc<Mutex<ActivityRegistry>>,
    pub(crate) session: SessionSlot,
    pub(crate) state: Arc<watch::Sender<LinkState>>,
    pub(crate) events_tx: mpsc::Sender<ConnectionEvent>,
    pub(crate) config: ManagerConfig,
    pub(crate) keepalives: Arc<AtomicUsize>,
}

impl LinkContext {
    /// Updates the connection state if this context is still current.
    fn set_state(&self, state: ConnectionState) {
        let applied = self.state.send_if_modified(|current| {
            if current.epoch != self.epoch || current.state == state {
                return false;
            }
            current.state = state.clone();
            true
        });
        if applied {
            self.emit(ConnectionEvent::StateChanged {
                hub: Some(self.hub.clone()),
                state,
            });
        }
    }

    /// Shows `message` on the host if this context is still current.
    ///
    /// The host is called under the state lock so a newer context cannot
    /// publish in between the epoch check and the status update.
    fn report_status(&self, message: &str, is_error: bool) {
        let mut reported = false;
        self.state.send_if_modified(|current| {
            if current.epoch == self.epoch {
                self.host.set_status(message, is_error);
                reported = true;
            }
            false
        });
        if reported {
            self.emit(ConnectionEvent::StatusReported {
                message: message.to_string(),
                is_error,
            });
        }
    }

    fn emit(&self, event: ConnectionEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            trace!("dropping connection event: {e}");
        }
    }
}

enum LinkExit {
    Cancelled,
    Failed(LinkError),
}

/// Connect/serve/reconnect loop for one hub. Runs until `cancel` fires.
///
/// Every failure is treated as transient and retried against the same hub
/// with the delay from the configured [`ReconnectConfig`](crate::ReconnectConfig).
pub(crate) async fn run_link(ctx: LinkContext, cancel: CancellationToken) {
    let mut generation: u64 = 0;
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);
        ctx.set_state(ConnectionState::Connecting { attempt });
        info!(
            hub = %ctx.hub.name,
            address = %ctx.hub.address,
            attempt,
            "connecting to hub"
        );

        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = ctx.connector.connect(&ctx.hub) => result,
        };

        let error = match connected {
            Ok(link) => {
                generation += 1;
                match serve_session(&ctx, link, generation, &cancel).await {
                    LinkExit::Cancelled => break,
                    LinkExit::Failed(e) => e,
                }
            }
            Err(source) => LinkError::Connect {
                address: ctx.hub.address.clone(),
                source,
            },
        };

        if cancel.is_cancelled() {
            break;
        }

        ctx.emit(ConnectionEvent::LinkFailed {
            hub: ctx.hub.clone(),
            attempt,
            error: error.to_string(),
        });

        if matches!(error, LinkError::Offline) {
            info!(hub = %ctx.hub.name, "hub went offline, reconnecting");
            attempt = 0;
            ctx.set_state(ConnectionState::Reconnecting);
        } else {
            warn!(
                hub = %ctx.hub.name,
                attempt,
                error = %error,
                "hub setup failed, retrying"
            );
        }

        let delay = ctx.config.reconnect.delay_for_attempt(attempt.max(1));
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    debug!(hub = %ctx.hub.name, "hub link driver stopped");
}

/// Enumerates activities on a fresh session, then forwards its digests to
/// the registry until the hub goes offline or the link is cancelled.
async fn serve_session(
    ctx: &LinkContext,
    link: HubLink,
    generation: u64,
    cancel: &CancellationToken,
) -> LinkExit {
    let HubLink {
        session,
        mut events,
    } = link;
    debug!(hub = %ctx.hub.name, generation, "session established, retrieving activities");

    let enumerated = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            spawn_end(session.clone());
            return LinkExit::Cancelled;
        }
        result = enumerate(session.as_ref()) => result,
    };
    let (current, activities) = match enumerated {
        Ok(found) => found,
        Err(e) => {
            spawn_end(session);
            return LinkExit::Failed(LinkError::Enumeration(e));
        }
    };

    let summary = {
        let mut registry = ctx.registry.lock().await;
        if cancel.is_cancelled() {
            spawn_end(session);
            return LinkExit::Cancelled;
        }
        ctx.session.install(generation, session.clone());
        registry.sync(&current, &activities)
    };

    let session_cancel = cancel.child_token();
    tokio::spawn(keepalive_pump(
        session.clone(),
        ctx.config.keepalive_period,
        session_cancel.clone(),
        ctx.keepalives.clone(),
    ));

    ctx.emit(ConnectionEvent::EndpointsSynced {
        hub: ctx.hub.clone(),
        created: summary.created,
        refreshed: summary.refreshed,
    });
    ctx.set_state(ConnectionState::Connected);
    ctx.report_status(&connected_status(&ctx.hub.name), false);
    info!(
        hub = %ctx.hub.name,
        current = %current,
        created = summary.created,
        refreshed = summary.refreshed,
        "connected to hub"
    );

    let exit = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break LinkExit::Cancelled,
            event = events.recv() => match event {
                Some(SessionEvent::StateDigest(digest)) => {
                    debug!(
                        activity = %digest.activity_id,
                        phase = ?digest.activity_status,
                        "state digest"
                    );
                    let mut registry = ctx.registry.lock().await;
                    if cancel.is_cancelled() {
                        break LinkExit::Cancelled;
                    }
                    registry.apply_digest(&digest);
                }
                Some(SessionEvent::Offline) | None => {
                    break LinkExit::Failed(LinkError::Offline);
                }
            }
        }
    };

    session_cancel.cancel();
    if let Some(session) = ctx.session.take_if(generation) {
        spawn_end(session);
    }
    exit
}

/// Fetches the current activity and the activity list, once per connect.
async fn enumerate(session: &dyn HubSession) -> Result<(ActivityId, Vec<Activity>), SessionError> {
    let current = session.current_activity_id().await?;
    debug!(current = %current, "retrieving activities");
    let activities = session.activities().await?;
    Ok((current, activities))
}
