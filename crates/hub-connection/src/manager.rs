//! Connection manager owning the session lifecycle of the configured hub.
//!
//! Each configured hub gets a [`ConnectionContext`] that exclusively owns
//! the link driver task, the session slot, the activity registry and,
//! through the driver, the keepalive pump. Switching the target replaces
//! the whole context.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use harmony_bridge_protocol::constants::NOT_CONFIGURED_STATUS;
use harmony_bridge_protocol::{ActivityId, Hub};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::endpoint::{ControlEndpoint, turn_off};
use crate::host::ControlHost;
use crate::reconnection::{LinkContext, LinkState, run_link};
use crate::registry::ActivityRegistry;
use crate::session::{HubConnector, SessionSlot, spawn_end};
use crate::types::{CommandError, ConnectionEvent, ConnectionState, ManagerConfig};

/// Everything tied to one configured hub.
pub(crate) struct ConnectionContext {
    pub(crate) hub: Hub,
    cancel: CancellationToken,
    session: SessionSlot,
    registry: Arc<Mutex<ActivityRegistry>>,
    _driver: JoinHandle<()>,
}

impl ConnectionContext {
    /// Stops the driver and keepalive and sends `end` to the live session
    /// without waiting for it. Endpoints already registered with the host
    /// are left as they are.
    fn teardown(&self) {
        self.cancel.cancel();
        if let Some(session) = self.session.take() {
            spawn_end(session);
        }
    }
}

impl Drop for ConnectionContext {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Connection manager for the single configured hub.
pub struct ConnectionManager {
    connector: Arc<dyn HubConnector>,
    host: Arc<dyn ControlHost>,
    config: ManagerConfig,
    context: Mutex<Option<ConnectionContext>>,
    state: Arc<watch::Sender<LinkState>>,
    state_rx: watch::Receiver<LinkState>,
    events_tx: mpsc::Sender<ConnectionEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<ConnectionEvent>>>,
    keepalives: Arc<AtomicUsize>,
    epoch: AtomicU64,
}

impl ConnectionManager {
    /// Creates a manager with the default configuration: immediate retry
    /// and a 30 second keepalive.
    pub fn new(connector: Arc<dyn HubConnector>, host: Arc<dyn ControlHost>) -> Self {
        Self::with_config(connector, host, ManagerConfig::default())
    }

    pub fn with_config(
        connector: Arc<dyn HubConnector>,
        host: Arc<dyn ControlHost>,
        config: ManagerConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);
        let (state, state_rx) = watch::channel(LinkState {
            epoch: 0,
            state: ConnectionState::Unconfigured,
        });

        Self {
            connector,
            host,
            config,
            context: Mutex::new(None),
            state: Arc::new(state),
            state_rx,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            keepalives: Arc::new(AtomicUsize::new(0)),
            epoch: AtomicU64::new(0),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub async fn take_events(&self) -> Option<mpsc::Receiver<ConnectionEvent>> {
        self.events_rx.lock().await.take()
    }

    /// Returns the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().state.clone()
    }

    /// Waits until the connection state satisfies `pred` and returns it.
    pub async fn wait_for(&self, pred: impl Fn(&ConnectionState) -> bool) -> ConnectionState {
        let mut rx = self.state_rx.clone();
        match rx.wait_for(|link| pred(&link.state)).await {
            Ok(link) => link.state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Returns the configured hub, if any.
    pub async fn target(&self) -> Option<Hub> {
        self.context.lock().await.as_ref().map(|ctx| ctx.hub.clone())
    }

    /// Points the manager at `hub`.
    ///
    /// A different hub tears down the current context and starts connecting
    /// to the new one; the same hub again is a no-op. `None`, or a hub
    /// without name or address, leaves the manager unconfigured.
    pub async fn set_target(&self, hub: Option<Hub>) {
        let hub = hub.filter(Hub::is_configured);
        let mut context = self.context.lock().await;

        if let (Some(new), Some(current)) = (&hub, context.as_ref())
            && current.hub == *new
        {
            debug!(hub = %new.name, "hub target unchanged");
            return;
        }

        if let Some(old) = context.take() {
            info!(hub = %old.hub.name, address = %old.hub.address, "tearing down hub connection");
            old.teardown();
        }

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(hub) = hub else {
            info!("no hub configured");
            self.publish_with_status(
                epoch,
                None,
                ConnectionState::Unconfigured,
                Some(NOT_CONFIGURED_STATUS),
            );
            return;
        };

        info!(hub = %hub.name, address = %hub.address, "setting up hub connection");
        self.publish(
            epoch,
            Some(hub.clone()),
            ConnectionState::Connecting { attempt: 1 },
        );
        *context = Some(self.start_context(epoch, hub));
    }

    /// Starts `activity` on the hub.
    pub async fn activate(&self, activity: &ActivityId) -> Result<(), CommandError> {
        let registry = self.registry().await.ok_or(CommandError::NotConnected)?;
        let commands = registry
            .lock()
            .await
            .commands(activity)
            .ok_or_else(|| CommandError::UnknownActivity(activity.clone()))?;
        commands.activate().await
    }

    /// Powers the hub off.
    pub async fn standby(&self) -> Result<(), CommandError> {
        let session = self
            .context
            .lock()
            .await
            .as_ref()
            .map(|ctx| ctx.session.clone())
            .ok_or(CommandError::NotConnected)?;
        turn_off(&session).await
    }

    /// Returns the endpoints of the configured hub.
    pub async fn endpoints(&self) -> Vec<ControlEndpoint> {
        match self.registry().await {
            Some(registry) => registry.lock().await.endpoints(),
            None => Vec::new(),
        }
    }

    /// Returns the number of running keepalive pumps.
    pub fn active_keepalives(&self) -> usize {
        self.keepalives.load(Ordering::SeqCst)
    }

    /// Tears down the current hub connection.
    pub async fn shutdown(&self) {
        let mut context = self.context.lock().await;
        if let Some(old) = context.take() {
            old.teardown();
        }
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish(epoch, None, ConnectionState::Unconfigured);
        info!("connection manager shut down");
    }

    async fn registry(&self) -> Option<Arc<Mutex<ActivityRegistry>>> {
        self.context
            .lock()
            .await
            .as_ref()
            .map(|ctx| ctx.registry.clone())
    }

    fn start_context(&self, epoch: u64, hub: Hub) -> ConnectionContext {
        let session = SessionSlot::new();
        let registry = Arc::new(Mutex::new(ActivityRegistry::new(
            self.host.clone(),
            session.clone(),
        )));
        let cancel = CancellationToken::new();

        let link = LinkContext {
            epoch,
            hub: hub.clone(),
            connector: self.connector.clone(),
            host: self.host.clone(),
            registry: registry.clone(),
            session: session.clone(),
            state: self.state.clone(),
            events_tx: self.events_tx.clone(),
            config: self.config.clone(),
            keepalives: self.keepalives.clone(),
        };
        let driver = tokio::spawn(run_link(link, cancel.clone()));

        ConnectionContext {
            hub,
            cancel,
            session,
            registry,
            _driver: driver,
        }
    }

    /// Claims `epoch` and publishes its first state.
    fn publish(&self, epoch: u64, hub: Option<Hub>, state: ConnectionState) {
        self.publish_with_status(epoch, hub, state, None);
    }

    /// Claims `epoch` and shows `status` on the host in the same step, so a
    /// driver of an older epoch cannot report after it.
    fn publish_with_status(
        &self,
        epoch: u64,
        hub: Option<Hub>,
        state: ConnectionState,
        status: Option<&str>,
    ) {
        self.state.send_modify(|link| {
            *link = LinkState {
                epoch,
                state: state.clone(),
            };
            if let Some(message) = status {
                self.host.set_status(message, false);
            }
        });
        self.emit(ConnectionEvent::StateChanged { hub, state });
        if let Some(message) = status {
            self.emit(ConnectionEvent::StatusReported {
                message: message.to_string(),
                is_error: false,
            });
        }
    }

    fn emit(&self, event: ConnectionEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            trace!("dropping connection event: {e}");
        }
    }
}
