//! Hub session abstraction.
//!
//! The transport talking to the hub lives outside this crate. It plugs in
//! through [`HubConnector`], which yields a [`HubSession`] for commands and
//! queries plus a channel of [`SessionEvent`]s pushed by the hub.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use harmony_bridge_protocol::{Activity, ActivityId, Hub, StateDigest};
use tokio::sync::mpsc;

/// Errors reported by the hub transport.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("hub unreachable: {0}")]
    Unreachable(String),

    #[error("request timed out")]
    Timeout,

    #[error("session closed")]
    Closed,

    #[error("hub rejected request: {0}")]
    Rejected(String),
}

/// Events pushed by a live session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The hub reported its current activity.
    StateDigest(StateDigest),
    /// The transport lost the hub.
    Offline,
}

/// A freshly established session and its event stream.
///
/// The stream closing is treated the same as [`SessionEvent::Offline`].
pub struct HubLink {
    pub session: Arc<dyn HubSession>,
    pub events: mpsc::Receiver<SessionEvent>,
}

/// Opens sessions to a hub.
#[async_trait]
pub trait HubConnector: Send + Sync + 'static {
    /// Connects to `hub`. Fails on timeout or refusal.
    async fn connect(&self, hub: &Hub) -> Result<HubLink, SessionError>;
}

/// A live connection to one hub.
#[async_trait]
pub trait HubSession: Send + Sync + 'static {
    async fn current_activity_id(&self) -> Result<ActivityId, SessionError>;

    async fn activities(&self) -> Result<Vec<Activity>, SessionError>;

    async fn start_activity(&self, id: &ActivityId) -> Result<(), SessionError>;

    /// Powers the whole hub off.
    async fn turn_off(&self) -> Result<(), SessionError>;

    /// Closes the session. Must tolerate being called more than once.
    async fn end(&self);
}

/// Sends `end` to a session without waiting for it.
pub(crate) fn spawn_end(session: Arc<dyn HubSession>) {
    tokio::spawn(async move { session.end().await });
}

struct LiveSession {
    generation: u64,
    session: Arc<dyn HubSession>,
}

/// The session currently serving a hub, shared by the link driver and the
/// command handles given to the host.
///
/// Each installed session carries a generation so a driver can only clear
/// the session it installed itself.
#[derive(Clone, Default)]
pub struct SessionSlot {
    inner: Arc<RwLock<Option<LiveSession>>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live session, if any.
    pub fn current(&self) -> Option<Arc<dyn HubSession>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|live| live.session.clone())
    }

    pub fn is_live(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn install(&self, generation: u64, session: Arc<dyn HubSession>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) =
            Some(LiveSession { generation, session });
    }

    /// Removes whatever session is installed.
    pub(crate) fn take(&self) -> Option<Arc<dyn HubSession>> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(|live| live.session)
    }

    /// Removes the session only if it is still the one from `generation`.
    pub(crate) fn take_if(&self, generation: u64) -> Option<Arc<dyn HubSession>> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.as_ref().is_some_and(|live| live.generation == generation) {
            guard.take().map(|live| live.session)
        } else {
            None
        }
    }
}
