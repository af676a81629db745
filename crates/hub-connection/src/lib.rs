//! Hub connection manager for the Harmony bridge.
//!
//! Keeps one session to the configured hub alive, mirrors its activities
//! as control endpoints on the host, and turns host commands into hub
//! requests.

pub mod endpoint;
pub mod host;
pub(crate) mod keepalive;
pub mod manager;
pub(crate) mod reconnection;
pub mod registry;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

pub use endpoint::{ControlEndpoint, EndpointCommands};
pub use host::{ControlHost, EndpointConfig, EndpointHandle};
pub use manager::ConnectionManager;
pub use registry::{ActivityRegistry, SyncSummary};
pub use session::{HubConnector, HubLink, HubSession, SessionError, SessionEvent, SessionSlot};
pub use types::{
    CommandError, ConnectionEvent, ConnectionState, LinkError, ManagerConfig, ReconnectConfig,
};
