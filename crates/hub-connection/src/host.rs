//! Boundary towards the hosting media controller.

use harmony_bridge_protocol::{ActivityId, EndpointStatus};

use crate::endpoint::EndpointCommands;

/// Host-assigned handle of a registered endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointHandle(pub u64);

/// Everything the host needs to expose one activity as a source.
#[derive(Clone)]
pub struct EndpointConfig {
    pub activity_id: ActivityId,
    pub display_name: String,
    pub status: EndpointStatus,
    pub supports_standby: bool,
    /// Handlers for the host's "select" and "standby" actions.
    pub commands: EndpointCommands,
}

/// The hosting controller. All calls are fire-and-forget.
pub trait ControlHost: Send + Sync + 'static {
    fn register_endpoint(&self, config: EndpointConfig) -> EndpointHandle;

    fn update_endpoint_state(&self, handle: &EndpointHandle, status: EndpointStatus);

    /// Called while the manager's connection state is locked. Must not call
    /// back into the manager.
    fn set_status(&self, message: &str, is_error: bool);
}
