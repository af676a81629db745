//! Control endpoints and their command handlers.

use harmony_bridge_protocol::{ActivityId, EndpointStatus};
use tracing::{debug, warn};

use crate::host::EndpointHandle;
use crate::session::SessionSlot;
use crate::types::CommandError;

/// An activity exposed to the host as a selectable source.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlEndpoint {
    pub activity_id: ActivityId,
    pub display_name: String,
    /// Last status published to the host.
    pub status: EndpointStatus,
    pub handle: EndpointHandle,
}

/// Command handlers bound to one activity.
///
/// Commands go to whatever session currently serves the hub, so handles
/// created before a reconnect keep working afterwards.
#[derive(Clone)]
pub struct EndpointCommands {
    activity_id: ActivityId,
    session: SessionSlot,
}

impl EndpointCommands {
    pub(crate) fn new(activity_id: ActivityId, session: SessionSlot) -> Self {
        Self {
            activity_id,
            session,
        }
    }

    pub fn activity_id(&self) -> &ActivityId {
        &self.activity_id
    }

    /// Starts this activity on the hub.
    pub async fn activate(&self) -> Result<(), CommandError> {
        debug!(activity = %self.activity_id, "activate");
        let Some(session) = self.session.current() else {
            warn!(activity = %self.activity_id, "activate failed: no live session");
            return Err(CommandError::NotConnected);
        };
        match session.start_activity(&self.activity_id).await {
            Ok(()) => {
                debug!(activity = %self.activity_id, "activate succeeded");
                Ok(())
            }
            Err(e) => {
                warn!(activity = %self.activity_id, error = %e, "activate failed");
                Err(e.into())
            }
        }
    }

    /// Powers the hub off. Applies to the hub as a whole, not just this
    /// activity.
    pub async fn standby(&self) -> Result<(), CommandError> {
        debug!(activity = %self.activity_id, "standby");
        turn_off(&self.session).await
    }
}

/// Powers off the hub served by `session`.
pub(crate) async fn turn_off(session: &SessionSlot) -> Result<(), CommandError> {
    let Some(session) = session.current() else {
        warn!("standby failed: no live session");
        return Err(CommandError::NotConnected);
    };
    match session.turn_off().await {
        Ok(()) => {
            debug!("standby succeeded");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "standby failed");
            Err(e.into())
        }
    }
}
