//! Activity endpoints for one hub.
//!
//! Endpoints are created the first time an activity is enumerated and kept
//! for as long as the hub stays configured. Reconnects only refresh their
//! status. Every digest from the session is dispatched here once and fanned
//! out over all endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use harmony_bridge_protocol::{Activity, ActivityId, EndpointStatus, StateDigest};
use tracing::{debug, trace};

use crate::endpoint::{ControlEndpoint, EndpointCommands};
use crate::host::{ControlHost, EndpointConfig};
use crate::session::SessionSlot;

/// Outcome of syncing an enumerated activity list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub created: usize,
    pub refreshed: usize,
    /// Activities that cannot be exposed (power-off).
    pub skipped: usize,
}

/// Endpoints derived from one hub's activities.
pub struct ActivityRegistry {
    host: Arc<dyn ControlHost>,
    session: SessionSlot,
    endpoints: BTreeMap<ActivityId, ControlEndpoint>,
}

impl ActivityRegistry {
    /// Creates an empty registry whose command handles use `session`.
    pub fn new(host: Arc<dyn ControlHost>, session: SessionSlot) -> Self {
        Self {
            host,
            session,
            endpoints: BTreeMap::new(),
        }
    }

    /// Reconciles the endpoints with an enumerated activity list.
    pub fn sync(&mut self, current: &ActivityId, activities: &[Activity]) -> SyncSummary {
        let mut summary = SyncSummary::default();

        for activity in activities {
            if !activity.is_controllable() {
                summary.skipped += 1;
                continue;
            }

            let status = EndpointStatus::for_current(&activity.id, current);

            if let Some(endpoint) = self.endpoints.get_mut(&activity.id) {
                debug!(activity = %activity.id, "activity already registered as source");
                endpoint.status = status;
                self.host.update_endpoint_state(&endpoint.handle, status);
                summary.refreshed += 1;
                continue;
            }

            debug!(activity = %activity.id, label = %activity.label, "creating source endpoint");
            let handle = self.host.register_endpoint(EndpointConfig {
                activity_id: activity.id.clone(),
                display_name: activity.label.clone(),
                status,
                supports_standby: true,
                commands: EndpointCommands::new(activity.id.clone(), self.session.clone()),
            });
            self.endpoints.insert(
                activity.id.clone(),
                ControlEndpoint {
                    activity_id: activity.id.clone(),
                    display_name: activity.label.clone(),
                    status,
                    handle,
                },
            );
            summary.created += 1;
        }

        summary
    }

    /// Applies a digest to every endpoint. Returns how many endpoints
    /// changed status.
    pub fn apply_digest(&mut self, digest: &StateDigest) -> usize {
        let mut changed = 0;
        for endpoint in self.endpoints.values_mut() {
            let status = digest.status_for(&endpoint.activity_id);
            trace!(
                endpoint = %endpoint.display_name,
                digest_activity = %digest.activity_id,
                phase = ?digest.activity_status,
                "state digest"
            );
            if endpoint.status == status {
                continue;
            }
            endpoint.status = status;
            debug!(activity = %endpoint.activity_id, %status, "updating endpoint state");
            self.host.update_endpoint_state(&endpoint.handle, status);
            changed += 1;
        }
        changed
    }

    pub fn endpoint(&self, id: &ActivityId) -> Option<&ControlEndpoint> {
        self.endpoints.get(id)
    }

    /// Returns all endpoints ordered by activity id.
    pub fn endpoints(&self) -> Vec<ControlEndpoint> {
        self.endpoints.values().cloned().collect()
    }

    /// Returns the command handle for an activity.
    pub fn commands(&self, id: &ActivityId) -> Option<EndpointCommands> {
        self.endpoints
            .contains_key(id)
            .then(|| EndpointCommands::new(id.clone(), self.session.clone()))
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
