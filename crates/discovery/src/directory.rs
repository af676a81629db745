use std::sync::{Arc, PoisonError, RwLock};

use harmony_bridge_protocol::Hub;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::types::DiscoveredHub;

/// Hubs most recently announced on the local network.
///
/// Every update replaces the whole snapshot. Nothing is merged or aged out;
/// a hub that drops out of the next announcement simply disappears.
#[derive(Debug, Clone, Default)]
pub struct HubDirectory {
    hubs: Arc<RwLock<Vec<Hub>>>,
}

impl HubDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Vec<Hub> {
        self.hubs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the snapshot with the hubs in `update`.
    pub fn apply_update(&self, update: Vec<DiscoveredHub>) {
        debug!(count = update.len(), hubs = ?update, "received hub discovery update");
        let hubs: Vec<Hub> = update.iter().map(DiscoveredHub::to_hub).collect();
        *self.hubs.write().unwrap_or_else(PoisonError::into_inner) = hubs;
    }

    /// Returns the hub announced at `address`, if any.
    pub fn find_by_address(&self, address: &str) -> Option<Hub> {
        self.hubs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|hub| hub.address == address)
            .cloned()
    }

    /// Returns the number of hubs in the snapshot.
    pub fn len(&self) -> usize {
        self.hubs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies every update from a discovery feed until the feed closes or
    /// `cancel` fires.
    pub fn spawn_listener(
        &self,
        mut updates: mpsc::Receiver<Vec<DiscoveredHub>>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let directory = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    update = updates.recv() => match update {
                        Some(hubs) => directory.apply_update(hubs),
                        None => break,
                    }
                }
            }
            debug!("hub discovery listener stopped");
        })
    }
}
