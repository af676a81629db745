//! Persisted bridge settings.

use std::time::Duration;

use harmony_bridge_protocol::Hub;
use harmony_bridge_protocol::constants::KEEPALIVE_PERIOD;
use serde::{Deserialize, Serialize};

/// Settings of the bridge.
///
/// `name` and `hostname` identify the selected hub. `hostname` holds the
/// hub's address and is the value the host's dropdown edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeSettings {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub hostname: String,

    #[serde(default)]
    pub connection: ConnectionSettings,
}

impl BridgeSettings {
    /// Returns the selected hub, or `None` while nothing is configured.
    pub fn hub(&self) -> Option<Hub> {
        Some(Hub::new(&self.name, &self.hostname)).filter(Hub::is_configured)
    }
}

/// Tunables for the hub connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Seconds between keepalive polls.
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// Back off between reconnect attempts instead of retrying at once.
    #[serde(default)]
    pub backoff: bool,
}

fn default_keepalive_secs() -> u64 {
    KEEPALIVE_PERIOD.as_secs()
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            keepalive_secs: default_keepalive_secs(),
            backoff: false,
        }
    }
}

impl ConnectionSettings {
    /// Keepalive period, never shorter than one second.
    pub fn keepalive_period(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs.max(1))
    }
}
