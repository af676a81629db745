use harmony_bridge_protocol::Hub;
use serde::{Deserialize, Serialize};

use crate::DiscoveryError;

/// A hub record as announced by the discovery responder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredHub {
    pub friendly_name: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl DiscoveredHub {
    /// Converts the record into the hub identity used by the bridge.
    pub fn to_hub(&self) -> Hub {
        Hub::new(self.friendly_name.clone(), self.ip.clone())
    }
}

/// Parses one discovery update: the full list of hubs currently visible.
pub fn parse_update(json: &str) -> Result<Vec<DiscoveredHub>, DiscoveryError> {
    Ok(serde_json::from_str(json)?)
}
