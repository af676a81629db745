use std::time::Duration;

/// Interval between keepalive polls against a connected hub.
pub const KEEPALIVE_PERIOD: Duration = Duration::from_secs(30);

/// UDP port the discovery client binds to receive hub announcements.
pub const DISCOVERY_PORT: u16 = 61991;

/// Activity type string the hub uses for its reserved power-off activity.
pub const POWER_OFF_KIND: &str = "PowerOff";

/// Host status shown while no hub has been selected.
pub const NOT_CONFIGURED_STATUS: &str = "Not configured, please check settings.";

/// Builds the host status shown once a hub session is established.
pub fn connected_status(hub_name: &str) -> String {
    format!("Connected to Harmony Hub '{hub_name}'")
}
