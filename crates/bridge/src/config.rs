//! Maps persisted connection settings onto the manager configuration.

use harmony_bridge_hub_connection::{ManagerConfig, ReconnectConfig};
use harmony_bridge_hub_settings::ConnectionSettings;

pub fn manager_config(settings: &ConnectionSettings) -> ManagerConfig {
    ManagerConfig {
        keepalive_period: settings.keepalive_period(),
        reconnect: if settings.backoff {
            ReconnectConfig::backoff()
        } else {
            ReconnectConfig::immediate()
        },
    }
}
