use std::net::{Ipv4Addr, SocketAddr};

pub mod directory;
pub mod types;

// Re-export primary types.
pub use directory::HubDirectory;
pub use harmony_bridge_protocol::constants::DISCOVERY_PORT;
pub use types::{DiscoveredHub, parse_update};

/// Local address a discovery feed binds to hear hub announcements.
pub fn listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, DISCOVERY_PORT))
}

/// Errors for discovery operations.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("malformed discovery update: {0}")]
    Parse(#[from] serde_json::Error),
}
