//! Harmony Hub bridge.
//!
//! Exposes the activities of a Logitech Harmony Hub as selectable sources
//! of a media controller. The hub transport and the controller plug in
//! through [`HubConnector`](harmony_bridge_hub_connection::HubConnector)
//! and [`ControlHost`](harmony_bridge_hub_connection::ControlHost).

pub mod bridge;
pub mod config;
pub mod events;

pub use bridge::{Bridge, SaveOutcome, SaveStatus};
pub use config::manager_config;
