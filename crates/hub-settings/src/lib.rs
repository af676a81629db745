//! Bridge settings: the persisted hub selection and the settings form the
//! host renders for picking a discovered hub.

pub mod error;
pub mod layout;
pub mod settings;
pub mod store;

pub use error::SettingsError;
pub use layout::{
    DropdownOption, LayoutField, Selection, SettingsLayout, make_layout, resolve_selection,
};
pub use settings::{BridgeSettings, ConnectionSettings};
pub use store::{SettingsStore, default_settings_path};
