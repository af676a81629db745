//! Settings layout shown by the host and validation of submitted values.

use harmony_bridge_discovery::HubDirectory;
use harmony_bridge_protocol::Hub;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::settings::BridgeSettings;

pub const HUB_FIELD_TITLE: &str = "Harmony Hub";
const HUB_FIELD_SUBTITLE: &str =
    "Select a Harmony Hub from the list of hubs discovered on the local network.";
const HUB_FIELD_SETTING: &str = "hostname";
const UNKNOWN_HUB_ERROR: &str = "The selected hub was not found on the local network.";

/// Settings form as rendered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsLayout {
    pub values: BridgeSettings,
    pub layout: Vec<LayoutField>,
    pub has_error: bool,
}

/// One field of the settings form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutField {
    Dropdown {
        title: String,
        subtitle: String,
        values: Vec<DropdownOption>,
        /// Key in the values the field edits.
        setting: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub title: String,
    pub value: String,
}

/// Builds the settings form for `values`, offering every hub currently in
/// the directory.
///
/// The form carries an error when a hub address is selected that the
/// directory does not know.
pub fn make_layout(values: &BridgeSettings, directory: &HubDirectory) -> SettingsLayout {
    let options: Vec<DropdownOption> = directory
        .snapshot()
        .into_iter()
        .map(|hub| DropdownOption {
            title: hub.name,
            value: hub.address,
        })
        .collect();

    let unknown = !values.hostname.is_empty()
        && !options.iter().any(|option| option.value == values.hostname);
    let error = unknown.then(|| UNKNOWN_HUB_ERROR.to_string());

    SettingsLayout {
        values: values.clone(),
        layout: vec![LayoutField::Dropdown {
            title: HUB_FIELD_TITLE.to_string(),
            subtitle: HUB_FIELD_SUBTITLE.to_string(),
            values: options,
            setting: HUB_FIELD_SETTING.to_string(),
            error,
        }],
        has_error: unknown,
    }
}

/// Outcome of resolving a submitted hub selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Unchanged,
    /// A different hub was picked. An empty hub means the selection was
    /// cleared.
    Changed(Hub),
}

/// Resolves the submitted address against the directory and compares the
/// result with the current selection.
///
/// The hub name always comes from the directory, never from the submitted
/// values.
pub fn resolve_selection(
    current: &BridgeSettings,
    submitted: &BridgeSettings,
    directory: &HubDirectory,
) -> Result<Selection, SettingsError> {
    let hub = if submitted.hostname.is_empty() {
        Hub::new("", "")
    } else {
        directory
            .find_by_address(&submitted.hostname)
            .ok_or_else(|| SettingsError::UnknownHub(submitted.hostname.clone()))?
    };

    if hub.name == current.name && hub.address == current.hostname {
        Ok(Selection::Unchanged)
    } else {
        Ok(Selection::Changed(hub))
    }
}
