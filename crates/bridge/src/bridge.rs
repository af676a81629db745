//! Wires settings, hub discovery and the connection manager together.

use std::sync::Arc;

use harmony_bridge_discovery::HubDirectory;
use harmony_bridge_hub_connection::{ConnectionManager, ControlHost, HubConnector};
use harmony_bridge_hub_settings::{
    BridgeSettings, Selection, SettingsLayout, SettingsStore, make_layout, resolve_selection,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::manager_config;
use crate::events::log_events;

/// Result of a settings save as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Success,
    NotValid,
}

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub status: SaveStatus,
    pub layout: SettingsLayout,
}

/// The running bridge: one connection manager driven by persisted settings.
pub struct Bridge {
    manager: Arc<ConnectionManager>,
    directory: HubDirectory,
    store: SettingsStore,
    settings: Mutex<BridgeSettings>,
}

impl Bridge {
    /// Loads settings from `store` and builds the connection manager.
    ///
    /// Unreadable settings fall back to the defaults.
    pub fn new(
        connector: Arc<dyn HubConnector>,
        host: Arc<dyn ControlHost>,
        directory: HubDirectory,
        store: SettingsStore,
    ) -> Self {
        let settings = match store.load() {
            Ok(settings) => {
                info!(hub = %settings.name, address = %settings.hostname, "settings loaded");
                settings
            }
            Err(e) => {
                warn!(error = %e, "failed to load settings, using defaults");
                BridgeSettings::default()
            }
        };
        let manager =
            ConnectionManager::with_config(connector, host, manager_config(&settings.connection));

        Self {
            manager: Arc::new(manager),
            directory,
            store,
            settings: Mutex::new(settings),
        }
    }

    /// Connects to the configured hub and starts logging connection events.
    ///
    /// Returns the event logger task the first time it is called.
    pub async fn start(&self) -> Option<JoinHandle<()>> {
        let logger = self
            .manager
            .take_events()
            .await
            .map(|events| tokio::spawn(log_events(events)));
        let hub = self.settings.lock().await.hub();
        self.manager.set_target(hub).await;
        logger
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    pub fn directory(&self) -> &HubDirectory {
        &self.directory
    }

    /// Returns the current in-memory settings.
    pub async fn settings(&self) -> BridgeSettings {
        self.settings.lock().await.clone()
    }

    /// Settings form for the current settings.
    pub async fn get_settings(&self) -> SettingsLayout {
        make_layout(&*self.settings.lock().await, &self.directory)
    }

    /// Validates `values` and, unless `dry_run`, applies them.
    ///
    /// Picking a different hub switches the connection and persists the
    /// settings. Resubmitting the current hub only refreshes the in-memory
    /// values.
    pub async fn save_settings(&self, values: BridgeSettings, dry_run: bool) -> SaveOutcome {
        let layout = make_layout(&values, &self.directory);
        if layout.has_error {
            return SaveOutcome {
                status: SaveStatus::NotValid,
                layout,
            };
        }
        if dry_run {
            return SaveOutcome {
                status: SaveStatus::Success,
                layout,
            };
        }

        let mut settings = self.settings.lock().await;
        let selection = match resolve_selection(&settings, &values, &self.directory) {
            Ok(selection) => selection,
            Err(e) => {
                warn!(error = %e, "rejecting settings");
                return SaveOutcome {
                    status: SaveStatus::NotValid,
                    layout,
                };
            }
        };

        let mut updated = values;
        updated.connection = settings.connection.clone();
        match selection {
            Selection::Unchanged => {
                updated.name = settings.name.clone();
                *settings = updated;
            }
            Selection::Changed(hub) => {
                info!(hub = %hub.name, address = %hub.address, "hub selection changed");
                updated.name = hub.name.clone();
                updated.hostname = hub.address.clone();
                *settings = updated;
                self.manager.set_target(Some(hub)).await;
                if let Err(e) = self.store.save(&settings) {
                    warn!(error = %e, "failed to persist settings");
                }
            }
        }

        SaveOutcome {
            status: SaveStatus::Success,
            layout: make_layout(&settings, &self.directory),
        }
    }

    /// Tears down the hub connection.
    pub async fn shutdown(&self) {
        self.manager.shutdown().await;
    }
}
