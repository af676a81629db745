//! Settings persistence.
//!
//! Settings are stored as TOML:
//! - Linux: `$XDG_CONFIG_HOME/harmony-bridge/settings.toml`, falling back to
//!   `~/.config/harmony-bridge/settings.toml`
//! - Windows: `%APPDATA%/harmony-bridge/settings.toml`

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SettingsError;
use crate::settings::BridgeSettings;

/// Reads and writes [`BridgeSettings`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the platform default path, if one can be determined.
    pub fn at_default_path() -> Option<Self> {
        default_settings_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings from disk. A missing file yields the defaults.
    pub fn load(&self) -> Result<BridgeSettings, SettingsError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no settings file, using defaults");
            return Ok(BridgeSettings::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let settings: BridgeSettings = toml::from_str(&content)?;
        debug!(path = %self.path.display(), hub = %settings.name, "settings loaded");
        Ok(settings)
    }

    /// Writes settings to disk, creating parent directories as needed.
    pub fn save(&self, settings: &BridgeSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(settings)?;
        std::fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// Returns the default settings file path.
pub fn default_settings_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("harmony-bridge").join("settings.toml"))
}

/// Returns the platform-specific config directory.
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config"))
    }
}
