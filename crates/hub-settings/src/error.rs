/// Errors from settings persistence and validation.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no discovered hub at {0}")]
    UnknownHub(String),
}
