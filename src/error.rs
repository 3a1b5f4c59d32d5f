use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("host does not provide {0}")]
    MissingCapability(String),

    #[error("could not decode host data: {0}")]
    Decode(String),

    #[error("invalid plugin settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("host call failed: {0}")]
    Host(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("host API version {0} is older than 1.5")]
    UnsupportedApi(String),
}

pub type Result<T, E = PluginError> = std::result::Result<T, E>;
