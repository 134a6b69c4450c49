use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Errors that can occur when talking to the profile store or cache
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Store communication failed: {0}")]
    StoreError(String),

    #[error("Permission denied by profile store: {0}")]
    PermissionDenied(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Errors that can occur when delivering alerts
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Failed to send notification: {0}")]
    NotificationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur managing the monitoring session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session thread terminated unexpectedly: {0}")]
    ThreadTerminated(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
