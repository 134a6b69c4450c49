/// Error types for the noise monitor
pub mod error;

/// Core reading and alert types
pub mod events;

/// Noise simulation core and session scheduling
pub mod simulator;

/// User profile storage and synchronization
pub mod profile;

/// Alert delivery
pub mod alerts;

/// Configuration management
pub mod config;

// Re-export commonly used types
pub use error::{AlertError, ConfigError, ProfileError, SessionError};
