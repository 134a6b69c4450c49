use crate::error::ConfigError;
use crate::simulator::noise::{LEVEL_MAX, LEVEL_MIN};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration loaded from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub profile: ProfileConfig,
    pub alerts: AlertsConfig,
}

/// Noise monitor timing and seed values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Wall-clock period between simulator ticks, in milliseconds
    pub tick_interval_ms: u64,
    /// Minimum interval between two alert dispatches, in milliseconds
    pub cooldown_ms: u64,
    /// Level the walk starts from, within [30, 100]
    pub initial_level: i32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 3_000,
            cooldown_ms: 60_000,
            initial_level: 45,
        }
    }
}

/// Profile store selection and cache location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfileConfig {
    pub backend: ProfileBackendConfig,
    /// Directory for the local profile cache
    pub cache_dir: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            backend: ProfileBackendConfig::Mock,
            cache_dir: ".mimo-cache".to_string(),
        }
    }
}

/// Which profile store backend to use
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProfileBackendConfig {
    /// REST document store
    Rest { endpoint: String },
    /// In-memory store for testing and offline development
    Mock,
}

/// Alert delivery options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AlertsConfig {
    /// Log notifications instead of delivering them to the desktop
    pub mock: bool,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read,
    /// `ConfigError::TomlError` if it does not parse, and
    /// `ConfigError::ValidationError` if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "monitor.tick_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.monitor.cooldown_ms == 0 {
            return Err(ConfigError::ValidationError(
                "monitor.cooldown_ms must be greater than zero".to_string(),
            ));
        }

        if !(LEVEL_MIN..=LEVEL_MAX).contains(&self.monitor.initial_level) {
            return Err(ConfigError::ValidationError(format!(
                "monitor.initial_level must be within [{}, {}], got {}",
                LEVEL_MIN, LEVEL_MAX, self.monitor.initial_level
            )));
        }

        if let ProfileBackendConfig::Rest { ref endpoint } = self.profile.backend {
            if endpoint.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "profile.backend endpoint must not be empty".to_string(),
                ));
            }
        }

        if self.profile.cache_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "profile.cache_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.monitor.tick_interval_ms, 3_000);
        assert_eq!(config.monitor.cooldown_ms, 60_000);
        assert_eq!(config.monitor.initial_level, 45);
        assert_eq!(config.profile.backend, ProfileBackendConfig::Mock);
        assert!(!config.alerts.mock);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [monitor]
            tick_interval_ms = 1000
            cooldown_ms = 30000
            initial_level = 50

            [profile]
            cache_dir = "/tmp/mimo"

            [profile.backend]
            type = "rest"
            endpoint = "https://store.example.com/v1"

            [alerts]
            mock = true
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.monitor.tick_interval_ms, 1_000);
        assert_eq!(config.monitor.cooldown_ms, 30_000);
        assert_eq!(config.monitor.initial_level, 50);
        assert_eq!(
            config.profile.backend,
            ProfileBackendConfig::Rest {
                endpoint: "https://store.example.com/v1".to_string()
            }
        );
        assert_eq!(config.profile.cache_dir, "/tmp/mimo");
        assert!(config.alerts.mock);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let toml = r#"
            [monitor]
            tick_interval_ms = 500
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.monitor.tick_interval_ms, 500);
        assert_eq!(config.monitor.cooldown_ms, 60_000);
        assert_eq!(config.monitor.initial_level, 45);
        assert_eq!(config.profile.backend, ProfileBackendConfig::Mock);
    }

    #[test]
    fn test_zero_tick_interval_fails_validation() {
        let mut config = Config::default();
        config.monitor.tick_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_out_of_range_initial_level_fails_validation() {
        let mut config = Config::default();
        config.monitor.initial_level = 20;
        assert!(config.validate().is_err());

        config.monitor.initial_level = 101;
        assert!(config.validate().is_err());

        config.monitor.initial_level = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_rest_endpoint_fails_validation() {
        let mut config = Config::default();
        config.profile.backend = ProfileBackendConfig::Rest {
            endpoint: "  ".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_from_file_missing_file() {
        let result = Config::from_file(Path::new("/nonexistent/mimo.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mimo.toml");
        std::fs::write(&path, "[monitor]\ninitial_level = 60\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.monitor.initial_level, 60);
    }

    #[test]
    fn test_invalid_toml_reports_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mimo.toml");
        std::fs::write(&path, "monitor = not toml").unwrap();

        let result = Config::from_file(&path);
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }
}
