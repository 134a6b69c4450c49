//! Core reading and alert types for the noise monitor
//!
//! This module defines the data structures that flow between the simulator,
//! the session scheduler, and the alert sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type for consistent time handling across the application
pub type Timestamp = DateTime<Utc>;

/// A single sampled ambient noise level
///
/// Produced once per tick by the simulator and forwarded to consumers
/// (the reading log, a future UI surface) over a channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoiseReading {
    /// When the level was sampled
    pub timestamp: Timestamp,
    /// Noise level in dB-equivalent units, always within [30, 100]
    pub level: i32,
}

/// A threshold-crossing alert raised by the simulator
///
/// At most one alert is raised per cooldown window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoiseAlert {
    /// When the alert fired
    pub timestamp: Timestamp,
    /// The level that crossed the threshold
    pub level: i32,
    /// The user's sensitivity at the time of the crossing
    pub threshold: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_noise_reading_serialization() {
        let reading = NoiseReading {
            timestamp: Utc::now(),
            level: 45,
        };

        let json = serde_json::to_string(&reading).unwrap();
        let deserialized: NoiseReading = serde_json::from_str(&json).unwrap();
        assert_eq!(reading, deserialized);
    }

    #[test]
    fn test_noise_alert_serialization() {
        let alert = NoiseAlert {
            timestamp: Utc::now(),
            level: 82,
            threshold: 70,
        };

        let json = serde_json::to_string(&alert).unwrap();
        let deserialized: NoiseAlert = serde_json::from_str(&json).unwrap();
        assert_eq!(alert, deserialized);
    }
}
