use crate::error::AlertError;
use crate::events::NoiseAlert;
use log::info;
use std::process::Command;
use std::sync::Mutex;

/// Delivery capability for threshold-crossing alerts
///
/// The simulator decides whether and when to alert; a sink decides how. The
/// session invokes `deliver` at most once per cooldown window.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, alert: &NoiseAlert) -> Result<(), AlertError>;
}

/// Delivers alerts as native desktop notifications
///
/// Uses AppleScript via osascript so the notification appears in the system
/// notification center and respects user notification preferences. In
/// testing mode notifications are mocked to avoid spamming the user.
#[derive(Debug)]
pub struct DesktopNotifier {
    /// Whether to use mock notifications for testing
    use_mock_notifications: bool,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            use_mock_notifications: false,
        }
    }

    /// Create a notifier for testing that logs instead of shelling out
    pub fn new_for_testing() -> Self {
        Self {
            use_mock_notifications: true,
        }
    }

    /// Format the notification title
    fn format_title() -> String {
        "Mimo Noise Alert".to_string()
    }

    /// Format the notification body from an alert
    fn format_body(alert: &NoiseAlert) -> String {
        format!(
            "Current noise level ({} dB) exceeds your threshold. Re-routing suggested.",
            alert.level
        )
    }

    /// Send a desktop notification using osascript or mock for testing
    fn send_notification(&self, title: &str, body: &str) -> Result<(), AlertError> {
        if self.use_mock_notifications {
            // Mock notification for testing - just log it
            info!("MOCK NOTIFICATION - Title: {}, Body: {}", title, body);
            return Ok(());
        }

        // Escape quotes in title and body for AppleScript
        let escaped_title = title.replace('"', "\\\"");
        let escaped_body = body.replace('"', "\\\"");

        let script = format!(
            r#"display notification "{}" with title "{}""#,
            escaped_body, escaped_title
        );

        let output = Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .output()
            .map_err(|e| {
                AlertError::NotificationFailed(format!("Failed to execute osascript: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AlertError::NotificationFailed(format!(
                "osascript failed with status {}: {}",
                output.status, stderr
            )));
        }

        Ok(())
    }
}

impl AlertSink for DesktopNotifier {
    fn deliver(&self, alert: &NoiseAlert) -> Result<(), AlertError> {
        let title = Self::format_title();
        let body = Self::format_body(alert);
        self.send_notification(&title, &body)?;
        info!("Sent noise notification for level {} dB", alert.level);
        Ok(())
    }
}

/// Records delivered alerts in memory
///
/// Used by tests asserting on what the session dispatched.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<NoiseAlert>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All alerts delivered so far, in order
    pub fn delivered(&self) -> Vec<NoiseAlert> {
        self.delivered.lock().unwrap().clone()
    }
}

impl AlertSink for MemorySink {
    fn deliver(&self, alert: &NoiseAlert) -> Result<(), AlertError> {
        self.delivered.lock().unwrap().push(*alert);
        Ok(())
    }
}
