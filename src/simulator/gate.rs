use crate::events::Timestamp;
use chrono::Duration;

/// Cooldown gate for threshold-crossing alerts
///
/// Tracks when the last alert fired and enforces a minimum interval between
/// two consecutive dispatches. The gate is deliberately rolling: it does not
/// reset when the level drops back below the threshold, so a re-crossing
/// inside the same window stays suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertGate {
    /// Minimum interval between two alert dispatches
    cooldown: Duration,
    /// When the last alert fired, `None` until the first dispatch
    last_fired: Option<Timestamp>,
}

impl Default for AlertGate {
    fn default() -> Self {
        Self::new(Duration::milliseconds(60_000))
    }
}

impl AlertGate {
    /// Create a gate with the given cooldown and no dispatch recorded
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: None,
        }
    }

    /// Check whether an alert may fire at `now`
    ///
    /// Returns `true` if no alert has ever fired or if at least the cooldown
    /// has elapsed since the last dispatch.
    pub fn can_fire(&self, now: Timestamp) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => now - last >= self.cooldown,
        }
    }

    /// Record that an alert fired at `now`
    ///
    /// Must only be called after `can_fire` returned `true` for the same
    /// timestamp.
    pub fn record_fired(&mut self, now: Timestamp) {
        self.last_fired = Some(now);
    }

    /// When the last alert fired, if any
    pub fn last_fired(&self) -> Option<Timestamp> {
        self.last_fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_unset_gate_allows_fire() {
        let gate = AlertGate::default();
        assert!(gate.can_fire(Utc::now()));
    }

    #[test]
    fn test_gate_blocks_within_cooldown() {
        let mut gate = AlertGate::default();
        let now = Utc::now();

        gate.record_fired(now);
        assert!(!gate.can_fire(now + Duration::milliseconds(1_000)));
        assert!(!gate.can_fire(now + Duration::milliseconds(59_999)));
    }

    #[test]
    fn test_gate_allows_at_cooldown_boundary() {
        let mut gate = AlertGate::default();
        let now = Utc::now();

        gate.record_fired(now);
        assert!(gate.can_fire(now + Duration::milliseconds(60_000)));
        assert!(gate.can_fire(now + Duration::milliseconds(61_000)));
    }

    #[test]
    fn test_gate_tracks_latest_dispatch() {
        let mut gate = AlertGate::new(Duration::milliseconds(10_000));
        let now = Utc::now();

        gate.record_fired(now);
        let later = now + Duration::milliseconds(10_000);
        assert!(gate.can_fire(later));

        gate.record_fired(later);
        assert_eq!(gate.last_fired(), Some(later));
        assert!(!gate.can_fire(later + Duration::milliseconds(5_000)));
    }
}
