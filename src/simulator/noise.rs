use crate::events::{NoiseAlert, Timestamp};
use crate::simulator::gate::AlertGate;
use rand::Rng;

/// Lowest representable noise level in dB-equivalent units
pub const LEVEL_MIN: i32 = 30;
/// Highest representable noise level in dB-equivalent units
pub const LEVEL_MAX: i32 = 100;
/// Level the walk starts from when a session begins
pub const SEED_LEVEL: i32 = 45;
/// Smallest per-tick delta (inclusive)
pub const DELTA_MIN: i32 = -4;
/// Largest per-tick delta (inclusive)
pub const DELTA_MAX: i32 = 5;

/// Source of per-tick level deltas
///
/// The walk's randomness sits behind this seam so tests can drive the
/// simulator with a scripted sequence and reproduce outputs exactly.
pub trait DeltaSource: Send {
    /// Next integer delta to apply to the current level
    fn next_delta(&mut self) -> i32;
}

/// Uniform draw from the asymmetric range [DELTA_MIN, DELTA_MAX]
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformDelta;

impl DeltaSource for UniformDelta {
    fn next_delta(&mut self) -> i32 {
        rand::thread_rng().gen_range(DELTA_MIN..=DELTA_MAX)
    }
}

/// Replays a fixed delta sequence, then repeats the last value
///
/// Used by tests that need a deterministic walk.
#[derive(Debug, Clone)]
pub struct ScriptedDeltas {
    deltas: Vec<i32>,
    position: usize,
}

impl ScriptedDeltas {
    pub fn new(deltas: Vec<i32>) -> Self {
        Self { deltas, position: 0 }
    }
}

impl DeltaSource for ScriptedDeltas {
    fn next_delta(&mut self) -> i32 {
        let delta = match self.deltas.get(self.position) {
            Some(&d) => d,
            None => *self.deltas.last().unwrap_or(&0),
        };
        self.position += 1;
        delta
    }
}

/// Result of a single simulator tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// The clamped level after applying this tick's delta
    pub level: i32,
    /// The alert raised by this tick, if the threshold was crossed and the
    /// cooldown allowed a dispatch
    pub alert: Option<NoiseAlert>,
}

/// Bounded random-walk noise generator with a cooldown-gated alert decision
///
/// Owns the current level and the alert gate for one user session. The level
/// is perturbed on every tick and clamped to [LEVEL_MIN, LEVEL_MAX]. When a
/// tick leaves the level above the caller-supplied threshold, an alert fires
/// unless the gate's cooldown suppresses it. The simulator decides whether
/// and when to alert, never how: delivery belongs to the caller.
pub struct NoiseSimulator {
    level: i32,
    gate: AlertGate,
    deltas: Box<dyn DeltaSource>,
}

impl NoiseSimulator {
    /// Create a simulator at the seed level with the default 60 s gate
    pub fn new(deltas: Box<dyn DeltaSource>) -> Self {
        Self::with_state(SEED_LEVEL, AlertGate::default(), deltas)
    }

    /// Create a simulator from explicit starting state
    ///
    /// `level` must be within [LEVEL_MIN, LEVEL_MAX]; out-of-range values
    /// are clamped on construction so the bounded-walk invariant holds from
    /// the first tick.
    pub fn with_state(level: i32, gate: AlertGate, deltas: Box<dyn DeltaSource>) -> Self {
        Self {
            level: clamp_level(level),
            gate,
            deltas,
        }
    }

    /// Current noise level
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Current gate state
    pub fn gate(&self) -> &AlertGate {
        &self.gate
    }

    /// Advance the walk by one tick
    ///
    /// Draws a delta, clamps the new level, and evaluates the threshold
    /// crossing against `threshold` at `now`. The threshold is read fresh on
    /// every call and never cached. When the new level sits at or below the
    /// threshold no gate check happens at all; the gate keeps its rolling
    /// window across drop-below and re-crossing.
    pub fn tick(&mut self, threshold: i32, now: Timestamp) -> TickOutcome {
        let delta = self.deltas.next_delta();
        self.level = clamp_level(self.level + delta);

        let alert = if self.level > threshold && self.gate.can_fire(now) {
            self.gate.record_fired(now);
            Some(NoiseAlert {
                timestamp: now,
                level: self.level,
                threshold,
            })
        } else {
            None
        };

        TickOutcome {
            level: self.level,
            alert,
        }
    }
}

/// Snap a level to the closed range [LEVEL_MIN, LEVEL_MAX]
pub fn clamp_level(level: i32) -> i32 {
    level.clamp(LEVEL_MIN, LEVEL_MAX)
}
