/// Noise simulation core and session scheduling
pub mod gate;
pub mod noise;
pub mod session;

pub use gate::AlertGate;
pub use noise::{DeltaSource, NoiseSimulator, ScriptedDeltas, TickOutcome, UniformDelta};
pub use session::NoiseSession;
