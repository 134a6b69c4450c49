/// Alert delivery sinks
pub mod notifier;

pub use notifier::{AlertSink, DesktopNotifier, MemorySink};
