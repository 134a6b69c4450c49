use crate::alerts::AlertSink;
use crate::error::SessionError;
use crate::events::NoiseReading;
use crate::profile::UserProfile;
use crate::simulator::gate::AlertGate;
use crate::simulator::noise::{DeltaSource, NoiseSimulator, UniformDelta};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Session-scoped noise monitoring scheduler
///
/// Owns the background thread that drives the simulator on a fixed
/// wall-clock period for as long as the user session is active. Exactly one
/// tick is ever in flight. Readings go out over a channel; fired alerts go
/// to the configured sink. The user's sensitivity is re-read from the shared
/// profile on every tick, so settings changes apply without a restart.
pub struct NoiseSession {
    /// Wall-clock period between ticks
    tick_interval: Duration,
    /// Minimum interval between two alert dispatches
    cooldown: chrono::Duration,
    /// Level the walk starts from
    initial_level: i32,
    /// Live profile handle, read for the threshold each tick
    profile: Arc<Mutex<UserProfile>>,
    /// Delivery capability for fired alerts
    sink: Arc<dyn AlertSink>,
    /// Channel to send sampled readings
    output_channel: Sender<NoiseReading>,
    /// Delta source handed to the simulator on start; defaults to a uniform
    /// draw when not overridden
    delta_source: Option<Box<dyn DeltaSource>>,
    /// Handle to the background thread
    thread_handle: Option<JoinHandle<()>>,
    /// Shared state for controlling the session
    running: Arc<Mutex<bool>>,
}

impl NoiseSession {
    /// Create a new session
    ///
    /// # Arguments
    ///
    /// * `tick_interval` - how often the simulator ticks (3000 ms in production)
    /// * `cooldown` - minimum interval between alert dispatches
    /// * `initial_level` - seed level for the walk
    /// * `profile` - shared profile whose sensitivity gates alerts
    /// * `sink` - where fired alerts are delivered
    /// * `channel` - where sampled readings are sent
    pub fn new(
        tick_interval: Duration,
        cooldown: chrono::Duration,
        initial_level: i32,
        profile: Arc<Mutex<UserProfile>>,
        sink: Arc<dyn AlertSink>,
        channel: Sender<NoiseReading>,
    ) -> Self {
        Self {
            tick_interval,
            cooldown,
            initial_level,
            profile,
            sink,
            output_channel: channel,
            delta_source: None,
            thread_handle: None,
            running: Arc::new(Mutex::new(false)),
        }
    }

    /// Replace the default uniform delta source
    ///
    /// Used by tests to drive the walk with a scripted sequence.
    pub fn with_delta_source(mut self, deltas: Box<dyn DeltaSource>) -> Self {
        self.delta_source = Some(deltas);
        self
    }

    /// Start the session
    ///
    /// Spawns the background tick thread. Starting an already-running
    /// session is a no-op.
    pub fn start(&mut self) -> Result<(), SessionError> {
        info!(
            "Starting NoiseSession with tick interval: {:?}",
            self.tick_interval
        );

        {
            let mut running = self.running.lock().unwrap();
            if *running {
                info!("NoiseSession already running, skipping start");
                return Ok(());
            }
            *running = true;
        }

        let deltas = self
            .delta_source
            .take()
            .unwrap_or_else(|| Box::new(UniformDelta));
        let simulator =
            NoiseSimulator::with_state(self.initial_level, AlertGate::new(self.cooldown), deltas);

        let tick_interval = self.tick_interval;
        let profile = Arc::clone(&self.profile);
        let sink = Arc::clone(&self.sink);
        let channel = self.output_channel.clone();
        let running = Arc::clone(&self.running);

        debug!("Spawning NoiseSession background thread");
        let handle = thread::spawn(move || {
            Self::session_thread(simulator, tick_interval, profile, sink, channel, running);
        });

        self.thread_handle = Some(handle);
        info!("NoiseSession started successfully");
        Ok(())
    }

    /// Stop the session
    ///
    /// Signals the background thread and waits for it to finish. After this
    /// returns no further tick fires. Stopping a stopped session is a no-op.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        info!("Stopping NoiseSession");

        {
            let mut running = self.running.lock().unwrap();
            if !*running {
                debug!("NoiseSession already stopped");
                return Ok(());
            }
            *running = false;
        }

        if let Some(handle) = self.thread_handle.take() {
            debug!("Waiting for NoiseSession thread to join");
            handle.join().map_err(|_| {
                error!("Failed to join NoiseSession thread");
                SessionError::ThreadTerminated("Failed to join session thread".to_string())
            })?;
        }

        info!("NoiseSession stopped successfully");
        Ok(())
    }

    /// Check if the session is currently running
    pub fn is_running(&self) -> bool {
        *self.running.lock().unwrap()
    }

    /// Main session thread function
    ///
    /// Sleeps one tick interval in short slices so shutdown stays
    /// responsive, then advances the simulator and dispatches the results.
    fn session_thread(
        mut simulator: NoiseSimulator,
        tick_interval: Duration,
        profile: Arc<Mutex<UserProfile>>,
        sink: Arc<dyn AlertSink>,
        channel: Sender<NoiseReading>,
        running: Arc<Mutex<bool>>,
    ) {
        info!(
            "NoiseSession thread started at level {} with interval {:?}",
            simulator.level(),
            tick_interval
        );

        let sleep_slice = Duration::from_millis(100);

        while *running.lock().unwrap() {
            // Sleep in short intervals to allow responsive shutdown
            let mut remaining = tick_interval;
            while remaining > Duration::ZERO && *running.lock().unwrap() {
                let sleep_time = std::cmp::min(remaining, sleep_slice);
                thread::sleep(sleep_time);
                remaining = remaining.saturating_sub(sleep_time);
            }

            if !*running.lock().unwrap() {
                break;
            }

            // Re-read the threshold on every tick; settings changes apply on
            // the next tick without a session restart.
            let threshold = match profile.lock() {
                Ok(profile) => profile.noise_sensitivity,
                Err(e) => {
                    error!("Profile lock poisoned, stopping session: {}", e);
                    break;
                }
            };

            let now = Utc::now();
            let outcome = simulator.tick(threshold, now);
            debug!(
                "Tick: level={} threshold={} alert={}",
                outcome.level,
                threshold,
                outcome.alert.is_some()
            );

            let reading = NoiseReading {
                timestamp: now,
                level: outcome.level,
            };
            if let Err(e) = channel.send(reading) {
                warn!("Failed to send noise reading to channel: {}", e);
                break;
            }

            if let Some(alert) = outcome.alert {
                info!(
                    "High noise alert: {} dB exceeds threshold {} dB",
                    alert.level, alert.threshold
                );
                if let Err(e) = sink.deliver(&alert) {
                    error!("Failed to deliver noise alert: {}", e);
                }
            }
        }

        // Reset running flag when thread exits
        {
            let mut running_flag = running.lock().unwrap();
            *running_flag = false;
        }

        info!("NoiseSession thread finished");
    }
}

impl Drop for NoiseSession {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::MemorySink;
    use crate::simulator::noise::ScriptedDeltas;
    use std::sync::mpsc;

    fn test_profile(sensitivity: i32) -> Arc<Mutex<UserProfile>> {
        let mut profile = UserProfile::default_for("tester");
        profile.noise_sensitivity = sensitivity;
        Arc::new(Mutex::new(profile))
    }

    fn fast_session(
        sensitivity: i32,
        initial_level: i32,
        sink: Arc<dyn AlertSink>,
        channel: Sender<NoiseReading>,
    ) -> NoiseSession {
        NoiseSession::new(
            Duration::from_millis(10),
            chrono::Duration::milliseconds(60_000),
            initial_level,
            test_profile(sensitivity),
            sink,
            channel,
        )
    }

    #[test]
    fn test_session_creation() {
        let (tx, _rx) = mpsc::channel();
        let session = fast_session(70, 45, Arc::new(MemorySink::new()), tx);
        assert!(!session.is_running());
    }

    #[test]
    fn test_session_start_stop() {
        let (tx, _rx) = mpsc::channel();
        let mut session = fast_session(70, 45, Arc::new(MemorySink::new()), tx);

        assert!(session.start().is_ok());
        assert!(session.is_running());

        assert!(session.stop().is_ok());
        assert!(!session.is_running());
    }

    #[test]
    fn test_session_double_start() {
        let (tx, _rx) = mpsc::channel();
        let mut session = fast_session(70, 45, Arc::new(MemorySink::new()), tx);

        assert!(session.start().is_ok());
        assert!(session.start().is_ok()); // Should not error
        assert!(session.is_running());
        assert!(session.stop().is_ok());
    }

    #[test]
    fn test_session_stop_when_not_running() {
        let (tx, _rx) = mpsc::channel();
        let mut session = fast_session(70, 45, Arc::new(MemorySink::new()), tx);

        assert!(session.stop().is_ok());
        assert!(!session.is_running());
    }

    #[test]
    fn test_session_emits_readings() {
        let (tx, rx) = mpsc::channel();
        let mut session = fast_session(70, 45, Arc::new(MemorySink::new()), tx)
            .with_delta_source(Box::new(ScriptedDeltas::new(vec![1, -1])));

        session.start().unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.level, 46);
        assert_eq!(second.level, 45);

        session.stop().unwrap();
    }

    #[test]
    fn test_no_readings_after_stop() {
        let (tx, rx) = mpsc::channel();
        let mut session = fast_session(70, 45, Arc::new(MemorySink::new()), tx);

        session.start().unwrap();
        let _ = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        session.stop().unwrap();

        // The thread has joined; drain anything sent before the stop and
        // verify nothing arrives afterwards.
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_session_delivers_alert_to_sink() {
        let sink = Arc::new(MemorySink::new());
        let (tx, rx) = mpsc::channel();
        let mut session = fast_session(35, 95, Arc::clone(&sink) as Arc<dyn AlertSink>, tx)
            .with_delta_source(Box::new(ScriptedDeltas::new(vec![0])));

        session.start().unwrap();
        let reading = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        session.stop().unwrap();

        assert_eq!(reading.level, 95);
        let delivered = sink.delivered();
        assert!(!delivered.is_empty());
        assert_eq!(delivered[0].level, 95);
        assert_eq!(delivered[0].threshold, 35);
    }

    #[test]
    fn test_quiet_session_delivers_no_alerts() {
        let sink = Arc::new(MemorySink::new());
        let (tx, rx) = mpsc::channel();
        let mut session = fast_session(70, 40, Arc::clone(&sink) as Arc<dyn AlertSink>, tx)
            .with_delta_source(Box::new(ScriptedDeltas::new(vec![0])));

        session.start().unwrap();
        let _ = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let _ = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        session.stop().unwrap();

        assert!(sink.delivered().is_empty());
    }

    #[test]
    fn test_sensitivity_change_applies_to_next_tick() {
        let sink = Arc::new(MemorySink::new());
        let profile = test_profile(70);
        let (tx, rx) = mpsc::channel();
        let mut session = NoiseSession::new(
            Duration::from_millis(10),
            chrono::Duration::milliseconds(60_000),
            60,
            Arc::clone(&profile),
            Arc::clone(&sink) as Arc<dyn AlertSink>,
            tx,
        )
        .with_delta_source(Box::new(ScriptedDeltas::new(vec![0])));

        session.start().unwrap();
        let _ = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(sink.delivered().is_empty());

        profile.lock().unwrap().noise_sensitivity = 50;

        // The lowered threshold must take effect without restarting the
        // session; wait for a few more ticks to observe it.
        let mut fired = false;
        for _ in 0..10 {
            if rx.recv_timeout(Duration::from_secs(5)).is_err() {
                break;
            }
            if !sink.delivered().is_empty() {
                fired = true;
                break;
            }
        }
        session.stop().unwrap();
        assert!(fired);
    }

    #[test]
    fn test_drop_stops_running_session() {
        let (tx, rx) = mpsc::channel();
        let mut session = fast_session(70, 45, Arc::new(MemorySink::new()), tx);
        session.start().unwrap();
        let running = Arc::clone(&session.running);

        drop(session);

        assert!(!*running.lock().unwrap());
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err());
    }
}
