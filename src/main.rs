use clap::Parser;
use log::{debug, error, info, warn};
use mimo::alerts::{AlertSink, DesktopNotifier};
use mimo::config::{Config, ProfileBackendConfig};
use mimo::error::{ConfigError, SessionError};
use mimo::events::NoiseReading;
use mimo::profile::{
    Account, MockProfileStore, ProfileCache, ProfileService, ProfileStore, RestProfileStore,
};
use mimo::simulator::NoiseSession;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Command-line arguments for the noise monitor
#[derive(Parser)]
#[command(
    name = "mimo",
    about = "Quiet navigation noise monitor - ambient noise simulation and alerting",
    long_about = "Session-scoped background monitor for the Mimo quiet-navigation app: \
                  simulates a bounded ambient noise level on a fixed tick, compares it to \
                  the signed-in user's noise tolerance, and raises rate-limited desktop \
                  alerts when the tolerance is exceeded."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// User id to sign in as
    #[arg(
        short,
        long,
        value_name = "UID",
        default_value = "local",
        help = "User id whose profile gates the alerts"
    )]
    user: String,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,
}

impl Cli {
    /// Validate the CLI arguments
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Only validate that it's not a directory if it exists.
            // Missing files are handled gracefully by falling back to defaults.
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        if self.user.trim().is_empty() {
            return Err("User id must not be empty".to_string());
        }

        Ok(())
    }

    /// Convert config path to string safely, handling non-UTF-8 paths
    fn config_path_str(&self) -> Result<Option<&str>, String> {
        match &self.config {
            Some(path) => match path.to_str() {
                Some(path_str) => Ok(Some(path_str)),
                None => Err(format!(
                    "Configuration file path contains invalid UTF-8 characters: {}",
                    path.display()
                )),
            },
            None => Ok(None),
        }
    }
}

/// Main application struct that wires the monitor together
///
/// NoiseMonitor signs the user in through the profile service, hands the
/// shared profile to the session scheduler, and drains the readings channel
/// on a logger thread. It manages component lifecycles and handles graceful
/// shutdown.
pub struct NoiseMonitor {
    /// Noise monitoring session
    session: NoiseSession,

    /// Channel carrying sampled readings out of the session
    reading_receiver: Receiver<NoiseReading>,

    /// Shutdown signal
    shutdown_sender: Sender<()>,
    shutdown_receiver: Receiver<()>,

    /// Additional shutdown senders for threads
    shutdown_senders: Vec<Sender<()>>,

    /// Thread handles for cleanup
    thread_handles: Vec<JoinHandle<()>>,
}

impl NoiseMonitor {
    /// Create a new NoiseMonitor and sign in the given user
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid or the async
    /// runtime cannot be created.
    pub fn new(config: Config, uid: &str) -> Result<Self, ConfigError> {
        info!("Initializing NoiseMonitor for user {}", uid);
        config.validate()?;

        let store: Arc<dyn ProfileStore> = match &config.profile.backend {
            ProfileBackendConfig::Rest { endpoint } => {
                Arc::new(RestProfileStore::new(endpoint.clone()))
            }
            ProfileBackendConfig::Mock => Arc::new(MockProfileStore::new()),
        };
        let cache = ProfileCache::new(config.profile.cache_dir.clone());
        let profile_service = ProfileService::new(store, cache);

        // Sign in: fetch the profile or create it, with local fallback
        let rt = tokio::runtime::Runtime::new()?;
        let account = Account::new(uid);
        let profile = rt.block_on(profile_service.fetch_or_create(&account));
        info!(
            "Signed in as {} (sensitivity {} dB)",
            profile.display_name, profile.noise_sensitivity
        );
        let profile = Arc::new(Mutex::new(profile));

        let sink: Arc<dyn AlertSink> = if config.alerts.mock {
            Arc::new(DesktopNotifier::new_for_testing())
        } else {
            Arc::new(DesktopNotifier::new())
        };

        let (reading_sender, reading_receiver) = mpsc::channel();
        let (shutdown_sender, shutdown_receiver) = mpsc::channel();

        let session = NoiseSession::new(
            Duration::from_millis(config.monitor.tick_interval_ms),
            chrono::Duration::milliseconds(config.monitor.cooldown_ms as i64),
            config.monitor.initial_level,
            Arc::clone(&profile),
            sink,
            reading_sender,
        );

        Ok(NoiseMonitor {
            session,
            reading_receiver,
            shutdown_sender,
            shutdown_receiver,
            shutdown_senders: Vec::new(),
            thread_handles: Vec::new(),
        })
    }

    /// Load configuration from file or use defaults
    pub fn load_config(config_path: Option<&str>) -> Result<Config, ConfigError> {
        match config_path {
            Some(path) => {
                info!("Loading configuration from: {}", path);
                match Config::from_file(std::path::Path::new(path)) {
                    Ok(config) => Ok(config),
                    Err(ConfigError::ReadError(_)) => {
                        warn!(
                            "Configuration file '{}' not found or unreadable, using defaults",
                            path
                        );
                        Ok(Config::default())
                    }
                    Err(e) => {
                        // Report errors and use safe default values for invalid configuration
                        error!("Configuration error in '{}': {}", path, e);
                        warn!("Using default configuration due to invalid config file");
                        Ok(Config::default())
                    }
                }
            }
            None => {
                info!("Using default configuration");
                Ok(Config::default())
            }
        }
    }

    /// Start the monitor and all its components
    pub fn start(&mut self) -> Result<(), SessionError> {
        info!("Starting NoiseMonitor components");

        let reading_thread = self.spawn_reading_thread();
        self.thread_handles.push(reading_thread);

        self.session.start()?;
        info!("All NoiseMonitor components started successfully");
        Ok(())
    }

    /// Stop the monitor and all its components
    pub fn stop(&mut self) -> Result<(), SessionError> {
        info!("Stopping NoiseMonitor components");

        for sender in &self.shutdown_senders {
            if let Err(e) = sender.send(()) {
                error!("Failed to send shutdown signal to thread: {}", e);
            }
        }

        if let Err(e) = self.session.stop() {
            error!("Failed to stop noise session: {}", e);
        }

        for handle in self.thread_handles.drain(..) {
            if let Err(e) = handle.join() {
                error!("Thread failed to join: {:?}", e);
            }
        }

        info!("NoiseMonitor stopped successfully");
        Ok(())
    }

    /// Wait for shutdown signal (blocking)
    pub fn wait_for_shutdown(&self) -> Result<(), SessionError> {
        info!("Waiting for shutdown signal...");

        match self.shutdown_receiver.recv() {
            Ok(()) => {
                info!("Shutdown signal received");
                Ok(())
            }
            Err(e) => {
                error!("Error waiting for shutdown: {}", e);
                Err(SessionError::ThreadTerminated(e.to_string()))
            }
        }
    }

    /// Spawn the thread that drains and logs sampled readings
    fn spawn_reading_thread(&mut self) -> JoinHandle<()> {
        // Create a dedicated shutdown channel for this thread
        let (shutdown_sender, shutdown_receiver) = mpsc::channel();
        self.shutdown_senders.push(shutdown_sender);

        // Move the reading_receiver into the thread
        let reading_receiver = std::mem::replace(&mut self.reading_receiver, {
            let (_, dummy_receiver) = mpsc::channel();
            dummy_receiver
        });

        std::thread::spawn(move || {
            info!("Reading thread started");

            loop {
                // Check for shutdown signal (non-blocking)
                if shutdown_receiver.try_recv().is_ok() {
                    info!("Reading thread received shutdown signal");
                    break;
                }

                match reading_receiver.recv_timeout(Duration::from_millis(100)) {
                    Ok(reading) => {
                        debug!("Ambient noise: {} dB at {}", reading.level, reading.timestamp);
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        // Timeout is expected, continue
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        info!("Reading receiver disconnected");
                        break;
                    }
                }
            }

            info!("Reading thread stopped");
        })
    }
}

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    info!("Starting Mimo noise monitor");

    // Validate CLI arguments
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    // Load configuration with safe path handling
    let config_path = match cli.config_path_str() {
        Ok(path) => path,
        Err(e) => {
            error!("Invalid configuration path: {}", e);
            std::process::exit(1);
        }
    };

    let config = match NoiseMonitor::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Create the monitor (this signs the user in)
    let mut monitor = match NoiseMonitor::new(config, &cli.user) {
        Ok(monitor) => monitor,
        Err(e) => {
            error!("Failed to initialize NoiseMonitor: {}", e);
            std::process::exit(1);
        }
    };

    info!("NoiseMonitor initialized successfully");

    // Start the monitor
    if let Err(e) = monitor.start() {
        error!("Failed to start NoiseMonitor: {}", e);
        std::process::exit(1);
    }

    // Set up signal handling for graceful shutdown (SIGINT)
    let shutdown_sender = monitor.shutdown_sender.clone();
    ctrlc::set_handler(move || {
        info!("Received interrupt signal (SIGINT), shutting down gracefully...");
        if let Err(e) = shutdown_sender.send(()) {
            error!("Failed to send shutdown signal: {}", e);
        }
    })
    .expect("Error setting SIGINT handler for graceful shutdown");

    info!("Noise monitor is running. Press Ctrl+C to stop.");

    // Wait for shutdown
    if let Err(e) = monitor.wait_for_shutdown() {
        error!("Error during shutdown wait: {}", e);
    }

    // Stop the monitor
    if let Err(e) = monitor.stop() {
        error!("Error during shutdown: {}", e);
        std::process::exit(1);
    }

    info!("NoiseMonitor shutdown complete");
}
