use super::{ConfigStore, GuardConfig};
use log::{error, info, warn};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Watches the configuration file and swaps a fresh detection snapshot into
/// the store whenever it changes.
pub struct ConfigWatcher {
    config_path: String,
    debounce: Duration,
    watcher: Option<RecommendedWatcher>,
}

impl ConfigWatcher {
    pub fn new(config_path: &str, debounce_secs: u64) -> Self {
        Self {
            config_path: config_path.to_string(),
            debounce: Duration::from_secs(debounce_secs),
            watcher: None,
        }
    }

    /// Starts watching. The watcher stops when `self` is dropped.
    pub fn start_watching(&mut self, store: Arc<ConfigStore>) -> Result<(), String> {
        let (notify_tx, notify_rx) = mpsc::channel::<Result<Event, notify::Error>>();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = notify_tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )
        .map_err(|e| format!("Failed to create file watcher: {}", e))?;

        watcher
            .watch(Path::new(&self.config_path), RecursiveMode::NonRecursive)
            .map_err(|e| format!("Failed to watch config file: {}", e))?;
        self.watcher = Some(watcher);

        let config_path = self.config_path.clone();
        let debounce = self.debounce;
        thread::spawn(move || {
            let mut last_reload: Option<Instant> = None;

            loop {
                match notify_rx.recv_timeout(Duration::from_secs(5)) {
                    Ok(Ok(event)) => {
                        if !(event.kind.is_modify() || event.kind.is_create()) {
                            continue;
                        }
                        if last_reload.is_some_and(|t| t.elapsed() < debounce) {
                            continue;
                        }

                        // Let the writer finish
                        thread::sleep(Duration::from_millis(100));

                        match reload_config(&config_path) {
                            Ok(settings) => {
                                store.replace(&settings);
                                last_reload = Some(Instant::now());
                            }
                            Err(e) => {
                                error!("Failed to reload configuration: {}", e);
                                warn!("Keeping previous configuration");
                            }
                        }
                    }
                    Ok(Err(e)) => {
                        error!("File watch error: {}", e);
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        info!("Config watcher channel disconnected");
                        break;
                    }
                }
            }
        });

        info!("Started watching configuration file: {}", self.config_path);
        Ok(())
    }

    pub fn config_path(&self) -> &str {
        &self.config_path
    }

    pub fn is_enabled(&self) -> bool {
        self.watcher.is_some()
    }
}

/// Reload configuration from file
pub fn reload_config(path: &str) -> Result<GuardConfig, Box<dyn std::error::Error>> {
    info!("Reloading configuration from: {}", path);
    let config = GuardConfig::from_file(path)?;
    info!("Configuration reloaded successfully");
    Ok(config)
}
