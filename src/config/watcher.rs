//! Hot reload of the configuration file.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by renaming a temporary file over the original are still seen.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ServiceConfig;

/// Watches the configuration file and forwards every new valid config.
pub struct ConfigWatcher {
    path: PathBuf,
    reloader: Reloader,
}

impl ConfigWatcher {
    /// `current` is the config the service started with; reloads identical
    /// to the last forwarded config are not sent again.
    pub fn new(
        path: &Path,
        current: ServiceConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ServiceConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                reloader: Reloader::new(path, current, update_tx),
            },
            update_rx,
        )
    }

    /// Start watching on notify's background thread.
    ///
    /// The returned watcher must be kept alive for updates to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let mut reloader = self.reloader;
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => reloader.handle(&event),
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

struct Reloader {
    path: PathBuf,
    file_name: Option<OsString>,
    last_sent: ServiceConfig,
    tx: mpsc::UnboundedSender<ServiceConfig>,
}

impl Reloader {
    fn new(path: &Path, current: ServiceConfig, tx: mpsc::UnboundedSender<ServiceConfig>) -> Self {
        Self {
            path: path.to_path_buf(),
            file_name: path.file_name().map(ToOwned::to_owned),
            last_sent: current,
            tx,
        }
    }

    fn concerns_config(&self, event: &Event) -> bool {
        (event.kind.is_modify() || event.kind.is_create())
            && event
                .paths
                .iter()
                .any(|p| p.file_name().map(ToOwned::to_owned) == self.file_name)
    }

    fn handle(&mut self, event: &Event) {
        if !self.concerns_config(event) {
            return;
        }

        match load_config(&self.path) {
            Ok(config) if config == self.last_sent => {
                tracing::debug!(path = ?self.path, "Config file touched, content unchanged");
            }
            Ok(config) => {
                tracing::info!(path = ?self.path, "Config file changed, reloading");
                self.last_sent = config.clone();
                let _ = self.tx.send(config);
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = ?self.path,
                    "Failed to reload config, keeping current configuration"
                );
            }
        }
    }
}
