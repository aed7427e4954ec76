//! The discovery environment.
//!
//! Discovery never talks to a logging backend or reads configuration
//! directly. Everything it needs from the outside world comes through a
//! `PluginEnvironment`: a log sink, the configured plugin directories, and
//! the resource search path.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::Level;

use crate::config::DiscoveryConfig;
use crate::search_path::{ResourceEnumerator, SearchPath};

const LOG_TARGET: &str = "pluginscout::discover";

/// Log sink used by the discovery strategies.
pub trait DiscoveryLog: Send + Sync {
    fn debug(&self, message: fmt::Arguments<'_>);
    fn error(&self, message: fmt::Arguments<'_>);
}

/// Forwards discovery messages to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl DiscoveryLog for TracingLog {
    fn debug(&self, message: fmt::Arguments<'_>) {
        tracing::debug!(target: LOG_TARGET, "{}", message);
    }

    fn error(&self, message: fmt::Arguments<'_>) {
        tracing::error!(target: LOG_TARGET, "{}", message);
    }
}

/// Keeps every message in memory, for embedders that surface discovery
/// diagnostics themselves.
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Mutex<Vec<(Level, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded `(level, message)` pairs in emission order.
    pub fn records(&self) -> Vec<(Level, String)> {
        self.lock().clone()
    }

    /// Messages recorded at `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn push(&self, level: Level, message: fmt::Arguments<'_>) {
        self.lock().push((level, message.to_string()));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Level, String)>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DiscoveryLog for MemoryLog {
    fn debug(&self, message: fmt::Arguments<'_>) {
        self.push(Level::DEBUG, message);
    }

    fn error(&self, message: fmt::Arguments<'_>) {
        self.push(Level::ERROR, message);
    }
}

/// Everything a discovery call reads from its surroundings.
pub struct PluginEnvironment {
    log: Arc<dyn DiscoveryLog>,
    plugin_dirs: Vec<PathBuf>,
    resources: Box<dyn ResourceEnumerator>,
}

impl PluginEnvironment {
    /// An environment with no plugin directories, an empty search path, and
    /// `tracing` logging.
    pub fn new() -> Self {
        Self {
            log: Arc::new(TracingLog),
            plugin_dirs: Vec::new(),
            resources: Box::new(SearchPath::default()),
        }
    }

    /// Build an environment from resolved configuration.
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new()
            .with_plugin_dirs(config.plugin_dir_paths())
            .with_resources(SearchPath::new(config.search_path_entries()))
    }

    pub fn with_log(mut self, log: Arc<dyn DiscoveryLog>) -> Self {
        self.log = log;
        self
    }

    pub fn with_plugin_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.plugin_dirs = dirs;
        self
    }

    pub fn with_resources<R: ResourceEnumerator + 'static>(mut self, resources: R) -> Self {
        self.resources = Box::new(resources);
        self
    }

    pub fn log(&self) -> &dyn DiscoveryLog {
        self.log.as_ref()
    }

    /// Configured plugin directories, in configuration order. May contain
    /// duplicates and paths that do not exist.
    pub fn plugin_dirs(&self) -> &[PathBuf] {
        &self.plugin_dirs
    }

    pub fn resources(&self) -> &dyn ResourceEnumerator {
        self.resources.as_ref()
    }
}

impl Default for PluginEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PluginEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginEnvironment")
            .field("plugin_dirs", &self.plugin_dirs)
            .finish_non_exhaustive()
    }
}
