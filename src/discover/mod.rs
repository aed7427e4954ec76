//! Plugin candidate discovery
//!
//! Discovery finds the archives and exploded directories that declare
//! themselves loadable by a particular loader, without loading them. Two
//! strategies exist:
//!
//! - **search-path**: every `META-INF/MANIFEST.MF` reachable from the
//!   environment's resource search path, whether inside an archive or under
//!   a plain directory root
//! - **directory**: every regular file below the configured plugin
//!   directories, opened as an archive
//!
//! Both feed each manifest through the same acceptance test (see
//! [`validate`]). Rejected and unreadable candidates are logged through the
//! environment and skipped; only a search path that cannot be enumerated at
//! all fails the call.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use pluginscout::discover::{discover_all, DiscoverStrategy};
//! use pluginscout::environment::PluginEnvironment;
//! use pluginscout::service::AttributeService;
//!
//! let env = PluginEnvironment::new()
//!     .with_plugin_dirs(vec![PathBuf::from("/opt/app/plugins")]);
//! let service = AttributeService::new("example", "example-plugin.json");
//!
//! let candidates = discover_all(&env, &service, &DiscoverStrategy::ALL).unwrap();
//! for candidate in &candidates {
//!     println!("{}", candidate);
//! }
//! ```

mod directory;
mod search_path;
mod validate;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::environment::PluginEnvironment;
use crate::error::{Result, ScoutError};
use crate::service::PluginLanguageService;

pub use validate::{validate, CandidateRoot, Rejection};

/// A location that passed every acceptance check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "kebab-case")]
pub enum CandidateLocation {
    /// An archive file.
    Archive(PathBuf),
    /// The root of an exploded plugin directory.
    Directory(PathBuf),
}

impl CandidateLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::Archive(path) | Self::Directory(path) => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Self::Archive(path) | Self::Directory(path) => path,
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Archive(_))
    }
}

impl fmt::Display for CandidateLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

/// The available discovery strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoverStrategy {
    /// Manifests reachable from the resource search path.
    SearchPath,
    /// Archives below the configured plugin directories.
    Directory,
}

impl DiscoverStrategy {
    /// Every strategy, search path first.
    pub const ALL: [DiscoverStrategy; 2] = [DiscoverStrategy::SearchPath, DiscoverStrategy::Directory];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchPath => "search-path",
            Self::Directory => "directory",
        }
    }

    /// Run this strategy for `service`.
    ///
    /// # Errors
    /// `ScoutError::Enumeration` when the search path cannot be enumerated.
    /// Nothing else fails the call.
    pub fn discover(
        &self,
        environment: &PluginEnvironment,
        service: &dyn PluginLanguageService,
    ) -> Result<Vec<CandidateLocation>> {
        match self {
            Self::SearchPath => search_path::discover(environment, service),
            Self::Directory => Ok(directory::discover(environment, service)),
        }
    }
}

impl fmt::Display for DiscoverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DiscoverStrategy {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| ScoutError::Config(format!("Unknown discovery strategy '{}'", s)))
    }
}

/// Run `strategies` in order and concatenate their results.
///
/// Candidates are not deduplicated: a location reachable through two
/// strategies, or twice through one, appears once per sighting.
pub fn discover_all(
    environment: &PluginEnvironment,
    service: &dyn PluginLanguageService,
    strategies: &[DiscoverStrategy],
) -> Result<Vec<CandidateLocation>> {
    let mut candidates = Vec::new();
    for strategy in strategies {
        let found = strategy.discover(environment, service)?;
        tracing::debug!(
            strategy = %strategy,
            loader = service.name(),
            found = found.len(),
            "Discovery strategy finished"
        );
        candidates.extend(found);
    }
    Ok(candidates)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Test doubles shared by the discovery tests.

    use std::cell::Cell;

    use crate::environment::PluginEnvironment;
    use crate::manifest::Manifest;
    use crate::service::PluginLanguageService;

    /// A service whose manifest predicate returns a fixed answer and counts
    /// how often it was asked.
    pub struct CountingService {
        pub name: String,
        pub metadata: String,
        pub valid: bool,
        pub calls: Cell<usize>,
    }

    impl CountingService {
        pub fn new(name: &str, metadata: &str) -> Self {
            Self {
                name: name.to_string(),
                metadata: metadata.to_string(),
                valid: true,
                calls: Cell::new(0),
            }
        }

        pub fn rejecting(mut self) -> Self {
            self.valid = false;
            self
        }
    }

    impl PluginLanguageService for CountingService {
        fn name(&self) -> &str {
            &self.name
        }

        fn metadata_file_name(&self) -> &str {
            &self.metadata
        }

        fn is_valid_manifest(&self, _environment: &PluginEnvironment, _manifest: &Manifest) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.valid
        }
    }
}
