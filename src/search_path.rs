//! The resource search path.
//!
//! A search path is an ordered list of roots, each either a directory or an
//! archive file, much like a class path. Looking up a resource name yields a
//! locator for every root that contains it, in search-path order.

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::archive::PluginArchive;
use crate::error::{Result, ScoutError};
use crate::locator::{archive_locator, file_locator};

/// Environment variable read by `SearchPath::from_env`.
pub const SEARCH_PATH_VAR: &str = "PLUGINSCOUT_SEARCH_PATH";

/// Source of resource locators for search-path discovery.
pub trait ResourceEnumerator {
    /// Every locator for `name` visible on this search path.
    ///
    /// An `Err` means the search path could not be queried at all.
    fn resources(&self, name: &str) -> Result<Vec<String>>;
}

/// Ordered directory and archive roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    /// Parse a platform path list (`:`-separated on Unix, `;` on Windows).
    pub fn parse(list: &OsStr) -> Self {
        Self::new(
            std::env::split_paths(list)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
        )
    }

    /// Read `PLUGINSCOUT_SEARCH_PATH`; unset means an empty search path.
    pub fn from_env() -> Self {
        match std::env::var_os(SEARCH_PATH_VAR) {
            Some(list) => Self::parse(&list),
            None => Self::default(),
        }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn push(&mut self, entry: PathBuf) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceEnumerator for SearchPath {
    fn resources(&self, name: &str) -> Result<Vec<String>> {
        let cwd = std::env::current_dir().map_err(|e| {
            ScoutError::Enumeration(format!("cannot resolve working directory: {}", e))
        })?;
        let mut found = Vec::new();

        for entry in &self.entries {
            let root = cwd.join(entry);
            let metadata = match fs::metadata(&root) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    trace!(entry = %root.display(), "Search path entry does not exist");
                    continue;
                }
                Err(e) => {
                    debug!(
                        entry = %root.display(),
                        error = %e,
                        "Cannot inspect search path entry, skipping"
                    );
                    continue;
                }
            };

            let locator = if metadata.is_dir() {
                let resource = root.join(name);
                if !resource.is_file() {
                    continue;
                }
                file_locator(&resource)
            } else if metadata.is_file() && archive_contains(&root, name) {
                archive_locator(&root, name)
            } else {
                continue;
            };

            match locator {
                Ok(locator) => found.push(locator),
                Err(e) => debug!(
                    entry = %root.display(),
                    error = %e,
                    "Search path entry has no locator, skipping"
                ),
            }
        }

        Ok(found)
    }
}

/// Unreadable archives on the search path simply contribute nothing.
fn archive_contains(path: &Path, name: &str) -> bool {
    match PluginArchive::open(path) {
        Ok(mut archive) => archive.has_entry(name),
        Err(e) => {
            trace!(entry = %path.display(), error = %e, "Search path entry is not an archive");
            false
        }
    }
}
