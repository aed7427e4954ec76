//! Discovery configuration
//!
//! Configuration lives in `~/.pluginscout/config.json`:
//!
//! ```json
//! {
//!   "plugin_dirs": ["~/.pluginscout/plugins", "/opt/app/plugins"],
//!   "search_path": ["/opt/app/lib/core.jar", "/opt/app/build/classes"],
//!   "strategies": ["search-path", "directory"]
//! }
//! ```
//!
//! Every field is optional. `PLUGINSCOUT_PLUGIN_DIRS` and
//! `PLUGINSCOUT_SEARCH_PATH` (platform path lists) replace the corresponding
//! lists when set.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::discover::DiscoverStrategy;
use crate::error::{Result, ScoutError};
use crate::search_path::SEARCH_PATH_VAR;

/// Environment variable replacing `plugin_dirs`.
pub const PLUGIN_DIRS_VAR: &str = "PLUGINSCOUT_PLUGIN_DIRS";

/// Resolved discovery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directories walked by directory discovery, in order.
    pub plugin_dirs: Vec<String>,

    /// Directory and archive roots searched by search-path discovery.
    pub search_path: Vec<String>,

    /// Strategies run by `discover_all`, in order.
    pub strategies: Vec<DiscoverStrategy>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            plugin_dirs: vec!["~/.pluginscout/plugins".to_string()],
            search_path: Vec::new(),
            strategies: DiscoverStrategy::ALL.to_vec(),
        }
    }
}

impl DiscoveryConfig {
    /// The pluginscout home directory (`~/.pluginscout`).
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pluginscout")
    }

    /// Default config file location.
    pub fn default_path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration and apply environment overrides.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ScoutError::NotFound(format!(
                        "config file {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    debug!(path = %default_path.display(), "No config file, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_overrides(
            std::env::var_os(PLUGIN_DIRS_VAR),
            std::env::var_os(SEARCH_PATH_VAR),
        );
        config.validate()?;
        Ok(config)
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScoutError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&content)?;
        info!(path = %path.display(), "Loaded discovery config");
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Replace list fields with path-list overrides when given.
    pub fn apply_overrides(&mut self, plugin_dirs: Option<OsString>, search_path: Option<OsString>) {
        if let Some(list) = plugin_dirs {
            self.plugin_dirs = split_path_list(&list);
            debug!(count = self.plugin_dirs.len(), "plugin_dirs overridden from environment");
        }
        if let Some(list) = search_path {
            self.search_path = split_path_list(&list);
            debug!(count = self.search_path.len(), "search_path overridden from environment");
        }
    }

    /// Reject configurations that could never discover anything.
    pub fn validate(&self) -> Result<()> {
        if self.strategies.is_empty() {
            return Err(ScoutError::Config(
                "at least one discovery strategy must be enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// `plugin_dirs` with `~` expanded.
    pub fn plugin_dir_paths(&self) -> Vec<PathBuf> {
        self.plugin_dirs.iter().map(|d| expand_tilde(d)).collect()
    }

    /// `search_path` with `~` expanded.
    pub fn search_path_entries(&self) -> Vec<PathBuf> {
        self.search_path.iter().map(|d| expand_tilde(d)).collect()
    }
}

/// Expand a leading `~` or `~/` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn split_path_list(list: &OsString) -> Vec<String> {
    std::env::split_paths(list)
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.plugin_dirs, vec!["~/.pluginscout/plugins"]);
        assert!(config.search_path.is_empty());
        assert_eq!(
            config.strategies,
            vec![DiscoverStrategy::SearchPath, DiscoverStrategy::Directory]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = DiscoveryConfig::from_json(r#"{"plugin_dirs": ["/opt/plugins"]}"#).unwrap();
        assert_eq!(config.plugin_dirs, vec!["/opt/plugins"]);
        assert_eq!(config.strategies.len(), 2);
    }

    #[test]
    fn test_from_json_strategies() {
        let config = DiscoveryConfig::from_json(r#"{"strategies": ["directory"]}"#).unwrap();
        assert_eq!(config.strategies, vec![DiscoverStrategy::Directory]);
    }

    #[test]
    fn test_from_json_unknown_strategy_is_error() {
        let result = DiscoveryConfig::from_json(r#"{"strategies": ["network"]}"#);
        assert!(matches!(result, Err(ScoutError::Json(_))));
    }

    #[test]
    fn test_empty_strategies_fail_validation() {
        let config = DiscoveryConfig::from_json(r#"{"strategies": []}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least one discovery strategy"));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = DiscoveryConfig::load(Some(&tmp.path().join("nope.json")));
        assert!(matches!(result, Err(ScoutError::NotFound(_))));
    }

    #[test]
    fn test_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"search_path": ["/opt/lib/core.jar"]}"#).unwrap();

        let config = DiscoveryConfig::from_file(&path).unwrap();
        assert_eq!(config.search_path, vec!["/opt/lib/core.jar"]);
    }

    #[test]
    fn test_from_file_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ broken").unwrap();
        assert!(DiscoveryConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = DiscoveryConfig::default();
        let dirs = std::env::join_paths(["/one", "/two"].iter()).unwrap();
        config.apply_overrides(Some(dirs), None);
        assert_eq!(config.plugin_dirs, vec!["/one", "/two"]);
        assert!(config.search_path.is_empty());

        let search = std::env::join_paths(["/lib/a.jar"].iter()).unwrap();
        config.apply_overrides(None, Some(search));
        assert_eq!(config.search_path, vec!["/lib/a.jar"]);
        assert_eq!(config.plugin_dirs, vec!["/one", "/two"]);
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("relative"), PathBuf::from("relative"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/plugins"), home.join("plugins"));
        }
        // Only a leading `~/` is expanded
        assert_eq!(expand_tilde("~user/x"), PathBuf::from("~user/x"));
    }

    #[test]
    fn test_plugin_dir_paths_preserve_order_and_duplicates() {
        let config = DiscoveryConfig {
            plugin_dirs: vec!["/b".into(), "/a".into(), "/b".into()],
            ..Default::default()
        };
        assert_eq!(
            config.plugin_dir_paths(),
            vec![PathBuf::from("/b"), PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }
}
