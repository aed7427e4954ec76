//! pluginscout - discover plugin archives and directories for a loader
//!
//! Given a resource search path and a set of plugin directories, pluginscout
//! finds every archive or exploded directory whose `META-INF/MANIFEST.MF`
//! declares the requesting loader, passes that loader's manifest check, and
//! ships the loader's metadata file under `META-INF/`. Nothing is loaded.

pub mod archive;
pub mod config;
pub mod discover;
pub mod environment;
pub mod error;
pub mod locator;
pub mod manifest;
pub mod search_path;
pub mod service;

pub use config::DiscoveryConfig;
pub use discover::{discover_all, CandidateLocation, DiscoverStrategy, Rejection};
pub use environment::{DiscoveryLog, MemoryLog, PluginEnvironment, TracingLog};
pub use error::{Result, ScoutError};
pub use manifest::Manifest;
pub use service::{AttributeService, PluginLanguageService};
