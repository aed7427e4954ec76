//! The requesting service.
//!
//! Discovery runs on behalf of a loader. The loader tells discovery its name
//! (matched against each manifest's `Loader-Id`), which metadata file a
//! plugin must ship under `META-INF/`, and how to judge whether a manifest is
//! structurally usable for it.

use regex::Regex;

use crate::environment::PluginEnvironment;
use crate::error::{Result, ScoutError};
use crate::manifest::{Manifest, VERSION_ATTRIBUTE};

/// A loader asking discovery for its candidates.
pub trait PluginLanguageService {
    /// Loader identifier matched exactly against `Loader-Id`.
    fn name(&self) -> &str;

    /// File name expected under `META-INF/` of every candidate.
    fn metadata_file_name(&self) -> &str;

    /// Loader-specific structural check of a manifest whose `Loader-Id`
    /// already matched.
    fn is_valid_manifest(&self, environment: &PluginEnvironment, manifest: &Manifest) -> bool;
}

/// A service configured entirely from data: a name, a metadata file, and
/// the main attributes every manifest must carry.
///
/// # Example
///
/// ```rust
/// use pluginscout::service::{AttributeService, PluginLanguageService};
///
/// let service = AttributeService::new("example", "example-plugin.json")
///     .require_attribute("Plugin-Class");
/// assert_eq!(service.name(), "example");
/// ```
#[derive(Debug, Clone)]
pub struct AttributeService {
    name: String,
    metadata_file_name: String,
    required_attributes: Vec<String>,
    version_pattern: Option<Regex>,
}

impl AttributeService {
    pub fn new(name: impl Into<String>, metadata_file_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata_file_name: metadata_file_name.into(),
            required_attributes: Vec::new(),
            version_pattern: None,
        }
    }

    /// Require a non-empty main attribute.
    pub fn require_attribute(mut self, name: impl Into<String>) -> Self {
        self.required_attributes.push(name.into());
        self
    }

    /// Require `Plugin-Version` to be present and match `pattern`.
    pub fn with_version_pattern(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            ScoutError::Config(format!("Invalid version pattern '{}': {}", pattern, e))
        })?;
        self.version_pattern = Some(regex);
        Ok(self)
    }

    pub fn required_attributes(&self) -> &[String] {
        &self.required_attributes
    }
}

impl PluginLanguageService for AttributeService {
    fn name(&self) -> &str {
        &self.name
    }

    fn metadata_file_name(&self) -> &str {
        &self.metadata_file_name
    }

    fn is_valid_manifest(&self, _environment: &PluginEnvironment, manifest: &Manifest) -> bool {
        let attributes_present = self.required_attributes.iter().all(|name| {
            manifest
                .get(name)
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false)
        });
        if !attributes_present {
            return false;
        }

        match &self.version_pattern {
            Some(pattern) => manifest
                .get(VERSION_ATTRIBUTE)
                .map(|version| pattern.is_match(version))
                .unwrap_or(false),
            None => true,
        }
    }
}
