//! Plugin manifest parsing
//!
//! A manifest is a small text resource stored at `META-INF/MANIFEST.MF`
//! relative to a candidate root. It uses the line-oriented `Name: value`
//! format familiar from jar files:
//!
//! ```text
//! Manifest-Version: 1.0
//! Loader-Id: example
//! Plugin-Version: 2.1.0
//!
//! Name: com/example/Entry
//! Sealed: true
//! ```
//!
//! The first block holds the main attributes. Later blocks, separated by a
//! blank line, are per-entry sections headed by a `Name` attribute. A line
//! starting with a single space continues the previous value.

use std::io::Read;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ScoutError};

/// Conventional directory holding the manifest and plugin metadata.
pub const META_INF: &str = "META-INF";

/// Location of the manifest resource relative to a candidate root.
pub const MANIFEST_LOCATION: &str = "META-INF/MANIFEST.MF";

/// Main attribute naming the loader allowed to load the candidate.
pub const LOADER_ATTRIBUTE: &str = "Loader-Id";

/// Main attribute carrying the plugin's version string.
pub const VERSION_ATTRIBUTE: &str = "Plugin-Version";

static ATTRIBUTE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,70}$").expect("attribute name pattern is valid")
});

/// Entry path of a metadata file inside an archive, e.g. `META-INF/plugins.json`.
pub fn metadata_entry(file_name: &str) -> String {
    format!("{}/{}", META_INF, file_name)
}

/// An ordered set of attributes. Names compare ASCII case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Look up an attribute value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A repeated name replaces the earlier value but keeps its position.
    fn insert(&mut self, name: String, value: String) {
        match self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    fn append_to_last(&mut self, continuation: &str) -> bool {
        match self.entries.last_mut() {
            Some((_, value)) => {
                value.push_str(continuation);
                true
            }
            None => false,
        }
    }
}

/// Where the parser is between lines.
enum Block {
    Main,
    /// After a blank line, waiting for the next `Name:` header.
    Between,
    Section(String, Attributes),
}

/// A parsed, read-only manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    main: Attributes,
    sections: Vec<(String, Attributes)>,
}

impl Manifest {
    /// Parse manifest text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut manifest = Manifest::default();
        let mut block = Block::Main;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = line.strip_suffix('\r').unwrap_or(line);

            if line.is_empty() {
                if let Block::Section(name, attrs) = std::mem::replace(&mut block, Block::Between) {
                    manifest.sections.push((name, attrs));
                }
                continue;
            }

            if let Some(continuation) = line.strip_prefix(' ') {
                let extended = match &mut block {
                    Block::Main => manifest.main.append_to_last(continuation),
                    Block::Section(_, attrs) => attrs.append_to_last(continuation),
                    Block::Between => false,
                };
                if !extended {
                    return Err(ScoutError::Manifest(format!(
                        "line {}: continuation line without a preceding attribute",
                        line_no
                    )));
                }
                continue;
            }

            let (name, value) = split_attribute(line, line_no)?;
            match &mut block {
                Block::Main => manifest.main.insert(name, value),
                Block::Section(_, attrs) => attrs.insert(name, value),
                Block::Between => {
                    if !name.eq_ignore_ascii_case("Name") {
                        return Err(ScoutError::Manifest(format!(
                            "line {}: entry section must start with 'Name', found '{}'",
                            line_no, name
                        )));
                    }
                    let mut attrs = Attributes::default();
                    attrs.insert(name, value.clone());
                    block = Block::Section(value, attrs);
                }
            }
        }

        if let Block::Section(name, attrs) = block {
            manifest.sections.push((name, attrs));
        }

        Ok(manifest)
    }

    /// Read and parse a manifest from a byte stream.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| ScoutError::Manifest(format!("manifest is not valid UTF-8: {}", e)))?;
        Self::parse(&text)
    }

    /// The main attribute section.
    pub fn main_attributes(&self) -> &Attributes {
        &self.main
    }

    /// Look up a main attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.main.get(name)
    }

    /// The declared loader identifier, if any.
    pub fn loader(&self) -> Option<&str> {
        self.get(LOADER_ATTRIBUTE)
    }

    /// A per-entry section by its `Name` value (exact match).
    pub fn section(&self, name: &str) -> Option<&Attributes> {
        self.sections
            .iter()
            .find(|(section_name, _)| section_name == name)
            .map(|(_, attrs)| attrs)
    }

    /// Per-entry sections in declaration order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Attributes)> {
        self.sections.iter().map(|(name, attrs)| (name.as_str(), attrs))
    }
}

impl FromStr for Manifest {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn split_attribute(line: &str, line_no: usize) -> Result<(String, String)> {
    let (name, value) = match line.split_once(':') {
        Some((name, "")) => (name, ""),
        Some((name, rest)) => match rest.strip_prefix(' ') {
            Some(value) => (name, value),
            None => {
                return Err(ScoutError::Manifest(format!(
                    "line {}: expected ': ' after attribute name '{}'",
                    line_no, name
                )))
            }
        },
        None => {
            return Err(ScoutError::Manifest(format!(
                "line {}: expected 'Name: value', found '{}'",
                line_no, line
            )))
        }
    };

    if !ATTRIBUTE_NAME.is_match(name) {
        return Err(ScoutError::Manifest(format!(
            "line {}: invalid attribute name '{}'",
            line_no, name
        )));
    }

    Ok((name.to_string(), value.to_string()))
}
