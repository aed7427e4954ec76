//! Read-only access to plugin archives.
//!
//! A `PluginArchive` owns the open file for as long as one candidate is being
//! inspected. Dropping it closes the file, so every early return in the
//! discovery loops releases the handle before the next candidate is opened.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{Result, ScoutError};
use crate::manifest::{Manifest, MANIFEST_LOCATION};

/// An open plugin archive.
pub struct PluginArchive {
    path: PathBuf,
    zip: ZipArchive<BufReader<File>>,
}

impl PluginArchive {
    /// Open `path` as a zip archive.
    ///
    /// # Errors
    /// - `ScoutError::Io` if the file cannot be opened
    /// - `ScoutError::Archive` if the file is not a readable zip archive
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let zip = ZipArchive::new(BufReader::new(file))?;
        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    /// Path of the archive file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the embedded `META-INF/MANIFEST.MF`.
    ///
    /// Returns `Ok(None)` when the archive has no manifest entry.
    pub fn manifest(&mut self) -> Result<Option<Manifest>> {
        let entry = match self.zip.by_name(MANIFEST_LOCATION) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(ScoutError::Archive(e)),
        };
        Manifest::from_reader(entry).map(Some)
    }

    /// Whether a regular (non-directory) entry named `name` exists.
    pub fn has_entry(&mut self, name: &str) -> bool {
        match self.zip.by_name(name) {
            Ok(entry) => !entry.is_dir(),
            Err(_) => false,
        }
    }

    /// Read a whole entry into memory.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self.zip.by_name(name).map_err(|e| match e {
            ZipError::FileNotFound => ScoutError::NotFound(format!(
                "{} in {}",
                name,
                self.path.display()
            )),
            other => ScoutError::Archive(other),
        })?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Number of entries in the archive.
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zip.len() == 0
    }
}

impl std::fmt::Debug for PluginArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginArchive")
            .field("path", &self.path)
            .field("entries", &self.zip.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Helpers for writing fixture archives in tests.

    use std::fs::File;
    use std::io::Write;
    use std::path::Path;

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Write a zip archive at `path` with the given `(entry, contents)` pairs.
    pub fn write_archive(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    /// Write a plugin archive declaring `loader` and carrying `metadata` under META-INF.
    pub fn write_plugin(path: &Path, loader: &str, metadata: &str) {
        let manifest = format!("Manifest-Version: 1.0\nLoader-Id: {}\n", loader);
        let metadata_entry = format!("META-INF/{}", metadata);
        write_archive(
            path,
            &[
                ("META-INF/MANIFEST.MF", manifest.as_str()),
                (metadata_entry.as_str(), "{}"),
            ],
        );
    }
}
