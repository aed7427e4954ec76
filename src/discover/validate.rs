//! The acceptance test shared by every discovery strategy.

use std::fmt;
use std::path::Path;

use crate::archive::PluginArchive;
use crate::environment::PluginEnvironment;
use crate::manifest::{metadata_entry, Manifest, META_INF};
use crate::service::PluginLanguageService;

use super::CandidateLocation;

/// Why a candidate was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The manifest has no `Loader-Id`.
    NoLoader,
    /// `Loader-Id` names a different loader.
    LoaderMismatch { declared: String },
    /// The requesting service rejected the manifest.
    InvalidManifest,
    /// `META-INF/<metadata file>` is absent.
    NoMetadata,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLoader => f.write_str("no loader declared"),
            Self::LoaderMismatch { .. } => f.write_str("loader mismatch"),
            Self::InvalidManifest => f.write_str("invalid manifest for loader"),
            Self::NoMetadata => f.write_str("no metadata"),
        }
    }
}

/// The root the metadata file is resolved against.
pub enum CandidateRoot<'a> {
    /// Metadata must be an entry of this archive.
    Archive(&'a mut PluginArchive),
    /// Metadata must be a regular file below this directory.
    Directory(&'a Path),
}

impl CandidateRoot<'_> {
    fn has_metadata(&mut self, file_name: &str) -> bool {
        match self {
            Self::Archive(archive) => archive.has_entry(&metadata_entry(file_name)),
            Self::Directory(root) => root.join(META_INF).join(file_name).is_file(),
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Archive(archive) => archive.path(),
            Self::Directory(root) => root,
        }
    }
}

/// Decide whether a manifest-bearing root is a candidate for `service`.
///
/// Checks run in a fixed order and stop at the first failure:
/// loader declared, loader matches `service.name()` exactly, the service
/// accepts the manifest, metadata file present. A missing manifest counts as
/// no loader declared.
pub fn validate(
    environment: &PluginEnvironment,
    manifest: Option<&Manifest>,
    root: &mut CandidateRoot<'_>,
    service: &dyn PluginLanguageService,
) -> Result<(), Rejection> {
    let log = environment.log();
    let location = root.path().display().to_string();

    let manifest = match manifest {
        Some(manifest) => manifest,
        None => {
            log.debug(format_args!(
                "'{}' has no manifest, so it declares no plugin loader. Skipping...",
                location
            ));
            return Err(Rejection::NoLoader);
        }
    };

    let declared = match manifest.loader() {
        Some(declared) => declared,
        None => {
            log.debug(format_args!(
                "Manifest of '{}' does not declare a plugin loader. Skipping...",
                location
            ));
            return Err(Rejection::NoLoader);
        }
    };

    if declared != service.name() {
        log.debug(format_args!(
            "'{}' declares loader '{}' but the requesting loader is '{}'. Skipping...",
            location,
            declared,
            service.name()
        ));
        return Err(Rejection::LoaderMismatch {
            declared: declared.to_string(),
        });
    }

    if !service.is_valid_manifest(environment, manifest) {
        log.error(format_args!(
            "Manifest of '{}' is not valid for loader '{}'. Skipping...",
            location,
            service.name()
        ));
        return Err(Rejection::InvalidManifest);
    }

    if !root.has_metadata(service.metadata_file_name()) {
        log.debug(format_args!(
            "'{}' has no {} so it is not a plugin. Skipping...",
            location,
            metadata_entry(service.metadata_file_name())
        ));
        return Err(Rejection::NoMetadata);
    }

    Ok(())
}

/// Open `path` as an archive, read its manifest and validate it.
///
/// Open and read failures are logged as errors. The archive is closed before
/// this returns.
pub(super) fn accept_archive(
    environment: &PluginEnvironment,
    service: &dyn PluginLanguageService,
    path: &Path,
    origin: &str,
) -> Option<CandidateLocation> {
    let log = environment.log();

    let mut archive = match PluginArchive::open(path) {
        Ok(archive) => archive,
        Err(e) => {
            log.error(format_args!(
                "Error reading '{}' as an archive while scanning {}: {}. Skipping...",
                path.display(),
                origin,
                e
            ));
            return None;
        }
    };

    let manifest = match archive.manifest() {
        Ok(manifest) => manifest,
        Err(e) => {
            log.error(format_args!(
                "Error reading the manifest of '{}' while scanning {}: {}. Skipping...",
                path.display(),
                origin,
                e
            ));
            return None;
        }
    };

    validate(
        environment,
        manifest.as_ref(),
        &mut CandidateRoot::Archive(&mut archive),
        service,
    )
    .ok()?;

    Some(CandidateLocation::Archive(path.to_path_buf()))
}
