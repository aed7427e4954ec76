//! Search-path discovery.

use std::fs::File;
use std::path::Path;

use crate::environment::PluginEnvironment;
use crate::error::{Result, ScoutError};
use crate::locator::{classify, ResourceAddress};
use crate::manifest::{Manifest, MANIFEST_LOCATION};
use crate::service::PluginLanguageService;

use super::validate::{accept_archive, validate, CandidateRoot};
use super::CandidateLocation;

const ORIGIN: &str = "search path resources";

/// Every search path manifest that passes validation, in enumeration order.
pub(super) fn discover(
    environment: &PluginEnvironment,
    service: &dyn PluginLanguageService,
) -> Result<Vec<CandidateLocation>> {
    let locators = environment.resources().resources(MANIFEST_LOCATION)?;
    let log = environment.log();
    let mut candidates = Vec::new();

    for locator in locators {
        let address = match classify(&locator, MANIFEST_LOCATION) {
            Ok(address) => address,
            Err(e) => {
                log.error(format_args!(
                    "Malformed locator '{}' while scanning {}: {}. Skipping...",
                    locator, ORIGIN, e
                ));
                continue;
            }
        };

        let accepted = match address {
            ResourceAddress::Archive { archive, .. } => {
                accept_archive(environment, service, &archive, ORIGIN)
            }
            ResourceAddress::Directory { root, resource } => {
                accept_directory(environment, service, &root, &resource, &locator)
            }
        };

        if let Some(candidate) = accepted {
            candidates.push(candidate);
        }
    }

    Ok(candidates)
}

fn accept_directory(
    environment: &PluginEnvironment,
    service: &dyn PluginLanguageService,
    root: &Path,
    resource: &Path,
    locator: &str,
) -> Option<CandidateLocation> {
    let manifest = match File::open(resource)
        .map_err(ScoutError::from)
        .and_then(Manifest::from_reader)
    {
        Ok(manifest) => manifest,
        Err(e) => {
            environment.log().error(format_args!(
                "Error reading manifest '{}' while scanning {}: {}. Skipping...",
                locator, ORIGIN, e
            ));
            return None;
        }
    };

    validate(
        environment,
        Some(&manifest),
        &mut CandidateRoot::Directory(root),
        service,
    )
    .ok()?;

    Some(CandidateLocation::Directory(root.to_path_buf()))
}
