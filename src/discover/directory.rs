//! Directory-tree discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::environment::PluginEnvironment;
use crate::service::PluginLanguageService;

use super::validate::accept_archive;
use super::CandidateLocation;

const ORIGIN: &str = "plugin directory resources";

/// Every archive below the configured plugin directories that passes
/// validation. Directories are visited in configuration order; files within
/// one directory in file-name-sorted walk order.
pub(super) fn discover(
    environment: &PluginEnvironment,
    service: &dyn PluginLanguageService,
) -> Vec<CandidateLocation> {
    let log = environment.log();
    let mut candidates = Vec::new();

    for plugins_dir in environment.plugin_dirs() {
        match plugins_dir.try_exists() {
            Ok(true) => {}
            Ok(false) => {
                log.debug(format_args!(
                    "Plugin directory '{}' does not exist for loader '{}'. Skipping...",
                    plugins_dir.display(),
                    service.name()
                ));
                continue;
            }
            Err(e) => {
                log.error(format_args!(
                    "Cannot access plugin directory '{}': {}. Skipping...",
                    plugins_dir.display(),
                    e
                ));
                continue;
            }
        }

        // Walk fully before inspecting, so a failing walk contributes nothing.
        let files = match regular_files(plugins_dir) {
            Ok(files) => files,
            Err(e) => {
                log.error(format_args!(
                    "Error walking plugin directory '{}': {}. Skipping...",
                    plugins_dir.display(),
                    e
                ));
                continue;
            }
        };

        candidates.extend(
            files
                .iter()
                .filter_map(|file| accept_archive(environment, service, file, ORIGIN)),
        );
    }

    candidates
}

fn regular_files(root: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.path().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
