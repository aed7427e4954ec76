//! Resource locators.
//!
//! The search path reports every manifest it finds as a URL-style locator:
//!
//! - `file:///plugins/exploded/META-INF/MANIFEST.MF` for a loose file under a
//!   directory root
//! - `jar:file:///plugins/a.jar!/META-INF/MANIFEST.MF` for an entry inside an
//!   archive
//!
//! File paths go through `url::Url`, so any bytes the platform allows in a
//! path survive the trip. `classify` turns a locator back into a
//! `ResourceAddress` so callers never inspect locator strings themselves.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{Result, ScoutError};

const FILE_SCHEME: &str = "file";
const ARCHIVE_SCHEME: &str = "jar:";
const ARCHIVE_SEPARATOR: &str = "!/";

/// Where a located resource physically lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceAddress {
    /// The resource is an entry inside an archive file.
    Archive { archive: PathBuf, entry: String },
    /// The resource is a loose file; `root` is the directory the resource name
    /// was resolved against.
    Directory { root: PathBuf, resource: PathBuf },
}

/// Locator for a loose file. `path` must be absolute.
pub fn file_locator(path: &Path) -> Result<String> {
    Url::from_file_path(path).map(String::from).map_err(|_| {
        ScoutError::Locator(format!("'{}' is not an absolute path", path.display()))
    })
}

/// Locator for `entry` inside the archive at `archive`. `archive` must be
/// absolute; `entry` is appended as-is.
pub fn archive_locator(archive: &Path, entry: &str) -> Result<String> {
    Ok(format!(
        "{}{}{}{}",
        ARCHIVE_SCHEME,
        file_locator(archive)?,
        ARCHIVE_SEPARATOR,
        entry.trim_start_matches('/')
    ))
}

/// Classify a locator reported for `resource_name` (e.g. `META-INF/MANIFEST.MF`).
///
/// # Errors
/// `ScoutError::Locator` when the scheme is unknown, the URL does not parse,
/// it names a remote host, or a directory locator does not end with
/// `resource_name`.
pub fn classify(locator: &str, resource_name: &str) -> Result<ResourceAddress> {
    if let Some(rest) = locator.strip_prefix(ARCHIVE_SCHEME) {
        // Entry names never contain "!/", archive paths may.
        let (archive_url, entry) = rest.rsplit_once(ARCHIVE_SEPARATOR).ok_or_else(|| {
            ScoutError::Locator(format!("'{}' has no '!/' archive separator", locator))
        })?;
        let archive = file_url_to_path(archive_url, locator)?;
        return Ok(ResourceAddress::Archive {
            archive,
            entry: entry.to_string(),
        });
    }

    let resource = file_url_to_path(locator, locator)?;
    let root = strip_resource_suffix(&resource, resource_name).ok_or_else(|| {
        ScoutError::Locator(format!(
            "'{}' does not end with resource '{}'",
            locator, resource_name
        ))
    })?;
    Ok(ResourceAddress::Directory { root, resource })
}

/// Remove the relative `resource_name` from the end of `resource`, yielding
/// the directory it was resolved against.
fn strip_resource_suffix(resource: &Path, resource_name: &str) -> Option<PathBuf> {
    let mut root = resource.to_path_buf();
    for component in resource_name.split('/').rev() {
        if root.file_name()? != component {
            return None;
        }
        root.pop();
    }
    Some(root)
}

fn file_url_to_path(text: &str, locator: &str) -> Result<PathBuf> {
    let url = Url::parse(text)
        .map_err(|e| ScoutError::Locator(format!("'{}' is not a valid URL: {}", locator, e)))?;
    if url.scheme() != FILE_SCHEME {
        return Err(ScoutError::Locator(format!(
            "'{}' uses an unsupported scheme",
            locator
        )));
    }
    // `file:///a`, `file://localhost/a` and `file:/a` all name `/a`.
    url.to_file_path().map_err(|_| {
        ScoutError::Locator(format!("'{}' does not name a local file", locator))
    })
}

#[cfg(all(test, unix))]
mod tests {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    use super::*;

    const MANIFEST: &str = "META-INF/MANIFEST.MF";

    #[test]
    fn test_classify_directory_locator() {
        let address = classify("file:///opt/plugins/exploded/META-INF/MANIFEST.MF", MANIFEST).unwrap();
        assert_eq!(
            address,
            ResourceAddress::Directory {
                root: PathBuf::from("/opt/plugins/exploded"),
                resource: PathBuf::from("/opt/plugins/exploded/META-INF/MANIFEST.MF"),
            }
        );
    }

    #[test]
    fn test_classify_archive_locator() {
        let address = classify("jar:file:///opt/plugins/a.jar!/META-INF/MANIFEST.MF", MANIFEST).unwrap();
        assert_eq!(
            address,
            ResourceAddress::Archive {
                archive: PathBuf::from("/opt/plugins/a.jar"),
                entry: MANIFEST.to_string(),
            }
        );
    }

    #[test]
    fn test_single_slash_and_localhost_forms() {
        let short = classify("file:/srv/p/META-INF/MANIFEST.MF", MANIFEST).unwrap();
        let local = classify("file://localhost/srv/p/META-INF/MANIFEST.MF", MANIFEST).unwrap();
        assert_eq!(short, local);
    }

    #[test]
    fn test_locators_roundtrip_through_classify() {
        let root = Path::new("/tmp/with space/ünï");
        let loose = file_locator(&root.join(MANIFEST)).unwrap();
        assert!(loose.contains("with%20space"));
        match classify(&loose, MANIFEST).unwrap() {
            ResourceAddress::Directory { root: found, .. } => assert_eq!(found, root),
            other => panic!("unexpected address {:?}", other),
        }

        let archive = Path::new("/tmp/a b!/plugin!.jar");
        let packed = archive_locator(archive, MANIFEST).unwrap();
        match classify(&packed, MANIFEST).unwrap() {
            ResourceAddress::Archive { archive: found, entry } => {
                assert_eq!(found, archive);
                assert_eq!(entry, MANIFEST);
            }
            other => panic!("unexpected address {:?}", other),
        }
    }

    #[test]
    fn test_non_utf8_paths_survive_classify() {
        let root = Path::new(OsStr::from_bytes(b"/tmp/classes-\xff"));
        let loose = file_locator(&root.join(MANIFEST)).unwrap();
        match classify(&loose, MANIFEST).unwrap() {
            ResourceAddress::Directory { root: found, .. } => assert_eq!(found, root),
            other => panic!("unexpected address {:?}", other),
        }

        let archive = Path::new(OsStr::from_bytes(b"/tmp/plugin-\xfe.jar"));
        let packed = archive_locator(archive, MANIFEST).unwrap();
        match classify(&packed, MANIFEST).unwrap() {
            ResourceAddress::Archive { archive: found, .. } => assert_eq!(found, archive),
            other => panic!("unexpected address {:?}", other),
        }
    }

    #[test]
    fn test_relative_path_has_no_locator() {
        assert!(matches!(
            file_locator(Path::new("plugins/a.jar")),
            Err(ScoutError::Locator(_))
        ));
        assert!(archive_locator(Path::new("a.jar"), MANIFEST).is_err());
    }

    #[test]
    fn test_unknown_scheme_is_malformed() {
        let err = classify("http://example.com/META-INF/MANIFEST.MF", MANIFEST).unwrap_err();
        assert!(matches!(err, ScoutError::Locator(_)));
    }

    #[test]
    fn test_archive_without_separator_is_malformed() {
        assert!(classify("jar:file:///opt/a.jar", MANIFEST).is_err());
    }

    #[test]
    fn test_unparseable_url_is_malformed() {
        let err = classify("file://[bad/META-INF/MANIFEST.MF", MANIFEST).unwrap_err();
        assert!(err.to_string().contains("is not a valid URL"));
    }

    #[test]
    fn test_remote_host_is_malformed() {
        assert!(classify("file://build-host/opt/META-INF/MANIFEST.MF", MANIFEST).is_err());
    }

    #[test]
    fn test_directory_locator_must_end_with_resource() {
        let err = classify("file:///opt/plugins/other.txt", MANIFEST).unwrap_err();
        assert!(err.to_string().contains("does not end with resource"));
    }
}
