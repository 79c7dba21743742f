//! Finding and parsing every primitive file in a project.
//!
//! Discovery looks in two places:
//!
//! 1. Each directory in [`DISCOVERY_DIRS`] (`.awd/` and `.github/`), walked
//!    recursively, dot-directories included.
//! 2. The project root itself, non-recursively, so a primitive dropped at the
//!    top level is still found.
//!
//! Files are classified by suffix with [`PrimitiveKind::from_path`]; anything
//! else is ignored. Candidates are sorted by (depth, directory, file name)
//! relative to the root before parsing, which makes the resulting order
//! independent of how the OS happens to enumerate directories.

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use super::{ParseError, PrimitiveCollection, PrimitiveKind, parse_primitive};
use crate::constants::DISCOVERY_DIRS;
use crate::core::AwdError;
use crate::pattern::to_slash;

/// Discover and parse every primitive under `project_root`.
///
/// Invalid files end up in [`PrimitiveCollection::errors`]; one bad file never
/// stops the scan. Only reads, never writes.
///
/// # Errors
///
/// Returns [`AwdError::ProjectRootUnreadable`] if `project_root` cannot be listed.
///
/// # Examples
///
/// ```rust,no_run
/// use awd_cli::primitives::discover;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let collection = discover(Path::new("."))?;
/// println!("{} primitives, {} invalid", collection.count(), collection.errors.len());
/// # Ok(())
/// # }
/// ```
pub fn discover(project_root: &Path) -> Result<PrimitiveCollection> {
    let candidates = find_primitive_files(project_root)?;
    debug!("Found {} candidate primitive files under {}", candidates.len(), project_root.display());

    let mut collection = PrimitiveCollection::new();
    for path in candidates {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Cannot read {}: {}", path.display(), e);
                collection.add_error(path, ParseError::Unreadable(e.to_string()));
                continue;
            }
        };

        match parse_primitive(&raw, &path) {
            Ok(primitive) => {
                trace!("Parsed {} '{}' from {}", primitive.kind, primitive.name, path.display());
                collection.add_primitive(primitive);
            }
            Err(error) => {
                debug!("Invalid primitive {}: {}", path.display(), error);
                collection.add_error(path, error);
            }
        }
    }

    Ok(collection)
}

/// List primitive files under `project_root` in deterministic order.
///
/// Returned paths are `project_root` joined with the relative path.
///
/// # Errors
///
/// Returns [`AwdError::ProjectRootUnreadable`] if `project_root` cannot be listed.
pub fn find_primitive_files(project_root: &Path) -> Result<Vec<PathBuf>> {
    let root_entries = std::fs::read_dir(project_root).map_err(|e| AwdError::ProjectRootUnreadable {
        path: project_root.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut relative: BTreeSet<DiscoveryKey> = BTreeSet::new();

    for entry in root_entries.flatten() {
        let path = entry.path();
        let is_file = entry.file_type().is_ok_and(|t| t.is_file());
        if is_file && PrimitiveKind::from_path(&path).is_some() {
            relative.insert(DiscoveryKey::new(PathBuf::from(entry.file_name())));
        }
    }

    for dir in DISCOVERY_DIRS {
        let base = project_root.join(dir);
        if !base.is_dir() {
            continue;
        }

        for entry in WalkDir::new(&base).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry under {}: {}", base.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || PrimitiveKind::from_path(entry.path()).is_none() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(project_root) {
                relative.insert(DiscoveryKey::new(rel.to_path_buf()));
            }
        }
    }

    Ok(relative.into_iter().map(|key| project_root.join(key.path)).collect())
}

/// Sort key for candidates: depth below the root, then parent directory, then file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct DiscoveryKey {
    depth: usize,
    dir: String,
    file_name: String,
    path: PathBuf,
}

impl DiscoveryKey {
    fn new(path: PathBuf) -> Self {
        let depth = path.components().count().saturating_sub(1);
        let dir = path.parent().map(to_slash).unwrap_or_default();
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        Self {
            depth,
            dir,
            file_name,
            path,
        }
    }
}
