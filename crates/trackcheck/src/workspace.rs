use std::path::{Path, PathBuf};

use crate::error::TrackcheckError;
use crate::fs::FileSystem;

/// Version-control metadata entry that marks a repository root.
pub const REPO_MARKER: &str = ".git";

/// Finds the repository root for `start`.
///
/// `start` is canonicalized and its ancestors (the filesystem root included)
/// are searched for [`REPO_MARKER`]. When no ancestor carries the marker the
/// canonical start path is returned unchanged.
pub fn find_repo_root(fs: &dyn FileSystem, start: &Path) -> Result<PathBuf, TrackcheckError> {
    let canonical_start = fs
        .canonicalize(start)
        .map_err(|source| TrackcheckError::Resolve {
            path: start.to_path_buf(),
            source,
        })?;

    for ancestor in canonical_start.ancestors() {
        if fs.exists(&ancestor.join(REPO_MARKER)) {
            return Ok(ancestor.to_path_buf());
        }
    }

    tracing::debug!(
        start = %canonical_start.display(),
        "no repository marker found; using start path as root"
    );
    Ok(canonical_start)
}

/// Whether `path` lies at or below `dir`, compared component by component.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
}

/// Renders `path` relative to `root` with forward slashes, or the full path
/// when it lies outside `root`.
pub fn display_relative(root: &Path, path: &Path) -> String {
    let shown = path.strip_prefix(root).unwrap_or(path);
    shown.to_string_lossy().replace('\\', "/")
}
