use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::TrackcheckError;
use crate::fs::{FileSystem, normalize_lexical};
use crate::links::extract::{LinkReference, extract_links};
use crate::report::{ValidationError, ValidationReport};
use crate::workspace::{display_relative, find_repo_root, is_within};

/// Path segment whose documents are exempt from link checking.
pub const EXEMPT_SEGMENT: &str = "examples";

/// Builds the candidate path for `target` as written in `document`.
///
/// - `/docs/a.md` is resolved from the repository root;
/// - `./a.md` and `a.md` are resolved from the document's directory;
/// - `../` segments are kept and collapse during resolution.
pub fn resolve_target(document: &Path, target: &str, root: &Path) -> PathBuf {
    let base = document.parent().unwrap_or(root);
    if target.starts_with('/') {
        root.join(target.trim_start_matches('/'))
    } else if let Some(rest) = target.strip_prefix("./") {
        base.join(rest)
    } else {
        base.join(target)
    }
}

/// Whether `document` sits below an `examples` directory of the repository.
pub fn is_exempt(document: &Path, root: &Path) -> bool {
    let relative = document.strip_prefix(root).unwrap_or(document);
    relative
        .components()
        .any(|component| component == Component::Normal(EXEMPT_SEGMENT.as_ref()))
}

/// Checks every link of one document and returns the problems in link order.
///
/// `document` must be absolute and `root` canonical. Failures are reported,
/// never propagated.
pub fn verify_links<'a>(
    fs: &dyn FileSystem,
    document: &Path,
    links: impl IntoIterator<Item = LinkReference<'a>>,
    root: &Path,
) -> Vec<ValidationError> {
    if is_exempt(document, root) {
        tracing::debug!(document = %document.display(), "skipping exempt document");
        return Vec::new();
    }

    let shown = display_relative(root, document);
    let mut errors = Vec::new();

    for link in links {
        let candidate = resolve_target(document, link.target, root);
        match fs.canonicalize(&candidate) {
            Ok(resolved) => {
                if !is_within(&resolved, root) {
                    errors.push(ValidationError::OutsideRepository {
                        document: shown.clone(),
                        target: link.target.to_string(),
                        resolved: resolved.display().to_string(),
                    });
                }
            }
            Err(err) if is_missing(&err) => {
                errors.push(ValidationError::BrokenLink {
                    document: shown.clone(),
                    target: link.target.to_string(),
                    resolved: normalize_lexical(&candidate).display().to_string(),
                });
            }
            Err(err) => {
                errors.push(ValidationError::ResolutionError {
                    document: shown.clone(),
                    target: link.target.to_string(),
                    cause: err.to_string(),
                });
            }
        }
    }

    errors
}

pub(crate) fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Validates the links of each document in turn.
///
/// Symlinked documents are skipped so content is checked once, under its real
/// name. A document path that cannot be resolved aborts the run; a document
/// that exists but cannot be read is reported and the run continues.
pub fn check_documents(
    fs: &dyn FileSystem,
    documents: &[PathBuf],
) -> Result<ValidationReport, TrackcheckError> {
    let mut report = ValidationReport::new();

    for document in documents {
        if fs.is_symlink(document) {
            tracing::debug!(document = %document.display(), "skipping symlinked document");
            continue;
        }

        let canonical = fs
            .canonicalize(document)
            .map_err(|source| TrackcheckError::Resolve {
                path: document.clone(),
                source,
            })?;
        let root = find_repo_root(fs, &canonical)?;

        report.checked += 1;
        let content = match fs.read_to_string(&canonical) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(document = %document.display(), error = %err, "unable to read document");
                let shown = display_relative(&root, &canonical);
                report.push(ValidationError::ResolutionError {
                    document: shown.clone(),
                    target: shown,
                    cause: err.to_string(),
                });
                continue;
            }
        };
        report.extend(verify_links(fs, &canonical, extract_links(&content), &root));
    }

    tracing::info!(
        documents = report.checked,
        errors = report.errors.len(),
        "link check finished"
    );
    Ok(report.finalize())
}

/// Lists every document with `extension` below `start` for a full scan.
///
/// An unreadable `start` is fatal; unreadable paths below it are skipped.
pub fn scan_documents(
    fs: &dyn FileSystem,
    start: &Path,
    extension: &str,
) -> Result<Vec<PathBuf>, TrackcheckError> {
    let documents = fs.files_with_extension(start, extension)?;
    tracing::info!(
        start = %start.display(),
        documents = documents.len(),
        "scanned for documents"
    );
    Ok(documents)
}
