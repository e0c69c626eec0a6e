use std::path::{Path, PathBuf};

use crate::error::CliError;

#[derive(Clone, Copy, Debug, Default)]
pub struct Verbosity {
    pub json: bool,
    pub verbose: bool,
}

/// Makes `path` absolute against the current directory without resolving
/// symlinks, so symlinked arguments can still be recognised as such.
pub fn absolute(path: &Path) -> Result<PathBuf, CliError> {
    Ok(std::path::absolute(path)?)
}
