use std::path::PathBuf;
use std::sync::Arc;

use trackcheck::{FileSystem, OsFileSystem, TypeRegistry};

use crate::error::CliError;
use crate::util::{self, Verbosity};

/// Run-scoped state shared by every command.
pub struct CliSession {
    pub fs: Arc<dyn FileSystem>,
    /// Where repository discovery and full scans start.
    pub start: PathBuf,
    pub registry: TypeRegistry,
    pub verbosity: Verbosity,
}

impl CliSession {
    pub fn bootstrap(
        repo_override: Option<PathBuf>,
        config_path: Option<PathBuf>,
        verbosity: Verbosity,
    ) -> Result<Self, CliError> {
        let start = match repo_override {
            Some(path) => util::absolute(&path)?,
            None => std::env::current_dir()?,
        };

        let registry = match config_path {
            Some(path) => TypeRegistry::load(&path)?,
            None => TypeRegistry::builtin(),
        };

        Ok(Self {
            fs: Arc::new(OsFileSystem),
            start,
            registry,
            verbosity,
        })
    }
}
