pub mod config;
pub mod error;
pub mod fs;
pub mod links;
pub mod report;
pub mod states;
pub mod workspace;

pub use config::{DirectoryConfig, TypeRegistry};
pub use error::TrackcheckError;
pub use fs::{DirEntry, EntryKind, FileSystem, MemoryFileSystem, OsFileSystem};
pub use links::{
    LinkReference, check_documents, extract_links, resolve_target, scan_documents, verify_links,
};
pub use report::{PointerProblem, ValidationError, ValidationReport, ValidationStatus};
pub use states::check_states;
pub use workspace::{REPO_MARKER, find_repo_root};
