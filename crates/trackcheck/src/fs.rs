use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use parking_lot::RwLock;

/// Maximum number of symlinks followed while resolving a single path.
const MAX_SYMLINK_HOPS: usize = 40;

/// What a directory entry is, without following a final symlink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(OsStr::to_str)
    }
}

/// Filesystem capabilities consumed by the checkers.
pub trait FileSystem: Send + Sync {
    /// Resolves `path` to an absolute path with every symlink followed.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Reports the kind of `path` itself; a trailing symlink is not followed.
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind>;

    /// Returns the raw target stored in the symlink at `path`.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Lists the direct children of `dir`, sorted by path.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Recursively collects files below `root` with the given extension,
    /// skipping hidden paths. Symlinked files are included.
    fn files_with_extension(&self, root: &Path, extension: &str) -> io::Result<Vec<PathBuf>>;

    fn exists(&self, path: &Path) -> bool {
        self.canonicalize(path).is_ok()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.entry_kind(path), Ok(EntryKind::Symlink))
    }
}

/// The real filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        let file_type = fs::symlink_metadata(path)?.file_type();
        Ok(if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(path)
    }

    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(DirEntry {
                path: entry.path(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn files_with_extension(&self, root: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        fs::metadata(root)?;
        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .follow_links(false)
            .build();

        let mut files = Vec::new();
        for result in walker {
            match result {
                Ok(entry) => {
                    let is_candidate = entry
                        .file_type()
                        .map(|ft| ft.is_file() || ft.is_symlink())
                        .unwrap_or(false);
                    if is_candidate && has_extension(entry.path(), extension) {
                        files.push(entry.into_path());
                    }
                }
                Err(err) => tracing::warn!(error = %err, "skipping unreadable path during scan"),
            }
        }
        files.sort();
        Ok(files)
    }
}

#[derive(Clone, Debug)]
enum Node {
    File(String),
    Dir,
    Symlink(PathBuf),
}

/// An in-memory filesystem for tests and embedding.
///
/// Paths must be absolute. Parent directories are created implicitly when
/// entries are added.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        self.insert(path.as_ref(), Node::Dir);
        self
    }

    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<String>) -> &Self {
        self.insert(path.as_ref(), Node::File(contents.into()));
        self
    }

    /// Adds a symlink at `path` whose stored target is `target`, which may be
    /// relative to the link's directory.
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl Into<PathBuf>) -> &Self {
        self.insert(path.as_ref(), Node::Symlink(target.into()));
        self
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.nodes.write().remove(path.as_ref());
    }

    fn insert(&self, path: &Path, node: Node) {
        let path = normalize_lexical(path);
        let mut nodes = self.nodes.write();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.parent().is_none() {
                break;
            }
            nodes
                .entry(ancestor.to_path_buf())
                .or_insert(Node::Dir);
        }
        nodes.insert(path, node);
    }

    fn resolve(&self, path: &Path, follow_last: bool) -> io::Result<PathBuf> {
        if !path.is_absolute() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path {} is not absolute", path.display()),
            ));
        }

        let nodes = self.nodes.read();
        let mut pending: Vec<OsString> = components_of(path);
        pending.reverse();
        let mut resolved = PathBuf::from("/");
        let mut hops = 0;

        while let Some(part) = pending.pop() {
            if part == "." {
                continue;
            }
            if part == ".." {
                resolved.pop();
                continue;
            }

            let next = resolved.join(&part);
            match nodes.get(&next) {
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("{} does not exist", next.display()),
                    ));
                }
                Some(Node::Dir) => resolved = next,
                Some(Node::File(_)) => {
                    if !pending.is_empty() {
                        return Err(io::Error::new(
                            io::ErrorKind::NotADirectory,
                            format!("{} is not a directory", next.display()),
                        ));
                    }
                    resolved = next;
                }
                Some(Node::Symlink(target)) => {
                    if pending.is_empty() && !follow_last {
                        resolved = next;
                        continue;
                    }
                    hops += 1;
                    if hops > MAX_SYMLINK_HOPS {
                        return Err(io::Error::other(format!(
                            "too many levels of symbolic links at {}",
                            next.display()
                        )));
                    }
                    if target.is_absolute() {
                        resolved = PathBuf::from("/");
                    }
                    let mut expanded = components_of(target);
                    expanded.reverse();
                    pending.extend(expanded);
                }
            }
        }

        Ok(resolved)
    }

    fn node_at(&self, path: &Path) -> io::Result<(PathBuf, Node)> {
        let parent = path.parent().unwrap_or_else(|| Path::new("/"));
        let name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path {} has no file name", path.display()),
            )
        })?;
        let location = self.resolve(parent, true)?.join(name);
        let node = self.nodes.read().get(&location).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
        })?;
        Ok((location, node))
    }
}

impl FileSystem for MemoryFileSystem {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.resolve(path, true)
    }

    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        if path == Path::new("/") {
            return Ok(EntryKind::Dir);
        }
        Ok(match self.node_at(path)?.1 {
            Node::File(_) => EntryKind::File,
            Node::Dir => EntryKind::Dir,
            Node::Symlink(_) => EntryKind::Symlink,
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        match self.node_at(path)?.1 {
            Node::Symlink(target) => Ok(target),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a symlink", path.display()),
            )),
        }
    }

    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let real = self.resolve(dir, true)?;
        let nodes = self.nodes.read();
        if real != Path::new("/") && !matches!(nodes.get(&real), Some(Node::Dir)) {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", dir.display()),
            ));
        }

        let mut entries = Vec::new();
        for (path, node) in nodes.range(real.clone()..) {
            if !path.starts_with(&real) {
                break;
            }
            if path.parent() != Some(real.as_path()) {
                continue;
            }
            let Some(name) = path.file_name() else {
                continue;
            };
            let kind = match node {
                Node::File(_) => EntryKind::File,
                Node::Dir => EntryKind::Dir,
                Node::Symlink(_) => EntryKind::Symlink,
            };
            entries.push(DirEntry {
                path: dir.join(name),
                kind,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let real = self.resolve(path, true)?;
        match self.nodes.read().get(&real) {
            Some(Node::File(contents)) => Ok(contents.clone()),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            )),
        }
    }

    fn files_with_extension(&self, root: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        self.resolve(root, true)?;
        let root = normalize_lexical(root);
        let nodes = self.nodes.read();
        let files = nodes
            .iter()
            .filter(|(path, node)| {
                matches!(node, Node::File(_) | Node::Symlink(_))
                    && path.starts_with(&root)
                    && has_extension(path, extension)
                    && !is_hidden_below(&root, path)
            })
            .map(|(path, _)| path.clone())
            .collect();
        Ok(files)
    }
}

fn components_of(path: &Path) -> Vec<OsString> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_os_string()),
            Component::CurDir => Some(OsString::from(".")),
            Component::ParentDir => Some(OsString::from("..")),
            Component::RootDir | Component::Prefix(_) => None,
        })
        .collect()
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(OsStr::to_str) == Some(extension)
}

fn is_hidden_below(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .map(|relative| {
            relative
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        })
        .unwrap_or(false)
}

/// Collapses `.` and `..` components without touching the filesystem.
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut anchored = PathBuf::new();
    let mut parts: Vec<OsString> = Vec::new();
    let mut is_anchored = false;

    for component in path.components() {
        match component {
            component @ (Component::Prefix(_) | Component::RootDir) => {
                anchored.push(component.as_os_str());
                is_anchored = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() && !is_anchored {
                    parts.push(OsString::from(".."));
                }
            }
            Component::Normal(s) => parts.push(s.to_os_string()),
        }
    }

    for part in parts {
        anchored.push(part);
    }

    anchored
}
