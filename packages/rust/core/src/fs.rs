//! Filesystem capability used by the wrapper and the assembler.
//!
//! The core never touches `std::fs` directly. [`StdFs`] talks to the real
//! disk, [`MemoryFs`] keeps a whole project tree in memory for tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

/// The narrow set of filesystem operations project assembly needs.
pub trait ProjectFs {
    /// Returns true if a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Direct children of a directory, sorted by file name.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Reads a whole file as UTF-8 text.
    fn read_text(&self, path: &Path) -> io::Result<String>;

    /// Creates or truncates `path` and writes `content` to it.
    fn write_text(&self, path: &Path, content: &str) -> io::Result<()>;
}

fn sort_by_name(entries: &mut [PathBuf]) {
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
}

// --- Implementation: Local disk ---

/// [`ProjectFs`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl ProjectFs for StdFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        sort_by_name(&mut entries);
        Ok(entries)
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_text(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }
}

// --- Implementation: In-Memory ---

#[derive(Debug, Default)]
struct MemoryTree {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    read_only: BTreeSet<PathBuf>,
    unreadable: BTreeSet<PathBuf>,
}

impl MemoryTree {
    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

/// An in-memory [`ProjectFs`]. Directories are created implicitly by the
/// files placed under them.
#[derive(Debug, Default)]
pub struct MemoryFs {
    tree: RefCell<MemoryTree>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, creating every parent directory.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) -> &Self {
        let path = path.as_ref();
        let mut tree = self.tree.borrow_mut();
        tree.add_ancestors(path);
        tree.files.insert(path.to_path_buf(), content.into());
        self
    }

    /// Adds an (empty) directory and its parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        let path = path.as_ref();
        let mut tree = self.tree.borrow_mut();
        tree.add_ancestors(path);
        tree.dirs.insert(path.to_path_buf());
        self
    }

    /// Makes every write to `path`, or anywhere below it, fail with
    /// `PermissionDenied`.
    pub fn deny_writes(&self, path: impl AsRef<Path>) -> &Self {
        self.tree
            .borrow_mut()
            .read_only
            .insert(path.as_ref().to_path_buf());
        self
    }

    /// Makes every read of `path`, or anything below it, fail with
    /// `PermissionDenied`. The file still exists.
    pub fn deny_reads(&self, path: impl AsRef<Path>) -> &Self {
        self.tree
            .borrow_mut()
            .unreadable
            .insert(path.as_ref().to_path_buf());
        self
    }

    /// Current content of a file, if present.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.tree.borrow().files.get(path.as_ref()).cloned()
    }

    /// Number of files currently stored.
    pub fn file_count(&self) -> usize {
        self.tree.borrow().files.len()
    }
}

impl ProjectFs for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        let tree = self.tree.borrow();
        tree.files.contains_key(path) || tree.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.tree.borrow().dirs.contains(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let tree = self.tree.borrow();
        if !tree.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", path.display()),
            ));
        }

        let mut entries: Vec<PathBuf> = tree
            .files
            .keys()
            .chain(tree.dirs.iter())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        sort_by_name(&mut entries);
        Ok(entries)
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        let tree = self.tree.borrow();
        if tree.unreadable.iter().any(|p| path.starts_with(p)) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("unreadable: {}", path.display()),
            ));
        }
        tree.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }

    fn write_text(&self, path: &Path, content: &str) -> io::Result<()> {
        let mut tree = self.tree.borrow_mut();

        if tree.read_only.iter().any(|ro| path.starts_with(ro)) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("read-only: {}", path.display()),
            ));
        }
        if tree.dirs.contains(path) {
            return Err(io::Error::other(format!(
                "is a directory: {}",
                path.display()
            )));
        }
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            if !tree.dirs.contains(parent) {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such directory: {}", parent.display()),
                ));
            }
        }

        tree.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}
