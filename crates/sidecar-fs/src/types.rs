//! Host-side filesystem types.
//!
//! These are what editor-side callers see. Remote types from
//! [`sidecar_types`] are converted into these by the [`mapper`](crate::mapper).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use url::Url;

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    /// Kind could not be determined.
    Unknown,
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    SymbolicLink,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    /// Returns true if this is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        matches!(self, FileType::SymbolicLink)
    }
}

/// File metadata.
///
/// Times are milliseconds since the UNIX epoch, exactly as the provider
/// reported them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    /// File type.
    pub kind: FileType,
    /// Creation time.
    pub ctime: u64,
    /// Last modification time.
    pub mtime: u64,
    /// Size in bytes.
    pub size: u64,
}

impl Stat {
    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }
}

/// Directory entry: name (not full path) and kind.
pub type DirEntry = (String, FileType);

/// Options for delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Delete directory contents too.
    pub recursive: bool,
    /// Move to trash instead of deleting.
    pub use_trash: bool,
}

/// Options for rename and copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverwriteOptions {
    /// Replace an existing target.
    pub overwrite: bool,
}

/// Options for whole-file writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Replace an existing file.
    pub overwrite: bool,
    /// Create the file if missing.
    pub create: bool,
}

impl WriteOptions {
    /// Create or replace.
    pub fn create_or_replace() -> Self {
        Self {
            overwrite: true,
            create: true,
        }
    }
}

/// Options for opening a file handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Create the file if missing.
    pub create: bool,
}

/// Options for watch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Watch the whole subtree.
    pub recursive: bool,
    /// Glob patterns to ignore.
    pub excludes: Vec<String>,
}

/// Extension-side delete options. Absent fields fall back to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtDeleteOptions {
    pub recursive: Option<bool>,
    pub use_trash: Option<bool>,
}

/// Extension-side rename/copy options. Absent means `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtOverwriteOptions {
    pub overwrite: Option<bool>,
}

impl From<ExtDeleteOptions> for DeleteOptions {
    fn from(opts: ExtDeleteOptions) -> Self {
        Self {
            recursive: opts.recursive.unwrap_or(false),
            use_trash: opts.use_trash.unwrap_or(false),
        }
    }
}

impl From<ExtOverwriteOptions> for OverwriteOptions {
    fn from(opts: ExtOverwriteOptions) -> Self {
        Self {
            overwrite: opts.overwrite.unwrap_or(false),
        }
    }
}

/// Numeric handle of an open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle(pub u64);

bitflags! {
    /// What a provider can do. Callers only invoke verbs the provider
    /// declares.
    pub struct Capabilities: u32 {
        /// Whole-file `read_file` / `write_file`.
        const FILE_READ_WRITE = 1 << 1;
        /// Handle-based `open` / `close`.
        const FILE_OPEN_READ_WRITE_CLOSE = 1 << 2;
        /// Native `copy`.
        const FILE_FOLDER_COPY = 1 << 3;
        /// Paths differing only in case are distinct.
        const PATH_CASE_SENSITIVE = 1 << 10;
        /// No writes at all.
        const READONLY = 1 << 11;
        /// `use_trash` is honored on delete.
        const TRASH = 1 << 12;
    }
}

/// Kind of file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeType {
    Updated,
    Added,
    Deleted,
}

/// A change reported by a provider's change stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub kind: FileChangeType,
    pub resource: Url,
}

/// Active watch, ended by [`dispose`](WatchHandle::dispose).
pub struct WatchHandle {
    on_dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    /// Wrap a function to run when the watch is disposed.
    pub fn new(on_dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_dispose: Some(Box::new(on_dispose)),
        }
    }

    /// Stop watching.
    pub fn dispose(mut self) {
        if let Some(f) = self.on_dispose.take() {
            f();
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.on_dispose.is_some())
            .finish()
    }
}
