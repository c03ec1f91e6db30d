//! In-memory sidecar.
//!
//! Used for testing and for sandboxes with no disk. All data is ephemeral.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use sidecar_types::{
    FsError, FsResult, RemoteDeleteOptions, RemoteDirEntry, RemoteFileType,
    RemoteOverwriteOptions, RemoteStat, RemoteWriteOptions, SidecarFileSystem,
};

use super::now_millis;

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, ctime: u64, mtime: u64 },
    Directory { ctime: u64, mtime: u64 },
}

impl Entry {
    fn directory() -> Self {
        let now = now_millis();
        Entry::Directory {
            ctime: now,
            mtime: now,
        }
    }

    fn stat(&self) -> RemoteStat {
        match self {
            Entry::File { data, ctime, mtime } => RemoteStat {
                kind: RemoteFileType::File,
                ctime: *ctime,
                mtime: *mtime,
                size: data.len() as u64,
            },
            Entry::Directory { ctime, mtime } => RemoteStat {
                kind: RemoteFileType::Directory,
                ctime: *ctime,
                mtime: *mtime,
                size: 0,
            },
        }
    }

    fn kind(&self) -> RemoteFileType {
        match self {
            Entry::File { .. } => RemoteFileType::File,
            Entry::Directory { .. } => RemoteFileType::Directory,
        }
    }
}

/// In-memory sidecar filesystem.
///
/// Thread-safe via internal `RwLock`. The root directory always exists.
/// There is no trash, so deletes asking for one are rejected.
#[derive(Debug)]
pub struct MemorySidecar {
    entries: RwLock<HashMap<PathBuf, Entry>>,
}

impl Default for MemorySidecar {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySidecar {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(PathBuf::from(""), Entry::directory());
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Normalize a path: remove leading `/`, resolve `.` and `..`.
    fn normalize(path: &str) -> PathBuf {
        let mut result = PathBuf::new();
        for component in Path::new(path).components() {
            match component {
                Component::ParentDir => {
                    result.pop();
                }
                Component::Normal(s) => result.push(s),
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }
        result
    }

    /// Get the path string for error messages.
    fn path_str(path: &Path) -> String {
        format!("/{}", path.display())
    }

    fn poisoned() -> FsError {
        FsError::other("lock poisoned")
    }

    /// Fail unless the parent of `path` is an existing directory.
    fn check_parent(entries: &HashMap<PathBuf, Entry>, path: &Path) -> FsResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        match entries.get(parent) {
            Some(Entry::Directory { .. }) => Ok(()),
            Some(_) => Err(FsError::not_a_directory(Self::path_str(parent))),
            None => Err(FsError::not_found(Self::path_str(parent))),
        }
    }

    /// Paths strictly below `path`.
    fn descendants(entries: &HashMap<PathBuf, Entry>, path: &Path) -> Vec<PathBuf> {
        entries
            .keys()
            .filter(|k| k.as_path() != path && k.starts_with(path))
            .cloned()
            .collect()
    }

    fn touch_parent(entries: &mut HashMap<PathBuf, Entry>, path: &Path) {
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        if let Some(Entry::Directory { mtime, .. }) = entries.get_mut(parent) {
            *mtime = now_millis();
        }
    }
}

#[async_trait]
impl SidecarFileSystem for MemorySidecar {
    async fn stat(&self, path: &str) -> FsResult<RemoteStat> {
        let normalized = Self::normalize(path);
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;

        entries
            .get(&normalized)
            .map(Entry::stat)
            .ok_or_else(|| FsError::not_found(Self::path_str(&normalized)))
    }

    async fn mkdir(&self, path: &str) -> FsResult<()> {
        let normalized = Self::normalize(path);
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;

        if entries.contains_key(&normalized) {
            return Err(FsError::already_exists(Self::path_str(&normalized)));
        }
        Self::check_parent(&entries, &normalized)?;

        Self::touch_parent(&mut entries, &normalized);
        entries.insert(normalized, Entry::directory());
        Ok(())
    }

    async fn readdir(&self, path: &str) -> FsResult<Vec<RemoteDirEntry>> {
        let normalized = Self::normalize(path);
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;

        match entries.get(&normalized) {
            Some(Entry::Directory { .. }) => {}
            Some(_) => return Err(FsError::not_a_directory(Self::path_str(&normalized))),
            None => return Err(FsError::not_found(Self::path_str(&normalized))),
        }

        let mut result: Vec<RemoteDirEntry> = entries
            .iter()
            .filter(|(entry_path, _)| {
                entry_path.parent() == Some(normalized.as_path()) && **entry_path != normalized
            })
            .filter_map(|(entry_path, entry)| {
                entry_path
                    .file_name()
                    .map(|name| (name.to_string_lossy().into_owned(), entry.kind()))
            })
            .collect();

        // Sort for consistent ordering
        result.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(result)
    }

    async fn delete(&self, path: &str, opts: RemoteDeleteOptions) -> FsResult<()> {
        if opts.use_trash {
            return Err(FsError::unsupported("delete to trash"));
        }

        let normalized = Self::normalize(path);
        if normalized.as_os_str().is_empty() {
            return Err(FsError::permission_denied("cannot remove root"));
        }

        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;

        match entries.get(&normalized) {
            Some(Entry::Directory { .. }) => {
                let children = Self::descendants(&entries, &normalized);
                if !children.is_empty() && !opts.recursive {
                    return Err(FsError::directory_not_empty(Self::path_str(&normalized)));
                }
                for child in children {
                    entries.remove(&child);
                }
            }
            Some(Entry::File { .. }) => {}
            None => return Err(FsError::not_found(Self::path_str(&normalized))),
        }

        entries.remove(&normalized);
        Self::touch_parent(&mut entries, &normalized);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str, opts: RemoteOverwriteOptions) -> FsResult<()> {
        let from_normalized = Self::normalize(from);
        let to_normalized = Self::normalize(to);

        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;

        if !entries.contains_key(&from_normalized) {
            return Err(FsError::not_found(Self::path_str(&from_normalized)));
        }
        if from_normalized == to_normalized {
            return Ok(());
        }
        if to_normalized.starts_with(&from_normalized) {
            return Err(FsError::other(format!(
                "cannot move {} into itself",
                Self::path_str(&from_normalized)
            )));
        }
        // Replacing an ancestor would delete the source along with it.
        if to_normalized.as_os_str().is_empty() || from_normalized.starts_with(&to_normalized) {
            return Err(FsError::other(format!(
                "cannot move {} onto its ancestor {}",
                Self::path_str(&from_normalized),
                Self::path_str(&to_normalized)
            )));
        }
        Self::check_parent(&entries, &to_normalized)?;

        if entries.contains_key(&to_normalized) {
            if !opts.overwrite {
                return Err(FsError::already_exists(Self::path_str(&to_normalized)));
            }
            for child in Self::descendants(&entries, &to_normalized) {
                entries.remove(&child);
            }
            entries.remove(&to_normalized);
        }

        // Move the entry and everything below it
        for child in Self::descendants(&entries, &from_normalized) {
            if let Some(child_entry) = entries.remove(&child) {
                if let Ok(relative) = child.strip_prefix(&from_normalized) {
                    entries.insert(to_normalized.join(relative), child_entry);
                }
            }
        }
        if let Some(entry) = entries.remove(&from_normalized) {
            entries.insert(to_normalized.clone(), entry);
        }

        Self::touch_parent(&mut entries, &from_normalized);
        Self::touch_parent(&mut entries, &to_normalized);
        Ok(())
    }

    async fn read_file(&self, path: &str) -> FsResult<Vec<u8>> {
        let normalized = Self::normalize(path);
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;

        match entries.get(&normalized) {
            Some(Entry::File { data, .. }) => Ok(data.clone()),
            Some(Entry::Directory { .. }) => {
                Err(FsError::is_a_directory(Self::path_str(&normalized)))
            }
            None => Err(FsError::not_found(Self::path_str(&normalized))),
        }
    }

    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        opts: RemoteWriteOptions,
    ) -> FsResult<()> {
        let normalized = Self::normalize(path);
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;

        match entries.get_mut(&normalized) {
            Some(Entry::Directory { .. }) => {
                Err(FsError::is_a_directory(Self::path_str(&normalized)))
            }
            Some(Entry::File { .. }) if !opts.overwrite => {
                Err(FsError::already_exists(Self::path_str(&normalized)))
            }
            Some(Entry::File { data, mtime, .. }) => {
                *data = content.to_vec();
                *mtime = now_millis();
                Ok(())
            }
            None if !opts.create => Err(FsError::not_found(Self::path_str(&normalized))),
            None => {
                Self::check_parent(&entries, &normalized)?;
                let now = now_millis();
                Self::touch_parent(&mut entries, &normalized);
                entries.insert(
                    normalized,
                    Entry::File {
                        data: content.to_vec(),
                        ctime: now,
                        mtime: now,
                    },
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATE: RemoteWriteOptions = RemoteWriteOptions {
        overwrite: false,
        create: true,
    };
    const REPLACE: RemoteWriteOptions = RemoteWriteOptions {
        overwrite: true,
        create: false,
    };

    #[tokio::test]
    async fn test_write_and_read() {
        let fs = MemorySidecar::new();
        fs.write_file("/hello.txt", b"hello world", CREATE)
            .await
            .unwrap();

        assert_eq!(fs.read_file("/hello.txt").await.unwrap(), b"hello world");
        let stat = fs.stat("/hello.txt").await.unwrap();
        assert_eq!(stat.kind, RemoteFileType::File);
        assert_eq!(stat.size, 11);
    }

    #[tokio::test]
    async fn test_write_flags() {
        let fs = MemorySidecar::new();

        // Missing file without create
        let err = fs.write_file("/a.txt", b"x", REPLACE).await.unwrap_err();
        assert!(matches!(err, FsError::NotFound(_)));

        fs.write_file("/a.txt", b"x", CREATE).await.unwrap();

        // Existing file with create but no overwrite
        let err = fs.write_file("/a.txt", b"y", CREATE).await.unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists(_)));

        // Existing file with neither flag
        let err = fs
            .write_file("/a.txt", b"y", RemoteWriteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists(_)));
        assert_eq!(fs.read_file("/a.txt").await.unwrap(), b"x");

        fs.write_file("/a.txt", b"y", REPLACE).await.unwrap();
        assert_eq!(fs.read_file("/a.txt").await.unwrap(), b"y");
    }

    #[tokio::test]
    async fn test_write_needs_parent() {
        let fs = MemorySidecar::new();
        let err = fs.write_file("/no/such/dir.txt", b"x", CREATE).await.unwrap_err();
        assert!(matches!(err, FsError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mkdir_and_readdir() {
        let fs = MemorySidecar::new();
        fs.mkdir("/subdir").await.unwrap();
        fs.write_file("/subdir/file.txt", b"", CREATE).await.unwrap();
        fs.write_file("/root.txt", b"", CREATE).await.unwrap();

        let entries = fs.readdir("/").await.unwrap();
        assert_eq!(
            entries,
            vec![
                ("root.txt".to_string(), RemoteFileType::File),
                ("subdir".to_string(), RemoteFileType::Directory),
            ]
        );

        let err = fs.mkdir("/subdir").await.unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists(_)));

        let err = fs.readdir("/root.txt").await.unwrap_err();
        assert!(matches!(err, FsError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_read_directory_fails() {
        let fs = MemorySidecar::new();
        fs.mkdir("/dir").await.unwrap();
        let err = fs.read_file("/dir").await.unwrap_err();
        assert!(matches!(err, FsError::IsADirectory(_)));
    }

    #[tokio::test]
    async fn test_delete_recursive_flag() {
        let fs = MemorySidecar::new();
        fs.mkdir("/dir").await.unwrap();
        fs.write_file("/dir/a.txt", b"a", CREATE).await.unwrap();

        let err = fs
            .delete("/dir", RemoteDeleteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::DirectoryNotEmpty(_)));

        fs.delete(
            "/dir",
            RemoteDeleteOptions {
                recursive: true,
                use_trash: false,
            },
        )
        .await
        .unwrap();
        assert!(matches!(
            fs.stat("/dir/a.txt").await,
            Err(FsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_to_trash_unsupported() {
        let fs = MemorySidecar::new();
        fs.write_file("/a.txt", b"a", CREATE).await.unwrap();
        let err = fs
            .delete(
                "/a.txt",
                RemoteDeleteOptions {
                    recursive: false,
                    use_trash: true,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::Unsupported(_)));
        assert!(fs.stat("/a.txt").await.is_ok());
    }

    #[tokio::test]
    async fn test_rename_overwrite_flag() {
        let fs = MemorySidecar::new();
        fs.write_file("/a.txt", b"a", CREATE).await.unwrap();
        fs.write_file("/b.txt", b"b", CREATE).await.unwrap();

        let err = fs
            .rename("/a.txt", "/b.txt", RemoteOverwriteOptions { overwrite: false })
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists(_)));

        fs.rename("/a.txt", "/b.txt", RemoteOverwriteOptions { overwrite: true })
            .await
            .unwrap();
        assert_eq!(fs.read_file("/b.txt").await.unwrap(), b"a");
        assert!(matches!(fs.stat("/a.txt").await, Err(FsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rename_directory_moves_children() {
        let fs = MemorySidecar::new();
        fs.mkdir("/old").await.unwrap();
        fs.mkdir("/old/nested").await.unwrap();
        fs.write_file("/old/nested/f.txt", b"deep", CREATE)
            .await
            .unwrap();

        fs.rename("/old", "/new", RemoteOverwriteOptions::default())
            .await
            .unwrap();

        assert_eq!(fs.read_file("/new/nested/f.txt").await.unwrap(), b"deep");
        assert!(matches!(fs.stat("/old").await, Err(FsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rename_into_itself_rejected() {
        let fs = MemorySidecar::new();
        fs.mkdir("/dir").await.unwrap();
        let result = fs
            .rename("/dir", "/dir/inner", RemoteOverwriteOptions::default())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rename_onto_ancestor_rejected() {
        let fs = MemorySidecar::new();
        let overwrite = RemoteOverwriteOptions { overwrite: true };
        fs.mkdir("/a").await.unwrap();
        fs.mkdir("/a/b").await.unwrap();
        fs.write_file("/a/b/f.txt", b"kept", CREATE).await.unwrap();

        let err = fs.rename("/a/b", "/a", overwrite).await.unwrap_err();
        assert!(matches!(err, FsError::Other(_)));
        assert_eq!(fs.read_file("/a/b/f.txt").await.unwrap(), b"kept");

        let err = fs.rename("/a/b/f.txt", "/", overwrite).await.unwrap_err();
        assert!(matches!(err, FsError::Other(_)));
        assert_eq!(fs.stat("/").await.unwrap().kind, RemoteFileType::Directory);
        assert_eq!(fs.read_file("/a/b/f.txt").await.unwrap(), b"kept");
    }
}
