//! Local filesystem sidecar.
//!
//! Serves a real directory tree, with path security to prevent escaping
//! the root directory.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use sidecar_types::{
    FsError, FsResult, RemoteDeleteOptions, RemoteDirEntry, RemoteFileType,
    RemoteOverwriteOptions, RemoteStat, RemoteWriteOptions, SidecarFileSystem,
};

use super::to_millis;

/// Local filesystem sidecar.
///
/// All paths are relative to `root`: with a root of `/projects`, the path
/// `/src/main.rs` reads `/projects/src/main.rs`. Attempts to escape via `..`
/// or through symlinks pointing outside the root are blocked.
#[derive(Debug, Clone)]
pub struct LocalSidecar {
    root: PathBuf,
}

impl LocalSidecar {
    /// Create a sidecar rooted at the given path.
    ///
    /// The root is canonicalized at construction time to handle symlinks
    /// (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = dunce::canonicalize(&root).unwrap_or(root);
        Self { root }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a sidecar path to an absolute path within the root.
    ///
    /// Symlinks in parent directories are resolved; the final component is
    /// left as is, so operations on a link act on the link itself.
    fn resolve(&self, path: &str) -> FsResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));

        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(FsError::permission_denied(format!("path escapes root: {path}")));
        }

        if relative.as_os_str().is_empty() {
            return Ok(self.root.clone());
        }

        let full = self.root.join(relative);
        let parent = full
            .parent()
            .ok_or_else(|| FsError::invalid_uri(format!("no parent: {path}")))?;
        let filename = full
            .file_name()
            .ok_or_else(|| FsError::invalid_uri(format!("no filename: {path}")))?;

        let resolved = if parent.exists() {
            dunce::canonicalize(parent)
                .map_err(|e| FsError::from_io(e, path))?
                .join(filename)
        } else {
            // Parent doesn't exist, will fail on actual operation
            full.clone()
        };

        self.check_within_root(&resolved, path)?;
        Ok(resolved)
    }

    /// Resolve like [`resolve`](Self::resolve), then follow a final symlink.
    ///
    /// For operations that read or write through the link. The link target
    /// must also lie within the root, and a dangling link is not found.
    fn resolve_following(&self, path: &str) -> FsResult<PathBuf> {
        let resolved = self.resolve(path)?;
        match std::fs::symlink_metadata(&resolved) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let target =
                    dunce::canonicalize(&resolved).map_err(|e| FsError::from_io(e, path))?;
                self.check_within_root(&target, path)?;
                Ok(target)
            }
            _ => Ok(resolved),
        }
    }

    fn check_within_root(&self, resolved: &Path, path: &str) -> FsResult<()> {
        if resolved.starts_with(&self.root) {
            Ok(())
        } else {
            Err(FsError::permission_denied(format!(
                "path escapes root: {path}"
            )))
        }
    }

    fn kind_of(file_type: std::fs::FileType) -> RemoteFileType {
        if file_type.is_dir() {
            RemoteFileType::Directory
        } else if file_type.is_symlink() {
            RemoteFileType::SymbolicLink
        } else if file_type.is_file() {
            RemoteFileType::File
        } else {
            RemoteFileType::Unknown
        }
    }

    /// Convert std::fs::Metadata to RemoteStat.
    fn metadata_to_stat(meta: &std::fs::Metadata) -> RemoteStat {
        let mtime = meta.modified().map(to_millis).unwrap_or(0);
        RemoteStat {
            kind: Self::kind_of(meta.file_type()),
            ctime: meta.created().map(to_millis).unwrap_or(mtime),
            mtime,
            size: meta.len(),
        }
    }
}

#[async_trait]
impl SidecarFileSystem for LocalSidecar {
    async fn stat(&self, path: &str) -> FsResult<RemoteStat> {
        let full_path = self.resolve(path)?;
        let meta = fs::symlink_metadata(&full_path)
            .await
            .map_err(|e| FsError::from_io(e, path))?;
        Ok(Self::metadata_to_stat(&meta))
    }

    async fn mkdir(&self, path: &str) -> FsResult<()> {
        let full_path = self.resolve(path)?;
        fs::create_dir(&full_path)
            .await
            .map_err(|e| FsError::from_io(e, path))
    }

    async fn readdir(&self, path: &str) -> FsResult<Vec<RemoteDirEntry>> {
        let full_path = self.resolve_following(path)?;
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&full_path)
            .await
            .map_err(|e| FsError::from_io(e, path))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| FsError::from_io(e, path))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| FsError::from_io(e, path))?;
            entries.push((
                entry.file_name().to_string_lossy().into_owned(),
                Self::kind_of(file_type),
            ));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    async fn delete(&self, path: &str, opts: RemoteDeleteOptions) -> FsResult<()> {
        if opts.use_trash {
            return Err(FsError::unsupported("delete to trash"));
        }

        let full_path = self.resolve(path)?;
        if full_path == self.root {
            return Err(FsError::permission_denied("cannot remove root"));
        }

        let meta = fs::symlink_metadata(&full_path)
            .await
            .map_err(|e| FsError::from_io(e, path))?;

        let result = if meta.is_dir() {
            if opts.recursive {
                fs::remove_dir_all(&full_path).await
            } else {
                fs::remove_dir(&full_path).await
            }
        } else {
            fs::remove_file(&full_path).await
        };
        result.map_err(|e| FsError::from_io(e, path))
    }

    async fn rename(&self, from: &str, to: &str, opts: RemoteOverwriteOptions) -> FsResult<()> {
        let from_path = self.resolve(from)?;
        let to_path = self.resolve(to)?;

        if !opts.overwrite && fs::symlink_metadata(&to_path).await.is_ok() {
            return Err(FsError::already_exists(to));
        }

        fs::rename(&from_path, &to_path)
            .await
            .map_err(|e| FsError::from_io(e, from))
    }

    async fn read_file(&self, path: &str) -> FsResult<Vec<u8>> {
        let full_path = self.resolve_following(path)?;
        let meta = fs::metadata(&full_path)
            .await
            .map_err(|e| FsError::from_io(e, path))?;
        if meta.is_dir() {
            return Err(FsError::is_a_directory(path));
        }
        fs::read(&full_path)
            .await
            .map_err(|e| FsError::from_io(e, path))
    }

    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        opts: RemoteWriteOptions,
    ) -> FsResult<()> {
        let full_path = self.resolve_following(path)?;

        match fs::metadata(&full_path).await {
            Ok(meta) if meta.is_dir() => return Err(FsError::is_a_directory(path)),
            Ok(_) if !opts.overwrite => {
                return Err(FsError::already_exists(path));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !opts.create {
                    return Err(FsError::not_found(path));
                }
            }
            Err(e) => return Err(FsError::from_io(e, path)),
        }

        fs::write(&full_path, content)
            .await
            .map_err(|e| FsError::from_io(e, path))
    }
}
