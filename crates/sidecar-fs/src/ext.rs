//! Extension-host filesystem API.
//!
//! This is the surface extensions call. It takes addresses and loosely
//! specified options, and is what the content-aware layer wraps.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use sidecar_types::{FsError, FsResult};

use crate::types::{DirEntry, ExtDeleteOptions, ExtOverwriteOptions, FileHandle, OpenOptions, Stat};

/// Filesystem verbs available to extensions.
#[async_trait]
pub trait FileSystemExt: Send + Sync {
    /// Get file metadata.
    async fn stat(&self, uri: &Url) -> FsResult<Stat>;

    /// List a directory.
    async fn read_directory(&self, uri: &Url) -> FsResult<Vec<DirEntry>>;

    /// Read the whole file.
    async fn read_file(&self, uri: &Url) -> FsResult<Vec<u8>>;

    /// Write the whole file, creating or replacing it.
    async fn write_file(&self, uri: &Url, content: &[u8]) -> FsResult<()>;

    /// Rename `source` to `target`.
    async fn rename(&self, source: &Url, target: &Url, opts: ExtOverwriteOptions)
    -> FsResult<()>;

    /// Copy `source` to `target`.
    async fn copy(&self, source: &Url, target: &Url, opts: ExtOverwriteOptions) -> FsResult<()>;

    /// Create a directory.
    async fn create_directory(&self, uri: &Url) -> FsResult<()>;

    /// Delete a file or directory.
    async fn delete(&self, uri: &Url, opts: ExtDeleteOptions) -> FsResult<()>;

    /// Open a file handle.
    async fn open(&self, _uri: &Url, _opts: OpenOptions) -> FsResult<FileHandle> {
        Err(FsError::unsupported("open"))
    }
}

#[async_trait]
impl<T: FileSystemExt + ?Sized> FileSystemExt for Arc<T> {
    async fn stat(&self, uri: &Url) -> FsResult<Stat> {
        (**self).stat(uri).await
    }

    async fn read_directory(&self, uri: &Url) -> FsResult<Vec<DirEntry>> {
        (**self).read_directory(uri).await
    }

    async fn read_file(&self, uri: &Url) -> FsResult<Vec<u8>> {
        (**self).read_file(uri).await
    }

    async fn write_file(&self, uri: &Url, content: &[u8]) -> FsResult<()> {
        (**self).write_file(uri, content).await
    }

    async fn rename(&self, source: &Url, target: &Url, opts: ExtOverwriteOptions)
    -> FsResult<()> {
        (**self).rename(source, target, opts).await
    }

    async fn copy(&self, source: &Url, target: &Url, opts: ExtOverwriteOptions) -> FsResult<()> {
        (**self).copy(source, target, opts).await
    }

    async fn create_directory(&self, uri: &Url) -> FsResult<()> {
        (**self).create_directory(uri).await
    }

    async fn delete(&self, uri: &Url, opts: ExtDeleteOptions) -> FsResult<()> {
        (**self).delete(uri, opts).await
    }

    async fn open(&self, uri: &Url, opts: OpenOptions) -> FsResult<FileHandle> {
        (**self).open(uri, opts).await
    }
}
