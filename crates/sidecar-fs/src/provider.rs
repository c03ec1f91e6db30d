//! Filesystem provider trait.
//!
//! A provider serves every address of one scheme. The host dispatch table
//! ([`FileService`](crate::FileService)) picks the provider by scheme and only
//! calls verbs its [`Capabilities`] allow.

use async_trait::async_trait;
use tokio::sync::broadcast;
use url::Url;

use sidecar_types::{FsError, FsResult};

use crate::types::{
    Capabilities, DeleteOptions, DirEntry, FileChange, FileHandle, OpenOptions, OverwriteOptions,
    Stat, WatchHandle, WatchOptions, WriteOptions,
};

/// Core provider operations.
///
/// The whole-file, handle and copy verbs have default implementations that
/// fail with [`FsError::Unsupported`]; a provider overrides the ones its
/// capabilities advertise.
#[async_trait]
pub trait FileSystemProvider: Send + Sync {
    // ========================================================================
    // Shape
    // ========================================================================

    /// Declared capabilities.
    fn capabilities(&self) -> Capabilities;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<Vec<FileChange>>;

    /// Start watching `uri` for changes.
    fn watch(&self, uri: &Url, opts: &WatchOptions) -> FsResult<WatchHandle>;

    // ========================================================================
    // Metadata and directories
    // ========================================================================

    /// Get file metadata.
    async fn stat(&self, uri: &Url) -> FsResult<Stat>;

    /// Create a directory.
    async fn mkdir(&self, uri: &Url) -> FsResult<()>;

    /// List a directory.
    async fn readdir(&self, uri: &Url) -> FsResult<Vec<DirEntry>>;

    /// Delete a file or directory.
    async fn delete(&self, uri: &Url, opts: DeleteOptions) -> FsResult<()>;

    /// Rename a file or directory.
    async fn rename(&self, from: &Url, to: &Url, opts: OverwriteOptions) -> FsResult<()>;

    // ========================================================================
    // Capability-gated verbs
    // ========================================================================

    /// Read the whole file. Requires [`Capabilities::FILE_READ_WRITE`].
    async fn read_file(&self, _uri: &Url) -> FsResult<Vec<u8>> {
        Err(FsError::unsupported("readFile"))
    }

    /// Replace the whole file. Requires [`Capabilities::FILE_READ_WRITE`].
    async fn write_file(&self, _uri: &Url, _content: &[u8], _opts: WriteOptions) -> FsResult<()> {
        Err(FsError::unsupported("writeFile"))
    }

    /// Copy natively. Requires [`Capabilities::FILE_FOLDER_COPY`].
    async fn copy(&self, _from: &Url, _to: &Url, _opts: OverwriteOptions) -> FsResult<()> {
        Err(FsError::unsupported("copy"))
    }

    /// Open a handle. Requires [`Capabilities::FILE_OPEN_READ_WRITE_CLOSE`].
    async fn open(&self, _uri: &Url, _opts: OpenOptions) -> FsResult<FileHandle> {
        Err(FsError::unsupported("open"))
    }

    /// Close a handle. Requires [`Capabilities::FILE_OPEN_READ_WRITE_CLOSE`].
    async fn close(&self, _handle: FileHandle) -> FsResult<()> {
        Err(FsError::unsupported("close"))
    }
}
