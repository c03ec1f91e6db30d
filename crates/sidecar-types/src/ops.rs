//! RPC interfaces on either side of the bridge.

use async_trait::async_trait;

use crate::error::FsResult;
use crate::types::{
    RemoteDeleteOptions, RemoteDirEntry, RemoteOverwriteOptions, RemoteStat, RemoteWriteOptions,
};

/// Filesystem verbs executed by the sidecar.
///
/// Main holds one implementation of this (the delegate) and shares it across
/// every registered scheme. All paths are plain strings: the path component
/// of the caller's address, already decoded.
#[async_trait]
pub trait SidecarFileSystem: Send + Sync {
    /// Get file metadata.
    async fn stat(&self, path: &str) -> FsResult<RemoteStat>;

    /// Create a directory. The parent must exist.
    async fn mkdir(&self, path: &str) -> FsResult<()>;

    /// List a directory, in whatever order the sidecar chooses.
    async fn readdir(&self, path: &str) -> FsResult<Vec<RemoteDirEntry>>;

    /// Delete a file or directory.
    async fn delete(&self, path: &str, opts: RemoteDeleteOptions) -> FsResult<()>;

    /// Rename a file or directory.
    async fn rename(&self, from: &str, to: &str, opts: RemoteOverwriteOptions) -> FsResult<()>;

    /// Read the whole file.
    async fn read_file(&self, path: &str) -> FsResult<Vec<u8>>;

    /// Replace the whole file.
    async fn write_file(&self, path: &str, content: &[u8], opts: RemoteWriteOptions)
    -> FsResult<()>;
}

/// Registration lifecycle exposed by main to the sidecar.
///
/// Both calls only acknowledge completion or failure.
#[async_trait]
pub trait SidecarFileSystemMain: Send + Sync {
    /// Attach a sidecar-backed provider to `scheme`.
    async fn register_file_system_provider(&self, scheme: &str) -> FsResult<()>;

    /// Detach the provider for `scheme`. No-op when nothing is registered.
    async fn dispose_file_system_provider(&self, scheme: &str) -> FsResult<()>;
}
