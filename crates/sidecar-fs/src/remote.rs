//! Sidecar-backed provider.
//!
//! Every verb is one round trip to the shared delegate. Addresses become
//! plain paths on the way out, and metadata and listings are mapped back to
//! host types on the way in. Remote errors are returned untouched.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use url::Url;

use sidecar_types::{FsError, FsResult, SidecarFileSystem};

use crate::constants::DEFAULT_CHANGE_CHANNEL_CAPACITY;
use crate::mapper;
use crate::provider::FileSystemProvider;
use crate::types::{
    Capabilities, DeleteOptions, DirEntry, FileChange, OverwriteOptions, Stat, WatchHandle,
    WatchOptions, WriteOptions,
};
use crate::uri::remote_path;

/// Provider whose operations all run on the sidecar.
///
/// Advertises [`Capabilities::FILE_READ_WRITE`] only. The change stream
/// exists for shape but never fires, since watching is not supported.
pub struct RemoteFileSystemProvider {
    scheme: String,
    delegate: Arc<dyn SidecarFileSystem>,
    capabilities: Capabilities,
    changes: broadcast::Sender<Vec<FileChange>>,
}

impl std::fmt::Debug for RemoteFileSystemProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFileSystemProvider")
            .field("scheme", &self.scheme)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl RemoteFileSystemProvider {
    /// Create a provider for `scheme` backed by `delegate`.
    pub fn new(scheme: impl Into<String>, delegate: Arc<dyn SidecarFileSystem>) -> Self {
        Self::with_channel_capacity(scheme, delegate, DEFAULT_CHANGE_CHANNEL_CAPACITY)
    }

    /// Create a provider with a custom change channel capacity.
    pub fn with_channel_capacity(
        scheme: impl Into<String>,
        delegate: Arc<dyn SidecarFileSystem>,
        capacity: usize,
    ) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        Self {
            scheme: scheme.into(),
            delegate,
            capabilities: Capabilities::FILE_READ_WRITE,
            changes,
        }
    }

    /// Scheme this provider was created for.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

#[async_trait]
impl FileSystemProvider for RemoteFileSystemProvider {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<FileChange>> {
        self.changes.subscribe()
    }

    fn watch(&self, uri: &Url, _opts: &WatchOptions) -> FsResult<WatchHandle> {
        tracing::debug!(scheme = %self.scheme, %uri, "watch rejected");
        Err(FsError::unsupported("watch"))
    }

    async fn stat(&self, uri: &Url) -> FsResult<Stat> {
        let path = remote_path(uri)?;
        tracing::debug!(scheme = %self.scheme, %path, "stat");
        let stat = self.delegate.stat(&path).await?;
        Ok(mapper::to_local_stat(stat))
    }

    async fn mkdir(&self, uri: &Url) -> FsResult<()> {
        let path = remote_path(uri)?;
        tracing::debug!(scheme = %self.scheme, %path, "mkdir");
        self.delegate.mkdir(&path).await
    }

    async fn readdir(&self, uri: &Url) -> FsResult<Vec<DirEntry>> {
        let path = remote_path(uri)?;
        tracing::debug!(scheme = %self.scheme, %path, "readdir");
        let entries = self.delegate.readdir(&path).await?;
        Ok(mapper::to_local_entries(entries))
    }

    async fn delete(&self, uri: &Url, opts: DeleteOptions) -> FsResult<()> {
        let path = remote_path(uri)?;
        tracing::debug!(
            scheme = %self.scheme,
            %path,
            recursive = opts.recursive,
            use_trash = opts.use_trash,
            "delete"
        );
        self.delegate.delete(&path, opts.into()).await
    }

    async fn rename(&self, from: &Url, to: &Url, opts: OverwriteOptions) -> FsResult<()> {
        let from = remote_path(from)?;
        let to = remote_path(to)?;
        tracing::debug!(scheme = %self.scheme, %from, %to, overwrite = opts.overwrite, "rename");
        self.delegate.rename(&from, &to, opts.into()).await
    }

    async fn read_file(&self, uri: &Url) -> FsResult<Vec<u8>> {
        let path = remote_path(uri)?;
        tracing::debug!(scheme = %self.scheme, %path, "readFile");
        self.delegate.read_file(&path).await
    }

    async fn write_file(&self, uri: &Url, content: &[u8], opts: WriteOptions) -> FsResult<()> {
        let path = remote_path(uri)?;
        tracing::debug!(
            scheme = %self.scheme,
            %path,
            len = content.len(),
            overwrite = opts.overwrite,
            create = opts.create,
            "writeFile"
        );
        self.delegate.write_file(&path, content, opts.into()).await
    }
}
