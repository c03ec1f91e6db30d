//! Host dispatch table with scheme routing.
//!
//! Routes filesystem operations to the provider registered for the scheme of
//! each address, and checks the provider's capabilities before calling it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use url::Url;

use sidecar_types::{FsError, FsResult};

use crate::ext::FileSystemExt;
use crate::provider::FileSystemProvider;
use crate::types::{
    Capabilities, DeleteOptions, DirEntry, ExtDeleteOptions, ExtOverwriteOptions, FileChange,
    FileHandle, OpenOptions, OverwriteOptions, Stat, WatchHandle, WatchOptions, WriteOptions,
};
use crate::uri;

struct ProviderSlot {
    id: u64,
    provider: Arc<dyn FileSystemProvider>,
}

type ProviderTable = RwLock<HashMap<String, ProviderSlot>>;

/// Routes filesystem operations to registered providers.
///
/// Each scheme has at most one provider. Registering returns a
/// [`Registration`]; disposing it removes that provider again.
pub struct FileService {
    providers: Arc<ProviderTable>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("schemes", &self.schemes())
            .finish()
    }
}

impl Default for FileService {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a provider registered with a [`FileService`].
///
/// Disposing twice is a no-op, and a stale registration never removes a
/// newer provider registered under the same scheme.
pub struct Registration {
    scheme: String,
    id: u64,
    providers: Weak<ProviderTable>,
    disposed: AtomicBool,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("scheme", &self.scheme)
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Registration {
    /// Scheme this registration covers.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Remove the provider from the dispatch table.
    ///
    /// Returns `true` if this call removed it.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        let Some(providers) = self.providers.upgrade() else {
            return false;
        };

        let mut providers = providers.write();
        if providers
            .get(&self.scheme)
            .is_some_and(|slot| slot.id == self.id)
        {
            providers.remove(&self.scheme);
            tracing::debug!(scheme = %self.scheme, id = self.id, "provider removed");
            true
        } else {
            false
        }
    }
}

impl FileService {
    /// Create an empty dispatch table.
    pub fn new() -> Self {
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `provider` for `scheme`.
    ///
    /// Fails with [`FsError::SchemeAlreadyRegistered`] if the scheme is taken.
    pub fn register_provider(
        &self,
        scheme: impl Into<String>,
        provider: Arc<dyn FileSystemProvider>,
    ) -> FsResult<Registration> {
        let scheme = scheme.into();
        let mut providers = self.providers.write();
        if providers.contains_key(&scheme) {
            return Err(FsError::SchemeAlreadyRegistered(scheme));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        providers.insert(scheme.clone(), ProviderSlot { id, provider });
        tracing::debug!(%scheme, id, "provider added");

        Ok(Registration {
            scheme,
            id,
            providers: Arc::downgrade(&self.providers),
            disposed: AtomicBool::new(false),
        })
    }

    /// Whether a provider is registered for `scheme`.
    pub fn has_provider(&self, scheme: &str) -> bool {
        self.providers.read().contains_key(scheme)
    }

    /// All registered schemes, sorted.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.providers.read().keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Provider registered for `scheme`.
    pub fn provider_for_scheme(&self, scheme: &str) -> FsResult<Arc<dyn FileSystemProvider>> {
        self.providers
            .read()
            .get(scheme)
            .map(|slot| Arc::clone(&slot.provider))
            .ok_or_else(|| FsError::NoProvider(scheme.to_string()))
    }

    /// Provider responsible for `uri`.
    pub fn provider(&self, uri: &Url) -> FsResult<Arc<dyn FileSystemProvider>> {
        self.provider_for_scheme(uri.scheme())
    }

    /// Capabilities of the provider responsible for `uri`.
    pub fn capabilities(&self, uri: &Url) -> FsResult<Capabilities> {
        Ok(self.provider(uri)?.capabilities())
    }

    fn writable(&self, uri: &Url) -> FsResult<Arc<dyn FileSystemProvider>> {
        let provider = self.provider(uri)?;
        if provider.capabilities().contains(Capabilities::READONLY) {
            return Err(FsError::permission_denied(uri.as_str()));
        }
        Ok(provider)
    }

    fn require(
        provider: &dyn FileSystemProvider,
        capability: Capabilities,
        op: &str,
    ) -> FsResult<()> {
        if provider.capabilities().contains(capability) {
            Ok(())
        } else {
            Err(FsError::unsupported(op))
        }
    }

    // ========================================================================
    // Verbs
    // ========================================================================

    pub async fn stat(&self, uri: &Url) -> FsResult<Stat> {
        self.provider(uri)?.stat(uri).await
    }

    pub async fn mkdir(&self, uri: &Url) -> FsResult<()> {
        self.writable(uri)?.mkdir(uri).await
    }

    pub async fn readdir(&self, uri: &Url) -> FsResult<Vec<DirEntry>> {
        self.provider(uri)?.readdir(uri).await
    }

    /// Delete. Trash deletes need a provider advertising
    /// [`Capabilities::TRASH`].
    pub async fn delete(&self, uri: &Url, opts: DeleteOptions) -> FsResult<()> {
        let provider = self.writable(uri)?;
        if opts.use_trash {
            Self::require(provider.as_ref(), Capabilities::TRASH, "delete to trash")?;
        }
        provider.delete(uri, opts).await
    }

    /// Rename. Across providers this becomes copy then recursive delete.
    pub async fn rename(&self, source: &Url, target: &Url, opts: OverwriteOptions) -> FsResult<()> {
        if source.scheme() == target.scheme() {
            return self.writable(source)?.rename(source, target, opts).await;
        }

        self.writable(source)?;
        tracing::debug!(%source, %target, "rename across providers");
        self.copy(source, target, opts).await?;
        self.delete(
            source,
            DeleteOptions {
                recursive: true,
                use_trash: false,
            },
        )
        .await
    }

    /// Copy. Uses the provider's native copy when both addresses share a
    /// provider advertising [`Capabilities::FILE_FOLDER_COPY`], otherwise
    /// walks the source with whole-file reads and writes.
    pub async fn copy(&self, source: &Url, target: &Url, opts: OverwriteOptions) -> FsResult<()> {
        if source == target {
            return Err(FsError::other(format!("cannot copy {source} onto itself")));
        }
        if source.scheme() == target.scheme() {
            let inner = format!("{}/", source.path().trim_end_matches('/'));
            if target.path().starts_with(&inner) {
                return Err(FsError::other(format!(
                    "cannot copy {source} into its own subtree"
                )));
            }
        }

        let from = self.provider(source)?;
        let to = self.writable(target)?;

        if source.scheme() == target.scheme()
            && from.capabilities().contains(Capabilities::FILE_FOLDER_COPY)
        {
            return from.copy(source, target, opts).await;
        }

        Self::require(from.as_ref(), Capabilities::FILE_READ_WRITE, "readFile")?;
        Self::require(to.as_ref(), Capabilities::FILE_READ_WRITE, "writeFile")?;

        match to.stat(target).await {
            Ok(_) if !opts.overwrite => return Err(FsError::already_exists(target.as_str())),
            Ok(_) => {
                to.delete(
                    target,
                    DeleteOptions {
                        recursive: true,
                        use_trash: false,
                    },
                )
                .await?
            }
            Err(FsError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        tracing::debug!(%source, %target, "copy by read and write");
        copy_tree(from.as_ref(), source, to.as_ref(), target).await
    }

    pub async fn read_file(&self, uri: &Url) -> FsResult<Vec<u8>> {
        let provider = self.provider(uri)?;
        Self::require(provider.as_ref(), Capabilities::FILE_READ_WRITE, "readFile")?;
        provider.read_file(uri).await
    }

    pub async fn write_file(&self, uri: &Url, content: &[u8], opts: WriteOptions) -> FsResult<()> {
        let provider = self.writable(uri)?;
        Self::require(provider.as_ref(), Capabilities::FILE_READ_WRITE, "writeFile")?;
        provider.write_file(uri, content, opts).await
    }

    pub async fn open(&self, uri: &Url, opts: OpenOptions) -> FsResult<FileHandle> {
        let provider = self.provider(uri)?;
        Self::require(
            provider.as_ref(),
            Capabilities::FILE_OPEN_READ_WRITE_CLOSE,
            "open",
        )?;
        provider.open(uri, opts).await
    }

    /// Close a handle opened through the provider for `scheme`.
    pub async fn close(&self, scheme: &str, handle: FileHandle) -> FsResult<()> {
        let provider = self.provider_for_scheme(scheme)?;
        Self::require(
            provider.as_ref(),
            Capabilities::FILE_OPEN_READ_WRITE_CLOSE,
            "close",
        )?;
        provider.close(handle).await
    }

    /// Start watching `uri`.
    pub fn watch(&self, uri: &Url, opts: &WatchOptions) -> FsResult<WatchHandle> {
        self.provider(uri)?.watch(uri, opts)
    }

    /// Subscribe to changes reported by the provider for `scheme`.
    pub fn subscribe(&self, scheme: &str) -> FsResult<broadcast::Receiver<Vec<FileChange>>> {
        Ok(self.provider_for_scheme(scheme)?.subscribe())
    }
}

/// Copy `source` to `target` one entry at a time.
fn copy_tree<'a>(
    from: &'a dyn FileSystemProvider,
    source: &'a Url,
    to: &'a dyn FileSystemProvider,
    target: &'a Url,
) -> BoxFuture<'a, FsResult<()>> {
    async move {
        if from.stat(source).await?.is_dir() {
            to.mkdir(target).await?;
            for (name, _) in from.readdir(source).await? {
                let child_source = uri::join(source, &name);
                let child_target = uri::join(target, &name);
                copy_tree(from, &child_source, to, &child_target).await?;
            }
            Ok(())
        } else {
            let content = from.read_file(source).await?;
            to.write_file(target, &content, WriteOptions::create_or_replace())
                .await
        }
    }
    .boxed()
}

#[async_trait]
impl FileSystemExt for FileService {
    async fn stat(&self, uri: &Url) -> FsResult<Stat> {
        FileService::stat(self, uri).await
    }

    async fn read_directory(&self, uri: &Url) -> FsResult<Vec<DirEntry>> {
        self.readdir(uri).await
    }

    async fn read_file(&self, uri: &Url) -> FsResult<Vec<u8>> {
        FileService::read_file(self, uri).await
    }

    async fn write_file(&self, uri: &Url, content: &[u8]) -> FsResult<()> {
        FileService::write_file(self, uri, content, WriteOptions::create_or_replace()).await
    }

    async fn rename(&self, source: &Url, target: &Url, opts: ExtOverwriteOptions) -> FsResult<()> {
        FileService::rename(self, source, target, opts.into()).await
    }

    async fn copy(&self, source: &Url, target: &Url, opts: ExtOverwriteOptions) -> FsResult<()> {
        FileService::copy(self, source, target, opts.into()).await
    }

    async fn create_directory(&self, uri: &Url) -> FsResult<()> {
        self.mkdir(uri).await
    }

    async fn delete(&self, uri: &Url, opts: ExtDeleteOptions) -> FsResult<()> {
        FileService::delete(self, uri, opts.into()).await
    }

    async fn open(&self, uri: &Url, opts: OpenOptions) -> FsResult<FileHandle> {
        FileService::open(self, uri, opts).await
    }
}
