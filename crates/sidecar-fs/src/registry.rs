//! Provider registry exposed to the sidecar.
//!
//! The sidecar asks for schemes to be attached and detached; each attached
//! scheme gets a [`RemoteFileSystemProvider`] bound to the one shared
//! delegate, registered with the host [`FileService`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use sidecar_client::spawn_delegate;
use sidecar_types::{FsError, FsResult, SidecarFileSystem, SidecarFileSystemMain};

use crate::config::BridgeConfig;
use crate::constants::DEFAULT_CHANGE_CHANNEL_CAPACITY;
use crate::remote::RemoteFileSystemProvider;
use crate::service::{FileService, Registration};

/// Scheme → live registration, plus the delegate every provider shares.
pub struct SidecarFileSystemRegistry {
    registrations: Mutex<HashMap<String, Registration>>,
    delegate: Arc<dyn SidecarFileSystem>,
    file_service: Arc<FileService>,
    channel_capacity: usize,
}

impl std::fmt::Debug for SidecarFileSystemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SidecarFileSystemRegistry")
            .field("schemes", &self.schemes())
            .field("channel_capacity", &self.channel_capacity)
            .finish_non_exhaustive()
    }
}

impl SidecarFileSystemRegistry {
    /// Create a registry that hands `delegate` to every provider.
    pub fn new(delegate: Arc<dyn SidecarFileSystem>, file_service: Arc<FileService>) -> Self {
        Self {
            registrations: Mutex::new(HashMap::new()),
            delegate,
            file_service,
            channel_capacity: DEFAULT_CHANGE_CHANNEL_CAPACITY,
        }
    }

    /// Create a registry using the settings in `config`.
    pub fn with_config(
        delegate: Arc<dyn SidecarFileSystem>,
        file_service: Arc<FileService>,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            channel_capacity: config.change_channel_capacity,
            ..Self::new(delegate, file_service)
        }
    }

    /// Spawn a delegate actor in front of `sidecar` and build a registry on it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(
        sidecar: Arc<dyn SidecarFileSystem>,
        file_service: Arc<FileService>,
        config: &BridgeConfig,
    ) -> Self {
        let delegate = spawn_delegate(sidecar);
        Self::with_config(Arc::new(delegate), file_service, config)
    }

    /// The dispatch table providers are registered with.
    pub fn file_service(&self) -> &Arc<FileService> {
        &self.file_service
    }

    /// Schemes currently attached, sorted.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.registrations.lock().keys().cloned().collect();
        schemes.sort();
        schemes
    }

    pub fn is_registered(&self, scheme: &str) -> bool {
        self.registrations.lock().contains_key(scheme)
    }

    /// Detach every scheme, e.g. when the sidecar goes away.
    pub fn dispose_all(&self) {
        let drained: Vec<(String, Registration)> = self.registrations.lock().drain().collect();
        for (scheme, registration) in drained {
            registration.dispose();
            tracing::info!(%scheme, "sidecar filesystem disposed");
        }
    }
}

#[async_trait]
impl SidecarFileSystemMain for SidecarFileSystemRegistry {
    async fn register_file_system_provider(&self, scheme: &str) -> FsResult<()> {
        let mut registrations = self.registrations.lock();
        if registrations.contains_key(scheme) {
            tracing::warn!(%scheme, "sidecar filesystem already registered");
            return Err(FsError::SchemeAlreadyRegistered(scheme.to_string()));
        }

        let provider = RemoteFileSystemProvider::with_channel_capacity(
            scheme,
            Arc::clone(&self.delegate),
            self.channel_capacity,
        );
        let registration = self
            .file_service
            .register_provider(scheme, Arc::new(provider))?;
        registrations.insert(scheme.to_string(), registration);

        tracing::info!(%scheme, "sidecar filesystem registered");
        Ok(())
    }

    async fn dispose_file_system_provider(&self, scheme: &str) -> FsResult<()> {
        let removed = self.registrations.lock().remove(scheme);
        match removed {
            Some(registration) => {
                registration.dispose();
                tracing::info!(%scheme, "sidecar filesystem disposed");
            }
            None => tracing::debug!(%scheme, "dispose of unregistered scheme ignored"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemorySidecar;
    use url::Url;

    fn registry() -> SidecarFileSystemRegistry {
        SidecarFileSystemRegistry::new(
            Arc::new(MemorySidecar::new()),
            Arc::new(FileService::new()),
        )
    }

    #[tokio::test]
    async fn test_register_adds_provider() {
        let registry = registry();
        registry.register_file_system_provider("sidecar").await.unwrap();

        assert!(registry.is_registered("sidecar"));
        assert!(registry.file_service().has_provider("sidecar"));
        assert_eq!(registry.schemes(), vec!["sidecar".to_string()]);
    }

    #[tokio::test]
    async fn test_reregister_is_error_and_keeps_original() {
        let registry = registry();
        registry.register_file_system_provider("sidecar").await.unwrap();
        let before = registry.file_service().provider_for_scheme("sidecar").unwrap();

        let err = registry
            .register_file_system_provider("sidecar")
            .await
            .unwrap_err();
        assert_eq!(err, FsError::SchemeAlreadyRegistered("sidecar".into()));

        let after = registry.file_service().provider_for_scheme("sidecar").unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_scheme_owned_by_host_is_rejected() {
        let registry = registry();
        let host_provider = RemoteFileSystemProvider::new("file", Arc::new(MemorySidecar::new()));
        let _host = registry
            .file_service()
            .register_provider("file", Arc::new(host_provider))
            .unwrap();

        let err = registry
            .register_file_system_provider("file")
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::SchemeAlreadyRegistered(_)));
        assert!(!registry.is_registered("file"));
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent() {
        let registry = registry();
        registry.register_file_system_provider("sidecar").await.unwrap();

        registry.dispose_file_system_provider("sidecar").await.unwrap();
        registry.dispose_file_system_provider("sidecar").await.unwrap();
        registry.dispose_file_system_provider("never").await.unwrap();

        assert!(!registry.is_registered("sidecar"));
        assert!(!registry.file_service().has_provider("sidecar"));
    }

    #[tokio::test]
    async fn test_register_after_dispose() {
        let registry = registry();
        registry.register_file_system_provider("sidecar").await.unwrap();
        registry.dispose_file_system_provider("sidecar").await.unwrap();
        registry.register_file_system_provider("sidecar").await.unwrap();
        assert!(registry.file_service().has_provider("sidecar"));
    }

    #[tokio::test]
    async fn test_providers_share_delegate() {
        let registry = registry();
        registry.register_file_system_provider("one").await.unwrap();
        registry.register_file_system_provider("two").await.unwrap();
        let service = registry.file_service();

        service
            .mkdir(&Url::parse("one:/shared").unwrap())
            .await
            .unwrap();
        let stat = service
            .stat(&Url::parse("two:/shared").unwrap())
            .await
            .unwrap();
        assert!(stat.is_dir());
    }

    #[tokio::test]
    async fn test_dispose_all() {
        let registry = registry();
        registry.register_file_system_provider("one").await.unwrap();
        registry.register_file_system_provider("two").await.unwrap();

        registry.dispose_all();
        assert!(registry.schemes().is_empty());
        assert!(registry.file_service().schemes().is_empty());
    }
}
