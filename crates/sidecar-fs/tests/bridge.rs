//! End-to-end tests for the sidecar filesystem bridge.
//!
//! Every test goes through the full chain:
//! `FileService` → `RemoteFileSystemProvider` → delegate actor → sidecar.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use sidecar_fs::{
    BridgeConfig, ContentAwareFileSystem, DeleteOptions, FileService, FileSystemExt, FileType,
    FsError, FsResult, LocalSidecar, MemorySidecar, OverwriteOptions, SidecarFileSystemRegistry,
    WatchOptions, WriteOptions,
};
use sidecar_types::{
    RemoteDeleteOptions, RemoteDirEntry, RemoteFileType, RemoteOverwriteOptions, RemoteStat,
    RemoteWriteOptions, SidecarFileSystem, SidecarFileSystemMain,
};

// ============================================================================
// Shared test setup
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Stat(String),
    Delete(String, RemoteDeleteOptions),
    Rename(String, String, RemoteOverwriteOptions),
    Write(String, Vec<u8>, RemoteWriteOptions),
}

/// Sidecar that records what it receives and answers with fixed data.
#[derive(Default)]
struct ScriptedSidecar {
    calls: Mutex<Vec<Call>>,
}

impl ScriptedSidecar {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SidecarFileSystem for ScriptedSidecar {
    async fn stat(&self, path: &str) -> FsResult<RemoteStat> {
        self.calls.lock().push(Call::Stat(path.to_string()));
        Ok(RemoteStat {
            kind: RemoteFileType::File,
            ctime: 1,
            mtime: 2,
            size: 42,
        })
    }

    async fn mkdir(&self, path: &str) -> FsResult<()> {
        Err(FsError::permission_denied(path))
    }

    async fn readdir(&self, _path: &str) -> FsResult<Vec<RemoteDirEntry>> {
        Ok(vec![
            ("a".to_string(), RemoteFileType::File),
            ("b".to_string(), RemoteFileType::Directory),
        ])
    }

    async fn delete(&self, path: &str, opts: RemoteDeleteOptions) -> FsResult<()> {
        self.calls.lock().push(Call::Delete(path.to_string(), opts));
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str, opts: RemoteOverwriteOptions) -> FsResult<()> {
        self.calls
            .lock()
            .push(Call::Rename(from.to_string(), to.to_string(), opts));
        Ok(())
    }

    async fn read_file(&self, path: &str) -> FsResult<Vec<u8>> {
        Err(FsError::not_found(path))
    }

    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        opts: RemoteWriteOptions,
    ) -> FsResult<()> {
        self.calls
            .lock()
            .push(Call::Write(path.to_string(), content.to_vec(), opts));
        Ok(())
    }
}

/// Registry over `sidecar`, connected through a delegate actor.
async fn connect(sidecar: Arc<dyn SidecarFileSystem>, scheme: &str) -> SidecarFileSystemRegistry {
    init_tracing();
    let registry = SidecarFileSystemRegistry::connect(
        sidecar,
        Arc::new(FileService::new()),
        &BridgeConfig::default(),
    );
    registry.register_file_system_provider(scheme).await.unwrap();
    registry
}

// ============================================================================
// Forwarding
// ============================================================================

#[tokio::test]
async fn stat_sends_path_only_and_maps_result() {
    let sidecar = Arc::new(ScriptedSidecar::default());
    let registry = connect(sidecar.clone(), "sidecar").await;

    let stat = registry
        .file_service()
        .stat(&url("sidecar:/tmp/x"))
        .await
        .unwrap();

    assert_eq!(stat.kind, FileType::File);
    assert_eq!((stat.size, stat.ctime, stat.mtime), (42, 1, 2));
    assert_eq!(sidecar.calls(), vec![Call::Stat("/tmp/x".into())]);
}

#[tokio::test]
async fn options_reach_sidecar_unchanged() {
    let sidecar = Arc::new(ScriptedSidecar::default());
    let registry = connect(sidecar.clone(), "sidecar").await;
    let service: &FileService = registry.file_service();

    service
        .delete(
            &url("sidecar:/tmp/d"),
            DeleteOptions {
                recursive: true,
                use_trash: false,
            },
        )
        .await
        .unwrap();
    service
        .rename(
            &url("sidecar:/a"),
            &url("sidecar:/b"),
            OverwriteOptions { overwrite: true },
        )
        .await
        .unwrap();
    service
        .write_file(
            &url("sidecar:/bin"),
            &[0xff, 0x00, 0xfe],
            WriteOptions {
                overwrite: false,
                create: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(
        sidecar.calls(),
        vec![
            Call::Delete(
                "/tmp/d".into(),
                RemoteDeleteOptions {
                    recursive: true,
                    use_trash: false,
                },
            ),
            Call::Rename(
                "/a".into(),
                "/b".into(),
                RemoteOverwriteOptions { overwrite: true },
            ),
            Call::Write(
                "/bin".into(),
                vec![0xff, 0x00, 0xfe],
                RemoteWriteOptions {
                    overwrite: false,
                    create: true,
                },
            ),
        ]
    );
}

#[tokio::test]
async fn listing_order_and_errors_survive_the_trip() {
    let sidecar = Arc::new(ScriptedSidecar::default());
    let registry = connect(sidecar, "sidecar").await;
    let service: &FileService = registry.file_service();

    let entries = service.readdir(&url("sidecar:/")).await.unwrap();
    assert_eq!(
        entries,
        vec![
            ("a".to_string(), FileType::File),
            ("b".to_string(), FileType::Directory),
        ]
    );

    let err = service.mkdir(&url("sidecar:/locked")).await.unwrap_err();
    assert_eq!(err, FsError::permission_denied("/locked"));
}

#[tokio::test]
async fn watch_is_rejected() {
    let registry = connect(Arc::new(MemorySidecar::new()), "sidecar").await;
    let err = registry
        .file_service()
        .watch(&url("sidecar:/"), &WatchOptions::default())
        .unwrap_err();
    assert!(matches!(err, FsError::Unsupported(_)));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn dispose_stops_routing() {
    let registry = connect(Arc::new(MemorySidecar::new()), "sidecar").await;
    registry
        .dispose_file_system_provider("sidecar")
        .await
        .unwrap();
    registry
        .dispose_file_system_provider("sidecar")
        .await
        .unwrap();

    let err = registry
        .file_service()
        .stat(&url("sidecar:/"))
        .await
        .unwrap_err();
    assert_eq!(err, FsError::NoProvider("sidecar".into()));
}

// ============================================================================
// Real sidecar filesystems
// ============================================================================

#[tokio::test]
async fn memory_sidecar_round_trip() {
    let registry = connect(Arc::new(MemorySidecar::new()), "mem").await;
    let service: &FileService = registry.file_service();
    let create = WriteOptions::create_or_replace();

    service.mkdir(&url("mem:/project")).await.unwrap();
    service
        .write_file(&url("mem:/project/a%20b.txt"), b"spaced", create)
        .await
        .unwrap();

    let entries = service.readdir(&url("mem:/project")).await.unwrap();
    assert_eq!(entries, vec![("a b.txt".to_string(), FileType::File)]);

    service
        .rename(
            &url("mem:/project/a%20b.txt"),
            &url("mem:/project/c.txt"),
            OverwriteOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(
        service.read_file(&url("mem:/project/c.txt")).await.unwrap(),
        b"spaced"
    );

    let err = service
        .delete(&url("mem:/project"), DeleteOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FsError::DirectoryNotEmpty(_)));
}

#[tokio::test]
async fn local_sidecar_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let registry = connect(Arc::new(LocalSidecar::new(dir.path())), "disk").await;
    let service: &FileService = registry.file_service();

    service
        .write_file(
            &url("disk:/hello.txt"),
            b"hello",
            WriteOptions::create_or_replace(),
        )
        .await
        .unwrap();
    assert_eq!(
        std::fs::read(dir.path().join("hello.txt")).unwrap(),
        b"hello"
    );

    let stat = service.stat(&url("disk:/hello.txt")).await.unwrap();
    assert!(stat.is_file());
    assert_eq!(stat.size, 5);

    // Encoded slashes keep the dots out of URL normalization.
    let err = service
        .read_file(&url("disk:/..%2F..%2Foutside"))
        .await
        .unwrap_err();
    assert!(matches!(err, FsError::PermissionDenied(_)), "unexpected {err:?}");
}

// ============================================================================
// Address interception
// ============================================================================

#[tokio::test]
async fn redirected_addresses_land_in_the_sidecar() {
    let registry = connect(Arc::new(MemorySidecar::new()), "sidecar").await;
    let config = BridgeConfig::from_ron_str(
        r#"(redirects: [(from: ["file", "vscode-userdata"], to: "sidecar")])"#,
    )
    .unwrap();
    let fs = ContentAwareFileSystem::new(
        Arc::clone(registry.file_service()),
        config.scheme_redirect().unwrap(),
    );

    fs.create_directory(&url("file:///work")).await.unwrap();
    fs.write_file(&url("vscode-userdata:/work/settings.json"), b"{}")
        .await
        .unwrap();

    let direct = registry
        .file_service()
        .read_file(&url("sidecar:/work/settings.json"))
        .await
        .unwrap();
    assert_eq!(direct, b"{}");

    let listed = fs.read_directory(&url("file:///work")).await.unwrap();
    assert_eq!(listed, vec![("settings.json".to_string(), FileType::File)]);
}
