//! Actor-based delegate handle.
//!
//! Provides a `Send+Sync+Clone` [`DelegateHandle`] that turns every
//! filesystem call into a command on an mpsc channel. The actor owns the
//! sidecar connection and answers each command on a oneshot channel.
//!
//! ```text
//!   DelegateHandle (Clone)      mpsc      DelegateActor (spawned task)
//!   ┌─────────────────────┐  ────────▶  ┌──────────────────────────────┐
//!   │ .stat()             │             │ Arc<dyn SidecarFileSystem>   │
//!   │ .read_file()        │  ◀────────  │ one child task per command   │
//!   │ .write_file()       │   oneshot   │                              │
//!   └─────────────────────┘             └──────────────────────────────┘
//! ```
//!
//! Commands are dispatched concurrently, so a slow read never blocks a
//! quick stat queued behind it. No ordering is guaranteed between calls.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use sidecar_types::{
    FsError, FsResult, RemoteDeleteOptions, RemoteDirEntry, RemoteOverwriteOptions, RemoteStat,
    RemoteWriteOptions, SidecarFileSystem,
};

use crate::constants::ACTOR_GONE;

// ============================================================================
// Commands (internal)
// ============================================================================

/// Internal command sent from DelegateHandle → DelegateActor via mpsc.
enum DelegateCommand {
    Stat {
        path: String,
        reply: oneshot::Sender<FsResult<RemoteStat>>,
    },
    Mkdir {
        path: String,
        reply: oneshot::Sender<FsResult<()>>,
    },
    Readdir {
        path: String,
        reply: oneshot::Sender<FsResult<Vec<RemoteDirEntry>>>,
    },
    Delete {
        path: String,
        opts: RemoteDeleteOptions,
        reply: oneshot::Sender<FsResult<()>>,
    },
    Rename {
        from: String,
        to: String,
        opts: RemoteOverwriteOptions,
        reply: oneshot::Sender<FsResult<()>>,
    },
    ReadFile {
        path: String,
        reply: oneshot::Sender<FsResult<Vec<u8>>>,
    },
    WriteFile {
        path: String,
        content: Vec<u8>,
        opts: RemoteWriteOptions,
        reply: oneshot::Sender<FsResult<()>>,
    },
    Shutdown,
}

impl DelegateCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Stat { .. } => "stat",
            Self::Mkdir { .. } => "mkdir",
            Self::Readdir { .. } => "readdir",
            Self::Delete { .. } => "delete",
            Self::Rename { .. } => "rename",
            Self::ReadFile { .. } => "readFile",
            Self::WriteFile { .. } => "writeFile",
            Self::Shutdown => "shutdown",
        }
    }
}

// ============================================================================
// DelegateHandle (Send + Sync public API)
// ============================================================================

/// Send+Sync handle to the delegate actor.
///
/// Each method sends a command via mpsc and awaits the oneshot reply. Once
/// the actor is gone every call fails with [`FsError::Unavailable`].
#[derive(Clone)]
pub struct DelegateHandle {
    tx: mpsc::UnboundedSender<DelegateCommand>,
}

impl std::fmt::Debug for DelegateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Send a command and await its reply.
///
/// Expands in place so each call site keeps its own reply type.
macro_rules! request {
    ($self:ident, $variant:ident { $($field:ident : $value:expr),* $(,)? }) => {{
        let (reply, rx) = oneshot::channel();
        $self
            .tx
            .send(DelegateCommand::$variant { $($field: $value,)* reply })
            .map_err(|_| FsError::unavailable(ACTOR_GONE))?;
        rx.await.map_err(|_| FsError::unavailable(ACTOR_GONE))?
    }};
}

impl DelegateHandle {
    /// Returns true once the actor has stopped accepting commands.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Ask the actor to stop. Calls already in flight still complete.
    pub fn shutdown(&self) {
        if self.tx.send(DelegateCommand::Shutdown).is_err() {
            log::debug!("Delegate actor already stopped");
        }
    }
}

#[async_trait]
impl SidecarFileSystem for DelegateHandle {
    async fn stat(&self, path: &str) -> FsResult<RemoteStat> {
        request!(self, Stat { path: path.to_string() })
    }

    async fn mkdir(&self, path: &str) -> FsResult<()> {
        request!(self, Mkdir { path: path.to_string() })
    }

    async fn readdir(&self, path: &str) -> FsResult<Vec<RemoteDirEntry>> {
        request!(self, Readdir { path: path.to_string() })
    }

    async fn delete(&self, path: &str, opts: RemoteDeleteOptions) -> FsResult<()> {
        request!(self, Delete { path: path.to_string(), opts: opts })
    }

    async fn rename(&self, from: &str, to: &str, opts: RemoteOverwriteOptions) -> FsResult<()> {
        request!(self, Rename {
            from: from.to_string(),
            to: to.to_string(),
            opts: opts,
        })
    }

    async fn read_file(&self, path: &str) -> FsResult<Vec<u8>> {
        request!(self, ReadFile { path: path.to_string() })
    }

    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        opts: RemoteWriteOptions,
    ) -> FsResult<()> {
        request!(self, WriteFile {
            path: path.to_string(),
            content: content.to_vec(),
            opts: opts,
        })
    }
}

// ============================================================================
// DelegateActor (internal)
// ============================================================================

struct DelegateActor {
    sidecar: Arc<dyn SidecarFileSystem>,
}

impl DelegateActor {
    /// Process commands until the channel closes or shutdown is requested.
    async fn run(self, mut rx: mpsc::UnboundedReceiver<DelegateCommand>) {
        while let Some(cmd) = rx.recv().await {
            if matches!(cmd, DelegateCommand::Shutdown) {
                log::debug!("Delegate actor shutting down: requested");
                rx.close();
                break;
            }
            log::trace!("Delegate dispatching {}", cmd.name());
            let sidecar = Arc::clone(&self.sidecar);
            tokio::spawn(dispatch(sidecar, cmd));
        }
        log::debug!("Delegate actor stopped");
    }
}

/// Run one command against the sidecar and send back the result.
///
/// A dropped receiver only means the caller stopped waiting.
async fn dispatch(sidecar: Arc<dyn SidecarFileSystem>, cmd: DelegateCommand) {
    match cmd {
        DelegateCommand::Stat { path, reply } => {
            let _ = reply.send(sidecar.stat(&path).await);
        }
        DelegateCommand::Mkdir { path, reply } => {
            let _ = reply.send(sidecar.mkdir(&path).await);
        }
        DelegateCommand::Readdir { path, reply } => {
            let _ = reply.send(sidecar.readdir(&path).await);
        }
        DelegateCommand::Delete { path, opts, reply } => {
            let _ = reply.send(sidecar.delete(&path, opts).await);
        }
        DelegateCommand::Rename {
            from,
            to,
            opts,
            reply,
        } => {
            let _ = reply.send(sidecar.rename(&from, &to, opts).await);
        }
        DelegateCommand::ReadFile { path, reply } => {
            let _ = reply.send(sidecar.read_file(&path).await);
        }
        DelegateCommand::WriteFile {
            path,
            content,
            opts,
            reply,
        } => {
            let _ = reply.send(sidecar.write_file(&path, &content, opts).await);
        }
        DelegateCommand::Shutdown => {}
    }
}

// ============================================================================
// Public spawn function
// ============================================================================

/// Spawn a delegate actor on the current tokio runtime.
///
/// Returns a cloneable [`DelegateHandle`]; every provider shares it. The
/// actor lives until [`DelegateHandle::shutdown`] is called or every handle
/// is dropped.
pub fn spawn_delegate(sidecar: Arc<dyn SidecarFileSystem>) -> DelegateHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let actor = DelegateActor { sidecar };
    tokio::spawn(actor.run(rx));
    DelegateHandle { tx }
}
