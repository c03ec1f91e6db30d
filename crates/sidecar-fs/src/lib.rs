//! Remote filesystem bridge, host side.
//!
//! Lets a sandboxed sidecar serve filesystem schemes to the editor host.
//! Key components:
//!
//! - [`mapper`] - Translation between remote wire types and host types
//! - [`RemoteFileSystemProvider`] - A host provider whose every verb is a
//!   round trip to the sidecar delegate
//! - [`FileService`] - Routes operations to providers by scheme
//! - [`SidecarFileSystemRegistry`] - Attaches and detaches sidecar schemes
//! - [`ContentAwareFileSystem`] - Rewrites addresses before dispatch
//! - [`MemorySidecar`] / [`LocalSidecar`] - Sidecar-side filesystems
//!
//! ## Design Decisions
//!
//! - **Paths, not addresses, cross the boundary**: only the decoded path
//!   component of an address reaches the sidecar.
//! - **Whole-file I/O**: providers advertise read/write of whole buffers and
//!   nothing else. Copy falls back to read + write in the [`FileService`].
//! - **No watching**: `watch` fails, and the change stream never fires.

pub mod backends;
pub mod config;
pub mod constants;
pub mod content_aware;
mod ext;
pub mod mapper;
mod provider;
mod registry;
mod remote;
mod service;
mod types;
pub mod uri;

pub use backends::{LocalSidecar, MemorySidecar};
pub use config::{BridgeConfig, ConfigError, RedirectRule};
pub use content_aware::{ContentAwareFileSystem, IdentityRewrite, SchemeRedirect, UriRewrite};
pub use ext::FileSystemExt;
pub use provider::FileSystemProvider;
pub use registry::SidecarFileSystemRegistry;
pub use remote::RemoteFileSystemProvider;
pub use service::{FileService, Registration};
pub use types::{
    Capabilities, DeleteOptions, DirEntry, ExtDeleteOptions, ExtOverwriteOptions, FileChange,
    FileChangeType, FileHandle, FileType, OpenOptions, OverwriteOptions, Stat, WatchHandle,
    WatchOptions, WriteOptions,
};

pub use sidecar_types::{FsError, FsResult};
