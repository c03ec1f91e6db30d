//! Shared types for the sidecar filesystem bridge.
//!
//! Everything that crosses the process boundary between the editor host
//! ("main") and the sandboxed sidecar lives here:
//!
//! - [`RemoteFileType`], [`RemoteStat`] and the remote option records
//! - [`FsError`] - the single error type used on both sides of the boundary,
//!   so remote failures reach callers without being wrapped
//! - [`SidecarFileSystem`] - the delegate interface main consumes
//! - [`SidecarFileSystemMain`] - the registration interface main exposes
//!
//! Paths on this boundary are always plain strings (the path component of an
//! address), never structured addresses.

mod error;
mod ops;
mod types;

pub use error::{FsError, FsResult};
pub use ops::{SidecarFileSystem, SidecarFileSystemMain};
pub use types::{
    RemoteDeleteOptions, RemoteDirEntry, RemoteFileType, RemoteOpenOptions,
    RemoteOverwriteOptions, RemoteStat, RemoteWriteOptions, UnknownFileType,
};
