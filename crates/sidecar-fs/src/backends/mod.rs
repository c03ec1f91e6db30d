//! Sidecar-side filesystems.
//!
//! Implementations of [`SidecarFileSystem`](sidecar_types::SidecarFileSystem)
//! that run inside the sidecar and answer the delegate's calls.

mod local;
mod memory;

pub use local::LocalSidecar;
pub use memory::MemorySidecar;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the UNIX epoch.
pub(crate) fn now_millis() -> u64 {
    to_millis(SystemTime::now())
}

pub(crate) fn to_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
