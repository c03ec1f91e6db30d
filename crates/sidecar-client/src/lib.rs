//! Sidecar delegate client.
//!
//! Main talks to the sidecar through a single [`DelegateHandle`]. The handle
//! implements [`sidecar_types::SidecarFileSystem`] itself, so providers hold
//! it as an ordinary trait object and never see the channel underneath.

pub mod actor;
pub mod constants;

pub use actor::{DelegateHandle, spawn_delegate};
