//! Client constants.

/// Reason reported when the delegate actor is no longer running.
pub const ACTOR_GONE: &str = "delegate actor shut down";
