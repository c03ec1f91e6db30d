//! Bridge configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

/// Buffered change batches per provider before slow subscribers lag.
pub const DEFAULT_CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Environment variable naming an alternate config file.
pub const CONFIG_PATH_ENV: &str = "SIDECAR_BRIDGE_CONFIG";
