//! Bridge configuration.
//!
//! Loaded from RON:
//!
//! ```ron
//! (
//!     change_channel_capacity: 64,
//!     redirects: [
//!         (from: ["file"], to: "sidecar"),
//!     ],
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_PATH_ENV, DEFAULT_CHANGE_CHANNEL_CAPACITY};
use crate::content_aware::SchemeRedirect;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid scheme in redirect: {0:?}")]
    InvalidScheme(String),
    #[error("scheme {0:?} is both a redirect source and a target")]
    RedirectCycle(String),
    #[error("scheme {0:?} is redirected to more than one target")]
    ConflictingRedirect(String),
}

/// Send every address whose scheme is in `from` to the scheme `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRule {
    pub from: Vec<String>,
    pub to: String,
}

/// Bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Buffered change batches per provider.
    pub change_channel_capacity: usize,
    /// Address rewrites applied by the content-aware layer.
    pub redirects: Vec<RedirectRule>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            change_channel_capacity: DEFAULT_CHANGE_CHANNEL_CAPACITY,
            redirects: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Parse a RON document. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Read and parse a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron_str(&text)?;
        tracing::info!(path = %path.as_ref().display(), "loaded bridge config");
        Ok(config)
    }

    /// Load the file named by `SIDECAR_BRIDGE_CONFIG`, or the defaults when
    /// it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Build the address rewrite described by `redirects`.
    pub fn scheme_redirect(&self) -> Result<SchemeRedirect, ConfigError> {
        SchemeRedirect::from_rules(&self.redirects)
    }
}
