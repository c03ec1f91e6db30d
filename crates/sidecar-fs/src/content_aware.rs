//! Content-aware address interception.
//!
//! [`ContentAwareFileSystem`] sits in front of any [`FileSystemExt`] and
//! passes every address through a [`UriRewrite`] before the call reaches the
//! wrapped implementation. Non-address arguments are forwarded untouched.

use std::collections::HashMap;

use async_trait::async_trait;
use url::Url;

use sidecar_types::FsResult;

use crate::config::{ConfigError, RedirectRule};
use crate::ext::FileSystemExt;
use crate::types::{DirEntry, ExtDeleteOptions, ExtOverwriteOptions, FileHandle, OpenOptions, Stat};
use crate::uri;

/// Maps an address to the address that should actually be used.
pub trait UriRewrite: Send + Sync {
    fn rewrite(&self, uri: &Url) -> FsResult<Url>;
}

impl<F> UriRewrite for F
where
    F: Fn(&Url) -> FsResult<Url> + Send + Sync,
{
    fn rewrite(&self, uri: &Url) -> FsResult<Url> {
        self(uri)
    }
}

/// Leaves every address as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRewrite;

impl UriRewrite for IdentityRewrite {
    fn rewrite(&self, uri: &Url) -> FsResult<Url> {
        Ok(uri.clone())
    }
}

/// Swaps source schemes for a target scheme, keeping the rest of the address.
///
/// No target is ever also a source, so applying the rewrite twice gives the
/// same result as applying it once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemeRedirect {
    targets: HashMap<String, String>,
}

fn valid_scheme(scheme: &str) -> Result<String, ConfigError> {
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        Ok(scheme.to_ascii_lowercase())
    } else {
        Err(ConfigError::InvalidScheme(scheme.to_string()))
    }
}

impl SchemeRedirect {
    /// Build from config rules.
    pub fn from_rules(rules: &[RedirectRule]) -> Result<Self, ConfigError> {
        let mut targets = HashMap::new();
        for rule in rules {
            let to = valid_scheme(&rule.to)?;
            for from in &rule.from {
                let from = valid_scheme(from)?;
                if targets.get(&from).is_some_and(|existing| *existing != to) {
                    return Err(ConfigError::ConflictingRedirect(from));
                }
                targets.insert(from, to.clone());
            }
        }

        if let Some(to) = targets.values().find(|to| targets.contains_key(*to)) {
            return Err(ConfigError::RedirectCycle(to.clone()));
        }

        Ok(Self { targets })
    }

    /// Target scheme for `scheme`, if it is redirected.
    pub fn target(&self, scheme: &str) -> Option<&str> {
        self.targets.get(scheme).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl UriRewrite for SchemeRedirect {
    fn rewrite(&self, uri: &Url) -> FsResult<Url> {
        match self.target(uri.scheme()) {
            None => Ok(uri.clone()),
            Some(to) => {
                // Url::set_scheme refuses special <-> non-special changes.
                let rest = &uri.as_str()[uri.scheme().len() + 1..];
                uri::parse(&format!("{to}:{rest}"))
            }
        }
    }
}

/// Rewrites addresses before handing calls to `inner`.
#[derive(Debug, Clone)]
pub struct ContentAwareFileSystem<F, R> {
    inner: F,
    rewrite: R,
}

impl<F, R> ContentAwareFileSystem<F, R>
where
    F: FileSystemExt,
    R: UriRewrite,
{
    pub fn new(inner: F, rewrite: R) -> Self {
        Self { inner, rewrite }
    }

    /// The wrapped implementation.
    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn into_inner(self) -> F {
        self.inner
    }

    fn map(&self, uri: &Url) -> FsResult<Url> {
        let mapped = self.rewrite.rewrite(uri)?;
        if mapped != *uri {
            tracing::trace!(from = %uri, to = %mapped, "address rewritten");
        }
        Ok(mapped)
    }
}

#[async_trait]
impl<F, R> FileSystemExt for ContentAwareFileSystem<F, R>
where
    F: FileSystemExt,
    R: UriRewrite,
{
    async fn stat(&self, uri: &Url) -> FsResult<Stat> {
        let uri = self.map(uri)?;
        self.inner.stat(&uri).await
    }

    async fn read_directory(&self, uri: &Url) -> FsResult<Vec<DirEntry>> {
        let uri = self.map(uri)?;
        self.inner.read_directory(&uri).await
    }

    async fn read_file(&self, uri: &Url) -> FsResult<Vec<u8>> {
        let uri = self.map(uri)?;
        self.inner.read_file(&uri).await
    }

    async fn write_file(&self, uri: &Url, content: &[u8]) -> FsResult<()> {
        let uri = self.map(uri)?;
        self.inner.write_file(&uri, content).await
    }

    async fn rename(&self, source: &Url, target: &Url, opts: ExtOverwriteOptions) -> FsResult<()> {
        let source = self.map(source)?;
        let target = self.map(target)?;
        self.inner.rename(&source, &target, opts).await
    }

    async fn copy(&self, source: &Url, target: &Url, opts: ExtOverwriteOptions) -> FsResult<()> {
        let source = self.map(source)?;
        let target = self.map(target)?;
        self.inner.copy(&source, &target, opts).await
    }

    async fn create_directory(&self, uri: &Url) -> FsResult<()> {
        let uri = self.map(uri)?;
        self.inner.create_directory(&uri).await
    }

    async fn delete(&self, uri: &Url, opts: ExtDeleteOptions) -> FsResult<()> {
        let uri = self.map(uri)?;
        self.inner.delete(&uri, opts).await
    }

    async fn open(&self, uri: &Url, opts: OpenOptions) -> FsResult<FileHandle> {
        let uri = self.map(uri)?;
        self.inner.open(&uri, opts).await
    }
}
