//! Address helpers.

use sidecar_types::{FsError, FsResult};
use url::Url;

/// Path handed to the sidecar for an address.
///
/// Only the path component crosses the boundary; scheme, authority, query
/// and fragment are dropped and percent-escapes are decoded.
pub fn remote_path(uri: &Url) -> FsResult<String> {
    urlencoding::decode(uri.path())
        .map(|path| path.into_owned())
        .map_err(|e| FsError::invalid_uri(format!("{uri}: {e}")))
}

/// Parse an address.
pub fn parse(uri: &str) -> FsResult<Url> {
    Url::parse(uri).map_err(|e| FsError::invalid_uri(format!("{uri}: {e}")))
}

/// Address of `name` inside the directory `dir`.
pub fn join(dir: &Url, name: &str) -> Url {
    let path = format!("{}/{name}", dir.path().trim_end_matches('/'));
    let mut child = dir.clone();
    child.set_path(&path);
    child
}
