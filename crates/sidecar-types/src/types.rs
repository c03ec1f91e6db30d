//! Remote-side filesystem types.
//!
//! These mirror what the sidecar reports. Field names serialize in
//! camelCase and file kinds as their integer codes, matching the
//! sidecar's own representation.

use serde::{Deserialize, Serialize};

/// File kind as reported by the sidecar.
///
/// Serialized as an integer. Codes outside the known set are rejected when
/// decoding rather than guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(u32)]
pub enum RemoteFileType {
    /// Kind could not be determined.
    Unknown = 0,
    /// Regular file.
    File = 1,
    /// Directory.
    Directory = 2,
    /// Symbolic link.
    SymbolicLink = 64,
}

impl RemoteFileType {
    /// All known kinds.
    pub const ALL: [RemoteFileType; 4] = [
        RemoteFileType::Unknown,
        RemoteFileType::File,
        RemoteFileType::Directory,
        RemoteFileType::SymbolicLink,
    ];
}

/// A file kind code outside the known enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown remote file type code: {0}")]
pub struct UnknownFileType(pub u32);

impl TryFrom<u32> for RemoteFileType {
    type Error = UnknownFileType;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::File),
            2 => Ok(Self::Directory),
            64 => Ok(Self::SymbolicLink),
            other => Err(UnknownFileType(other)),
        }
    }
}

impl From<RemoteFileType> for u32 {
    fn from(kind: RemoteFileType) -> Self {
        kind as u32
    }
}

/// File metadata as reported by the sidecar.
///
/// Times are milliseconds since the UNIX epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStat {
    #[serde(rename = "type")]
    pub kind: RemoteFileType,
    pub ctime: u64,
    pub mtime: u64,
    pub size: u64,
}

/// One directory listing entry: entry name (not full path) and kind.
pub type RemoteDirEntry = (String, RemoteFileType);

/// Options for the sidecar's delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDeleteOptions {
    pub recursive: bool,
    pub use_trash: bool,
}

/// Options for the sidecar's rename.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOverwriteOptions {
    pub overwrite: bool,
}

/// Options for the sidecar's write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteWriteOptions {
    pub overwrite: bool,
    pub create: bool,
}

/// Options for opening a file handle on the sidecar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOpenOptions {
    pub create: bool,
}
