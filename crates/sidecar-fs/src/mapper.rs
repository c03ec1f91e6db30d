//! Translation between sidecar types and host types.
//!
//! Pure field projections. Options are copied field for field with no
//! defaults filled in; kinds map one-to-one in both directions.

use sidecar_types::{
    RemoteDeleteOptions, RemoteDirEntry, RemoteFileType, RemoteOpenOptions,
    RemoteOverwriteOptions, RemoteStat, RemoteWriteOptions,
};

use crate::types::{
    DeleteOptions, DirEntry, FileType, OpenOptions, OverwriteOptions, Stat, WriteOptions,
};

/// Map a sidecar file kind to the host kind.
pub fn to_local_kind(kind: RemoteFileType) -> FileType {
    match kind {
        RemoteFileType::Directory => FileType::Directory,
        RemoteFileType::File => FileType::File,
        RemoteFileType::SymbolicLink => FileType::SymbolicLink,
        RemoteFileType::Unknown => FileType::Unknown,
    }
}

/// Map a host file kind back to the sidecar kind.
pub fn to_remote_kind(kind: FileType) -> RemoteFileType {
    match kind {
        FileType::Directory => RemoteFileType::Directory,
        FileType::File => RemoteFileType::File,
        FileType::SymbolicLink => RemoteFileType::SymbolicLink,
        FileType::Unknown => RemoteFileType::Unknown,
    }
}

/// Map sidecar metadata to host metadata.
pub fn to_local_stat(stat: RemoteStat) -> Stat {
    Stat {
        kind: to_local_kind(stat.kind),
        ctime: stat.ctime,
        mtime: stat.mtime,
        size: stat.size,
    }
}

/// Map a directory listing element-wise, keeping the sidecar's order.
pub fn to_local_entries(entries: Vec<RemoteDirEntry>) -> Vec<DirEntry> {
    entries
        .into_iter()
        .map(|(name, kind)| (name, to_local_kind(kind)))
        .collect()
}

impl From<DeleteOptions> for RemoteDeleteOptions {
    fn from(opts: DeleteOptions) -> Self {
        Self {
            recursive: opts.recursive,
            use_trash: opts.use_trash,
        }
    }
}

impl From<RemoteDeleteOptions> for DeleteOptions {
    fn from(opts: RemoteDeleteOptions) -> Self {
        Self {
            recursive: opts.recursive,
            use_trash: opts.use_trash,
        }
    }
}

impl From<OverwriteOptions> for RemoteOverwriteOptions {
    fn from(opts: OverwriteOptions) -> Self {
        Self {
            overwrite: opts.overwrite,
        }
    }
}

impl From<RemoteOverwriteOptions> for OverwriteOptions {
    fn from(opts: RemoteOverwriteOptions) -> Self {
        Self {
            overwrite: opts.overwrite,
        }
    }
}

impl From<WriteOptions> for RemoteWriteOptions {
    fn from(opts: WriteOptions) -> Self {
        Self {
            overwrite: opts.overwrite,
            create: opts.create,
        }
    }
}

impl From<RemoteWriteOptions> for WriteOptions {
    fn from(opts: RemoteWriteOptions) -> Self {
        Self {
            overwrite: opts.overwrite,
            create: opts.create,
        }
    }
}

impl From<OpenOptions> for RemoteOpenOptions {
    fn from(opts: OpenOptions) -> Self {
        Self {
            create: opts.create,
        }
    }
}

impl From<RemoteOpenOptions> for OpenOptions {
    fn from(opts: RemoteOpenOptions) -> Self {
        Self {
            create: opts.create,
        }
    }
}
