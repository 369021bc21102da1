//! Container model: catalog entries, the polymorphic leaf, and the
//! mutation/read protocols each leaf kind must provide.
//!
//! A resolved extended archive path ends in exactly one leaf container. The
//! leaf is a closed variant: commands match on it exhaustively, so a new
//! container kind cannot be added without updating every dispatch site.

use std::io::Read;

use crate::decode::TextEncoding;
use crate::error::NestArcError;

/// Tag identifying what a container is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    FlatArchive,
    DiskImage,
    Partition,
    Filesystem,
}

impl ContainerKind {
    pub fn label(self) -> &'static str {
        match self {
            ContainerKind::FlatArchive => "flat archive",
            ContainerKind::DiskImage => "disk image",
            ContainerKind::Partition => "partition",
            ContainerKind::Filesystem => "filesystem",
        }
    }
}

/// One catalogued item in a container.
///
/// Entries are snapshots of the owning container's catalog, valid for the
/// duration of a single command invocation. A full path is unique within
/// its container at any instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Full path within the container, using `separator` between segments.
    pub full_path: String,
    /// The owning container's directory separator.
    pub separator: char,
    /// True for directory entries.
    pub is_dir: bool,
    /// True when the entry has a data fork to read.
    pub has_data_fork: bool,
    /// True for synthetic MacZip paired-metadata header entries.
    pub is_paired_header: bool,
}

impl FileEntry {
    /// Plain file entry with a data fork.
    pub fn file(full_path: &str, separator: char) -> Self {
        Self {
            full_path: full_path.to_string(),
            separator,
            is_dir: false,
            has_data_fork: true,
            is_paired_header: false,
        }
    }

    /// Directory entry (no data fork).
    pub fn directory(full_path: &str, separator: char) -> Self {
        Self {
            full_path: full_path.to_string(),
            separator,
            is_dir: true,
            has_data_fork: false,
            is_paired_header: false,
        }
    }
}

/// Mutation and read protocol for a flat (non-hierarchical) archive.
///
/// Record deletions are batched in a transaction: at most one transaction
/// may be open per handle, cancelling restores the pre-transaction catalog,
/// and cancelling with none open is a defined no-op. `save_updates`
/// persists committed mutations and is invoked separately by the caller.
pub trait ArchiveContainer {
    /// Short format name for diagnostics ("zip", "gzip").
    fn format_name(&self) -> &'static str;

    /// Catalog snapshot in archive order, excluding pending deletions.
    fn entries(&self) -> Vec<FileEntry>;

    /// False for single-file-only archive kinds (gzip).
    fn holds_multiple(&self) -> bool;

    /// True when records can be deleted and the archive rewritten.
    fn writable(&self) -> bool;

    /// True when the format carries MacZip paired metadata headers.
    fn supports_mac_pairing(&self) -> bool {
        false
    }

    /// Case-insensitive catalog lookup, ignoring pending deletions.
    fn find_entry(&self, full_path: &str) -> Option<FileEntry>;

    fn start_transaction(&mut self) -> Result<(), NestArcError>;
    fn delete_record(&mut self, entry: &FileEntry) -> Result<(), NestArcError>;
    /// Discards any open transaction; no-op when none is open.
    fn cancel_transaction(&mut self);
    fn commit_transaction(&mut self) -> Result<(), NestArcError>;
    /// Persists committed mutations to backing storage.
    fn save_updates(&mut self) -> Result<(), NestArcError>;

    /// Opens a read-only stream over an entry's data fork.
    fn open_data_fork(&mut self, entry: &FileEntry) -> Result<Box<dyn Read>, NestArcError>;

    /// Encoding variant for rendering this archive's text entries.
    fn text_encoding(&self) -> TextEncoding {
        TextEncoding::SevenBit
    }
}

/// Mutation and read protocol for a hierarchical filesystem container.
///
/// Unlike flat archives there is no transaction: per-entry deletions take
/// effect individually, and `save_updates` flushes whatever succeeded.
pub trait FileSystemContainer {
    fn format_name(&self) -> &'static str;

    /// Catalog in pre-order: every directory precedes its children.
    fn entries(&self) -> Vec<FileEntry>;

    fn writable(&self) -> bool;

    fn delete_file(&mut self, entry: &FileEntry) -> Result<(), NestArcError>;

    /// Flushes pending catalog updates; called once after the deletion
    /// loop regardless of per-entry outcome.
    fn save_updates(&mut self) -> Result<(), NestArcError>;

    fn open_data_fork(&mut self, entry: &FileEntry) -> Result<Box<dyn Read>, NestArcError>;

    /// Encoding variant for rendering this filesystem's text files.
    fn text_encoding(&self) -> TextEncoding {
        TextEncoding::SevenBit
    }
}

/// Name-only description of a leaf with no adapter in this crate.
#[derive(Debug, Clone)]
pub struct UnsupportedLeaf {
    pub name: String,
}

/// The resolved end of a container chain.
///
/// Commands classify the leaf with an exhaustive match; the disk-image and
/// partition arms exist so that dispatch stays total, and currently report
/// an unsupported-operation validation fault.
pub enum Leaf {
    FlatArchive(Box<dyn ArchiveContainer>),
    DiskImage(UnsupportedLeaf),
    Partition(UnsupportedLeaf),
    Filesystem(Box<dyn FileSystemContainer>),
}

impl Leaf {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Leaf::FlatArchive(_) => ContainerKind::FlatArchive,
            Leaf::DiskImage(_) => ContainerKind::DiskImage,
            Leaf::Partition(_) => ContainerKind::Partition,
            Leaf::Filesystem(_) => ContainerKind::Filesystem,
        }
    }
}

/// Derives the MacZip paired-header name for a data entry.
///
/// The convention pairs `dir/name` with `__MACOSX/dir/._name`; a top-level
/// `name` pairs with `__MACOSX/._name`.
pub fn paired_header_name(data_path: &str) -> String {
    match data_path.rsplit_once('/') {
        Some((dir, name)) => format!("__MACOSX/{dir}/._{name}"),
        None => format!("__MACOSX/._{data_path}"),
    }
}

/// Recognizes MacZip paired-header entry names.
pub fn is_paired_header_name(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("__MACOSX/") else {
        return false;
    };
    let base = rest.rsplit_once('/').map_or(rest, |(_, b)| b);
    base.starts_with("._")
}
