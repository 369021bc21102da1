//! Flat-archive container adapters.
//!
//! `ZipContainer` fronts the `zip` crate with the transactional deletion
//! protocol: records marked inside a transaction vanish from the visible
//! catalog only once committed, and `save_updates` rewrites the archive by
//! raw-copying every surviving record into a temp file that then replaces
//! the original. `GzipContainer` is the degenerate single-record archive;
//! it exists mostly so the delete command has a real single-file-only kind
//! to refuse.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::NamedTempFile;
use tracing::debug;
use zip::{ZipArchive, ZipWriter};

use crate::container::{is_paired_header_name, ArchiveContainer, FileEntry};
use crate::error::NestArcError;

pub struct ZipContainer {
    path: PathBuf,
    zip: ZipArchive<File>,
    catalog: Vec<FileEntry>,
    writable: bool,
    tx_open: bool,
    /// Records marked for deletion in the open transaction.
    pending: HashSet<String>,
    /// Records committed for deletion, awaiting `save_updates`.
    committed: HashSet<String>,
}

impl ZipContainer {
    /// Opens a zip archive. `writable` is false when the archive sits
    /// nested inside another container and cannot be written back.
    pub fn open(path: &Path, writable: bool) -> Result<Self, NestArcError> {
        let file = File::open(path).map_err(|e| NestArcError::io(e, path))?;
        let mut zip = ZipArchive::new(file)?;
        let catalog = read_catalog(&mut zip)?;
        Ok(Self {
            path: path.to_path_buf(),
            zip,
            catalog,
            writable,
            tx_open: false,
            pending: HashSet::new(),
            committed: HashSet::new(),
        })
    }

    fn is_deleted(&self, full_path: &str) -> bool {
        self.pending.contains(full_path) || self.committed.contains(full_path)
    }
}

fn read_catalog(zip: &mut ZipArchive<File>) -> Result<Vec<FileEntry>, NestArcError> {
    let mut catalog = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let record = zip.by_index_raw(i)?;
        let name = record.name().trim_end_matches('/').to_string();
        let is_dir = record.is_dir();
        catalog.push(FileEntry {
            is_paired_header: is_paired_header_name(&name),
            has_data_fork: !is_dir,
            is_dir,
            separator: '/',
            full_path: name,
        });
    }
    Ok(catalog)
}

impl ArchiveContainer for ZipContainer {
    fn format_name(&self) -> &'static str {
        "zip"
    }

    fn entries(&self) -> Vec<FileEntry> {
        self.catalog
            .iter()
            .filter(|e| !self.is_deleted(&e.full_path))
            .cloned()
            .collect()
    }

    fn holds_multiple(&self) -> bool {
        true
    }

    fn writable(&self) -> bool {
        self.writable
    }

    fn supports_mac_pairing(&self) -> bool {
        true
    }

    fn find_entry(&self, full_path: &str) -> Option<FileEntry> {
        self.catalog
            .iter()
            .find(|e| e.full_path.eq_ignore_ascii_case(full_path) && !self.is_deleted(&e.full_path))
            .cloned()
    }

    fn start_transaction(&mut self) -> Result<(), NestArcError> {
        // At most one transaction per handle; a second open is a caller bug.
        assert!(!self.tx_open, "transaction already open on zip handle");
        self.pending.clear();
        self.tx_open = true;
        Ok(())
    }

    fn delete_record(&mut self, entry: &FileEntry) -> Result<(), NestArcError> {
        assert!(self.tx_open, "delete_record outside a transaction");
        let found = self
            .catalog
            .iter()
            .any(|e| e.full_path == entry.full_path && !self.is_deleted(&e.full_path));
        if !found {
            return Err(NestArcError::RecordNotFound(entry.full_path.clone()));
        }
        self.pending.insert(entry.full_path.clone());
        Ok(())
    }

    fn cancel_transaction(&mut self) {
        // Idempotent: cancelling with no open transaction is a no-op.
        self.pending.clear();
        self.tx_open = false;
    }

    fn commit_transaction(&mut self) -> Result<(), NestArcError> {
        assert!(self.tx_open, "commit without an open transaction");
        self.committed.extend(self.pending.drain());
        self.tx_open = false;
        Ok(())
    }

    fn save_updates(&mut self) -> Result<(), NestArcError> {
        if self.committed.is_empty() {
            return Ok(());
        }
        debug!(
            archive = %self.path.display(),
            removed = self.committed.len(),
            "rewriting zip archive"
        );

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let staged = NamedTempFile::new_in(dir).map_err(|e| NestArcError::io(e, dir))?;
        let out = staged
            .as_file()
            .try_clone()
            .map_err(|e| NestArcError::io(e, staged.path()))?;

        let mut writer = ZipWriter::new(out);
        for i in 0..self.zip.len() {
            let record = self.zip.by_index_raw(i)?;
            let name = record.name().trim_end_matches('/');
            if !self.committed.contains(name) {
                writer.raw_copy_file(record)?;
            }
        }
        writer.finish()?;

        staged
            .persist(&self.path)
            .map_err(|e| NestArcError::Persist(Box::new(NestArcError::io(e.error, &self.path))))?;

        // Reopen so the visible catalog reflects the rewritten file.
        let file = File::open(&self.path).map_err(|e| NestArcError::io(e, &self.path))?;
        self.zip = ZipArchive::new(file)?;
        self.catalog = read_catalog(&mut self.zip)?;
        self.committed.clear();
        Ok(())
    }

    fn open_data_fork(&mut self, entry: &FileEntry) -> Result<Box<dyn Read>, NestArcError> {
        let mut record = self.zip.by_name(&entry.full_path)?;
        let mut data = Vec::with_capacity(record.size() as usize);
        record
            .read_to_end(&mut data)
            .map_err(|e| NestArcError::on_entry(&entry.full_path, e.into()))?;
        Ok(Box::new(Cursor::new(data)))
    }
}

/// A gzip file viewed as a one-record, read-only flat archive. The record
/// is named after the file with its `.gz` suffix stripped.
pub struct GzipContainer {
    path: PathBuf,
    payload_name: String,
}

impl GzipContainer {
    pub fn open(path: &Path) -> Result<Self, NestArcError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| NestArcError::Resolve {
                spec: path.display().to_string(),
                reason: "gzip file has no usable name".to_string(),
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            payload_name: strip_gz_suffix(file_name).to_string(),
        })
    }
}

/// Strips a trailing `.gz` (any case); the remainder names the payload.
pub fn strip_gz_suffix(name: &str) -> &str {
    if name.len() > 3 && name[name.len() - 3..].eq_ignore_ascii_case(".gz") {
        &name[..name.len() - 3]
    } else {
        name
    }
}

impl ArchiveContainer for GzipContainer {
    fn format_name(&self) -> &'static str {
        "gzip"
    }

    fn entries(&self) -> Vec<FileEntry> {
        vec![FileEntry::file(&self.payload_name, '/')]
    }

    fn holds_multiple(&self) -> bool {
        false
    }

    fn writable(&self) -> bool {
        false
    }

    fn find_entry(&self, full_path: &str) -> Option<FileEntry> {
        if self.payload_name.eq_ignore_ascii_case(full_path) {
            Some(FileEntry::file(&self.payload_name, '/'))
        } else {
            None
        }
    }

    fn start_transaction(&mut self) -> Result<(), NestArcError> {
        Err(NestArcError::Unsupported(
            "gzip archives are read-only".to_string(),
        ))
    }

    fn delete_record(&mut self, _entry: &FileEntry) -> Result<(), NestArcError> {
        Err(NestArcError::Unsupported(
            "gzip archives are read-only".to_string(),
        ))
    }

    fn cancel_transaction(&mut self) {}

    fn commit_transaction(&mut self) -> Result<(), NestArcError> {
        Err(NestArcError::Unsupported(
            "gzip archives are read-only".to_string(),
        ))
    }

    fn save_updates(&mut self) -> Result<(), NestArcError> {
        Ok(())
    }

    fn open_data_fork(&mut self, entry: &FileEntry) -> Result<Box<dyn Read>, NestArcError> {
        let file = File::open(&self.path)
            .map_err(|e| NestArcError::on_entry(&entry.full_path, NestArcError::io(e, &self.path)))?;
        Ok(Box::new(GzDecoder::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gz_suffix_stripping() {
        assert_eq!(strip_gz_suffix("notes.txt.gz"), "notes.txt");
        assert_eq!(strip_gz_suffix("NOTES.TXT.GZ"), "NOTES.TXT");
        assert_eq!(strip_gz_suffix("plain.txt"), "plain.txt");
        assert_eq!(strip_gz_suffix(".gz"), ".gz");
    }
}
