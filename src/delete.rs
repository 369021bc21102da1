//! The delete command.
//!
//! Resolves the container chain once, classifies the leaf, and removes every
//! entry matched by the supplied patterns. The two leaf families get
//! different mutation rules:
//!
//! - Flat archives batch all record deletions in a transaction. Any fault
//!   cancels the batch, so the catalog either loses every matched record or
//!   none of them.
//! - Filesystems delete entry by entry, consuming the match set in reverse
//!   so children go before their parent directories. A per-entry fault
//!   stops the loop but already-applied deletions are still persisted.

use scopeguard::ScopeGuard;
use tracing::debug;

use crate::common::CmdOptions;
use crate::container::{paired_header_name, ArchiveContainer, FileEntry, FileSystemContainer, Leaf};
use crate::error::NestArcError;
use crate::matcher::{compile_patterns, match_entries_strict};
use crate::progress::{CallbackFacts, ProgressSink};
use crate::resolve::{resolve, scope_to_subtree};

/// Deletes all entries matching `patterns` from the container named by
/// `spec`. Every pattern must match at least one entry or nothing is
/// mutated.
pub fn delete_entries(
    spec: &str,
    patterns: &[String],
    opts: CmdOptions,
    progress: &ProgressSink<'_>,
) -> Result<(), NestArcError> {
    if patterns.is_empty() {
        return Err(NestArcError::Unsupported(
            "delete requires at least one pattern".to_string(),
        ));
    }
    let compiled = compile_patterns(patterns)?;

    let mut chain = resolve(spec, true, true)?;
    match &mut chain.leaf {
        Leaf::FlatArchive(archive) => {
            if !archive.writable() {
                return Err(NestArcError::Unsupported(format!(
                    "{} archive is not writable",
                    archive.format_name()
                )));
            }
            if !archive.holds_multiple() {
                return Err(NestArcError::Unsupported(format!(
                    "cannot delete records from a single-file {} archive",
                    archive.format_name()
                )));
            }
            let matched = match_entries_strict(&compiled, &archive.entries(), opts.recurse)?;
            debug!(count = matched.len(), "deleting archive records");
            delete_from_archive(archive.as_mut(), &matched, opts, progress)
        }
        Leaf::Filesystem(fs) => {
            if !fs.writable() {
                return Err(NestArcError::Unsupported(format!(
                    "{} is not writable",
                    fs.format_name()
                )));
            }
            let entries = scope_to_subtree(fs.entries(), chain.subtree.as_ref());
            let matched = match_entries_strict(&compiled, &entries, opts.recurse)?;
            debug!(count = matched.len(), "deleting filesystem entries");
            delete_from_filesystem(fs.as_mut(), &matched, progress)
        }
        Leaf::DiskImage(leaf) => Err(NestArcError::Unsupported(format!(
            "cannot delete from disk image '{}': no filesystem adapter",
            leaf.name
        ))),
        Leaf::Partition(leaf) => Err(NestArcError::Unsupported(format!(
            "cannot delete from partition '{}': no filesystem adapter",
            leaf.name
        ))),
    }
}

/// Transactional batch deletion from a flat archive.
fn delete_from_archive(
    archive: &mut dyn ArchiveContainer,
    matched: &[FileEntry],
    opts: CmdOptions,
    progress: &ProgressSink<'_>,
) -> Result<(), NestArcError> {
    let pairing = archive.supports_mac_pairing() && opts.mac_zip;
    archive.start_transaction()?;
    // Cancels the transaction on any early exit; disarmed on success.
    let mut archive = scopeguard::guard(archive, |a| a.cancel_transaction());

    let total = matched.len();
    for (done, entry) in matched.iter().enumerate() {
        if pairing && entry.is_paired_header {
            // Deleted alongside its data-bearing sibling, never standalone.
            continue;
        }
        let percent = (100 * (done + 1) / total) as u32;
        progress(&CallbackFacts::progress(
            &entry.full_path,
            entry.separator,
            percent,
        ));
        archive.delete_record(entry)?;
        if pairing {
            if let Some(header) = archive.find_entry(&paired_header_name(&entry.full_path)) {
                if header.is_paired_header {
                    archive.delete_record(&header)?;
                }
            }
        }
    }

    let archive = ScopeGuard::into_inner(archive);
    archive.commit_transaction()?;
    archive.save_updates()
}

/// Reverse-order deletion from a hierarchical filesystem.
///
/// The match set arrives in pre-order, so walking it backwards guarantees
/// every descendant is deleted before its ancestor directory.
fn delete_from_filesystem(
    fs: &mut dyn FileSystemContainer,
    matched: &[FileEntry],
    progress: &ProgressSink<'_>,
) -> Result<(), NestArcError> {
    let total = matched.len();
    let mut loop_fault: Option<NestArcError> = None;

    for (idx, entry) in matched.iter().enumerate().rev() {
        let percent = (100 * (total - idx) / total) as u32;
        progress(&CallbackFacts::progress(
            &entry.full_path,
            entry.separator,
            percent,
        ));
        if let Err(e) = fs.delete_file(entry) {
            loop_fault = Some(e);
            break;
        }
    }

    // Persist whatever succeeded, even after a per-entry fault.
    let save_result = fs
        .save_updates()
        .map_err(|e| NestArcError::Persist(Box::new(e)));

    match (loop_fault, save_result) {
        (None, Ok(())) => Ok(()),
        (None, Err(persist)) => Err(persist),
        (Some(fault), Ok(())) => Err(fault),
        (Some(fault), Err(persist)) => {
            eprintln!("nestarc: {persist}");
            Err(fault)
        }
    }
}
