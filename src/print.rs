//! The print command.
//!
//! Streams the data fork of every matched entry through the text decode
//! pipeline. Read-only: resolution does not request write access, and an
//! empty container is not an error. A read fault mid-stream stops the
//! command at that entry rather than skipping to the next one.

use std::io::Write;

use tracing::debug;

use crate::common::CmdOptions;
use crate::container::Leaf;
use crate::decode::decode_stream;
use crate::error::NestArcError;
use crate::matcher::{compile_patterns, match_entries};
use crate::resolve::{resolve, scope_to_subtree};

/// Prints the text content of every entry matching `patterns` in the
/// container named by `spec`.
pub fn print_entries(
    spec: &str,
    patterns: &[String],
    opts: CmdOptions,
    out: &mut dyn Write,
) -> Result<(), NestArcError> {
    if patterns.is_empty() {
        return Err(NestArcError::Unsupported(
            "print requires at least one pattern".to_string(),
        ));
    }
    let compiled = compile_patterns(patterns)?;

    let mut chain = resolve(spec, false, true)?;
    match &mut chain.leaf {
        Leaf::FlatArchive(archive) => {
            let entries = archive.entries();
            if entries.is_empty() {
                debug!("container is empty, nothing to print");
                return Ok(());
            }
            let (matched, unmatched) = match_entries(&compiled, &entries, opts.recurse);
            if let Some(p) = unmatched.into_iter().next() {
                return Err(NestArcError::NoMatch(p));
            }
            let pairing = archive.supports_mac_pairing() && opts.mac_zip;
            let encoding = archive.text_encoding();
            for entry in &matched {
                if pairing && entry.is_paired_header {
                    continue;
                }
                if !entry.has_data_fork {
                    continue;
                }
                let reader = archive.open_data_fork(entry)?;
                decode_stream(reader, encoding, &entry.full_path, out)?;
            }
            Ok(())
        }
        Leaf::Filesystem(fs) => {
            let entries = scope_to_subtree(fs.entries(), chain.subtree.as_ref());
            if entries.is_empty() {
                debug!("filesystem is empty, nothing to print");
                return Ok(());
            }
            let (matched, unmatched) = match_entries(&compiled, &entries, opts.recurse);
            if let Some(p) = unmatched.into_iter().next() {
                return Err(NestArcError::NoMatch(p));
            }
            let encoding = fs.text_encoding();
            for entry in &matched {
                if !entry.has_data_fork {
                    continue;
                }
                let reader = fs.open_data_fork(entry)?;
                decode_stream(reader, encoding, &entry.full_path, out)?;
            }
            Ok(())
        }
        Leaf::DiskImage(leaf) => Err(NestArcError::Unsupported(format!(
            "cannot print from disk image '{}': no filesystem adapter",
            leaf.name
        ))),
        Leaf::Partition(leaf) => Err(NestArcError::Unsupported(format!(
            "cannot print from partition '{}': no filesystem adapter",
            leaf.name
        ))),
    }
}
