//! Extended-archive-path resolution.
//!
//! An extended archive path names a chain of nested containers in one
//! string: `disks/archives.zip/inner.zip` means "the zip `inner.zip` stored
//! inside the host file `disks/archives.zip`". Resolution finds the longest
//! existing host prefix, then walks the remaining segments through container
//! members, staging each nested layer in a temp file so the next layer can
//! be opened. The resulting [`ResolvedChain`] owns every resource in the
//! chain; dropping it releases the leaf first and then the staged layers
//! behind it, on every exit path.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::NamedTempFile;
use tracing::debug;
use zip::ZipArchive;

use crate::container::{FileEntry, Leaf, UnsupportedLeaf};
use crate::detect::{detect_kind, DetectedKind};
use crate::dirfs::DirFs;
use crate::error::NestArcError;
use crate::flat::{strip_gz_suffix, GzipContainer, ZipContainer};

/// A fully resolved container chain.
///
/// Field order matters: `leaf` drops before `_staged`, so the leaf
/// container closes before the temp files its ancestors live in.
pub struct ResolvedChain {
    pub leaf: Leaf,
    /// Directory entry for the requested subtree root, when the leaf is a
    /// filesystem addressed below its own root.
    pub subtree: Option<FileEntry>,
    links: Vec<String>,
    _staged: Vec<NamedTempFile>,
}

impl std::fmt::Debug for ResolvedChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedChain")
            .field("leaf", &self.leaf.kind())
            .field("subtree", &self.subtree)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

impl ResolvedChain {
    /// Chain description, root to leaf, for diagnostics.
    pub fn links(&self) -> &[String] {
        &self.links
    }
}

/// Restricts a filesystem catalog to the resolved subtree, when one was
/// requested. Entries outside the subtree are invisible to the command.
pub fn scope_to_subtree(entries: Vec<FileEntry>, subtree: Option<&FileEntry>) -> Vec<FileEntry> {
    let Some(root) = subtree else {
        return entries;
    };
    let prefix = format!("{}{}", root.full_path, root.separator);
    entries
        .into_iter()
        .filter(|e| e.full_path == root.full_path || e.full_path.starts_with(&prefix))
        .collect()
}

/// Opens the chain of containers named by `spec`.
///
/// `need_write` demands a leaf that can be mutated and written back; write
/// access does not reach through nested layers, so only a host directory or
/// a top-level zip satisfies it. `allow_multipart` permits a multi-partition
/// leaf (none of the current adapters produce one).
pub fn resolve(
    spec: &str,
    need_write: bool,
    allow_multipart: bool,
) -> Result<ResolvedChain, NestArcError> {
    let (host, remainder) = split_host_prefix(spec)?;
    debug!(host = %host.display(), segments = remainder.len(), "resolving container chain");

    if host.is_dir() {
        if !remainder.is_empty() {
            return Err(resolve_err(
                spec,
                format!("no such path under directory '{}'", host.display()),
            ));
        }
        let fs = DirFs::open(&host)?;
        return Ok(ResolvedChain {
            leaf: Leaf::Filesystem(Box::new(fs)),
            subtree: None,
            links: vec![format!("{} (host directory)", host.display())],
            _staged: Vec::new(),
        });
    }

    let display = host
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(spec)
        .to_string();
    let chain = walk_containers(spec, host, display, remainder, need_write)?;

    if matches!(chain.leaf, Leaf::Partition(_)) && !allow_multipart {
        return Err(resolve_err(spec, "multi-partition leaf not allowed here".to_string()));
    }
    Ok(chain)
}

/// Walks `remainder` segments down through nested containers starting at
/// the host file `current`.
fn walk_containers(
    spec: &str,
    mut current: PathBuf,
    mut display: String,
    remainder: Vec<String>,
    need_write: bool,
) -> Result<ResolvedChain, NestArcError> {
    let mut links: Vec<String> = Vec::new();
    let mut staged: Vec<NamedTempFile> = Vec::new();
    let mut rest = remainder.as_slice();

    loop {
        let kind = detect_kind(&display).ok_or_else(|| {
            resolve_err(spec, format!("'{display}' is not a recognized container"))
        })?;

        match kind {
            DetectedKind::Zip => {
                if rest.is_empty() {
                    let top_level = staged.is_empty();
                    if need_write && !top_level {
                        return Err(NestArcError::Unsupported(format!(
                            "cannot write to '{display}': nested containers are read-only"
                        )));
                    }
                    links.push(format!("{display} (zip)"));
                    let zc = ZipContainer::open(&current, top_level)?;
                    return Ok(ResolvedChain {
                        leaf: Leaf::FlatArchive(Box::new(zc)),
                        subtree: None,
                        links,
                        _staged: staged,
                    });
                }
                // Find the member the next segment(s) name, stage it, and
                // descend one layer.
                let (member, consumed) = find_zip_member(&current, rest)
                    .map_err(|reason| resolve_err(spec, reason))?;
                if detect_kind(&member).is_none() {
                    return Err(resolve_err(
                        spec,
                        format!("'{member}' inside '{display}' is not a container"),
                    ));
                }
                links.push(format!("{display} (zip)"));
                let temp = extract_zip_member(&current, &member)?;
                current = temp.path().to_path_buf();
                display = member.rsplit('/').next().unwrap_or(&member).to_string();
                staged.push(temp);
                rest = &rest[consumed..];
            }
            DetectedKind::GZip => {
                let payload = strip_gz_suffix(&display).to_string();
                match detect_kind(&payload) {
                    Some(DetectedKind::Zip) | Some(DetectedKind::GZip) => {
                        // Peel the wrapper and reclassify the payload.
                        links.push(format!("{display} (gzip wrapper)"));
                        let temp = gunzip_to_temp(&current)?;
                        current = temp.path().to_path_buf();
                        display = payload;
                        staged.push(temp);
                    }
                    Some(DetectedKind::DiskImage) => {
                        if !rest.is_empty() {
                            return Err(resolve_err(
                                spec,
                                format!("cannot address inside disk image '{payload}'"),
                            ));
                        }
                        links.push(format!("{display} (gzip wrapper)"));
                        return Ok(disk_image_leaf(payload, links, staged));
                    }
                    Some(DetectedKind::NuFx) => {
                        return Err(resolve_err(
                            spec,
                            format!("no adapter for NuFX archive '{payload}'"),
                        ));
                    }
                    None => {
                        if !rest.is_empty() {
                            return Err(resolve_err(
                                spec,
                                format!("gzip '{display}' holds a single file"),
                            ));
                        }
                        if need_write {
                            return Err(NestArcError::Unsupported(format!(
                                "cannot write to '{display}': gzip archives are read-only"
                            )));
                        }
                        links.push(format!("{display} (gzip)"));
                        let gz = GzipContainer::open(&current)?;
                        return Ok(ResolvedChain {
                            leaf: Leaf::FlatArchive(Box::new(gz)),
                            subtree: None,
                            links,
                            _staged: staged,
                        });
                    }
                }
            }
            DetectedKind::NuFx => {
                return Err(resolve_err(
                    spec,
                    format!("no adapter for NuFX archive '{display}'"),
                ));
            }
            DetectedKind::DiskImage => {
                if !rest.is_empty() {
                    return Err(resolve_err(
                        spec,
                        format!("cannot address inside disk image '{display}'"),
                    ));
                }
                return Ok(disk_image_leaf(display, links, staged));
            }
        }
    }
}

fn disk_image_leaf(name: String, mut links: Vec<String>, staged: Vec<NamedTempFile>) -> ResolvedChain {
    links.push(format!("{name} (disk image)"));
    ResolvedChain {
        leaf: Leaf::DiskImage(UnsupportedLeaf { name }),
        subtree: None,
        links,
        _staged: staged,
    }
}

/// Finds the longest existing host-path prefix of `spec`; the rest of the
/// segments address members inside containers.
fn split_host_prefix(spec: &str) -> Result<(PathBuf, Vec<String>), NestArcError> {
    if spec.is_empty() {
        return Err(resolve_err(spec, "empty path".to_string()));
    }
    let mut path = PathBuf::from(spec);
    let mut remainder: Vec<String> = Vec::new();
    while !path.exists() {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Err(resolve_err(spec, "no such file or directory".to_string()));
        };
        remainder.push(name.to_string());
        if !path.pop() || path.as_os_str().is_empty() {
            return Err(resolve_err(spec, "no such file or directory".to_string()));
        }
    }
    remainder.reverse();
    Ok((path, remainder))
}

/// Matches leading `segments` against the member list of the zip at `path`,
/// case-insensitively, preferring the shortest member name that consumes at
/// least one segment. Returns the member's stored name and how many
/// segments it consumed.
fn find_zip_member(path: &Path, segments: &[String]) -> Result<(String, usize), String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let mut zip = ZipArchive::new(file).map_err(|e| e.to_string())?;
    let mut names = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        match zip.by_index_raw(i) {
            Ok(rec) => names.push(rec.name().trim_end_matches('/').to_string()),
            Err(e) => return Err(e.to_string()),
        }
    }

    let mut candidate = String::new();
    for (k, seg) in segments.iter().enumerate() {
        if k > 0 {
            candidate.push('/');
        }
        candidate.push_str(seg);
        let is_last = k + 1 == segments.len();
        if let Some(name) = names.iter().find(|n| n.eq_ignore_ascii_case(&candidate)) {
            // A directory entry can shadow a longer member path; only stop
            // early on something the chain can actually open.
            if is_last || detect_kind(name).is_some() {
                return Ok((name.clone(), k + 1));
            }
        }
    }
    Err(format!("no member '{}' in archive", segments.join("/")))
}

fn extract_zip_member(path: &Path, member: &str) -> Result<NamedTempFile, NestArcError> {
    let file = File::open(path).map_err(|e| NestArcError::io(e, path))?;
    let mut zip = ZipArchive::new(file)?;
    let mut record = zip.by_name(member)?;
    let mut temp = NamedTempFile::new().map_err(NestArcError::from)?;
    io::copy(&mut record, &mut temp).map_err(|e| NestArcError::on_entry(member, e.into()))?;
    Ok(temp)
}

fn gunzip_to_temp(path: &Path) -> Result<NamedTempFile, NestArcError> {
    let file = File::open(path).map_err(|e| NestArcError::io(e, path))?;
    let mut decoder = GzDecoder::new(file);
    let mut temp = NamedTempFile::new().map_err(NestArcError::from)?;
    io::copy(&mut decoder, &mut temp)
        .map_err(|e| NestArcError::io(e, path))?;
    Ok(temp)
}

fn resolve_err(spec: &str, reason: String) -> NestArcError {
    NestArcError::Resolve {
        spec: spec.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtree_scoping_keeps_root_and_descendants() {
        let entries = vec![
            FileEntry::directory("docs", '/'),
            FileEntry::file("docs/a.txt", '/'),
            FileEntry::file("docs2/b.txt", '/'),
            FileEntry::file("top.txt", '/'),
        ];
        let root = FileEntry::directory("docs", '/');
        let scoped = scope_to_subtree(entries.clone(), Some(&root));
        let names: Vec<_> = scoped.iter().map(|e| e.full_path.as_str()).collect();
        assert_eq!(names, ["docs", "docs/a.txt"]);

        assert_eq!(scope_to_subtree(entries.clone(), None).len(), entries.len());
    }

    #[test]
    fn missing_path_is_a_resolution_fault() {
        let err = resolve("definitely/not/here.zip", false, false).unwrap_err();
        assert!(matches!(err, NestArcError::Resolve { .. }));
    }

    #[test]
    fn unrecognized_host_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.txt");
        std::fs::write(&plain, b"data").unwrap();
        let err = resolve(plain.to_str().unwrap(), false, false).unwrap_err();
        assert!(matches!(err, NestArcError::Resolve { .. }));
    }
}
