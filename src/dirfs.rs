//! Host-directory filesystem adapter.
//!
//! Presents a directory tree as a hierarchical container. The catalog is
//! produced in sorted pre-order (every directory before its contents), which
//! is what the deletion logic relies on when it consumes a match set in
//! reverse.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::container::{FileEntry, FileSystemContainer};
use crate::error::NestArcError;

pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn open(root: &Path) -> Result<Self, NestArcError> {
        if !root.is_dir() {
            return Err(NestArcError::Resolve {
                spec: root.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, entry: &FileEntry) -> PathBuf {
        let mut p = self.root.clone();
        for seg in entry.full_path.split('/') {
            p.push(seg);
        }
        p
    }
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let segs: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    if segs.is_empty() {
        None
    } else {
        Some(segs.join("/"))
    }
}

impl FileSystemContainer for DirFs {
    fn format_name(&self) -> &'static str {
        "host directory"
    }

    fn entries(&self) -> Vec<FileEntry> {
        let mut out = Vec::new();
        // Pre-order with sorted siblings keeps the catalog deterministic.
        for item in WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let Some(name) = relative_name(&self.root, item.path()) else {
                continue;
            };
            let is_dir = item.file_type().is_dir();
            out.push(FileEntry {
                full_path: name,
                separator: '/',
                is_dir,
                has_data_fork: item.file_type().is_file(),
                is_paired_header: false,
            });
        }
        out
    }

    fn writable(&self) -> bool {
        true
    }

    fn delete_file(&mut self, entry: &FileEntry) -> Result<(), NestArcError> {
        let path = self.host_path(entry);
        let result = if entry.is_dir {
            // remove_dir, not remove_dir_all: children must already be gone.
            std::fs::remove_dir(&path)
        } else {
            std::fs::remove_file(&path)
        };
        result.map_err(|e| {
            NestArcError::on_entry(&entry.full_path, NestArcError::io(e, &path))
        })
    }

    fn save_updates(&mut self) -> Result<(), NestArcError> {
        // Host deletions take effect immediately; nothing is buffered.
        Ok(())
    }

    fn open_data_fork(&mut self, entry: &FileEntry) -> Result<Box<dyn Read>, NestArcError> {
        let path = self.host_path(entry);
        let file = File::open(&path)
            .map_err(|e| NestArcError::on_entry(&entry.full_path, NestArcError::io(e, &path)))?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn catalog_is_preorder_with_directories_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/inner.txt"), b"x").unwrap();
        fs::write(dir.path().join("top.txt"), b"y").unwrap();

        let fsys = DirFs::open(dir.path()).unwrap();
        let names: Vec<String> = fsys.entries().into_iter().map(|e| e.full_path).collect();
        assert_eq!(names, ["sub", "sub/inner.txt", "top.txt"]);

        let sub_idx = names.iter().position(|n| n == "sub").unwrap();
        let inner_idx = names.iter().position(|n| n == "sub/inner.txt").unwrap();
        assert!(sub_idx < inner_idx, "parent must precede child");
    }

    #[test]
    fn delete_refuses_non_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/inner.txt"), b"x").unwrap();

        let mut fsys = DirFs::open(dir.path()).unwrap();
        let sub = FileEntry::directory("sub", '/');
        assert!(fsys.delete_file(&sub).is_err());

        let inner = FileEntry::file("sub/inner.txt", '/');
        fsys.delete_file(&inner).unwrap();
        fsys.delete_file(&sub).unwrap();
        assert!(fsys.entries().is_empty());
    }
}
