//! Suffix-based container kind detection.
//!
//! Detection is case-insensitive and purely name-based; no bytes are read.
//! NuFX and disk-image formats have no adapter in this crate, but their
//! names are still recognized so the resolver and the tree scanner can
//! classify them (and the depth policy can decide whether a scan would
//! bother opening them).

/// Container kind named by a file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedKind {
    Zip,
    GZip,
    /// NuFX / ShrinkIt (`.shk`, `.bxy`) — recognized, no adapter.
    NuFx,
    /// Raw or wrapped disk image — recognized, no adapter.
    DiskImage,
}

impl DetectedKind {
    pub fn label(self) -> &'static str {
        match self {
            DetectedKind::Zip => "zip",
            DetectedKind::GZip => "gzip",
            DetectedKind::NuFx => "nufx",
            DetectedKind::DiskImage => "disk image",
        }
    }
}

const DISK_IMAGE_SUFFIXES: [&str; 6] = [".po", ".do", ".dsk", ".img", ".2mg", ".d13"];

/// Detects a container kind from a file or entry name.
///
/// Returns `None` for names with no recognized suffix. `.sdk` (a ShrinkIt
/// archive wrapping a disk image) is classified as NuFX since that is the
/// outer layer.
pub fn detect_kind(name: &str) -> Option<DetectedKind> {
    if ends_with_ignore_case(name, ".zip") {
        return Some(DetectedKind::Zip);
    }
    if ends_with_ignore_case(name, ".gz") {
        return Some(DetectedKind::GZip);
    }
    if ends_with_ignore_case(name, ".shk")
        || ends_with_ignore_case(name, ".bxy")
        || ends_with_ignore_case(name, ".sdk")
    {
        return Some(DetectedKind::NuFx);
    }
    for suffix in DISK_IMAGE_SUFFIXES {
        if ends_with_ignore_case(name, suffix) {
            return Some(DetectedKind::DiskImage);
        }
    }
    None
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    let n = name.as_bytes();
    let s = suffix.as_bytes();
    n.len() >= s.len() && n[n.len() - s.len()..].eq_ignore_ascii_case(s)
}
