//! Scan-depth policy for nested container traversal.
//!
//! A recursive scan that opened every file inside every container would be
//! slow and noisy: a directory tree full of zip files should not have each
//! member classified, but a disk image found inside one of those zips should
//! still be explored one level deeper. [`should_descend`] encodes that
//! policy as a pure function over closed tag enums, so adding a container
//! kind forces every dispatch site to be revisited at compile time.

use clap::ValueEnum;

/// The kind of container currently being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthParentKind {
    GZip,
    Zip,
    NuFx,
    FileSystem,
    MultiPart,
}

/// The kind of item about to be considered for descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthChildKind {
    /// A plain file that may turn out to be an archive.
    AnyFile,
    /// A disk-image thread embedded in a NuFX archive (`.SDK` style).
    DiskPart,
    /// A disk image stored as an ordinary member.
    DiskImage,
    /// An embedded sub-volume inside a filesystem.
    Embed,
}

/// User-configured traversal depth limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScanDepth {
    /// Open everything that can be opened.
    Max,
    /// Only unwrap single-member wrappers (gzip, NuFX disk threads).
    Shallow,
    /// Descend far enough to reach sub-volumes, but never open plain files
    /// living inside a filesystem.
    SubVol,
}

/// Decides whether a scan may open `child` while inside `parent`.
///
/// Pure and total over the declared tag domains; every combination is
/// meaningful, so there is no wildcard arm to hide an unhandled case.
pub fn should_descend(parent: DepthParentKind, child: DepthChildKind, depth: ScanDepth) -> bool {
    use DepthChildKind as Child;
    use DepthParentKind as Parent;

    match depth {
        ScanDepth::Max => true,
        ScanDepth::Shallow => match child {
            Child::AnyFile => matches!(parent, Parent::GZip | Parent::NuFx),
            _ => parent == Parent::GZip || (parent == Parent::NuFx && child == Child::DiskPart),
        },
        ScanDepth::SubVol => match child {
            // Never open plain files living inside a filesystem.
            Child::AnyFile => parent != Parent::FileSystem,
            _ => match parent {
                Parent::GZip => true,
                Parent::Zip => child == Child::DiskImage,
                Parent::NuFx => child == Child::DiskPart,
                Parent::FileSystem => child == Child::Embed,
                Parent::MultiPart => true,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::DepthChildKind::*;
    use super::DepthParentKind::*;
    use super::ScanDepth::*;
    use super::*;

    const PARENTS: [DepthParentKind; 5] = [GZip, Zip, NuFx, FileSystem, MultiPart];
    const CHILDREN: [DepthChildKind; 4] = [AnyFile, DiskPart, DiskImage, Embed];

    #[test]
    fn max_depth_always_descends() {
        for parent in PARENTS {
            for child in CHILDREN {
                assert!(
                    should_descend(parent, child, Max),
                    "Max must descend for {parent:?}/{child:?}"
                );
            }
        }
    }

    /// Full decision table for the bounded depths. One row per
    /// (parent, child) pair: expected results for Shallow and SubVol.
    #[test]
    fn bounded_depth_table() {
        #[rustfmt::skip]
        let table: &[(DepthParentKind, DepthChildKind, bool, bool)] = &[
            // parent      child      shallow subvol
            (GZip,       AnyFile,   true,  true),
            (GZip,       DiskPart,  true,  true),
            (GZip,       DiskImage, true,  true),
            (GZip,       Embed,     true,  true),
            (Zip,        AnyFile,   false, true),
            (Zip,        DiskPart,  false, false),
            (Zip,        DiskImage, false, true),
            (Zip,        Embed,     false, false),
            (NuFx,       AnyFile,   true,  true),
            (NuFx,       DiskPart,  true,  true),
            (NuFx,       DiskImage, false, false),
            (NuFx,       Embed,     false, false),
            (FileSystem, AnyFile,   false, false),
            (FileSystem, DiskPart,  false, false),
            (FileSystem, DiskImage, false, false),
            (FileSystem, Embed,     false, true),
            (MultiPart,  AnyFile,   false, true),
            (MultiPart,  DiskPart,  false, true),
            (MultiPart,  DiskImage, false, true),
            (MultiPart,  Embed,     false, true),
        ];

        for &(parent, child, shallow, subvol) in table {
            assert_eq!(
                should_descend(parent, child, Shallow),
                shallow,
                "Shallow mismatch for {parent:?}/{child:?}"
            );
            assert_eq!(
                should_descend(parent, child, SubVol),
                subvol,
                "SubVol mismatch for {parent:?}/{child:?}"
            );
        }
        assert_eq!(table.len(), PARENTS.len() * CHILDREN.len());
    }
}
