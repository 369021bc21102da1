//! The debug-show-info command: resolves a chain and dumps what it found.

use std::io::Write;

use crate::container::Leaf;
use crate::error::NestArcError;
use crate::resolve::resolve;

pub fn show_info(spec: &str, out: &mut dyn Write) -> Result<(), NestArcError> {
    let chain = resolve(spec, false, true)?;

    writeln!(out, "chain:")?;
    for (i, link) in chain.links().iter().enumerate() {
        writeln!(out, "{:indent$}{link}", "", indent = 2 + i * 2)?;
    }

    match &chain.leaf {
        Leaf::FlatArchive(archive) => {
            let entries = archive.entries();
            writeln!(
                out,
                "leaf: {} flat archive, {} record(s), writable={}",
                archive.format_name(),
                entries.len(),
                archive.writable()
            )?;
            for e in &entries {
                let mut flags = String::new();
                if !e.has_data_fork {
                    flags.push_str(" [no data]");
                }
                if e.is_paired_header {
                    flags.push_str(" [mac header]");
                }
                writeln!(out, "  {}{flags}", e.full_path)?;
            }
        }
        Leaf::Filesystem(fs) => {
            let entries = fs.entries();
            writeln!(
                out,
                "leaf: {} filesystem, {} entr(ies), writable={}",
                fs.format_name(),
                entries.len(),
                fs.writable()
            )?;
            if let Some(root) = &chain.subtree {
                writeln!(out, "subtree root: {}", root.full_path)?;
            }
            for e in &entries {
                let marker = if e.is_dir { "/" } else { "" };
                writeln!(out, "  {}{marker}", e.full_path)?;
            }
        }
        Leaf::DiskImage(leaf) => {
            writeln!(out, "leaf: disk image '{}' (no adapter)", leaf.name)?;
        }
        Leaf::Partition(leaf) => {
            writeln!(out, "leaf: partition '{}' (no adapter)", leaf.name)?;
        }
    }
    Ok(())
}
