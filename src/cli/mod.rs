use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::depth::ScanDepth;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Delete entries matching the given patterns from an archive or directory.
    #[command(alias = "rm")]
    Delete {
        /// Extended archive path naming the container chain to mutate.
        archive: String,

        /// One or more glob patterns; every pattern must match something.
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Do not expand patterns naming a directory to the whole subtree.
        #[arg(long = "no-recurse", action = clap::ArgAction::SetFalse, default_value_t = true)]
        recurse: bool,

        /// Treat MacZip "__MACOSX" metadata headers as ordinary entries.
        #[arg(long = "no-maczip", action = clap::ArgAction::SetFalse, default_value_t = true)]
        maczip: bool,
    },

    /// Print matched entries as text, honoring legacy line endings.
    #[command(alias = "p")]
    Print {
        /// Extended archive path naming the container chain to read.
        archive: String,

        /// One or more glob patterns selecting the entries to print.
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Do not expand patterns naming a directory to the whole subtree.
        #[arg(long = "no-recurse", action = clap::ArgAction::SetFalse, default_value_t = true)]
        recurse: bool,

        /// Treat MacZip "__MACOSX" metadata headers as ordinary entries.
        #[arg(long = "no-maczip", action = clap::ArgAction::SetFalse, default_value_t = true)]
        maczip: bool,
    },

    /// Resolve an extended archive path and dump the chain and catalog.
    DebugShowInfo {
        /// Extended archive path to inspect.
        archive: String,
    },

    /// Render the container tree under a host path, bounded by the scan depth.
    DebugWtree {
        /// Host file or directory to scan.
        path: PathBuf,

        /// How deep the scan may open nested containers.
        #[arg(long, value_enum, default_value_t = ScanDepth::SubVol)]
        depth: ScanDepth,
    },
}

/// Parses command-line arguments using `clap` and returns the command to execute.
pub fn run() -> Result<Commands, Box<dyn std::error::Error>> {
    let args = Args::parse();
    Ok(args.command)
}
