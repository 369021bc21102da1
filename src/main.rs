//! Main entry point for the nestarc CLI app

use nestarc::cli::{self, Commands};
use nestarc::common::CmdOptions;
use nestarc::progress::CallbackFacts;
use nestarc::{delete, info, print, wtree};

fn main() -> std::process::ExitCode {
    if let Err(e) = run_app() {
        if e.downcast_ref::<clap::Error>().is_none() {
            eprintln!("Error: {}", e);
        }
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

fn run_app() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let command = cli::run()?;

    match &command {
        Commands::Delete {
            archive,
            patterns,
            recurse,
            maczip,
        } => {
            let opts = CmdOptions {
                recurse: *recurse,
                mac_zip: *maczip,
            };
            let report = |facts: &CallbackFacts| {
                println!("deleting {} ({}%)", facts.path, facts.percent);
            };
            delete::delete_entries(archive, patterns, opts, &report)?;
        }
        Commands::Print {
            archive,
            patterns,
            recurse,
            maczip,
        } => {
            let opts = CmdOptions {
                recurse: *recurse,
                mac_zip: *maczip,
            };
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            print::print_entries(archive, patterns, opts, &mut out)?;
        }
        Commands::DebugShowInfo { archive } => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            info::show_info(archive, &mut out)?;
        }
        Commands::DebugWtree { path, depth } => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            wtree::show_tree(path, *depth, &mut out)?;
        }
    }

    Ok(())
}
