use clap::Parser;
use colored::*;
use std::process;

mod cli;

use crate::cli::{Cli, Commands};
use varacc_core::VarAccError;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(exit_code(&e));
    }
}

/// Exit code for a failed run, chosen by the library error underneath
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<VarAccError>() {
        Some(VarAccError::Configuration(_)) => 2,
        Some(VarAccError::Io(_)) => 3,
        Some(VarAccError::IntegrityFault(_)) | Some(VarAccError::UpstreamDataFault(_)) => 4,
        Some(VarAccError::Storage(_)) | Some(VarAccError::BulkWrite { .. }) => 5,
        _ => 1,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli::load_settings(&cli)?;
    varacc_core::logging::init_logging(&config.logging)?;

    let num_threads = if cli.threads == 0 {
        num_cpus::get()
    } else {
        cli.threads
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .map_err(|e| VarAccError::Configuration(format!("Failed to initialize thread pool: {}", e)))?;
    tracing::debug!("Using {} threads", num_threads);

    match cli.command {
        Commands::ImportLegacy(args) => cli::commands::import::run(args, &config),
        Commands::Submit(args) => cli::commands::submit::run(args, &config),
        Commands::Cluster(args) => cli::commands::cluster::run(args, &config),
        Commands::ReleaseMerged(args) => cli::commands::release::run(args, &config),
        Commands::Deprecate(args) => cli::commands::deprecate::run(args, &config),
        Commands::Stats(args) => cli::commands::stats::run(args, &config),
    }
}
