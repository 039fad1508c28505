pub mod commands;
pub mod output;
pub mod progress;
pub mod stores;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use varacc_core::{Config, VarAccError};

#[derive(Parser)]
#[command(
    name = "varacc",
    version,
    about = "Accessioning and clustering of submitted genomic variants",
    long_about = "varacc assigns stable accessions to submitted variants, clusters them into \
                  position and type level variants, and rebuilds merged variants for release. \
                  Accessions below the live threshold come from a frozen legacy store; \
                  everything new is issued by the live store."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to $VARACC_HOME/config.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory of the legacy store, overriding the configuration
    #[arg(long, global = true, value_name = "DIR")]
    pub legacy_store: Option<PathBuf>,

    /// Directory of the live store, overriding the configuration
    #[arg(long, global = true, value_name = "DIR")]
    pub live_store: Option<PathBuf>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Number of threads to use (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load pre-accessioned documents into the legacy store
    ImportLegacy(commands::import::ImportArgs),

    /// Accession submitted variants from a JSON lines file
    Submit(commands::submit::SubmitArgs),

    /// Cluster submitted variants that have no clustered variant yet
    Cluster(commands::cluster::ClusterArgs),

    /// Write merged clustered variants of an assembly as JSON lines
    ReleaseMerged(commands::release::ReleaseArgs),

    /// Deprecate clustered variants by accession
    Deprecate(commands::deprecate::DeprecateArgs),

    /// Show document and history counts of both stores
    Stats(commands::stats::StatsArgs),
}

/// Configuration for this run: file, then command-line overrides
pub fn load_settings(cli: &Cli) -> Result<Config, VarAccError> {
    let mut config = match &cli.config {
        Some(path) => varacc_core::load_config(path)?,
        None => {
            let default_path = varacc_core::system::paths::default_config_path();
            if default_path.exists() {
                varacc_core::load_config(&default_path)?
            } else {
                Config::default()
            }
        }
    };

    if let Some(path) = &cli.legacy_store {
        config.storage.legacy_path = Some(path.clone());
    }
    if let Some(path) = &cli.live_store {
        config.storage.live_path = Some(path.clone());
    }
    match cli.verbose {
        0 => {}
        1 => config.logging.level = "debug".to_string(),
        _ => config.logging.level = "trace".to_string(),
    }
    if cli.log_json {
        config.logging.json = true;
    }

    config.validate()?;
    Ok(config)
}

/// Assembly from the command line, falling back to the configured one
pub fn resolve_assembly(flag: Option<String>, configured: Option<&String>) -> Result<String, VarAccError> {
    flag.or_else(|| configured.cloned()).ok_or_else(|| {
        VarAccError::Configuration(
            "no assembly accession given on the command line or in the configuration".to_string(),
        )
    })
}
