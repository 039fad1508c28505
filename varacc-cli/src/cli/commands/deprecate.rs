use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use varacc_accession::DeprecationWriter;
use varacc_core::{Accession, Accessionable, ClusteredVariant, Config, VarAccError};

use super::parse_accession;
use crate::cli::output::{format_number, success};
use crate::cli::stores::Stores;

#[derive(Args)]
pub struct DeprecateArgs {
    /// Accessions to deprecate (`123` or `rs123`)
    #[arg(value_name = "ACCESSION")]
    pub accessions: Vec<String>,

    /// File with one accession per line
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Reason recorded in the history of every accession
    #[arg(short, long)]
    pub reason: String,
}

fn collect_accessions(args: &DeprecateArgs) -> Result<Vec<Accession>> {
    let prefix = ClusteredVariant::KIND.prefix();
    let mut accessions = args
        .accessions
        .iter()
        .map(|value| parse_accession(value, prefix))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(path) = &args.file {
        let contents = std::fs::read_to_string(path).map_err(VarAccError::from)?;
        for line in contents.lines().filter(|line| !line.trim().is_empty()) {
            accessions.push(parse_accession(line, prefix)?);
        }
    }
    if accessions.is_empty() {
        return Err(VarAccError::InvalidInput("no accessions to deprecate".to_string()).into());
    }
    Ok(accessions)
}

pub fn run(args: DeprecateArgs, config: &Config) -> Result<()> {
    let accessions = collect_accessions(&args)?;
    let stores = Stores::open(config)?;
    let writer = DeprecationWriter::new(
        Arc::new(stores.accessioner::<ClusteredVariant>()?),
        args.reason.as_str(),
    );

    let report = writer.write(&accessions)?;
    stores.flush()?;
    success(&format!(
        "Deprecated {} clustered variants ({} already retired)",
        format_number(report.deprecated),
        format_number(report.skipped)
    ));
    Ok(())
}
