use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use varacc_accession::MergedVariantReader;
use varacc_core::{ClusteredVariant, Config, SubmittedVariant};

use crate::cli::output::{format_number, success};
use crate::cli::resolve_assembly;
use crate::cli::stores::Stores;

#[derive(Args)]
pub struct ReleaseArgs {
    /// Assembly to release (defaults to release.assembly_accession)
    #[arg(short, long)]
    pub assembly: Option<String>,

    /// Output file (defaults to standard output)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: ReleaseArgs, config: &Config) -> Result<()> {
    let assembly = resolve_assembly(args.assembly, config.release.assembly_accession.as_ref())?;
    let stores = Stores::open(config)?;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut reader = MergedVariantReader::new(
        stores.histories::<ClusteredVariant>(),
        stores.repositories::<SubmittedVariant>(),
        assembly.as_str(),
    );
    reader.open()?;

    let page_size = config.release.page_size;
    let mut written = 0usize;
    while let Some(variants) = reader.read()? {
        for variant in variants {
            serde_json::to_writer(&mut out, &variant)?;
            out.write_all(b"\n")?;
            written += 1;
            if written % page_size == 0 {
                out.flush()?;
                info!("Wrote {} merged variants", written);
            }
        }
    }
    out.flush()?;
    reader.close();

    if args.output.is_some() {
        success(&format!(
            "Wrote {} merged variants of {}",
            format_number(written),
            assembly
        ));
    }
    Ok(())
}
