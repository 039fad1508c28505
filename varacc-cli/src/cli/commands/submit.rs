use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use varacc_accession::Accessioner;
use varacc_core::{Config, SubmittedVariant};

use crate::cli::output::{format_number, success};
use crate::cli::progress::create_progress_bar;
use crate::cli::stores::Stores;

#[derive(Args)]
pub struct SubmitArgs {
    /// JSON lines of submitted variants
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Variants accessioned per call
    #[arg(long, default_value = "1000")]
    pub batch_size: usize,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: SubmitArgs, config: &Config) -> Result<()> {
    let variants: Vec<SubmittedVariant> = super::read_json_lines(&args.input)?;
    let stores = Stores::open(config)?;
    let accessioner = stores.accessioner::<SubmittedVariant>()?;

    let bar = create_progress_bar(variants.len() as u64, "Accessioning", args.quiet);
    let (mut created, mut existing) = (0usize, 0usize);
    for batch in variants.chunks(args.batch_size.max(1)) {
        for assigned in accessioner.get_or_create(batch)? {
            if assigned.created {
                created += 1;
            } else {
                existing += 1;
            }
        }
        bar.inc(batch.len() as u64);
    }
    bar.finish_and_clear();
    stores.flush()?;

    success(&format!(
        "Accessioned {} submitted variants ({} new, {} already known)",
        format_number(created + existing),
        format_number(created),
        format_number(existing)
    ));
    Ok(())
}
