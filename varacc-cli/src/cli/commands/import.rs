use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use varacc_accession::LegacyImportWriter;
use varacc_core::{Accession, Accessionable, ClusteredVariant, Config, SubmittedVariant};
use varacc_storage::AccessionedDocument;

use crate::cli::output::{format_number, success};
use crate::cli::progress::create_progress_bar;
use crate::cli::stores::Stores;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ImportKind {
    Clustered,
    Submitted,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Kind of the documents in the file
    #[arg(long, value_enum)]
    pub kind: ImportKind,

    /// JSON lines of `{"accession": ..., "variant": {...}}`
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Documents written per batch
    #[arg(long, default_value = "1000")]
    pub batch_size: usize,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "E: DeserializeOwned"))]
struct ImportRecord<E> {
    accession: Accession,
    variant: E,
}

pub fn run(args: ImportArgs, config: &Config) -> Result<()> {
    let stores = Stores::open(config)?;
    let written = match args.kind {
        ImportKind::Clustered => import::<ClusteredVariant>(&stores, &args.input, &args)?,
        ImportKind::Submitted => import::<SubmittedVariant>(&stores, &args.input, &args)?,
    };
    stores.flush()?;
    success(&format!(
        "Imported {} documents into the legacy store",
        format_number(written)
    ));
    Ok(())
}

fn import<E: Accessionable>(stores: &Stores, input: &Path, args: &ImportArgs) -> Result<usize> {
    let records: Vec<ImportRecord<E>> = super::read_json_lines(input)?;
    let documents: Vec<AccessionedDocument<E>> = records
        .into_iter()
        .map(|record| AccessionedDocument::new(record.accession, record.variant))
        .collect();

    let writer = LegacyImportWriter::new(stores.repositories::<E>().legacy);
    let bar = create_progress_bar(documents.len() as u64, "Importing", args.quiet);
    let mut written = 0;
    for batch in documents.chunks(args.batch_size.max(1)) {
        written += writer.write(batch)?;
        bar.inc(batch.len() as u64);
    }
    bar.finish_and_clear();
    Ok(written)
}
