use anyhow::Result;
use clap::Args;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::info;
use varacc_accession::{Accessioner, ClusteringReport, ClusteringWriter};
use varacc_core::{ClusteredVariant, Config, SubmittedVariant, VarAccResult};
use varacc_storage::AccessionedDocument;

use crate::cli::output::{format_number, section_header, tree_item, warning};
use crate::cli::progress::{create_progress_bar, create_spinner};
use crate::cli::resolve_assembly;
use crate::cli::stores::Stores;

#[derive(Args)]
pub struct ClusterArgs {
    /// Assembly to cluster (defaults to clustering.assembly_accession)
    #[arg(short, long)]
    pub assembly: Option<String>,

    /// Submitted variants per batch (defaults to clustering.chunk_size)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Hide progress output
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: ClusterArgs, config: &Config) -> Result<()> {
    let assembly = resolve_assembly(args.assembly, config.clustering.assembly_accession.as_ref())?;
    let chunk_size = args.chunk_size.unwrap_or(config.clustering.chunk_size).max(1);

    let stores = Stores::open(config)?;
    let submitted = stores.repositories::<SubmittedVariant>();

    let spinner = create_spinner("Collecting unclustered submitted variants...", args.quiet);
    let mut pending: Vec<AccessionedDocument<SubmittedVariant>> = Vec::new();
    for (origin, repository) in submitted.iter() {
        let found = repository.scan(&|document: &AccessionedDocument<SubmittedVariant>| {
            document.data.assembly_accession == assembly
                && document.data.clustered_variant_accession.is_none()
        })?;
        info!("{} unclustered submitted variants in the {} store", found.len(), origin);
        pending.extend(found);
    }
    spinner.finish_and_clear();

    if pending.is_empty() {
        warning(&format!("No unclustered submitted variants on {}", assembly));
        return Ok(());
    }

    let clustered: Arc<dyn Accessioner<ClusteredVariant>> =
        Arc::new(stores.accessioner::<ClusteredVariant>()?);
    let writer = ClusteringWriter::new(clustered, submitted, assembly.as_str());

    let bar = create_progress_bar(pending.len() as u64, "Clustering", args.quiet);
    let reports: Vec<ClusteringReport> = pending
        .par_chunks(chunk_size)
        .map(|chunk| {
            let report = writer.write(chunk);
            bar.inc(chunk.len() as u64);
            report
        })
        .collect::<VarAccResult<Vec<_>>>()?;
    bar.finish_and_clear();
    stores.flush()?;

    let total = reports.iter().fold(ClusteringReport::default(), |mut total, report| {
        total.submitted_variants += report.submitted_variants;
        total.distinct_clusters += report.distinct_clusters;
        total.new_clusters += report.new_clusters;
        total.back_references_written += report.back_references_written;
        total.unmatched += report.unmatched;
        total
    });

    section_header(&format!("Clustered {}", assembly));
    tree_item(false, "Batches", Some(&format_number(reports.len())));
    tree_item(false, "Submitted variants", Some(&format_number(total.submitted_variants)));
    tree_item(false, "New clustered variants", Some(&format_number(total.new_clusters)));
    tree_item(
        total.unmatched == 0,
        "Back-references written",
        Some(&format_number(total.back_references_written)),
    );
    if total.unmatched > 0 {
        tree_item(true, "Unmatched updates", Some(&format_number(total.unmatched)));
    }
    Ok(())
}
