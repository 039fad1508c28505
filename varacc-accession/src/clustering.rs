//! Batch clustering of submitted variants
//!
//! Each batch derives the candidate cluster of every submitted variant, resolves the
//! distinct candidates through the clustered-variant accessioner in one call and writes
//! the resulting accession back onto the submitted variants as an unordered bulk write.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use varacc_core::{
    Accession, Accessionable, BulkWriteFailure, ClusteredVariant, Sha1Hash, StoreOrigin,
    SubmittedVariant, VarAccError, VarAccResult,
};
use varacc_storage::{AccessionRepository, AccessionedDocument, DocumentUpdate};

use crate::routing::StorePair;
use crate::service::Accessioner;

/// Counts for one clustered batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusteringReport {
    pub submitted_variants: usize,
    pub distinct_clusters: usize,
    pub new_clusters: usize,
    pub back_references_written: usize,
    pub unmatched: usize,
}

pub struct ClusteringWriter {
    clustered: Arc<dyn Accessioner<ClusteredVariant>>,
    submitted: StorePair<Arc<dyn AccessionRepository<SubmittedVariant>>>,
    assembly_accession: String,
}

impl ClusteringWriter {
    pub fn new(
        clustered: Arc<dyn Accessioner<ClusteredVariant>>,
        submitted: StorePair<Arc<dyn AccessionRepository<SubmittedVariant>>>,
        assembly_accession: impl Into<String>,
    ) -> Self {
        Self {
            clustered,
            submitted,
            assembly_accession: assembly_accession.into(),
        }
    }

    pub fn assembly_accession(&self) -> &str {
        &self.assembly_accession
    }

    /// Cluster one batch and persist the back-references.
    ///
    /// Clusters created before a failure stay created; re-running the batch resolves to
    /// the same accessions because they are found again by hash.
    pub fn write(
        &self,
        batch: &[AccessionedDocument<SubmittedVariant>],
    ) -> VarAccResult<ClusteringReport> {
        let mut report = ClusteringReport {
            submitted_variants: batch.len(),
            ..Default::default()
        };
        if batch.is_empty() {
            return Ok(report);
        }

        let mut candidates = Vec::with_capacity(batch.len());
        for document in batch {
            if document.data.assembly_accession != self.assembly_accession {
                return Err(VarAccError::InvalidInput(format!(
                    "{} is on assembly {}, writer clusters {}",
                    document.external_id(),
                    document.data.assembly_accession,
                    self.assembly_accession
                )));
            }
            candidates.push(ClusteredVariant::from_submitted(&document.data)?);
        }

        let distinct: BTreeMap<Sha1Hash, ClusteredVariant> = candidates
            .iter()
            .map(|candidate| (candidate.content_hash(), candidate.clone()))
            .collect();
        let distinct: Vec<ClusteredVariant> = distinct.into_values().collect();

        // Lives only for this call; never reused across batches
        let mut assigned: HashMap<Sha1Hash, Accession> = HashMap::with_capacity(distinct.len());
        for assignment in self.clustered.get_or_create(&distinct)? {
            if assignment.created {
                report.new_clusters += 1;
            }
            assigned.insert(assignment.hash, assignment.accession);
        }
        report.distinct_clusters = assigned.len();

        let mut legacy_updates = Vec::new();
        let mut live_updates = Vec::new();
        for (document, candidate) in batch.iter().zip(&candidates) {
            let hash = candidate.content_hash();
            let Some(&accession) = assigned.get(&hash) else {
                error!(
                    "No accession resolved for candidate cluster {} of {}",
                    hash,
                    document.external_id()
                );
                return Err(VarAccError::IntegrityFault(format!(
                    "candidate cluster {} of {} has no accession in this batch",
                    hash,
                    document.external_id()
                )));
            };

            let update = DocumentUpdate::new(document.hash, move |variant: &mut SubmittedVariant| {
                variant.clustered_variant_accession = Some(accession);
            });
            match SubmittedVariant::KIND.store_origin(document.accession) {
                StoreOrigin::Legacy => legacy_updates.push(update),
                StoreOrigin::Live => live_updates.push(update),
            }
        }

        let mut failures: Vec<BulkWriteFailure> = Vec::new();
        let mut fatal: Option<VarAccError> = None;
        for (origin, updates) in [
            (StoreOrigin::Legacy, legacy_updates),
            (StoreOrigin::Live, live_updates),
        ] {
            if updates.is_empty() {
                continue;
            }
            match self.submitted.get(origin).bulk_modify(updates) {
                Ok(summary) => {
                    report.back_references_written += summary.modified;
                    report.unmatched += summary.unmatched.len();
                    for hash in &summary.unmatched {
                        warn!("Submitted variant {} not found in the {} store", hash, origin);
                    }
                }
                Err(VarAccError::BulkWrite { failures: f, .. }) => failures.extend(f),
                Err(e) => {
                    fatal.get_or_insert(e);
                }
            }
        }

        if let Some(e) = fatal {
            return Err(e);
        }
        if !failures.is_empty() {
            error!(
                "Bulk write of back-references failed for {} of {} submitted variants",
                failures.len(),
                batch.len()
            );
            return Err(VarAccError::BulkWrite {
                attempted: batch.len(),
                failures,
            });
        }

        debug!("{:?}", report);
        info!(
            "Clustered {} submitted variants into {} clusters ({} new)",
            report.submitted_variants, report.distinct_clusters, report.new_clusters
        );
        Ok(report)
    }
}
