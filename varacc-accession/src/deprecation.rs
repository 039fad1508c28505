/// Batch deprecation of clustered variants
use std::sync::Arc;
use tracing::{debug, info};
use varacc_core::{Accession, Accessionable, ClusteredVariant, VarAccError, VarAccResult};

use crate::service::Accessioner;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeprecationReport {
    pub deprecated: usize,
    /// Accessions that were already merged or deprecated
    pub skipped: usize,
}

pub struct DeprecationWriter {
    clustered: Arc<dyn Accessioner<ClusteredVariant>>,
    reason: String,
}

impl DeprecationWriter {
    pub fn new(clustered: Arc<dyn Accessioner<ClusteredVariant>>, reason: impl Into<String>) -> Self {
        Self {
            clustered,
            reason: reason.into(),
        }
    }

    pub fn write(&self, accessions: &[Accession]) -> VarAccResult<DeprecationReport> {
        let mut report = DeprecationReport::default();
        for &accession in accessions {
            match self.clustered.deprecate(accession, &self.reason) {
                Ok(()) => report.deprecated += 1,
                Err(VarAccError::AccessionMerged { destination, .. }) => {
                    debug!(
                        "Skipping {}: merged into {}",
                        ClusteredVariant::KIND.external_id(accession),
                        ClusteredVariant::KIND.external_id(destination)
                    );
                    report.skipped += 1;
                }
                Err(VarAccError::AccessionDeprecated(_)) => {
                    debug!(
                        "Skipping {}: already deprecated",
                        ClusteredVariant::KIND.external_id(accession)
                    );
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Deprecated {} clustered variants, skipped {}",
            report.deprecated, report.skipped
        );
        Ok(report)
    }
}
