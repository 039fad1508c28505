//! Service wiring shared by the integration tests
#![allow(dead_code)]

use std::sync::Arc;
use varacc_accession::{
    AccessioningService, ClusteringWriter, DualStoreAccessioningService, InactiveService,
    MergedVariantReader, StorePair,
};
use varacc_core::{ClusteredVariant, SubmittedVariant};
use varacc_test::{StoreHarness, TEST_ASSEMBLY};

pub struct Services {
    pub harness: StoreHarness,
    pub clustered: Arc<DualStoreAccessioningService<ClusteredVariant>>,
    pub submitted: Arc<DualStoreAccessioningService<SubmittedVariant>>,
}

impl Services {
    pub fn new(harness: StoreHarness) -> Self {
        let (legacy_rs, live_rs) = harness.clustered_repositories();
        let (legacy_rs_history, live_rs_history) = harness.clustered_histories();
        let clustered = DualStoreAccessioningService::new(
            AccessioningService::legacy(legacy_rs, InactiveService::new(legacy_rs_history)),
            AccessioningService::live(
                live_rs,
                InactiveService::new(live_rs_history),
                harness.clustered_counter(),
            ),
        );

        let (legacy_ss, live_ss) = harness.submitted_repositories();
        let (legacy_ss_history, live_ss_history) = harness.submitted_histories();
        let submitted = DualStoreAccessioningService::new(
            AccessioningService::legacy(legacy_ss, InactiveService::new(legacy_ss_history)),
            AccessioningService::live(
                live_ss,
                InactiveService::new(live_ss_history),
                harness.submitted_counter(),
            ),
        );

        Self {
            harness,
            clustered: Arc::new(clustered),
            submitted: Arc::new(submitted),
        }
    }

    pub fn submitted_stores(
        &self,
    ) -> StorePair<Arc<dyn varacc_storage::AccessionRepository<SubmittedVariant>>> {
        let (legacy, live) = self.harness.submitted_repositories();
        StorePair::new(legacy, live)
    }

    pub fn clustering_writer(&self) -> ClusteringWriter {
        ClusteringWriter::new(self.clustered.clone(), self.submitted_stores(), TEST_ASSEMBLY)
    }

    pub fn merged_reader(&self) -> MergedVariantReader {
        let (legacy, live) = self.harness.clustered_histories();
        MergedVariantReader::new(
            StorePair::new(InactiveService::new(legacy), InactiveService::new(live)),
            self.submitted_stores(),
            TEST_ASSEMBLY,
        )
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new(StoreHarness::new())
    }
}
