//! Store harness
//!
//! Legacy and live in-memory stores for both entity kinds, wired the way the CLI wires the
//! RocksDB stores. Tests read the per-store call logs to check routing.

use std::sync::Arc;
use varacc_core::{
    Accession, ClusteredVariant, EntityKind, SubmittedVariant, VarAccError, VarAccResult,
};
use varacc_storage::{
    AccessionCounter, AccessionRepository, AccessionedDocument, HistoryRepository,
    InMemoryAccessionRepository, InMemoryCounter, InMemoryHistoryRepository, InsertOutcome,
};

pub struct StoreHarness {
    pub legacy_clustered: InMemoryAccessionRepository<ClusteredVariant>,
    pub live_clustered: InMemoryAccessionRepository<ClusteredVariant>,
    pub legacy_submitted: InMemoryAccessionRepository<SubmittedVariant>,
    pub live_submitted: InMemoryAccessionRepository<SubmittedVariant>,
    pub legacy_clustered_history: InMemoryHistoryRepository<ClusteredVariant>,
    pub live_clustered_history: InMemoryHistoryRepository<ClusteredVariant>,
    pub legacy_submitted_history: InMemoryHistoryRepository<SubmittedVariant>,
    pub live_submitted_history: InMemoryHistoryRepository<SubmittedVariant>,
    pub clustered_counter: Arc<InMemoryCounter>,
    pub submitted_counter: Arc<InMemoryCounter>,
}

impl StoreHarness {
    pub fn new() -> Self {
        Self {
            legacy_clustered: InMemoryAccessionRepository::new(),
            live_clustered: InMemoryAccessionRepository::new(),
            legacy_submitted: InMemoryAccessionRepository::new(),
            live_submitted: InMemoryAccessionRepository::new(),
            legacy_clustered_history: InMemoryHistoryRepository::new(),
            live_clustered_history: InMemoryHistoryRepository::new(),
            legacy_submitted_history: InMemoryHistoryRepository::new(),
            live_submitted_history: InMemoryHistoryRepository::new(),
            clustered_counter: Arc::new(InMemoryCounter::for_kind(EntityKind::ClusteredVariant)),
            submitted_counter: Arc::new(InMemoryCounter::for_kind(EntityKind::SubmittedVariant)),
        }
    }

    /// Cap the clustered counter so that `ceiling` and above are never handed out
    pub fn with_clustered_ceiling(mut self, ceiling: Accession) -> Self {
        self.clustered_counter = Arc::new(
            InMemoryCounter::for_kind(EntityKind::ClusteredVariant).with_ceiling(ceiling),
        );
        self
    }

    pub fn import_legacy_clustered(
        &self,
        documents: impl IntoIterator<Item = AccessionedDocument<ClusteredVariant>>,
    ) -> VarAccResult<()> {
        insert_all(&self.legacy_clustered, documents)
    }

    pub fn import_legacy_submitted(
        &self,
        documents: impl IntoIterator<Item = AccessionedDocument<SubmittedVariant>>,
    ) -> VarAccResult<()> {
        insert_all(&self.legacy_submitted, documents)
    }

    pub fn import_live_clustered(
        &self,
        documents: impl IntoIterator<Item = AccessionedDocument<ClusteredVariant>>,
    ) -> VarAccResult<()> {
        insert_all(&self.live_clustered, documents)
    }

    /// Accession `variants` from the submitted counter and store them in the live store
    pub fn insert_live_submitted(
        &self,
        variants: impl IntoIterator<Item = SubmittedVariant>,
    ) -> VarAccResult<Vec<AccessionedDocument<SubmittedVariant>>> {
        let mut inserted = Vec::new();
        for variant in variants {
            let accession = self.submitted_counter.reserve_next()?;
            let document = AccessionedDocument::new(accession, variant);
            insert_all(&self.live_submitted, [document.clone()])?;
            inserted.push(document);
        }
        Ok(inserted)
    }

    pub fn clustered_repositories(
        &self,
    ) -> (
        Arc<dyn AccessionRepository<ClusteredVariant>>,
        Arc<dyn AccessionRepository<ClusteredVariant>>,
    ) {
        (
            Arc::new(self.legacy_clustered.clone()),
            Arc::new(self.live_clustered.clone()),
        )
    }

    pub fn submitted_repositories(
        &self,
    ) -> (
        Arc<dyn AccessionRepository<SubmittedVariant>>,
        Arc<dyn AccessionRepository<SubmittedVariant>>,
    ) {
        (
            Arc::new(self.legacy_submitted.clone()),
            Arc::new(self.live_submitted.clone()),
        )
    }

    pub fn clustered_histories(
        &self,
    ) -> (
        Arc<dyn HistoryRepository<ClusteredVariant>>,
        Arc<dyn HistoryRepository<ClusteredVariant>>,
    ) {
        (
            Arc::new(self.legacy_clustered_history.clone()),
            Arc::new(self.live_clustered_history.clone()),
        )
    }

    pub fn submitted_histories(
        &self,
    ) -> (
        Arc<dyn HistoryRepository<SubmittedVariant>>,
        Arc<dyn HistoryRepository<SubmittedVariant>>,
    ) {
        (
            Arc::new(self.legacy_submitted_history.clone()),
            Arc::new(self.live_submitted_history.clone()),
        )
    }

    pub fn clustered_counter(&self) -> Arc<dyn AccessionCounter> {
        self.clustered_counter.clone()
    }

    pub fn submitted_counter(&self) -> Arc<dyn AccessionCounter> {
        self.submitted_counter.clone()
    }

    pub fn clear_calls(&self) {
        self.legacy_clustered.clear_calls();
        self.live_clustered.clear_calls();
        self.legacy_submitted.clear_calls();
        self.live_submitted.clear_calls();
    }
}

impl Default for StoreHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_all<E>(
    repository: &InMemoryAccessionRepository<E>,
    documents: impl IntoIterator<Item = AccessionedDocument<E>>,
) -> VarAccResult<()>
where
    E: varacc_core::Accessionable,
{
    for document in documents {
        let hash = document.hash;
        if let InsertOutcome::HashExists(accession) = repository.insert_if_absent(document)? {
            return Err(VarAccError::HashAlreadyExists {
                hash: hash.to_hex(),
                accession,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{legacy_clustered, submitted};
    use varacc_core::VariantType;

    #[test]
    fn test_live_submitted_draws_from_counter() {
        let harness = StoreHarness::new();
        let docs = harness
            .insert_live_submitted([submitted("1", 10, "A", "C"), submitted("1", 20, "G", "T")])
            .unwrap();
        assert_eq!(docs[0].accession, 5_000_000_000);
        assert_eq!(docs[1].accession, 5_000_000_001);
        assert_eq!(harness.live_submitted.count().unwrap(), 2);
    }

    #[test]
    fn test_duplicate_fixture_is_rejected() {
        let harness = StoreHarness::new();
        let doc = legacy_clustered(42, "1", 10, VariantType::Snv);
        harness.import_legacy_clustered([doc.clone()]).unwrap();
        let err = harness
            .import_legacy_clustered([legacy_clustered(43, "1", 10, VariantType::Snv)])
            .unwrap_err();
        assert!(matches!(err, VarAccError::HashAlreadyExists { accession: 42, .. }));
    }

    #[test]
    fn test_clear_calls() {
        let harness = StoreHarness::new();
        harness
            .import_legacy_clustered([legacy_clustered(42, "1", 10, VariantType::Snv)])
            .unwrap();
        assert!(!harness.legacy_clustered.calls().is_empty());
        harness.clear_calls();
        assert!(harness.legacy_clustered.calls().is_empty());
    }
}
