/// One-time population of the frozen legacy store
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use varacc_core::{Accessionable, VarAccError, VarAccResult};
use varacc_storage::{AccessionRepository, AccessionedDocument, InsertOutcome};

/// Writes pre-accessioned documents from an external import into the legacy store.
///
/// Every document must sit below the live threshold and carry a hash no other document
/// already owns.
pub struct LegacyImportWriter<E: Accessionable> {
    repository: Arc<dyn AccessionRepository<E>>,
}

impl<E: Accessionable> LegacyImportWriter<E> {
    pub fn new(repository: Arc<dyn AccessionRepository<E>>) -> Self {
        Self { repository }
    }

    fn validate(&self, documents: &[AccessionedDocument<E>]) -> VarAccResult<()> {
        let mut seen = HashMap::with_capacity(documents.len());
        for document in documents {
            if document.accession >= E::KIND.live_threshold() {
                return Err(VarAccError::InvalidInput(format!(
                    "{} is in the live range and cannot be imported",
                    document.external_id()
                )));
            }
            let expected = document.data.content_hash();
            if document.hash != expected {
                return Err(VarAccError::InvalidInput(format!(
                    "{} carries hash {} but its summary hashes to {}",
                    document.external_id(),
                    document.hash,
                    expected
                )));
            }
            if let Some(first) = seen.insert(document.hash, document.accession) {
                return Err(VarAccError::HashAlreadyExists {
                    hash: document.hash.to_hex(),
                    accession: first,
                });
            }
        }
        Ok(())
    }

    /// Import one batch, returning the number of documents written
    pub fn write(&self, documents: &[AccessionedDocument<E>]) -> VarAccResult<usize> {
        self.validate(documents)?;

        for document in documents {
            if let InsertOutcome::HashExists(owner) =
                self.repository.insert_if_absent(document.clone())?
            {
                return Err(VarAccError::HashAlreadyExists {
                    hash: document.hash.to_hex(),
                    accession: owner,
                });
            }
        }

        info!("Imported {} legacy {} documents", documents.len(), E::KIND);
        Ok(documents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use varacc_core::{ClusteredVariant, VariantType};
    use varacc_storage::InMemoryAccessionRepository;

    fn doc(accession: u64, start: u64) -> AccessionedDocument<ClusteredVariant> {
        AccessionedDocument::new(
            accession,
            ClusteredVariant::new("GCA_1", 9606, "1", start, VariantType::Snv),
        )
    }

    fn writer() -> (
        InMemoryAccessionRepository<ClusteredVariant>,
        LegacyImportWriter<ClusteredVariant>,
    ) {
        let repository = InMemoryAccessionRepository::new();
        let writer = LegacyImportWriter::new(Arc::new(repository.clone()));
        (repository, writer)
    }

    #[test]
    fn test_imports_legacy_range() {
        let (repository, writer) = writer();
        assert_eq!(writer.write(&[doc(1, 10), doc(2, 20)]).unwrap(), 2);
        assert_eq!(repository.count().unwrap(), 2);
    }

    #[test]
    fn test_live_range_is_rejected() {
        let (repository, writer) = writer();
        let err = writer.write(&[doc(3_000_000_000, 10)]).unwrap_err();
        assert!(matches!(err, VarAccError::InvalidInput(_)));
        assert_eq!(repository.count().unwrap(), 0);
    }

    #[test]
    fn test_duplicate_in_batch_fails() {
        let (repository, writer) = writer();
        let err = writer.write(&[doc(1, 10), doc(2, 10)]).unwrap_err();
        assert!(matches!(
            err,
            VarAccError::HashAlreadyExists { accession: 1, .. }
        ));
        assert_eq!(repository.count().unwrap(), 0);
    }

    #[test]
    fn test_duplicate_across_batches_fails() {
        let (_repository, writer) = writer();
        writer.write(&[doc(1, 10)]).unwrap();
        let err = writer.write(&[doc(2, 10)]).unwrap_err();
        assert!(matches!(
            err,
            VarAccError::HashAlreadyExists { accession: 1, .. }
        ));
    }

    #[test]
    fn test_tampered_hash_is_rejected() {
        let (_repository, writer) = writer();
        let mut tampered = doc(1, 10);
        tampered.hash = doc(1, 11).hash;
        assert!(matches!(
            writer.write(&[tampered]),
            Err(VarAccError::InvalidInput(_))
        ));
    }
}
