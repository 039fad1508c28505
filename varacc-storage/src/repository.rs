//! Repository traits implemented by every storage backend

use varacc_core::{
    Accession, Accessionable, BulkWriteFailure, Sha1Hash, VarAccError, VarAccResult,
};

use crate::document::{AccessionedDocument, InsertOutcome};
use crate::history::HistoryOperation;

/// In-place edit of a stored entity's non-identity fields
pub type DocumentEdit<E> = Box<dyn Fn(&mut E) + Send + Sync>;

/// One entry of an unordered bulk write, addressed by content hash
pub struct DocumentUpdate<E> {
    pub hash: Sha1Hash,
    pub edit: DocumentEdit<E>,
}

impl<E> DocumentUpdate<E> {
    pub fn new(hash: Sha1Hash, edit: impl Fn(&mut E) + Send + Sync + 'static) -> Self {
        Self {
            hash,
            edit: Box::new(edit),
        }
    }
}

impl<E> std::fmt::Debug for DocumentUpdate<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentUpdate")
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

/// Outcome of a bulk write in which every update was attempted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkWriteSummary {
    pub attempted: usize,
    pub modified: usize,
    /// Updates whose hash matched no stored document
    pub unmatched: Vec<Sha1Hash>,
}

/// Storage of accessioned documents for one entity kind in one store.
///
/// Implementations must make `insert_if_absent` and `replace` atomic with respect to the
/// hash uniqueness check: of two concurrent inserts of the same hash exactly one sees
/// `Inserted`.
pub trait AccessionRepository<E: Accessionable>: Send + Sync {
    /// Documents whose hash is among `hashes`; unknown hashes are skipped
    fn find_by_hashes(&self, hashes: &[Sha1Hash]) -> VarAccResult<Vec<AccessionedDocument<E>>>;

    /// Every stored version of `accession`, ascending by version
    fn find_by_accession(&self, accession: Accession)
        -> VarAccResult<Vec<AccessionedDocument<E>>>;

    fn find_by_accessions(
        &self,
        accessions: &[Accession],
    ) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        let mut documents = Vec::new();
        for accession in accessions {
            documents.extend(self.find_by_accession(*accession)?);
        }
        Ok(documents)
    }

    fn insert_if_absent(&self, document: AccessionedDocument<E>) -> VarAccResult<InsertOutcome>;

    /// Swap the document stored under `previous` for `document`.
    ///
    /// Fails with `NotFound` when `previous` is not stored. Reports `HashExists` without
    /// writing when the new hash belongs to a different document.
    fn replace(
        &self,
        previous: &Sha1Hash,
        document: AccessionedDocument<E>,
    ) -> VarAccResult<InsertOutcome>;

    /// Move every version of `accession` out of the active table, returning what moved.
    ///
    /// Retired rows are kept but no longer own their hash, so active lookups and
    /// `find_by_hashes` stop seeing them. `find_retired` still reads them back.
    fn retire_accession(&self, accession: Accession) -> VarAccResult<Vec<AccessionedDocument<E>>>;

    /// Retired versions of `accession`, ascending by version
    fn find_retired(&self, accession: Accession) -> VarAccResult<Vec<AccessionedDocument<E>>>;

    /// Apply `edit` to the document stored under `hash`.
    ///
    /// Returns `false` when no document matches. An edit that changes the content hash
    /// is rejected as an integrity fault.
    fn modify(&self, hash: &Sha1Hash, edit: &(dyn Fn(&mut E) + Send + Sync)) -> VarAccResult<bool>;

    /// Unordered bulk write: every update is attempted even if earlier ones fail, and
    /// the failures are reported together afterwards.
    fn bulk_modify(&self, updates: Vec<DocumentUpdate<E>>) -> VarAccResult<BulkWriteSummary> {
        let attempted = updates.len();
        let mut summary = BulkWriteSummary {
            attempted,
            ..Default::default()
        };
        let mut failures = Vec::new();

        for update in updates {
            match self.modify(&update.hash, update.edit.as_ref()) {
                Ok(true) => summary.modified += 1,
                Ok(false) => summary.unmatched.push(update.hash),
                Err(e) => failures.push(BulkWriteFailure {
                    hash: update.hash.to_hex(),
                    message: e.to_string(),
                }),
            }
        }

        if failures.is_empty() {
            Ok(summary)
        } else {
            Err(VarAccError::BulkWrite {
                attempted,
                failures,
            })
        }
    }

    fn scan(
        &self,
        filter: &dyn Fn(&AccessionedDocument<E>) -> bool,
    ) -> VarAccResult<Vec<AccessionedDocument<E>>>;

    fn count(&self) -> VarAccResult<usize>;
}

/// Append-only log of the operations applied to accessions of one entity kind
pub trait HistoryRepository<E: Accessionable>: Send + Sync {
    fn save(&self, operation: HistoryOperation<E>) -> VarAccResult<()>;

    /// Operations whose origin is `accession`, oldest first
    fn find_by_accession(&self, accession: Accession) -> VarAccResult<Vec<HistoryOperation<E>>>;

    fn latest(&self, accession: Accession) -> VarAccResult<Option<HistoryOperation<E>>> {
        Ok(self.find_by_accession(accession)?.pop())
    }

    fn scan(
        &self,
        filter: &dyn Fn(&HistoryOperation<E>) -> bool,
    ) -> VarAccResult<Vec<HistoryOperation<E>>>;
}

/// Run `edit` on a copy of `data`, refusing edits that would change its identity
pub(crate) fn apply_edit<E: Accessionable>(
    hash: &Sha1Hash,
    data: &E,
    edit: &(dyn Fn(&mut E) + Send + Sync),
) -> VarAccResult<E> {
    let mut edited = data.clone();
    edit(&mut edited);
    let rehashed = edited.content_hash();
    if rehashed != *hash {
        return Err(VarAccError::IntegrityFault(format!(
            "edit changed the identity of document {} (now {})",
            hash, rehashed
        )));
    }
    Ok(edited)
}
