//! Accessioning over a single store
//!
//! `AccessioningService` wraps one repository, its history and, for the live store, the
//! counter that hands out new accessions. The legacy store is opened without a counter
//! and rejects creation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};
use varacc_core::{
    Accession, Accessionable, Sha1Hash, StoreOrigin, VarAccError, VarAccResult,
};
use varacc_storage::{
    AccessionCounter, AccessionRepository, AccessionedDocument, EventType, InsertOutcome,
};

use crate::inactive::InactiveService;

/// Accession assigned to one distinct hash by `get` or `get_or_create`
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedAccession<E> {
    pub hash: Sha1Hash,
    pub accession: Accession,
    pub data: E,
    pub origin: StoreOrigin,
    /// Whether this call created the accession
    pub created: bool,
}

impl<E> AssignedAccession<E> {
    fn existing(document: AccessionedDocument<E>, origin: StoreOrigin) -> Self {
        Self {
            hash: document.hash,
            accession: document.accession,
            data: document.data,
            origin,
            created: false,
        }
    }
}

/// The accessioning operations shared by a single store and the dual-store router
pub trait Accessioner<E: Accessionable>: Send + Sync {
    /// Existing accessions for the distinct hashes of `entities`; unknown ones are absent
    fn get(&self, entities: &[E]) -> VarAccResult<Vec<AssignedAccession<E>>>;

    /// One entry per distinct hash of `entities`, creating accessions for new hashes.
    /// The output order is unspecified.
    fn get_or_create(&self, entities: &[E]) -> VarAccResult<Vec<AssignedAccession<E>>>;

    /// Latest version of `accession`
    fn get_by_accession(&self, accession: Accession) -> VarAccResult<AccessionedDocument<E>>;

    /// Latest version of each active accession; unknown ones are skipped
    fn get_by_accessions(
        &self,
        accessions: &[Accession],
    ) -> VarAccResult<Vec<AccessionedDocument<E>>>;

    fn get_by_accession_and_version(
        &self,
        accession: Accession,
        version: u32,
    ) -> VarAccResult<AccessionedDocument<E>>;

    /// Replace the data of an existing version in place
    fn update(
        &self,
        accession: Accession,
        version: u32,
        data: E,
    ) -> VarAccResult<AccessionedDocument<E>>;

    /// Store `data` as a new version of `accession`
    fn patch(&self, accession: Accession, data: E) -> VarAccResult<AccessionedDocument<E>>;

    fn deprecate(&self, accession: Accession, reason: &str) -> VarAccResult<()>;

    fn merge(&self, origin: Accession, merge_into: Accession, reason: &str) -> VarAccResult<()>;
}

/// Distinct entities of a batch keyed by hash, first occurrence wins
pub(crate) fn distinct_by_hash<E: Accessionable>(entities: &[E]) -> BTreeMap<Sha1Hash, E> {
    let mut distinct = BTreeMap::new();
    for entity in entities {
        distinct
            .entry(entity.content_hash())
            .or_insert_with(|| entity.clone());
    }
    distinct
}

pub struct AccessioningService<E: Accessionable> {
    origin: StoreOrigin,
    repository: Arc<dyn AccessionRepository<E>>,
    inactive: InactiveService<E>,
    counter: Option<Arc<dyn AccessionCounter>>,
}

impl<E: Accessionable> AccessioningService<E> {
    /// Read-only service over the frozen legacy store
    pub fn legacy(repository: Arc<dyn AccessionRepository<E>>, inactive: InactiveService<E>) -> Self {
        Self {
            origin: StoreOrigin::Legacy,
            repository,
            inactive,
            counter: None,
        }
    }

    /// Service over the live store, creating accessions from `counter`
    pub fn live(
        repository: Arc<dyn AccessionRepository<E>>,
        inactive: InactiveService<E>,
        counter: Arc<dyn AccessionCounter>,
    ) -> Self {
        Self {
            origin: StoreOrigin::Live,
            repository,
            inactive,
            counter: Some(counter),
        }
    }

    pub fn origin(&self) -> StoreOrigin {
        self.origin
    }

    pub fn repository(&self) -> &Arc<dyn AccessionRepository<E>> {
        &self.repository
    }

    pub fn inactive(&self) -> &InactiveService<E> {
        &self.inactive
    }

    /// Active versions of `accession`, or the reason it has none
    fn active_versions(&self, accession: Accession) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        let versions = self.repository.find_by_accession(accession)?;
        if versions.is_empty() {
            return Err(self.inactive.missing_accession_error(accession));
        }
        Ok(versions)
    }

    /// Highest active version of `accession`
    fn latest_active(&self, accession: Accession) -> VarAccResult<AccessionedDocument<E>> {
        self.active_versions(accession)?
            .pop()
            .ok_or_else(|| self.inactive.missing_accession_error(accession))
    }

    fn find_existing(
        &self,
        hashes: &[Sha1Hash],
    ) -> VarAccResult<HashMap<Sha1Hash, AccessionedDocument<E>>> {
        Ok(self
            .repository
            .find_by_hashes(hashes)?
            .into_iter()
            .map(|document| (document.hash, document))
            .collect())
    }

    /// Create an accession for `entity`, or adopt the one a concurrent writer stored first
    fn create(
        &self,
        counter: &dyn AccessionCounter,
        hash: Sha1Hash,
        entity: E,
    ) -> VarAccResult<AssignedAccession<E>> {
        let accession = counter.reserve_next()?;
        let document = AccessionedDocument::new(accession, entity);
        let data = document.data.clone();

        match self.repository.insert_if_absent(document)? {
            InsertOutcome::Inserted => Ok(AssignedAccession {
                hash,
                accession,
                data,
                origin: self.origin,
                created: true,
            }),
            InsertOutcome::HashExists(winner) => {
                warn!(
                    "Hash {} was stored concurrently as {}; discarding reserved {}",
                    hash,
                    E::KIND.external_id(winner),
                    E::KIND.external_id(accession)
                );
                let stored = self
                    .repository
                    .find_by_hashes(&[hash])?
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        VarAccError::Storage(format!(
                            "hash {} disappeared after a concurrent insert",
                            hash
                        ))
                    })?;
                Ok(AssignedAccession::existing(stored, self.origin))
            }
        }
    }

    /// Record a merge of `origin` into `merge_into` without checking the destination
    pub(crate) fn retire_merged(
        &self,
        origin: Accession,
        merge_into: Accession,
        reason: &str,
    ) -> VarAccResult<()> {
        if origin == merge_into {
            return Err(VarAccError::InvalidInput(format!(
                "cannot merge {} into itself",
                E::KIND.external_id(origin)
            )));
        }
        let latest = self.latest_active(origin)?;
        self.inactive
            .record_merge(origin, merge_into, reason, vec![latest])?;
        self.repository.retire_accession(origin)?;
        info!(
            "Merged {} into {}",
            E::KIND.external_id(origin),
            E::KIND.external_id(merge_into)
        );
        Ok(())
    }
}

impl<E: Accessionable> Accessioner<E> for AccessioningService<E> {
    fn get(&self, entities: &[E]) -> VarAccResult<Vec<AssignedAccession<E>>> {
        let hashes: Vec<Sha1Hash> = distinct_by_hash(entities).into_keys().collect();
        Ok(self
            .find_existing(&hashes)?
            .into_values()
            .map(|document| AssignedAccession::existing(document, self.origin))
            .collect())
    }

    fn get_or_create(&self, entities: &[E]) -> VarAccResult<Vec<AssignedAccession<E>>> {
        let counter = self.counter.as_deref().ok_or_else(|| {
            VarAccError::InvalidInput(format!(
                "the {} store does not create {} accessions",
                self.origin,
                E::KIND
            ))
        })?;

        let distinct = distinct_by_hash(entities);
        let hashes: Vec<Sha1Hash> = distinct.keys().copied().collect();
        let mut existing = self.find_existing(&hashes)?;

        let mut assigned = Vec::with_capacity(distinct.len());
        let mut created = 0;
        for (hash, entity) in distinct {
            if let Some(document) = existing.remove(&hash) {
                assigned.push(AssignedAccession::existing(document, self.origin));
                continue;
            }
            let result = self.create(counter, hash, entity)?;
            if result.created {
                created += 1;
            }
            assigned.push(result);
        }

        debug!(
            "{} store: {} distinct {} hashes, {} created",
            self.origin,
            assigned.len(),
            E::KIND,
            created
        );
        Ok(assigned)
    }

    fn get_by_accession(&self, accession: Accession) -> VarAccResult<AccessionedDocument<E>> {
        self.latest_active(accession)
    }

    fn get_by_accessions(
        &self,
        accessions: &[Accession],
    ) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        let mut latest = Vec::with_capacity(accessions.len());
        for accession in accessions {
            if let Some(document) = self.repository.find_by_accession(*accession)?.pop() {
                latest.push(document);
            }
        }
        Ok(latest)
    }

    fn get_by_accession_and_version(
        &self,
        accession: Accession,
        version: u32,
    ) -> VarAccResult<AccessionedDocument<E>> {
        self.active_versions(accession)?
            .into_iter()
            .find(|document| document.version == version)
            .ok_or_else(|| {
                VarAccError::NotFound(format!(
                    "{} version {}",
                    E::KIND.external_id(accession),
                    version
                ))
            })
    }

    fn update(
        &self,
        accession: Accession,
        version: u32,
        data: E,
    ) -> VarAccResult<AccessionedDocument<E>> {
        let old = self.get_by_accession_and_version(accession, version)?;
        let replacement = AccessionedDocument {
            accession,
            version,
            hash: data.content_hash(),
            data,
            created_date: old.created_date,
        };

        match self.repository.replace(&old.hash, replacement.clone())? {
            InsertOutcome::Inserted => {
                self.inactive
                    .record(EventType::Updated, accession, "update", vec![old])?;
                Ok(replacement)
            }
            InsertOutcome::HashExists(owner) => Err(VarAccError::HashAlreadyExists {
                hash: replacement.hash.to_hex(),
                accession: owner,
            }),
        }
    }

    fn patch(&self, accession: Accession, data: E) -> VarAccResult<AccessionedDocument<E>> {
        let versions = self.active_versions(accession)?;
        let next_version = versions.iter().map(|d| d.version).max().unwrap_or(0) + 1;
        let patched = AccessionedDocument::new(accession, data).with_version(next_version);

        match self.repository.insert_if_absent(patched.clone())? {
            InsertOutcome::Inserted => {
                let previous = versions.into_iter().last().into_iter().collect();
                self.inactive
                    .record(EventType::Patched, accession, "patch", previous)?;
                Ok(patched)
            }
            InsertOutcome::HashExists(owner) => Err(VarAccError::HashAlreadyExists {
                hash: patched.hash.to_hex(),
                accession: owner,
            }),
        }
    }

    fn deprecate(&self, accession: Accession, reason: &str) -> VarAccResult<()> {
        let latest = self.latest_active(accession)?;
        self.inactive
            .record(EventType::Deprecated, accession, reason, vec![latest])?;
        self.repository.retire_accession(accession)?;
        info!("Deprecated {}: {}", E::KIND.external_id(accession), reason);
        Ok(())
    }

    fn merge(&self, origin: Accession, merge_into: Accession, reason: &str) -> VarAccResult<()> {
        self.get_by_accession(merge_into)?;
        self.retire_merged(origin, merge_into, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use varacc_core::{ClusteredVariant, VariantType};
    use varacc_storage::{
        HistoryRepository, InMemoryAccessionRepository, InMemoryCounter, InMemoryHistoryRepository,
    };

    struct Fixture {
        repository: InMemoryAccessionRepository<ClusteredVariant>,
        history: InMemoryHistoryRepository<ClusteredVariant>,
        service: AccessioningService<ClusteredVariant>,
    }

    fn live() -> Fixture {
        let repository = InMemoryAccessionRepository::new();
        let history = InMemoryHistoryRepository::new();
        let service = AccessioningService::live(
            Arc::new(repository.clone()),
            InactiveService::new(Arc::new(history.clone())),
            Arc::new(InMemoryCounter::new(3_000_000_000)),
        );
        Fixture {
            repository,
            history,
            service,
        }
    }

    fn variant(start: u64) -> ClusteredVariant {
        ClusteredVariant::new("GCA_1", 9606, "1", start, VariantType::Snv)
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let f = live();
        let first = f.service.get_or_create(&[variant(1), variant(2)]).unwrap();
        assert!(first.iter().all(|a| a.created));

        let second = f.service.get_or_create(&[variant(2), variant(1)]).unwrap();
        assert!(second.iter().all(|a| !a.created));

        let mut a: Vec<_> = first.iter().map(|x| (x.hash, x.accession)).collect();
        let mut b: Vec<_> = second.iter().map(|x| (x.hash, x.accession)).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
        assert_eq!(f.repository.count().unwrap(), 2);
    }

    #[test]
    fn test_batch_duplicates_share_one_creation() {
        let f = live();
        let assigned = f
            .service
            .get_or_create(&[variant(1), variant(1).with_validated(true)])
            .unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].accession, 3_000_000_000);
    }

    #[test]
    fn test_legacy_store_does_not_create() {
        let legacy = AccessioningService::legacy(
            Arc::new(InMemoryAccessionRepository::new()),
            InactiveService::new(Arc::new(InMemoryHistoryRepository::new())),
        );
        let err = legacy.get_or_create(&[variant(1)]).unwrap_err();
        assert!(matches!(err, VarAccError::InvalidInput(_)));
    }

    #[test]
    fn test_exhausted_counter_is_allocation_failure() {
        let service = AccessioningService::live(
            Arc::new(InMemoryAccessionRepository::new()),
            InactiveService::new(Arc::new(InMemoryHistoryRepository::new())),
            Arc::new(InMemoryCounter::new(3_000_000_000).with_ceiling(3_000_000_001)),
        );
        let err = service
            .get_or_create(&[variant(1), variant(2)])
            .unwrap_err();
        assert!(matches!(err, VarAccError::AllocationFailure(_)));
    }

    #[test]
    fn test_patch_and_update_versions() {
        let f = live();
        let accession = f.service.get_or_create(&[variant(1)]).unwrap()[0].accession;

        let patched = f.service.patch(accession, variant(5)).unwrap();
        assert_eq!(patched.version, 2);
        assert_eq!(f.service.get_by_accession(accession).unwrap().data.start, 5);

        let updated = f.service.update(accession, 1, variant(7)).unwrap();
        assert_eq!(updated.version, 1);
        let v1 = f.service.get_by_accession_and_version(accession, 1).unwrap();
        assert_eq!(v1.data.start, 7);

        let events: Vec<EventType> = f
            .history
            .find_by_accession(accession)
            .unwrap()
            .iter()
            .map(|op| op.event_type)
            .collect();
        assert_eq!(events, vec![EventType::Patched, EventType::Updated]);
    }

    #[test]
    fn test_update_to_taken_hash_fails() {
        let f = live();
        let assigned = f.service.get_or_create(&[variant(1), variant(2)]).unwrap();
        let target = assigned.iter().find(|a| a.data.start == 1).unwrap();
        let owner = assigned.iter().find(|a| a.data.start == 2).unwrap();

        let err = f
            .service
            .update(target.accession, 1, variant(2))
            .unwrap_err();
        match err {
            VarAccError::HashAlreadyExists { accession, .. } => {
                assert_eq!(accession, owner.accession)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_deprecated_and_merged_lookups() {
        let f = live();
        let assigned = f
            .service
            .get_or_create(&[variant(1), variant(2), variant(3)])
            .unwrap();
        let acc = |start: u64| {
            assigned
                .iter()
                .find(|a| a.data.start == start)
                .unwrap()
                .accession
        };

        f.service.deprecate(acc(1), "withdrawn").unwrap();
        f.service.merge(acc(2), acc(3), "duplicate").unwrap();

        assert!(matches!(
            f.service.get_by_accession(acc(1)),
            Err(VarAccError::AccessionDeprecated(_))
        ));
        match f.service.get_by_accession(acc(2)) {
            Err(VarAccError::AccessionMerged { destination, .. }) => {
                assert_eq!(destination, acc(3))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(f.service.get_by_accessions(&[acc(1), acc(3)]).unwrap().len(), 1);
    }

    #[test]
    fn test_merge_and_deprecate_snapshot_latest_version() {
        let f = live();
        let assigned = f
            .service
            .get_or_create(&[variant(1), variant(2), variant(3)])
            .unwrap();
        let acc = |start: u64| {
            assigned
                .iter()
                .find(|a| a.data.start == start)
                .unwrap()
                .accession
        };
        f.service.patch(acc(1), variant(11)).unwrap();
        f.service.patch(acc(2), variant(12)).unwrap();

        f.service.merge(acc(1), acc(3), "duplicate").unwrap();
        f.service.deprecate(acc(2), "withdrawn").unwrap();

        for (accession, event_type) in [(acc(1), EventType::Merged), (acc(2), EventType::Deprecated)] {
            let operation = f.history.latest(accession).unwrap().unwrap();
            assert_eq!(operation.event_type, event_type);
            let snapshot = operation.single_inactive_object().unwrap();
            assert_eq!(snapshot.version, 2);
        }
        assert_eq!(
            f.history
                .latest(acc(1))
                .unwrap()
                .unwrap()
                .single_inactive_object()
                .unwrap()
                .data
                .start,
            11
        );
    }

    #[test]
    fn test_retired_accessions_keep_their_rows() {
        let f = live();
        let assigned = f.service.get_or_create(&[variant(1), variant(2)]).unwrap();
        let (gone, kept) = (assigned[0].accession, assigned[1].accession);
        f.service.patch(gone, variant(5)).unwrap();

        f.service.deprecate(gone, "withdrawn").unwrap();

        let retired: Vec<u32> = f
            .repository
            .find_retired(gone)
            .unwrap()
            .iter()
            .map(|doc| doc.version)
            .collect();
        assert_eq!(retired, vec![1, 2]);
        let active: Vec<Accession> = f
            .service
            .get_by_accessions(&[gone, kept])
            .unwrap()
            .iter()
            .map(|doc| doc.accession)
            .collect();
        assert_eq!(active, vec![kept]);
        assert!(f.service.get(&[variant(5)]).unwrap().is_empty());
    }

    #[test]
    fn test_merge_requires_destination() {
        let f = live();
        let accession = f.service.get_or_create(&[variant(1)]).unwrap()[0].accession;
        let err = f.service.merge(accession, 42, "dup").unwrap_err();
        assert!(matches!(err, VarAccError::AccessionDoesNotExist(42)));
        assert!(f.service.merge(accession, accession, "self").is_err());
    }
}
