//! Accessioning across the frozen legacy store and the live store
//!
//! Lookups by hash consult the legacy store first. Everything addressed by accession goes
//! to the one store whose range contains it. Only the live store ever creates.

use std::collections::HashSet;
use tracing::debug;
use varacc_core::{Accession, Accessionable, VarAccResult};
use varacc_storage::AccessionedDocument;

use crate::routing::StorePair;
use crate::service::{distinct_by_hash, AccessioningService, Accessioner, AssignedAccession};

pub struct DualStoreAccessioningService<E: Accessionable> {
    stores: StorePair<AccessioningService<E>>,
}

impl<E: Accessionable> DualStoreAccessioningService<E> {
    pub fn new(legacy: AccessioningService<E>, live: AccessioningService<E>) -> Self {
        Self {
            stores: StorePair::new(legacy, live),
        }
    }

    pub fn legacy(&self) -> &AccessioningService<E> {
        &self.stores.legacy
    }

    pub fn live(&self) -> &AccessioningService<E> {
        &self.stores.live
    }

    fn route(&self, accession: Accession) -> &AccessioningService<E> {
        self.stores.route(E::KIND, accession)
    }
}

impl<E: Accessionable> Accessioner<E> for DualStoreAccessioningService<E> {
    fn get(&self, entities: &[E]) -> VarAccResult<Vec<AssignedAccession<E>>> {
        let mut found = self.stores.legacy.get(entities)?;
        let in_legacy: HashSet<_> = found.iter().map(|a| a.hash).collect();
        let remaining: Vec<E> = distinct_by_hash(entities)
            .into_iter()
            .filter(|(hash, _)| !in_legacy.contains(hash))
            .map(|(_, entity)| entity)
            .collect();
        if !remaining.is_empty() {
            found.extend(self.stores.live.get(&remaining)?);
        }
        Ok(found)
    }

    fn get_or_create(&self, entities: &[E]) -> VarAccResult<Vec<AssignedAccession<E>>> {
        let mut assigned = self.stores.legacy.get(entities)?;
        let in_legacy: HashSet<_> = assigned.iter().map(|a| a.hash).collect();

        let remaining: Vec<E> = distinct_by_hash(entities)
            .into_iter()
            .filter(|(hash, _)| !in_legacy.contains(hash))
            .map(|(_, entity)| entity)
            .collect();
        if !remaining.is_empty() {
            assigned.extend(self.stores.live.get_or_create(&remaining)?);
        }

        debug!(
            "Resolved {} {} hashes: {} legacy, {} live",
            assigned.len(),
            E::KIND,
            in_legacy.len(),
            assigned.len() - in_legacy.len()
        );
        Ok(assigned)
    }

    fn get_by_accession(&self, accession: Accession) -> VarAccResult<AccessionedDocument<E>> {
        self.route(accession).get_by_accession(accession)
    }

    fn get_by_accessions(
        &self,
        accessions: &[Accession],
    ) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        let (live, legacy): (Vec<Accession>, Vec<Accession>) = accessions
            .iter()
            .partition(|accession| **accession >= E::KIND.live_threshold());

        let mut found = self.stores.legacy.get_by_accessions(&legacy)?;
        found.extend(self.stores.live.get_by_accessions(&live)?);
        Ok(found)
    }

    fn get_by_accession_and_version(
        &self,
        accession: Accession,
        version: u32,
    ) -> VarAccResult<AccessionedDocument<E>> {
        self.route(accession)
            .get_by_accession_and_version(accession, version)
    }

    fn update(
        &self,
        accession: Accession,
        version: u32,
        data: E,
    ) -> VarAccResult<AccessionedDocument<E>> {
        self.route(accession).update(accession, version, data)
    }

    fn patch(&self, accession: Accession, data: E) -> VarAccResult<AccessionedDocument<E>> {
        self.route(accession).patch(accession, data)
    }

    fn deprecate(&self, accession: Accession, reason: &str) -> VarAccResult<()> {
        self.route(accession).deprecate(accession, reason)
    }

    /// The destination may live in the other store; the merge is recorded where the
    /// origin lives.
    fn merge(&self, origin: Accession, merge_into: Accession, reason: &str) -> VarAccResult<()> {
        self.route(merge_into).get_by_accession(merge_into)?;
        self.route(origin).retire_merged(origin, merge_into, reason)
    }
}
