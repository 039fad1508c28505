//! In-memory repositories
//!
//! HashMap-backed implementations of the repository traits with no disk I/O. They give
//! the same atomicity guarantees as the RocksDB backend and record the calls they
//! receive so tests can verify which store an operation was routed to.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use varacc_core::{Accession, Accessionable, Sha1Hash, VarAccError, VarAccResult};

use crate::document::{AccessionedDocument, InsertOutcome};
use crate::history::HistoryOperation;
use crate::repository::{apply_edit, AccessionRepository, HistoryRepository};

struct DocumentTable<E> {
    by_hash: HashMap<Sha1Hash, AccessionedDocument<E>>,
    by_accession: BTreeMap<(Accession, u32), Sha1Hash>,
    retired: BTreeMap<(Accession, u32), AccessionedDocument<E>>,
}

impl<E> Default for DocumentTable<E> {
    fn default() -> Self {
        Self {
            by_hash: HashMap::new(),
            by_accession: BTreeMap::new(),
            retired: BTreeMap::new(),
        }
    }
}

impl<E: Clone> DocumentTable<E> {
    fn put(&mut self, document: AccessionedDocument<E>) {
        self.by_accession
            .insert((document.accession, document.version), document.hash);
        self.by_hash.insert(document.hash, document);
    }

    fn versions(&self, accession: Accession) -> Vec<AccessionedDocument<E>> {
        self.by_accession
            .range((accession, 0)..=(accession, u32::MAX))
            .filter_map(|(_, hash)| self.by_hash.get(hash).cloned())
            .collect()
    }
}

#[derive(Clone)]
pub struct InMemoryAccessionRepository<E> {
    table: Arc<RwLock<DocumentTable<E>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl<E: Accessionable> InMemoryAccessionRepository<E> {
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(DocumentTable::default())),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Repository pre-populated with `documents`, bypassing the uniqueness check
    pub fn with_documents(documents: impl IntoIterator<Item = AccessionedDocument<E>>) -> Self {
        let repository = Self::new();
        {
            let mut table = repository.table.write();
            for document in documents {
                table.put(document);
            }
        }
        repository
    }

    /// Names of the trait methods called so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.write().clear();
    }

    fn record(&self, call: &str) {
        self.calls.write().push(call.to_string());
    }
}

impl<E: Accessionable> Default for InMemoryAccessionRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Accessionable> AccessionRepository<E> for InMemoryAccessionRepository<E> {
    fn find_by_hashes(&self, hashes: &[Sha1Hash]) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        self.record("find_by_hashes");
        let table = self.table.read();
        Ok(hashes
            .iter()
            .filter_map(|hash| table.by_hash.get(hash).cloned())
            .collect())
    }

    fn find_by_accession(
        &self,
        accession: Accession,
    ) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        self.record("find_by_accession");
        Ok(self.table.read().versions(accession))
    }

    fn insert_if_absent(&self, document: AccessionedDocument<E>) -> VarAccResult<InsertOutcome> {
        self.record("insert_if_absent");
        let mut table = self.table.write();
        if let Some(existing) = table.by_hash.get(&document.hash) {
            return Ok(InsertOutcome::HashExists(existing.accession));
        }
        table.put(document);
        Ok(InsertOutcome::Inserted)
    }

    fn replace(
        &self,
        previous: &Sha1Hash,
        document: AccessionedDocument<E>,
    ) -> VarAccResult<InsertOutcome> {
        self.record("replace");
        let mut table = self.table.write();
        if !table.by_hash.contains_key(previous) {
            return Err(VarAccError::NotFound(format!("document {}", previous)));
        }
        if document.hash != *previous {
            if let Some(existing) = table.by_hash.get(&document.hash) {
                return Ok(InsertOutcome::HashExists(existing.accession));
            }
        }
        if let Some(old) = table.by_hash.remove(previous) {
            table.by_accession.remove(&(old.accession, old.version));
        }
        table.put(document);
        Ok(InsertOutcome::Inserted)
    }

    fn retire_accession(&self, accession: Accession) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        self.record("retire_accession");
        let mut table = self.table.write();
        let retired = table.versions(accession);
        for document in &retired {
            table.by_hash.remove(&document.hash);
            let key = (document.accession, document.version);
            table.by_accession.remove(&key);
            table.retired.insert(key, document.clone());
        }
        Ok(retired)
    }

    fn find_retired(&self, accession: Accession) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        self.record("find_retired");
        Ok(self
            .table
            .read()
            .retired
            .range((accession, 0)..=(accession, u32::MAX))
            .map(|(_, document)| document.clone())
            .collect())
    }

    fn modify(&self, hash: &Sha1Hash, edit: &(dyn Fn(&mut E) + Send + Sync)) -> VarAccResult<bool> {
        self.record("modify");
        let mut table = self.table.write();
        let Some(document) = table.by_hash.get_mut(hash) else {
            return Ok(false);
        };
        document.data = apply_edit(hash, &document.data, edit)?;
        Ok(true)
    }

    fn scan(
        &self,
        filter: &dyn Fn(&AccessionedDocument<E>) -> bool,
    ) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        self.record("scan");
        let table = self.table.read();
        Ok(table
            .by_accession
            .values()
            .filter_map(|hash| table.by_hash.get(hash))
            .filter(|document| filter(*document))
            .cloned()
            .collect())
    }

    fn count(&self) -> VarAccResult<usize> {
        Ok(self.table.read().by_hash.len())
    }
}

#[derive(Clone)]
pub struct InMemoryHistoryRepository<E> {
    operations: Arc<DashMap<Accession, Vec<HistoryOperation<E>>>>,
}

impl<E: Accessionable> InMemoryHistoryRepository<E> {
    pub fn new() -> Self {
        Self {
            operations: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.operations.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Accessionable> Default for InMemoryHistoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Accessionable> HistoryRepository<E> for InMemoryHistoryRepository<E> {
    fn save(&self, operation: HistoryOperation<E>) -> VarAccResult<()> {
        let mut entry = self.operations.entry(operation.accession).or_default();
        entry.push(operation);
        entry.sort_by_key(|op| op.created_date);
        Ok(())
    }

    fn find_by_accession(&self, accession: Accession) -> VarAccResult<Vec<HistoryOperation<E>>> {
        Ok(self
            .operations
            .get(&accession)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    fn scan(
        &self,
        filter: &dyn Fn(&HistoryOperation<E>) -> bool,
    ) -> VarAccResult<Vec<HistoryOperation<E>>> {
        let mut found: Vec<HistoryOperation<E>> = self
            .operations
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|op| filter(*op))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        found.sort_by_key(|op| (op.accession, op.created_date));
        Ok(found)
    }
}
