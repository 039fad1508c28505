//! Repository implementations over a shared RocksDB backend

use rocksdb::WriteBatch;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;
use varacc_core::{Accession, Accessionable, Sha1Hash, VarAccError, VarAccResult};

use super::rocksdb_backend::{cf_names, RocksDBBackend};
use crate::document::{AccessionedDocument, InsertOutcome};
use crate::history::HistoryOperation;
use crate::repository::{apply_edit, AccessionRepository, HistoryRepository};

fn version_key(accession: Accession, version: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(12);
    key.extend_from_slice(&accession.to_be_bytes());
    key.extend_from_slice(&version.to_be_bytes());
    key
}

/// Origin accession, then creation time, then id: prefix scans come back oldest first
fn history_key<E>(operation: &HistoryOperation<E>) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(&operation.accession.to_be_bytes());
    key.extend_from_slice(&(operation.created_date.timestamp_micros() as u64).to_be_bytes());
    key.extend_from_slice(operation.id.as_bytes());
    key
}

pub struct RocksDbAccessionRepository<E> {
    backend: Arc<RocksDBBackend>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Accessionable> RocksDbAccessionRepository<E> {
    pub fn new(backend: Arc<RocksDBBackend>) -> Self {
        Self {
            backend,
            _entity: PhantomData,
        }
    }

    fn load(&self, hash: &Sha1Hash) -> VarAccResult<Option<AccessionedDocument<E>>> {
        match self
            .backend
            .get(cf_names::documents(E::KIND), hash.as_bytes())?
        {
            Some(bytes) => Ok(Some(RocksDBBackend::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn versions(&self, accession: Accession) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        let entries = self
            .backend
            .scan_prefix(cf_names::accessions(E::KIND), &accession.to_be_bytes())?;

        let mut documents = Vec::with_capacity(entries.len());
        for (_key, value) in entries {
            let hash = Sha1Hash::from_bytes(&value)?;
            let document = self.load(&hash)?.ok_or_else(|| {
                VarAccError::IntegrityFault(format!(
                    "accession {} indexes missing document {}",
                    accession, hash
                ))
            })?;
            documents.push(document);
        }
        Ok(documents)
    }

    fn stage_put(
        &self,
        batch: &mut WriteBatch,
        document: &AccessionedDocument<E>,
    ) -> VarAccResult<()> {
        let documents = self.backend.cf_handle(cf_names::documents(E::KIND))?;
        let accessions = self.backend.cf_handle(cf_names::accessions(E::KIND))?;
        batch.put_cf(
            &documents,
            document.hash.as_bytes(),
            RocksDBBackend::serialize(document)?,
        );
        batch.put_cf(
            &accessions,
            version_key(document.accession, document.version),
            document.hash.as_bytes(),
        );
        Ok(())
    }

    fn stage_delete(
        &self,
        batch: &mut WriteBatch,
        document: &AccessionedDocument<E>,
    ) -> VarAccResult<()> {
        let documents = self.backend.cf_handle(cf_names::documents(E::KIND))?;
        let accessions = self.backend.cf_handle(cf_names::accessions(E::KIND))?;
        batch.delete_cf(&documents, document.hash.as_bytes());
        batch.delete_cf(
            &accessions,
            version_key(document.accession, document.version),
        );
        Ok(())
    }
}

impl<E: Accessionable> AccessionRepository<E> for RocksDbAccessionRepository<E> {
    fn find_by_hashes(&self, hashes: &[Sha1Hash]) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        let mut found = Vec::new();
        for hash in hashes {
            if let Some(document) = self.load(hash)? {
                found.push(document);
            }
        }
        Ok(found)
    }

    fn find_by_accession(
        &self,
        accession: Accession,
    ) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        self.versions(accession)
    }

    fn insert_if_absent(&self, document: AccessionedDocument<E>) -> VarAccResult<InsertOutcome> {
        let _guard = self.backend.lock_writes();
        if let Some(existing) = self.load(&document.hash)? {
            return Ok(InsertOutcome::HashExists(existing.accession));
        }

        let mut batch = WriteBatch::default();
        self.stage_put(&mut batch, &document)?;
        self.backend.write(batch)?;
        debug!(
            "Stored {} version {} ({})",
            document.external_id(),
            document.version,
            document.hash.truncated(8)
        );
        Ok(InsertOutcome::Inserted)
    }

    fn replace(
        &self,
        previous: &Sha1Hash,
        document: AccessionedDocument<E>,
    ) -> VarAccResult<InsertOutcome> {
        let _guard = self.backend.lock_writes();
        let old = self
            .load(previous)?
            .ok_or_else(|| VarAccError::NotFound(format!("document {}", previous)))?;
        if document.hash != *previous {
            if let Some(existing) = self.load(&document.hash)? {
                return Ok(InsertOutcome::HashExists(existing.accession));
            }
        }

        let mut batch = WriteBatch::default();
        self.stage_delete(&mut batch, &old)?;
        self.stage_put(&mut batch, &document)?;
        self.backend.write(batch)?;
        Ok(InsertOutcome::Inserted)
    }

    fn retire_accession(&self, accession: Accession) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        let _guard = self.backend.lock_writes();
        let retired = self.versions(accession)?;
        if retired.is_empty() {
            return Ok(retired);
        }

        let cf = self.backend.cf_handle(cf_names::retired(E::KIND))?;
        let mut batch = WriteBatch::default();
        for document in &retired {
            self.stage_delete(&mut batch, document)?;
            batch.put_cf(
                &cf,
                version_key(document.accession, document.version),
                RocksDBBackend::serialize(document)?,
            );
        }
        drop(cf);
        self.backend.write(batch)?;
        debug!("Retired {} version(s) of {}", retired.len(), accession);
        Ok(retired)
    }

    fn find_retired(&self, accession: Accession) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        self.backend
            .scan_prefix(cf_names::retired(E::KIND), &accession.to_be_bytes())?
            .into_iter()
            .map(|(_key, value)| RocksDBBackend::deserialize(&value).map_err(VarAccError::from))
            .collect()
    }

    fn modify(&self, hash: &Sha1Hash, edit: &(dyn Fn(&mut E) + Send + Sync)) -> VarAccResult<bool> {
        let _guard = self.backend.lock_writes();
        let Some(mut document) = self.load(hash)? else {
            return Ok(false);
        };
        document.data = apply_edit(hash, &document.data, edit)?;

        let documents = self.backend.cf_handle(cf_names::documents(E::KIND))?;
        let mut batch = WriteBatch::default();
        batch.put_cf(
            &documents,
            hash.as_bytes(),
            RocksDBBackend::serialize(&document)?,
        );
        drop(documents);
        self.backend.write(batch)?;
        Ok(true)
    }

    fn scan(
        &self,
        filter: &dyn Fn(&AccessionedDocument<E>) -> bool,
    ) -> VarAccResult<Vec<AccessionedDocument<E>>> {
        let mut found = Vec::new();
        for value in self.backend.scan_values(cf_names::accessions(E::KIND))? {
            let hash = Sha1Hash::from_bytes(&value)?;
            if let Some(document) = self.load(&hash)? {
                if filter(&document) {
                    found.push(document);
                }
            }
        }
        Ok(found)
    }

    fn count(&self) -> VarAccResult<usize> {
        Ok(self.backend.document_count(E::KIND)?)
    }
}

pub struct RocksDbHistoryRepository<E> {
    backend: Arc<RocksDBBackend>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Accessionable> RocksDbHistoryRepository<E> {
    pub fn new(backend: Arc<RocksDBBackend>) -> Self {
        Self {
            backend,
            _entity: PhantomData,
        }
    }
}

impl<E: Accessionable> HistoryRepository<E> for RocksDbHistoryRepository<E> {
    fn save(&self, operation: HistoryOperation<E>) -> VarAccResult<()> {
        let cf = self.backend.cf_handle(cf_names::history(E::KIND))?;
        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf,
            history_key(&operation),
            RocksDBBackend::serialize(&operation)?,
        );
        drop(cf);
        self.backend.write(batch)?;
        Ok(())
    }

    fn find_by_accession(&self, accession: Accession) -> VarAccResult<Vec<HistoryOperation<E>>> {
        self.backend
            .scan_prefix(cf_names::history(E::KIND), &accession.to_be_bytes())?
            .into_iter()
            .map(|(_key, value)| RocksDBBackend::deserialize(&value).map_err(VarAccError::from))
            .collect()
    }

    fn scan(
        &self,
        filter: &dyn Fn(&HistoryOperation<E>) -> bool,
    ) -> VarAccResult<Vec<HistoryOperation<E>>> {
        let mut found = Vec::new();
        for value in self.backend.scan_values(cf_names::history(E::KIND))? {
            let operation: HistoryOperation<E> = RocksDBBackend::deserialize(&value)?;
            if filter(&operation) {
                found.push(operation);
            }
        }
        Ok(found)
    }
}
