//! Opening both RocksDB stores and wiring the services over them

use std::sync::Arc;
use varacc_accession::{
    AccessioningService, DualStoreAccessioningService, InactiveService, StorePair,
};
use varacc_core::{Accessionable, Config, VarAccError, VarAccResult};
use varacc_storage::{
    AccessionRepository, BlockReservingCounter, RocksDBBackend, RocksDbAccessionRepository,
    RocksDbHistoryRepository,
};

pub struct Stores {
    pub legacy: Arc<RocksDBBackend>,
    pub live: Arc<RocksDBBackend>,
    block_size: u64,
    max_accession: Option<u64>,
}

impl Stores {
    pub fn open(config: &Config) -> VarAccResult<Self> {
        let legacy_path = config.storage.legacy_path();
        let live_path = config.storage.live_path();
        if legacy_path == live_path {
            return Err(VarAccError::Configuration(format!(
                "legacy and live stores must be different directories ({})",
                live_path.display()
            )));
        }

        Ok(Self {
            legacy: Arc::new(RocksDBBackend::open(&config.storage, &legacy_path)?),
            live: Arc::new(RocksDBBackend::open(&config.storage, &live_path)?),
            block_size: config.accessioning.block_size,
            max_accession: config.accessioning.max_accession,
        })
    }

    pub fn repositories<E: Accessionable>(&self) -> StorePair<Arc<dyn AccessionRepository<E>>> {
        let legacy: Arc<dyn AccessionRepository<E>> =
            Arc::new(RocksDbAccessionRepository::<E>::new(self.legacy.clone()));
        let live: Arc<dyn AccessionRepository<E>> =
            Arc::new(RocksDbAccessionRepository::<E>::new(self.live.clone()));
        StorePair::new(legacy, live)
    }

    pub fn histories<E: Accessionable>(&self) -> StorePair<InactiveService<E>> {
        StorePair::new(
            InactiveService::new(Arc::new(RocksDbHistoryRepository::<E>::new(self.legacy.clone()))),
            InactiveService::new(Arc::new(RocksDbHistoryRepository::<E>::new(self.live.clone()))),
        )
    }

    /// Router over both stores; new accessions come from the live store's counter
    pub fn accessioner<E: Accessionable>(&self) -> VarAccResult<DualStoreAccessioningService<E>> {
        let repositories = self.repositories::<E>();
        let histories = self.histories::<E>();
        let counter = BlockReservingCounter::new(self.live.clone(), E::KIND, self.block_size)?
            .with_ceiling(self.max_accession);

        Ok(DualStoreAccessioningService::new(
            AccessioningService::legacy(repositories.legacy, histories.legacy),
            AccessioningService::live(repositories.live, histories.live, Arc::new(counter)),
        ))
    }

    pub fn flush(&self) -> VarAccResult<()> {
        self.legacy.flush()?;
        self.live.flush()?;
        Ok(())
    }
}
