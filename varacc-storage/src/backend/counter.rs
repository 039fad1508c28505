//! Crash-safe accession counter persisted in RocksDB

use parking_lot::Mutex;
use rocksdb::WriteBatch;
use std::sync::Arc;
use tracing::info;
use varacc_core::{Accession, EntityKind, VarAccError, VarAccResult};

use super::rocksdb_backend::{cf_names, RocksDBBackend};
use crate::counter::AccessionCounter;

#[derive(Debug, Clone, Copy)]
struct Block {
    next: Accession,
    end: Accession,
}

/// Counter that reserves accessions in blocks.
///
/// The high-water mark of a block is synced to disk before any value inside it is handed
/// out. After a restart the counter resumes at the stored mark, so values left unused in
/// an interrupted block are skipped rather than reissued.
pub struct BlockReservingCounter {
    backend: Arc<RocksDBBackend>,
    kind: EntityKind,
    block_size: u64,
    first: Accession,
    ceiling: Option<Accession>,
    block: Mutex<Block>,
}

impl BlockReservingCounter {
    pub fn new(backend: Arc<RocksDBBackend>, kind: EntityKind, block_size: u64) -> VarAccResult<Self> {
        if block_size == 0 {
            return Err(VarAccError::Configuration(
                "counter block size must be positive".to_string(),
            ));
        }
        Ok(Self {
            backend,
            kind,
            block_size,
            first: kind.live_threshold(),
            ceiling: None,
            block: Mutex::new(Block { next: 0, end: 0 }),
        })
    }

    /// Refuse to hand out `ceiling` or anything above it
    pub fn with_ceiling(mut self, ceiling: Option<Accession>) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Value a fresh counter starts from (the live threshold unless overridden)
    pub fn starting_at(mut self, first: Accession) -> Self {
        self.first = first;
        self
    }

    fn counter_key(&self) -> &'static [u8] {
        self.kind.prefix().as_bytes()
    }

    /// First value not yet covered by a durable reservation
    pub fn high_water_mark(&self) -> VarAccResult<Option<Accession>> {
        let Some(bytes) = self.backend.get(cf_names::COUNTERS, self.counter_key())? else {
            return Ok(None);
        };
        let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
            VarAccError::IntegrityFault(format!(
                "{} counter holds {} bytes, expected 8",
                self.kind,
                bytes.len()
            ))
        })?;
        Ok(Some(Accession::from_be_bytes(raw)))
    }

    fn reserve_block(&self, block: &mut Block) -> VarAccResult<()> {
        let _guard = self.backend.lock_writes();
        let start = self.high_water_mark()?.unwrap_or(self.first).max(self.first);

        let mut end = start.checked_add(self.block_size).ok_or_else(|| {
            VarAccError::AllocationFailure(format!("{} counter overflow at {}", self.kind, start))
        })?;
        if let Some(ceiling) = self.ceiling {
            if start >= ceiling {
                return Err(VarAccError::AllocationFailure(format!(
                    "{} counter exhausted at {}",
                    self.kind, start
                )));
            }
            end = end.min(ceiling);
        }

        let cf = self.backend.cf_handle(cf_names::COUNTERS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf, self.counter_key(), end.to_be_bytes());
        drop(cf);
        self.backend
            .write_synced(batch)
            .map_err(|e| VarAccError::AllocationFailure(format!("{:#}", e)))?;

        info!(
            "Reserved {} accessions [{}, {}) for {}",
            end - start,
            start,
            end,
            self.kind
        );
        *block = Block { next: start, end };
        Ok(())
    }
}

impl AccessionCounter for BlockReservingCounter {
    fn reserve_next(&self) -> VarAccResult<Accession> {
        let mut block = self.block.lock();
        if block.next >= block.end {
            self.reserve_block(&mut block)?;
        }
        let value = block.next;
        block.next += 1;
        Ok(value)
    }
}
