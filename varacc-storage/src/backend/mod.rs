/// RocksDB-backed repositories and counters
pub mod counter;
pub mod repository;
pub mod rocksdb_backend;

pub use counter::BlockReservingCounter;
pub use repository::{RocksDbAccessionRepository, RocksDbHistoryRepository};
pub use rocksdb_backend::{cf_names, RocksDBBackend, RocksDBConfig};
