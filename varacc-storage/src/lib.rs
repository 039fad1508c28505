//! Storage backends for accessioned documents and their history

pub mod backend;
pub mod counter;
pub mod document;
pub mod history;
pub mod memory;
pub mod repository;

pub use backend::{
    BlockReservingCounter, RocksDBBackend, RocksDBConfig, RocksDbAccessionRepository,
    RocksDbHistoryRepository,
};
pub use counter::{AccessionCounter, InMemoryCounter};
pub use document::{AccessionedDocument, InsertOutcome};
pub use history::{EventType, HistoryOperation, InactiveObject};
pub use memory::{InMemoryAccessionRepository, InMemoryHistoryRepository};
pub use repository::{
    AccessionRepository, BulkWriteSummary, DocumentEdit, DocumentUpdate, HistoryRepository,
};
