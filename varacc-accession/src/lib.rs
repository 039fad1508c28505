//! Variant accessioning and clustering
//!
//! Accessions are assigned by content hash across two stores: a frozen legacy range
//! populated once by an import, and a live range this system extends. On top of that sit
//! the batch writers (clustering, legacy import, deprecation) and the release-side merge
//! reconstruction reader.

pub mod clustering;
pub mod deprecation;
pub mod inactive;
pub mod legacy_import;
pub mod release;
pub mod router;
pub mod routing;
pub mod service;

pub use clustering::{ClusteringReport, ClusteringWriter};
pub use deprecation::{DeprecationReport, DeprecationWriter};
pub use inactive::InactiveService;
pub use legacy_import::LegacyImportWriter;
pub use release::{
    ContextNucleotideProcessor, InMemoryReferenceSource, MergedVariantReader,
    ReferenceSequenceSource, Variant, VariantSourceEntry,
};
pub use router::DualStoreAccessioningService;
pub use routing::StorePair;
pub use service::{AccessioningService, Accessioner, AssignedAccession};
