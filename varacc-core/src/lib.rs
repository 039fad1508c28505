//! Core utilities and types shared across all varacc crates

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod summary;
pub mod system;
pub mod types;

// Re-export commonly used types
pub use config::{load_config, save_config, Config};
pub use error::{BulkWriteFailure, VarAccError, VarAccResult};
pub use model::{ClusteredVariant, SubmittedVariant};
pub use summary::Accessionable;

pub use types::{
    Accession, EntityKind, Sha1Hash, StoreOrigin, TaxonId, VariantType,
    CLUSTERED_VARIANT_LIVE_THRESHOLD, SUBMITTED_VARIANT_LIVE_THRESHOLD,
};

pub use system::{generate_utc_timestamp, varacc_home};

/// Version information for the varacc project
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
