/// Core types shared across all varacc crates
pub mod accession;
pub mod hash;
pub mod taxonomy;
pub mod variant;

pub use accession::{
    Accession, EntityKind, StoreOrigin, CLUSTERED_VARIANT_LIVE_THRESHOLD,
    SUBMITTED_VARIANT_LIVE_THRESHOLD,
};
pub use hash::Sha1Hash;
pub use taxonomy::TaxonId;
pub use variant::VariantType;
