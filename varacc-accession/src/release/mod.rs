/// Release generation: merge reconstruction and allele normalization
pub mod context;
pub mod merged_reader;
pub mod variant;

pub use context::{ContextNucleotideProcessor, InMemoryReferenceSource, ReferenceSequenceSource};
pub use merged_reader::MergedVariantReader;
pub use variant::{
    end_position, variant_key, Variant, VariantSourceEntry, CLUSTERED_VARIANT_VALIDATED_KEY,
    MERGED_INTO_KEY, PLACEHOLDER_ALTERNATE, PLACEHOLDER_REFERENCE, VARIANT_CLASS_KEY,
};
