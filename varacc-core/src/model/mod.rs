//! Accessioned entities

pub mod clustered;
pub mod submitted;

pub use clustered::ClusteredVariant;
pub use submitted::SubmittedVariant;
