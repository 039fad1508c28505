//! Canonical summaries and content hashing.
//!
//! The summary text of each entity kind is a storage contract: hashes already
//! persisted were computed from it, so the field order, separators and number
//! formatting below may only change together with a data migration.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{EntityKind, Sha1Hash};

/// Separator between summary fields
pub const SUMMARY_SEPARATOR: &str = "_";

/// An entity that can be assigned an accession.
pub trait Accessionable:
    Clone + std::fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Accession space this entity lives in
    const KIND: EntityKind;

    /// Canonical text built from the identity-defining fields only
    fn summary(&self) -> String;

    /// SHA-1 of the canonical summary
    fn content_hash(&self) -> Sha1Hash {
        Sha1Hash::compute(self.summary().as_bytes())
    }
}

/// Join already-rendered fields with the summary separator
pub(crate) fn join_fields(fields: &[&dyn std::fmt::Display]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR)
}
