/// Taxonomy identifier carried by every variant
use serde::{Deserialize, Serialize};
use std::fmt;

/// NCBI taxonomy ID - newtype pattern for type safety
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TaxonId(pub u32);

impl TaxonId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TaxonId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<TaxonId> for u32 {
    fn from(taxon: TaxonId) -> Self {
        taxon.0
    }
}
