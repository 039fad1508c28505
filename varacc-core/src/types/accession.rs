/// Accession numbers and the legacy/live range partition
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable numeric identifier assigned to a deduplicated entity
pub type Accession = u64;

/// First clustered-variant accession issued by the live store
pub const CLUSTERED_VARIANT_LIVE_THRESHOLD: Accession = 3_000_000_000;

/// First submitted-variant accession issued by the live store
pub const SUBMITTED_VARIANT_LIVE_THRESHOLD: Accession = 5_000_000_000;

/// Kinds of accessioned entities. Each kind owns its own accession space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// De-duplicated variant cluster ("rs")
    ClusteredVariant,
    /// A contributor's original variant record ("ss")
    SubmittedVariant,
}

/// Which of the two physical stores owns an accession
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreOrigin {
    /// Frozen range populated once by the external import
    Legacy,
    /// Range extended by this system
    Live,
}

impl EntityKind {
    /// Accessions at or above this value belong to the live store
    pub const fn live_threshold(self) -> Accession {
        match self {
            EntityKind::ClusteredVariant => CLUSTERED_VARIANT_LIVE_THRESHOLD,
            EntityKind::SubmittedVariant => SUBMITTED_VARIANT_LIVE_THRESHOLD,
        }
    }

    pub const fn prefix(self) -> &'static str {
        match self {
            EntityKind::ClusteredVariant => "rs",
            EntityKind::SubmittedVariant => "ss",
        }
    }

    /// Pure routing predicate shared by every component that partitions by range
    pub const fn store_origin(self, accession: Accession) -> StoreOrigin {
        if accession >= self.live_threshold() {
            StoreOrigin::Live
        } else {
            StoreOrigin::Legacy
        }
    }

    /// External identifier such as `rs3000000012`
    pub fn external_id(self, accession: Accession) -> String {
        format!("{}{}", self.prefix(), accession)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::ClusteredVariant => write!(f, "clustered variant"),
            EntityKind::SubmittedVariant => write!(f, "submitted variant"),
        }
    }
}

impl fmt::Display for StoreOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOrigin::Legacy => write!(f, "legacy"),
            StoreOrigin::Live => write!(f, "live"),
        }
    }
}
