/// Accessioned documents as persisted by every repository
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use varacc_core::{Accession, Accessionable, EntityKind, Sha1Hash};

/// One stored version of an accessioned entity.
///
/// `hash` is unique across every version held by a store; `(accession, version)` is the
/// primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessionedDocument<E> {
    pub accession: Accession,
    pub version: u32,
    pub hash: Sha1Hash,
    pub data: E,
    #[serde(rename = "createdDate")]
    pub created_date: DateTime<Utc>,
}

impl<E: Accessionable> AccessionedDocument<E> {
    /// First version of `data` under `accession`, hashed from its summary
    pub fn new(accession: Accession, data: E) -> Self {
        Self {
            accession,
            version: 1,
            hash: data.content_hash(),
            data,
            created_date: Utc::now(),
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn kind(&self) -> EntityKind {
        E::KIND
    }

    pub fn external_id(&self) -> String {
        E::KIND.external_id(self.accession)
    }
}

/// Result of a guarded insert into a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The hash is already stored; carries the accession that owns it
    HashExists(Accession),
}
