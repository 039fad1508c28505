//! History operations recorded for every mutation of an accession
//!
//! An operation keeps snapshots ("inactive objects") of the versions it affected, so a
//! merged or deprecated accession can still be reconstructed after its documents are
//! gone from the active collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use varacc_core::{Accession, Sha1Hash, VarAccError, VarAccResult};

use crate::document::AccessionedDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Updated,
    Patched,
    Deprecated,
    Merged,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Updated => write!(f, "UPDATED"),
            EventType::Patched => write!(f, "PATCHED"),
            EventType::Deprecated => write!(f, "DEPRECATED"),
            EventType::Merged => write!(f, "MERGED"),
        }
    }
}

/// Snapshot of one version at the time it stopped being active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InactiveObject<E> {
    pub accession: Accession,
    pub version: u32,
    pub hash: Sha1Hash,
    pub data: E,
    #[serde(rename = "createdDate")]
    pub created_date: DateTime<Utc>,
}

impl<E> From<AccessionedDocument<E>> for InactiveObject<E> {
    fn from(doc: AccessionedDocument<E>) -> Self {
        Self {
            accession: doc.accession,
            version: doc.version,
            hash: doc.hash,
            data: doc.data,
            created_date: doc.created_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryOperation<E> {
    pub id: Uuid,
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    pub accession: Accession,
    #[serde(rename = "mergeInto", default, skip_serializing_if = "Option::is_none")]
    pub merge_into: Option<Accession>,
    pub reason: String,
    #[serde(rename = "inactiveObjects")]
    pub inactive_objects: Vec<InactiveObject<E>>,
    #[serde(rename = "createdDate")]
    pub created_date: DateTime<Utc>,
}

impl<E> HistoryOperation<E> {
    pub fn new(
        event_type: EventType,
        accession: Accession,
        reason: impl Into<String>,
        inactive_objects: Vec<InactiveObject<E>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            accession,
            merge_into: None,
            reason: reason.into(),
            inactive_objects,
            created_date: Utc::now(),
        }
    }

    pub fn merged(
        origin: Accession,
        merge_into: Accession,
        reason: impl Into<String>,
        inactive_objects: Vec<InactiveObject<E>>,
    ) -> Self {
        Self {
            merge_into: Some(merge_into),
            ..Self::new(EventType::Merged, origin, reason, inactive_objects)
        }
    }

    pub fn with_created_date(mut self, created_date: DateTime<Utc>) -> Self {
        self.created_date = created_date;
        self
    }

    /// The only snapshot of a merge or deprecation.
    ///
    /// Any other multiplicity means the record was written inconsistently and cannot be
    /// reconstructed.
    pub fn single_inactive_object(&self) -> VarAccResult<&InactiveObject<E>> {
        match self.inactive_objects.as_slice() {
            [only] => Ok(only),
            objects => Err(VarAccError::IntegrityFault(format!(
                "{} operation {} on accession {} carries {} inactive objects, expected exactly 1",
                self.event_type,
                self.id,
                self.accession,
                objects.len()
            ))),
        }
    }
}
