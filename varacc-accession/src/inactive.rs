//! History recorder for merged, deprecated and superseded versions

use std::sync::Arc;
use tracing::debug;
use varacc_core::{Accession, Accessionable, VarAccError, VarAccResult};
use varacc_storage::{AccessionedDocument, EventType, HistoryOperation, HistoryRepository};

pub struct InactiveService<E: Accessionable> {
    history: Arc<dyn HistoryRepository<E>>,
}

impl<E: Accessionable> Clone for InactiveService<E> {
    fn clone(&self) -> Self {
        Self {
            history: Arc::clone(&self.history),
        }
    }
}

impl<E: Accessionable> InactiveService<E> {
    pub fn new(history: Arc<dyn HistoryRepository<E>>) -> Self {
        Self { history }
    }

    pub fn record(
        &self,
        event_type: EventType,
        accession: Accession,
        reason: &str,
        affected: Vec<AccessionedDocument<E>>,
    ) -> VarAccResult<()> {
        debug!(
            "Recording {} of {} ({} inactive objects)",
            event_type,
            E::KIND.external_id(accession),
            affected.len()
        );
        let inactive = affected.into_iter().map(Into::into).collect();
        self.history
            .save(HistoryOperation::new(event_type, accession, reason, inactive))
    }

    pub fn record_merge(
        &self,
        origin: Accession,
        merge_into: Accession,
        reason: &str,
        affected: Vec<AccessionedDocument<E>>,
    ) -> VarAccResult<()> {
        debug!(
            "Recording merge of {} into {}",
            E::KIND.external_id(origin),
            E::KIND.external_id(merge_into)
        );
        let inactive = affected.into_iter().map(Into::into).collect();
        self.history.save(HistoryOperation::merged(
            origin, merge_into, reason, inactive,
        ))
    }

    pub fn history(&self, accession: Accession) -> VarAccResult<Vec<HistoryOperation<E>>> {
        self.history.find_by_accession(accession)
    }

    /// Every merge whose snapshot satisfies `filter`
    pub fn merges(
        &self,
        filter: &dyn Fn(&HistoryOperation<E>) -> bool,
    ) -> VarAccResult<Vec<HistoryOperation<E>>> {
        self.history
            .scan(&|op: &HistoryOperation<E>| op.event_type == EventType::Merged && filter(op))
    }

    /// Why `accession` has no active documents
    pub fn missing_accession_error(&self, accession: Accession) -> VarAccError {
        match self.history.latest(accession) {
            Ok(Some(op)) => match (op.event_type, op.merge_into) {
                (EventType::Merged, Some(destination)) => VarAccError::AccessionMerged {
                    origin: accession,
                    destination,
                },
                (EventType::Deprecated, _) => VarAccError::AccessionDeprecated(accession),
                _ => VarAccError::AccessionDoesNotExist(accession),
            },
            Ok(None) => VarAccError::AccessionDoesNotExist(accession),
            Err(e) => e,
        }
    }
}
