//! Reconstruction of merged clustered variants for release
//!
//! The reader selects every merge whose inactive snapshot is on the target assembly,
//! orders them by position and hands out one group per `(contig, start)`. Inside a group
//! operations whose alleles agree are coalesced into a single variant carrying one
//! annotation per operation.

use std::collections::{HashMap, HashSet};
use std::iter::Peekable;
use std::sync::Arc;
use std::vec::IntoIter;
use tracing::{debug, error, info};
use varacc_core::{
    Accession, Accessionable, ClusteredVariant, SubmittedVariant, VarAccError, VarAccResult,
};
use varacc_storage::{AccessionRepository, AccessionedDocument, HistoryOperation};

use super::variant::{
    end_position, variant_key, Variant, VariantSourceEntry, PLACEHOLDER_ALTERNATE,
    PLACEHOLDER_REFERENCE,
};
use crate::inactive::InactiveService;
use crate::routing::StorePair;

type MergeOperation = HistoryOperation<ClusteredVariant>;

fn merge_position(operation: &MergeOperation) -> Option<(String, u64)> {
    operation
        .inactive_objects
        .first()
        .map(|object| (object.data.contig.clone(), object.data.start))
}

struct MergeCursor {
    operations: Peekable<IntoIter<MergeOperation>>,
    submitted_by_cluster: HashMap<Accession, Vec<SubmittedVariant>>,
}

impl MergeCursor {
    /// Next run of operations sharing one position
    fn next_group(&mut self) -> Option<Vec<MergeOperation>> {
        let first = self.operations.next()?;
        let position = merge_position(&first);
        let mut group = vec![first];
        while let Some(next) = self
            .operations
            .next_if(|operation| merge_position(operation) == position)
        {
            group.push(next);
        }
        Some(group)
    }

    fn build_variants(&self, group: &[MergeOperation]) -> VarAccResult<Vec<Variant>> {
        let mut variants: Vec<Variant> = Vec::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();

        for operation in group {
            let snapshot = &operation.single_inactive_object()?.data;
            let merge_into = operation.merge_into.ok_or_else(|| {
                VarAccError::IntegrityFault(format!(
                    "merge operation {} on {} has no destination",
                    operation.id,
                    ClusteredVariant::KIND.external_id(operation.accession)
                ))
            })?;

            let alleles: Vec<(String, String, Option<String>)> =
                match self.submitted_by_cluster.get(&merge_into) {
                    Some(joined) if !joined.is_empty() => joined
                        .iter()
                        .map(|submitted| {
                            (
                                submitted.reference_allele.clone(),
                                submitted.alternate_allele.clone(),
                                Some(submitted.project_accession.clone()),
                            )
                        })
                        .collect(),
                    _ => vec![(
                        PLACEHOLDER_REFERENCE.to_string(),
                        PLACEHOLDER_ALTERNATE.to_string(),
                        None,
                    )],
                };

            // One annotation per operation and allele pair, whatever the number of studies
            let mut annotated: HashSet<String> = HashSet::new();
            for (reference, alternate, study) in alleles {
                let key = variant_key(&snapshot.contig, snapshot.start, &reference, &alternate);
                if !annotated.insert(key.clone()) {
                    continue;
                }
                let entry = VariantSourceEntry::merged(
                    study,
                    snapshot.variant_type,
                    snapshot.validated,
                    merge_into,
                );
                match by_key.get(&key) {
                    Some(&index) => variants[index].source_entries.push(entry),
                    None => {
                        let end = end_position(snapshot.start, &reference, &alternate);
                        let mut variant =
                            Variant::new(&snapshot.contig, snapshot.start, end, reference, alternate)
                                .with_main_id(
                                    ClusteredVariant::KIND.external_id(operation.accession),
                                );
                        variant.source_entries.push(entry);
                        by_key.insert(key, variants.len());
                        variants.push(variant);
                    }
                }
            }
        }

        Ok(variants)
    }
}

enum ReaderState {
    Unopened,
    Open(MergeCursor),
    Closed,
}

/// Forward-only reader over merged clustered variants of one assembly.
///
/// `open` loads and orders the merge operations, every `read` returns the variants at the
/// next position, and `close` releases the cursor. A closed reader cannot be reopened.
pub struct MergedVariantReader {
    history: StorePair<InactiveService<ClusteredVariant>>,
    submitted: StorePair<Arc<dyn AccessionRepository<SubmittedVariant>>>,
    assembly_accession: String,
    state: ReaderState,
}

impl MergedVariantReader {
    pub fn new(
        history: StorePair<InactiveService<ClusteredVariant>>,
        submitted: StorePair<Arc<dyn AccessionRepository<SubmittedVariant>>>,
        assembly_accession: impl Into<String>,
    ) -> Self {
        Self {
            history,
            submitted,
            assembly_accession: assembly_accession.into(),
            state: ReaderState::Unopened,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ReaderState::Open(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, ReaderState::Closed)
    }

    pub fn open(&mut self) -> VarAccResult<()> {
        match self.state {
            ReaderState::Unopened => {}
            ReaderState::Open(_) => {
                return Err(VarAccError::InvalidInput(
                    "merged variant reader is already open".to_string(),
                ))
            }
            ReaderState::Closed => {
                return Err(VarAccError::InvalidInput(
                    "merged variant reader cannot be reopened".to_string(),
                ))
            }
        }

        let assembly = self.assembly_accession.as_str();
        let mut operations = Vec::new();
        for (origin, inactive) in self.history.iter() {
            let found = inactive.merges(&|operation: &MergeOperation| {
                operation
                    .inactive_objects
                    .iter()
                    .any(|object| object.data.assembly_accession == assembly)
            })?;
            debug!("{} merge operations on {} in the {} store", found.len(), assembly, origin);
            operations.extend(found);
        }
        operations.sort_by(|a, b| {
            merge_position(a)
                .cmp(&merge_position(b))
                .then(a.created_date.cmp(&b.created_date))
                .then(a.accession.cmp(&b.accession))
        });

        let targets: HashSet<Accession> =
            operations.iter().filter_map(|operation| operation.merge_into).collect();
        let mut submitted_by_cluster: HashMap<Accession, Vec<SubmittedVariant>> = HashMap::new();
        for (_, repository) in self.submitted.iter() {
            let joined = repository.scan(&|document: &AccessionedDocument<SubmittedVariant>| {
                document.data.assembly_accession == assembly
                    && document
                        .data
                        .clustered_variant_accession
                        .is_some_and(|rs| targets.contains(&rs))
            })?;
            for document in joined {
                if let Some(rs) = document.data.clustered_variant_accession {
                    submitted_by_cluster.entry(rs).or_default().push(document.data);
                }
            }
        }

        info!(
            "Opened merged variant reader for {}: {} merge operations, {} joined clusters",
            assembly,
            operations.len(),
            submitted_by_cluster.len()
        );
        self.state = ReaderState::Open(MergeCursor {
            operations: operations.into_iter().peekable(),
            submitted_by_cluster,
        });
        Ok(())
    }

    /// Variants at the next position, or `None` once the operations are exhausted.
    ///
    /// An integrity fault closes the reader before it is returned.
    pub fn read(&mut self) -> VarAccResult<Option<Vec<Variant>>> {
        let cursor = match &mut self.state {
            ReaderState::Open(cursor) => cursor,
            ReaderState::Unopened => {
                return Err(VarAccError::InvalidInput(
                    "merged variant reader must be opened before reading".to_string(),
                ))
            }
            ReaderState::Closed => return Ok(None),
        };

        let Some(group) = cursor.next_group() else {
            self.close();
            return Ok(None);
        };

        match cursor.build_variants(&group) {
            Ok(variants) => Ok(Some(variants)),
            Err(e) => {
                error!("Aborting merged variant reconstruction: {}", e);
                self.close();
                Err(e)
            }
        }
    }

    pub fn close(&mut self) {
        if let ReaderState::Open(_) = self.state {
            debug!("Closing merged variant reader for {}", self.assembly_accession);
        }
        self.state = ReaderState::Closed;
    }
}

impl Iterator for MergedVariantReader {
    type Item = VarAccResult<Vec<Variant>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

impl Drop for MergedVariantReader {
    fn drop(&mut self) {
        self.close();
    }
}
