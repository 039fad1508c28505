//! Context-nucleotide normalization of release variants
//!
//! Variants with an empty allele get one reference base added to both alleles: the base
//! before the variant when there is one, otherwise the base after the reference allele.

use std::collections::HashMap;
use varacc_core::{VarAccError, VarAccResult};

use super::variant::Variant;

/// Reference sequence lookup, 1-based and inclusive
pub trait ReferenceSequenceSource: Send + Sync {
    fn contains_contig(&self, contig: &str) -> bool;

    fn sequence(&self, contig: &str, start: u64, end: u64) -> VarAccResult<String>;
}

/// Reference held in memory, one string per contig
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceSource {
    contigs: HashMap<String, String>,
}

impl InMemoryReferenceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contig(mut self, name: impl Into<String>, sequence: impl Into<String>) -> Self {
        self.contigs.insert(name.into(), sequence.into());
        self
    }
}

impl ReferenceSequenceSource for InMemoryReferenceSource {
    fn contains_contig(&self, contig: &str) -> bool {
        self.contigs.contains_key(contig)
    }

    fn sequence(&self, contig: &str, start: u64, end: u64) -> VarAccResult<String> {
        let bases = self.contigs.get(contig).ok_or_else(|| {
            VarAccError::UpstreamDataFault(format!("contig '{}' is not in the reference", contig))
        })?;
        if start == 0 || end < start || end > bases.len() as u64 {
            return Err(VarAccError::UpstreamDataFault(format!(
                "{}:{}-{} is outside the reference ({} bases)",
                contig,
                start,
                end,
                bases.len()
            )));
        }
        bases
            .get((start - 1) as usize..end as usize)
            .map(str::to_string)
            .ok_or_else(|| {
                VarAccError::UpstreamDataFault(format!("{}:{}-{} is not ASCII", contig, start, end))
            })
    }
}

pub struct ContextNucleotideProcessor<S> {
    source: S,
}

impl<S: ReferenceSequenceSource> ContextNucleotideProcessor<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn process(&self, mut variant: Variant) -> VarAccResult<Variant> {
        if !self.source.contains_contig(&variant.contig) {
            return Err(VarAccError::UpstreamDataFault(format!(
                "contig '{}' does not appear in the reference",
                variant.contig
            )));
        }
        if !variant.reference.is_empty() && !variant.alternate.is_empty() {
            return Ok(variant);
        }

        let (start, reference, alternate) = if variant.start > 1 {
            let start = variant.start - 1;
            let base = self.source.sequence(&variant.contig, start, start)?;
            (
                start,
                format!("{}{}", base, variant.reference),
                format!("{}{}", base, variant.alternate),
            )
        } else {
            let position = variant.start + variant.reference.len() as u64;
            let base = self.source.sequence(&variant.contig, position, position)?;
            (
                variant.start,
                format!("{}{}", variant.reference, base),
                format!("{}{}", variant.alternate, base),
            )
        };

        let end = start + reference.len().max(alternate.len()) as u64 - 1;
        variant.renormalize(start, end, reference, alternate);
        Ok(variant)
    }
}
