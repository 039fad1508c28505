//! Test fixtures and data generators

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use varacc_core::{Accession, ClusteredVariant, SubmittedVariant, VariantType};
use varacc_storage::AccessionedDocument;

pub const TEST_ASSEMBLY: &str = "GCA_000001405.15";
pub const TEST_TAXONOMY: u32 = 9606;
pub const TEST_STUDY: &str = "PRJEB0001";

/// Submitted variant on the test assembly in the default study
pub fn submitted(contig: &str, start: u64, reference: &str, alternate: &str) -> SubmittedVariant {
    submitted_in_study(TEST_STUDY, contig, start, reference, alternate)
}

pub fn submitted_in_study(
    study: &str,
    contig: &str,
    start: u64,
    reference: &str,
    alternate: &str,
) -> SubmittedVariant {
    SubmittedVariant::new(
        TEST_ASSEMBLY,
        TEST_TAXONOMY,
        study,
        contig,
        start,
        reference,
        alternate,
    )
}

pub fn clustered(contig: &str, start: u64, variant_type: VariantType) -> ClusteredVariant {
    ClusteredVariant::new(TEST_ASSEMBLY, TEST_TAXONOMY, contig, start, variant_type)
}

/// Pre-accessioned clustered variant as delivered by the legacy import
pub fn legacy_clustered(
    accession: Accession,
    contig: &str,
    start: u64,
    variant_type: VariantType,
) -> AccessionedDocument<ClusteredVariant> {
    AccessionedDocument::new(accession, clustered(contig, start, variant_type))
}

pub fn legacy_submitted(
    accession: Accession,
    variant: SubmittedVariant,
) -> AccessionedDocument<SubmittedVariant> {
    AccessionedDocument::new(accession, variant)
}

/// Deterministic batch of `count` distinct SNVs spread over three contigs.
///
/// Positions repeat across studies so batches contain variants that share a cluster.
pub fn generate_submitted_variants(count: usize, seed: u64) -> Vec<SubmittedVariant> {
    const BASES: [&str; 4] = ["A", "C", "G", "T"];
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|i| {
            let contig = ["1", "2", "X"][i % 3];
            let start = 1_000 + (i as u64 / 2) * 10;
            let reference = BASES[rng.gen_range(0..4)];
            let alternate = BASES
                .iter()
                .copied()
                .filter(|base| *base != reference)
                .nth(rng.gen_range(0..3))
                .unwrap_or("N");
            let study = format!("PRJEB{:04}", i);
            submitted_in_study(&study, contig, start, reference, alternate)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use varacc_core::Accessionable;

    #[test]
    fn test_generated_batch_is_deterministic() {
        let a = generate_submitted_variants(20, 7);
        let b = generate_submitted_variants(20, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_variants_are_distinct_snvs() {
        let batch = generate_submitted_variants(50, 1);
        let hashes: HashSet<_> = batch.iter().map(|v| v.content_hash()).collect();
        assert_eq!(hashes.len(), 50);
        for variant in &batch {
            let candidate = ClusteredVariant::from_submitted(variant).unwrap();
            assert_eq!(candidate.variant_type, VariantType::Snv);
        }
    }
}
