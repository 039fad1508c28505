/// Clustering writer behaviour against in-memory stores
mod common;

use common::Services;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use varacc_accession::{AssignedAccession, Accessioner, ClusteringWriter, StorePair};
use varacc_core::{
    Accession, Accessionable, ClusteredVariant, StoreOrigin, SubmittedVariant, VarAccError,
    VarAccResult, VariantType,
};
use varacc_storage::{
    AccessionRepository, AccessionedDocument, InMemoryAccessionRepository, InsertOutcome,
};
use varacc_test::assertions::assert_one_accession_per_hash;
use varacc_test::{
    generate_submitted_variants, legacy_clustered, legacy_submitted, submitted,
    submitted_in_study, StoreHarness, TEST_ASSEMBLY,
};

fn back_reference(
    repository: &InMemoryAccessionRepository<SubmittedVariant>,
    document: &AccessionedDocument<SubmittedVariant>,
) -> Option<Accession> {
    repository
        .find_by_hashes(&[document.hash])
        .unwrap()
        .pop()
        .and_then(|d| d.data.clustered_variant_accession)
}

#[test]
fn test_same_locus_in_two_studies_shares_one_cluster() {
    let services = Services::default();
    let batch = services
        .harness
        .insert_live_submitted([
            submitted_in_study("PRJEB1", "1", 100, "A", "T"),
            submitted_in_study("PRJEB2", "1", 100, "A", "T"),
        ])
        .unwrap();

    let report = services.clustering_writer().write(&batch).unwrap();

    assert_eq!(report.submitted_variants, 2);
    assert_eq!(report.distinct_clusters, 1);
    assert_eq!(report.new_clusters, 1);
    assert_eq!(report.back_references_written, 2);
    assert_eq!(services.harness.live_clustered.count().unwrap(), 1);

    let live = &services.harness.live_submitted;
    assert_eq!(back_reference(live, &batch[0]), Some(3_000_000_000));
    assert_eq!(back_reference(live, &batch[1]), Some(3_000_000_000));
}

#[test]
fn test_back_references_are_written_to_both_submitted_stores() {
    let harness = StoreHarness::new();
    let old = legacy_submitted(12, submitted("7", 500, "C", "G"));
    harness.import_legacy_submitted([old.clone()]).unwrap();
    harness
        .import_legacy_clustered([legacy_clustered(40, "7", 500, VariantType::Snv)])
        .unwrap();
    let services = Services::new(harness);
    let new = services
        .harness
        .insert_live_submitted([submitted("7", 600, "C", "G")])
        .unwrap();

    let batch = vec![old.clone(), new[0].clone()];
    let report = services.clustering_writer().write(&batch).unwrap();

    assert_eq!(report.distinct_clusters, 2);
    assert_eq!(report.new_clusters, 1);
    assert_eq!(report.back_references_written, 2);
    assert_eq!(back_reference(&services.harness.legacy_submitted, &old), Some(40));
    assert_eq!(
        back_reference(&services.harness.live_submitted, &new[0]),
        Some(3_000_000_000)
    );
}

#[test]
fn test_reclustering_a_batch_is_stable() {
    let services = Services::default();
    let batch = services
        .harness
        .insert_live_submitted(generate_submitted_variants(30, 11))
        .unwrap();
    let writer = services.clustering_writer();

    let first = writer.write(&batch).unwrap();
    let clusters_after_first = services.harness.live_clustered.count().unwrap();
    let second = writer.write(&batch).unwrap();

    assert_eq!(first.distinct_clusters, second.distinct_clusters);
    assert_eq!(second.new_clusters, 0);
    assert_eq!(services.harness.live_clustered.count().unwrap(), clusters_after_first);
    assert_one_accession_per_hash::<ClusteredVariant>(&[
        &services.harness.legacy_clustered,
        &services.harness.live_clustered,
    ]);
}

#[test]
fn test_generated_batch_clusters_by_position() {
    let services = Services::default();
    let batch = services
        .harness
        .insert_live_submitted(generate_submitted_variants(12, 3))
        .unwrap();

    let report = services.clustering_writer().write(&batch).unwrap();
    assert_eq!(report.submitted_variants, 12);
    assert!(report.distinct_clusters <= 12);
    assert_eq!(report.back_references_written, 12);
    for document in &batch {
        let rs = back_reference(&services.harness.live_submitted, document).unwrap();
        let cluster = services.clustered.get_by_accession(rs).unwrap();
        assert_eq!(cluster.data.contig, document.data.contig);
        assert_eq!(cluster.data.start, document.data.start);
    }
}

#[test]
fn test_other_assembly_is_rejected() {
    let services = Services::default();
    let foreign = SubmittedVariant::new("GCA_999", 9606, "PRJEB1", "1", 1, "A", "T");
    let batch = services.harness.insert_live_submitted([foreign]).unwrap();

    let err = services.clustering_writer().write(&batch).unwrap_err();
    assert!(matches!(err, VarAccError::InvalidInput(_)));
    assert_eq!(services.harness.live_clustered.count().unwrap(), 0);
}

#[test]
fn test_empty_batch_is_a_no_op() {
    let services = Services::default();
    let report = services.clustering_writer().write(&[]).unwrap();
    assert_eq!(report.submitted_variants, 0);
    assert!(services.harness.live_clustered.calls().is_empty());
}

/// Accessioner that loses every result
struct ForgetfulAccessioner;

impl Accessioner<ClusteredVariant> for ForgetfulAccessioner {
    fn get(&self, _: &[ClusteredVariant]) -> VarAccResult<Vec<AssignedAccession<ClusteredVariant>>> {
        Ok(Vec::new())
    }

    fn get_or_create(
        &self,
        _: &[ClusteredVariant],
    ) -> VarAccResult<Vec<AssignedAccession<ClusteredVariant>>> {
        Ok(Vec::new())
    }

    fn get_by_accession(&self, accession: Accession) -> VarAccResult<AccessionedDocument<ClusteredVariant>> {
        Err(VarAccError::AccessionDoesNotExist(accession))
    }

    fn get_by_accessions(&self, _: &[Accession]) -> VarAccResult<Vec<AccessionedDocument<ClusteredVariant>>> {
        Ok(Vec::new())
    }

    fn get_by_accession_and_version(
        &self,
        accession: Accession,
        _: u32,
    ) -> VarAccResult<AccessionedDocument<ClusteredVariant>> {
        Err(VarAccError::AccessionDoesNotExist(accession))
    }

    fn update(
        &self,
        accession: Accession,
        _: u32,
        _: ClusteredVariant,
    ) -> VarAccResult<AccessionedDocument<ClusteredVariant>> {
        Err(VarAccError::AccessionDoesNotExist(accession))
    }

    fn patch(&self, accession: Accession, _: ClusteredVariant) -> VarAccResult<AccessionedDocument<ClusteredVariant>> {
        Err(VarAccError::AccessionDoesNotExist(accession))
    }

    fn deprecate(&self, accession: Accession, _: &str) -> VarAccResult<()> {
        Err(VarAccError::AccessionDoesNotExist(accession))
    }

    fn merge(&self, origin: Accession, _: Accession, _: &str) -> VarAccResult<()> {
        Err(VarAccError::AccessionDoesNotExist(origin))
    }
}

#[test]
fn test_missing_accession_for_candidate_is_an_integrity_fault() {
    let services = Services::default();
    let batch = services
        .harness
        .insert_live_submitted([submitted("1", 100, "A", "T")])
        .unwrap();
    let writer = ClusteringWriter::new(
        Arc::new(ForgetfulAccessioner),
        services.submitted_stores(),
        TEST_ASSEMBLY,
    );

    let err = writer.write(&batch).unwrap_err();
    assert!(matches!(err, VarAccError::IntegrityFault(_)));
    assert_eq!(back_reference(&services.harness.live_submitted, &batch[0]), None);
}

/// Submitted store whose in-place edits always fail
struct ReadOnlyDisk(InMemoryAccessionRepository<SubmittedVariant>);

impl AccessionRepository<SubmittedVariant> for ReadOnlyDisk {
    fn find_by_hashes(
        &self,
        hashes: &[varacc_core::Sha1Hash],
    ) -> VarAccResult<Vec<AccessionedDocument<SubmittedVariant>>> {
        self.0.find_by_hashes(hashes)
    }

    fn find_by_accession(&self, accession: Accession) -> VarAccResult<Vec<AccessionedDocument<SubmittedVariant>>> {
        self.0.find_by_accession(accession)
    }

    fn insert_if_absent(&self, document: AccessionedDocument<SubmittedVariant>) -> VarAccResult<InsertOutcome> {
        self.0.insert_if_absent(document)
    }

    fn replace(
        &self,
        previous: &varacc_core::Sha1Hash,
        document: AccessionedDocument<SubmittedVariant>,
    ) -> VarAccResult<InsertOutcome> {
        self.0.replace(previous, document)
    }

    fn retire_accession(&self, accession: Accession) -> VarAccResult<Vec<AccessionedDocument<SubmittedVariant>>> {
        self.0.retire_accession(accession)
    }

    fn find_retired(&self, accession: Accession) -> VarAccResult<Vec<AccessionedDocument<SubmittedVariant>>> {
        self.0.find_retired(accession)
    }

    fn modify(
        &self,
        _: &varacc_core::Sha1Hash,
        _: &(dyn Fn(&mut SubmittedVariant) + Send + Sync),
    ) -> VarAccResult<bool> {
        Err(VarAccError::Storage("read-only file system".to_string()))
    }

    fn scan(
        &self,
        filter: &dyn Fn(&AccessionedDocument<SubmittedVariant>) -> bool,
    ) -> VarAccResult<Vec<AccessionedDocument<SubmittedVariant>>> {
        self.0.scan(filter)
    }

    fn count(&self) -> VarAccResult<usize> {
        self.0.count()
    }
}

#[test]
fn test_failed_back_references_are_aggregated_after_both_stores_are_attempted() {
    let harness = StoreHarness::new();
    let old = legacy_submitted(12, submitted("7", 500, "C", "G"));
    harness.import_legacy_submitted([old.clone()]).unwrap();
    let services = Services::new(harness);
    let new = services
        .harness
        .insert_live_submitted([submitted("7", 600, "C", "G"), submitted("7", 700, "C", "G")])
        .unwrap();

    let stores: StorePair<Arc<dyn AccessionRepository<SubmittedVariant>>> = StorePair::new(
        Arc::new(ReadOnlyDisk(services.harness.legacy_submitted.clone())),
        Arc::new(ReadOnlyDisk(services.harness.live_submitted.clone())),
    );
    let writer = ClusteringWriter::new(services.clustered.clone(), stores, TEST_ASSEMBLY);

    let batch = vec![old, new[0].clone(), new[1].clone()];
    match writer.write(&batch).unwrap_err() {
        VarAccError::BulkWrite {
            attempted,
            failures,
        } => {
            assert_eq!(attempted, 3);
            assert_eq!(failures.len(), 3);
        }
        other => panic!("unexpected error: {other}"),
    }
    // Clusters created before the failure stay created
    assert_eq!(services.harness.live_clustered.count().unwrap(), 3);
}

#[test]
fn test_cluster_origin_follows_store() {
    let harness = StoreHarness::new();
    harness
        .import_legacy_clustered([legacy_clustered(40, "7", 500, VariantType::Snv)])
        .unwrap();
    let services = Services::new(harness);
    let assigned = services
        .clustered
        .get(&[ClusteredVariant::from_submitted(&submitted("7", 500, "C", "G")).unwrap()])
        .unwrap();
    assert_eq!(assigned[0].origin, StoreOrigin::Legacy);
    assert_eq!(assigned[0].data.content_hash(), assigned[0].hash);
}
