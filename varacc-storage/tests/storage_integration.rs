/// Integration tests for the RocksDB repositories and counters
///
/// Legacy and live stores are separate databases; these tests open them side by side the
/// way the accessioning service does.
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use varacc_core::config::StorageConfig;
use varacc_core::{
    Accessionable, ClusteredVariant, EntityKind, SubmittedVariant, VariantType,
    CLUSTERED_VARIANT_LIVE_THRESHOLD, SUBMITTED_VARIANT_LIVE_THRESHOLD,
};
use varacc_storage::{
    AccessionCounter, AccessionRepository, AccessionedDocument, BlockReservingCounter,
    DocumentUpdate, InsertOutcome, RocksDBBackend, RocksDbAccessionRepository,
};

struct TwoStores {
    _dir: TempDir,
    legacy: Arc<RocksDBBackend>,
    live: Arc<RocksDBBackend>,
}

fn open_stores() -> TwoStores {
    let dir = TempDir::new().unwrap();
    let storage = StorageConfig::default();
    let legacy = Arc::new(RocksDBBackend::open(&storage, &dir.path().join("legacy")).unwrap());
    let live = Arc::new(RocksDBBackend::open(&storage, &dir.path().join("live")).unwrap());
    TwoStores {
        _dir: dir,
        legacy,
        live,
    }
}

fn cluster(start: u64) -> ClusteredVariant {
    ClusteredVariant::new("GCA_000001405.15", 9606, "1", start, VariantType::Snv)
}

#[test]
fn stores_are_isolated() {
    let stores = open_stores();
    let legacy = RocksDbAccessionRepository::<ClusteredVariant>::new(Arc::clone(&stores.legacy));
    let live = RocksDbAccessionRepository::<ClusteredVariant>::new(Arc::clone(&stores.live));

    legacy
        .insert_if_absent(AccessionedDocument::new(10, cluster(100)))
        .unwrap();

    // The same hash is still free in the other store
    let outcome = live
        .insert_if_absent(AccessionedDocument::new(
            CLUSTERED_VARIANT_LIVE_THRESHOLD,
            cluster(100),
        ))
        .unwrap();
    assert_eq!(outcome, InsertOutcome::Inserted);

    assert_eq!(legacy.find_by_accession(10).unwrap().len(), 1);
    assert!(live.find_by_accession(10).unwrap().is_empty());
    assert_eq!(stores.legacy.document_count(EntityKind::ClusteredVariant).unwrap(), 1);
    assert_eq!(stores.live.document_count(EntityKind::ClusteredVariant).unwrap(), 1);
}

#[test]
fn counters_are_independent_per_kind() {
    let stores = open_stores();
    let rs = BlockReservingCounter::new(Arc::clone(&stores.live), EntityKind::ClusteredVariant, 10)
        .unwrap();
    let ss = BlockReservingCounter::new(Arc::clone(&stores.live), EntityKind::SubmittedVariant, 10)
        .unwrap();

    assert_eq!(rs.reserve_next().unwrap(), CLUSTERED_VARIANT_LIVE_THRESHOLD);
    assert_eq!(ss.reserve_next().unwrap(), SUBMITTED_VARIANT_LIVE_THRESHOLD);
    assert_eq!(rs.reserve_next().unwrap(), CLUSTERED_VARIANT_LIVE_THRESHOLD + 1);

    assert_eq!(
        rs.high_water_mark().unwrap(),
        Some(CLUSTERED_VARIANT_LIVE_THRESHOLD + 10)
    );
    assert_eq!(
        ss.high_water_mark().unwrap(),
        Some(SUBMITTED_VARIANT_LIVE_THRESHOLD + 10)
    );
}

#[test]
fn concurrent_reservations_never_collide() {
    let stores = open_stores();
    let counter = Arc::new(
        BlockReservingCounter::new(Arc::clone(&stores.live), EntityKind::ClusteredVariant, 7)
            .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                (0..50)
                    .map(|_| counter.reserve_next().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for value in handle.join().unwrap() {
            assert!(value >= CLUSTERED_VARIANT_LIVE_THRESHOLD);
            assert!(seen.insert(value), "accession {} issued twice", value);
        }
    }
    assert_eq!(seen.len(), 400);
}

#[test]
fn concurrent_inserts_of_one_hash_have_one_winner() {
    let stores = open_stores();
    let repo = Arc::new(RocksDbAccessionRepository::<ClusteredVariant>::new(
        Arc::clone(&stores.live),
    ));

    let outcomes: Vec<InsertOutcome> = thread::scope(|scope| {
        let handles: Vec<_> = (0..6u64)
            .map(|i| {
                let repo = Arc::clone(&repo);
                scope.spawn(move || {
                    repo.insert_if_absent(AccessionedDocument::new(
                        CLUSTERED_VARIANT_LIVE_THRESHOLD + i,
                        cluster(500),
                    ))
                    .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = outcomes
        .iter()
        .filter(|outcome| **outcome == InsertOutcome::Inserted)
        .count();
    assert_eq!(winners, 1);
    assert_eq!(repo.count().unwrap(), 1);

    let owner = repo.find_by_hashes(&[cluster(500).content_hash()]).unwrap()[0].accession;
    for outcome in outcomes {
        if let InsertOutcome::HashExists(existing) = outcome {
            assert_eq!(existing, owner);
        }
    }
}

#[test]
fn bulk_back_reference_update_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("live");
    let variants: Vec<SubmittedVariant> = (0..4)
        .map(|i| SubmittedVariant::new("GCA_1", 9606, "PRJEB1", "2", 100 + i, "C", "G"))
        .collect();

    {
        let backend = Arc::new(RocksDBBackend::new(&path).unwrap());
        let repo = RocksDbAccessionRepository::<SubmittedVariant>::new(Arc::clone(&backend));
        for (i, variant) in variants.iter().enumerate() {
            repo.insert_if_absent(AccessionedDocument::new(
                SUBMITTED_VARIANT_LIVE_THRESHOLD + i as u64,
                variant.clone(),
            ))
            .unwrap();
        }

        let mut updates: Vec<DocumentUpdate<SubmittedVariant>> = variants
            .iter()
            .map(|variant| {
                DocumentUpdate::new(variant.content_hash(), |v: &mut SubmittedVariant| {
                    v.clustered_variant_accession = Some(CLUSTERED_VARIANT_LIVE_THRESHOLD)
                })
            })
            .collect();
        let stranger = SubmittedVariant::new("GCA_1", 9606, "PRJEB9", "2", 1, "C", "G");
        updates.push(DocumentUpdate::new(stranger.content_hash(), |_| {}));

        let summary = repo.bulk_modify(updates).unwrap();
        assert_eq!(summary.attempted, 5);
        assert_eq!(summary.modified, 4);
        assert_eq!(summary.unmatched, vec![stranger.content_hash()]);
        backend.flush().unwrap();
    }

    let backend = Arc::new(RocksDBBackend::new(&path).unwrap());
    let repo = RocksDbAccessionRepository::<SubmittedVariant>::new(backend);
    let stored = repo
        .scan(&|_: &AccessionedDocument<SubmittedVariant>| true)
        .unwrap();
    assert_eq!(stored.len(), 4);
    assert!(stored
        .iter()
        .all(|doc| doc.data.clustered_variant_accession == Some(CLUSTERED_VARIANT_LIVE_THRESHOLD)));
}
