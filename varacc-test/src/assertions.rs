//! Assertions for accessioning invariants

use std::collections::HashMap;
use varacc_core::{Accession, Accessionable, EntityKind, Sha1Hash, StoreOrigin};
use varacc_storage::{AccessionRepository, AccessionedDocument};

/// Assert that no hash carries more than one accession across `repositories`
pub fn assert_one_accession_per_hash<E: Accessionable>(repositories: &[&dyn AccessionRepository<E>]) {
    let mut seen: HashMap<Sha1Hash, Accession> = HashMap::new();
    for repository in repositories {
        let documents = repository
            .scan(&|_: &AccessionedDocument<E>| true)
            .unwrap_or_else(|e| panic!("scan failed: {}", e));
        for document in documents {
            if let Some(previous) = seen.insert(document.hash, document.accession) {
                assert_eq!(
                    previous,
                    document.accession,
                    "hash {} carries accessions {} and {}",
                    document.hash.to_hex(),
                    previous,
                    document.accession
                );
            }
        }
    }
}

/// Assert that every document in `documents` sits on the expected side of the threshold
pub fn assert_all_from<E>(documents: &[AccessionedDocument<E>], kind: EntityKind, origin: StoreOrigin) {
    for document in documents {
        assert_eq!(
            kind.store_origin(document.accession),
            origin,
            "accession {} is not from the {:?} range",
            document.accession,
            origin
        );
    }
}

/// Assert that `calls` contains no operation that writes
pub fn assert_read_only(calls: &[String]) {
    const WRITES: [&str; 5] = [
        "insert_if_absent",
        "replace",
        "retire_accession",
        "modify",
        "bulk_modify",
    ];
    let writes: Vec<_> = calls.iter().filter(|c| WRITES.contains(&c.as_str())).collect();
    assert!(writes.is_empty(), "unexpected writes: {:?}", writes);
}
