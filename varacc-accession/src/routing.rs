/// Range partitioning between the legacy and the live store
use varacc_core::{Accession, EntityKind, StoreOrigin};

/// One value per physical store, selected by accession range
#[derive(Debug, Clone)]
pub struct StorePair<T> {
    pub legacy: T,
    pub live: T,
}

impl<T> StorePair<T> {
    pub fn new(legacy: T, live: T) -> Self {
        Self { legacy, live }
    }

    pub fn get(&self, origin: StoreOrigin) -> &T {
        match origin {
            StoreOrigin::Legacy => &self.legacy,
            StoreOrigin::Live => &self.live,
        }
    }

    /// The store that owns `accession` of `kind`
    pub fn route(&self, kind: EntityKind, accession: Accession) -> &T {
        self.get(kind.store_origin(accession))
    }

    /// Both stores, legacy first
    pub fn iter(&self) -> impl Iterator<Item = (StoreOrigin, &T)> {
        [
            (StoreOrigin::Legacy, &self.legacy),
            (StoreOrigin::Live, &self.live),
        ]
        .into_iter()
    }
}
