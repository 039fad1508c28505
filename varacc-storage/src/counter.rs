/// Monotonic accession counters
use std::sync::atomic::{AtomicU64, Ordering};
use varacc_core::{Accession, EntityKind, VarAccError, VarAccResult};

/// Exclusive source of new accessions.
///
/// A value handed out is never handed out again, including after a crash.
pub trait AccessionCounter: Send + Sync {
    fn reserve_next(&self) -> VarAccResult<Accession>;

    fn reserve(&self, count: usize) -> VarAccResult<Vec<Accession>> {
        (0..count).map(|_| self.reserve_next()).collect()
    }
}

/// Process-local counter, used by tests and single-run tools
#[derive(Debug)]
pub struct InMemoryCounter {
    next: AtomicU64,
    ceiling: Option<Accession>,
}

impl InMemoryCounter {
    pub fn new(first: Accession) -> Self {
        Self {
            next: AtomicU64::new(first),
            ceiling: None,
        }
    }

    /// Counter starting at the first live accession of `kind`
    pub fn for_kind(kind: EntityKind) -> Self {
        Self::new(kind.live_threshold())
    }

    /// Refuse to hand out `ceiling` or anything above it
    pub fn with_ceiling(mut self, ceiling: Accession) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    /// Next value that would be reserved
    pub fn peek(&self) -> Accession {
        self.next.load(Ordering::SeqCst)
    }
}

impl AccessionCounter for InMemoryCounter {
    fn reserve_next(&self) -> VarAccResult<Accession> {
        let ceiling = self.ceiling;
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| match ceiling {
                Some(limit) if current >= limit => None,
                _ => current.checked_add(1),
            })
            .map_err(|current| {
                VarAccError::AllocationFailure(format!("counter exhausted at {}", current))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counter_starts_at_threshold() {
        let counter = InMemoryCounter::for_kind(EntityKind::ClusteredVariant);
        assert_eq!(counter.reserve_next().unwrap(), 3_000_000_000);
        assert_eq!(counter.reserve_next().unwrap(), 3_000_000_001);
    }

    #[test]
    fn test_ceiling_is_allocation_failure() {
        let counter = InMemoryCounter::new(10).with_ceiling(12);
        assert_eq!(counter.reserve(2).unwrap(), vec![10, 11]);
        let err = counter.reserve_next().unwrap_err();
        assert!(matches!(err, VarAccError::AllocationFailure(_)));
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_concurrent_reservations_are_unique() {
        let counter = Arc::new(InMemoryCounter::new(1));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || counter.reserve(100).unwrap())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value));
            }
        }
        assert_eq!(seen.len(), 800);
        assert_eq!(counter.peek(), 801);
    }
}
