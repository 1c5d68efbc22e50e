//! Memoized view results for one record store.
//!
//! A cache belongs to exactly one store generation. The selection manager
//! builds a fresh cache next to every new store, so there is no invalidation
//! API: dropping the old snapshot drops its cache.

use crate::analytics::{AggregateResult, ViewKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

type Slot = Arc<OnceLock<Arc<AggregateResult>>>;

/// Key → result map with at most one computation per key.
///
/// Concurrent first requests for the same key block on a per-key slot while
/// one of them computes; requests for other keys are not held up.
#[derive(Debug, Default)]
pub struct AggregateCache {
    slots: Mutex<HashMap<ViewKey, Slot>>,
    computations: AtomicU64,
}

impl AggregateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for `key`, running `compute` on a miss.
    pub fn get_or_compute<F>(&self, key: &ViewKey, compute: F) -> Arc<AggregateResult>
    where
        F: FnOnce() -> AggregateResult,
    {
        let slot = {
            // The map only holds slots, so a panic elsewhere cannot leave it
            // half-updated.
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        Arc::clone(slot.get_or_init(|| {
            let computed = self.computations.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(view = %key, computations = computed, "Computing view");
            Arc::new(compute())
        }))
    }

    /// Cached result for `key`, if already computed.
    pub fn get(&self, key: &ViewKey) -> Option<Arc<AggregateResult>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Number of keys with a finished result.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total computations run so far.
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }
}
