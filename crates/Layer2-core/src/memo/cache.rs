//! Per-context instance cache
//!
//! Two-level map: bucket name -> cache key -> instance.
//!
//! Each (bucket, key) pair owns a slot. A slot is filled at most once in
//! de-dup mode; concurrent callers for the same slot wait on the same
//! construction. A failed construction leaves the slot empty so the next
//! caller runs the producer again.

use crate::component::ComponentInstance;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A single memoized instance slot
pub(crate) type Slot = OnceCell<ComponentInstance>;

/// Instance cache owned by exactly one context
#[derive(Debug)]
pub struct InstanceCache {
    /// bucket -> key -> slot
    buckets: Mutex<HashMap<String, HashMap<String, Arc<Slot>>>>,
    /// Join concurrent constructions for the same slot
    dedupe_in_flight: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    constructions: AtomicU64,
}

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Calls answered from the cache
    pub hits: u64,
    /// Calls that ran (or tried to run) the producer
    pub misses: u64,
    /// Successful producer runs
    pub constructions: u64,
    /// Filled slots
    pub entries: usize,
}

impl CacheStats {
    /// Calculate overall hit rate
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

impl InstanceCache {
    /// Create an empty cache
    ///
    /// `dedupe_in_flight = false` lets concurrent misses for the same key each
    /// construct; the last one to finish stays in the cache.
    pub fn new(dedupe_in_flight: bool) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            dedupe_in_flight,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            constructions: AtomicU64::new(0),
        }
    }

    pub fn dedupe_in_flight(&self) -> bool {
        self.dedupe_in_flight
    }

    /// Cached instance for (bucket, key)
    pub fn get(&self, bucket: &str, key: &str) -> Option<ComponentInstance> {
        let buckets = self.buckets.lock();
        buckets
            .get(bucket)
            .and_then(|slots| slots.get(key))
            .and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.get(bucket, key).is_some()
    }

    /// Store `instance` unless the slot is already filled.
    ///
    /// Returns whichever instance ends up in the slot. A construction already
    /// in flight for the slot wins over `instance`.
    pub async fn get_or_insert(
        &self,
        bucket: &str,
        key: &str,
        instance: ComponentInstance,
    ) -> ComponentInstance {
        let slot = self.slot(bucket, key);
        let resident = slot.get_or_init(|| async move { instance }).await;
        Arc::clone(resident)
    }

    /// Number of filled slots in a bucket
    pub fn bucket_len(&self, bucket: &str) -> usize {
        let buckets = self.buckets.lock();
        buckets
            .get(bucket)
            .map(|slots| slots.values().filter(|s| s.initialized()).count())
            .unwrap_or(0)
    }

    /// Buckets holding at least one instance
    pub fn buckets(&self) -> Vec<String> {
        let buckets = self.buckets.lock();
        let mut names: Vec<String> = buckets
            .iter()
            .filter(|(_, slots)| slots.values().any(|s| s.initialized()))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Total filled slots
    pub fn len(&self) -> usize {
        let buckets = self.buckets.lock();
        buckets
            .values()
            .flat_map(|slots| slots.values())
            .filter(|s| s.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            constructions: self.constructions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    // ========================================================================
    // Crate-internal slot access
    // ========================================================================

    /// Slot for (bucket, key), created empty on first use
    pub(crate) fn slot(&self, bucket: &str, key: &str) -> Arc<Slot> {
        let mut buckets = self.buckets.lock();
        let slots = buckets.entry(bucket.to_string()).or_default();
        Arc::clone(slots.entry(key.to_string()).or_default())
    }

    /// Overwrite (bucket, key) unconditionally
    pub(crate) fn store(&self, bucket: &str, key: &str, instance: ComponentInstance) {
        let mut buckets = self.buckets.lock();
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), Arc::new(OnceCell::new_with(Some(instance))));
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_construction(&self) {
        self.constructions.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for InstanceCache {
    fn default() -> Self {
        Self::new(true)
    }
}
