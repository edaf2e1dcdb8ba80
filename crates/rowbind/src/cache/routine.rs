//! Compiled-routine store

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::key::RoutineKey;
use crate::observability;
use crate::{MappingError, Result};

type Entry = Arc<dyn Any + Send + Sync>;
type Gate = Arc<Mutex<()>>;

/// Cache statistics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered by an existing routine
    pub hits: u64,
    /// Lookups that found no routine on the fast path
    pub misses: u64,
    /// Routines built
    pub builds: u64,
    /// Builds that failed
    pub build_errors: u64,
    /// Routines currently cached
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups answered without building.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Concurrent get-or-build store of compiled routines.
///
/// Reads of a built routine take no lock: the map lives behind an
/// [`ArcSwap`] and is replaced wholesale when a routine is added. Builds are
/// serialized per key only, so at most one build runs for any key and
/// builds for different keys proceed in parallel. A failed build leaves no
/// entry behind.
///
/// Nothing is ever evicted. When a warn threshold is set, crossing it logs
/// one warning; [`clear`](Self::clear) drops every routine.
pub struct RoutineCache {
    entries: ArcSwap<HashMap<RoutineKey, Entry>>,
    gates: Mutex<HashMap<RoutineKey, Gate>>,
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    build_errors: AtomicU64,
    warn_threshold: Option<usize>,
    warned: AtomicBool,
}

impl RoutineCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_warn_threshold(None)
    }

    /// Create a cache that warns once when it holds more than `threshold` routines.
    #[must_use]
    pub fn with_warn_threshold(threshold: Option<usize>) -> Self {
        Self {
            entries: ArcSwap::from_pointee(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            builds: AtomicU64::new(0),
            build_errors: AtomicU64::new(0),
            warn_threshold: threshold,
            warned: AtomicBool::new(false),
        }
    }

    /// Return the routine for `key`, building it with `build` if absent.
    ///
    /// Concurrent callers for the same key wait for the first builder and
    /// share its routine; `build` runs at most once per key.
    ///
    /// # Errors
    ///
    /// Returns the build error unchanged. Nothing is cached in that case and
    /// the next call builds again, still one caller at a time.
    pub fn get_or_build<R, F>(&self, key: &RoutineKey, build: F) -> Result<R>
    where
        R: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<R>,
    {
        if let Some(found) = self.lookup::<R>(key)? {
            self.record_hit(key);
            return Ok(found);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        observability::record_routine_miss();
        tracing::debug!(cache.result = "miss", routine.key = %key);

        let gate = {
            let mut gates = self.gates.lock();
            Arc::clone(gates.entry(key.clone()).or_default())
        };
        let _guard = gate.lock();

        if let Some(found) = self.lookup::<R>(key)? {
            self.record_hit(key);
            return Ok(found);
        }

        let started = Instant::now();
        match build() {
            Ok(routine) => {
                let stored: Entry = Arc::new(routine.clone());
                self.entries.rcu(|current| {
                    let mut next = HashMap::clone(current);
                    next.insert(key.clone(), Arc::clone(&stored));
                    next
                });
                self.builds.fetch_add(1, Ordering::Relaxed);
                observability::record_routine_build(key.kind().as_str());
                let elapsed = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
                tracing::debug!(
                    routine.kind = key.kind().as_str(),
                    routine.target = key.type_name(),
                    routine.key = %key,
                    duration_us = elapsed,
                    "routine cached"
                );
                self.after_insert();
                self.release_gate(key, &gate);
                Ok(routine)
            }
            // The gate stays registered so a retry after a failure still
            // serializes against callers already queued on it.
            Err(e) => {
                self.build_errors.fetch_add(1, Ordering::Relaxed);
                observability::record_routine_build_error();
                tracing::warn!(
                    routine.kind = key.kind().as_str(),
                    routine.target = key.type_name(),
                    error = %e,
                    "routine build failed"
                );
                Err(e)
            }
        }
    }

    /// Drop the gate for `key` once its routine is published, unless a newer
    /// gate has replaced it.
    fn release_gate(&self, key: &RoutineKey, gate: &Gate) {
        let mut gates = self.gates.lock();
        if gates.get(key).is_some_and(|current| Arc::ptr_eq(current, gate)) {
            gates.remove(key);
        }
    }

    fn lookup<R: Clone + 'static>(&self, key: &RoutineKey) -> Result<Option<R>> {
        let entries = self.entries.load();
        match entries.get(key) {
            Some(entry) => entry.downcast_ref::<R>().cloned().map(Some).ok_or_else(|| {
                MappingError::invalid_config(format!(
                    "routine cached under {key} has an unexpected type"
                ))
            }),
            None => Ok(None),
        }
    }

    fn record_hit(&self, key: &RoutineKey) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        observability::record_routine_hit();
        tracing::trace!(cache.result = "hit", routine.key = %key);
    }

    fn after_insert(&self) {
        let size = self.len();
        observability::set_routine_cache_size(size);
        if let Some(threshold) = self.warn_threshold
            && size > threshold
            && !self.warned.swap(true, Ordering::Relaxed)
        {
            tracing::warn!(
                cache.size = size,
                cache.warn_threshold = threshold,
                "routine cache exceeds its warn threshold; result shapes may be too dynamic"
            );
        }
    }

    /// Number of cached routines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if a routine is cached under `key`.
    #[must_use]
    pub fn contains(&self, key: &RoutineKey) -> bool {
        self.entries.load().contains_key(key)
    }

    /// Drop every routine. Routines already handed out keep working.
    pub fn clear(&self) {
        self.entries.store(Arc::new(HashMap::new()));
        self.warned.store(false, Ordering::Relaxed);
        observability::set_routine_cache_size(0);
        tracing::debug!("routine cache cleared");
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            build_errors: self.build_errors.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl Default for RoutineCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoutineCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutineCache")
            .field("stats", &self.stats())
            .field("warn_threshold", &self.warn_threshold)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::TypeId;
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::coercion::InvalidEnumValueHandling;
    use crate::compiler::OutboundField;

    fn key(name: &str) -> RoutineKey {
        RoutineKey::objects_to_parameters(
            TypeId::of::<u32>(),
            "u32",
            Some(name),
            &[OutboundField::new("Id")],
            1,
            InvalidEnumValueHandling::ThrowError,
        )
    }

    type Routine = Arc<dyn Fn(i32) -> i32 + Send + Sync>;

    fn routine(f: fn(i32) -> i32) -> Result<Routine> {
        Ok(Arc::new(f))
    }

    #[test]
    fn test_builds_once_then_hits() {
        let cache = RoutineCache::new();
        let builds = AtomicUsize::new(0);
        let build = || -> Result<Routine> {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(|x: i32| x + 1))
        };

        let a = cache.get_or_build(&key("a"), build).unwrap();
        let b = cache.get_or_build(&key("a"), build).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b(1), 2);
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.builds, 1);
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failed_build_not_cached() {
        let cache = RoutineCache::new();
        let err = cache
            .get_or_build::<Routine, _>(&key("bad"), || {
                Err(MappingError::no_bindable_members("u32"))
            })
            .unwrap_err();
        assert!(err.is_no_bindable_members());
        assert!(cache.is_empty());
        assert!(!cache.contains(&key("bad")));
        assert_eq!(cache.stats().build_errors, 1);

        let ok = cache.get_or_build(&key("bad"), || routine(|x| x));
        assert!(ok.is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_callers_share_one_build() {
        let cache = RoutineCache::new();
        let builds = AtomicUsize::new(0);
        let k = key("shared");

        let routines: Vec<Routine> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    s.spawn(|| {
                        cache
                            .get_or_build(&k, || -> Result<Routine> {
                                builds.fetch_add(1, Ordering::SeqCst);
                                std::thread::sleep(std::time::Duration::from_millis(20));
                                Ok(Arc::new(|x: i32| x * 2))
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(routines.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert!(routines.iter().all(|r| r(21) == 42));
        let stats = cache.stats();
        assert_eq!(stats.builds, 1);
        assert_eq!(stats.hits + stats.builds, 16);
    }

    #[test]
    fn test_failed_builds_do_not_overlap() {
        let cache = RoutineCache::new();
        let builds = AtomicUsize::new(0);
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let k = key("failing");

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let err = cache
                        .get_or_build::<Routine, _>(&k, || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            std::thread::sleep(std::time::Duration::from_millis(10));
                            in_flight.fetch_sub(1, Ordering::SeqCst);
                            Err(MappingError::no_bindable_members("u32"))
                        })
                        .unwrap_err();
                    assert!(err.is_no_bindable_members());
                });
            }
        });

        assert_eq!(builds.load(Ordering::SeqCst), 8);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().build_errors, 8);
        assert!(cache.is_empty());

        // a later success still publishes and releases the gate
        let ok = cache.get_or_build(&k, || routine(|x| x)).unwrap();
        assert_eq!(ok(3), 3);
        assert!(cache.gates.lock().is_empty());
    }

    #[test]
    fn test_distinct_keys_build_separately() {
        let cache = RoutineCache::new();
        let a = cache.get_or_build(&key("a"), || routine(|x| x)).unwrap();
        let b = cache.get_or_build(&key("b"), || routine(|x| -x)).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear_keeps_handed_out_routines() {
        let cache = RoutineCache::new();
        let r = cache.get_or_build(&key("a"), || routine(|x| x + 10)).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(r(1), 11);
    }

    #[test]
    fn test_wrong_routine_type_is_error() {
        let cache = RoutineCache::new();
        cache.get_or_build(&key("a"), || routine(|x| x)).unwrap();
        let err = cache.get_or_build::<u8, _>(&key("a"), || Ok(1)).unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn test_warn_threshold_does_not_evict() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("rowbind=debug")
            .with_test_writer()
            .try_init();

        let cache = RoutineCache::with_warn_threshold(Some(1));
        for name in ["a", "b", "c"] {
            cache.get_or_build(&key(name), || routine(|x| x)).unwrap();
        }
        assert_eq!(cache.len(), 3);
    }
}
