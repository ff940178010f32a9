//! TTL-differentiated instance cache.
//!
//! [`InstanceCache`] is the single entry point the polling contract uses to
//! learn about instances. It maps an instance identifier to the most recent
//! [`InstanceRecord`] together with the time it was fetched and the TTL it
//! was assigned:
//!
//! - instances that exist are kept for the *present* TTL (default 30s);
//! - instances confirmed absent are kept for the shorter *absent* TTL
//!   (default 5s), so a recreated instance is noticed quickly;
//! - errors are never cached; a failed refresh leaves any previous entry
//!   untouched and the error goes back to the caller. Stale entries are
//!   never served.
//!
//! # Concurrency
//!
//! Entries live in a `HashMap` behind one `RwLock`. Hits take the read lock,
//! stores/invalidation take the write lock, and no lock is held across an
//! `.await`. A refresh replaces the whole entry, so readers never see a
//! partially written one.
//!
//! By default concurrent misses for the same identifier each perform their
//! own fetch and the last store wins. With
//! [`CacheConfig::single_flight`] enabled they share one in-flight fetch
//! instead. `invalidate` and `clear` detach in-flight fetches: a detached
//! fetch still answers its waiters but no longer stores, and the next `get`
//! starts a new one.
//!
//! # Cancellation
//!
//! The entry is stored only after the resolver returns, so dropping a `get`
//! future (timeout, task abort) never writes a partial result. A shared fetch
//! is dropped, request included, when its last waiter goes away.
//!
//! # Size
//!
//! When an insert pushes the entry count above the sweep threshold (default
//! 100), every expired entry is removed. Fresh entries are never evicted;
//! this is a convenience cap, not a memory bound.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::time::Instant;
use tracing::{debug, error};

use crate::Result;
use crate::instances::InstanceResolver;
use crate::telemetry;
use crate::types::InstanceRecord;

/// Configuration for the instance cache.
///
/// ```rust
/// # use vcloud_provider::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .present_ttl(Duration::from_secs(60))
///     .single_flight(true);
/// assert_eq!(config.absent_ttl, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for records with `exists == true`. Default: 30s.
    pub present_ttl: Duration,
    /// TTL for records with `exists == false`. Default: 5s.
    pub absent_ttl: Duration,
    /// Entry count above which expired entries are swept. Default: 100.
    pub sweep_threshold: usize,
    /// Share one in-flight fetch between concurrent misses for the same
    /// identifier. Default: false.
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            present_ttl: Duration::from_secs(30),
            absent_ttl: Duration::from_secs(5),
            sweep_threshold: 100,
            single_flight: false,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn present_ttl(mut self, ttl: Duration) -> Self {
        self.present_ttl = ttl;
        self
    }

    pub fn absent_ttl(mut self, ttl: Duration) -> Self {
        self.absent_ttl = ttl;
        self
    }

    pub fn sweep_threshold(mut self, n: usize) -> Self {
        self.sweep_threshold = n;
        self
    }

    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// TTL class for a freshly resolved record.
    pub fn ttl_for(&self, record: &InstanceRecord) -> Duration {
        if record.exists {
            self.present_ttl
        } else {
            self.absent_ttl
        }
    }
}

/// A stored record with its fetch time and TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub record: InstanceRecord,
    pub fetched_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Fresh iff `now - fetched_at <= ttl`.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) <= self.ttl
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<InstanceRecord>>>;

/// In-flight fetch tagged with the generation that started it.
struct Flight {
    generation: u64,
    fetch: SharedFetch,
}

struct CacheInner {
    entries: RwLock<HashMap<String, CacheEntry>>,
    inflight: Mutex<HashMap<String, Flight>>,
    generation: AtomicU64,
    resolver: Arc<dyn InstanceResolver>,
    config: CacheConfig,
}

/// Concurrent instance cache with fetch-on-miss.
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct InstanceCache {
    inner: Arc<CacheInner>,
}

impl InstanceCache {
    /// Create an empty cache that refreshes entries through `resolver`.
    pub fn new(resolver: Arc<dyn InstanceResolver>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: RwLock::new(HashMap::new()),
                inflight: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
                resolver,
                config,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Current state of instance `id`.
    ///
    /// Returns the cached record if it is fresh; otherwise fetches through the
    /// resolver, stores the result with its TTL class and returns it. Resolver
    /// errors are returned unchanged and leave the cache as it was.
    pub async fn get(&self, id: &str) -> Result<InstanceRecord> {
        let now = Instant::now();
        match self.inner.lookup(id) {
            Some(entry) if entry.is_fresh_at(now) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                debug!(instance_id = id, exists = entry.record.exists, "cache hit");
                return Ok(entry.record);
            }
            Some(_) => debug!(instance_id = id, "cache entry expired, refetching"),
            None => debug!(instance_id = id, "cache miss, fetching"),
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);

        if self.inner.config.single_flight {
            self.shared_fetch(id).await
        } else {
            self.inner.fetch_and_store(id).await
        }
    }

    /// Stored entry for `id`, fresh or not, without fetching.
    pub fn peek(&self, id: &str) -> Option<CacheEntry> {
        self.inner.lookup(id)
    }

    /// Remove the entry for `id`. The next `get` fetches.
    pub fn invalidate(&self, id: &str) {
        let removed = self.inner.write().remove(id).is_some();
        let detached = self.inner.flights().remove(id).is_some();
        debug!(instance_id = id, removed, detached, "invalidated cache entry");
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.write().clear();
        self.inner.flights().clear();
        debug!("cleared instance cache");
    }

    /// Remove all expired entries now. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        sweep_expired(&mut self.inner.write(), Instant::now())
    }

    /// Number of stored entries, including stale ones.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Join the in-flight fetch for `id`, or start one.
    async fn shared_fetch(&self, id: &str) -> Result<InstanceRecord> {
        let (generation, fetch) = {
            let mut inflight = self.inner.flights();
            match inflight.get(id) {
                Some(flight) => {
                    debug!(instance_id = id, "joining in-flight fetch");
                    (flight.generation, flight.fetch.clone())
                }
                None => {
                    let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
                    let inner = Arc::clone(&self.inner);
                    let key = id.to_string();
                    let fetch = async move {
                        let result = inner.resolve(&key).await;
                        if inner.release(&key, generation) {
                            if let Ok(record) = &result {
                                inner.store(&key, record.clone());
                            }
                        } else {
                            debug!(instance_id = %key, "fetch detached, not storing");
                        }
                        result
                    }
                    .boxed()
                    .shared();
                    inflight.insert(
                        id.to_string(),
                        Flight {
                            generation,
                            fetch: fetch.clone(),
                        },
                    );
                    (generation, fetch)
                }
            }
        };

        let mut waiter = Waiter {
            inner: &self.inner,
            key: id,
            generation,
            fetch,
            done: false,
        };
        let result = (&mut waiter.fetch).await;
        waiter.done = true;
        result
    }
}

/// One caller awaiting a shared fetch.
///
/// Dropped before completion by the last waiter, it removes the slot so the
/// fetch itself is dropped.
struct Waiter<'a> {
    inner: &'a CacheInner,
    key: &'a str,
    generation: u64,
    fetch: SharedFetch,
    done: bool,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut inflight = self.inner.flights();
        let last_waiter = inflight.get(self.key).is_some_and(|flight| {
            // The slot and this waiter hold the only handles.
            flight.generation == self.generation && self.fetch.strong_count() == Some(2)
        });
        if last_waiter {
            inflight.remove(self.key);
            debug!(instance_id = self.key, "last waiter gone, abandoning fetch");
        }
    }
}

impl std::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceCache")
            .field("entries", &self.len())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl CacheInner {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn flights(&self) -> MutexGuard<'_, HashMap<String, Flight>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, id: &str) -> Option<CacheEntry> {
        self.read().get(id).cloned()
    }

    /// Clear the slot for `id` if it still belongs to `generation`.
    fn release(&self, id: &str, generation: u64) -> bool {
        let mut inflight = self.flights();
        match inflight.get(id) {
            Some(flight) if flight.generation == generation => {
                inflight.remove(id);
                true
            }
            _ => false,
        }
    }

    async fn resolve(&self, id: &str) -> Result<InstanceRecord> {
        self.resolver.resolve(id).await.inspect_err(|e| {
            error!(instance_id = id, error = %e, "failed to resolve instance");
        })
    }

    async fn fetch_and_store(&self, id: &str) -> Result<InstanceRecord> {
        let record = self.resolve(id).await?;
        self.store(id, record.clone());
        Ok(record)
    }

    fn store(&self, id: &str, record: InstanceRecord) {
        let ttl = self.config.ttl_for(&record);
        let exists = record.exists;
        let now = Instant::now();

        let mut entries = self.write();
        entries.insert(
            id.to_string(),
            CacheEntry {
                record,
                fetched_at: now,
                ttl,
            },
        );
        if entries.len() > self.config.sweep_threshold {
            debug!(
                size = entries.len(),
                threshold = self.config.sweep_threshold,
                "cache over threshold, sweeping expired entries"
            );
            sweep_expired(&mut entries, now);
        }
        drop(entries);

        debug!(instance_id = id, exists, ttl_secs = ttl.as_secs(), "cached instance");
    }
}

fn sweep_expired(entries: &mut HashMap<String, CacheEntry>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.is_fresh_at(now));
    let removed = before - entries.len();
    if removed > 0 {
        metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(removed as u64);
    }
    removed
}
