//! # Async Cache
//!
//! Single-flight, idle-expiring cache of asynchronous computations.
//!
//! ## Semantics
//!
//! - **Single-flight**: the first `get_or_insert_with` for a key spawns the
//!   computation; every later caller for that key receives a clone of the
//!   same shared future until the entry is evicted.
//! - **Runs to completion**: computations are spawned on the Tokio runtime,
//!   so dropping every waiter never cancels them.
//! - **Idle TTL**: an entry untouched for `expire_after_access` is removed
//!   by the next sweep. Sweeps run lazily on access, at most once per
//!   `sweep_interval`, or on demand via [`AsyncCache::evict_expired`].
//! - **Bounded size**: above `max_entries`, the least recently used
//!   *finished* entries are dropped. Running entries are never evicted.
//! - **Failures are not cached**: a failed or panicked entry is replaced by
//!   a fresh computation on its next lookup.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::CoreError;

/// A cached computation that any number of callers can await.
pub type CacheFuture<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

const PENDING: u8 = 0;
const READY: u8 = 1;
const FAILED: u8 = 2;

/// Eviction policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheSettings {
    /// Idle time after which an entry is dropped.
    pub expire_after_access: Duration,
    /// Entry count above which finished entries are evicted, oldest first.
    pub max_entries: usize,
    /// Minimum time between lazy expiry sweeps.
    pub sweep_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            expire_after_access: Duration::from_secs(300),
            max_entries: 4096,
            sweep_interval: Duration::from_secs(30),
        }
    }
}

struct Entry<V, E> {
    future: CacheFuture<V, E>,
    state: Arc<AtomicU8>,
    last_access: Instant,
}

impl<V, E> Entry<V, E> {
    fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }
}

struct Inner<K, V, E> {
    entries: HashMap<K, Entry<V, E>>,
    last_sweep: Instant,
}

/// Single-flight cache keyed by `K`, producing `Result<V, E>`.
pub struct AsyncCache<K, V, E> {
    name: &'static str,
    settings: CacheSettings,
    inner: Mutex<Inner<K, V, E>>,
}

impl<K, V, E> AsyncCache<K, V, E>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<CoreError> + 'static,
{
    /// Creates an empty cache. `name` only appears in log output.
    #[must_use]
    pub fn new(name: &'static str, settings: CacheSettings) -> Self {
        Self {
            name,
            settings,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Returns the eviction policy.
    #[must_use]
    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    /// Returns the shared computation for `key`, starting it with `make` if
    /// no live entry exists.
    ///
    /// `make` runs under the cache lock, so it should only build the future;
    /// the work itself happens when the spawned future is polled.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn get_or_insert_with<F, Fut>(&self, key: K, make: F) -> CacheFuture<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        if now.saturating_duration_since(inner.last_sweep) >= self.settings.sweep_interval {
            self.sweep_expired(&mut inner, now);
        }

        if let Some(entry) = inner.entries.get_mut(&key) {
            if entry.state() != FAILED {
                entry.last_access = now;
                return entry.future.clone();
            }
            tracing::debug!(cache = self.name, ?key, "retrying failed entry");
        } else {
            tracing::debug!(cache = self.name, ?key, "cache miss");
        }

        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = Arc::clone(&state);
        let work = make();
        let handle = tokio::spawn(async move {
            let result = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(result) => result,
                Err(_) => Err(E::from(CoreError::TaskFailed("computation panicked".into()))),
            };
            let done = if result.is_ok() { READY } else { FAILED };
            task_state.store(done, Ordering::Release);
            result
        });

        let future = async move {
            match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(E::from(CoreError::TaskFailed(join_error.to_string()))),
            }
        }
        .boxed()
        .shared();

        inner.entries.insert(
            key,
            Entry {
                future: future.clone(),
                state,
                last_access: now,
            },
        );

        if inner.entries.len() > self.settings.max_entries {
            self.evict_least_recent(&mut inner);
        }

        future
    }

    /// Returns the live entry for `key` without starting a computation.
    #[must_use]
    pub fn get_if_present(&self, key: &K) -> Option<CacheFuture<V, E>> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let entry = inner.entries.get_mut(key)?;
        if entry.state() == FAILED {
            return None;
        }
        entry.last_access = now;
        Some(entry.future.clone())
    }

    /// Removes every finished entry idle for longer than the TTL.
    pub fn evict_expired(&self) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        self.sweep_expired(&mut inner, now);
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep_expired(&self, inner: &mut Inner<K, V, E>, now: Instant) {
        let ttl = self.settings.expire_after_access;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| {
            entry.state() == PENDING || now.saturating_duration_since(entry.last_access) < ttl
        });
        inner.last_sweep = now;

        let evicted = before - inner.entries.len();
        if evicted > 0 {
            tracing::debug!(cache = self.name, evicted, remaining = inner.entries.len(), "expired idle entries");
        }
    }

    fn evict_least_recent(&self, inner: &mut Inner<K, V, E>) {
        let max = self.settings.max_entries;
        // Evict an extra eighth so a full cache does not rescan on every insert
        let target = max - max / 8;

        let mut finished: Vec<(Instant, K)> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.state() != PENDING)
            .map(|(key, entry)| (entry.last_access, key.clone()))
            .collect();
        finished.sort_by_key(|(last_access, _)| *last_access);

        let excess = inner.entries.len().saturating_sub(target);
        for (_, key) in finished.into_iter().take(excess) {
            inner.entries.remove(&key);
        }

        tracing::debug!(cache = self.name, remaining = inner.entries.len(), "evicted least recently used entries");
    }
}

impl<K, V, E> Debug for AsyncCache<K, V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncCache")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("len", &self.inner.lock().entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    type TestCache = AsyncCache<u32, u64, CoreError>;

    fn settings(ttl_secs: u64, max_entries: usize) -> CacheSettings {
        CacheSettings {
            expire_after_access: Duration::from_secs(ttl_secs),
            max_entries,
            sweep_interval: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_single_flight() {
        let cache = Arc::new(TestCache::new("test", CacheSettings::default()));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut waiters = Vec::new();
        for _ in 0..100 {
            let calls = Arc::clone(&calls);
            waiters.push(cache.get_or_insert_with(1, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Ok(99)
            }));
        }

        for result in futures::future::join_all(waiters).await {
            assert_eq!(result, Ok(99));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_retried() {
        let cache = TestCache::new("test", CacheSettings::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let make = |calls: Arc<AtomicUsize>| {
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(CoreError::TaskFailed("first attempt".into()))
                } else {
                    Ok(5)
                }
            }
        };

        let first = cache.get_or_insert_with(3, make(Arc::clone(&calls))).await;
        assert!(first.is_err());

        let second = cache.get_or_insert_with(3, make(Arc::clone(&calls))).await;
        assert_eq!(second, Ok(5));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panic_becomes_retryable_error() {
        let cache = TestCache::new("test", CacheSettings::default());

        let first = cache
            .get_or_insert_with(4, || async {
                let broken = true;
                if broken {
                    panic!("decoder bug");
                }
                Ok::<u64, CoreError>(0)
            })
            .await;
        assert!(matches!(first, Err(CoreError::TaskFailed(_))), "got {first:?}");

        let second = cache.get_or_insert_with(4, || async { Ok(8) }).await;
        assert_eq!(second, Ok(8), "a panicked entry must be retried");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_entries_expire() {
        let cache = TestCache::new("test", settings(60, 100));
        assert_eq!(cache.get_or_insert_with(1, || async { Ok(1) }).await, Ok(1));
        assert_eq!(cache.get_or_insert_with(2, || async { Ok(2) }).await, Ok(2));

        tokio::time::advance(Duration::from_secs(30)).await;
        // Touch key 1 so only key 2 goes idle
        assert!(cache.get_if_present(&1).is_some());

        tokio::time::advance(Duration::from_secs(45)).await;
        cache.evict_expired();

        assert!(cache.get_if_present(&1).is_some());
        assert!(cache.get_if_present(&2).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_entries_survive_expiry() {
        let cache = TestCache::new("test", settings(1, 100));
        let (tx, rx) = tokio::sync::oneshot::channel::<u64>();

        let pending = cache.get_or_insert_with(9, move || async move {
            rx.await.map_err(|e| CoreError::TaskFailed(e.to_string()))
        });

        tokio::time::advance(Duration::from_secs(10)).await;
        cache.evict_expired();
        assert_eq!(cache.len(), 1, "in-flight entry must not be evicted");

        tx.send(4).ok();
        assert_eq!(pending.await, Ok(4));
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest_finished() {
        let cache = TestCache::new("test", settings(300, 8));
        for key in 0..8u32 {
            let value = u64::from(key);
            assert_eq!(cache.get_or_insert_with(key, move || async move { Ok(value) }).await, Ok(value));
            tokio::task::yield_now().await;
        }
        assert_eq!(cache.len(), 8);

        assert_eq!(cache.get_or_insert_with(100, || async { Ok(100) }).await, Ok(100));
        assert!(cache.len() <= 8);
        assert!(cache.get_if_present(&100).is_some());
    }
}
