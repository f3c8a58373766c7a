//! Time-expiring cache with single-flight refresh.
//!
//! [`TtlCache::fetch`] returns the cached value for a key. When the entry is
//! missing or stale, exactly one caller runs [`CacheSource::update`]; callers
//! arriving while that refresh is in flight get the previous value (or the
//! default) immediately instead of waiting. A failed refresh keeps the old
//! value and leaves the entry stale so the next caller retries.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Where a cache gets fresh data from.
#[async_trait]
pub trait CacheSource: Send + Sync + 'static {
    /// Cache key.
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    /// Cached value. `Default` is served before the first successful refresh.
    type Value: Default + Send + Sync + 'static;
    /// Refresh failure.
    type Error: fmt::Display + Send + 'static;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Retrieves the source of truth for `key`.
    async fn update(&self, key: &Self::Key) -> Result<Self::Value, Self::Error>;
}

struct Entry<V> {
    value: Arc<V>,
    refreshed_at: Option<Instant>,
    refreshing: bool,
}

impl<V: Default> Entry<V> {
    fn empty() -> Self {
        Self {
            value: Arc::new(V::default()),
            refreshed_at: None,
            refreshing: false,
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.refreshed_at.is_some_and(|at| at.elapsed() < ttl)
    }
}

/// A keyed cache in front of a [`CacheSource`].
pub struct TtlCache<S: CacheSource> {
    source: S,
    ttl: Duration,
    entries: Mutex<HashMap<S::Key, Entry<S::Value>>>,
}

/// Clears the in-flight flag if the refreshing future is dropped early.
struct RefreshGuard<'a, S: CacheSource> {
    cache: &'a TtlCache<S>,
    key: &'a S::Key,
}

impl<S: CacheSource> Drop for RefreshGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(entry) = self.cache.entries.lock().get_mut(self.key) {
            entry.refreshing = false;
        }
    }
}

impl<S: CacheSource> TtlCache<S> {
    /// Creates an empty cache whose entries stay fresh for `ttl`.
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the value for `key`, refreshing it first if this caller is the
    /// one that should.
    pub async fn fetch(&self, key: &S::Key) -> Arc<S::Value> {
        {
            let mut entries = self.entries.lock();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::empty);
            if entry.is_fresh(self.ttl) {
                return Arc::clone(&entry.value);
            }
            if entry.refreshing {
                debug!(cache = self.source.name(), key = ?key, "Refresh in flight; serving previous value");
                return Arc::clone(&entry.value);
            }
            entry.refreshing = true;
        }

        let guard = RefreshGuard { cache: self, key };
        let result = self.source.update(key).await;

        let mut entries = self.entries.lock();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::empty);
        match result {
            Ok(value) => {
                entry.value = Arc::new(value);
                entry.refreshed_at = Some(Instant::now());
            }
            Err(error) => {
                warn!(
                    cache = self.source.name(),
                    key = ?key,
                    error = %error,
                    "Cache refresh failed; keeping previous value"
                );
            }
        }
        let value = Arc::clone(&entry.value);
        drop(entries);
        drop(guard);
        value
    }

    /// Marks `key` stale so the next fetch refreshes it.
    pub fn invalidate(&self, key: &S::Key) {
        if let Some(entry) = self.entries.lock().get_mut(key) {
            entry.refreshed_at = None;
        }
    }
}
