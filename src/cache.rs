//! In-flight memoization shared by the document cache and the resolution
//! cache.

use futures::future::{BoxFuture, FutureExt, Shared};
use indexmap::IndexMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::ParseOptions;
use crate::error::ContextError;

/// A computation that any number of callers may await.
pub type SharedComputation<V> = Shared<BoxFuture<'static, Result<V, ContextError>>>;

/// Maps keys to pending or completed computations.
///
/// For a given key at most one computation is started while its entry is
/// cached. A computation that fails is evicted once it settles, so a later
/// caller starts afresh. With a capacity set, the least recently used
/// entries are dropped once the cache is full; callers already awaiting
/// a dropped computation still receive its result.
pub struct MemoCache<V: Clone> {
    entries: Mutex<IndexMap<String, SharedComputation<V>>>,
    capacity: Option<usize>,
}

impl<V> MemoCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// A cache without a size limit.
    pub fn new() -> MemoCache<V> {
        MemoCache {
            entries: Mutex::new(IndexMap::new()),
            capacity: None,
        }
    }

    /// A cache holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> MemoCache<V> {
        MemoCache {
            entries: Mutex::new(IndexMap::new()),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<String, SharedComputation<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up `key` and marks it as most recently used.
    pub fn get(&self, key: &str) -> Option<SharedComputation<V>> {
        let mut entries = self.lock();
        let index = entries.get_index_of(key)?;
        let last = entries.len() - 1;
        entries.move_index(index, last);
        entries.get_index(last).map(|(_, computation)| computation.clone())
    }

    pub fn set(&self, key: String, computation: SharedComputation<V>) {
        let mut entries = self.lock();
        entries.shift_remove(&key);
        entries.insert(key, computation);
        self.evict_overflow(&mut entries);
    }

    fn evict_overflow(&self, entries: &mut IndexMap<String, SharedComputation<V>>) {
        if let Some(capacity) = self.capacity {
            while entries.len() > capacity {
                if let Some((key, _)) = entries.shift_remove_index(0) {
                    log::trace!("evicting least recently used computation {}", key);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Awaits the computation registered under `key`, starting it with
    /// `start` if there is none.
    ///
    /// The new computation is registered before it is first polled, so a
    /// concurrent caller for the same key attaches to it.
    pub async fn get_or_start<F>(&self, key: &str, start: F) -> Result<V, ContextError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, ContextError>>,
    {
        let computation = match self.get(key) {
            Some(existing) => {
                log::trace!("attaching to cached computation {}", key);
                existing
            }
            None => {
                let mut entries = self.lock();
                // Another caller may have registered one since `get`.
                match entries.get(key) {
                    Some(existing) => existing.clone(),
                    None => {
                        let computation = start().shared();
                        entries.insert(key.to_owned(), computation.clone());
                        self.evict_overflow(&mut entries);
                        computation
                    }
                }
            }
        };

        let result = computation.clone().await;

        if result.is_err() {
            let mut entries = self.lock();
            if entries
                .get(key)
                .map_or(false, |current| current.ptr_eq(&computation))
            {
                log::debug!("evicting failed computation {}", key);
                entries.shift_remove(key);
            }
        }

        result
    }
}

impl<V> Default for MemoCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        MemoCache::new()
    }
}

/// Derives the resolution cache key of a context and the options that
/// affect its normalized form.
///
/// The parent context participates by content, and only when non-empty.
pub fn resolution_key(context: &Value, options: &ParseOptions) -> String {
    let mut hasher = Sha256::new();

    hasher.update(serde_json::to_vec(context).unwrap_or_default());
    hasher.update(b"\n");
    hasher.update(serde_json::to_vec(options).unwrap_or_default());

    if let Some(parent) = options.parent_context.as_ref().filter(|p| !p.is_empty()) {
        hasher.update(b"\n");
        hasher.update(serde_json::to_vec(&**parent).unwrap_or_default());
    }

    format!("{:x}", hasher.finalize())
}
