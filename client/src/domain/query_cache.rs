//! Keyed, observable cache of query results.
//!
//! Each [`QueryKey`] owns one `tokio::sync::watch` channel carrying the last
//! known value, a stale flag, and a read generation. Every operation takes
//! the map lock once and never holds it across an `.await`, so a mutation
//! step (cancel, snapshot, write) is atomic with respect to other tasks.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use super::ports::QueryKey;

struct Entry<V> {
    value: watch::Sender<Option<V>>,
    stale: bool,
    read_generation: u64,
}

impl<V> Entry<V> {
    fn empty() -> Self {
        let (value, _) = watch::channel(None);
        Self {
            value,
            stale: true,
            read_generation: 0,
        }
    }
}

/// Proof that a read started against a given generation of an entry.
///
/// Obtained from [`QueryCache::begin_read`] before awaiting the remote and
/// handed back to [`QueryCache::complete_read`]. If the entry's reads were
/// cancelled in the meantime the result is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTicket {
    key: QueryKey,
    generation: u64,
}

impl ReadTicket {
    /// Key the read targets.
    #[must_use]
    pub const fn key(&self) -> &QueryKey {
        &self.key
    }
}

/// Cache mapping query keys to their last known value.
///
/// # Examples
/// ```
/// use todo_client::domain::QueryCache;
/// use todo_client::domain::ports::QueryKey;
///
/// let cache = QueryCache::new();
/// let key = QueryKey::todo_list();
/// cache.set(&key, vec![1, 2]);
/// assert_eq!(cache.get(&key), Some(vec![1, 2]));
/// assert!(!cache.is_stale(&key));
/// cache.invalidate(&key);
/// assert!(cache.is_stale(&key));
/// assert_eq!(cache.get(&key), Some(vec![1, 2]));
/// ```
pub struct QueryCache<V> {
    entries: Mutex<HashMap<QueryKey, Entry<V>>>,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> std::fmt::Debug for QueryCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.lock().keys().map(ToString::to_string).collect();
        f.debug_struct("QueryCache").field("keys", &keys).finish()
    }
}

impl<V> QueryCache<V> {
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone> QueryCache<V> {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`, if any.
    #[must_use]
    pub fn get(&self, key: &QueryKey) -> Option<V> {
        self.lock()
            .get(key)
            .and_then(|entry| entry.value.borrow().clone())
    }

    /// Replace the value of `key`, mark it fresh, and notify watchers.
    pub fn set(&self, key: &QueryKey, value: V) {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::empty);
        entry.value.send_replace(Some(value));
        entry.stale = false;
        debug!(key = %key, "cache entry written");
    }

    /// Clear the value of `key`, returning what was stored.
    pub fn remove(&self, key: &QueryKey) -> Option<V> {
        let mut entries = self.lock();
        let entry = entries.get_mut(key)?;
        entry.stale = true;
        debug!(key = %key, "cache entry cleared");
        entry.value.send_replace(None)
    }

    /// Derive a new value from the current one in a single step.
    ///
    /// `derive` receives the stored value and returns the replacement, or
    /// `None` to leave the entry untouched. When a replacement is written,
    /// in-flight reads of `key` are cancelled first and the previous value is
    /// returned as the snapshot. Nothing happens when the entry is empty.
    pub fn patch<F>(&self, key: &QueryKey, derive: F) -> Option<V>
    where
        F: FnOnce(&V) -> Option<V>,
    {
        let mut entries = self.lock();
        let entry = entries.get_mut(key)?;
        let previous = entry.value.borrow().clone()?;
        let next = derive(&previous)?;
        entry.read_generation = entry.read_generation.wrapping_add(1);
        entry.value.send_replace(Some(next));
        debug!(key = %key, "cache entry patched");
        Some(previous)
    }

    /// Discard the results of reads of `key` that are still in flight.
    pub fn cancel_reads(&self, key: &QueryKey) {
        if let Some(entry) = self.lock().get_mut(key) {
            entry.read_generation = entry.read_generation.wrapping_add(1);
        }
    }

    /// Register the start of a read of `key`.
    pub fn begin_read(&self, key: &QueryKey) -> ReadTicket {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::empty);
        ReadTicket {
            key: key.clone(),
            generation: entry.read_generation,
        }
    }

    /// Store the result of a read unless it was cancelled.
    ///
    /// Returns `false`, leaving the entry untouched, when the read was
    /// superseded by [`Self::cancel_reads`] or an optimistic [`Self::patch`].
    pub fn complete_read(&self, ticket: &ReadTicket, value: V) -> bool {
        let mut entries = self.lock();
        let entry = entries
            .entry(ticket.key.clone())
            .or_insert_with(Entry::empty);
        if entry.read_generation != ticket.generation {
            debug!(key = %ticket.key, "discarding superseded read");
            return false;
        }
        entry.value.send_replace(Some(value));
        entry.stale = false;
        debug!(key = %ticket.key, "cache entry filled from read");
        true
    }

    /// Mark `key` stale without touching its value.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.lock().get_mut(key) {
            entry.stale = true;
            debug!(key = %key, "cache entry invalidated");
        }
    }

    /// Mark every key equal to or nested under `prefix` stale.
    ///
    /// Returns the keys that exist in the cache, sorted for determinism.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) -> Vec<QueryKey> {
        let mut entries = self.lock();
        let mut marked: Vec<QueryKey> = entries
            .iter_mut()
            .filter(|(key, _)| key.is_within(prefix))
            .map(|(key, entry)| {
                entry.stale = true;
                key.clone()
            })
            .collect();
        marked.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        debug!(prefix = %prefix, count = marked.len(), "cache prefix invalidated");
        marked
    }

    /// Whether `key` needs a refetch. Unknown keys are stale.
    #[must_use]
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.lock().get(key).is_none_or(|entry| entry.stale)
    }

    /// Observe the value of `key`.
    #[must_use]
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<Option<V>> {
        let mut entries = self.lock();
        entries
            .entry(key.clone())
            .or_insert_with(Entry::empty)
            .value
            .subscribe()
    }
}

#[cfg(test)]
mod tests {
    //! Read cancellation, invalidation, and observation semantics.
    use super::*;
    use crate::domain::TodoId;
    use rstest::{fixture, rstest};

    #[fixture]
    fn cache() -> QueryCache<Vec<u32>> {
        let cache = QueryCache::new();
        cache.set(&QueryKey::todo_list(), vec![1, 2, 3]);
        cache
    }

    #[rstest]
    fn debug_lists_cached_keys(cache: QueryCache<Vec<u32>>) {
        assert_eq!(format!("{cache:?}"), r#"QueryCache { keys: ["todos"] }"#);
    }

    #[rstest]
    fn debug_does_not_require_cloneable_values() {
        let cache: QueryCache<Mutex<u8>> = QueryCache::default();
        assert_eq!(format!("{cache:?}"), "QueryCache { keys: [] }");
    }

    #[rstest]
    fn unknown_keys_are_empty_and_stale() {
        let cache: QueryCache<Vec<u32>> = QueryCache::new();
        let key = QueryKey::todo_list();
        assert_eq!(cache.get(&key), None);
        assert!(cache.is_stale(&key));
    }

    #[rstest]
    fn completed_reads_fill_the_entry(cache: QueryCache<Vec<u32>>) {
        let key = QueryKey::todo_list();
        let ticket = cache.begin_read(&key);
        assert!(cache.complete_read(&ticket, vec![9]));
        assert_eq!(cache.get(&key), Some(vec![9]));
    }

    #[rstest]
    fn cancelled_reads_are_discarded(cache: QueryCache<Vec<u32>>) {
        let key = QueryKey::todo_list();
        let ticket = cache.begin_read(&key);
        cache.cancel_reads(&key);
        assert!(!cache.complete_read(&ticket, vec![9]));
        assert_eq!(cache.get(&key), Some(vec![1, 2, 3]));
    }

    #[rstest]
    fn patch_returns_snapshot_and_supersedes_reads(cache: QueryCache<Vec<u32>>) {
        let key = QueryKey::todo_list();
        let ticket = cache.begin_read(&key);
        let snapshot = cache.patch(&key, |items| {
            Some(items.iter().copied().filter(|item| *item != 2).collect())
        });
        assert_eq!(snapshot, Some(vec![1, 2, 3]));
        assert_eq!(cache.get(&key), Some(vec![1, 3]));
        assert!(!cache.complete_read(&ticket, vec![7]));
    }

    #[rstest]
    fn declined_patch_keeps_reads_alive(cache: QueryCache<Vec<u32>>) {
        let key = QueryKey::todo_list();
        let ticket = cache.begin_read(&key);
        assert_eq!(cache.patch(&key, |_| None), None);
        assert!(cache.complete_read(&ticket, vec![4]));
    }

    #[rstest]
    fn invalidation_is_idempotent_and_keeps_values(cache: QueryCache<Vec<u32>>) {
        let key = QueryKey::todo_list();
        cache.invalidate(&key);
        let once = (cache.get(&key), cache.is_stale(&key));
        cache.invalidate(&key);
        let twice = (cache.get(&key), cache.is_stale(&key));
        assert_eq!(once, twice);
        assert_eq!(once, (Some(vec![1, 2, 3]), true));
    }

    #[rstest]
    fn prefix_invalidation_reaches_nested_keys(cache: QueryCache<Vec<u32>>) {
        let detail = QueryKey::todo_detail(TodoId::new(2));
        let other = QueryKey::new("settings").expect("valid key");
        cache.set(&detail, vec![2]);
        cache.set(&other, vec![0]);

        let marked = cache.invalidate_prefix(&QueryKey::todo_list());

        assert_eq!(marked, vec![QueryKey::todo_list(), detail.clone()]);
        assert!(cache.is_stale(&detail));
        assert!(!cache.is_stale(&other));
    }

    #[rstest]
    fn subscribers_observe_writes(cache: QueryCache<Vec<u32>>) {
        let key = QueryKey::todo_list();
        let mut receiver = cache.subscribe(&key);
        assert_eq!(*receiver.borrow_and_update(), Some(vec![1, 2, 3]));
        cache.set(&key, vec![5]);
        assert!(receiver.has_changed().expect("sender alive"));
        assert_eq!(*receiver.borrow_and_update(), Some(vec![5]));
    }

    #[rstest]
    fn remove_clears_and_returns_value(cache: QueryCache<Vec<u32>>) {
        let key = QueryKey::todo_list();
        assert_eq!(cache.remove(&key), Some(vec![1, 2, 3]));
        assert_eq!(cache.get(&key), None);
    }
}
