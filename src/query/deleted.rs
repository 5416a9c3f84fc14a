//! Deleted-inscription tracking.
//!
//! A delete is optimistic: the ID is marked before the server answers,
//! and while it is marked no query for that inscription may run or
//! display a cached payload - a late prefetch or a stale mounted view
//! must not revive the row. Marking synchronously evicts the
//! inscription's cache entries and aborts its in-flight requests.

use std::collections::HashSet;
use std::sync::Mutex;

use tracing::{debug, info};

use super::cache::QueryCache;
use super::keys;

/// State transitions reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletedChange {
    Marked(i64),
    Unmarked(i64),
    Cleared,
}

type Observer = Box<dyn Fn(DeletedChange) + Send + Sync>;

pub struct DeletedTracker {
    cache: QueryCache,
    ids: Mutex<HashSet<i64>>,
    observers: Mutex<Vec<Observer>>,
}

impl DeletedTracker {
    pub fn new(cache: QueryCache) -> Self {
        Self {
            cache,
            ids: Mutex::new(HashSet::new()),
            observers: Mutex::new(Vec::new()),
        }
    }

    fn lock_ids(&self) -> std::sync::MutexGuard<'_, HashSet<i64>> {
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mark an inscription deleted. Evicts its cache entries first so no
    /// stale payload can resurface, then aborts anything still running.
    pub fn mark_as_deleted(&self, id: i64) {
        if !self.lock_ids().insert(id) {
            return;
        }
        let prefix = keys::inscription(id);
        self.cache.remove(&prefix);
        self.cache.cancel(&prefix);
        info!(inscription_id = id, "inscription marked deleted");
        self.notify(DeletedChange::Marked(id));
    }

    /// Un-mark a single inscription (delete failed, rolling back).
    pub fn remove_from_deleted(&self, id: i64) {
        if self.lock_ids().remove(&id) {
            debug!(inscription_id = id, "inscription delete rolled back");
            self.notify(DeletedChange::Unmarked(id));
        }
    }

    /// Bulk reset of the deleted set.
    pub fn clear_deleted(&self) {
        self.lock_ids().clear();
        self.notify(DeletedChange::Cleared);
    }

    /// Pure membership check; feeds the `enabled` condition of every
    /// inscription-scoped query.
    pub fn is_deleted(&self, id: i64) -> bool {
        self.lock_ids().contains(&id)
    }

    pub fn deleted_count(&self) -> usize {
        self.lock_ids().len()
    }

    /// Register a callback fired on every state transition.
    pub fn subscribe(&self, observer: impl Fn(DeletedChange) + Send + Sync + 'static) {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Box::new(observer));
    }

    fn notify(&self, change: DeletedChange) {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for observer in observers.iter() {
            observer(change);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::cache::{FetchFn, QueryOptions};
    use chrono::Duration;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_fetch(counter: Arc<AtomicUsize>) -> FetchFn {
        Arc::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::json!({"name": "Ana"}))
            }
            .boxed()
        })
    }

    fn fresh_opts(enabled: bool) -> QueryOptions {
        QueryOptions {
            stale_time: Duration::minutes(5),
            enabled,
            ..QueryOptions::default()
        }
    }

    #[tokio::test]
    async fn test_mark_evicts_cached_entries() {
        let cache = QueryCache::new();
        let tracker = DeletedTracker::new(cache.clone());
        let key = keys::inscription_analytics(3, 0, 20);
        let counter = Arc::new(AtomicUsize::new(0));

        cache
            .query(&key, counting_fetch(counter.clone()), fresh_opts(true))
            .await;
        assert!(cache.contains(&key));

        tracker.mark_as_deleted(3);

        assert!(tracker.is_deleted(3));
        assert!(!cache.contains(&key));
    }

    #[tokio::test]
    async fn test_marked_id_suppresses_queries() {
        let cache = QueryCache::new();
        let tracker = DeletedTracker::new(cache.clone());
        let key = keys::inscription_analytics(3, 0, 20);
        let counter = Arc::new(AtomicUsize::new(0));
        let fetch = counting_fetch(counter.clone());

        cache.query(&key, fetch.clone(), fresh_opts(true)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tracker.mark_as_deleted(3);

        // The disabled query neither fetches nor reports the old payload
        let status = cache
            .query(&key, fetch, fresh_opts(!tracker.is_deleted(3)))
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(status.data, None);
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_rollback_restores_query_behavior() {
        let cache = QueryCache::new();
        let tracker = DeletedTracker::new(cache.clone());
        let key = keys::inscription_detail(8);
        let counter = Arc::new(AtomicUsize::new(0));
        let fetch = counting_fetch(counter.clone());

        tracker.mark_as_deleted(8);
        tracker.remove_from_deleted(8);
        assert!(!tracker.is_deleted(8));

        let status = cache
            .query(&key, fetch, fresh_opts(!tracker.is_deleted(8)))
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(status.data.is_some());
    }

    #[tokio::test]
    async fn test_clear_deleted_resets_all() {
        let cache = QueryCache::new();
        let tracker = DeletedTracker::new(cache);

        tracker.mark_as_deleted(1);
        tracker.mark_as_deleted(2);
        assert_eq!(tracker.deleted_count(), 2);

        tracker.clear_deleted();
        assert_eq!(tracker.deleted_count(), 0);
        assert!(!tracker.is_deleted(1));
    }

    #[tokio::test]
    async fn test_observers_see_transitions() {
        let cache = QueryCache::new();
        let tracker = DeletedTracker::new(cache);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        tracker.subscribe(move |change| {
            sink.lock().expect("observer sink").push(change);
        });

        tracker.mark_as_deleted(5);
        tracker.mark_as_deleted(5); // already marked, no second event
        tracker.remove_from_deleted(5);
        tracker.clear_deleted();

        let events = seen.lock().expect("observer sink").clone();
        assert_eq!(
            events,
            vec![
                DeletedChange::Marked(5),
                DeletedChange::Unmarked(5),
                DeletedChange::Cleared,
            ]
        );
    }
}
