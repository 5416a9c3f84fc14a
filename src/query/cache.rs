//! Client-side query cache.
//!
//! Reads go through [`QueryCache::query`], which serves fresh entries
//! without I/O, returns stale entries immediately while a background
//! refetch runs, and coalesces concurrent callers onto a single
//! in-flight request per key. Imperative `invalidate` / `remove` /
//! `cancel` / `prefetch` operations act on key prefixes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::ApiError;

use super::key::QueryKey;

/// Retries applied when the caller does not override them.
const DEFAULT_RETRY: u32 = 2;

/// Entries unused for this long are dropped by the garbage sweep.
const DEFAULT_GC_MINUTES: i64 = 5;

/// Initial backoff delay in milliseconds between retry attempts.
const INITIAL_BACKOFF_MS: u64 = 250;

pub type FetchFuture = BoxFuture<'static, Result<Value, QueryError>>;

/// Fetch functions must be re-invokable so the retry loop can issue a
/// fresh request per attempt.
pub type FetchFn = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("request cancelled")]
    Cancelled,

    /// Transport or 5xx failure - eligible for retry.
    #[error("{0}")]
    Transport(String),

    /// 4xx failure - never retried.
    #[error("{0}")]
    Rejected(String),
}

impl QueryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::Transport(_))
    }
}

impl From<ApiError> for QueryError {
    fn from(err: ApiError) -> Self {
        if err.is_retryable() {
            QueryError::Transport(err.to_string())
        } else {
            QueryError::Rejected(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// How long a fetched payload counts as fresh.
    pub stale_time: Duration,
    /// How long an unused entry survives before the garbage sweep drops it.
    pub gc_time: Duration,
    /// Retries for retryable failures before the error surfaces.
    pub retry: u32,
    /// Disabled queries never fetch; they only report the last known value.
    pub enabled: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::zero(),
            gc_time: Duration::minutes(DEFAULT_GC_MINUTES),
            retry: DEFAULT_RETRY,
            enabled: true,
        }
    }
}

/// Outcome of a [`QueryCache::query`] call.
#[derive(Debug, Clone)]
pub struct QueryStatus {
    pub data: Option<Value>,
    pub error: Option<QueryError>,
    /// A refetch is still running in the background for this key.
    pub refreshing: bool,
}

#[derive(Clone)]
struct InFlight {
    shared: Shared<FetchFuture>,
    cancelled: Arc<AtomicBool>,
}

struct CacheEntry {
    data: Option<Value>,
    fetched_at: Option<DateTime<Utc>>,
    invalidated: bool,
    stale_time: Duration,
    gc_time: Duration,
    last_access: DateTime<Utc>,
    in_flight: Option<InFlight>,
}

impl CacheEntry {
    fn new(opts: &QueryOptions) -> Self {
        Self {
            data: None,
            fetched_at: None,
            invalidated: false,
            stale_time: opts.stale_time,
            gc_time: opts.gc_time,
            last_access: Utc::now(),
            in_flight: None,
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        if self.invalidated {
            return false;
        }
        match self.fetched_at {
            Some(at) => now - at <= self.stale_time,
            None => false,
        }
    }
}

/// Query cache shared across the whole console.
/// Clone is cheap - the entry table lives behind a shared Arc.
#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<QueryKey, CacheEntry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // The lock is only ever held between awaits, never across one; that is
    // what keeps check-then-act sequences atomic.
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read through the cache.
    ///
    /// Fresh entries return without I/O. Stale entries return their last
    /// payload immediately while a background refetch runs. Cold entries
    /// await the fetch. Concurrent callers for one key share a single
    /// in-flight request.
    pub async fn query(&self, key: &QueryKey, fetch: FetchFn, opts: QueryOptions) -> QueryStatus {
        self.sweep();
        let now = Utc::now();

        let (flight, stale, created) = {
            let mut entries = self.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(&opts));
            entry.last_access = now;
            entry.stale_time = opts.stale_time;
            entry.gc_time = opts.gc_time;

            if !opts.enabled {
                return QueryStatus {
                    data: entry.data.clone(),
                    error: None,
                    refreshing: false,
                };
            }

            if entry.is_fresh(now) {
                return QueryStatus {
                    data: entry.data.clone(),
                    error: None,
                    refreshing: false,
                };
            }

            match entry.in_flight.clone() {
                Some(flight) => (flight, entry.data.clone(), false),
                None => {
                    let flight = InFlight {
                        shared: run_with_retry(fetch, opts.retry).shared(),
                        cancelled: Arc::new(AtomicBool::new(false)),
                    };
                    entry.in_flight = Some(flight.clone());
                    (flight, entry.data.clone(), true)
                }
            }
        };

        if created {
            // The driver task writes the result back and clears the
            // in-flight handle, whether or not any caller is still waiting.
            let driver = self.clone();
            let driver_key = key.clone();
            let driver_flight = flight.clone();
            tokio::spawn(async move {
                driver.settle(driver_key, driver_flight).await;
            });
        }

        if let Some(stale) = stale {
            // Stale-while-revalidate: serve the old payload now.
            return QueryStatus {
                data: Some(stale),
                error: None,
                refreshing: true,
            };
        }

        let result = flight.shared.clone().await;
        // Write back before returning so the caller observes its own
        // result in the cache; the driver's later attempt is a no-op.
        self.commit_result(key, &flight, &result);
        if flight.cancelled.load(Ordering::SeqCst) {
            return QueryStatus {
                data: None,
                error: Some(QueryError::Cancelled),
                refreshing: false,
            };
        }
        match result {
            Ok(value) => QueryStatus {
                data: Some(value),
                error: None,
                refreshing: false,
            },
            Err(err) => QueryStatus {
                data: None,
                error: Some(err),
                refreshing: false,
            },
        }
    }

    /// Populate an entry ahead of need. Best-effort: never blocks the
    /// caller and failures stay silent (logged at debug by the driver).
    pub fn prefetch(&self, key: &QueryKey, fetch: FetchFn) {
        let opts = QueryOptions::default();
        let now = Utc::now();
        let flight = {
            let mut entries = self.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(&opts));
            if entry.is_fresh(now) || entry.in_flight.is_some() {
                return;
            }
            let flight = InFlight {
                shared: run_with_retry(fetch, opts.retry).shared(),
                cancelled: Arc::new(AtomicBool::new(false)),
            };
            entry.in_flight = Some(flight.clone());
            flight
        };

        debug!(key = %key, "prefetching");
        let driver = self.clone();
        let driver_key = key.clone();
        tokio::spawn(async move {
            driver.settle(driver_key, flight).await;
        });
    }

    /// Mark every entry under the prefix stale; each refetches on its next
    /// access.
    pub fn invalidate(&self, prefix: &QueryKey) {
        let mut entries = self.lock();
        let mut count = 0usize;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                count += 1;
            }
        }
        debug!(prefix = %prefix, count, "invalidated cache entries");
    }

    /// Evict every entry under the prefix. In-flight requests for evicted
    /// entries are poisoned so a late resolution cannot resurface.
    pub fn remove(&self, prefix: &QueryKey) {
        let mut entries = self.lock();
        entries.retain(|key, entry| {
            if !key.starts_with(prefix) {
                return true;
            }
            if let Some(flight) = &entry.in_flight {
                flight.cancelled.store(true, Ordering::SeqCst);
            }
            false
        });
    }

    /// Abort in-flight requests under the prefix. Cached payloads stay;
    /// the aborted result is discarded instead of written.
    pub fn cancel(&self, prefix: &QueryKey) {
        let mut entries = self.lock();
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                if let Some(flight) = entry.in_flight.take() {
                    flight.cancelled.store(true, Ordering::SeqCst);
                    debug!(key = %key, "cancelled in-flight request");
                }
            }
        }
    }

    /// Drop every entry. Used at logout/teardown.
    pub fn clear(&self) {
        let mut entries = self.lock();
        for entry in entries.values() {
            if let Some(flight) = &entry.in_flight {
                flight.cancelled.store(true, Ordering::SeqCst);
            }
        }
        entries.clear();
    }

    /// Whether a payload is cached for the exact key.
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().get(key).is_some_and(|entry| entry.data.is_some())
    }

    /// Cached payload for the exact key, without touching access time.
    pub fn peek(&self, key: &QueryKey) -> Option<Value> {
        self.lock().get(key).and_then(|entry| entry.data.clone())
    }

    /// Whether the exact key holds a payload still inside its staleness
    /// window.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        let now = Utc::now();
        self.lock().get(key).is_some_and(|entry| entry.is_fresh(now))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Await the in-flight result and write it back. Runs as a spawned
    /// task so the entry settles even when no caller is left waiting.
    async fn settle(&self, key: QueryKey, flight: InFlight) {
        let result = flight.shared.clone().await;
        self.commit_result(&key, &flight, &result);
    }

    /// Idempotent write-back, guarded check-before-write: nothing lands
    /// if the entry was evicted, the request cancelled, or a newer
    /// request superseded this one.
    fn commit_result(
        &self,
        key: &QueryKey,
        flight: &InFlight,
        result: &Result<Value, QueryError>,
    ) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return; // evicted while fetching
        };
        let Some(current) = &entry.in_flight else {
            return; // cancelled, or already committed
        };
        if !Arc::ptr_eq(&current.cancelled, &flight.cancelled) {
            return; // superseded by a newer request
        }
        entry.in_flight = None;
        if flight.cancelled.load(Ordering::SeqCst) {
            return;
        }
        match result {
            Ok(value) => {
                entry.data = Some(value.clone());
                entry.fetched_at = Some(Utc::now());
                entry.invalidated = false;
            }
            Err(err) => {
                debug!(key = %key, error = %err, "query fetch failed");
            }
        }
    }

    /// Evict entries unused past their gc window. Entries with a request
    /// in flight are kept.
    fn sweep(&self) {
        let now = Utc::now();
        let mut entries = self.lock();
        entries.retain(|_, entry| {
            entry.in_flight.is_some() || now - entry.last_access <= entry.gc_time
        });
    }
}

/// Re-issue the fetch until it succeeds, the failure is non-retryable,
/// or the retry count runs out. Backoff doubles between attempts.
fn run_with_retry(fetch: FetchFn, retry: u32) -> FetchFuture {
    async move {
        let mut attempt: u32 = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        loop {
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < retry => {
                    attempt += 1;
                    warn!(attempt, error = %err, "query attempt failed, backing off");
                    tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
                Err(err) => return Err(err),
            }
        }
    }
    .boxed()
}

// ============================================================================
// Tests
// ============================================================================
