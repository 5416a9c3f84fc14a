//! Service wiring for the console core.
//!
//! `App` owns the gateway, the query cache, the deleted-inscription
//! tracker, and the draft store, and exposes the cached reads and
//! mutations the screens are built from. Everything is constructor
//! injected so tests can stand up isolated instances.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::group::GroupInscriptionFlow;
use crate::models::{
    Event, EventAnalysisRow, EventDraft, Inscription, InscriptionAnalyticsRow,
    InscriptionStatus, Page, Payment, PaymentStatus, Ticket, TicketSale,
};
use crate::query::{keys, DeletedTracker, FetchFn, QueryCache, QueryError, QueryKey, QueryOptions};
use crate::store::DraftStore;

/// Staleness window for listing screens.
/// Thirty seconds keeps tables responsive while the operator paginates.
const LIST_STALE_SECONDS: i64 = 30;

/// Three-phase optimistic delete. `begin` has already marked the
/// inscription and evicted its cache entries; `commit` keeps the mark
/// and refreshes listings, `rollback` restores normal query behavior.
pub struct DeletionGuard {
    deleted: Arc<DeletedTracker>,
    cache: QueryCache,
    inscription_id: i64,
}

impl DeletionGuard {
    pub fn commit(self) {
        // Listings may still contain the row; stale-mark them for refetch.
        self.cache.invalidate(&keys::events());
        info!(inscription_id = self.inscription_id, "inscription delete committed");
    }

    pub fn rollback(self) {
        self.deleted.remove_from_deleted(self.inscription_id);
    }
}

pub struct App {
    pub config: Config,
    pub api: ApiClient,
    pub cache: QueryCache,
    pub deleted: Arc<DeletedTracker>,
    pub drafts: Arc<DraftStore>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(config.api_base_url())?;
        let cache = QueryCache::new();
        let deleted = Arc::new(DeletedTracker::new(cache.clone()));
        let drafts = Arc::new(DraftStore::new(config.data_dir()?)?);
        Ok(Self {
            config,
            api,
            cache,
            deleted,
            drafts,
        })
    }

    /// A fresh upload/confirm flow bound to this app's gateway and store.
    pub fn group_flow(&self) -> GroupInscriptionFlow {
        GroupInscriptionFlow::new(self.api.clone(), Arc::clone(&self.drafts))
    }

    async fn cached<T: DeserializeOwned>(
        &self,
        key: QueryKey,
        enabled: bool,
        fetch: FetchFn,
    ) -> Result<Option<T>> {
        let opts = QueryOptions {
            stale_time: chrono::Duration::seconds(LIST_STALE_SECONDS),
            enabled,
            ..QueryOptions::default()
        };
        let status = self.cache.query(&key, fetch, opts).await;
        if let Some(err) = status.error {
            return Err(anyhow::Error::new(err));
        }
        status
            .data
            .map(serde_json::from_value)
            .transpose()
            .context("Cached payload did not match the expected shape")
    }

    // ===== Events =====

    pub async fn events_page(&self, page: u32, page_size: u32) -> Result<Option<Page<Event>>> {
        let api = self.api.clone();
        let fetch = fetch_fn(move || {
            let api = api.clone();
            async move { api.fetch_events(page, page_size).await }
        });
        let result: Option<Page<Event>> = self
            .cached(keys::event_list(page, page_size), true, fetch)
            .await
            .context("Failed to load events")?;

        // Warm the next page while the operator reads this one.
        if let Some(current) = &result {
            if current.has_next() {
                self.prefetch_events_page(page + 1, page_size);
            }
        }
        Ok(result)
    }

    pub fn prefetch_events_page(&self, page: u32, page_size: u32) {
        let api = self.api.clone();
        let fetch = fetch_fn(move || {
            let api = api.clone();
            async move { api.fetch_events(page, page_size).await }
        });
        self.cache.prefetch(&keys::event_list(page, page_size), fetch);
    }

    pub async fn event_detail(&self, id: i64) -> Result<Option<Event>> {
        let api = self.api.clone();
        let fetch = fetch_fn(move || {
            let api = api.clone();
            async move { api.fetch_event(id).await }
        });
        self.cached(keys::event_detail(id), true, fetch)
            .await
            .context("Failed to load event")
    }

    pub async fn event_analysis(
        &self,
        event_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Option<Page<EventAnalysisRow>>> {
        let api = self.api.clone();
        let fetch = fetch_fn(move || {
            let api = api.clone();
            async move { api.fetch_event_analysis(event_id, page, page_size).await }
        });
        self.cached(keys::event_analysis(event_id, page, page_size), true, fetch)
            .await
            .context("Failed to load event analysis")
    }

    pub async fn event_inscriptions(
        &self,
        event_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Option<Page<Inscription>>> {
        let api = self.api.clone();
        let fetch = fetch_fn(move || {
            let api = api.clone();
            async move { api.fetch_event_inscriptions(event_id, page, page_size).await }
        });
        self.cached(
            keys::event_inscriptions(event_id, page, page_size),
            true,
            fetch,
        )
        .await
        .context("Failed to load inscriptions")
    }

    pub async fn create_event(&self, draft: &EventDraft) -> Result<Event> {
        let event = self
            .api
            .create_event(draft)
            .await
            .context("Failed to create event")?;
        self.cache.invalidate(&keys::events());
        Ok(event)
    }

    pub async fn update_event(&self, id: i64, draft: &EventDraft) -> Result<Event> {
        let event = self
            .api
            .update_event(id, draft)
            .await
            .context("Failed to update event")?;
        self.cache.invalidate(&keys::events());
        Ok(event)
    }

    pub async fn delete_event(&self, id: i64) -> Result<()> {
        self.api
            .delete_event(id)
            .await
            .context("Failed to delete event")?;
        self.cache.remove(&keys::event_detail(id));
        self.cache.invalidate(&keys::events());
        Ok(())
    }

    // ===== Inscriptions =====

    pub async fn inscription_detail(&self, id: i64) -> Result<Option<Inscription>> {
        let enabled = !self.deleted.is_deleted(id);
        let api = self.api.clone();
        let fetch = fetch_fn(move || {
            let api = api.clone();
            async move { api.fetch_inscription(id).await }
        });
        self.cached(keys::inscription_detail(id), enabled, fetch)
            .await
            .context("Failed to load inscription")
    }

    pub async fn inscription_analytics(
        &self,
        id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Option<Page<InscriptionAnalyticsRow>>> {
        let enabled = !self.deleted.is_deleted(id);
        let api = self.api.clone();
        let fetch = fetch_fn(move || {
            let api = api.clone();
            async move { api.fetch_inscription_analytics(id, page, page_size).await }
        });
        self.cached(keys::inscription_analytics(id, page, page_size), enabled, fetch)
            .await
            .context("Failed to load inscription analytics")
    }

    /// Begin an optimistic delete: the inscription is marked deleted and
    /// its cache entries are evicted before any server round-trip.
    pub fn begin_delete(&self, inscription_id: i64) -> DeletionGuard {
        self.deleted.mark_as_deleted(inscription_id);
        DeletionGuard {
            deleted: Arc::clone(&self.deleted),
            cache: self.cache.clone(),
            inscription_id,
        }
    }

    pub async fn delete_inscription(&self, inscription_id: i64) -> Result<()> {
        let guard = self.begin_delete(inscription_id);
        match self.api.delete_inscription(inscription_id).await {
            Ok(()) => {
                guard.commit();
                Ok(())
            }
            Err(err) => {
                warn!(inscription_id, error = %err, "delete failed, rolling back");
                guard.rollback();
                Err(err).context("Failed to delete inscription")
            }
        }
    }

    pub async fn update_inscription_status(
        &self,
        id: i64,
        status: InscriptionStatus,
    ) -> Result<()> {
        self.api
            .update_inscription_status(id, status)
            .await
            .context("Failed to update inscription status")?;
        self.cache.invalidate(&keys::inscription(id));
        self.cache.invalidate(&keys::events());
        Ok(())
    }

    // ===== Payments =====

    pub async fn payments_page(
        &self,
        event_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Option<Page<Payment>>> {
        let api = self.api.clone();
        let fetch = fetch_fn(move || {
            let api = api.clone();
            async move { api.fetch_event_payments(event_id, page, page_size).await }
        });
        self.cached(keys::payments_page(event_id, page, page_size), true, fetch)
            .await
            .context("Failed to load payments")
    }

    pub async fn update_payment_status(
        &self,
        payment_id: i64,
        event_id: i64,
        status: PaymentStatus,
    ) -> Result<()> {
        self.api
            .update_payment_status(payment_id, status)
            .await
            .context("Failed to update payment status")?;
        self.cache.invalidate(&keys::payments(event_id));
        Ok(())
    }

    // ===== Tickets =====

    pub async fn tickets_page(
        &self,
        event_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Option<Page<Ticket>>> {
        let api = self.api.clone();
        let fetch = fetch_fn(move || {
            let api = api.clone();
            async move { api.fetch_event_tickets(event_id, page, page_size).await }
        });
        self.cached(keys::tickets_page(event_id, page, page_size), true, fetch)
            .await
            .context("Failed to load tickets")
    }

    pub async fn sell_ticket(&self, sale: &TicketSale) -> Result<Ticket> {
        let ticket = self
            .api
            .sell_ticket(sale)
            .await
            .context("Failed to sell ticket")?;
        self.cache.invalidate(&keys::tickets(sale.event_id));
        Ok(ticket)
    }
}

/// Adapt a typed gateway call into the cache's type-erased fetch shape.
fn fetch_fn<T, Fut, F>(call: F) -> FetchFn
where
    T: Serialize,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    Arc::new(move || {
        let fut = call();
        async move {
            let value = fut.await.map_err(QueryError::from)?;
            serde_json::to_value(value).map_err(|err| QueryError::Rejected(err.to_string()))
        }
        .boxed()
    })
}

// ============================================================================
// Tests
// ============================================================================
