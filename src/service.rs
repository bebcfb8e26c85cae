//! `SearchService`: the wired-up facade the rest of the storefront talks
//! to.
//!
//! All collaborators are constructed by the caller and injected here —
//! index store, both source stores, configuration. The service owns the
//! worker pool and the response cache. Lifecycle: [`SearchService::start`]
//! inside a tokio runtime at process start, [`SearchService::shutdown`] on
//! process exit.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::query::{
    self, PopularItem, SearchCache, SearchRequest, SearchResponse, Suggestion,
};
use crate::queue::{FailedJob, JobKind, JobQueue, WorkerContext, WorkerPool};
use crate::rebuild::{self, RebuildReport};
use crate::record::EntityType;
use crate::source::{CategoryStore, ProductStore};
use crate::store::IndexStore;
use crate::sync::{self, SyncOutcome};
use crate::trigger;

pub struct SearchService {
    store: Arc<IndexStore>,
    products: Arc<dyn ProductStore>,
    categories: Arc<dyn CategoryStore>,
    cache: Arc<SearchCache>,
    pool: WorkerPool,
    config: Config,
}

impl SearchService {
    /// Wire the subsystem together and spawn the worker pool. Must be
    /// called from within a tokio runtime.
    #[must_use]
    pub fn start(
        store: Arc<IndexStore>,
        products: Arc<dyn ProductStore>,
        categories: Arc<dyn CategoryStore>,
        config: Config,
    ) -> Self {
        let cache = Arc::new(SearchCache::new(config.query.cache_size));
        let ctx = WorkerContext {
            store: Arc::clone(&store),
            products: Arc::clone(&products),
            categories: Arc::clone(&categories),
            cache: Arc::clone(&cache),
        };
        let pool = WorkerPool::spawn(ctx, &config.queue, &config.retry);
        info!("search service started");
        Self {
            store,
            products,
            categories,
            cache,
            pool,
            config,
        }
    }

    /// Stop accepting jobs and drain the pool. Returns jobs that had
    /// permanently failed, for ops replay.
    pub async fn shutdown(self) -> Vec<FailedJob> {
        self.pool.shutdown().await
    }

    // -------------------------------------------------------------------
    // Queries (synchronous reads)
    // -------------------------------------------------------------------

    /// Ranked, filtered, paginated search. A zero `limit` falls back to
    /// the configured default page size.
    pub fn search(&self, mut request: SearchRequest) -> Result<SearchResponse> {
        if request.limit == 0 {
            request.limit = self.config.query.default_limit;
        }
        if let Some(cached) = self.cache.get(&request) {
            return Ok(cached);
        }
        let response = query::search(&self.store, &request)?;
        self.cache.put(&request, response.clone());
        Ok(response)
    }

    /// Prefix autocomplete, capped at the configured suggestion limit.
    pub fn suggestions(&self, query_text: &str) -> Result<Vec<Suggestion>> {
        query::suggestions(&self.store, query_text, self.config.query.suggestion_limit)
    }

    /// Most popular active records of one entity type.
    pub fn popular(&self, entity_type: EntityType) -> Result<Vec<PopularItem>> {
        query::popular(&self.store, entity_type, self.config.query.popular_limit)
    }

    // -------------------------------------------------------------------
    // Sync (direct synchronous path)
    // -------------------------------------------------------------------

    /// Project and apply one product immediately, bypassing the queue.
    pub fn sync_product(&self, entity_id: &str) -> Result<SyncOutcome> {
        let outcome = sync::sync_product(
            &self.store,
            self.products.as_ref(),
            self.categories.as_ref(),
            entity_id,
        )?;
        self.cache.invalidate();
        Ok(outcome)
    }

    /// Project and apply one category immediately, bypassing the queue.
    pub fn sync_category(&self, entity_id: &str) -> Result<SyncOutcome> {
        let outcome = sync::sync_category(&self.store, self.categories.as_ref(), entity_id)?;
        self.cache.invalidate();
        Ok(outcome)
    }

    /// Clear and repopulate the whole index, returning the per-entity
    /// report. Runs inline on the calling thread; enqueue
    /// [`JobKind::RebuildIndex`] instead to run it on the pool.
    pub fn rebuild_index(&self) -> Result<RebuildReport> {
        let report = rebuild::rebuild_index(
            &self.store,
            self.products.as_ref(),
            self.categories.as_ref(),
        )?;
        self.cache.invalidate();
        Ok(report)
    }

    // -------------------------------------------------------------------
    // Async path + triggers
    // -------------------------------------------------------------------

    /// Fire-and-forget job submission.
    pub fn enqueue(&self, kind: JobKind) -> Result<uuid::Uuid> {
        self.pool.queue().enqueue(kind)
    }

    /// Producer handle for code paths that outlive borrowing the service.
    #[must_use]
    pub fn queue(&self) -> JobQueue {
        self.pool.queue()
    }

    /// Change-trigger hooks; see [`crate::trigger`] for semantics.
    pub fn product_saved(&self, entity_id: &str) {
        trigger::product_saved(&self.pool.queue(), entity_id);
    }

    pub fn category_saved(&self, entity_id: &str) {
        trigger::category_saved(&self.pool.queue(), entity_id);
    }

    pub fn product_deleted(&self, entity_id: &str) {
        trigger::product_deleted(&self.store, &self.pool.queue(), entity_id);
        self.cache.invalidate();
    }

    pub fn category_deleted(&self, entity_id: &str) {
        trigger::category_deleted(&self.store, &self.pool.queue(), entity_id);
        self.cache.invalidate();
    }

    // -------------------------------------------------------------------
    // Observability
    // -------------------------------------------------------------------

    #[must_use]
    pub fn failed_jobs(&self) -> Vec<FailedJob> {
        self.pool.failed_jobs()
    }

    #[must_use]
    pub fn store(&self) -> &IndexStore {
        &self.store
    }
}
