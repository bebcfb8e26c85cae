//! catalog-search — search index synchronization and query engine for the
//! storefront catalog.
//!
//! Keeps a denormalized, search-optimized copy of products and categories
//! in sync with the two source-of-truth stores, and answers ranked,
//! filtered, paginated queries against it.
//!
//! The moving parts, leaf first:
//! - [`store::IndexStore`] — sqlite-backed keyed store, one record per
//!   (entity type, entity id)
//! - [`sync::projector`] — pure source-entity → index-record projections
//! - [`sync::executor`] — applies projections (replace-by-key upsert, or
//!   delete when the source is gone)
//! - [`queue`] — at-least-once job channel + bounded, rate-limited worker
//!   pool with retry/backoff
//! - [`trigger`] — explicit post-mutation hooks, best-effort enqueue
//! - [`query`] — weighted term/field search, suggestions, popular listings
//! - [`rebuild`] — full clear-and-repopulate with a per-entity report
//! - [`service::SearchService`] — the dependency-injected facade tying it
//!   together

pub mod config;
pub mod error;
pub mod query;
pub mod queue;
pub mod rebuild;
pub mod record;
pub mod service;
pub mod source;
pub mod store;
pub mod sync;
pub mod test_utils;
pub mod trigger;

pub use config::Config;
pub use error::{Result, SearchError};
pub use query::{
    PopularItem, SearchFilters, SearchRequest, SearchResponse, SortField, SortSpec, Suggestion,
};
pub use queue::{FailedJob, Job, JobKind, JobQueue, WorkerPool};
pub use rebuild::{RebuildReport, RebuildState, SyncResult};
pub use record::{EntityType, IndexRecord, Projection};
pub use service::SearchService;
pub use source::{Category, CategoryStore, Product, ProductStore, Variant};
pub use store::IndexStore;
pub use sync::SyncOutcome;
