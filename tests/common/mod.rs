//! Common test utilities shared across integration tests.

use std::sync::Arc;

use catalog_search::test_utils::fixtures::{MemoryCategoryStore, MemoryProductStore};
use catalog_search::{Config, IndexStore, SearchService};

/// A wired service plus handles to the pieces tests poke at directly.
pub struct TestHarness {
    pub store: Arc<IndexStore>,
    pub products: Arc<MemoryProductStore>,
    pub categories: Arc<MemoryCategoryStore>,
    pub service: SearchService,
}

impl TestHarness {
    /// In-memory everything, default config. Must run inside a tokio
    /// runtime (the service spawns its worker pool).
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(IndexStore::open_in_memory().expect("in-memory store"));
        let products = Arc::new(MemoryProductStore::default());
        let categories = Arc::new(MemoryCategoryStore::default());
        let service = SearchService::start(
            Arc::clone(&store),
            Arc::clone(&products) as Arc<dyn catalog_search::ProductStore>,
            Arc::clone(&categories) as Arc<dyn catalog_search::CategoryStore>,
            config,
        );
        Self {
            store,
            products,
            categories,
            service,
        }
    }
}
