//! Full index rebuild: clear, then repopulate from both source stores.
//!
//! The clearing phase is destructive and not transactional with the
//! repopulation — searches issued between clear and completion see partial
//! results. That window is the accepted trade-off here; zero-downtime
//! callers would need to build under a separate namespace and swap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::source::{CategoryStore, ProductStore};
use crate::store::IndexStore;
use crate::sync::{apply_sync, project_category, project_product};

/// Rebuild progress, observable for ops tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebuildState {
    Idle,
    Clearing,
    SyncingProducts,
    SyncingCategories,
    Done,
    PartiallyFailed,
}

/// Per-entity-type outcome tally. One entity's failure never aborts the
/// rest of the rebuild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub synced: usize,
    pub failed: usize,
    /// (entity id, error message) per failure, for targeted replay via
    /// the single-entity sync path.
    pub errors: Vec<(String, String)>,
}

impl SyncResult {
    fn record_failure(&mut self, entity_id: &str, err: &crate::error::SearchError) {
        self.failed += 1;
        self.errors.push((entity_id.to_string(), err.to_string()));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebuildReport {
    pub products: SyncResult,
    pub categories: SyncResult,
    pub timestamp: DateTime<Utc>,
}

impl RebuildReport {
    /// Terminal state implied by the tallies.
    #[must_use]
    pub fn state(&self) -> RebuildState {
        if self.products.failed == 0 && self.categories.failed == 0 {
            RebuildState::Done
        } else {
            RebuildState::PartiallyFailed
        }
    }
}

/// Clear the store and repopulate it from every active source entity.
///
/// Only store-wide failures (the clear, the source scans) error out;
/// per-entity failures are tallied into the report and the caller decides
/// whether to replay them individually.
pub fn rebuild_index(
    store: &IndexStore,
    products: &dyn ProductStore,
    categories: &dyn CategoryStore,
) -> Result<RebuildReport> {
    info!("index rebuild: clearing");
    let cleared = store.clear()?;
    info!(cleared, "index rebuild: cleared, syncing products");

    let mut product_result = SyncResult::default();
    for product in products.find_all_active()? {
        let entity_id = product.id.clone();
        let category = match product.category_id.as_deref() {
            Some(category_id) => match categories.find_by_id(category_id) {
                Ok(found) => found,
                Err(err) => {
                    warn!(entity_id, %err, "rebuild: category lookup failed for product");
                    product_result.record_failure(&entity_id, &err);
                    continue;
                }
            },
            None => None,
        };
        let projection = project_product(&entity_id, Some(&product), category.as_ref());
        match apply_sync(store, projection) {
            Ok(_) => product_result.synced += 1,
            Err(err) => {
                warn!(entity_id, %err, "rebuild: product sync failed");
                product_result.record_failure(&entity_id, &err);
            }
        }
    }

    info!(
        synced = product_result.synced,
        failed = product_result.failed,
        "index rebuild: products done, syncing categories"
    );

    let mut category_result = SyncResult::default();
    for category in categories.find_all_active()? {
        let entity_id = category.id.clone();
        let projection = project_category(&entity_id, Some(&category));
        match apply_sync(store, projection) {
            Ok(_) => category_result.synced += 1,
            Err(err) => {
                warn!(entity_id, %err, "rebuild: category sync failed");
                category_result.record_failure(&entity_id, &err);
            }
        }
    }

    let report = RebuildReport {
        products: product_result,
        categories: category_result,
        timestamp: Utc::now(),
    };
    info!(
        products_synced = report.products.synced,
        products_failed = report.products.failed,
        categories_synced = report.categories.synced,
        categories_failed = report.categories.failed,
        state = ?report.state(),
        "index rebuild complete"
    );
    Ok(report)
}
