//! Sync executor: applies a projection to the index record store.
//!
//! Exactly one store write per call. Upserts replace the whole record, so
//! applying the same projection twice lands on the same stored state and
//! at-least-once job delivery is safe.

use tracing::debug;

use crate::error::Result;
use crate::record::Projection;
use crate::source::{CategoryStore, ProductStore};
use crate::store::IndexStore;

/// What a sync ended up doing to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Record upserted (created or fully replaced).
    Indexed,
    /// Record removed because the source entity is gone (or was already
    /// absent — deletes are idempotent).
    Removed,
}

/// Apply a projection: upsert for a live entity, delete for a missing one.
pub fn apply_sync(store: &IndexStore, projection: Projection) -> Result<SyncOutcome> {
    match projection {
        Projection::Upsert(record) => {
            store.upsert(&record)?;
            debug!(
                entity_type = %record.entity_type,
                entity_id = %record.entity_id,
                active = record.is_active,
                "index record upserted"
            );
            Ok(SyncOutcome::Indexed)
        }
        Projection::Delete {
            entity_type,
            entity_id,
        } => {
            store.delete(entity_type, &entity_id)?;
            debug!(%entity_type, %entity_id, "index record removed");
            Ok(SyncOutcome::Removed)
        }
    }
}

/// Look up a product (and its category), project it, apply the result.
///
/// A product that no longer exists is a deletion signal, not an error.
pub fn sync_product(
    store: &IndexStore,
    products: &dyn ProductStore,
    categories: &dyn CategoryStore,
    entity_id: &str,
) -> Result<SyncOutcome> {
    let product = products.find_by_id(entity_id)?;
    let category = match product.as_ref().and_then(|p| p.category_id.as_deref()) {
        Some(category_id) => categories.find_by_id(category_id)?,
        None => None,
    };
    let projection = super::project_product(entity_id, product.as_ref(), category.as_ref());
    apply_sync(store, projection)
}

/// Look up a category, project it, apply the result.
pub fn sync_category(
    store: &IndexStore,
    categories: &dyn CategoryStore,
    entity_id: &str,
) -> Result<SyncOutcome> {
    let category = categories.find_by_id(entity_id)?;
    let projection = super::project_category(entity_id, category.as_ref());
    apply_sync(store, projection)
}
