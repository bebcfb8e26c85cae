//! Change triggers: explicit hooks the mutation-owning code calls after a
//! source entity is written.
//!
//! Indexing is best-effort from the primary write path's point of view.
//! Nothing here returns an error — an enqueue or delete failure is logged
//! and swallowed so the catalog write that triggered it always stands.

use tracing::warn;

use crate::queue::{JobKind, JobQueue};
use crate::record::EntityType;
use crate::store::IndexStore;

/// Call after a product is created or updated. Unconditional — diffing
/// which fields changed is not worth the coupling, and syncs are
/// idempotent anyway.
pub fn product_saved(queue: &JobQueue, entity_id: &str) {
    enqueue_sync(
        queue,
        JobKind::SyncProduct {
            entity_id: entity_id.to_string(),
        },
    );
}

/// Call after a category is created or updated.
pub fn category_saved(queue: &JobQueue, entity_id: &str) {
    enqueue_sync(
        queue,
        JobKind::SyncCategory {
            entity_id: entity_id.to_string(),
        },
    );
}

/// Call after a product is deleted from the source store.
///
/// Removes the index record synchronously; if the store write fails, falls
/// back to a sync job that will observe the source as missing and delete.
pub fn product_deleted(store: &IndexStore, queue: &JobQueue, entity_id: &str) {
    delete_or_enqueue(store, queue, EntityType::Product, entity_id);
}

/// Call after a category is deleted from the source store.
pub fn category_deleted(store: &IndexStore, queue: &JobQueue, entity_id: &str) {
    delete_or_enqueue(store, queue, EntityType::Category, entity_id);
}

fn delete_or_enqueue(store: &IndexStore, queue: &JobQueue, entity_type: EntityType, entity_id: &str) {
    if let Err(err) = store.delete(entity_type, entity_id) {
        warn!(%entity_type, entity_id, %err, "index delete failed, falling back to sync job");
        let kind = match entity_type {
            EntityType::Product => JobKind::SyncProduct {
                entity_id: entity_id.to_string(),
            },
            EntityType::Category => JobKind::SyncCategory {
                entity_id: entity_id.to_string(),
            },
        };
        enqueue_sync(queue, kind);
    }
}

fn enqueue_sync(queue: &JobQueue, kind: JobKind) {
    if let Err(err) = queue.enqueue(kind.clone()) {
        warn!(job = %kind.describe(), %err, "sync enqueue failed, index will trail until next sync");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use crate::queue::Job;

    fn queue_pair() -> (mpsc::UnboundedSender<Job>, JobQueue, mpsc::UnboundedReceiver<Job>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = JobQueue::new(&tx);
        (tx, queue, rx)
    }

    #[test]
    fn test_saved_triggers_enqueue_sync_jobs() {
        let (_tx, queue, mut rx) = queue_pair();
        product_saved(&queue, "p1");
        category_saved(&queue, "c1");

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(
            first.kind,
            JobKind::SyncProduct {
                entity_id: "p1".to_string()
            }
        );
        assert_eq!(
            second.kind,
            JobKind::SyncCategory {
                entity_id: "c1".to_string()
            }
        );
    }

    #[test]
    fn test_enqueue_failure_is_swallowed() {
        let (_tx, queue, rx) = queue_pair();
        drop(rx);
        // Must not panic or propagate.
        product_saved(&queue, "p1");
    }

    #[test]
    fn test_deleted_removes_record_synchronously() {
        let store = IndexStore::open_in_memory().unwrap();
        let p = crate::test_utils::fixtures::product("p1", "Mouse");
        crate::sync::apply_sync(&store, crate::sync::project_product("p1", Some(&p), None))
            .unwrap();

        let (_tx, queue, mut rx) = queue_pair();
        product_deleted(&store, &queue, "p1");

        assert!(
            store
                .get(EntityType::Product, "p1")
                .unwrap()
                .is_none()
        );
        // Direct delete succeeded, so no fallback job.
        assert!(rx.try_recv().is_err());
    }
}
