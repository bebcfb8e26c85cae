//! SQLite-backed index record store.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::Result;
use crate::record::{EntityType, IndexRecord};
use crate::store::migrations;

/// Keyed store of index records, one row per (entity type, entity id).
///
/// The connection is wrapped in a mutex so the store can be shared behind
/// an `Arc` between the worker pool and the synchronous query path. Every
/// write is a single statement; sqlite gives single-record atomicity.
pub struct IndexStore {
    conn: Mutex<Connection>,
    schema_version: u32,
}

impl IndexStore {
    /// Open (creating if needed) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::configure_pragmas(&conn)?;
        Self::from_connection(conn)
    }

    /// In-memory store, for tests and ephemeral indexes.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let schema_version = migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            schema_version,
        })
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
    }

    /// Current schema version after migrations.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Insert or fully replace the record keyed by its compound key.
    ///
    /// Replace semantics, not merge: every column is overwritten from the
    /// given record, which is what makes retried syncs idempotent.
    pub fn upsert(&self, record: &IndexRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO index_records (
                 entity_type, entity_id, name, description, keywords,
                 category_name, category_slug, brand, tags, sku,
                 price, rating, is_active, search_text, popularity,
                 last_synced_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(entity_type, entity_id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 keywords = excluded.keywords,
                 category_name = excluded.category_name,
                 category_slug = excluded.category_slug,
                 brand = excluded.brand,
                 tags = excluded.tags,
                 sku = excluded.sku,
                 price = excluded.price,
                 rating = excluded.rating,
                 is_active = excluded.is_active,
                 search_text = excluded.search_text,
                 popularity = excluded.popularity,
                 last_synced_at = excluded.last_synced_at",
            params![
                record.entity_type.as_str(),
                record.entity_id,
                record.name,
                record.description,
                serde_json::to_string(&record.keywords)?,
                record.category_name,
                record.category_slug,
                record.brand,
                serde_json::to_string(&record.tags)?,
                record.sku,
                record.price,
                record.rating,
                record.is_active,
                record.search_text,
                record.popularity,
                record.last_synced_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Delete the record for the given key. Idempotent; deleting a missing
    /// record is not an error.
    pub fn delete(&self, entity_type: EntityType, entity_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "DELETE FROM index_records WHERE entity_type = ?1 AND entity_id = ?2",
            params![entity_type.as_str(), entity_id],
        )?;
        Ok(changed > 0)
    }

    pub fn get(&self, entity_type: EntityType, entity_id: &str) -> Result<Option<IndexRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM index_records WHERE entity_type = ?1 AND entity_id = ?2"),
            params![entity_type.as_str(), entity_id],
            row_to_record,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Remove every record. Used by the rebuild orchestrator's clearing
    /// phase; searches between clear and repopulation see partial results.
    pub fn clear(&self) -> Result<usize> {
        let conn = self.conn.lock();
        Ok(conn.execute("DELETE FROM index_records", [])?)
    }

    /// Count records, optionally restricted to one entity type.
    pub fn count(&self, entity_type: Option<EntityType>) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = match entity_type {
            Some(ty) => conn.query_row(
                "SELECT COUNT(*) FROM index_records WHERE entity_type = ?1",
                params![ty.as_str()],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM index_records", [], |row| row.get(0))?,
        };
        Ok(count as usize)
    }

    /// All active records, optionally restricted to one entity type.
    ///
    /// Query-engine candidate set: filtering and scoring happen over these
    /// typed rows in Rust, keeping the SQL surface to the indexed
    /// active/type predicates.
    pub fn fetch_active(&self, entity_type: Option<EntityType>) -> Result<Vec<IndexRecord>> {
        let conn = self.conn.lock();
        let mut records = Vec::new();
        match entity_type {
            Some(ty) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM index_records
                     WHERE is_active = 1 AND entity_type = ?1"
                ))?;
                let rows = stmt.query_map(params![ty.as_str()], row_to_record)?;
                for row in rows {
                    records.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM index_records WHERE is_active = 1"
                ))?;
                let rows = stmt.query_map([], row_to_record)?;
                for row in rows {
                    records.push(row?);
                }
            }
        }
        Ok(records)
    }
}

const COLUMNS: &str = "entity_type, entity_id, name, description, keywords, \
                       category_name, category_slug, brand, tags, sku, \
                       price, rating, is_active, search_text, popularity, \
                       last_synced_at";

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<IndexRecord> {
    let entity_type: String = row.get(0)?;
    let keywords: String = row.get(4)?;
    let tags: String = row.get(8)?;
    let last_synced_at: String = row.get(15)?;
    Ok(IndexRecord {
        entity_type: EntityType::parse(&entity_type).unwrap_or(EntityType::Product),
        entity_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        keywords: serde_json::from_str(&keywords).unwrap_or_default(),
        category_name: row.get(5)?,
        category_slug: row.get(6)?,
        brand: row.get(7)?,
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        sku: row.get(9)?,
        price: row.get(10)?,
        rating: row.get(11)?,
        is_active: row.get(12)?,
        search_text: row.get(13)?,
        popularity: row.get(14)?,
        last_synced_at: DateTime::parse_from_rfc3339(&last_synced_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::build_search_text;
    use tempfile::tempdir;

    fn sample(entity_id: &str, name: &str) -> IndexRecord {
        IndexRecord {
            entity_type: EntityType::Product,
            entity_id: entity_id.to_string(),
            name: name.to_string(),
            description: "a thing".to_string(),
            keywords: vec!["acme".to_string()],
            category_name: Some("Peripherals".to_string()),
            category_slug: Some("peripherals".to_string()),
            brand: Some("Acme".to_string()),
            tags: vec!["electronics".to_string()],
            sku: Some("SKU-1".to_string()),
            price: Some(25.0),
            rating: Some(4.5),
            is_active: true,
            search_text: build_search_text([name, "acme", "electronics"]),
            popularity: 42,
            last_synced_at: Utc::now(),
        }
    }

    #[test]
    fn test_open_creates_schema() {
        let dir = tempdir().unwrap();
        let store = IndexStore::open(dir.path().join("index.db")).unwrap();
        assert_eq!(store.schema_version(), migrations::SCHEMA_VERSION);
        assert_eq!(store.count(None).unwrap(), 0);
    }

    #[test]
    fn test_upsert_then_get_roundtrip() {
        let store = IndexStore::open_in_memory().unwrap();
        let record = sample("p1", "Wireless Mouse");
        store.upsert(&record).unwrap();

        let stored = store.get(EntityType::Product, "p1").unwrap().unwrap();
        assert_eq!(stored.name, "Wireless Mouse");
        assert_eq!(stored.keywords, vec!["acme".to_string()]);
        assert_eq!(stored.price, Some(25.0));
        assert!(stored.is_active);
    }

    #[test]
    fn test_upsert_replaces_whole_record() {
        let store = IndexStore::open_in_memory().unwrap();
        store.upsert(&sample("p1", "Wireless Mouse")).unwrap();

        let mut updated = sample("p1", "Wired Mouse");
        updated.brand = None;
        updated.tags.clear();
        store.upsert(&updated).unwrap();

        let stored = store.get(EntityType::Product, "p1").unwrap().unwrap();
        assert_eq!(stored.name, "Wired Mouse");
        assert_eq!(stored.brand, None);
        assert!(stored.tags.is_empty());
        assert_eq!(store.count(None).unwrap(), 1);
    }

    #[test]
    fn test_compound_key_separates_entity_types() {
        let store = IndexStore::open_in_memory().unwrap();
        let product = sample("same-id", "Mouse");
        let mut category = sample("same-id", "Mice");
        category.entity_type = EntityType::Category;
        store.upsert(&product).unwrap();
        store.upsert(&category).unwrap();

        assert_eq!(store.count(None).unwrap(), 2);
        assert_eq!(store.count(Some(EntityType::Product)).unwrap(), 1);
        assert_eq!(store.count(Some(EntityType::Category)).unwrap(), 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = IndexStore::open_in_memory().unwrap();
        store.upsert(&sample("p1", "Mouse")).unwrap();
        assert!(store.delete(EntityType::Product, "p1").unwrap());
        assert!(!store.delete(EntityType::Product, "p1").unwrap());
        assert!(store.get(EntityType::Product, "p1").unwrap().is_none());
    }

    #[test]
    fn test_fetch_active_excludes_inactive() {
        let store = IndexStore::open_in_memory().unwrap();
        store.upsert(&sample("p1", "Mouse")).unwrap();
        let mut inactive = sample("p2", "Hidden Keyboard");
        inactive.is_active = false;
        store.upsert(&inactive).unwrap();

        let active = store.fetch_active(None).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].entity_id, "p1");
    }

    #[test]
    fn test_clear_empties_store() {
        let store = IndexStore::open_in_memory().unwrap();
        store.upsert(&sample("p1", "Mouse")).unwrap();
        store.upsert(&sample("p2", "Keyboard")).unwrap();
        assert_eq!(store.clear().unwrap(), 2);
        assert_eq!(store.count(None).unwrap(), 0);
    }
}
