//! Versioned schema migrations for the index record store.

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version after all migrations run.
pub const SCHEMA_VERSION: u32 = 1;

/// Run all outstanding migrations, returning the resulting version.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_meta (
             key TEXT PRIMARY KEY,
             value INTEGER NOT NULL
         );",
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT value FROM schema_meta WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < 1 {
        migrate_v1(conn)?;
    }

    conn.execute(
        "INSERT INTO schema_meta (key, value) VALUES ('version', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [SCHEMA_VERSION],
    )?;

    Ok(SCHEMA_VERSION)
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS index_records (
             entity_type    TEXT NOT NULL,
             entity_id      TEXT NOT NULL,
             name           TEXT NOT NULL,
             description    TEXT NOT NULL DEFAULT '',
             keywords       TEXT NOT NULL DEFAULT '[]',
             category_name  TEXT,
             category_slug  TEXT,
             brand          TEXT,
             tags           TEXT NOT NULL DEFAULT '[]',
             sku            TEXT,
             price          REAL,
             rating         REAL,
             is_active      INTEGER NOT NULL DEFAULT 0,
             search_text    TEXT NOT NULL DEFAULT '',
             popularity     INTEGER NOT NULL DEFAULT 0,
             last_synced_at TEXT NOT NULL,
             PRIMARY KEY (entity_type, entity_id)
         );

         CREATE INDEX IF NOT EXISTS idx_records_active
             ON index_records (entity_type, is_active);
         CREATE INDEX IF NOT EXISTS idx_records_popularity
             ON index_records (popularity DESC);",
    )?;
    Ok(())
}
