//! Index record: the denormalized, search-optimized projection of one
//! catalog entity.
//!
//! Exactly one record exists per (entity type, entity id) pair — the store
//! enforces this with a compound-key upsert. Records are replaced whole on
//! every sync, never patched, so a delayed sync can only make the index
//! briefly stale, not corrupt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which source collection an index record mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Product,
    Category,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Category => "category",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "product" => Some(Self::Product),
            "category" => Some(Self::Category),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One denormalized search document.
///
/// The copied display/filter fields (`category_name`, `brand`, `tags`, ...)
/// may lag the source between syncs; that staleness is an accepted
/// invariant of the design, not a bug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub name: String,
    pub description: String,
    /// Lower-weight match terms: tags, brand, category name, SKUs.
    pub keywords: Vec<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub brand: Option<String>,
    pub tags: Vec<String>,
    /// Primary SKU only (first variant).
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    /// Inactive records are invisible to every query path.
    pub is_active: bool,
    /// Precomputed lowercase match corpus; always derived from the other
    /// fields on this record via [`build_search_text`], never set directly.
    pub search_text: String,
    /// Engagement score: views + 10x sales for products, cached product
    /// count for categories. Default secondary sort key.
    pub popularity: i64,
    pub last_synced_at: DateTime<Utc>,
}

/// Output of a synchronizer projection: either the full replacement record
/// or an instruction to remove the record because the source is gone.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Upsert(Box<IndexRecord>),
    Delete {
        entity_type: EntityType,
        entity_id: String,
    },
}

impl Projection {
    #[must_use]
    pub fn entity_key(&self) -> (EntityType, &str) {
        match self {
            Self::Upsert(record) => (record.entity_type, record.entity_id.as_str()),
            Self::Delete {
                entity_type,
                entity_id,
            } => (*entity_type, entity_id.as_str()),
        }
    }
}

/// Build the lowercase match corpus from the searchable parts of a record.
///
/// Blank parts are dropped, the rest are whitespace-joined and lowercased.
/// Deterministic for a fixed input order.
#[must_use]
pub fn build_search_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for part in parts {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(trimmed);
    }
    out.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_roundtrip() {
        for ty in [EntityType::Product, EntityType::Category] {
            assert_eq!(EntityType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(EntityType::parse("order"), None);
    }

    #[test]
    fn test_search_text_drops_blanks_and_lowercases() {
        let text = build_search_text(["Wireless Mouse", "", "  ", "Acme", "USB-C"]);
        assert_eq!(text, "wireless mouse acme usb-c");
    }

    #[test]
    fn test_search_text_empty_input() {
        assert_eq!(build_search_text(std::iter::empty::<&str>()), "");
    }
}
