//! Pure projections from source entities to index records.
//!
//! These functions never perform I/O and never fail: a missing source
//! entity is represented as [`Projection::Delete`], malformed-but-present
//! data projects to whatever record its fields describe.

use chrono::Utc;
use itertools::Itertools;

use crate::record::{EntityType, IndexRecord, Projection, build_search_text};
use crate::source::{Category, Product};

/// Sales are weighted 10x a view: purchase intent over passive browsing.
const SALES_WEIGHT: i64 = 10;

/// Project a product (with its resolved category, if any) into an index
/// record, or a deletion signal when the product is gone from the source.
///
/// `entity_id` is the natural key the sync was asked for; it keys the
/// deletion signal when the lookup came back empty.
#[must_use]
pub fn project_product(
    entity_id: &str,
    product: Option<&Product>,
    category: Option<&Category>,
) -> Projection {
    let Some(product) = product else {
        return Projection::Delete {
            entity_type: EntityType::Product,
            entity_id: entity_id.to_string(),
        };
    };

    let category_name = category.map(|c| c.name.clone());
    let category_slug = category.map(|c| c.slug.clone());

    // tags ∪ {brand} ∪ {category name} ∪ variant SKUs, empties dropped,
    // first occurrence wins.
    let keywords: Vec<String> = product
        .tags
        .iter()
        .cloned()
        .chain(product.brand.iter().cloned())
        .chain(category_name.iter().cloned())
        .chain(product.variants.iter().map(|v| v.sku.clone()))
        .filter(|k| !k.trim().is_empty())
        .unique()
        .collect();

    let sku = product.primary_sku().map(str::to_string);

    let search_text = build_search_text(
        [product.name.as_str(), product.description.as_str()]
            .into_iter()
            .chain(keywords.iter().map(String::as_str))
            .chain(product.brand.as_deref())
            .chain(product.tags.iter().map(String::as_str))
            .chain(category_name.as_deref())
            .chain(sku.as_deref()),
    );

    Projection::Upsert(Box::new(IndexRecord {
        entity_type: EntityType::Product,
        entity_id: product.id.clone(),
        name: product.name.clone(),
        description: product.description.clone(),
        keywords,
        category_name,
        category_slug,
        brand: product.brand.clone(),
        tags: product.tags.clone(),
        sku,
        price: Some(product.base_price),
        rating: product.rating,
        is_active: product.is_searchable(),
        search_text,
        popularity: product.view_count + product.sales_count * SALES_WEIGHT,
        last_synced_at: Utc::now(),
    }))
}

/// Project a category into an index record, or a deletion signal when the
/// category is gone from the source.
#[must_use]
pub fn project_category(entity_id: &str, category: Option<&Category>) -> Projection {
    let Some(category) = category else {
        return Projection::Delete {
            entity_type: EntityType::Category,
            entity_id: entity_id.to_string(),
        };
    };

    let keywords: Vec<String> = category
        .meta_keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .cloned()
        .unique()
        .collect();

    let search_text = build_search_text(
        [category.name.as_str(), category.description.as_str()]
            .into_iter()
            .chain(keywords.iter().map(String::as_str)),
    );

    Projection::Upsert(Box::new(IndexRecord {
        entity_type: EntityType::Category,
        entity_id: category.id.clone(),
        name: category.name.clone(),
        description: category.description.clone(),
        keywords,
        category_name: None,
        category_slug: Some(category.slug.clone()),
        brand: None,
        tags: Vec::new(),
        sku: None,
        price: None,
        rating: None,
        is_active: category.is_active,
        search_text,
        popularity: category.product_count,
        last_synced_at: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ProductStatus, Variant, Visibility};
    use crate::test_utils::fixtures::{category, product};

    #[test]
    fn test_missing_product_projects_to_delete() {
        let projection = project_product("p-gone", None, None);
        assert!(matches!(
            projection,
            Projection::Delete {
                entity_type: EntityType::Product,
                ref entity_id,
            } if entity_id == "p-gone"
        ));
    }

    #[test]
    fn test_product_keywords_union() {
        let mut p = product("p1", "Wireless Mouse");
        p.brand = Some("Acme".to_string());
        p.tags = vec!["electronics".to_string(), "".to_string()];
        p.variants = vec![
            Variant {
                sku: "WM-100".to_string(),
                price: 25.0,
            },
            Variant {
                sku: "WM-200".to_string(),
                price: 30.0,
            },
        ];
        let c = category("c1", "Peripherals");

        let Projection::Upsert(record) = project_product("p1", Some(&p), Some(&c)) else {
            panic!("expected upsert");
        };
        assert_eq!(
            record.keywords,
            vec!["electronics", "Acme", "Peripherals", "WM-100", "WM-200"]
        );
        assert_eq!(record.sku.as_deref(), Some("WM-100"));
        assert_eq!(record.category_slug.as_deref(), Some("peripherals"));
    }

    #[test]
    fn test_product_active_gating() {
        let mut p = product("p1", "Mouse");
        assert!(matches!(
            project_product("p1", Some(&p), None),
            Projection::Upsert(r) if r.is_active
        ));

        p.status = ProductStatus::Draft;
        assert!(matches!(
            project_product("p1", Some(&p), None),
            Projection::Upsert(r) if !r.is_active
        ));

        p.status = ProductStatus::Active;
        p.visibility = Visibility::Hidden;
        assert!(matches!(
            project_product("p1", Some(&p), None),
            Projection::Upsert(r) if !r.is_active
        ));
    }

    #[test]
    fn test_popularity_weights_sales_over_views() {
        let mut p = product("p1", "Mouse");
        p.view_count = 7;
        p.sales_count = 3;
        let Projection::Upsert(record) = project_product("p1", Some(&p), None) else {
            panic!("expected upsert");
        };
        assert_eq!(record.popularity, 7 + 3 * 10);
    }

    #[test]
    fn test_search_text_is_lowercase_and_complete() {
        let mut p = product("p1", "Wireless Mouse");
        p.brand = Some("Acme".to_string());
        p.description = "Ergonomic USB mouse".to_string();
        let Projection::Upsert(record) = project_product("p1", Some(&p), None) else {
            panic!("expected upsert");
        };
        assert!(record.search_text.contains("wireless mouse"));
        assert!(record.search_text.contains("ergonomic usb mouse"));
        assert!(record.search_text.contains("acme"));
        assert_eq!(record.search_text, record.search_text.to_lowercase());
    }

    #[test]
    fn test_projection_is_deterministic_modulo_timestamp() {
        let p = product("p1", "Mouse");
        let c = category("c1", "Peripherals");
        let Projection::Upsert(mut a) = project_product("p1", Some(&p), Some(&c)) else {
            panic!();
        };
        let Projection::Upsert(b) = project_product("p1", Some(&p), Some(&c)) else {
            panic!();
        };
        a.last_synced_at = b.last_synced_at;
        assert_eq!(a, b);
    }

    #[test]
    fn test_category_projection() {
        let mut c = category("c1", "Peripherals");
        c.meta_keywords = vec!["mice".to_string(), "keyboards".to_string()];
        c.product_count = 12;
        let Projection::Upsert(record) = project_category("c1", Some(&c)) else {
            panic!("expected upsert");
        };
        assert_eq!(record.entity_type, EntityType::Category);
        assert_eq!(record.popularity, 12);
        assert_eq!(record.keywords, vec!["mice", "keyboards"]);
        assert_eq!(record.price, None);
        assert!(record.is_active);
    }

    #[test]
    fn test_missing_category_projects_to_delete() {
        assert!(matches!(
            project_category("c-gone", None),
            Projection::Delete {
                entity_type: EntityType::Category,
                ..
            }
        ));
    }
}
