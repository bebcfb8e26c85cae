//! Query engine: ranked, filtered, paginated search over the index
//! record store.
//!
//! Reads are synchronous — no queue involvement. Candidate rows come from
//! the store's active-only scan; typed filters and weighted scoring run
//! over them here. Ordering is fully deterministic for a fixed index
//! state: relevance, then the requested sort fields, then entity id.

pub mod cache;
pub mod score;

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::{EntityType, IndexRecord};
use crate::store::IndexStore;

pub use cache::SearchCache;

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

/// Closed set of filter predicates. Every provided filter is an AND
/// condition; `tags` is any-of within the list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub brand: Option<String>,
    pub category_slug: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub tags: Vec<String>,
}

impl SearchFilters {
    fn matches(&self, record: &IndexRecord) -> bool {
        if let Some(brand) = &self.brand {
            let Some(record_brand) = &record.brand else {
                return false;
            };
            if !record_brand.eq_ignore_ascii_case(brand) {
                return false;
            }
        }
        if let Some(slug) = &self.category_slug
            && record.category_slug.as_deref() != Some(slug.as_str())
        {
            return false;
        }
        if let Some(min) = self.min_price {
            if !record.price.is_some_and(|p| p >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if !record.price.is_some_and(|p| p <= max) {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if !record.rating.is_some_and(|r| r >= min) {
                return false;
            }
        }
        if !self.tags.is_empty() {
            let any = self.tags.iter().any(|wanted| {
                record
                    .tags
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(wanted))
            });
            if !any {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Popularity,
    Rating,
    Price,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub descending: bool,
}

impl SortSpec {
    #[must_use]
    pub const fn desc(field: SortField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    #[must_use]
    pub const fn asc(field: SortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }
}

/// Default tie-breakers: popularity desc, rating desc.
#[must_use]
pub fn default_sort() -> Vec<SortSpec> {
    vec![
        SortSpec::desc(SortField::Popularity),
        SortSpec::desc(SortField::Rating),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub query: String,
    pub entity_type: Option<EntityType>,
    pub filters: SearchFilters,
    pub sort: Vec<SortSpec>,
    pub limit: usize,
    pub skip: usize,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            entity_type: None,
            filters: SearchFilters::default(),
            sort: default_sort(),
            limit: 20,
            skip: 0,
        }
    }
}

impl SearchRequest {
    /// Stable hash of every field, for response caching.
    #[must_use]
    pub fn cache_key(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.query.hash(&mut hasher);
        self.entity_type.hash(&mut hasher);
        self.filters.brand.hash(&mut hasher);
        self.filters.category_slug.hash(&mut hasher);
        self.filters.min_price.map(f64::to_bits).hash(&mut hasher);
        self.filters.max_price.map(f64::to_bits).hash(&mut hasher);
        self.filters.min_rating.map(f64::to_bits).hash(&mut hasher);
        self.filters.tags.hash(&mut hasher);
        self.sort.hash(&mut hasher);
        self.limit.hash(&mut hasher);
        self.skip.hash(&mut hasher);
        hasher.finish()
    }
}

/// One ranked result with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: i64,
    #[serde(flatten)]
    pub record: IndexRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    /// Count ignoring pagination, over the same filter set as `results`.
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

/// Autocomplete entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    pub entity_type: EntityType,
    pub brand: Option<String>,
}

/// Popular-listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularItem {
    pub id: String,
    pub name: String,
    pub entity_type: EntityType,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
}

// =============================================================================
// SEARCH
// =============================================================================

/// Ranked, filtered, paginated search. Never errors on an empty index.
pub fn search(store: &IndexStore, request: &SearchRequest) -> Result<SearchResponse> {
    let terms = score::terms(&request.query);
    let candidates = store.fetch_active(request.entity_type)?;

    let mut hits: Vec<SearchHit> = candidates
        .into_iter()
        .filter(|r| request.filters.matches(r))
        .filter(|r| score::matches_all_terms(r, &terms))
        .map(|record| SearchHit {
            score: score::relevance(&record, &terms),
            record,
        })
        .collect();

    hits.sort_by(|a, b| compare_hits(a, b, &request.sort));

    let total = hits.len();
    let limit = request.limit.max(1);
    let results: Vec<SearchHit> = hits.into_iter().skip(request.skip).take(limit).collect();

    Ok(SearchResponse {
        results,
        total,
        page: request.skip / limit + 1,
        total_pages: total.div_ceil(limit),
    })
}

fn compare_hits(a: &SearchHit, b: &SearchHit, sort: &[SortSpec]) -> Ordering {
    // Relevance first, then the configured sort fields, then a stable key.
    b.score
        .cmp(&a.score)
        .then_with(|| compare_by_fields(&a.record, &b.record, sort))
        .then_with(|| a.record.entity_id.cmp(&b.record.entity_id))
}

fn compare_by_fields(a: &IndexRecord, b: &IndexRecord, sort: &[SortSpec]) -> Ordering {
    for spec in sort {
        let ord = match spec.field {
            SortField::Popularity => a.popularity.cmp(&b.popularity),
            SortField::Rating => compare_optional(a.rating, b.rating),
            SortField::Price => compare_optional(a.price, b.price),
            SortField::Name => a.name.cmp(&b.name),
        };
        let ord = if spec.descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Missing values sort below present ones.
fn compare_optional(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

// =============================================================================
// SUGGESTIONS / POPULAR
// =============================================================================

/// Case-insensitive prefix autocomplete against name, keywords, and brand.
/// No relevance scoring — popularity order, small cap.
pub fn suggestions(store: &IndexStore, query: &str, limit: usize) -> Result<Vec<Suggestion>> {
    let prefix = query.trim().to_lowercase();
    if prefix.is_empty() {
        return Ok(Vec::new());
    }

    let mut matched: Vec<IndexRecord> = store
        .fetch_active(None)?
        .into_iter()
        .filter(|r| {
            r.name.to_lowercase().starts_with(&prefix)
                || r.keywords
                    .iter()
                    .any(|k| k.to_lowercase().starts_with(&prefix))
                || r.brand
                    .as_deref()
                    .is_some_and(|b| b.to_lowercase().starts_with(&prefix))
        })
        .collect();

    matched.sort_by(|a, b| {
        b.popularity
            .cmp(&a.popularity)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    Ok(matched
        .into_iter()
        .take(limit)
        .map(|r| Suggestion {
            id: r.entity_id,
            name: r.name,
            entity_type: r.entity_type,
            brand: r.brand,
        })
        .collect())
}

/// Most popular active records of one entity type.
pub fn popular(
    store: &IndexStore,
    entity_type: EntityType,
    limit: usize,
) -> Result<Vec<PopularItem>> {
    let mut records = store.fetch_active(Some(entity_type))?;
    records.sort_by(|a, b| {
        b.popularity
            .cmp(&a.popularity)
            .then_with(|| compare_optional(b.rating, a.rating))
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    Ok(records
        .into_iter()
        .take(limit)
        .map(|r| PopularItem {
            id: r.entity_id,
            name: r.name,
            entity_type: r.entity_type,
            brand: r.brand,
            price: r.price,
            rating: r.rating,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Projection;
    use crate::sync::{apply_sync, project_category, project_product};
    use crate::test_utils::fixtures::{category, product};

    fn seed(store: &IndexStore, projections: Vec<Projection>) {
        for p in projections {
            apply_sync(store, p).unwrap();
        }
    }

    fn indexed_product(
        store: &IndexStore,
        id: &str,
        name: &str,
        mutate: impl FnOnce(&mut crate::source::Product),
    ) {
        let mut p = product(id, name);
        mutate(&mut p);
        apply_sync(store, project_product(id, Some(&p), None)).unwrap();
    }

    #[test]
    fn test_empty_index_returns_empty_results() {
        let store = IndexStore::open_in_memory().unwrap();
        let response = search(&store, &SearchRequest::default()).unwrap();
        assert_eq!(response.total, 0);
        assert!(response.results.is_empty());
        assert_eq!(response.total_pages, 0);
    }

    #[test]
    fn test_text_match_and_active_gating() {
        let store = IndexStore::open_in_memory().unwrap();
        indexed_product(&store, "p1", "Wireless Mouse", |_| {});
        indexed_product(&store, "p2", "Wireless Keyboard", |p| {
            p.status = crate::source::ProductStatus::Draft;
        });

        let response = search(
            &store,
            &SearchRequest {
                query: "wireless".to_string(),
                ..SearchRequest::default()
            },
        )
        .unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.results[0].record.entity_id, "p1");
    }

    #[test]
    fn test_price_range_filter() {
        let store = IndexStore::open_in_memory().unwrap();
        for (id, price) in [("p1", 10.0), ("p2", 50.0), ("p3", 100.0)] {
            indexed_product(&store, id, "Gaming Mouse", |p| p.base_price = price);
        }

        let response = search(
            &store,
            &SearchRequest {
                query: "mouse".to_string(),
                filters: SearchFilters {
                    min_price: Some(20.0),
                    max_price: Some(80.0),
                    ..SearchFilters::default()
                },
                ..SearchRequest::default()
            },
        )
        .unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.results[0].record.entity_id, "p2");
    }

    #[test]
    fn test_tags_filter_is_any_of() {
        let store = IndexStore::open_in_memory().unwrap();
        indexed_product(&store, "p1", "Mouse", |p| {
            p.tags = vec!["electronics".to_string()];
        });
        indexed_product(&store, "p2", "Mouse", |p| {
            p.tags = vec!["office".to_string()];
        });
        indexed_product(&store, "p3", "Mouse", |p| {
            p.tags = vec!["outdoors".to_string()];
        });

        let response = search(
            &store,
            &SearchRequest {
                query: "mouse".to_string(),
                filters: SearchFilters {
                    tags: vec!["electronics".to_string(), "office".to_string()],
                    ..SearchFilters::default()
                },
                ..SearchRequest::default()
            },
        )
        .unwrap();
        let ids: Vec<&str> = response
            .results
            .iter()
            .map(|h| h.record.entity_id.as_str())
            .collect();
        assert_eq!(response.total, 2);
        assert!(ids.contains(&"p1") && ids.contains(&"p2"));
    }

    #[test]
    fn test_name_match_ranks_above_description_match() {
        let store = IndexStore::open_in_memory().unwrap();
        indexed_product(&store, "desc-only", "Pointing Device", |p| {
            p.description = "a wireless mouse alternative".to_string();
        });
        indexed_product(&store, "name-hit", "Wireless Mouse", |_| {});

        let response = search(
            &store,
            &SearchRequest {
                query: "wireless".to_string(),
                ..SearchRequest::default()
            },
        )
        .unwrap();
        assert_eq!(response.results[0].record.entity_id, "name-hit");
        assert!(response.results[0].score > response.results[1].score);
    }

    #[test]
    fn test_popularity_breaks_relevance_ties() {
        let store = IndexStore::open_in_memory().unwrap();
        indexed_product(&store, "cold", "Wireless Mouse", |p| p.view_count = 1);
        indexed_product(&store, "hot", "Wireless Mouse", |p| p.view_count = 500);

        let response = search(
            &store,
            &SearchRequest {
                query: "wireless".to_string(),
                ..SearchRequest::default()
            },
        )
        .unwrap();
        assert_eq!(response.results[0].record.entity_id, "hot");
    }

    #[test]
    fn test_pagination_math() {
        let store = IndexStore::open_in_memory().unwrap();
        for i in 0..7 {
            indexed_product(&store, &format!("p{i}"), "Mouse", |p| {
                p.view_count = i64::from(i)
            });
        }

        let page1 = search(
            &store,
            &SearchRequest {
                query: "mouse".to_string(),
                limit: 3,
                skip: 0,
                ..SearchRequest::default()
            },
        )
        .unwrap();
        let page3 = search(
            &store,
            &SearchRequest {
                query: "mouse".to_string(),
                limit: 3,
                skip: 6,
                ..SearchRequest::default()
            },
        )
        .unwrap();

        assert_eq!(page1.total, 7);
        assert_eq!(page3.total, 7);
        assert_eq!(page1.total_pages, 3);
        assert_eq!(page1.page, 1);
        assert_eq!(page3.page, 3);
        assert_eq!(page1.results.len(), 3);
        assert_eq!(page3.results.len(), 1);
    }

    #[test]
    fn test_entity_type_restriction() {
        let store = IndexStore::open_in_memory().unwrap();
        indexed_product(&store, "p1", "Peripherals Pro Mouse", |_| {});
        let c = category("c1", "Peripherals");
        seed(&store, vec![project_category("c1", Some(&c))]);

        let response = search(
            &store,
            &SearchRequest {
                query: "peripherals".to_string(),
                entity_type: Some(EntityType::Category),
                ..SearchRequest::default()
            },
        )
        .unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.results[0].record.entity_type, EntityType::Category);
    }

    #[test]
    fn test_suggestions_prefix_and_cap() {
        let store = IndexStore::open_in_memory().unwrap();
        indexed_product(&store, "p1", "Wireless Mouse", |p| p.view_count = 10);
        indexed_product(&store, "p2", "Wireless Keyboard", |p| p.view_count = 90);
        indexed_product(&store, "p3", "Desk Lamp", |p| {
            p.brand = Some("Wirecraft".to_string());
        });

        let s = suggestions(&store, "wire", 2).unwrap();
        assert_eq!(s.len(), 2);
        // popularity desc: keyboard (90) first
        assert_eq!(s[0].id, "p2");

        assert!(suggestions(&store, "", 5).unwrap().is_empty());
    }

    #[test]
    fn test_popular_listing() {
        let store = IndexStore::open_in_memory().unwrap();
        indexed_product(&store, "p1", "Mouse", |p| p.sales_count = 5);
        indexed_product(&store, "p2", "Keyboard", |p| p.sales_count = 50);
        indexed_product(&store, "p3", "Lamp", |p| {
            p.sales_count = 500;
            p.status = crate::source::ProductStatus::Archived;
        });

        let top = popular(&store, EntityType::Product, 10).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "p2");
        assert_eq!(top[1].id, "p1");
    }
}
