//! Weighted term/field relevance scoring.
//!
//! Deliberately simple: a record's relevance is the sum, over query terms
//! and matched fields, of fixed field weights. No BM25, no stemming, no
//! fuzzy matching — the product requirements cap at weighted substring
//! matching on denormalized fields.

use crate::record::IndexRecord;

pub const WEIGHT_NAME: i64 = 10;
pub const WEIGHT_KEYWORDS: i64 = 8;
pub const WEIGHT_BRAND: i64 = 6;
pub const WEIGHT_TAGS: i64 = 5;
pub const WEIGHT_CATEGORY: i64 = 4;
pub const WEIGHT_DESCRIPTION: i64 = 2;

/// Split a raw query into lowercase terms.
#[must_use]
pub fn terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| !t.is_empty())
        .collect()
}

/// True when every term occurs somewhere in the record's match corpus.
/// An empty term list matches everything (browse/listing mode).
#[must_use]
pub fn matches_all_terms(record: &IndexRecord, terms: &[String]) -> bool {
    terms.iter().all(|t| record.search_text.contains(t))
}

/// Sum of field weights over every (term, field) hit.
#[must_use]
pub fn relevance(record: &IndexRecord, terms: &[String]) -> i64 {
    let name = record.name.to_lowercase();
    let description = record.description.to_lowercase();
    let brand = record.brand.as_deref().map(str::to_lowercase);
    let category = record.category_name.as_deref().map(str::to_lowercase);

    let mut score = 0;
    for term in terms {
        if name.contains(term) {
            score += WEIGHT_NAME;
        }
        if record
            .keywords
            .iter()
            .any(|k| k.to_lowercase().contains(term))
        {
            score += WEIGHT_KEYWORDS;
        }
        if brand.as_deref().is_some_and(|b| b.contains(term)) {
            score += WEIGHT_BRAND;
        }
        if record.tags.iter().any(|t| t.to_lowercase().contains(term)) {
            score += WEIGHT_TAGS;
        }
        if category.as_deref().is_some_and(|c| c.contains(term)) {
            score += WEIGHT_CATEGORY;
        }
        if description.contains(term) {
            score += WEIGHT_DESCRIPTION;
        }
    }
    score
}
