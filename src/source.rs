//! Source-of-truth catalog entities and the store traits the index
//! subsystem reads them through.
//!
//! The relational order/inventory store and the catalog document store are
//! external collaborators; this module only defines the shapes the
//! synchronizer needs. Implementations are injected into
//! [`SearchService`](crate::service::SearchService) — no ambient globals.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Product publication status in the source store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Draft,
    Archived,
}

/// Storefront visibility, orthogonal to status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub sku: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub brand: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: ProductStatus,
    pub visibility: Visibility,
    pub base_price: f64,
    pub rating: Option<f64>,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub sales_count: i64,
    pub category_id: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    /// A product is indexable as active when it is published and not
    /// hidden from the storefront.
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        self.status == ProductStatus::Active && self.visibility != Visibility::Hidden
    }

    /// Primary SKU: the first variant's, if any variants exist.
    #[must_use]
    pub fn primary_sku(&self) -> Option<&str> {
        self.variants.first().map(|v| v.sku.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub meta_keywords: Vec<String>,
    pub is_active: bool,
    /// Cached count maintained by the catalog store; used as the
    /// category's popularity signal.
    #[serde(default)]
    pub product_count: i64,
}

/// Read access to the product source-of-truth store.
pub trait ProductStore: Send + Sync {
    fn find_by_id(&self, id: &str) -> Result<Option<Product>>;

    /// All active products, for full rebuilds.
    fn find_all_active(&self) -> Result<Vec<Product>>;
}

/// Read access to the category source-of-truth store.
pub trait CategoryStore: Send + Sync {
    fn find_by_id(&self, id: &str) -> Result<Option<Category>>;

    fn find_all_active(&self) -> Result<Vec<Category>>;
}
