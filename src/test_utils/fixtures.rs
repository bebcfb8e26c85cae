//! In-memory source stores and entity builders.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{Result, SearchError};
use crate::source::{Category, CategoryStore, Product, ProductStatus, ProductStore, Visibility};

/// A minimal active, public product. Tests override the fields they need.
#[must_use]
pub fn product(id: &str, name: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        brand: None,
        tags: Vec::new(),
        status: ProductStatus::Active,
        visibility: Visibility::Public,
        base_price: 10.0,
        rating: None,
        view_count: 0,
        sales_count: 0,
        category_id: None,
        variants: Vec::new(),
    }
}

/// A minimal active category.
#[must_use]
pub fn category(id: &str, name: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        description: String::new(),
        meta_keywords: Vec::new(),
        is_active: true,
        product_count: 0,
    }
}

/// In-memory [`ProductStore`] with mutation helpers and per-id failure
/// injection for exercising retry and rebuild-report paths.
#[derive(Default)]
pub struct MemoryProductStore {
    products: Mutex<HashMap<String, Product>>,
    failing: Mutex<HashMap<String, u32>>,
}

impl MemoryProductStore {
    #[must_use]
    pub fn with(products: Vec<Product>) -> Self {
        let store = Self::default();
        for p in products {
            store.insert(p);
        }
        store
    }

    pub fn insert(&self, product: Product) {
        self.products.lock().insert(product.id.clone(), product);
    }

    pub fn remove(&self, id: &str) {
        self.products.lock().remove(id);
    }

    /// Make the next `times` lookups for `id` fail with a source error.
    /// Pass `u32::MAX` for a permanent failure.
    pub fn fail_lookup(&self, id: &str, times: u32) {
        self.failing.lock().insert(id.to_string(), times);
    }

    fn check_failure(&self, id: &str) -> Result<()> {
        let mut failing = self.failing.lock();
        if let Some(remaining) = failing.get_mut(id)
            && *remaining > 0
        {
            if *remaining != u32::MAX {
                *remaining -= 1;
            }
            return Err(SearchError::Source(format!(
                "injected failure for product {id}"
            )));
        }
        Ok(())
    }
}

impl ProductStore for MemoryProductStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Product>> {
        self.check_failure(id)?;
        Ok(self.products.lock().get(id).cloned())
    }

    fn find_all_active(&self) -> Result<Vec<Product>> {
        let mut all: Vec<Product> = self
            .products
            .lock()
            .values()
            .filter(|p| p.status == ProductStatus::Active)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}

/// In-memory [`CategoryStore`] counterpart.
#[derive(Default)]
pub struct MemoryCategoryStore {
    categories: Mutex<HashMap<String, Category>>,
    failing: Mutex<HashMap<String, u32>>,
}

impl MemoryCategoryStore {
    #[must_use]
    pub fn with(categories: Vec<Category>) -> Self {
        let store = Self::default();
        for c in categories {
            store.insert(c);
        }
        store
    }

    pub fn insert(&self, category: Category) {
        self.categories.lock().insert(category.id.clone(), category);
    }

    pub fn remove(&self, id: &str) {
        self.categories.lock().remove(id);
    }

    /// Make the next `times` lookups for `id` fail. `u32::MAX` = always.
    pub fn fail_lookup(&self, id: &str, times: u32) {
        self.failing.lock().insert(id.to_string(), times);
    }
}

impl CategoryStore for MemoryCategoryStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Category>> {
        {
            let mut failing = self.failing.lock();
            if let Some(remaining) = failing.get_mut(id)
                && *remaining > 0
            {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(SearchError::Source(format!(
                    "injected failure for category {id}"
                )));
            }
        }
        Ok(self.categories.lock().get(id).cloned())
    }

    fn find_all_active(&self) -> Result<Vec<Category>> {
        let mut all: Vec<Category> = self
            .categories
            .lock()
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}
