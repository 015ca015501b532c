//! Catalog collaborators the rewriter depends on.
//!
//! - [`CategoryRepository`]: resolves a category id in a store scope
//! - [`FilterProvider`]: turns a virtual category into an index query
//! - [`ProductIndex`]: executes a query against the product search index
//!
//! The in-memory implementations back tests, benches and the demo; a
//! deployment plugs in clients for its own catalog database and search
//! engine.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    CatalogError, Category, CategoryId, IndexedProduct, SearchQuery, StoreId, Value,
};

/// Resolves categories by id within a store scope.
pub trait CategoryRepository: Send + Sync {
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when the id does not exist for the store,
    /// or a backend error.
    fn get(&self, id: CategoryId, store: StoreId) -> Result<Category, CatalogError>;
}

/// Builds the index query selecting a virtual category's products.
pub trait FilterProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the category's saved search cannot be
    /// turned into a query.
    fn query_filter(&self, category: &Category) -> Result<SearchQuery, CatalogError>;
}

/// Executes queries against the product search index.
pub trait ProductIndex: Send + Sync {
    /// Matching products in index order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Backend`] if the index cannot be queried.
    fn search(
        &self,
        store: StoreId,
        query: &SearchQuery,
    ) -> Result<Vec<IndexedProduct>, CatalogError>;
}

impl<T: CategoryRepository + ?Sized> CategoryRepository for Arc<T> {
    fn get(&self, id: CategoryId, store: StoreId) -> Result<Category, CatalogError> {
        (**self).get(id, store)
    }
}

impl<T: FilterProvider + ?Sized> FilterProvider for Arc<T> {
    fn query_filter(&self, category: &Category) -> Result<SearchQuery, CatalogError> {
        (**self).query_filter(category)
    }
}

impl<T: ProductIndex + ?Sized> ProductIndex for Arc<T> {
    fn search(
        &self,
        store: StoreId,
        query: &SearchQuery,
    ) -> Result<Vec<IndexedProduct>, CatalogError> {
        (**self).search(store, query)
    }
}

/// Category repository held in memory.
///
/// Categories added with [`insert`](Self::insert) exist in every store;
/// [`insert_for_store`](Self::insert_for_store) adds a store-specific version
/// that takes precedence in that store.
#[derive(Debug, Default)]
pub struct InMemoryCategoryRepository {
    global: HashMap<CategoryId, Category>,
    scoped: HashMap<(StoreId, CategoryId), Category>,
}

impl InMemoryCategoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, category: Category) -> Self {
        self.insert(category);
        self
    }

    pub fn insert(&mut self, category: Category) {
        self.global.insert(category.id, category);
    }

    pub fn insert_for_store(&mut self, store: StoreId, category: Category) {
        self.scoped.insert((store, category.id), category);
    }
}

impl CategoryRepository for InMemoryCategoryRepository {
    fn get(&self, id: CategoryId, store: StoreId) -> Result<Category, CatalogError> {
        self.scoped
            .get(&(store, id))
            .or_else(|| self.global.get(&id))
            .cloned()
            .ok_or(CatalogError::NotFound {
                category: id,
                store,
            })
    }
}

/// Uses a virtual category's saved search as its query. A category without a
/// saved search selects the products explicitly assigned to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SavedSearchFilterProvider;

impl FilterProvider for SavedSearchFilterProvider {
    fn query_filter(&self, category: &Category) -> Result<SearchQuery, CatalogError> {
        Ok(category.virtual_rule.clone().unwrap_or_else(|| {
            SearchQuery::terms("category_ids", [Value::Int(i64::from(category.id))])
        }))
    }
}

#[derive(Debug, Clone)]
struct IndexEntry {
    stores: Option<Vec<StoreId>>,
    product: IndexedProduct,
}

/// Product index held in memory. Results come back in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryProductIndex {
    entries: Vec<IndexEntry>,
}

impl InMemoryProductIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, product: IndexedProduct) -> Self {
        self.insert(product);
        self
    }

    /// Index a product visible in every store.
    pub fn insert(&mut self, product: IndexedProduct) {
        self.entries.push(IndexEntry {
            stores: None,
            product,
        });
    }

    /// Index a product visible only in the given stores.
    pub fn insert_for_stores(&mut self, stores: &[StoreId], product: IndexedProduct) {
        self.entries.push(IndexEntry {
            stores: Some(stores.to_vec()),
            product,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProductIndex for InMemoryProductIndex {
    fn search(
        &self,
        store: StoreId,
        query: &SearchQuery,
    ) -> Result<Vec<IndexedProduct>, CatalogError> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| {
                entry
                    .stores
                    .as_ref()
                    .map_or(true, |stores| stores.contains(&store))
            })
            .filter(|entry| crate::evaluate::query_matches(query, entry.product.attributes()))
            .map(|entry| entry.product.clone())
            .collect())
    }
}
