use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, debug_span, warn};

use crate::catalog::{CategoryRepository, FilterProvider, ProductIndex, SavedSearchFilterProvider};
use crate::parse::normalize_datetime;
use crate::{
    BuildError, CatalogError, Category, Combine, ConditionMap, ConditionRecord, Operator,
    RewriteError, StoreId, Value,
};

/// Attribute holding a product's category memberships.
pub const CATEGORY_ATTRIBUTE: &str = "category_ids";

/// Attribute virtual-category conditions are rewritten onto.
pub const SKU_ATTRIBUTE: &str = "sku";

/// Written in place of a date the parser could not understand.
pub const EPOCH: &str = "1970-01-01 00:00:00";

/// Special-price date attributes normalized by default.
pub const DEFAULT_DATE_ATTRIBUTES: [&str; 2] = ["special_from_date", "special_to_date"];

/// Turns a persisted condition mapping into a rule tree the rule engine can
/// evaluate directly. Implemented by [`ConditionRewriter`]; product list
/// renderers depend on this rather than on the concrete rewriter.
pub trait Rewrite {
    /// # Errors
    ///
    /// See [`ConditionRewriter::rewrite_map`] and
    /// [`load_post`](crate::load_post).
    fn rewrite(&self, conditions: &ConditionMap, store: StoreId) -> Result<Combine, RewriteError>;
}

impl<T: Rewrite + ?Sized> Rewrite for &T {
    fn rewrite(&self, conditions: &ConditionMap, store: StoreId) -> Result<Combine, RewriteError> {
        (**self).rewrite(conditions, store)
    }
}

impl<T: Rewrite + ?Sized> Rewrite for Arc<T> {
    fn rewrite(&self, conditions: &ConditionMap, store: StoreId) -> Result<Combine, RewriteError> {
        (**self).rewrite(conditions, store)
    }
}

/// Tunables of a [`ConditionRewriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOptions {
    /// Attributes whose values are normalized to `YYYY-MM-DD HH:MM:SS`.
    pub date_attributes: Vec<String>,
    /// Fail the rewrite on an unparseable date instead of writing [`EPOCH`].
    pub strict_dates: bool,
    /// Time relative dates (`now`, `+1 day`) resolve against. Current UTC
    /// time when unset.
    pub reference_time: Option<NaiveDateTime>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            date_attributes: DEFAULT_DATE_ATTRIBUTES.iter().map(|a| (*a).to_owned()).collect(),
            strict_dates: false,
            reference_time: None,
        }
    }
}

impl RewriteOptions {
    fn now(&self) -> NaiveDateTime {
        self.reference_time
            .unwrap_or_else(|| Utc::now().naive_utc())
    }

    fn is_date_attribute(&self, attribute: &str) -> bool {
        self.date_attributes.iter().any(|a| a == attribute)
    }
}

/// Rewrites category conditions so the rule engine never has to know about
/// virtual or anchor categories.
///
/// 1. `category_ids == <virtual category>` becomes `sku () "<skus>"`, the
///    SKUs being what the product index returns for the category's saved
///    search, in index order.
/// 2. Date conditions are normalized.
/// 3. `category_ids` on an anchor category becomes
///    `category_ids () [<id>, <descendants>...]`.
///
/// The rewriter holds no per-call state and is shared freely across threads.
///
/// # Example
///
/// ```
/// use vcat::{
///     Category, ConditionMap, ConditionRecord, ConditionRewriter, IndexedProduct,
///     InMemoryCategoryRepository, InMemoryProductIndex, ProductAttributes, SearchQuery,
///     PRODUCT_TYPE,
/// };
///
/// let rewriter = ConditionRewriter::builder()
///     .categories(InMemoryCategoryRepository::new().with(
///         Category::new(42, "Red").virtual_with(SearchQuery::term("color", "red")),
///     ))
///     .index(InMemoryProductIndex::new().with(IndexedProduct::new(
///         "A-100",
///         ProductAttributes::new().set("color", "red"),
///     )))
///     .build()
///     .unwrap();
///
/// let conditions = ConditionMap::new()
///     .with("1--1", ConditionRecord::leaf(PRODUCT_TYPE, "category_ids", "==", 42_i64));
/// let rewritten = rewriter.rewrite_map(&conditions, 1).unwrap();
/// assert_eq!(rewritten.get("1--1").unwrap().to_string(), "(sku () A-100)");
/// ```
pub struct ConditionRewriter {
    categories: Arc<dyn CategoryRepository>,
    filters: Arc<dyn FilterProvider>,
    index: Arc<dyn ProductIndex>,
    options: RewriteOptions,
}

impl fmt::Debug for ConditionRewriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionRewriter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ConditionRewriter {
    #[must_use]
    pub fn builder() -> RewriterBuilder {
        RewriterBuilder::default()
    }

    #[must_use]
    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Rewrite the flat mapping without loading it.
    ///
    /// Keys, order and record `type`s are preserved; only rewritten records
    /// change.
    ///
    /// # Errors
    ///
    /// - [`RewriteError::Catalog`] if a category compared with `==` cannot be
    ///   resolved, or the filter provider or index fails. A missing category
    ///   during anchor expansion is not an error.
    /// - [`RewriteError::InvalidDate`] for an unparseable date when
    ///   [`RewriteOptions::strict_dates`] is set.
    pub fn rewrite_map(
        &self,
        conditions: &ConditionMap,
        store: StoreId,
    ) -> Result<ConditionMap, RewriteError> {
        let _span = debug_span!("rewrite_conditions", store, conditions = conditions.len()).entered();

        let mut rewritten = self.substitute_virtual(conditions, store)?;
        let now = self.options.now();

        for (key, record) in rewritten.iter_mut() {
            let Some(attribute) = record.attribute() else {
                continue;
            };
            if self.options.is_date_attribute(attribute) {
                self.normalize_date(key, record, now)?;
            } else if attribute == CATEGORY_ATTRIBUTE {
                self.expand_anchor(key, record, store)?;
            }
        }

        Ok(rewritten)
    }

    /// The ordered SKUs the index holds for a virtual category.
    ///
    /// # Errors
    ///
    /// Propagates filter provider and index failures.
    pub fn resolve_products(
        &self,
        category: &Category,
        store: StoreId,
    ) -> Result<Vec<String>, CatalogError> {
        let query = self.filters.query_filter(category)?;
        let products = self.index.search(store, &query)?;
        Ok(products.iter().map(|p| p.sku().to_owned()).collect())
    }

    fn resolve_category(&self, value: &Value, store: StoreId) -> Result<Category, CatalogError> {
        let id = value
            .as_category_id()
            .ok_or_else(|| CatalogError::InvalidCategoryId {
                value: value.to_string(),
            })?;
        self.categories.get(id, store)
    }

    fn substitute_virtual(
        &self,
        conditions: &ConditionMap,
        store: StoreId,
    ) -> Result<ConditionMap, RewriteError> {
        let mut replacements = Vec::new();

        for (key, record) in conditions.iter() {
            if record.attribute() != Some(CATEGORY_ATTRIBUTE)
                || record.operator() != Some(Operator::Eq.symbol())
            {
                continue;
            }
            let Some(value) = &record.value else {
                continue;
            };

            let category = self.resolve_category(value, store)?;
            if !category.is_virtual_category {
                continue;
            }

            let skus = self.resolve_products(&category, store)?;
            debug!(
                key,
                category = category.id,
                matches = skus.len(),
                "substituting virtual category condition with sku list"
            );
            replacements.push((
                key.to_owned(),
                ConditionRecord::leaf(
                    record.kind.clone(),
                    SKU_ATTRIBUTE,
                    Operator::OneOf.symbol(),
                    skus.join(","),
                ),
            ));
        }

        let mut rewritten = conditions.clone();
        for (key, record) in replacements {
            rewritten.insert(&key, record);
        }
        Ok(rewritten)
    }

    fn normalize_date(
        &self,
        key: &str,
        record: &mut ConditionRecord,
        now: NaiveDateTime,
    ) -> Result<(), RewriteError> {
        let raw = record
            .value
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();
        let normalized = match normalize_datetime(&raw, now) {
            Ok(normalized) => normalized,
            Err(source) if self.options.strict_dates => {
                return Err(RewriteError::InvalidDate {
                    key: key.to_owned(),
                    value: raw,
                    source,
                });
            }
            Err(err) => {
                warn!(key, value = %raw, error = %err, "unparseable date condition, using the Unix epoch");
                EPOCH.to_owned()
            }
        };
        record.value = Some(Value::String(normalized));
        Ok(())
    }

    fn expand_anchor(
        &self,
        key: &str,
        record: &mut ConditionRecord,
        store: StoreId,
    ) -> Result<(), RewriteError> {
        let Some(value) = &record.value else {
            return Ok(());
        };

        let category = match self.resolve_category(value, store) {
            Ok(category) => category,
            Err(err @ (CatalogError::NotFound { .. } | CatalogError::InvalidCategoryId { .. })) => {
                debug!(key, error = %err, "category not found, condition left unchanged");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        if !category.is_anchor {
            return Ok(());
        }

        let children = category.children(true);
        if children.is_empty() {
            return Ok(());
        }

        let mut ids = vec![value.clone()];
        ids.extend(children.split(',').map(child_id));
        debug!(
            key,
            category = category.id,
            descendants = ids.len() - 1,
            "expanding anchor category condition"
        );
        record.operator = Some(Operator::OneOf.symbol().to_owned());
        record.value = Some(Value::List(ids));
        Ok(())
    }
}

fn child_id(raw: &str) -> Value {
    let raw = raw.trim();
    raw.parse::<i64>()
        .map_or_else(|_| Value::String(raw.to_owned()), Value::Int)
}

impl Rewrite for ConditionRewriter {
    fn rewrite(&self, conditions: &ConditionMap, store: StoreId) -> Result<Combine, RewriteError> {
        let rewritten = self.rewrite_map(conditions, store)?;
        Ok(crate::load::load_post(&rewritten)?)
    }
}

/// Builder for [`ConditionRewriter`].
///
/// A category repository and a product index are required; the filter
/// provider defaults to [`SavedSearchFilterProvider`].
#[derive(Default)]
pub struct RewriterBuilder {
    categories: Option<Arc<dyn CategoryRepository>>,
    filters: Option<Arc<dyn FilterProvider>>,
    index: Option<Arc<dyn ProductIndex>>,
    options: RewriteOptions,
}

impl RewriterBuilder {
    #[must_use]
    pub fn categories(mut self, repository: impl CategoryRepository + 'static) -> Self {
        self.categories = Some(Arc::new(repository));
        self
    }

    #[must_use]
    pub fn filters(mut self, provider: impl FilterProvider + 'static) -> Self {
        self.filters = Some(Arc::new(provider));
        self
    }

    #[must_use]
    pub fn index(mut self, index: impl ProductIndex + 'static) -> Self {
        self.index = Some(Arc::new(index));
        self
    }

    /// Replace all options at once.
    #[must_use]
    pub fn options(mut self, options: RewriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Normalize this attribute as a date, in addition to the defaults.
    #[must_use]
    pub fn date_attribute(mut self, attribute: &str) -> Self {
        if !self.options.is_date_attribute(attribute) {
            self.options.date_attributes.push(attribute.to_owned());
        }
        self
    }

    #[must_use]
    pub fn strict_dates(mut self, strict: bool) -> Self {
        self.options.strict_dates = strict;
        self
    }

    #[must_use]
    pub fn reference_time(mut self, at: NaiveDateTime) -> Self {
        self.options.reference_time = Some(at);
        self
    }

    /// # Errors
    ///
    /// Returns [`BuildError::MissingCollaborator`] without a category
    /// repository or a product index.
    pub fn build(self) -> Result<ConditionRewriter, BuildError> {
        Ok(ConditionRewriter {
            categories: self
                .categories
                .ok_or(BuildError::MissingCollaborator("category repository"))?,
            filters: self
                .filters
                .unwrap_or_else(|| Arc::new(SavedSearchFilterProvider)),
            index: self
                .index
                .ok_or(BuildError::MissingCollaborator("product index"))?,
            options: self.options,
        })
    }
}
