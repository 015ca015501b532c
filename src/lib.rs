mod catalog;
mod codec;
mod error;
mod evaluate;
mod load;
pub mod parse;
mod rewrite;
mod types;
mod widget;

pub use catalog::{
    CategoryRepository, FilterProvider, InMemoryCategoryRepository, InMemoryProductIndex,
    ProductIndex, SavedSearchFilterProvider,
};
pub use codec::{CodecError, ConditionsCodec};
pub use error::VcatError;
pub use load::load_post;
pub use rewrite::{
    ConditionRewriter, Rewrite, RewriteOptions, RewriterBuilder, CATEGORY_ATTRIBUTE,
    DEFAULT_DATE_ATTRIBUTES, EPOCH, SKU_ATTRIBUTE,
};
pub use types::{
    Aggregator, BuildError, CatalogError, Category, CategoryId, Combine, ConditionMap,
    ConditionRecord, IndexedProduct, LoadError, Node, Operator, ProductAttributes,
    ProductCondition, RewriteError, SearchQuery, StoreId, UnknownOperator, Value, COMBINE_TYPE,
    PRODUCT_TYPE,
};
pub use widget::{
    ProductsList, WidgetParams, DEFAULT_PAGE_VAR_NAME, DEFAULT_PRODUCTS_COUNT,
    DEFAULT_PRODUCTS_PER_PAGE, DEFAULT_SHOW_PAGER,
};
