mod category;
mod combine;
mod condition;
mod error;
mod operator;
mod product;
mod query;
mod value;

pub use category::{Category, CategoryId, StoreId};
pub use combine::{Aggregator, Combine, Node, ProductCondition};
pub use condition::{ConditionMap, ConditionRecord, COMBINE_TYPE, PRODUCT_TYPE};
pub use error::{BuildError, CatalogError, LoadError, RewriteError};
pub use operator::{Operator, UnknownOperator};
pub use product::{IndexedProduct, ProductAttributes};
pub use query::SearchQuery;
pub use value::Value;
