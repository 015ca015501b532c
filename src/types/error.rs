use thiserror::Error;

use super::category::{CategoryId, StoreId};
use crate::parse::ParseError;

/// Failures reported by catalog collaborators (category repository, filter
/// provider, product index).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("category {category} does not exist in store {store}")]
    NotFound { category: CategoryId, store: StoreId },

    #[error("'{value}' is not a category id")]
    InvalidCategoryId { value: String },

    #[error("catalog backend error: {0}")]
    Backend(String),
}

/// Failures while loading a flat condition mapping into a rule tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("root condition '1' must be a combinator, got type '{kind}'")]
    RootNotCombine { kind: String },

    #[error("condition '{key}' is not nested under root condition '1'")]
    Unrooted { key: String },

    #[error("condition '{key}' has no parent '{parent}'")]
    OrphanCondition { key: String, parent: String },

    #[error("condition '{key}' is nested under leaf condition '{parent}'")]
    LeafParent { key: String, parent: String },

    #[error("condition '{key}' has no attribute")]
    MissingAttribute { key: String },

    #[error("condition '{key}' has no operator")]
    MissingOperator { key: String },

    #[error("unknown operator '{operator}' in condition '{key}'")]
    UnknownOperator { key: String, operator: String },

    #[error("unknown aggregator '{aggregator}' in condition '{key}'")]
    UnknownAggregator { key: String, aggregator: String },
}

/// Failures of a condition rewrite.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("invalid date '{value}' in condition '{key}'")]
    InvalidDate {
        key: String,
        value: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Returned by [`RewriterBuilder::build`](crate::RewriterBuilder::build).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("rewriter requires a {0}")]
    MissingCollaborator(&'static str),
}
