use std::collections::HashMap;

use super::Value;

/// Attribute values of one product, keyed by attribute code.
///
/// Multi-valued attributes such as `category_ids` are stored as
/// [`Value::List`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductAttributes {
    data: HashMap<String, Value>,
}

impl ProductAttributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute value, chaining style.
    #[must_use]
    pub fn set(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.insert(attribute, value.into());
        self
    }

    /// Insert an attribute value (mutable reference version).
    pub fn insert(&mut self, attribute: &str, value: Value) {
        self.data.insert(attribute.to_owned(), value);
    }

    /// Look up an attribute. Returns `None` if the product has no value for it.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.data.get(attribute)
    }
}

/// A product document as stored in the search index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedProduct {
    sku: String,
    attributes: ProductAttributes,
}

impl IndexedProduct {
    /// Create a product. The SKU is also exposed as the `sku` attribute.
    #[must_use]
    pub fn new(sku: &str, attributes: ProductAttributes) -> Self {
        let attributes = attributes.set("sku", sku);
        Self {
            sku: sku.to_owned(),
            attributes,
        }
    }

    #[must_use]
    pub fn sku(&self) -> &str {
        &self.sku
    }

    #[must_use]
    pub fn attributes(&self) -> &ProductAttributes {
        &self.attributes
    }
}
