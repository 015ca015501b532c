use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::Value;

/// Type tag of the root combinator written by the widget admin form.
pub const COMBINE_TYPE: &str = "Magento\\CatalogWidget\\Model\\Rule\\Condition\\Combine";

/// Type tag of a product attribute condition written by the widget admin form.
pub const PRODUCT_TYPE: &str = "Magento\\CatalogWidget\\Model\\Rule\\Condition\\Product";

/// One entry of a persisted rule: either a leaf condition
/// (`attribute operator value`) or a combinator (`aggregator`, `value`).
///
/// Keys the rewriter does not understand are kept in `extra` and written
/// back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ConditionRecord {
    /// A leaf condition.
    #[must_use]
    pub fn leaf(
        kind: impl Into<String>,
        attribute: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            kind: kind.into(),
            attribute: Some(attribute.to_owned()),
            operator: Some(operator.to_owned()),
            value: Some(value.into()),
            aggregator: None,
            extra: BTreeMap::new(),
        }
    }

    /// A combinator node with the given aggregator (`all`/`any`) and expected
    /// truth value.
    #[must_use]
    pub fn combine(kind: impl Into<String>, aggregator: &str, expected: bool) -> Self {
        Self {
            kind: kind.into(),
            attribute: None,
            operator: None,
            value: Some(Value::String(if expected { "1" } else { "0" }.to_owned())),
            aggregator: Some(aggregator.to_owned()),
            extra: BTreeMap::new(),
        }
    }

    /// The tested attribute, treating an empty string as absent.
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref().filter(|a| !a.is_empty())
    }

    #[must_use]
    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    #[must_use]
    pub fn is_combine(&self) -> bool {
        self.aggregator.is_some() || self.kind.ends_with("Combine")
    }
}

impl fmt::Display for ConditionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_combine() {
            let aggregator = self.aggregator.as_deref().unwrap_or("all");
            let expected = self.value.as_ref().map_or_else(String::new, Value::to_string);
            return write!(f, "[{aggregator} = {expected}]");
        }
        let attribute = self.attribute().unwrap_or("?");
        let operator = self.operator().unwrap_or("?");
        match &self.value {
            Some(value) => write!(f, "({attribute} {operator} {value})"),
            None => write!(f, "({attribute} {operator})"),
        }
    }
}

/// Flat, ordered mapping from condition key (`"1"`, `"1--1"`, `"1--2--1"`)
/// to [`ConditionRecord`].
///
/// Order is the order the rule was persisted in and drives the order of
/// children in the loaded tree, so it is kept exactly as deserialized.
/// Equality is order-sensitive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionMap {
    entries: IndexMap<String, ConditionRecord>,
}

impl ConditionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record under `key`, chaining style.
    #[must_use]
    pub fn with(mut self, key: &str, record: ConditionRecord) -> Self {
        self.insert(key, record);
        self
    }

    /// Insert or replace. A replaced record keeps its position.
    pub fn insert(&mut self, key: &str, record: ConditionRecord) -> Option<ConditionRecord> {
        self.entries.insert(key.to_owned(), record)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConditionRecord> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConditionRecord)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ConditionRecord)> {
        self.entries.iter_mut().map(|(k, r)| (k.as_str(), r))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
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

impl PartialEq for ConditionMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl FromIterator<(String, ConditionRecord)> for ConditionMap {
    fn from_iter<I: IntoIterator<Item = (String, ConditionRecord)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ConditionMap {
    type Item = (String, ConditionRecord);
    type IntoIter = indexmap::map::IntoIter<String, ConditionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_preserves_order() {
        let json = r#"{
            "1": {"type": "Combine", "aggregator": "all", "value": "1"},
            "1--10": {"type": "p", "attribute": "sku", "operator": "==", "value": "B"},
            "1--2": {"type": "p", "attribute": "sku", "operator": "==", "value": "A"}
        }"#;
        let map: ConditionMap = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["1", "1--10", "1--2"]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = ConditionMap::new()
            .with("1", ConditionRecord::combine(COMBINE_TYPE, "all", true))
            .with("1--1", ConditionRecord::leaf("p", "sku", "==", "A"))
            .with("1--2", ConditionRecord::leaf("p", "sku", "==", "B"));
        let old = map.insert("1--1", ConditionRecord::leaf("p", "sku", "()", "C,D"));
        assert_eq!(old.unwrap().value, Some(Value::from("A")));
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["1", "1--1", "1--2"]);
        assert_eq!(map.get("1--1").unwrap().operator(), Some("()"));
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a = ConditionRecord::leaf("p", "sku", "==", "A");
        let b = ConditionRecord::leaf("p", "sku", "==", "B");
        let ab = ConditionMap::new().with("1--1", a.clone()).with("1--2", b.clone());
        let ba = ConditionMap::new().with("1--2", b).with("1--1", a);
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn serialize_keeps_insertion_order() {
        let map = ConditionMap::new()
            .with("1--2", ConditionRecord::leaf("p", "sku", "==", "B"))
            .with("1--1", ConditionRecord::leaf("p", "sku", "==", "A"));
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.find("1--2").unwrap() < json.find("1--1").unwrap());
        let back: ConditionMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
        let keys: Vec<String> = back.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["1--2", "1--1"]);
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let json = r#"{"1--1": {"type": "p", "attribute": "sku", "operator": "==", "value": "A", "is_value_processed": false}}"#;
        let map: ConditionMap = serde_json::from_str(json).unwrap();
        let record = map.get("1--1").unwrap();
        assert_eq!(
            record.extra.get("is_value_processed"),
            Some(&serde_json::Value::Bool(false))
        );
        let out = serde_json::to_string(&map).unwrap();
        assert!(out.contains("\"is_value_processed\":false"));
    }

    #[test]
    fn empty_attribute_is_absent() {
        let mut record = ConditionRecord::leaf("p", "", "==", "x");
        assert_eq!(record.attribute(), None);
        record.attribute = Some("sku".into());
        assert_eq!(record.attribute(), Some("sku"));
    }

    #[test]
    fn combine_detection() {
        assert!(ConditionRecord::combine(COMBINE_TYPE, "any", false).is_combine());
        let mut record = ConditionRecord::leaf(COMBINE_TYPE, "sku", "==", "A");
        record.aggregator = None;
        assert!(record.is_combine());
        assert!(!ConditionRecord::leaf(PRODUCT_TYPE, "sku", "==", "A").is_combine());
    }

    #[test]
    fn display_leaf_and_combine() {
        assert_eq!(
            ConditionRecord::leaf("p", "sku", "()", "A,B").to_string(),
            "(sku () A,B)"
        );
        assert_eq!(
            ConditionRecord::combine(COMBINE_TYPE, "all", true).to_string(),
            "[all = 1]"
        );
    }
}
