use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Filter executed against the product search index.
///
/// This is the shape a virtual category's saved search is stored in, and
/// what a [`FilterProvider`](crate::FilterProvider) hands to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchQuery {
    MatchAll,
    /// Field equals (or, for multi-valued fields, contains) `value`.
    Term { field: String, value: Value },
    /// Field matches any of `values`.
    Terms { field: String, values: Vec<Value> },
    /// Inclusive range; an absent bound is open.
    Range {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gte: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lte: Option<Value>,
    },
    /// `must` all match, at least one `should` matches when any are given,
    /// no `must_not` matches.
    Bool {
        #[serde(default)]
        must: Vec<SearchQuery>,
        #[serde(default)]
        should: Vec<SearchQuery>,
        #[serde(default)]
        must_not: Vec<SearchQuery>,
    },
}

impl SearchQuery {
    #[must_use]
    pub fn term(field: &str, value: impl Into<Value>) -> Self {
        SearchQuery::Term {
            field: field.to_owned(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn terms<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        SearchQuery::Terms {
            field: field.to_owned(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn range(field: &str, gte: Option<Value>, lte: Option<Value>) -> Self {
        SearchQuery::Range {
            field: field.to_owned(),
            gte,
            lte,
        }
    }

    /// Conjunction of the given clauses.
    #[must_use]
    pub fn all_of(must: Vec<SearchQuery>) -> Self {
        SearchQuery::Bool {
            must,
            should: Vec::new(),
            must_not: Vec::new(),
        }
    }

    /// Disjunction of the given clauses.
    #[must_use]
    pub fn any_of(should: Vec<SearchQuery>) -> Self {
        SearchQuery::Bool {
            must: Vec::new(),
            should,
            must_not: Vec::new(),
        }
    }

    #[must_use]
    pub fn excluding(self, must_not: SearchQuery) -> Self {
        match self {
            SearchQuery::Bool {
                must,
                should,
                must_not: mut excluded,
            } => {
                excluded.push(must_not);
                SearchQuery::Bool {
                    must,
                    should,
                    must_not: excluded,
                }
            }
            other => SearchQuery::Bool {
                must: vec![other],
                should: Vec::new(),
                must_not: vec![must_not],
            },
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchQuery::MatchAll => f.write_str("*"),
            SearchQuery::Term { field, value } => write!(f, "{field}:{value}"),
            SearchQuery::Terms { field, values } => {
                write!(f, "{field}:[{}]", Value::List(values.clone()))
            }
            SearchQuery::Range { field, gte, lte } => {
                let lo = gte.as_ref().map_or_else(|| "*".to_owned(), Value::to_string);
                let hi = lte.as_ref().map_or_else(|| "*".to_owned(), Value::to_string);
                write!(f, "{field}:[{lo} TO {hi}]")
            }
            SearchQuery::Bool {
                must,
                should,
                must_not,
            } => {
                let mut parts = Vec::new();
                parts.extend(must.iter().map(|q| format!("+{q}")));
                parts.extend(should.iter().map(ToString::to_string));
                parts.extend(must_not.iter().map(|q| format!("-{q}")));
                write!(f, "({})", parts.join(" "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_saved_rule() {
        let json = r#"{
            "type": "bool",
            "must": [{"type": "term", "field": "color", "value": "red"}],
            "must_not": [{"type": "range", "field": "price", "gte": 100}]
        }"#;
        let query: SearchQuery = serde_json::from_str(json).unwrap();
        assert_eq!(
            query,
            SearchQuery::all_of(vec![SearchQuery::term("color", "red")])
                .excluding(SearchQuery::range("price", Some(Value::Int(100)), None))
        );
    }

    #[test]
    fn display_is_readable() {
        let query = SearchQuery::all_of(vec![
            SearchQuery::term("color", "red"),
            SearchQuery::terms("category_ids", [3_i64, 4]),
        ])
        .excluding(SearchQuery::range("price", None, Some(Value::Int(10))));
        assert_eq!(
            query.to_string(),
            "(+color:red +category_ids:[3,4] -price:[* TO 10])"
        );
    }
}
