use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::category::CategoryId;
use super::operator::Operator;

/// Loosely typed condition and attribute value.
///
/// Persisted widget rules carry values as whatever the admin form produced:
/// numbers, numeric strings, comma-joined lists or JSON arrays. `Value`
/// keeps that shape and offers the coercions the rewriter and evaluator need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// A UTF-8 string, possibly comma-joined.
    String(String),
    /// An explicit list of values.
    List(Vec<Value>),
}

impl Value {
    /// Compare this value to another with an ordering operator.
    ///
    /// Numeric strings are coerced to numbers when the other side is numeric.
    /// Returns `None` for incompatible types or non-ordering operators.
    #[must_use]
    pub fn compare(&self, op: Operator, other: &Value) -> Option<bool> {
        let ord = self.partial_cmp_value(other)?;
        match op {
            Operator::Gt => Some(ord == Ordering::Greater),
            Operator::Gte => Some(ord != Ordering::Less),
            Operator::Lt => Some(ord == Ordering::Less),
            Operator::Lte => Some(ord != Ordering::Greater),
            _ => None,
        }
    }

    /// Equality as the storefront rule engine sees it: `7`, `7.0` and `"7"`
    /// are all equal, strings compare case-sensitively after trimming.
    #[must_use]
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::List(_), _) | (_, Value::List(_)) => false,
            (Value::String(a), Value::String(b)) => a.trim() == b.trim(),
            _ => self.partial_cmp_value(other) == Some(Ordering::Equal),
        }
    }

    /// Interpret this value as a single category id.
    #[must_use]
    pub fn as_category_id(&self) -> Option<CategoryId> {
        match self {
            Value::Int(v) => CategoryId::try_from(*v).ok(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Flatten into the set of items a membership operator tests against.
    ///
    /// Strings are split on `,`, items are trimmed and empty items dropped,
    /// so `""` yields an empty set.
    #[must_use]
    pub fn items(&self) -> Vec<Value> {
        match self {
            Value::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_owned()))
                .collect(),
            Value::List(items) => items.iter().flat_map(Value::items).collect(),
            scalar => vec![scalar.clone()],
        }
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(_) | Value::List(_) => None,
        }
    }

    fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => {
                match (self.as_number(), other.as_number()) {
                    (Some(x), Some(y)) => x.partial_cmp(&y),
                    _ => a.trim().partial_cmp(b.trim()),
                }
            }
            (Value::List(_), _) | (_, Value::List(_)) => None,
            (Value::Bool(_), _) | (_, Value::Bool(_)) => None,
            _ => self.as_number()?.partial_cmp(&other.as_number()?),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(42_i64), Value::Int(42));
        assert_eq!(Value::from(1.5_f64), Value::Float(1.5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_owned()));
        assert_eq!(
            Value::from(vec![7_i64, 8]),
            Value::List(vec![Value::Int(7), Value::Int(8)])
        );
    }

    #[test]
    fn display_is_unquoted() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::String("A-100".into()).to_string(), "A-100");
        assert_eq!(Value::from(vec![7_i64, 8, 9]).to_string(), "7,8,9");
        assert_eq!(Value::List(vec![]).to_string(), "");
    }

    #[test]
    fn deserialize_untagged() {
        let v: Value = serde_json::from_str("42").unwrap();
        assert_eq!(v, Value::Int(42));
        let v: Value = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(v, Value::String("42".into()));
        let v: Value = serde_json::from_str("[\"8\", 9]").unwrap();
        assert_eq!(
            v,
            Value::List(vec![Value::String("8".into()), Value::Int(9)])
        );
        let v: Value = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, Value::Float(2.5));
    }

    #[test]
    fn category_id_coercion() {
        assert_eq!(Value::Int(42).as_category_id(), Some(42));
        assert_eq!(Value::String(" 42 ".into()).as_category_id(), Some(42));
        assert_eq!(Value::Int(-1).as_category_id(), None);
        assert_eq!(Value::String("4,5".into()).as_category_id(), None);
        assert_eq!(Value::from(vec![4_i64]).as_category_id(), None);
    }

    #[test]
    fn items_split_and_trim() {
        assert_eq!(
            Value::String("A-100, A-200".into()).items(),
            vec![Value::from("A-100"), Value::from("A-200")]
        );
        assert!(Value::String(String::new()).items().is_empty());
        assert!(Value::String(" , ".into()).items().is_empty());
        assert_eq!(Value::Int(3).items(), vec![Value::Int(3)]);
    }

    #[test]
    fn loose_equality_crosses_types() {
        assert!(Value::Int(7).loose_eq(&Value::String("7".into())));
        assert!(Value::Float(7.0).loose_eq(&Value::Int(7)));
        assert!(Value::String("abc".into()).loose_eq(&Value::String(" abc".into())));
        assert!(!Value::Int(7).loose_eq(&Value::String("seven".into())));
        assert!(!Value::Bool(true).loose_eq(&Value::Int(1)));
    }

    #[test]
    fn compare_ordering_ops() {
        let a = Value::Int(10);
        let b = Value::String("20".into());
        assert_eq!(a.compare(Operator::Lt, &b), Some(true));
        assert_eq!(a.compare(Operator::Gte, &b), Some(false));
        assert_eq!(a.compare(Operator::Lte, &a), Some(true));
        assert_eq!(a.compare(Operator::Eq, &a), None);
    }

    #[test]
    fn compare_dates_lexically() {
        let a = Value::from("2024-01-05 00:00:00");
        let b = Value::from("2024-02-01 00:00:00");
        assert_eq!(a.compare(Operator::Lt, &b), Some(true));
    }

    #[test]
    fn compare_type_mismatch_returns_none() {
        let i = Value::Int(1);
        let s = Value::from("hello");
        assert_eq!(i.compare(Operator::Gt, &s), None);
        assert_eq!(i.compare(Operator::Gt, &Value::Bool(true)), None);
        assert_eq!(i.compare(Operator::Gt, &Value::from(vec![1_i64])), None);
    }
}
