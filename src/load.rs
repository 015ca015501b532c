use std::collections::HashMap;

use crate::{
    Aggregator, Combine, ConditionMap, ConditionRecord, LoadError, Node, Operator,
    ProductCondition, Value, COMBINE_TYPE,
};

const ROOT_KEY: &str = "1";
const SEPARATOR: &str = "--";

/// Load a flat condition mapping into an evaluable [`Combine`] tree.
///
/// Key `"1"` is the root combinator; `"1--2"` is the second child of the
/// root, `"1--2--1"` the first child of that, and so on. Children keep the
/// order of the mapping. An empty mapping, or one without a `"1"` entry,
/// gets an implicit `ALL = true` root.
///
/// # Errors
///
/// Returns [`LoadError`] if the root is not a combinator, a key has no
/// parent, a condition is nested under a leaf, or a leaf has no attribute, no
/// operator or an unknown one.
pub fn load_post(conditions: &ConditionMap) -> Result<Combine, LoadError> {
    let mut drafts: Vec<Draft> = Vec::with_capacity(conditions.len() + 1);
    let mut index: HashMap<&str, usize> = HashMap::new();

    match conditions.get(ROOT_KEY) {
        Some(root) if !root.is_combine() => {
            return Err(LoadError::RootNotCombine {
                kind: root.kind.clone(),
            });
        }
        Some(_) => {}
        None => {
            drafts.push(Draft::Combine {
                combine: Combine::match_all(COMBINE_TYPE),
                children: Vec::new(),
            });
            index.insert(ROOT_KEY, 0);
        }
    }

    for (key, record) in conditions.iter() {
        check_rooted(key)?;
        index.insert(key, drafts.len());
        drafts.push(draft(key, record)?);
    }

    for (key, _) in conditions.iter() {
        let Some((parent, _)) = key.rsplit_once(SEPARATOR) else {
            continue;
        };
        let Some(&parent_idx) = index.get(parent) else {
            return Err(LoadError::OrphanCondition {
                key: key.to_owned(),
                parent: parent.to_owned(),
            });
        };
        let child_idx = index[key];
        match &mut drafts[parent_idx] {
            Draft::Combine { children, .. } => children.push(child_idx),
            Draft::Leaf(_) => {
                return Err(LoadError::LeafParent {
                    key: key.to_owned(),
                    parent: parent.to_owned(),
                });
            }
        }
    }

    let mut slots: Vec<Option<Draft>> = drafts.into_iter().map(Some).collect();
    match assemble(&mut slots, index[ROOT_KEY]) {
        Node::Combine(root) => Ok(root),
        Node::Condition(_) => unreachable!("root was checked to be a combinator"),
    }
}

enum Draft {
    Combine {
        combine: Combine,
        children: Vec<usize>,
    },
    Leaf(ProductCondition),
}

fn check_rooted(key: &str) -> Result<(), LoadError> {
    if key == ROOT_KEY || key.starts_with("1--") {
        Ok(())
    } else {
        Err(LoadError::Unrooted {
            key: key.to_owned(),
        })
    }
}

fn draft(key: &str, record: &ConditionRecord) -> Result<Draft, LoadError> {
    if record.is_combine() {
        let aggregator = match record.aggregator.as_deref().map(str::trim) {
            None | Some("all") => Aggregator::All,
            Some("any") => Aggregator::Any,
            Some(other) => {
                return Err(LoadError::UnknownAggregator {
                    key: key.to_owned(),
                    aggregator: other.to_owned(),
                });
            }
        };
        let combine = Combine {
            kind: record.kind.clone(),
            aggregator,
            expected: record.value.as_ref().map_or(true, truthy),
            children: Vec::new(),
        };
        return Ok(Draft::Combine {
            combine,
            children: Vec::new(),
        });
    }

    let attribute = record
        .attribute()
        .ok_or_else(|| LoadError::MissingAttribute {
            key: key.to_owned(),
        })?;
    let symbol = record
        .operator()
        .ok_or_else(|| LoadError::MissingOperator {
            key: key.to_owned(),
        })?;
    let operator = symbol
        .parse::<Operator>()
        .map_err(|_| LoadError::UnknownOperator {
            key: key.to_owned(),
            operator: symbol.to_owned(),
        })?;
    Ok(Draft::Leaf(ProductCondition {
        kind: record.kind.clone(),
        attribute: attribute.to_owned(),
        operator,
        value: record
            .value
            .clone()
            .unwrap_or_else(|| Value::String(String::new())),
    }))
}

/// Truthiness of a combinator's expected value as the admin form stores it.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Int(v) => *v != 0,
        Value::Float(v) => *v != 0.0,
        Value::Bool(v) => *v,
        Value::String(s) => !matches!(s.trim(), "" | "0" | "false"),
        Value::List(items) => !items.is_empty(),
    }
}

fn assemble(slots: &mut [Option<Draft>], idx: usize) -> Node {
    match slots[idx].take() {
        Some(Draft::Combine {
            mut combine,
            children,
        }) => {
            combine.children = children
                .into_iter()
                .map(|child| assemble(slots, child))
                .collect();
            Node::Combine(combine)
        }
        Some(Draft::Leaf(condition)) => Node::Condition(condition),
        None => unreachable!("each draft has exactly one parent"),
    }
}
