use crate::{Combine, Node, Operator, ProductAttributes, ProductCondition, SearchQuery, Value};

pub(crate) fn validate_combine(combine: &Combine, product: &ProductAttributes) -> bool {
    if combine.children.is_empty() {
        return true;
    }
    let mut outcomes = combine
        .children
        .iter()
        .map(|child| validate_node(child, product) == combine.expected);
    match combine.aggregator {
        crate::Aggregator::All => outcomes.all(|ok| ok),
        crate::Aggregator::Any => outcomes.any(|ok| ok),
    }
}

fn validate_node(node: &Node, product: &ProductAttributes) -> bool {
    match node {
        Node::Combine(inner) => validate_combine(inner, product),
        Node::Condition(condition) => validate_condition(condition, product),
    }
}

fn validate_condition(condition: &ProductCondition, product: &ProductAttributes) -> bool {
    let Some(actual) = product.get(&condition.attribute) else {
        // A product without the attribute only satisfies the negated operators.
        return matches!(
            condition.operator,
            Operator::Neq | Operator::NotContains | Operator::NotOneOf
        );
    };
    let expected = &condition.value;
    match condition.operator {
        Operator::Eq => equals(actual, expected),
        Operator::Neq => !equals(actual, expected),
        Operator::OneOf => one_of(actual, expected),
        Operator::NotOneOf => !one_of(actual, expected),
        Operator::Contains => contains(actual, expected),
        Operator::NotContains => !contains(actual, expected),
        op @ (Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte) => {
            actual.compare(op, expected).unwrap_or(false)
        }
    }
}

/// Members of an attribute value: the items of a list, or the scalar itself.
fn members(actual: &Value) -> Vec<Value> {
    match actual {
        Value::List(_) => actual.items(),
        scalar => vec![scalar.clone()],
    }
}

fn intersects(have: &[Value], wanted: &[Value]) -> bool {
    wanted.iter().any(|w| have.iter().any(|h| h.loose_eq(w)))
}

fn equals(actual: &Value, expected: &Value) -> bool {
    if actual.is_list() {
        intersects(&members(actual), &expected.items())
    } else {
        actual.loose_eq(expected)
    }
}

/// `()`: an empty expected set never matches.
fn one_of(actual: &Value, expected: &Value) -> bool {
    let wanted = expected.items();
    !wanted.is_empty() && intersects(&members(actual), &wanted)
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(haystack) => {
            let needle = expected.to_string().to_lowercase();
            !needle.is_empty() && haystack.to_lowercase().contains(&needle)
        }
        _ => intersects(&members(actual), &expected.items()),
    }
}

pub(crate) fn query_matches(query: &SearchQuery, product: &ProductAttributes) -> bool {
    match query {
        SearchQuery::MatchAll => true,
        SearchQuery::Term { field, value } => {
            product.get(field).is_some_and(|actual| equals(actual, value))
        }
        SearchQuery::Terms { field, values } => product
            .get(field)
            .is_some_and(|actual| values.iter().any(|value| equals(actual, value))),
        SearchQuery::Range { field, gte, lte } => product.get(field).is_some_and(|actual| {
            let above = gte
                .as_ref()
                .map_or(true, |lo| actual.compare(Operator::Gte, lo) == Some(true));
            let below = lte
                .as_ref()
                .map_or(true, |hi| actual.compare(Operator::Lte, hi) == Some(true));
            above && below
        }),
        SearchQuery::Bool {
            must,
            should,
            must_not,
        } => {
            must.iter().all(|q| query_matches(q, product))
                && (should.is_empty() || should.iter().any(|q| query_matches(q, product)))
                && !must_not.iter().any(|q| query_matches(q, product))
        }
    }
}
