use std::fmt;

use super::operator::Operator;
use super::product::ProductAttributes;
use super::value::Value;

/// How a combinator joins its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregator {
    All,
    Any,
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregator::All => f.write_str("ALL"),
            Aggregator::Any => f.write_str("ANY"),
        }
    }
}

/// A leaf predicate on one product attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCondition {
    pub kind: String,
    pub attribute: String,
    pub operator: Operator,
    pub value: Value,
}

/// A node of the loaded rule tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Combine(Combine),
    Condition(ProductCondition),
}

/// Evaluable combinator tree produced by [`load_post`](crate::load_post).
///
/// "If `aggregator` of these conditions are `expected`": with
/// `Aggregator::All` and `expected == false` every child must be false.
#[derive(Debug, Clone, PartialEq)]
pub struct Combine {
    pub kind: String,
    pub aggregator: Aggregator,
    pub expected: bool,
    pub children: Vec<Node>,
}

impl Combine {
    /// An empty `ALL = true` combinator, which matches every product.
    #[must_use]
    pub fn match_all(kind: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            aggregator: Aggregator::All,
            expected: true,
            children: Vec::new(),
        }
    }

    /// Whether the product satisfies this rule.
    #[must_use]
    pub fn validate(&self, product: &ProductAttributes) -> bool {
        crate::evaluate::validate_combine(self, product)
    }

    /// All leaf conditions, depth first.
    #[must_use]
    pub fn conditions(&self) -> Vec<&ProductCondition> {
        let mut out = Vec::new();
        collect_conditions(self, &mut out);
        out
    }
}

fn collect_conditions<'a>(combine: &'a Combine, out: &mut Vec<&'a ProductCondition>) {
    for child in &combine.children {
        match child {
            Node::Combine(inner) => collect_conditions(inner, out),
            Node::Condition(condition) => out.push(condition),
        }
    }
}

impl fmt::Display for ProductCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.attribute, self.operator, self.value)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Combine(c) => write!(f, "{c}"),
            Node::Condition(c) => write!(f, "{c}"),
        }
    }
}

impl fmt::Display for Combine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: [", self.aggregator, self.expected)?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{child}")?;
        }
        f.write_str("]")
    }
}
