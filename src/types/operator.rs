use std::fmt;
use std::str::FromStr;

/// Condition operators understood by the storefront rule engine.
///
/// Stored in persisted rules by their symbol (`"=="`, `"()"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==` is
    Eq,
    /// `!=` is not
    Neq,
    /// `>=` equals or greater than
    Gte,
    /// `<=` equals or less than
    Lte,
    /// `>` greater than
    Gt,
    /// `<` less than
    Lt,
    /// `{}` contains
    Contains,
    /// `!{}` does not contain
    NotContains,
    /// `()` is one of
    OneOf,
    /// `!()` is not one of
    NotOneOf,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gte,
        Operator::Lte,
        Operator::Gt,
        Operator::Lt,
        Operator::Contains,
        Operator::NotContains,
        Operator::OneOf,
        Operator::NotOneOf,
    ];

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Contains => "{}",
            Operator::NotContains => "!{}",
            Operator::OneOf => "()",
            Operator::NotOneOf => "!()",
        }
    }

    /// The operator with the opposite outcome, if it is one of the negated
    /// pairs (`==`/`!=`, `{}`/`!{}`, `()`/`!()`).
    #[must_use]
    pub fn negated(self) -> Option<Operator> {
        match self {
            Operator::Eq => Some(Operator::Neq),
            Operator::Neq => Some(Operator::Eq),
            Operator::Contains => Some(Operator::NotContains),
            Operator::NotContains => Some(Operator::Contains),
            Operator::OneOf => Some(Operator::NotOneOf),
            Operator::NotOneOf => Some(Operator::OneOf),
            Operator::Gte | Operator::Lte | Operator::Gt | Operator::Lt => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Returned when a persisted operator symbol is not one of [`Operator::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.symbol() == s.trim())
            .ok_or_else(|| UnknownOperator(s.to_owned()))
    }
}
