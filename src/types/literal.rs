//! Literal types and their carrier primitives.

use super::Type;
use std::fmt;

/// A literal value admitted as a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiteralValue {
    /// An integer literal.
    Integer(i64),
    /// A string literal.
    String(String),
    /// A boolean literal.
    Boolean(bool),
}

impl LiteralValue {
    /// The nominal type that carries values of this literal.
    pub fn carrier(&self) -> Type {
        match self {
            LiteralValue::Integer(_) => Type::primitive("int"),
            LiteralValue::String(_) => Type::primitive("str"),
            LiteralValue::Boolean(_) => Type::primitive("bool"),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Integer(value) => write!(f, "typing_extensions.Literal[{value}]"),
            LiteralValue::String(value) => {
                write!(f, "typing_extensions.Literal['{value}']")
            }
            LiteralValue::Boolean(value) => {
                write!(
                    f,
                    "typing_extensions.Literal[{}]",
                    if *value { "True" } else { "False" }
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carriers() {
        assert_eq!(LiteralValue::Integer(1).carrier(), Type::primitive("int"));
        assert_eq!(
            LiteralValue::String("a".to_string()).carrier(),
            Type::primitive("str")
        );
        assert_eq!(LiteralValue::Boolean(true).carrier(), Type::primitive("bool"));
    }
}
