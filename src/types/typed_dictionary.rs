//! Structural dictionaries with named, typed fields.

use super::Type;
use std::fmt;

/// One field of a typed dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Field {
    /// The field name.
    pub name: String,
    /// The field annotation.
    pub annotation: Type,
}

impl Field {
    /// Creates a field.
    pub fn new(name: impl Into<String>, annotation: Type) -> Self {
        Self {
            name: name.into(),
            annotation,
        }
    }
}

/// A typed dictionary. Totality records whether all fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypedDictionary {
    /// The declared fields.
    pub fields: Vec<Field>,
    /// Whether every field is required.
    pub total: bool,
}

impl TypedDictionary {
    /// Creates a total typed dictionary.
    pub fn total(fields: Vec<Field>) -> Self {
        Self {
            fields,
            total: true,
        }
    }

    /// Creates a non-total typed dictionary.
    pub fn non_total(fields: Vec<Field>) -> Self {
        Self {
            fields,
            total: false,
        }
    }

    /// Looks up a field annotation by name.
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.annotation)
    }

    /// The nominal stand-in this dictionary behaves as outside of
    /// field-aware comparisons.
    pub fn primitive_form(&self) -> Type {
        if self.total {
            Type::primitive("TypedDictionary")
        } else {
            Type::primitive("NonTotalTypedDictionary")
        }
    }
}

impl fmt::Display for TypedDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TypedDict({})[",
            if self.total { "total" } else { "non-total" }
        )?;
        for (position, field) in self.fields.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, field.annotation)?;
        }
        write!(f, "]")
    }
}
