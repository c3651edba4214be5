//! Type variables with declared bounds, constraint sets, and variance.

use super::Type;
use std::fmt;

/// Declared variance of a type variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variance {
    /// Substitution requires equality of the subtype relation.
    Invariant,
    /// Substitution preserves the subtype relation.
    Covariant,
    /// Substitution reverses the subtype relation.
    Contravariant,
}

/// Declared constraints of a type variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableConstraints {
    /// No declared constraint.
    Unconstrained,
    /// An upper bound.
    Bound(Box<Type>),
    /// An explicit set of admissible types.
    Explicit(Vec<Type>),
}

/// A type variable.
///
/// The `free` flag distinguishes variables the solver may still bind from
/// variables temporarily marked opaque during signature simulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    /// The declared name.
    pub name: String,
    /// The declared constraints.
    pub constraints: VariableConstraints,
    /// The declared variance.
    pub variance: Variance,
    /// Whether the solver may still bind this variable.
    pub free: bool,
}

impl Variable {
    /// Creates an unconstrained invariant variable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: VariableConstraints::Unconstrained,
            variance: Variance::Invariant,
            free: true,
        }
    }

    /// Creates a variable with an upper bound.
    pub fn bounded(name: impl Into<String>, bound: Type) -> Self {
        Self {
            constraints: VariableConstraints::Bound(Box::new(bound)),
            ..Self::new(name)
        }
    }

    /// Creates a variable with an explicit constraint set.
    pub fn explicit(name: impl Into<String>, constraints: Vec<Type>) -> Self {
        Self {
            constraints: VariableConstraints::Explicit(constraints),
            ..Self::new(name)
        }
    }

    /// Sets the declared variance.
    pub fn with_variance(mut self, variance: Variance) -> Self {
        self.variance = variance;
        self
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let variable = Variable::new("_T");
        assert_eq!(variable.constraints, VariableConstraints::Unconstrained);
        assert_eq!(variable.variance, Variance::Invariant);
        assert!(variable.free);

        let bounded = Variable::bounded("_T", Type::primitive("int"));
        assert!(matches!(bounded.constraints, VariableConstraints::Bound(_)));

        let covariant = Variable::new("_T").with_variance(Variance::Covariant);
        assert_eq!(covariant.variance, Variance::Covariant);
    }
}
