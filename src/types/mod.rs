//! Type term model for the order engine.
//!
//! Types are immutable values compared structurally. The engine works over:
//! - sentinel scalars with fixed lattice positions (`Bottom`, `Top`, `Any`,
//!   `Undeclared`)
//! - nominal classes (`Primitive`) and their applications (`Parametric`)
//! - type variables with bounds, explicit constraint sets, and variance
//! - optionals, unions, and tuples
//! - callables with overloads, typed dictionaries, literals, and `type[T]`
//!   meta-types

#![allow(missing_docs)]

use std::fmt;

pub mod callable;
pub mod literal;
pub mod typed_dictionary;
pub mod variable;

pub use callable::*;
pub use literal::*;
pub use typed_dictionary::*;
pub use variable::*;

/// A type term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    /// The uninhabited type; subtype of everything.
    Bottom,
    /// The unknown type; supertype of everything.
    Top,
    /// The gradual type: compatible in both directions.
    Any,
    /// Placeholder for names used before declaration.
    Undeclared,
    /// A nominal class identified by its canonical dotted name.
    Primitive(String),
    /// A primitive applied to a fixed-length parameter list.
    Parametric { name: String, parameters: Vec<Type> },
    /// A type variable.
    Variable(Variable),
    /// `T` or `None`.
    Optional(Box<Type>),
    /// A set-like alternative of types; flattened and sorted on construction.
    Union(Vec<Type>),
    /// A fixed-length or homogeneous variable-length tuple.
    Tuple(Tuple),
    /// A callable with an implementation and optional overloads.
    Callable(Box<Callable>),
    /// A structural dictionary with named, typed fields.
    TypedDictionary(TypedDictionary),
    /// A literal value together with its carrier primitive.
    Literal(LiteralValue),
    /// The type object of a type.
    Meta(Box<Type>),
}

/// Tuple forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tuple {
    /// A fixed-length tuple with one annotation per element.
    Bounded(Vec<Type>),
    /// An arbitrary-length tuple with a single element annotation.
    Unbounded(Box<Type>),
}

impl Type {
    /// Creates a primitive from a canonical name.
    pub fn primitive(name: impl Into<String>) -> Self {
        Type::Primitive(name.into())
    }

    /// Creates a parametric type.
    pub fn parametric(name: impl Into<String>, parameters: Vec<Type>) -> Self {
        Type::Parametric {
            name: name.into(),
            parameters,
        }
    }

    /// Creates an unconstrained invariant type variable.
    pub fn variable(name: impl Into<String>) -> Self {
        Type::Variable(Variable::new(name))
    }

    /// Creates an optional type.
    pub fn optional(inner: Type) -> Self {
        Type::Optional(Box::new(inner))
    }

    /// Creates a bounded tuple.
    pub fn tuple(elements: Vec<Type>) -> Self {
        Type::Tuple(Tuple::Bounded(elements))
    }

    /// Creates an unbounded tuple.
    pub fn unbounded_tuple(element: Type) -> Self {
        Type::Tuple(Tuple::Unbounded(Box::new(element)))
    }

    /// Creates a meta-type.
    pub fn meta(inner: Type) -> Self {
        Type::Meta(Box::new(inner))
    }

    /// Creates a callable type.
    pub fn callable(callable: Callable) -> Self {
        Type::Callable(Box::new(callable))
    }

    /// Creates an integer literal type.
    pub fn integer_literal(value: i64) -> Self {
        Type::Literal(LiteralValue::Integer(value))
    }

    /// Creates a string literal type.
    pub fn string_literal(value: impl Into<String>) -> Self {
        Type::Literal(LiteralValue::String(value.into()))
    }

    /// Creates a boolean literal type.
    pub fn boolean_literal(value: bool) -> Self {
        Type::Literal(LiteralValue::Boolean(value))
    }

    /// Creates a union, flattening nested unions, lifting optionals outward,
    /// dropping `Bottom` branches, sorting and deduplicating, and collapsing
    /// singletons.
    ///
    /// `union(vec![])` is `Bottom`.
    pub fn union(elements: Vec<Type>) -> Self {
        let mut flattened = Vec::new();
        let mut optional = false;
        fn flatten(element: Type, flattened: &mut Vec<Type>, optional: &mut bool) {
            match element {
                Type::Union(inner) => {
                    for element in inner {
                        flatten(element, flattened, optional);
                    }
                }
                Type::Optional(inner) => {
                    *optional = true;
                    flatten(*inner, flattened, optional);
                }
                Type::Bottom => {}
                other => flattened.push(other),
            }
        }
        for element in elements {
            flatten(element, &mut flattened, &mut optional);
        }
        flattened.sort();
        flattened.dedup();
        let body = match flattened.len() {
            0 => Type::Bottom,
            1 => flattened.remove(0),
            _ => Type::Union(flattened),
        };
        if optional { Type::optional(body) } else { body }
    }

    /// Splits a term into its nominal primitive and its parameters.
    pub fn split(&self) -> (Type, Vec<Type>) {
        match self {
            Type::Parametric { name, parameters } => {
                (Type::primitive(name.clone()), parameters.clone())
            }
            Type::Meta(inner) => (Type::primitive("type"), vec![(**inner).clone()]),
            Type::Tuple(Tuple::Bounded(elements)) => {
                (Type::primitive("tuple"), elements.clone())
            }
            Type::Tuple(Tuple::Unbounded(element)) => {
                (Type::primitive("tuple"), vec![(**element).clone()])
            }
            Type::Callable(_) => (Type::primitive("typing.Callable"), vec![]),
            Type::Optional(inner) => {
                (Type::primitive("typing.Optional"), vec![(**inner).clone()])
            }
            Type::Union(elements) => (Type::primitive("typing.Union"), elements.clone()),
            Type::TypedDictionary(dictionary) => (dictionary.primitive_form(), vec![]),
            Type::Literal(value) => (value.carrier(), vec![]),
            _ => (self.clone(), vec![]),
        }
    }

    /// Returns the canonical name of this term's primitive, if it has one.
    pub fn primitive_name(&self) -> Option<&str> {
        match self {
            Type::Primitive(name) | Type::Parametric { name, .. } => Some(name),
            Type::Meta(_) => Some("type"),
            _ => None,
        }
    }

    /// Returns true if this term is a meta-type.
    pub fn is_meta(&self) -> bool {
        matches!(self, Type::Meta(_))
    }

    /// Returns the single parameter of a meta-type.
    pub fn single_parameter(&self) -> Option<&Type> {
        match self {
            Type::Meta(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Type::Union(_))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Type::Optional(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Type::Callable(_))
    }

    /// Returns true if some subterm satisfies the predicate.
    pub fn exists(&self, predicate: &dyn Fn(&Type) -> bool) -> bool {
        if predicate(self) {
            return true;
        }
        match self {
            Type::Parametric { parameters, .. } => {
                parameters.iter().any(|parameter| parameter.exists(predicate))
            }
            Type::Variable(variable) => match &variable.constraints {
                VariableConstraints::Bound(bound) => bound.exists(predicate),
                VariableConstraints::Explicit(constraints) => {
                    constraints.iter().any(|constraint| constraint.exists(predicate))
                }
                VariableConstraints::Unconstrained => false,
            },
            Type::Optional(inner) | Type::Meta(inner) => inner.exists(predicate),
            Type::Union(elements) => elements.iter().any(|element| element.exists(predicate)),
            Type::Tuple(Tuple::Bounded(elements)) => {
                elements.iter().any(|element| element.exists(predicate))
            }
            Type::Tuple(Tuple::Unbounded(element)) => element.exists(predicate),
            Type::Callable(callable) => callable
                .overloads_and_implementation()
                .any(|overload| overload.exists(predicate)),
            Type::TypedDictionary(dictionary) => dictionary
                .fields
                .iter()
                .any(|field| field.annotation.exists(predicate)),
            _ => false,
        }
    }

    /// Returns true if the term mentions `Undeclared`.
    pub fn contains_undeclared(&self) -> bool {
        self.exists(&|annotation| *annotation == Type::Undeclared)
    }

    /// Collects the free type variables of this term, in first-occurrence
    /// order.
    pub fn free_variables(&self) -> Vec<Variable> {
        let mut variables = Vec::new();
        self.collect_free_variables(&mut variables);
        variables
    }

    fn collect_free_variables(&self, variables: &mut Vec<Variable>) {
        match self {
            Type::Variable(variable) => {
                if variable.free && !variables.contains(variable) {
                    variables.push(variable.clone());
                }
            }
            Type::Parametric { parameters, .. } => {
                for parameter in parameters {
                    parameter.collect_free_variables(variables);
                }
            }
            Type::Optional(inner) | Type::Meta(inner) => {
                inner.collect_free_variables(variables);
            }
            Type::Union(elements) => {
                for element in elements {
                    element.collect_free_variables(variables);
                }
            }
            Type::Tuple(Tuple::Bounded(elements)) => {
                for element in elements {
                    element.collect_free_variables(variables);
                }
            }
            Type::Tuple(Tuple::Unbounded(element)) => {
                element.collect_free_variables(variables);
            }
            Type::Callable(callable) => {
                for overload in callable.overloads_and_implementation() {
                    overload.annotation.collect_free_variables(variables);
                    if let Parameters::Defined(parameters) = &overload.parameters {
                        for parameter in parameters {
                            parameter.annotation().collect_free_variables(variables);
                        }
                    }
                }
            }
            Type::TypedDictionary(dictionary) => {
                for field in &dictionary.fields {
                    field.annotation.collect_free_variables(variables);
                }
            }
            _ => {}
        }
    }

    /// Returns true if the term has no free type variables.
    pub fn is_resolved(&self) -> bool {
        self.free_variables().is_empty()
    }

    /// Rebuilds the term, replacing every subterm for which `constraints`
    /// produces a value.
    pub fn instantiate(&self, constraints: &dyn Fn(&Type) -> Option<Type>) -> Type {
        if let Some(replacement) = constraints(self) {
            return replacement;
        }
        match self {
            Type::Parametric { name, parameters } => Type::Parametric {
                name: name.clone(),
                parameters: parameters
                    .iter()
                    .map(|parameter| parameter.instantiate(constraints))
                    .collect(),
            },
            Type::Optional(inner) => Type::optional(inner.instantiate(constraints)),
            Type::Union(elements) => Type::union(
                elements
                    .iter()
                    .map(|element| element.instantiate(constraints))
                    .collect(),
            ),
            Type::Tuple(Tuple::Bounded(elements)) => Type::tuple(
                elements
                    .iter()
                    .map(|element| element.instantiate(constraints))
                    .collect(),
            ),
            Type::Tuple(Tuple::Unbounded(element)) => {
                Type::unbounded_tuple(element.instantiate(constraints))
            }
            Type::Callable(callable) => Type::callable(
                callable.map_annotations(&|annotation| annotation.instantiate(constraints)),
            ),
            Type::TypedDictionary(dictionary) => {
                Type::TypedDictionary(TypedDictionary {
                    fields: dictionary
                        .fields
                        .iter()
                        .map(|field| Field {
                            name: field.name.clone(),
                            annotation: field.annotation.instantiate(constraints),
                        })
                        .collect(),
                    total: dictionary.total,
                })
            }
            Type::Meta(inner) => Type::meta(inner.instantiate(constraints)),
            _ => self.clone(),
        }
    }

    /// Replaces literals with their carrier primitives, recursively.
    pub fn weaken_literals(&self) -> Type {
        self.instantiate(&|annotation| match annotation {
            Type::Literal(value) => Some(value.carrier()),
            _ => None,
        })
    }

    /// Marks every free variable as bound, making it opaque to the
    /// constraint solver.
    pub fn mark_free_variables_as_bound(&self) -> Type {
        self.instantiate(&|annotation| match annotation {
            Type::Variable(variable) if variable.free => {
                let mut marked = variable.clone();
                marked.free = false;
                Some(Type::Variable(marked))
            }
            _ => None,
        })
    }

    /// Undoes [`Type::mark_free_variables_as_bound`].
    pub fn free_simulated_bound_variables(&self) -> Type {
        self.instantiate(&|annotation| match annotation {
            Type::Variable(variable) if !variable.free => {
                let mut freed = variable.clone();
                freed.free = true;
                Some(Type::Variable(freed))
            }
            _ => None,
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bottom => write!(f, "$bottom"),
            Type::Top => write!(f, "$unknown"),
            Type::Any => write!(f, "typing.Any"),
            Type::Undeclared => write!(f, "$undeclared"),
            Type::Primitive(name) => write!(f, "{name}"),
            Type::Parametric { name, parameters } => {
                write!(f, "{name}[")?;
                for (position, parameter) in parameters.iter().enumerate() {
                    if position > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{parameter}")?;
                }
                write!(f, "]")
            }
            Type::Variable(variable) => write!(f, "{variable}"),
            Type::Optional(inner) => write!(f, "typing.Optional[{inner}]"),
            Type::Union(elements) => {
                write!(f, "typing.Union[")?;
                for (position, element) in elements.iter().enumerate() {
                    if position > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Type::Tuple(Tuple::Bounded(elements)) => {
                write!(f, "typing.Tuple[")?;
                for (position, element) in elements.iter().enumerate() {
                    if position > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Type::Tuple(Tuple::Unbounded(element)) => {
                write!(f, "typing.Tuple[{element}, ...]")
            }
            Type::Callable(callable) => write!(f, "{callable}"),
            Type::TypedDictionary(dictionary) => write!(f, "{dictionary}"),
            Type::Literal(value) => write!(f, "{value}"),
            Type::Meta(inner) => write!(f, "type[{inner}]"),
        }
    }
}
