//! Callable types with overloads and typed parameter lists.

#![allow(missing_docs)]

use super::Type;
use std::fmt;

/// Identity of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallableKind {
    /// A callable tied to a qualified function name.
    Named(String),
    /// A bare callable annotation.
    Anonymous,
}

/// A single parameter of a callable signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    /// A positional-or-keyword parameter. Call sites pass anonymous
    /// positional arguments under `$`-prefixed names.
    Named {
        name: String,
        annotation: Type,
        default: bool,
    },
    /// A variadic positional parameter (`*args`).
    Variable { name: String, annotation: Type },
    /// A variadic keyword parameter (`**kwargs`).
    Keywords { name: String, annotation: Type },
}

impl Parameter {
    pub fn named(name: impl Into<String>, annotation: Type) -> Self {
        Parameter::Named {
            name: name.into(),
            annotation,
            default: false,
        }
    }

    pub fn named_with_default(name: impl Into<String>, annotation: Type) -> Self {
        Parameter::Named {
            name: name.into(),
            annotation,
            default: true,
        }
    }

    pub fn variable(name: impl Into<String>, annotation: Type) -> Self {
        Parameter::Variable {
            name: name.into(),
            annotation,
        }
    }

    pub fn keywords(name: impl Into<String>, annotation: Type) -> Self {
        Parameter::Keywords {
            name: name.into(),
            annotation,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Parameter::Named { name, .. }
            | Parameter::Variable { name, .. }
            | Parameter::Keywords { name, .. } => name,
        }
    }

    pub fn annotation(&self) -> &Type {
        match self {
            Parameter::Named { annotation, .. }
            | Parameter::Variable { annotation, .. }
            | Parameter::Keywords { annotation, .. } => annotation,
        }
    }

    /// Rebuilds this parameter with a transformed annotation.
    pub fn with_annotation(&self, annotation: Type) -> Self {
        match self {
            Parameter::Named { name, default, .. } => Parameter::Named {
                name: name.clone(),
                annotation,
                default: *default,
            },
            Parameter::Variable { name, .. } => Parameter::Variable {
                name: name.clone(),
                annotation,
            },
            Parameter::Keywords { name, .. } => Parameter::Keywords {
                name: name.clone(),
                annotation,
            },
        }
    }

    /// Returns true for the `$`-prefixed names call sites give anonymous
    /// positional arguments.
    pub fn is_anonymous(name: &str) -> bool {
        name.starts_with('$')
    }

    /// Parameter names match when equal or when either side is anonymous.
    pub fn names_compatible(left: &str, right: &str) -> bool {
        left == right || Self::is_anonymous(left) || Self::is_anonymous(right)
    }
}

/// The parameter list of an overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameters {
    /// A known parameter list.
    Defined(Vec<Parameter>),
    /// An unknown parameter list; matches anything.
    Undefined,
}

/// One signature of a callable: a return annotation and a parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Overload {
    pub annotation: Type,
    pub parameters: Parameters,
}

impl Overload {
    pub fn new(annotation: Type, parameters: Vec<Parameter>) -> Self {
        Self {
            annotation,
            parameters: Parameters::Defined(parameters),
        }
    }

    pub fn undefined(annotation: Type) -> Self {
        Self {
            annotation,
            parameters: Parameters::Undefined,
        }
    }

    /// Returns true if some type mentioned by this overload satisfies the
    /// predicate.
    pub fn exists(&self, predicate: &dyn Fn(&Type) -> bool) -> bool {
        if self.annotation.exists(predicate) {
            return true;
        }
        match &self.parameters {
            Parameters::Defined(parameters) => parameters
                .iter()
                .any(|parameter| parameter.annotation().exists(predicate)),
            Parameters::Undefined => false,
        }
    }

    /// Rebuilds this overload with every annotation transformed.
    pub fn map_annotations(&self, transform: &dyn Fn(&Type) -> Type) -> Self {
        let parameters = match &self.parameters {
            Parameters::Defined(parameters) => Parameters::Defined(
                parameters
                    .iter()
                    .map(|parameter| {
                        parameter.with_annotation(transform(parameter.annotation()))
                    })
                    .collect(),
            ),
            Parameters::Undefined => Parameters::Undefined,
        };
        Self {
            annotation: transform(&self.annotation),
            parameters,
        }
    }
}

/// A callable type: an implementation signature plus optional overloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Callable {
    pub kind: CallableKind,
    pub implementation: Overload,
    pub overloads: Vec<Overload>,
}

impl Callable {
    pub fn anonymous(implementation: Overload) -> Self {
        Self {
            kind: CallableKind::Anonymous,
            implementation,
            overloads: Vec::new(),
        }
    }

    pub fn named(name: impl Into<String>, implementation: Overload) -> Self {
        Self {
            kind: CallableKind::Named(name.into()),
            implementation,
            overloads: Vec::new(),
        }
    }

    pub fn with_overloads(mut self, overloads: Vec<Overload>) -> Self {
        self.overloads = overloads;
        self
    }

    /// Iterates the overloads followed by the implementation.
    pub fn overloads_and_implementation(&self) -> impl Iterator<Item = &Overload> {
        self.overloads
            .iter()
            .chain(std::iter::once(&self.implementation))
    }

    /// Rebuilds this callable with every annotation transformed.
    pub fn map_annotations(&self, transform: &dyn Fn(&Type) -> Type) -> Self {
        Self {
            kind: self.kind.clone(),
            implementation: self.implementation.map_annotations(transform),
            overloads: self
                .overloads
                .iter()
                .map(|overload| overload.map_annotations(transform))
                .collect(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Named {
                name,
                annotation,
                default,
            } => {
                write!(f, "{name}: {annotation}")?;
                if *default {
                    write!(f, " = ...")?;
                }
                Ok(())
            }
            Parameter::Variable { name, annotation } => write!(f, "*{name}: {annotation}"),
            Parameter::Keywords { name, annotation } => write!(f, "**{name}: {annotation}"),
        }
    }
}

impl fmt::Display for Overload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameters {
            Parameters::Defined(parameters) => {
                write!(f, "[")?;
                for (position, parameter) in parameters.iter().enumerate() {
                    if position > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{parameter}")?;
                }
                write!(f, "], {}", self.annotation)
            }
            Parameters::Undefined => write!(f, "..., {}", self.annotation),
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CallableKind::Named(name) => {
                write!(f, "typing.Callable({name})[{}]", self.implementation)
            }
            CallableKind::Anonymous => {
                write!(f, "typing.Callable[{}]", self.implementation)
            }
        }
    }
}
