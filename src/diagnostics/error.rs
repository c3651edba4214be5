//! Failure signals raised by order queries.

use crate::types::Type;
use std::fmt;

/// Error kinds surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A lookup hit a primitive that was never inserted into the graph.
    Untracked {
        annotation: Type,
    },

    /// The integrity check found a cycle in the subclass graph.
    Cyclic,

    /// The integrity check found a missing key, annotation, adjacency list,
    /// or mirror edge.
    Incomplete {
        message: String,
    },

    /// The C3 merge could not select a valid head.
    InconsistentMethodResolutionOrder {
        annotation: Type,
    },
}

impl Error {
    /// Creates an untracked-annotation error.
    pub fn untracked(annotation: Type) -> Self {
        Self::Untracked { annotation }
    }

    /// Creates a cyclic-graph error.
    pub fn cyclic() -> Self {
        Self::Cyclic
    }

    /// Creates an incomplete-graph error.
    pub fn incomplete(message: impl Into<String>) -> Self {
        Self::Incomplete {
            message: message.into(),
        }
    }

    /// Creates a linearization-failure error.
    pub fn inconsistent_method_resolution_order(annotation: Type) -> Self {
        Self::InconsistentMethodResolutionOrder { annotation }
    }

    /// Returns true if this error is an untracked-annotation signal.
    ///
    /// The lattice and solver entry points use this to decide whether a
    /// failure may be degraded instead of propagated.
    pub fn is_untracked(&self) -> bool {
        matches!(self, Self::Untracked { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untracked { annotation } => {
                write!(f, "untracked annotation: {annotation}")
            }
            Self::Cyclic => write!(f, "type graph contains a cycle"),
            Self::Incomplete { message } => {
                write!(f, "type graph is incomplete: {message}")
            }
            Self::InconsistentMethodResolutionOrder { annotation } => {
                write!(f, "inconsistent method resolution order for {annotation}")
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_untracked() {
        assert!(Error::untracked(Type::primitive("missing")).is_untracked());
        assert!(!Error::cyclic().is_untracked());
        assert!(!Error::incomplete("no backedge").is_untracked());
    }

    #[test]
    fn test_display() {
        let error = Error::untracked(Type::primitive("a.B"));
        assert_eq!(error.to_string(), "untracked annotation: a.B");
    }
}
