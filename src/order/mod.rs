//! The type graph and the order queries over it.
//!
//! Mutation (insert, connect, hygiene passes) happens while the host loads
//! class information; queries (subtype, join/meet, MRO, constraint solving)
//! are pure reads. The typical lifecycle is build, freeze, query.

pub mod builder;
pub mod dot;
pub mod handler;
pub mod hygiene;
pub mod lattice;
pub mod linearization;
pub mod propagation;
pub mod signature;
pub mod solver;
pub mod store;
pub mod subtype;
pub mod traversal;

pub use builder::*;
pub use dot::*;
pub use handler::*;
pub use hygiene::*;
pub use lattice::*;
pub use linearization::*;
pub use propagation::*;
pub use signature::*;
pub use solver::*;
pub use store::*;
pub use subtype::*;
pub use traversal::*;

use crate::types::Type;

/// Result of asking the host whether a candidate structurally implements a
/// protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplementsResult {
    /// The candidate does not implement the protocol.
    DoesNotImplement,
    /// The candidate implements the protocol at the given parameters.
    Implements {
        /// The protocol parameters witnessed by the candidate.
        parameters: Vec<Type>,
    },
}

/// Maps a metaclass type to its instance type.
pub type ConstructorCallback<'a> = dyn Fn(&Type) -> Option<Type> + 'a;

/// Witnesses structural protocol membership: `(protocol, candidate)`.
pub type ImplementsCallback<'a> = dyn Fn(&Type, &Type) -> ImplementsResult + 'a;

/// A graph handle bundled with the two host callbacks.
///
/// The subtype check, lattice, signature simulation, and constraint solver
/// are mutually recursive; passing this record to each recursion point
/// keeps the dependency acyclic at module level.
pub struct Order<'a> {
    /// The graph being queried.
    pub handler: &'a dyn Handler,
    /// Maps a metaclass type to its instance type.
    pub constructor: &'a ConstructorCallback<'a>,
    /// Witnesses structural protocol membership.
    pub implements: &'a ImplementsCallback<'a>,
}

impl<'a> Order<'a> {
    /// Bundles a graph with host callbacks.
    pub fn new(
        handler: &'a dyn Handler,
        constructor: &'a ConstructorCallback<'a>,
        implements: &'a ImplementsCallback<'a>,
    ) -> Self {
        Self {
            handler,
            constructor,
            implements,
        }
    }

    /// Bundles a graph with callbacks that always answer negatively.
    ///
    /// Used by hygiene passes that run before the host has wired real
    /// callbacks, and convenient in tests.
    pub fn without_callbacks(handler: &'a dyn Handler) -> Self {
        static NULL_CONSTRUCTOR: fn(&Type) -> Option<Type> = null_constructor;
        static NULL_IMPLEMENTS: fn(&Type, &Type) -> ImplementsResult = null_implements;
        Self {
            handler,
            constructor: &NULL_CONSTRUCTOR,
            implements: &NULL_IMPLEMENTS,
        }
    }
}

impl Clone for Order<'_> {
    fn clone(&self) -> Self {
        *self
    }
}

impl Copy for Order<'_> {}

fn null_constructor(_: &Type) -> Option<Type> {
    None
}

fn null_implements(_: &Type, _: &Type) -> ImplementsResult {
    ImplementsResult::DoesNotImplement
}
