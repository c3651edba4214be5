//! # Pyrite type-order engine
//!
//! Pyrite is the type-order core of a static checker for a dynamically
//! typed, gradually typed object-oriented language. It maintains a directed
//! graph of nominal types ordered by the subclass relation and answers the
//! queries the surrounding checker needs:
//!
//! - subtyping (`less_or_equal`), with structural cases for unions,
//!   optionals, tuples, callables with overloads, typed dictionaries,
//!   literals, protocols, and variance-aware generics
//! - the join and meet lattice, plus widening for fixed-point iteration
//! - C3-linearized method resolution orders
//! - viewing a type's parameters from an ancestor or descendant class
//! - solving constraint sets that bind type variables
//! - graph hygiene: normalization, deduplication, cycle detection, and
//!   integrity checking
//!
//! The engine is single-threaded; queries are pure reads, and hosts that
//! want concurrent querying give each thread its own copy via
//! [`order::Builder::copy`]. Host integration happens through the
//! [`order::Order`] record, which bundles a graph handle with the two
//! callbacks the engine consumes: a constructor mapping metaclass types to
//! instance types, and a structural-protocol witness.
//!
//! ## Example
//!
//! ```
//! use pyrite::order::{Builder, Order, join, less_or_equal};
//! use pyrite::types::Type;
//!
//! let handler = Builder::default();
//! let order = Order::without_callbacks(&handler);
//! assert!(less_or_equal(&order, &Type::primitive("int"), &Type::primitive("float")).unwrap());
//! assert_eq!(
//!     join(&order, &Type::primitive("int"), &Type::primitive("str")),
//!     Type::primitive("object")
//! );
//! ```

#![warn(missing_docs, rust_2018_idioms)]

/// Error handling and failure signals for order queries.
pub mod diagnostics;
/// The type graph, its builder, and the order queries.
pub mod order;
/// Algebraic type-term model and structural operations.
pub mod types;
