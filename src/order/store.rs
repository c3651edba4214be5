//! In-memory graph store and the mutating edge operations.

use super::handler::{Handler, Target};
use crate::types::Type;
use indexmap::IndexMap;
use std::hash::{Hash, Hasher};

/// The in-memory type graph: four tables kept in lockstep.
///
/// `Clone` is a deep copy of all tables and is how independent engines are
/// produced for concurrent querying.
#[derive(Debug, Clone, Default)]
pub struct TypeOrder {
    indices: IndexMap<Type, usize>,
    annotations: IndexMap<usize, Type>,
    edges: IndexMap<usize, Vec<Target>>,
    backedges: IndexMap<usize, Vec<Target>>,
    keys: Vec<usize>,
}

impl TypeOrder {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Handler for TypeOrder {
    fn find_index(&self, annotation: &Type) -> Option<usize> {
        self.indices.get(annotation).copied()
    }

    fn find_annotation(&self, index: usize) -> Option<Type> {
        self.annotations.get(&index).cloned()
    }

    fn find_edges(&self, index: usize) -> Option<Vec<Target>> {
        self.edges.get(&index).cloned()
    }

    fn find_backedges(&self, index: usize) -> Option<Vec<Target>> {
        self.backedges.get(&index).cloned()
    }

    fn set_index(&mut self, annotation: Type, index: usize) {
        self.indices.insert(annotation, index);
    }

    fn set_annotation(&mut self, index: usize, annotation: Type) {
        self.annotations.insert(index, annotation);
    }

    fn set_edges(&mut self, index: usize, targets: Vec<Target>) {
        self.edges.insert(index, targets);
    }

    fn set_backedges(&mut self, index: usize, targets: Vec<Target>) {
        self.backedges.insert(index, targets);
    }

    fn add_key(&mut self, index: usize) {
        self.keys.push(index);
    }

    fn keys(&self) -> Vec<usize> {
        self.keys.clone()
    }

    fn length(&self) -> usize {
        self.keys.len()
    }
}

/// Vertex allocation hashes the term and probes linearly upward from the
/// hash. Existing entries are never rehashed, so indices stay stable across
/// later inserts. The keyless hasher keeps allocation reproducible between
/// runs.
fn probe_start(annotation: &Type) -> usize {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    annotation.hash(&mut hasher);
    (hasher.finish() & 0x3fff_ffff) as usize
}

/// Interns a term, allocating a fresh vertex with empty adjacency on both
/// sides. Idempotent.
pub fn insert(handler: &mut dyn Handler, annotation: Type) {
    if handler.contains(&annotation) {
        return;
    }
    let mut index = probe_start(&annotation);
    while handler.find_annotation(index).is_some() {
        index += 1;
    }
    handler.add_key(index);
    handler.set_index(annotation.clone(), index);
    handler.set_annotation(index, annotation);
    handler.set_edges(index, Vec::new());
    handler.set_backedges(index, Vec::new());
}

/// Records that `predecessor` derives from `successor`, with `parameters`
/// substituted for the successor's generic parameters.
///
/// Connecting an untracked endpoint is non-fatal: the request is dropped
/// and reported as telemetry, so hosts can feed partial class information.
/// Duplicate edges are tolerated until `deduplicate` or `normalize` runs.
pub fn connect(
    handler: &mut dyn Handler,
    predecessor: &Type,
    successor: &Type,
    parameters: Vec<Type>,
) {
    let (Some(predecessor_index), Some(successor_index)) = (
        handler.find_index(predecessor),
        handler.find_index(successor),
    ) else {
        log::warn!("invalid order operation: connect {predecessor} -> {successor}");
        return;
    };
    let mut forward = handler.find_edges(predecessor_index).unwrap_or_default();
    forward.push(Target::new(successor_index, parameters.clone()));
    handler.set_edges(predecessor_index, forward);
    let mut backward = handler.find_backedges(successor_index).unwrap_or_default();
    backward.push(Target::new(predecessor_index, parameters));
    handler.set_backedges(successor_index, backward);
}

/// Clears a vertex's forward adjacency and removes the mirrored backedges.
pub fn disconnect_successors(handler: &mut dyn Handler, annotation: &Type) {
    let Some(index) = handler.find_index(annotation) else {
        log::warn!("invalid order operation: disconnect successors of {annotation}");
        return;
    };
    let targets = handler.find_edges(index).unwrap_or_default();
    for target in &targets {
        let mut backward = handler.find_backedges(target.target).unwrap_or_default();
        backward.retain(|backedge| backedge.target != index);
        handler.set_backedges(target.target, backward);
    }
    handler.set_edges(index, Vec::new());
}

/// Returns true if the term contains no unconstrained free variable and
/// every primitive it mentions is tracked.
pub fn is_instantiated(handler: &dyn Handler, annotation: &Type) -> bool {
    use crate::types::{Variable, VariableConstraints};
    let invalid = |candidate: &Type| match candidate {
        Type::Variable(Variable {
            constraints: VariableConstraints::Unconstrained,
            free: true,
            ..
        }) => true,
        Type::Primitive(_) => !handler.contains(candidate),
        _ => false,
    };
    !annotation.exists(&invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut order = TypeOrder::new();
        insert(&mut order, Type::primitive("int"));
        let index = order.find_index(&Type::primitive("int")).unwrap();
        insert(&mut order, Type::primitive("int"));
        assert_eq!(order.find_index(&Type::primitive("int")), Some(index));
        assert_eq!(order.length(), 1);
    }

    #[test]
    fn test_insert_preserves_indices() {
        let mut order = TypeOrder::new();
        insert(&mut order, Type::primitive("int"));
        insert(&mut order, Type::primitive("str"));
        let int_index = order.find_index(&Type::primitive("int")).unwrap();
        let str_index = order.find_index(&Type::primitive("str")).unwrap();
        for name in ["float", "complex", "bytes", "bool"] {
            insert(&mut order, Type::primitive(name));
        }
        assert_eq!(order.find_index(&Type::primitive("int")), Some(int_index));
        assert_eq!(order.find_index(&Type::primitive("str")), Some(str_index));
    }

    #[test]
    fn test_connect_mirrors_backedges() {
        let mut order = TypeOrder::new();
        insert(&mut order, Type::primitive("int"));
        insert(&mut order, Type::primitive("float"));
        connect(
            &mut order,
            &Type::primitive("int"),
            &Type::primitive("float"),
            vec![],
        );
        let int_index = order.find_index(&Type::primitive("int")).unwrap();
        let float_index = order.find_index(&Type::primitive("float")).unwrap();
        assert_eq!(
            order.find_edges(int_index).unwrap(),
            vec![Target::new(float_index, vec![])]
        );
        assert_eq!(
            order.find_backedges(float_index).unwrap(),
            vec![Target::new(int_index, vec![])]
        );
    }

    #[test]
    fn test_connect_untracked_is_a_no_op() {
        let mut order = TypeOrder::new();
        insert(&mut order, Type::primitive("int"));
        connect(
            &mut order,
            &Type::primitive("int"),
            &Type::primitive("missing"),
            vec![],
        );
        let index = order.find_index(&Type::primitive("int")).unwrap();
        assert!(order.find_edges(index).unwrap().is_empty());
    }

    #[test]
    fn test_disconnect_successors() {
        let mut order = TypeOrder::new();
        for name in ["a", "b", "c"] {
            insert(&mut order, Type::primitive(name));
        }
        connect(&mut order, &Type::primitive("a"), &Type::primitive("b"), vec![]);
        connect(&mut order, &Type::primitive("a"), &Type::primitive("c"), vec![]);
        disconnect_successors(&mut order, &Type::primitive("a"));
        let a_index = order.find_index(&Type::primitive("a")).unwrap();
        let b_index = order.find_index(&Type::primitive("b")).unwrap();
        assert!(order.find_edges(a_index).unwrap().is_empty());
        assert!(order.find_backedges(b_index).unwrap().is_empty());
    }

    #[test]
    fn test_is_instantiated() {
        let mut order = TypeOrder::new();
        insert(&mut order, Type::primitive("int"));
        assert!(is_instantiated(&order, &Type::primitive("int")));
        assert!(!is_instantiated(&order, &Type::primitive("missing")));
        assert!(!is_instantiated(
            &order,
            &Type::parametric("int", vec![Type::variable("_T")])
        ));
    }
}
