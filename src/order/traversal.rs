//! Breadth-first folds over the graph with parameter propagation.

use super::handler::{Handler, Target, index_of};
use super::propagation::{get_instantiated_predecessors, get_instantiated_successors};
use crate::diagnostics::Result;
use std::collections::{HashSet, VecDeque};
use crate::types::Type;

/// Which adjacency a fold walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Forward edges, toward supertypes.
    Successors,
    /// Backward edges, toward subtypes.
    Predecessors,
}

/// Folds `visit` over every vertex reachable from `start` (exclusive),
/// breadth-first, propagating parameters along each step. `visit` returns
/// whether the walk should continue past the visited vertex.
pub fn breadth_first_fold<A>(
    handler: &dyn Handler,
    direction: Direction,
    start: Target,
    initial: A,
    mut visit: impl FnMut(&mut A, &Type, &[Type]) -> bool,
) -> A {
    let mut accumulator = initial;
    let mut visited = HashSet::from([start.target]);
    let mut worklist = VecDeque::from([start]);
    while let Some(Target { target: index, parameters }) = worklist.pop_front() {
        let neighbors = match direction {
            Direction::Successors => get_instantiated_successors(handler, index, &parameters),
            Direction::Predecessors => {
                get_instantiated_predecessors(handler, index, &parameters)
            }
        };
        for neighbor in neighbors {
            if !visited.insert(neighbor.target) {
                continue;
            }
            let Some(annotation) = handler.find_annotation(neighbor.target) else {
                continue;
            };
            if visit(&mut accumulator, &annotation, &neighbor.parameters) {
                worklist.push_back(neighbor);
            }
        }
    }
    accumulator
}

/// Rebuilds a vertex annotation at the parameters it was reached with.
fn instantiated(annotation: &Type, parameters: &[Type]) -> Type {
    match annotation {
        Type::Primitive(name) if !parameters.is_empty() => {
            Type::parametric(name.clone(), parameters.to_vec())
        }
        _ => annotation.clone(),
    }
}

/// All transitive predecessors of an annotation, instantiated with the
/// parameters propagated down to them.
pub fn predecessors(handler: &dyn Handler, annotation: &Type) -> Result<Vec<Type>> {
    let (primitive, parameters) = annotation.split();
    let index = index_of(handler, &primitive)?;
    Ok(breadth_first_fold(
        handler,
        Direction::Predecessors,
        Target::new(index, parameters),
        Vec::new(),
        |accumulator, annotation, parameters| {
            accumulator.push(instantiated(annotation, parameters));
            true
        },
    ))
}

/// The maximal tracked annotations satisfying `matches`: walking back from
/// `Top`, matching vertices are collected and not descended past.
pub fn greatest(handler: &dyn Handler, matches: impl Fn(&Type) -> bool) -> Vec<Type> {
    let Some(top_index) = handler.find_index(&Type::Top) else {
        return Vec::new();
    };
    if matches(&Type::Top) {
        return vec![Type::Top];
    }
    breadth_first_fold(
        handler,
        Direction::Predecessors,
        Target::new(top_index, Vec::new()),
        Vec::new(),
        |accumulator, annotation, parameters| {
            let annotation = instantiated(annotation, parameters);
            if matches(&annotation) {
                accumulator.push(annotation);
                false
            } else {
                true
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::store::{TypeOrder, connect, insert};

    fn tower() -> TypeOrder {
        let mut order = TypeOrder::new();
        for annotation in [
            Type::Bottom,
            Type::primitive("int"),
            Type::primitive("float"),
            Type::primitive("object"),
            Type::Top,
        ] {
            insert(&mut order, annotation);
        }
        connect(&mut order, &Type::Bottom, &Type::primitive("int"), vec![]);
        connect(
            &mut order,
            &Type::primitive("int"),
            &Type::primitive("float"),
            vec![],
        );
        connect(
            &mut order,
            &Type::primitive("float"),
            &Type::primitive("object"),
            vec![],
        );
        connect(&mut order, &Type::primitive("object"), &Type::Top, vec![]);
        order
    }

    #[test]
    fn test_predecessors() {
        let order = tower();
        let result = predecessors(&order, &Type::primitive("float")).unwrap();
        assert_eq!(result, vec![Type::primitive("int"), Type::Bottom]);
    }

    #[test]
    fn test_greatest() {
        let order = tower();
        let result = greatest(&order, |annotation| {
            matches!(annotation.primitive_name(), Some("int" | "float"))
        });
        assert_eq!(result, vec![Type::primitive("float")]);
    }
}
