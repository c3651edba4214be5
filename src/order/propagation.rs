//! Parameter propagation along graph edges.
//!
//! An edge from `p` to `s` carries the parameters `p` substitutes for `s`'s
//! generic parameters, expressed in terms of `p`'s own generics. Walking
//! forward rewrites those expressions against concrete parameters; walking
//! backward pattern-matches concrete parameters back out of them.

use super::Order;
use super::handler::{Handler, Target, index_of};
use super::lattice::join_inner;
use crate::diagnostics::Result;
use crate::types::{Overload, Parameters, Tuple, Type, Variable, Variance};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet, VecDeque};

/// `type` and `typing.Callable` do not record their generic declaration in
/// the graph.
static META_VARIABLES: Lazy<Vec<Type>> = Lazy::new(|| {
    vec![Type::Variable(
        Variable::new("_T_meta").with_variance(Variance::Covariant),
    )]
});

const GENERIC: &str = "typing.Generic";

fn generic_index(handler: &dyn Handler) -> Option<usize> {
    handler.find_index(&Type::primitive(GENERIC))
}

/// Generic variables a vertex declares through its edge to the `Generic`
/// vertex, if any.
fn declared_variables(handler: &dyn Handler, index: usize) -> Option<Vec<Type>> {
    let generic = generic_index(handler)?;
    handler
        .find_edges(index)?
        .into_iter()
        .find(|target| target.target == generic)
        .map(|target| target.parameters)
}

/// Returns the declared type variables of an annotation's primitive.
pub fn variables(handler: &dyn Handler, annotation: &Type) -> Result<Option<Vec<Type>>> {
    let (primitive, _) = annotation.split();
    if matches!(primitive.primitive_name(), Some("type" | "typing.Callable")) {
        return Ok(Some(META_VARIABLES.clone()));
    }
    let index = index_of(handler, &primitive)?;
    Ok(declared_variables(handler, index))
}

/// Records, for every `Variable` occurring in the abstract shape `left`,
/// the concrete subterm found in the same position of `right`.
pub fn diff_variables(substitutions: &mut HashMap<Type, Type>, left: &Type, right: &Type) {
    match (left, right) {
        (Type::Variable(_), _) => {
            substitutions.insert(left.clone(), right.clone());
        }
        (
            Type::Parametric {
                name: left_name,
                parameters: left_parameters,
            },
            Type::Parametric {
                name: right_name,
                parameters: right_parameters,
            },
        ) if left_name == right_name => {
            diff_variables_list(substitutions, left_parameters, right_parameters);
        }
        (Type::Optional(left_inner), Type::Optional(right_inner))
        | (Type::Meta(left_inner), Type::Meta(right_inner)) => {
            diff_variables(substitutions, left_inner, right_inner);
        }
        (Type::Union(left_elements), Type::Union(right_elements)) => {
            diff_variables_list(substitutions, left_elements, right_elements);
        }
        (Type::Tuple(Tuple::Bounded(left_elements)), Type::Tuple(Tuple::Bounded(right_elements))) => {
            diff_variables_list(substitutions, left_elements, right_elements);
        }
        (Type::Tuple(Tuple::Unbounded(left_element)), Type::Tuple(Tuple::Unbounded(right_element))) => {
            diff_variables(substitutions, left_element, right_element);
        }
        (Type::Callable(left_callable), Type::Callable(right_callable)) => {
            diff_overload(
                substitutions,
                &left_callable.implementation,
                &right_callable.implementation,
            );
            for (left_overload, right_overload) in left_callable
                .overloads
                .iter()
                .zip(right_callable.overloads.iter())
            {
                diff_overload(substitutions, left_overload, right_overload);
            }
        }
        _ => {}
    }
}

fn diff_overload(substitutions: &mut HashMap<Type, Type>, left: &Overload, right: &Overload) {
    diff_variables(substitutions, &left.annotation, &right.annotation);
    if let (Parameters::Defined(left_parameters), Parameters::Defined(right_parameters)) =
        (&left.parameters, &right.parameters)
    {
        for (left_parameter, right_parameter) in
            left_parameters.iter().zip(right_parameters.iter())
        {
            diff_variables(
                substitutions,
                left_parameter.annotation(),
                right_parameter.annotation(),
            );
        }
    }
}

/// Zips two lists through [`diff_variables`], tolerating length mismatch.
pub fn diff_variables_list(
    substitutions: &mut HashMap<Type, Type>,
    left: &[Type],
    right: &[Type],
) {
    for (left_element, right_element) in left.iter().zip(right.iter()) {
        diff_variables(substitutions, left_element, right_element);
    }
}

/// Instantiates a vertex's outgoing edges by substituting its generic
/// variables with the concrete `parameters` it is currently viewed at.
///
/// On arity mismatch between declaration and view, every generic becomes
/// `Any`.
pub fn get_instantiated_successors(
    handler: &dyn Handler,
    index: usize,
    parameters: &[Type],
) -> Vec<Target> {
    let edges = handler.find_edges(index).unwrap_or_default();
    let variables = declared_variables(handler, index).unwrap_or_default();
    let parameters = if variables.len() == parameters.len() {
        parameters.to_vec()
    } else {
        vec![Type::Any; variables.len()]
    };
    let substitutions: HashMap<Type, Type> =
        variables.into_iter().zip(parameters).collect();
    edges
        .into_iter()
        .map(|Target { target, parameters }| {
            let parameters = parameters
                .iter()
                .map(|parameter| {
                    parameter.instantiate(&|candidate| substitutions.get(candidate).cloned())
                })
                .collect();
            Target::new(target, parameters)
        })
        .collect()
}

/// Instantiates a vertex's incoming edges by pattern-matching the concrete
/// `parameters` against each edge's abstract shape; generics a predecessor
/// does not propagate fall back to `Bottom`.
pub fn get_instantiated_predecessors(
    handler: &dyn Handler,
    index: usize,
    parameters: &[Type],
) -> Vec<Target> {
    let backedges = handler.find_backedges(index).unwrap_or_default();
    backedges
        .into_iter()
        .map(|Target { target, parameters: edge_parameters }| {
            let mut substitutions = HashMap::new();
            diff_variables_list(&mut substitutions, &edge_parameters, parameters);
            let propagated = declared_variables(handler, target)
                .unwrap_or_default()
                .iter()
                .map(|variable| {
                    substitutions
                        .get(variable)
                        .cloned()
                        .unwrap_or(Type::Bottom)
                })
                .collect();
            Target::new(target, propagated)
        })
        .collect()
}

/// Collapses a tuple into the single parameter `tuple` is generic over.
fn collapse_tuple(order: &Order<'_>, tuple: &Tuple) -> Result<Type> {
    let parameter = match tuple {
        Tuple::Bounded(elements) => {
            let mut joined = Type::Bottom;
            for element in elements {
                joined = join_inner(order, &joined, element)?;
            }
            joined
        }
        Tuple::Unbounded(element) => (**element).clone(),
    };
    Ok(parameter.weaken_literals())
}

/// Views `source`'s concrete parameters from the ancestor `target`.
///
/// Walks forward edges breadth-first from `source`'s primitive, rewriting
/// parameters at each step; returns the parameters at `target`, or `None`
/// when `target` is not an ancestor. Callables short-circuit: reaching a
/// callable vertex while aiming at `typing.Callable` yields the parameters
/// as they stand.
pub fn instantiate_successors_parameters(
    order: &Order<'_>,
    source: &Type,
    target: &Type,
) -> Result<Option<Vec<Type>>> {
    let handler = order.handler;
    let target_index = index_of(handler, target)?;
    let (primitive, parameters) = match source {
        Type::Tuple(tuple) => (
            Type::primitive("tuple"),
            vec![collapse_tuple(order, tuple)?],
        ),
        _ => source.split(),
    };
    let source_index = index_of(handler, &primitive)?;

    let mut worklist = VecDeque::from([Target::new(source_index, parameters)]);
    let mut visited = HashSet::new();
    while let Some(Target { target: index, parameters }) = worklist.pop_front() {
        if !visited.insert(index) {
            continue;
        }
        if index == target_index {
            return Ok(Some(parameters));
        }
        if *target == Type::primitive("typing.Callable")
            && matches!(handler.find_annotation(index), Some(Type::Callable(_)))
        {
            return Ok(Some(parameters));
        }
        worklist.extend(get_instantiated_successors(handler, index, &parameters));
    }
    Ok(None)
}

/// Views `source`'s concrete parameters from the descendant `target`; the
/// dual of [`instantiate_successors_parameters`].
pub fn instantiate_predecessors_parameters(
    order: &Order<'_>,
    source: &Type,
    target: &Type,
) -> Result<Option<Vec<Type>>> {
    let handler = order.handler;
    let target_index = index_of(handler, target)?;
    let (primitive, parameters) = source.split();
    let source_index = index_of(handler, &primitive)?;

    let mut worklist = VecDeque::from([Target::new(source_index, parameters)]);
    let mut visited = HashSet::new();
    while let Some(Target { target: index, parameters }) = worklist.pop_front() {
        if !visited.insert(index) {
            continue;
        }
        if index == target_index {
            return Ok(Some(parameters));
        }
        worklist.extend(get_instantiated_predecessors(handler, index, &parameters));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::store::{TypeOrder, connect, insert};

    fn generic_order() -> TypeOrder {
        let mut order = TypeOrder::new();
        for name in ["typing.Generic", "list", "typing.Sequence", "object"] {
            insert(&mut order, Type::primitive(name));
        }
        let variable = Type::variable("_T");
        connect(
            &mut order,
            &Type::primitive("list"),
            &Type::primitive("typing.Generic"),
            vec![variable.clone()],
        );
        connect(
            &mut order,
            &Type::primitive("list"),
            &Type::primitive("typing.Sequence"),
            vec![variable.clone()],
        );
        connect(
            &mut order,
            &Type::primitive("typing.Sequence"),
            &Type::primitive("typing.Generic"),
            vec![variable],
        );
        connect(
            &mut order,
            &Type::primitive("typing.Sequence"),
            &Type::primitive("object"),
            vec![],
        );
        order
    }

    #[test]
    fn test_variables() {
        let order = generic_order();
        assert_eq!(
            variables(&order, &Type::primitive("list")).unwrap(),
            Some(vec![Type::variable("_T")])
        );
        assert_eq!(variables(&order, &Type::primitive("object")).unwrap(), None);
        assert!(variables(&order, &Type::primitive("missing")).is_err());
    }

    #[test]
    fn test_variables_hardcodes_meta() {
        let order = TypeOrder::new();
        let meta_variables = variables(&order, &Type::primitive("type")).unwrap().unwrap();
        assert_eq!(meta_variables.len(), 1);
        assert!(matches!(
            &meta_variables[0],
            Type::Variable(variable) if variable.variance == Variance::Covariant
        ));
    }

    #[test]
    fn test_diff_variables() {
        let mut substitutions = HashMap::new();
        diff_variables(
            &mut substitutions,
            &Type::parametric("dict", vec![Type::variable("_K"), Type::variable("_V")]),
            &Type::parametric(
                "dict",
                vec![Type::primitive("str"), Type::primitive("int")],
            ),
        );
        assert_eq!(
            substitutions.get(&Type::variable("_K")),
            Some(&Type::primitive("str"))
        );
        assert_eq!(
            substitutions.get(&Type::variable("_V")),
            Some(&Type::primitive("int"))
        );
    }

    #[test]
    fn test_instantiate_successors_parameters() {
        let order = generic_order();
        let order = Order::without_callbacks(&order);
        let parameters = instantiate_successors_parameters(
            &order,
            &Type::parametric("list", vec![Type::primitive("int")]),
            &Type::primitive("typing.Sequence"),
        )
        .unwrap();
        assert_eq!(parameters, Some(vec![Type::primitive("int")]));
    }

    #[test]
    fn test_instantiate_successors_parameters_unreachable() {
        let mut handler = generic_order();
        insert(&mut handler, Type::primitive("str"));
        let order = Order::without_callbacks(&handler);
        let parameters = instantiate_successors_parameters(
            &order,
            &Type::parametric("list", vec![Type::primitive("int")]),
            &Type::primitive("str"),
        )
        .unwrap();
        assert_eq!(parameters, None);
    }

    #[test]
    fn test_instantiate_predecessors_parameters() {
        let handler = generic_order();
        let order = Order::without_callbacks(&handler);
        let parameters = instantiate_predecessors_parameters(
            &order,
            &Type::parametric("typing.Sequence", vec![Type::primitive("int")]),
            &Type::primitive("list"),
        )
        .unwrap();
        assert_eq!(parameters, Some(vec![Type::primitive("int")]));
    }

    #[test]
    fn test_predecessor_fallback_is_bottom() {
        let mut handler = generic_order();
        // A sequence subclass that fixes no parameters on its edge.
        insert(&mut handler, Type::primitive("a.Fixed"));
        connect(
            &mut handler,
            &Type::primitive("a.Fixed"),
            &Type::primitive("typing.Generic"),
            vec![Type::variable("_U")],
        );
        connect(
            &mut handler,
            &Type::primitive("a.Fixed"),
            &Type::primitive("typing.Sequence"),
            vec![],
        );
        let order = Order::without_callbacks(&handler);
        let parameters = instantiate_predecessors_parameters(
            &order,
            &Type::parametric("typing.Sequence", vec![Type::primitive("int")]),
            &Type::primitive("a.Fixed"),
        )
        .unwrap();
        assert_eq!(parameters, Some(vec![Type::Bottom]));
    }
}
