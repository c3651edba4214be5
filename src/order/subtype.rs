//! The subtype relation.

use super::Order;
use super::ImplementsResult;
use super::handler::index_of;
use super::lattice::join_inner;
use super::propagation::{instantiate_successors_parameters, variables};
use super::signature::simulate_signature_select;
use crate::diagnostics::Result;
use crate::types::{
    CallableKind, Tuple, Type, Variable, VariableConstraints, Variance,
};
use std::collections::{HashSet, VecDeque};

fn as_parametric(annotation: &Type) -> Option<(String, Vec<Type>)> {
    match annotation {
        Type::Parametric { name, parameters } => Some((name.clone(), parameters.clone())),
        Type::Meta(inner) => Some(("type".to_string(), vec![(**inner).clone()])),
        _ => None,
    }
}

/// Compares parameter lists position-wise against the declared variance of
/// the primitive's type variables. Undeclared positions compare invariantly.
pub(crate) fn compare_parameters_by_variance(
    order: &Order<'_>,
    primitive_name: &str,
    left_parameters: &[Type],
    right_parameters: &[Type],
) -> Result<bool> {
    if left_parameters.len() != right_parameters.len() {
        return Ok(false);
    }
    let declared = variables(order.handler, &Type::primitive(primitive_name))?
        .unwrap_or_default();
    for (position, (left, right)) in left_parameters
        .iter()
        .zip(right_parameters.iter())
        .enumerate()
    {
        let variance = match declared.get(position) {
            Some(Type::Variable(Variable { variance, .. })) => *variance,
            _ => Variance::Invariant,
        };
        let compatible = match variance {
            Variance::Covariant => less_or_equal(order, left, right)?,
            Variance::Contravariant => less_or_equal(order, right, left)?,
            Variance::Invariant => {
                *left == Type::Any
                    || *right == Type::Any
                    || (less_or_equal(order, left, right)?
                        && less_or_equal(order, right, left)?)
            }
        };
        if !compatible {
            return Ok(false);
        }
    }
    Ok(true)
}

fn join_tuple_elements(order: &Order<'_>, elements: &[Type]) -> Result<Type> {
    let mut joined = Type::Bottom;
    for element in elements {
        joined = join_inner(order, &joined, element)?;
    }
    Ok(joined)
}

/// Is `left` a subtype of `right`?
///
/// Raises `Untracked` when a lookup hits a primitive that was never
/// inserted; the lattice and solver entry points catch that and degrade.
pub fn less_or_equal(order: &Order<'_>, left: &Type, right: &Type) -> Result<bool> {
    // Equal terms.
    if left == right {
        return Ok(true);
    }

    // Top bounds everything that does not mention Undeclared.
    if *right == Type::Top {
        return Ok(!left.contains_undeclared());
    }
    if *left == Type::Top {
        return Ok(false);
    }

    // Any saturates from the right only.
    if *right == Type::Any {
        return Ok(true);
    }
    if *left == Type::Any {
        return Ok(false);
    }

    // Bottom is below everything.
    if *left == Type::Bottom {
        return Ok(true);
    }
    if *right == Type::Bottom {
        return Ok(false);
    }

    // object is the nominal roof.
    if matches!(right, Type::Primitive(name) if name == "object") {
        return Ok(true);
    }

    // Nothing is below a bare variable.
    if matches!(right, Type::Variable(_)) {
        return Ok(false);
    }

    // Parametric against parametric: equal primitives compare their
    // parameters under the declared variance, otherwise the left operand is
    // viewed from the right primitive first.
    if let (Some((left_name, left_parameters)), Some((right_name, right_parameters))) =
        (as_parametric(left), as_parametric(right))
    {
        if left_name == right_name {
            return compare_parameters_by_variance(
                order,
                &left_name,
                &left_parameters,
                &right_parameters,
            );
        }
        let right_primitive = Type::primitive(right_name.clone());
        return match instantiate_successors_parameters(order, left, &right_primitive)? {
            Some(propagated) => compare_parameters_by_variance(
                order,
                &right_name,
                &propagated,
                &right_parameters,
            ),
            None => Ok(false),
        };
    }

    // A union on the left needs every branch below the right.
    if let Type::Union(left_elements) = left {
        for element in left_elements {
            if !less_or_equal(order, element, right)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    // A union on the right needs some branch above the left; a constrained
    // variable may also fit through the union of its constraints.
    if let Type::Union(right_elements) = right {
        for element in right_elements {
            if less_or_equal(order, left, element)? {
                return Ok(true);
            }
        }
        if let Type::Variable(variable) = left {
            return match &variable.constraints {
                VariableConstraints::Explicit(constraints) => {
                    less_or_equal(order, &Type::union(constraints.clone()), right)
                }
                VariableConstraints::Bound(bound) => less_or_equal(order, bound, right),
                VariableConstraints::Unconstrained => Ok(false),
            };
        }
        return Ok(false);
    }

    // Optionals.
    if let (Type::Optional(left_inner), Type::Optional(right_inner)) = (left, right) {
        return less_or_equal(order, left_inner, right_inner);
    }
    if let Type::Optional(right_inner) = right {
        return less_or_equal(order, left, right_inner);
    }
    if matches!(left, Type::Optional(_)) {
        return Ok(false);
    }

    // A variable on the left reduces to its constraints.
    if let Type::Variable(variable) = left {
        return match &variable.constraints {
            VariableConstraints::Explicit(constraints) => {
                less_or_equal(order, &Type::union(constraints.clone()), right)
            }
            VariableConstraints::Bound(bound) => less_or_equal(order, bound, right),
            VariableConstraints::Unconstrained => Ok(false),
        };
    }

    // Tuples.
    match (left, right) {
        (Type::Tuple(Tuple::Bounded(left_elements)), Type::Tuple(Tuple::Bounded(right_elements))) => {
            if left_elements.len() != right_elements.len() {
                return Ok(false);
            }
            for (left_element, right_element) in
                left_elements.iter().zip(right_elements.iter())
            {
                if !less_or_equal(order, left_element, right_element)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        (Type::Tuple(Tuple::Unbounded(left_element)), Type::Tuple(Tuple::Unbounded(right_element))) => {
            return less_or_equal(order, left_element, right_element);
        }
        (Type::Tuple(Tuple::Bounded(left_elements)), Type::Tuple(Tuple::Unbounded(right_element))) => {
            if left_elements.is_empty() {
                return Ok(true);
            }
            let joined = join_tuple_elements(order, left_elements)?;
            return less_or_equal(order, &joined, right_element);
        }
        (Type::Tuple(tuple), Type::Parametric { .. } | Type::Primitive(_)) => {
            if *right == Type::primitive("tuple") {
                return Ok(true);
            }
            let parameter = match tuple {
                Tuple::Bounded(elements) => join_tuple_elements(order, elements)?,
                Tuple::Unbounded(element) => (**element).clone(),
            };
            return less_or_equal(
                order,
                &Type::parametric("tuple", vec![parameter]),
                right,
            );
        }
        (_, Type::Tuple(_)) => return Ok(false),
        _ => {}
    }

    // Callables.
    match (left, right) {
        (Type::Callable(left_callable), Type::Callable(right_callable)) => {
            if let (CallableKind::Named(left_name), CallableKind::Named(right_name)) =
                (&left_callable.kind, &right_callable.kind)
            {
                if left_name == right_name {
                    return Ok(true);
                }
            }
            return match simulate_signature_select(
                order,
                left_callable,
                &right_callable.implementation,
            )? {
                Some(selected) => less_or_equal(
                    order,
                    &selected.annotation,
                    &right_callable.implementation.annotation,
                ),
                None => Ok(false),
            };
        }
        (Type::Meta(inner), Type::Callable(_)) => {
            return match (order.constructor)(inner) {
                Some(instance) => less_or_equal(order, &instance, right),
                None => Ok(false),
            };
        }
        _ => {}
    }

    // Mixed parametric and primitive forms.
    if let (Some((left_name, _)), Type::Primitive(_)) = (as_parametric(left), right) {
        return less_or_equal(order, &Type::primitive(left_name), right);
    }
    if let (Type::Primitive(left_name), Some(_)) = (left, as_parametric(right)) {
        return less_or_equal(
            order,
            &Type::parametric(left_name.clone(), vec![]),
            right,
        );
    }

    // Anything else against a callable goes through its join with the bare
    // callable form.
    if matches!(right, Type::Callable(_)) && !matches!(left, Type::Callable(_)) {
        let bare = Type::parametric("typing.Callable", vec![Type::Bottom]);
        if let Type::Parametric { name, parameters } = join_inner(order, left, &bare)? {
            if name == "typing.Callable" && parameters.len() == 1 {
                if let Type::Callable(_) = &parameters[0] {
                    return less_or_equal(order, &parameters[0], right);
                }
            }
        }
        return Ok(false);
    }

    // A callable below a nominal type needs a protocol witness.
    if let Type::Callable(_) = left {
        match right {
            Type::Parametric { name, .. } => {
                return match (order.implements)(right, left) {
                    ImplementsResult::Implements { parameters } => less_or_equal(
                        order,
                        &Type::parametric(name.clone(), parameters),
                        right,
                    ),
                    ImplementsResult::DoesNotImplement => Ok(false),
                };
            }
            Type::Primitive(_) => {
                return match (order.implements)(right, left) {
                    ImplementsResult::Implements { parameters } => {
                        Ok(parameters.is_empty())
                    }
                    ImplementsResult::DoesNotImplement => Ok(false),
                };
            }
            _ => {}
        }
    }

    // Typed dictionaries compare by width; against anything else they act
    // as their nominal stand-in.
    match (left, right) {
        (Type::TypedDictionary(left_dictionary), Type::TypedDictionary(right_dictionary)) => {
            return Ok(left_dictionary.total == right_dictionary.total
                && right_dictionary
                    .fields
                    .iter()
                    .all(|field| left_dictionary.fields.contains(field)));
        }
        (Type::TypedDictionary(dictionary), _) => {
            return less_or_equal(order, &dictionary.primitive_form(), right);
        }
        (_, Type::TypedDictionary(dictionary)) => {
            return less_or_equal(order, left, &dictionary.primitive_form());
        }
        _ => {}
    }

    // A literal on the left weakens to its carrier; only an equal literal
    // sits below a literal on the right.
    if matches!(left, Type::Literal(_)) {
        return less_or_equal(order, &left.weaken_literals(), right);
    }
    if matches!(right, Type::Literal(_)) {
        return Ok(false);
    }

    // Fall back to raw reachability between the two vertices.
    let left_index = index_of(order.handler, left)?;
    let right_index = index_of(order.handler, right)?;
    let mut worklist = VecDeque::from([left_index]);
    let mut visited = HashSet::from([left_index]);
    while let Some(index) = worklist.pop_front() {
        if index == right_index {
            return Ok(true);
        }
        for edge in order.handler.find_edges(index).unwrap_or_default() {
            if visited.insert(edge.target) {
                worklist.push_back(edge.target);
            }
        }
    }
    Ok(false)
}
