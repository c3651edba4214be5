//! Constraint solving: binding type variables so a source type becomes a
//! subtype of a target type.

use super::ImplementsResult;
use super::Order;
use super::propagation::instantiate_successors_parameters;
use super::signature::simulate_signature_select;
use super::subtype::less_or_equal;
use crate::diagnostics::Result;
use crate::types::{
    Parameters, Tuple, Type, Variable, VariableConstraints,
};

/// Accumulated variable bindings, keyed by the `Variable` term itself.
///
/// The map is persistent so alternative branches (union targets, overload
/// candidates) can be explored without copying state back out.
pub type ConstraintMap = im::HashMap<Type, Type>;

/// Accumulates bindings under which `source` is a subtype of `target`.
/// Returns `None` when no such bindings exist; data-model gaps anywhere
/// also report failure.
pub fn solve_constraints(
    order: &Order<'_>,
    constraints: &ConstraintMap,
    source: &Type,
    target: &Type,
) -> Option<ConstraintMap> {
    match solve_constraints_inner(order, constraints.clone(), source, target) {
        Ok(solved) => solved,
        Err(error) => {
            log::debug!("solve_constraints({source}, {target}) failed: {error}");
            None
        }
    }
}

pub(crate) fn solve_constraints_inner(
    order: &Order<'_>,
    constraints: ConstraintMap,
    source: &Type,
    target: &Type,
) -> Result<Option<ConstraintMap>> {
    // Bottom fits below anything without learning bindings.
    if *source == Type::Bottom {
        return Ok(Some(constraints));
    }

    // Every branch of a union source must fit the same target.
    if let Type::Union(elements) = source {
        let mut constraints = constraints;
        for element in elements {
            match solve_constraints_inner(order, constraints, element, target)? {
                Some(updated) => constraints = updated,
                None => return Ok(None),
            }
        }
        return Ok(Some(constraints));
    }

    // A target without free variables is a plain subtype check, tolerating
    // gradual saturation.
    if target.is_resolved() {
        let accepted = less_or_equal(order, source, target)?
            || *source == Type::Any
            || *target == Type::Any;
        return Ok(accepted.then_some(constraints));
    }

    match target {
        Type::Variable(variable) => {
            if source == target {
                return Ok(Some(constraints));
            }
            let joined_source = match constraints.get(target) {
                Some(existing) => super::lattice::join_inner(order, existing, source)?,
                None => source.clone(),
            };
            let solved = match &variable.constraints {
                VariableConstraints::Explicit(target_constraints) => match source {
                    Type::Variable(Variable {
                        constraints: VariableConstraints::Explicit(source_constraints),
                        ..
                    }) => source_constraints
                        .iter()
                        .all(|constraint| target_constraints.contains(constraint))
                        .then_some(joined_source),
                    _ => {
                        // The first explicit constraint the joined source
                        // fits under becomes the binding.
                        let mut chosen = None;
                        for constraint in target_constraints {
                            if less_or_equal(order, &joined_source, constraint)? {
                                chosen = Some(constraint.clone());
                                break;
                            }
                        }
                        chosen
                    }
                },
                VariableConstraints::Bound(bound) => less_or_equal(order, &joined_source, bound)?
                    .then_some(joined_source),
                VariableConstraints::Unconstrained => Some(joined_source),
            };
            Ok(solved.map(|binding| {
                let mut constraints = constraints;
                constraints.insert(target.clone(), binding);
                constraints
            }))
        }

        Type::Parametric {
            name,
            parameters: target_parameters,
        } => {
            // A callable source witnesses the protocol first.
            if let Type::Callable(_) = source {
                return match (order.implements)(target, source) {
                    ImplementsResult::Implements { parameters } => solve_constraints_inner(
                        order,
                        constraints,
                        &Type::parametric(name.clone(), parameters),
                        target,
                    ),
                    ImplementsResult::DoesNotImplement => Ok(None),
                };
            }
            let propagated = instantiate_successors_parameters(
                order,
                source,
                &Type::primitive(name.clone()),
            )?;
            let Some(source_parameters) = propagated else {
                return Ok(None);
            };
            if source_parameters.len() != target_parameters.len() {
                return Ok(None);
            }
            let mut constraints = constraints;
            for (source_parameter, target_parameter) in
                source_parameters.iter().zip(target_parameters.iter())
            {
                match solve_constraints_inner(
                    order,
                    constraints,
                    source_parameter,
                    target_parameter,
                )? {
                    Some(updated) => constraints = updated,
                    None => return Ok(None),
                }
            }
            // The bindings must actually place the source below the
            // instantiated target.
            let instantiated = target
                .instantiate(&|candidate| constraints.get(candidate).cloned());
            if less_or_equal(order, source, &instantiated)? {
                Ok(Some(constraints))
            } else {
                Ok(None)
            }
        }

        Type::Optional(target_inner) => match source {
            Type::Optional(source_inner) => {
                solve_constraints_inner(order, constraints, source_inner, target_inner)
            }
            _ => solve_constraints_inner(order, constraints, source, target_inner),
        },

        Type::Tuple(target_tuple) => match (source, target_tuple) {
            (Type::Tuple(Tuple::Bounded(source_elements)), Tuple::Bounded(target_elements))
                if source_elements.len() == target_elements.len() =>
            {
                let mut constraints = constraints;
                for (source_element, target_element) in
                    source_elements.iter().zip(target_elements.iter())
                {
                    match solve_constraints_inner(
                        order,
                        constraints,
                        source_element,
                        target_element,
                    )? {
                        Some(updated) => constraints = updated,
                        None => return Ok(None),
                    }
                }
                Ok(Some(constraints))
            }
            (Type::Tuple(Tuple::Unbounded(source_element)), Tuple::Unbounded(target_element)) => {
                solve_constraints_inner(order, constraints, source_element, target_element)
            }
            (Type::Tuple(Tuple::Bounded(source_elements)), Tuple::Unbounded(target_element)) => {
                if source_elements.is_empty() {
                    return Ok(Some(constraints));
                }
                // The union of the elements must fit the target element.
                solve_constraints_inner(
                    order,
                    constraints,
                    &Type::union(source_elements.clone()),
                    target_element,
                )
            }
            (Type::Tuple(Tuple::Unbounded(source_element)), Tuple::Bounded(target_elements)) => {
                // Expand the source element across the target positions.
                let mut constraints = constraints;
                for target_element in target_elements {
                    match solve_constraints_inner(
                        order,
                        constraints,
                        source_element,
                        target_element,
                    )? {
                        Some(updated) => constraints = updated,
                        None => return Ok(None),
                    }
                }
                Ok(Some(constraints))
            }
            _ => Ok(None),
        },

        Type::Union(target_elements) => {
            for target_element in target_elements {
                if let Some(solved) = solve_constraints_inner(
                    order,
                    constraints.clone(),
                    source,
                    target_element,
                )? {
                    return Ok(Some(solved));
                }
            }
            Ok(None)
        }

        Type::Callable(target_callable) => match source {
            Type::Callable(source_callable) => {
                // Simulate the call with the target's own variables marked
                // opaque, so only the source's variables are solved.
                let marked = Type::Callable(target_callable.clone())
                    .mark_free_variables_as_bound();
                let Type::Callable(marked_callable) = &marked else {
                    unreachable!("marking preserves the callable shape");
                };
                match simulate_signature_select(
                    order,
                    source_callable,
                    &marked_callable.implementation,
                )? {
                    Some(selected) => {
                        let annotation = selected.annotation.free_simulated_bound_variables();
                        solve_constraints_inner(
                            order,
                            constraints,
                            &annotation,
                            &target_callable.implementation.annotation,
                        )
                    }
                    None => {
                        // Degraded path: align parameter annotations
                        // pairwise, then the return types.
                        let mut constraints = constraints;
                        if let (
                            Parameters::Defined(source_parameters),
                            Parameters::Defined(target_parameters),
                        ) = (
                            &source_callable.implementation.parameters,
                            &target_callable.implementation.parameters,
                        ) {
                            for (source_parameter, target_parameter) in
                                source_parameters.iter().zip(target_parameters.iter())
                            {
                                match solve_constraints_inner(
                                    order,
                                    constraints,
                                    source_parameter.annotation(),
                                    target_parameter.annotation(),
                                )? {
                                    Some(updated) => constraints = updated,
                                    None => return Ok(None),
                                }
                            }
                        }
                        solve_constraints_inner(
                            order,
                            constraints,
                            &source_callable.implementation.annotation,
                            &target_callable.implementation.annotation,
                        )
                    }
                }
            }
            Type::Meta(inner) => match (order.constructor)(inner) {
                Some(instance) => {
                    solve_constraints_inner(order, constraints, &instance, target)
                }
                None => Ok(None),
            },
            _ => Ok(None),
        },

        Type::Meta(target_inner) => match source {
            Type::Meta(source_inner) => {
                solve_constraints_inner(order, constraints, source_inner, target_inner)
            }
            _ => Ok(None),
        },

        _ => Ok(None),
    }
}
