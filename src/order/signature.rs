//! Call simulation: matching a callable's signatures against a call site.

use super::Order;
use super::solver::{ConstraintMap, solve_constraints_inner};
use super::subtype::less_or_equal;
use crate::diagnostics::Result;
use crate::types::{Callable, Overload, Parameter, Parameters, Type};

/// Selects the overload of `callable` that accepts a call shaped like
/// `called_as`, returning it with its type variables instantiated from the
/// call.
///
/// Overloads are tried in declaration order, followed by the
/// implementation when its parameters are defined; a callable with no
/// overloads offers only its implementation.
pub fn simulate_signature_select(
    order: &Order<'_>,
    callable: &Callable,
    called_as: &Overload,
) -> Result<Option<Overload>> {
    let mut candidates: Vec<&Overload> = Vec::new();
    if callable.overloads.is_empty() {
        candidates.push(&callable.implementation);
    } else {
        candidates.extend(callable.overloads.iter());
        if matches!(callable.implementation.parameters, Parameters::Defined(_)) {
            candidates.push(&callable.implementation);
        }
    }

    for overload in candidates {
        let mut constraints = ConstraintMap::new();
        for variable in overload.annotation.free_variables() {
            constraints.insert(Type::Variable(variable), Type::Bottom);
        }
        if let Parameters::Defined(parameters) = &overload.parameters {
            for parameter in parameters {
                for variable in parameter.annotation().free_variables() {
                    constraints.insert(Type::Variable(variable), Type::Bottom);
                }
            }
        }

        let solved = match (&overload.parameters, &called_as.parameters) {
            (Parameters::Undefined, _) | (_, Parameters::Undefined) => Some(constraints),
            (Parameters::Defined(left), Parameters::Defined(right)) => {
                solve_parameters(order, left, right, constraints)?
            }
        };

        if let Some(constraints) = solved {
            let instantiated = overload.map_annotations(&|annotation| {
                annotation.instantiate(&|candidate| constraints.get(candidate).cloned())
            });
            return Ok(Some(instantiated));
        }
    }
    Ok(None)
}

/// Matches implementation parameters (left) against call-site parameters
/// (right) positionally, accumulating solver constraints.
fn solve_parameters(
    order: &Order<'_>,
    left: &[Parameter],
    right: &[Parameter],
    constraints: ConstraintMap,
) -> Result<Option<ConstraintMap>> {
    match (left, right) {
        ([], []) => Ok(Some(constraints)),

        // Kind-for-kind matches solve the call-site annotation against the
        // implementation annotation and continue.
        (
            [Parameter::Named { name: left_name, annotation: left_annotation, .. }, left_rest @ ..],
            [Parameter::Named { name: right_name, annotation: right_annotation, .. }, right_rest @ ..],
        ) if Parameter::names_compatible(left_name, right_name) => {
            match solve_constraints_inner(order, constraints, right_annotation, left_annotation)? {
                Some(constraints) => solve_parameters(order, left_rest, right_rest, constraints),
                None => Ok(None),
            }
        }
        (
            [Parameter::Variable { annotation: left_annotation, .. }, left_rest @ ..],
            [Parameter::Variable { annotation: right_annotation, .. }, right_rest @ ..],
        )
        | (
            [Parameter::Keywords { annotation: left_annotation, .. }, left_rest @ ..],
            [Parameter::Keywords { annotation: right_annotation, .. }, right_rest @ ..],
        ) => {
            match solve_constraints_inner(order, constraints, right_annotation, left_annotation)? {
                Some(constraints) => solve_parameters(order, left_rest, right_rest, constraints),
                None => Ok(None),
            }
        }

        // A variadic implementation parameter consumes anonymous
        // positional arguments one at a time.
        (
            [Parameter::Variable { annotation: left_annotation, .. }, ..],
            [Parameter::Named { name, annotation: right_annotation, .. }, right_rest @ ..],
        ) if Parameter::is_anonymous(name) => {
            match solve_constraints_inner(order, constraints, right_annotation, left_annotation)? {
                Some(constraints) => solve_parameters(order, left, right_rest, constraints),
                None => Ok(None),
            }
        }

        // `*args, **kwargs` with equal annotations absorb any remaining
        // named arguments below the keywords annotation, consuming the
        // whole shape at once.
        (
            [Parameter::Variable { annotation: variable_annotation, .. }, Parameter::Keywords { annotation: keywords_annotation, .. }, ..],
            [Parameter::Named { .. }, ..],
        ) if right
            .iter()
            .all(|parameter| matches!(parameter, Parameter::Named { .. })) =>
        {
            if variable_annotation != keywords_annotation {
                return Ok(None);
            }
            for parameter in right {
                if !less_or_equal(order, parameter.annotation(), keywords_annotation)? {
                    return Ok(None);
                }
            }
            Ok(Some(constraints))
        }

        // Trailing implementation parameters with an exhausted call site.
        ([Parameter::Variable { .. }, left_rest @ ..], [])
        | ([Parameter::Keywords { .. }, left_rest @ ..], []) => {
            solve_parameters(order, left_rest, right, constraints)
        }
        ([Parameter::Named { default: true, .. }, left_rest @ ..], []) => {
            solve_parameters(order, left_rest, right, constraints)
        }

        _ => Ok(None),
    }
}
