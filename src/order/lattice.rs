//! The join and meet lattice over type terms.

use super::Order;
use super::handler::{Handler, index_of};
use super::propagation::{
    instantiate_predecessors_parameters, instantiate_successors_parameters, variables,
};
use super::subtype::less_or_equal;
use crate::diagnostics::Result;
use crate::types::{
    Callable, CallableKind, Overload, Parameter, Parameters, Tuple, Type, TypedDictionary,
    Variable, VariableConstraints, Variance,
};
use std::collections::{HashSet, VecDeque};

fn as_nominal(annotation: &Type) -> Option<(String, Vec<Type>)> {
    match annotation {
        Type::Primitive(name) => Some((name.clone(), vec![])),
        Type::Parametric { name, parameters } => Some((name.clone(), parameters.clone())),
        Type::Meta(inner) => Some(("type".to_string(), vec![(**inner).clone()])),
        _ => None,
    }
}

/// The least upper bound of two annotations.
///
/// Data-model gaps degrade: an untracked primitive anywhere yields `Any`.
pub fn join(order: &Order<'_>, left: &Type, right: &Type) -> Type {
    match join_inner(order, left, right) {
        Ok(joined) => joined,
        Err(error) => {
            log::debug!("join({left}, {right}) degraded to Any: {error}");
            Type::Any
        }
    }
}

/// The greatest lower bound of two annotations.
///
/// Data-model gaps degrade: an untracked primitive anywhere yields
/// `Bottom`.
pub fn meet(order: &Order<'_>, left: &Type, right: &Type) -> Type {
    match meet_inner(order, left, right) {
        Ok(met) => met,
        Err(error) => {
            log::debug!("meet({left}, {right}) degraded to Bottom: {error}");
            Type::Bottom
        }
    }
}

/// Widening for fixed-point iteration: past the threshold the value is
/// coerced to `Top`, otherwise the operands are joined.
pub fn widen(
    order: &Order<'_>,
    previous: &Type,
    next: &Type,
    iteration: usize,
    threshold: usize,
) -> Type {
    if iteration > threshold {
        Type::Top
    } else {
        join(order, previous, next)
    }
}

fn combine_parameters_join(
    order: &Order<'_>,
    primitive_name: &str,
    left_parameters: &[Type],
    right_parameters: &[Type],
) -> Result<Vec<Type>> {
    let declared =
        variables(order.handler, &Type::primitive(primitive_name))?.unwrap_or_default();
    let mut combined = Vec::with_capacity(left_parameters.len());
    for (position, (left, right)) in left_parameters
        .iter()
        .zip(right_parameters.iter())
        .enumerate()
    {
        let variance = match declared.get(position) {
            Some(Type::Variable(Variable { variance, .. })) => *variance,
            _ => Variance::Invariant,
        };
        let parameter = match variance {
            Variance::Covariant => join_inner(order, left, right)?,
            Variance::Contravariant => meet_inner(order, left, right)?,
            Variance::Invariant => {
                if left == right {
                    left.clone()
                } else {
                    Type::Any
                }
            }
        };
        combined.push(parameter);
    }
    Ok(combined)
}

fn combine_parameters_meet(
    order: &Order<'_>,
    primitive_name: &str,
    left_parameters: &[Type],
    right_parameters: &[Type],
) -> Result<Option<Vec<Type>>> {
    let declared =
        variables(order.handler, &Type::primitive(primitive_name))?.unwrap_or_default();
    let mut combined = Vec::with_capacity(left_parameters.len());
    for (position, (left, right)) in left_parameters
        .iter()
        .zip(right_parameters.iter())
        .enumerate()
    {
        let variance = match declared.get(position) {
            Some(Type::Variable(Variable { variance, .. })) => *variance,
            _ => Variance::Invariant,
        };
        let parameter = match variance {
            Variance::Covariant => meet_inner(order, left, right)?,
            Variance::Contravariant => join_inner(order, left, right)?,
            Variance::Invariant => {
                if left == right {
                    left.clone()
                } else {
                    return Ok(None);
                }
            }
        };
        combined.push(parameter);
    }
    Ok(Some(combined))
}

pub(crate) fn join_inner(order: &Order<'_>, left: &Type, right: &Type) -> Result<Type> {
    if left == right {
        return Ok(left.clone());
    }

    match (left, right) {
        (Type::Any, _) | (_, Type::Any) => return Ok(Type::Any),
        (Type::Top, _) | (_, Type::Top) => return Ok(Type::Top),
        (Type::Bottom, other) | (other, Type::Bottom) => return Ok(other.clone()),
        (Type::Undeclared, _) | (_, Type::Undeclared) => {
            return Ok(Type::union(vec![left.clone(), right.clone()]));
        }
        _ => {}
    }

    // Unions concatenate; a non-union operand distributes in unless it is
    // already below the union.
    match (left, right) {
        (Type::Union(left_elements), Type::Union(right_elements)) => {
            let mut combined = left_elements.clone();
            combined.extend(right_elements.iter().cloned());
            return Ok(Type::union(combined));
        }
        (Type::Union(elements), other) | (other, Type::Union(elements)) => {
            let union_annotation = Type::Union(elements.clone());
            if less_or_equal(order, other, &union_annotation)? {
                return Ok(union_annotation);
            }
            let mut combined = elements.clone();
            combined.push(other.clone());
            return Ok(Type::union(combined));
        }
        _ => {}
    }

    match (left, right) {
        (Type::Optional(left_inner), Type::Optional(right_inner)) => {
            return Ok(Type::optional(join_inner(order, left_inner, right_inner)?));
        }
        (Type::Optional(inner), other) | (other, Type::Optional(inner)) => {
            return Ok(Type::optional(join_inner(order, inner, other)?));
        }
        _ => {}
    }

    // Variables join at their ground form.
    match (left, right) {
        (Type::Variable(variable), other) | (other, Type::Variable(variable)) => {
            return match &variable.constraints {
                VariableConstraints::Unconstrained => {
                    Ok(Type::union(vec![left.clone(), right.clone()]))
                }
                VariableConstraints::Bound(bound) => join_inner(order, bound, other),
                VariableConstraints::Explicit(constraints) => {
                    join_inner(order, &Type::union(constraints.clone()), other)
                }
            };
        }
        _ => {}
    }

    if matches!(left, Type::Literal(_)) || matches!(right, Type::Literal(_)) {
        return join_inner(order, &left.weaken_literals(), &right.weaken_literals());
    }

    // Tuples.
    match (left, right) {
        (
            Type::Tuple(Tuple::Bounded(left_elements)),
            Type::Tuple(Tuple::Bounded(right_elements)),
        ) if left_elements.len() == right_elements.len() => {
            let mut joined = Vec::with_capacity(left_elements.len());
            for (left_element, right_element) in
                left_elements.iter().zip(right_elements.iter())
            {
                joined.push(join_inner(order, left_element, right_element)?);
            }
            return Ok(Type::tuple(joined));
        }
        (
            Type::Tuple(Tuple::Unbounded(left_element)),
            Type::Tuple(Tuple::Unbounded(right_element)),
        ) => {
            return Ok(Type::unbounded_tuple(join_inner(
                order,
                left_element,
                right_element,
            )?));
        }
        (Type::Tuple(Tuple::Bounded(elements)), Type::Tuple(Tuple::Unbounded(element)))
        | (Type::Tuple(Tuple::Unbounded(element)), Type::Tuple(Tuple::Bounded(elements))) => {
            let mut joined = Type::Bottom;
            for bounded_element in elements {
                joined = join_inner(order, &joined, bounded_element)?;
            }
            if less_or_equal(order, &joined, element)? {
                return Ok(Type::unbounded_tuple((**element).clone()));
            }
            return Ok(Type::union(vec![left.clone(), right.clone()]));
        }
        (Type::Tuple(_), Type::Tuple(_)) => {
            return Ok(Type::union(vec![left.clone(), right.clone()]));
        }
        (Type::Tuple(tuple), other) | (other, Type::Tuple(tuple))
            if matches!(other, Type::Parametric { .. } | Type::Primitive(_)) =>
        {
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
            return join_inner(order, &Type::parametric("tuple", vec![parameter]), other);
        }
        _ => {}
    }

    // Callables.
    match (left, right) {
        (Type::Callable(left_callable), Type::Callable(right_callable)) => {
            if let (CallableKind::Named(left_name), CallableKind::Named(right_name)) =
                (&left_callable.kind, &right_callable.kind)
            {
                if left_name == right_name {
                    return Ok(left.clone());
                }
            }
            if left_callable.kind == CallableKind::Anonymous
                && right_callable.kind == CallableKind::Anonymous
                && left_callable.overloads.is_empty()
                && right_callable.overloads.is_empty()
            {
                if let Some(implementation) = join_implementations(
                    order,
                    &left_callable.implementation,
                    &right_callable.implementation,
                    meet_inner,
                    join_inner,
                )? {
                    return Ok(Type::callable(Callable::anonymous(implementation)));
                }
            }
            return Ok(Type::union(vec![left.clone(), right.clone()]));
        }
        (Type::Callable(_), _) | (_, Type::Callable(_)) => {
            return Ok(Type::union(vec![left.clone(), right.clone()]));
        }
        _ => {}
    }

    // Typed dictionaries with agreeing totality and no conflicting fields
    // keep their common fields; anything else falls back to a mapping.
    match (left, right) {
        (Type::TypedDictionary(left_dictionary), Type::TypedDictionary(right_dictionary)) => {
            let conflict = left_dictionary.fields.iter().any(|left_field| {
                right_dictionary.fields.iter().any(|right_field| {
                    right_field.name == left_field.name
                        && right_field.annotation != left_field.annotation
                })
            });
            if left_dictionary.total == right_dictionary.total && !conflict {
                let fields = left_dictionary
                    .fields
                    .iter()
                    .filter(|field| right_dictionary.fields.contains(*field))
                    .cloned()
                    .collect();
                return Ok(Type::TypedDictionary(TypedDictionary {
                    fields,
                    total: left_dictionary.total,
                }));
            }
            return Ok(Type::parametric(
                "typing.Mapping",
                vec![Type::primitive("str"), Type::Any],
            ));
        }
        (Type::TypedDictionary(dictionary), other)
        | (other, Type::TypedDictionary(dictionary)) => {
            return join_inner(order, &dictionary.primitive_form(), other);
        }
        _ => {}
    }

    // Nominal forms.
    if let (Some((left_name, left_parameters)), Some((right_name, right_parameters))) =
        (as_nominal(left), as_nominal(right))
    {
        if less_or_equal(order, left, right)? {
            return Ok(right.clone());
        }
        if less_or_equal(order, right, left)? {
            return Ok(left.clone());
        }
        if let (Type::Meta(left_inner), Type::Meta(right_inner)) = (left, right) {
            return Ok(Type::meta(join_inner(order, left_inner, right_inner)?));
        }
        if left_name == right_name {
            if left_parameters.len() == right_parameters.len() && !left_parameters.is_empty()
            {
                let combined = combine_parameters_join(
                    order,
                    &left_name,
                    &left_parameters,
                    &right_parameters,
                )?;
                return Ok(Type::parametric(left_name, combined));
            }
            return Ok(Type::union(vec![left.clone(), right.clone()]));
        }
        if !(matches!(left, Type::Primitive(_)) && matches!(right, Type::Primitive(_))) {
            // Join through a common primitive ancestor, viewing both
            // operands from it.
            let ancestor = join_inner(
                order,
                &Type::primitive(left_name),
                &Type::primitive(right_name),
            )?;
            if let Type::Primitive(ancestor_name) = &ancestor {
                let target = Type::primitive(ancestor_name.clone());
                if let (Some(left_propagated), Some(right_propagated)) = (
                    instantiate_successors_parameters(order, left, &target)?,
                    instantiate_successors_parameters(order, right, &target)?,
                ) {
                    if left_propagated.len() == right_propagated.len() {
                        let combined = combine_parameters_join(
                            order,
                            ancestor_name,
                            &left_propagated,
                            &right_propagated,
                        )?;
                        return Ok(if combined.is_empty() {
                            target
                        } else {
                            Type::parametric(ancestor_name.clone(), combined)
                        });
                    }
                }
            }
            return Ok(Type::union(vec![left.clone(), right.clone()]));
        }
    }

    // Purely nominal join over the graph: accept a unique least common
    // ancestor, otherwise keep the structural union.
    let ancestors = least_upper_bound(order.handler, left, right)?;
    match ancestors.as_slice() {
        [unique] => Ok(unique.clone()),
        _ => Ok(Type::union(vec![left.clone(), right.clone()])),
    }
}

pub(crate) fn meet_inner(order: &Order<'_>, left: &Type, right: &Type) -> Result<Type> {
    if left == right {
        return Ok(left.clone());
    }

    match (left, right) {
        (Type::Any, other) | (other, Type::Any) => return Ok(other.clone()),
        (Type::Top, other) | (other, Type::Top) => return Ok(other.clone()),
        (Type::Bottom, _) | (_, Type::Bottom) => return Ok(Type::Bottom),
        (Type::Undeclared, _) | (_, Type::Undeclared) => return Ok(Type::Bottom),
        _ => {}
    }

    if left.is_union() || right.is_union() {
        if less_or_equal(order, left, right)? {
            return Ok(left.clone());
        }
        if less_or_equal(order, right, left)? {
            return Ok(right.clone());
        }
        return Ok(Type::Bottom);
    }

    match (left, right) {
        (Type::Optional(left_inner), Type::Optional(right_inner)) => {
            return Ok(Type::optional(meet_inner(order, left_inner, right_inner)?));
        }
        (Type::Optional(inner), other) | (other, Type::Optional(inner)) => {
            return meet_inner(order, inner, other);
        }
        _ => {}
    }

    // Variables carry no lower bound.
    if matches!(left, Type::Variable(_)) || matches!(right, Type::Variable(_)) {
        return Ok(Type::Bottom);
    }

    if matches!(left, Type::Literal(_)) || matches!(right, Type::Literal(_)) {
        if less_or_equal(order, left, right)? {
            return Ok(left.clone());
        }
        if less_or_equal(order, right, left)? {
            return Ok(right.clone());
        }
        return Ok(Type::Bottom);
    }

    // Tuples.
    match (left, right) {
        (
            Type::Tuple(Tuple::Bounded(left_elements)),
            Type::Tuple(Tuple::Bounded(right_elements)),
        ) if left_elements.len() == right_elements.len() => {
            let mut met = Vec::with_capacity(left_elements.len());
            for (left_element, right_element) in
                left_elements.iter().zip(right_elements.iter())
            {
                met.push(meet_inner(order, left_element, right_element)?);
            }
            return Ok(Type::tuple(met));
        }
        (
            Type::Tuple(Tuple::Unbounded(left_element)),
            Type::Tuple(Tuple::Unbounded(right_element)),
        ) => {
            return Ok(Type::unbounded_tuple(meet_inner(
                order,
                left_element,
                right_element,
            )?));
        }
        (Type::Tuple(_), Type::Tuple(_)) => return Ok(Type::Bottom),
        (Type::Tuple(_), other) | (other, Type::Tuple(_))
            if matches!(other, Type::Parametric { .. } | Type::Primitive(_)) =>
        {
            if less_or_equal(order, left, right)? {
                return Ok(left.clone());
            }
            if less_or_equal(order, right, left)? {
                return Ok(right.clone());
            }
            return Ok(Type::Bottom);
        }
        _ => {}
    }

    // Callables meet with parameter and return roles swapped relative to
    // join.
    match (left, right) {
        (Type::Callable(left_callable), Type::Callable(right_callable)) => {
            if let (CallableKind::Named(left_name), CallableKind::Named(right_name)) =
                (&left_callable.kind, &right_callable.kind)
            {
                if left_name == right_name {
                    return Ok(left.clone());
                }
            }
            if left_callable.kind == CallableKind::Anonymous
                && right_callable.kind == CallableKind::Anonymous
                && left_callable.overloads.is_empty()
                && right_callable.overloads.is_empty()
            {
                if let Some(implementation) = join_implementations(
                    order,
                    &left_callable.implementation,
                    &right_callable.implementation,
                    join_inner,
                    meet_inner,
                )? {
                    return Ok(Type::callable(Callable::anonymous(implementation)));
                }
            }
            return Ok(Type::Bottom);
        }
        (Type::Callable(_), _) | (_, Type::Callable(_)) => return Ok(Type::Bottom),
        _ => {}
    }

    // Typed dictionaries with agreeing totality union their fields.
    match (left, right) {
        (Type::TypedDictionary(left_dictionary), Type::TypedDictionary(right_dictionary)) => {
            let conflict = left_dictionary.fields.iter().any(|left_field| {
                right_dictionary.fields.iter().any(|right_field| {
                    right_field.name == left_field.name
                        && right_field.annotation != left_field.annotation
                })
            });
            if left_dictionary.total != right_dictionary.total || conflict {
                return Ok(Type::Bottom);
            }
            let mut fields = left_dictionary.fields.clone();
            for field in &right_dictionary.fields {
                if !fields.iter().any(|existing| existing.name == field.name) {
                    fields.push(field.clone());
                }
            }
            return Ok(Type::TypedDictionary(TypedDictionary {
                fields,
                total: left_dictionary.total,
            }));
        }
        (Type::TypedDictionary(dictionary), other)
        | (other, Type::TypedDictionary(dictionary)) => {
            return meet_inner(order, &dictionary.primitive_form(), other);
        }
        _ => {}
    }

    // Nominal forms.
    if let (Some((left_name, left_parameters)), Some((right_name, right_parameters))) =
        (as_nominal(left), as_nominal(right))
    {
        if less_or_equal(order, left, right)? {
            return Ok(left.clone());
        }
        if less_or_equal(order, right, left)? {
            return Ok(right.clone());
        }
        if let (Type::Meta(left_inner), Type::Meta(right_inner)) = (left, right) {
            return Ok(Type::meta(meet_inner(order, left_inner, right_inner)?));
        }
        if left_name == right_name {
            if left_parameters.len() == right_parameters.len() && !left_parameters.is_empty()
            {
                return Ok(
                    match combine_parameters_meet(
                        order,
                        &left_name,
                        &left_parameters,
                        &right_parameters,
                    )? {
                        Some(combined) => Type::parametric(left_name, combined),
                        None => Type::Bottom,
                    },
                );
            }
            return Ok(Type::Bottom);
        }
        if !(matches!(left, Type::Primitive(_)) && matches!(right, Type::Primitive(_))) {
            // Meet through a common primitive descendant, viewing both
            // operands from it.
            let descendant = meet_inner(
                order,
                &Type::primitive(left_name),
                &Type::primitive(right_name),
            )?;
            if let Type::Primitive(descendant_name) = &descendant {
                let target = Type::primitive(descendant_name.clone());
                if let (Some(left_propagated), Some(right_propagated)) = (
                    instantiate_predecessors_parameters(order, left, &target)?,
                    instantiate_predecessors_parameters(order, right, &target)?,
                ) {
                    if left_propagated.len() == right_propagated.len() {
                        if let Some(combined) = combine_parameters_meet(
                            order,
                            descendant_name,
                            &left_propagated,
                            &right_propagated,
                        )? {
                            return Ok(if combined.is_empty() {
                                target
                            } else {
                                Type::parametric(descendant_name.clone(), combined)
                            });
                        }
                    }
                }
            }
            return Ok(Type::Bottom);
        }
    }

    let descendants = greatest_lower_bound(order.handler, left, right)?;
    match descendants.as_slice() {
        [unique] => Ok(unique.clone()),
        _ => Ok(Type::Bottom),
    }
}

/// Combines two overloads field-wise. Defined only when the parameter
/// lists align in kind, length, names, and defaults; the result keeps the
/// left operand's structure apart from annotations.
pub(crate) fn join_implementations(
    order: &Order<'_>,
    left: &Overload,
    right: &Overload,
    parameter_combine: fn(&Order<'_>, &Type, &Type) -> Result<Type>,
    return_combine: fn(&Order<'_>, &Type, &Type) -> Result<Type>,
) -> Result<Option<Overload>> {
    let parameters = match (&left.parameters, &right.parameters) {
        (Parameters::Undefined, Parameters::Undefined) => Parameters::Undefined,
        (Parameters::Defined(left_parameters), Parameters::Defined(right_parameters))
            if left_parameters.len() == right_parameters.len() =>
        {
            let mut combined = Vec::with_capacity(left_parameters.len());
            for (left_parameter, right_parameter) in
                left_parameters.iter().zip(right_parameters.iter())
            {
                let parameter = match (left_parameter, right_parameter) {
                    (
                        Parameter::Named {
                            name: left_name,
                            annotation: left_annotation,
                            default: left_default,
                        },
                        Parameter::Named {
                            name: right_name,
                            annotation: right_annotation,
                            default: right_default,
                        },
                    ) if Parameter::names_compatible(left_name, right_name)
                        && left_default == right_default =>
                    {
                        Parameter::Named {
                            name: left_name.clone(),
                            annotation: parameter_combine(
                                order,
                                left_annotation,
                                right_annotation,
                            )?,
                            default: *left_default,
                        }
                    }
                    (
                        Parameter::Variable {
                            name,
                            annotation: left_annotation,
                        },
                        Parameter::Variable {
                            annotation: right_annotation,
                            ..
                        },
                    ) => Parameter::Variable {
                        name: name.clone(),
                        annotation: parameter_combine(order, left_annotation, right_annotation)?,
                    },
                    (
                        Parameter::Keywords {
                            name,
                            annotation: left_annotation,
                        },
                        Parameter::Keywords {
                            annotation: right_annotation,
                            ..
                        },
                    ) => Parameter::Keywords {
                        name: name.clone(),
                        annotation: parameter_combine(order, left_annotation, right_annotation)?,
                    },
                    _ => return Ok(None),
                };
                combined.push(parameter);
            }
            Parameters::Defined(combined)
        }
        _ => return Ok(None),
    };
    Ok(Some(Overload {
        annotation: return_combine(order, &left.annotation, &right.annotation)?,
        parameters,
    }))
}

/// The least common ancestors of two annotations, by lockstep level
/// expansion from both sides.
pub fn least_upper_bound(
    handler: &dyn Handler,
    left: &Type,
    right: &Type,
) -> Result<Vec<Type>> {
    least_common(handler, left, right, true)
}

/// The greatest common descendants of two annotations.
pub fn greatest_lower_bound(
    handler: &dyn Handler,
    left: &Type,
    right: &Type,
) -> Result<Vec<Type>> {
    least_common(handler, left, right, false)
}

fn least_common(
    handler: &dyn Handler,
    left: &Type,
    right: &Type,
    forward: bool,
) -> Result<Vec<Type>> {
    let left_index = index_of(handler, &left.split().0)?;
    let right_index = index_of(handler, &right.split().0)?;
    let mut left_visited = HashSet::from([left_index]);
    let mut right_visited = HashSet::from([right_index]);
    let mut left_frontier = VecDeque::from([left_index]);
    let mut right_frontier = VecDeque::from([right_index]);

    let expand = |frontier: &mut VecDeque<usize>, visited: &mut HashSet<usize>| {
        let mut next = VecDeque::new();
        while let Some(index) = frontier.pop_front() {
            let neighbors = if forward {
                handler.find_edges(index)
            } else {
                handler.find_backedges(index)
            };
            for target in neighbors.unwrap_or_default() {
                if visited.insert(target.target) {
                    next.push_back(target.target);
                }
            }
        }
        *frontier = next;
    };

    loop {
        let mut common: Vec<usize> = left_visited
            .intersection(&right_visited)
            .copied()
            .collect();
        if !common.is_empty() {
            common.sort_unstable();
            return Ok(common
                .into_iter()
                .filter_map(|index| handler.find_annotation(index))
                .collect());
        }
        if left_frontier.is_empty() && right_frontier.is_empty() {
            return Ok(Vec::new());
        }
        expand(&mut left_frontier, &mut left_visited);
        expand(&mut right_frontier, &mut right_visited);
    }
}
