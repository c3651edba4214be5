//! C3 linearization of the subclass graph.

use super::handler::{Handler, index_of};
use crate::diagnostics::{Error, Result};
use crate::types::Type;
use std::collections::HashMap;

const GENERIC: &str = "typing.Generic";

/// Computes the linearized method resolution order of an annotation. The
/// annotation itself is always the head.
pub fn method_resolution_order(handler: &dyn Handler, annotation: &Type) -> Result<Vec<Type>> {
    linearize(handler, annotation)
}

/// The linearization with the annotation itself stripped.
pub fn successors(handler: &dyn Handler, annotation: &Type) -> Result<Vec<Type>> {
    let mut linearized = linearize(handler, annotation)?;
    linearized.remove(0);
    Ok(linearized)
}

fn linearize(handler: &dyn Handler, annotation: &Type) -> Result<Vec<Type>> {
    let (primitive, parameters) = annotation.split();
    let index = index_of(handler, &primitive)?;
    let generic_index = handler.find_index(&Type::primitive(GENERIC));

    // Rewrite each immediate successor from the generic declaration into
    // this annotation's actual parameters; on arity disagreement the
    // parameters are dropped.
    let declared = generic_index
        .and_then(|generic| {
            handler
                .find_edges(index)?
                .into_iter()
                .find(|target| target.target == generic)
                .map(|target| target.parameters)
        })
        .unwrap_or_default();
    let drop_parameters = declared.len() != parameters.len();
    let substitutions: HashMap<Type, Type> = if drop_parameters {
        HashMap::new()
    } else {
        declared.into_iter().zip(parameters).collect()
    };

    let mut linearizations = Vec::new();
    for edge in handler.find_edges(index).unwrap_or_default() {
        if Some(edge.target) == generic_index {
            continue;
        }
        let Some(successor) = handler.find_annotation(edge.target) else {
            continue;
        };
        let instantiated: Vec<Type> = if drop_parameters {
            Vec::new()
        } else {
            edge.parameters
                .iter()
                .map(|parameter| {
                    parameter.instantiate(&|candidate| substitutions.get(candidate).cloned())
                })
                .collect()
        };
        let successor = match (&successor, instantiated.is_empty()) {
            (Type::Primitive(name), false) => Type::parametric(name.clone(), instantiated),
            _ => successor,
        };
        linearizations.push(linearize(handler, &successor)?);
    }

    let mut result = vec![annotation.clone()];
    result.extend(merge(linearizations, annotation)?);
    Ok(result)
}

/// The C3 merge: repeatedly emit a head that appears in no other
/// linearization's tail.
fn merge(mut linearizations: Vec<Vec<Type>>, annotation: &Type) -> Result<Vec<Type>> {
    let mut result = Vec::new();
    loop {
        linearizations.retain(|linearization| !linearization.is_empty());
        if linearizations.is_empty() {
            return Ok(result);
        }
        let valid_head = linearizations
            .iter()
            .map(|linearization| linearization[0].clone())
            .find(|head| {
                linearizations
                    .iter()
                    .all(|other| !other[1..].contains(head))
            });
        match valid_head {
            Some(head) => {
                result.push(head.clone());
                for linearization in &mut linearizations {
                    if linearization[0] == head {
                        linearization.remove(0);
                    }
                }
            }
            None => {
                return Err(Box::new(Error::inconsistent_method_resolution_order(
                    annotation.clone(),
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::store::{TypeOrder, connect, insert};

    #[test]
    fn test_linearization_keeps_self_as_head() {
        let mut order = TypeOrder::new();
        for name in ["a.A", "object"] {
            insert(&mut order, Type::primitive(name));
        }
        connect(&mut order, &Type::primitive("a.A"), &Type::primitive("object"), vec![]);
        let linearized = method_resolution_order(&order, &Type::primitive("a.A")).unwrap();
        assert_eq!(linearized[0], Type::primitive("a.A"));
        assert!(!successors(&order, &Type::primitive("a.A"))
            .unwrap()
            .contains(&Type::primitive("a.A")));
    }

    #[test]
    fn test_diamond_linearization() {
        let mut order = TypeOrder::new();
        for name in ["a.A", "a.B", "a.C", "object"] {
            insert(&mut order, Type::primitive(name));
        }
        // C derives from A then B; both derive from object.
        connect(&mut order, &Type::primitive("a.C"), &Type::primitive("a.A"), vec![]);
        connect(&mut order, &Type::primitive("a.C"), &Type::primitive("a.B"), vec![]);
        connect(&mut order, &Type::primitive("a.A"), &Type::primitive("object"), vec![]);
        connect(&mut order, &Type::primitive("a.B"), &Type::primitive("object"), vec![]);
        assert_eq!(
            successors(&order, &Type::primitive("a.C")).unwrap(),
            vec![
                Type::primitive("a.A"),
                Type::primitive("a.B"),
                Type::primitive("object"),
            ]
        );
    }

    #[test]
    fn test_untracked_linearization() {
        let order = TypeOrder::new();
        assert!(successors(&order, &Type::primitive("missing")).is_err());
    }
}
