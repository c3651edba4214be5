//! Quantified invariants of the order, checked against the seeded engine.

use proptest::prelude::*;
use pyrite::order::{
    Builder, Handler, Order, insert, join, less_or_equal, meet, method_resolution_order,
    normalize, successors,
};
use pyrite::types::Type;

fn tracked_annotations() -> Vec<Type> {
    let handler = Builder::default();
    handler
        .keys()
        .into_iter()
        .filter_map(|index| handler.find_annotation(index))
        .collect()
}

/// Structural terms over the seeded primitives.
fn structured_type() -> impl Strategy<Value = Type> {
    let leaf = prop_oneof![
        Just(Type::primitive("int")),
        Just(Type::primitive("float")),
        Just(Type::primitive("complex")),
        Just(Type::primitive("str")),
        Just(Type::primitive("object")),
        Just(Type::Bottom),
        Just(Type::Any),
    ];
    leaf.prop_recursive(2, 8, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::optional),
            prop::collection::vec(inner.clone(), 1..3).prop_map(Type::union),
            prop::collection::vec(inner.clone(), 0..3).prop_map(Type::tuple),
            inner.prop_map(Type::unbounded_tuple),
        ]
    })
}

/// Equivalence in the order: mutual subtyping or structural equality.
fn equivalent(order: &Order<'_>, left: &Type, right: &Type) -> bool {
    left == right
        || (less_or_equal(order, left, right).unwrap_or(false)
            && less_or_equal(order, right, left).unwrap_or(false))
}

#[test]
fn reflexivity_over_tracked_annotations() {
    let handler = Builder::default();
    let order = Order::without_callbacks(&handler);
    for annotation in tracked_annotations() {
        assert!(
            less_or_equal(&order, &annotation, &annotation).unwrap(),
            "{annotation} is not below itself"
        );
    }
}

#[test]
fn bottom_and_top_bound_tracked_annotations() {
    let handler = Builder::default();
    let order = Order::without_callbacks(&handler);
    for annotation in tracked_annotations() {
        if annotation.contains_undeclared() {
            continue;
        }
        assert!(less_or_equal(&order, &Type::Bottom, &annotation).unwrap());
        assert!(
            less_or_equal(&order, &annotation, &Type::Top).unwrap(),
            "{annotation} is not below Top"
        );
    }
}

#[test]
fn any_saturates_from_the_right_only() {
    let handler = Builder::default();
    let order = Order::without_callbacks(&handler);
    assert!(less_or_equal(&order, &Type::Any, &Type::Any).unwrap());
    for annotation in tracked_annotations() {
        if annotation == Type::Top {
            continue;
        }
        assert!(less_or_equal(&order, &annotation, &Type::Any).unwrap());
        assert_eq!(
            less_or_equal(&order, &Type::Any, &annotation).unwrap(),
            annotation == Type::Any
        );
    }
}

#[test]
fn linearizations_keep_the_annotation_as_head() {
    let handler = Builder::default();
    for annotation in tracked_annotations() {
        let linearized = method_resolution_order(&handler, &annotation).unwrap();
        assert_eq!(linearized[0], annotation);
        assert!(!successors(&handler, &annotation).unwrap().contains(&annotation));
    }
}

#[test]
fn normalize_leaves_exactly_one_backedge_per_edge() {
    let mut handler = Builder::default();
    normalize(&mut handler);
    for index in handler.keys() {
        for edge in handler.find_edges(index).unwrap_or_default() {
            let mirrored = handler
                .find_backedges(edge.target)
                .unwrap_or_default()
                .into_iter()
                .filter(|backedge| {
                    backedge.target == index && backedge.parameters == edge.parameters
                })
                .count();
            assert_eq!(mirrored, 1);
        }
    }
}

#[test]
fn insert_is_idempotent_over_tracked_annotations() {
    let mut handler = Builder::default();
    let before: Vec<(Type, usize)> = tracked_annotations()
        .into_iter()
        .map(|annotation| {
            let index = handler.find_index(&annotation).unwrap();
            (annotation, index)
        })
        .collect();
    let length = handler.length();
    for (annotation, _) in &before {
        insert(&mut handler, annotation.clone());
    }
    assert_eq!(handler.length(), length);
    for (annotation, index) in before {
        assert_eq!(handler.find_index(&annotation), Some(index));
    }
}

proptest! {
    #[test]
    fn join_bounds_both_operands(left in structured_type(), right in structured_type()) {
        let handler = Builder::default();
        let order = Order::without_callbacks(&handler);
        let joined = join(&order, &left, &right);
        prop_assert!(less_or_equal(&order, &left, &joined).unwrap_or(false));
        prop_assert!(less_or_equal(&order, &right, &joined).unwrap_or(false));
    }

    #[test]
    fn meet_bounds_both_operands(left in structured_type(), right in structured_type()) {
        let handler = Builder::default();
        let order = Order::without_callbacks(&handler);
        let met = meet(&order, &left, &right);
        prop_assert!(less_or_equal(&order, &met, &left).unwrap_or(false));
        prop_assert!(less_or_equal(&order, &met, &right).unwrap_or(false));
    }

    #[test]
    fn join_is_commutative_up_to_equivalence(
        left in structured_type(),
        right in structured_type(),
    ) {
        let handler = Builder::default();
        let order = Order::without_callbacks(&handler);
        let forward = join(&order, &left, &right);
        let backward = join(&order, &right, &left);
        prop_assert!(equivalent(&order, &forward, &backward), "{forward} vs {backward}");
    }

    #[test]
    fn meet_is_commutative_up_to_equivalence(
        left in structured_type(),
        right in structured_type(),
    ) {
        let handler = Builder::default();
        let order = Order::without_callbacks(&handler);
        let forward = meet(&order, &left, &right);
        let backward = meet(&order, &right, &left);
        prop_assert!(equivalent(&order, &forward, &backward), "{forward} vs {backward}");
    }

    #[test]
    fn reflexivity_over_structured_types(annotation in structured_type()) {
        let handler = Builder::default();
        let order = Order::without_callbacks(&handler);
        prop_assert!(less_or_equal(&order, &annotation, &annotation).unwrap());
    }
}
