//! End-to-end scenarios against the seeded engine.

use pyrite::diagnostics::Error;
use pyrite::order::{
    Builder, ConstraintMap, Handler, Order, check_integrity, connect, insert, join,
    less_or_equal, meet, simulate_signature_select, solve_constraints, successors,
};
use pyrite::types::{
    Callable, Overload, Parameter, Type, Variable, Variance,
};

fn primitive(name: &str) -> Type {
    Type::primitive(name)
}

#[test]
fn numeric_tower_subtyping() {
    let handler = Builder::default();
    let order = Order::without_callbacks(&handler);
    assert!(less_or_equal(&order, &primitive("int"), &primitive("float")).unwrap());
    assert!(!less_or_equal(&order, &primitive("float"), &primitive("int")).unwrap());
    assert!(less_or_equal(&order, &primitive("int"), &primitive("numbers.Number")).unwrap());
}

#[test]
fn join_and_meet_of_unrelated_primitives() {
    let handler = Builder::default();
    let order = Order::without_callbacks(&handler);
    assert_eq!(
        join(&order, &primitive("int"), &primitive("str")),
        primitive("object")
    );
    assert_eq!(meet(&order, &primitive("int"), &primitive("str")), Type::Bottom);
}

fn order_with_generic_class(variance: Variance) -> impl Handler {
    let mut handler = Builder::default();
    insert(&mut handler, primitive("a.B"));
    insert(&mut handler, primitive("a.A"));
    connect(&mut handler, &Type::Bottom, &primitive("a.A"), vec![]);
    connect(&mut handler, &primitive("a.A"), &primitive("a.B"), vec![]);
    connect(
        &mut handler,
        &primitive("a.B"),
        &primitive("typing.Generic"),
        vec![Type::Variable(Variable::new("_T").with_variance(variance))],
    );
    connect(&mut handler, &primitive("a.B"), &primitive("object"), vec![]);
    handler
}

#[test]
fn generic_parameters_respect_variance() {
    let handler = order_with_generic_class(Variance::Invariant);
    let order = Order::without_callbacks(&handler);
    let b_int = Type::parametric("a.B", vec![primitive("int")]);
    let b_float = Type::parametric("a.B", vec![primitive("float")]);
    assert!(less_or_equal(&order, &b_int, &b_int).unwrap());
    assert!(!less_or_equal(&order, &b_int, &b_float).unwrap());

    let covariant_handler = order_with_generic_class(Variance::Covariant);
    let order = Order::without_callbacks(&covariant_handler);
    assert!(less_or_equal(&order, &b_int, &b_float).unwrap());
    assert!(!less_or_equal(&order, &b_float, &b_int).unwrap());
}

#[test]
fn optionals() {
    let handler = Builder::default();
    let order = Order::without_callbacks(&handler);
    let int = primitive("int");
    let float = primitive("float");
    assert!(less_or_equal(
        &order,
        &Type::optional(int.clone()),
        &Type::optional(float.clone())
    )
    .unwrap());
    assert!(less_or_equal(&order, &int, &Type::optional(int.clone())).unwrap());
    assert!(!less_or_equal(&order, &Type::optional(int.clone()), &int).unwrap());
}

#[test]
fn tuples() {
    let handler = Builder::default();
    let order = Order::without_callbacks(&handler);
    let int = primitive("int");
    let float = primitive("float");
    assert!(less_or_equal(
        &order,
        &Type::tuple(vec![int.clone(), int.clone()]),
        &Type::tuple(vec![float.clone(), float.clone()])
    )
    .unwrap());
    assert!(less_or_equal(
        &order,
        &Type::tuple(vec![int.clone(), int.clone()]),
        &Type::unbounded_tuple(int.clone())
    )
    .unwrap());
    assert!(less_or_equal(
        &order,
        &Type::tuple(vec![]),
        &Type::unbounded_tuple(int.clone())
    )
    .unwrap());
    assert!(!less_or_equal(
        &order,
        &Type::tuple(vec![float.clone(), float]),
        &Type::unbounded_tuple(int)
    )
    .unwrap());
}

#[test]
fn signature_selection() {
    let handler = Builder::default();
    let order = Order::without_callbacks(&handler);
    let callable = Callable::named(
        "foo",
        Overload::new(
            primitive("int"),
            vec![Parameter::named("x", primitive("int"))],
        ),
    );
    let called_as_int = Overload::new(
        primitive("int"),
        vec![Parameter::named("$0", primitive("int"))],
    );
    let selected = simulate_signature_select(&order, &callable, &called_as_int)
        .unwrap()
        .unwrap();
    assert_eq!(selected.annotation, primitive("int"));

    let called_as_str = Overload::new(
        primitive("int"),
        vec![Parameter::named("$0", primitive("str"))],
    );
    assert!(simulate_signature_select(&order, &callable, &called_as_str)
        .unwrap()
        .is_none());
}

#[test]
fn successors_follow_instantiated_linearization() {
    let mut handler = Builder::create();
    for name in ["a.A", "a.B", "a.C", "object", "typing.Generic"] {
        insert(&mut handler, primitive(name));
    }
    let variable = Type::variable("_T");
    connect(
        &mut handler,
        &primitive("a.C"),
        &primitive("a.B"),
        vec![primitive("int")],
    );
    connect(
        &mut handler,
        &primitive("a.B"),
        &primitive("typing.Generic"),
        vec![variable.clone()],
    );
    connect(
        &mut handler,
        &primitive("a.B"),
        &primitive("a.A"),
        vec![variable.clone()],
    );
    connect(
        &mut handler,
        &primitive("a.A"),
        &primitive("typing.Generic"),
        vec![variable],
    );
    connect(&mut handler, &primitive("a.A"), &primitive("object"), vec![]);

    assert_eq!(
        successors(&handler, &primitive("a.C")).unwrap(),
        vec![
            Type::parametric("a.B", vec![primitive("int")]),
            Type::parametric("a.A", vec![primitive("int")]),
            primitive("object"),
        ]
    );
}

#[test]
fn constraint_solving_binds_generic_parameters() {
    let mut handler = Builder::default();
    insert(&mut handler, primitive("list"));
    connect(&mut handler, &Type::Bottom, &primitive("list"), vec![]);
    connect(
        &mut handler,
        &primitive("list"),
        &primitive("typing.Generic"),
        vec![Type::variable("_T")],
    );
    connect(&mut handler, &primitive("list"), &primitive("object"), vec![]);
    let order = Order::without_callbacks(&handler);

    let variable = Type::variable("_T");
    let solved = solve_constraints(
        &order,
        &ConstraintMap::new(),
        &Type::parametric("list", vec![primitive("int")]),
        &Type::parametric("list", vec![variable.clone()]),
    )
    .unwrap();
    assert_eq!(solved.get(&variable), Some(&primitive("int")));

    assert!(solve_constraints(
        &order,
        &ConstraintMap::new(),
        &Type::parametric("list", vec![primitive("int")]),
        &Type::parametric("list", vec![primitive("str")]),
    )
    .is_none());
}

#[test]
fn cyclic_graph_fails_integrity() {
    let mut handler = Builder::create();
    insert(&mut handler, Type::Bottom);
    insert(&mut handler, Type::Top);
    insert(&mut handler, primitive("a.A"));
    insert(&mut handler, primitive("a.B"));
    connect(&mut handler, &primitive("a.A"), &primitive("a.B"), vec![]);
    connect(&mut handler, &primitive("a.B"), &primitive("a.A"), vec![]);
    assert_eq!(*check_integrity(&handler).unwrap_err(), Error::Cyclic);
}

#[test]
fn conflicting_bases_fail_linearization() {
    let mut handler = Builder::create();
    for name in ["a.O", "a.A", "a.B", "a.X", "a.Y", "a.Z"] {
        insert(&mut handler, primitive(name));
    }
    connect(&mut handler, &primitive("a.A"), &primitive("a.O"), vec![]);
    connect(&mut handler, &primitive("a.B"), &primitive("a.O"), vec![]);
    connect(&mut handler, &primitive("a.X"), &primitive("a.A"), vec![]);
    connect(&mut handler, &primitive("a.X"), &primitive("a.B"), vec![]);
    connect(&mut handler, &primitive("a.Y"), &primitive("a.B"), vec![]);
    connect(&mut handler, &primitive("a.Y"), &primitive("a.A"), vec![]);
    connect(&mut handler, &primitive("a.Z"), &primitive("a.X"), vec![]);
    connect(&mut handler, &primitive("a.Z"), &primitive("a.Y"), vec![]);
    assert!(matches!(
        *successors(&handler, &primitive("a.Z")).unwrap_err(),
        Error::InconsistentMethodResolutionOrder { .. }
    ));
}

#[test]
fn queries_do_not_mutate_the_graph() {
    let handler = Builder::default();
    let before = pyrite::order::to_dot(&handler);
    let order = Order::without_callbacks(&handler);
    let _ = less_or_equal(&order, &primitive("int"), &primitive("float"));
    let _ = join(&order, &primitive("int"), &primitive("str"));
    let _ = meet(&order, &primitive("int"), &primitive("str"));
    let _ = successors(&handler, &primitive("int"));
    assert_eq!(before, pyrite::order::to_dot(&handler));
}
