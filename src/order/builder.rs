//! Engine construction and the default seeded graph.

use super::store::{TypeOrder, connect, insert};
use crate::types::{Type, Variable};

/// Constructs engines.
pub struct Builder;

impl Builder {
    /// Creates an empty engine.
    pub fn create() -> TypeOrder {
        TypeOrder::new()
    }

    /// Deep-copies an engine so another thread can query independently.
    pub fn copy(order: &TypeOrder) -> TypeOrder {
        order.clone()
    }

    /// Creates an engine pre-populated with the universal scalars, the
    /// typing special forms, the numeric tower, typed-dictionary plumbing,
    /// and the `type[_T]` generic declaration.
    pub fn default() -> TypeOrder {
        let mut order = Self::create();
        insert(&mut order, Type::Bottom);
        insert(&mut order, Type::Top);

        // Universal scalars.
        span(&mut order, Type::Any);
        span(&mut order, Type::Undeclared);

        // typing special forms.
        for name in [
            "typing.Tuple",
            "typing.Callable",
            "typing.Protocol",
            "typing.Generic",
            "typing.FrozenSet",
            "typing.Optional",
            "typing.TypeVar",
            "typing.Union",
            "typing.NoReturn",
            "typing.ClassVar",
            "typing.NamedTuple",
        ] {
            span(&mut order, Type::primitive(name));
        }

        // Numeric tower.
        chain(
            &mut order,
            &[
                Type::Bottom,
                Type::primitive("int"),
                Type::primitive("float"),
                Type::primitive("complex"),
                Type::primitive("numbers.Complex"),
                Type::primitive("numbers.Number"),
                Type::primitive("object"),
                Type::Top,
            ],
        );

        // str joins the tower at object; the seeded typing.Mapping fallback
        // below also mentions it.
        chain(
            &mut order,
            &[Type::Bottom, Type::primitive("str"), Type::primitive("object")],
        );

        // dict aliases typing.Dict.
        chain(
            &mut order,
            &[
                Type::Bottom,
                Type::primitive("dict"),
                Type::primitive("typing.Dict"),
                Type::Top,
            ],
        );

        span(&mut order, Type::primitive("None"));

        // type[_T] declares a single generic parameter.
        let type_variable = Type::Variable(Variable::new("_T"));
        span(&mut order, Type::primitive("type"));
        connect(
            &mut order,
            &Type::primitive("type"),
            &Type::primitive("typing.Generic"),
            vec![type_variable.clone()],
        );

        // Typed dictionaries behave as mappings from str to Any.
        for name in [
            "NonTotalTypedDictionary",
            "TypedDictionary",
            "typing.Mapping",
        ] {
            insert(&mut order, Type::primitive(name));
        }
        connect(
            &mut order,
            &Type::Bottom,
            &Type::primitive("NonTotalTypedDictionary"),
            vec![],
        );
        connect(
            &mut order,
            &Type::primitive("NonTotalTypedDictionary"),
            &Type::primitive("TypedDictionary"),
            vec![],
        );
        connect(
            &mut order,
            &Type::primitive("TypedDictionary"),
            &Type::primitive("typing.Mapping"),
            vec![Type::primitive("str"), Type::Any],
        );
        connect(
            &mut order,
            &Type::primitive("typing.Mapping"),
            &Type::primitive("typing.Generic"),
            vec![type_variable, Type::Variable(Variable::new("_T2"))],
        );

        // Mock machinery used pervasively in test suites.
        insert(&mut order, Type::primitive("unittest.mock.Base"));
        insert(&mut order, Type::primitive("unittest.mock.NonCallableMock"));
        connect(
            &mut order,
            &Type::Bottom,
            &Type::primitive("unittest.mock.NonCallableMock"),
            vec![],
        );
        connect(
            &mut order,
            &Type::primitive("unittest.mock.NonCallableMock"),
            &Type::primitive("unittest.mock.Base"),
            vec![],
        );
        connect(
            &mut order,
            &Type::primitive("unittest.mock.Base"),
            &Type::Top,
            vec![],
        );

        order
    }
}

/// Inserts an annotation spanned between `Bottom` and `Top`.
fn span(order: &mut TypeOrder, annotation: Type) {
    insert(order, annotation.clone());
    connect(order, &Type::Bottom, &annotation, vec![]);
    connect(order, &annotation, &Type::Top, vec![]);
}

/// Inserts a chain of annotations connected in sequence.
fn chain(order: &mut TypeOrder, annotations: &[Type]) {
    for annotation in annotations {
        insert(order, annotation.clone());
    }
    for pair in annotations.windows(2) {
        connect(order, &pair[0], &pair[1], vec![]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::handler::Handler;

    #[test]
    fn test_default_tracks_seed_content() {
        let order = Builder::default();
        for annotation in [
            Type::Bottom,
            Type::Top,
            Type::Any,
            Type::Undeclared,
            Type::primitive("typing.Tuple"),
            Type::primitive("typing.Callable"),
            Type::primitive("typing.Protocol"),
            Type::primitive("typing.Generic"),
            Type::primitive("typing.FrozenSet"),
            Type::primitive("typing.Optional"),
            Type::primitive("typing.TypeVar"),
            Type::primitive("typing.Union"),
            Type::primitive("typing.NoReturn"),
            Type::primitive("typing.ClassVar"),
            Type::primitive("typing.NamedTuple"),
            Type::primitive("int"),
            Type::primitive("float"),
            Type::primitive("complex"),
            Type::primitive("numbers.Complex"),
            Type::primitive("numbers.Number"),
            Type::primitive("object"),
            Type::primitive("str"),
            Type::primitive("dict"),
            Type::primitive("typing.Dict"),
            Type::primitive("None"),
            Type::primitive("type"),
            Type::primitive("NonTotalTypedDictionary"),
            Type::primitive("TypedDictionary"),
            Type::primitive("typing.Mapping"),
            Type::primitive("unittest.mock.Base"),
            Type::primitive("unittest.mock.NonCallableMock"),
        ] {
            assert!(order.contains(&annotation), "missing {annotation}");
        }
    }

    #[test]
    fn test_copy_is_independent() {
        let original = Builder::default();
        let mut copy = Builder::copy(&original);
        insert(&mut copy, Type::primitive("a.Extra"));
        assert!(copy.contains(&Type::primitive("a.Extra")));
        assert!(!original.contains(&Type::primitive("a.Extra")));
    }
}
