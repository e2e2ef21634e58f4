//! Structural descriptions for common containers.
//!
//! Containers of structurally described elements are themselves
//! structurally described, so deep traversals reach through them.
//! `Vec` is described as a cons list, nil or head-plus-tail, which
//! keeps conversion lazy: each level is unfolded only when a traversal
//! actually enters it. `Option` mirrors its two constructors and `Box`
//! is a single-field wrapper whose content counts as an occurrence of
//! the boxed type.
//!
//! Containers of opaque elements (for example `Vec<u32>`) stay opaque:
//! element types must implement [`Structural`] for the container
//! description to exist.

use crate::generic::shape::{
    FieldShape, Repr, Shape, Structural, VariantShape, interned_shape, take_leaf, take_repr,
};

impl<T: Structural> Structural for Vec<T> {
    fn shape() -> &'static Shape {
        interned_shape::<Self>(|| {
            Shape::Sum(vec![
                VariantShape::new("Nil", Shape::Unit),
                VariantShape::new(
                    "Cons",
                    Shape::Product(vec![
                        FieldShape::unnamed(Shape::Leaf(T::type_info())),
                        FieldShape::unnamed(Shape::Leaf(Self::type_info())),
                    ]),
                ),
            ])
        })
    }

    fn into_repr(mut self) -> Repr {
        if self.is_empty() {
            Repr::variant(0, Repr::Unit)
        } else {
            let tail = self.split_off(1);
            let head = self.remove(0);
            Repr::variant(
                1,
                Repr::product(vec![Repr::leaf(head), Repr::leaf(tail)]),
            )
        }
    }

    fn from_repr(repr: Repr) -> Option<Self> {
        let Repr::Variant { tag, fields } = repr else {
            return None;
        };
        match (tag, take_repr(fields)) {
            (0, Repr::Unit) => Some(Self::new()),
            (1, Repr::Product(children)) => {
                let mut children = children.into_iter();
                let head: T = take_leaf(children.next()?)?;
                let mut tail: Self = take_leaf(children.next()?)?;
                tail.insert(0, head);
                Some(tail)
            }
            _ => None,
        }
    }
}

impl<T: Structural> Structural for Option<T> {
    fn shape() -> &'static Shape {
        interned_shape::<Self>(|| {
            Shape::Sum(vec![
                VariantShape::new("None", Shape::Unit),
                VariantShape::new(
                    "Some",
                    Shape::Product(vec![FieldShape::unnamed(Shape::Leaf(T::type_info()))]),
                ),
            ])
        })
    }

    fn into_repr(self) -> Repr {
        match self {
            None => Repr::variant(0, Repr::Unit),
            Some(value) => Repr::variant(1, Repr::product(vec![Repr::leaf(value)])),
        }
    }

    fn from_repr(repr: Repr) -> Option<Self> {
        let Repr::Variant { tag, fields } = repr else {
            return None;
        };
        match (tag, take_repr(fields)) {
            (0, Repr::Unit) => Some(None),
            (1, Repr::Product(children)) => {
                let mut children = children.into_iter();
                Some(Some(take_leaf(children.next()?)?))
            }
            _ => None,
        }
    }
}

impl<T: Structural> Structural for Box<T> {
    fn shape() -> &'static Shape {
        interned_shape::<Self>(|| {
            Shape::Product(vec![FieldShape::unnamed(Shape::Leaf(T::type_info()))])
        })
    }

    fn into_repr(self) -> Repr {
        Repr::product(vec![Repr::leaf(*self)])
    }

    fn from_repr(repr: Repr) -> Option<Self> {
        let Repr::Product(children) = repr else {
            return None;
        };
        let mut children = children.into_iter();
        Some(Self::new(take_leaf(children.next()?)?))
    }
}

#[cfg(test)]
mod tests {
    use std::any::TypeId;

    use super::*;
    use crate::generic::plate::plate;
    use crate::generic::shape::TypeInfo;

    #[derive(Clone, Debug, PartialEq)]
    struct Node {
        value: i32,
        children: Vec<Node>,
    }

    impl Structural for Node {
        fn shape() -> &'static Shape {
            interned_shape::<Self>(|| {
                Shape::Product(vec![
                    FieldShape::named("value", Shape::Leaf(TypeInfo::opaque::<i32>())),
                    FieldShape::named("children", Shape::Leaf(Vec::<Self>::type_info())),
                ])
            })
        }

        fn into_repr(self) -> Repr {
            Repr::product(vec![Repr::leaf(self.value), Repr::leaf(self.children)])
        }

        fn from_repr(repr: Repr) -> Option<Self> {
            let Repr::Product(children) = repr else {
                return None;
            };
            let mut children = children.into_iter();
            Some(Self {
                value: take_leaf(children.next()?)?,
                children: take_leaf(children.next()?)?,
            })
        }
    }

    fn leaf_node(value: i32) -> Node {
        Node {
            value,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_vec_repr_round_trip() {
        let list = vec![leaf_node(1), leaf_node(2), leaf_node(3)];
        assert_eq!(Vec::<Node>::from_repr(list.clone().into_repr()), Some(list));
    }

    #[test]
    fn test_empty_vec_is_nil() {
        let empty: Vec<Node> = Vec::new();
        let Repr::Variant { tag, .. } = empty.into_repr() else {
            panic!("variant expected");
        };
        assert_eq!(tag, 0);
    }

    #[test]
    fn test_option_repr_round_trip() {
        let some = Some(leaf_node(7));
        assert_eq!(Option::<Node>::from_repr(some.clone().into_repr()), Some(some));
        let none: Option<Node> = None;
        assert_eq!(Option::<Node>::from_repr(none.clone().into_repr()), Some(none));
    }

    #[test]
    fn test_box_content_counts_as_occurrence() {
        let Shape::Product(fields) = Box::<Node>::shape() else {
            panic!("product expected");
        };
        let Shape::Leaf(info) = &fields[0].shape else {
            panic!("leaf expected");
        };
        assert_eq!(info.id, TypeId::of::<Node>());
    }

    #[test]
    fn test_plate_recurses_through_vec() {
        let tree = Node {
            value: 1,
            children: vec![
                Node {
                    value: 2,
                    children: vec![leaf_node(4)],
                },
                leaf_node(3),
            ],
        };

        let values = plate::<Node, i32>();
        assert_eq!(values.get_all(&tree), vec![1, 2, 4, 3]);

        let incremented = values.modify_all(tree, |value| value + 10);
        assert_eq!(incremented.value, 11);
        assert_eq!(incremented.children[0].children[0].value, 14);
        assert_eq!(incremented.children[1].value, 13);
    }

    #[test]
    fn test_plate_collects_subtrees_without_entering_them() {
        let tree = Node {
            value: 1,
            children: vec![leaf_node(2), leaf_node(3)],
        };

        let subtrees = plate::<Node, Node>();
        // The root is not an occurrence; each direct and nested child
        // is, and matched subtrees are not entered further.
        assert_eq!(subtrees.get_all(&tree), vec![leaf_node(2), leaf_node(3)]);
    }
}
