//! Tests for `#[derive(Structural)]`: generated shapes, representation
//! round trips, field attributes, and the optics derived from them.

use std::any::TypeId;

use refract::Structural;
use refract::generic::{self, DeriveError, Repr, Selector, Shape};
use rstest::rstest;

// =============================================================================
// Test Structures
// =============================================================================

#[derive(Clone, PartialEq, Debug, Structural)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Clone, PartialEq, Debug, Structural)]
struct Pair(String, u32);

#[derive(Clone, PartialEq, Debug, Structural)]
struct Marker;

#[derive(Clone, PartialEq, Debug, Structural)]
enum Fish {
    GoldFish { name: String },
    Herring { name: String },
}

#[derive(Clone, PartialEq, Debug, Structural)]
struct Address {
    city: String,
    zip: String,
}

#[derive(Clone, PartialEq, Debug, Structural)]
struct Customer {
    id: u64,
    #[structural(flatten)]
    address: Address,
}

#[derive(Clone, PartialEq, Debug, Structural)]
struct Sealed {
    label: String,
    #[structural(opaque)]
    inner: Point,
}

#[derive(Clone, PartialEq, Debug, Structural)]
struct Container<T> {
    value: T,
    count: usize,
}

// =============================================================================
// Generated shapes
// =============================================================================

#[test]
fn test_struct_shape_lists_fields_in_order() {
    let Shape::Product(fields) = Point::shape() else {
        panic!("product expected");
    };
    assert_eq!(fields[0].name, Some("x"));
    assert_eq!(fields[1].name, Some("y"));
}

#[test]
fn test_tuple_struct_fields_are_unnamed() {
    let Shape::Product(fields) = Pair::shape() else {
        panic!("product expected");
    };
    assert_eq!(fields.len(), 2);
    assert!(fields.iter().all(|field| field.name.is_none()));
}

#[test]
fn test_unit_struct_shape() {
    assert!(matches!(Marker::shape(), Shape::Unit));
    assert_eq!(Marker::from_repr(Marker.into_repr()), Some(Marker));
}

#[test]
fn test_enum_shape_lists_variants_in_order() {
    let Shape::Sum(variants) = Fish::shape() else {
        panic!("sum expected");
    };
    assert_eq!(variants[0].name, "GoldFish");
    assert_eq!(variants[1].name, "Herring");
}

#[test]
fn test_structural_field_carries_recursion_hooks() {
    #[derive(Clone, PartialEq, Debug, Structural)]
    struct Outer {
        point: Point,
    }

    let Shape::Product(fields) = Outer::shape() else {
        panic!("product expected");
    };
    let Shape::Leaf(info) = &fields[0].shape else {
        panic!("leaf expected");
    };
    assert_eq!(info.id, TypeId::of::<Point>());
    assert!(info.structural.is_some());
}

#[test]
fn test_opaque_attribute_removes_recursion_hooks() {
    let Shape::Product(fields) = Sealed::shape() else {
        panic!("product expected");
    };
    let Shape::Leaf(info) = &fields[1].shape else {
        panic!("leaf expected");
    };
    assert_eq!(info.id, TypeId::of::<Point>());
    assert!(info.structural.is_none());
}

#[test]
fn test_generic_parameter_field_is_opaque() {
    let Shape::Product(fields) = Container::<Point>::shape() else {
        panic!("product expected");
    };
    let Shape::Leaf(info) = &fields[0].shape else {
        panic!("leaf expected");
    };
    assert_eq!(info.id, TypeId::of::<Point>());
    assert!(info.structural.is_none());
}

// =============================================================================
// Representation round trips
// =============================================================================

#[rstest]
#[case(Fish::GoldFish { name: "Bubbles".to_owned() })]
#[case(Fish::Herring { name: "Silver".to_owned() })]
fn test_enum_repr_round_trip(#[case] fish: Fish) {
    assert_eq!(Fish::from_repr(fish.clone().into_repr()), Some(fish));
}

#[test]
fn test_tuple_struct_repr_round_trip() {
    let pair = Pair("left".to_owned(), 7);
    assert_eq!(Pair::from_repr(pair.clone().into_repr()), Some(pair));
}

#[test]
fn test_generic_struct_repr_round_trip() {
    let container = Container {
        value: Point { x: 1, y: 2 },
        count: 3,
    };
    assert_eq!(
        Container::from_repr(container.clone().into_repr()),
        Some(container),
    );
}

#[test]
fn test_from_repr_rejects_mismatched_tree() {
    assert_eq!(Point::from_repr(Repr::Unit), None);
    assert_eq!(Fish::from_repr(Repr::product(vec![])), None);
}

// =============================================================================
// Flatten
// =============================================================================

#[test]
fn test_flattened_fields_resolve_by_name() {
    let city = generic::lens::<Customer, String>("city").unwrap();
    let customer = Customer {
        id: 1,
        address: Address {
            city: "Utrecht".to_owned(),
            zip: "3511".to_owned(),
        },
    };
    assert_eq!(city.view(&customer), "Utrecht");

    let moved = city.set(customer, "Leiden".to_owned());
    assert_eq!(moved.address.city, "Leiden");
    assert_eq!(moved.address.zip, "3511");
    assert_eq!(moved.id, 1);
}

#[test]
fn test_flattened_field_name_itself_is_gone() {
    let error = generic::lens::<Customer, Address>("address").unwrap_err();
    assert!(matches!(error, DeriveError::SelectorNotFound { .. }));
}

#[test]
fn test_position_landing_on_flattened_slot_is_invalid() {
    // Customer's second slot is the flattened address, an anonymous
    // nested product rather than a direct field.
    let error = generic::lens::<Customer, Address>("2").unwrap_err();
    assert_eq!(
        error,
        DeriveError::InvalidPosition {
            type_name: std::any::type_name::<Customer>(),
            position: 2,
        }
    );
}

// =============================================================================
// Positional selectors
// =============================================================================

#[test]
fn test_position_selector_on_tuple_struct() {
    let first = generic::lens::<Pair, String>("1").unwrap();
    let second = generic::lens::<Pair, u32>("2").unwrap();
    let pair = Pair("left".to_owned(), 7);
    assert_eq!(first.view(&pair), "left");
    assert_eq!(second.view(&pair), 7);
}

#[test]
fn test_position_one_equals_name_on_herring() {
    // Herring's single field is also its first field, so the
    // positional and the named selector are the same accessor.
    let by_position = generic::lens::<Fish, String>("1").unwrap();
    let by_name = generic::lens::<Fish, String>("name").unwrap();
    let herring = Fish::Herring {
        name: "Silver".to_owned(),
    };
    assert_eq!(by_position.view(&herring), by_name.view(&herring));
    assert_eq!(
        by_position.set(herring.clone(), "Scales".to_owned()),
        by_name.set(herring, "Scales".to_owned()),
    );

    let shape = Fish::shape();
    let positional = generic::resolve("Fish", shape, &Selector::Position(1)).unwrap();
    let named = generic::resolve("Fish", shape, &Selector::parse("name")).unwrap();
    assert_eq!(positional, named);
}

#[rstest]
#[case("0")]
#[case("3")]
fn test_position_out_of_range(#[case] selector: &str) {
    let error = generic::lens::<Pair, String>(selector).unwrap_err();
    assert!(matches!(error, DeriveError::InvalidPosition { .. }));
}

// =============================================================================
// Containers in derived types
// =============================================================================

#[test]
fn test_vec_field_is_structural() {
    #[derive(Clone, PartialEq, Debug, Structural)]
    struct School {
        fishes: Vec<Fish>,
    }

    let Shape::Product(fields) = School::shape() else {
        panic!("product expected");
    };
    let Shape::Leaf(info) = &fields[0].shape else {
        panic!("leaf expected");
    };
    assert_eq!(info.id, TypeId::of::<Vec<Fish>>());
    assert!(info.structural.is_some());

    let school = School {
        fishes: vec![
            Fish::GoldFish { name: "a".to_owned() },
            Fish::Herring { name: "b".to_owned() },
        ],
    };
    assert_eq!(School::from_repr(school.clone().into_repr()), Some(school));
}
