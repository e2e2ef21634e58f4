//! Property-based tests for derived prism laws.
//!
//! This module verifies that prisms derived from shape descriptions
//! satisfy the required laws:
//!
//! - **MatchReview Law**: `prism.matching(prism.review(value)) == Ok(value)`
//! - **NoMatchIdentity Law**: for a source built by a different
//!   constructor, `prism.matching(source) == Err(source)`: the
//!   untouched original.
//!
//! Using proptest, we generate random inputs to thoroughly verify these
//! laws across a wide range of values.

use proptest::prelude::*;
use refract::Structural;
use refract::generic;

// =============================================================================
// Test Structures
// =============================================================================

#[derive(Clone, PartialEq, Debug, Structural)]
enum Fish {
    GoldFish { name: String },
    Herring { name: String },
}

#[derive(Clone, PartialEq, Debug, Structural)]
enum Event {
    Click { x: i32, y: i32 },
    Key(char),
    Idle,
}

fn event_strategy() -> impl Strategy<Value = Event> {
    prop_oneof![
        (any::<i32>(), any::<i32>()).prop_map(|(x, y)| Event::Click { x, y }),
        any::<char>().prop_map(Event::Key),
        Just(Event::Idle),
    ]
}

// =============================================================================
// MatchReview Law
// =============================================================================

proptest! {
    /// MatchReview Law for a single-field struct variant
    #[test]
    fn prop_herring_match_review_law(name in "[a-z]{1,12}") {
        let herring = generic::prism::<Fish, (String,)>("Herring").unwrap();
        let built = herring.review((name.clone(),));
        prop_assert_eq!(herring.matching(built), Ok((name,)));
    }

    /// MatchReview Law for a two-field struct variant
    #[test]
    fn prop_click_match_review_law(x in any::<i32>(), y in any::<i32>()) {
        let click = generic::prism::<Event, (i32, i32)>("Click").unwrap();
        let built = click.review((x, y));
        prop_assert_eq!(built.clone(), Event::Click { x, y });
        prop_assert_eq!(click.matching(built), Ok((x, y)));
    }

    /// MatchReview Law for a tuple variant
    #[test]
    fn prop_key_match_review_law(key in any::<char>()) {
        let key_prism = generic::prism::<Event, (char,)>("Key").unwrap();
        prop_assert_eq!(key_prism.matching(key_prism.review((key,))), Ok((key,)));
    }
}

// =============================================================================
// NoMatchIdentity Law
// =============================================================================

proptest! {
    /// A non-matching source comes back untouched
    #[test]
    fn prop_no_match_returns_original(event in event_strategy()) {
        let click = generic::prism::<Event, (i32, i32)>("Click").unwrap();
        match (click.matching(event.clone()), event) {
            (Ok((x, y)), Event::Click { x: original_x, y: original_y }) => {
                prop_assert_eq!(x, original_x);
                prop_assert_eq!(y, original_y);
            }
            (Err(returned), original) => prop_assert_eq!(returned, original),
            (Ok(_), other) => prop_assert!(false, "matched non-Click {other:?}"),
        }
    }

    /// GoldFish and Herring prisms partition Fish
    #[test]
    fn prop_fish_prisms_partition(name in "[a-z]{1,12}", is_gold in any::<bool>()) {
        let gold = generic::prism::<Fish, (String,)>("GoldFish").unwrap();
        let herring = generic::prism::<Fish, (String,)>("Herring").unwrap();
        let fish = if is_gold {
            Fish::GoldFish { name: name.clone() }
        } else {
            Fish::Herring { name: name.clone() }
        };
        prop_assert_eq!(gold.matching(fish.clone()).is_ok(), is_gold);
        prop_assert_eq!(herring.matching(fish).is_ok(), !is_gold);
    }
}

// =============================================================================
// Unit constructors
// =============================================================================

#[test]
fn test_unit_constructor_prism() {
    let idle = generic::prism::<Event, ()>("Idle").unwrap();
    assert_eq!(idle.matching(Event::Idle), Ok(()));
    assert_eq!(idle.review(()), Event::Idle);

    let key = Event::Key('a');
    assert_eq!(idle.matching(key.clone()), Err(key));
}

#[test]
fn test_prism_accepts_underscore_prefix() {
    let with_prefix = generic::prism::<Event, ()>("_Idle").unwrap();
    assert_eq!(with_prefix.matching(Event::Idle), Ok(()));
}
