//! Selector dispatch: explicit optics first, derivation as fallback.
//!
//! Hand-written optics can be registered for a `(type, selector)` pair.
//! The entry points here ([`lens`], [`optional`], [`prism`],
//! [`field_optic`]) consult the registry before deriving anything, so
//! an explicit optic always wins over the generic one, typically
//! because the derived behavior is wrong for one particular field, or
//! because a constructor is too wide for derivation.
//!
//! Registration is keyed by the selector's canonical spelling:
//! constructor selectors carry their leading underscore, so a field
//! named `Dog` and a constructor `Dog` occupy distinct keys.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::generic::error::DeriveError;
use crate::generic::path::Selector;
use crate::generic::shape::Structural;
use crate::generic::synth::{
    DerivedLens, DerivedOptional, DerivedPrism, VariantPayload, derive_lens, derive_optional,
    derive_prism,
};
use crate::optics::{Lens, Optional, Prism};

static REGISTRY: LazyLock<RwLock<HashMap<(TypeId, String), Arc<dyn Any + Send + Sync>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

fn registry_key<S: Any>(selector: &Selector) -> (TypeId, String) {
    (TypeId::of::<S>(), selector.display())
}

fn registered<S: Any, O: Any + Send + Sync + Clone>(selector: &Selector) -> Option<O> {
    REGISTRY
        .read()
        .get(&registry_key::<S>(selector))
        .and_then(|entry| entry.downcast_ref::<O>())
        .cloned()
}

/// Registers an explicit lens for a selector, overriding derivation.
///
/// A later registration for the same selector replaces the earlier
/// one.
pub fn register_lens<S, A, L>(selector: &str, lens: L)
where
    S: Any,
    A: Any,
    L: Lens<S, A> + Send + Sync + 'static,
{
    let shared = Arc::new(lens);
    let view_handle = Arc::clone(&shared);
    let carrier = DerivedLens::from_fns(
        move |source: &S| view_handle.view(source),
        move |source: S, value: A| shared.set(source, value),
    );
    REGISTRY.write().insert(
        registry_key::<S>(&Selector::parse(selector)),
        Arc::new(carrier),
    );
}

/// Registers an explicit affine optic for a selector, overriding
/// derivation.
pub fn register_optional<S, A, O>(selector: &str, optional: O)
where
    S: Any,
    A: Any,
    O: Optional<S, A> + Send + Sync + 'static,
{
    let shared = Arc::new(optional);
    let get_handle = Arc::clone(&shared);
    let carrier = DerivedOptional::from_fns(
        move |source: &S| get_handle.get_option(source),
        move |source: S, value: A| shared.set(source, value),
    );
    REGISTRY.write().insert(
        registry_key::<S>(&Selector::parse(selector)),
        Arc::new(carrier),
    );
}

/// Registers an explicit prism for a constructor, overriding
/// derivation. The leading underscore in the name is optional.
pub fn register_prism<S, P, Pr>(constructor: &str, prism: Pr)
where
    S: Any,
    P: Any,
    Pr: Prism<S, P> + Send + Sync + 'static,
{
    let name = constructor.strip_prefix('_').unwrap_or(constructor);
    let shared = Arc::new(prism);
    let matching_handle = Arc::clone(&shared);
    let carrier = DerivedPrism::from_fns(
        move |source: S| matching_handle.matching(source),
        move |value: P| shared.review(value),
    );
    REGISTRY.write().insert(
        registry_key::<S>(&Selector::Constructor(name.to_owned())),
        Arc::new(carrier),
    );
}

/// Returns a total lens for the selector: the registered one if any,
/// a derived one otherwise.
pub fn lens<S, A>(selector: &str) -> Result<DerivedLens<S, A>, DeriveError>
where
    S: Structural,
    A: Any + Clone,
{
    let parsed = Selector::parse(selector);
    if let Some(explicit) = registered::<S, DerivedLens<S, A>>(&parsed) {
        return Ok(explicit);
    }
    derive_lens::<S, A>(&parsed)
}

/// Returns an affine optic for the selector: the registered one if
/// any (a registered lens also qualifies), a derived one otherwise.
pub fn optional<S, A>(selector: &str) -> Result<DerivedOptional<S, A>, DeriveError>
where
    S: Structural,
    A: Any + Clone,
{
    let parsed = Selector::parse(selector);
    if let Some(explicit) = registered::<S, DerivedOptional<S, A>>(&parsed) {
        return Ok(explicit);
    }
    if let Some(total) = registered::<S, DerivedLens<S, A>>(&parsed) {
        let view_handle = total.clone();
        return Ok(DerivedOptional::from_fns(
            move |source: &S| Some(view_handle.view(source)),
            move |source: S, value: A| total.set(source, value),
        ));
    }
    derive_optional::<S, A>(&parsed)
}

/// Returns a prism for the constructor: the registered one if any, a
/// derived one otherwise. The leading underscore is optional.
pub fn prism<S, P>(constructor: &str) -> Result<DerivedPrism<S, P>, DeriveError>
where
    S: Structural,
    P: VariantPayload,
{
    let name = constructor.strip_prefix('_').unwrap_or(constructor);
    let parsed = Selector::Constructor(name.to_owned());
    if let Some(explicit) = registered::<S, DerivedPrism<S, P>>(&parsed) {
        return Ok(explicit);
    }
    derive_prism::<S, P>(name)
}

/// Returns a registered prism without attempting derivation.
///
/// Unlike [`prism`], the payload type is unconstrained, so this also
/// retrieves prisms registered for constructors too wide to derive.
#[must_use]
pub fn registered_prism<S, P>(constructor: &str) -> Option<DerivedPrism<S, P>>
where
    S: Any,
    P: Any,
{
    let name = constructor.strip_prefix('_').unwrap_or(constructor);
    registered::<S, DerivedPrism<S, P>>(&Selector::Constructor(name.to_owned()))
}

/// The optic a field selector yields: total when the field exists in
/// every constructor, affine otherwise.
pub enum FieldOptic<S, A> {
    /// The field exists in every constructor.
    Total(DerivedLens<S, A>),
    /// The field exists in some constructors only.
    Affine(DerivedOptional<S, A>),
}

impl<S, A> FieldOptic<S, A> {
    /// Reads the field; `None` only for an affine optic on a
    /// constructor without the field.
    #[must_use]
    pub fn get(&self, source: &S) -> Option<A> {
        match self {
            Self::Total(lens) => Some(lens.view(source)),
            Self::Affine(optional) => optional.get_option(source),
        }
    }

    /// Replaces the field; identity for an affine optic on a
    /// constructor without the field.
    #[must_use]
    pub fn set(&self, source: S, value: A) -> S {
        match self {
            Self::Total(lens) => lens.set(source, value),
            Self::Affine(optional) => optional.set(source, value),
        }
    }

    /// Whether the optic is total.
    #[must_use]
    pub const fn is_total(&self) -> bool {
        matches!(self, Self::Total(_))
    }
}

impl<S, A> Clone for FieldOptic<S, A> {
    fn clone(&self) -> Self {
        match self {
            Self::Total(lens) => Self::Total(lens.clone()),
            Self::Affine(optional) => Self::Affine(optional.clone()),
        }
    }
}

impl<S, A> std::fmt::Debug for FieldOptic<S, A> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Total(_) => formatter.write_str("FieldOptic::Total(..)"),
            Self::Affine(_) => formatter.write_str("FieldOptic::Affine(..)"),
        }
    }
}

/// Returns the strongest optic a field selector supports: a total
/// lens when the field exists everywhere, an affine optic when it is
/// partial. Registered optics win in the same order.
pub fn field_optic<S, A>(selector: &str) -> Result<FieldOptic<S, A>, DeriveError>
where
    S: Structural,
    A: Any + Clone,
{
    let parsed = Selector::parse(selector);
    if let Some(explicit) = registered::<S, DerivedLens<S, A>>(&parsed) {
        return Ok(FieldOptic::Total(explicit));
    }
    if let Some(explicit) = registered::<S, DerivedOptional<S, A>>(&parsed) {
        return Ok(FieldOptic::Affine(explicit));
    }
    match derive_lens::<S, A>(&parsed) {
        Ok(total) => Ok(FieldOptic::Total(total)),
        Err(DeriveError::PartialField { .. }) => {
            derive_optional::<S, A>(&parsed).map(FieldOptic::Affine)
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::shape::{
        FieldShape, Repr, Shape, TypeInfo, interned_shape, take_leaf,
    };
    use crate::optics::FunctionLens;

    #[derive(Clone, Debug, PartialEq)]
    struct Celsius {
        degrees: f64,
        sensor: String,
    }

    impl Structural for Celsius {
        fn shape() -> &'static Shape {
            interned_shape::<Self>(|| {
                Shape::Product(vec![
                    FieldShape::named("degrees", Shape::Leaf(TypeInfo::opaque::<f64>())),
                    FieldShape::named("sensor", Shape::Leaf(TypeInfo::opaque::<String>())),
                ])
            })
        }

        fn into_repr(self) -> Repr {
            Repr::product(vec![Repr::leaf(self.degrees), Repr::leaf(self.sensor)])
        }

        fn from_repr(repr: Repr) -> Option<Self> {
            let Repr::Product(children) = repr else {
                return None;
            };
            let mut children = children.into_iter();
            Some(Self {
                degrees: take_leaf(children.next()?)?,
                sensor: take_leaf(children.next()?)?,
            })
        }
    }

    #[test]
    fn test_explicit_lens_beats_derived() {
        // A registered lens that clamps on write, unlike the derived
        // field access.
        register_lens(
            "degrees",
            FunctionLens::new(
                |source: &Celsius| source.degrees,
                |source: Celsius, value: f64| Celsius {
                    degrees: value.clamp(-273.15, 1000.0),
                    ..source
                },
            ),
        );

        let clamped = lens::<Celsius, f64>("degrees").unwrap();
        let reading = Celsius {
            degrees: 20.0,
            sensor: "probe-a".to_owned(),
        };
        assert_eq!(clamped.set(reading, -400.0).degrees, -273.15);
    }

    #[test]
    fn test_derived_fallback_when_unregistered() {
        let sensor = lens::<Celsius, String>("sensor").unwrap();
        let reading = Celsius {
            degrees: 20.0,
            sensor: "probe-a".to_owned(),
        };
        assert_eq!(sensor.view(&reading), "probe-a");
    }

    #[test]
    fn test_registered_wrong_focus_type_falls_through() {
        // The "degrees" registration targets f64; requesting a String
        // focus must not pick it up.
        let error = lens::<Celsius, u8>("degrees").unwrap_err();
        assert!(matches!(error, DeriveError::FocusMismatch { .. }));
    }

    #[test]
    fn test_field_optic_total_for_product() {
        let optic = field_optic::<Celsius, String>("sensor").unwrap();
        assert!(optic.is_total());
        let reading = Celsius {
            degrees: 20.0,
            sensor: "probe-a".to_owned(),
        };
        assert_eq!(optic.get(&reading), Some("probe-a".to_owned()));
    }

    #[test]
    fn test_unknown_selector_reports_not_found() {
        let error = lens::<Celsius, f64>("humidity").unwrap_err();
        assert_eq!(
            error,
            DeriveError::SelectorNotFound {
                type_name: std::any::type_name::<Celsius>(),
                selector: "humidity".to_owned(),
            }
        );
    }
}
