//! Structural shape descriptors and the runtime representation.
//!
//! A [`Shape`] is a tree describing a data type's constructors and
//! fields, mirroring its sum-of-products structure. Every structurally
//! described type maps to exactly one shape, built once and immutable
//! for the type's lifetime. Named types appearing as fields are
//! [`Shape::Leaf`] nodes carrying a [`TypeInfo`]; a leaf is only
//! destructured further when a deep traversal explicitly recurses
//! through its [`StructuralOps`] hooks.
//!
//! A [`Repr`] is the runtime mirror of a shape: the same tree, with
//! actual field values at the leaves. Children are held behind [`Rc`]
//! so that rebuilding a spine after an update reuses every untouched
//! sibling by handle: untouched parts of an updated value are
//! pointer-identical to the original, not reconstructed.
//!
//! The [`Structural`] trait ties a type to its shape and converts
//! values to and from their representation. It is normally implemented
//! via `#[derive(Structural)]`.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::LazyLock;

use parking_lot::RwLock;
use static_assertions::assert_impl_all;

/// Identity of a leaf type within a shape.
///
/// Carries the `TypeId` used for focus-type checks and plate-target
/// matching, the type name for diagnostics, and, when the leaf type is
/// itself structurally described, the erased hooks that let a deep
/// traversal recurse into it.
#[derive(Clone, Copy, Debug)]
pub struct TypeInfo {
    /// The leaf type's `TypeId`.
    pub id: TypeId,
    /// The leaf type's name, for diagnostics.
    pub name: &'static str,
    /// Erased structural hooks, present when the leaf type implements
    /// [`Structural`].
    pub structural: Option<StructuralOps>,
}

impl TypeInfo {
    /// Describes `T` as an opaque leaf: its contents are never
    /// destructured.
    #[must_use]
    pub fn opaque<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            structural: None,
        }
    }
}

/// Erased hooks into a [`Structural`] implementation, stored inside
/// [`TypeInfo`] so shape trees stay free of type parameters.
#[derive(Clone, Copy)]
pub struct StructuralOps {
    /// Returns the described type's shape.
    pub shape: fn() -> &'static Shape,
    /// Converts a value (behind `&dyn Any`) into its representation.
    /// Returns `None` if the value is not of the described type.
    pub to_repr: fn(&dyn Any) -> Option<Repr>,
    /// Rebuilds a value from its representation.
    pub from_repr: fn(Repr) -> Option<Rc<dyn Any>>,
}

impl std::fmt::Debug for StructuralOps {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("StructuralOps").finish_non_exhaustive()
    }
}

/// A tree describing a data type's constructors and fields.
///
/// Invariants:
///
/// - every structurally described type maps to exactly one shape;
/// - field names are unique within one `Sum` alternative;
/// - `Sum` alternatives appear exactly in source declaration order,
///   and `Product` children in field declaration order. The order is
///   load-bearing: it determines left bias during name resolution and
///   the visiting order of traversals.
#[derive(Clone, Debug)]
pub enum Shape {
    /// A single constructor's fields, in declaration order.
    Product(Vec<FieldShape>),
    /// A tagged union of constructors, in declaration order.
    Sum(Vec<VariantShape>),
    /// An opaque or structurally described field type.
    Leaf(TypeInfo),
    /// A constructor with no fields.
    Unit,
}

/// One child of a [`Shape::Product`].
#[derive(Clone, Debug)]
pub struct FieldShape {
    /// The declared field name; `None` for positional fields and
    /// anonymous nested products.
    pub name: Option<&'static str>,
    /// The field's shape.
    pub shape: Shape,
}

impl FieldShape {
    /// A named field.
    #[must_use]
    pub const fn named(name: &'static str, shape: Shape) -> Self {
        Self {
            name: Some(name),
            shape,
        }
    }

    /// A positional field or anonymous nested product.
    #[must_use]
    pub const fn unnamed(shape: Shape) -> Self {
        Self { name: None, shape }
    }
}

/// One alternative of a [`Shape::Sum`].
#[derive(Clone, Debug)]
pub struct VariantShape {
    /// The declared constructor name.
    pub name: &'static str,
    /// The constructor's fields: a `Product`, or `Unit` for a
    /// fieldless constructor.
    pub fields: Shape,
}

impl VariantShape {
    /// Creates a variant descriptor.
    #[must_use]
    pub const fn new(name: &'static str, fields: Shape) -> Self {
        Self { name, fields }
    }
}

assert_impl_all!(Shape: Send, Sync);
assert_impl_all!(TypeInfo: Send, Sync);

/// The runtime mirror of a [`Shape`]: the same tree with field values
/// at the leaves.
///
/// Children are shared behind [`Rc`]. Rebuilding a spine after an
/// update clones only the handles of untouched siblings, so they stay
/// pointer-identical to the original.
#[derive(Clone)]
pub enum Repr {
    /// A fieldless constructor.
    Unit,
    /// A field value.
    Leaf(Rc<dyn Any>),
    /// A constructor's field values, in declaration order.
    Product(Vec<Rc<Repr>>),
    /// A sum value: the active constructor's index and its fields.
    Variant {
        /// Index of the active constructor, in declaration order.
        tag: usize,
        /// The constructor's fields: a `Product` or `Unit`.
        fields: Rc<Repr>,
    },
}

impl Repr {
    /// Wraps a field value as a leaf.
    #[must_use]
    pub fn leaf<T: Any>(value: T) -> Self {
        Self::Leaf(Rc::new(value))
    }

    /// Builds a product from owned children.
    #[must_use]
    pub fn product(children: Vec<Self>) -> Self {
        Self::Product(children.into_iter().map(Rc::new).collect())
    }

    /// Builds a variant from owned fields.
    #[must_use]
    pub fn variant(tag: usize, fields: Self) -> Self {
        Self::Variant {
            tag,
            fields: Rc::new(fields),
        }
    }
}

impl std::fmt::Debug for Repr {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unit => formatter.write_str("Unit"),
            Self::Leaf(_) => formatter.write_str("Leaf(..)"),
            Self::Product(children) => formatter.debug_tuple("Product").field(children).finish(),
            Self::Variant { tag, fields } => formatter
                .debug_struct("Variant")
                .field("tag", tag)
                .field("fields", fields)
                .finish(),
        }
    }
}

/// Takes a representation node out of its shared handle, cloning only
/// when the node is still shared.
#[must_use]
pub fn take_repr(child: Rc<Repr>) -> Repr {
    Rc::try_unwrap(child).unwrap_or_else(|shared| (*shared).clone())
}

/// Extracts a leaf value of type `T` from a representation child.
///
/// Returns `None` when the child is not a leaf or holds a different
/// type.
#[must_use]
pub fn take_leaf<T: Any + Clone>(child: Rc<Repr>) -> Option<T> {
    match take_repr(child) {
        Repr::Leaf(value) => downcast_leaf(value),
        _ => None,
    }
}

/// Extracts a `T` from an erased leaf value.
#[must_use]
pub fn downcast_leaf<T: Any + Clone>(value: Rc<dyn Any>) -> Option<T> {
    value
        .downcast::<T>()
        .ok()
        .map(|shared| Rc::try_unwrap(shared).unwrap_or_else(|still_shared| (*still_shared).clone()))
}

/// Ties a type to its structural description.
///
/// Implementations must keep `shape`, `into_repr` and `from_repr`
/// consistent: `into_repr` produces exactly the tree `shape` describes,
/// and `from_repr` inverts it. Accessors derived from the shape rely on
/// this agreement; a hand-written implementation that violates it may
/// panic inside derived accessors. `#[derive(Structural)]` upholds the
/// contract automatically.
pub trait Structural: Clone + Sized + 'static {
    /// The type's shape, built once and cached for the type's lifetime.
    fn shape() -> &'static Shape;

    /// Converts a value into its representation.
    fn into_repr(self) -> Repr;

    /// Rebuilds a value from its representation.
    ///
    /// Returns `None` when the representation does not match the
    /// type's shape.
    fn from_repr(repr: Repr) -> Option<Self>;

    /// Leaf descriptor for this type, carrying the erased structural
    /// hooks.
    #[must_use]
    fn type_info() -> TypeInfo {
        TypeInfo {
            id: TypeId::of::<Self>(),
            name: type_name::<Self>(),
            structural: Some(StructuralOps {
                shape: Self::shape,
                to_repr: erased_to_repr::<Self>,
                from_repr: erased_from_repr::<Self>,
            }),
        }
    }
}

fn erased_to_repr<T: Structural>(value: &dyn Any) -> Option<Repr> {
    value.downcast_ref::<T>().map(|typed| typed.clone().into_repr())
}

fn erased_from_repr<T: Structural>(repr: Repr) -> Option<Rc<dyn Any>> {
    T::from_repr(repr).map(|value| Rc::new(value) as Rc<dyn Any>)
}

static SHAPES: LazyLock<RwLock<HashMap<TypeId, &'static Shape>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Builds and caches a `'static` shape for `T`.
///
/// The builder runs at most once per concrete `T`; the resulting shape
/// is leaked and reused for the lifetime of the process. This is the
/// backing store for `Structural::shape` implementations, including
/// generic ones (`Vec<T>`, `Option<T>`, …) which cannot carry one
/// static per instantiation themselves.
pub fn interned_shape<T: Any>(build: fn() -> Shape) -> &'static Shape {
    let key = TypeId::of::<T>();
    if let Some(existing) = SHAPES.read().get(&key) {
        return existing;
    }
    let built: &'static Shape = Box::leak(Box::new(build()));
    *SHAPES.write().entry(key).or_insert(built)
}

/// Shape of a field marked `#[structural(flatten)]`: the field type's
/// own product, inlined as an anonymous nested product so its fields
/// participate in name resolution. A flattened type whose shape is not
/// a product falls back to an ordinary leaf.
#[must_use]
pub fn flatten_shape<T: Structural>() -> Shape {
    match T::shape() {
        product @ Shape::Product(_) => product.clone(),
        _ => Shape::Leaf(T::type_info()),
    }
}

/// Representation of a field marked `#[structural(flatten)]`,
/// mirroring [`flatten_shape`].
#[must_use]
pub fn flatten_repr<T: Structural>(value: T) -> Repr {
    match T::shape() {
        Shape::Product(_) => value.into_repr(),
        _ => Repr::leaf(value),
    }
}

/// Rebuilds a field marked `#[structural(flatten)]` from its
/// representation child, mirroring [`flatten_shape`].
#[must_use]
pub fn unflatten<T: Structural>(child: Rc<Repr>) -> Option<T> {
    match T::shape() {
        Shape::Product(_) => T::from_repr(take_repr(child)),
        _ => take_leaf(child),
    }
}

/// Probe used by derived code to classify a field type as structural
/// or opaque at macro-expansion time.
///
/// Method resolution prefers [`StructuralProbe`] (implemented for
/// `&Probe<T>` where `T: Structural`) over [`OpaqueProbe`]
/// (implemented for `Probe<T>` for any `T`), so
/// `(&&Probe::<T>::new()).field_info()` yields the structural
/// descriptor exactly when one exists and falls back to an opaque leaf
/// otherwise.
pub struct Probe<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Probe<T> {
    /// Creates a probe for `T`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Probe<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Probe outcome for structurally described field types.
pub trait StructuralProbe {
    /// Leaf descriptor with structural hooks.
    fn field_info(&self) -> TypeInfo;
}

impl<T: Structural> StructuralProbe for &Probe<T> {
    fn field_info(&self) -> TypeInfo {
        T::type_info()
    }
}

/// Probe fallback for opaque field types.
pub trait OpaqueProbe {
    /// Opaque leaf descriptor.
    fn field_info(&self) -> TypeInfo;
}

impl<T: Any> OpaqueProbe for Probe<T> {
    fn field_info(&self) -> TypeInfo {
        TypeInfo::opaque::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Pair {
        left: u32,
        right: u32,
    }

    impl Structural for Pair {
        fn shape() -> &'static Shape {
            interned_shape::<Self>(|| {
                Shape::Product(vec![
                    FieldShape::named("left", Shape::Leaf(TypeInfo::opaque::<u32>())),
                    FieldShape::named("right", Shape::Leaf(TypeInfo::opaque::<u32>())),
                ])
            })
        }

        fn into_repr(self) -> Repr {
            Repr::product(vec![Repr::leaf(self.left), Repr::leaf(self.right)])
        }

        fn from_repr(repr: Repr) -> Option<Self> {
            let Repr::Product(children) = repr else {
                return None;
            };
            let mut children = children.into_iter();
            let left = take_leaf::<u32>(children.next()?)?;
            let right = take_leaf::<u32>(children.next()?)?;
            Some(Self { left, right })
        }
    }

    #[test]
    fn test_repr_round_trip() {
        let pair = Pair { left: 1, right: 2 };
        let repr = pair.clone().into_repr();
        assert_eq!(Pair::from_repr(repr), Some(pair));
    }

    #[test]
    fn test_shape_is_interned_once() {
        assert!(std::ptr::eq(Pair::shape(), Pair::shape()));
    }

    #[test]
    fn test_probe_prefers_structural() {
        #[allow(unused_imports)]
        use super::{OpaqueProbe as _, StructuralProbe as _};

        let structural = (&&Probe::<Pair>::new()).field_info();
        assert!(structural.structural.is_some());

        let opaque = (&&Probe::<String>::new()).field_info();
        assert!(opaque.structural.is_none());
        assert_eq!(opaque.id, TypeId::of::<String>());
    }

    #[test]
    fn test_take_leaf_rejects_wrong_type() {
        let child = Rc::new(Repr::leaf(7_u32));
        assert_eq!(take_leaf::<String>(child), None);
    }

    #[test]
    fn test_type_info_hooks_round_trip() {
        let info = Pair::type_info();
        let ops = info.structural.expect("Pair is structural");
        let pair = Pair { left: 3, right: 4 };
        let erased: &dyn Any = &pair;
        let repr = (ops.to_repr)(erased).expect("matching type");
        let rebuilt = (ops.from_repr)(repr).expect("round trip");
        assert_eq!(rebuilt.downcast_ref::<Pair>(), Some(&pair));
    }
}
