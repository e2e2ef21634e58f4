//! Accessor synthesis: compiling resolved paths into ready-to-run
//! optics.
//!
//! Synthesis happens in two layers. The representation layer
//! ([`compile_lens`], [`compile_optional`]) turns a [`PathTree`] into
//! closures over [`Repr`] values; all shape metadata is consumed here,
//! and the resulting closures touch only precomputed index paths. The
//! typed layer ([`derive_lens`], [`derive_optional`], [`derive_prism`])
//! wraps those closures with conversion through [`Structural`],
//! checking the focus type once at derivation time.
//!
//! Updates rebuild only the spine from the root to the focus; every
//! untouched sibling keeps its shared handle, so it stays
//! pointer-identical to the original representation.

use std::any::{Any, TypeId, type_name};
use std::rc::Rc;
use std::sync::Arc;

use crate::generic::error::DeriveError;
use crate::generic::path::{Path, PathTree, Selector, resolve};
use crate::generic::shape::{
    Repr, Shape, Structural, TypeInfo, downcast_leaf, take_repr,
};
use crate::optics::{Lens, Optional, Prism};

/// Widest constructor payload a derived prism supports.
///
/// Constructors with more fields require an explicitly registered
/// prism.
pub const MAX_PAYLOAD_ARITY: usize = 5;

/// A compiled getter over representations.
pub type GetFn = Arc<dyn Fn(&Repr) -> Rc<dyn Any> + Send + Sync>;

/// A compiled setter over representations.
pub type SetFn = Arc<dyn Fn(Repr, Rc<dyn Any>) -> Repr + Send + Sync>;

/// A total field accessor over representations.
///
/// Produced by [`compile_lens`] from a total [`PathTree`]. Works
/// directly on [`Repr`] trees; the typed layer wraps it for use on
/// actual values. Exposed so callers can observe structural sharing
/// at the representation level.
#[derive(Clone)]
pub struct CompiledLens {
    get: GetFn,
    set: SetFn,
}

impl CompiledLens {
    /// Reads the focused leaf.
    #[must_use]
    pub fn get(&self, repr: &Repr) -> Rc<dyn Any> {
        (self.get)(repr)
    }

    /// Replaces the focused leaf, rebuilding only the spine above it.
    #[must_use]
    pub fn set(&self, repr: Repr, value: Rc<dyn Any>) -> Repr {
        (self.set)(repr, value)
    }
}

impl std::fmt::Debug for CompiledLens {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("CompiledLens").finish_non_exhaustive()
    }
}

/// An affine field accessor over representations: reads may miss, and
/// setting an absent focus is the identity.
#[derive(Clone)]
pub struct CompiledOptional {
    get: Arc<dyn Fn(&Repr) -> Option<Rc<dyn Any>> + Send + Sync>,
    set: SetFn,
}

impl CompiledOptional {
    /// Reads the focused leaf, if the active alternative has one.
    #[must_use]
    pub fn get(&self, repr: &Repr) -> Option<Rc<dyn Any>> {
        (self.get)(repr)
    }

    /// Replaces the focused leaf when present; identity otherwise.
    #[must_use]
    pub fn set(&self, repr: Repr, value: Rc<dyn Any>) -> Repr {
        (self.set)(repr, value)
    }
}

impl std::fmt::Debug for CompiledOptional {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CompiledOptional")
            .finish_non_exhaustive()
    }
}

fn compile_get_path(path: Path) -> GetFn {
    Arc::new(move |repr: &Repr| {
        let mut current = repr;
        for &step in &path {
            match current {
                Repr::Product(children) => current = children[step].as_ref(),
                _ => panic!("representation does not match its declared shape"),
            }
        }
        match current {
            Repr::Leaf(value) => Rc::clone(value),
            _ => panic!("resolved path does not end at a leaf"),
        }
    })
}

fn set_along(repr: Repr, path: &[usize], value: Rc<dyn Any>) -> Repr {
    match path.split_first() {
        None => Repr::Leaf(value),
        Some((&step, rest)) => {
            let Repr::Product(mut children) = repr else {
                panic!("representation does not match its declared shape");
            };
            let child = take_repr(std::mem::replace(&mut children[step], Rc::new(Repr::Unit)));
            children[step] = Rc::new(set_along(child, rest, value));
            Repr::Product(children)
        }
    }
}

fn compile_set_path(path: Path) -> SetFn {
    Arc::new(move |repr: Repr, value: Rc<dyn Any>| set_along(repr, &path, value))
}

/// Compiles a total path tree into a representation-level lens.
///
/// # Panics
///
/// Panics if the tree is not total; callers check totality first and
/// report [`DeriveError::PartialField`] instead.
#[must_use]
pub fn compile_lens(shape: &Shape, tree: &PathTree) -> CompiledLens {
    assert!(tree.is_total(), "compile_lens requires a total path tree");
    let paths: Vec<Path> = tree
        .arms
        .iter()
        .map(|arm| arm.outcome.clone().unwrap_or_default())
        .collect();

    if matches!(shape, Shape::Sum(_)) {
        let gets: Vec<GetFn> = paths.iter().cloned().map(compile_get_path).collect();
        let sets: Vec<SetFn> = paths.iter().cloned().map(compile_set_path).collect();
        CompiledLens {
            get: Arc::new(move |repr: &Repr| match repr {
                Repr::Variant { tag, fields } => (gets[*tag])(fields),
                _ => panic!("representation does not match its declared shape"),
            }),
            set: Arc::new(move |repr: Repr, value: Rc<dyn Any>| match repr {
                Repr::Variant { tag, fields } => Repr::Variant {
                    tag,
                    fields: Rc::new((sets[tag])(take_repr(fields), value)),
                },
                _ => panic!("representation does not match its declared shape"),
            }),
        }
    } else {
        let path = paths.into_iter().next().unwrap_or_default();
        CompiledLens {
            get: compile_get_path(path.clone()),
            set: compile_set_path(path),
        }
    }
}

/// Compiles a possibly partial path tree into a representation-level
/// affine accessor.
#[must_use]
pub fn compile_optional(shape: &Shape, tree: &PathTree) -> CompiledOptional {
    let paths: Vec<Option<Path>> = tree
        .arms
        .iter()
        .map(|arm| arm.outcome.clone().ok())
        .collect();

    if matches!(shape, Shape::Sum(_)) {
        let gets: Vec<Option<GetFn>> = paths
            .iter()
            .map(|path| path.clone().map(compile_get_path))
            .collect();
        let sets: Vec<Option<SetFn>> = paths
            .iter()
            .map(|path| path.clone().map(compile_set_path))
            .collect();
        CompiledOptional {
            get: Arc::new(move |repr: &Repr| match repr {
                Repr::Variant { tag, fields } => {
                    gets[*tag].as_ref().map(|get| get(fields))
                }
                _ => panic!("representation does not match its declared shape"),
            }),
            set: Arc::new(move |repr: Repr, value: Rc<dyn Any>| match repr {
                Repr::Variant { tag, fields } => match &sets[tag] {
                    Some(set) => Repr::Variant {
                        tag,
                        fields: Rc::new(set(take_repr(fields), value)),
                    },
                    None => Repr::Variant { tag, fields },
                },
                _ => panic!("representation does not match its declared shape"),
            }),
        }
    } else {
        let path = paths.into_iter().next().flatten().unwrap_or_default();
        let get = compile_get_path(path.clone());
        let set = compile_set_path(path);
        CompiledOptional {
            get: Arc::new(move |repr: &Repr| Some(get(repr))),
            set,
        }
    }
}

fn focus_info(shape: &Shape, arm_index: usize, path: &[usize]) -> Option<TypeInfo> {
    let mut current = match shape {
        Shape::Sum(variants) => &variants.get(arm_index)?.fields,
        other => other,
    };
    for &step in path {
        let Shape::Product(children) = current else {
            return None;
        };
        current = &children.get(step)?.shape;
    }
    match current {
        Shape::Leaf(info) => Some(*info),
        _ => None,
    }
}

fn check_focus<A: Any>(
    type_name_of_source: &'static str,
    selector: &Selector,
    shape: &Shape,
    tree: &PathTree,
) -> Result<(), DeriveError> {
    for (index, arm) in tree.arms.iter().enumerate() {
        let Ok(path) = &arm.outcome else { continue };
        let info = focus_info(shape, index, path).ok_or_else(|| DeriveError::SelectorNotFound {
            type_name: type_name_of_source,
            selector: selector.display(),
        })?;
        if info.id != TypeId::of::<A>() {
            return Err(DeriveError::FocusMismatch {
                type_name: type_name_of_source,
                selector: selector.display(),
                expected: type_name::<A>(),
                found: info.name,
            });
        }
    }
    Ok(())
}

/// A derived total lens: a pair of prebuilt closures from source to
/// focus and back.
///
/// Cheap to clone; clones share the compiled closures.
pub struct DerivedLens<S, A> {
    get: Arc<dyn Fn(&S) -> A + Send + Sync>,
    set: Arc<dyn Fn(S, A) -> S + Send + Sync>,
}

impl<S, A> DerivedLens<S, A> {
    /// Wraps explicit closures as a derived-lens value. Used to adapt
    /// registered hand-written optics into the common carrier type.
    pub fn from_fns(
        get: impl Fn(&S) -> A + Send + Sync + 'static,
        set: impl Fn(S, A) -> S + Send + Sync + 'static,
    ) -> Self {
        Self {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Reads the focused field.
    #[must_use]
    pub fn view(&self, source: &S) -> A {
        (self.get)(source)
    }

    /// Replaces the focused field.
    #[must_use]
    pub fn set(&self, source: S, value: A) -> S {
        (self.set)(source, value)
    }

    /// Applies a function to the focused field.
    #[must_use]
    pub fn modify<F: FnOnce(A) -> A>(&self, source: S, function: F) -> S {
        let current = (self.get)(&source);
        (self.set)(source, function(current))
    }

    /// Composes with a lens into the focus, yielding a deeper lens.
    #[must_use]
    pub fn then<B>(&self, other: &DerivedLens<A, B>) -> DerivedLens<S, B>
    where
        S: 'static,
        A: 'static,
        B: 'static,
    {
        let outer_get = Arc::clone(&self.get);
        let outer_get_for_set = Arc::clone(&self.get);
        let outer_set = Arc::clone(&self.set);
        let inner_get = Arc::clone(&other.get);
        let inner_set = Arc::clone(&other.set);
        DerivedLens {
            get: Arc::new(move |source: &S| inner_get(&outer_get(source))),
            set: Arc::new(move |source: S, value: B| {
                let intermediate = outer_get_for_set(&source);
                outer_set(source, inner_set(intermediate, value))
            }),
        }
    }
}

impl<S, A> Clone for DerivedLens<S, A> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<S, A> std::fmt::Debug for DerivedLens<S, A> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("DerivedLens").finish_non_exhaustive()
    }
}

impl<S, A> Lens<S, A> for DerivedLens<S, A> {
    fn view(&self, source: &S) -> A {
        Self::view(self, source)
    }

    fn set(&self, source: S, value: A) -> S {
        Self::set(self, source, value)
    }
}

/// A derived affine accessor: the field exists in some constructors
/// only. Setting when absent is the identity.
pub struct DerivedOptional<S, A> {
    get: Arc<dyn Fn(&S) -> Option<A> + Send + Sync>,
    set: Arc<dyn Fn(S, A) -> S + Send + Sync>,
}

impl<S, A> DerivedOptional<S, A> {
    /// Wraps explicit closures as a derived-optional value.
    pub fn from_fns(
        get: impl Fn(&S) -> Option<A> + Send + Sync + 'static,
        set: impl Fn(S, A) -> S + Send + Sync + 'static,
    ) -> Self {
        Self {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Reads the focused field, if the active constructor has it.
    #[must_use]
    pub fn get_option(&self, source: &S) -> Option<A> {
        (self.get)(source)
    }

    /// Replaces the focused field when present; identity otherwise.
    #[must_use]
    pub fn set(&self, source: S, value: A) -> S {
        (self.set)(source, value)
    }
}

impl<S, A> Clone for DerivedOptional<S, A> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<S, A> std::fmt::Debug for DerivedOptional<S, A> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DerivedOptional")
            .finish_non_exhaustive()
    }
}

impl<S, A> Optional<S, A> for DerivedOptional<S, A> {
    fn get_option(&self, source: &S) -> Option<A> {
        Self::get_option(self, source)
    }

    fn set(&self, source: S, value: A) -> S {
        Self::set(self, source, value)
    }
}

/// Derives a total lens for a field or position selector.
///
/// Fails when the selector resolves nowhere, resolves only in some
/// constructors ([`DeriveError::PartialField`]), or focuses a type
/// other than `A`.
pub fn derive_lens<S: Structural, A: Any + Clone>(
    selector: &Selector,
) -> Result<DerivedLens<S, A>, DeriveError> {
    let info = S::type_info();
    if matches!(selector, Selector::Constructor(_)) {
        return Err(DeriveError::SelectorNotFound {
            type_name: info.name,
            selector: selector.display(),
        });
    }
    let shape = S::shape();
    let tree = resolve(info.name, shape, selector)?;
    if !tree.is_total() {
        return Err(DeriveError::PartialField {
            type_name: info.name,
            selector: selector.display(),
            missing: tree.missing_variants(),
        });
    }
    check_focus::<A>(info.name, selector, shape, &tree)?;

    let compiled = compile_lens(shape, &tree);
    let getter = compiled.clone();
    Ok(DerivedLens {
        get: Arc::new(move |source: &S| {
            let repr = source.clone().into_repr();
            downcast_leaf::<A>(getter.get(&repr)).expect("focus type verified at derivation")
        }),
        set: Arc::new(move |source: S, value: A| {
            let updated = compiled.set(source.into_repr(), Rc::new(value));
            S::from_repr(updated).expect("update preserves the declared shape")
        }),
    })
}

/// Derives an affine accessor for a field or position selector.
///
/// Unlike [`derive_lens`], the field may be absent in some
/// constructors; reads return `None` there and writes are the
/// identity.
pub fn derive_optional<S: Structural, A: Any + Clone>(
    selector: &Selector,
) -> Result<DerivedOptional<S, A>, DeriveError> {
    let info = S::type_info();
    if matches!(selector, Selector::Constructor(_)) {
        return Err(DeriveError::SelectorNotFound {
            type_name: info.name,
            selector: selector.display(),
        });
    }
    let shape = S::shape();
    let tree = resolve(info.name, shape, selector)?;
    check_focus::<A>(info.name, selector, shape, &tree)?;

    let compiled = compile_optional(shape, &tree);
    let getter = compiled.clone();
    Ok(DerivedOptional {
        get: Arc::new(move |source: &S| {
            let repr = source.clone().into_repr();
            getter
                .get(&repr)
                .map(|leaf| downcast_leaf::<A>(leaf).expect("focus type verified at derivation"))
        }),
        set: Arc::new(move |source: S, value: A| {
            let updated = compiled.set(source.into_repr(), Rc::new(value));
            S::from_repr(updated).expect("update preserves the declared shape")
        }),
    })
}

/// A constructor payload usable with derived prisms: the constructor's
/// leaf fields, flattened depth-first into a tuple.
///
/// Implemented for tuples of up to [`MAX_PAYLOAD_ARITY`] elements,
/// plus `()` for fieldless constructors.
pub trait VariantPayload: Sized + 'static {
    /// Number of tuple elements.
    const ARITY: usize;

    /// `TypeId`s of the tuple elements, in order.
    fn field_types() -> Vec<TypeId>;

    /// Type names of the tuple elements, for diagnostics.
    fn field_type_names() -> Vec<&'static str>;

    /// Erases the tuple into leaf values.
    fn into_fields(self) -> Vec<Rc<dyn Any>>;

    /// Rebuilds the tuple from leaf values.
    fn from_fields(fields: Vec<Rc<dyn Any>>) -> Option<Self>;
}

impl VariantPayload for () {
    const ARITY: usize = 0;

    fn field_types() -> Vec<TypeId> {
        Vec::new()
    }

    fn field_type_names() -> Vec<&'static str> {
        Vec::new()
    }

    fn into_fields(self) -> Vec<Rc<dyn Any>> {
        Vec::new()
    }

    fn from_fields(fields: Vec<Rc<dyn Any>>) -> Option<Self> {
        fields.is_empty().then_some(())
    }
}

macro_rules! impl_variant_payload {
    ($($type_param:ident => $index:tt),+) => {
        impl<$($type_param: Any + Clone),+> VariantPayload for ($($type_param,)+) {
            const ARITY: usize = [$(stringify!($type_param)),+].len();

            fn field_types() -> Vec<TypeId> {
                vec![$(TypeId::of::<$type_param>()),+]
            }

            fn field_type_names() -> Vec<&'static str> {
                vec![$(type_name::<$type_param>()),+]
            }

            fn into_fields(self) -> Vec<Rc<dyn Any>> {
                vec![$(Rc::new(self.$index) as Rc<dyn Any>),+]
            }

            fn from_fields(fields: Vec<Rc<dyn Any>>) -> Option<Self> {
                if fields.len() != Self::ARITY {
                    return None;
                }
                let mut fields = fields.into_iter();
                Some(($(downcast_leaf::<$type_param>(fields.next()?)?,)+))
            }
        }
    };
}

impl_variant_payload!(A0 => 0);
impl_variant_payload!(A0 => 0, A1 => 1);
impl_variant_payload!(A0 => 0, A1 => 1, A2 => 2);
impl_variant_payload!(A0 => 0, A1 => 1, A2 => 2, A3 => 3);
impl_variant_payload!(A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4);

/// A derived prism for one constructor of a sum type.
pub struct DerivedPrism<S, P> {
    matching: Arc<dyn Fn(S) -> Result<P, S> + Send + Sync>,
    review: Arc<dyn Fn(P) -> S + Send + Sync>,
}

impl<S, P> DerivedPrism<S, P> {
    /// Wraps explicit closures as a derived-prism value.
    pub fn from_fns(
        matching: impl Fn(S) -> Result<P, S> + Send + Sync + 'static,
        review: impl Fn(P) -> S + Send + Sync + 'static,
    ) -> Self {
        Self {
            matching: Arc::new(matching),
            review: Arc::new(review),
        }
    }

    /// Extracts the payload, or returns the untouched source when a
    /// different constructor is active.
    pub fn matching(&self, source: S) -> Result<P, S> {
        (self.matching)(source)
    }

    /// Builds a source value from the payload.
    #[must_use]
    pub fn review(&self, value: P) -> S {
        (self.review)(value)
    }
}

impl<S, P> Clone for DerivedPrism<S, P> {
    fn clone(&self) -> Self {
        Self {
            matching: Arc::clone(&self.matching),
            review: Arc::clone(&self.review),
        }
    }
}

impl<S, P> std::fmt::Debug for DerivedPrism<S, P> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("DerivedPrism").finish_non_exhaustive()
    }
}

impl<S, P> Prism<S, P> for DerivedPrism<S, P> {
    fn matching(&self, source: S) -> Result<P, S> {
        Self::matching(self, source)
    }

    fn review(&self, value: P) -> S {
        Self::review(self, value)
    }
}

fn collect_variant_leaves(shape: &Shape, out: &mut Vec<TypeInfo>) {
    match shape {
        Shape::Unit => {}
        Shape::Leaf(info) => out.push(*info),
        Shape::Product(children) => {
            for child in children {
                collect_variant_leaves(&child.shape, out);
            }
        }
        Shape::Sum(_) => panic!("sum shapes cannot appear inside a constructor's fields"),
    }
}

fn collect_repr_leaves(repr: &Repr, out: &mut Vec<Rc<dyn Any>>) {
    match repr {
        Repr::Unit => {}
        Repr::Leaf(value) => out.push(Rc::clone(value)),
        Repr::Product(children) => {
            for child in children {
                collect_repr_leaves(child, out);
            }
        }
        Repr::Variant { .. } => panic!("representation does not match its declared shape"),
    }
}

fn build_from_leaves(shape: &Shape, leaves: &mut std::vec::IntoIter<Rc<dyn Any>>) -> Repr {
    match shape {
        Shape::Unit => Repr::Unit,
        Shape::Leaf(_) => Repr::Leaf(leaves.next().expect("payload arity verified at derivation")),
        Shape::Product(children) => Repr::Product(
            children
                .iter()
                .map(|child| Rc::new(build_from_leaves(&child.shape, leaves)))
                .collect(),
        ),
        Shape::Sum(_) => panic!("sum shapes cannot appear inside a constructor's fields"),
    }
}

/// Derives a prism for a named constructor of a sum type.
///
/// The payload type `P` is the constructor's leaf fields flattened
/// depth-first into a tuple; `()` for fieldless constructors.
/// Constructors wider than [`MAX_PAYLOAD_ARITY`] are rejected with
/// [`DeriveError::ArityUnsupported`].
pub fn derive_prism<S: Structural, P: VariantPayload>(
    constructor: &str,
) -> Result<DerivedPrism<S, P>, DeriveError> {
    let info = S::type_info();
    let shape = S::shape();
    let Shape::Sum(variants) = shape else {
        return Err(DeriveError::SelectorNotFound {
            type_name: info.name,
            selector: format!("_{constructor}"),
        });
    };
    let (index, variant) = variants
        .iter()
        .enumerate()
        .find(|(_, variant)| variant.name == constructor)
        .ok_or_else(|| DeriveError::SelectorNotFound {
            type_name: info.name,
            selector: format!("_{constructor}"),
        })?;

    let mut leaves = Vec::new();
    collect_variant_leaves(&variant.fields, &mut leaves);
    if leaves.len() > MAX_PAYLOAD_ARITY {
        return Err(DeriveError::ArityUnsupported {
            type_name: info.name,
            constructor: variant.name,
            arity: leaves.len(),
        });
    }
    if leaves.len() != P::ARITY
        || leaves
            .iter()
            .zip(P::field_types())
            .any(|(leaf, requested)| leaf.id != requested)
    {
        let found = leaves
            .iter()
            .zip(P::field_types())
            .find(|(leaf, requested)| leaf.id != *requested)
            .map_or(variant.name, |(leaf, _)| leaf.name);
        return Err(DeriveError::FocusMismatch {
            type_name: info.name,
            selector: format!("_{constructor}"),
            expected: type_name::<P>(),
            found,
        });
    }

    let fields_shape = variant.fields.clone();
    Ok(DerivedPrism {
        matching: Arc::new(move |source: S| {
            let repr = source.clone().into_repr();
            match repr {
                Repr::Variant { tag, fields } if tag == index => {
                    let mut collected = Vec::with_capacity(P::ARITY);
                    collect_repr_leaves(&fields, &mut collected);
                    Ok(P::from_fields(collected)
                        .expect("payload types verified at derivation"))
                }
                _ => Err(source),
            }
        }),
        review: Arc::new(move |value: P| {
            let mut leaves = value.into_fields().into_iter();
            let fields = build_from_leaves(&fields_shape, &mut leaves);
            S::from_repr(Repr::variant(index, fields))
                .expect("constructor rebuilt from its own shape")
        }),
    })
}
