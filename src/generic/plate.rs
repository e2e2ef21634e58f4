//! Deep traversal: every occurrence of a target type within a source.
//!
//! [`plate`] builds a traversal plan by walking shapes once per
//! `(source type, target type)` pair. The plan records, for every
//! position in the shape tree, whether to skip it, visit it as a
//! target occurrence, or recurse into a structurally described leaf.
//! Subtrees that cannot contain the target are pruned to a single skip
//! node, so traversal never enters them.
//!
//! Recursive types are handled by tying the knot: a plan for a type
//! that (transitively) contains itself holds a shared handle to its
//! own plan, filled in exactly once when planning finishes. Completed
//! plans are cached process-wide, so repeated [`plate`] calls for the
//! same pair reuse the same plan.
//!
//! Occurrences are visited depth-first in declaration order. A visited
//! occurrence is not entered further: nested targets inside a matched
//! value are reachable by traversing the matched value itself.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, LazyLock, OnceLock};

use parking_lot::{Mutex, RwLock};

use crate::generic::shape::{
    Repr, Shape, Structural, StructuralOps, TypeInfo, downcast_leaf, take_repr,
};
use crate::generic::synth::DerivedLens;
use crate::optics::Traversal;

/// One position in a traversal plan.
#[derive(Clone, Debug)]
enum PlanNode {
    /// This subtree cannot contain the target.
    Skip,
    /// This leaf is an occurrence of the target.
    Visit,
    /// This leaf is structurally described and may contain the target.
    Recurse {
        plan: Arc<TypePlan>,
        ops: StructuralOps,
    },
    /// Per-field nodes of a product, in declaration order.
    Product(Vec<PlanNode>),
    /// Per-constructor nodes of a sum, in declaration order.
    Sum(Vec<PlanNode>),
}

/// Shared plan for one `(type, target)` pair. The body is written
/// exactly once, after the whole strongly connected group of plans is
/// built; handles taken during planning (for recursive types) observe
/// it afterwards.
#[derive(Debug)]
struct TypePlan {
    body: OnceLock<(PlanNode, bool)>,
}

impl TypePlan {
    const fn new() -> Self {
        Self {
            body: OnceLock::new(),
        }
    }

    fn body(&self) -> &(PlanNode, bool) {
        self.body.get().expect("plan completed before first use")
    }
}

static PLATE_PLANS: LazyLock<RwLock<HashMap<(TypeId, TypeId), Arc<TypePlan>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Serializes plan construction so partially built plans never become
/// visible through the cache.
static PLAN_BUILD: Mutex<()> = Mutex::new(());

fn root_plan(info: TypeInfo, target: TypeId) -> Arc<TypePlan> {
    let key = (info.id, target);
    if let Some(done) = PLATE_PLANS.read().get(&key) {
        return Arc::clone(done);
    }

    let _guard = PLAN_BUILD.lock();
    if let Some(done) = PLATE_PLANS.read().get(&key) {
        return Arc::clone(done);
    }

    let mut local = HashMap::new();
    let root = plan_for(target, info, &mut local);

    let mut cache = PLATE_PLANS.write();
    for (type_id, plan) in local {
        cache.entry((type_id, target)).or_insert(plan);
    }
    root
}

fn plan_for(
    target: TypeId,
    info: TypeInfo,
    local: &mut HashMap<TypeId, Arc<TypePlan>>,
) -> Arc<TypePlan> {
    if let Some(done) = PLATE_PLANS.read().get(&(info.id, target)) {
        return Arc::clone(done);
    }
    if let Some(in_progress) = local.get(&info.id) {
        return Arc::clone(in_progress);
    }

    let plan = Arc::new(TypePlan::new());
    local.insert(info.id, Arc::clone(&plan));

    let ops = info
        .structural
        .expect("plans are built for structural types only");
    let body = build_node(target, (ops.shape)(), local);
    let _ = plan.body.set(body);
    plan
}

fn build_node(
    target: TypeId,
    shape: &Shape,
    local: &mut HashMap<TypeId, Arc<TypePlan>>,
) -> (PlanNode, bool) {
    match shape {
        Shape::Unit => (PlanNode::Skip, false),
        Shape::Leaf(info) => {
            // A target occurrence is visited, never entered, even when
            // the target type is itself structural.
            if info.id == target {
                return (PlanNode::Visit, true);
            }
            let Some(ops) = info.structural else {
                return (PlanNode::Skip, false);
            };
            let plan = plan_for(target, *info, local);
            // An unfinished body means a recursive group still being
            // planned; assume it can hit until proven otherwise.
            let may_hit = plan.body.get().is_none_or(|(_, hit)| *hit);
            if may_hit {
                (PlanNode::Recurse { plan, ops }, true)
            } else {
                (PlanNode::Skip, false)
            }
        }
        Shape::Product(children) => {
            let nodes: Vec<(PlanNode, bool)> = children
                .iter()
                .map(|child| build_node(target, &child.shape, local))
                .collect();
            if nodes.iter().any(|(_, hit)| *hit) {
                (
                    PlanNode::Product(nodes.into_iter().map(|(node, _)| node).collect()),
                    true,
                )
            } else {
                (PlanNode::Skip, false)
            }
        }
        Shape::Sum(variants) => {
            let nodes: Vec<(PlanNode, bool)> = variants
                .iter()
                .map(|variant| build_node(target, &variant.fields, local))
                .collect();
            if nodes.iter().any(|(_, hit)| *hit) {
                (
                    PlanNode::Sum(nodes.into_iter().map(|(node, _)| node).collect()),
                    true,
                )
            } else {
                (PlanNode::Skip, false)
            }
        }
    }
}

fn collect_into<T: Any + Clone>(node: &PlanNode, repr: &Repr, out: &mut Vec<T>) {
    match (node, repr) {
        (PlanNode::Skip, _) => {}
        (PlanNode::Visit, Repr::Leaf(value)) => {
            let occurrence = value
                .downcast_ref::<T>()
                .expect("visited leaf holds the target type");
            out.push(occurrence.clone());
        }
        (PlanNode::Recurse { plan, ops }, Repr::Leaf(value)) => {
            let inner = (ops.to_repr)(value.as_ref())
                .expect("recursed leaf holds the planned type");
            collect_into(&plan.body().0, &inner, out);
        }
        (PlanNode::Product(nodes), Repr::Product(children)) => {
            for (child_node, child) in nodes.iter().zip(children) {
                collect_into(child_node, child, out);
            }
        }
        (PlanNode::Sum(nodes), Repr::Variant { tag, fields }) => {
            collect_into(&nodes[*tag], fields, out);
        }
        _ => panic!("representation does not match its declared shape"),
    }
}

fn rewrite<T: Any + Clone>(node: &PlanNode, repr: Repr, function: &mut dyn FnMut(T) -> T) -> Repr {
    match node {
        PlanNode::Skip => repr,
        PlanNode::Visit => {
            let Repr::Leaf(value) = repr else {
                panic!("representation does not match its declared shape");
            };
            let occurrence =
                downcast_leaf::<T>(value).expect("visited leaf holds the target type");
            Repr::leaf(function(occurrence))
        }
        PlanNode::Recurse { plan, ops } => {
            let Repr::Leaf(value) = repr else {
                panic!("representation does not match its declared shape");
            };
            let inner = (ops.to_repr)(value.as_ref())
                .expect("recursed leaf holds the planned type");
            let rewritten = rewrite(&plan.body().0, inner, function);
            Repr::Leaf((ops.from_repr)(rewritten).expect("rewrite preserves the declared shape"))
        }
        PlanNode::Product(nodes) => {
            let Repr::Product(children) = repr else {
                panic!("representation does not match its declared shape");
            };
            let children = children
                .into_iter()
                .zip(nodes)
                .map(|(child, child_node)| {
                    if matches!(child_node, PlanNode::Skip) {
                        // Pruned subtree: the shared handle survives.
                        child
                    } else {
                        Rc::new(rewrite(child_node, take_repr(child), function))
                    }
                })
                .collect();
            Repr::Product(children)
        }
        PlanNode::Sum(nodes) => {
            let Repr::Variant { tag, fields } = repr else {
                panic!("representation does not match its declared shape");
            };
            if matches!(&nodes[tag], PlanNode::Skip) {
                Repr::Variant { tag, fields }
            } else {
                Repr::Variant {
                    tag,
                    fields: Rc::new(rewrite(&nodes[tag], take_repr(fields), function)),
                }
            }
        }
    }
}

/// A derived deep traversal over all occurrences of a target type.
pub struct DerivedTraversal<S, T> {
    collect: Arc<dyn Fn(&S) -> Vec<T> + Send + Sync>,
    modify: Arc<dyn Fn(S, &mut dyn FnMut(T) -> T) -> S + Send + Sync>,
}

impl<S, T> DerivedTraversal<S, T> {
    /// Returns every occurrence, depth-first in declaration order.
    #[must_use]
    pub fn get_all(&self, source: &S) -> Vec<T> {
        (self.collect)(source)
    }

    /// Rewrites every occurrence, in the same order as [`get_all`].
    #[must_use]
    pub fn modify_all<F: FnMut(T) -> T>(&self, source: S, mut function: F) -> S {
        (self.modify)(source, &mut function)
    }

    /// Sets every occurrence to the same value.
    #[must_use]
    pub fn set_all(&self, source: S, value: T) -> S
    where
        T: Clone,
    {
        self.modify_all(source, |_| value.clone())
    }

    /// Narrows each occurrence through a lens, yielding a traversal of
    /// the lens focus.
    #[must_use]
    pub fn then_lens<A>(&self, lens: &DerivedLens<T, A>) -> DerivedTraversal<S, A>
    where
        S: 'static,
        T: 'static,
        A: 'static,
    {
        let collect_inner = Arc::clone(&self.collect);
        let modify_inner = Arc::clone(&self.modify);
        let lens_for_collect = lens.clone();
        let lens_for_modify = lens.clone();
        DerivedTraversal {
            collect: Arc::new(move |source: &S| {
                collect_inner(source)
                    .iter()
                    .map(|occurrence| lens_for_collect.view(occurrence))
                    .collect()
            }),
            modify: Arc::new(move |source: S, function: &mut dyn FnMut(A) -> A| {
                modify_inner(source, &mut |occurrence: T| {
                    lens_for_modify.modify(occurrence, &mut *function)
                })
            }),
        }
    }
}

impl<S, T> Clone for DerivedTraversal<S, T> {
    fn clone(&self) -> Self {
        Self {
            collect: Arc::clone(&self.collect),
            modify: Arc::clone(&self.modify),
        }
    }
}

impl<S, T> std::fmt::Debug for DerivedTraversal<S, T> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DerivedTraversal")
            .finish_non_exhaustive()
    }
}

impl<S, T> Traversal<S, T> for DerivedTraversal<S, T> {
    fn get_all(&self, source: &S) -> Vec<T> {
        Self::get_all(self, source)
    }

    fn modify_all<F>(&self, source: S, function: F) -> S
    where
        F: FnMut(T) -> T,
    {
        Self::modify_all(self, source, function)
    }
}

/// Builds a deep traversal over every occurrence of `T` within `S`.
///
/// The source value itself is not an occurrence, even when `S` and `T`
/// coincide; only fields (at any depth) count. A target that occurs
/// nowhere yields an empty traversal.
#[must_use]
pub fn plate<S: Structural, T: Any + Clone>() -> DerivedTraversal<S, T> {
    let plan = root_plan(S::type_info(), TypeId::of::<T>());
    let plan_for_collect = Arc::clone(&plan);
    DerivedTraversal {
        collect: Arc::new(move |source: &S| {
            let repr = source.clone().into_repr();
            let mut out = Vec::new();
            collect_into(&plan_for_collect.body().0, &repr, &mut out);
            out
        }),
        modify: Arc::new(move |source: S, function: &mut dyn FnMut(T) -> T| {
            let repr = rewrite(&plan.body().0, source.into_repr(), function);
            S::from_repr(repr).expect("rewrite preserves the declared shape")
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::shape::{FieldShape, VariantShape, interned_shape, take_leaf};

    #[derive(Clone, Debug, PartialEq)]
    struct Engine {
        cylinders: u8,
        displacement: u32,
    }

    impl Structural for Engine {
        fn shape() -> &'static Shape {
            interned_shape::<Self>(|| {
                Shape::Product(vec![
                    FieldShape::named("cylinders", Shape::Leaf(TypeInfo::opaque::<u8>())),
                    FieldShape::named("displacement", Shape::Leaf(TypeInfo::opaque::<u32>())),
                ])
            })
        }

        fn into_repr(self) -> Repr {
            Repr::product(vec![
                Repr::leaf(self.cylinders),
                Repr::leaf(self.displacement),
            ])
        }

        fn from_repr(repr: Repr) -> Option<Self> {
            let Repr::Product(children) = repr else {
                return None;
            };
            let mut children = children.into_iter();
            Some(Self {
                cylinders: take_leaf(children.next()?)?,
                displacement: take_leaf(children.next()?)?,
            })
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Vehicle {
        Car { engine: Engine, doors: u8 },
        Bicycle { gears: u8 },
    }

    impl Structural for Vehicle {
        fn shape() -> &'static Shape {
            interned_shape::<Self>(|| {
                Shape::Sum(vec![
                    VariantShape::new(
                        "Car",
                        Shape::Product(vec![
                            FieldShape::named("engine", Shape::Leaf(Engine::type_info())),
                            FieldShape::named("doors", Shape::Leaf(TypeInfo::opaque::<u8>())),
                        ]),
                    ),
                    VariantShape::new(
                        "Bicycle",
                        Shape::Product(vec![FieldShape::named(
                            "gears",
                            Shape::Leaf(TypeInfo::opaque::<u8>()),
                        )]),
                    ),
                ])
            })
        }

        fn into_repr(self) -> Repr {
            match self {
                Self::Car { engine, doors } => Repr::variant(
                    0,
                    Repr::product(vec![Repr::leaf(engine), Repr::leaf(doors)]),
                ),
                Self::Bicycle { gears } => {
                    Repr::variant(1, Repr::product(vec![Repr::leaf(gears)]))
                }
            }
        }

        fn from_repr(repr: Repr) -> Option<Self> {
            let Repr::Variant { tag, fields } = repr else {
                return None;
            };
            match (tag, take_repr(fields)) {
                (0, Repr::Product(children)) => {
                    let mut children = children.into_iter();
                    Some(Self::Car {
                        engine: take_leaf(children.next()?)?,
                        doors: take_leaf(children.next()?)?,
                    })
                }
                (1, Repr::Product(children)) => {
                    let mut children = children.into_iter();
                    Some(Self::Bicycle {
                        gears: take_leaf(children.next()?)?,
                    })
                }
                _ => None,
            }
        }
    }

    #[test]
    fn test_plate_collects_nested_occurrences() {
        let traversal = plate::<Vehicle, u8>();
        let car = Vehicle::Car {
            engine: Engine {
                cylinders: 6,
                displacement: 3000,
            },
            doors: 4,
        };
        // Depth-first: the engine's cylinders come before the doors.
        assert_eq!(traversal.get_all(&car), vec![6, 4]);
    }

    #[test]
    fn test_plate_modify_all_rewrites_in_place() {
        let traversal = plate::<Vehicle, u8>();
        let car = Vehicle::Car {
            engine: Engine {
                cylinders: 6,
                displacement: 3000,
            },
            doors: 4,
        };
        let doubled = traversal.modify_all(car, |value| value * 2);
        assert_eq!(
            doubled,
            Vehicle::Car {
                engine: Engine {
                    cylinders: 12,
                    displacement: 3000,
                },
                doors: 8,
            }
        );
    }

    #[test]
    fn test_plate_structural_target_is_not_entered() {
        let traversal = plate::<Vehicle, Engine>();
        let car = Vehicle::Car {
            engine: Engine {
                cylinders: 6,
                displacement: 3000,
            },
            doors: 4,
        };
        assert_eq!(
            traversal.get_all(&car),
            vec![Engine {
                cylinders: 6,
                displacement: 3000,
            }]
        );
    }

    #[test]
    fn test_plate_absent_target_is_empty() {
        let traversal = plate::<Vehicle, String>();
        let bicycle = Vehicle::Bicycle { gears: 21 };
        assert_eq!(traversal.get_all(&bicycle), Vec::<String>::new());
        assert_eq!(
            traversal.modify_all(bicycle.clone(), |text: String| text),
            bicycle,
        );
    }

    #[test]
    fn test_plate_skips_other_variant() {
        let traversal = plate::<Vehicle, u32>();
        let bicycle = Vehicle::Bicycle { gears: 21 };
        assert_eq!(traversal.get_all(&bicycle), Vec::<u32>::new());
    }
}
