//! Traversal optics for focusing on multiple elements.
//!
//! A Traversal focuses on zero or more elements within a structure, in
//! a defined order. It generalizes Lens (exactly one focus) and Prism
//! (zero or one focus).
//!
//! # Laws
//!
//! 1. **Modify Identity**: `traversal.modify_all(source, |x| x) == source`
//! 2. **Modify Composition**:
//!    `traversal.modify_all(traversal.modify_all(source, f), g)
//!     == traversal.modify_all(source, |x| g(f(x)))`

use std::marker::PhantomData;

/// A Traversal focuses on zero or more elements within a structure.
///
/// # Type Parameters
///
/// - `S`: The source type
/// - `A`: The type of the focused elements
pub trait Traversal<S, A> {
    /// Returns all focused elements, in traversal order.
    fn get_all(&self, source: &S) -> Vec<A>;

    /// Modifies every focused element by applying a function, in
    /// traversal order.
    fn modify_all<F>(&self, source: S, function: F) -> S
    where
        F: FnMut(A) -> A;

    /// Sets every focused element to the same value.
    fn set_all(&self, source: S, value: A) -> S
    where
        A: Clone,
    {
        self.modify_all(source, |_| value.clone())
    }

    /// Folds over the focused elements, in traversal order.
    fn fold<B, F>(&self, source: &S, initial: B, function: F) -> B
    where
        F: FnMut(B, A) -> B,
    {
        self.get_all(source).into_iter().fold(initial, function)
    }
}

/// A traversal over every element of a `Vec`.
///
/// # Example
///
/// ```
/// use refract::optics::{Traversal, VecTraversal};
///
/// let traversal: VecTraversal<i32> = VecTraversal::new();
/// let numbers = vec![1, 2, 3];
///
/// assert_eq!(traversal.get_all(&numbers), vec![1, 2, 3]);
/// assert_eq!(traversal.modify_all(numbers, |x| x * 2), vec![2, 4, 6]);
/// ```
pub struct VecTraversal<A> {
    _marker: PhantomData<fn() -> A>,
}

impl<A> VecTraversal<A> {
    /// Creates a new `VecTraversal`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<A> Default for VecTraversal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Clone> Traversal<Vec<A>, A> for VecTraversal<A> {
    fn get_all(&self, source: &Vec<A>) -> Vec<A> {
        source.clone()
    }

    fn modify_all<F>(&self, source: Vec<A>, function: F) -> Vec<A>
    where
        F: FnMut(A) -> A,
    {
        source.into_iter().map(function).collect()
    }
}

impl<A> Clone for VecTraversal<A> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for VecTraversal<A> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("VecTraversal").finish()
    }
}
