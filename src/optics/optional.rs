//! Optional optics for focusing on elements that may or may not exist.
//!
//! An Optional is the totality class between Lens and Prism: zero or
//! one focus, with `set` acting as the identity when the focus is
//! absent. It is the natural optic for a field that exists in some but
//! not all constructors of a sum type.
//!
//! # Laws
//!
//! When the focus is present:
//!
//! 1. **GetOptionSet**: `optional.set(source, optional.get_option(&source).unwrap()) == source`
//! 2. **SetGetOption**: `optional.get_option(&optional.set(source, value)) == Some(value)`
//!
//! When the focus is absent, `set` returns the source unchanged.

use std::marker::PhantomData;

/// An Optional focuses on a value that may or may not be present.
///
/// # Type Parameters
///
/// - `S`: The source type
/// - `A`: The target type, when present
pub trait Optional<S, A> {
    /// Returns the focused element, if present.
    fn get_option(&self, source: &S) -> Option<A>;

    /// Sets the focused element when present; returns the source
    /// unchanged when absent.
    fn set(&self, source: S, value: A) -> S;

    /// Modifies the focused element when present; identity otherwise.
    fn modify_option<F>(&self, source: S, function: F) -> S
    where
        F: FnOnce(A) -> A,
    {
        match self.get_option(&source) {
            Some(current) => self.set(source, function(current)),
            None => source,
        }
    }
}

/// An optional implemented using getter and setter functions.
pub struct FunctionOptional<S, A, G, St>
where
    G: Fn(&S) -> Option<A>,
    St: Fn(S, A) -> S,
{
    getter: G,
    setter: St,
    _marker: PhantomData<fn(S) -> A>,
}

impl<S, A, G, St> FunctionOptional<S, A, G, St>
where
    G: Fn(&S) -> Option<A>,
    St: Fn(S, A) -> S,
{
    /// Creates a new `FunctionOptional` from a getter and setter.
    ///
    /// The setter is responsible for returning the source unchanged
    /// when the focus is absent.
    #[must_use]
    pub const fn new(getter: G, setter: St) -> Self {
        Self {
            getter,
            setter,
            _marker: PhantomData,
        }
    }
}

impl<S, A, G, St> Optional<S, A> for FunctionOptional<S, A, G, St>
where
    G: Fn(&S) -> Option<A>,
    St: Fn(S, A) -> S,
{
    fn get_option(&self, source: &S) -> Option<A> {
        (self.getter)(source)
    }

    fn set(&self, source: S, value: A) -> S {
        (self.setter)(source, value)
    }
}

impl<S, A, G, St> Clone for FunctionOptional<S, A, G, St>
where
    G: Fn(&S) -> Option<A> + Clone,
    St: Fn(S, A) -> S + Clone,
{
    fn clone(&self) -> Self {
        Self {
            getter: self.getter.clone(),
            setter: self.setter.clone(),
            _marker: PhantomData,
        }
    }
}

impl<S, A, G, St> std::fmt::Debug for FunctionOptional<S, A, G, St>
where
    G: Fn(&S) -> Option<A>,
    St: Fn(S, A) -> S,
{
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FunctionOptional")
            .finish_non_exhaustive()
    }
}
