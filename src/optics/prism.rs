//! Prism optics for focusing on constructors of sum types.
//!
//! A Prism provides matching/review access to one constructor of an
//! enum. Unlike a Lens, which always succeeds, matching fails when the
//! value was built by a different constructor, and the failure carries
//! the original value back untouched.
//!
//! # Laws
//!
//! 1. **MatchReview**: `prism.matching(prism.review(value)) == Ok(value)`
//! 2. **NoMatchIdentity**: for a source built by a different
//!    constructor, `prism.matching(source) == Err(source)`: the exact
//!    input, not a reconstruction.
//!
//! # Examples
//!
//! ```
//! use refract::optics::Prism;
//! use refract::prism;
//!
//! #[derive(Clone, PartialEq, Debug)]
//! enum Shape {
//!     Circle(f64),
//!     Rectangle(f64, f64),
//! }
//!
//! let circle_prism = prism!(Shape, Circle);
//!
//! assert_eq!(circle_prism.matching(Shape::Circle(5.0)), Ok(5.0));
//! assert_eq!(
//!     circle_prism.matching(Shape::Rectangle(3.0, 4.0)),
//!     Err(Shape::Rectangle(3.0, 4.0)),
//! );
//! assert_eq!(circle_prism.review(10.0), Shape::Circle(10.0));
//! ```

use std::marker::PhantomData;

/// A Prism focuses on a single constructor of a sum type.
///
/// # Type Parameters
///
/// - `S`: The source type (the whole sum)
/// - `A`: The target type (the constructor's payload)
pub trait Prism<S, A> {
    /// Attempts to extract the payload from the source.
    ///
    /// Returns `Ok(payload)` when the source was built by the focused
    /// constructor, and `Err(source)`, the untouched original,
    /// otherwise.
    fn matching(&self, source: S) -> Result<A, S>;

    /// Constructs a source value from a payload.
    ///
    /// Always succeeds, producing the focused constructor.
    fn review(&self, value: A) -> S;

    /// Attempts to extract the payload without consuming the source.
    fn preview(&self, source: &S) -> Option<A>
    where
        S: Clone,
    {
        self.matching(source.clone()).ok()
    }

    /// Modifies the payload if the source matches, or returns the
    /// source unchanged.
    fn modify_or_identity<F>(&self, source: S, function: F) -> S
    where
        F: FnOnce(A) -> A,
    {
        match self.matching(source) {
            Ok(value) => self.review(function(value)),
            Err(original) => original,
        }
    }

    /// Composes this prism with another prism to focus on a nested
    /// constructor.
    fn compose<B, P>(self, other: P) -> ComposedPrism<Self, P, A>
    where
        Self: Sized,
        P: Prism<A, B>,
    {
        ComposedPrism::new(self, other)
    }
}

/// A prism implemented using matching and review functions.
///
/// The `prism!` macro generates a `FunctionPrism` internally.
///
/// # Example
///
/// ```
/// use refract::optics::{Prism, FunctionPrism};
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Shape {
///     Circle(f64),
///     Rectangle(f64, f64),
/// }
///
/// let circle_prism = FunctionPrism::new(
///     |shape: Shape| match shape {
///         Shape::Circle(radius) => Ok(radius),
///         other => Err(other),
///     },
///     Shape::Circle,
/// );
///
/// assert_eq!(circle_prism.matching(Shape::Circle(5.0)), Ok(5.0));
/// ```
pub struct FunctionPrism<S, A, M, Re>
where
    M: Fn(S) -> Result<A, S>,
    Re: Fn(A) -> S,
{
    matching_function: M,
    review_function: Re,
    _marker: PhantomData<fn(S) -> A>,
}

impl<S, A, M, Re> FunctionPrism<S, A, M, Re>
where
    M: Fn(S) -> Result<A, S>,
    Re: Fn(A) -> S,
{
    /// Creates a new `FunctionPrism` from matching and review functions.
    #[must_use]
    pub const fn new(matching_function: M, review_function: Re) -> Self {
        Self {
            matching_function,
            review_function,
            _marker: PhantomData,
        }
    }
}

impl<S, A, M, Re> Prism<S, A> for FunctionPrism<S, A, M, Re>
where
    M: Fn(S) -> Result<A, S>,
    Re: Fn(A) -> S,
{
    fn matching(&self, source: S) -> Result<A, S> {
        (self.matching_function)(source)
    }

    fn review(&self, value: A) -> S {
        (self.review_function)(value)
    }
}

impl<S, A, M, Re> Clone for FunctionPrism<S, A, M, Re>
where
    M: Fn(S) -> Result<A, S> + Clone,
    Re: Fn(A) -> S + Clone,
{
    fn clone(&self) -> Self {
        Self {
            matching_function: self.matching_function.clone(),
            review_function: self.review_function.clone(),
            _marker: PhantomData,
        }
    }
}

impl<S, A, M, Re> std::fmt::Debug for FunctionPrism<S, A, M, Re>
where
    M: Fn(S) -> Result<A, S>,
    Re: Fn(A) -> S,
{
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FunctionPrism")
            .finish_non_exhaustive()
    }
}

/// A prism composed of two prisms, focusing on a nested constructor.
///
/// When the inner prism fails, the outer constructor is rebuilt around
/// the inner value via `review`; the result compares equal to the
/// original source.
pub struct ComposedPrism<P1, P2, A> {
    first: P1,
    second: P2,
    _marker: PhantomData<fn() -> A>,
}

impl<P1, P2, A> ComposedPrism<P1, P2, A> {
    /// Creates a new composed prism from an outer and an inner prism.
    #[must_use]
    pub const fn new(first: P1, second: P2) -> Self {
        Self {
            first,
            second,
            _marker: PhantomData,
        }
    }
}

impl<S, A, B, P1, P2> Prism<S, B> for ComposedPrism<P1, P2, A>
where
    P1: Prism<S, A>,
    P2: Prism<A, B>,
{
    fn matching(&self, source: S) -> Result<B, S> {
        match self.first.matching(source) {
            Ok(intermediate) => match self.second.matching(intermediate) {
                Ok(value) => Ok(value),
                Err(intermediate) => Err(self.first.review(intermediate)),
            },
            Err(original) => Err(original),
        }
    }

    fn review(&self, value: B) -> S {
        self.first.review(self.second.review(value))
    }
}

impl<P1: Clone, P2: Clone, A> Clone for ComposedPrism<P1, P2, A> {
    fn clone(&self) -> Self {
        Self {
            first: self.first.clone(),
            second: self.second.clone(),
            _marker: PhantomData,
        }
    }
}

/// Creates a prism for a single-field tuple variant of an enum.
///
/// # Syntax
///
/// ```text
/// prism!(EnumType, Variant)
/// ```
///
/// # Example
///
/// ```
/// use refract::optics::Prism;
/// use refract::prism;
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Shape { Circle(f64), Rectangle(f64, f64) }
///
/// let circle_prism = prism!(Shape, Circle);
/// assert_eq!(circle_prism.matching(Shape::Circle(5.0)), Ok(5.0));
/// ```
#[macro_export]
macro_rules! prism {
    ($enum_type:ident, $variant:ident) => {
        $crate::optics::FunctionPrism::new(
            |source: $enum_type| match source {
                $enum_type::$variant(value) => Ok(value),
                other => Err(other),
            },
            $enum_type::$variant,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    enum Shape {
        Circle(f64),
        Rectangle(f64, f64),
    }

    #[test]
    fn test_matching_success() {
        let circle_prism = prism!(Shape, Circle);
        assert_eq!(circle_prism.matching(Shape::Circle(5.0)), Ok(5.0));
    }

    #[test]
    fn test_matching_failure_returns_original() {
        let circle_prism = prism!(Shape, Circle);
        let rect = Shape::Rectangle(3.0, 4.0);
        assert_eq!(circle_prism.matching(rect.clone()), Err(rect));
    }

    #[test]
    fn test_review() {
        let circle_prism = prism!(Shape, Circle);
        assert_eq!(circle_prism.review(10.0), Shape::Circle(10.0));
    }

    #[test]
    fn test_modify_or_identity() {
        let circle_prism = prism!(Shape, Circle);
        let doubled = circle_prism.modify_or_identity(Shape::Circle(5.0), |r| r * 2.0);
        assert_eq!(doubled, Shape::Circle(10.0));

        let rect = Shape::Rectangle(3.0, 4.0);
        let unchanged = circle_prism.modify_or_identity(rect.clone(), |r| r * 2.0);
        assert_eq!(unchanged, rect);
    }
}
