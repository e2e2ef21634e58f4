//! Derive macro for refract structural descriptions.
//!
//! This crate provides `#[derive(Structural)]`, which implements
//! `refract::generic::shape::Structural` for structs and enums: a
//! sum-of-products shape description plus the conversions between
//! values and their runtime representation. Everything else (lenses,
//! prisms, deep traversals) is derived from that description at
//! runtime by the `refract` crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use refract::Structural;
//!
//! #[derive(Clone, Structural)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let name = refract::generic::lens::<Person, String>("name").unwrap();
//! ```
//!
//! # Field Attributes
//!
//! - `#[structural(opaque)]`: describe the field as an opaque leaf
//!   even when its type is structurally described. Deep traversals
//!   will not look inside it.
//! - `#[structural(flatten)]`: inline the field type's own fields
//!   into the parent, so they resolve by name as if declared directly
//!   on the parent. The field type must implement `Structural`.
//!
//! ```rust,ignore
//! #[derive(Clone, Structural)]
//! struct Customer {
//!     id: u64,
//!     #[structural(flatten)]
//!     address: Address,
//! }
//!
//! // Resolves into the flattened Address.
//! let city = refract::generic::lens::<Customer, String>("city").unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod structural;

use proc_macro::TokenStream;

/// Derive macro implementing `Structural` for a struct or enum.
///
/// # Requirements
///
/// - The type must implement `Clone` and be `'static`.
/// - Generic parameters are bounded with `Clone + Any` in the
///   generated impl. Fields whose type is a generic parameter are
///   described as opaque leaves.
///
/// # Generated Code
///
/// For a type `Foo`, generates:
///
/// ```rust,ignore
/// impl Structural for Foo {
///     fn shape() -> &'static Shape { /* built once, then cached */ }
///     fn into_repr(self) -> Repr { /* one level of conversion */ }
///     fn from_repr(repr: Repr) -> Option<Foo> { /* the inverse */ }
/// }
/// ```
///
/// Field types that themselves implement `Structural` are described
/// as structural leaves, so deep traversals can recurse into them;
/// all other field types become opaque leaves.
#[proc_macro_derive(Structural, attributes(structural))]
pub fn derive_structural(input: TokenStream) -> TokenStream {
    structural::derive_structural_impl(input)
}
