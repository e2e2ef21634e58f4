//! # refract
//!
//! Optics for Rust, derived generically from structural representations
//! of data types.
//!
//! ## Overview
//!
//! The library has two halves:
//!
//! - [`optics`]: a small optic algebra ([`optics::Lens`],
//!   [`optics::Prism`], [`optics::Optional`], [`optics::Traversal`])
//!   with function-backed implementations and the `lens!`/`prism!`
//!   macros for writing accessors by hand.
//! - [`generic`]: the derivation engine. Given a [`generic::Shape`]
//!   describing a type's constructors and fields (normally emitted by
//!   `#[derive(Structural)]`), it resolves a selector (a field name, a
//!   1-based position, or a constructor name) to paths through the
//!   shape tree and synthesizes a ready-to-use accessor. Deep
//!   traversals ([`generic::plate`]) find every occurrence of a target
//!   type nested anywhere inside a value, recursing through other
//!   structurally described types.
//!
//! All resolution happens when an accessor is derived. A derived
//! accessor either exists and is total over its declared domain, or
//! derivation fails with a [`generic::DeriveError`]; there is no
//! execution path where an accessor fails at the point of use because
//! of a shape mismatch.
//!
//! ## Example
//!
//! ```
//! use refract::Structural;
//! use refract::generic;
//!
//! #[derive(Clone, Debug, PartialEq, Structural)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let x = generic::lens::<Point, i32>("x").unwrap();
//! let point = Point { x: 10, y: 20 };
//! assert_eq!(x.view(&point), 10);
//! assert_eq!(x.set(point, 7), Point { x: 7, y: 20 });
//! ```
//!
//! ## Feature Flags
//!
//! - `derive` (default): re-exports `#[derive(Structural)]` from
//!   `refract-derive`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod generic;
pub mod optics;

#[cfg(feature = "derive")]
pub use refract_derive::Structural;

pub use generic::shape::Structural;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use refract::prelude::*;
/// ```
pub mod prelude {
    pub use crate::generic::{
        DeriveError, DerivedLens, DerivedOptional, DerivedPrism, DerivedTraversal, FieldOptic,
        Repr, Selector, Shape, Structural, field_optic, lens, optional, plate, prism,
        register_lens, register_optional, register_prism,
    };
    pub use crate::optics::{
        FunctionLens, FunctionOptional, FunctionPrism, Lens, Optional, Prism, Traversal,
    };

    #[cfg(feature = "derive")]
    pub use refract_derive::Structural;
}
