//! Generic optics derived from structural shape descriptions.
//!
//! Any type implementing [`Structural`], usually via
//! `#[derive(Structural)]`, exposes a sum-of-products description of
//! itself. From that description alone, this module derives lenses
//! ([`lens`]), affine optics ([`optional`]), prisms ([`prism`]) and
//! deep traversals ([`plate`]) for string selectors, without
//! per-field boilerplate.
//!
//! All resolution work happens when an optic is derived: selectors are
//! resolved against the shape once, the focus type is checked once,
//! and the result is a bundle of prebuilt closures. Using a derived
//! optic never consults shape metadata again. Explicitly registered
//! optics ([`register_lens`] and friends) take priority over derived
//! ones for the same selector.

pub mod dispatch;
pub mod error;
pub mod instances;
pub mod path;
pub mod plate;
pub mod shape;
pub mod synth;

pub use dispatch::{
    FieldOptic, field_optic, lens, optional, prism, register_lens, register_optional,
    register_prism, registered_prism,
};
pub use error::DeriveError;
pub use path::{Absence, Path, PathArm, PathTree, Selector, resolve};
pub use plate::{DerivedTraversal, plate};
pub use shape::{FieldShape, Repr, Shape, Structural, TypeInfo, VariantShape};
pub use synth::{
    CompiledLens, CompiledOptional, DerivedLens, DerivedOptional, DerivedPrism,
    MAX_PAYLOAD_ARITY, VariantPayload, compile_lens, compile_optional, derive_lens,
    derive_optional, derive_prism,
};
