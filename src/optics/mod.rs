//! Optics for immutable data manipulation.
//!
//! This module provides the optic algebra the derivation engine in
//! [`crate::generic`] targets: composable accessors for reading and
//! updating parts of immutable data structures.
//!
//! # Optics Hierarchy
//!
//! ```text
//! Lens  <: Traversal      (exactly one focus)
//! Prism <: Traversal      (zero or one focus, with a constructor)
//! Lens + Prism = Optional (zero or one focus)
//! ```
//!
//! # Available Optics
//!
//! - [`Lens`]: focus on a single field (view/set access, total)
//! - [`Prism`]: focus on a constructor of a sum type (matching/review)
//! - [`Optional`]: focus on a value that may or may not be present
//! - [`Traversal`]: focus on zero or more elements in a defined order
//!
//! All optics here work with owned foci (`view(&S) -> A` rather than
//! `-> &A`): accessors produced by the generic derivation engine
//! materialize their focus from a structural representation and cannot
//! hand out references into the source. Hand-written accessors use the
//! same signatures so the two kinds compose and interchange freely.
//!
//! # Example
//!
//! ```
//! use refract::optics::Lens;
//! use refract::lens;
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Address { street: String, city: String }
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Person { name: String, address: Address }
//!
//! let address_lens = lens!(Person, address);
//! let street_lens = lens!(Address, street);
//! let person_street = address_lens.compose(street_lens);
//!
//! let person = Person {
//!     name: "Alice".to_string(),
//!     address: Address {
//!         street: "Main St".to_string(),
//!         city: "Tokyo".to_string(),
//!     },
//! };
//!
//! assert_eq!(person_street.view(&person), "Main St");
//! let updated = person_street.set(person, "Oak Ave".to_string());
//! assert_eq!(updated.address.street, "Oak Ave");
//! assert_eq!(updated.address.city, "Tokyo");
//! ```
//!
//! # Laws
//!
//! Every [`Lens`] must satisfy three laws:
//!
//! 1. **GetPut**: `lens.set(source, lens.view(&source)) == source`
//! 2. **PutGet**: `lens.view(&lens.set(source, value)) == value`
//! 3. **PutPut**: `lens.set(lens.set(source, v1), v2) == lens.set(source, v2)`
//!
//! Every [`Prism`] must satisfy two laws:
//!
//! 1. **MatchReview**: `prism.matching(prism.review(value)) == Ok(value)`
//! 2. **NoMatchIdentity**: if the source is a different constructor,
//!    `prism.matching(source)` returns `Err(source)` with the source
//!    untouched.

mod lens;
mod optional;
mod prism;
mod traversal;

pub use lens::ComposedLens;
pub use lens::FunctionLens;
pub use lens::Lens;

pub use prism::ComposedPrism;
pub use prism::FunctionPrism;
pub use prism::Prism;

pub use optional::FunctionOptional;
pub use optional::Optional;

pub use traversal::Traversal;
pub use traversal::VecTraversal;
