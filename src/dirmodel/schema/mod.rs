//! # Schema
//!
//! The schema side of the model: attribute types, the matching rules they
//! reference, and a catalog to resolve names.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`MatchingRule`] | Normalizes values and orders normalized forms |
//! | [`Assertion`] | An assertion value prepared against a rule |
//! | [`AttributeType`] | OID, names, superior and the four optional rules |
//! | [`Schema`] | Name/OID lookup plus parsing configuration |
//!
//! Matching rules are plain trait objects, so callers can plug their own in
//! next to the [`rules`] this crate ships.

mod attribute_type;
mod matching_rule;
mod registry;
pub mod rules;

pub use attribute_type::{AttributeType, AttributeTypeBuilder};
pub use matching_rule::{Assertion, DecodeError, MatchingRule, SubstringAssertion};
pub use registry::{Schema, SchemaBuilder};
