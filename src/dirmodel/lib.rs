//! # Dirmodel Architecture
//!
//! Dirmodel is the **attribute model of a directory server**: how attribute values are
//! stored, described, compared and sorted. It does no I/O and speaks no protocol; a server,
//! an LDIF tool or a test harness can all sit on top of it.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Entries and sorting (entry.rs, sort_key.rs)                │
//! │  - An entry's visible attributes, real plus virtual         │
//! │  - RFC 2891 sort keys over entries                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Attributes (attribute/)                                    │
//! │  - One Attribute trait, three variants                      │
//! │  - Real, virtual (provider-backed), collective (wrapper)    │
//! │  - Three-valued comparisons through matching rules          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Schema (schema/)                                           │
//! │  - Attribute types with optional matching rules             │
//! │  - Built-in RFC 4517 rules, a name/OID catalog              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Comparisons Never Fail
//!
//! Matching rules return `Result`, because real data contains values a rule cannot make
//! sense of. Everything above the rules turns those failures into a documented fallback
//! instead of an error:
//!
//! - filter-style comparisons answer [`ConditionResult::Undefined`]
//! - hashing uses the raw bytes
//! - sorting treats the pair as equal
//!
//! Only construction and parsing (descriptions, sort keys, configuration) return
//! [`SchemaError`].
//!
//! ## Module Overview
//!
//! - [`value`]: `ByteString`, the shared immutable value type
//! - [`condition`]: Three-valued filter results
//! - [`schema`]: Attribute types, matching rules and the schema catalog
//! - [`attribute`]: Attribute descriptions, the `Attribute` trait and its variants
//! - [`entry`]: Entries and virtual attribute resolution
//! - [`sort_key`]: Sort keys and sort orders
//! - [`config`]: Configuration management
//! - [`error`]: Error types
//! - `test_utils`: Fixtures, behind the `test_utils` feature

pub mod attribute;
pub mod condition;
pub mod config;
pub mod entry;
pub mod error;
pub mod schema;
pub mod sort_key;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod value;

pub use attribute::{
    Attribute, AttributeBuilder, AttributeDescription, CollectiveVirtualAttribute, RealAttribute,
    VirtualAttribute, VirtualAttributeProvider, VirtualAttributeRule,
};
pub use condition::ConditionResult;
pub use config::SchemaConfig;
pub use entry::Entry;
pub use error::{Result, SchemaError};
pub use schema::{AttributeType, MatchingRule, Schema};
pub use sort_key::{SortKey, SortOrder};
pub use value::ByteString;
