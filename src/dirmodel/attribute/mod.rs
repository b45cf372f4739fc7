//! # Attributes
//!
//! An attribute is zero or more values of one [`AttributeDescription`]. There
//! are exactly three kinds, all behind the [`Attribute`] trait:
//!
//! | Kind | Values come from | `is_virtual()` |
//! |------|------------------|----------------|
//! | [`RealAttribute`] | stored in the entry, insertion order | `false` |
//! | [`VirtualAttribute`] | computed by a [`VirtualAttributeProvider`] on access | `true` |
//! | [`CollectiveVirtualAttribute`] | a wrapped attribute, usually from a subentry | `true` |
//!
//! ## Comparisons
//!
//! Every comparison goes through the attribute type's matching rules and
//! answers with a [`ConditionResult`]:
//!
//! - **Undefined** when the needed rule is missing, when the assertion value
//!   cannot be normalized, or when nothing matched but some stored value could
//!   not be normalized.
//! - **True** as soon as one value matches.
//! - **False** otherwise.
//!
//! ## Shared behavior
//!
//! Equality, hashing and display are defined once, in [`attributes_equal`],
//! [`attribute_hash`] and [`fmt_attribute`], on top of the primitive trait
//! methods. Every variant and `dyn Attribute` use these, so a real attribute
//! and a virtual one with the same description and values compare equal.

mod builder;
mod collective;
mod description;
mod evaluate;
mod real;
mod virtual_attr;

pub use builder::AttributeBuilder;
pub use collective::CollectiveVirtualAttribute;
pub use description::{contains_all_options, contains_option, options_equal, AttributeDescription};
pub use real::RealAttribute;
pub use virtual_attr::{
    ConflictBehavior, EntryDnProvider, UserDefinedProvider, VirtualAttribute,
    VirtualAttributeProvider, VirtualAttributeRule,
};

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::condition::ConditionResult;
use crate::schema::AttributeType;
use crate::value::ByteString;

/// Iterator over attribute values. Each call to [`Attribute::values`] starts
/// a fresh pass.
pub type Values<'a> = Box<dyn Iterator<Item = ByteString> + 'a>;

/// Capability shared by real, virtual and collective attributes.
pub trait Attribute: fmt::Debug + Send + Sync {
    fn attribute_description(&self) -> &AttributeDescription;

    /// Membership under the equality matching rule.
    fn contains(&self, value: &ByteString) -> bool;

    fn size(&self) -> usize;

    fn values(&self) -> Values<'_>;

    fn is_virtual(&self) -> bool;

    fn approximately_equal_to(&self, assertion_value: &ByteString) -> ConditionResult;

    fn greater_than_or_equal_to(&self, assertion_value: &ByteString) -> ConditionResult;

    fn less_than_or_equal_to(&self, assertion_value: &ByteString) -> ConditionResult;

    fn matches_substring(
        &self,
        sub_initial: Option<&ByteString>,
        sub_any: &[ByteString],
        sub_final: Option<&ByteString>,
    ) -> ConditionResult;

    fn matches_equality_assertion(&self, assertion_value: &ByteString) -> ConditionResult;

    fn attribute_type(&self) -> &Arc<AttributeType> {
        self.attribute_description().attribute_type()
    }

    fn name(&self) -> &str {
        self.attribute_description().name()
    }

    /// Stops at the first value not contained.
    fn contains_all(&self, values: &[ByteString]) -> bool {
        values.iter().all(|v| self.contains(v))
    }

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn is_real(&self) -> bool {
        !self.is_virtual()
    }

    fn has_option(&self, option: &str) -> bool {
        self.attribute_description().has_option(option)
    }

    fn has_options(&self) -> bool {
        self.attribute_description().has_options()
    }

    fn options_equal(&self, options: &[String]) -> bool {
        self.attribute_description().options_equal(options)
    }
}

/// Same description, and every value of each side is contained in the other.
///
/// Duplicates and order do not matter.
pub fn attributes_equal(a: &dyn Attribute, b: &dyn Attribute) -> bool {
    a.attribute_description() == b.attribute_description()
        && b.values().all(|v| a.contains(&v))
        && a.values().all(|v| b.contains(&v))
}

/// Order-independent hash of an attribute.
///
/// The attribute type's hash plus the hash of each distinct value in its
/// equality-normalized form. A value the rule cannot normalize is hashed raw.
pub fn attribute_hash(attribute: &dyn Attribute) -> u64 {
    let attribute_type = attribute.attribute_type();
    let rule = attribute_type.equality_matching_rule();

    let distinct: BTreeSet<ByteString> = attribute
        .values()
        .map(|value| match rule.map(|r| r.normalize_attribute_value(value.as_bytes())) {
            Some(Ok(normalized)) => normalized,
            Some(Err(err)) => {
                tracing::trace!(%err, value = %value, "hashing unnormalized value");
                value
            }
            None => value,
        })
        .collect();

    distinct
        .iter()
        .fold(hash_of(attribute_type.as_ref()), |sum, value| {
            sum.wrapping_add(hash_of(value))
        })
}

/// Renders `Attribute(cn;lang-en, {Bob, bob})`.
pub fn fmt_attribute(attribute: &dyn Attribute, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Attribute({}, {{", attribute.attribute_description())?;
    for (i, value) in attribute.values().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", value)?;
    }
    f.write_str("})")
}

fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl<'a, 'b> PartialEq<dyn Attribute + 'b> for dyn Attribute + 'a {
    fn eq(&self, other: &(dyn Attribute + 'b)) -> bool {
        attributes_equal(self, other)
    }
}

impl Eq for dyn Attribute + '_ {}

impl Hash for dyn Attribute + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(attribute_hash(self));
    }
}

impl fmt::Display for dyn Attribute + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_attribute(self, f)
    }
}

/// Implements `PartialEq`, `Eq`, `Hash` and `Display` for a concrete variant
/// through the shared functions.
macro_rules! shared_identity {
    ($ty:ty $(, $($gen:tt)*)?) => {
        impl<$($($gen)*)?> PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $crate::attribute::attributes_equal(self, other)
            }
        }

        impl<$($($gen)*)?> Eq for $ty {}

        impl<$($($gen)*)?> std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                state.write_u64($crate::attribute::attribute_hash(self));
            }
        }

        impl<$($($gen)*)?> std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                $crate::attribute::fmt_attribute(self, f)
            }
        }
    };
}
pub(crate) use shared_identity;

/// Forwards every trait method through `**self`.
macro_rules! forward_through_deref {
    () => {
        fn attribute_description(&self) -> &AttributeDescription {
            (**self).attribute_description()
        }
        fn contains(&self, value: &ByteString) -> bool {
            (**self).contains(value)
        }
        fn size(&self) -> usize {
            (**self).size()
        }
        fn values(&self) -> Values<'_> {
            (**self).values()
        }
        fn is_virtual(&self) -> bool {
            (**self).is_virtual()
        }
        fn approximately_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
            (**self).approximately_equal_to(assertion_value)
        }
        fn greater_than_or_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
            (**self).greater_than_or_equal_to(assertion_value)
        }
        fn less_than_or_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
            (**self).less_than_or_equal_to(assertion_value)
        }
        fn matches_substring(
            &self,
            sub_initial: Option<&ByteString>,
            sub_any: &[ByteString],
            sub_final: Option<&ByteString>,
        ) -> ConditionResult {
            (**self).matches_substring(sub_initial, sub_any, sub_final)
        }
        fn matches_equality_assertion(&self, assertion_value: &ByteString) -> ConditionResult {
            (**self).matches_equality_assertion(assertion_value)
        }
        fn contains_all(&self, values: &[ByteString]) -> bool {
            (**self).contains_all(values)
        }
        fn is_empty(&self) -> bool {
            (**self).is_empty()
        }
    };
}

impl<A: Attribute + ?Sized> Attribute for &A {
    forward_through_deref!();
}

impl<A: Attribute + ?Sized> Attribute for Arc<A> {
    forward_through_deref!();
}

impl<A: Attribute + ?Sized> Attribute for Box<A> {
    forward_through_deref!();
}
