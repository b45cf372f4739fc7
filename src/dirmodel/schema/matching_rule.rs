//! Matching rules and the assertions built from them.
//!
//! A matching rule knows how to turn a raw value into a normalized form and how
//! to order two normalized forms. Everything else (equality, ordering,
//! substring and approximate assertions) is derived from those two primitives.
//!
//! Normalization can fail: `integerMatch` cannot make sense of `"abc"`. The
//! failure is a [`DecodeError`], returned as a value so that callers decide
//! explicitly how to degrade. Attribute comparison turns it into
//! [`ConditionResult::Undefined`](crate::ConditionResult::Undefined), hashing
//! falls back to the raw bytes, and sorting treats the pair as equal.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

use crate::value::ByteString;

/// A value could not be normalized under a matching rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot normalize value with {rule}: {reason}")]
pub struct DecodeError {
    pub rule: String,
    pub reason: String,
}

impl DecodeError {
    pub fn new(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}

/// Pluggable comparison function for attribute values.
pub trait MatchingRule: fmt::Debug + Send + Sync {
    /// Numeric object identifier, e.g. `2.5.13.2`.
    fn oid(&self) -> &str;

    /// Descriptive name, e.g. `caseIgnoreMatch`.
    fn name(&self) -> &str;

    /// Normalizes a stored attribute value.
    fn normalize_attribute_value(&self, value: &[u8]) -> Result<ByteString, DecodeError>;

    /// Normalizes a value supplied in an assertion (filter, compare request).
    fn normalize_assertion_value(&self, value: &[u8]) -> Result<ByteString, DecodeError> {
        self.normalize_attribute_value(value)
    }

    /// Normalizes one component of a substring assertion.
    ///
    /// Rules that trim surrounding whitespace should not do so here, otherwise
    /// `(cn=Bob *)` would behave like `(cn=Bob*)`.
    fn normalize_substring(&self, value: &[u8]) -> Result<ByteString, DecodeError> {
        self.normalize_assertion_value(value)
    }

    /// Orders two normalized values.
    fn compare_normalized(&self, a: &ByteString, b: &ByteString) -> Ordering {
        a.cmp(b)
    }
}

/// Components of a substring filter, `initial*any*any*final`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstringAssertion {
    pub initial: Option<ByteString>,
    pub any: Vec<ByteString>,
    pub r#final: Option<ByteString>,
}

impl SubstringAssertion {
    /// Checks a normalized value against already-normalized components.
    pub fn matches(&self, value: &[u8]) -> bool {
        let mut pos = 0;
        let mut limit = value.len();

        if let Some(initial) = &self.initial {
            if !value.starts_with(initial.as_bytes()) {
                return false;
            }
            pos = initial.len();
        }

        // The final component may not overlap the initial one.
        if let Some(fin) = &self.r#final {
            if fin.len() > limit - pos || !value.ends_with(fin.as_bytes()) {
                return false;
            }
            limit -= fin.len();
        }

        for part in &self.any {
            if part.is_empty() {
                continue;
            }
            match find(&value[pos..limit], part.as_bytes()) {
                Some(idx) => pos += idx + part.len(),
                None => return false,
            }
        }

        true
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[derive(Debug, Clone)]
enum AssertionKind {
    Equal(ByteString),
    GreaterOrEqual(ByteString),
    LessOrEqual(ByteString),
    Substring(SubstringAssertion),
}

/// An assertion value prepared against a matching rule.
///
/// Building the assertion normalizes the assertion value once; [`matches`]
/// is then evaluated against each normalized attribute value.
///
/// [`matches`]: Assertion::matches
#[derive(Debug, Clone)]
pub struct Assertion<'r> {
    rule: &'r dyn MatchingRule,
    kind: AssertionKind,
}

impl<'r> Assertion<'r> {
    pub fn equality(rule: &'r dyn MatchingRule, value: &[u8]) -> Result<Self, DecodeError> {
        let normalized = rule.normalize_assertion_value(value)?;
        Ok(Self {
            rule,
            kind: AssertionKind::Equal(normalized),
        })
    }

    pub fn greater_or_equal(
        rule: &'r dyn MatchingRule,
        value: &[u8],
    ) -> Result<Self, DecodeError> {
        let normalized = rule.normalize_assertion_value(value)?;
        Ok(Self {
            rule,
            kind: AssertionKind::GreaterOrEqual(normalized),
        })
    }

    pub fn less_or_equal(rule: &'r dyn MatchingRule, value: &[u8]) -> Result<Self, DecodeError> {
        let normalized = rule.normalize_assertion_value(value)?;
        Ok(Self {
            rule,
            kind: AssertionKind::LessOrEqual(normalized),
        })
    }

    /// Prepares a substring assertion. At least one component is required.
    pub fn substring(
        rule: &'r dyn MatchingRule,
        initial: Option<&ByteString>,
        any: &[ByteString],
        r#final: Option<&ByteString>,
    ) -> Result<Self, DecodeError> {
        if initial.is_none() && any.is_empty() && r#final.is_none() {
            return Err(DecodeError::new(
                rule.name(),
                "substring assertion has no components",
            ));
        }

        let initial = initial
            .map(|v| rule.normalize_substring(v.as_bytes()))
            .transpose()?;
        let any = any
            .iter()
            .map(|v| rule.normalize_substring(v.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        let r#final = r#final
            .map(|v| rule.normalize_substring(v.as_bytes()))
            .transpose()?;

        Ok(Self {
            rule,
            kind: AssertionKind::Substring(SubstringAssertion {
                initial,
                any,
                r#final,
            }),
        })
    }

    pub fn rule(&self) -> &'r dyn MatchingRule {
        self.rule
    }

    /// Evaluates the assertion against a value normalized by the same rule.
    pub fn matches(&self, normalized: &ByteString) -> bool {
        match &self.kind {
            AssertionKind::Equal(expected) => {
                self.rule.compare_normalized(normalized, expected) == Ordering::Equal
            }
            AssertionKind::GreaterOrEqual(bound) => {
                self.rule.compare_normalized(normalized, bound) != Ordering::Less
            }
            AssertionKind::LessOrEqual(bound) => {
                self.rule.compare_normalized(normalized, bound) != Ordering::Greater
            }
            AssertionKind::Substring(sub) => sub.matches(normalized.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Lowercase;

    impl MatchingRule for Lowercase {
        fn oid(&self) -> &str {
            "1.1.1"
        }

        fn name(&self) -> &str {
            "lowercaseMatch"
        }

        fn normalize_attribute_value(&self, value: &[u8]) -> Result<ByteString, DecodeError> {
            Ok(ByteString::from(value.to_ascii_lowercase()))
        }
    }

    fn sub(initial: Option<&str>, any: &[&str], fin: Option<&str>) -> SubstringAssertion {
        SubstringAssertion {
            initial: initial.map(ByteString::from),
            any: any.iter().map(|s| ByteString::from(*s)).collect(),
            r#final: fin.map(ByteString::from),
        }
    }

    #[test]
    fn substring_initial_and_final() {
        let assertion = sub(Some("ab"), &[], Some("yz"));
        assert!(assertion.matches(b"abcxyz"));
        assert!(assertion.matches(b"abyz"));
        assert!(!assertion.matches(b"xabyz"));
        assert!(!assertion.matches(b"abyzx"));
    }

    #[test]
    fn substring_final_cannot_overlap_initial() {
        let assertion = sub(Some("abc"), &[], Some("cde"));
        assert!(!assertion.matches(b"abcde"));
        assert!(assertion.matches(b"abccde"));
    }

    #[test]
    fn substring_any_parts_must_appear_in_order() {
        let assertion = sub(None, &["b", "d"], None);
        assert!(assertion.matches(b"abcde"));
        assert!(!assertion.matches(b"adcbe"));
    }

    #[test]
    fn substring_any_cannot_reuse_final() {
        let assertion = sub(None, &["de"], Some("de"));
        assert!(!assertion.matches(b"abde"));
        assert!(assertion.matches(b"dede"));
    }

    #[test]
    fn substring_assertion_needs_a_component() {
        let err = Assertion::substring(&Lowercase, None, &[], None).unwrap_err();
        assert_eq!(err.rule, "lowercaseMatch");
    }

    #[test]
    fn equality_assertion_uses_normalized_forms() {
        let assertion = Assertion::equality(&Lowercase, b"BoB").unwrap();
        assert!(assertion.matches(&ByteString::from("bob")));
        assert!(!assertion.matches(&ByteString::from("rob")));
    }

    #[test]
    fn ordering_assertions_are_inclusive() {
        let ge = Assertion::greater_or_equal(&Lowercase, b"M").unwrap();
        let le = Assertion::less_or_equal(&Lowercase, b"M").unwrap();
        let m = ByteString::from("m");
        assert!(ge.matches(&m) && le.matches(&m));
        assert!(ge.matches(&ByteString::from("z")));
        assert!(!le.matches(&ByteString::from("z")));
    }
}
