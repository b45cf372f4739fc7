//! Fixtures for tests that need more than the core schema offers.
//!
//! Compiled for this crate's tests and, with the `test_utils` feature, for
//! downstream crates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::attribute::{VirtualAttributeProvider, VirtualAttributeRule};
use crate::entry::Entry;
use crate::schema::{rules, AttributeType, DecodeError, MatchingRule};
use crate::value::ByteString;

/// A virtual attribute provider that counts how often its values are
/// produced.
///
/// `has_value` is answered without producing values, so tests can check that
/// an operation did not enumerate.
#[derive(Debug, Default)]
pub struct CountingProvider {
    values: Vec<ByteString>,
    multi_valued: bool,
    value_calls: AtomicUsize,
}

impl CountingProvider {
    pub fn single(value: Option<&str>) -> Self {
        Self {
            values: value.map(ByteString::from).into_iter().collect(),
            multi_valued: false,
            value_calls: AtomicUsize::new(0),
        }
    }

    pub fn multi<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ByteString>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            multi_valued: true,
            value_calls: AtomicUsize::new(0),
        }
    }

    pub fn value_calls(&self) -> usize {
        self.value_calls.load(Ordering::SeqCst)
    }
}

impl VirtualAttributeProvider for CountingProvider {
    fn is_multi_valued(&self) -> bool {
        self.multi_valued
    }

    fn values(&self, _entry: &Entry, _rule: &VirtualAttributeRule) -> Vec<ByteString> {
        self.value_calls.fetch_add(1, Ordering::SeqCst);
        self.values.clone()
    }

    fn has_value(&self, _entry: &Entry, _rule: &VirtualAttributeRule) -> bool {
        !self.values.is_empty()
    }
}

/// Approximate matching that ignores case and everything but letters and
/// digits, so `Jensen`, `jen-sen` and `J. ENSEN` all match.
#[derive(Debug, Clone, Copy, Default)]
pub struct LooseMatch;

impl MatchingRule for LooseMatch {
    fn oid(&self) -> &str {
        "1.1.999.1"
    }

    fn name(&self) -> &str {
        "looseMatch"
    }

    fn normalize_attribute_value(&self, value: &[u8]) -> Result<ByteString, DecodeError> {
        let text = std::str::from_utf8(value)
            .map_err(|_| DecodeError::new(self.name(), "value is not valid UTF-8"))?;
        let folded: String = text
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        Ok(ByteString::from(folded))
    }
}

/// A `cn`-like directory string type that also has [`LooseMatch`] for
/// approximate matching.
pub fn approximate_name_type() -> Arc<AttributeType> {
    Arc::new(
        AttributeType::builder("1.1.999.2")
            .name("displayName")
            .equality(rules::CASE_IGNORE_MATCH.shared())
            .ordering(rules::CASE_IGNORE_ORDERING_MATCH.shared())
            .substring(rules::CASE_IGNORE_SUBSTRINGS_MATCH.shared())
            .approximate(Arc::new(LooseMatch))
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, RealAttribute};
    use crate::condition::ConditionResult;

    #[test]
    fn loose_match_folds_punctuation_and_case() {
        let display = RealAttribute::create(approximate_name_type(), ["Barbara Jensen"]);
        assert_eq!(
            display.approximately_equal_to(&ByteString::from("barbara-jensen")),
            ConditionResult::True
        );
        assert_eq!(
            display.approximately_equal_to(&ByteString::from("Babs Jensen")),
            ConditionResult::False
        );
    }

    #[test]
    fn counting_provider_counts_value_calls() {
        let provider = CountingProvider::multi(["a", "b"]);
        let rule = VirtualAttributeRule::new(
            approximate_name_type(),
            Arc::new(CountingProvider::single(None)),
        );
        let entry = Entry::new("dc=example,dc=com");
        assert!(provider.has_value(&entry, &rule));
        assert_eq!(provider.value_calls(), 0);
        assert_eq!(provider.values(&entry, &rule).len(), 2);
        assert_eq!(provider.value_calls(), 1);
    }
}
