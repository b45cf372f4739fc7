use once_cell::sync::OnceCell;
use std::cmp::Ordering;
use std::sync::Arc;

use super::{evaluate, shared_identity, Attribute, AttributeDescription, Values};
use crate::condition::ConditionResult;
use crate::schema::{Assertion, AttributeType, DecodeError, MatchingRule};
use crate::value::ByteString;

#[derive(Debug, Clone)]
struct StoredValue {
    value: ByteString,
    /// Equality-normalized form, computed on first use.
    normalized: OnceCell<Result<ByteString, DecodeError>>,
}

impl StoredValue {
    fn new(value: ByteString) -> Self {
        Self {
            value,
            normalized: OnceCell::new(),
        }
    }

    fn normalized(&self, rule: &dyn MatchingRule) -> &Result<ByteString, DecodeError> {
        self.normalized
            .get_or_init(|| rule.normalize_attribute_value(self.value.as_bytes()))
    }
}

/// An attribute whose values are stored in the entry.
///
/// Values keep insertion order and the user's spelling. Nothing is
/// de-duplicated here; use [`AttributeBuilder`](super::AttributeBuilder) to
/// collapse values that are equal under the equality rule.
#[derive(Debug, Clone)]
pub struct RealAttribute {
    description: AttributeDescription,
    values: Vec<StoredValue>,
}

impl RealAttribute {
    pub fn new<I, V>(description: AttributeDescription, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ByteString>,
    {
        Self {
            description,
            values: values
                .into_iter()
                .map(|v| StoredValue::new(v.into()))
                .collect(),
        }
    }

    pub fn empty(description: AttributeDescription) -> Self {
        Self {
            description,
            values: Vec::new(),
        }
    }

    /// An attribute without options.
    pub fn create<I, V>(attribute_type: Arc<AttributeType>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ByteString>,
    {
        Self::new(AttributeDescription::create(attribute_type), values)
    }

    fn raw_values(&self) -> impl Iterator<Item = ByteString> + '_ {
        self.values.iter().map(|v| v.value.clone())
    }

    fn contains_raw(&self, value: &ByteString) -> bool {
        self.values.iter().any(|v| v.value == *value)
    }
}

impl Attribute for RealAttribute {
    fn attribute_description(&self) -> &AttributeDescription {
        &self.description
    }

    fn contains(&self, value: &ByteString) -> bool {
        let Some(rule) = self.description.attribute_type().equality_matching_rule() else {
            return self.contains_raw(value);
        };

        let wanted = match rule.normalize_attribute_value(value.as_bytes()) {
            Ok(wanted) => wanted,
            Err(err) => {
                tracing::trace!(%err, "comparing raw value");
                return self.contains_raw(value);
            }
        };

        self.values.iter().any(|stored| match stored.normalized(rule) {
            Ok(normalized) => rule.compare_normalized(normalized, &wanted) == Ordering::Equal,
            Err(_) => stored.value == *value,
        })
    }

    fn size(&self) -> usize {
        self.values.len()
    }

    fn values(&self) -> Values<'_> {
        Box::new(self.raw_values())
    }

    fn is_virtual(&self) -> bool {
        false
    }

    fn approximately_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
        evaluate::approximately_equal(self.attribute_type(), self.raw_values(), assertion_value)
    }

    fn greater_than_or_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
        evaluate::greater_or_equal(self.attribute_type(), self.raw_values(), assertion_value)
    }

    fn less_than_or_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
        evaluate::less_or_equal(self.attribute_type(), self.raw_values(), assertion_value)
    }

    fn matches_substring(
        &self,
        sub_initial: Option<&ByteString>,
        sub_any: &[ByteString],
        sub_final: Option<&ByteString>,
    ) -> ConditionResult {
        evaluate::substring(
            self.attribute_type(),
            self.raw_values(),
            sub_initial,
            sub_any,
            sub_final,
        )
    }

    fn matches_equality_assertion(&self, assertion_value: &ByteString) -> ConditionResult {
        let Some(rule) = self.description.attribute_type().equality_matching_rule() else {
            return ConditionResult::Undefined;
        };
        evaluate::evaluate(
            Assertion::equality(rule, assertion_value.as_bytes()),
            self.values.iter().map(|v| v.normalized(rule).clone()),
        )
    }
}

shared_identity!(RealAttribute);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn schema_type(name: &str) -> Arc<AttributeType> {
        Schema::core().attribute_type(name).unwrap()
    }

    fn bs(s: &str) -> ByteString {
        ByteString::from(s)
    }

    #[test]
    fn keeps_case_variants_as_separate_values() {
        let cn = RealAttribute::create(schema_type("cn"), ["Bob", "bob"]);
        assert!(cn.contains(&bs("BOB")));
        assert_eq!(cn.size(), 2);
        let listed: Vec<_> = cn.values().collect();
        assert_eq!(listed, vec![bs("Bob"), bs("bob")]);
    }

    #[test]
    fn empty_attribute_has_no_values() {
        let cn = RealAttribute::empty(AttributeDescription::create(schema_type("cn")));
        assert!(cn.is_empty());
        assert_eq!(cn.values().count(), 0);
        assert!(!cn.contains(&bs("x")));
        assert!(cn.is_real());
    }

    #[test]
    fn approximate_without_rule_is_undefined() {
        let cn = RealAttribute::create(schema_type("cn"), ["Bob"]);
        assert_eq!(cn.approximately_equal_to(&bs("Bob")), ConditionResult::Undefined);
    }

    #[test]
    fn equality_assertion_follows_the_rule() {
        let cn = RealAttribute::create(schema_type("cn"), ["Barbara  Jensen"]);
        assert_eq!(
            cn.matches_equality_assertion(&bs("barbara jensen")),
            ConditionResult::True
        );
        assert_eq!(cn.matches_equality_assertion(&bs("babs")), ConditionResult::False);
    }

    #[test]
    fn equality_assertion_without_rule_is_undefined() {
        let bare = AttributeType::builder("1.1").name("bare").build();
        let attr = RealAttribute::create(Arc::new(bare), ["x"]);
        assert!(attr.matches_equality_assertion(&bs("x")).is_undefined());
        assert!(attr.contains(&bs("x")));
        assert!(!attr.contains(&bs("X")));
    }

    #[test]
    fn ordering_uses_numeric_rule() {
        let uid = RealAttribute::create(schema_type("uidNumber"), ["9"]);
        assert_eq!(uid.greater_than_or_equal_to(&bs("10")), ConditionResult::False);
        assert_eq!(uid.less_than_or_equal_to(&bs("10")), ConditionResult::True);
        assert_eq!(uid.greater_than_or_equal_to(&bs("9")), ConditionResult::True);
    }

    #[test]
    fn unnormalizable_values_make_misses_undefined() {
        let uid = RealAttribute::create(schema_type("uidNumber"), ["oops", "3"]);
        assert_eq!(uid.matches_equality_assertion(&bs("3")), ConditionResult::True);
        assert_eq!(
            uid.matches_equality_assertion(&bs("4")),
            ConditionResult::Undefined
        );
        assert!(uid.contains(&bs("oops")));
    }

    #[test]
    fn substring_uses_substring_rule() {
        let cn = RealAttribute::create(schema_type("cn"), ["Barbara Jensen"]);
        assert_eq!(
            cn.matches_substring(Some(&bs("bar")), &[], Some(&bs("SEN"))),
            ConditionResult::True
        );
        assert_eq!(
            cn.matches_substring(None, &[bs("jen"), bs("bar")], None),
            ConditionResult::False
        );
        assert!(cn.matches_substring(None, &[], None).is_undefined());
    }

    #[derive(Debug, Default)]
    struct CountingRule {
        calls: AtomicUsize,
    }

    impl MatchingRule for CountingRule {
        fn oid(&self) -> &str {
            "1.1.99"
        }

        fn name(&self) -> &str {
            "countingMatch"
        }

        fn normalize_attribute_value(&self, value: &[u8]) -> Result<ByteString, DecodeError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(ByteString::from(value.to_ascii_lowercase()))
        }
    }

    #[test]
    fn stored_values_are_normalized_once() {
        let rule = Arc::new(CountingRule::default());
        let counted = AttributeType::builder("1.1")
            .name("counted")
            .equality(rule.clone())
            .build();
        let attr = RealAttribute::create(Arc::new(counted), ["A", "B"]);

        assert!(attr.contains(&bs("b")));
        assert!(attr.contains(&bs("a")));
        assert_eq!(attr.matches_equality_assertion(&bs("c")), ConditionResult::False);

        // Two stored values plus one normalization per lookup.
        assert_eq!(rule.calls.load(AtomicOrdering::SeqCst), 5);
    }

    #[test]
    fn clone_is_equal() {
        let mail = RealAttribute::create(schema_type("mail"), ["A@example.com"]);
        let copy = mail.clone();
        assert_eq!(mail, copy);
        assert!(copy.contains(&bs("a@EXAMPLE.com")));
    }
}
