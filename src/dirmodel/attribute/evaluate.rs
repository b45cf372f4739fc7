//! Three-valued evaluation of assertions over a set of values.
//!
//! Every attribute variant answers its comparisons through these functions,
//! so the rules for Undefined live in one place.

use crate::condition::ConditionResult;
use crate::schema::{Assertion, AttributeType, DecodeError, MatchingRule};
use crate::value::ByteString;

/// Evaluates a prepared assertion against already-normalized values.
///
/// True on the first match. When nothing matched, a value that failed to
/// normalize makes the result Undefined.
pub(crate) fn evaluate<I>(
    assertion: Result<Assertion<'_>, DecodeError>,
    normalized: I,
) -> ConditionResult
where
    I: IntoIterator<Item = Result<ByteString, DecodeError>>,
{
    let assertion = match assertion {
        Ok(assertion) => assertion,
        Err(err) => {
            tracing::trace!(%err, "assertion value cannot be normalized");
            return ConditionResult::Undefined;
        }
    };

    let mut saw_failure = false;
    for value in normalized {
        match value {
            Ok(value) if assertion.matches(&value) => return ConditionResult::True,
            Ok(_) => {}
            Err(err) => {
                tracing::trace!(%err, rule = assertion.rule().name(), "skipping value");
                saw_failure = true;
            }
        }
    }

    if saw_failure {
        ConditionResult::Undefined
    } else {
        ConditionResult::False
    }
}

fn normalize_with<'r, I>(
    rule: &'r dyn MatchingRule,
    values: I,
) -> impl Iterator<Item = Result<ByteString, DecodeError>> + 'r
where
    I: IntoIterator<Item = ByteString>,
    I::IntoIter: 'r,
{
    values
        .into_iter()
        .map(move |value| rule.normalize_attribute_value(value.as_bytes()))
}

pub(crate) fn approximately_equal<I>(
    attribute_type: &AttributeType,
    values: I,
    assertion_value: &ByteString,
) -> ConditionResult
where
    I: IntoIterator<Item = ByteString>,
{
    match attribute_type.approximate_matching_rule() {
        Some(rule) => evaluate(
            Assertion::equality(rule, assertion_value.as_bytes()),
            normalize_with(rule, values),
        ),
        None => ConditionResult::Undefined,
    }
}

pub(crate) fn equal<I>(
    attribute_type: &AttributeType,
    values: I,
    assertion_value: &ByteString,
) -> ConditionResult
where
    I: IntoIterator<Item = ByteString>,
{
    match attribute_type.equality_matching_rule() {
        Some(rule) => evaluate(
            Assertion::equality(rule, assertion_value.as_bytes()),
            normalize_with(rule, values),
        ),
        None => ConditionResult::Undefined,
    }
}

pub(crate) fn greater_or_equal<I>(
    attribute_type: &AttributeType,
    values: I,
    assertion_value: &ByteString,
) -> ConditionResult
where
    I: IntoIterator<Item = ByteString>,
{
    match attribute_type.ordering_matching_rule() {
        Some(rule) => evaluate(
            Assertion::greater_or_equal(rule, assertion_value.as_bytes()),
            normalize_with(rule, values),
        ),
        None => ConditionResult::Undefined,
    }
}

pub(crate) fn less_or_equal<I>(
    attribute_type: &AttributeType,
    values: I,
    assertion_value: &ByteString,
) -> ConditionResult
where
    I: IntoIterator<Item = ByteString>,
{
    match attribute_type.ordering_matching_rule() {
        Some(rule) => evaluate(
            Assertion::less_or_equal(rule, assertion_value.as_bytes()),
            normalize_with(rule, values),
        ),
        None => ConditionResult::Undefined,
    }
}

pub(crate) fn substring<I>(
    attribute_type: &AttributeType,
    values: I,
    sub_initial: Option<&ByteString>,
    sub_any: &[ByteString],
    sub_final: Option<&ByteString>,
) -> ConditionResult
where
    I: IntoIterator<Item = ByteString>,
{
    match attribute_type.substring_matching_rule() {
        Some(rule) => evaluate(
            Assertion::substring(rule, sub_initial, sub_any, sub_final),
            normalize_with(rule, values),
        ),
        None => ConditionResult::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::rules;

    fn values(items: &[&str]) -> Vec<ByteString> {
        items.iter().map(|s| ByteString::from(*s)).collect()
    }

    #[test]
    fn first_match_wins_over_failures() {
        let rule = rules::INTEGER_MATCH.shared();
        let assertion = Assertion::equality(rule.as_ref(), b"7");
        let normalized = vec![
            Err(DecodeError::new("integerMatch", "not a number")),
            Ok(ByteString::from("7")),
        ];
        assert_eq!(evaluate(assertion, normalized), ConditionResult::True);
    }

    #[test]
    fn failure_without_match_is_undefined() {
        let uid_number = AttributeType::builder("1.1")
            .name("n")
            .equality(rules::INTEGER_MATCH.shared())
            .build();
        let found = equal(&uid_number, values(&["x", "8"]), &ByteString::from("7"));
        assert_eq!(found, ConditionResult::Undefined);
        let found = equal(&uid_number, values(&["9", "8"]), &ByteString::from("7"));
        assert_eq!(found, ConditionResult::False);
    }

    #[test]
    fn bad_assertion_value_is_undefined() {
        let uid_number = AttributeType::builder("1.1")
            .name("n")
            .equality(rules::INTEGER_MATCH.shared())
            .build();
        let found = equal(&uid_number, values(&["7"]), &ByteString::from("seven"));
        assert_eq!(found, ConditionResult::Undefined);
    }

    #[test]
    fn missing_rule_is_undefined() {
        let bare = AttributeType::builder("1.1").name("bare").build();
        let v = ByteString::from("a");
        assert!(approximately_equal(&bare, values(&["a"]), &v).is_undefined());
        assert!(greater_or_equal(&bare, values(&["a"]), &v).is_undefined());
        assert!(less_or_equal(&bare, values(&["a"]), &v).is_undefined());
        assert!(substring(&bare, values(&["a"]), Some(&v), &[], None).is_undefined());
    }
}
