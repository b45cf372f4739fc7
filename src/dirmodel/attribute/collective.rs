use super::{shared_identity, Attribute, AttributeDescription, Values};
use crate::condition::ConditionResult;
use crate::value::ByteString;

/// An attribute inherited from a collective attribute subentry.
///
/// Behaves exactly like the wrapped attribute except that it always reports
/// itself as virtual. `A` may be an owned attribute, an `Arc` or a reference.
#[derive(Debug, Clone)]
pub struct CollectiveVirtualAttribute<A: Attribute> {
    inner: A,
}

impl<A: Attribute> CollectiveVirtualAttribute<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

impl<A: Attribute> Attribute for CollectiveVirtualAttribute<A> {
    fn attribute_description(&self) -> &AttributeDescription {
        self.inner.attribute_description()
    }

    fn contains(&self, value: &ByteString) -> bool {
        self.inner.contains(value)
    }

    fn contains_all(&self, values: &[ByteString]) -> bool {
        self.inner.contains_all(values)
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn values(&self) -> Values<'_> {
        self.inner.values()
    }

    fn is_virtual(&self) -> bool {
        true
    }

    fn approximately_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
        self.inner.approximately_equal_to(assertion_value)
    }

    fn greater_than_or_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
        self.inner.greater_than_or_equal_to(assertion_value)
    }

    fn less_than_or_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
        self.inner.less_than_or_equal_to(assertion_value)
    }

    fn matches_substring(
        &self,
        sub_initial: Option<&ByteString>,
        sub_any: &[ByteString],
        sub_final: Option<&ByteString>,
    ) -> ConditionResult {
        self.inner.matches_substring(sub_initial, sub_any, sub_final)
    }

    fn matches_equality_assertion(&self, assertion_value: &ByteString) -> ConditionResult {
        self.inner.matches_equality_assertion(assertion_value)
    }
}

shared_identity!(CollectiveVirtualAttribute<A>, A: Attribute);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::RealAttribute;
    use crate::schema::Schema;
    use std::sync::Arc;

    fn real(values: &[&str]) -> RealAttribute {
        RealAttribute::create(
            Schema::core().attribute_type("telephoneNumber").unwrap(),
            values.iter().copied(),
        )
    }

    #[test]
    fn always_virtual_even_around_real() {
        let wrapped = CollectiveVirtualAttribute::new(real(&["+1 555 0100"]));
        assert!(wrapped.is_virtual());
        assert!(!wrapped.is_real());
        assert!(!wrapped.inner().is_virtual());
    }

    #[test]
    fn forwards_reads_to_the_delegate() {
        let inner = real(&["+1 555 0100", "+1 555 0199"]);
        let wrapped = CollectiveVirtualAttribute::new(&inner);
        assert_eq!(wrapped.size(), 2);
        assert!(wrapped.contains(&ByteString::from("+1  555 0199")));
        assert_eq!(
            wrapped.matches_substring(None, &[ByteString::from("0100")], None),
            ConditionResult::True
        );
        assert_eq!(wrapped.attribute_description(), inner.attribute_description());
    }

    #[test]
    fn wrapping_keeps_identity() {
        let shared = Arc::new(real(&["1", "2"]));
        let wrapped = CollectiveVirtualAttribute::new(Arc::clone(&shared));
        let a: &dyn Attribute = &wrapped;
        let b: &dyn Attribute = shared.as_ref();
        assert!(a == b);
        assert_eq!(
            crate::attribute::attribute_hash(a),
            crate::attribute::attribute_hash(b)
        );
        assert_eq!(wrapped.to_string(), "Attribute(telephoneNumber, {1, 2})");
    }

    #[test]
    fn empty_wrapper_is_empty() {
        let wrapped = CollectiveVirtualAttribute::new(real(&[]));
        assert!(wrapped.is_empty());
        assert_eq!(wrapped.values().count(), 0);
        assert_eq!(wrapped.into_inner().size(), 0);
    }
}
