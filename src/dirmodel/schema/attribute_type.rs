//! Attribute type definitions.
//!
//! An attribute type bundles an identity (OID and names) with the matching
//! rules used to compare its values. Any of the four rules may be absent. A
//! type without its own rule inherits the rule of its superior type, so
//! `cn` compares like `name` unless told otherwise.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::matching_rule::MatchingRule;
use super::rules;

#[derive(Debug, Clone)]
pub struct AttributeType {
    oid: String,
    names: Vec<String>,
    /// Lower-cased primary name (or OID when unnamed), used for ordering.
    sort_name: String,
    oid_key: String,
    superior: Option<Arc<AttributeType>>,
    equality: Option<Arc<dyn MatchingRule>>,
    ordering: Option<Arc<dyn MatchingRule>>,
    substring: Option<Arc<dyn MatchingRule>>,
    approximate: Option<Arc<dyn MatchingRule>>,
    single_value: bool,
    collective: bool,
    operational: bool,
    placeholder: bool,
}

impl AttributeType {
    pub fn builder(oid: impl Into<String>) -> AttributeTypeBuilder {
        AttributeTypeBuilder::new(oid)
    }

    /// Stand-in for a name the schema does not define.
    ///
    /// Placeholders compare values case-insensitively, which is what most
    /// unknown string attributes expect.
    pub fn placeholder(name: &str) -> Self {
        AttributeType::builder(format!("{}-oid", name.to_lowercase()))
            .name(name)
            .equality(rules::CASE_IGNORE_MATCH.shared())
            .substring(rules::CASE_IGNORE_SUBSTRINGS_MATCH.shared())
            .placeholder()
            .build()
    }

    pub fn oid(&self) -> &str {
        &self.oid
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The primary name, or the OID when the type has no names.
    pub fn name_or_oid(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.oid)
    }

    /// Checks a name or OID against this type, ignoring case.
    pub fn has_name(&self, name_or_oid: &str) -> bool {
        self.oid.eq_ignore_ascii_case(name_or_oid)
            || self.names.iter().any(|n| n.eq_ignore_ascii_case(name_or_oid))
    }

    pub fn superior(&self) -> Option<&Arc<AttributeType>> {
        self.superior.as_ref()
    }

    pub fn equality_matching_rule(&self) -> Option<&dyn MatchingRule> {
        self.inherited(|t| t.equality.as_ref())
    }

    pub fn ordering_matching_rule(&self) -> Option<&dyn MatchingRule> {
        self.inherited(|t| t.ordering.as_ref())
    }

    pub fn substring_matching_rule(&self) -> Option<&dyn MatchingRule> {
        self.inherited(|t| t.substring.as_ref())
    }

    pub fn approximate_matching_rule(&self) -> Option<&dyn MatchingRule> {
        self.inherited(|t| t.approximate.as_ref())
    }

    fn inherited<F>(&self, rule: F) -> Option<&dyn MatchingRule>
    where
        F: Fn(&AttributeType) -> Option<&Arc<dyn MatchingRule>>,
    {
        let mut current = Some(self);
        while let Some(t) = current {
            if let Some(found) = rule(t) {
                return Some(found.as_ref());
            }
            current = t.superior.as_deref();
        }
        None
    }

    pub fn is_single_value(&self) -> bool {
        self.single_value
    }

    pub fn is_collective(&self) -> bool {
        self.collective
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// True if `other` is this type or one of its superiors.
    pub fn is_sub_type_of(&self, other: &AttributeType) -> bool {
        let mut current = Some(self);
        while let Some(t) = current {
            if t == other {
                return true;
            }
            current = t.superior.as_deref();
        }
        false
    }

    pub fn is_super_type_of(&self, other: &AttributeType) -> bool {
        other.is_sub_type_of(self)
    }

    /// Equality, hashing and ordering all use this key so that `Eq` agrees
    /// with `Ord`: two definitions sharing an OID under different primary
    /// names are distinct types.
    fn key(&self) -> (&str, &str) {
        (&self.sort_name, &self.oid_key)
    }
}

impl PartialEq for AttributeType {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for AttributeType {}

impl Hash for AttributeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for AttributeType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttributeType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name_or_oid())
    }
}

/// Chained construction of an [`AttributeType`].
#[derive(Debug, Clone)]
pub struct AttributeTypeBuilder {
    inner: AttributeType,
}

impl AttributeTypeBuilder {
    fn new(oid: impl Into<String>) -> Self {
        Self {
            inner: AttributeType {
                oid: oid.into(),
                names: Vec::new(),
                sort_name: String::new(),
                oid_key: String::new(),
                superior: None,
                equality: None,
                ordering: None,
                substring: None,
                approximate: None,
                single_value: false,
                collective: false,
                operational: false,
                placeholder: false,
            },
        }
    }

    /// Adds a name. The first name added is the primary name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.names.push(name.into());
        self
    }

    pub fn superior(mut self, superior: Arc<AttributeType>) -> Self {
        self.inner.superior = Some(superior);
        self
    }

    pub fn equality(mut self, rule: Arc<dyn MatchingRule>) -> Self {
        self.inner.equality = Some(rule);
        self
    }

    pub fn ordering(mut self, rule: Arc<dyn MatchingRule>) -> Self {
        self.inner.ordering = Some(rule);
        self
    }

    pub fn substring(mut self, rule: Arc<dyn MatchingRule>) -> Self {
        self.inner.substring = Some(rule);
        self
    }

    pub fn approximate(mut self, rule: Arc<dyn MatchingRule>) -> Self {
        self.inner.approximate = Some(rule);
        self
    }

    pub fn single_value(mut self) -> Self {
        self.inner.single_value = true;
        self
    }

    pub fn collective(mut self) -> Self {
        self.inner.collective = true;
        self
    }

    pub fn operational(mut self) -> Self {
        self.inner.operational = true;
        self
    }

    fn placeholder(mut self) -> Self {
        self.inner.placeholder = true;
        self
    }

    pub fn build(mut self) -> AttributeType {
        self.inner.sort_name = self.inner.name_or_oid().to_lowercase();
        self.inner.oid_key = self.inner.oid.to_ascii_lowercase();
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::rules::{CASE_EXACT_MATCH, CASE_IGNORE_MATCH, CASE_IGNORE_ORDERING_MATCH};

    fn name_type() -> Arc<AttributeType> {
        Arc::new(
            AttributeType::builder("2.5.4.41")
                .name("name")
                .equality(CASE_IGNORE_MATCH.shared())
                .ordering(CASE_IGNORE_ORDERING_MATCH.shared())
                .build(),
        )
    }

    #[test]
    fn rules_are_inherited_from_superior() {
        let cn = AttributeType::builder("2.5.4.3")
            .name("cn")
            .name("commonName")
            .superior(name_type())
            .build();

        assert_eq!(cn.equality_matching_rule().unwrap().name(), "caseIgnoreMatch");
        assert_eq!(
            cn.ordering_matching_rule().unwrap().name(),
            "caseIgnoreOrderingMatch"
        );
        assert!(cn.approximate_matching_rule().is_none());
    }

    #[test]
    fn own_rule_overrides_superior() {
        let exact = AttributeType::builder("1.2.3")
            .name("exactName")
            .superior(name_type())
            .equality(CASE_EXACT_MATCH.shared())
            .build();
        assert_eq!(exact.equality_matching_rule().unwrap().name(), "caseExactMatch");
    }

    #[test]
    fn names_match_case_insensitively() {
        let cn = AttributeType::builder("2.5.4.3")
            .name("cn")
            .name("commonName")
            .build();
        assert!(cn.has_name("CN"));
        assert!(cn.has_name("commonname"));
        assert!(cn.has_name("2.5.4.3"));
        assert!(!cn.has_name("sn"));
        assert_eq!(cn.name_or_oid(), "cn");
    }

    #[test]
    fn orders_by_primary_name() {
        let cn = AttributeType::builder("2.5.4.3").name("cn").build();
        let sn = AttributeType::builder("2.5.4.4").name("SN").build();
        assert!(cn < sn);
        assert_eq!(cn.cmp(&cn.clone()), Ordering::Equal);
    }

    #[test]
    fn equality_agrees_with_ordering() {
        let cn = AttributeType::builder("2.5.4.3").name("cn").build();
        let upper = AttributeType::builder("2.5.4.3").name("CN").build();
        let renamed = AttributeType::builder("2.5.4.3").name("commonName").build();
        assert_eq!(cn, upper);
        assert_eq!(cn.cmp(&upper), Ordering::Equal);
        assert_ne!(cn, renamed);
        assert_ne!(cn.cmp(&renamed), Ordering::Equal);
    }

    #[test]
    fn sub_type_walks_superior_chain() {
        let name = name_type();
        let cn = AttributeType::builder("2.5.4.3")
            .name("cn")
            .superior(Arc::clone(&name))
            .build();
        assert!(cn.is_sub_type_of(&name));
        assert!(cn.is_sub_type_of(&cn));
        assert!(name.is_super_type_of(&cn));
        assert!(!name.is_sub_type_of(&cn));
    }

    #[test]
    fn placeholder_types_ignore_case() {
        let custom = AttributeType::placeholder("favoriteDrink");
        assert!(custom.is_placeholder());
        assert_eq!(custom.oid(), "favoritedrink-oid");
        assert_eq!(
            custom.equality_matching_rule().unwrap().name(),
            "caseIgnoreMatch"
        );
    }
}
