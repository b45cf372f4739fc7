//! Virtual attributes: values computed on access instead of stored.
//!
//! A [`VirtualAttributeRule`] ties an attribute type to a
//! [`VirtualAttributeProvider`] and decides which entries it applies to. A
//! [`VirtualAttribute`] is the rule seen through one entry; every read is
//! forwarded to the provider with that entry and rule, nothing is cached.
//!
//! Providers only have to produce values. The comparison methods have
//! defaults that evaluate against those values with the rule's attribute type,
//! and a provider can override any of them when it can answer more cheaply.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::{evaluate, shared_identity, Attribute, AttributeDescription, RealAttribute, Values};
use crate::condition::ConditionResult;
use crate::entry::Entry;
use crate::error::{Result, SchemaError};
use crate::schema::{rules, AttributeType, MatchingRule};
use crate::value::ByteString;

/// Computes the values of a virtual attribute for an entry.
pub trait VirtualAttributeProvider: fmt::Debug + Send + Sync {
    /// Single-valued providers are asked [`has_value`] instead of counting.
    ///
    /// [`has_value`]: VirtualAttributeProvider::has_value
    fn is_multi_valued(&self) -> bool;

    fn values(&self, entry: &Entry, rule: &VirtualAttributeRule) -> Vec<ByteString>;

    fn has_value(&self, entry: &Entry, rule: &VirtualAttributeRule) -> bool {
        !self.values(entry, rule).is_empty()
    }

    fn has_specific_value(
        &self,
        entry: &Entry,
        rule: &VirtualAttributeRule,
        value: &ByteString,
    ) -> bool {
        materialize(rule, self.values(entry, rule)).contains(value)
    }

    fn has_all_values(
        &self,
        entry: &Entry,
        rule: &VirtualAttributeRule,
        values: &[ByteString],
    ) -> bool {
        materialize(rule, self.values(entry, rule)).contains_all(values)
    }

    fn matches_equality_assertion(
        &self,
        entry: &Entry,
        rule: &VirtualAttributeRule,
        assertion_value: &ByteString,
    ) -> ConditionResult {
        evaluate::equal(rule.attribute_type(), self.values(entry, rule), assertion_value)
    }

    fn approximately_equal_to(
        &self,
        entry: &Entry,
        rule: &VirtualAttributeRule,
        assertion_value: &ByteString,
    ) -> ConditionResult {
        let values = self.values(entry, rule);
        evaluate::approximately_equal(rule.attribute_type(), values, assertion_value)
    }

    fn greater_than_or_equal_to(
        &self,
        entry: &Entry,
        rule: &VirtualAttributeRule,
        assertion_value: &ByteString,
    ) -> ConditionResult {
        let values = self.values(entry, rule);
        evaluate::greater_or_equal(rule.attribute_type(), values, assertion_value)
    }

    fn less_than_or_equal_to(
        &self,
        entry: &Entry,
        rule: &VirtualAttributeRule,
        assertion_value: &ByteString,
    ) -> ConditionResult {
        let values = self.values(entry, rule);
        evaluate::less_or_equal(rule.attribute_type(), values, assertion_value)
    }

    fn matches_substring(
        &self,
        entry: &Entry,
        rule: &VirtualAttributeRule,
        sub_initial: Option<&ByteString>,
        sub_any: &[ByteString],
        sub_final: Option<&ByteString>,
    ) -> ConditionResult {
        evaluate::substring(
            rule.attribute_type(),
            self.values(entry, rule),
            sub_initial,
            sub_any,
            sub_final,
        )
    }
}

fn materialize(rule: &VirtualAttributeRule, values: Vec<ByteString>) -> RealAttribute {
    RealAttribute::create(Arc::clone(rule.attribute_type()), values)
}

/// What to do when an entry already stores a real attribute of the type a
/// virtual attribute rule provides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictBehavior {
    #[default]
    RealOverridesVirtual,
    VirtualOverridesReal,
    MergeRealAndVirtual,
}

/// Binds a provider to an attribute type and a set of entries.
#[derive(Debug, Clone)]
pub struct VirtualAttributeRule {
    attribute_type: Arc<AttributeType>,
    provider: Arc<dyn VirtualAttributeProvider>,
    /// Normalized base DNs; empty applies everywhere.
    base_dns: Vec<ByteString>,
    conflict_behavior: ConflictBehavior,
}

impl VirtualAttributeRule {
    pub fn new(
        attribute_type: Arc<AttributeType>,
        provider: Arc<dyn VirtualAttributeProvider>,
    ) -> Self {
        Self {
            attribute_type,
            provider,
            base_dns: Vec::new(),
            conflict_behavior: ConflictBehavior::default(),
        }
    }

    /// Restricts the rule to entries at or below `dn`. May be repeated.
    pub fn with_base_dn(mut self, dn: &str) -> Result<Self> {
        let normalized = rules::DISTINGUISHED_NAME_MATCH
            .normalize_attribute_value(dn.as_bytes())
            .map_err(|source| SchemaError::InvalidBaseDn {
                dn: dn.to_string(),
                source,
            })?;
        self.base_dns.push(normalized);
        Ok(self)
    }

    pub fn with_conflict_behavior(mut self, behavior: ConflictBehavior) -> Self {
        self.conflict_behavior = behavior;
        self
    }

    pub fn attribute_type(&self) -> &Arc<AttributeType> {
        &self.attribute_type
    }

    pub fn provider(&self) -> &dyn VirtualAttributeProvider {
        self.provider.as_ref()
    }

    pub fn conflict_behavior(&self) -> ConflictBehavior {
        self.conflict_behavior
    }

    /// True if the entry's DN is one of the base DNs or below one of them.
    pub fn applies_to(&self, entry: &Entry) -> bool {
        if self.base_dns.is_empty() {
            return true;
        }
        let normalized =
            rules::DISTINGUISHED_NAME_MATCH.normalize_attribute_value(entry.dn().as_bytes());
        let dn = match normalized {
            Ok(dn) => dn,
            Err(err) => {
                tracing::trace!(%err, dn = entry.dn(), "entry DN does not normalize");
                return false;
            }
        };
        self.base_dns
            .iter()
            .any(|base| is_at_or_below(&dn.to_string_lossy(), &base.to_string_lossy()))
    }
}

/// Both DNs are normalized; the entry is at or below `base` when the base's
/// RDNs are a suffix of the entry's.
fn is_at_or_below(dn: &str, base: &str) -> bool {
    if base.is_empty() {
        return true;
    }
    let dn = rules::split_unescaped(dn, ',');
    let base = rules::split_unescaped(base, ',');
    dn.len() >= base.len() && dn[dn.len() - base.len()..] == base[..]
}

/// A rule's attribute as seen from one entry.
#[derive(Debug, Clone)]
pub struct VirtualAttribute<'a> {
    description: AttributeDescription,
    entry: &'a Entry,
    rule: &'a VirtualAttributeRule,
}

impl<'a> VirtualAttribute<'a> {
    pub fn new(
        attribute_type: Arc<AttributeType>,
        entry: &'a Entry,
        rule: &'a VirtualAttributeRule,
    ) -> Self {
        Self {
            description: AttributeDescription::create(attribute_type),
            entry,
            rule,
        }
    }

    pub fn entry(&self) -> &'a Entry {
        self.entry
    }

    pub fn rule(&self) -> &'a VirtualAttributeRule {
        self.rule
    }

    fn provider(&self) -> &'a dyn VirtualAttributeProvider {
        self.rule.provider()
    }
}

impl Attribute for VirtualAttribute<'_> {
    fn attribute_description(&self) -> &AttributeDescription {
        &self.description
    }

    fn contains(&self, value: &ByteString) -> bool {
        self.provider()
            .has_specific_value(self.entry, self.rule, value)
    }

    fn contains_all(&self, values: &[ByteString]) -> bool {
        self.provider().has_all_values(self.entry, self.rule, values)
    }

    fn size(&self) -> usize {
        let provider = self.provider();
        if provider.is_multi_valued() {
            provider.values(self.entry, self.rule).len()
        } else {
            usize::from(provider.has_value(self.entry, self.rule))
        }
    }

    fn is_empty(&self) -> bool {
        !self.provider().has_value(self.entry, self.rule)
    }

    fn values(&self) -> Values<'_> {
        Box::new(self.provider().values(self.entry, self.rule).into_iter())
    }

    fn is_virtual(&self) -> bool {
        true
    }

    fn approximately_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
        self.provider()
            .approximately_equal_to(self.entry, self.rule, assertion_value)
    }

    fn greater_than_or_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
        self.provider()
            .greater_than_or_equal_to(self.entry, self.rule, assertion_value)
    }

    fn less_than_or_equal_to(&self, assertion_value: &ByteString) -> ConditionResult {
        self.provider()
            .less_than_or_equal_to(self.entry, self.rule, assertion_value)
    }

    fn matches_substring(
        &self,
        sub_initial: Option<&ByteString>,
        sub_any: &[ByteString],
        sub_final: Option<&ByteString>,
    ) -> ConditionResult {
        self.provider()
            .matches_substring(self.entry, self.rule, sub_initial, sub_any, sub_final)
    }

    fn matches_equality_assertion(&self, assertion_value: &ByteString) -> ConditionResult {
        self.provider()
            .matches_equality_assertion(self.entry, self.rule, assertion_value)
    }
}

shared_identity!(VirtualAttribute<'a>, 'a);

/// Exposes the entry's own DN, as `entryDN` does.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryDnProvider;

impl VirtualAttributeProvider for EntryDnProvider {
    fn is_multi_valued(&self) -> bool {
        false
    }

    fn values(&self, entry: &Entry, _rule: &VirtualAttributeRule) -> Vec<ByteString> {
        vec![ByteString::from(entry.dn())]
    }

    fn has_value(&self, _entry: &Entry, _rule: &VirtualAttributeRule) -> bool {
        true
    }
}

/// Serves a fixed list of values to every entry the rule applies to.
#[derive(Debug, Clone, Default)]
pub struct UserDefinedProvider {
    values: Vec<ByteString>,
}

impl UserDefinedProvider {
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ByteString>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl VirtualAttributeProvider for UserDefinedProvider {
    fn is_multi_valued(&self) -> bool {
        self.values.len() != 1
    }

    fn values(&self, _entry: &Entry, _rule: &VirtualAttributeRule) -> Vec<ByteString> {
        self.values.clone()
    }

    fn has_value(&self, _entry: &Entry, _rule: &VirtualAttributeRule) -> bool {
        !self.values.is_empty()
    }
}
