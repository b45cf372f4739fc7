//! Sort keys for server-side sorting (RFC 2891).
//!
//! A [`SortKey`] is an attribute type, a direction, and optionally an
//! ordering rule that replaces the type's own. The string form is
//! `[-]attr[:rule]`, with `-` meaning descending.
//!
//! Comparison is total: values that cannot be normalized compare equal, and a
//! key with no ordering rule at all considers every pair of values equal.
//! Entries missing the attribute always sort last, in both directions.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::attribute::Attribute;
use crate::entry::Entry;
use crate::error::{Result, SchemaError};
use crate::schema::{rules, AttributeType, MatchingRule, Schema};
use crate::value::ByteString;

#[derive(Debug, Clone)]
pub struct SortKey {
    attribute_type: Arc<AttributeType>,
    ascending: bool,
    ordering_rule: Option<Arc<dyn MatchingRule>>,
}

impl SortKey {
    pub fn new(attribute_type: Arc<AttributeType>, ascending: bool) -> Self {
        Self {
            attribute_type,
            ascending,
            ordering_rule: None,
        }
    }

    pub fn with_ordering_rule(mut self, rule: Arc<dyn MatchingRule>) -> Self {
        self.ordering_rule = Some(rule);
        self
    }

    /// Parses `[-]attr[:ruleNameOrOid]`.
    pub fn parse(text: &str, schema: &Schema) -> Result<Self> {
        let trimmed = text.trim();
        let (ascending, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (false, rest),
            None => (true, trimmed),
        };
        let (name, rule) = match rest.split_once(':') {
            Some((name, rule)) => (name, Some(rule)),
            None => (rest, None),
        };
        if name.is_empty() {
            return Err(invalid_sort_key(text, "missing attribute type"));
        }

        let key = SortKey::new(schema.attribute_type(name)?, ascending);
        match rule {
            None => Ok(key),
            Some("") => Err(invalid_sort_key(text, "empty ordering rule")),
            Some(rule) => {
                let found = rules::builtin_ordering_rule(rule).ok_or_else(|| {
                    if rules::builtin_rule(rule).is_some() {
                        invalid_sort_key(text, format!("'{}' is not an ordering rule", rule))
                    } else {
                        invalid_sort_key(text, format!("unknown ordering rule '{}'", rule))
                    }
                })?;
                Ok(key.with_ordering_rule(found))
            }
        }
    }

    pub fn attribute_type(&self) -> &Arc<AttributeType> {
        &self.attribute_type
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// The explicitly configured rule, if any.
    pub fn ordering_rule(&self) -> Option<&dyn MatchingRule> {
        self.ordering_rule.as_deref()
    }

    /// The explicit rule, else the attribute type's ordering rule.
    pub fn effective_ordering_rule(&self) -> Option<&dyn MatchingRule> {
        self.ordering_rule()
            .or_else(|| self.attribute_type.ordering_matching_rule())
    }

    /// Orders two values for this key. Absent values sort last.
    pub fn compare_values(&self, a: Option<&ByteString>, b: Option<&ByteString>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => {
                let ordering = self.compare_present(a, b);
                if self.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            }
        }
    }

    /// Ascending comparison of two present values.
    fn compare_present(&self, a: &ByteString, b: &ByteString) -> Ordering {
        let Some(rule) = self.effective_ordering_rule() else {
            return Ordering::Equal;
        };
        match (
            rule.normalize_attribute_value(a.as_bytes()),
            rule.normalize_attribute_value(b.as_bytes()),
        ) {
            (Ok(a), Ok(b)) => rule.compare_normalized(&a, &b),
            (Err(err), _) | (_, Err(err)) => {
                tracing::trace!(%err, "treating unsortable values as equal");
                Ordering::Equal
            }
        }
    }

    /// The value an entry sorts by: its smallest value for ascending keys,
    /// its largest for descending ones.
    pub fn sort_value(&self, entry: &Entry) -> Option<ByteString> {
        let values = entry
            .attributes_of_type(&self.attribute_type)
            .flat_map(|attribute| attribute.values());
        if self.ascending {
            values.min_by(|a, b| self.compare_present(a, b))
        } else {
            values.max_by(|a, b| self.compare_present(a, b))
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ascending {
            f.write_str("-")?;
        }
        f.write_str(self.attribute_type.name_or_oid())?;
        if let Some(rule) = &self.ordering_rule {
            write!(f, ":{}", rule.name())?;
        }
        Ok(())
    }
}

fn invalid_sort_key(input: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidSortKey {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// An ordered list of sort keys; later keys break ties of earlier ones.
#[derive(Debug, Clone, Default)]
pub struct SortOrder {
    keys: Vec<SortKey>,
}

impl SortOrder {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    /// Parses a comma-separated list of sort keys, e.g. `sn,-givenName`.
    pub fn parse(text: &str, schema: &Schema) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(invalid_sort_key(text, "no sort keys"));
        }
        let keys = text
            .split(',')
            .map(|key| SortKey::parse(key, schema))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn compare_entries(&self, a: &Entry, b: &Entry) -> Ordering {
        for key in &self.keys {
            let (left, right) = (key.sort_value(a), key.sort_value(b));
            let ordering = key.compare_values(left.as_ref(), right.as_ref());
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::RealAttribute;

    fn schema_type(name: &str) -> Arc<AttributeType> {
        Schema::core().attribute_type(name).unwrap()
    }

    fn bs(s: &str) -> ByteString {
        ByteString::from(s)
    }

    #[test]
    fn no_ordering_rule_compares_equal() {
        let key = SortKey::new(schema_type("mail"), true);
        assert!(key.effective_ordering_rule().is_none());
        assert_eq!(key.compare_values(Some(&bs("a")), Some(&bs("z"))), Ordering::Equal);
    }

    #[test]
    fn absent_values_sort_last_in_both_directions() {
        for ascending in [true, false] {
            let key = SortKey::new(schema_type("cn"), ascending);
            assert_eq!(key.compare_values(None, Some(&bs("a"))), Ordering::Greater);
            assert_eq!(key.compare_values(Some(&bs("a")), None), Ordering::Less);
            assert_eq!(key.compare_values(None, None), Ordering::Equal);
        }
    }

    #[test]
    fn descending_reverses_present_values() {
        let up = SortKey::new(schema_type("uidNumber"), true);
        let down = SortKey::new(schema_type("uidNumber"), false);
        assert_eq!(up.compare_values(Some(&bs("9")), Some(&bs("10"))), Ordering::Less);
        assert_eq!(down.compare_values(Some(&bs("9")), Some(&bs("10"))), Ordering::Greater);
    }

    #[test]
    fn explicit_rule_overrides_the_type() {
        let key = SortKey::new(schema_type("cn"), true)
            .with_ordering_rule(rules::CASE_EXACT_ORDERING_MATCH.shared());
        assert_eq!(key.compare_values(Some(&bs("B")), Some(&bs("a"))), Ordering::Less);
        let default = SortKey::new(schema_type("cn"), true);
        assert_eq!(default.compare_values(Some(&bs("B")), Some(&bs("a"))), Ordering::Greater);
    }

    #[test]
    fn normalization_failure_compares_equal() {
        let key = SortKey::new(schema_type("uidNumber"), true);
        assert_eq!(key.compare_values(Some(&bs("x")), Some(&bs("1"))), Ordering::Equal);
    }

    #[test]
    fn parses_direction_and_rule() {
        let schema = Schema::core();
        let key = SortKey::parse("-cn:caseExactOrderingMatch", &schema).unwrap();
        assert!(!key.is_ascending());
        assert_eq!(key.ordering_rule().unwrap().oid(), "2.5.13.6");
        assert_eq!(key.to_string(), "-cn:caseExactOrderingMatch");

        let key = SortKey::parse("uidNumber", &schema).unwrap();
        assert!(key.is_ascending());
        assert_eq!(key.to_string(), "uidNumber");
    }

    #[test]
    fn rejects_malformed_keys() {
        let schema = Schema::core();
        for bad in [
            "",
            "-",
            ":caseIgnoreOrderingMatch",
            "cn:",
            "cn:noSuchRule",
            "cn:caseIgnoreSubstringsMatch",
            "uidNumber:integerMatch",
        ] {
            let err = SortKey::parse(bad, &schema).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidSortKey { .. }), "{}", bad);
        }
        assert!(matches!(
            SortKey::parse("favoriteDrink", &schema),
            Err(SchemaError::UnknownAttributeType(_))
        ));
    }

    fn person(dn: &str, sn: &[&str], uid_number: Option<&str>) -> Entry {
        let mut entry = Entry::new(dn)
            .with_attribute(RealAttribute::create(schema_type("sn"), sn.iter().copied()));
        if let Some(n) = uid_number {
            entry.add_attribute(RealAttribute::create(schema_type("uidNumber"), [n]));
        }
        entry
    }

    #[test]
    fn multi_valued_attributes_sort_by_min_or_max() {
        let a = person("uid=a", &["Miller", "Adams"], None);
        let b = person("uid=b", &["Baker"], None);

        let up = SortOrder::parse("sn", &Schema::core()).unwrap();
        assert_eq!(up.compare_entries(&a, &b), Ordering::Less);

        let down = SortOrder::parse("-sn", &Schema::core()).unwrap();
        assert_eq!(down.compare_entries(&a, &b), Ordering::Less);
    }

    #[test]
    fn later_keys_break_ties() {
        let order = SortOrder::parse("sn, -uidNumber", &Schema::core()).unwrap();
        assert_eq!(order.to_string(), "sn,-uidNumber");

        let mut entries = vec![
            person("uid=a", &["Smith"], Some("5")),
            person("uid=b", &["Jones"], None),
            person("uid=c", &["Smith"], Some("12")),
            person("uid=d", &["Smith"], None),
        ];
        entries.sort_by(|x, y| order.compare_entries(x, y));
        let dns: Vec<_> = entries.iter().map(Entry::dn).collect();
        assert_eq!(dns, vec!["uid=b", "uid=c", "uid=a", "uid=d"]);
    }
}
