//! Built-in matching rules.
//!
//! These are the RFC 4517 rules the core schema needs. Each equality rule has
//! a matching ordering rule sharing its normalization; only the OID and name
//! differ.
//!
//! | Name | OID | Normalization |
//! |------|-----|---------------|
//! | `caseIgnoreMatch` | 2.5.13.2 | trim, collapse spaces, lower-case |
//! | `caseExactMatch` | 2.5.13.5 | trim, collapse spaces |
//! | `octetStringMatch` | 2.5.13.17 | none |
//! | `integerMatch` | 2.5.13.14 | canonical decimal, numeric order |
//! | `distinguishedNameMatch` | 2.5.13.1 | trim around `,` and `=`, lower-case |

use std::cmp::Ordering;
use std::sync::Arc;

use super::matching_rule::{DecodeError, MatchingRule};
use crate::value::ByteString;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Normalizer {
    CaseIgnore,
    CaseExact,
    OctetString,
    Integer,
    DistinguishedName,
}

/// A matching rule implemented by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinRule {
    oid: &'static str,
    name: &'static str,
    normalizer: Normalizer,
}

impl BuiltinRule {
    const fn new(oid: &'static str, name: &'static str, normalizer: Normalizer) -> Self {
        Self {
            oid,
            name,
            normalizer,
        }
    }

    /// Wraps the rule for use in an [`AttributeType`](super::AttributeType).
    pub fn shared(self) -> Arc<dyn MatchingRule> {
        Arc::new(self)
    }
}

pub const DISTINGUISHED_NAME_MATCH: BuiltinRule = BuiltinRule::new(
    "2.5.13.1",
    "distinguishedNameMatch",
    Normalizer::DistinguishedName,
);
pub const CASE_IGNORE_MATCH: BuiltinRule =
    BuiltinRule::new("2.5.13.2", "caseIgnoreMatch", Normalizer::CaseIgnore);
pub const CASE_IGNORE_ORDERING_MATCH: BuiltinRule =
    BuiltinRule::new("2.5.13.3", "caseIgnoreOrderingMatch", Normalizer::CaseIgnore);
pub const CASE_IGNORE_SUBSTRINGS_MATCH: BuiltinRule = BuiltinRule::new(
    "2.5.13.4",
    "caseIgnoreSubstringsMatch",
    Normalizer::CaseIgnore,
);
pub const CASE_EXACT_MATCH: BuiltinRule =
    BuiltinRule::new("2.5.13.5", "caseExactMatch", Normalizer::CaseExact);
pub const CASE_EXACT_ORDERING_MATCH: BuiltinRule =
    BuiltinRule::new("2.5.13.6", "caseExactOrderingMatch", Normalizer::CaseExact);
pub const CASE_EXACT_SUBSTRINGS_MATCH: BuiltinRule =
    BuiltinRule::new("2.5.13.7", "caseExactSubstringsMatch", Normalizer::CaseExact);
pub const INTEGER_MATCH: BuiltinRule =
    BuiltinRule::new("2.5.13.14", "integerMatch", Normalizer::Integer);
pub const INTEGER_ORDERING_MATCH: BuiltinRule =
    BuiltinRule::new("2.5.13.15", "integerOrderingMatch", Normalizer::Integer);
pub const OCTET_STRING_MATCH: BuiltinRule =
    BuiltinRule::new("2.5.13.17", "octetStringMatch", Normalizer::OctetString);
pub const OCTET_STRING_ORDERING_MATCH: BuiltinRule = BuiltinRule::new(
    "2.5.13.18",
    "octetStringOrderingMatch",
    Normalizer::OctetString,
);

/// Every built-in rule, in OID order.
pub const BUILTIN_RULES: &[BuiltinRule] = &[
    DISTINGUISHED_NAME_MATCH,
    CASE_IGNORE_MATCH,
    CASE_IGNORE_ORDERING_MATCH,
    CASE_IGNORE_SUBSTRINGS_MATCH,
    CASE_EXACT_MATCH,
    CASE_EXACT_ORDERING_MATCH,
    CASE_EXACT_SUBSTRINGS_MATCH,
    INTEGER_MATCH,
    INTEGER_ORDERING_MATCH,
    OCTET_STRING_MATCH,
    OCTET_STRING_ORDERING_MATCH,
];

/// The built-in rules usable as ordering rules.
pub const ORDERING_RULES: &[BuiltinRule] = &[
    CASE_IGNORE_ORDERING_MATCH,
    CASE_EXACT_ORDERING_MATCH,
    INTEGER_ORDERING_MATCH,
    OCTET_STRING_ORDERING_MATCH,
];

/// Looks up a built-in rule by OID or case-insensitive name.
pub fn builtin_rule(name_or_oid: &str) -> Option<Arc<dyn MatchingRule>> {
    find_in(BUILTIN_RULES, name_or_oid)
}

/// Like [`builtin_rule`], restricted to [`ORDERING_RULES`].
pub fn builtin_ordering_rule(name_or_oid: &str) -> Option<Arc<dyn MatchingRule>> {
    find_in(ORDERING_RULES, name_or_oid)
}

fn find_in(table: &[BuiltinRule], name_or_oid: &str) -> Option<Arc<dyn MatchingRule>> {
    table
        .iter()
        .find(|rule| rule.oid == name_or_oid || rule.name.eq_ignore_ascii_case(name_or_oid))
        .map(|rule| rule.shared())
}

impl MatchingRule for BuiltinRule {
    fn oid(&self) -> &str {
        self.oid
    }

    fn name(&self) -> &str {
        self.name
    }

    fn normalize_attribute_value(&self, value: &[u8]) -> Result<ByteString, DecodeError> {
        match self.normalizer {
            Normalizer::CaseIgnore => {
                directory_string(self.name, value, true, true).map(ByteString::from)
            }
            Normalizer::CaseExact => {
                directory_string(self.name, value, false, true).map(ByteString::from)
            }
            Normalizer::OctetString => Ok(ByteString::from(value)),
            Normalizer::Integer => integer(self.name, value).map(ByteString::from),
            Normalizer::DistinguishedName => {
                distinguished_name(self.name, value).map(ByteString::from)
            }
        }
    }

    fn normalize_substring(&self, value: &[u8]) -> Result<ByteString, DecodeError> {
        match self.normalizer {
            Normalizer::CaseIgnore => {
                directory_string(self.name, value, true, false).map(ByteString::from)
            }
            Normalizer::CaseExact => {
                directory_string(self.name, value, false, false).map(ByteString::from)
            }
            _ => self.normalize_assertion_value(value),
        }
    }

    fn compare_normalized(&self, a: &ByteString, b: &ByteString) -> Ordering {
        match self.normalizer {
            Normalizer::Integer => compare_integers(a.as_bytes(), b.as_bytes()),
            _ => a.cmp(b),
        }
    }
}

fn utf8<'a>(rule: &str, value: &'a [u8]) -> Result<&'a str, DecodeError> {
    std::str::from_utf8(value).map_err(|_| DecodeError::new(rule, "value is not valid UTF-8"))
}

/// Collapses runs of spaces and optionally trims and folds case.
///
/// Whole values must not be empty; substring components may be.
fn directory_string(
    rule: &str,
    value: &[u8],
    fold_case: bool,
    whole_value: bool,
) -> Result<String, DecodeError> {
    let text = utf8(rule, value)?;
    let text = if whole_value { text.trim_matches(' ') } else { text };
    if whole_value && text.is_empty() {
        return Err(DecodeError::new(rule, "directory strings cannot be empty"));
    }

    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for ch in text.chars() {
        if ch == ' ' {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
            continue;
        }
        prev_space = false;
        if fold_case {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

fn integer(rule: &str, value: &[u8]) -> Result<String, DecodeError> {
    let text = utf8(rule, value)?;
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::new(
            rule,
            format!("'{}' is not a decimal integer", text),
        ));
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(DecodeError::new(
            rule,
            format!("'{}' has leading zeros", text),
        ));
    }
    if text.starts_with('-') && digits == "0" {
        return Err(DecodeError::new(rule, "negative zero is not allowed"));
    }
    Ok(text.to_string())
}

/// Numeric comparison of two canonical integers.
fn compare_integers(a: &[u8], b: &[u8]) -> Ordering {
    let a_neg = a.first() == Some(&b'-');
    let b_neg = b.first() == Some(&b'-');
    match (a_neg, b_neg) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => compare_magnitudes(a, b),
        (true, true) => compare_magnitudes(&b[1..], &a[1..]),
    }
}

fn compare_magnitudes(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn distinguished_name(rule: &str, value: &[u8]) -> Result<String, DecodeError> {
    let text = trim_unescaped(utf8(rule, value)?);
    if text.is_empty() {
        return Ok(String::new());
    }

    let mut rdns = Vec::new();
    for rdn in split_unescaped(text, ',') {
        let (attr, val) = rdn
            .split_once('=')
            .ok_or_else(|| DecodeError::new(rule, format!("'{}' is not an RDN", rdn.trim())))?;
        let attr = attr.trim();
        if attr.is_empty() {
            return Err(DecodeError::new(rule, "RDN has an empty attribute name"));
        }
        rdns.push(format!(
            "{}={}",
            attr.to_lowercase(),
            trim_unescaped(&directory_string(rule, val.as_bytes(), true, false)?)
        ));
    }
    Ok(rdns.join(","))
}

/// Strips leading and trailing spaces, keeping a trailing space that is
/// escaped with a backslash.
fn trim_unescaped(text: &str) -> &str {
    let mut text = text.trim_start_matches(' ');
    while let Some(rest) = text.strip_suffix(' ') {
        let backslashes = rest.bytes().rev().take_while(|&b| b == b'\\').count();
        if backslashes % 2 == 1 {
            break;
        }
        text = rest;
    }
    text
}

/// Splits on `sep` where it is not escaped with a backslash.
pub(crate) fn split_unescaped(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == sep {
            parts.push(&text[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}
