//! Attribute descriptions: an attribute type plus options.
//!
//! `cn;lang-en;binary` names the `cn` attribute type with two options. Options
//! are case-insensitive and unordered, so `cn;LANG-EN` and `cn;lang-en` are
//! the same description. The user's spelling is kept for display.
//!
//! ## Ordering
//!
//! Descriptions order by attribute type first. Ties are broken by the option
//! sets, each lower-cased and sorted, compared element by element; when one set
//! is a prefix of the other, the shorter one comes first.
//!
//! ## Option helpers
//!
//! [`contains_option`], [`contains_all_options`] and [`options_equal`] work on
//! bare option lists with the same case-insensitive semantics. An empty list
//! equals any other empty list and is a subset of every list.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Result, SchemaError};
use crate::schema::{AttributeType, Schema};

#[derive(Debug, Clone)]
pub struct AttributeDescription {
    attribute_type: Arc<AttributeType>,
    /// Name as written by the user, when the description was parsed.
    name: Option<String>,
    /// Options in user order and spelling, without case-insensitive duplicates.
    options: Vec<String>,
    /// Lower-cased, sorted copy of `options`.
    normalized_options: Vec<String>,
}

impl AttributeDescription {
    /// Creates a description from a type and options.
    ///
    /// The options are taken over as given; an option repeated with a
    /// different case keeps its first spelling.
    pub fn new<I, S>(attribute_type: Arc<AttributeType>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut kept = Vec::new();
        let mut normalized = BTreeSet::new();
        for option in options {
            let option = option.into();
            if normalized.insert(option.to_lowercase()) {
                kept.push(option);
            }
        }
        Self {
            attribute_type,
            name: None,
            options: kept,
            normalized_options: normalized.into_iter().collect(),
        }
    }

    /// A description without options.
    pub fn create(attribute_type: Arc<AttributeType>) -> Self {
        Self::new(attribute_type, Vec::<String>::new())
    }

    /// Parses `name[;option]*` against a schema.
    pub fn parse(text: &str, schema: &Schema) -> Result<Self> {
        let allow_malformed = schema.config().allow_malformed_names_and_options;
        let trimmed = text.trim_matches(' ');
        if trimmed.is_empty() {
            return Err(SchemaError::invalid_description(
                text,
                "attribute description is empty",
            ));
        }

        let mut parts = trimmed.split(';');
        let name = parts.next().unwrap_or_default();
        validate_name(text, name, allow_malformed)?;

        let mut options = Vec::new();
        for option in parts {
            if option.is_empty() {
                return Err(SchemaError::invalid_description(text, "empty option"));
            }
            if let Some(bad) = option.chars().find(|c| !is_keychar(*c, allow_malformed)) {
                return Err(SchemaError::invalid_description(
                    text,
                    format!("illegal character '{}' in option '{}'", bad, option),
                ));
            }
            options.push(option);
        }

        let attribute_type = schema.attribute_type(name)?;
        let mut description = Self::new(attribute_type, options);
        description.name = Some(name.to_string());
        Ok(description)
    }

    pub fn attribute_type(&self) -> &Arc<AttributeType> {
        &self.attribute_type
    }

    /// The user-provided name, or the type's primary name.
    pub fn name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.attribute_type.name_or_oid())
    }

    /// Options in the order and case they were supplied.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.normalized_options
            .binary_search(&option.to_lowercase())
            .is_ok()
    }

    /// Returns a description with `option` added, or a copy of this one if the
    /// option is already present.
    pub fn with_option(&self, option: impl Into<String>) -> Self {
        let option = option.into();
        if self.has_option(&option) {
            return self.clone();
        }
        let mut next = Self::new(
            Arc::clone(&self.attribute_type),
            self.options.iter().cloned().chain(std::iter::once(option)),
        );
        next.name = self.name.clone();
        next
    }

    /// Returns a description without `option`, or a copy of this one if the
    /// option is absent.
    pub fn without_option(&self, option: &str) -> Self {
        if !self.has_option(option) {
            return self.clone();
        }
        let mut next = Self::new(
            Arc::clone(&self.attribute_type),
            self.options
                .iter()
                .filter(|o| o.to_lowercase() != option.to_lowercase())
                .cloned(),
        );
        next.name = self.name.clone();
        next
    }

    /// True if this description is `other` or more specific than it: the
    /// type is a sub type and the options are a superset.
    pub fn is_sub_type_of(&self, other: &AttributeDescription) -> bool {
        self.attribute_type.is_sub_type_of(&other.attribute_type)
            && contains_all_options(&self.normalized_options, &other.normalized_options)
    }

    pub fn is_super_type_of(&self, other: &AttributeDescription) -> bool {
        other.is_sub_type_of(self)
    }

    /// Compares the options only, ignoring case and order.
    pub fn options_equal<S: AsRef<str>>(&self, options: &[S]) -> bool {
        options_equal(&self.options, options)
    }

    /// Displays this description under `name`, e.g. an alias of the type.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl PartialEq for AttributeDescription {
    fn eq(&self, other: &Self) -> bool {
        self.attribute_type == other.attribute_type
            && self.normalized_options == other.normalized_options
    }
}

impl Eq for AttributeDescription {}

impl Hash for AttributeDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attribute_type.hash(state);
        self.normalized_options.hash(state);
    }
}

impl PartialOrd for AttributeDescription {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttributeDescription {
    fn cmp(&self, other: &Self) -> Ordering {
        self.attribute_type
            .cmp(&other.attribute_type)
            .then_with(|| self.normalized_options.cmp(&other.normalized_options))
    }
}

impl fmt::Display for AttributeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        for option in &self.options {
            write!(f, ";{}", option)?;
        }
        Ok(())
    }
}

fn validate_name(input: &str, name: &str, allow_malformed: bool) -> Result<()> {
    let Some(first) = name.chars().next() else {
        return Err(SchemaError::invalid_description(
            input,
            "attribute type name is empty",
        ));
    };

    if first.is_ascii_alphabetic() || (allow_malformed && first == '_') {
        if let Some(bad) = name.chars().find(|c| !is_keychar(*c, allow_malformed)) {
            return Err(SchemaError::invalid_description(
                input,
                format!("illegal character '{}' in attribute type name", bad),
            ));
        }
        return Ok(());
    }

    if first.is_ascii_digit() {
        let valid_oid = name
            .split('.')
            .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()));
        if !valid_oid {
            return Err(SchemaError::invalid_description(
                input,
                format!("'{}' is not a numeric OID", name),
            ));
        }
        return Ok(());
    }

    Err(SchemaError::invalid_description(
        input,
        format!("illegal character '{}' in attribute type name", first),
    ))
}

fn is_keychar(c: char, allow_malformed: bool) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || (allow_malformed && (c == '_' || c == '.'))
}

/// Checks whether `target` is one of `options`, ignoring case.
pub fn contains_option<S: AsRef<str>>(options: &[S], target: &str) -> bool {
    let target = target.to_lowercase();
    options.iter().any(|o| o.as_ref().to_lowercase() == target)
}

/// Checks whether `options` contains every option of `required`, ignoring case.
pub fn contains_all_options<A, B>(options: &[A], required: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    required
        .iter()
        .all(|r| contains_option(options, r.as_ref()))
}

/// Compares two option lists as case-insensitive sets.
pub fn options_equal<A, B>(a: &[A], b: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    normalize(a) == normalize(b)
}

fn normalize<S: AsRef<str>>(options: &[S]) -> BTreeSet<String> {
    options.iter().map(|o| o.as_ref().to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaConfig;

    fn cn() -> Arc<AttributeType> {
        Schema::core().attribute_type("cn").unwrap()
    }

    fn desc(options: &[&str]) -> AttributeDescription {
        AttributeDescription::new(cn(), options.iter().copied())
    }

    #[test]
    fn options_compare_case_insensitively() {
        assert_eq!(desc(&["lang-en"]).cmp(&desc(&["LANG-EN"])), Ordering::Equal);
        assert_eq!(desc(&["lang-en"]), desc(&["LANG-EN"]));
        assert_eq!(desc(&["a", "b"]), desc(&["B", "a"]));
    }

    #[test]
    fn fewer_options_sort_first_when_prefix() {
        assert!(desc(&[]) < desc(&["a"]));
        assert!(desc(&["a"]) < desc(&["a", "b"]));
        assert!(desc(&["a", "c"]) > desc(&["a", "b", "z"]));
    }

    #[test]
    fn attribute_type_orders_before_options() {
        let sn = AttributeDescription::create(Schema::core().attribute_type("sn").unwrap());
        assert!(desc(&["zzz"]) < sn);
    }

    #[test]
    fn duplicate_options_keep_first_spelling() {
        let d = desc(&["Lang-EN", "lang-en", "binary"]);
        assert_eq!(d.options(), ["Lang-EN", "binary"]);
        assert_eq!(d.to_string(), "cn;Lang-EN;binary");
    }

    #[test]
    fn parse_keeps_user_spelling() {
        let d = AttributeDescription::parse(" commonName;LANG-EN ", &Schema::core()).unwrap();
        assert_eq!(d.attribute_type().oid(), "2.5.4.3");
        assert_eq!(d.to_string(), "commonName;LANG-EN");
        assert!(d.has_option("lang-en"));
        assert_eq!(d, desc(&["lang-en"]));
    }

    #[test]
    fn parse_accepts_numeric_oid() {
        let d = AttributeDescription::parse("2.5.4.3;binary", &Schema::core()).unwrap();
        assert_eq!(d.attribute_type().name_or_oid(), "cn");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        let schema = Schema::core();
        for bad in ["", "   ", "cn;", "cn;;x", "c n", "-cn", "2.5..4", "cn;lang_en", "my_attr"] {
            let err = AttributeDescription::parse(bad, &schema).unwrap_err();
            assert!(
                matches!(err, SchemaError::InvalidAttributeDescription { .. }),
                "{:?} gave {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn parse_allows_malformed_names_when_configured() {
        let schema = Schema::core().with_config(SchemaConfig::lenient());
        let d = AttributeDescription::parse("my_attr;lang_en", &schema).unwrap();
        assert!(d.attribute_type().is_placeholder());
        assert!(d.has_option("LANG_EN"));
    }

    #[test]
    fn parse_rejects_unknown_type_in_strict_schema() {
        let err = AttributeDescription::parse("favoriteDrink", &Schema::core()).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownAttributeType(_)));
    }

    #[test]
    fn with_and_without_option_are_idempotent() {
        let base = desc(&["lang-en"]);
        assert_eq!(base.with_option("LANG-EN").options(), ["lang-en"]);
        let more = base.with_option("binary");
        assert_eq!(more.options(), ["lang-en", "binary"]);
        assert_eq!(more.without_option("BINARY"), base);
        assert_eq!(base.without_option("missing"), base);
    }

    #[test]
    fn sub_type_needs_type_and_option_superset() {
        let schema = Schema::core();
        let name = AttributeDescription::parse("name;lang-en", &schema).unwrap();
        let cn = AttributeDescription::parse("cn;lang-en;binary", &schema).unwrap();
        assert!(cn.is_sub_type_of(&name));
        assert!(name.is_super_type_of(&cn));
        assert!(!name.is_sub_type_of(&cn));
        let plain_cn = AttributeDescription::parse("cn", &schema).unwrap();
        assert!(!plain_cn.is_sub_type_of(&name));
    }

    #[test]
    fn option_helpers_ignore_case_and_order() {
        assert!(contains_option(&["Lang-EN"], "lang-en"));
        assert!(!contains_option::<&str>(&[], "lang-en"));
        assert!(contains_all_options(&["a", "B", "c"], &["b", "A"]));
        assert!(contains_all_options::<&str, &str>(&["a"], &[]));
        assert!(!contains_all_options(&["a"], &["b"]));
        assert!(options_equal(&["a", "B"], &["b", "A"]));
        assert!(options_equal::<&str, String>(&[], &[]));
        assert!(!options_equal(&["a"], &["a", "b"]));
    }

    #[test]
    fn equal_descriptions_hash_equally() {
        use std::collections::hash_map::DefaultHasher;
        let hash = |d: &AttributeDescription| {
            let mut h = DefaultHasher::new();
            d.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&desc(&["Lang-EN", "x"])), hash(&desc(&["X", "lang-en"])));
    }
}
