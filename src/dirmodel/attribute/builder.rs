use std::borrow::Borrow;
use std::sync::Arc;

use super::{contains_option, options_equal, Attribute, AttributeDescription, RealAttribute};
use crate::error::{Result, SchemaError};
use crate::schema::{AttributeType, Schema};
use crate::value::ByteString;

#[derive(Debug, Clone)]
struct BuilderValue {
    /// Equality-normalized form, or the raw bytes when that fails.
    key: ByteString,
    value: ByteString,
}

/// Mutable staging area for a [`RealAttribute`].
///
/// Unlike `RealAttribute::new`, the builder keeps one value per equality
/// class. Adding a value that is already present replaces the stored spelling
/// with the new one and moves it to the end.
#[derive(Debug, Clone, Default)]
pub struct AttributeBuilder {
    attribute_type: Option<Arc<AttributeType>>,
    name: Option<String>,
    options: Vec<String>,
    values: Vec<BuilderValue>,
}

impl AttributeBuilder {
    pub fn new(attribute_type: Arc<AttributeType>) -> Self {
        Self {
            attribute_type: Some(attribute_type),
            ..Self::default()
        }
    }

    /// A builder whose attribute will display under `name`.
    pub fn with_name(attribute_type: Arc<AttributeType>, name: impl Into<String>) -> Self {
        Self {
            attribute_type: Some(attribute_type),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Resolves `name` in `schema` and starts a builder for it.
    pub fn for_name(schema: &Schema, name: &str) -> Result<Self> {
        Ok(Self::with_name(schema.attribute_type(name)?, name))
    }

    /// Copies the description, and the values unless `omit_values` is set.
    pub fn from_attribute(attribute: &dyn Attribute, omit_values: bool) -> Self {
        let description = attribute.attribute_description();
        let mut builder =
            Self::with_name(Arc::clone(description.attribute_type()), description.name());
        builder.set_options(description.options().iter().cloned());
        if !omit_values {
            builder.add_all(attribute.values());
        }
        builder
    }

    pub fn attribute_type(&self) -> Option<&Arc<AttributeType>> {
        self.attribute_type.as_ref()
    }

    /// Switches the attribute type. Values are re-keyed under the new
    /// equality rule, which may merge some of them.
    pub fn set_attribute_type(&mut self, attribute_type: Arc<AttributeType>) {
        self.attribute_type = Some(attribute_type);
        self.name = None;
        let previous = std::mem::take(&mut self.values);
        for value in previous {
            self.add(value.value);
        }
    }

    fn key_of(&self, value: &ByteString) -> ByteString {
        let Some(rule) = self
            .attribute_type
            .as_deref()
            .and_then(AttributeType::equality_matching_rule)
        else {
            return value.clone();
        };
        match rule.normalize_attribute_value(value.as_bytes()) {
            Ok(key) => key,
            Err(err) => {
                tracing::trace!(%err, "keying value by raw bytes");
                value.clone()
            }
        }
    }

    fn position(&self, value: &ByteString) -> Option<usize> {
        let key = self.key_of(value);
        self.values.iter().position(|v| v.key == key)
    }

    /// Adds a value, returning false if an equal one was already present.
    ///
    /// Either way the value as given here is the one kept.
    pub fn add(&mut self, value: impl Into<ByteString>) -> bool {
        let value = value.into();
        let existing = self.position(&value);
        if let Some(index) = existing {
            self.values.remove(index);
        }
        let key = self.key_of(&value);
        self.values.push(BuilderValue { key, value });
        existing.is_none()
    }

    /// Returns true if at least one value was new.
    pub fn add_all<I, V>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = V>,
        V: Into<ByteString>,
    {
        values
            .into_iter()
            .fold(false, |modified, value| self.add(value) | modified)
    }

    pub fn remove(&mut self, value: &ByteString) -> bool {
        match self.position(value) {
            Some(index) => {
                self.values.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns true if at least one value was removed.
    pub fn remove_all<I>(&mut self, values: I) -> bool
    where
        I: IntoIterator,
        I::Item: Borrow<ByteString>,
    {
        values
            .into_iter()
            .fold(false, |modified, value| self.remove(value.borrow()) | modified)
    }

    pub fn replace(&mut self, value: impl Into<ByteString>) {
        self.clear();
        self.add(value);
    }

    pub fn replace_all<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<ByteString>,
    {
        self.clear();
        self.add_all(values);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn contains(&self, value: &ByteString) -> bool {
        self.position(value).is_some()
    }

    pub fn contains_all<I>(&self, values: I) -> bool
    where
        I: IntoIterator,
        I::Item: Borrow<ByteString>,
    {
        values.into_iter().all(|v| self.contains(v.borrow()))
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &ByteString> + '_ {
        self.values.iter().map(|v| &v.value)
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Adds an option unless it is present under any case.
    pub fn set_option(&mut self, option: impl Into<String>) -> bool {
        let option = option.into();
        if contains_option(&self.options, &option) {
            return false;
        }
        self.options.push(option);
        true
    }

    /// Returns true if at least one option was new.
    pub fn set_options<I, S>(&mut self, options: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        options
            .into_iter()
            .fold(false, |modified, option| self.set_option(option) | modified)
    }

    pub fn options_equal<S: AsRef<str>>(&self, options: &[S]) -> bool {
        options_equal(&self.options, options)
    }

    /// Builds the attribute, consuming the builder.
    pub fn to_attribute(self) -> Result<RealAttribute> {
        let attribute_type = self.attribute_type.ok_or(SchemaError::MissingAttributeType)?;
        let mut description = AttributeDescription::new(attribute_type, self.options);
        if let Some(name) = self.name {
            description = description.named(name);
        }
        Ok(RealAttribute::new(
            description,
            self.values.into_iter().map(|v| v.value),
        ))
    }
}
