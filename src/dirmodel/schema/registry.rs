//! Attribute type catalog.
//!
//! The [`Schema`] maps names and OIDs to [`AttributeType`]s and carries the
//! [`SchemaConfig`] that decides how strictly descriptions are parsed. A shared
//! core schema with the everyday RFC 4519 types is available through
//! [`Schema::core`].

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

use super::attribute_type::AttributeType;
use super::rules;
use crate::config::SchemaConfig;
use crate::error::{Result, SchemaError};

#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Lower-cased names and OIDs to types.
    types: HashMap<String, Arc<AttributeType>>,
    config: SchemaConfig,
}

static CORE_SCHEMA: Lazy<Arc<Schema>> = Lazy::new(|| Arc::new(build_core_schema()));

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// The shared core schema, built on first use.
    pub fn core() -> Arc<Schema> {
        Arc::clone(&CORE_SCHEMA)
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// A copy of this schema using a different configuration.
    pub fn with_config(&self, config: SchemaConfig) -> Schema {
        Schema {
            types: self.types.clone(),
            config,
        }
    }

    /// Resolves a name or OID.
    ///
    /// Unknown names become placeholders unless the schema is strict.
    pub fn attribute_type(&self, name_or_oid: &str) -> Result<Arc<AttributeType>> {
        if let Some(found) = self.get(name_or_oid) {
            return Ok(found);
        }
        if self.config.strict_attribute_types {
            return Err(SchemaError::UnknownAttributeType(name_or_oid.to_string()));
        }
        tracing::debug!(name = name_or_oid, "using placeholder attribute type");
        Ok(Arc::new(AttributeType::placeholder(name_or_oid)))
    }

    /// Looks up a registered type without falling back to placeholders.
    pub fn get(&self, name_or_oid: &str) -> Option<Arc<AttributeType>> {
        self.types.get(&name_or_oid.to_lowercase()).cloned()
    }

    pub fn contains(&self, name_or_oid: &str) -> bool {
        self.types.contains_key(&name_or_oid.to_lowercase())
    }

    /// Every registered type once, ordered by primary name.
    pub fn attribute_types(&self) -> Vec<Arc<AttributeType>> {
        let mut all: Vec<_> = self.types.values().cloned().collect();
        all.sort();
        all.dedup();
        all
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    types: HashMap<String, Arc<AttributeType>>,
    config: SchemaConfig,
}

impl SchemaBuilder {
    pub fn config(mut self, config: SchemaConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a type under its OID and every name.
    ///
    /// Fails if any of those keys already belongs to another type.
    pub fn add(mut self, attribute_type: AttributeType) -> Result<Self> {
        self.register(Arc::new(attribute_type))?;
        Ok(self)
    }

    /// Registers an already shared type, so other types can use it as their
    /// superior.
    pub fn add_shared(mut self, attribute_type: Arc<AttributeType>) -> Result<Self> {
        self.register(attribute_type)?;
        Ok(self)
    }

    fn register(&mut self, attribute_type: Arc<AttributeType>) -> Result<()> {
        let keys: Vec<String> = std::iter::once(attribute_type.oid())
            .chain(attribute_type.names().iter().map(String::as_str))
            .map(str::to_lowercase)
            .collect();

        for key in &keys {
            if let Some(existing) = self.types.get(key) {
                if existing.as_ref() != attribute_type.as_ref() {
                    return Err(SchemaError::Conflict(format!(
                        "'{}' is already used by attribute type {}",
                        key,
                        existing.oid()
                    )));
                }
            }
        }

        for key in keys {
            self.types.insert(key, Arc::clone(&attribute_type));
        }
        Ok(())
    }

    pub fn build(self) -> Schema {
        Schema {
            types: self.types,
            config: self.config,
        }
    }
}

fn directory_string(oid: &str, names: &[&str]) -> AttributeType {
    let builder = names.iter().fold(AttributeType::builder(oid), |b, n| b.name(*n));
    builder
        .equality(rules::CASE_IGNORE_MATCH.shared())
        .ordering(rules::CASE_IGNORE_ORDERING_MATCH.shared())
        .substring(rules::CASE_IGNORE_SUBSTRINGS_MATCH.shared())
        .build()
}

fn build_core_schema() -> Schema {
    let name = Arc::new(directory_string("2.5.4.41", &["name"]));
    let sub_of_name = |oid: &str, names: &[&str]| {
        names
            .iter()
            .fold(AttributeType::builder(oid), |b, n| b.name(*n))
            .superior(Arc::clone(&name))
            .build()
    };

    let types = vec![
        AttributeType::builder("2.5.4.0")
            .name("objectClass")
            .equality(rules::CASE_IGNORE_MATCH.shared())
            .build(),
        sub_of_name("2.5.4.3", &["cn", "commonName"]),
        sub_of_name("2.5.4.4", &["sn", "surname"]),
        sub_of_name("2.5.4.42", &["givenName"]),
        sub_of_name("2.5.4.6", &["c", "countryName"]),
        sub_of_name("2.5.4.10", &["o", "organizationName"]),
        sub_of_name("2.5.4.11", &["ou", "organizationalUnitName"]),
        directory_string("2.5.4.13", &["description"]),
        directory_string("2.5.4.20", &["telephoneNumber"]),
        directory_string("0.9.2342.19200300.100.1.1", &["uid", "userid"]),
        AttributeType::builder("0.9.2342.19200300.100.1.3")
            .name("mail")
            .name("rfc822Mailbox")
            .equality(rules::CASE_IGNORE_MATCH.shared())
            .substring(rules::CASE_IGNORE_SUBSTRINGS_MATCH.shared())
            .build(),
        AttributeType::builder("1.3.6.1.1.1.1.0")
            .name("uidNumber")
            .equality(rules::INTEGER_MATCH.shared())
            .ordering(rules::INTEGER_ORDERING_MATCH.shared())
            .single_value()
            .build(),
        AttributeType::builder("2.5.4.31")
            .name("member")
            .equality(rules::DISTINGUISHED_NAME_MATCH.shared())
            .build(),
        AttributeType::builder("1.3.6.1.1.20")
            .name("entryDN")
            .equality(rules::DISTINGUISHED_NAME_MATCH.shared())
            .single_value()
            .operational()
            .build(),
    ];

    let mut builder = SchemaBuilder::default();
    // Static table; conflicts are covered by core_schema_registers_every_type.
    if let Err(err) = builder.register(Arc::clone(&name)) {
        tracing::error!(%err, "core schema registration failed");
    }
    for t in types {
        if let Err(err) = builder.register(Arc::new(t)) {
            tracing::error!(%err, "core schema registration failed");
        }
    }
    builder.build()
}
