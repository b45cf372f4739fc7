use thiserror::Error;

use crate::schema::DecodeError;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Unknown attribute type: {0}")]
    UnknownAttributeType(String),

    #[error("Invalid attribute description '{input}': {reason}")]
    InvalidAttributeDescription { input: String, reason: String },

    #[error("Invalid sort key '{input}': {reason}")]
    InvalidSortKey { input: String, reason: String },

    #[error("Invalid base DN '{dn}': {source}")]
    InvalidBaseDn {
        dn: String,
        #[source]
        source: DecodeError,
    },

    #[error("Schema conflict: {0}")]
    Conflict(String),

    #[error("Undefined attribute type")]
    MissingAttributeType,

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),
}

impl SchemaError {
    pub(crate) fn invalid_description(input: &str, reason: impl Into<String>) -> Self {
        SchemaError::InvalidAttributeDescription {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
