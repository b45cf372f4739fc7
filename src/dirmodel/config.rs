//! # Schema Configuration
//!
//! Schema behavior is configured with [`confique`], which layers values from
//! environment variables over a TOML file over compiled defaults.
//!
//! ## Available Settings
//!
//! | Key | Env | Default | Description |
//! |-----|-----|---------|-------------|
//! | `allow_malformed_names_and_options` | `DIRMODEL_ALLOW_MALFORMED_NAMES_AND_OPTIONS` | `false` | Accept `_` and other non-keychars in attribute names and options |
//! | `strict_attribute_types` | `DIRMODEL_STRICT_ATTRIBUTE_TYPES` | `true` | Reject unknown attribute names instead of creating placeholders |
//!
//! Both settings mirror long-standing directory server switches: legacy data
//! often contains names like `my_attr`, and tolerant servers accept attribute
//! names the schema has never heard of.

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Configuration for a [`Schema`](crate::schema::Schema), stored in `dirmodel.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    /// Accept underscores and other non-keychars in names and options.
    #[config(default = false, env = "DIRMODEL_ALLOW_MALFORMED_NAMES_AND_OPTIONS")]
    pub allow_malformed_names_and_options: bool,

    /// Reject unknown attribute type names. When false, unknown names resolve
    /// to placeholder types.
    #[config(default = true, env = "DIRMODEL_STRICT_ATTRIBUTE_TYPES")]
    pub strict_attribute_types: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            allow_malformed_names_and_options: false,
            strict_attribute_types: true,
        }
    }
}

impl SchemaConfig {
    /// Loads the configuration: environment first, then `path`, then defaults.
    ///
    /// A missing file is not an error; confique skips optional files.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = SchemaConfig::builder()
            .env()
            .file(path.as_ref())
            .load()?;
        tracing::debug!(?config, path = %path.as_ref().display(), "loaded schema config");
        Ok(config)
    }

    /// A permissive configuration for reading legacy or foreign data.
    pub fn lenient() -> Self {
        Self {
            allow_malformed_names_and_options: true,
            strict_attribute_types: false,
        }
    }
}
