//! GraphQL configuration.
//!
//! Configuration can be loaded from a TOML file. Every field has a default,
//! so an empty document is a valid configuration.
//!
//! # Example Configuration
//!
//! ```toml
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! batch_delay_ms = 1
//!
//! [scalars]
//! number = "Float"
//! bigint = "BigInt"
//!
//! [scalars.overrides]
//! "PostType.id" = "ID"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use schemaforge_metadata::{TypeKind, TypeMetadata};
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// GraphQL layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// How long batched field loaders wait for sibling requests, in milliseconds.
    /// Default: 1
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Maximum number of parents passed to one batched resolver call.
    /// Default: 1000
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Primitive-to-scalar mapping.
    #[serde(default)]
    pub scalars: ScalarMapping,
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_batch_delay_ms() -> u64 {
    1
}

fn default_max_batch_size() -> usize {
    1000
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            batch_delay_ms: default_batch_delay_ms(),
            max_batch_size: default_max_batch_size(),
            scalars: ScalarMapping::default(),
        }
    }
}

impl GraphQLConfig {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Config` if the document is malformed or fails
    /// validation.
    pub fn from_toml_str(content: &str) -> Result<Self, SchemaError> {
        let config: Self = toml::from_str(content).map_err(|e| SchemaError::Config(e.to_string()))?;
        config.validate().map_err(SchemaError::Config)?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Config` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        if self.max_batch_size == 0 {
            return Err("graphql.max_batch_size must be > 0".into());
        }
        self.scalars.validate()
    }

    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> crate::SchemaBuilderConfig {
        crate::SchemaBuilderConfig {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
            batch_delay: Duration::from_millis(self.batch_delay_ms),
            max_batch_size: self.max_batch_size,
            scalars: self.scalars.clone(),
        }
    }
}

/// Scalars built into every GraphQL schema.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Maps primitive kinds onto scalar names.
///
/// Overrides are keyed by `propertyPath` and win over the per-kind names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarMapping {
    #[serde(default = "default_number_scalar")]
    pub number: String,

    #[serde(default = "default_bigint_scalar")]
    pub bigint: String,

    #[serde(default = "default_string_scalar")]
    pub string: String,

    #[serde(default = "default_boolean_scalar")]
    pub boolean: String,

    /// Scalar used for shapes with no structured representation, such as
    /// unions with scalar members.
    #[serde(default = "default_json_scalar")]
    pub json: String,

    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

fn default_number_scalar() -> String {
    "Float".into()
}

fn default_bigint_scalar() -> String {
    "BigInt".into()
}

fn default_string_scalar() -> String {
    "String".into()
}

fn default_boolean_scalar() -> String {
    "Boolean".into()
}

fn default_json_scalar() -> String {
    "JSON".into()
}

impl Default for ScalarMapping {
    fn default() -> Self {
        Self {
            number: default_number_scalar(),
            bigint: default_bigint_scalar(),
            string: default_string_scalar(),
            boolean: default_boolean_scalar(),
            json: default_json_scalar(),
            overrides: BTreeMap::new(),
        }
    }
}

impl ScalarMapping {
    /// Scalar name for a scalar-kind node, or `None` for structured kinds.
    #[must_use]
    pub fn scalar_for(&self, meta: &TypeMetadata) -> Option<&str> {
        if let Some(name) = self.overrides.get(&meta.property_path) {
            return Some(name.as_str());
        }
        if !meta.kind.is_scalar() {
            return None;
        }
        match meta.kind {
            TypeKind::Number => Some(self.number.as_str()),
            TypeKind::Bigint => Some(self.bigint.as_str()),
            TypeKind::String => Some(self.string.as_str()),
            TypeKind::Boolean => Some(self.boolean.as_str()),
            _ => None,
        }
    }

    /// Every scalar name this mapping can produce that is not built in.
    #[must_use]
    pub fn custom_scalars(&self) -> Vec<&str> {
        let mut names: Vec<&str> = [&self.number, &self.bigint, &self.string, &self.boolean, &self.json]
            .into_iter()
            .map(String::as_str)
            .chain(self.overrides.values().map(String::as_str))
            .filter(|name| !BUILTIN_SCALARS.contains(name))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    fn validate(&self) -> Result<(), String> {
        let names = [&self.number, &self.bigint, &self.string, &self.boolean, &self.json];
        for name in names.into_iter().chain(self.overrides.values()) {
            if !schemaforge_metadata::is_valid_identifier(name) {
                return Err(format!("graphql.scalars: `{name}` is not a valid scalar name"));
            }
        }
        Ok(())
    }
}
