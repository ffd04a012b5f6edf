//! Error types for schema construction.
//!
//! Construction errors abort the whole build. Resolver failures at request
//! time are reported as `async_graphql::Error` on the affected field and never
//! use these types.

use schemaforge_metadata::{DeclarationCategory, MetadataError};
use thiserror::Error;

use crate::resolvers::BindingCategory;

/// Errors that can occur while building an executable schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema is still being built; the caller should retry.
    #[error("GraphQL schema is initializing, please retry")]
    SchemaInitializing,

    /// Schema build failed.
    #[error("Failed to build GraphQL schema: {0}")]
    SchemaBuildFailed(String),

    /// The application description failed normalization.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Two different shapes were assigned the same schema name.
    #[error("type name `{name}` is produced by two different shapes at `{first}` and `{second}`")]
    NamingCollision {
        name: String,
        first: String,
        second: String,
    },

    /// Resolver registrations did not match the metadata.
    #[error("invalid resolver bindings:\n{}", format_binding_errors(.0))]
    Binding(Vec<BindingError>),

    /// Configuration could not be loaded or is invalid.
    #[error("Invalid GraphQL configuration: {0}")]
    Config(String),
}

impl SchemaError {
    /// Returns the error code for diagnostics and GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaInitializing => "SCHEMA_INITIALIZING",
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::Metadata(_) => "INVALID_METADATA",
            Self::NamingCollision { .. } => "NAMING_COLLISION",
            Self::Binding(_) => "INVALID_BINDING",
            Self::Config(_) => "INVALID_CONFIG",
        }
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub fn retry_after(&self) -> Option<u32> {
        match self {
            Self::SchemaInitializing => Some(5),
            _ => None,
        }
    }

    /// Returns the binding errors, if this is a binding failure.
    #[must_use]
    pub fn binding_errors(&self) -> &[BindingError] {
        match self {
            Self::Binding(errors) => errors,
            _ => &[],
        }
    }
}

/// A single resolver registration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("multiple resolvers registered for {category} `{name}` at {}", .sites.join(", "))]
    Duplicate {
        category: BindingCategory,
        name: String,
        sites: Vec<String>,
    },

    #[error("resolver registered for unknown {category} `{name}`")]
    UnknownDeclaration {
        category: DeclarationCategory,
        name: String,
    },

    #[error("resolver registered for unknown model `{model}`")]
    UnknownModel { model: String },

    #[error("resolver registered for unknown field `{field}` of model `{model}`")]
    UnknownField { model: String, field: String },

    #[error("{category} `{name}` expects {expected} resolver, got {found}")]
    ShapeMismatch {
        category: BindingCategory,
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("discriminator registered for unknown union `{name}`")]
    UnknownUnion { name: String },
}

/// Error raised by a batched field loader, shared between all waiting fields.
#[derive(Debug, Clone, Error)]
pub enum BatchLoadError {
    #[error("{0}")]
    Resolver(String),

    #[error("batched resolver for `{model}.{field}` returned {actual} results for {expected} parents")]
    LengthMismatch {
        model: String,
        field: String,
        expected: usize,
        actual: usize,
    },
}

fn format_binding_errors(errors: &[BindingError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaforge_metadata::ShapeError;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaError::SchemaInitializing.error_code(), "SCHEMA_INITIALIZING");
        assert_eq!(
            SchemaError::NamingCollision {
                name: "PostTypeX".into(),
                first: "Post.typeX".into(),
                second: "PostType.x".into(),
            }
            .error_code(),
            "NAMING_COLLISION"
        );
        assert_eq!(
            SchemaError::Metadata(MetadataError::Shape(vec![])).error_code(),
            "INVALID_METADATA"
        );
    }

    #[test]
    fn test_retry_after() {
        assert_eq!(SchemaError::SchemaInitializing.retry_after(), Some(5));
        assert_eq!(SchemaError::Config("bad".into()).retry_after(), None);
    }

    #[test]
    fn test_metadata_error_is_transparent() {
        let err: SchemaError = MetadataError::Shape(vec![ShapeError::NestedArray {
            path: "PostType.grid".into(),
        }])
        .into();
        assert!(err.to_string().contains("nested array at PostType.grid"));
    }

    #[test]
    fn test_binding_errors_aggregate() {
        let err = SchemaError::Binding(vec![
            BindingError::Duplicate {
                category: BindingCategory::Declaration(DeclarationCategory::Query),
                name: "post".into(),
                sites: vec!["declarations #0".into(), "declaration #2".into()],
            },
            BindingError::UnknownModel {
                model: "Ghost".into(),
            },
        ]);
        let message = err.to_string();
        assert!(message.contains("multiple resolvers registered for queries `post` at declarations #0, declaration #2"));
        assert!(message.contains("unknown model `Ghost`"));
        assert_eq!(err.binding_errors().len(), 2);
    }

    #[test]
    fn test_length_mismatch_message() {
        let err = BatchLoadError::LengthMismatch {
            model: "PostType".into(),
            field: "score".into(),
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "batched resolver for `PostType.score` returned 2 results for 3 parents"
        );
    }
}
