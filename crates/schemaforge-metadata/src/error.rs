//! Error types for metadata normalization and document persistence.

use thiserror::Error;

use crate::metadata::DeclarationCategory;

/// A single shape problem found while normalizing the type graph.
///
/// Every variant carries the offending property path so a report can point
/// at the exact declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("duplicate {category} name `{name}` declared at {}", .sites.join(", "))]
    DuplicateDeclaration {
        category: DeclarationCategory,
        name: String,
        sites: Vec<String>,
    },

    #[error("duplicate type name `{name}` declared at {}", .sites.join(", "))]
    DuplicateType { name: String, sites: Vec<String> },

    #[error("invalid identifier `{name}` at {path}: must match ^[_a-zA-Z][_a-zA-Z0-9]*$")]
    InvalidIdentifier { path: String, name: String },

    #[error("incompatible types for property `{property}` merged at {path}")]
    IncompatibleMerge { path: String, property: String },

    #[error("intersection at {path} has a member that is not object-shaped")]
    IntersectionOperand { path: String },

    #[error("intersection at {path} references `{name}` cyclically")]
    CyclicIntersection { path: String, name: String },

    #[error("array union at {path} has members with different element types")]
    ArrayUnionMismatch { path: String },

    #[error("union at {path} mixes array and non-array members")]
    MixedArrayUnion { path: String },

    #[error("nested array at {path} is not supported")]
    NestedArray { path: String },

    #[error("type at {path} has no value besides null/undefined")]
    Unrepresentable { path: String },

    #[error("unknown type `{name}` referenced at {path}")]
    UnknownReference { path: String, name: String },

    #[error("{declared} `{name}` cannot be used as {used} at {path}")]
    CrossSideReference {
        path: String,
        name: String,
        declared: &'static str,
        used: &'static str,
    },

    #[error("enum at {path} maps two members onto the name `{name}`")]
    DuplicateEnumValue { path: String, name: String },

    #[error("enum at {path} uses reserved value name `{name}`")]
    ReservedEnumValue { path: String, name: String },

    #[error("arguments declared on input property at {path}")]
    ArgumentsOnInput { path: String },
}

/// Errors produced by the metadata layer.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The type graph failed normalization. All problems are listed.
    #[error("invalid application description:\n{}", format_shape_errors(.0))]
    Shape(Vec<ShapeError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetadataError {
    /// Returns the collected shape errors, if this is a shape failure.
    #[must_use]
    pub fn shape_errors(&self) -> &[ShapeError] {
        match self {
            Self::Shape(errors) => errors,
            _ => &[],
        }
    }
}

fn format_shape_errors(errors: &[ShapeError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
