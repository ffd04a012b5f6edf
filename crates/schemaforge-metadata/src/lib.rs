//! Type metadata normalization for schemaforge.
//!
//! This crate turns a raw [`TypeGraph`] describing an application's declared
//! models, inputs and operations into a canonical [`ApplicationMetadata`]
//! tree:
//!
//! - Optional and null markers are tracked as independent flags
//! - Literal unions collapse to enums, intersections flatten into objects
//! - Anonymous schema-visible nodes receive deterministic names from a
//!   pluggable [`NamingStrategy`]
//! - Shape problems are collected and reported together
//!
//! The metadata tree is consumed by `schemaforge-graphql` to synthesize an
//! executable schema and can be persisted as a JSON document.

pub mod document;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod naming;
pub mod normalizer;

pub use error::{MetadataError, ShapeError};
pub use graph::{
    ActionNode, DeclarationNode, EnumMember, Literal, PrimitiveKind, PropertyNode, TypeDecl,
    TypeGraph, TypeNode,
};
pub use metadata::{
    ActionMetadata, ApplicationMetadata, DeclarationCategory, Deprecation, TypeKind, TypeMetadata,
};
pub use naming::{DefaultNamingStrategy, NamingStrategy, TypeSide, is_valid_identifier};
pub use normalizer::{MetadataNormalizer, normalize};

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, MetadataError>;
