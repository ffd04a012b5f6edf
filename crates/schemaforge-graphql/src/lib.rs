//! # schemaforge-graphql
//!
//! Executable GraphQL schemas synthesized from application type metadata.
//!
//! The crate takes [`ApplicationMetadata`](schemaforge_metadata::ApplicationMetadata)
//! produced by `schemaforge-metadata` and a set of user resolvers, and builds a
//! dynamic GraphQL schema. It supports:
//!
//! - Queries, mutations and subscriptions declared as typed functions
//! - Per-field model resolvers, including batched resolvers driven by DataLoaders
//! - Per-request context values resolved once before execution
//! - Enum and union mapping between metadata literals and schema names
//! - Deterministic type naming with collision detection
//!
//! ## Configuration
//!
//! ```toml
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! batch_delay_ms = 1
//!
//! [scalars]
//! bigint = "BigInt"
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`resolvers`] - Resolver registration and binding
//! - [`context`] - Per-request context
//! - [`loaders`] - DataLoaders for batched fields
//! - [`schema`] - Schema synthesis and lazy loading
//! - [`error`] - Error types

pub mod config;
pub mod context;
pub mod error;
pub mod loaders;
pub mod resolvers;
pub mod schema;

// Re-export main types
pub use config::{GraphQLConfig, ScalarMapping};
pub use context::{ContextFactory, RequestContext};
pub use error::{BatchLoadError, BindingError, SchemaError};
pub use loaders::FieldLoaders;
pub use resolvers::{
    BatchInput, BindingTable, ContextInput, FieldInput, Json, ResolverFn, ResolverInput, ResolverRegistry,
    ResolverResult, resolver,
};
pub use schema::{
    ApplicationSchemaBuilder, BoundAction, ExecutableSchema, LazySchema, SchemaBuilderConfig, SchemaState,
};

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
