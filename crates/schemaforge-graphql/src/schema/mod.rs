//! GraphQL schema synthesis and lazy loading.
//!
//! This module turns normalized application metadata plus bound resolvers
//! into an executable async-graphql dynamic schema.
//!
//! ## Components
//!
//! - [`SchemaSynthesizer`] - Produces object, input, enum, union and scalar types
//! - [`ApplicationSchemaBuilder`] - Binds resolvers and finishes the schema
//! - [`ExecutableSchema`] - Executes requests with context and batching wired in
//! - [`LazySchema`] - Thread-safe lazy schema holder with hot-reload support
//!
//! ## Architecture
//!
//! The schema building process:
//! 1. Resolver registrations are validated into a binding table
//! 2. Reserved names (roots and scalars) are claimed
//! 3. Models, inputs and root declarations are synthesized
//! 4. The dynamic schema is finished with depth and complexity limits
//! 5. Each request resolves its context once and gets fresh loaders

mod builder;
mod lazy;
pub mod shape;
mod synthesizer;

pub use builder::{ApplicationSchemaBuilder, BoundAction, ExecutableSchema, SchemaBuilderConfig};
pub use lazy::{LazySchema, SchemaState};
pub use synthesizer::{HEALTH_FIELD, SchemaSynthesizer, SynthesizedTypes};
