//! Executable schema builder.
//!
//! `ApplicationSchemaBuilder` binds the registered resolvers against the
//! normalized metadata, synthesizes the schema types and finishes an
//! async-graphql dynamic [`Schema`]. The result is an [`ExecutableSchema`]
//! that also owns everything a request needs at run time: the context
//! factory and the batched field loaders.

use std::sync::Arc;
use std::time::Duration;

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Response, ServerError};
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use schemaforge_metadata::{ActionMetadata, ApplicationMetadata, DeclarationCategory, TypeGraph, normalize};
use tracing::{debug, instrument};

use super::synthesizer::SchemaSynthesizer;
use crate::config::ScalarMapping;
use crate::context::{ContextFactory, RequestContext};
use crate::error::SchemaError;
use crate::loaders::FieldLoaders;
use crate::resolvers::{
    BindingTable, ItemResolverFn, Json, ResolverFn, ResolverInput, ResolverRegistry, ResolverResult,
};

/// Configuration for the schema builder.
#[derive(Debug, Clone)]
pub struct SchemaBuilderConfig {
    /// Maximum query depth allowed.
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,

    /// How long batched loaders wait for sibling parents.
    pub batch_delay: Duration,

    /// Maximum number of parents per batched resolver call.
    pub max_batch_size: usize,

    /// Primitive-to-scalar mapping.
    pub scalars: ScalarMapping,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
            batch_delay: Duration::from_millis(1),
            max_batch_size: 1000,
            scalars: ScalarMapping::default(),
        }
    }
}

/// Builds an executable schema from application metadata and resolvers.
///
/// # Example
///
/// ```ignore
/// let metadata = normalize(&graph)?;
/// let registry = ResolverRegistry::new()
///     .query("post", resolver::item(|input| async move { load_post(input.args).await }));
///
/// let schema = ApplicationSchemaBuilder::new(metadata, registry, SchemaBuilderConfig::default())
///     .build()?;
/// let response = schema.execute("{ post(id: 1) { title } }", json!({})).await;
/// ```
#[derive(Clone)]
pub struct ApplicationSchemaBuilder {
    metadata: Arc<ApplicationMetadata>,
    registry: ResolverRegistry,
    config: SchemaBuilderConfig,
}

impl ApplicationSchemaBuilder {
    /// Creates a new schema builder.
    #[must_use]
    pub fn new(
        metadata: impl Into<Arc<ApplicationMetadata>>,
        registry: ResolverRegistry,
        config: SchemaBuilderConfig,
    ) -> Self {
        Self {
            metadata: metadata.into(),
            registry,
            config,
        }
    }

    /// Normalizes a type graph and creates a builder for it.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Metadata`] if the graph fails normalization.
    pub fn from_graph(
        graph: &TypeGraph,
        registry: ResolverRegistry,
        config: SchemaBuilderConfig,
    ) -> Result<Self, SchemaError> {
        Ok(Self::new(normalize(graph)?, registry, config))
    }

    #[must_use]
    pub fn metadata(&self) -> &ApplicationMetadata {
        &self.metadata
    }

    /// Builds the executable schema.
    ///
    /// No partial schema is ever returned: binding, synthesis and schema
    /// validation errors all abort the build.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Binding`], [`SchemaError::NamingCollision`] or
    /// [`SchemaError::SchemaBuildFailed`].
    pub fn build(&self) -> Result<ExecutableSchema, SchemaError> {
        debug!(application = %self.metadata.name, "Starting GraphQL schema build");

        let bindings = self.registry.bind(&self.metadata)?;
        let synthesized = SchemaSynthesizer::new(&self.metadata, &bindings, &self.config.scalars).synthesize()?;

        let mut schema_builder = Schema::build(
            DeclarationCategory::Query.root_type_name(),
            synthesized
                .has_mutation
                .then(|| DeclarationCategory::Mutation.root_type_name()),
            synthesized
                .has_subscription
                .then(|| DeclarationCategory::Subscription.root_type_name()),
        );
        for ty in synthesized.types {
            schema_builder = schema_builder.register(ty);
        }

        // Configure limits
        let mut schema_builder = schema_builder.limit_depth(self.config.max_depth);
        schema_builder = schema_builder.limit_complexity(self.config.max_complexity);

        if !self.config.introspection_enabled {
            schema_builder = schema_builder.disable_introspection();
        }

        let schema = schema_builder
            .finish()
            .map_err(|e| SchemaError::SchemaBuildFailed(e.to_string()))?;

        debug!(bindings = bindings.len(), "GraphQL schema build complete");

        let bindings = Arc::new(bindings);
        Ok(ExecutableSchema {
            schema,
            metadata: Arc::clone(&self.metadata),
            runtime: Arc::new(RequestRuntime {
                context_factory: ContextFactory::from_bindings(&bindings),
                bindings,
                batch_delay: self.config.batch_delay,
                max_batch_size: self.config.max_batch_size,
            }),
        })
    }
}

impl std::fmt::Debug for ApplicationSchemaBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationSchemaBuilder")
            .field("application", &self.metadata.name)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

/// Per-request setup shared by queries, subscriptions and actions.
struct RequestRuntime {
    context_factory: ContextFactory,
    bindings: Arc<BindingTable>,
    batch_delay: Duration,
    max_batch_size: usize,
}

impl RequestRuntime {
    /// Resolves the request context and creates the request's loaders.
    async fn prepare(&self, request_data: Json) -> ResolverResult<(RequestContext, FieldLoaders)> {
        let context = self.context_factory.create(request_data).await?;
        let loaders = FieldLoaders::new(&self.bindings, &context, self.batch_delay, self.max_batch_size);
        Ok((context, loaders))
    }
}

fn error_response(error: async_graphql::Error) -> Response {
    Response::from_errors(vec![ServerError::new(error.message, None)])
}

/// A finished schema with its resolver bindings.
#[derive(Clone)]
pub struct ExecutableSchema {
    schema: Schema,
    metadata: Arc<ApplicationMetadata>,
    runtime: Arc<RequestRuntime>,
}

impl ExecutableSchema {
    /// Executes a query or mutation.
    ///
    /// Context resolvers run once before execution; if any fails, the request
    /// is not executed and the error is returned as the only response error.
    #[instrument(skip_all)]
    pub async fn execute(&self, request: impl Into<Request>, request_data: Json) -> Response {
        let request = request.into();
        match self.runtime.prepare(request_data).await {
            Ok((context, loaders)) => self.schema.execute(request.data(context).data(loaders)).await,
            Err(error) => error_response(error),
        }
    }

    /// Executes a subscription, yielding one response per event.
    pub fn execute_stream(&self, request: impl Into<Request>, request_data: Json) -> BoxStream<'static, Response> {
        let request = request.into();
        let schema = self.schema.clone();
        let runtime = Arc::clone(&self.runtime);

        stream::once(async move {
            match runtime.prepare(request_data).await {
                Ok((context, loaders)) => schema.execute_stream(request.data(context).data(loaders)).boxed(),
                Err(error) => stream::once(async move { error_response(error) }).boxed(),
            }
        })
        .flatten()
        .boxed()
    }

    /// Looks up an action and its bound resolver.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<BoundAction> {
        let metadata = self.metadata.action(name)?.clone();
        let func = match self
            .runtime
            .bindings
            .declaration(DeclarationCategory::Action, name)
            .map(|binding| &binding.func)
        {
            Some(ResolverFn::Item(func)) => Some(Arc::clone(func)),
            _ => None,
        };
        Some(BoundAction {
            metadata,
            func,
            runtime: Arc::clone(&self.runtime),
        })
    }

    /// Returns the schema definition language representation.
    #[must_use]
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn metadata(&self) -> &ApplicationMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn bindings(&self) -> &BindingTable {
        &self.runtime.bindings
    }
}

impl std::fmt::Debug for ExecutableSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutableSchema")
            .field("application", &self.metadata.name)
            .field("bindings", &self.runtime.bindings.len())
            .field("context_factory", &self.runtime.context_factory)
            .finish()
    }
}

/// A route-style action handed to the transport layer.
#[derive(Clone)]
pub struct BoundAction {
    metadata: ActionMetadata,
    func: Option<ItemResolverFn>,
    runtime: Arc<RequestRuntime>,
}

impl BoundAction {
    #[must_use]
    pub fn metadata(&self) -> &ActionMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.func.is_some()
    }

    /// Resolves the request context and invokes the action resolver.
    ///
    /// # Errors
    ///
    /// Returns the context or resolver error, or an error if no resolver is
    /// bound to the action.
    pub async fn invoke(&self, args: Json, request_data: Json) -> ResolverResult<Json> {
        let func = self.func.as_ref().ok_or_else(|| {
            async_graphql::Error::new(format!(
                "no resolver bound for {} `{}`",
                DeclarationCategory::Action,
                self.metadata.name
            ))
        })?;
        let context = self.runtime.context_factory.create(request_data).await?;
        func(ResolverInput { args, context }).await
    }
}

impl std::fmt::Debug for BoundAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundAction")
            .field("name", &self.metadata.name)
            .field("bound", &self.func.is_some())
            .finish()
    }
}
