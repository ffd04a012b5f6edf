//! Per-request execution context.
//!
//! A [`RequestContext`] is built once per request by running every context
//! resolver concurrently. Field resolvers receive a cheap clone with the
//! already-resolved values; context resolvers are never re-invoked during
//! execution.
//!
//! # Example
//!
//! ```ignore
//! let registry = ResolverRegistry::new()
//!     .context("user", resolver::context(|input| async move {
//!         Ok(input.request["headers"]["x-user"].clone())
//!     }));
//!
//! // inside a resolver
//! let user = input.context.get("user");
//! ```

use std::sync::Arc;

use async_graphql::Error as GraphQLError;
use futures_util::future::try_join_all;
use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::resolvers::{BindingTable, ContextInput, ContextResolverFn, Json, ResolverFn};

/// Resolved context values of one request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    values: Arc<IndexMap<String, Json>>,
    request: Arc<Json>,
}

impl RequestContext {
    /// Creates a context from already-resolved values.
    #[must_use]
    pub fn new(values: IndexMap<String, Json>, request: Json) -> Self {
        Self {
            values: Arc::new(values),
            request: Arc::new(request),
        }
    }

    /// Returns the value of a context key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Json> {
        self.values.get(key)
    }

    /// Returns the transport-supplied request data.
    #[must_use]
    pub fn request(&self) -> &Json {
        &self.request
    }

    /// Returns all context values as one JSON object.
    #[must_use]
    pub fn to_json(&self) -> Json {
        Json::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Builds request contexts from the bound context resolvers.
#[derive(Clone, Default)]
pub struct ContextFactory {
    resolvers: Vec<(String, ContextResolverFn)>,
}

impl ContextFactory {
    /// Collects the context resolvers of a binding table.
    #[must_use]
    pub fn from_bindings(bindings: &BindingTable) -> Self {
        let resolvers = bindings
            .context_bindings()
            .filter_map(|binding| match &binding.func {
                ResolverFn::Context(f) => Some((binding.target_name.clone(), Arc::clone(f))),
                _ => None,
            })
            .collect();
        Self { resolvers }
    }

    /// Runs every context resolver once and collects the results.
    ///
    /// # Errors
    ///
    /// Returns the first context resolver error; the request must not run.
    #[instrument(skip(self, request), fields(key_count = self.resolvers.len()))]
    pub async fn create(&self, request: Json) -> Result<RequestContext, GraphQLError> {
        let request = Arc::new(request);
        let futures = self.resolvers.iter().map(|(key, f)| {
            let input = ContextInput {
                request: Arc::clone(&request),
            };
            let key = key.clone();
            let future = f(input);
            async move {
                let value = future
                    .await
                    .map_err(|e| GraphQLError::new(format!("context `{key}`: {}", e.message)))?;
                Ok::<_, GraphQLError>((key, value))
            }
        });

        let values: IndexMap<String, Json> = try_join_all(futures).await?.into_iter().collect();
        debug!(keys = values.len(), "Request context resolved");

        Ok(RequestContext {
            values: Arc::new(values),
            request,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl std::fmt::Debug for ContextFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextFactory")
            .field("keys", &self.resolvers.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}
