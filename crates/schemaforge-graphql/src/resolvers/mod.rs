//! Resolver functions and their binding to schema fields.
//!
//! User code registers resolvers in a [`ResolverRegistry`]. At build time the
//! registry is normalized into a [`BindingTable`] keyed by
//! `(category, name)`; the schema synthesizer then looks up each field's
//! binding exactly once while constructing the field.
//!
//! - [`resolver`] - helpers turning closures into [`ResolverFn`]s
//! - [`binder`] - registrations, bindings and validation

mod binder;
pub mod resolver;

pub use binder::{
    BindingCategory, BindingKind, BindingTable, Discriminator, ResolverBinding, ResolverRegistry,
};

use std::sync::Arc;

use async_graphql::dynamic::ResolverContext;
use async_graphql::{Error as GraphQLError, Value};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

use crate::context::RequestContext;

/// JSON values exchanged with resolvers.
pub type Json = serde_json::Value;

/// Result of a resolver invocation.
pub type ResolverResult<T> = Result<T, GraphQLError>;

/// Input of a declaration (query, mutation, subscription or action) resolver.
#[derive(Debug, Clone)]
pub struct ResolverInput {
    /// Decoded arguments as a JSON object. Omitted arguments are absent.
    pub args: Json,
    pub context: RequestContext,
}

/// Input of a per-field model resolver.
#[derive(Debug, Clone)]
pub struct FieldInput {
    pub parent: Json,
    pub args: Json,
    pub context: RequestContext,
}

/// Input of a batched model resolver.
///
/// All parents share the same `args`. The resolver must return one result per
/// parent, in the same order.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub parents: Vec<Json>,
    pub args: Json,
    pub context: RequestContext,
}

/// Input of a context resolver.
#[derive(Debug, Clone)]
pub struct ContextInput {
    /// Transport-supplied request data (headers, session, ...).
    pub request: Arc<Json>,
}

pub type ItemResolverFn = Arc<dyn Fn(ResolverInput) -> BoxFuture<'static, ResolverResult<Json>> + Send + Sync>;

pub type StreamResolverFn = Arc<
    dyn Fn(ResolverInput) -> BoxFuture<'static, ResolverResult<BoxStream<'static, ResolverResult<Json>>>>
        + Send
        + Sync,
>;

pub type FieldResolverFn = Arc<dyn Fn(FieldInput) -> BoxFuture<'static, ResolverResult<Json>> + Send + Sync>;

pub type BatchResolverFn =
    Arc<dyn Fn(BatchInput) -> BoxFuture<'static, ResolverResult<Vec<Json>>> + Send + Sync>;

pub type ContextResolverFn = Arc<dyn Fn(ContextInput) -> BoxFuture<'static, ResolverResult<Json>> + Send + Sync>;

/// A registered resolver function, tagged by invocation shape.
#[derive(Clone)]
pub enum ResolverFn {
    /// Resolves a query, mutation or action.
    Item(ItemResolverFn),
    /// Produces the event stream of a subscription.
    Stream(StreamResolverFn),
    /// Resolves one model field for one parent.
    Field(FieldResolverFn),
    /// Resolves one model field for all sibling parents at once.
    Batched(BatchResolverFn),
    /// Produces one per-request context value.
    Context(ContextResolverFn),
}

impl ResolverFn {
    /// Name of the invocation shape, used in diagnostics.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Item(_) => "an item",
            Self::Stream(_) => "a stream",
            Self::Field(_) => "a field",
            Self::Batched(_) => "a batched",
            Self::Context(_) => "a context",
        }
    }
}

impl std::fmt::Debug for ResolverFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ResolverFn").field(&self.shape()).finish()
    }
}

/// Helper to extract the request context from a resolver context.
pub(crate) fn get_request_context<'a>(ctx: &'a ResolverContext<'_>) -> Result<&'a RequestContext, GraphQLError> {
    ctx.data::<RequestContext>()
        .map_err(|_| GraphQLError::new("Request context not available"))
}

/// Convert a serde_json::Value to async_graphql::Value.
pub(crate) fn json_to_graphql_value(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Number(async_graphql::Number::from_f64(f).unwrap_or_else(|| async_graphql::Number::from(0)))
            } else {
                Value::Null
            }
        }
        Json::String(s) => Value::String(s),
        Json::Array(arr) => Value::List(arr.into_iter().map(json_to_graphql_value).collect()),
        Json::Object(obj) => {
            let map: async_graphql::indexmap::IndexMap<async_graphql::Name, Value> = obj
                .into_iter()
                .map(|(k, v)| (async_graphql::Name::new(k), json_to_graphql_value(v)))
                .collect();
            Value::Object(map)
        }
    }
}

/// Convert an async_graphql::Value to serde_json::Value.
///
/// Enum items become their names; decoding to enum literals happens against
/// the input shape.
pub(crate) fn graphql_value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Number(n) => Json::Number(n.clone()),
        Value::String(s) => Json::String(s.clone()),
        Value::Enum(name) => Json::String(name.to_string()),
        Value::Binary(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
        Value::List(items) => Json::Array(items.iter().map(graphql_value_to_json).collect()),
        Value::Object(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.to_string(), graphql_value_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_value_conversion() {
        let original = json!({
            "id": 1,
            "score": 2.5,
            "tags": ["a", "b"],
            "nested": {"ok": true, "none": null}
        });
        let value = json_to_graphql_value(original.clone());
        assert_eq!(graphql_value_to_json(&value), original);
    }

    #[test]
    fn test_enum_value_becomes_name() {
        let value = Value::Enum(async_graphql::Name::new("draft"));
        assert_eq!(graphql_value_to_json(&value), json!("draft"));
    }
}
