//! Constructors for [`ResolverFn`] values.
//!
//! ```ignore
//! use schemaforge_graphql::resolver;
//!
//! let registry = ResolverRegistry::new()
//!     .query("post", resolver::item(|input| async move {
//!         Ok(json!({"id": input.args["id"]}))
//!     }))
//!     .model("PostType", [("score", resolver::batched(|batch| async move {
//!         Ok(batch.parents.iter().map(|p| p["id"].clone()).collect())
//!     }))]);
//! ```

use std::future::Future;
use std::sync::Arc;

use futures_util::{FutureExt, Stream, StreamExt};

use super::{
    BatchInput, ContextInput, FieldInput, Json, ResolverFn, ResolverInput, ResolverResult,
};

/// Async declaration resolver.
pub fn item<F, Fut>(f: F) -> ResolverFn
where
    F: Fn(ResolverInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolverResult<Json>> + Send + 'static,
{
    ResolverFn::Item(Arc::new(move |input| f(input).boxed()))
}

/// Synchronous declaration resolver.
pub fn sync_item<F>(f: F) -> ResolverFn
where
    F: Fn(ResolverInput) -> ResolverResult<Json> + Send + Sync + 'static,
{
    ResolverFn::Item(Arc::new(move |input| {
        let result = f(input);
        async move { result }.boxed()
    }))
}

/// Subscription resolver producing a stream of events.
pub fn stream<F, Fut, S>(f: F) -> ResolverFn
where
    F: Fn(ResolverInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolverResult<S>> + Send + 'static,
    S: Stream<Item = ResolverResult<Json>> + Send + 'static,
{
    ResolverFn::Stream(Arc::new(move |input| {
        f(input).map(|result| result.map(StreamExt::boxed)).boxed()
    }))
}

/// Per-parent model field resolver.
pub fn field<F, Fut>(f: F) -> ResolverFn
where
    F: Fn(FieldInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolverResult<Json>> + Send + 'static,
{
    ResolverFn::Field(Arc::new(move |input| f(input).boxed()))
}

/// Batched model field resolver.
///
/// Called once per group of sibling parents; must return a result for every
/// parent in order.
pub fn batched<F, Fut>(f: F) -> ResolverFn
where
    F: Fn(BatchInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolverResult<Vec<Json>>> + Send + 'static,
{
    ResolverFn::Batched(Arc::new(move |input| f(input).boxed()))
}

/// Async context resolver.
pub fn context<F, Fut>(f: F) -> ResolverFn
where
    F: Fn(ContextInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolverResult<Json>> + Send + 'static,
{
    ResolverFn::Context(Arc::new(move |input| f(input).boxed()))
}

/// Synchronous context resolver.
pub fn sync_context<F>(f: F) -> ResolverFn
where
    F: Fn(ContextInput) -> ResolverResult<Json> + Send + Sync + 'static,
{
    ResolverFn::Context(Arc::new(move |input| {
        let result = f(input);
        async move { result }.boxed()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use serde_json::json;

    fn input(args: Json) -> ResolverInput {
        ResolverInput {
            args,
            context: RequestContext::default(),
        }
    }

    #[tokio::test]
    async fn test_item_and_sync_item() {
        let ResolverFn::Item(async_fn) = item(|input| async move { Ok(input.args["id"].clone()) }) else {
            panic!("expected item resolver");
        };
        let ResolverFn::Item(sync_fn) = sync_item(|input| Ok(input.args["id"].clone())) else {
            panic!("expected item resolver");
        };

        assert_eq!(async_fn(input(json!({"id": 7}))).await.unwrap(), json!(7));
        assert_eq!(sync_fn(input(json!({"id": 8}))).await.unwrap(), json!(8));
    }

    #[tokio::test]
    async fn test_stream() {
        let ResolverFn::Stream(f) = stream(|_| async {
            Ok(futures_util::stream::iter([Ok(json!(1)), Ok(json!(2))]))
        }) else {
            panic!("expected stream resolver");
        };
        let events: Vec<_> = f(input(json!({}))).await.unwrap().collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].as_ref().unwrap(), &json!(2));
    }

    #[tokio::test]
    async fn test_sync_context() {
        let ResolverFn::Context(f) = sync_context(|input| Ok(input.request["user"].clone())) else {
            panic!("expected context resolver");
        };
        let value = f(ContextInput {
            request: Arc::new(json!({"user": "ada"})),
        })
        .await
        .unwrap();
        assert_eq!(value, json!("ada"));
    }

    #[test]
    fn test_shapes() {
        assert_eq!(field(|_| async { Ok(Json::Null) }).shape(), "a field");
        assert_eq!(batched(|_| async { Ok(vec![]) }).shape(), "a batched");
        assert_eq!(context(|_| async { Ok(Json::Null) }).shape(), "a context");
    }
}
