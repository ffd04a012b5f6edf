//! DataLoader for batched model field resolvers.
//!
//! Every model field bound to a batched resolver gets one loader per request.
//! Loads issued by sibling parents in the same execution tick are coalesced,
//! grouped by their field arguments and handed to the resolver as one batch.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_graphql::dataloader::Loader;
use futures_util::future::try_join_all;
use tracing::{debug, instrument, trace};

use crate::context::RequestContext;
use crate::error::BatchLoadError;
use crate::resolvers::{BatchInput, BatchResolverFn, Json};

/// Key identifying one parent's request for a batched field.
///
/// Equality is structural over the parent value and the field arguments.
#[derive(Debug, Clone)]
pub struct BatchKey {
    pub parent: Arc<Json>,
    pub args: Arc<Json>,
    args_fingerprint: String,
    fingerprint: String,
}

impl BatchKey {
    #[must_use]
    pub fn new(parent: Json, args: Json) -> Self {
        let args_fingerprint = args.to_string();
        let fingerprint = format!("{parent}\u{0}{args_fingerprint}");
        Self {
            parent: Arc::new(parent),
            args: Arc::new(args),
            args_fingerprint,
            fingerprint,
        }
    }
}

impl PartialEq for BatchKey {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for BatchKey {}

impl Hash for BatchKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

/// Loader calling a batched resolver of one model field.
pub struct BatchedFieldLoader {
    model: String,
    field: String,
    func: BatchResolverFn,
    context: RequestContext,
}

impl BatchedFieldLoader {
    #[must_use]
    pub fn new(model: impl Into<String>, field: impl Into<String>, func: BatchResolverFn, context: RequestContext) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
            func,
            context,
        }
    }

    /// Runs the resolver for parents sharing the same arguments.
    async fn load_group(&self, keys: Vec<&BatchKey>) -> Result<Vec<(BatchKey, Json)>, Arc<BatchLoadError>> {
        let args = keys.first().map(|k| Json::clone(&k.args)).unwrap_or(Json::Null);
        let parents: Vec<Json> = keys.iter().map(|k| Json::clone(&k.parent)).collect();
        let expected = parents.len();

        trace!(
            model = %self.model,
            field = %self.field,
            parents = expected,
            "Invoking batched resolver"
        );

        let results = (self.func)(BatchInput {
            parents,
            args,
            context: self.context.clone(),
        })
        .await
        .map_err(|e| Arc::new(BatchLoadError::Resolver(e.message)))?;

        if results.len() != expected {
            return Err(Arc::new(BatchLoadError::LengthMismatch {
                model: self.model.clone(),
                field: self.field.clone(),
                expected,
                actual: results.len(),
            }));
        }

        Ok(keys.into_iter().cloned().zip(results).collect())
    }
}

impl Loader<BatchKey> for BatchedFieldLoader {
    type Value = Json;
    type Error = Arc<BatchLoadError>;

    #[instrument(skip(self, keys), fields(model = %self.model, field = %self.field, key_count = keys.len()))]
    async fn load(&self, keys: &[BatchKey]) -> Result<HashMap<BatchKey, Self::Value>, Self::Error> {
        let mut groups: Vec<(&str, Vec<&BatchKey>)> = Vec::new();
        for key in keys {
            match groups
                .iter_mut()
                .find(|(fingerprint, _)| *fingerprint == key.args_fingerprint.as_str())
            {
                Some((_, group)) => group.push(key),
                None => groups.push((key.args_fingerprint.as_str(), vec![key])),
            }
        }

        debug!(groups = groups.len(), "Loading batched field");

        let loaded = try_join_all(groups.into_iter().map(|(_, group)| self.load_group(group))).await?;
        Ok(loaded.into_iter().flatten().collect())
    }
}
