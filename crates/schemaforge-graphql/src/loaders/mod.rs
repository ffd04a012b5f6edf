//! DataLoaders for batched model fields.
//!
//! A batched resolver is invoked once for all sibling parents of a field
//! instead of once per parent, preventing N+1 resolver calls in nested
//! selections.
//!
//! - [`BatchedFieldLoader`] - loads one `(model, field)` pair
//! - [`FieldLoaders`] - the per-request set of loaders
//!
//! ## Usage
//!
//! Loaders are created per request, after the context has been resolved, and
//! added to the GraphQL request data:
//!
//! ```ignore
//! let loaders = FieldLoaders::new(&bindings, &context, Duration::from_millis(1), 1000);
//! let request = request.data(context).data(loaders);
//! ```

mod field;

pub use field::{BatchKey, BatchedFieldLoader};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_graphql::dataloader::DataLoader;

use crate::context::RequestContext;
use crate::resolvers::{BindingCategory, BindingTable, ResolverFn};

/// Collection of batched field loaders for one GraphQL request.
///
/// Loaders are wrapped in Arc for cheap cloning and shared access across
/// resolver contexts.
#[derive(Clone, Default)]
pub struct FieldLoaders {
    loaders: HashMap<(String, String), Arc<DataLoader<BatchedFieldLoader>>>,
}

impl FieldLoaders {
    /// Creates one loader per batched binding.
    ///
    /// `delay` controls how long a loader waits for sibling requests before
    /// executing a batch.
    #[must_use]
    pub fn new(bindings: &BindingTable, context: &RequestContext, delay: Duration, max_batch_size: usize) -> Self {
        let loaders = bindings
            .batched_bindings()
            .filter_map(|binding| {
                let (BindingCategory::Model(model), ResolverFn::Batched(func)) = (&binding.category, &binding.func)
                else {
                    return None;
                };
                let loader = BatchedFieldLoader::new(
                    model.clone(),
                    binding.target_name.clone(),
                    Arc::clone(func),
                    context.clone(),
                );
                let loader = DataLoader::new(loader, tokio::spawn)
                    .delay(delay)
                    .max_batch_size(max_batch_size);
                Some(((model.clone(), binding.target_name.clone()), Arc::new(loader)))
            })
            .collect();

        Self { loaders }
    }

    /// Returns the loader of a batched model field.
    #[must_use]
    pub fn get(&self, model: &str, field: &str) -> Option<&Arc<DataLoader<BatchedFieldLoader>>> {
        self.loaders.get(&(model.to_string(), field.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl std::fmt::Debug for FieldLoaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fields: Vec<String> = self.loaders.keys().map(|(m, f)| format!("{m}.{f}")).collect();
        fields.sort_unstable();
        f.debug_struct("FieldLoaders").field("fields", &fields).finish()
    }
}
