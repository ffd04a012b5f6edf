//! Lazy schema loading.
//!
//! `LazySchema` defers the schema build until first access, so a host can
//! start serving before binding and synthesis have run. Replacing the
//! builder (new metadata or resolvers) invalidates the cached schema.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::{ApplicationSchemaBuilder, ExecutableSchema};
use crate::error::SchemaError;

/// State of the lazy schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// Schema has not been built yet.
    Uninitialized,
    /// Schema is currently being built.
    Building,
    /// Schema is ready for use.
    Ready,
    /// Schema build failed.
    Failed,
}

/// Thread-safe lazy schema holder.
///
/// # Example
///
/// ```ignore
/// let lazy_schema = LazySchema::new(builder);
///
/// // First access triggers build
/// let schema = lazy_schema.get_or_build().await?;
///
/// // Swap in new resolvers; the next access rebuilds
/// lazy_schema.replace_builder(new_builder).await;
/// ```
pub struct LazySchema {
    /// The cached schema (None if not built yet or invalidated).
    schema: RwLock<Option<Arc<ExecutableSchema>>>,

    /// Build lock to ensure only one build at a time.
    build_lock: Mutex<()>,

    state: RwLock<SchemaState>,

    builder: RwLock<Arc<ApplicationSchemaBuilder>>,

    /// Last build error message (for diagnostics).
    last_error: RwLock<Option<String>>,
}

impl LazySchema {
    #[must_use]
    pub fn new(builder: ApplicationSchemaBuilder) -> Self {
        Self {
            schema: RwLock::new(None),
            build_lock: Mutex::new(()),
            state: RwLock::new(SchemaState::Uninitialized),
            builder: RwLock::new(Arc::new(builder)),
            last_error: RwLock::new(None),
        }
    }

    pub async fn state(&self) -> SchemaState {
        *self.state.read().await
    }

    /// Gets the schema, building it if necessary.
    ///
    /// Concurrent callers receive [`SchemaError::SchemaInitializing`] while a
    /// build is in progress. Use [`get_or_build_wait`](Self::get_or_build_wait)
    /// where waiting is acceptable.
    ///
    /// # Errors
    ///
    /// Returns `SchemaInitializing` if another build is in progress, or the
    /// build error.
    pub async fn get_or_build(&self) -> Result<Arc<ExecutableSchema>, SchemaError> {
        if let Some(schema) = self.get().await {
            return Ok(schema);
        }

        if *self.state.read().await == SchemaState::Building {
            return Err(SchemaError::SchemaInitializing);
        }

        let Ok(_guard) = self.build_lock.try_lock() else {
            return Err(SchemaError::SchemaInitializing);
        };

        // Double-check after acquiring lock
        if let Some(schema) = self.get().await {
            return Ok(schema);
        }

        self.build_locked().await
    }

    /// Gets the schema, waiting for an in-progress build instead of failing.
    ///
    /// A previously failed build is not retried until the schema is
    /// invalidated.
    ///
    /// # Errors
    ///
    /// Returns the build error, or `SchemaBuildFailed` with the last error.
    pub async fn get_or_build_wait(&self) -> Result<Arc<ExecutableSchema>, SchemaError> {
        if let Some(schema) = self.get().await {
            return Ok(schema);
        }

        let _guard = self.build_lock.lock().await;

        if let Some(schema) = self.get().await {
            return Ok(schema);
        }

        if *self.state.read().await == SchemaState::Failed {
            if let Some(err) = self.last_error.read().await.as_ref() {
                return Err(SchemaError::SchemaBuildFailed(err.clone()));
            }
        }

        self.build_locked().await
    }

    /// Runs the build. Callers must hold `build_lock`.
    async fn build_locked(&self) -> Result<Arc<ExecutableSchema>, SchemaError> {
        *self.state.write().await = SchemaState::Building;
        let builder = Arc::clone(&*self.builder.read().await);
        info!(application = %builder.metadata().name, "Building GraphQL schema...");

        match builder.build() {
            Ok(schema) => {
                let schema = Arc::new(schema);
                *self.schema.write().await = Some(Arc::clone(&schema));
                *self.state.write().await = SchemaState::Ready;
                *self.last_error.write().await = None;
                info!("GraphQL schema built successfully");
                Ok(schema)
            }
            Err(e) => {
                let error_msg = e.to_string();
                warn!(error = %error_msg, "Failed to build GraphQL schema");
                *self.state.write().await = SchemaState::Failed;
                *self.last_error.write().await = Some(error_msg);
                Err(e)
            }
        }
    }

    /// Gets the schema if it's already built, without triggering a build.
    pub async fn get(&self) -> Option<Arc<ExecutableSchema>> {
        self.schema.read().await.clone()
    }

    /// Invalidates the cached schema, causing the next access to rebuild it.
    pub async fn invalidate(&self) {
        let _guard = self.build_lock.lock().await;
        self.reset().await;
        info!("GraphQL schema invalidated - will rebuild on next request");
    }

    /// Replaces the builder and invalidates the cached schema.
    pub async fn replace_builder(&self, builder: ApplicationSchemaBuilder) {
        let _guard = self.build_lock.lock().await;
        *self.builder.write().await = Arc::new(builder);
        self.reset().await;
        info!("GraphQL schema builder replaced - will rebuild on next request");
    }

    async fn reset(&self) {
        *self.schema.write().await = None;
        *self.state.write().await = SchemaState::Uninitialized;
        *self.last_error.write().await = None;
    }

    /// Returns the last build error, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn is_ready(&self) -> bool {
        *self.state.read().await == SchemaState::Ready
    }
}

impl std::fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySchema")
            .field("state", &self.state.try_read().map(|s| *s).ok())
            .finish_non_exhaustive()
    }
}
