//! Resolver registrations and the binding table.
//!
//! Four registration shapes are accepted:
//!
//! - a declaration set: many named resolvers for one category at once
//! - a single declaration item
//! - a model resolver: per-field functions, plain or batched
//! - a context resolver: one function per context key
//!
//! [`ResolverRegistry::bind`] flattens them into a [`BindingTable`] and
//! validates every binding against the metadata. All problems are reported
//! together.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use schemaforge_metadata::{ApplicationMetadata, DeclarationCategory};
use tracing::debug;

use super::{Json, ResolverFn};
use crate::error::{BindingError, SchemaError};

/// Picks the member type of a union value.
///
/// Returns the schema name of the member type, or `None` when the value
/// cannot be discriminated.
pub type Discriminator = Arc<dyn Fn(&Json) -> Option<String> + Send + Sync>;

/// Namespace of a binding key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingCategory {
    Declaration(DeclarationCategory),
    /// Fields of the named model.
    Model(String),
    Context,
}

impl fmt::Display for BindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declaration(category) => write!(f, "{category}"),
            Self::Model(model) => write!(f, "model `{model}` field"),
            Self::Context => f.write_str("context key"),
        }
    }
}

/// Registration shape a binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Declaration,
    DeclarationItem,
    Model,
    Context,
}

impl BindingKind {
    fn label(self) -> &'static str {
        match self {
            Self::Declaration => "declarations",
            Self::DeclarationItem => "declaration",
            Self::Model => "model",
            Self::Context => "context",
        }
    }
}

/// One validated resolver, attached to exactly one schema field or context key.
#[derive(Debug, Clone)]
pub struct ResolverBinding {
    pub kind: BindingKind,
    pub category: BindingCategory,
    pub target_name: String,
    pub batched: bool,
    pub func: ResolverFn,
    /// Registration site, e.g. `model #2`.
    pub site: String,
}

/// Resolver bindings keyed by `(category, name)`, in registration order.
#[derive(Clone, Default)]
pub struct BindingTable {
    bindings: IndexMap<(BindingCategory, String), ResolverBinding>,
    discriminators: HashMap<String, Discriminator>,
}

impl BindingTable {
    /// Looks up the binding of a declaration.
    #[must_use]
    pub fn declaration(&self, category: DeclarationCategory, name: &str) -> Option<&ResolverBinding> {
        self.get(&BindingCategory::Declaration(category), name)
    }

    /// Looks up the binding of a model field.
    #[must_use]
    pub fn model_field(&self, model: &str, field: &str) -> Option<&ResolverBinding> {
        self.get(&BindingCategory::Model(model.to_string()), field)
    }

    #[must_use]
    pub fn get(&self, category: &BindingCategory, name: &str) -> Option<&ResolverBinding> {
        self.bindings.get(&(category.clone(), name.to_string()))
    }

    /// Context resolvers in registration order.
    pub fn context_bindings(&self) -> impl Iterator<Item = &ResolverBinding> {
        self.iter()
            .filter(|binding| binding.category == BindingCategory::Context)
    }

    /// Batched model field bindings.
    pub fn batched_bindings(&self) -> impl Iterator<Item = &ResolverBinding> {
        self.iter().filter(|binding| binding.batched)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolverBinding> {
        self.bindings.values()
    }

    /// Discriminator registered for a union type.
    #[must_use]
    pub fn discriminator(&self, union_name: &str) -> Option<&Discriminator> {
        self.discriminators.get(union_name)
    }

    pub(crate) fn discriminator_names(&self) -> impl Iterator<Item = &str> {
        self.discriminators.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Registration as supplied by user code, before validation.
#[derive(Clone)]
enum Registration {
    Declarations {
        category: DeclarationCategory,
        resolvers: Vec<(String, ResolverFn)>,
    },
    DeclarationItem {
        category: DeclarationCategory,
        name: String,
        resolver: ResolverFn,
    },
    Model {
        model: String,
        fields: Vec<(String, ResolverFn)>,
    },
    Context {
        key: String,
        resolver: ResolverFn,
    },
}

impl Registration {
    fn kind(&self) -> BindingKind {
        match self {
            Self::Declarations { .. } => BindingKind::Declaration,
            Self::DeclarationItem { .. } => BindingKind::DeclarationItem,
            Self::Model { .. } => BindingKind::Model,
            Self::Context { .. } => BindingKind::Context,
        }
    }

    /// Expands the registration into `(category, name, resolver)` entries.
    fn entries(&self) -> Vec<(BindingCategory, &str, &ResolverFn)> {
        match self {
            Self::Declarations {
                category,
                resolvers,
            } => resolvers
                .iter()
                .map(|(name, f)| (BindingCategory::Declaration(*category), name.as_str(), f))
                .collect(),
            Self::DeclarationItem {
                category,
                name,
                resolver,
            } => vec![(BindingCategory::Declaration(*category), name.as_str(), resolver)],
            Self::Model { model, fields } => fields
                .iter()
                .map(|(name, f)| (BindingCategory::Model(model.clone()), name.as_str(), f))
                .collect(),
            Self::Context { key, resolver } => vec![(BindingCategory::Context, key.as_str(), resolver)],
        }
    }
}

/// Collects resolver registrations for an application.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    registrations: Vec<Registration>,
    discriminators: HashMap<String, Discriminator>,
}

impl ResolverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a set of resolvers for declarations of one category.
    #[must_use]
    pub fn declarations<I, N>(mut self, category: DeclarationCategory, resolvers: I) -> Self
    where
        I: IntoIterator<Item = (N, ResolverFn)>,
        N: Into<String>,
    {
        self.registrations.push(Registration::Declarations {
            category,
            resolvers: resolvers.into_iter().map(|(n, f)| (n.into(), f)).collect(),
        });
        self
    }

    /// Registers a resolver for a single declaration.
    #[must_use]
    pub fn declaration(mut self, category: DeclarationCategory, name: impl Into<String>, resolver: ResolverFn) -> Self {
        self.registrations.push(Registration::DeclarationItem {
            category,
            name: name.into(),
            resolver,
        });
        self
    }

    #[must_use]
    pub fn query(self, name: impl Into<String>, resolver: ResolverFn) -> Self {
        self.declaration(DeclarationCategory::Query, name, resolver)
    }

    #[must_use]
    pub fn mutation(self, name: impl Into<String>, resolver: ResolverFn) -> Self {
        self.declaration(DeclarationCategory::Mutation, name, resolver)
    }

    #[must_use]
    pub fn subscription(self, name: impl Into<String>, resolver: ResolverFn) -> Self {
        self.declaration(DeclarationCategory::Subscription, name, resolver)
    }

    #[must_use]
    pub fn action(self, name: impl Into<String>, resolver: ResolverFn) -> Self {
        self.declaration(DeclarationCategory::Action, name, resolver)
    }

    /// Registers per-field resolvers of a model.
    #[must_use]
    pub fn model<I, N>(mut self, model: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (N, ResolverFn)>,
        N: Into<String>,
    {
        self.registrations.push(Registration::Model {
            model: model.into(),
            fields: fields.into_iter().map(|(n, f)| (n.into(), f)).collect(),
        });
        self
    }

    /// Registers the resolver of one context key.
    #[must_use]
    pub fn context(mut self, key: impl Into<String>, resolver: ResolverFn) -> Self {
        self.registrations.push(Registration::Context {
            key: key.into(),
            resolver,
        });
        self
    }

    /// Registers the discriminator of a union type.
    #[must_use]
    pub fn discriminator<F>(mut self, union_name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Json) -> Option<String> + Send + Sync + 'static,
    {
        self.discriminators.insert(union_name.into(), Arc::new(f));
        self
    }

    /// Normalizes all registrations into a binding table.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Binding`] listing duplicate registrations,
    /// unknown targets and resolvers of the wrong shape.
    pub fn bind(&self, metadata: &ApplicationMetadata) -> Result<BindingTable, SchemaError> {
        let mut errors = Vec::new();
        let mut sites: IndexMap<(BindingCategory, String), Vec<String>> = IndexMap::new();
        let mut bindings: IndexMap<(BindingCategory, String), ResolverBinding> = IndexMap::new();
        let mut counters: HashMap<&'static str, usize> = HashMap::new();

        for registration in &self.registrations {
            let kind = registration.kind();
            let counter = counters.entry(kind.label()).or_default();
            let site = format!("{} #{}", kind.label(), counter);
            *counter += 1;

            if let Registration::Model { model, .. } = registration {
                if metadata.model(model).is_none() {
                    errors.push(BindingError::UnknownModel {
                        model: model.clone(),
                    });
                    continue;
                }
            }

            for (category, name, func) in registration.entries() {
                if let Some(error) = validate_target(metadata, &category, name, func) {
                    errors.push(error);
                    continue;
                }

                let key = (category.clone(), name.to_string());
                sites.entry(key.clone()).or_default().push(site.clone());
                bindings.entry(key).or_insert_with(|| ResolverBinding {
                    kind,
                    category,
                    target_name: name.to_string(),
                    batched: matches!(func, ResolverFn::Batched(_)),
                    func: func.clone(),
                    site: site.clone(),
                });
            }
        }

        for ((category, name), sites) in sites {
            if sites.len() > 1 {
                errors.push(BindingError::Duplicate {
                    category,
                    name,
                    sites,
                });
            }
        }

        if !errors.is_empty() {
            return Err(SchemaError::Binding(errors));
        }

        debug!(
            bindings = bindings.len(),
            discriminators = self.discriminators.len(),
            "Resolver bindings resolved"
        );

        Ok(BindingTable {
            bindings,
            discriminators: self.discriminators.clone(),
        })
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("registrations", &self.registrations.len())
            .field("discriminators", &self.discriminators.len())
            .finish()
    }
}

impl fmt::Debug for BindingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingTable")
            .field("bindings", &self.bindings.values().collect::<Vec<_>>())
            .field("discriminators", &self.discriminators.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Checks that the target exists and the resolver has the shape it needs.
fn validate_target(
    metadata: &ApplicationMetadata,
    category: &BindingCategory,
    name: &str,
    func: &ResolverFn,
) -> Option<BindingError> {
    let expected = match category {
        BindingCategory::Declaration(declaration) => {
            let known = match declaration {
                DeclarationCategory::Action => metadata.action(name).is_some(),
                other => metadata.declaration(*other, name).is_some(),
            };
            if !known {
                return Some(BindingError::UnknownDeclaration {
                    category: *declaration,
                    name: name.to_string(),
                });
            }
            match (declaration, func) {
                (DeclarationCategory::Subscription, ResolverFn::Stream(_)) => None,
                (DeclarationCategory::Subscription, _) => Some("a stream"),
                (_, ResolverFn::Item(_)) => None,
                _ => Some("an item"),
            }
        }
        BindingCategory::Model(model) => {
            let has_field = metadata
                .model(model)
                .is_some_and(|m| m.property(name).is_some());
            if !has_field {
                return Some(BindingError::UnknownField {
                    model: model.clone(),
                    field: name.to_string(),
                });
            }
            match func {
                ResolverFn::Field(_) | ResolverFn::Batched(_) => None,
                _ => Some("a field or batched"),
            }
        }
        BindingCategory::Context => match func {
            ResolverFn::Context(_) => None,
            _ => Some("a context"),
        },
    };

    expected.map(|expected| BindingError::ShapeMismatch {
        category: category.clone(),
        name: name.to_string(),
        expected,
        found: func.shape(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::resolver;
    use schemaforge_metadata::{DeclarationNode, PropertyNode, TypeDecl, TypeGraph, TypeNode, normalize};
    use serde_json::json;

    fn metadata() -> ApplicationMetadata {
        let graph = TypeGraph::new("blog")
            .model(TypeDecl::new(
                "PostType",
                TypeNode::object([
                    PropertyNode::new("id", TypeNode::number()),
                    PropertyNode::new("score", TypeNode::number()),
                ]),
            ))
            .query(DeclarationNode::new("post", TypeNode::reference("PostType")))
            .subscription(DeclarationNode::new("postAdded", TypeNode::reference("PostType")));
        normalize(&graph).unwrap()
    }

    fn item() -> ResolverFn {
        resolver::sync_item(|_| Ok(json!(null)))
    }

    #[test]
    fn test_bind_all_shapes() {
        let registry = ResolverRegistry::new()
            .declarations(DeclarationCategory::Query, [("post", item())])
            .subscription(
                "postAdded",
                resolver::stream(|_| async { Ok(futures_util::stream::empty()) }),
            )
            .model(
                "PostType",
                [("score", resolver::batched(|batch| async move { Ok(vec![json!(0); batch.parents.len()]) }))],
            )
            .context("user", resolver::sync_context(|_| Ok(json!("ada"))));

        let table = registry.bind(&metadata()).unwrap();

        assert_eq!(table.len(), 4);
        let post = table.declaration(DeclarationCategory::Query, "post").unwrap();
        assert_eq!(post.kind, BindingKind::Declaration);
        assert_eq!(post.site, "declarations #0");
        assert!(table.model_field("PostType", "score").unwrap().batched);
        assert_eq!(table.context_bindings().count(), 1);
        assert_eq!(table.batched_bindings().count(), 1);
    }

    #[test]
    fn test_duplicate_binding_names_both_sites() {
        let registry = ResolverRegistry::new()
            .declarations(DeclarationCategory::Query, [("post", item())])
            .query("post", item());

        let err = registry.bind(&metadata()).unwrap_err();
        assert!(matches!(
            err.binding_errors(),
            [BindingError::Duplicate { name, sites, .. }]
                if name == "post" && sites == &["declarations #0", "declaration #0"]
        ));
    }

    #[test]
    fn test_unknown_targets_are_aggregated() {
        let registry = ResolverRegistry::new()
            .query("missing", item())
            .model("Ghost", [("id", resolver::field(|_| async { Ok(Json::Null) }))])
            .model("PostType", [("nope", resolver::field(|_| async { Ok(Json::Null) }))]);

        let err = registry.bind(&metadata()).unwrap_err();
        let errors = err.binding_errors();
        assert_eq!(errors.len(), 3);
        assert!(matches!(&errors[0], BindingError::UnknownDeclaration { name, .. } if name == "missing"));
        assert!(matches!(&errors[1], BindingError::UnknownModel { model } if model == "Ghost"));
        assert!(matches!(&errors[2], BindingError::UnknownField { field, .. } if field == "nope"));
    }

    #[test]
    fn test_shape_mismatch() {
        let registry = ResolverRegistry::new()
            .subscription("postAdded", item())
            .context("user", item());

        let err = registry.bind(&metadata()).unwrap_err();
        let errors = err.binding_errors();
        assert!(matches!(
            &errors[0],
            BindingError::ShapeMismatch { expected: "a stream", found: "an item", .. }
        ));
        assert!(matches!(
            &errors[1],
            BindingError::ShapeMismatch { category: BindingCategory::Context, .. }
        ));
    }
}
