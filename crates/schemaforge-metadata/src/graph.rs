//! Type graph input contract.
//!
//! The raw, not-yet-normalized description of an application's declared
//! types. Any front-end (a source reader, a schema file, a reflection shim)
//! can populate these structures; the normalizer depends on nothing else.
//!
//! All types deserialize from JSON, so a graph file is a valid front-end:
//!
//! ```json
//! {
//!   "name": "blog",
//!   "models": [{
//!     "name": "PostType",
//!     "type": { "node": "object", "properties": [
//!       { "name": "title", "type": { "node": "primitive", "kind": "string" } }
//!     ]}
//!   }],
//!   "queries": [{ "name": "post", "returns": { "node": "reference", "name": "PostType" } }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::metadata::Deprecation;

/// Primitive value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Number,
    Bigint,
    String,
    Boolean,
}

/// A literal constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Literal {
    /// The primitive kind this literal belongs to.
    #[must_use]
    pub fn base_kind(&self) -> PrimitiveKind {
        match self {
            Self::Bool(_) => PrimitiveKind::Boolean,
            Self::Number(_) => PrimitiveKind::Number,
            Self::String(_) => PrimitiveKind::String,
        }
    }

    /// The literal as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// A node of the type graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "camelCase")]
pub enum TypeNode {
    Primitive { kind: PrimitiveKind },
    Literal { value: Literal },
    Null,
    Undefined,
    Array { items: Box<TypeNode> },
    Optional { inner: Box<TypeNode> },
    Nullable { inner: Box<TypeNode> },
    Union { members: Vec<TypeNode> },
    Intersection { members: Vec<TypeNode> },
    /// Reference to a named model or input declaration.
    Reference { name: String },
    Object { properties: Vec<PropertyNode> },
    Enum { members: Vec<EnumMember> },
}

impl TypeNode {
    #[must_use]
    pub fn string() -> Self {
        Self::Primitive { kind: PrimitiveKind::String }
    }

    #[must_use]
    pub fn number() -> Self {
        Self::Primitive { kind: PrimitiveKind::Number }
    }

    #[must_use]
    pub fn bigint() -> Self {
        Self::Primitive { kind: PrimitiveKind::Bigint }
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::Primitive { kind: PrimitiveKind::Boolean }
    }

    #[must_use]
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        let value = match value.into() {
            serde_json::Value::Bool(b) => Literal::Bool(b),
            serde_json::Value::Number(n) => Literal::Number(n),
            other => Literal::String(other.as_str().map_or_else(|| other.to_string(), str::to_string)),
        };
        Self::Literal { value }
    }

    #[must_use]
    pub fn array(items: TypeNode) -> Self {
        Self::Array { items: Box::new(items) }
    }

    #[must_use]
    pub fn optional(inner: TypeNode) -> Self {
        Self::Optional { inner: Box::new(inner) }
    }

    #[must_use]
    pub fn nullable(inner: TypeNode) -> Self {
        Self::Nullable { inner: Box::new(inner) }
    }

    #[must_use]
    pub fn union(members: impl IntoIterator<Item = TypeNode>) -> Self {
        Self::Union { members: members.into_iter().collect() }
    }

    #[must_use]
    pub fn intersection(members: impl IntoIterator<Item = TypeNode>) -> Self {
        Self::Intersection { members: members.into_iter().collect() }
    }

    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference { name: name.into() }
    }

    #[must_use]
    pub fn object(properties: impl IntoIterator<Item = PropertyNode>) -> Self {
        Self::Object { properties: properties.into_iter().collect() }
    }

    #[must_use]
    pub fn enumeration(members: impl IntoIterator<Item = EnumMember>) -> Self {
        Self::Enum { members: members.into_iter().collect() }
    }
}

/// A property of an object-like node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyNode {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: TypeNode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub deprecated: Deprecation,

    /// Field arguments, for model properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<TypeNode>,
}

impl PropertyNode {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeNode) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
            deprecated: Deprecation::Current,
            args: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, deprecation: Deprecation) -> Self {
        self.deprecated = deprecation;
        self
    }

    #[must_use]
    pub fn args(mut self, args: TypeNode) -> Self {
        self.args = Some(args);
        self
    }
}

/// One constant of an enum node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumMember {
    /// Declared member name; derived from the value when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub value: Literal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub deprecated: Deprecation,
}

impl EnumMember {
    #[must_use]
    pub fn new(value: Literal) -> Self {
        Self {
            name: None,
            value,
            description: None,
            deprecated: Deprecation::Current,
        }
    }

    #[must_use]
    pub fn named(name: impl Into<String>, value: Literal) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(value)
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, deprecation: Deprecation) -> Self {
        self.deprecated = deprecation;
        self
    }
}

/// A named model or input declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: TypeNode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub deprecated: Deprecation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

impl TypeDecl {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeNode) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
            deprecated: Deprecation::Current,
            site: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A query, mutation or subscription declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationNode {
    pub name: String,

    pub returns: TypeNode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<TypeNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub deprecated: Deprecation,

    /// Registration site reported in diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

impl DeclarationNode {
    #[must_use]
    pub fn new(name: impl Into<String>, returns: TypeNode) -> Self {
        Self {
            name: name.into(),
            returns,
            args: None,
            description: None,
            deprecated: Deprecation::Current,
            site: None,
        }
    }

    #[must_use]
    pub fn args(mut self, args: TypeNode) -> Self {
        self.args = Some(args);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, deprecation: Deprecation) -> Self {
        self.deprecated = deprecation;
        self
    }

    #[must_use]
    pub fn site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }
}

/// A route-style action declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionNode {
    /// Route identifier.
    pub name: String,

    pub returns: TypeNode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<TypeNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<TypeNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<TypeNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<TypeNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<TypeNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

impl ActionNode {
    #[must_use]
    pub fn new(name: impl Into<String>, returns: TypeNode) -> Self {
        Self {
            name: name.into(),
            returns,
            params: None,
            query: None,
            headers: None,
            cookies: None,
            body: None,
            description: None,
            site: None,
        }
    }

    #[must_use]
    pub fn params(mut self, params: TypeNode) -> Self {
        self.params = Some(params);
        self
    }

    #[must_use]
    pub fn body(mut self, body: TypeNode) -> Self {
        self.body = Some(body);
        self
    }
}

/// The full application description handed to the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeGraph {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub models: Vec<TypeDecl>,

    #[serde(default)]
    pub inputs: Vec<TypeDecl>,

    #[serde(default)]
    pub queries: Vec<DeclarationNode>,

    #[serde(default)]
    pub mutations: Vec<DeclarationNode>,

    #[serde(default)]
    pub subscriptions: Vec<DeclarationNode>,

    #[serde(default)]
    pub actions: Vec<ActionNode>,
}

impl TypeGraph {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn model(mut self, decl: TypeDecl) -> Self {
        self.models.push(decl);
        self
    }

    #[must_use]
    pub fn input(mut self, decl: TypeDecl) -> Self {
        self.inputs.push(decl);
        self
    }

    #[must_use]
    pub fn query(mut self, decl: DeclarationNode) -> Self {
        self.queries.push(decl);
        self
    }

    #[must_use]
    pub fn mutation(mut self, decl: DeclarationNode) -> Self {
        self.mutations.push(decl);
        self
    }

    #[must_use]
    pub fn subscription(mut self, decl: DeclarationNode) -> Self {
        self.subscriptions.push(decl);
        self
    }

    #[must_use]
    pub fn action(mut self, action: ActionNode) -> Self {
        self.actions.push(action);
        self
    }

    /// Parses a graph from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the document does not match the
    /// graph shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_graph_from_json() {
        let graph = TypeGraph::from_json(
            &json!({
                "name": "blog",
                "models": [{
                    "name": "PostType",
                    "type": {"node": "object", "properties": [
                        {"name": "title", "type": {"node": "primitive", "kind": "string"}},
                        {"name": "legacy", "type": {"node": "optional", "inner": {"node": "primitive", "kind": "number"}}, "deprecated": true}
                    ]}
                }],
                "queries": [{"name": "post", "returns": {"node": "reference", "name": "PostType"}}]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(graph.models.len(), 1);
        assert_eq!(graph.queries[0].returns, TypeNode::reference("PostType"));
        let TypeNode::Object { properties } = &graph.models[0].ty else {
            panic!("expected object");
        };
        assert_eq!(properties[1].deprecated, Deprecation::Deprecated(None));
        assert_eq!(properties[1].ty, TypeNode::optional(TypeNode::number()));
    }

    #[test]
    fn test_literal_helpers() {
        assert_eq!(
            TypeNode::literal("draft"),
            TypeNode::Literal { value: Literal::String("draft".into()) }
        );
        assert_eq!(
            TypeNode::literal(true),
            TypeNode::Literal { value: Literal::Bool(true) }
        );
        assert_eq!(Literal::Number(3.into()).to_json(), json!(3));
        assert_eq!(Literal::String("x".into()).base_kind(), PrimitiveKind::String);
    }
}
