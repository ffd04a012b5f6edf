//! Normalized metadata tree.
//!
//! `TypeMetadata` is the canonical description of one type occurrence after
//! normalization. The whole tree serializes to the metadata document that
//! tooling persists and the schema synthesizer consumes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Deprecation state of a declaration, property or enumerant.
///
/// Serialized as `false`, `true` or a reason string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Deprecation {
    /// Not deprecated.
    #[default]
    Current,
    /// Deprecated, with an optional reason.
    Deprecated(Option<String>),
}

impl Deprecation {
    /// Returns `true` if this marks the item deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        matches!(self, Self::Deprecated(_))
    }

    /// Returns `true` if the item is not deprecated.
    #[must_use]
    pub fn is_current(&self) -> bool {
        matches!(self, Self::Current)
    }

    /// The deprecation reason, if one was given.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Current => None,
            Self::Deprecated(reason) => reason.as_deref(),
        }
    }
}

impl Serialize for Deprecation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Current => serializer.serialize_bool(false),
            Self::Deprecated(None) => serializer.serialize_bool(true),
            Self::Deprecated(Some(reason)) => serializer.serialize_str(reason),
        }
    }
}

impl<'de> Deserialize<'de> for Deprecation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Reason(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Flag(false) => Self::Current,
            Repr::Flag(true) => Self::Deprecated(None),
            Repr::Reason(reason) => Self::Deprecated(Some(reason)),
        })
    }
}

/// Kind of a normalized type occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Number,
    Bigint,
    String,
    Boolean,
    Enum,
    Union,
    Model,
    Object,
    Property,
}

impl TypeKind {
    /// Returns `true` for kinds that map onto a scalar.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Number | Self::Bigint | Self::String | Self::Boolean
        )
    }

    /// Returns `true` for anonymous kinds that need a synthesized name once
    /// they become schema-visible.
    #[must_use]
    pub fn needs_name(self) -> bool {
        matches!(self, Self::Object | Self::Enum | Self::Union)
    }
}

/// Canonical description of one type occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMetadata {
    pub kind: TypeKind,

    #[serde(default)]
    pub array: bool,

    /// Value may be the null sentinel.
    #[serde(default)]
    pub nullable: bool,

    /// Value may be absent. Independent of `nullable`.
    #[serde(default)]
    pub can_be_undefined: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,

    /// Dot-joined path from the owning declaration, e.g. `PostType.categories.status`.
    #[serde(default)]
    pub property_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub deprecated: Deprecation,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<TypeMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<TypeMetadata>>,

    /// Literal constant of an enumerant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,

    /// Marks a by-name occurrence of a declared model or input. Its
    /// definition lives in [`ApplicationMetadata::models`] or
    /// [`ApplicationMetadata::inputs`].
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reference: bool,
}

impl TypeMetadata {
    /// Creates a bare node of the given kind at `property_path`.
    #[must_use]
    pub fn new(kind: TypeKind, property_path: impl Into<String>) -> Self {
        Self {
            kind,
            array: false,
            nullable: false,
            can_be_undefined: false,
            model_name: None,
            type_name: None,
            property_name: None,
            property_path: property_path.into(),
            description: None,
            deprecated: Deprecation::Current,
            properties: Vec::new(),
            args: None,
            value: None,
            reference: false,
        }
    }

    /// Returns `true` if the value may be omitted or null.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.nullable || self.can_be_undefined
    }

    /// Returns `true` if this node names a declaration instead of defining it.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.reference
    }

    /// Finds a child by property name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&TypeMetadata> {
        self.properties
            .iter()
            .find(|p| p.property_name.as_deref() == Some(name))
    }

    /// Finds the enumerant carrying `value`.
    #[must_use]
    pub fn enumerant_for_value(&self, value: &serde_json::Value) -> Option<&TypeMetadata> {
        self.properties
            .iter()
            .find(|p| p.value.as_ref() == Some(value))
    }

    /// Compares the resolved shape of two nodes.
    ///
    /// Paths, documentation and the top-level `nullable`/`canBeUndefined`
    /// markers are ignored; children are compared by name regardless of order.
    #[must_use]
    pub fn same_shape(&self, other: &TypeMetadata) -> bool {
        if self.kind != other.kind
            || self.array != other.array
            || self.model_name != other.model_name
            || self.type_name != other.type_name
            || self.value != other.value
        {
            return false;
        }

        // Model occurrences are identified by name; one side may be a reference.
        if self.kind == TypeKind::Model {
            return true;
        }

        if self.properties.len() != other.properties.len() {
            return false;
        }

        self.properties.iter().all(|mine| {
            other
                .properties
                .iter()
                .find(|theirs| theirs.property_name == mine.property_name)
                .is_some_and(|theirs| {
                    mine.nullable == theirs.nullable
                        && mine.can_be_undefined == theirs.can_be_undefined
                        && mine.same_shape(theirs)
                })
        })
    }
}

/// Declaration category exposed at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationCategory {
    Query,
    Mutation,
    Subscription,
    Action,
}

impl DeclarationCategory {
    /// Name of the root type owning declarations of this category.
    #[must_use]
    pub fn root_type_name(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
            Self::Subscription => "Subscription",
            Self::Action => "Action",
        }
    }

    /// Plural label used in diagnostics and registration sites.
    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            Self::Query => "queries",
            Self::Mutation => "mutations",
            Self::Subscription => "subscriptions",
            Self::Action => "actions",
        }
    }
}

impl std::fmt::Display for DeclarationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.plural())
    }
}

/// Normalized route-style action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMetadata {
    /// Route identifier.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "return")]
    pub returns: TypeMetadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<TypeMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<TypeMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<TypeMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<TypeMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<TypeMetadata>,
}

/// Root of the normalized metadata document.
///
/// Immutable once produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationMetadata {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub actions: Vec<ActionMetadata>,

    #[serde(default)]
    pub models: Vec<TypeMetadata>,

    #[serde(default)]
    pub inputs: Vec<TypeMetadata>,

    #[serde(default)]
    pub queries: Vec<TypeMetadata>,

    #[serde(default)]
    pub mutations: Vec<TypeMetadata>,

    #[serde(default)]
    pub subscriptions: Vec<TypeMetadata>,
}

impl ApplicationMetadata {
    /// Looks up a model declaration by name.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&TypeMetadata> {
        self.models
            .iter()
            .find(|m| m.model_name.as_deref() == Some(name))
    }

    /// Looks up an input declaration by name.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&TypeMetadata> {
        self.inputs
            .iter()
            .find(|m| m.model_name.as_deref() == Some(name))
    }

    /// Returns the declarations of a GraphQL-facing category.
    ///
    /// Actions are not `TypeMetadata` declarations and yield an empty slice.
    #[must_use]
    pub fn declarations(&self, category: DeclarationCategory) -> &[TypeMetadata] {
        match category {
            DeclarationCategory::Query => &self.queries,
            DeclarationCategory::Mutation => &self.mutations,
            DeclarationCategory::Subscription => &self.subscriptions,
            DeclarationCategory::Action => &[],
        }
    }

    /// Looks up a declaration by category and name.
    #[must_use]
    pub fn declaration(&self, category: DeclarationCategory, name: &str) -> Option<&TypeMetadata> {
        self.declarations(category)
            .iter()
            .find(|d| d.property_name.as_deref() == Some(name))
    }

    /// Looks up an action by route identifier.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&ActionMetadata> {
        self.actions.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deprecation_tri_state_serialization() {
        assert_eq!(serde_json::to_value(Deprecation::Current).unwrap(), json!(false));
        assert_eq!(
            serde_json::to_value(Deprecation::Deprecated(None)).unwrap(),
            json!(true)
        );
        assert_eq!(
            serde_json::to_value(Deprecation::Deprecated(Some("use slug".into()))).unwrap(),
            json!("use slug")
        );
    }

    #[test]
    fn test_deprecation_deserialization() {
        let current: Deprecation = serde_json::from_value(json!(false)).unwrap();
        let flagged: Deprecation = serde_json::from_value(json!(true)).unwrap();
        let reasoned: Deprecation = serde_json::from_value(json!("gone")).unwrap();

        assert!(current.is_current());
        assert!(flagged.is_deprecated());
        assert_eq!(flagged.reason(), None);
        assert_eq!(reasoned.reason(), Some("gone"));
    }

    #[test]
    fn test_type_metadata_field_names() {
        let mut meta = TypeMetadata::new(TypeKind::String, "PostType.title");
        meta.property_name = Some("title".into());
        meta.can_be_undefined = true;

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["kind"], "string");
        assert_eq!(value["canBeUndefined"], true);
        assert_eq!(value["nullable"], false);
        assert_eq!(value["propertyName"], "title");
        assert_eq!(value["propertyPath"], "PostType.title");
        assert!(value.get("typeName").is_none());
    }

    #[test]
    fn test_kind_classification() {
        assert!(TypeKind::Bigint.is_scalar());
        assert!(!TypeKind::Enum.is_scalar());
        assert!(!TypeKind::Model.is_scalar());

        assert!(TypeKind::Object.needs_name());
        assert!(TypeKind::Union.needs_name());
        assert!(!TypeKind::Model.needs_name());
        assert!(!TypeKind::String.needs_name());
    }

    #[test]
    fn test_reference_marker_serialization() {
        let mut meta = TypeMetadata::new(TypeKind::Model, "PostType.author");
        meta.model_name = Some("UserType".into());
        assert!(serde_json::to_value(&meta).unwrap().get("reference").is_none());

        meta.reference = true;
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["reference"], true);

        let back: TypeMetadata = serde_json::from_value(value).unwrap();
        assert!(back.is_reference());
    }

    #[test]
    fn test_same_shape_ignores_docs_and_order() {
        let mut a = TypeMetadata::new(TypeKind::Object, "A.x");
        let mut b = TypeMetadata::new(TypeKind::Object, "B.x");
        let mut p1 = TypeMetadata::new(TypeKind::String, "A.x.p1");
        p1.property_name = Some("p1".into());
        let mut p2 = TypeMetadata::new(TypeKind::Number, "A.x.p2");
        p2.property_name = Some("p2".into());
        a.properties = vec![p1.clone(), p2.clone()];
        p1.description = Some("documented".into());
        b.properties = vec![p2, p1];

        assert!(a.same_shape(&b));

        b.properties[0].kind = TypeKind::Boolean;
        assert!(!a.same_shape(&b));
    }

    #[test]
    fn test_action_return_field_name() {
        let action = ActionMetadata {
            name: "getPost".into(),
            description: None,
            returns: TypeMetadata::new(TypeKind::String, "Action.getPost.return"),
            params: None,
            query: None,
            headers: None,
            cookies: None,
            body: None,
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["return"]["kind"], "string");
    }
}
