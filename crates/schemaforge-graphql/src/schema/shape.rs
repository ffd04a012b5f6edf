//! Runtime value shaping.
//!
//! Resolvers exchange plain JSON. Output values are converted to
//! [`FieldValue`]s according to the field's synthesized shape: enum literals
//! become enum item names, union values are tagged with their member type and
//! objects are carried as owned JSON for their child fields. Inputs take the
//! opposite route: enum item names are mapped back to their literals.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_graphql::dynamic::FieldValue;
use async_graphql::{Error as GraphQLError, Name, Value};
use serde_json::Map;

use crate::resolvers::{Discriminator, Json, ResolverResult, json_to_graphql_value};

/// Field read by the default union discriminator.
pub const TYPENAME_FIELD: &str = "__typename";

/// Enum item names and the literals they stand for.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMapping {
    pub name: String,
    items: Vec<(String, Json)>,
}

impl EnumMapping {
    #[must_use]
    pub fn new(name: impl Into<String>, items: Vec<(String, Json)>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }

    /// Item name for a resolved value.
    ///
    /// Values are matched by literal first; a string equal to an item name is
    /// accepted as that item.
    #[must_use]
    pub fn item_for(&self, value: &Json) -> Option<&str> {
        self.items
            .iter()
            .find(|(_, literal)| literal == value)
            .or_else(|| {
                value
                    .as_str()
                    .and_then(|s| self.items.iter().find(|(name, _)| name == s))
            })
            .map(|(name, _)| name.as_str())
    }

    /// Literal of an item name.
    #[must_use]
    pub fn value_for(&self, item: &str) -> Option<&Json> {
        self.items
            .iter()
            .find(|(name, _)| name == item)
            .map(|(_, value)| value)
    }

    pub fn item_names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(name, _)| name.as_str())
    }
}

/// Member types of an object union.
#[derive(Clone)]
pub struct UnionShape {
    pub name: String,
    pub members: Vec<String>,
    pub discriminator: Option<Discriminator>,
}

impl UnionShape {
    fn member_for(&self, value: &Json) -> ResolverResult<String> {
        let member = match &self.discriminator {
            Some(discriminate) => discriminate(value),
            None => value
                .get(TYPENAME_FIELD)
                .and_then(Json::as_str)
                .map(str::to_string),
        };
        match member {
            Some(member) if self.members.contains(&member) => Ok(member),
            Some(member) => Err(GraphQLError::new(format!(
                "`{member}` is not a member of union `{}`",
                self.name
            ))),
            None => Err(GraphQLError::new(format!(
                "cannot determine the member type of union `{}`",
                self.name
            ))),
        }
    }
}

impl std::fmt::Debug for UnionShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionShape")
            .field("name", &self.name)
            .field("members", &self.members)
            .field("discriminator", &self.discriminator.is_some())
            .finish()
    }
}

/// Base shape of an output field.
#[derive(Debug, Clone)]
pub enum OutputShape {
    /// Built-in or custom scalar; the JSON value is passed through.
    Scalar,
    Enum(Arc<EnumMapping>),
    /// Object or model; child fields read from the JSON value.
    Object,
    Union(Arc<UnionShape>),
}

/// Shape of an output field occurrence.
#[derive(Debug, Clone)]
pub struct FieldShape {
    pub base: OutputShape,
    pub array: bool,
}

/// Converts a resolved JSON value into the field's GraphQL value.
///
/// `null` resolves to `None`; non-null enforcement is left to the executor.
///
/// # Errors
///
/// Returns an error if the value does not fit the field's shape.
pub fn shape_output<'a>(value: Json, shape: &FieldShape) -> ResolverResult<Option<FieldValue<'a>>> {
    if value.is_null() {
        return Ok(None);
    }
    if shape.array {
        let Json::Array(items) = value else {
            return Err(GraphQLError::new(format!("expected a list, got {value}")));
        };
        let items = items
            .into_iter()
            .map(|item| shape_item(item, &shape.base))
            .collect::<ResolverResult<Vec<_>>>()?;
        return Ok(Some(FieldValue::list(items)));
    }
    shape_item(value, &shape.base).map(Some)
}

fn shape_item<'a>(value: Json, shape: &OutputShape) -> ResolverResult<FieldValue<'a>> {
    if value.is_null() {
        return Ok(FieldValue::NULL);
    }
    match shape {
        OutputShape::Scalar => Ok(FieldValue::value(json_to_graphql_value(value))),
        OutputShape::Enum(mapping) => {
            let item = mapping.item_for(&value).ok_or_else(|| {
                GraphQLError::new(format!("{value} is not a value of enum `{}`", mapping.name))
            })?;
            Ok(FieldValue::value(Value::Enum(Name::new(item))))
        }
        OutputShape::Object => {
            if !value.is_object() {
                return Err(GraphQLError::new(format!("expected an object, got {value}")));
            }
            Ok(FieldValue::owned_any(value))
        }
        OutputShape::Union(union) => {
            let member = union.member_for(&value)?;
            Ok(FieldValue::owned_any(value).with_type(member))
        }
    }
}

/// Base shape of an input value.
#[derive(Debug, Clone)]
pub enum InputKind {
    Scalar,
    Enum(Arc<EnumMapping>),
    /// Input object, looked up by name in the [`InputTable`].
    Object(String),
}

/// One argument or input object field.
#[derive(Debug, Clone)]
pub struct InputFieldShape {
    pub name: String,
    pub kind: InputKind,
    pub array: bool,
    pub nullable: bool,
    pub can_be_undefined: bool,
}

/// Field shapes of every input object, published once synthesis completes.
#[derive(Debug, Default)]
pub struct InputTable {
    objects: OnceLock<HashMap<String, Vec<InputFieldShape>>>,
}

impl InputTable {
    pub(crate) fn publish(&self, objects: HashMap<String, Vec<InputFieldShape>>) {
        let _ = self.objects.set(objects);
    }

    #[must_use]
    pub fn fields(&self, name: &str) -> Option<&[InputFieldShape]> {
        self.objects.get()?.get(name).map(Vec::as_slice)
    }
}

/// Decodes provided argument values against their declared shapes.
///
/// Omitted arguments stay absent; explicit `null` is only accepted where the
/// shape is nullable.
///
/// # Errors
///
/// Returns an error naming the argument path on a rejected value.
pub fn decode_inputs(provided: &Map<String, Json>, fields: &[InputFieldShape], table: &InputTable, path: &str) -> ResolverResult<Json> {
    let mut decoded = Map::new();
    for field in fields {
        let Some(value) = provided.get(&field.name) else {
            continue;
        };
        let field_path = if path.is_empty() {
            field.name.clone()
        } else {
            format!("{path}.{}", field.name)
        };
        decoded.insert(field.name.clone(), decode_value(value, field, table, &field_path)?);
    }
    Ok(Json::Object(decoded))
}

fn decode_value(value: &Json, field: &InputFieldShape, table: &InputTable, path: &str) -> ResolverResult<Json> {
    if value.is_null() {
        if !field.nullable && field.can_be_undefined {
            return Err(GraphQLError::new(format!("`{path}` may be omitted but cannot be null")));
        }
        return Ok(Json::Null);
    }
    if field.array {
        let Json::Array(items) = value else {
            return Err(GraphQLError::new(format!("`{path}` expects a list")));
        };
        return items
            .iter()
            .map(|item| decode_item(item, &field.kind, table, path))
            .collect::<ResolverResult<Vec<_>>>()
            .map(Json::Array);
    }
    decode_item(value, &field.kind, table, path)
}

fn decode_item(value: &Json, kind: &InputKind, table: &InputTable, path: &str) -> ResolverResult<Json> {
    match kind {
        InputKind::Scalar => Ok(value.clone()),
        InputKind::Enum(mapping) => value
            .as_str()
            .and_then(|item| mapping.value_for(item))
            .cloned()
            .ok_or_else(|| GraphQLError::new(format!("`{path}`: {value} is not a value of enum `{}`", mapping.name))),
        InputKind::Object(name) => {
            let Json::Object(provided) = value else {
                return Err(GraphQLError::new(format!("`{path}` expects an object")));
            };
            let fields = table
                .fields(name)
                .ok_or_else(|| GraphQLError::new(format!("unknown input type `{name}`")))?;
            decode_inputs(provided, fields, table, path)
        }
    }
}
