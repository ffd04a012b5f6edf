//! Schema type synthesis.
//!
//! Walks [`ApplicationMetadata`] and produces async-graphql dynamic types.
//! Every schema name is claimed with a shape fingerprint before its children
//! are built: a second request for the same name and fingerprint reuses the
//! existing type, which is what makes cyclic models terminate, while a request
//! with a different fingerprint is a naming collision.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Object, ResolverContext, Scalar,
    Subscription, SubscriptionField, SubscriptionFieldFuture, Type, TypeRef, Union,
};
use futures_util::StreamExt;
use indexmap::IndexMap;
use schemaforge_metadata::{ApplicationMetadata, DeclarationCategory, Deprecation, TypeKind, TypeMetadata};
use serde_json::Map;
use tracing::{debug, trace};

use super::shape::{
    EnumMapping, FieldShape, InputFieldShape, InputKind, InputTable, OutputShape, UnionShape, decode_inputs,
    shape_output,
};
use crate::config::{BUILTIN_SCALARS, ScalarMapping};
use crate::error::{BindingError, SchemaError};
use crate::loaders::{BatchKey, FieldLoaders};
use crate::resolvers::{
    BindingTable, FieldInput, Json, ResolverFn, ResolverInput, ResolverResult, get_request_context,
    graphql_value_to_json,
};

/// Name of the placeholder query field of an application without queries.
pub const HEALTH_FIELD: &str = "_health";

/// Output of a synthesis pass, ready to be registered with a schema builder.
pub struct SynthesizedTypes {
    pub types: Vec<Type>,
    pub has_mutation: bool,
    pub has_subscription: bool,
    pub inputs: Arc<InputTable>,
}

impl std::fmt::Debug for SynthesizedTypes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesizedTypes")
            .field("types", &self.types.len())
            .field("has_mutation", &self.has_mutation)
            .field("has_subscription", &self.has_subscription)
            .finish()
    }
}

/// First claim of a schema name.
struct Claim {
    fingerprint: String,
    path: String,
}

/// Builds schema types from normalized metadata.
pub struct SchemaSynthesizer<'m> {
    metadata: &'m ApplicationMetadata,
    bindings: &'m BindingTable,
    scalars: &'m ScalarMapping,
    claims: HashMap<String, Claim>,
    types: IndexMap<String, Type>,
    enums: HashMap<String, Arc<EnumMapping>>,
    unions: HashMap<String, Arc<UnionShape>>,
    input_shapes: HashMap<String, Vec<InputFieldShape>>,
    inputs: Arc<InputTable>,
}

impl<'m> SchemaSynthesizer<'m> {
    #[must_use]
    pub fn new(metadata: &'m ApplicationMetadata, bindings: &'m BindingTable, scalars: &'m ScalarMapping) -> Self {
        Self {
            metadata,
            bindings,
            scalars,
            claims: HashMap::new(),
            types: IndexMap::new(),
            enums: HashMap::new(),
            unions: HashMap::new(),
            input_shapes: HashMap::new(),
            inputs: Arc::new(InputTable::default()),
        }
    }

    /// Synthesizes every declared type and the root types.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NamingCollision`] when two different shapes
    /// share a name, and [`SchemaError::Binding`] for discriminators of
    /// unknown unions.
    pub fn synthesize(mut self) -> Result<SynthesizedTypes, SchemaError> {
        let metadata = self.metadata;
        let has_mutation = !metadata.mutations.is_empty();
        let has_subscription = !metadata.subscriptions.is_empty();

        self.claim_reserved(has_mutation, has_subscription)?;

        for model in &metadata.models {
            if let Some(name) = &model.model_name {
                self.build_model(name)?;
            }
        }
        for input in &metadata.inputs {
            if let Some(name) = &input.model_name {
                self.build_input(name)?;
            }
        }

        let query = self.build_root(DeclarationCategory::Query)?;
        let mutation = if has_mutation {
            Some(self.build_root(DeclarationCategory::Mutation)?)
        } else {
            None
        };
        let subscription = if has_subscription {
            Some(self.build_subscription()?)
        } else {
            None
        };

        self.check_discriminators()?;
        self.inputs.publish(std::mem::take(&mut self.input_shapes));

        let mut types: Vec<Type> = self.types.into_values().collect();
        types.push(query.into());
        types.extend(mutation.map(Type::from));
        types.extend(subscription.map(Type::from));

        debug!(
            types = types.len(),
            enums = self.enums.len(),
            unions = self.unions.len(),
            "Schema types synthesized"
        );

        Ok(SynthesizedTypes {
            types,
            has_mutation,
            has_subscription,
            inputs: self.inputs,
        })
    }

    /// Claims root and scalar names and registers the custom scalars.
    fn claim_reserved(&mut self, has_mutation: bool, has_subscription: bool) -> Result<(), SchemaError> {
        let roots = [
            (DeclarationCategory::Query, true),
            (DeclarationCategory::Mutation, has_mutation),
            (DeclarationCategory::Subscription, has_subscription),
        ];
        for (category, present) in roots {
            if present {
                let name = category.root_type_name();
                self.claim(name, "root".into(), name)?;
            }
        }

        for name in BUILTIN_SCALARS {
            self.claim(name, format!("scalar:{name}"), name)?;
        }
        let scalars = self.scalars;
        for name in scalars.custom_scalars() {
            if self.claim(name, format!("scalar:{name}"), name)? {
                trace!(name, "Registering custom scalar");
                self.types.insert(name.to_string(), Scalar::new(name).into());
            }
        }
        Ok(())
    }

    /// Claims a schema name for a shape.
    ///
    /// Returns `true` if the name is new and the caller must build the type.
    fn claim(&mut self, name: &str, fingerprint: String, path: &str) -> Result<bool, SchemaError> {
        match self.claims.get(name) {
            Some(claim) if claim.fingerprint == fingerprint => Ok(false),
            Some(claim) => Err(SchemaError::NamingCollision {
                name: name.to_string(),
                first: claim.path.clone(),
                second: path.to_string(),
            }),
            None => {
                self.claims.insert(
                    name.to_string(),
                    Claim {
                        fingerprint,
                        path: path.to_string(),
                    },
                );
                Ok(true)
            }
        }
    }

    fn check_discriminators(&self) -> Result<(), SchemaError> {
        let mut unknown: Vec<&str> = self
            .bindings
            .discriminator_names()
            .filter(|name| !self.unions.contains_key(*name))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort_unstable();
        Err(SchemaError::Binding(
            unknown
                .into_iter()
                .map(|name| BindingError::UnknownUnion { name: name.to_string() })
                .collect(),
        ))
    }

    // ------------------------------------------------------------------
    // Output types
    // ------------------------------------------------------------------

    fn build_model(&mut self, name: &str) -> Result<(), SchemaError> {
        if !self.claim(name, format!("model:{name}"), name)? {
            return Ok(());
        }
        let metadata = self.metadata;
        let model = metadata
            .model(name)
            .ok_or_else(|| SchemaError::SchemaBuildFailed(format!("unknown model `{name}`")))?;
        trace!(name, "Synthesizing model");

        let mut object = Object::new(name);
        if let Some(description) = &model.description {
            object = object.description(description);
        }
        for property in &model.properties {
            object = object.field(self.output_field(property, name, true)?);
        }
        self.types.insert(name.to_string(), object.into());
        Ok(())
    }

    fn build_object(&mut self, meta: &TypeMetadata) -> Result<String, SchemaError> {
        let name = type_name(meta)?;
        let fingerprint = self.signature(meta);
        if !self.claim(&name, fingerprint, &meta.property_path)? {
            return Ok(name);
        }
        trace!(name, path = %meta.property_path, "Synthesizing object");

        let mut object = Object::new(&name);
        if let Some(description) = &meta.description {
            object = object.description(description);
        }
        for property in &meta.properties {
            object = object.field(self.output_field(property, &name, false)?);
        }
        self.types.insert(name.clone(), object.into());
        Ok(name)
    }

    fn build_enum(&mut self, meta: &TypeMetadata) -> Result<Arc<EnumMapping>, SchemaError> {
        let name = type_name(meta)?;
        let fingerprint = self.signature(meta);
        if !self.claim(&name, fingerprint, &meta.property_path)? {
            return self
                .enums
                .get(&name)
                .cloned()
                .ok_or_else(|| SchemaError::SchemaBuildFailed(format!("enum `{name}` referenced before it was built")));
        }

        let mut graphql_enum = Enum::new(&name);
        if let Some(description) = &meta.description {
            graphql_enum = graphql_enum.description(description);
        }
        let mut items = Vec::with_capacity(meta.properties.len());
        for enumerant in &meta.properties {
            let Some(item_name) = &enumerant.property_name else {
                continue;
            };
            let mut item = EnumItem::new(item_name);
            if let Some(description) = &enumerant.description {
                item = item.description(description);
            }
            if let Deprecation::Deprecated(reason) = &enumerant.deprecated {
                item = item.deprecation(reason.as_deref());
            }
            graphql_enum = graphql_enum.item(item);
            items.push((item_name.clone(), enumerant.value.clone().unwrap_or(Json::Null)));
        }

        let mapping = Arc::new(EnumMapping::new(name.clone(), items));
        self.enums.insert(name.clone(), Arc::clone(&mapping));
        self.types.insert(name, graphql_enum.into());
        Ok(mapping)
    }

    fn build_union(&mut self, meta: &TypeMetadata) -> Result<Arc<UnionShape>, SchemaError> {
        let name = type_name(meta)?;
        let fingerprint = self.signature(meta);
        if !self.claim(&name, fingerprint, &meta.property_path)? {
            return self
                .unions
                .get(&name)
                .cloned()
                .ok_or_else(|| SchemaError::SchemaBuildFailed(format!("union `{name}` referenced before it was built")));
        }

        let mut members = Vec::with_capacity(meta.properties.len());
        for member in &meta.properties {
            let (member_name, _) = self.output_type(member)?;
            if !members.contains(&member_name) {
                members.push(member_name);
            }
        }

        let mut union = Union::new(&name);
        if let Some(description) = &meta.description {
            union = union.description(description);
        }
        for member in &members {
            union = union.possible_type(member);
        }

        let shape = Arc::new(UnionShape {
            name: name.clone(),
            members,
            discriminator: self.bindings.discriminator(&name).cloned(),
        });
        self.unions.insert(name.clone(), Arc::clone(&shape));
        self.types.insert(name, union.into());
        Ok(shape)
    }

    /// Resolves the schema type name and runtime shape of an output occurrence.
    fn output_type(&mut self, meta: &TypeMetadata) -> Result<(String, OutputShape), SchemaError> {
        if let Some(scalar) = self.scalars.scalar_for(meta) {
            return Ok((scalar.to_string(), OutputShape::Scalar));
        }
        match meta.kind {
            TypeKind::Enum => {
                let mapping = self.build_enum(meta)?;
                Ok((mapping.name.clone(), OutputShape::Enum(mapping)))
            }
            TypeKind::Model => {
                let name = model_name(meta)?;
                self.build_model(&name)?;
                Ok((name, OutputShape::Object))
            }
            TypeKind::Object => Ok((self.build_object(meta)?, OutputShape::Object)),
            TypeKind::Union if is_object_union(meta) => {
                let shape = self.build_union(meta)?;
                Ok((shape.name.clone(), OutputShape::Union(shape)))
            }
            TypeKind::Union => Ok((self.scalars.json.clone(), OutputShape::Scalar)),
            TypeKind::Number | TypeKind::Bigint | TypeKind::String | TypeKind::Boolean | TypeKind::Property => {
                Err(SchemaError::SchemaBuildFailed(format!(
                    "no output type for `{}`",
                    meta.property_path
                )))
            }
        }
    }

    /// Builds an object field with its resolver.
    ///
    /// Model fields use their bound resolver when one exists; everything else
    /// reads the same-named property off the parent value.
    fn output_field(&mut self, meta: &TypeMetadata, owner: &str, is_model: bool) -> Result<Field, SchemaError> {
        let name = property_name(meta)?;
        let (type_name, base) = self.output_type(meta)?;
        let (arguments, arg_shapes) = self.arguments(meta.args.as_deref())?;

        let plan = Arc::new(FieldPlan {
            owner: owner.to_string(),
            name: name.clone(),
            shape: FieldShape {
                base,
                array: meta.array,
            },
            args: arg_shapes,
            inputs: Arc::clone(&self.inputs),
        });
        let ty = type_ref(&type_name, meta);

        let binding = if is_model {
            self.bindings.model_field(owner, &name)
        } else {
            None
        };
        let field = match binding.map(|binding| &binding.func) {
            Some(ResolverFn::Field(func)) => {
                let func = Arc::clone(func);
                Field::new(name, ty, move |ctx| {
                    let plan = Arc::clone(&plan);
                    let func = Arc::clone(&func);
                    FieldFuture::new(async move {
                        let parent = parent_json(&ctx)?.clone();
                        let args = plan.read_args(&ctx)?;
                        let context = get_request_context(&ctx)?.clone();
                        let value = func(FieldInput { parent, args, context }).await?;
                        shape_output(value, &plan.shape)
                    })
                })
            }
            Some(ResolverFn::Batched(_)) => Field::new(name, ty, move |ctx| {
                let plan = Arc::clone(&plan);
                FieldFuture::new(async move {
                    let parent = parent_json(&ctx)?.clone();
                    let args = plan.read_args(&ctx)?;
                    let loader = ctx
                        .data::<FieldLoaders>()
                        .ok()
                        .and_then(|loaders| loaders.get(&plan.owner, &plan.name))
                        .ok_or_else(|| {
                            async_graphql::Error::new(format!("no loader for `{}.{}`", plan.owner, plan.name))
                        })?;
                    let value = loader
                        .load_one(BatchKey::new(parent, args))
                        .await
                        .map_err(|e| async_graphql::Error::new(e.to_string()))?
                        .unwrap_or(Json::Null);
                    shape_output(value, &plan.shape)
                })
            }),
            _ => Field::new(name, ty, move |ctx| {
                let plan = Arc::clone(&plan);
                FieldFuture::new(async move {
                    let parent = parent_json(&ctx)?;
                    let value = parent.get(&plan.name).cloned().unwrap_or(Json::Null);
                    shape_output(value, &plan.shape)
                })
            }),
        };

        Ok(document_field(field, meta, arguments))
    }

    // ------------------------------------------------------------------
    // Input types
    // ------------------------------------------------------------------

    fn build_input(&mut self, name: &str) -> Result<(), SchemaError> {
        if !self.claim(name, format!("input:{name}"), name)? {
            return Ok(());
        }
        let metadata = self.metadata;
        let input = metadata
            .input(name)
            .ok_or_else(|| SchemaError::SchemaBuildFailed(format!("unknown input `{name}`")))?;
        trace!(name, "Synthesizing input");

        let object = self.input_object(name, input.description.as_deref(), &input.properties)?;
        self.types.insert(name.to_string(), object.into());
        Ok(())
    }

    fn build_input_object(&mut self, meta: &TypeMetadata) -> Result<String, SchemaError> {
        let name = type_name(meta)?;
        let fingerprint = self.signature(meta);
        if !self.claim(&name, fingerprint, &meta.property_path)? {
            return Ok(name);
        }
        let object = self.input_object(&name, meta.description.as_deref(), &meta.properties)?;
        self.types.insert(name.clone(), object.into());
        Ok(name)
    }

    fn input_object(
        &mut self,
        name: &str,
        description: Option<&str>,
        properties: &[TypeMetadata],
    ) -> Result<InputObject, SchemaError> {
        let mut object = InputObject::new(name);
        if let Some(description) = description {
            object = object.description(description);
        }
        let mut shapes = Vec::with_capacity(properties.len());
        for property in properties {
            let (value, shape) = self.input_value(property)?;
            object = object.field(value);
            shapes.push(shape);
        }
        self.input_shapes.insert(name.to_string(), shapes);
        Ok(object)
    }

    fn input_type(&mut self, meta: &TypeMetadata) -> Result<(String, InputKind), SchemaError> {
        if let Some(scalar) = self.scalars.scalar_for(meta) {
            return Ok((scalar.to_string(), InputKind::Scalar));
        }
        match meta.kind {
            TypeKind::Enum => {
                let mapping = self.build_enum(meta)?;
                Ok((mapping.name.clone(), InputKind::Enum(mapping)))
            }
            TypeKind::Model => {
                let name = model_name(meta)?;
                self.build_input(&name)?;
                Ok((name.clone(), InputKind::Object(name)))
            }
            TypeKind::Object => {
                let name = self.build_input_object(meta)?;
                Ok((name.clone(), InputKind::Object(name)))
            }
            TypeKind::Union => Ok((self.scalars.json.clone(), InputKind::Scalar)),
            TypeKind::Number | TypeKind::Bigint | TypeKind::String | TypeKind::Boolean | TypeKind::Property => {
                Err(SchemaError::SchemaBuildFailed(format!(
                    "no input type for `{}`",
                    meta.property_path
                )))
            }
        }
    }

    fn input_value(&mut self, meta: &TypeMetadata) -> Result<(InputValue, InputFieldShape), SchemaError> {
        let name = property_name(meta)?;
        let (type_name, kind) = self.input_type(meta)?;

        let mut value = InputValue::new(&name, type_ref(&type_name, meta));
        if let Some(description) = &meta.description {
            value = value.description(description);
        }
        let shape = InputFieldShape {
            name,
            kind,
            array: meta.array,
            nullable: meta.nullable,
            can_be_undefined: meta.can_be_undefined,
        };
        Ok((value, shape))
    }

    fn arguments(&mut self, args: Option<&[TypeMetadata]>) -> Result<(Vec<InputValue>, Vec<InputFieldShape>), SchemaError> {
        let mut values = Vec::new();
        let mut shapes = Vec::new();
        for arg in args.unwrap_or_default() {
            let (value, shape) = self.input_value(arg)?;
            values.push(value);
            shapes.push(shape);
        }
        Ok((values, shapes))
    }

    // ------------------------------------------------------------------
    // Roots
    // ------------------------------------------------------------------

    fn build_root(&mut self, category: DeclarationCategory) -> Result<Object, SchemaError> {
        let metadata = self.metadata;
        let declarations = metadata.declarations(category);
        let mut root = Object::new(category.root_type_name());

        if category == DeclarationCategory::Query && declarations.is_empty() {
            root = root.field(Field::new(HEALTH_FIELD, TypeRef::named_nn(TypeRef::STRING), |_| {
                FieldFuture::new(async { Ok(Some(Value::from("ok"))) })
            }));
        }

        for declaration in declarations {
            root = root.field(self.root_field(category, declaration)?);
        }
        Ok(root)
    }

    fn root_field(&mut self, category: DeclarationCategory, meta: &TypeMetadata) -> Result<Field, SchemaError> {
        let name = property_name(meta)?;
        let (type_name, base) = self.output_type(meta)?;
        let (arguments, arg_shapes) = self.arguments(meta.args.as_deref())?;
        let plan = Arc::new(FieldPlan {
            owner: category.root_type_name().to_string(),
            name: name.clone(),
            shape: FieldShape {
                base,
                array: meta.array,
            },
            args: arg_shapes,
            inputs: Arc::clone(&self.inputs),
        });
        let ty = type_ref(&type_name, meta);

        let func = match self.bindings.declaration(category, &name).map(|b| &b.func) {
            Some(ResolverFn::Item(func)) => Some(Arc::clone(func)),
            _ => None,
        };
        let field = Field::new(name, ty, move |ctx| {
            let plan = Arc::clone(&plan);
            let func = func.clone();
            FieldFuture::new(async move {
                let Some(func) = func else {
                    return Err(unbound(category, &plan.name));
                };
                let args = plan.read_args(&ctx)?;
                let context = get_request_context(&ctx)?.clone();
                let value = func(ResolverInput { args, context }).await?;
                shape_output(value, &plan.shape)
            })
        });

        Ok(document_field(field, meta, arguments))
    }

    fn build_subscription(&mut self) -> Result<Subscription, SchemaError> {
        let metadata = self.metadata;
        let mut root = Subscription::new(DeclarationCategory::Subscription.root_type_name());

        for meta in &metadata.subscriptions {
            let name = property_name(meta)?;
            let (type_name, base) = self.output_type(meta)?;
            let (arguments, arg_shapes) = self.arguments(meta.args.as_deref())?;
            let plan = Arc::new(FieldPlan {
                owner: DeclarationCategory::Subscription.root_type_name().to_string(),
                name: name.clone(),
                shape: FieldShape {
                    base,
                    array: meta.array,
                },
                args: arg_shapes,
                inputs: Arc::clone(&self.inputs),
            });

            let func = match self
                .bindings
                .declaration(DeclarationCategory::Subscription, &name)
                .map(|b| &b.func)
            {
                Some(ResolverFn::Stream(func)) => Some(Arc::clone(func)),
                _ => None,
            };

            let mut field = SubscriptionField::new(name, type_ref(&type_name, meta), move |ctx| {
                let plan = Arc::clone(&plan);
                let func = func.clone();
                SubscriptionFieldFuture::new(async move {
                    let Some(func) = func else {
                        return Err(unbound(DeclarationCategory::Subscription, &plan.name));
                    };
                    let args = plan.read_args(&ctx)?;
                    let context = get_request_context(&ctx)?.clone();
                    let events = func(ResolverInput { args, context }).await?;
                    Ok(events.map(move |event| {
                        event
                            .and_then(|value| shape_output(value, &plan.shape))
                            .map(|value| value.unwrap_or(FieldValue::NULL))
                    }))
                })
            });
            if let Some(description) = &meta.description {
                field = field.description(description);
            }
            if let Deprecation::Deprecated(reason) = &meta.deprecated {
                field = field.deprecation(reason.as_deref());
            }
            for argument in arguments {
                field = field.argument(argument);
            }
            root = root.field(field);
        }
        Ok(root)
    }

    // ------------------------------------------------------------------
    // Fingerprints
    // ------------------------------------------------------------------

    /// Structural fingerprint of an anonymous type, ignoring paths and docs.
    ///
    /// Named children are referenced by name; their own shapes are checked
    /// when they are claimed.
    fn signature(&self, meta: &TypeMetadata) -> String {
        let mut out = String::new();
        let _ = write!(out, "{:?}{{", meta.kind);
        for child in &meta.properties {
            if let Some(name) = &child.property_name {
                let _ = write!(out, "{name}");
            }
            if let Some(value) = &child.value {
                let _ = write!(out, "={value}");
            }
            if child.kind != TypeKind::Property {
                out.push(':');
                out.push_str(&self.reference_signature(child));
            }
            if let Some(args) = &child.args {
                out.push('(');
                for arg in args {
                    let _ = write!(
                        out,
                        "{}:{},",
                        arg.property_name.as_deref().unwrap_or_default(),
                        self.reference_signature(arg)
                    );
                }
                out.push(')');
            }
            out.push(',');
        }
        out.push('}');
        out
    }

    fn reference_signature(&self, meta: &TypeMetadata) -> String {
        let base = match self.scalars.scalar_for(meta) {
            Some(scalar) => scalar.to_string(),
            None => meta
                .model_name
                .as_ref()
                .or(meta.type_name.as_ref())
                .map_or_else(|| self.signature(meta), Clone::clone),
        };
        let mut flags = String::new();
        if meta.array {
            flags.push_str("[]");
        }
        if meta.nullable {
            flags.push('?');
        }
        if meta.can_be_undefined {
            flags.push('~');
        }
        format!("{base}{flags}")
    }
}

/// Per-field data shared by every invocation of a field resolver.
struct FieldPlan {
    owner: String,
    name: String,
    shape: FieldShape,
    args: Vec<InputFieldShape>,
    inputs: Arc<InputTable>,
}

impl FieldPlan {
    fn read_args(&self, ctx: &ResolverContext<'_>) -> ResolverResult<Json> {
        let provided: Map<String, Json> = self
            .args
            .iter()
            .filter_map(|arg| {
                ctx.args
                    .get(&arg.name)
                    .map(|value| (arg.name.clone(), graphql_value_to_json(value.as_value())))
            })
            .collect();
        decode_inputs(&provided, &self.args, &self.inputs, &self.name)
    }
}

fn parent_json<'c>(ctx: &'c ResolverContext<'_>) -> ResolverResult<&'c Json> {
    ctx.parent_value
        .try_downcast_ref::<Json>()
        .map_err(|_| async_graphql::Error::new("parent value is not an object"))
}

fn unbound(category: DeclarationCategory, name: &str) -> async_graphql::Error {
    async_graphql::Error::new(format!("no resolver bound for {category} `{name}`"))
}

fn document_field(mut field: Field, meta: &TypeMetadata, arguments: Vec<InputValue>) -> Field {
    if let Some(description) = &meta.description {
        field = field.description(description);
    }
    if let Deprecation::Deprecated(reason) = &meta.deprecated {
        field = field.deprecation(reason.as_deref());
    }
    for argument in arguments {
        field = field.argument(argument);
    }
    field
}

/// Type reference of an occurrence. List items are always non-null.
fn type_ref(name: &str, meta: &TypeMetadata) -> TypeRef {
    match (meta.array, meta.is_optional()) {
        (true, true) => TypeRef::named_nn_list(name),
        (true, false) => TypeRef::named_nn_list_nn(name),
        (false, true) => TypeRef::named(name),
        (false, false) => TypeRef::named_nn(name),
    }
}

/// Unions become schema unions only when every member is an object type.
fn is_object_union(meta: &TypeMetadata) -> bool {
    !meta.properties.is_empty()
        && meta
            .properties
            .iter()
            .all(|member| matches!(member.kind, TypeKind::Model | TypeKind::Object) && !member.array)
}

fn type_name(meta: &TypeMetadata) -> Result<String, SchemaError> {
    meta.type_name
        .clone()
        .ok_or_else(|| SchemaError::SchemaBuildFailed(format!("no type name at `{}`", meta.property_path)))
}

fn model_name(meta: &TypeMetadata) -> Result<String, SchemaError> {
    meta.model_name
        .clone()
        .ok_or_else(|| SchemaError::SchemaBuildFailed(format!("no model name at `{}`", meta.property_path)))
}

fn property_name(meta: &TypeMetadata) -> Result<String, SchemaError> {
    meta.property_name
        .clone()
        .ok_or_else(|| SchemaError::SchemaBuildFailed(format!("no property name at `{}`", meta.property_path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaforge_metadata::{EnumMember, Literal, PropertyNode, TypeDecl, TypeGraph, TypeNode, normalize};

    fn synthesize(graph: &TypeGraph) -> Result<SynthesizedTypes, SchemaError> {
        let metadata = normalize(graph)?;
        let bindings = BindingTable::default();
        let scalars = ScalarMapping::default();
        SchemaSynthesizer::new(&metadata, &bindings, &scalars).synthesize()
    }

    #[test]
    fn test_type_refs() {
        let mut meta = TypeMetadata::new(TypeKind::String, "PostType.tags");
        assert_eq!(type_ref("String", &meta).to_string(), "String!");
        meta.array = true;
        assert_eq!(type_ref("String", &meta).to_string(), "[String!]!");
        meta.can_be_undefined = true;
        assert_eq!(type_ref("String", &meta).to_string(), "[String!]");
        meta.array = false;
        assert_eq!(type_ref("String", &meta).to_string(), "String");
    }

    #[test]
    fn test_declared_types_and_query_root() {
        let status = TypeNode::enumeration([
            EnumMember::new(Literal::String("draft".into())),
            EnumMember::new(Literal::String("published".into())),
        ]);
        let graph = TypeGraph::new("blog").model(TypeDecl::new(
            "PostType",
            TypeNode::object([PropertyNode::new("status", status)]),
        ));

        let synthesized = synthesize(&graph).unwrap();
        // BigInt, JSON, PostType, PostTypeStatusEnum, Query
        assert_eq!(synthesized.types.len(), 5);
        assert!(!synthesized.has_mutation);
        assert!(!synthesized.has_subscription);
    }

    #[test]
    fn test_naming_collision_reports_both_paths() {
        let graph = TypeGraph::new("blog")
            .model(TypeDecl::new(
                "Post",
                TypeNode::object([PropertyNode::new(
                    "typeX",
                    TypeNode::object([PropertyNode::new("a", TypeNode::string())]),
                )]),
            ))
            .model(TypeDecl::new(
                "PostType",
                TypeNode::object([PropertyNode::new(
                    "x",
                    TypeNode::object([PropertyNode::new("b", TypeNode::number())]),
                )]),
            ));

        let err = synthesize(&graph).unwrap_err();
        match err {
            SchemaError::NamingCollision { name, first, second } => {
                assert_eq!(name, "PostTypeXModel");
                assert_eq!(first, "Post.typeX");
                assert_eq!(second, "PostType.x");
            }
            other => panic!("expected naming collision, got {other}"),
        }
    }

    #[test]
    fn test_model_named_like_root_collides() {
        let graph = TypeGraph::new("blog").model(TypeDecl::new(
            "Query",
            TypeNode::object([PropertyNode::new("id", TypeNode::number())]),
        ));
        assert!(matches!(
            synthesize(&graph),
            Err(SchemaError::NamingCollision { name, .. }) if name == "Query"
        ));
    }

    #[test]
    fn test_signature_ignores_paths_and_docs() {
        let metadata = ApplicationMetadata {
            name: "x".into(),
            description: None,
            actions: vec![],
            models: vec![],
            inputs: vec![],
            queries: vec![],
            mutations: vec![],
            subscriptions: vec![],
        };
        let bindings = BindingTable::default();
        let scalars = ScalarMapping::default();
        let synthesizer = SchemaSynthesizer::new(&metadata, &bindings, &scalars);

        let mut a = TypeMetadata::new(TypeKind::Object, "A.meta");
        let mut title = TypeMetadata::new(TypeKind::String, "A.meta.title");
        title.property_name = Some("title".into());
        a.properties.push(title.clone());

        let mut b = TypeMetadata::new(TypeKind::Object, "B.meta");
        title.property_path = "B.meta.title".into();
        title.description = Some("documented".into());
        b.properties.push(title.clone());
        assert_eq!(synthesizer.signature(&a), synthesizer.signature(&b));

        b.properties[0].nullable = true;
        assert_ne!(synthesizer.signature(&a), synthesizer.signature(&b));
    }
}
