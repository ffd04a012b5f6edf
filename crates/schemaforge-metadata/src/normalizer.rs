//! Type graph normalization.
//!
//! `MetadataNormalizer` walks a [`TypeGraph`] and produces the canonical
//! [`ApplicationMetadata`] tree. Each node is resolved in a fixed precedence
//! order: optional and null markers are unwrapped first, then arrays, then
//! primitives, enums, intersections, unions, named declarations and finally
//! anonymous objects.
//!
//! Every occurrence of a named model or input is a reference node carrying
//! only the name; the definition is normalized once, in
//! [`ApplicationMetadata::models`] or [`ApplicationMetadata::inputs`]. This
//! keeps self-referential models finite and the document linear in the size
//! of the graph. Intersections copy the properties of the declarations they
//! name, so the declarations being expanded are tracked on a stack and an
//! expansion that reaches itself again is a shape error.
//!
//! Shape problems never abort the walk: they are collected and returned
//! together once the whole graph has been visited.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::{debug, trace};

use crate::error::{MetadataError, ShapeError};
use crate::graph::{
    ActionNode, DeclarationNode, EnumMember, Literal, PrimitiveKind, PropertyNode, TypeDecl,
    TypeGraph, TypeNode,
};
use crate::metadata::{
    ActionMetadata, ApplicationMetadata, DeclarationCategory, Deprecation, TypeKind, TypeMetadata,
};
use crate::naming::{
    DefaultNamingStrategy, NamingStrategy, TypeSide, enumerant_name, is_valid_identifier,
};

/// Normalizes a graph with the default naming strategy.
///
/// # Errors
///
/// Returns [`MetadataError::Shape`] listing every shape problem in the graph.
pub fn normalize(graph: &TypeGraph) -> Result<ApplicationMetadata, MetadataError> {
    MetadataNormalizer::new(graph).normalize()
}

/// Enum value names GraphQL reserves for its own literals.
const RESERVED_ENUM_VALUES: [&str; 3] = ["true", "false", "null"];

/// Location and visibility of the node being normalized.
#[derive(Debug, Clone)]
struct Scope {
    path: String,
    side: TypeSide,
    /// Whether the node ends up in the executable schema. Only visible
    /// anonymous nodes get names and only visible names are validated.
    visible: bool,
}

impl Scope {
    fn root(path: impl Into<String>, side: TypeSide, visible: bool) -> Self {
        Self {
            path: path.into(),
            side,
            visible,
        }
    }

    fn child(&self, segment: &str) -> Self {
        Self {
            path: format!("{}.{}", self.path, segment),
            side: self.side,
            visible: self.visible,
        }
    }

    /// Scope of the argument shapes of `property`, namespaced under `Args`.
    fn args(&self, property: &str) -> Self {
        Self {
            path: format!("{}.Args.{}", self.path, property),
            side: TypeSide::Input,
            visible: self.visible,
        }
    }
}

/// Null/undefined markers collected while unwrapping a node.
#[derive(Debug, Default, Clone, Copy)]
struct Markers {
    nullable: bool,
    undefined: bool,
}

/// Converts a [`TypeGraph`] into [`ApplicationMetadata`].
pub struct MetadataNormalizer<'g> {
    graph: &'g TypeGraph,
    naming: Arc<dyn NamingStrategy>,
    models: HashMap<&'g str, &'g TypeDecl>,
    inputs: HashMap<&'g str, &'g TypeDecl>,
    /// Declarations whose properties are currently being expanded.
    expanding: Vec<&'g str>,
    errors: Vec<ShapeError>,
}

impl<'g> MetadataNormalizer<'g> {
    /// Creates a normalizer using [`DefaultNamingStrategy`].
    #[must_use]
    pub fn new(graph: &'g TypeGraph) -> Self {
        Self::with_naming(graph, Arc::new(DefaultNamingStrategy))
    }

    /// Creates a normalizer with an explicit naming strategy.
    #[must_use]
    pub fn with_naming(graph: &'g TypeGraph, naming: Arc<dyn NamingStrategy>) -> Self {
        // First declaration wins the lookup; duplicates are reported separately.
        let mut models = HashMap::new();
        for decl in &graph.models {
            models.entry(decl.name.as_str()).or_insert(decl);
        }
        let mut inputs = HashMap::new();
        for decl in &graph.inputs {
            inputs.entry(decl.name.as_str()).or_insert(decl);
        }

        Self {
            graph,
            naming,
            models,
            inputs,
            expanding: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Normalizes the whole graph.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Shape`] with every problem found; no partial
    /// metadata is returned.
    pub fn normalize(mut self) -> Result<ApplicationMetadata, MetadataError> {
        let graph = self.graph;
        debug!(application = %graph.name, "Normalizing type graph");

        self.check_type_names();
        self.check_declaration_names(DeclarationCategory::Query, &graph.queries);
        self.check_declaration_names(DeclarationCategory::Mutation, &graph.mutations);
        self.check_declaration_names(DeclarationCategory::Subscription, &graph.subscriptions);
        self.check_action_names();

        let models = graph
            .models
            .iter()
            .map(|decl| self.normalize_declared(decl, TypeSide::Output))
            .collect();
        let inputs = graph
            .inputs
            .iter()
            .map(|decl| self.normalize_declared(decl, TypeSide::Input))
            .collect();

        let queries = self.normalize_declarations(DeclarationCategory::Query, &graph.queries);
        let mutations = self.normalize_declarations(DeclarationCategory::Mutation, &graph.mutations);
        let subscriptions =
            self.normalize_declarations(DeclarationCategory::Subscription, &graph.subscriptions);

        let actions = graph
            .actions
            .iter()
            .map(|action| self.normalize_action(action))
            .collect();

        if !self.errors.is_empty() {
            debug!(count = self.errors.len(), "Type graph normalization failed");
            return Err(MetadataError::Shape(self.errors));
        }

        debug!(
            models = graph.models.len(),
            inputs = graph.inputs.len(),
            queries = graph.queries.len(),
            mutations = graph.mutations.len(),
            subscriptions = graph.subscriptions.len(),
            actions = graph.actions.len(),
            "Type graph normalized"
        );

        Ok(ApplicationMetadata {
            name: graph.name.clone(),
            description: graph.description.clone(),
            actions,
            models,
            inputs,
            queries,
            mutations,
            subscriptions,
        })
    }

    // ------------------------------------------------------------------
    // Declaration-level checks
    // ------------------------------------------------------------------

    fn check_type_names(&mut self) {
        let graph = self.graph;
        let mut sites: IndexMap<&str, Vec<String>> = IndexMap::new();
        let models = graph.models.iter().enumerate().map(|(i, d)| (d, "models", i));
        let inputs = graph.inputs.iter().enumerate().map(|(i, d)| (d, "inputs", i));

        for (decl, label, index) in models.chain(inputs) {
            if !is_valid_identifier(&decl.name) {
                self.errors.push(ShapeError::InvalidIdentifier {
                    path: decl.name.clone(),
                    name: decl.name.clone(),
                });
            }
            let site = decl
                .site
                .clone()
                .unwrap_or_else(|| format!("{label}[{index}]"));
            sites.entry(decl.name.as_str()).or_default().push(site);
        }

        for (name, sites) in sites {
            if sites.len() > 1 {
                self.errors.push(ShapeError::DuplicateType {
                    name: name.to_string(),
                    sites,
                });
            }
        }
    }

    fn check_declaration_names(&mut self, category: DeclarationCategory, decls: &[DeclarationNode]) {
        let mut sites: IndexMap<&str, Vec<String>> = IndexMap::new();
        for (index, decl) in decls.iter().enumerate() {
            if !is_valid_identifier(&decl.name) {
                self.errors.push(ShapeError::InvalidIdentifier {
                    path: format!("{}.{}", category.root_type_name(), decl.name),
                    name: decl.name.clone(),
                });
            }
            let site = decl
                .site
                .clone()
                .unwrap_or_else(|| format!("{}[{index}]", category.plural()));
            sites.entry(decl.name.as_str()).or_default().push(site);
        }
        self.report_duplicates(category, sites);
    }

    fn check_action_names(&mut self) {
        let category = DeclarationCategory::Action;
        let graph = self.graph;
        let mut sites: IndexMap<&str, Vec<String>> = IndexMap::new();
        for (index, action) in graph.actions.iter().enumerate() {
            let site = action
                .site
                .clone()
                .unwrap_or_else(|| format!("{}[{index}]", category.plural()));
            sites.entry(action.name.as_str()).or_default().push(site);
        }
        self.report_duplicates(category, sites);
    }

    fn report_duplicates(&mut self, category: DeclarationCategory, sites: IndexMap<&str, Vec<String>>) {
        for (name, sites) in sites {
            if sites.len() > 1 {
                self.errors.push(ShapeError::DuplicateDeclaration {
                    category,
                    name: name.to_string(),
                    sites,
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn normalize_declarations(
        &mut self,
        category: DeclarationCategory,
        decls: &'g [DeclarationNode],
    ) -> Vec<TypeMetadata> {
        decls
            .iter()
            .map(|decl| self.normalize_declaration(category, decl))
            .collect()
    }

    fn normalize_declaration(
        &mut self,
        category: DeclarationCategory,
        decl: &'g DeclarationNode,
    ) -> TypeMetadata {
        let owner = Scope::root(category.root_type_name(), TypeSide::Output, true);
        let scope = owner.child(&decl.name);
        trace!(path = %scope.path, "Normalizing declaration");

        let mut meta = self.normalize_node(&decl.returns, &scope);
        meta.property_name = Some(decl.name.clone());
        apply_docs(&mut meta, decl.description.as_ref(), &decl.deprecated);

        if let Some(args) = &decl.args {
            meta.args = Some(self.object_properties(args, &owner.args(&decl.name)));
        }
        meta
    }

    fn normalize_action(&mut self, action: &'g ActionNode) -> ActionMetadata {
        let base = format!("{}.{}", DeclarationCategory::Action.root_type_name(), action.name);
        let output = Scope::root(base.as_str(), TypeSide::Output, false);
        let input = Scope::root(base.as_str(), TypeSide::Input, false);

        let mut part = |node: &'g Option<TypeNode>, segment: &str| {
            node.as_ref()
                .map(|node| self.normalize_node(node, &input.child(segment)))
        };
        let params = part(&action.params, "params");
        let query = part(&action.query, "query");
        let headers = part(&action.headers, "headers");
        let cookies = part(&action.cookies, "cookies");
        let body = part(&action.body, "body");

        ActionMetadata {
            name: action.name.clone(),
            description: action.description.clone(),
            returns: self.normalize_node(&action.returns, &output.child("return")),
            params,
            query,
            headers,
            cookies,
            body,
        }
    }

    /// Normalizes the definition of a named model or input.
    fn normalize_declared(&mut self, decl: &'g TypeDecl, side: TypeSide) -> TypeMetadata {
        let name = decl.name.as_str();
        trace!(name, ?side, "Normalizing declared type");

        self.expanding.push(name);
        let properties = self.object_properties(&decl.ty, &Scope::root(name, side, true));
        self.expanding.pop();

        let mut meta = TypeMetadata::new(TypeKind::Model, name);
        meta.model_name = Some(name.to_string());
        meta.type_name = Some(name.to_string());
        meta.properties = properties;
        apply_docs(&mut meta, decl.description.as_ref(), &decl.deprecated);
        meta
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    fn normalize_node(&mut self, node: &'g TypeNode, scope: &Scope) -> TypeMetadata {
        let mut markers = Markers::default();
        let mut arms = Vec::new();
        flatten_arms(node, &mut arms, &mut markers);

        let array_arms = arms
            .iter()
            .filter(|arm| matches!(arm, TypeNode::Array { .. }))
            .count();

        let mut meta = if arms.is_empty() {
            self.errors.push(ShapeError::Unrepresentable {
                path: scope.path.clone(),
            });
            TypeMetadata::new(TypeKind::Object, scope.path.clone())
        } else if array_arms == arms.len() {
            self.normalize_array(&arms, scope)
        } else if array_arms > 0 {
            self.errors.push(ShapeError::MixedArrayUnion {
                path: scope.path.clone(),
            });
            TypeMetadata::new(TypeKind::Object, scope.path.clone())
        } else if let [single] = arms.as_slice() {
            self.classify(*single, scope)
        } else {
            self.classify_union(&arms, scope)
        };

        meta.nullable |= markers.nullable;
        meta.can_be_undefined |= markers.undefined;
        meta
    }

    /// Normalizes a set of array arms into one `array` node.
    ///
    /// Element-level null markers are not represented; list items are
    /// always non-null in the schema.
    fn normalize_array(&mut self, arms: &[&'g TypeNode], scope: &Scope) -> TypeMetadata {
        let mut element: Option<TypeMetadata> = None;
        for &arm in arms {
            let TypeNode::Array { items } = arm else {
                continue;
            };
            let candidate = self.normalize_node(items, scope);
            if candidate.array {
                self.errors.push(ShapeError::NestedArray {
                    path: scope.path.clone(),
                });
            }
            match &element {
                None => element = Some(candidate),
                Some(first) if !first.same_shape(&candidate) => {
                    self.errors.push(ShapeError::ArrayUnionMismatch {
                        path: scope.path.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        let mut meta = element.unwrap_or_else(|| TypeMetadata::new(TypeKind::Object, scope.path.clone()));
        meta.array = true;
        meta.nullable = false;
        meta.can_be_undefined = false;
        meta
    }

    fn classify(&mut self, node: &'g TypeNode, scope: &Scope) -> TypeMetadata {
        match node {
            TypeNode::Primitive { kind } => TypeMetadata::new(primitive_kind(*kind), scope.path.clone()),
            TypeNode::Literal { value: Literal::Bool(_) } => {
                TypeMetadata::new(TypeKind::Boolean, scope.path.clone())
            }
            TypeNode::Literal { value } => {
                let member = EnumMember::new(value.clone());
                self.build_enum(std::iter::once(&member), scope)
            }
            TypeNode::Enum { members } => self.build_enum(members.iter(), scope),
            TypeNode::Reference { name } => self.normalize_reference(name, scope),
            TypeNode::Object { .. } | TypeNode::Intersection { .. } => {
                let mut meta = TypeMetadata::new(TypeKind::Object, scope.path.clone());
                meta.properties = self.object_properties(node, scope);
                self.assign_name(&mut meta, scope);
                meta
            }
            // Wrappers are removed by `flatten_arms`; route anything else back through it.
            TypeNode::Array { .. }
            | TypeNode::Optional { .. }
            | TypeNode::Nullable { .. }
            | TypeNode::Union { .. }
            | TypeNode::Null
            | TypeNode::Undefined => self.normalize_node(node, scope),
        }
    }

    fn classify_union(&mut self, arms: &[&'g TypeNode], scope: &Scope) -> TypeMetadata {
        let base_kinds: Vec<Option<(PrimitiveKind, bool)>> =
            arms.iter().map(|arm| arm_base_kind(arm)).collect();

        if base_kinds.iter().all(Option::is_some) {
            let kinds: HashSet<PrimitiveKind> = base_kinds.iter().flatten().map(|(k, _)| *k).collect();
            let all_literal = base_kinds.iter().flatten().all(|(_, literal)| *literal);

            if kinds.len() == 1 && kinds.contains(&PrimitiveKind::Boolean) {
                return TypeMetadata::new(TypeKind::Boolean, scope.path.clone());
            }
            if all_literal && !kinds.contains(&PrimitiveKind::Boolean) {
                let members = collect_enum_members(arms);
                return self.build_enum(members.iter(), scope);
            }
            if kinds.len() == 1 {
                if let Some(kind) = kinds.into_iter().next() {
                    return TypeMetadata::new(primitive_kind(kind), scope.path.clone());
                }
            }
        }

        let mut meta = TypeMetadata::new(TypeKind::Union, scope.path.clone());
        meta.properties = arms
            .iter()
            .enumerate()
            .map(|(index, &arm)| self.normalize_node(arm, &scope.child(&index.to_string())))
            .collect();
        self.assign_name(&mut meta, scope);
        meta
    }

    fn build_enum<'m>(
        &mut self,
        members: impl Iterator<Item = &'m EnumMember>,
        scope: &Scope,
    ) -> TypeMetadata {
        let mut meta = TypeMetadata::new(TypeKind::Enum, scope.path.clone());
        let mut seen: HashSet<String> = HashSet::new();

        for member in members {
            let name = match &member.name {
                Some(name) => name.clone(),
                None => match &member.value {
                    Literal::String(s) => enumerant_name(s),
                    other => enumerant_name(&other.to_json().to_string()),
                },
            };
            if scope.visible && !is_valid_identifier(&name) {
                self.errors.push(ShapeError::InvalidIdentifier {
                    path: scope.path.clone(),
                    name: name.clone(),
                });
            } else if scope.visible && RESERVED_ENUM_VALUES.contains(&name.as_str()) {
                self.errors.push(ShapeError::ReservedEnumValue {
                    path: scope.path.clone(),
                    name: name.clone(),
                });
            }
            if !seen.insert(name.clone()) {
                self.errors.push(ShapeError::DuplicateEnumValue {
                    path: scope.path.clone(),
                    name,
                });
                continue;
            }

            let mut enumerant = TypeMetadata::new(TypeKind::Property, format!("{}.{}", scope.path, name));
            enumerant.property_name = Some(name);
            enumerant.value = Some(member.value.to_json());
            apply_docs(&mut enumerant, member.description.as_ref(), &member.deprecated);
            meta.properties.push(enumerant);
        }

        if meta.properties.is_empty() {
            self.errors.push(ShapeError::Unrepresentable {
                path: scope.path.clone(),
            });
        }
        self.assign_name(&mut meta, scope);
        meta
    }

    /// Names anonymous objects, enums and unions that reach the schema.
    fn assign_name(&self, meta: &mut TypeMetadata, scope: &Scope) {
        if scope.visible && meta.kind.needs_name() {
            meta.type_name = Some(self.naming.type_name(&scope.path, meta.kind, scope.side));
        }
    }

    fn normalize_reference(&mut self, name: &str, scope: &Scope) -> TypeMetadata {
        let is_model = self.models.contains_key(name);
        let is_input = self.inputs.contains_key(name);

        let side = match (scope.side, is_model, is_input) {
            (TypeSide::Output, true, _) => Some(TypeSide::Output),
            (TypeSide::Input, _, true) => Some(TypeSide::Input),
            // Hidden shapes (actions) may use either kind of declaration.
            (_, true, _) if !scope.visible => Some(TypeSide::Output),
            (_, _, true) if !scope.visible => Some(TypeSide::Input),
            (TypeSide::Output, false, true) => {
                self.errors.push(ShapeError::CrossSideReference {
                    path: scope.path.clone(),
                    name: name.to_string(),
                    declared: "input",
                    used: "an output type",
                });
                None
            }
            (TypeSide::Input, true, false) => {
                self.errors.push(ShapeError::CrossSideReference {
                    path: scope.path.clone(),
                    name: name.to_string(),
                    declared: "model",
                    used: "an input type",
                });
                None
            }
            _ => {
                self.errors.push(ShapeError::UnknownReference {
                    path: scope.path.clone(),
                    name: name.to_string(),
                });
                None
            }
        };

        if let Some(side) = side {
            trace!(name, ?side, path = %scope.path, "Referencing declared type");
        }
        let mut meta = reference_to(name);
        meta.property_path = scope.path.clone();
        meta
    }

    // ------------------------------------------------------------------
    // Object-like shapes
    // ------------------------------------------------------------------

    /// Flattens an object-like node into its merged, normalized properties.
    fn object_properties(&mut self, node: &'g TypeNode, scope: &Scope) -> Vec<TypeMetadata> {
        let mut sources = Vec::new();
        let mut expanded = Vec::new();
        self.collect_properties(node, scope, &mut sources, &mut expanded);

        // Copied properties are walked with their declarations still expanding.
        let mark = self.expanding.len();
        self.expanding.extend(expanded);
        let mut merged: IndexMap<&'g str, TypeMetadata> = IndexMap::new();
        for property in sources {
            let meta = self.normalize_property(property, scope);
            match merged.entry(property.name.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(meta);
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    if existing.same_shape(&meta) {
                        existing.nullable |= meta.nullable;
                        existing.can_be_undefined |= meta.can_be_undefined;
                        if existing.args.is_none() {
                            existing.args = meta.args;
                        }
                        if existing.description.is_none() {
                            existing.description = meta.description;
                        }
                    } else {
                        self.errors.push(ShapeError::IncompatibleMerge {
                            path: scope.path.clone(),
                            property: property.name.clone(),
                        });
                    }
                }
            }
        }
        self.expanding.truncate(mark);
        merged.into_values().collect()
    }

    /// Collects property sources of an object, intersection or reference.
    ///
    /// A reference to a declaration that is already being expanded, on this
    /// walk or an enclosing one, would copy its own properties forever.
    fn collect_properties(
        &mut self,
        node: &'g TypeNode,
        scope: &Scope,
        out: &mut Vec<&'g PropertyNode>,
        expanded: &mut Vec<&'g str>,
    ) {
        match node {
            TypeNode::Object { properties } => out.extend(properties.iter()),
            TypeNode::Intersection { members } => {
                for member in members {
                    self.collect_properties(member, scope, out, expanded);
                }
            }
            TypeNode::Reference { name } => {
                let decl = self
                    .models
                    .get(name.as_str())
                    .or_else(|| self.inputs.get(name.as_str()))
                    .copied();
                let Some(decl) = decl else {
                    self.errors.push(ShapeError::UnknownReference {
                        path: scope.path.clone(),
                        name: name.clone(),
                    });
                    return;
                };
                if self.expanding.contains(&decl.name.as_str()) {
                    self.errors.push(ShapeError::CyclicIntersection {
                        path: scope.path.clone(),
                        name: name.clone(),
                    });
                    return;
                }
                self.expanding.push(decl.name.as_str());
                self.collect_properties(&decl.ty, scope, out, expanded);
                self.expanding.pop();
                expanded.push(decl.name.as_str());
            }
            _ => self.errors.push(ShapeError::IntersectionOperand {
                path: scope.path.clone(),
            }),
        }
    }

    fn normalize_property(&mut self, property: &'g PropertyNode, owner: &Scope) -> TypeMetadata {
        let scope = owner.child(&property.name);
        if owner.visible && !is_valid_identifier(&property.name) {
            self.errors.push(ShapeError::InvalidIdentifier {
                path: scope.path.clone(),
                name: property.name.clone(),
            });
        }

        let mut meta = self.normalize_node(&property.ty, &scope);
        meta.property_name = Some(property.name.clone());
        apply_docs(&mut meta, property.description.as_ref(), &property.deprecated);

        if let Some(args) = &property.args {
            if owner.side == TypeSide::Input {
                self.errors.push(ShapeError::ArgumentsOnInput { path: scope.path });
            } else {
                meta.args = Some(self.object_properties(args, &owner.args(&property.name)));
            }
        }
        meta
    }
}

/// Collects non-null, non-undefined arms of a node, recording the markers.
fn flatten_arms<'g>(node: &'g TypeNode, arms: &mut Vec<&'g TypeNode>, markers: &mut Markers) {
    match node {
        TypeNode::Optional { inner } => {
            markers.undefined = true;
            flatten_arms(inner, arms, markers);
        }
        TypeNode::Nullable { inner } => {
            markers.nullable = true;
            flatten_arms(inner, arms, markers);
        }
        TypeNode::Null => markers.nullable = true,
        TypeNode::Undefined => markers.undefined = true,
        TypeNode::Union { members } => {
            for member in members {
                flatten_arms(member, arms, markers);
            }
        }
        other => arms.push(other),
    }
}

/// Base primitive of a scalar-like arm and whether it is a literal.
fn arm_base_kind(arm: &TypeNode) -> Option<(PrimitiveKind, bool)> {
    match arm {
        TypeNode::Primitive { kind } => Some((*kind, false)),
        TypeNode::Literal { value } => Some((value.base_kind(), true)),
        // Enum nodes are closed literal sets; treat them as literals of their first member.
        TypeNode::Enum { members } => members.first().map(|m| (m.value.base_kind(), true)),
        _ => None,
    }
}

fn collect_enum_members(arms: &[&TypeNode]) -> Vec<EnumMember> {
    let mut members: Vec<EnumMember> = Vec::new();
    for arm in arms {
        let incoming: Vec<EnumMember> = match arm {
            TypeNode::Literal { value } => vec![EnumMember::new(value.clone())],
            TypeNode::Enum { members } => members.clone(),
            _ => Vec::new(),
        };
        for member in incoming {
            if !members.iter().any(|m| m.value == member.value) {
                members.push(member);
            }
        }
    }
    members
}

fn primitive_kind(kind: PrimitiveKind) -> TypeKind {
    match kind {
        PrimitiveKind::Number => TypeKind::Number,
        PrimitiveKind::Bigint => TypeKind::Bigint,
        PrimitiveKind::String => TypeKind::String,
        PrimitiveKind::Boolean => TypeKind::Boolean,
    }
}

/// By-name occurrence of a declared model or input.
fn reference_to(name: &str) -> TypeMetadata {
    let mut meta = TypeMetadata::new(TypeKind::Model, name);
    meta.model_name = Some(name.to_string());
    meta.type_name = Some(name.to_string());
    meta.reference = true;
    meta
}

fn apply_docs(meta: &mut TypeMetadata, description: Option<&String>, deprecated: &Deprecation) {
    if let Some(description) = description {
        meta.description = Some(description.clone());
    }
    if !deprecated.is_current() {
        meta.deprecated = deprecated.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyNode as P;

    fn graph_with_model(properties: Vec<P>) -> TypeGraph {
        TypeGraph::new("test").model(TypeDecl::new("PostType", TypeNode::object(properties)))
    }

    fn post_property<'a>(metadata: &'a ApplicationMetadata, name: &str) -> &'a TypeMetadata {
        metadata.models[0].property(name).expect("property present")
    }

    #[test]
    fn test_nullability_orthogonality() {
        let graph = graph_with_model(vec![
            P::new("plain", TypeNode::string()),
            P::new("nullable", TypeNode::nullable(TypeNode::string())),
            P::new("optional", TypeNode::optional(TypeNode::string())),
            P::new(
                "both",
                TypeNode::union([TypeNode::string(), TypeNode::Null, TypeNode::Undefined]),
            ),
        ]);
        let metadata = normalize(&graph).unwrap();

        let flags = |name: &str| {
            let p = post_property(&metadata, name);
            (p.nullable, p.can_be_undefined)
        };
        assert_eq!(flags("plain"), (false, false));
        assert_eq!(flags("nullable"), (true, false));
        assert_eq!(flags("optional"), (false, true));
        assert_eq!(flags("both"), (true, true));
    }

    #[test]
    fn test_array_of_union_stability() {
        let graph = graph_with_model(vec![P::new(
            "tags",
            TypeNode::union([
                TypeNode::array(TypeNode::string()),
                TypeNode::Null,
                TypeNode::Undefined,
            ]),
        )]);
        let metadata = normalize(&graph).unwrap();
        let tags = post_property(&metadata, "tags");

        assert!(tags.array);
        assert!(tags.nullable);
        assert!(tags.can_be_undefined);
        assert_eq!(tags.kind, TypeKind::String);
    }

    #[test]
    fn test_nested_enum_naming() {
        let graph = graph_with_model(vec![P::new(
            "categories",
            TypeNode::array(TypeNode::object([P::new(
                "status",
                TypeNode::union([TypeNode::literal("draft"), TypeNode::literal("published")]),
            )])),
        )]);
        let metadata = normalize(&graph).unwrap();
        let categories = post_property(&metadata, "categories");
        let status = categories.property("status").unwrap();

        assert_eq!(categories.type_name.as_deref(), Some("PostTypeCategoriesModel"));
        assert_eq!(status.kind, TypeKind::Enum);
        assert_eq!(status.property_path, "PostType.categories.status");
        assert_eq!(status.type_name.as_deref(), Some("PostTypeCategoriesStatusEnum"));
        let names: Vec<_> = status
            .properties
            .iter()
            .map(|p| p.property_name.as_deref().unwrap())
            .collect();
        assert_eq!(names, ["draft", "published"]);
        assert!(status.properties.iter().all(|p| p.kind == TypeKind::Property));
    }

    #[test]
    fn test_boolean_literals_collapse() {
        let graph = graph_with_model(vec![P::new(
            "flag",
            TypeNode::union([TypeNode::literal(true), TypeNode::literal(false)]),
        )]);
        let metadata = normalize(&graph).unwrap();
        assert_eq!(post_property(&metadata, "flag").kind, TypeKind::Boolean);
    }

    #[test]
    fn test_literal_widened_by_primitive() {
        let graph = graph_with_model(vec![P::new(
            "slug",
            TypeNode::union([TypeNode::string(), TypeNode::literal("home")]),
        )]);
        let metadata = normalize(&graph).unwrap();
        assert_eq!(post_property(&metadata, "slug").kind, TypeKind::String);
    }

    #[test]
    fn test_self_reference_is_name_only() {
        let graph = graph_with_model(vec![
            P::new("title", TypeNode::string()),
            P::new("parent", TypeNode::nullable(TypeNode::reference("PostType"))),
        ]);
        let metadata = normalize(&graph).unwrap();
        let parent = post_property(&metadata, "parent");

        assert_eq!(parent.kind, TypeKind::Model);
        assert_eq!(parent.model_name.as_deref(), Some("PostType"));
        assert!(parent.is_reference());
        assert!(parent.properties.is_empty());
        assert!(parent.nullable);
        assert_eq!(parent.property_path, "PostType.parent");

        let post = metadata.model("PostType").unwrap();
        assert!(!post.is_reference());
        assert_eq!(post.properties.len(), 2);
    }

    #[test]
    fn test_reserved_enum_value_rejected() {
        let graph = graph_with_model(vec![P::new(
            "answer",
            TypeNode::union([TypeNode::literal("true"), TypeNode::literal("false")]),
        )]);
        let MetadataError::Shape(errors) = normalize(&graph).unwrap_err() else {
            panic!("expected shape errors");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(
            e,
            ShapeError::ReservedEnumValue { path, .. } if path == "PostType.answer"
        )));
    }

    #[test]
    fn test_model_arguments_are_namespaced() {
        let graph = graph_with_model(vec![P::new("comments", TypeNode::array(TypeNode::string()))
            .args(TypeNode::object([P::new(
                "filter",
                TypeNode::optional(TypeNode::object([P::new("author", TypeNode::string())])),
            )]))]);
        let metadata = normalize(&graph).unwrap();
        let args = post_property(&metadata, "comments").args.as_ref().unwrap();

        assert_eq!(args.len(), 1);
        assert_eq!(args[0].property_path, "PostType.Args.comments.filter");
        assert_eq!(args[0].type_name.as_deref(), Some("PostTypeArgsCommentsFilterInput"));
        assert!(args[0].can_be_undefined);
    }

    #[test]
    fn test_union_members_named_by_index() {
        let graph = graph_with_model(vec![P::new(
            "content",
            TypeNode::union([
                TypeNode::object([P::new("text", TypeNode::string())]),
                TypeNode::object([P::new("url", TypeNode::string())]),
            ]),
        )]);
        let metadata = normalize(&graph).unwrap();
        let content = post_property(&metadata, "content");

        assert_eq!(content.kind, TypeKind::Union);
        assert_eq!(content.type_name.as_deref(), Some("PostTypeContentUnion"));
        assert_eq!(content.properties[0].type_name.as_deref(), Some("PostTypeContent0Model"));
        assert_eq!(content.properties[1].type_name.as_deref(), Some("PostTypeContent1Model"));
    }

    #[test]
    fn test_nested_array_rejected() {
        let graph = graph_with_model(vec![P::new(
            "grid",
            TypeNode::array(TypeNode::array(TypeNode::number())),
        )]);
        let err = normalize(&graph).unwrap_err();
        assert!(matches!(err.shape_errors(), [ShapeError::NestedArray { path }] if path == "PostType.grid"));
    }

    #[test]
    fn test_mixed_array_union_rejected() {
        let graph = graph_with_model(vec![P::new(
            "value",
            TypeNode::union([TypeNode::array(TypeNode::string()), TypeNode::string()]),
        )]);
        let err = normalize(&graph).unwrap_err();
        assert!(matches!(err.shape_errors(), [ShapeError::MixedArrayUnion { .. }]));
    }

    #[test]
    fn test_array_union_mismatch_rejected() {
        let graph = graph_with_model(vec![P::new(
            "value",
            TypeNode::union([
                TypeNode::array(TypeNode::string()),
                TypeNode::array(TypeNode::number()),
            ]),
        )]);
        let err = normalize(&graph).unwrap_err();
        assert!(matches!(err.shape_errors(), [ShapeError::ArrayUnionMismatch { .. }]));
    }

    #[test]
    fn test_invalid_property_identifier() {
        let graph = graph_with_model(vec![P::new("bad-name", TypeNode::string())]);
        let err = normalize(&graph).unwrap_err();
        assert!(matches!(
            err.shape_errors(),
            [ShapeError::InvalidIdentifier { path, name }]
                if path == "PostType.bad-name" && name == "bad-name"
        ));
    }

    #[test]
    fn test_cross_side_reference_rejected() {
        let graph = graph_with_model(vec![P::new("title", TypeNode::string())]).query(
            DeclarationNode::new("post", TypeNode::reference("PostType"))
                .args(TypeNode::object([P::new("data", TypeNode::reference("PostType"))])),
        );
        let err = normalize(&graph).unwrap_err();
        assert!(matches!(
            err.shape_errors(),
            [ShapeError::CrossSideReference { path, .. }] if path == "Query.Args.post.data"
        ));
    }

    #[test]
    fn test_unrepresentable_type() {
        let graph = graph_with_model(vec![P::new("nothing", TypeNode::Null)]);
        let err = normalize(&graph).unwrap_err();
        assert!(matches!(err.shape_errors(), [ShapeError::Unrepresentable { .. }]));
    }

    #[test]
    fn test_action_parts_are_not_named() {
        let graph = TypeGraph::new("test").action(
            ActionNode::new("GET /posts/:id", TypeNode::object([P::new("id", TypeNode::string())]))
                .params(TypeNode::object([P::new("id", TypeNode::string())])),
        );
        let metadata = normalize(&graph).unwrap();
        let action = &metadata.actions[0];

        assert_eq!(action.returns.kind, TypeKind::Object);
        assert!(action.returns.type_name.is_none());
        assert_eq!(action.returns.property_path, "Action.GET /posts/:id.return");
        assert_eq!(action.params.as_ref().unwrap().properties.len(), 1);
    }
}
