//! End-to-end normalization tests over realistic application graphs.

use schemaforge_metadata::{
    DeclarationCategory, DeclarationNode, Deprecation, EnumMember, Literal, MetadataError,
    MetadataNormalizer, NamingStrategy, PropertyNode, ShapeError, TypeDecl, TypeGraph, TypeKind,
    TypeNode, TypeSide, normalize,
};
use std::sync::Arc;

// =============================================================================
// Fixtures
// =============================================================================

fn blog_graph() -> TypeGraph {
    TypeGraph::new("blog")
        .model(
            TypeDecl::new(
                "PostType",
                TypeNode::object([
                    PropertyNode::new("id", TypeNode::string()),
                    PropertyNode::new("title", TypeNode::string()).description("Post title"),
                    PropertyNode::new(
                        "categories",
                        TypeNode::array(TypeNode::object([
                            PropertyNode::new("name", TypeNode::string()),
                            PropertyNode::new(
                                "status",
                                TypeNode::union([
                                    TypeNode::literal("draft"),
                                    TypeNode::literal("published"),
                                ]),
                            ),
                        ])),
                    ),
                    PropertyNode::new("author", TypeNode::reference("UserType")),
                    PropertyNode::new("legacyId", TypeNode::optional(TypeNode::number()))
                        .deprecated(Deprecation::Deprecated(Some("use id".into()))),
                ]),
            )
            .description("A blog post"),
        )
        .model(TypeDecl::new(
            "UserType",
            TypeNode::object([
                PropertyNode::new("id", TypeNode::string()),
                PropertyNode::new(
                    "posts",
                    TypeNode::optional(TypeNode::array(TypeNode::reference("PostType"))),
                ),
            ]),
        ))
        .input(TypeDecl::new(
            "PostInput",
            TypeNode::object([PropertyNode::new("title", TypeNode::string())]),
        ))
        .query(
            DeclarationNode::new("post", TypeNode::nullable(TypeNode::reference("PostType")))
                .args(TypeNode::object([PropertyNode::new("id", TypeNode::string())])),
        )
        .query(DeclarationNode::new("posts", TypeNode::array(TypeNode::reference("PostType"))))
        .mutation(
            DeclarationNode::new("createPost", TypeNode::reference("PostType"))
                .args(TypeNode::object([PropertyNode::new("data", TypeNode::reference("PostInput"))])),
        )
}

// =============================================================================
// Structure
// =============================================================================

#[test]
fn test_blog_graph_normalizes() {
    let metadata = normalize(&blog_graph()).unwrap();

    assert_eq!(metadata.name, "blog");
    assert_eq!(metadata.models.len(), 2);
    assert_eq!(metadata.inputs.len(), 1);
    assert_eq!(metadata.queries.len(), 2);
    assert_eq!(metadata.mutations.len(), 1);

    let post = metadata.model("PostType").unwrap();
    assert_eq!(post.description.as_deref(), Some("A blog post"));
    assert_eq!(post.property("title").unwrap().description.as_deref(), Some("Post title"));

    let query = metadata.declaration(DeclarationCategory::Query, "post").unwrap();
    assert_eq!(query.kind, TypeKind::Model);
    assert_eq!(query.model_name.as_deref(), Some("PostType"));
    assert_eq!(query.property_path, "Query.post");
    assert!(query.nullable);
    let args = query.args.as_ref().unwrap();
    assert_eq!(args[0].property_path, "Query.Args.post.id");

    let create = metadata
        .declaration(DeclarationCategory::Mutation, "createPost")
        .unwrap();
    let data = &create.args.as_ref().unwrap()[0];
    assert_eq!(data.kind, TypeKind::Model);
    assert_eq!(data.model_name.as_deref(), Some("PostInput"));
}

#[test]
fn test_mutual_recursion_terminates() {
    let metadata = normalize(&blog_graph()).unwrap();

    let author = metadata.model("PostType").unwrap().property("author").unwrap();
    assert_eq!(author.model_name.as_deref(), Some("UserType"));
    assert!(author.is_reference());
    assert!(author.properties.is_empty());

    let posts = metadata.model("UserType").unwrap().property("posts").unwrap();
    assert!(posts.array);
    assert!(posts.can_be_undefined);
    assert!(posts.is_reference());
    assert_eq!(posts.model_name.as_deref(), Some("PostType"));
}

#[test]
fn test_empty_model_is_not_a_reference() {
    let graph = TypeGraph::new("marker")
        .model(TypeDecl::new("Empty", TypeNode::object([])))
        .query(DeclarationNode::new("empty", TypeNode::reference("Empty")));
    let metadata = normalize(&graph).unwrap();

    let empty = metadata.model("Empty").unwrap();
    assert!(empty.properties.is_empty());
    assert!(!empty.is_reference());
    assert!(
        metadata
            .declaration(DeclarationCategory::Query, "empty")
            .unwrap()
            .is_reference()
    );
}

#[test]
fn test_document_size_is_linear_in_references() {
    // Each model points at the next one twice.
    let mut graph = TypeGraph::new("chain");
    for i in 0..16 {
        let next = if i == 15 {
            TypeNode::string()
        } else {
            TypeNode::reference(format!("M{}", i + 1))
        };
        graph = graph.model(TypeDecl::new(
            format!("M{i}"),
            TypeNode::object([
                PropertyNode::new("a", next.clone()),
                PropertyNode::new("b", next),
            ]),
        ));
    }
    let metadata = normalize(&graph).unwrap();

    let a = metadata.model("M0").unwrap().property("a").unwrap();
    assert!(a.is_reference());
    assert_eq!(a.model_name.as_deref(), Some("M1"));
    assert!(a.properties.is_empty());

    let json = metadata.to_json().unwrap();
    assert!(json.len() < 50_000, "document grew to {} bytes", json.len());
}

#[test]
fn test_deprecation_tri_state() {
    let metadata = normalize(&blog_graph()).unwrap();
    let post = metadata.model("PostType").unwrap();

    assert_eq!(post.property("title").unwrap().deprecated, Deprecation::Current);
    assert_eq!(
        post.property("legacyId").unwrap().deprecated.reason(),
        Some("use id")
    );
}

#[test]
fn test_names_are_deterministic() {
    let first = normalize(&blog_graph()).unwrap().to_json().unwrap();
    let second = normalize(&blog_graph()).unwrap().to_json().unwrap();
    assert_eq!(first, second);

    let metadata = normalize(&blog_graph()).unwrap();
    let status = metadata
        .model("PostType")
        .unwrap()
        .property("categories")
        .unwrap()
        .property("status")
        .unwrap();
    assert_eq!(status.type_name.as_deref(), Some("PostTypeCategoriesStatusEnum"));
}

// =============================================================================
// Intersections
// =============================================================================

fn intersection_graph(members: Vec<TypeNode>) -> TypeGraph {
    TypeGraph::new("shapes").model(TypeDecl::new("Shape", TypeNode::intersection(members)))
}

#[test]
fn test_intersection_is_order_independent() {
    let a = TypeNode::object([PropertyNode::new("a", TypeNode::string())]);
    let b = TypeNode::object([PropertyNode::new("b", TypeNode::number())]);

    let ab = normalize(&intersection_graph(vec![a.clone(), b.clone()])).unwrap();
    let ba = normalize(&intersection_graph(vec![b, a])).unwrap();

    assert_eq!(ab.models[0].properties.len(), 2);
    assert_eq!(ba.models[0].properties.len(), 2);
    for name in ["a", "b"] {
        let left = ab.models[0].property(name).unwrap();
        let right = ba.models[0].property(name).unwrap();
        assert!(left.same_shape(right));
        assert_eq!(left.property_path, right.property_path);
    }
}

#[test]
fn test_intersection_widens_optional_property() {
    let metadata = normalize(&intersection_graph(vec![
        TypeNode::object([PropertyNode::new("a", TypeNode::string())]),
        TypeNode::object([PropertyNode::new("a", TypeNode::optional(TypeNode::string()))]),
    ]))
    .unwrap();

    let a = metadata.models[0].property("a").unwrap();
    assert_eq!(metadata.models[0].properties.len(), 1);
    assert!(a.can_be_undefined);
}

#[test]
fn test_intersection_incompatible_property() {
    let err = normalize(&intersection_graph(vec![
        TypeNode::object([PropertyNode::new("a", TypeNode::string())]),
        TypeNode::object([PropertyNode::new("a", TypeNode::number())]),
    ]))
    .unwrap_err();

    assert!(matches!(
        err.shape_errors(),
        [ShapeError::IncompatibleMerge { path, property }] if path == "Shape" && property == "a"
    ));
}

#[test]
fn test_intersection_with_scalar_operand() {
    let err = normalize(&intersection_graph(vec![
        TypeNode::object([PropertyNode::new("a", TypeNode::string())]),
        TypeNode::string(),
    ]))
    .unwrap_err();
    assert!(matches!(err.shape_errors(), [ShapeError::IntersectionOperand { .. }]));
}

#[test]
fn test_intersection_through_reference() {
    let graph = TypeGraph::new("shapes")
        .model(TypeDecl::new(
            "Base",
            TypeNode::object([PropertyNode::new("id", TypeNode::string())]),
        ))
        .model(TypeDecl::new(
            "Post",
            TypeNode::intersection([
                TypeNode::reference("Base"),
                TypeNode::object([PropertyNode::new("title", TypeNode::string())]),
            ]),
        ));
    let metadata = normalize(&graph).unwrap();
    let post = metadata.model("Post").unwrap();

    let names: Vec<_> = post
        .properties
        .iter()
        .map(|p| p.property_name.as_deref().unwrap())
        .collect();
    assert_eq!(names, ["id", "title"]);
    assert_eq!(post.property("id").unwrap().property_path, "Post.id");
}

#[test]
fn test_self_intersection_is_rejected() {
    let graph = TypeGraph::new("threads").model(TypeDecl::new(
        "Comment",
        TypeNode::object([
            PropertyNode::new("body", TypeNode::string()),
            PropertyNode::new(
                "replies",
                TypeNode::array(TypeNode::intersection([
                    TypeNode::reference("Comment"),
                    TypeNode::object([PropertyNode::new("depth", TypeNode::number())]),
                ])),
            ),
        ]),
    ));
    let err = normalize(&graph).unwrap_err();
    assert!(matches!(
        err.shape_errors(),
        [ShapeError::CyclicIntersection { name, .. }] if name == "Comment"
    ));
}

#[test]
fn test_intersection_cycle_through_other_declarations() {
    let extend = |name: &str, target: &str, field: &str| {
        TypeDecl::new(
            name,
            TypeNode::object([PropertyNode::new(
                field,
                TypeNode::intersection([
                    TypeNode::reference(target),
                    TypeNode::object([PropertyNode::new("tag", TypeNode::string())]),
                ]),
            )]),
        )
    };
    let graph = TypeGraph::new("loops")
        .model(extend("Root", "Left", "start"))
        .model(extend("Left", "Right", "next"))
        .model(extend("Right", "Left", "back"));

    let MetadataError::Shape(errors) = normalize(&graph).unwrap_err() else {
        panic!("expected shape errors");
    };
    assert!(!errors.is_empty());
    assert!(errors.iter().all(|e| matches!(e, ShapeError::CyclicIntersection { .. })));
}

#[test]
fn test_intersection_of_referencing_declarations() {
    let graph = TypeGraph::new("shapes")
        .model(TypeDecl::new(
            "User",
            TypeNode::object([PropertyNode::new("latest", TypeNode::reference("Post"))]),
        ))
        .model(TypeDecl::new(
            "Post",
            TypeNode::object([PropertyNode::new(
                "author",
                TypeNode::intersection([
                    TypeNode::reference("User"),
                    TypeNode::object([PropertyNode::new("role", TypeNode::string())]),
                ]),
            )]),
        ));
    let metadata = normalize(&graph).unwrap();

    let author = metadata.model("Post").unwrap().property("author").unwrap();
    assert_eq!(author.kind, TypeKind::Object);
    let latest = author.property("latest").unwrap();
    assert!(latest.is_reference());
    assert_eq!(latest.model_name.as_deref(), Some("Post"));
    assert!(author.property("role").is_some());
}

// =============================================================================
// Enums
// =============================================================================

#[test]
fn test_declared_enum_keeps_member_names() {
    let graph = TypeGraph::new("enums").model(TypeDecl::new(
        "Task",
        TypeNode::object([PropertyNode::new(
            "priority",
            TypeNode::enumeration([
                EnumMember::named("Low", Literal::Number(1.into())),
                EnumMember::named("High", Literal::Number(2.into()))
                    .deprecated(Deprecation::Deprecated(None)),
            ]),
        )]),
    ));
    let metadata = normalize(&graph).unwrap();
    let priority = metadata.models[0].property("priority").unwrap();

    assert_eq!(priority.kind, TypeKind::Enum);
    assert_eq!(priority.type_name.as_deref(), Some("TaskPriorityEnum"));
    let high = priority.enumerant_for_value(&serde_json::json!(2)).unwrap();
    assert_eq!(high.property_name.as_deref(), Some("High"));
    assert!(high.deprecated.is_deprecated());
}

#[test]
fn test_enum_name_collision() {
    let graph = TypeGraph::new("enums").model(TypeDecl::new(
        "Task",
        TypeNode::object([PropertyNode::new(
            "state",
            TypeNode::union([TypeNode::literal("in-progress"), TypeNode::literal("in_progress")]),
        )]),
    ));
    let err = normalize(&graph).unwrap_err();
    assert!(matches!(
        err.shape_errors(),
        [ShapeError::DuplicateEnumValue { name, .. }] if name == "in_progress"
    ));
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn test_duplicate_declaration_lists_sites() {
    let graph = TypeGraph::new("dup")
        .query(DeclarationNode::new("post", TypeNode::string()).site("posts.rs:10"))
        .query(DeclarationNode::new("other", TypeNode::string()))
        .query(DeclarationNode::new("post", TypeNode::number()).site("legacy.rs:4"));

    let err = normalize(&graph).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("post"));
    assert!(message.contains("posts.rs:10"));
    assert!(message.contains("legacy.rs:4"));
}

#[test]
fn test_errors_are_aggregated() {
    let graph = TypeGraph::new("broken")
        .model(TypeDecl::new(
            "A",
            TypeNode::object([
                PropertyNode::new("missing", TypeNode::reference("Nowhere")),
                PropertyNode::new("bad-name", TypeNode::string()),
            ]),
        ))
        .model(TypeDecl::new("A", TypeNode::object([])));

    let MetadataError::Shape(errors) = normalize(&graph).unwrap_err() else {
        panic!("expected shape errors");
    };
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().any(|e| matches!(e, ShapeError::DuplicateType { .. })));
    assert!(errors.iter().any(|e| matches!(e, ShapeError::UnknownReference { .. })));
    assert!(errors.iter().any(|e| matches!(e, ShapeError::InvalidIdentifier { .. })));
}

#[test]
fn test_arguments_rejected_on_input() {
    let graph = TypeGraph::new("inputs").input(TypeDecl::new(
        "Filter",
        TypeNode::object([PropertyNode::new("q", TypeNode::string())
            .args(TypeNode::object([PropertyNode::new("x", TypeNode::string())]))]),
    ));
    let err = normalize(&graph).unwrap_err();
    assert!(matches!(err.shape_errors(), [ShapeError::ArgumentsOnInput { .. }]));
}

// =============================================================================
// Naming strategy
// =============================================================================

struct PrefixNaming;

impl NamingStrategy for PrefixNaming {
    fn type_name(&self, property_path: &str, kind: TypeKind, side: TypeSide) -> String {
        let tag = match (kind, side) {
            (TypeKind::Enum, _) => "E",
            (_, TypeSide::Input) => "I",
            _ => "O",
        };
        format!("{tag}_{}", property_path.replace('.', "_"))
    }
}

#[test]
fn test_custom_naming_strategy() {
    let graph = blog_graph();
    let metadata = MetadataNormalizer::with_naming(&graph, Arc::new(PrefixNaming))
        .normalize()
        .unwrap();

    let categories = metadata.model("PostType").unwrap().property("categories").unwrap();
    assert_eq!(categories.type_name.as_deref(), Some("O_PostType_categories"));
    assert_eq!(
        categories.property("status").unwrap().type_name.as_deref(),
        Some("E_PostType_categories_status")
    );
}
