//! Integration tests for the declared project schema.

use quill_core::catalog::{FieldDef, FieldSchema, IndexDef, TableDef};
use quill_core::project::{self, entity};
use quill_core::{
    Catalog, Error, Related, RelationResolver, Row, RouteBinding, SchemaError, SchemaExporter,
    StorageConfig, StorageEngine,
};
use serde_json::{json, Value};
use std::collections::HashSet;

struct TestContext {
    storage: StorageEngine,
    catalog: Catalog,
    _storage_dir: tempfile::TempDir,
}

impl TestContext {
    fn new() -> Self {
        let storage_dir = tempfile::tempdir().unwrap();
        let storage = StorageEngine::open(StorageConfig::new(storage_dir.path())).unwrap();
        let catalog = project::catalog().unwrap();

        Self {
            storage,
            catalog,
            _storage_dir: storage_dir,
        }
    }

    fn resolver(&self) -> RelationResolver<'_> {
        RelationResolver::new(&self.storage, &self.catalog)
    }

    fn table(&self, name: &str) -> &TableDef {
        self.catalog.lookup_table(name).unwrap()
    }

    fn insert(&self, name: &str, value: Value) -> Row {
        self.storage.insert(self.table(name), row(value)).unwrap()
    }
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

fn ids(rows: &[Row]) -> Vec<&str> {
    rows.iter().map(|r| r["id"].as_str().unwrap()).collect()
}

#[test]
fn test_route_table_is_literal_and_ordered() {
    let catalog = project::catalog().unwrap();

    assert_eq!(
        catalog.get_routes(),
        vec![
            RouteBinding::new("users", "users"),
            RouteBinding::new("posts", "posts"),
            RouteBinding::new("categories", "categories"),
            RouteBinding::new("comments", "comments"),
            RouteBinding::new("categoriesToPosts", "categories-to-posts"),
            RouteBinding::new("profiles", "profiles"),
        ]
    );
}

#[test]
fn test_route_table_is_idempotent() {
    let catalog = project::catalog().unwrap();
    let first = catalog.get_routes();
    let second = catalog.get_routes();

    assert_eq!(first, second);
    assert_eq!(first[3], RouteBinding::new("comments", "comments"));
}

#[test]
fn test_every_route_resolves() {
    let catalog = project::catalog().unwrap();

    for binding in catalog.get_routes() {
        assert!(catalog.lookup_table(&binding.table).is_some());
        assert!(catalog.lookup_schema(&binding.table).is_some());
        assert_eq!(catalog.lookup_route(&binding.route), Some(binding.table.as_str()));
    }
}

#[test]
fn test_table_fields_are_schema_plus_audit() {
    let catalog = project::catalog().unwrap();

    for binding in catalog.get_routes() {
        let schema = catalog.lookup_schema(&binding.table).unwrap();
        let table = catalog.lookup_table(&binding.table).unwrap();

        let mut expected: Vec<&str> = schema.field_names().collect();
        expected.extend(["createdOn", "updatedOn"]);
        let actual: Vec<&str> = table.fields.names().collect();
        assert_eq!(actual, expected, "columns of {}", binding.table);

        let unique: HashSet<&str> = actual.iter().copied().collect();
        assert_eq!(unique.len(), actual.len());
    }
}

#[test]
fn test_unknown_names_are_not_found() {
    let catalog = project::catalog().unwrap();

    assert!(catalog.lookup_table("nonexistent").is_none());
    assert!(catalog.lookup_schema("nonexistent").is_none());
    assert!(catalog.lookup_route("nonexistent").is_none());
    // route segments are not entity names
    assert!(catalog.lookup_table("categories-to-posts").is_none());
}

#[test]
fn test_index_on_unknown_field_aborts() {
    let schema = project::comment_schema().unwrap();
    let err = TableDef::define(&schema, [IndexDef::on("badIndex", "nonExistentField")])
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownIndexField { .. }));

    let err = Catalog::builder()
        .entity(schema, "comments", |t| t.index("badIndex", ["nonExistentField"]))
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownIndexField { field, .. } if field == "nonExistentField"));
}

#[test]
fn test_dangling_relation_aborts() {
    let err = Catalog::builder()
        .entity(project::post_schema().unwrap(), "posts", |t| t)
        .unwrap()
        .build_with_relations(|graph| {
            graph.relate(entity::POSTS, "userId", entity::USERS, "user", "posts")?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, SchemaError::DanglingReference { target, .. } if target == "users"));
}

#[test]
fn test_audit_collision_aborts() {
    let schema = FieldSchema::new(
        "drafts",
        [FieldDef::text("id").primary_key(), FieldDef::integer("createdOn")],
    )
    .unwrap();

    let err = Catalog::builder().entity(schema, "drafts", |t| t).unwrap_err();
    assert!(matches!(err, SchemaError::SchemaConflict { .. }));
}

#[test]
fn test_join_table_rejects_duplicate_pair() {
    let ctx = TestContext::new();
    let table = ctx.table(entity::CATEGORIES_TO_POSTS);
    assert_eq!(table.primary_key.fields(), ["postId", "categoryId"]);

    ctx.insert(
        entity::CATEGORIES_TO_POSTS,
        json!({"id": "l1", "postId": "p1", "categoryId": "c1"}),
    );
    ctx.insert(
        entity::CATEGORIES_TO_POSTS,
        json!({"id": "l2", "postId": "p1", "categoryId": "c2"}),
    );

    let err = ctx
        .storage
        .insert(
            table,
            row(json!({"id": "l3", "postId": "p1", "categoryId": "c1"})),
        )
        .unwrap_err();
    assert!(matches!(err, Error::PrimaryKeyViolation { .. }));
}

#[test]
fn test_join_table_pairs_differing_only_by_nul_are_distinct() {
    let ctx = TestContext::new();

    ctx.insert(
        entity::CATEGORIES_TO_POSTS,
        json!({"id": "l1", "postId": "a\0b", "categoryId": "c"}),
    );
    ctx.insert(
        entity::CATEGORIES_TO_POSTS,
        json!({"id": "l2", "postId": "a", "categoryId": "b\0c"}),
    );

    let table = ctx.table(entity::CATEGORIES_TO_POSTS);
    assert_eq!(ctx.storage.scan(table).unwrap().len(), 2);
}

#[test]
fn test_join_table_requires_both_keys() {
    let ctx = TestContext::new();
    let err = ctx
        .storage
        .insert(
            ctx.table(entity::CATEGORIES_TO_POSTS),
            row(json!({"id": "l1", "postId": "p1"})),
        )
        .unwrap_err();

    assert!(matches!(err, Error::InvalidRow { .. }));
}

#[test]
fn test_post_resolves_its_user() {
    let ctx = TestContext::new();
    ctx.insert(entity::USERS, json!({"id": "u1", "firstName": "Ada", "role": "admin"}));
    ctx.insert(entity::USERS, json!({"id": "u2", "firstName": "Bob", "role": "user"}));
    let post = ctx.insert(entity::POSTS, json!({"id": "p1", "title": "Hi", "userId": "u1"}));

    let related = ctx.resolver().resolve(entity::POSTS, &post, "user").unwrap();
    match related {
        Related::One(Some(user)) => assert_eq!(user["id"], json!("u1")),
        other => panic!("expected one user, got {other:?}"),
    }
}

#[test]
fn test_user_resolves_posts_in_stable_order() {
    let ctx = TestContext::new();
    let user = ctx.insert(entity::USERS, json!({"id": "u1"}));
    ctx.insert(entity::POSTS, json!({"id": "p2", "userId": "u1"}));
    ctx.insert(entity::POSTS, json!({"id": "p1", "userId": "u1"}));
    ctx.insert(entity::POSTS, json!({"id": "p3", "userId": "u2"}));

    let resolver = ctx.resolver();
    let first = resolver.resolve(entity::USERS, &user, "posts").unwrap().into_rows();
    let second = resolver.resolve(entity::USERS, &user, "posts").unwrap().into_rows();

    assert_eq!(ids(&first), vec!["p1", "p2"]);
    assert_eq!(first, second);
}

#[test]
fn test_comment_relations() {
    let ctx = TestContext::new();
    ctx.insert(entity::USERS, json!({"id": "u1"}));
    let post = ctx.insert(entity::POSTS, json!({"id": "p1", "userId": "u1"}));
    let comment = ctx.insert(
        entity::COMMENTS,
        json!({"id": "m1", "body": "nice", "userId": "u1", "postId": "p1"}),
    );

    let resolver = ctx.resolver();
    let parent = resolver.resolve(entity::COMMENTS, &comment, "post").unwrap();
    assert_eq!(parent.len(), 1);

    let comments = resolver.resolve(entity::POSTS, &post, "comments").unwrap();
    assert_eq!(ids(&comments.into_rows()), vec!["m1"]);
}

#[test]
fn test_many_to_many_through_join_table() {
    let ctx = TestContext::new();
    let post = ctx.insert(entity::POSTS, json!({"id": "p1"}));
    ctx.insert(entity::POSTS, json!({"id": "p2"}));
    let rust = ctx.insert(entity::CATEGORIES, json!({"id": "c1", "title": "rust"}));
    ctx.insert(entity::CATEGORIES, json!({"id": "c2", "title": "web"}));
    ctx.insert(entity::CATEGORIES, json!({"id": "c3", "title": "misc"}));

    for (id, post_id, category_id) in [("l1", "p1", "c2"), ("l2", "p1", "c1"), ("l3", "p2", "c1")] {
        ctx.insert(
            entity::CATEGORIES_TO_POSTS,
            json!({"id": id, "postId": post_id, "categoryId": category_id}),
        );
    }

    let resolver = ctx.resolver();
    let categories = resolver.resolve(entity::POSTS, &post, "categories").unwrap();
    assert_eq!(ids(&categories.into_rows()), vec!["c1", "c2"]);

    let posts = resolver.resolve(entity::CATEGORIES, &rust, "posts").unwrap();
    assert_eq!(ids(&posts.into_rows()), vec!["p1", "p2"]);

    let links = resolver.resolve(entity::POSTS, &post, "categoryLinks").unwrap();
    assert_eq!(links.len(), 2);
}

#[test]
fn test_missing_foreign_key_resolves_empty() {
    let ctx = TestContext::new();
    let post = ctx.insert(entity::POSTS, json!({"id": "p1"}));

    let related = ctx.resolver().resolve(entity::POSTS, &post, "user").unwrap();
    assert_eq!(related, Related::One(None));
}

#[test]
fn test_unknown_relation_and_entity() {
    let ctx = TestContext::new();
    let post = ctx.insert(entity::POSTS, json!({"id": "p1"}));
    let resolver = ctx.resolver();

    assert!(matches!(
        resolver.resolve(entity::POSTS, &post, "author"),
        Err(Error::UnknownRelation { .. })
    ));
    assert!(matches!(
        resolver.resolve("articles", &post, "user"),
        Err(Error::UnknownEntity(_))
    ));
}
