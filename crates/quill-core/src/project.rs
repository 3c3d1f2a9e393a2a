//! The blog schema served by Quill.
//!
//! Six entities, declared once: users, posts, categories, comments, the
//! categories-to-posts join entity, and profiles. Route order below is the
//! order handlers are mounted in.

use crate::catalog::{Catalog, FieldDef, FieldSchema};
use crate::error::SchemaError;

/// Entity names.
pub mod entity {
    pub const USERS: &str = "users";
    pub const POSTS: &str = "posts";
    pub const CATEGORIES: &str = "categories";
    pub const COMMENTS: &str = "comments";
    pub const CATEGORIES_TO_POSTS: &str = "categoriesToPosts";
    pub const PROFILES: &str = "profiles";
}

use entity::*;

/// Profile fields.
pub fn profile_schema() -> Result<FieldSchema, SchemaError> {
    FieldSchema::new(
        PROFILES,
        [FieldDef::text("id").primary_key(), FieldDef::text("name")],
    )
}

/// User fields.
pub fn user_schema() -> Result<FieldSchema, SchemaError> {
    FieldSchema::new(
        USERS,
        [
            FieldDef::text("id").primary_key(),
            FieldDef::text("firstName"),
            FieldDef::text("lastName"),
            FieldDef::text("email"),
            FieldDef::text("password"),
            FieldDef::enumeration("role", "Role", ["admin", "user"]),
        ],
    )
}

/// Post fields.
pub fn post_schema() -> Result<FieldSchema, SchemaError> {
    FieldSchema::new(
        POSTS,
        [
            FieldDef::text("id").primary_key(),
            FieldDef::text("title"),
            FieldDef::text("body"),
            FieldDef::text("userId"),
        ],
    )
}

/// Category fields.
pub fn category_schema() -> Result<FieldSchema, SchemaError> {
    FieldSchema::new(
        CATEGORIES,
        [
            FieldDef::text("id").primary_key(),
            FieldDef::text("title"),
            FieldDef::text("body"),
        ],
    )
}

/// Comment fields.
pub fn comment_schema() -> Result<FieldSchema, SchemaError> {
    FieldSchema::new(
        COMMENTS,
        [
            FieldDef::text("id").primary_key(),
            FieldDef::text("body"),
            FieldDef::text("userId"),
            // text, to join against posts.id
            FieldDef::text("postId"),
        ],
    )
}

/// Join entity fields. Keyed by (postId, categoryId), not by `id`.
pub fn categories_to_posts_schema() -> Result<FieldSchema, SchemaError> {
    FieldSchema::new(
        CATEGORIES_TO_POSTS,
        [
            FieldDef::text("id").not_null(),
            FieldDef::text("postId").not_null().references(POSTS, "id"),
            FieldDef::text("categoryId")
                .not_null()
                .references(CATEGORIES, "id"),
        ],
    )
}

/// Build the project catalog.
///
/// Any declaration error is fatal and must abort startup.
pub fn catalog() -> Result<Catalog, SchemaError> {
    Catalog::builder()
        .entity(user_schema()?, "users", |t| t)?
        .entity(post_schema()?, "posts", |t| {
            t.index("postUserIdIndex", ["userId"])
        })?
        .entity(category_schema()?, "categories", |t| t)?
        .entity(comment_schema()?, "comments", |t| {
            t.index("commentsUserIdIndex", ["userId"])
                .index("commentsPostIdIndex", ["postId"])
        })?
        .entity(categories_to_posts_schema()?, "categories-to-posts", |t| {
            t.composite_key(["postId", "categoryId"])
                .index("categoriesToPostsCategoryIdIndex", ["categoryId"])
        })?
        .entity(profile_schema()?, "profiles", |t| t)?
        .build_with_relations(|graph| {
            graph
                .relate(POSTS, "userId", USERS, "user", "posts")?
                .relate(COMMENTS, "userId", USERS, "user", "comments")?
                .relate(COMMENTS, "postId", POSTS, "post", "comments")?
                .relate(CATEGORIES_TO_POSTS, "postId", POSTS, "post", "categoryLinks")?
                .relate(
                    CATEGORIES_TO_POSTS,
                    "categoryId",
                    CATEGORIES,
                    "category",
                    "postLinks",
                )?
                .relate_many(POSTS, CATEGORIES, CATEGORIES_TO_POSTS, "categories", "posts")?;
            Ok(())
        })
}
