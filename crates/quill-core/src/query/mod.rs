//! Relation traversal.
//!
//! Walks the relation graph against the storage engine to fetch related rows.

mod resolve;

pub use resolve::{Related, RelationResolver};
