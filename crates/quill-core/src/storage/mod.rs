//! Storage layer for Quill.
//!
//! A sled-backed reference driver that accepts [`TableDef`](crate::catalog::TableDef)s
//! and executes reads and writes against them.

mod config;
mod engine;

pub mod key;

pub use config::StorageConfig;
pub use engine::StorageEngine;

/// A stored row: a JSON object keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;
