//! HTTP route handlers.

pub mod entity;
pub mod health;
pub mod schema;
