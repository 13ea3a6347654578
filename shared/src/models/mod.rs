//! Data models
//!
//! Shared between the catalog server and its API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod admin;
pub mod cart;
pub mod category;
pub mod patch;
pub mod product;

pub use admin::*;
pub use cart::*;
pub use category::*;
pub use patch::Patch;
pub use product::*;
