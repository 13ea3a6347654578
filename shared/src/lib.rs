//! Shared types for the Relux catalog
//!
//! Data models, the unified error system and small utilities used by the
//! catalog server and the clients of its HTTP API.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
