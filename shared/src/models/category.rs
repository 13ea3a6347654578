//! Category Model

use super::Patch;
use serde::{Deserialize, Serialize};

/// Category entity
///
/// `slug` is always derived from `name`; it is never supplied by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Unix millis
    pub created_at: i64,
}

/// Create category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Update category payload (only present fields change)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub description: Patch<Option<String>>,
}

impl CategoryUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_absent() && self.description.is_absent()
    }
}
