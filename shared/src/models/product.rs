//! Product Model

use super::Patch;
use serde::{Deserialize, Serialize};

/// Default `wholesale_min_quantity`
pub const DEFAULT_WHOLESALE_MIN_QUANTITY: i32 = 1;

/// Product row as stored
///
/// Prices are plain numbers in the shop's single currency (no minor units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub wholesale_price: Option<f64>,
    pub wholesale_min_quantity: i32,
    pub stock: i32,
    /// 0..=100
    pub discount_percent: i32,
    /// Nullable; set to NULL when the category is deleted
    pub category_id: Option<i64>,
    /// Relative path, always `/uploads/<name>.<ext>`
    pub image_url: Option<String>,
    /// Public visibility only
    pub is_active: bool,
    /// Unix millis
    pub created_at: i64,
    pub updated_at: i64,
}

/// Product joined with its category's name and slug
///
/// Both are `None` when the product has no category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductWithCategory {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub product: Product,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
}

/// Product read response: stored fields, joined category and derived price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub item: ProductWithCategory,
    /// Unit price after discount, unrounded
    pub effective_price: f64,
    pub has_discount: bool,
}

/// Create product payload (already parsed and typed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub wholesale_price: Option<f64>,
    #[serde(default = "default_wholesale_min_quantity")]
    pub wholesale_min_quantity: i32,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub discount_percent: i32,
    #[serde(default)]
    pub category_id: Option<i64>,
}

fn default_wholesale_min_quantity() -> i32 {
    DEFAULT_WHOLESALE_MIN_QUANTITY
}

impl ProductCreate {
    /// Minimal payload with every optional field defaulted
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            wholesale_price: None,
            wholesale_min_quantity: DEFAULT_WHOLESALE_MIN_QUANTITY,
            stock: 0,
            discount_percent: 0,
            category_id: None,
        }
    }
}

/// Update product payload (only present fields change)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub description: Patch<Option<String>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub price: Patch<f64>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub wholesale_price: Patch<Option<f64>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub wholesale_min_quantity: Patch<i32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub stock: Patch<i32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub discount_percent: Patch<i32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub category_id: Patch<Option<i64>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub is_active: Patch<bool>,
}

/// Listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Restrict to products of the category with this slug
    pub category_slug: Option<String>,
    /// Restrict to `is_active = true`
    #[serde(default)]
    pub active_only: bool,
}
