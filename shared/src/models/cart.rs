//! Cart quote models

use serde::{Deserialize, Serialize};

/// One requested line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i32,
}

/// One priced line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedLine {
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub line_total: f64,
    /// Informational only, never applied to `unit_price`
    pub wholesale_eligible: bool,
    pub wholesale_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartQuote {
    pub lines: Vec<QuotedLine>,
    pub total: f64,
    pub item_count: i64,
}
