//! Pricing Engine
//!
//! The only place that derives a product's charged price. Product listings,
//! detail reads and cart quotes all go through these functions, so every
//! surface shows the same number for the same stored fields.
//!
//! - [`calculator`] - per-unit and per-line price derivation
//! - [`quote`] - read views and cart quotes built from the calculator

pub mod calculator;
pub mod quote;

pub use calculator::{
    MAX_PRICE, MAX_QUANTITY, PriceSummary, PricingError, PricingResult, cart_total,
    effective_price, is_wholesale_eligible, line_total, to_display_f64,
};
pub use quote::{product_view, quote_cart};
