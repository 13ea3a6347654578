//! Price Calculator
//!
//! Uses rust_decimal internally and never rounds; callers that display a
//! price round for presentation only. Every operation is checked, so a stored
//! price outside [`MAX_PRICE`] or an overflowing line surfaces as a
//! [`PricingError`] instead of a panic or a silent zero.

use rust_decimal::prelude::*;
use shared::models::Product;
use thiserror::Error;

use crate::utils::AppError;

/// Maximum accepted unit price (base or wholesale)
pub const MAX_PRICE: f64 = 1_000_000_000.0;
/// Maximum quantity of a single cart line
pub const MAX_QUANTITY: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("Price must be a finite number between 0 and {MAX_PRICE}, got {0}")]
    PriceOutOfRange(f64),

    #[error("Price calculation overflowed")]
    Overflow,
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::internal(err.to_string())
    }
}

pub type PricingResult<T> = Result<T, PricingError>;

/// Convert a stored f64 price to Decimal
fn to_decimal(value: f64) -> PricingResult<Decimal> {
    if !(0.0..=MAX_PRICE).contains(&value) {
        return Err(PricingError::PriceOutOfRange(value));
    }
    Decimal::from_f64(value).ok_or(PricingError::PriceOutOfRange(value))
}

/// Convert a calculated amount back to f64 (no rounding)
#[inline]
pub fn to_display_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Unit price after the product's percentage discount
///
/// `price` when `discount_percent` is 0, otherwise
/// `price * (1 - discount_percent / 100)`.
pub fn effective_price(product: &Product) -> PricingResult<Decimal> {
    let price = to_decimal(product.price)?;
    if product.discount_percent == 0 {
        return Ok(price);
    }
    let discount = Decimal::from(product.discount_percent);
    price
        .checked_mul(Decimal::ONE - discount / Decimal::ONE_HUNDRED)
        .ok_or(PricingError::Overflow)
}

/// Whether `quantity` unlocks the wholesale price
///
/// Informational: the wholesale price is never applied by [`effective_price`].
pub fn is_wholesale_eligible(product: &Product, quantity: i32) -> bool {
    product.wholesale_price.is_some() && quantity >= product.wholesale_min_quantity
}

pub fn line_total(product: &Product, quantity: i32) -> PricingResult<Decimal> {
    effective_price(product)?
        .checked_mul(Decimal::from(quantity))
        .ok_or(PricingError::Overflow)
}

/// Sum of [`line_total`] over all lines (order independent)
pub fn cart_total<'a, I>(lines: I) -> PricingResult<Decimal>
where
    I: IntoIterator<Item = (&'a Product, i32)>,
{
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |total, (product, quantity)| {
            total
                .checked_add(line_total(product, quantity)?)
                .ok_or(PricingError::Overflow)
        })
}

/// Derived price fields attached to product read responses
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSummary {
    pub effective_price: f64,
    pub has_discount: bool,
}

impl PriceSummary {
    pub fn of(product: &Product) -> PricingResult<Self> {
        Ok(Self {
            effective_price: to_display_f64(effective_price(product)?),
            has_discount: product.discount_percent > 0,
        })
    }
}
